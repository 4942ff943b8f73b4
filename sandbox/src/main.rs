// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Relief Sandbox
// Flies a camera over a terrain grid and reports level selection, draw cost and
// surface queries for each frame.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use relief_core::math::Vec3;
use relief_infra::SoftwareBufferService;
use relief_terrain::{HeightField, TerrainConfig, TerrainGrid, TileOptions};

/// Headless terrain fly-through.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Terrain description in RON. A procedural island is used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(short, long, default_value_t = 120)]
    frames: usize,

    /// Altitude of the camera above the terrain, in world units.
    #[arg(long, default_value_t = 40.0)]
    altitude: f32,

    /// Cap on buffer memory, in bytes.
    #[arg(long)]
    budget: Option<usize>,
}

fn procedural_island() -> Result<TileOptions> {
    const SIZE: usize = 257;
    let half = (SIZE / 2) as f32;
    let field = HeightField::from_fn(SIZE, |x, z| {
        let (dx, dz) = ((x as f32 - half) / half, (z as f32 - half) / half);
        let falloff = (1.0 - (dx * dx + dz * dz)).max(0.0);
        let ripples = 0.5 + 0.25 * ((x as f32) * 0.11).sin() * ((z as f32) * 0.07).cos();
        (falloff * ripples * 60_000.0) as u16
    });
    TileOptions::builder(Arc::new(field))
        .size(33)
        .max_mip_levels(5)
        .scale(Vec3::new(2.0, 0.002, 2.0))
        .vertex_normals(true)
        .build()
        .context("building options for the procedural island")
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut service = match args.budget {
        Some(bytes) => SoftwareBufferService::with_budget(bytes),
        None => SoftwareBufferService::new(),
    };

    let mut grid = match &args.config {
        Some(path) => {
            let config = TerrainConfig::load(path)
                .with_context(|| format!("loading terrain config {}", path.display()))?;
            config
                .build_grid(&mut service)
                .context("building terrain grid")?
        }
        None => TerrainGrid::build(&procedural_island()?, &mut service)
            .context("building terrain grid")?,
    };

    let bounds = grid.bounding_box();
    let center = bounds.center();
    let radius = 0.4 * bounds.size().x.min(bounds.size().z);
    log::info!(
        "Terrain ready: {} tiles, bounds {:?} to {:?}, {} bytes of buffers",
        grid.tiles().len(),
        bounds.min,
        bounds.max,
        service.allocated_bytes()
    );

    for frame in 0..args.frames {
        let angle = frame as f32 / args.frames.max(1) as f32 * std::f32::consts::TAU;
        let (x, z) = (center.x + radius * angle.cos(), center.z + radius * angle.sin());
        let ground = grid.height_at(x, z).unwrap_or(bounds.min.y);
        let camera = Vec3::new(x, ground + args.altitude, z);

        grid.update_lod(camera);
        let operations = grid
            .render_operations(&mut service)
            .with_context(|| format!("preparing draws for frame {frame}"))?;

        let mut histogram = BTreeMap::new();
        for tile in grid.tiles() {
            *histogram.entry(tile.render_level()).or_insert(0usize) += 1;
        }
        let triangles: usize = operations.iter().map(|(_, op)| op.primitive_count()).sum();

        let look_at = Vec3::new(center.x, bounds.min.y - 1.0, center.z);
        let pick = grid.intersect_segment(camera, look_at);
        log::info!(
            "frame {frame:>4}: camera ({:.1}, {:.1}, {:.1}) ground {:.2} | levels {:?} | {} triangles | look-at hit {:?}",
            camera.x,
            camera.y,
            camera.z,
            ground,
            histogram,
            triangles,
            pick
        );
    }

    log::info!(
        "Done: {} buffers, peak {} bytes",
        service.buffer_count(),
        service.peak_bytes()
    );
    grid.destroy(&mut service).context("releasing terrain buffers")?;
    Ok(())
}
