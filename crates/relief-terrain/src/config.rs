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

//! World terrain description loaded from RON.
//!
//! ```ron
//! TerrainConfig(
//!     tile_size: 65,
//!     max_mip_levels: 5,
//!     scale: (4.0, 0.05, 4.0),
//!     heightmap: Raw(path: "terrain.raw", width: 513, format: L16),
//! )
//! ```
//!
//! Omitted fields take the [`TileOptions`] builder defaults.

use crate::error::TerrainError;
use crate::grid::TerrainGrid;
use crate::height_field::HeightField;
use crate::options::TileOptions;
use relief_core::math::Vec3;
use relief_core::renderer::BufferService;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sample encoding of a raw height map file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeightmapFormat {
    /// One unsigned byte per sample.
    L8,
    /// Two bytes per sample, little endian.
    L16,
}

/// Where the world's height samples come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HeightmapSource {
    /// A constant-height world, useful for tests and previews.
    Flat {
        /// Edge length in samples.
        size: usize,
        /// Raw sample value everywhere.
        height: u16,
    },
    /// A headerless greyscale file.
    Raw {
        /// File location; relative paths resolve against the config file.
        path: PathBuf,
        /// Edge length in samples.
        width: usize,
        /// Sample encoding.
        format: HeightmapFormat,
    },
}

/// Everything needed to build a [`TerrainGrid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Tile edge length in vertices.
    pub tile_size: usize,
    /// Number of detail levels per tile.
    pub max_mip_levels: usize,
    /// Largest acceptable screen-space error, in pixels.
    pub max_pixel_error: f32,
    /// Vertical viewport resolution, in pixels.
    pub vert_res: u32,
    /// Near clip plane distance.
    pub near_plane: f32,
    /// Top coordinate of the view frustum on the near plane.
    pub top_coord: f32,
    /// World units per sample along x, y and z.
    pub scale: [f32; 3],
    /// Repetitions of the detail texture per tile.
    pub detail_tile: f32,
    /// Whether to compute vertex normals.
    pub vertex_normals: bool,
    /// Height sample source.
    pub heightmap: HeightmapSource,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            tile_size: 65,
            max_mip_levels: 5,
            max_pixel_error: 4.0,
            vert_res: 768,
            near_plane: 1.0,
            top_coord: 1.0,
            scale: [1.0, 1.0, 1.0],
            detail_tile: 1.0,
            vertex_normals: false,
            heightmap: HeightmapSource::Flat {
                size: 65,
                height: 0,
            },
        }
    }
}

impl TerrainConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, TerrainError> {
        ron::de::from_str(text).map_err(|e| TerrainError::Config(e.to_string()))
    }

    /// Serializes the configuration to pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String, TerrainError> {
        let pretty_config = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, pretty_config)
            .map_err(|e| TerrainError::Config(e.to_string()))
    }

    /// Reads a configuration file. A relative raw height map path is made relative to
    /// the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TerrainError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut config = Self::from_ron_str(&text)?;
        if let HeightmapSource::Raw { path: raw, .. } = &mut config.heightmap {
            if raw.is_relative() {
                if let Some(dir) = path.parent() {
                    *raw = dir.join(&*raw);
                }
            }
        }
        log::debug!("Loaded terrain config from {}", path.display());
        Ok(config)
    }

    /// Produces the height field described by `heightmap`.
    pub fn load_height_field(&self) -> Result<HeightField, TerrainError> {
        match &self.heightmap {
            HeightmapSource::Flat { size, height } => {
                HeightField::sample_count(*size, 0)?;
                Ok(HeightField::flat(*size, *height))
            }
            HeightmapSource::Raw {
                path,
                width,
                format,
            } => {
                let bytes = fs::read(path)?;
                log::debug!(
                    "Read {} bytes of {:?} height map from {}",
                    bytes.len(),
                    format,
                    path.display()
                );
                match format {
                    HeightmapFormat::L8 => HeightField::from_raw_l8(*width, &bytes),
                    HeightmapFormat::L16 => HeightField::from_raw_l16(*width, &bytes),
                }
            }
        }
    }

    /// Validated tile options over `height_field`, positioned at the origin.
    pub fn tile_options(&self, height_field: HeightField) -> Result<TileOptions, TerrainError> {
        let [sx, sy, sz] = self.scale;
        TileOptions::builder(Arc::new(height_field))
            .size(self.tile_size)
            .max_mip_levels(self.max_mip_levels)
            .max_pixel_error(self.max_pixel_error)
            .vert_res(self.vert_res)
            .near_plane(self.near_plane)
            .top_coord(self.top_coord)
            .scale(Vec3::new(sx, sy, sz))
            .detail_tile(self.detail_tile)
            .vertex_normals(self.vertex_normals)
            .build()
    }

    /// Loads the height field and builds the whole grid.
    pub fn build_grid(&self, service: &mut dyn BufferService) -> Result<TerrainGrid, TerrainError> {
        let options = self.tile_options(self.load_height_field()?)?;
        TerrainGrid::build(&options, service)
    }
}
