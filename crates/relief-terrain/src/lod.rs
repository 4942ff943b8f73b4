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

//! Per-level squared camera distances beyond which a coarser mesh is acceptable.
//!
//! At distance `d`, a world-space height error `e` projects to roughly `e * C / d`
//! pixels. Solving for one pixel gives `d = e * C`, so the table stores `(e * C)^2`
//! for the worst error each level introduces.

use crate::options::TileOptions;

/// Monotonic table of squared distance thresholds, one per mip level.
///
/// Entry 0 is always zero. Entries strictly increase with the level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelErrorTable {
    min_level_dist_sqr: Vec<f32>,
}

impl LevelErrorTable {
    /// Projection constant converting a world-space error into a distance.
    ///
    /// `C = (near_plane / |top_coord|) / (2 * max_pixel_error / vert_res)`.
    pub fn c_factor(options: &TileOptions) -> f32 {
        let a = options.near_plane() / options.top_coord().abs();
        let t = 2.0 * options.max_pixel_error() / options.vert_res() as f32;
        a / t
    }

    /// Computes the table for the tile described by `options`.
    ///
    /// Heights are read from the tile's height source and scaled by `scale.y`.
    pub fn compute(options: &TileOptions) -> Self {
        let size = options.size();
        let scale_y = options.scale().y;
        let mut heights = Vec::with_capacity(size * size);
        for z in 0..size {
            for x in 0..size {
                heights.push(f32::from(options.local_height(x, z)) * scale_y);
            }
        }
        Self::from_heights(
            size,
            options.max_mip_levels(),
            &heights,
            Self::c_factor(options),
        )
    }

    /// Computes the table from row-major tile heights in world units.
    pub fn from_heights(size: usize, levels: usize, heights: &[f32], c: f32) -> Self {
        let c_sqr = c * c;
        let height = |x: usize, z: usize| heights[x + z * size];
        let mut thresholds = vec![0.0f32; levels];

        for (level, threshold) in thresholds.iter_mut().enumerate().skip(1) {
            let step = 1usize << level;
            let inv_step = 1.0 / step as f32;
            let mut max_err_sqr = 0.0f32;

            for j in (0..size - 1).step_by(step) {
                for i in (0..size - 1).step_by(step) {
                    let h1 = height(i, j);
                    let h2 = height(i + step, j);
                    let h4 = height(i, j + step);
                    let h3 = height(i + step, j + step);

                    for z in 1..step {
                        let z_pct = z as f32 * inv_step;
                        for x in 1..step {
                            let x_pct = x as f32 * inv_step;
                            let top = h1 + (h2 - h1) * x_pct;
                            let bottom = h4 + (h3 - h4) * x_pct;
                            let interpolated = top + (bottom - top) * z_pct;
                            let delta = (interpolated - height(i + x, j + z)).abs();
                            max_err_sqr = max_err_sqr.max(delta * delta * c_sqr);
                        }
                    }
                }
            }
            *threshold = max_err_sqr;
        }

        Self::from_thresholds(thresholds)
    }

    /// Builds a table from raw thresholds, forcing entry 0 to zero and the rest to
    /// strictly increase.
    pub fn from_thresholds(mut thresholds: Vec<f32>) -> Self {
        if let Some(first) = thresholds.first_mut() {
            *first = 0.0;
        }
        for i in 1..thresholds.len() {
            let prev = thresholds[i - 1];
            if thresholds[i] <= prev {
                // A plain `+ 1.0` stops changing the value past 2^24.
                let bumped = prev + 1.0f32.max(prev.abs() * 2.0 * f32::EPSILON);
                log::debug!(
                    "Level {} threshold {} not above level {} ({}), raised to {}",
                    i,
                    thresholds[i],
                    i - 1,
                    prev,
                    bumped
                );
                thresholds[i] = bumped;
            }
        }
        Self {
            min_level_dist_sqr: thresholds,
        }
    }

    /// Picks the level for a camera at squared distance `distance_sqr`.
    ///
    /// Returns `i - 1` for the first level `i` whose threshold is strictly greater than
    /// the distance, or the coarsest level if none is. A distance equal to a threshold
    /// therefore selects the coarser of the two neighboring levels.
    pub fn select_level(&self, distance_sqr: f32) -> usize {
        let coarsest = self.levels().saturating_sub(1);
        self.min_level_dist_sqr
            .iter()
            .position(|&threshold| threshold > distance_sqr)
            .map_or(coarsest, |i| i.saturating_sub(1))
    }

    /// Number of levels in the table.
    pub fn levels(&self) -> usize {
        self.min_level_dist_sqr.len()
    }

    /// Threshold of `level`, if it exists.
    pub fn threshold(&self, level: usize) -> Option<f32> {
        self.min_level_dist_sqr.get(level).copied()
    }

    /// All thresholds, finest level first.
    pub fn as_slice(&self) -> &[f32] {
        &self.min_level_dist_sqr
    }
}
