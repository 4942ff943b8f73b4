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

//! Immutable per-tile configuration and its validating builder.

use crate::error::TerrainError;
use relief_core::math::{is_power_of_two_plus_one, Vec3};
use relief_core::HeightSource;
use std::fmt;
use std::sync::Arc;

/// Describes where a tile sits in the world height field and how its level of
/// detail is bounded.
///
/// Built through [`TileOptions::builder`], which validates every field; an existing
/// `TileOptions` is therefore always consistent.
#[derive(Clone)]
pub struct TileOptions {
    pub(crate) height_source: Arc<dyn HeightSource>,
    pub(crate) size: usize,
    pub(crate) world_size: usize,
    pub(crate) start_x: usize,
    pub(crate) start_z: usize,
    pub(crate) max_mip_levels: usize,
    pub(crate) scale: Vec3,
    pub(crate) max_pixel_error: f32,
    pub(crate) near_plane: f32,
    pub(crate) vert_res: u32,
    pub(crate) top_coord: f32,
    pub(crate) detail_tile: f32,
    pub(crate) vertex_normals: bool,
}

impl TileOptions {
    /// Starts building options over `height_source`, with the tile at the origin.
    pub fn builder(height_source: Arc<dyn HeightSource>) -> TileOptionsBuilder {
        TileOptionsBuilder::new(height_source)
    }

    /// Returns a copy of these options moved to `(start_x, start_z)`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::TileOutOfWorld`] if the moved tile leaves the height field.
    pub fn at(&self, start_x: usize, start_z: usize) -> Result<Self, TerrainError> {
        let moved = Self {
            start_x,
            start_z,
            ..self.clone()
        };
        moved.validate()?;
        Ok(moved)
    }

    /// Tile edge length in vertices.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Height field edge length in samples.
    pub fn world_size(&self) -> usize {
        self.world_size
    }

    /// First height field column covered by the tile.
    pub fn start_x(&self) -> usize {
        self.start_x
    }

    /// First height field row covered by the tile.
    pub fn start_z(&self) -> usize {
        self.start_z
    }

    /// Number of detail levels, level 0 being full resolution.
    pub fn max_mip_levels(&self) -> usize {
        self.max_mip_levels
    }

    /// World units per sample step on each axis; `y` scales raw height samples.
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Largest acceptable screen-space error, in pixels.
    pub fn max_pixel_error(&self) -> f32 {
        self.max_pixel_error
    }

    /// Distance to the camera's near clip plane.
    pub fn near_plane(&self) -> f32 {
        self.near_plane
    }

    /// Vertical viewport resolution, in pixels.
    pub fn vert_res(&self) -> u32 {
        self.vert_res
    }

    /// Top coordinate of the view frustum on the near plane.
    pub fn top_coord(&self) -> f32 {
        self.top_coord
    }

    /// Repetitions of the detail texture across one tile.
    pub fn detail_tile(&self) -> f32 {
        self.detail_tile
    }

    /// Whether per-vertex normals are computed from the surface.
    pub fn vertex_normals(&self) -> bool {
        self.vertex_normals
    }

    /// The shared height samples.
    pub fn height_source(&self) -> &Arc<dyn HeightSource> {
        &self.height_source
    }

    /// Raw sample at tile-local vertex `(x, z)`.
    pub(crate) fn local_height(&self, x: usize, z: usize) -> u16 {
        self.height_source
            .world_height(self.start_x + x, self.start_z + z)
    }

    fn validate(&self) -> Result<(), TerrainError> {
        if !is_power_of_two_plus_one(self.size) {
            return Err(TerrainError::InvalidTileSize { size: self.size });
        }
        if self.max_mip_levels == 0
            || self.max_mip_levels > usize::BITS as usize
            || (1usize << (self.max_mip_levels - 1)) > self.size - 1
        {
            return Err(TerrainError::InvalidMipLevels {
                levels: self.max_mip_levels,
                size: self.size,
            });
        }
        if self.start_x + self.size > self.world_size || self.start_z + self.size > self.world_size
        {
            return Err(TerrainError::TileOutOfWorld {
                start_x: self.start_x,
                start_z: self.start_z,
                size: self.size,
                world_size: self.world_size,
            });
        }
        for (axis, value) in [('x', self.scale.x), ('y', self.scale.y), ('z', self.scale.z)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TerrainError::InvalidScale { axis, value });
            }
        }
        let bounds = [
            ("max_pixel_error", self.max_pixel_error, self.max_pixel_error > 0.0),
            ("near_plane", self.near_plane, self.near_plane > 0.0),
            ("vert_res", self.vert_res as f32, self.vert_res > 0),
            ("top_coord", self.top_coord, self.top_coord != 0.0),
            ("detail_tile", self.detail_tile, self.detail_tile > 0.0),
        ];
        for (name, value, ok) in bounds {
            if !(ok && value.is_finite()) {
                return Err(TerrainError::InvalidErrorBound { name, value });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for TileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileOptions")
            .field("size", &self.size)
            .field("world_size", &self.world_size)
            .field("start_x", &self.start_x)
            .field("start_z", &self.start_z)
            .field("max_mip_levels", &self.max_mip_levels)
            .field("scale", &self.scale)
            .field("max_pixel_error", &self.max_pixel_error)
            .field("near_plane", &self.near_plane)
            .field("vert_res", &self.vert_res)
            .field("top_coord", &self.top_coord)
            .field("detail_tile", &self.detail_tile)
            .field("vertex_normals", &self.vertex_normals)
            .finish_non_exhaustive()
    }
}

/// Builder for [`TileOptions`].
///
/// Defaults: tile size 65, 5 mip levels, unit scale, 4 pixels of error at a vertical
/// resolution of 768, near plane and top coordinate 1, detail tiled once, no normals.
#[derive(Clone)]
pub struct TileOptionsBuilder {
    options: TileOptions,
}

impl TileOptionsBuilder {
    fn new(height_source: Arc<dyn HeightSource>) -> Self {
        let world_size = height_source.world_size();
        Self {
            options: TileOptions {
                height_source,
                size: 65,
                world_size,
                start_x: 0,
                start_z: 0,
                max_mip_levels: 5,
                scale: Vec3::ONE,
                max_pixel_error: 4.0,
                near_plane: 1.0,
                vert_res: 768,
                top_coord: 1.0,
                detail_tile: 1.0,
                vertex_normals: false,
            },
        }
    }

    /// Tile edge length in vertices; must be `2^k + 1`.
    pub fn size(mut self, size: usize) -> Self {
        self.options.size = size;
        self
    }

    /// Position of the tile's first vertex in the height field.
    pub fn start(mut self, start_x: usize, start_z: usize) -> Self {
        self.options.start_x = start_x;
        self.options.start_z = start_z;
        self
    }

    /// Number of detail levels.
    pub fn max_mip_levels(mut self, levels: usize) -> Self {
        self.options.max_mip_levels = levels;
        self
    }

    /// World units per sample on each axis.
    pub fn scale(mut self, scale: Vec3) -> Self {
        self.options.scale = scale;
        self
    }

    /// Largest acceptable screen-space error, in pixels.
    pub fn max_pixel_error(mut self, pixels: f32) -> Self {
        self.options.max_pixel_error = pixels;
        self
    }

    /// Near clip plane distance.
    pub fn near_plane(mut self, distance: f32) -> Self {
        self.options.near_plane = distance;
        self
    }

    /// Vertical viewport resolution, in pixels.
    pub fn vert_res(mut self, pixels: u32) -> Self {
        self.options.vert_res = pixels;
        self
    }

    /// Top coordinate of the view frustum on the near plane.
    pub fn top_coord(mut self, top: f32) -> Self {
        self.options.top_coord = top;
        self
    }

    /// Repetitions of the detail texture across one tile.
    pub fn detail_tile(mut self, repeats: f32) -> Self {
        self.options.detail_tile = repeats;
        self
    }

    /// Enables per-vertex normals.
    pub fn vertex_normals(mut self, enabled: bool) -> Self {
        self.options.vertex_normals = enabled;
        self
    }

    /// Validates and returns the options.
    ///
    /// # Errors
    ///
    /// Returns the [`TerrainError`] variant naming the first invalid field.
    pub fn build(self) -> Result<TileOptions, TerrainError> {
        self.options.validate()?;
        Ok(self.options)
    }
}
