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

//! Error type for terrain construction and rendering.

use relief_core::renderer::ResourceError;
use thiserror::Error;

/// Errors raised while building or rendering terrain.
///
/// Height queries never produce an error; out-of-range coordinates are clamped.
#[derive(Error, Debug)]
pub enum TerrainError {
    /// Tile edge length is not of the form `2^k + 1`.
    #[error("Invalid tile size {size}: must be 2^k + 1 with k >= 1")]
    InvalidTileSize {
        /// The rejected edge length, in vertices.
        size: usize,
    },

    /// Mip level count is zero or too large for the tile to halve that often.
    #[error("Invalid mip level count {levels} for tile size {size}")]
    InvalidMipLevels {
        /// The rejected level count.
        levels: usize,
        /// Tile edge length, in vertices.
        size: usize,
    },

    /// Tile window extends past the edge of the height field.
    #[error(
        "Tile at ({start_x}, {start_z}) with size {size} does not fit in world of size {world_size}"
    )]
    TileOutOfWorld {
        /// First column of the tile.
        start_x: usize,
        /// First row of the tile.
        start_z: usize,
        /// Tile edge length, in vertices.
        size: usize,
        /// Height field edge length, in samples.
        world_size: usize,
    },

    /// World cannot be cut into whole tiles sharing their edge vertices.
    #[error("World size {world_size} cannot be tiled by tiles of size {tile_size}")]
    InvalidWorldSize {
        /// Height field edge length, in samples.
        world_size: usize,
        /// Tile edge length, in vertices.
        tile_size: usize,
    },

    /// A grid coordinate does not name a tile of the grid.
    #[error("No tile at grid coordinate ({x}, {z})")]
    UnknownTile {
        /// Column requested.
        x: usize,
        /// Row requested.
        z: usize,
    },

    /// A scale factor is zero, negative or not finite.
    #[error("Invalid {axis} scale: {value}")]
    InvalidScale {
        /// Axis name (`x`, `y` or `z`).
        axis: char,
        /// The rejected value.
        value: f32,
    },

    /// A parameter of the screen-space error bound is out of range.
    #[error("Invalid error bound parameter {name}: {value}")]
    InvalidErrorBound {
        /// Parameter name.
        name: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// Sample data does not describe a square grid of the expected size.
    #[error("Height field size mismatch: expected {expected} samples, got {actual}")]
    HeightFieldSize {
        /// Number of samples required.
        expected: usize,
        /// Number of samples supplied.
        actual: usize,
    },

    /// The buffer service failed to allocate or lock a buffer.
    #[error("Buffer resource error: {0}")]
    Resource(#[from] ResourceError),

    /// A terrain configuration could not be parsed or serialized.
    #[error("Invalid terrain configuration: {0}")]
    Config(String),

    /// Reading a configuration or height map from disk failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
