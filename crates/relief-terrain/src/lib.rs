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

//! # Relief Terrain
//!
//! Tiled height-field terrain with view-dependent level of detail.
//!
//! A [`TerrainGrid`] owns a square lattice of [`TerrainTile`]s cut from a shared
//! height field. Every frame the grid picks a level of detail for each tile from the
//! camera distance, relaxes neighboring levels so that no two adjacent tiles differ by
//! more than one, and hands out index lists whose edges are stitched to coarser
//! neighbors so the surface stays crack-free.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod grid;
pub mod height_field;
pub mod lod;
pub mod options;
pub mod stitch;
pub mod tile;

pub use config::{HeightmapFormat, HeightmapSource, TerrainConfig};
pub use error::TerrainError;
pub use grid::TerrainGrid;
pub use height_field::HeightField;
pub use lod::LevelErrorTable;
pub use options::{TileOptions, TileOptionsBuilder};
pub use stitch::{Side, StitchMask};
pub use tile::{TerrainTile, TerrainVertex, TileCoord};

/// Convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, TerrainError>;
