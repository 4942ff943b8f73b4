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

//! Source of raw elevation samples for terrain construction.

/// Provides world-space height samples addressed by integer grid coordinates.
///
/// Implementations cover the whole world, a `world_size` x `world_size` grid of
/// 16-bit samples. Terrain tiles read their window of the field through this trait
/// once, at construction.
pub trait HeightSource: Send + Sync {
    /// Edge length of the square sample grid.
    fn world_size(&self) -> usize;

    /// Returns the raw sample at grid coordinate `(x, z)`.
    ///
    /// Callers stay within `0..world_size()` on both axes.
    fn world_height(&self, x: usize, z: usize) -> u16;
}
