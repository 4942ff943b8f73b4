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

//! Provides the small set of mathematics primitives the engine needs.
//!
//! General purpose linear algebra is deliberately kept minimal: terrain work only
//! needs 2D/3D vectors, axis-aligned boxes and rays.

// --- Fundamental Constants ---

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

// --- Declare Sub-Modules ---

pub mod geometry;
pub mod vector;

// --- Re-export Principal Types ---

pub use self::geometry::{Aabb, Ray};
pub use self::vector::{Vec2, Vec3};

// --- Utility Functions ---

/// Returns `true` if `value` is of the form `2^k + 1` with `k >= 1`.
///
/// Terrain tiles must have such an edge length so that every mip level halves
/// cleanly down to a single quad.
///
/// # Examples
///
/// ```
/// use relief_core::math::is_power_of_two_plus_one;
/// assert!(is_power_of_two_plus_one(5));
/// assert!(is_power_of_two_plus_one(65));
/// assert!(!is_power_of_two_plus_one(2));
/// assert!(!is_power_of_two_plus_one(64));
/// ```
#[inline]
pub fn is_power_of_two_plus_one(value: usize) -> bool {
    value >= 3 && (value - 1).is_power_of_two()
}
