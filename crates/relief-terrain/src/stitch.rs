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

//! Triangle index generation for a tile at a given level, with seam strips along
//! the sides whose neighbor renders coarser.
//!
//! Vertices are addressed as `x + z * size` over the full tile, whatever the level.
//! North is the `z = 0` edge, south `z = size - 1`, west `x = 0`, east `x = size - 1`.

use std::fmt;

/// One of the four sides of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The `z = 0` edge.
    North,
    /// The `z = size - 1` edge.
    South,
    /// The `x = size - 1` edge.
    East,
    /// The `x = 0` edge.
    West,
}

impl Side {
    /// All sides, in stitch-bit order.
    pub const ALL: [Side; 4] = [Side::North, Side::South, Side::East, Side::West];

    /// The side facing this one on the neighboring tile.
    pub const fn opposite(self) -> Side {
        match self {
            Side::North => Side::South,
            Side::South => Side::North,
            Side::East => Side::West,
            Side::West => Side::East,
        }
    }

    /// Position of the side in [`Side::ALL`], for per-side arrays.
    pub const fn index(self) -> usize {
        match self {
            Side::North => 0,
            Side::South => 1,
            Side::East => 2,
            Side::West => 3,
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Side::North => StitchMask::NORTH.0,
            Side::South => StitchMask::SOUTH.0,
            Side::East => StitchMask::EAST.0,
            Side::West => StitchMask::WEST.0,
        }
    }
}

/// Set of sides that need a seam strip.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct StitchMask(u8);

impl StitchMask {
    /// No side stitched.
    pub const EMPTY: Self = Self(0);
    /// North side stitched.
    pub const NORTH: Self = Self(1);
    /// South side stitched.
    pub const SOUTH: Self = Self(2);
    /// East side stitched.
    pub const EAST: Self = Self(4);
    /// West side stitched.
    pub const WEST: Self = Self(8);
    /// Every side stitched.
    pub const ALL: Self = Self(15);

    /// Builds a mask from raw bits; bits above the four sides are dropped.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Raw bits of the mask.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if `side` is stitched.
    pub const fn contains(self, side: Side) -> bool {
        self.0 & side.bit() != 0
    }

    /// Marks `side` as stitched.
    pub fn insert(&mut self, side: Side) {
        self.0 |= side.bit();
    }

    /// Returns a copy with `side` stitched.
    pub const fn with(self, side: Side) -> Self {
        Self(self.0 | side.bit())
    }

    /// Returns `true` if no side is stitched.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of stitched sides.
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }
}

impl fmt::Debug for StitchMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Side::ALL
            .iter()
            .filter(|side| self.contains(**side))
            .map(|side| match side {
                Side::North => "N",
                Side::South => "S",
                Side::East => "E",
                Side::West => "W",
            })
            .collect();
        write!(f, "StitchMask({})", names.join("|"))
    }
}

/// Upper bound on the indices [`generate_indices`] emits for `level`.
///
/// Index buffers are allocated at this size; the used count is tracked separately.
pub fn index_capacity(size: usize, level: usize) -> usize {
    let cells = size / (1usize << level);
    cells * cells * 8
}

struct IndexWriter {
    size: usize,
    indices: Vec<u32>,
}

impl IndexWriter {
    fn vertex(&self, x: usize, z: usize) -> u32 {
        (x + z * self.size) as u32
    }

    fn triangle(&mut self, a: (usize, usize), b: (usize, usize), c: (usize, usize)) {
        let (a, b, c) = (self.vertex(a.0, a.1), self.vertex(b.0, b.1), self.vertex(c.0, c.1));
        self.indices.extend_from_slice(&[a, b, c]);
    }
}

/// Emits the triangle list for a `size` x `size` tile at `level`, stitched on the
/// sides in `mask`.
///
/// Sides can only be stitched while a coarser level exists (`2^(level+1) <= size-1`);
/// stitch bits beyond that are ignored. Every output index is below `size * size`
/// and the triangles cover the tile's footprint exactly once.
pub fn generate_indices(size: usize, level: usize, mask: StitchMask) -> Vec<u32> {
    let step = 1usize << level;
    let substep = step * 2;
    let last = size - 1;
    let mask = if substep <= last { mask } else { StitchMask::EMPTY };

    let margin = |side: Side| if mask.contains(side) { step } else { 0 };
    let (north, south, east, west) = (
        margin(Side::North),
        margin(Side::South),
        margin(Side::East),
        margin(Side::West),
    );

    let mut out = IndexWriter {
        size,
        indices: Vec::with_capacity(index_capacity(size, level)),
    };

    for j in (north..last - south).step_by(step) {
        for i in (west..last - east).step_by(step) {
            out.triangle((i, j), (i, j + step), (i + step, j));
            out.triangle((i, j + step), (i + step, j + step), (i + step, j));
        }
    }

    // Along each stitched side, one coarse edge segment of length `substep` fans into
    // the fine row inside it. The corner triangle is left to the perpendicular side
    // when that side is stitched too.
    if north > 0 {
        for j in (0..last).step_by(substep) {
            if j > 0 || west == 0 {
                out.triangle((j, 0), (j, step), (j + step, step));
            }
            out.triangle((j, 0), (j + step, step), (j + substep, 0));
            if j < last - substep || east == 0 {
                out.triangle((j + substep, 0), (j + step, step), (j + substep, step));
            }
        }
    }

    if south > 0 {
        let z = last;
        for j in (0..last).step_by(substep) {
            if j > 0 || west == 0 {
                out.triangle((j, z - step), (j, z), (j + step, z - step));
            }
            out.triangle((j + step, z - step), (j, z), (j + substep, z));
            if j < last - substep || east == 0 {
                out.triangle((j + step, z - step), (j + substep, z), (j + substep, z - step));
            }
        }
    }

    if east > 0 {
        let x = last;
        for j in (0..last).step_by(substep) {
            if j > 0 || north == 0 {
                out.triangle((x, j), (x - step, j), (x - step, j + step));
            }
            out.triangle((x, j), (x - step, j + step), (x, j + substep));
            if j < last - substep || south == 0 {
                out.triangle((x, j + substep), (x - step, j + step), (x - step, j + substep));
            }
        }
    }

    if west > 0 {
        for j in (0..last).step_by(substep) {
            if j > 0 || north == 0 {
                out.triangle((0, j), (step, j + step), (step, j));
            }
            out.triangle((step, j + step), (0, j), (0, j + substep));
            if j < last - substep || south == 0 {
                out.triangle((step, j + step), (0, j + substep), (step, j + substep));
            }
        }
    }

    out.indices
}
