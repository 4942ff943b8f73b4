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

//! The draw description produced for each visible terrain tile.

use super::buffer::BufferId;

/// The format of the indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// Indices are 16-bit unsigned integers.
    Uint16,
    /// Indices are 32-bit unsigned integers.
    Uint32,
}

impl IndexFormat {
    /// Width of one index in bytes.
    pub const fn size_in_bytes(self) -> usize {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }

    /// Smallest format able to address `vertex_count` vertices.
    pub const fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count <= u16::MAX as usize + 1 {
            IndexFormat::Uint16
        } else {
            IndexFormat::Uint32
        }
    }
}

/// Defines how a sequence of vertices is interpreted to form primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Every three indices form an isolated triangle.
    #[default]
    TriangleList,
    /// Indices form a connected triangle strip.
    TriangleStrip,
}

/// Everything the renderer needs to issue one indexed draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOperation {
    /// Vertex buffer shared by every index list of the tile.
    pub vertex_buffer: BufferId,
    /// Number of vertices in `vertex_buffer`.
    pub vertex_count: usize,
    /// Index buffer for the current level and stitch combination.
    pub index_buffer: BufferId,
    /// Number of indices actually used. The buffer itself may be larger.
    pub index_count: usize,
    /// Width of the indices in `index_buffer`.
    pub index_format: IndexFormat,
    /// Primitive assembly mode.
    pub topology: PrimitiveTopology,
}

impl RenderOperation {
    /// Number of primitives the draw produces.
    pub fn primitive_count(&self) -> usize {
        match self.topology {
            PrimitiveTopology::TriangleList => self.index_count / 3,
            PrimitiveTopology::TriangleStrip => self.index_count.saturating_sub(2),
        }
    }
}
