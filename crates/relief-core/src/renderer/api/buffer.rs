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

//! Defines data structures related to buffer resources.

use super::render_operation::IndexFormat;
use crate::renderer::error::ResourceError;
use bytemuck::Pod;
use std::mem;

/// An opaque handle to a buffer resource.
///
/// This ID is returned by [`BufferService`](crate::renderer::BufferService) and is used
/// to reference the buffer in all subsequent operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

/// Hint describing how the contents of a buffer will be updated.
///
/// Backends use it to pick a memory placement; the software backend ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    /// Written once, read many times by the GPU.
    Static,
    /// Rewritten frequently from the CPU.
    Dynamic,
    /// Written once and never read back by the CPU.
    #[default]
    StaticWriteOnly,
    /// Rewritten frequently and never read back by the CPU.
    DynamicWriteOnly,
}

/// How the existing contents of a buffer are treated when it is locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Keep the current contents; writes update them in place.
    Normal,
    /// The caller will overwrite everything; previous contents may be dropped.
    Discard,
}

/// A descriptor used to create a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBufferDescriptor {
    /// Size of one vertex in bytes.
    pub element_size: usize,
    /// Number of vertices.
    pub count: usize,
    /// Update frequency hint.
    pub usage: BufferUsage,
}

impl VertexBufferDescriptor {
    /// Total size of the buffer in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.element_size * self.count
    }
}

/// A descriptor used to create an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBufferDescriptor {
    /// Width of a single index.
    pub format: IndexFormat,
    /// Number of indices.
    pub count: usize,
    /// Update frequency hint.
    pub usage: BufferUsage,
}

impl IndexBufferDescriptor {
    /// Total size of the buffer in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.format.size_in_bytes() * self.count
    }
}

/// A scoped, bounds-checked write view over a locked buffer.
///
/// The buffer is viewed as `len()` elements of `stride` bytes each. The lock is
/// released when the view is dropped; while it lives, the borrow on the owning
/// [`BufferService`](crate::renderer::BufferService) prevents any other access.
#[derive(Debug)]
pub struct BufferLock<'a> {
    id: BufferId,
    bytes: &'a mut [u8],
    stride: usize,
}

impl<'a> BufferLock<'a> {
    /// Wraps a backend's byte storage. Called by `BufferService` implementations.
    ///
    /// A `stride` of zero is treated as one byte.
    pub fn new(id: BufferId, bytes: &'a mut [u8], stride: usize) -> Self {
        log::trace!("Locked buffer {:?} ({} bytes)", id, bytes.len());
        Self {
            id,
            bytes,
            stride: stride.max(1),
        }
    }

    /// The handle of the locked buffer.
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Size of one element in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of whole elements in the view.
    pub fn len(&self) -> usize {
        self.bytes.len() / self.stride
    }

    /// Returns `true` if the view holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn element_range<T: Pod>(&self, index: usize) -> Result<std::ops::Range<usize>, ResourceError> {
        let len = self.len();
        if index >= len || mem::size_of::<T>() > self.stride {
            return Err(ResourceError::OutOfBounds { index, len });
        }
        let start = index * self.stride;
        Ok(start..start + mem::size_of::<T>())
    }

    /// Writes `value` at element `index`.
    pub fn write<T: Pod>(&mut self, index: usize, value: &T) -> Result<(), ResourceError> {
        let range = self.element_range::<T>(index)?;
        self.bytes[range].copy_from_slice(bytemuck::bytes_of(value));
        Ok(())
    }

    /// Writes consecutive elements starting at `first`.
    ///
    /// Nothing is written if the slice would run past the end of the view.
    pub fn write_slice<T: Pod>(&mut self, first: usize, values: &[T]) -> Result<(), ResourceError> {
        let len = self.len();
        let last = first + values.len();
        if last > len {
            return Err(ResourceError::OutOfBounds { index: last - 1, len });
        }
        for (offset, value) in values.iter().enumerate() {
            self.write(first + offset, value)?;
        }
        Ok(())
    }

    /// Reads the element at `index`.
    pub fn read<T: Pod>(&self, index: usize) -> Result<T, ResourceError> {
        let range = self.element_range::<T>(index)?;
        Ok(bytemuck::pod_read_unaligned(&self.bytes[range]))
    }
}

impl Drop for BufferLock<'_> {
    fn drop(&mut self) {
        log::trace!("Unlocked buffer {:?}", self.id);
    }
}
