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

use crate::renderer::api::{
    BufferId, BufferLock, IndexBufferDescriptor, LockMode, VertexBufferDescriptor,
};
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// Allocates and hands out scoped access to vertex and index buffers.
///
/// This is the only way the terrain engine touches buffer memory. Implementations
/// live in `relief-infra` (or in an application's own GPU backend).
///
/// Every method takes `&mut self` so that a live [`BufferLock`] statically excludes
/// any other use of the service until it is dropped.
pub trait BufferService: Send + Debug {
    /// Creates a vertex buffer large enough for `descriptor.count` elements.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::OutOfMemory`] if the backend cannot satisfy the request.
    fn create_vertex_buffer(
        &mut self,
        descriptor: &VertexBufferDescriptor,
    ) -> Result<BufferId, ResourceError>;

    /// Creates an index buffer large enough for `descriptor.count` indices.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::OutOfMemory`] if the backend cannot satisfy the request.
    fn create_index_buffer(
        &mut self,
        descriptor: &IndexBufferDescriptor,
    ) -> Result<BufferId, ResourceError>;

    /// Locks a buffer for writing. The lock is released when the returned view is dropped.
    fn lock(&mut self, id: BufferId, mode: LockMode) -> Result<BufferLock<'_>, ResourceError>;

    /// Returns the raw contents of a buffer.
    fn read(&self, id: BufferId) -> Result<&[u8], ResourceError>;

    /// Destroys a buffer, releasing its memory.
    fn destroy_buffer(&mut self, id: BufferId) -> Result<(), ResourceError>;
}
