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

use relief_core::renderer::{
    BufferId, BufferLock, BufferService, BufferUsage, IndexBufferDescriptor, LockMode,
    ResourceError, VertexBufferDescriptor,
};
use std::collections::HashMap;

/// Internal representation of a buffer held in system memory.
#[derive(Debug)]
struct SoftwareBufferEntry {
    bytes: Vec<u8>,
    stride: usize,
    usage: BufferUsage,
}

/// A [`BufferService`] that keeps every buffer in a `Vec<u8>`.
///
/// An optional byte budget makes allocations fail with
/// [`ResourceError::OutOfMemory`] once exhausted, which lets callers exercise
/// their allocation-failure paths without a GPU.
#[derive(Debug, Default)]
pub struct SoftwareBufferService {
    buffers: HashMap<BufferId, SoftwareBufferEntry>,
    next_buffer_id: usize,
    budget_bytes: Option<usize>,
    allocated_bytes: usize,
    peak_bytes: usize,
}

impl SoftwareBufferService {
    /// Creates a service with unlimited memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service that refuses to hold more than `budget_bytes` at once.
    pub fn with_budget(budget_bytes: usize) -> Self {
        Self {
            budget_bytes: Some(budget_bytes),
            ..Self::default()
        }
    }

    /// Bytes currently allocated across all live buffers.
    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes
    }

    /// Highest value `allocated_bytes` has reached.
    pub fn peak_bytes(&self) -> usize {
        self.peak_bytes
    }

    /// Number of live buffers.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Usage hint a buffer was created with.
    pub fn usage(&self, id: BufferId) -> Result<BufferUsage, ResourceError> {
        self.entry(id).map(|entry| entry.usage)
    }

    fn entry(&self, id: BufferId) -> Result<&SoftwareBufferEntry, ResourceError> {
        self.buffers.get(&id).ok_or(ResourceError::InvalidHandle(id))
    }

    fn allocate(
        &mut self,
        stride: usize,
        count: usize,
        usage: BufferUsage,
    ) -> Result<BufferId, ResourceError> {
        if stride == 0 {
            return Err(ResourceError::InvalidDescriptor(
                "element size must be non-zero".to_owned(),
            ));
        }
        let size = stride.checked_mul(count).ok_or_else(|| {
            ResourceError::InvalidDescriptor(format!("{count} elements of {stride} bytes overflow"))
        })?;

        if let Some(budget) = self.budget_bytes {
            let available = budget.saturating_sub(self.allocated_bytes);
            if size > available {
                log::warn!(
                    "SoftwareBufferService: allocation of {size} bytes refused ({available} available)"
                );
                return Err(ResourceError::OutOfMemory {
                    requested: size,
                    available,
                });
            }
        }

        let id = BufferId(self.next_buffer_id);
        self.next_buffer_id += 1;
        self.buffers.insert(
            id,
            SoftwareBufferEntry {
                bytes: vec![0; size],
                stride,
                usage,
            },
        );
        self.allocated_bytes += size;
        self.peak_bytes = self.peak_bytes.max(self.allocated_bytes);

        log::debug!("SoftwareBufferService: created buffer {id:?}, size: {size} bytes");
        Ok(id)
    }
}

impl BufferService for SoftwareBufferService {
    fn create_vertex_buffer(
        &mut self,
        descriptor: &VertexBufferDescriptor,
    ) -> Result<BufferId, ResourceError> {
        self.allocate(descriptor.element_size, descriptor.count, descriptor.usage)
    }

    fn create_index_buffer(
        &mut self,
        descriptor: &IndexBufferDescriptor,
    ) -> Result<BufferId, ResourceError> {
        self.allocate(
            descriptor.format.size_in_bytes(),
            descriptor.count,
            descriptor.usage,
        )
    }

    fn lock(&mut self, id: BufferId, mode: LockMode) -> Result<BufferLock<'_>, ResourceError> {
        let entry = self
            .buffers
            .get_mut(&id)
            .ok_or(ResourceError::InvalidHandle(id))?;
        if mode == LockMode::Discard {
            entry.bytes.fill(0);
        }
        Ok(BufferLock::new(id, &mut entry.bytes, entry.stride))
    }

    fn read(&self, id: BufferId) -> Result<&[u8], ResourceError> {
        self.entry(id).map(|entry| entry.bytes.as_slice())
    }

    fn destroy_buffer(&mut self, id: BufferId) -> Result<(), ResourceError> {
        let entry = self
            .buffers
            .remove(&id)
            .ok_or(ResourceError::InvalidHandle(id))?;
        self.allocated_bytes -= entry.bytes.len();
        log::debug!("SoftwareBufferService: destroyed buffer {id:?}");
        Ok(())
    }
}
