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

//! Defines the error type for buffer resources.

use super::api::BufferId;
use std::fmt;

/// An error related to the creation or use of a buffer resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// The backend could not satisfy an allocation request.
    OutOfMemory {
        /// Number of bytes requested.
        requested: usize,
        /// Number of bytes still available to the backend.
        available: usize,
    },
    /// The handle used to reference a buffer is unknown to the service.
    InvalidHandle(BufferId),
    /// An element access fell outside the locked region, or the element type
    /// does not fit in the buffer's stride.
    OutOfBounds {
        /// Element index that was accessed.
        index: usize,
        /// Number of elements in the buffer.
        len: usize,
    },
    /// A descriptor was rejected before allocation (e.g. zero-sized elements).
    InvalidDescriptor(String),
    /// An error originating from the specific backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::OutOfMemory {
                requested,
                available,
            } => write!(
                f,
                "Out of buffer memory: requested {requested} bytes, {available} available"
            ),
            ResourceError::InvalidHandle(id) => write!(f, "Invalid buffer handle: {id:?}"),
            ResourceError::OutOfBounds { index, len } => {
                write!(f, "Buffer access out of bounds: index {index}, length {len}")
            }
            ResourceError::InvalidDescriptor(msg) => {
                write!(f, "Invalid buffer descriptor: {msg}")
            }
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}
