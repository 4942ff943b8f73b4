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

//! # Relief Core
//!
//! Foundational crate containing math primitives, renderer contracts and the
//! scene-graph interfaces shared by the terrain engine and its backends.
//!
//! Nothing in here talks to a GPU. Backends implement [`renderer::BufferService`]
//! and the terrain crate only ever writes through the scoped [`renderer::BufferLock`].

#![warn(missing_docs)]

pub mod height_source;
pub mod math;
pub mod renderer;
pub mod scene;

pub use height_source::HeightSource;
