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

//! The contract between renderable world objects and the scene manager that culls
//! and queues them.

use crate::math::{Aabb, Vec3};
use std::collections::BTreeMap;

/// Identifies a renderable submitted to a [`RenderQueue`].
///
/// For terrain this is the tile's linear index within its grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderableId(pub usize);

/// Ordered buckets of the render queue. Lower groups draw first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderQueueGroup {
    /// Sky boxes and other backdrops.
    Background,
    /// Static world geometry such as terrain.
    WorldGeometry,
    /// Regular scene objects.
    Main,
    /// Overlays drawn after everything else.
    Overlay,
}

/// A single queued draw with its sort key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuedRenderable {
    /// The submitted renderable.
    pub id: RenderableId,
    /// Squared distance to the camera at submission time.
    pub squared_view_depth: f32,
}

/// Collects the renderables visible this frame, grouped by [`RenderQueueGroup`].
#[derive(Debug, Default, Clone)]
pub struct RenderQueue {
    groups: BTreeMap<RenderQueueGroup, Vec<QueuedRenderable>>,
}

impl RenderQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Submits a renderable to `group`.
    pub fn add(&mut self, group: RenderQueueGroup, id: RenderableId, squared_view_depth: f32) {
        self.groups.entry(group).or_default().push(QueuedRenderable {
            id,
            squared_view_depth,
        });
    }

    /// Returns the renderables queued in `group`, in submission order.
    pub fn group(&self, group: RenderQueueGroup) -> &[QueuedRenderable] {
        self.groups.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sorts each group front to back.
    pub fn sort_front_to_back(&mut self) {
        for items in self.groups.values_mut() {
            items.sort_by(|a, b| a.squared_view_depth.total_cmp(&b.squared_view_depth));
        }
    }

    /// Total number of queued renderables.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing has been queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empties every group, keeping allocations for the next frame.
    pub fn clear(&mut self) {
        self.groups.values_mut().for_each(Vec::clear);
    }
}

/// An object placed in the world that the scene manager can cull and queue.
pub trait MovableObject {
    /// World-space bounds of the object.
    fn bounding_box(&self) -> Aabb;

    /// Radius of a sphere around the box center enclosing the whole object.
    fn bounding_radius(&self) -> f32;

    /// Called once per frame with the active camera position, before queueing.
    fn notify_current_camera(&mut self, camera_position: Vec3);

    /// Submits the object's renderables to the queue.
    fn update_render_queue(&self, queue: &mut RenderQueue);

    /// Squared distance from the last notified camera to the object.
    fn squared_view_depth(&self, camera_position: Vec3) -> f32 {
        self.bounding_box().center().distance_squared(camera_position)
    }
}
