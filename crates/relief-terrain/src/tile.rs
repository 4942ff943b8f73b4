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

//! A single terrain tile: vertex data, level selection, stitched index lists and
//! height interpolation.

use crate::error::TerrainError;
use crate::lod::LevelErrorTable;
use crate::options::TileOptions;
use crate::stitch::{self, Side, StitchMask};
use ahash::AHashMap;
use relief_core::math::{Aabb, Vec2, Vec3};
use relief_core::renderer::{
    BufferId, BufferService, BufferUsage, IndexBufferDescriptor, IndexFormat, LockMode,
    PrimitiveTopology, RenderOperation, ResourceError, VertexBufferDescriptor,
};
use relief_core::scene::{MovableObject, RenderQueue, RenderQueueGroup, RenderableId};
use std::mem;

/// Position of a tile within its grid, in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TileCoord {
    /// Column, growing east.
    pub x: usize,
    /// Row, growing south.
    pub z: usize,
}

impl TileCoord {
    /// Creates a new coordinate.
    pub const fn new(x: usize, z: usize) -> Self {
        Self { x, z }
    }
}

/// Layout of one vertex in a tile's vertex buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainVertex {
    /// World-space position.
    pub position: Vec3,
    /// Surface normal; `+Y` unless vertex normals are enabled.
    pub normal: Vec3,
    /// Texture coordinate spanning the whole world once.
    pub uv0: Vec2,
    /// Detail texture coordinate, repeated `detail_tile` times per tile.
    pub uv1: Vec2,
}

/// Index buffer cached for one `(level, mask)` combination.
#[derive(Debug, Clone, Copy)]
struct CachedIndices {
    buffer: BufferId,
    count: usize,
}

/// One square patch of terrain rendered as a unit.
///
/// Tiles never reference each other directly. Neighbors are stored as grid
/// coordinates and their levels are passed in by the owning
/// [`TerrainGrid`](crate::TerrainGrid).
#[derive(Debug)]
pub struct TerrainTile {
    id: RenderableId,
    coord: TileCoord,
    options: TileOptions,
    vertices: Vec<TerrainVertex>,
    bounding_box: Aabb,
    center: Vec3,
    error_table: LevelErrorTable,
    render_level: usize,
    forced_render_level: Option<usize>,
    view_depth_sqr: f32,
    neighbors: [Option<TileCoord>; 4],
    vertex_buffer: BufferId,
    index_format: IndexFormat,
    index_cache: AHashMap<(usize, StitchMask), CachedIndices>,
}

impl TerrainTile {
    /// Builds the tile's vertices and error table and uploads the vertex buffer.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::Resource`] if the vertex buffer cannot be created or filled.
    pub fn init(
        id: RenderableId,
        coord: TileCoord,
        options: TileOptions,
        service: &mut dyn BufferService,
    ) -> Result<Self, TerrainError> {
        let size = options.size();
        let scale = options.scale();
        let world_size = options.world_size() as f32;
        let detail = options.detail_tile();

        let mut vertices = Vec::with_capacity(size * size);
        let mut bounding_box = Aabb::INVALID;
        for j in 0..size {
            for i in 0..size {
                let world_x = (options.start_x() + i) as f32;
                let world_z = (options.start_z() + j) as f32;
                let height = f32::from(options.local_height(i, j));
                let position = Vec3::new(world_x * scale.x, height * scale.y, world_z * scale.z);
                bounding_box = bounding_box.merged_with_point(position);
                vertices.push(TerrainVertex {
                    position,
                    normal: Vec3::Y,
                    uv0: Vec2::new(world_x / world_size, world_z / world_size),
                    uv1: Vec2::new(
                        world_x / size as f32 * detail,
                        world_z / size as f32 * detail,
                    ),
                });
            }
        }

        let error_table = LevelErrorTable::compute(&options);
        log::debug!(
            "Tile {:?}: level thresholds {:?}",
            coord,
            error_table.as_slice()
        );

        let vertex_buffer = service.create_vertex_buffer(&VertexBufferDescriptor {
            element_size: mem::size_of::<TerrainVertex>(),
            count: vertices.len(),
            usage: BufferUsage::StaticWriteOnly,
        })?;

        let tile = Self {
            id,
            coord,
            index_format: IndexFormat::for_vertex_count(size * size),
            center: bounding_box.center(),
            bounding_box,
            options,
            vertices,
            error_table,
            render_level: 0,
            forced_render_level: None,
            view_depth_sqr: 0.0,
            neighbors: [None; 4],
            vertex_buffer,
            index_cache: AHashMap::new(),
        };
        tile.upload_vertices(service)?;
        Ok(tile)
    }

    fn upload_vertices(&self, service: &mut dyn BufferService) -> Result<(), TerrainError> {
        let mut lock = service.lock(self.vertex_buffer, LockMode::Discard)?;
        lock.write_slice(0, &self.vertices)?;
        Ok(())
    }

    /// Grid coordinate of the tile.
    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Identifier used when queueing the tile.
    pub fn renderable_id(&self) -> RenderableId {
        self.id
    }

    /// The options the tile was built from.
    pub fn options(&self) -> &TileOptions {
        &self.options
    }

    /// Edge length in vertices.
    pub fn size(&self) -> usize {
        self.options.size()
    }

    /// CPU copy of the vertex data, row-major.
    pub fn vertices(&self) -> &[TerrainVertex] {
        &self.vertices
    }

    /// World-space position of tile-local vertex `(x, z)`.
    pub fn vertex_position(&self, x: usize, z: usize) -> Vec3 {
        self.vertices[x + z * self.size()].position
    }

    /// Center of the bounding box, used for level selection.
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Per-level distance thresholds.
    pub fn error_table(&self) -> &LevelErrorTable {
        &self.error_table
    }

    /// Level currently selected for rendering.
    pub fn render_level(&self) -> usize {
        self.render_level
    }

    /// Level override, if any.
    pub fn forced_render_level(&self) -> Option<usize> {
        self.forced_render_level
    }

    /// Pins the tile to `level` regardless of camera distance, or clears the pin.
    ///
    /// Levels past the coarsest are clamped to it.
    pub fn set_forced_render_level(&mut self, level: Option<usize>) {
        let coarsest = self.options.max_mip_levels() - 1;
        self.forced_render_level = level.map(|l| {
            if l > coarsest {
                log::warn!(
                    "Tile {:?}: forced level {} clamped to {}",
                    self.coord,
                    l,
                    coarsest
                );
            }
            l.min(coarsest)
        });
    }

    /// Sets the level outright, clamped to the coarsest.
    pub(crate) fn set_render_level(&mut self, level: usize) {
        self.render_level = level.min(self.options.max_mip_levels() - 1);
    }

    /// Raises the level to at least `level`. Used by neighbor relaxation.
    pub(crate) fn raise_render_level(&mut self, level: usize) {
        let level = level.min(self.options.max_mip_levels() - 1);
        if level > self.render_level {
            log::trace!(
                "Tile {:?}: level raised {} -> {} to match neighbor",
                self.coord,
                self.render_level,
                level
            );
            self.render_level = level;
        }
    }

    /// Neighbor on `side`, if any.
    pub fn neighbor(&self, side: Side) -> Option<TileCoord> {
        self.neighbors[side.index()]
    }

    /// Sets or clears the neighbor on `side`.
    pub fn set_neighbor(&mut self, side: Side, neighbor: Option<TileCoord>) {
        self.neighbors[side.index()] = neighbor;
    }

    /// Level this tile would pick for a camera at `camera_position`.
    pub fn select_level(&self, camera_position: Vec3) -> usize {
        match self.forced_render_level {
            Some(level) => level,
            None => self
                .error_table
                .select_level(self.center.distance_squared(camera_position)),
        }
    }

    /// Sides whose neighbor renders strictly coarser than this tile.
    ///
    /// `neighbor_levels` is indexed by [`Side::index`].
    pub fn stitch_mask(&self, neighbor_levels: [Option<usize>; 4]) -> StitchMask {
        Side::ALL
            .into_iter()
            .filter(|side| {
                neighbor_levels[side.index()].is_some_and(|level| level > self.render_level)
            })
            .fold(StitchMask::EMPTY, StitchMask::with)
    }

    /// Returns the draw for the current level, stitched against coarser neighbors.
    ///
    /// Index lists are generated on the first request for a `(level, mask)` pair and
    /// reused afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::Resource`] if a new index buffer cannot be created or filled.
    pub fn get_render_operation(
        &mut self,
        neighbor_levels: [Option<usize>; 4],
        service: &mut dyn BufferService,
    ) -> Result<RenderOperation, TerrainError> {
        let mask = self.stitch_mask(neighbor_levels);
        let key = (self.render_level, mask);
        let cached = match self.index_cache.get(&key) {
            Some(cached) => *cached,
            None => {
                let cached = self.build_index_buffer(self.render_level, mask, service)?;
                self.index_cache.insert(key, cached);
                cached
            }
        };

        Ok(RenderOperation {
            vertex_buffer: self.vertex_buffer,
            vertex_count: self.vertices.len(),
            index_buffer: cached.buffer,
            index_count: cached.count,
            index_format: self.index_format,
            topology: PrimitiveTopology::TriangleList,
        })
    }

    fn build_index_buffer(
        &self,
        level: usize,
        mask: StitchMask,
        service: &mut dyn BufferService,
    ) -> Result<CachedIndices, TerrainError> {
        let size = self.size();
        let indices = stitch::generate_indices(size, level, mask);
        let capacity = stitch::index_capacity(size, level).max(indices.len());
        log::debug!(
            "Tile {:?}: generating indices for level {} {:?} ({} of {} used)",
            self.coord,
            level,
            mask,
            indices.len(),
            capacity
        );

        let buffer = service.create_index_buffer(&IndexBufferDescriptor {
            format: self.index_format,
            count: capacity,
            usage: BufferUsage::StaticWriteOnly,
        })?;
        if let Err(err) = write_indices(service, buffer, self.index_format, &indices) {
            log::warn!(
                "Tile {:?}: releasing index buffer {:?} after failed fill: {}",
                self.coord,
                buffer,
                err
            );
            service.destroy_buffer(buffer)?;
            return Err(err.into());
        }

        Ok(CachedIndices {
            buffer,
            count: indices.len(),
        })
    }

    /// Number of distinct index lists generated so far.
    pub fn cached_index_lists(&self) -> usize {
        self.index_cache.len()
    }

    /// Side a query at world `(x, z)` should be handed to, if any.
    ///
    /// That is the first of west, east, north and south on which the point lies
    /// outside the tile and a neighbor exists.
    pub fn delegate_side(&self, x: f32, z: f32) -> Option<Side> {
        let start = self.vertices[0].position;
        let end = self.vertices[self.vertices.len() - 1].position;
        [
            (Side::West, x < start.x),
            (Side::East, x > end.x),
            (Side::North, z < start.z),
            (Side::South, z > end.z),
        ]
        .into_iter()
        .find(|(side, outside)| *outside && self.neighbor(*side).is_some())
        .map(|(side, _)| side)
    }

    /// Height of the rendered full-detail surface at world `(x, z)`.
    ///
    /// Coordinates outside the tile are clamped to its edge. The result lies on the
    /// triangle the level 0 mesh draws at that point, not on a bilinear patch.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let size = self.size();
        let scale = self.options.scale();
        let start = self.vertices[0].position;
        let end = self.vertices[size * size - 1].position;

        let x = x.clamp(start.x, end.x);
        let z = z.clamp(start.z, end.z);
        let (x_index, x_pct) = split_cell((x - start.x) / scale.x, size);
        let (z_index, z_pct) = split_cell((z - start.z) / scale.z, size);

        let height = |i: usize, j: usize| self.vertices[i + j * size].position.y;
        let mut t1 = height(x_index, z_index);
        let t2 = height(x_index + 1, z_index);
        let b1 = height(x_index, z_index + 1);
        let mut b2 = height(x_index + 1, z_index + 1);

        // Replace the corner off the query's triangle by its reflection through the
        // t2-b1 diagonal so the blend below stays on that triangle's plane.
        let mid = (t2 + b1) * 0.5;
        if x_pct + z_pct <= 1.0 {
            b2 = mid + (mid - t1);
        } else {
            t1 = mid + (mid - b2);
        }

        let top = t1 * (1.0 - x_pct) + t2 * x_pct;
        let bottom = b1 * (1.0 - x_pct) + b2 * x_pct;
        top * (1.0 - z_pct) + bottom * z_pct
    }

    /// Replaces the vertex normals and re-uploads the vertex buffer.
    ///
    /// `normals` is row-major, one per vertex.
    pub(crate) fn update_normals(
        &mut self,
        normals: &[Vec3],
        service: &mut dyn BufferService,
    ) -> Result<(), TerrainError> {
        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            vertex.normal = *normal;
        }
        self.upload_vertices(service)
    }

    /// Releases the vertex buffer and every cached index buffer.
    pub fn destroy(self, service: &mut dyn BufferService) -> Result<(), TerrainError> {
        for cached in self.index_cache.values() {
            service.destroy_buffer(cached.buffer)?;
        }
        service.destroy_buffer(self.vertex_buffer)?;
        Ok(())
    }
}

fn write_indices(
    service: &mut dyn BufferService,
    buffer: BufferId,
    format: IndexFormat,
    indices: &[u32],
) -> Result<(), ResourceError> {
    let mut lock = service.lock(buffer, LockMode::Discard)?;
    match format {
        IndexFormat::Uint16 => {
            for (k, index) in indices.iter().enumerate() {
                lock.write(k, &(*index as u16))?;
            }
            Ok(())
        }
        IndexFormat::Uint32 => lock.write_slice(0, indices),
    }
}

/// Splits a fractional grid coordinate into a cell index and the offset within it.
/// The far edge maps to the last cell with an offset of one.
fn split_cell(pt: f32, size: usize) -> (usize, f32) {
    let last_cell = size - 2;
    let index = pt.max(0.0).floor() as usize;
    if index > last_cell {
        (last_cell, 1.0)
    } else {
        (index, (pt - index as f32).clamp(0.0, 1.0))
    }
}

impl MovableObject for TerrainTile {
    fn bounding_box(&self) -> Aabb {
        self.bounding_box
    }

    fn bounding_radius(&self) -> f32 {
        self.bounding_box.half_extents().length()
    }

    fn notify_current_camera(&mut self, camera_position: Vec3) {
        let level = self.select_level(camera_position);
        if level != self.render_level {
            log::trace!(
                "Tile {:?}: level {} -> {}",
                self.coord,
                self.render_level,
                level
            );
        }
        self.render_level = level;
        self.view_depth_sqr = self.center.distance_squared(camera_position);
    }

    fn update_render_queue(&self, queue: &mut RenderQueue) {
        queue.add(RenderQueueGroup::WorldGeometry, self.id, self.view_depth_sqr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::height_field::HeightField;
    use approx::assert_relative_eq;
    use relief_core::renderer::BufferLock;
    use relief_infra::SoftwareBufferService;
    use std::sync::Arc;

    /// Software backend whose locks can be made to fail.
    #[derive(Debug, Default)]
    struct FlakyLockService {
        inner: SoftwareBufferService,
        fail_locks: bool,
    }

    impl BufferService for FlakyLockService {
        fn create_vertex_buffer(
            &mut self,
            descriptor: &VertexBufferDescriptor,
        ) -> Result<BufferId, ResourceError> {
            self.inner.create_vertex_buffer(descriptor)
        }

        fn create_index_buffer(
            &mut self,
            descriptor: &IndexBufferDescriptor,
        ) -> Result<BufferId, ResourceError> {
            self.inner.create_index_buffer(descriptor)
        }

        fn lock(
            &mut self,
            id: BufferId,
            mode: LockMode,
        ) -> Result<BufferLock<'_>, ResourceError> {
            if self.fail_locks {
                return Err(ResourceError::BackendError("device lost".to_string()));
            }
            self.inner.lock(id, mode)
        }

        fn read(&self, id: BufferId) -> Result<&[u8], ResourceError> {
            self.inner.read(id)
        }

        fn destroy_buffer(&mut self, id: BufferId) -> Result<(), ResourceError> {
            self.inner.destroy_buffer(id)
        }
    }

    fn tile_over(
        field: HeightField,
        size: usize,
        levels: usize,
    ) -> (TerrainTile, SoftwareBufferService) {
        let options = TileOptions::builder(Arc::new(field))
            .size(size)
            .max_mip_levels(levels)
            .build()
            .unwrap();
        let mut service = SoftwareBufferService::new();
        let tile = TerrainTile::init(RenderableId(0), TileCoord::new(0, 0), options, &mut service)
            .unwrap();
        (tile, service)
    }

    #[test]
    fn test_init_builds_vertices_and_bounds() {
        let field = HeightField::from_fn(5, |x, _| x as u16);
        let (tile, service) = tile_over(field, 5, 3);
        assert_eq!(tile.vertices().len(), 25);
        assert_eq!(tile.vertex_position(4, 2), Vec3::new(4.0, 4.0, 2.0));
        assert_eq!(tile.bounding_box().min, Vec3::ZERO);
        assert_eq!(tile.bounding_box().max, Vec3::new(4.0, 4.0, 4.0));
        assert_eq!(tile.center(), Vec3::new(2.0, 2.0, 2.0));
        assert_relative_eq!(tile.bounding_radius(), 12.0f32.sqrt());
        assert_eq!(tile.vertices()[24].uv0, Vec2::new(0.8, 0.8));
        assert_eq!(service.buffer_count(), 1);

        let bytes = service.read(tile.vertex_buffer).unwrap();
        assert_eq!(bytes.len(), 25 * mem::size_of::<TerrainVertex>());
        let uploaded: Vec<TerrainVertex> = bytes
            .chunks_exact(mem::size_of::<TerrainVertex>())
            .map(bytemuck::pod_read_unaligned)
            .collect();
        assert_eq!(uploaded, tile.vertices());
    }

    #[test]
    fn test_notify_current_camera_selects_by_distance() {
        let (mut tile, _service) = tile_over(HeightField::flat(5, 10), 5, 3);
        assert_eq!(tile.error_table().as_slice(), &[0.0, 1.0, 2.0]);

        tile.notify_current_camera(tile.center());
        assert_eq!(tile.render_level(), 0);
        tile.notify_current_camera(tile.center() + Vec3::new(0.0, 100.0, 0.0));
        assert_eq!(tile.render_level(), 2);
    }

    #[test]
    fn test_forced_level_overrides_distance() {
        let (mut tile, _service) = tile_over(HeightField::flat(5, 0), 5, 3);
        tile.set_forced_render_level(Some(1));
        tile.notify_current_camera(tile.center());
        assert_eq!(tile.render_level(), 1);
        tile.set_forced_render_level(Some(9));
        assert_eq!(tile.forced_render_level(), Some(2));
        tile.set_forced_render_level(None);
        tile.notify_current_camera(tile.center());
        assert_eq!(tile.render_level(), 0);
    }

    #[test]
    fn test_render_operation_is_cached() {
        let (mut tile, mut service) = tile_over(HeightField::flat(5, 0), 5, 3);
        let first = tile.get_render_operation([None; 4], &mut service).unwrap();
        let second = tile.get_render_operation([None; 4], &mut service).unwrap();
        assert_eq!(first, second);
        assert_eq!(tile.cached_index_lists(), 1);
        assert_eq!(first.index_count, 96);
        assert_eq!(first.index_format, IndexFormat::Uint16);
        assert_eq!(service.buffer_count(), 2);
    }

    #[test]
    fn test_failed_index_fill_releases_buffer() {
        let options = TileOptions::builder(Arc::new(HeightField::flat(5, 0)))
            .size(5)
            .max_mip_levels(3)
            .build()
            .unwrap();
        let mut service = FlakyLockService::default();
        let mut tile =
            TerrainTile::init(RenderableId(0), TileCoord::new(0, 0), options, &mut service)
                .unwrap();
        let bytes_with_vertices = service.inner.allocated_bytes();

        service.fail_locks = true;
        let err = tile
            .get_render_operation([None; 4], &mut service)
            .unwrap_err();
        assert!(matches!(
            err,
            TerrainError::Resource(ResourceError::BackendError(_))
        ));
        assert_eq!(service.inner.buffer_count(), 1);
        assert_eq!(service.inner.allocated_bytes(), bytes_with_vertices);
        assert_eq!(tile.cached_index_lists(), 0);

        service.fail_locks = false;
        assert!(tile.get_render_operation([None; 4], &mut service).is_ok());
        assert_eq!(service.inner.buffer_count(), 2);
    }

    #[test]
    fn test_stitch_mask_from_neighbor_levels() {
        let (tile, _service) = tile_over(HeightField::flat(5, 0), 5, 3);
        assert_eq!(tile.stitch_mask([Some(1); 4]), StitchMask::ALL);
        assert_eq!(
            tile.stitch_mask([Some(0), None, Some(1), Some(0)]),
            StitchMask::EAST
        );
    }

    #[test]
    fn test_index_buffer_contents_match_generated_list() {
        let (mut tile, mut service) = tile_over(HeightField::flat(5, 0), 5, 3);
        let op = tile.get_render_operation([Some(1); 4], &mut service).unwrap();
        assert_eq!(op.index_count, 72);
        let bytes = service.read(op.index_buffer).unwrap();
        let stored: Vec<u16> = bytes
            .chunks_exact(mem::size_of::<u16>())
            .map(bytemuck::pod_read_unaligned)
            .collect();
        let expected = stitch::generate_indices(5, 0, StitchMask::ALL);
        assert!(stored.len() >= expected.len());
        for (stored, expected) in stored.iter().zip(&expected) {
            assert_eq!(u32::from(*stored), *expected);
        }
    }

    #[test]
    fn test_height_at_sits_on_rendered_triangle() {
        // Only the (1, 1) corner is raised. The first triangle of cell (0, 0) does
        // not contain it, so the surface there stays flat.
        let field = HeightField::from_fn(5, |x, z| if (x, z) == (1, 1) { 8 } else { 0 });
        let (tile, _service) = tile_over(field, 5, 3);
        assert_relative_eq!(tile.height_at(0.25, 0.25), 0.0);
        assert_relative_eq!(tile.height_at(0.5, 0.5), 0.0);
        assert_relative_eq!(tile.height_at(0.75, 0.75), 4.0);
        assert_relative_eq!(tile.height_at(1.0, 1.0), 8.0);
    }

    #[test]
    fn test_height_at_clamps_outside() {
        let field = HeightField::from_fn(5, |x, z| (x + z) as u16);
        let (tile, _service) = tile_over(field, 5, 3);
        assert_relative_eq!(tile.height_at(-50.0, 2.0), tile.height_at(0.0, 2.0));
        assert_relative_eq!(tile.height_at(4.0, 4.0), 8.0);
        assert_relative_eq!(tile.height_at(100.0, 100.0), 8.0);
        assert_relative_eq!(tile.height_at(2.5, 1.5), 4.0);
    }

    #[test]
    fn test_delegate_side_requires_neighbor() {
        let (mut tile, _service) = tile_over(HeightField::flat(5, 0), 5, 3);
        assert_eq!(tile.delegate_side(-1.0, -1.0), None);
        tile.set_neighbor(Side::North, Some(TileCoord::new(0, 1)));
        assert_eq!(tile.delegate_side(-1.0, -1.0), Some(Side::North));
        tile.set_neighbor(Side::West, Some(TileCoord::new(1, 0)));
        assert_eq!(tile.delegate_side(-1.0, -1.0), Some(Side::West));
        assert_eq!(tile.delegate_side(2.0, 2.0), None);
    }

    #[test]
    fn test_destroy_releases_buffers() {
        let (mut tile, mut service) = tile_over(HeightField::flat(5, 0), 5, 3);
        tile.get_render_operation([None; 4], &mut service).unwrap();
        tile.destroy(&mut service).unwrap();
        assert_eq!(service.buffer_count(), 0);
    }
}
