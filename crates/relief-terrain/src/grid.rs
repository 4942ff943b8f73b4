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

//! The terrain grid manager: owns every tile, wires neighbors, runs level
//! selection and relaxation, and answers world-space surface queries.

use crate::error::TerrainError;
use crate::options::TileOptions;
use crate::stitch::Side;
use crate::tile::{TerrainTile, TileCoord};
use relief_core::math::{Aabb, Ray, Vec3};
use relief_core::renderer::{BufferService, RenderOperation};
use relief_core::scene::{MovableObject, RenderQueue, RenderableId};
use std::collections::VecDeque;

/// Bisection steps used to refine a segment hit.
const INTERSECT_REFINE_STEPS: usize = 16;

/// Vertical padding of the terrain bounds when clipping a segment, so that a
/// perfectly flat terrain still has a volume to march through.
const INTERSECT_HEIGHT_SLACK: f32 = 1.0e-3;

/// A square lattice of tiles covering a whole height field.
///
/// Tiles share their edge vertices, so a world of `world_size` samples holds
/// `(world_size - 1) / (size - 1)` tiles per side. Tile `(x, z)` has its north
/// neighbor at `z - 1` and its east neighbor at `x + 1`.
#[derive(Debug)]
pub struct TerrainGrid {
    tiles_per_side: usize,
    tile_size: usize,
    world_size: usize,
    scale: Vec3,
    bounding_box: Aabb,
    tiles: Vec<TerrainTile>,
}

impl TerrainGrid {
    /// Cuts the height field of `template` into tiles and uploads their vertex data.
    ///
    /// The template's start position is ignored. When vertex normals are enabled they
    /// are computed once every tile exists.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidWorldSize`] if the world cannot be tiled evenly,
    /// or [`TerrainError::Resource`] if a buffer cannot be allocated.
    pub fn build(
        template: &TileOptions,
        service: &mut dyn BufferService,
    ) -> Result<Self, TerrainError> {
        let tile_size = template.size();
        let world_size = template.world_size();
        let span = tile_size - 1;
        if world_size < tile_size || (world_size - 1) % span != 0 {
            return Err(TerrainError::InvalidWorldSize {
                world_size,
                tile_size,
            });
        }

        let tiles_per_side = (world_size - 1) / span;
        let mut tiles = Vec::with_capacity(tiles_per_side * tiles_per_side);
        for z in 0..tiles_per_side {
            for x in 0..tiles_per_side {
                let options = template.at(x * span, z * span)?;
                let id = RenderableId(x + z * tiles_per_side);
                tiles.push(TerrainTile::init(id, TileCoord::new(x, z), options, service)?);
            }
        }

        let bounding_box = tiles
            .iter()
            .fold(Aabb::INVALID, |acc, tile| acc.merge(&tile.bounding_box()));

        let mut grid = Self {
            tiles_per_side,
            tile_size,
            world_size,
            scale: template.scale(),
            bounding_box,
            tiles,
        };
        grid.wire_neighbors();

        if template.vertex_normals() {
            grid.calculate_normals(service)?;
        }

        log::info!(
            "Built terrain grid: {n}x{n} tiles of {tile_size} vertices over a {world_size} world",
            n = tiles_per_side
        );
        Ok(grid)
    }

    fn wire_neighbors(&mut self) {
        for index in 0..self.tiles.len() {
            let coord = self.tiles[index].coord();
            for side in Side::ALL {
                let neighbor = self.neighbor_coord(coord, side);
                self.tiles[index].set_neighbor(side, neighbor);
            }
        }
    }

    /// Tiles along each axis.
    pub fn tiles_per_side(&self) -> usize {
        self.tiles_per_side
    }

    /// Edge length of each tile, in vertices.
    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    /// Edge length of the height field, in samples.
    pub fn world_size(&self) -> usize {
        self.world_size
    }

    /// Bounds of the whole terrain.
    pub fn bounding_box(&self) -> Aabb {
        self.bounding_box
    }

    /// All tiles, row-major.
    pub fn tiles(&self) -> &[TerrainTile] {
        &self.tiles
    }

    fn index_of(&self, coord: TileCoord) -> Option<usize> {
        (coord.x < self.tiles_per_side && coord.z < self.tiles_per_side)
            .then(|| coord.x + coord.z * self.tiles_per_side)
    }

    /// The tile at `coord`.
    pub fn tile(&self, coord: TileCoord) -> Option<&TerrainTile> {
        self.index_of(coord).map(|i| &self.tiles[i])
    }

    /// The tile at `coord`, mutably.
    pub fn tile_mut(&mut self, coord: TileCoord) -> Option<&mut TerrainTile> {
        self.index_of(coord).map(|i| &mut self.tiles[i])
    }

    /// Coordinate of the tile adjacent to `coord` on `side`, if it exists.
    pub fn neighbor_coord(&self, coord: TileCoord, side: Side) -> Option<TileCoord> {
        let n = self.tiles_per_side;
        let (x, z) = (coord.x, coord.z);
        match side {
            Side::North => z.checked_sub(1).map(|z| TileCoord::new(x, z)),
            Side::South => (z + 1 < n).then(|| TileCoord::new(x, z + 1)),
            Side::East => (x + 1 < n).then(|| TileCoord::new(x + 1, z)),
            Side::West => x.checked_sub(1).map(|x| TileCoord::new(x, z)),
        }
    }

    /// Current levels of the neighbors of `coord`, indexed by [`Side::index`].
    pub fn neighbor_levels(&self, coord: TileCoord) -> [Option<usize>; 4] {
        let mut levels = [None; 4];
        if let Some(tile) = self.tile(coord) {
            for side in Side::ALL {
                levels[side.index()] = tile
                    .neighbor(side)
                    .and_then(|n| self.tile(n))
                    .map(TerrainTile::render_level);
            }
        }
        levels
    }

    /// Lets every tile pick its level for `camera_position`, without relaxation.
    ///
    /// Adjacent tiles may end up more than one level apart until
    /// [`align_neighbors`](Self::align_neighbors) runs.
    pub fn notify_camera(&mut self, camera_position: Vec3) {
        for tile in &mut self.tiles {
            tile.notify_current_camera(camera_position);
        }
    }

    /// Selects every tile's level for `camera_position`, then relaxes the grid so
    /// that adjacent tiles differ by at most one level.
    pub fn update_lod(&mut self, camera_position: Vec3) {
        self.notify_camera(camera_position);
        self.align_neighbors();
    }

    /// Raises tile levels until no two adjacent tiles differ by more than one.
    ///
    /// Levels only ever increase, so the worklist drains after a bounded number of
    /// raises.
    pub fn align_neighbors(&mut self) {
        self.relax((0..self.tiles.len()).collect());
    }

    /// Sets the level of the tile at `coord` and relaxes the tiles around it.
    ///
    /// The level holds until the next [`update_lod`](Self::update_lod). Lowering a
    /// tile below a much coarser neighbor raises it back to that neighbor's level
    /// minus one.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::UnknownTile`] for a coordinate outside the grid.
    pub fn adjust_render_level(
        &mut self,
        coord: TileCoord,
        level: usize,
    ) -> Result<(), TerrainError> {
        let index = self.index_of(coord).ok_or(TerrainError::UnknownTile {
            x: coord.x,
            z: coord.z,
        })?;
        self.tiles[index].set_render_level(level);
        let mut worklist = VecDeque::from([index]);
        worklist.extend(
            Side::ALL
                .into_iter()
                .filter_map(|side| self.neighbor_coord(coord, side))
                .filter_map(|neighbor| self.index_of(neighbor)),
        );
        self.relax(worklist);
        Ok(())
    }

    fn relax(&mut self, mut worklist: VecDeque<usize>) {
        let mut raised = 0usize;

        while let Some(index) = worklist.pop_front() {
            let level = self.tiles[index].render_level();
            if level == 0 {
                continue;
            }
            for side in Side::ALL {
                let Some(neighbor) = self.tiles[index]
                    .neighbor(side)
                    .and_then(|coord| self.index_of(coord))
                else {
                    continue;
                };
                if self.tiles[neighbor].render_level() + 1 < level {
                    self.tiles[neighbor].raise_render_level(level - 1);
                    worklist.push_back(neighbor);
                    raised += 1;
                }
            }
        }

        if raised > 0 {
            log::trace!("Neighbor alignment raised {raised} tile levels");
        }
    }

    /// Draw for the tile at `coord`, stitched against its current neighbors.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::UnknownTile`] for a coordinate outside the grid, or
    /// [`TerrainError::Resource`] if an index buffer cannot be allocated.
    pub fn render_operation(
        &mut self,
        coord: TileCoord,
        service: &mut dyn BufferService,
    ) -> Result<RenderOperation, TerrainError> {
        let levels = self.neighbor_levels(coord);
        let tile = self.tile_mut(coord).ok_or(TerrainError::UnknownTile {
            x: coord.x,
            z: coord.z,
        })?;
        tile.get_render_operation(levels, service)
    }

    /// Draws for every tile, row-major.
    pub fn render_operations(
        &mut self,
        service: &mut dyn BufferService,
    ) -> Result<Vec<(TileCoord, RenderOperation)>, TerrainError> {
        let coords: Vec<TileCoord> = self.tiles.iter().map(TerrainTile::coord).collect();
        let mut operations = Vec::with_capacity(coords.len());
        for coord in coords {
            operations.push((coord, self.render_operation(coord, service)?));
        }
        Ok(operations)
    }

    /// Queues every tile in the world geometry group.
    pub fn update_render_queue(&self, queue: &mut RenderQueue) {
        for tile in &self.tiles {
            tile.update_render_queue(queue);
        }
    }

    /// Tile containing world `(x, z)`, or `None` outside the terrain.
    ///
    /// Points on a shared edge belong to the tile with the larger coordinate, except
    /// on the far edge of the world.
    pub fn tile_at(&self, x: f32, z: f32) -> Option<TileCoord> {
        let span = (self.tile_size - 1) as f32;
        let limit = (self.world_size - 1) as f32;
        let grid_x = x / self.scale.x;
        let grid_z = z / self.scale.z;
        if !(0.0..=limit).contains(&grid_x) || !(0.0..=limit).contains(&grid_z) {
            return None;
        }
        let last = self.tiles_per_side - 1;
        let column = ((grid_x / span).floor() as usize).min(last);
        let row = ((grid_z / span).floor() as usize).min(last);
        Some(TileCoord::new(column, row))
    }

    /// Surface height at world `(x, z)`, or `None` outside the terrain.
    pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        let height = self
            .tile_at(x, z)
            .map(|coord| self.tile_height_at(coord, x, z));
        if height.is_none() {
            log::debug!("Height query at ({x}, {z}) is outside the terrain");
        }
        height
    }

    /// Surface height at world `(x, z)`, or `default` outside the terrain.
    pub fn height_at_or(&self, x: f32, z: f32, default: f32) -> f32 {
        self.height_at(x, z).unwrap_or(default)
    }

    /// Height query starting from the tile at `coord`.
    ///
    /// Points outside the tile are handed to the neighbor on that side; without one
    /// they are clamped to the tile's edge. Unknown coordinates start from the
    /// nearest tile.
    pub fn tile_height_at(&self, coord: TileCoord, x: f32, z: f32) -> f32 {
        let last = self.tiles_per_side - 1;
        let mut coord = TileCoord::new(coord.x.min(last), coord.z.min(last));
        // Each hand-off moves toward the point, so this is bounded by the grid width.
        for _ in 0..2 * self.tiles_per_side {
            let tile = &self.tiles[coord.x + coord.z * self.tiles_per_side];
            match tile.delegate_side(x, z).and_then(|side| tile.neighbor(side)) {
                Some(next) => coord = next,
                None => break,
            }
        }
        self.tiles[coord.x + coord.z * self.tiles_per_side].height_at(x, z)
    }

    /// Height clamped to the terrain, for sampling just past its edge.
    fn clamped_height(&self, x: f32, z: f32) -> f32 {
        let limit = (self.world_size - 1) as f32;
        let coord = self
            .tile_at(
                x.clamp(0.0, limit * self.scale.x),
                z.clamp(0.0, limit * self.scale.z),
            )
            .unwrap_or_default();
        self.tile_height_at(coord, x, z)
    }

    /// Surface normal at world `(x, z)`.
    ///
    /// Built from the heights one vertex step west and one step south of the point.
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let here = Vec3::new(x, self.clamped_height(x, z), z);
        let left_x = x - self.scale.x;
        let left = Vec3::new(left_x, self.clamped_height(left_x, z), z);
        let down_z = z + self.scale.z;
        let down = Vec3::new(x, self.clamped_height(x, down_z), down_z);
        (left - here).cross(down - here).normalize()
    }

    /// Recomputes every vertex normal from the surface and re-uploads vertex data.
    pub fn calculate_normals(
        &mut self,
        service: &mut dyn BufferService,
    ) -> Result<(), TerrainError> {
        let normals: Vec<Vec<Vec3>> = self
            .tiles
            .iter()
            .map(|tile| {
                tile.vertices()
                    .iter()
                    .map(|v| self.normal_at(v.position.x, v.position.z))
                    .collect()
            })
            .collect();
        for (tile, normals) in self.tiles.iter_mut().zip(&normals) {
            tile.update_normals(normals, service)?;
        }
        log::debug!("Computed vertex normals for {} tiles", self.tiles.len());
        Ok(())
    }

    /// First point where the segment from `start` to `end` meets the surface.
    ///
    /// The segment is marched at half a vertex spacing and the crossing refined by
    /// bisection. A start point already under the surface is reported at the surface.
    pub fn intersect_segment(&self, start: Vec3, end: Vec3) -> Option<Vec3> {
        let ray = Ray::new(start, end - start);
        let length = ray.direction.length();
        let slack = Vec3::new(0.0, INTERSECT_HEIGHT_SLACK, 0.0);
        let bounds = Aabb::from_min_max(
            self.bounding_box.min - slack,
            self.bounding_box.max + slack,
        );
        let (t_enter, t_exit) = ray.intersect_aabb(&bounds)?;
        if t_enter > 1.0 {
            return None;
        }
        let t_exit = t_exit.min(1.0);

        let below = |t: f32| {
            let p = ray.point_at(t);
            self.height_at(p.x, p.z).filter(|h| p.y <= *h)
        };
        let surface_point = |t: f32| {
            let p = ray.point_at(t);
            self.height_at(p.x, p.z).map(|h| Vec3::new(p.x, h, p.z))
        };

        if below(t_enter).is_some() {
            return surface_point(t_enter);
        }
        if length <= f32::EPSILON {
            return None;
        }

        let dt = 0.5 * self.scale.x.min(self.scale.z) / length;
        let mut previous = t_enter;
        loop {
            let t = (previous + dt).min(t_exit);
            if below(t).is_some() {
                let (mut lo, mut hi) = (previous, t);
                for _ in 0..INTERSECT_REFINE_STEPS {
                    let mid = 0.5 * (lo + hi);
                    if below(mid).is_some() {
                        hi = mid;
                    } else {
                        lo = mid;
                    }
                }
                return surface_point(hi);
            }
            if t >= t_exit {
                return None;
            }
            previous = t;
        }
    }

    /// Releases every tile's buffers.
    pub fn destroy(self, service: &mut dyn BufferService) -> Result<(), TerrainError> {
        for tile in self.tiles {
            tile.destroy(service)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::height_field::HeightField;
    use approx::assert_relative_eq;
    use relief_infra::SoftwareBufferService;
    use std::sync::Arc;

    fn grid_over(
        field: HeightField,
        size: usize,
        levels: usize,
    ) -> (TerrainGrid, SoftwareBufferService) {
        let options = TileOptions::builder(Arc::new(field))
            .size(size)
            .max_mip_levels(levels)
            .build()
            .unwrap();
        let mut service = SoftwareBufferService::new();
        let grid = TerrainGrid::build(&options, &mut service).unwrap();
        (grid, service)
    }

    #[test]
    fn test_build_rejects_uneven_world() {
        let options = TileOptions::builder(Arc::new(HeightField::flat(11, 0)))
            .size(5)
            .max_mip_levels(2)
            .build()
            .unwrap();
        let err = TerrainGrid::build(&options, &mut SoftwareBufferService::new()).unwrap_err();
        assert!(matches!(
            err,
            TerrainError::InvalidWorldSize {
                world_size: 11,
                tile_size: 5
            }
        ));
    }

    #[test]
    fn test_neighbors_are_wired_by_coordinate() {
        let (grid, _service) = grid_over(HeightField::flat(13, 0), 5, 3);
        assert_eq!(grid.tiles_per_side(), 3);
        let center = grid.tile(TileCoord::new(1, 1)).unwrap();
        assert_eq!(center.neighbor(Side::North), Some(TileCoord::new(1, 0)));
        assert_eq!(center.neighbor(Side::South), Some(TileCoord::new(1, 2)));
        assert_eq!(center.neighbor(Side::East), Some(TileCoord::new(2, 1)));
        assert_eq!(center.neighbor(Side::West), Some(TileCoord::new(0, 1)));
        let corner = grid.tile(TileCoord::new(0, 0)).unwrap();
        assert_eq!(corner.neighbor(Side::North), None);
        assert_eq!(corner.neighbor(Side::West), None);
        assert_eq!(corner.options().start_x(), 0);
        assert_eq!(grid.tile(TileCoord::new(2, 1)).unwrap().options().start_x(), 8);
    }

    #[test]
    fn test_align_neighbors_limits_level_gap() {
        let (mut grid, _service) = grid_over(HeightField::flat(17, 0), 5, 3);
        for z in 0..4 {
            for x in 0..4 {
                let forced = if (x, z) == (0, 0) { 2 } else { 0 };
                grid.tile_mut(TileCoord::new(x, z))
                    .unwrap()
                    .set_forced_render_level(Some(forced));
            }
        }
        grid.update_lod(Vec3::new(8.0, 0.0, 8.0));
        let level = |x, z| grid.tile(TileCoord::new(x, z)).unwrap().render_level();
        assert_eq!(level(0, 0), 2);
        assert_eq!(level(1, 0), 1);
        assert_eq!(level(0, 1), 1);
        assert_eq!(level(1, 1), 0);
        assert_eq!(level(3, 3), 0);
        for z in 0..4 {
            for x in 0..4 {
                if x + 1 < 4 {
                    assert!(level(x, z).abs_diff(level(x + 1, z)) <= 1);
                }
                if z + 1 < 4 {
                    assert!(level(x, z).abs_diff(level(x, z + 1)) <= 1);
                }
            }
        }
    }

    #[test]
    fn test_adjust_render_level_cascades() {
        let (mut grid, _service) = grid_over(HeightField::flat(17, 0), 5, 3);
        grid.adjust_render_level(TileCoord::new(3, 3), 2).unwrap();
        let level =
            |grid: &TerrainGrid, x, z| grid.tile(TileCoord::new(x, z)).unwrap().render_level();
        assert_eq!(level(&grid, 3, 3), 2);
        assert_eq!(level(&grid, 2, 3), 1);
        assert_eq!(level(&grid, 3, 2), 1);
        assert_eq!(level(&grid, 2, 2), 0);

        // Dropping a neighbor of the coarse tile back to 0 is undone by relaxation.
        grid.adjust_render_level(TileCoord::new(2, 3), 0).unwrap();
        assert_eq!(level(&grid, 2, 3), 1);

        assert!(matches!(
            grid.adjust_render_level(TileCoord::new(4, 0), 1),
            Err(TerrainError::UnknownTile { x: 4, z: 0 })
        ));
    }

    #[test]
    fn test_tile_at_and_height_at() {
        let field = HeightField::from_fn(9, |x, z| (x + 2 * z) as u16);
        let (grid, _service) = grid_over(field, 5, 3);
        assert_eq!(grid.tile_at(1.0, 1.0), Some(TileCoord::new(0, 0)));
        assert_eq!(grid.tile_at(4.0, 1.0), Some(TileCoord::new(1, 0)));
        assert_eq!(grid.tile_at(8.0, 8.0), Some(TileCoord::new(1, 1)));
        assert_eq!(grid.tile_at(8.5, 1.0), None);
        assert_eq!(grid.tile_at(-0.1, 1.0), None);

        assert_relative_eq!(grid.height_at(6.5, 3.25).unwrap(), 13.0);
        assert_eq!(grid.height_at(9.0, 0.0), None);
        assert_eq!(grid.height_at_or(9.0, 0.0, -1.0), -1.0);
    }

    #[test]
    fn test_tile_height_at_delegates_to_neighbor() {
        let field = HeightField::from_fn(9, |x, z| (x + 2 * z) as u16);
        let (grid, _service) = grid_over(field, 5, 3);
        // Asked of tile (0, 0), a point inside tile (1, 1) is answered there.
        assert_relative_eq!(grid.tile_height_at(TileCoord::new(0, 0), 6.0, 7.0), 20.0);
        // Past the world edge the last tile clamps.
        assert_relative_eq!(
            grid.tile_height_at(TileCoord::new(0, 0), 50.0, 8.0),
            grid.tile_height_at(TileCoord::new(1, 1), 8.0, 8.0)
        );
    }

    #[test]
    fn test_flat_normals_point_up() {
        let field = HeightField::flat(9, 3);
        let options = TileOptions::builder(Arc::new(field))
            .size(5)
            .max_mip_levels(2)
            .vertex_normals(true)
            .build()
            .unwrap();
        let mut service = SoftwareBufferService::new();
        let grid = TerrainGrid::build(&options, &mut service).unwrap();
        for tile in grid.tiles() {
            for vertex in tile.vertices() {
                assert_relative_eq!(vertex.normal.y, 1.0);
            }
        }
    }

    #[test]
    fn test_sloped_normal_leans_downhill() {
        let field = HeightField::from_fn(9, |x, _| x as u16);
        let (grid, _service) = grid_over(field, 5, 3);
        let normal = grid.normal_at(4.0, 4.0);
        assert!(normal.x < 0.0);
        assert!(normal.y > 0.0);
        assert_relative_eq!(normal.z, 0.0);
        assert_relative_eq!(normal.length(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_intersect_segment() {
        let (grid, _service) = grid_over(HeightField::flat(9, 10), 5, 3);
        let hit = grid
            .intersect_segment(Vec3::new(3.0, 20.0, 5.0), Vec3::new(3.0, 0.0, 5.0))
            .unwrap();
        assert_relative_eq!(hit.y, 10.0);
        assert_relative_eq!(hit.x, 3.0);

        let slanted = grid
            .intersect_segment(Vec3::new(0.0, 14.0, 1.0), Vec3::new(8.0, 6.0, 1.0))
            .unwrap();
        assert_relative_eq!(slanted.x, 4.0, epsilon = 1e-3);
        assert_relative_eq!(slanted.y, 10.0);

        assert!(grid
            .intersect_segment(Vec3::new(0.0, 20.0, 0.0), Vec3::new(8.0, 15.0, 8.0))
            .is_none());
        assert!(grid
            .intersect_segment(Vec3::new(3.0, 20.0, 3.0), Vec3::new(3.0, 12.0, 3.0))
            .is_none());
    }

    #[test]
    fn test_render_queue_and_unknown_tile() {
        let (mut grid, mut service) = grid_over(HeightField::flat(9, 0), 5, 3);
        let mut queue = RenderQueue::new();
        grid.update_render_queue(&mut queue);
        assert_eq!(queue.len(), 4);
        let err = grid
            .render_operation(TileCoord::new(5, 0), &mut service)
            .unwrap_err();
        assert!(matches!(err, TerrainError::UnknownTile { x: 5, z: 0 }));
        assert_eq!(grid.render_operations(&mut service).unwrap().len(), 4);
        grid.destroy(&mut service).unwrap();
        assert_eq!(service.buffer_count(), 0);
    }
}
