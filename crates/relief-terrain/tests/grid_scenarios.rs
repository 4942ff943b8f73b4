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

use relief_core::math::Vec3;
use relief_core::scene::{MovableObject, RenderQueue, RenderQueueGroup};
use relief_infra::SoftwareBufferService;
use relief_terrain::{HeightField, Side, StitchMask, TerrainGrid, TileCoord, TileOptions};
use std::sync::Arc;

/// A 3x3 grid of 5-vertex tiles with three levels over a flat world at height 10.
fn flat_three_by_three() -> (TerrainGrid, SoftwareBufferService) {
    let options = TileOptions::builder(Arc::new(HeightField::flat(13, 10)))
        .size(5)
        .max_mip_levels(3)
        .build()
        .unwrap();
    let mut service = SoftwareBufferService::new();
    let grid = TerrainGrid::build(&options, &mut service).unwrap();
    (grid, service)
}

fn assert_levels_consistent(grid: &TerrainGrid) {
    for tile in grid.tiles() {
        for side in Side::ALL {
            if let Some(neighbor) = tile.neighbor(side).and_then(|c| grid.tile(c)) {
                assert!(
                    tile.render_level().abs_diff(neighbor.render_level()) <= 1,
                    "{:?} at {} vs {:?} at {}",
                    tile.coord(),
                    tile.render_level(),
                    neighbor.coord(),
                    neighbor.render_level()
                );
            }
        }
    }
}

#[test]
fn test_flat_grid_scenario() {
    // --- ARRANGE ---
    let (mut grid, _service) = flat_three_by_three();
    let center = TileCoord::new(1, 1);
    let center_point = grid.tile(center).unwrap().center();

    // --- ACT & ASSERT: camera on the center tile ---
    for tile in grid.tiles() {
        assert_eq!(tile.error_table().as_slice(), &[0.0, 1.0, 2.0]);
    }
    grid.notify_camera(center_point);
    assert_eq!(grid.tile(center).unwrap().render_level(), 0);
    for coord in [(1, 0), (0, 1), (2, 1), (1, 2)] {
        let coord = TileCoord::new(coord.0, coord.1);
        assert_eq!(grid.tile(coord).unwrap().render_level(), 2, "{coord:?}");
    }

    // --- ACT & ASSERT: alignment pulls the center up to one below its ring ---
    grid.align_neighbors();
    assert_eq!(grid.tile(center).unwrap().render_level(), 1);
    for side in Side::ALL {
        let neighbor = grid.tile(center).unwrap().neighbor(side).unwrap();
        assert_eq!(grid.tile(neighbor).unwrap().render_level(), 2);
    }
    assert_levels_consistent(&grid);

    // update_lod runs both phases at once
    grid.update_lod(center_point);
    assert_eq!(grid.tile(center).unwrap().render_level(), 1);

    // --- ACT & ASSERT: camera far away ---
    grid.update_lod(center_point + Vec3::new(0.0, 1000.0, 0.0));
    assert_eq!(grid.tile(center).unwrap().render_level(), 2);
    assert_levels_consistent(&grid);

    // --- ASSERT: heights are exactly 10 everywhere ---
    for step_z in 0..=24 {
        for step_x in 0..=24 {
            let (x, z) = (step_x as f32 * 0.5, step_z as f32 * 0.5);
            assert_eq!(grid.height_at(x, z), Some(10.0), "at ({x}, {z})");
        }
    }
}

#[test]
fn test_center_tile_stitches_all_sides_against_coarser_ring() {
    // --- ARRANGE ---
    let (mut grid, mut service) = flat_three_by_three();
    for z in 0..3 {
        for x in 0..3 {
            let level = if (x, z) == (1, 1) { 0 } else { 1 };
            grid.tile_mut(TileCoord::new(x, z))
                .unwrap()
                .set_forced_render_level(Some(level));
        }
    }
    grid.update_lod(Vec3::ZERO);

    // --- ACT ---
    let center = TileCoord::new(1, 1);
    let levels = grid.neighbor_levels(center);
    let mask = grid.tile(center).unwrap().stitch_mask(levels);
    let op = grid.render_operation(center, &mut service).unwrap();

    // --- ASSERT ---
    assert_eq!(mask, StitchMask::ALL);
    let interior_only = 2 * 2 * 6;
    assert!(op.index_count > interior_only);
    assert_eq!(op.index_count, 72);
}

#[test]
fn test_render_operations_are_cached_between_frames() {
    // --- ARRANGE ---
    let (mut grid, mut service) = flat_three_by_three();
    grid.update_lod(Vec3::new(6.0, 10.0, 6.0));

    // --- ACT ---
    let first = grid.render_operations(&mut service).unwrap();
    let buffers_after_first = service.buffer_count();
    let second = grid.render_operations(&mut service).unwrap();

    // --- ASSERT ---
    assert_eq!(first, second);
    assert_eq!(service.buffer_count(), buffers_after_first);
}

#[test]
fn test_relaxation_cascades_across_the_grid() {
    // --- ARRANGE: 4x4 tiles with five levels, one corner pinned to the coarsest ---
    let options = TileOptions::builder(Arc::new(HeightField::flat(65, 0)))
        .size(17)
        .max_mip_levels(5)
        .build()
        .unwrap();
    let mut service = SoftwareBufferService::new();
    let mut grid = TerrainGrid::build(&options, &mut service).unwrap();
    for z in 0..4 {
        for x in 0..4 {
            let level = if (x, z) == (0, 0) { 4 } else { 0 };
            grid.tile_mut(TileCoord::new(x, z))
                .unwrap()
                .set_forced_render_level(Some(level));
        }
    }

    // --- ACT ---
    grid.update_lod(Vec3::ZERO);

    // --- ASSERT: levels fall off by one per tile of Manhattan distance ---
    for tile in grid.tiles() {
        let coord = tile.coord();
        let expected = 4usize.saturating_sub(coord.x + coord.z);
        assert_eq!(tile.render_level(), expected, "tile {coord:?}");
    }
    assert_levels_consistent(&grid);
}

#[test]
fn test_lod_is_deterministic_over_rough_terrain() {
    // --- ARRANGE ---
    let field = HeightField::from_fn(65, |x, z| ((x * 37 + z * 91) % 53) as u16 * 40);
    let options = TileOptions::builder(Arc::new(field))
        .size(17)
        .max_mip_levels(5)
        .build()
        .unwrap();
    let mut service = SoftwareBufferService::new();
    let mut grid = TerrainGrid::build(&options, &mut service).unwrap();

    // --- ACT & ASSERT ---
    for camera in [
        Vec3::new(0.0, 100.0, 0.0),
        Vec3::new(32.0, 2500.0, 32.0),
        Vec3::new(60.0, 30.0, 5.0),
    ] {
        grid.update_lod(camera);
        let levels: Vec<usize> = grid.tiles().iter().map(|t| t.render_level()).collect();
        grid.update_lod(camera);
        let again: Vec<usize> = grid.tiles().iter().map(|t| t.render_level()).collect();
        assert_eq!(levels, again);
        assert_levels_consistent(&grid);

        for tile in grid.tiles() {
            let table = tile.error_table().as_slice();
            assert!(table.windows(2).all(|w| w[1] > w[0]));
        }
        for (_, op) in grid.render_operations(&mut service).unwrap() {
            assert_eq!(op.index_count % 3, 0);
        }
    }
}

#[test]
fn test_zero_height_tile_reads_zero_and_clamps_at_world_edge() {
    // --- ARRANGE ---
    let options = TileOptions::builder(Arc::new(HeightField::flat(9, 0)))
        .size(9)
        .max_mip_levels(4)
        .build()
        .unwrap();
    let mut service = SoftwareBufferService::new();
    let grid = TerrainGrid::build(&options, &mut service).unwrap();
    let origin = TileCoord::new(0, 0);

    // --- ASSERT ---
    assert_eq!(grid.tile_height_at(origin, 3.3, 7.9), 0.0);
    let edge = grid.tile_height_at(origin, 8.0, 4.0);
    assert_eq!(grid.tile_height_at(origin, 1.0e6, 4.0), edge);
}

#[test]
fn test_boundary_clamping_matches_edge_value() {
    // --- ARRANGE ---
    let field = HeightField::from_fn(9, |x, z| (3 * x + z) as u16);
    let options = TileOptions::builder(Arc::new(field))
        .size(5)
        .max_mip_levels(3)
        .build()
        .unwrap();
    let mut service = SoftwareBufferService::new();
    let grid = TerrainGrid::build(&options, &mut service).unwrap();

    // --- ASSERT: every boundary tile, every open side ---
    let corner = TileCoord::new(0, 0);
    assert_eq!(
        grid.tile_height_at(corner, -100.0, 2.5),
        grid.tile_height_at(corner, 0.0, 2.5)
    );
    assert_eq!(
        grid.tile_height_at(corner, 2.5, -100.0),
        grid.tile_height_at(corner, 2.5, 0.0)
    );
    let far = TileCoord::new(1, 1);
    assert_eq!(
        grid.tile_height_at(far, 500.0, 6.0),
        grid.tile_height_at(far, 8.0, 6.0)
    );
    assert_eq!(
        grid.tile_height_at(far, 6.0, 500.0),
        grid.tile_height_at(far, 6.0, 8.0)
    );
}

#[test]
fn test_tiles_queue_as_world_geometry() {
    // --- ARRANGE ---
    let (mut grid, _service) = flat_three_by_three();
    let camera = Vec3::new(0.0, 10.0, 0.0);
    grid.update_lod(camera);

    // --- ACT ---
    let mut queue = RenderQueue::new();
    grid.update_render_queue(&mut queue);
    queue.sort_front_to_back();

    // --- ASSERT ---
    let queued = queue.group(RenderQueueGroup::WorldGeometry);
    assert_eq!(queued.len(), 9);
    let nearest = grid.tile(TileCoord::new(0, 0)).unwrap();
    assert_eq!(queued[0].id, nearest.renderable_id());
    assert_eq!(queued[0].squared_view_depth, nearest.squared_view_depth(camera));
}
