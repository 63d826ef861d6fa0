//! Mask and ghost handling on derived grid state.

use hypertree::common::{BitArray, GHOST_ARRAY_NAME};
use hypertree::grid::{DataArray, GhostFlags, ValueType};
use hypertree_format::{HyperTreeGridReader, HyperTreeGridWriter};
use hypertree_int_test::test_util::{random_grid, scenario_grid, RandomGridShape};

#[ctor::ctor]
fn init() {
    colog::init();
}

fn with_values(grid: &mut hypertree::grid::HyperTreeGrid) {
    let cells = grid.number_of_cells();
    let mut values = DataArray::zeros("Value", ValueType::F64, 1, cells);
    for cell in 0..cells {
        values.set_value_from_f64(cell, 0, cell as f64);
    }
    grid.add_cell_array(values);
}

#[test]
fn test_setting_the_same_mask_is_idempotent() {
    let mut grid = random_grid(&RandomGridShape::default()).unwrap();
    let mut mask = BitArray::with_len(grid.number_of_cells(), false);
    for cell in (0..grid.number_of_cells()).step_by(7) {
        mask.set(cell, true);
    }

    grid.set_mask(Some(mask.clone()));
    let (pure, bounds) = (grid.pure_mask(), grid.bounds());
    grid.set_mask(Some(mask));
    assert_eq!(grid.pure_mask(), pure);
    assert_eq!(grid.bounds(), bounds);
    assert_eq!(grid.compute_bounds(), bounds);
}

#[test]
fn test_pure_mask_marks_ancestors() {
    let mut grid = scenario_grid();
    grid.set_masked(13, true);
    let pure = grid.pure_mask();
    // 13 is a child of tree 2, whose root is 10
    assert_eq!(pure.iter_ones().collect::<Vec<_>>(), vec![10, 13]);
}

#[test]
fn test_masking_shrinks_and_unmasking_restores_bounds() {
    let mut grid = scenario_grid();
    let full = grid.bounds();
    assert_eq!(full.min, [0.0, 0.0, 0.0]);
    assert_eq!(full.max, [2.0, 3.0, 0.0]);

    // both roots of the top row
    grid.set_masked(20, true);
    grid.set_masked(25, true);
    assert_eq!(grid.bounds().max, [2.0, 2.0, 0.0]);

    grid.set_masked(20, false);
    grid.set_masked(25, false);
    assert_eq!(grid.bounds(), full);

    grid.set_masked(25, true);
    grid.set_mask(None);
    assert_eq!(grid.bounds(), full);
    assert!(!grid.has_mask());
}

#[test]
fn test_cell_range_skips_masked_and_ghost_cells() {
    let mut grid = scenario_grid();
    with_values(&mut grid);
    assert_eq!(grid.cell_range("Value", Some(0)), Some((0.0, 25.0)));

    grid.set_masked(0, true);
    grid.cell_data_mut().set_ghost_flags(25, GhostFlags::HIDDEN_CELL);
    grid.cell_data_mut().set_ghost_flags(24, GhostFlags::REFINED_CELL);
    assert_eq!(grid.cell_range("Value", Some(0)), Some((1.0, 24.0)));
    assert!(grid.has_any_ghost_cells());

    grid.remove_cell_array(GHOST_ARRAY_NAME);
    assert!(!grid.has_any_ghost_cells());
    assert_eq!(grid.cell_range("Value", Some(0)), Some((1.0, 25.0)));
    assert_eq!(grid.cell_range("Missing", None), None);
}

#[test]
fn test_tree_ghost_array_follows_root_flags() {
    let mut grid = scenario_grid();
    assert_eq!(grid.tree_ghost_array().count_ones(), 0);

    // root of tree 1 is global 5, a child of tree 3 is global 16
    grid.cell_data_mut().set_ghost_flags(5, GhostFlags::DUPLICATE_CELL);
    grid.cell_data_mut().set_ghost_flags(16, GhostFlags::DUPLICATE_CELL);
    let ghosts = grid.tree_ghost_array();
    assert_eq!(ghosts.len(), grid.number_of_roots());
    assert_eq!(ghosts.iter_ones().collect::<Vec<_>>(), vec![1]);

    // ghost flags travel with the rest of the cell data
    let mut bytes = Vec::new();
    HyperTreeGridWriter::new().write_to(&grid, &mut bytes).unwrap();
    let read = HyperTreeGridReader::new().read_bytes(&bytes).unwrap();
    assert_eq!(read.tree_ghost_array(), ghosts);
    assert_eq!(read.cell_data().ghost_flags(16), GhostFlags::DUPLICATE_CELL);
}
