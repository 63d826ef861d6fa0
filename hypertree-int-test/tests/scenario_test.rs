//! The two-level 2x3 scenario grid, walked end to end: counts, geometry,
//! neighborhoods across root boundaries, point location and storage.

use hypertree::cursor::{AscendingCursor, HyperTreeCursor, Neighbor, Stencil, SubdivisionTable};
use hypertree::descriptor::format_text_descriptor;
use hypertree::grid::{DataArray, ValueType};
use hypertree_format::{DataMode, FormatVersion, HyperTreeGridReader, HyperTreeGridWriter};
use hypertree_int_test::test_util::{assert_same_grid, run_with_file, scenario_grid, SCENARIO_DESCRIPTOR};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_scenario_counts() {
    let grid = scenario_grid();
    assert_eq!(grid.cell_dims(), [2, 3, 1]);
    assert_eq!(grid.dimension(), 2);
    assert_eq!(grid.number_of_roots(), 6);
    assert_eq!(grid.number_of_non_empty_trees(), 6);
    assert_eq!(grid.number_of_vertices(), 26);
    assert_eq!(grid.number_of_leaves(), 21);
    assert_eq!(grid.number_of_levels(), 2);
    assert_eq!(grid.number_of_cells(), 26);
    assert_eq!(format_text_descriptor(&grid), SCENARIO_DESCRIPTOR);
}

#[test]
fn test_children_split_the_root_measure() {
    let grid = scenario_grid();
    for index in 0..5 {
        let mut cursor = grid.geometry_cursor(index).unwrap();
        let root = cursor.geometry().measure();
        assert_eq!(root, 1.0);
        for child in 0..cursor.number_of_children() {
            cursor.to_child(child);
            assert_eq!(root / cursor.geometry().measure(), 4.0);
            cursor.to_parent();
        }
    }
}

#[test]
fn test_neighbors_across_roots() {
    let grid = scenario_grid();
    let table = SubdivisionTable::get(2, grid.branch_factor());

    // east child of root (0, 0) touches the west child of root (1, 0)
    let mut cursor = grid.super_cursor(0, Stencil::VonNeumann).unwrap();
    cursor.to_child(table.child_at([1, 0, 0]));
    match cursor.neighbor_at([1, 0, 0]) {
        Some(Neighbor::Node(node)) => {
            assert_eq!(node.tree_index(), 1);
            assert_eq!(node.level, 1);
            let tree = grid.tree(1).unwrap();
            assert_eq!(node.vertex, tree.child(0, table.child_at([0, 0, 0])));
        }
        other => panic!("unexpected east neighbor {:?}", other),
    }
    assert!(matches!(cursor.neighbor_at([0, -1, 0]), Some(Neighbor::OutOfGrid)));

    // the north-east child of root (1, 1) sees the unrefined root (1, 2)
    let mut cursor = grid.super_cursor(3, Stencil::Moore).unwrap();
    cursor.to_child(table.child_at([1, 1, 0]));
    match cursor.neighbor_at([0, 1, 0]) {
        Some(Neighbor::Coarser(node)) => {
            assert_eq!(node.tree_index(), 5);
            assert_eq!(node.level, 0);
            assert_eq!(node.global_index(), 25);
        }
        other => panic!("unexpected north neighbor {:?}", other),
    }
    assert!(matches!(cursor.neighbor_at([1, 1, 0]), Some(Neighbor::OutOfGrid)));
    match cursor.neighbor_at([-1, 1, 0]) {
        Some(Neighbor::Coarser(node)) => assert_eq!(node.tree_index(), 5),
        other => panic!("unexpected north-west neighbor {:?}", other),
    }

    // the north-west child of the same root reaches across into root (0, 2)
    cursor.to_parent();
    cursor.to_child(table.child_at([0, 1, 0]));
    match cursor.neighbor_at([-1, 1, 0]) {
        Some(Neighbor::Node(node)) => {
            assert_eq!(node.tree_index(), 4);
            let tree = grid.tree(4).unwrap();
            assert_eq!(node.vertex, tree.child(0, table.child_at([1, 0, 0])));
        }
        other => panic!("unexpected north-west neighbor {:?}", other),
    }
}

#[test]
fn test_locate_points() {
    let grid = scenario_grid();

    let location = grid.locate([1.25, 0.25, 0.0]).unwrap();
    assert_eq!(location.tree_index, 1);
    assert_eq!(location.level, 1);
    assert_eq!(location.global_index, 6);

    let location = grid.locate([1.5, 2.5, 0.0]).unwrap();
    assert_eq!(location.tree_index, 5);
    assert_eq!(location.level, 0);
    assert_eq!(location.global_index, 25);

    assert!(grid.locate([5.0, 5.0, 0.0]).is_none());
}

#[test]
fn test_scenario_survives_storage() {
    let mut grid = scenario_grid();
    let mut levels = DataArray::zeros("Level", ValueType::I32, 1, grid.number_of_cells());
    for (_, tree) in grid.trees() {
        for (vertex, global) in tree.global_indices().enumerate() {
            let level = if vertex == 0 { 0.0 } else { 1.0 };
            levels.set_value_from_f64(global, 0, level);
        }
    }
    grid.add_cell_array(levels);
    grid.set_masked(13, true);

    for version in [FormatVersion::V0, FormatVersion::V1, FormatVersion::V2] {
        for mode in [DataMode::Binary, DataMode::Ascii] {
            run_with_file(|path| {
                HyperTreeGridWriter::with_config()
                    .version(version)
                    .data_mode(mode)
                    .build()
                    .write(&grid, path)?;
                let read = HyperTreeGridReader::new().read(path)?;
                assert_same_grid(&grid, &read);
                assert_eq!(format_text_descriptor(&read), SCENARIO_DESCRIPTOR);
                assert_eq!(read.cell_range("Level", Some(0)), Some((0.0, 1.0)));
                Ok(())
            });
        }
    }
}
