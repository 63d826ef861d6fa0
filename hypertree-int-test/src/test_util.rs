use hypertree::cursor::{AscendingCursor, HyperTreeCursor, NonOrientedCursor};
use hypertree::descriptor::{apply_text_descriptor, breadth_first_levels};
use hypertree::errors::HyperTreeResult;
use hypertree::grid::{DataArray, HyperTreeGrid, ValueType};
use hypertree::tree::HyperTree;
use hypertree_format::FormatResult;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Two levels over a 2x3 root lattice: five refined roots, one leaf root.
pub const SCENARIO_DESCRIPTOR: &str = "RRRRR.|.... .... .... .... ....";

/// Fresh file path in the temp directory.
pub fn random_path() -> PathBuf {
    let id = uuid::Uuid::new_v4();
    env::temp_dir().join(format!("{}.htg", id))
}

/// Runs `test` against a fresh file path and removes the file afterwards,
/// whatever the outcome.
pub fn run_with_file<T>(test: T)
where
    T: FnOnce(&Path) -> FormatResult<()>,
{
    let path = random_path();
    let result = test(&path);
    if path.exists() {
        if let Err(e) = fs::remove_file(&path) {
            log::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
    if let Err(e) = result {
        panic!("Test failed: {}", e);
    }
}

/// The 3x4x1 point lattice refined by [`SCENARIO_DESCRIPTOR`].
pub fn scenario_grid() -> HyperTreeGrid {
    let mut grid = HyperTreeGrid::builder()
        .dimensions([3, 4, 1])
        .branch_factor(2)
        .build()
        .expect("valid scenario lattice");
    apply_text_descriptor(&mut grid, SCENARIO_DESCRIPTOR).expect("valid scenario descriptor");
    grid
}

/// Shape of a randomly refined grid.
#[derive(Clone, Copy, Debug)]
pub struct RandomGridShape {
    pub dimensions: [usize; 3],
    pub branch_factor: usize,
    pub max_levels: usize,
    /// Chance that a root gets a tree.
    pub tree_probability: f64,
    /// Chance that a vertex above the last level is refined.
    pub refine_probability: f64,
    pub seed: u64,
}

impl Default for RandomGridShape {
    fn default() -> Self {
        RandomGridShape {
            dimensions: [4, 3, 3],
            branch_factor: 2,
            max_levels: 4,
            tree_probability: 0.8,
            refine_probability: 0.45,
            seed: 7,
        }
    }
}

fn refine_randomly(
    cursor: &mut NonOrientedCursor<&mut HyperTree>,
    rng: &mut StdRng,
    shape: &RandomGridShape,
) -> HyperTreeResult<()> {
    if cursor.level() + 1 >= shape.max_levels || !rng.random_bool(shape.refine_probability) {
        return Ok(());
    }
    cursor.subdivide_leaf()?;
    for child in 0..cursor.number_of_children() {
        cursor.to_child(child);
        refine_randomly(cursor, rng, shape)?;
        cursor.to_parent();
    }
    Ok(())
}

/// Grid with random trees plus a `GlobalId` array holding each cell's own
/// global index and a random two-component `Density` array.
pub fn random_grid(shape: &RandomGridShape) -> HyperTreeResult<HyperTreeGrid> {
    let mut rng = StdRng::seed_from_u64(shape.seed);
    let mut grid = HyperTreeGrid::builder()
        .dimensions(shape.dimensions)
        .branch_factor(shape.branch_factor)
        .build()?;
    for index in 0..grid.number_of_roots() {
        if !rng.random_bool(shape.tree_probability) {
            continue;
        }
        let mut cursor = grid.cursor_mut(index, true)?;
        refine_randomly(&mut cursor, &mut rng, shape)?;
    }

    let cells = grid.number_of_cells();
    let mut ids = DataArray::zeros("GlobalId", ValueType::I64, 1, cells);
    let mut density = DataArray::zeros("Density", ValueType::F64, 2, cells);
    for cell in 0..cells {
        ids.set_value_from_f64(cell, 0, cell as f64);
        density.set_tuple_from_f64(cell, &[rng.random_range(0.0..10.0), rng.random_range(-1.0..1.0)]);
    }
    grid.add_cell_array(ids);
    grid.add_cell_array(density);
    log::debug!(
        "Random grid {:?}: {} trees, {} vertices",
        shape.dimensions,
        grid.number_of_non_empty_trees(),
        grid.number_of_vertices()
    );
    Ok(grid)
}

/// Masks each cell of `grid` with probability `probability`.
pub fn mask_randomly(grid: &mut HyperTreeGrid, probability: f64, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for cell in 0..grid.number_of_cells() {
        if rng.random_bool(probability) {
            grid.set_masked(cell, true);
        }
    }
}

/// Asserts that two grids hold the same lattice, trees, mask and cell data.
///
/// Cells are paired by breadth-first position in their tree, so trees built
/// in a different vertex order still compare equal.
pub fn assert_same_grid(expected: &HyperTreeGrid, actual: &HyperTreeGrid) {
    assert_eq!(expected.dimensions(), actual.dimensions());
    assert_eq!(expected.branch_factor(), actual.branch_factor());
    assert_eq!(expected.transposed_root_indexing(), actual.transposed_root_indexing());
    for axis in 0..3 {
        assert_eq!(expected.coordinates(axis), actual.coordinates(axis));
    }
    assert_eq!(
        expected.tree_indices().collect::<Vec<_>>(),
        actual.tree_indices().collect::<Vec<_>>()
    );
    assert_eq!(expected.has_mask(), actual.has_mask());
    let names: Vec<_> = expected.cell_data().names().collect();
    assert_eq!(names, actual.cell_data().names().collect::<Vec<_>>());

    for (index, tree) in expected.trees() {
        let other = actual.tree(index).expect("tree present in both grids");
        assert!(tree.same_shape(other), "tree {} differs", index);
        let pairs = breadth_first_levels(tree, None)
            .concat()
            .into_iter()
            .zip(breadth_first_levels(other, None).concat());
        for (position, (va, vb)) in pairs.enumerate() {
            let (a, b) = (tree.global_index(va), other.global_index(vb));
            assert_eq!(expected.is_masked(a), actual.is_masked(b), "mask of {}:{}", index, position);
            for array in expected.cell_data().iter() {
                let other_array = actual.cell_data().get(array.name()).expect("array present");
                assert_eq!(
                    array.tuple_as_f64(a),
                    other_array.tuple_as_f64(b),
                    "{} of {}:{}",
                    array.name(),
                    index,
                    position
                );
            }
        }
    }
}
