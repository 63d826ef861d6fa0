//! Grid generators for benchmarks

use hypertree::cursor::{AscendingCursor, HyperTreeCursor, NonOrientedCursor};
use hypertree::errors::HyperTreeResult;
use hypertree::grid::{DataArray, HyperTreeGrid, ValueType};
use hypertree::tree::HyperTree;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn refine(
    cursor: &mut NonOrientedCursor<&mut HyperTree>,
    rng: &mut StdRng,
    levels: usize,
    probability: f64,
) -> HyperTreeResult<()> {
    if cursor.level() + 1 >= levels || !rng.gen_bool(probability) {
        return Ok(());
    }
    cursor.subdivide_leaf()?;
    for child in 0..cursor.number_of_children() {
        cursor.to_child(child);
        refine(cursor, rng, levels, probability)?;
        cursor.to_parent();
    }
    Ok(())
}

/// Cubic grid of `roots`^3 trees, each refined at random down to `levels`
/// levels, with a three-component `Velocity` array.
pub fn generate_grid(roots: usize, levels: usize, seed: u64) -> HyperTreeResult<HyperTreeGrid> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut grid = HyperTreeGrid::builder().dimensions([roots + 1; 3]).build()?;
    for index in 0..grid.number_of_roots() {
        let mut cursor = grid.cursor_mut(index, true)?;
        refine(&mut cursor, &mut rng, levels, 0.5)?;
    }

    let cells = grid.number_of_cells();
    let mut velocity = DataArray::zeros("Velocity", ValueType::F64, 3, cells);
    for cell in 0..cells {
        velocity.set_tuple_from_f64(
            cell,
            &[rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)],
        );
    }
    grid.add_cell_array(velocity);
    Ok(grid)
}

/// Grid sizes used across benchmarks: (roots per axis, levels).
pub fn grid_sizes() -> Vec<(usize, usize)> {
    vec![(2, 4), (4, 4), (4, 6)]
}
