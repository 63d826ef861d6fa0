//! # Hypertree - Sparse Adaptive Hierarchical Grids
//!
//! A hypertree grid is a rectilinear lattice of roots, each of which may
//! carry one adaptive tree refined with a branch factor of 2 or 3 along
//! every active axis. It stores adaptive-mesh-refinement style data far more
//! compactly than a dense voxel grid.
//!
//! ## Key Features
//!
//! - **Sparse roots**: trees are materialized only where needed
//! - **Arena trees**: vertices are indices into one table, no pointers
//! - **Shared cell index space**: one flat global index per cell across all trees
//! - **Cursors**: oriented, non-oriented, geometry-aware and neighbor-aware
//! - **Breadth-first codec**: compact bit descriptors with level-limited decoding
//! - **Masks and ghosts**: blanking and ghost flags with cached derived state
//!
//! ## Quick Start
//!
//! ```rust
//! use hypertree::cursor::{HyperTreeCursor, Stencil};
//! use hypertree::descriptor::{apply_text_descriptor, encode_tree, EncodeOptions};
//! use hypertree::grid::HyperTreeGrid;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut grid = HyperTreeGrid::builder()
//!     .dimensions([3, 4, 1])
//!     .branch_factor(2)
//!     .build()?;
//! apply_text_descriptor(&mut grid, "RRRRR.|.... .... .... .... ....")?;
//! assert_eq!(grid.number_of_leaves(), 21);
//!
//! let tree = grid.tree(0).ok_or("missing tree")?;
//! let encoded = encode_tree(tree, &EncodeOptions::trimmed());
//! assert_eq!(encoded.vertices_per_depth, vec![1, 4]);
//!
//! let cursor = grid.super_cursor(0, Stencil::VonNeumann)?;
//! assert!(!cursor.is_leaf());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`common`] - Bit arrays, bounds and shared constants
//! - [`errors`] - Error types and result definitions
//! - [`tree`] - Arena trees and global index allocation
//! - [`cursor`] - Cursor family and subdivision tables
//! - [`grid`] - Root lattice, grid, cell data, masks and ghosts
//! - [`descriptor`] - Breadth-first descriptor codec and text descriptors

pub mod common;
pub mod cursor;
pub mod descriptor;
pub mod errors;
pub mod grid;
pub mod tree;

#[cfg(test)]
mod tests {
    use super::grid::HyperTreeGrid;

    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    #[test]
    fn test_grid_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HyperTreeGrid>();
    }
}
