//! The root lattice, its sparse trees and the grid-wide cell data.

mod cell_data;
#[allow(clippy::module_inception)]
mod grid;
mod lattice;

pub use cell_data::*;
pub use grid::*;
pub use lattice::*;
