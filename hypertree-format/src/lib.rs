//! # Hypertree Format
//!
//! Versioned persistence for [`hypertree`] grids.
//!
//! A file is a [`Document`](element::Document): a root `HyperTreeGrid`
//! element with the lattice parameters, a `Grid` element with the root
//! coordinates and a `Trees` element with the tree topology, mask and cell
//! data. Three layouts exist:
//!
//! | Version | Trees layout                                        |
//! |---------|-----------------------------------------------------|
//! | 0       | one element per tree, level counts inferred          |
//! | 1       | one element per tree, trimmed descriptor and counts  |
//! | 2       | grid-wide concatenated arrays                        |
//!
//! Documents are encoded with bincode (binary mode) or JSON (ASCII mode).
//! NaN values do not survive ASCII mode.
//!
//! The reader can load a subset of trees (by coordinate box, index box or
//! explicit list) and cut trees at a fixed level.
//!
//! ```rust
//! use hypertree::descriptor::apply_text_descriptor;
//! use hypertree::grid::HyperTreeGrid;
//! use hypertree_format::{FormatVersion, HyperTreeGridReader, HyperTreeGridWriter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut grid = HyperTreeGrid::builder().dimensions([3, 4, 1]).build()?;
//! apply_text_descriptor(&mut grid, "RRRRR.|.... .... .... .... ....")?;
//!
//! let mut bytes = Vec::new();
//! HyperTreeGridWriter::with_config()
//!     .version(FormatVersion::V2)
//!     .build()
//!     .write_to(&grid, &mut bytes)?;
//!
//! let coarse = HyperTreeGridReader::with_config()
//!     .fixed_level(1)
//!     .build()
//!     .read_bytes(&bytes)?;
//! assert_eq!(coarse.number_of_vertices(), 6);
//! # Ok(())
//! # }
//! ```

pub mod element;
pub mod errors;
pub mod reader;
pub mod schema;
pub mod version;
pub mod writer;

pub use errors::{FormatError, FormatResult};
pub use reader::{HyperTreeGridReader, HyperTreeGridReaderBuilder, Selection, SelectionMode};
pub use version::{DataMode, FormatVersion};
pub use writer::{HyperTreeGridWriter, HyperTreeGridWriterBuilder};

#[cfg(test)]
mod tests {
    #[ctor::ctor]
    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }
}
