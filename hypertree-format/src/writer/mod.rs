//! Writes a grid as a versioned document.
//!
//! Each non-empty tree is encoded breadth first; its mask bits and cell
//! data tuples are copied in the same breadth-first order, either into
//! one element per tree (v0, v1) or into grid-wide arrays (v2). Roots
//! without a tree are left out.

mod concatenated;
mod per_tree;

use crate::element::{ArrayElement, Document, Element};
use crate::errors::FormatResult;
use crate::schema::*;
use crate::version::{DataMode, FormatVersion};
use hypertree::common::BitArray;
use hypertree::descriptor::{encode_tree, EncodeOptions, EncodedDescriptor};
use hypertree::grid::{DataArray, HyperTreeGrid};
use itertools::Itertools;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One encoded tree with the global indices of its vertices in breadth-first order.
pub(crate) struct TreeRecord {
    pub index: usize,
    pub encoded: EncodedDescriptor,
    pub global_ids: Vec<usize>,
}

pub(crate) fn collect_records(grid: &HyperTreeGrid, options: &EncodeOptions) -> Vec<TreeRecord> {
    grid.trees()
        .map(|(index, tree)| {
            let encoded = encode_tree(tree, options);
            let global_ids = encoded
                .breadth_first_ids
                .iter()
                .map(|&v| tree.global_index(v))
                .collect();
            TreeRecord {
                index,
                encoded,
                global_ids,
            }
        })
        .collect()
}

/// Mask bits of `global_ids`, in order, when the grid has a mask.
pub(crate) fn gather_mask(grid: &HyperTreeGrid, global_ids: &[usize]) -> Option<BitArray> {
    grid.mask()
        .map(|mask| global_ids.iter().map(|&g| mask.get(g)).collect())
}

/// Every cell array restricted to `global_ids`, in order.
pub(crate) fn gather_cell_data(grid: &HyperTreeGrid, global_ids: &[usize]) -> Vec<DataArray> {
    let needed = global_ids.iter().max().map(|&m| m + 1).unwrap_or(0);
    grid.cell_data()
        .iter()
        .map(|array| {
            let array = if array.number_of_tuples() < needed {
                log::debug!(
                    "Padding array {} from {} to {} tuples",
                    array.name(),
                    array.number_of_tuples(),
                    needed
                );
                let mut padded = array.clone();
                padded.resize(needed);
                Cow::Owned(padded)
            } else {
                Cow::Borrowed(array)
            };
            array.gather(global_ids)
        })
        .collect()
}

pub(crate) fn cell_data_element(arrays: &[DataArray]) -> Element {
    let mut element = Element::new(CELL_DATA_ELEMENT);
    for array in arrays {
        element.add_array(ArrayElement::from_data_array(array));
    }
    element
}

/// Writes grids in a fixed format version and data mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HyperTreeGridWriter {
    version: FormatVersion,
    data_mode: DataMode,
}

impl HyperTreeGridWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config() -> HyperTreeGridWriterBuilder {
        HyperTreeGridWriterBuilder::default()
    }

    pub fn version(&self) -> FormatVersion {
        self.version
    }

    pub fn data_mode(&self) -> DataMode {
        self.data_mode
    }

    /// Builds the document for `grid` without writing it.
    pub fn to_document(&self, grid: &HyperTreeGrid) -> FormatResult<Document> {
        let mut root = Element::new(ROOT_ELEMENT)
            .with_attribute(BRANCH_FACTOR, grid.branch_factor().value())
            .with_attribute(TRANSPOSED_ROOT_INDEXING, grid.transposed_root_indexing() as u8)
            .with_attribute(DIMENSIONS, grid.dimensions().iter().join(" "))
            .with_attribute(NUMBER_OF_VERTICES, grid.number_of_vertices());
        if let Some(name) = grid.interface_normals_name() {
            root.set_attribute(INTERFACE_NORMALS_NAME, name);
        }
        if let Some(name) = grid.interface_intercepts_name() {
            root.set_attribute(INTERFACE_INTERCEPTS_NAME, name);
        }

        let mut geometry = Element::new(GRID_ELEMENT);
        for (axis, name) in COORDINATE_ARRAYS.iter().enumerate() {
            geometry.add_array(ArrayElement::coordinates(name, grid.coordinates(axis)));
        }
        root.add_child(geometry);

        let trees = match self.version {
            FormatVersion::V0 | FormatVersion::V1 => per_tree::trees_element(grid, self.version),
            FormatVersion::V2 => concatenated::trees_element(grid),
        };
        root.add_child(trees);

        log::info!(
            "Prepared version {} document with {} trees and {} vertices",
            self.version,
            grid.number_of_non_empty_trees(),
            grid.number_of_vertices()
        );
        Ok(Document::new(self.version, root))
    }

    pub fn write_to<W: Write>(&self, grid: &HyperTreeGrid, writer: W) -> FormatResult<()> {
        self.to_document(grid)?.write_to(writer, self.data_mode)
    }

    pub fn write<P: AsRef<Path>>(&self, grid: &HyperTreeGrid, path: P) -> FormatResult<()> {
        let file = File::create(path.as_ref()).inspect_err(|e| {
            log::error!("Cannot create {}: {}", path.as_ref().display(), e);
        })?;
        self.write_to(grid, BufWriter::new(file))?;
        log::debug!("Wrote hypertree grid to {}", path.as_ref().display());
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HyperTreeGridWriterBuilder {
    version: FormatVersion,
    data_mode: DataMode,
}

impl HyperTreeGridWriterBuilder {
    pub fn version(mut self, version: FormatVersion) -> Self {
        self.version = version;
        self
    }

    pub fn data_mode(mut self, data_mode: DataMode) -> Self {
        self.data_mode = data_mode;
        self
    }

    pub fn build(self) -> HyperTreeGridWriter {
        HyperTreeGridWriter {
            version: self.version,
            data_mode: self.data_mode,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use hypertree::descriptor::apply_text_descriptor;
    use hypertree::grid::ValueType;

    /// 3x4x1 grid, five refined roots, a mask and two cell arrays.
    pub(crate) fn scenario_grid() -> HyperTreeGrid {
        let mut grid = HyperTreeGrid::builder()
            .dimensions([3, 4, 1])
            .branch_factor(2)
            .x_coordinates(vec![0.0, 1.0, 3.0])
            .build()
            .unwrap();
        apply_text_descriptor(&mut grid, "RRRRR.|.... .... .... .... ....").unwrap();
        let cells = grid.number_of_cells();
        let mut level = DataArray::zeros("Level", ValueType::I32, 1, cells);
        let mut velocity = DataArray::zeros("Velocity", ValueType::F64, 3, cells);
        for (_, tree) in grid.trees() {
            for v in 0..tree.number_of_vertices() {
                let g = tree.global_index(v);
                level.set_value_from_f64(g, 0, if v == 0 { 0.0 } else { 1.0 });
                velocity.set_tuple_from_f64(g, &[g as f64, 2.0 * g as f64, -1.0]);
            }
        }
        grid.add_cell_array(level);
        grid.add_cell_array(velocity);
        let masked = grid.tree(2).unwrap().global_index(3);
        grid.set_masked(masked, true);
        grid
    }

    #[test]
    fn test_root_attributes() {
        let grid = scenario_grid();
        let document = HyperTreeGridWriter::new().to_document(&grid).unwrap();
        let root = &document.root;
        assert_eq!(root.attribute(BRANCH_FACTOR), Some("2"));
        assert_eq!(root.attribute(DIMENSIONS), Some("3 4 1"));
        assert_eq!(root.attribute(TRANSPOSED_ROOT_INDEXING), Some("0"));
        assert_eq!(root.attribute(NUMBER_OF_VERTICES), Some("26"));
        assert!(root.attribute(INTERFACE_NORMALS_NAME).is_none());

        let geometry = root.required_child(GRID_ELEMENT).unwrap();
        let x = geometry.required_array("XCoordinates").unwrap().to_f64_vec().unwrap();
        assert_eq!(x, vec![0.0, 1.0, 3.0]);
        assert_eq!(document.version, "2.0");
    }

    #[test]
    fn test_gather_pads_short_arrays() {
        let mut grid = scenario_grid();
        grid.add_cell_array(DataArray::zeros("Short", ValueType::U8, 1, 2));
        let ids: Vec<usize> = (0..grid.number_of_cells()).collect();
        let arrays = gather_cell_data(&grid, &ids);
        let short = arrays.iter().find(|a| a.name() == "Short").unwrap();
        assert_eq!(short.number_of_tuples(), 26);
    }

    #[test]
    fn test_write_file() {
        let grid = scenario_grid();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.htg");
        let writer = HyperTreeGridWriter::with_config()
            .version(FormatVersion::V1)
            .data_mode(DataMode::Ascii)
            .build();
        writer.write(&grid, &path).unwrap();
        let document = Document::read_from(File::open(&path).unwrap()).unwrap();
        assert_eq!(document.format_version().unwrap(), FormatVersion::V1);
    }
}
