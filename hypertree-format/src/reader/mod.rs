//! Reads versioned hypertree grid documents.
//!
//! The document's major version picks the decode routine once. Per-tree
//! layouts (v0, v1) and the grid-wide layout (v2) both end up handing
//! decoded trees to a [`GridAssembler`], which places each tree in the
//! grid's index space and copies its mask bits and cell data tuples.

mod concatenated;
mod per_tree;
mod selection;

pub use selection::*;

use crate::element::{Document, Element};
use crate::errors::{FormatError, FormatResult};
use crate::schema::*;
use crate::version::FormatVersion;
use hypertree::common::{BitArray, Bounds};
use hypertree::descriptor::checked_total;
use hypertree::grid::{DataArray, HyperTreeGrid};
use hypertree::tree::HyperTree;
use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::Range;
use std::path::Path;

/// Mask bits and cell data tuples read for one file tree.
pub(crate) struct VertexSource<'a> {
    pub mask: Option<&'a BitArray>,
    pub cell_data: &'a [DataArray],
}

/// Accumulates decoded trees into a grid.
pub(crate) struct GridAssembler {
    grid: HyperTreeGrid,
    mask: Option<BitArray>,
}

impl GridAssembler {
    fn new(grid: HyperTreeGrid) -> Self {
        GridAssembler { grid, mask: None }
    }

    pub fn grid(&self) -> &HyperTreeGrid {
        &self.grid
    }

    /// Stores `tree` at root `index` and copies the values of its vertices.
    /// The source holds exactly the tree's vertices, breadth first.
    pub fn place(&mut self, index: usize, tree: HyperTree, source: VertexSource<'_>) -> FormatResult<()> {
        let vertices = tree.number_of_vertices();
        self.grid.set_tree(index, tree)?;
        let start = self
            .grid
            .tree(index)
            .map(HyperTree::global_index_start)
            .ok_or_else(|| FormatError::CorruptFile(format!("Tree {} vanished while reading", index)))?;

        if let Some(bits) = source.mask {
            let mask = self.mask.get_or_insert_with(BitArray::new);
            mask.copy_from(start, bits);
        }

        let cell_data = self.grid.cell_data_mut();
        for array in source.cell_data {
            if !cell_data.contains(array.name()) {
                cell_data.add_array(DataArray::zeros(
                    array.name(),
                    array.value_type(),
                    array.number_of_components(),
                    0,
                ));
            }
            if let Some(target) = cell_data.get_mut(array.name()) {
                target.copy_tuples_from(start, array, 0, vertices)?;
            }
        }
        Ok(())
    }

    fn finish(mut self) -> HyperTreeGrid {
        let cells = self.grid.number_of_cells();
        self.grid.cell_data_mut().resize(cells);
        if let Some(mut mask) = self.mask.take() {
            mask.resize(cells);
            self.grid.set_mask(Some(mask));
        }
        self.grid
    }
}

/// Checks that an array read from a file covers `expected` entries.
pub(crate) fn check_size(name: &str, expected: usize, actual: usize) -> FormatResult<()> {
    if expected != actual {
        log::error!("Array {} has {} entries, expected {}", name, actual, expected);
        return Err(FormatError::SizeMismatch {
            name: name.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Sum of counts read from array `name`, rejected when it overflows.
pub(crate) fn checked_sum(name: &str, values: &[usize]) -> FormatResult<usize> {
    checked_total(values).ok_or_else(|| {
        log::error!("Array {} sums past {}", name, usize::MAX);
        FormatError::CorruptFile(format!("Array {} overflows", name))
    })
}

/// Cell data arrays of a `CellData` child, each checked to hold `tuples`
/// tuples. Only the tuples in `window` are copied out.
pub(crate) fn read_cell_data(
    parent: &Element,
    tuples: usize,
    window: Range<usize>,
) -> FormatResult<Vec<DataArray>> {
    let Some(element) = parent.child(CELL_DATA_ELEMENT) else {
        return Ok(Vec::new());
    };
    element
        .arrays
        .iter()
        .map(|array| {
            check_size(array.name.as_str(), tuples, array.number_of_tuples)?;
            array.data_window(window.clone())
        })
        .collect()
}

/// Bits `window` of the optional `Mask` array of `parent`, checked to hold
/// `bits` bits.
pub(crate) fn read_mask(parent: &Element, bits: usize, window: Range<usize>) -> FormatResult<Option<BitArray>> {
    parent
        .array(MASK)
        .map(|array| {
            check_size(MASK, bits, array.number_of_tuples)?;
            array.bit_window(window)
        })
        .transpose()
}

/// Builds the empty grid described by the root element.
fn read_grid_header(root: &Element) -> FormatResult<HyperTreeGrid> {
    let branch_factor: usize = root.parse_attribute(BRANCH_FACTOR)?;
    let dimensions: Vec<usize> = root.parse_list_attribute(DIMENSIONS)?;
    let dimensions: [usize; 3] = dimensions.as_slice().try_into().map_err(|_| {
        log::error!("Dimensions must list three values, got {:?}", dimensions);
        FormatError::InvalidAttribute {
            attribute: DIMENSIONS.to_string(),
            value: root.attribute(DIMENSIONS).unwrap_or_default().to_string(),
        }
    })?;
    let transposed = match root.attribute(TRANSPOSED_ROOT_INDEXING) {
        Some(_) => root.parse_flag_attribute(TRANSPOSED_ROOT_INDEXING)?,
        None => false,
    };

    let geometry = root.required_child(GRID_ELEMENT)?;
    let mut builder = HyperTreeGrid::builder()
        .dimensions(dimensions)
        .branch_factor(branch_factor)
        .transposed_root_indexing(transposed);
    let [x, y, z] = COORDINATE_ARRAYS;
    builder = builder
        .x_coordinates(geometry.required_array(x)?.to_f64_vec()?)
        .y_coordinates(geometry.required_array(y)?.to_f64_vec()?)
        .z_coordinates(geometry.required_array(z)?.to_f64_vec()?);
    let mut grid = builder.build()?;
    grid.set_interface_names(
        root.attribute(INTERFACE_NORMALS_NAME),
        root.attribute(INTERFACE_INTERCEPTS_NAME),
    );
    Ok(grid)
}

/// Reads grids, optionally restricted to a subset of trees and levels.
///
/// The selection is applied to the first file read and cannot change
/// afterwards; create a new reader for a different selection.
#[derive(Clone, Debug, Default)]
pub struct HyperTreeGridReader {
    selection: Selection,
}

impl HyperTreeGridReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config() -> HyperTreeGridReaderBuilder {
        HyperTreeGridReaderBuilder::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_fixed_level(&mut self, level: Option<usize>) -> FormatResult<()> {
        self.selection.set_fixed_level(level)
    }

    pub fn set_coordinates_box(&mut self, bounds: Bounds) -> FormatResult<()> {
        self.selection.set_coordinates_box(bounds)
    }

    pub fn set_indices_box(&mut self, min: [usize; 3], max: [usize; 3]) -> FormatResult<()> {
        self.selection.set_indices_box(min, max)
    }

    pub fn add_selected_tree(&mut self, index: usize, level: Option<usize>) -> FormatResult<()> {
        self.selection.add_selected_tree(index, level)
    }

    pub fn clear_selected_trees(&mut self) -> FormatResult<()> {
        self.selection.clear_selected_trees()
    }

    pub fn select_all(&mut self) -> FormatResult<()> {
        self.selection.select_all()
    }

    pub fn read<P: AsRef<Path>>(&mut self, path: P) -> FormatResult<HyperTreeGrid> {
        let file = File::open(path.as_ref()).inspect_err(|e| {
            log::error!("Cannot open {}: {}", path.as_ref().display(), e);
        })?;
        self.read_from(BufReader::new(file))
    }

    pub fn read_from<R: Read>(&mut self, reader: R) -> FormatResult<HyperTreeGrid> {
        let document = Document::read_from(reader)?;
        self.read_document(&document)
    }

    pub fn read_bytes(&mut self, bytes: &[u8]) -> FormatResult<HyperTreeGrid> {
        let document = Document::decode(bytes)?;
        self.read_document(&document)
    }

    pub fn read_document(&mut self, document: &Document) -> FormatResult<HyperTreeGrid> {
        let version = document.format_version()?;
        let root = &document.root;
        if root.name != ROOT_ELEMENT {
            log::error!("Document root is {}, expected {}", root.name, ROOT_ELEMENT);
            return Err(FormatError::MissingElement(ROOT_ELEMENT.to_string()));
        }

        let grid = read_grid_header(root)?;
        self.selection.finalize(&grid);
        let trees = root.required_child(TREES_ELEMENT)?;

        let mut assembler = GridAssembler::new(grid);
        let declared_vertices = match version {
            FormatVersion::V0 | FormatVersion::V1 => {
                per_tree::read_trees(&mut assembler, trees, &self.selection, version)?
            }
            FormatVersion::V2 => concatenated::read_trees(&mut assembler, trees, &self.selection)?,
        };

        if root.attribute(NUMBER_OF_VERTICES).is_some() {
            let expected: usize = root.parse_attribute(NUMBER_OF_VERTICES)?;
            if expected != declared_vertices {
                log::error!(
                    "Header declares {} vertices, trees hold {}",
                    expected,
                    declared_vertices
                );
                return Err(FormatError::CorruptFile(format!(
                    "Header declares {} vertices, trees hold {}",
                    expected, declared_vertices
                )));
            }
        }

        let grid = assembler.finish();
        log::info!(
            "Read version {} grid: {} of {} declared vertices in {} trees",
            version,
            grid.number_of_vertices(),
            declared_vertices,
            grid.number_of_non_empty_trees()
        );
        Ok(grid)
    }
}

#[derive(Clone, Debug, Default)]
pub struct HyperTreeGridReaderBuilder {
    selection: Selection,
}

impl HyperTreeGridReaderBuilder {
    pub fn fixed_level(mut self, level: usize) -> Self {
        self.selection.fixed_level = Some(level);
        self
    }

    pub fn coordinates_box(mut self, bounds: Bounds) -> Self {
        self.selection.mode = SelectionMode::CoordinatesBox(bounds);
        self
    }

    pub fn indices_box(mut self, min: [usize; 3], max: [usize; 3]) -> Self {
        self.selection.mode = SelectionMode::IndicesBox { min, max };
        self
    }

    pub fn selected_tree(mut self, index: usize, level: Option<usize>) -> Self {
        match &mut self.selection.mode {
            SelectionMode::Ids(ids) => {
                ids.insert(index, level);
            }
            mode => *mode = SelectionMode::Ids([(index, level)].into()),
        }
        self
    }

    pub fn build(self) -> HyperTreeGridReader {
        HyperTreeGridReader {
            selection: self.selection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::DataMode;
    use crate::writer::tests::scenario_grid;
    use crate::writer::HyperTreeGridWriter;

    fn write(grid: &HyperTreeGrid, version: FormatVersion, mode: DataMode) -> Vec<u8> {
        let mut bytes = Vec::new();
        HyperTreeGridWriter::with_config()
            .version(version)
            .data_mode(mode)
            .build()
            .write_to(grid, &mut bytes)
            .unwrap();
        bytes
    }

    fn assert_same_grid(a: &HyperTreeGrid, b: &HyperTreeGrid) {
        assert_eq!(a.dimensions(), b.dimensions());
        assert_eq!(a.branch_factor(), b.branch_factor());
        assert_eq!(a.x_coordinates(), b.x_coordinates());
        assert_eq!(a.number_of_vertices(), b.number_of_vertices());
        assert_eq!(a.number_of_leaves(), b.number_of_leaves());
        assert_eq!(a.tree_indices().collect::<Vec<_>>(), b.tree_indices().collect::<Vec<_>>());
        for (index, tree) in a.trees() {
            let other = b.tree(index).unwrap();
            assert!(tree.same_shape(other));
            for v in 0..tree.number_of_vertices() {
                let (ga, gb) = (tree.global_index(v), other.global_index(v));
                assert_eq!(a.is_masked(ga), b.is_masked(gb));
                for array in a.cell_data().iter() {
                    let other_array = b.cell_data().get(array.name()).unwrap();
                    assert_eq!(array.tuple_as_f64(ga), other_array.tuple_as_f64(gb));
                }
            }
        }
    }

    #[test]
    fn test_round_trip_every_version_and_mode() {
        let grid = scenario_grid();
        for version in [FormatVersion::V0, FormatVersion::V1, FormatVersion::V2] {
            for mode in [DataMode::Binary, DataMode::Ascii] {
                let bytes = write(&grid, version, mode);
                let read = HyperTreeGridReader::new().read_bytes(&bytes).unwrap();
                assert_same_grid(&grid, &read);
                assert_eq!(read.cell_data().get("Level").unwrap().value_type(), hypertree::grid::ValueType::I32);
            }
        }
    }

    #[test]
    fn test_fixed_level_cuts_trees() {
        let grid = scenario_grid();
        let bytes = write(&grid, FormatVersion::V2, DataMode::Binary);
        let mut reader = HyperTreeGridReader::with_config().fixed_level(1).build();
        let read = reader.read_bytes(&bytes).unwrap();
        assert_eq!(read.number_of_non_empty_trees(), 6);
        assert_eq!(read.number_of_vertices(), 6);
        assert_eq!(read.number_of_levels(), 1);
        assert_eq!(read.cell_data().get("Velocity").unwrap().number_of_tuples(), 6);
    }

    #[test]
    fn test_selection_is_frozen_after_read() {
        let grid = scenario_grid();
        let bytes = write(&grid, FormatVersion::V1, DataMode::Binary);
        let mut reader = HyperTreeGridReader::with_config()
            .selected_tree(1, None)
            .selected_tree(3, Some(1))
            .build();
        let read = reader.read_bytes(&bytes).unwrap();
        assert_eq!(read.tree_indices().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(read.tree(1).unwrap().number_of_vertices(), 5);
        assert_eq!(read.tree(3).unwrap().number_of_vertices(), 1);
        assert!(matches!(reader.set_fixed_level(Some(2)), Err(FormatError::TooLate(_))));
    }

    #[test]
    fn test_missing_trees_element() {
        let grid = scenario_grid();
        let mut document = HyperTreeGridWriter::new().to_document(&grid).unwrap();
        document.root.children.retain(|c| c.name != TREES_ELEMENT);
        let err = HyperTreeGridReader::new().read_document(&document).unwrap_err();
        assert!(matches!(err, FormatError::MissingElement(_)));
    }

    #[test]
    fn test_vertex_count_mismatch() {
        let grid = scenario_grid();
        let mut document = HyperTreeGridWriter::new().to_document(&grid).unwrap();
        document.root.set_attribute(NUMBER_OF_VERTICES, 27);
        let err = HyperTreeGridReader::new().read_document(&document).unwrap_err();
        assert!(matches!(err, FormatError::CorruptFile(_)));
    }

    #[test]
    fn test_unsupported_version() {
        let grid = scenario_grid();
        let mut document = HyperTreeGridWriter::new().to_document(&grid).unwrap();
        document.version = "7.0".to_string();
        let err = HyperTreeGridReader::new().read_document(&document).unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedVersion(_)));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = HyperTreeGridReader::new()
            .read(dir.path().join("absent.htg"))
            .unwrap_err();
        assert!(matches!(err, FormatError::Io(_)));
    }
}
