use super::{cell_data_element, collect_records, gather_cell_data, gather_mask};
use crate::element::{ArrayElement, Element};
use crate::schema::*;
use crate::version::FormatVersion;
use hypertree::descriptor::EncodeOptions;
use hypertree::grid::HyperTreeGrid;

/// `Trees` element with one `Tree` child per non-empty tree.
///
/// v0 stores the untrimmed descriptor alone; v1 trims it and adds the
/// per-level vertex counts.
pub(crate) fn trees_element(grid: &HyperTreeGrid, version: FormatVersion) -> Element {
    let options = EncodeOptions {
        trim_trailing_leaves: version == FormatVersion::V1,
        depth_limit: None,
    };
    let mut trees = Element::new(TREES_ELEMENT);
    let mut offset = 0;
    for record in collect_records(grid, &options) {
        let vertices = record.encoded.number_of_vertices();
        let mut tree = Element::new(TREE_ELEMENT)
            .with_attribute(TREE_INDEX, record.index)
            .with_attribute(GLOBAL_OFFSET, offset)
            .with_attribute(NUMBER_OF_VERTICES, vertices)
            .with_array(ArrayElement::bits(DESCRIPTOR, &record.encoded.bits));
        if version == FormatVersion::V1 {
            tree.add_array(ArrayElement::indices(
                NB_VERTICES_BY_LEVEL,
                &record.encoded.vertices_per_depth,
            ));
        }
        if let Some(mask) = gather_mask(grid, &record.global_ids) {
            tree.add_array(ArrayElement::bits(MASK, &mask));
        }
        tree.add_child(cell_data_element(&gather_cell_data(grid, &record.global_ids)));

        log::debug!(
            "Tree {} written with {} vertices at offset {}",
            record.index,
            vertices,
            offset
        );
        offset += vertices;
        trees.add_child(tree);
    }
    trees
}
