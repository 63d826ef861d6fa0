use super::{cell_data_element, collect_records, gather_cell_data, gather_mask};
use crate::element::{ArrayElement, Element};
use crate::schema::*;
use hypertree::common::BitArray;
use hypertree::descriptor::EncodeOptions;
use hypertree::grid::HyperTreeGrid;

/// `Trees` element holding grid-wide arrays: tree ids, depth per tree,
/// per-depth vertex counts and untrimmed descriptors, all concatenated in
/// tree order, plus the mask and cell data in the same vertex order.
pub(crate) fn trees_element(grid: &HyperTreeGrid) -> Element {
    let records = collect_records(grid, &EncodeOptions::default());

    let mut tree_ids = Vec::with_capacity(records.len());
    let mut depth_per_tree = Vec::with_capacity(records.len());
    let mut vertices_per_depth = Vec::new();
    let mut descriptors = BitArray::new();
    let mut global_ids = Vec::new();
    for record in &records {
        tree_ids.push(record.index);
        depth_per_tree.push(record.encoded.number_of_levels());
        vertices_per_depth.extend_from_slice(&record.encoded.vertices_per_depth);
        descriptors.extend_from(&record.encoded.bits);
        global_ids.extend_from_slice(&record.global_ids);
    }

    let mut trees = Element::new(TREES_ELEMENT)
        .with_array(ArrayElement::indices(TREE_IDS, &tree_ids))
        .with_array(ArrayElement::indices(DEPTH_PER_TREE, &depth_per_tree))
        .with_array(ArrayElement::indices(NUMBER_OF_VERTICES_PER_DEPTH, &vertices_per_depth))
        .with_array(ArrayElement::bits(DESCRIPTORS, &descriptors));
    if let Some(mask) = gather_mask(grid, &global_ids) {
        trees.add_array(ArrayElement::bits(MASK, &mask));
    }
    trees.add_child(cell_data_element(&gather_cell_data(grid, &global_ids)));

    log::debug!(
        "Concatenated {} trees, {} descriptor bits, {} vertices",
        tree_ids.len(),
        descriptors.len(),
        global_ids.len()
    );
    trees
}
