use super::{check_size, checked_sum, read_cell_data, read_mask, GridAssembler, Selection, VertexSource};
use crate::element::Element;
use crate::errors::FormatResult;
use crate::schema::*;
use hypertree::descriptor::{decode_tree, descriptor_len, vertices_before_level, LevelCounts};

/// Reads the grid-wide arrays of a v2 file. Returns the number of vertices
/// the file declares.
///
/// Offsets of each tree into the concatenated arrays are prefix sums of the
/// per-tree depths, level counts and descriptor lengths. Only the descriptor
/// bits, mask bits and cell data tuples of selected trees are unpacked.
pub(crate) fn read_trees(
    assembler: &mut GridAssembler,
    trees: &Element,
    selection: &Selection,
) -> FormatResult<usize> {
    let tree_ids = trees.required_array(TREE_IDS)?.to_indices()?;
    let depths = trees.required_array(DEPTH_PER_TREE)?.to_indices()?;
    let counts = trees.required_array(NUMBER_OF_VERTICES_PER_DEPTH)?.to_indices()?;
    let descriptors = trees.required_array(DESCRIPTORS)?;

    check_size(DEPTH_PER_TREE, tree_ids.len(), depths.len())?;
    check_size(
        NUMBER_OF_VERTICES_PER_DEPTH,
        checked_sum(DEPTH_PER_TREE, &depths)?,
        counts.len(),
    )?;
    // every per-tree sum below is bounded by this one
    let total_vertices = checked_sum(NUMBER_OF_VERTICES_PER_DEPTH, &counts)?;
    let mut total_bits = 0;
    let mut depth_offset = 0;
    for &depth in &depths {
        total_bits += descriptor_len(&counts[depth_offset..depth_offset + depth]);
        depth_offset += depth;
    }
    check_size(DESCRIPTORS, total_bits, descriptors.number_of_tuples)?;

    let mut depth_offset = 0;
    let mut bit_offset = 0;
    let mut vertex_offset = 0;
    for (&index, &depth) in tree_ids.iter().zip(&depths) {
        let tree_counts = &counts[depth_offset..depth_offset + depth];
        let tree_bits = descriptor_len(tree_counts);
        let tree_vertices: usize = tree_counts.iter().sum();

        if selection.is_selected(assembler.grid(), index) {
            let levels = selection.fixed_level_of(depth, index);
            let needed = if levels >= depth {
                tree_bits
            } else {
                vertices_before_level(tree_counts, levels - 1)
            };
            let bits = descriptors.bit_window(bit_offset..bit_offset + needed)?;
            let decoded = decode_tree(
                &bits,
                LevelCounts::Explicit(tree_counts),
                assembler.grid().branch_factor(),
                assembler.grid().dimension(),
                Some(levels),
            )?;
            log::debug!(
                "Tree {}: {} of {} vertices read ({:?})",
                index,
                decoded.tree.number_of_vertices(),
                tree_vertices,
                decoded.level_cut
            );
            let window = vertex_offset..vertex_offset + decoded.tree.number_of_vertices();
            let mask = read_mask(trees, total_vertices, window.clone())?;
            let cell_data = read_cell_data(trees, total_vertices, window)?;
            assembler.place(
                index,
                decoded.tree,
                VertexSource {
                    mask: mask.as_ref(),
                    cell_data: &cell_data,
                },
            )?;
        } else {
            log::debug!("Skipping unselected tree {}", index);
        }

        depth_offset += depth;
        bit_offset += tree_bits;
        vertex_offset += tree_vertices;
    }
    Ok(total_vertices)
}

#[cfg(test)]
mod tests {
    use crate::element::{ArrayElement, Document, Element};
    use crate::errors::FormatError;
    use crate::reader::HyperTreeGridReader;
    use crate::schema::*;
    use crate::version::FormatVersion;
    use crate::writer::tests::scenario_grid;
    use crate::writer::HyperTreeGridWriter;
    use hypertree::common::Bounds;

    fn document() -> Document {
        HyperTreeGridWriter::with_config()
            .version(FormatVersion::V2)
            .build()
            .to_document(&scenario_grid())
            .unwrap()
    }

    fn trees_element(document: &mut Document) -> &mut Element {
        document
            .root
            .children
            .iter_mut()
            .find(|c| c.name == TREES_ELEMENT)
            .unwrap()
    }

    #[test]
    fn test_coordinates_box_reads_subset() {
        let document = document();
        // x coordinates are 0, 1, 3; y and z default to unit spacing
        let mut reader = HyperTreeGridReader::with_config()
            .coordinates_box(Bounds::new([1.5, 0.2, 0.0], [2.5, 1.8, 0.0]))
            .build();
        let grid = reader.read_document(&document).unwrap();
        assert_eq!(grid.tree_indices().collect::<Vec<_>>(), vec![1, 3]);

        let source = scenario_grid();
        for index in [1, 3] {
            let tree = grid.tree(index).unwrap();
            let original = source.tree(index).unwrap();
            assert!(tree.same_shape(original));
            let velocity = grid.cell_data().get("Velocity").unwrap();
            let source_velocity = source.cell_data().get("Velocity").unwrap();
            for v in 0..tree.number_of_vertices() {
                assert_eq!(
                    velocity.tuple_as_f64(tree.global_index(v)),
                    source_velocity.tuple_as_f64(original.global_index(v))
                );
            }
        }
    }

    #[test]
    fn test_offsets_skip_unselected_trees() {
        let document = document();
        let mut reader = HyperTreeGridReader::with_config().selected_tree(4, None).build();
        let grid = reader.read_document(&document).unwrap();
        let tree = grid.tree(4).unwrap();
        let level = grid.cell_data().get("Level").unwrap();
        assert_eq!(level.number_of_tuples(), 5);
        assert_eq!(level.value_as_f64(tree.global_index(0), 0), Some(0.0));
        assert_eq!(level.value_as_f64(tree.global_index(4), 0), Some(1.0));
        let velocity = grid.cell_data().get("Velocity").unwrap();
        // vertex 2 of tree 4 was global cell 22 when written
        assert_eq!(velocity.tuple_as_f64(tree.global_index(2)), Some(vec![22.0, 44.0, -1.0]));
    }

    #[test]
    fn test_depth_array_length_mismatch() {
        let mut document = document();
        let trees = trees_element(&mut document);
        trees.arrays.retain(|a| a.name != DEPTH_PER_TREE);
        trees.add_array(ArrayElement::indices(DEPTH_PER_TREE, &[2, 2, 2]));
        let err = HyperTreeGridReader::new().read_document(&document).unwrap_err();
        assert!(matches!(err, FormatError::SizeMismatch { .. }));
    }

    #[test]
    fn test_cell_data_length_mismatch() {
        let mut document = document();
        let trees = trees_element(&mut document);
        let cell_data = trees.children.iter_mut().find(|c| c.name == CELL_DATA_ELEMENT).unwrap();
        let mut level = cell_data.required_array("Level").unwrap().to_data_array().unwrap();
        level.resize(20);
        cell_data.arrays.retain(|a| a.name != "Level");
        cell_data.add_array(ArrayElement::from_data_array(&level));
        let err = HyperTreeGridReader::new().read_document(&document).unwrap_err();
        assert!(matches!(err, FormatError::SizeMismatch { .. }));
    }

    #[test]
    fn test_overflowing_depths() {
        let mut document = document();
        let trees = trees_element(&mut document);
        trees.arrays.retain(|a| a.name != DEPTH_PER_TREE);
        trees.add_array(ArrayElement::indices(DEPTH_PER_TREE, &[usize::MAX, 2, 2, 2, 2, 2]));
        let err = HyperTreeGridReader::new().read_document(&document).unwrap_err();
        assert!(matches!(err, FormatError::CorruptFile(_)));
    }

    #[test]
    fn test_overflowing_level_counts() {
        let mut document = document();
        let trees = trees_element(&mut document);
        let mut counts = trees
            .required_array(NUMBER_OF_VERTICES_PER_DEPTH)
            .unwrap()
            .to_indices()
            .unwrap();
        counts[1] = usize::MAX;
        trees.arrays.retain(|a| a.name != NUMBER_OF_VERTICES_PER_DEPTH);
        trees.add_array(ArrayElement::indices(NUMBER_OF_VERTICES_PER_DEPTH, &counts));
        let err = HyperTreeGridReader::new().read_document(&document).unwrap_err();
        assert!(matches!(err, FormatError::CorruptFile(_)));
    }

    #[test]
    fn test_selected_tree_reads_only_its_tuples() {
        let document = document();
        let mut reader = HyperTreeGridReader::with_config()
            .fixed_level(1)
            .selected_tree(5, None)
            .build();
        let grid = reader.read_document(&document).unwrap();
        assert_eq!(grid.number_of_vertices(), 1);
        let velocity = grid.cell_data().get("Velocity").unwrap();
        assert_eq!(velocity.number_of_tuples(), 1);
        // root of tree 5 was global cell 25 when written
        assert_eq!(velocity.tuple_as_f64(0), Some(vec![25.0, 50.0, -1.0]));
        assert!(!grid.is_masked(0));
    }
}
