use super::{check_size, checked_sum, read_cell_data, read_mask, GridAssembler, Selection, VertexSource};
use crate::element::Element;
use crate::errors::{FormatError, FormatResult};
use crate::schema::*;
use crate::version::FormatVersion;
use hypertree::descriptor::{decode_tree, descriptor_len, LevelCounts};

/// Reads one `Tree` element per tree (v0 and v1). Returns the number of
/// vertices the file declares. A tree's `GlobalOffset`, when present, must
/// equal the vertices declared by the trees before it.
///
/// v0 carries no level counts, so they are inferred from the descriptor
/// and the selection does not apply.
pub(crate) fn read_trees(
    assembler: &mut GridAssembler,
    trees: &Element,
    selection: &Selection,
    version: FormatVersion,
) -> FormatResult<usize> {
    let inferred = version == FormatVersion::V0;
    if inferred && selection.is_restrictive() {
        log::warn!("Version 0 files are always read whole; ignoring tree selection and fixed level");
    }

    let mut declared_vertices = 0usize;
    for element in trees.children_named(TREE_ELEMENT) {
        let index: usize = element.parse_attribute(TREE_INDEX)?;
        let vertices: usize = element.parse_attribute(NUMBER_OF_VERTICES)?;
        if element.attribute(GLOBAL_OFFSET).is_some() {
            let offset: usize = element.parse_attribute(GLOBAL_OFFSET)?;
            if offset != declared_vertices {
                log::error!(
                    "Tree {} has global offset {}, preceding trees declare {} vertices",
                    index,
                    offset,
                    declared_vertices
                );
                return Err(FormatError::CorruptFile(format!(
                    "Tree {} has global offset {}, expected {}",
                    index, offset, declared_vertices
                )));
            }
        }
        declared_vertices = declared_vertices.checked_add(vertices).ok_or_else(|| {
            log::error!("Tree {} pushes the declared vertex count past {}", index, usize::MAX);
            FormatError::CorruptFile(format!("Tree {} declares too many vertices", index))
        })?;

        if !inferred && !selection.is_selected(assembler.grid(), index) {
            log::debug!("Skipping unselected tree {}", index);
            continue;
        }

        let bits = element.required_array(DESCRIPTOR)?.to_bit_array()?;
        let explicit;
        let (counts, depth_limit) = if inferred {
            (LevelCounts::Inferred, None)
        } else {
            explicit = element.required_array(NB_VERTICES_BY_LEVEL)?.to_indices()?;
            check_size(NB_VERTICES_BY_LEVEL, vertices, checked_sum(NB_VERTICES_BY_LEVEL, &explicit)?)?;
            if bits.len() > descriptor_len(&explicit) {
                log::error!(
                    "Tree {} descriptor has {} bits, level counts allow {}",
                    index,
                    bits.len(),
                    descriptor_len(&explicit)
                );
                return Err(FormatError::CorruptFile(format!(
                    "Tree {} descriptor is longer than its level counts allow",
                    index
                )));
            }
            let levels = selection.fixed_level_of(explicit.len(), index);
            (LevelCounts::Explicit(&explicit), Some(levels))
        };

        let decoded = decode_tree(
            &bits,
            counts,
            assembler.grid().branch_factor(),
            assembler.grid().dimension(),
            depth_limit,
        )?;
        if decoded.declared_vertices() != vertices {
            log::error!(
                "Tree {} declares {} vertices, descriptor holds {}",
                index,
                vertices,
                decoded.declared_vertices()
            );
            return Err(FormatError::CorruptFile(format!(
                "Tree {} declares {} vertices, descriptor holds {}",
                index,
                vertices,
                decoded.declared_vertices()
            )));
        }

        let window = 0..decoded.tree.number_of_vertices();
        let mask = read_mask(element, vertices, window.clone())?;
        let cell_data = read_cell_data(element, vertices, window)?;
        log::debug!(
            "Tree {}: {} of {} vertices read ({:?})",
            index,
            decoded.tree.number_of_vertices(),
            vertices,
            decoded.level_cut
        );
        assembler.place(
            index,
            decoded.tree,
            VertexSource {
                mask: mask.as_ref(),
                cell_data: &cell_data,
            },
        )?;
    }
    Ok(declared_vertices)
}
