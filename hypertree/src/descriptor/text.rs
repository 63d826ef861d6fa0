//! Human-readable grid descriptors such as `"RRRRR.|.... .... .... .... ...."`.
//!
//! `R` is a refined cell, `.` a leaf and `|` separates levels; whitespace is
//! ignored. Level 0 lists one character per root in root index order. Each
//! following level lists, tree after tree, the children of every refined
//! cell of the previous level in breadth-first order.

use crate::common::BitArray;
use crate::descriptor::{breadth_first_levels, decode_tree, descriptor_len, LevelCounts};
use crate::errors::{ErrorKind, HyperTreeError, HyperTreeResult};
use crate::grid::HyperTreeGrid;
use itertools::Itertools;
use std::collections::BTreeMap;

const REFINED: char = 'R';
const LEAF: char = '.';
const LEVEL_SEPARATOR: char = '|';

/// Breadth-first descriptor of one tree extracted from a text descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeDescriptor {
    pub bits: BitArray,
    pub vertices_per_depth: Vec<usize>,
}

fn invalid(message: String) -> HyperTreeError {
    log::error!("{}", message);
    HyperTreeError::new(&message, ErrorKind::InvalidArgument)
}

/// Splits a text descriptor into one breadth-first descriptor per root.
pub fn parse_text_descriptor(
    text: &str,
    number_of_roots: usize,
    number_of_children: usize,
) -> HyperTreeResult<BTreeMap<usize, TreeDescriptor>> {
    let levels: Vec<Vec<char>> = text
        .split(LEVEL_SEPARATOR)
        .map(|level| level.chars().filter(|c| !c.is_whitespace()).collect())
        .collect();

    if let Some(c) = levels.iter().flatten().find(|&&c| c != REFINED && c != LEAF) {
        return Err(invalid(format!("Unexpected character '{}' in descriptor", c)));
    }
    let roots = &levels[0];
    if roots.len() != number_of_roots {
        return Err(invalid(format!(
            "Descriptor lists {} roots, grid has {}",
            roots.len(),
            number_of_roots
        )));
    }

    let mut trees: Vec<TreeDescriptor> = roots
        .iter()
        .map(|&c| TreeDescriptor {
            bits: BitArray::from_bools(&[c == REFINED]),
            vertices_per_depth: vec![1],
        })
        .collect();
    let mut refined: Vec<usize> = roots.iter().map(|&c| (c == REFINED) as usize).collect();

    for (depth, level) in levels.iter().enumerate().skip(1) {
        let mut position = 0;
        for (tree, pending) in trees.iter_mut().zip(refined.iter_mut()) {
            let needed = *pending * number_of_children;
            if needed == 0 {
                continue;
            }
            let chunk = level.get(position..position + needed).ok_or_else(|| {
                invalid(format!("Level {} of the descriptor is too short", depth))
            })?;
            for &c in chunk {
                tree.bits.push(c == REFINED);
            }
            tree.vertices_per_depth.push(needed);
            *pending = chunk.iter().filter(|&&c| c == REFINED).count();
            position += needed;
        }
        if position != level.len() {
            return Err(invalid(format!(
                "Level {} of the descriptor has {} extra cells",
                depth,
                level.len() - position
            )));
        }
    }

    if refined.iter().any(|&r| r > 0) {
        return Err(invalid("Descriptor ends with refined cells".to_string()));
    }

    Ok(trees
        .into_iter()
        .map(|mut tree| {
            tree.bits.resize(descriptor_len(&tree.vertices_per_depth));
            tree
        })
        .enumerate()
        .collect())
}

/// Builds one tree per root of `grid` from a text descriptor.
pub fn apply_text_descriptor(grid: &mut HyperTreeGrid, text: &str) -> HyperTreeResult<()> {
    let descriptors = parse_text_descriptor(text, grid.number_of_roots(), grid.number_of_children())?;
    for (index, descriptor) in descriptors {
        let decoded = decode_tree(
            &descriptor.bits,
            LevelCounts::Explicit(&descriptor.vertices_per_depth),
            grid.branch_factor(),
            grid.dimension(),
            None,
        )?;
        grid.set_tree(index, decoded.tree)?;
    }
    log::debug!(
        "Built {} trees with {} vertices from text descriptor",
        grid.number_of_non_empty_trees(),
        grid.number_of_vertices()
    );
    Ok(())
}

/// Writes `grid` back as a text descriptor. Roots without a tree read as leaves.
pub fn format_text_descriptor(grid: &HyperTreeGrid) -> String {
    let nc = grid.number_of_children();
    let per_tree: BTreeMap<usize, Vec<Vec<usize>>> = grid
        .trees()
        .map(|(index, tree)| (index, breadth_first_levels(tree, None)))
        .collect();
    let cell = |refined: bool| if refined { REFINED } else { LEAF };

    let mut levels = Vec::new();
    levels.push(
        (0..grid.number_of_roots())
            .map(|index| cell(grid.tree(index).map(|t| !t.is_leaf(0)).unwrap_or(false)))
            .collect::<String>(),
    );

    for depth in 1..grid.number_of_levels() {
        let mut groups = per_tree.iter().flat_map(|(&index, tree_levels)| {
            let tree = grid.tree(index);
            tree_levels
                .get(depth)
                .map(|vertices| vertices.chunks(nc).collect::<Vec<_>>())
                .unwrap_or_default()
                .into_iter()
                .map(move |chunk| {
                    chunk
                        .iter()
                        .map(|&v| cell(tree.map(|t| !t.is_leaf(v)).unwrap_or(false)))
                        .collect::<String>()
                })
        });
        levels.push(groups.join(" "));
    }

    levels.join(&LEVEL_SEPARATOR.to_string())
}
