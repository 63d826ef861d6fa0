//! Breadth-first descriptor codec.
//!
//! A tree's shape is written level by level, one bit per vertex (`1` for
//! refined, `0` for leaf) for every level but the last, whose vertices are
//! leaves by construction. The bit index of a vertex is its breadth-first
//! id. Per-level vertex counts travel next to the bits, so trailing leaf
//! bits can be dropped and a reader can stop at any level without looking
//! at deeper bits.

use crate::common::BitArray;
use crate::cursor::{AscendingCursor, HyperTreeCursor, NonOrientedCursor};
use crate::errors::{ErrorKind, HyperTreeError, HyperTreeResult};
use crate::tree::{BranchFactor, HyperTree};

/// Options for [`encode_tree`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Drop the trailing run of leaf bits.
    pub trim_trailing_leaves: bool,
    /// Emit at most this many levels; vertices on the last one count as leaves.
    pub depth_limit: Option<usize>,
}

impl EncodeOptions {
    pub fn trimmed() -> Self {
        EncodeOptions {
            trim_trailing_leaves: true,
            depth_limit: None,
        }
    }
}

/// A tree shape in breadth-first form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedDescriptor {
    pub bits: BitArray,
    pub vertices_per_depth: Vec<usize>,
    /// Local ids of the encoded vertices in breadth-first order, used to copy
    /// per-cell values in lockstep with the bits.
    pub breadth_first_ids: Vec<usize>,
}

impl EncodedDescriptor {
    pub fn number_of_levels(&self) -> usize {
        self.vertices_per_depth.len()
    }

    pub fn number_of_vertices(&self) -> usize {
        self.breadth_first_ids.len()
    }
}

/// How decoding ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelCut {
    /// Every declared level was read; the tree is complete.
    Exhausted,
    /// Decoding stopped at the depth limit; the declared tree is deeper and
    /// the cut level was forced to leaves.
    DepthLimited { declared_levels: usize },
}

/// Where the per-level vertex counts come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelCounts<'a> {
    /// Stored next to the bits.
    Explicit(&'a [usize]),
    /// Reconstructed by counting refined bits level by level.
    Inferred,
}

/// Result of [`decode_tree`].
#[derive(Clone, Debug)]
pub struct DecodedTree {
    pub tree: HyperTree,
    pub level_cut: LevelCut,
    /// Per-level counts as declared by the descriptor.
    pub declared_vertices_per_depth: Vec<usize>,
}


impl DecodedTree {
    /// Total declared vertices, read or not.
    pub fn declared_vertices(&self) -> usize {
        saturating_total(&self.declared_vertices_per_depth)
    }
}

/// Sum of `values`, `None` on overflow.
pub fn checked_total(values: &[usize]) -> Option<usize> {
    values.iter().try_fold(0usize, |total, &v| total.checked_add(v))
}

fn saturating_total(values: &[usize]) -> usize {
    values.iter().fold(0usize, |total, &v| total.saturating_add(v))
}

/// Number of descriptor bits of an untrimmed descriptor with these level counts.
///
/// Saturates at `usize::MAX`; counts read from a file go through
/// [`checked_descriptor_len`] instead.
pub fn descriptor_len(vertices_per_depth: &[usize]) -> usize {
    vertices_before_level(vertices_per_depth, vertices_per_depth.len().saturating_sub(1))
}

/// Like [`descriptor_len`], `None` when the counts overflow.
pub fn checked_descriptor_len(vertices_per_depth: &[usize]) -> Option<usize> {
    checked_total(&vertices_per_depth[..vertices_per_depth.len().saturating_sub(1)])
}

/// Vertices on levels `0..level`, saturating at `usize::MAX`.
pub fn vertices_before_level(vertices_per_depth: &[usize], level: usize) -> usize {
    saturating_total(&vertices_per_depth[..level.min(vertices_per_depth.len())])
}

/// Cursors on every vertex of `tree` grouped by level, breadth first.
fn breadth_first_frontiers(tree: &HyperTree, depth_limit: Option<usize>) -> Vec<Vec<NonOrientedCursor<&HyperTree>>> {
    let max_levels = depth_limit.unwrap_or(usize::MAX).max(1);
    let mut frontiers = vec![vec![NonOrientedCursor::new(tree)]];
    while frontiers.len() < max_levels {
        let mut next = Vec::new();
        for cursor in &frontiers[frontiers.len() - 1] {
            if cursor.is_leaf() {
                continue;
            }
            for child in 0..cursor.number_of_children() {
                let mut child_cursor = cursor.clone();
                child_cursor.to_child(child);
                next.push(child_cursor);
            }
        }
        if next.is_empty() {
            break;
        }
        frontiers.push(next);
    }
    frontiers
}

/// Local ids of `tree` grouped by level, breadth first.
pub fn breadth_first_levels(tree: &HyperTree, depth_limit: Option<usize>) -> Vec<Vec<usize>> {
    breadth_first_frontiers(tree, depth_limit)
        .iter()
        .map(|frontier| frontier.iter().map(|cursor| cursor.vertex_id()).collect())
        .collect()
}

/// Encodes the shape of `tree`.
pub fn encode_tree(tree: &HyperTree, options: &EncodeOptions) -> EncodedDescriptor {
    let frontiers = breadth_first_frontiers(tree, options.depth_limit);
    let vertices_per_depth: Vec<usize> = frontiers.iter().map(Vec::len).collect();

    let mut bits = BitArray::with_len(descriptor_len(&vertices_per_depth), false);
    let mut position = 0;
    for frontier in &frontiers[..frontiers.len() - 1] {
        for cursor in frontier {
            if !cursor.is_leaf() {
                bits.set(position, true);
            }
            position += 1;
        }
    }
    if options.trim_trailing_leaves {
        bits.truncate_trailing_zeros();
    }

    EncodedDescriptor {
        bits,
        vertices_per_depth,
        breadth_first_ids: frontiers.iter().flatten().map(|cursor| cursor.vertex_id()).collect(),
    }
}

/// Rebuilds per-level counts from bits alone: level `l + 1` holds
/// `number_of_children` vertices per refined vertex of level `l`.
pub fn infer_level_counts(bits: &BitArray, number_of_children: usize) -> HyperTreeResult<Vec<usize>> {
    let mut counts = vec![1usize];
    let mut position = 0;
    loop {
        let count = counts[counts.len() - 1];
        let ones = bits.count_ones_in(position..position + count);
        position += count;
        if ones == 0 {
            break;
        }
        counts.push(ones * number_of_children);
    }
    if bits.count_ones_in(position..bits.len()) > 0 {
        log::error!("Descriptor has refined bits past its last level");
        return Err(HyperTreeError::new(
            "Descriptor has refined bits past its last level",
            ErrorKind::CorruptDescriptor,
        ));
    }
    Ok(counts)
}

/// Moves `cursor` from the vertex at child-slot path `at` to the vertex at `target`.
fn move_along<C: AscendingCursor>(cursor: &mut C, at: &mut Vec<usize>, target: &[usize]) {
    let common = at.iter().zip(target).take_while(|(a, b)| a == b).count();
    for _ in common..at.len() {
        cursor.to_parent();
    }
    at.truncate(common);
    for &child in &target[common..] {
        cursor.to_child(child);
        at.push(child);
    }
}

/// Rebuilds a tree from its breadth-first descriptor.
///
/// Bits missing from a trimmed descriptor decode as leaves. With a depth
/// limit only levels `0..max(1, min(limit, declared))` are built and no bit
/// of the cut level or below is read.
pub fn decode_tree(
    bits: &BitArray,
    counts: LevelCounts<'_>,
    branch_factor: BranchFactor,
    dimension: usize,
    depth_limit: Option<usize>,
) -> HyperTreeResult<DecodedTree> {
    let nc = branch_factor.number_of_children(dimension);
    let declared: Vec<usize> = match counts {
        LevelCounts::Explicit(counts) => {
            let used = counts.iter().rposition(|&c| c != 0).map(|i| i + 1).unwrap_or(0);
            counts[..used].to_vec()
        }
        LevelCounts::Inferred => infer_level_counts(bits, nc)?,
    };
    if declared.first() != Some(&1) {
        log::error!("Descriptor must declare exactly one root vertex, got {:?}", declared.first());
        return Err(HyperTreeError::new(
            "Descriptor must declare exactly one root vertex",
            ErrorKind::CorruptDescriptor,
        ));
    }
    if checked_total(&declared).is_none() {
        log::error!("Descriptor level counts {:?} overflow", declared);
        return Err(HyperTreeError::new(
            "Descriptor level counts overflow",
            ErrorKind::CorruptDescriptor,
        ));
    }

    let declared_levels = declared.len();
    let levels = depth_limit
        .map(|limit| limit.min(declared_levels).max(1))
        .unwrap_or(declared_levels);

    let mut tree = HyperTree::new(branch_factor, dimension)?;
    {
        let mut cursor = NonOrientedCursor::new(&mut tree);
        let mut at = Vec::new();
        // child-slot paths of the current level, breadth first
        let mut frontier: Vec<Vec<usize>> = vec![Vec::new()];
        let mut position = 0;
        for level in 0..levels - 1 {
            let mut next = Vec::new();
            for path in &frontier {
                if bits.get(position) {
                    move_along(&mut cursor, &mut at, path);
                    cursor.subdivide_leaf()?;
                    next.extend((0..nc).map(|child| {
                        let mut child_path = path.clone();
                        child_path.push(child);
                        child_path
                    }));
                }
                position += 1;
            }
            if declared[level + 1] != next.len() {
                log::error!(
                    "Level {} declares {} vertices but {} refined vertices produce {}",
                    level + 1,
                    declared[level + 1],
                    next.len() / nc,
                    next.len()
                );
                return Err(HyperTreeError::new(
                    &format!(
                        "Level {} declares {} vertices, expected {}",
                        level + 1,
                        declared[level + 1],
                        next.len()
                    ),
                    ErrorKind::CorruptDescriptor,
                ));
            }
            frontier = next;
        }

        if levels == declared_levels && bits.count_ones_in(position..position + frontier.len()) > 0 {
            log::error!("Descriptor refines vertices on its last declared level");
            return Err(HyperTreeError::new(
                "Descriptor refines vertices on its last declared level",
                ErrorKind::CorruptDescriptor,
            ));
        }
    }

    let level_cut = if levels < declared_levels {
        LevelCut::DepthLimited { declared_levels }
    } else {
        LevelCut::Exhausted
    };

    Ok(DecodedTree {
        tree,
        level_cut,
        declared_vertices_per_depth: declared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // root refined, child 1 refined, grandchild 2 refined (quadtree)
    fn sample_tree() -> HyperTree {
        let mut tree = HyperTree::new(BranchFactor::Two, 2).unwrap();
        let mut cursor = NonOrientedCursor::new(&mut tree);
        cursor.subdivide_leaf().unwrap();
        cursor.to_child(1);
        cursor.subdivide_leaf().unwrap();
        cursor.to_child(2);
        cursor.subdivide_leaf().unwrap();
        cursor.to_root();
        cursor.to_child(3);
        cursor.subdivide_leaf().unwrap();
        tree
    }

    #[test]
    fn test_encode_sample() {
        let tree = sample_tree();
        let encoded = encode_tree(&tree, &EncodeOptions::default());
        assert_eq!(encoded.vertices_per_depth, vec![1, 4, 8, 4]);
        assert_eq!(encoded.bits.len(), 13);
        assert_eq!(
            encoded.bits.iter_ones().collect::<Vec<_>>(),
            vec![0, 2, 4, 7]
        );
        assert_eq!(encoded.number_of_vertices(), 17);
        assert_eq!(encoded.breadth_first_ids[7], 7);
        // child 3's block was created after child 1's grandchildren
        assert_eq!(encoded.breadth_first_ids[9], 13);
        assert_eq!(encoded.breadth_first_ids[13], 9);
    }

    #[test]
    fn test_trimmed_round_trip() {
        let tree = sample_tree();
        let encoded = encode_tree(&tree, &EncodeOptions::trimmed());
        assert_eq!(encoded.bits.len(), 8);
        let decoded = decode_tree(
            &encoded.bits,
            LevelCounts::Explicit(&encoded.vertices_per_depth),
            BranchFactor::Two,
            2,
            None,
        )
        .unwrap();
        assert_eq!(decoded.level_cut, LevelCut::Exhausted);
        assert_eq!(decoded.tree.number_of_vertices(), 17);
        assert_eq!(decoded.tree.number_of_levels(), 4);
        let again = encode_tree(&decoded.tree, &EncodeOptions::trimmed());
        assert_eq!(again.bits, encoded.bits);
        assert_eq!(again.vertices_per_depth, encoded.vertices_per_depth);
    }

    #[test]
    fn test_inferred_counts() {
        let tree = sample_tree();
        let encoded = encode_tree(&tree, &EncodeOptions::default());
        let counts = infer_level_counts(&encoded.bits, 4).unwrap();
        assert_eq!(counts, encoded.vertices_per_depth);

        let decoded = decode_tree(&encoded.bits, LevelCounts::Inferred, BranchFactor::Two, 2, None).unwrap();
        assert_eq!(decoded.tree.number_of_leaves(), tree.number_of_leaves());
    }

    #[test]
    fn test_depth_limit() {
        let tree = sample_tree();
        let encoded = encode_tree(&tree, &EncodeOptions::default());
        let counts = LevelCounts::Explicit(&encoded.vertices_per_depth);

        let decoded = decode_tree(&encoded.bits, counts, BranchFactor::Two, 2, Some(2)).unwrap();
        assert_eq!(decoded.level_cut, LevelCut::DepthLimited { declared_levels: 4 });
        assert_eq!(decoded.tree.number_of_vertices(), 5);
        assert_eq!(decoded.tree.number_of_leaves(), 4);
        assert_eq!(decoded.declared_vertices(), 17);

        let root_only = decode_tree(&encoded.bits, counts, BranchFactor::Two, 2, Some(0)).unwrap();
        assert_eq!(root_only.tree.number_of_vertices(), 1);

        let full = decode_tree(&encoded.bits, counts, BranchFactor::Two, 2, Some(10)).unwrap();
        assert_eq!(full.level_cut, LevelCut::Exhausted);
        assert_eq!(full.tree.number_of_vertices(), 17);
    }

    #[test]
    fn test_depth_limited_reads_no_deep_bits() {
        let tree = sample_tree();
        let encoded = encode_tree(&tree, &EncodeOptions::default());
        // only the first level's bits are needed for two levels
        let prefix = encoded.bits.slice(0..1);
        let decoded = decode_tree(
            &prefix,
            LevelCounts::Explicit(&encoded.vertices_per_depth),
            BranchFactor::Two,
            2,
            Some(2),
        )
        .unwrap();
        assert_eq!(decoded.tree.number_of_vertices(), 5);
    }

    #[test]
    fn test_count_mismatch_is_corrupt() {
        let bits = BitArray::from_bools(&[true, false, false]);
        let err = decode_tree(&bits, LevelCounts::Explicit(&[1, 3]), BranchFactor::Two, 1, None).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::CorruptDescriptor);

        let err = decode_tree(&bits, LevelCounts::Explicit(&[2, 2]), BranchFactor::Two, 1, None).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::CorruptDescriptor);

        let bits = BitArray::from_bools(&[true, false, true]);
        let err = decode_tree(&bits, LevelCounts::Explicit(&[1, 2]), BranchFactor::Two, 1, None).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::CorruptDescriptor);
    }

    #[test]
    fn test_single_leaf() {
        let tree = HyperTree::new(BranchFactor::Three, 3).unwrap();
        let encoded = encode_tree(&tree, &EncodeOptions::trimmed());
        assert!(encoded.bits.is_empty());
        assert_eq!(encoded.vertices_per_depth, vec![1]);
        let decoded = decode_tree(&encoded.bits, LevelCounts::Inferred, BranchFactor::Three, 3, None).unwrap();
        assert_eq!(decoded.tree.number_of_vertices(), 1);
        assert_eq!(decoded.level_cut, LevelCut::Exhausted);
    }

    #[test]
    fn test_encode_depth_limit() {
        let tree = sample_tree();
        let encoded = encode_tree(
            &tree,
            &EncodeOptions {
                trim_trailing_leaves: false,
                depth_limit: Some(2),
            },
        );
        assert_eq!(encoded.vertices_per_depth, vec![1, 4]);
        assert_eq!(encoded.bits.len(), 1);
        assert_eq!(encoded.breadth_first_ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_overflowing_counts_are_corrupt() {
        let bits = BitArray::from_bools(&[true]);
        let counts = [1, 2, usize::MAX];
        let err = decode_tree(&bits, LevelCounts::Explicit(&counts), BranchFactor::Two, 1, None).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::CorruptDescriptor);

        assert_eq!(checked_total(&counts), None);
        assert_eq!(checked_descriptor_len(&counts), Some(3));
        assert_eq!(checked_descriptor_len(&[1, usize::MAX, 4]), None);
        assert_eq!(descriptor_len(&[1, usize::MAX, 4]), usize::MAX);
        assert_eq!(vertices_before_level(&[1, 4], 9), 5);
    }

    #[test]
    fn test_decode_builds_breadth_first_ids() {
        let tree = sample_tree();
        let encoded = encode_tree(&tree, &EncodeOptions::default());
        let decoded = decode_tree(
            &encoded.bits,
            LevelCounts::Explicit(&encoded.vertices_per_depth),
            BranchFactor::Two,
            2,
            None,
        )
        .unwrap();
        let levels = breadth_first_levels(&decoded.tree, None);
        assert_eq!(levels.concat(), (0..17).collect::<Vec<_>>());
        assert!(decoded.tree.same_shape(&tree));
    }
}
