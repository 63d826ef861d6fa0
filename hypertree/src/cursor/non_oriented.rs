use crate::common::INLINE_DEPTH;
use crate::cursor::{
    AscendingCursor, CursorGeometry, GeometryCursor, GeometryTracker, HyperTreeCursor, NoGeometry,
    SubdivisionTable,
};
use crate::errors::HyperTreeResult;
use crate::tree::HyperTree;
use smallvec::SmallVec;
use std::ops::{Deref, DerefMut};

/// A cursor that can move down and back up a tree.
///
/// The ancestor chain is kept on a small inline stack. With `T = &HyperTree`
/// the cursor is read-only; with `T = &mut HyperTree` it can also
/// [`subdivide_leaf`](NonOrientedCursor::subdivide_leaf).
///
/// # Examples
///
/// ```rust
/// use hypertree::cursor::{AscendingCursor, HyperTreeCursor, NonOrientedCursor};
/// use hypertree::tree::{BranchFactor, HyperTree};
///
/// let mut tree = HyperTree::new(BranchFactor::Two, 2).unwrap();
/// let mut cursor = NonOrientedCursor::new(&mut tree);
/// cursor.subdivide_leaf().unwrap();
/// cursor.to_child(3);
/// assert_eq!(cursor.level(), 1);
/// cursor.to_parent();
/// assert!(cursor.is_root());
/// ```
#[derive(Clone, Debug)]
pub struct NonOrientedCursor<T, G = NoGeometry>
where
    T: Deref<Target = HyperTree>,
    G: CursorGeometry,
{
    tree: T,
    vertices: SmallVec<[u32; INLINE_DEPTH]>,
    geometry: G,
}

/// Non-oriented cursor tracking the extent of its cell.
pub type NonOrientedGeometryCursor<T> = NonOrientedCursor<T, GeometryTracker>;

impl<T> NonOrientedCursor<T, NoGeometry>
where
    T: Deref<Target = HyperTree>,
{
    pub fn new(tree: T) -> Self {
        Self::with_geometry(tree, NoGeometry)
    }
}

impl<T, G> NonOrientedCursor<T, G>
where
    T: Deref<Target = HyperTree>,
    G: CursorGeometry,
{
    /// Creates a cursor at the root of `tree` carrying `geometry` for the root cell.
    pub fn with_geometry(tree: T, geometry: G) -> Self {
        let mut vertices = SmallVec::new();
        vertices.push(0);
        NonOrientedCursor {
            tree,
            vertices,
            geometry,
        }
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// Local ids from the root down to the current vertex.
    pub fn path(&self) -> impl Iterator<Item = usize> + '_ {
        self.vertices.iter().map(|&v| v as usize)
    }

    fn table(&self) -> &'static SubdivisionTable {
        SubdivisionTable::get(self.tree.dimension(), self.tree.branch_factor())
    }
}

impl<T, G> NonOrientedCursor<T, G>
where
    T: DerefMut<Target = HyperTree>,
    G: CursorGeometry,
{
    /// Refines the current leaf; the cursor stays on the same vertex.
    ///
    /// Fails with `InvalidOperation` when the current vertex is already refined.
    pub fn subdivide_leaf(&mut self) -> HyperTreeResult<()> {
        let vertex = self.vertex_id();
        let level = self.level();
        self.tree.subdivide_vertex(vertex, level)
    }

    pub fn tree_mut(&mut self) -> &mut HyperTree {
        &mut self.tree
    }
}

impl<T, G> HyperTreeCursor for NonOrientedCursor<T, G>
where
    T: Deref<Target = HyperTree>,
    G: CursorGeometry,
{
    fn tree(&self) -> &HyperTree {
        &self.tree
    }

    #[inline]
    fn vertex_id(&self) -> usize {
        self.vertices[self.vertices.len() - 1] as usize
    }

    #[inline]
    fn level(&self) -> usize {
        self.vertices.len() - 1
    }

    fn to_child(&mut self, child: usize) {
        let vertex = self.vertex_id();
        assert!(!self.tree.is_leaf(vertex), "cannot descend from leaf {}", vertex);
        let next = self.tree.child(vertex, child);
        self.vertices.push(next as u32);
        let table = self.table();
        self.geometry.descend(table, child);
    }
}

impl<T, G> AscendingCursor for NonOrientedCursor<T, G>
where
    T: Deref<Target = HyperTree>,
    G: CursorGeometry,
{
    fn to_parent(&mut self) {
        assert!(self.vertices.len() > 1, "cursor is already at the root");
        self.vertices.pop();
        self.geometry.ascend();
    }

    fn to_root(&mut self) {
        self.vertices.truncate(1);
        self.geometry.reset();
    }
}

impl<T> GeometryCursor for NonOrientedCursor<T, GeometryTracker>
where
    T: Deref<Target = HyperTree>,
{
    fn origin(&self) -> [f64; 3] {
        self.geometry.origin()
    }

    fn size(&self) -> [f64; 3] {
        self.geometry.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::grid::ActiveAxes;
    use crate::tree::BranchFactor;

    #[test]
    fn test_subdivide_and_walk() {
        let mut tree = HyperTree::new(BranchFactor::Two, 3).unwrap();
        {
            let mut cursor = NonOrientedCursor::new(&mut tree);
            cursor.subdivide_leaf().unwrap();
            cursor.to_child(7);
            cursor.subdivide_leaf().unwrap();
            cursor.to_child(0);
            assert_eq!(cursor.level(), 2);
            assert_eq!(cursor.vertex_id(), 9);
            assert_eq!(cursor.path().collect::<Vec<_>>(), vec![0, 8, 9]);
            cursor.to_root();
            assert_eq!(cursor.vertex_id(), 0);
        }
        assert_eq!(tree.number_of_vertices(), 17);
        assert_eq!(tree.number_of_levels(), 3);
    }

    #[test]
    fn test_subdivide_refined_is_error() {
        let mut tree = HyperTree::new(BranchFactor::Three, 1).unwrap();
        let mut cursor = NonOrientedCursor::new(&mut tree);
        cursor.subdivide_leaf().unwrap();
        let err = cursor.subdivide_leaf().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        assert_eq!(cursor.tree().number_of_vertices(), 4);
    }

    #[test]
    #[should_panic]
    fn test_to_child_on_leaf_panics() {
        let tree = HyperTree::new(BranchFactor::Two, 2).unwrap();
        let mut cursor = NonOrientedCursor::new(&tree);
        cursor.to_child(0);
    }

    #[test]
    #[should_panic]
    fn test_to_parent_at_root_panics() {
        let tree = HyperTree::new(BranchFactor::Two, 2).unwrap();
        let mut cursor = NonOrientedCursor::new(&tree);
        cursor.to_parent();
    }

    #[test]
    fn test_geometry_follows_moves() {
        let mut tree = HyperTree::new(BranchFactor::Two, 2).unwrap();
        NonOrientedCursor::new(&mut tree).subdivide_leaf().unwrap();

        let tracker = GeometryTracker::new([0.0; 3], [2.0, 2.0, 0.0], ActiveAxes::from_points([2, 2, 1]), 2);
        let mut cursor = NonOrientedCursor::with_geometry(&tree, tracker);
        cursor.to_child(2);
        assert_eq!(cursor.origin(), [0.0, 1.0, 0.0]);
        assert_eq!(cursor.size(), [1.0, 1.0, 0.0]);
        assert_eq!(cursor.global_node_index(), 3);
        cursor.to_parent();
        assert_eq!(cursor.size(), [2.0, 2.0, 0.0]);
    }
}
