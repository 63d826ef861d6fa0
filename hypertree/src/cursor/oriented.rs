use crate::cursor::{
    CursorGeometry, GeometryCursor, GeometryTracker, HyperTreeCursor, NoGeometry, SubdivisionTable,
};
use crate::tree::HyperTree;
use std::ops::Deref;

/// A descent-only cursor.
///
/// It keeps no ancestor stack: once it moved to a child the only way back
/// is [`OrientedCursor::reset`].
#[derive(Clone, Debug)]
pub struct OrientedCursor<T, G = NoGeometry>
where
    T: Deref<Target = HyperTree>,
    G: CursorGeometry,
{
    tree: T,
    vertex: usize,
    level: usize,
    geometry: G,
}

/// Oriented cursor tracking the extent of its cell.
pub type OrientedGeometryCursor<T> = OrientedCursor<T, GeometryTracker>;

impl<T> OrientedCursor<T, NoGeometry>
where
    T: Deref<Target = HyperTree>,
{
    pub fn new(tree: T) -> Self {
        Self::with_geometry(tree, NoGeometry)
    }
}

impl<T, G> OrientedCursor<T, G>
where
    T: Deref<Target = HyperTree>,
    G: CursorGeometry,
{
    pub fn with_geometry(tree: T, geometry: G) -> Self {
        OrientedCursor {
            tree,
            vertex: 0,
            level: 0,
            geometry,
        }
    }

    /// Goes back to the root.
    pub fn reset(&mut self) {
        self.vertex = 0;
        self.level = 0;
        self.geometry.reset();
    }
}

impl<T, G> HyperTreeCursor for OrientedCursor<T, G>
where
    T: Deref<Target = HyperTree>,
    G: CursorGeometry,
{
    fn tree(&self) -> &HyperTree {
        &self.tree
    }

    fn vertex_id(&self) -> usize {
        self.vertex
    }

    fn level(&self) -> usize {
        self.level
    }

    fn to_child(&mut self, child: usize) {
        assert!(!self.tree.is_leaf(self.vertex), "cannot descend from leaf {}", self.vertex);
        self.vertex = self.tree.child(self.vertex, child);
        self.level += 1;
        let table = SubdivisionTable::get(self.tree.dimension(), self.tree.branch_factor());
        self.geometry.descend(table, child);
    }
}

impl<T> GeometryCursor for OrientedCursor<T, GeometryTracker>
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
