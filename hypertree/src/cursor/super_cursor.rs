use crate::cursor::{
    AscendingCursor, CursorGeometry, GeometryCursor, GeometryTracker, HyperTreeCursor, NoGeometry,
    SubdivisionTable,
};
use crate::errors::{ErrorKind, HyperTreeError, HyperTreeResult};
use crate::grid::{ActiveAxes, HyperTreeGrid};
use crate::tree::HyperTree;

/// Which neighbors a [`SuperCursor`] tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stencil {
    /// Face neighbors only.
    VonNeumann,
    /// Face, edge and corner neighbors.
    Moore,
}

/// A vertex seen from a super-cursor.
#[derive(Clone, Copy, Debug)]
pub struct NeighborNode<'a> {
    pub tree: &'a HyperTree,
    pub vertex: usize,
    pub level: usize,
}

impl<'a> NeighborNode<'a> {
    pub fn is_leaf(&self) -> bool {
        self.tree.is_leaf(self.vertex)
    }

    pub fn tree_index(&self) -> usize {
        self.tree.tree_index()
    }

    pub fn global_index(&self) -> usize {
        self.tree.global_index(self.vertex)
    }

    fn child(&self, child: usize) -> NeighborNode<'a> {
        NeighborNode {
            tree: self.tree,
            vertex: self.tree.child(self.vertex, child),
            level: self.level + 1,
        }
    }
}

impl PartialEq for NeighborNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.vertex == other.vertex && self.level == other.level
    }
}

/// State of one stencil slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Neighbor<'a> {
    /// The slot lies outside the root lattice.
    OutOfGrid,
    /// The slot's root has no tree.
    NoTree,
    /// A vertex at the cursor's level.
    Node(NeighborNode<'a>),
    /// No vertex at the cursor's level; the coarser leaf covering the slot.
    Coarser(NeighborNode<'a>),
}

impl<'a> Neighbor<'a> {
    pub fn node(&self) -> Option<&NeighborNode<'a>> {
        match self {
            Neighbor::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Neighbor::Node(_))
    }

    fn descend(&self, child: usize) -> Neighbor<'a> {
        match self {
            Neighbor::OutOfGrid => Neighbor::OutOfGrid,
            Neighbor::NoTree => Neighbor::NoTree,
            Neighbor::Coarser(node) => Neighbor::Coarser(*node),
            Neighbor::Node(node) if node.is_leaf() => Neighbor::Coarser(*node),
            Neighbor::Node(node) => Neighbor::Node(node.child(child)),
        }
    }
}

/// A cursor that also tracks its same-level neighbors, across tree boundaries.
///
/// The neighborhood of every level on the current path is kept on a stack.
/// Descending recomputes the child's neighborhood from the parent's
/// through the fixed adjacency table; ascending pops it.
///
/// Slots are numbered as in [`SubdivisionTable`]; the center slot is the
/// cursor itself.
pub struct SuperCursor<'a, G = NoGeometry>
where
    G: CursorGeometry,
{
    grid: &'a HyperTreeGrid,
    table: &'static SubdivisionTable,
    axes: ActiveAxes,
    stencil: Stencil,
    // neighborhoods[level * stencil_size + slot]
    neighborhoods: Vec<Neighbor<'a>>,
    geometry: G,
}

/// Super-cursor tracking the extent of its cell.
pub type SuperGeometryCursor<'a> = SuperCursor<'a, GeometryTracker>;

impl<'a> SuperCursor<'a, NoGeometry> {
    /// Light super-cursor at the root of tree `index`.
    pub fn new(grid: &'a HyperTreeGrid, index: usize, stencil: Stencil) -> HyperTreeResult<Self> {
        SuperCursor::with_geometry(grid, index, stencil, NoGeometry)
    }
}

impl<'a> SuperCursor<'a, GeometryTracker> {
    /// Super-cursor with geometry at the root of tree `index`.
    pub fn with_grid_geometry(grid: &'a HyperTreeGrid, index: usize, stencil: Stencil) -> HyperTreeResult<Self> {
        let (origin, size) = grid.level_zero_origin_and_size(index)?;
        let tracker = GeometryTracker::new(origin, size, grid.active_axes(), grid.branch_factor().value());
        SuperCursor::with_geometry(grid, index, stencil, tracker)
    }

    /// Origin of the cell in `slot`, assuming it is a same-level neighbor.
    pub fn neighbor_origin(&self, slot: usize) -> [f64; 3] {
        let offset = self.table.stencil_offset(slot);
        let size = self.geometry.size();
        let mut origin = self.geometry.origin();
        for (a, &axis) in self.axes.as_slice().iter().enumerate() {
            origin[axis] += offset[a] as f64 * size[axis];
        }
        origin
    }
}

impl<'a, G> SuperCursor<'a, G>
where
    G: CursorGeometry,
{
    pub fn with_geometry(grid: &'a HyperTreeGrid, index: usize, stencil: Stencil, geometry: G) -> HyperTreeResult<Self> {
        if grid.tree(index).is_none() {
            log::error!("Cannot place a super cursor on missing tree {}", index);
            return Err(HyperTreeError::new(
                &format!("Tree {} does not exist", index),
                ErrorKind::NotFound,
            ));
        }

        let table = SubdivisionTable::get(grid.dimension(), grid.branch_factor());
        let mut cursor = SuperCursor {
            grid,
            table,
            axes: grid.active_axes(),
            stencil,
            neighborhoods: Vec::with_capacity(table.stencil_size() * 4),
            geometry,
        };
        cursor.initialize(index);
        Ok(cursor)
    }

    fn initialize(&mut self, index: usize) {
        self.neighborhoods.clear();
        self.neighborhoods.resize(self.table.stencil_size(), Neighbor::OutOfGrid);
        for &slot in self.slots() {
            let shift = self.axes.to_lattice(self.table.stencil_offset(slot));
            self.neighborhoods[slot] = match self.grid.shifted_level_zero_index(index, shift) {
                None => Neighbor::OutOfGrid,
                Some(neighbor) => match self.grid.tree(neighbor) {
                    None => Neighbor::NoTree,
                    Some(tree) => Neighbor::Node(NeighborNode { tree, vertex: 0, level: 0 }),
                },
            };
        }
        self.geometry.reset();
    }

    pub fn stencil(&self) -> Stencil {
        self.stencil
    }

    /// Stencil slots this cursor keeps up to date.
    pub fn slots(&self) -> &'static [usize] {
        match self.stencil {
            Stencil::VonNeumann => self.table.von_neumann_slots(),
            Stencil::Moore => self.table.moore_slots(),
        }
    }

    pub fn center_slot(&self) -> usize {
        self.table.center_slot()
    }

    pub fn table(&self) -> &'static SubdivisionTable {
        self.table
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// Neighbor in `slot`, `None` for slots outside the stencil.
    pub fn neighbor(&self, slot: usize) -> Option<Neighbor<'a>> {
        if !self.slots().contains(&slot) {
            return None;
        }
        Some(self.current()[slot])
    }

    /// Neighbor at `offset` along the local axes.
    pub fn neighbor_at(&self, offset: [i64; 3]) -> Option<Neighbor<'a>> {
        if offset.iter().any(|o| !(-1..=1).contains(o)) {
            return None;
        }
        self.neighbor(self.table.slot_of(offset))
    }

    /// Tracked slots with their neighbors, center included.
    pub fn neighbors(&self) -> impl Iterator<Item = (usize, Neighbor<'a>)> + '_ {
        let current = self.current();
        self.slots().iter().map(move |&slot| (slot, current[slot]))
    }

    fn current(&self) -> &[Neighbor<'a>] {
        let size = self.table.stencil_size();
        &self.neighborhoods[self.neighborhoods.len() - size..]
    }

    fn center(&self) -> NeighborNode<'a> {
        match self.current()[self.table.center_slot()] {
            Neighbor::Node(node) => node,
            // the center slot always holds the cursor's own vertex
            other => unreachable!("center slot holds {:?}", other),
        }
    }
}

impl<'a, G> HyperTreeCursor for SuperCursor<'a, G>
where
    G: CursorGeometry,
{
    fn tree(&self) -> &HyperTree {
        self.center().tree
    }

    fn vertex_id(&self) -> usize {
        self.center().vertex
    }

    fn level(&self) -> usize {
        self.neighborhoods.len() / self.table.stencil_size() - 1
    }

    fn to_child(&mut self, child: usize) {
        let center = self.center();
        assert!(!center.is_leaf(), "cannot descend from leaf {}", center.vertex);
        assert!(child < self.table.number_of_children(), "child slot {} out of range", child);

        let size = self.table.stencil_size();
        let parent_start = self.neighborhoods.len() - size;
        self.neighborhoods.resize(parent_start + 2 * size, Neighbor::OutOfGrid);
        for &slot in self.slots() {
            let (parent_slot, neighbor_child) = self.table.adjacency(child, slot);
            let next = self.neighborhoods[parent_start + parent_slot].descend(neighbor_child);
            self.neighborhoods[parent_start + size + slot] = next;
        }
        self.geometry.descend(self.table, child);
    }
}

impl<G> AscendingCursor for SuperCursor<'_, G>
where
    G: CursorGeometry,
{
    fn to_parent(&mut self) {
        let size = self.table.stencil_size();
        assert!(self.neighborhoods.len() > size, "cursor is already at the root");
        self.neighborhoods.truncate(self.neighborhoods.len() - size);
        self.geometry.ascend();
    }

    fn to_root(&mut self) {
        self.neighborhoods.truncate(self.table.stencil_size());
        self.geometry.reset();
    }
}

impl GeometryCursor for SuperCursor<'_, GeometryTracker> {
    fn origin(&self) -> [f64; 3] {
        self.geometry.origin()
    }

    fn size(&self) -> [f64; 3] {
        self.geometry.size()
    }
}
