use crate::common::{BitArray, Bounds, AXIS_NAMES};
use crate::cursor::{
    AscendingCursor, GeometryCursor, GeometryTracker, HyperTreeCursor, NonOrientedCursor,
    NonOrientedGeometryCursor, Stencil, SuperCursor,
};
use crate::errors::{ErrorKind, HyperTreeError, HyperTreeResult};
use crate::grid::{find_dichotomic, ActiveAxes, CellData, DataArray, GhostFlags, RootLattice};
use crate::tree::{BranchFactor, HyperTree, IndexAllocator};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

#[derive(Clone, Debug, Default)]
struct DerivedCache {
    pure_mask: Option<BitArray>,
    bounds: Option<Bounds>,
    tree_ghosts: Option<BitArray>,
}

/// Where a point landed in a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    pub tree_index: usize,
    pub vertex: usize,
    pub level: usize,
    pub global_index: usize,
}

/// A rectilinear lattice of independent, adaptively refined trees.
///
/// Roots are addressed by a flat root index (see [`RootLattice`]). Trees are
/// stored sparsely: most roots may have none. All trees share one global
/// cell index space handed out by an [`IndexAllocator`], which also
/// addresses the grid-wide [`CellData`] and the optional mask.
///
/// Derived state (pure mask, bounds, tree ghost array) is cached behind a
/// lock so that read accessors stay `&self`; mutating accessors invalidate
/// the parts they affect.
///
/// # Examples
///
/// ```rust
/// use hypertree::cursor::HyperTreeCursor;
/// use hypertree::grid::HyperTreeGrid;
///
/// let mut grid = HyperTreeGrid::builder()
///     .dimensions([3, 4, 1])
///     .branch_factor(2)
///     .build()
///     .unwrap();
/// assert_eq!(grid.dimension(), 2);
/// assert_eq!(grid.number_of_roots(), 6);
///
/// let mut cursor = grid.cursor_mut(4, true).unwrap();
/// cursor.subdivide_leaf().unwrap();
/// assert_eq!(grid.number_of_leaves(), 4);
/// ```
pub struct HyperTreeGrid {
    lattice: RootLattice,
    branch_factor: BranchFactor,
    coordinates: [Vec<f64>; 3],
    trees: BTreeMap<usize, HyperTree>,
    allocator: IndexAllocator,
    cell_data: CellData,
    mask: Option<BitArray>,
    interface_normals_name: Option<String>,
    interface_intercepts_name: Option<String>,
    cache: RwLock<DerivedCache>,
}

impl Default for HyperTreeGrid {
    fn default() -> Self {
        HyperTreeGrid::new([1, 1, 1], BranchFactor::Two, false)
    }
}

impl HyperTreeGrid {
    pub fn new(dimensions: [usize; 3], branch_factor: BranchFactor, transposed: bool) -> Self {
        let lattice = RootLattice::new(dimensions, transposed);
        HyperTreeGrid {
            lattice,
            branch_factor,
            coordinates: unit_coordinates(dimensions),
            trees: BTreeMap::new(),
            allocator: IndexAllocator::new(),
            cell_data: CellData::new(),
            mask: None,
            interface_normals_name: None,
            interface_intercepts_name: None,
            cache: RwLock::new(DerivedCache::default()),
        }
    }

    pub fn builder() -> HyperTreeGridBuilder {
        HyperTreeGridBuilder::default()
    }

    /// Drops every tree, cell array and the mask, keeping the lattice.
    pub fn initialize(&mut self) {
        self.trees.clear();
        self.allocator = IndexAllocator::new();
        self.cell_data.clear();
        self.mask = None;
        self.invalidate_all();
    }

    // ==================== Lattice ====================

    /// Sets the point counts per axis and resets the grid.
    ///
    /// Coordinates fall back to unit spacing. A zero dimension yields an
    /// empty grid rather than an error.
    pub fn set_dimensions(&mut self, dimensions: [usize; 3]) {
        self.lattice = RootLattice::new(dimensions, self.lattice.transposed_root_indexing());
        self.coordinates = unit_coordinates(dimensions);
        self.initialize();
    }

    pub fn lattice(&self) -> &RootLattice {
        &self.lattice
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.lattice.dimensions()
    }

    pub fn cell_dims(&self) -> [usize; 3] {
        self.lattice.cell_dims()
    }

    pub fn dimension(&self) -> usize {
        self.lattice.dimension()
    }

    pub fn orientation(&self) -> usize {
        self.lattice.orientation()
    }

    pub fn active_axes(&self) -> ActiveAxes {
        self.lattice.active_axes()
    }

    pub fn branch_factor(&self) -> BranchFactor {
        self.branch_factor
    }

    /// Children per refined vertex, `branch_factor^dimension`.
    pub fn number_of_children(&self) -> usize {
        self.branch_factor.number_of_children(self.dimension())
    }

    pub fn set_branch_factor(&mut self, branch_factor: BranchFactor) -> HyperTreeResult<()> {
        self.ensure_no_trees("branch factor")?;
        self.branch_factor = branch_factor;
        Ok(())
    }

    pub fn transposed_root_indexing(&self) -> bool {
        self.lattice.transposed_root_indexing()
    }

    pub fn set_transposed_root_indexing(&mut self, transposed: bool) -> HyperTreeResult<()> {
        self.ensure_no_trees("root indexing")?;
        self.lattice.set_transposed_root_indexing(transposed);
        Ok(())
    }

    fn ensure_no_trees(&self, what: &str) -> HyperTreeResult<()> {
        if !self.trees.is_empty() {
            log::error!("Cannot change the {} of a grid that already has trees", what);
            return Err(HyperTreeError::new(
                &format!("Cannot change the {} of a grid that already has trees", what),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    pub fn number_of_roots(&self) -> usize {
        self.lattice.number_of_roots()
    }

    pub fn index_from_level_zero_coordinates(&self, i: usize, j: usize, k: usize) -> usize {
        self.lattice.index_from_coordinates(i, j, k)
    }

    pub fn level_zero_coordinates_from_index(&self, index: usize) -> [usize; 3] {
        self.lattice.coordinates_from_index(index)
    }

    /// Root `shift` lattice steps away from `index`, `None` outside the lattice.
    pub fn shifted_level_zero_index(&self, index: usize, shift: [i64; 3]) -> Option<usize> {
        self.lattice.shifted_index(index, shift)
    }

    // ==================== Coordinates ====================

    pub fn coordinates(&self, axis: usize) -> &[f64] {
        &self.coordinates[axis]
    }

    pub fn x_coordinates(&self) -> &[f64] {
        &self.coordinates[0]
    }

    pub fn y_coordinates(&self) -> &[f64] {
        &self.coordinates[1]
    }

    pub fn z_coordinates(&self) -> &[f64] {
        &self.coordinates[2]
    }

    /// Replaces the coordinates of `axis`; they must hold one value per point, non-decreasing.
    pub fn set_coordinates(&mut self, axis: usize, values: Vec<f64>) -> HyperTreeResult<()> {
        if axis > 2 {
            log::error!("Invalid axis {}", axis);
            return Err(HyperTreeError::new(
                &format!("Invalid axis {}", axis),
                ErrorKind::InvalidArgument,
            ));
        }
        let expected = self.dimensions()[axis];
        if values.len() != expected {
            log::error!(
                "{}Coordinates has {} values, expected {}",
                AXIS_NAMES[axis],
                values.len(),
                expected
            );
            return Err(HyperTreeError::new(
                &format!(
                    "{}Coordinates has {} values, expected {}",
                    AXIS_NAMES[axis],
                    values.len(),
                    expected
                ),
                ErrorKind::ValidationError,
            ));
        }
        if values.windows(2).any(|w| w[0] > w[1]) {
            log::error!("{}Coordinates is not non-decreasing", AXIS_NAMES[axis]);
            return Err(HyperTreeError::new(
                &format!("{}Coordinates is not non-decreasing", AXIS_NAMES[axis]),
                ErrorKind::ValidationError,
            ));
        }
        self.coordinates[axis] = values;
        self.invalidate_all();
        Ok(())
    }

    pub fn find_dichotomic(&self, axis: usize, value: f64, tolerance: f64) -> Option<usize> {
        find_dichotomic(&self.coordinates[axis], value, tolerance)
    }

    pub fn find_dichotomic_x(&self, value: f64, tolerance: f64) -> Option<usize> {
        self.find_dichotomic(0, value, tolerance)
    }

    pub fn find_dichotomic_y(&self, value: f64, tolerance: f64) -> Option<usize> {
        self.find_dichotomic(1, value, tolerance)
    }

    pub fn find_dichotomic_z(&self, value: f64, tolerance: f64) -> Option<usize> {
        self.find_dichotomic(2, value, tolerance)
    }

    /// Origin and size of root cell `index`.
    pub fn level_zero_origin_and_size(&self, index: usize) -> HyperTreeResult<([f64; 3], [f64; 3])> {
        if index >= self.number_of_roots() {
            log::error!("Root index {} out of range", index);
            return Err(HyperTreeError::new(
                &format!("Root index {} out of range ({} roots)", index, self.number_of_roots()),
                ErrorKind::IndexOutOfBounds,
            ));
        }
        let ijk = self.level_zero_coordinates_from_index(index);
        let mut origin = [0.0; 3];
        let mut size = [0.0; 3];
        for axis in 0..3 {
            let coords = &self.coordinates[axis];
            let low = coords.get(ijk[axis]).copied().unwrap_or(0.0);
            let high = coords.get(ijk[axis] + 1).copied().unwrap_or(low);
            origin[axis] = low;
            size[axis] = high - low;
        }
        Ok((origin, size))
    }

    /// Bounds of the whole root lattice, masked or not.
    pub fn grid_bounds(&self) -> Bounds {
        let mut bounds = Bounds::empty();
        if self.number_of_roots() == 0 {
            return bounds;
        }
        for axis in 0..3 {
            if let (Some(&first), Some(&last)) = (self.coordinates[axis].first(), self.coordinates[axis].last()) {
                bounds.min[axis] = first;
                bounds.max[axis] = last;
            }
        }
        bounds
    }

    // ==================== Trees ====================

    pub fn tree(&self, index: usize) -> Option<&HyperTree> {
        self.trees.get(&index)
    }

    /// Mutable access to tree `index`, materializing a single-leaf tree when
    /// `create` is set.
    pub fn tree_mut(&mut self, index: usize, create: bool) -> HyperTreeResult<Option<&mut HyperTree>> {
        self.check_root_index(index)?;
        self.invalidate_all();
        if create && !self.trees.contains_key(&index) {
            let tree = HyperTree::with_allocator(index, self.branch_factor, self.dimension(), self.allocator.clone())?;
            log::debug!("Materialized tree {} at global index {}", index, tree.global_index_start());
            self.trees.insert(index, tree);
        }
        Ok(self.trees.get_mut(&index))
    }

    /// Places `tree` at root `index`, moving it into this grid's index space.
    ///
    /// Returns the tree previously stored there. Its indices are not reused.
    pub fn set_tree(&mut self, index: usize, mut tree: HyperTree) -> HyperTreeResult<Option<HyperTree>> {
        self.check_root_index(index)?;
        if tree.branch_factor() != self.branch_factor || tree.dimension() != self.dimension() {
            log::error!(
                "Tree with branch factor {} and dimension {} does not fit grid with branch factor {} and dimension {}",
                tree.branch_factor(),
                tree.dimension(),
                self.branch_factor,
                self.dimension()
            );
            return Err(HyperTreeError::new(
                &format!("Tree does not fit the grid at root {}", index),
                ErrorKind::InvalidArgument,
            ));
        }
        tree.set_tree_index(index);
        tree.attach(&self.allocator);
        self.invalidate_all();
        Ok(self.trees.insert(index, tree))
    }

    /// Removes tree `index`; its global indices stay unused.
    pub fn remove_tree(&mut self, index: usize) -> Option<HyperTree> {
        let removed = self.trees.remove(&index);
        if removed.is_some() {
            self.invalidate_all();
        }
        removed
    }

    /// Non-empty trees in root index order.
    pub fn trees(&self) -> impl Iterator<Item = (usize, &HyperTree)> {
        self.trees.iter().map(|(&index, tree)| (index, tree))
    }

    pub fn tree_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.trees.keys().copied()
    }

    pub fn number_of_non_empty_trees(&self) -> usize {
        self.trees.len()
    }

    fn check_root_index(&self, index: usize) -> HyperTreeResult<()> {
        if index >= self.number_of_roots() {
            log::error!("Root index {} out of range", index);
            return Err(HyperTreeError::new(
                &format!("Root index {} out of range ({} roots)", index, self.number_of_roots()),
                ErrorKind::IndexOutOfBounds,
            ));
        }
        Ok(())
    }

    // ==================== Cursors ====================

    pub fn cursor(&self, index: usize) -> Option<NonOrientedCursor<&HyperTree>> {
        self.tree(index).map(NonOrientedCursor::new)
    }

    pub fn cursor_mut(&mut self, index: usize, create: bool) -> HyperTreeResult<NonOrientedCursor<&mut HyperTree>> {
        match self.tree_mut(index, create)? {
            Some(tree) => Ok(NonOrientedCursor::new(tree)),
            None => Err(missing_tree(index)),
        }
    }

    pub fn geometry_cursor(&self, index: usize) -> HyperTreeResult<NonOrientedGeometryCursor<&HyperTree>> {
        let tree = self.tree(index).ok_or_else(|| missing_tree(index))?;
        let (origin, size) = self.level_zero_origin_and_size(index)?;
        let tracker = GeometryTracker::new(origin, size, self.active_axes(), self.branch_factor.value());
        Ok(NonOrientedCursor::with_geometry(tree, tracker))
    }

    pub fn super_cursor(&self, index: usize, stencil: Stencil) -> HyperTreeResult<SuperCursor<'_>> {
        SuperCursor::new(self, index, stencil)
    }

    // ==================== Counts ====================

    /// Size of the global cell index space, gaps from removed trees included.
    pub fn number_of_cells(&self) -> usize {
        self.allocator.next_index()
    }

    pub fn number_of_vertices(&self) -> usize {
        self.trees.values().map(|t| t.number_of_vertices()).sum()
    }

    pub fn number_of_leaves(&self) -> usize {
        self.trees.values().map(|t| t.number_of_leaves()).sum()
    }

    pub fn number_of_levels(&self) -> usize {
        self.trees.values().map(|t| t.number_of_levels()).max().unwrap_or(0)
    }

    // ==================== Cell data, mask, interface ====================

    pub fn cell_data(&self) -> &CellData {
        &self.cell_data
    }

    pub fn cell_data_mut(&mut self) -> &mut CellData {
        self.invalidate_all();
        &mut self.cell_data
    }

    pub fn add_cell_array(&mut self, array: DataArray) -> Option<DataArray> {
        self.cell_data_mut().add_array(array)
    }

    pub fn remove_cell_array(&mut self, name: &str) -> Option<DataArray> {
        self.cell_data_mut().remove(name)
    }

    pub fn mask(&self) -> Option<&BitArray> {
        self.mask.as_ref()
    }

    pub fn has_mask(&self) -> bool {
        self.mask.is_some()
    }

    pub fn set_mask(&mut self, mask: Option<BitArray>) {
        self.mask = mask;
        self.invalidate_mask();
    }

    /// Masks or unmasks one cell, creating the mask when needed.
    pub fn set_masked(&mut self, global: usize, masked: bool) {
        let cells = self.number_of_cells();
        let mask = self.mask.get_or_insert_with(|| BitArray::with_len(cells, false));
        mask.set(global, masked);
        self.invalidate_mask();
    }

    #[inline]
    pub fn is_masked(&self, global: usize) -> bool {
        self.mask.as_ref().map(|m| m.get(global)).unwrap_or(false)
    }

    pub fn set_interface_names(&mut self, normals: Option<&str>, intercepts: Option<&str>) {
        self.interface_normals_name = normals.map(str::to_string);
        self.interface_intercepts_name = intercepts.map(str::to_string);
        self.invalidate_mask();
    }

    pub fn interface_normals_name(&self) -> Option<&str> {
        self.interface_normals_name.as_deref()
    }

    pub fn interface_intercepts_name(&self) -> Option<&str> {
        self.interface_intercepts_name.as_deref()
    }

    /// Interface mode needs both array names.
    pub fn has_interface(&self) -> bool {
        self.interface_normals_name.is_some() && self.interface_intercepts_name.is_some()
    }

    // ==================== Derived state ====================

    fn invalidate_all(&self) {
        let mut cache = self.cache.write();
        *cache = DerivedCache::default();
    }

    fn invalidate_mask(&self) {
        let mut cache = self.cache.write();
        cache.pure_mask = None;
        cache.bounds = None;
    }

    /// Per cell: masked, mixed interface material, or any masked descendant.
    pub fn pure_mask(&self) -> BitArray {
        if let Some(mask) = &self.cache.read().pure_mask {
            return mask.clone();
        }

        let intercepts = if self.has_interface() {
            self.interface_intercepts_name
                .as_deref()
                .and_then(|name| self.cell_data.get(name))
        } else {
            None
        };
        let mut pure = BitArray::with_len(self.number_of_cells(), false);
        for tree in self.trees.values() {
            let mut cursor = NonOrientedCursor::new(tree);
            self.fill_pure_mask(&mut cursor, intercepts, &mut pure);
        }

        self.cache.write().pure_mask = Some(pure.clone());
        pure
    }

    fn fill_pure_mask(
        &self,
        cursor: &mut NonOrientedCursor<&HyperTree>,
        intercepts: Option<&DataArray>,
        pure: &mut BitArray,
    ) -> bool {
        let global = cursor.global_node_index();
        let masked = self.is_masked(global);
        let value = if cursor.is_leaf() {
            let mixed = intercepts
                .and_then(|array| array.value_as_f64(global, 2))
                .map(|kind| kind < 2.0)
                .unwrap_or(false);
            masked || mixed
        } else {
            let mut any = false;
            for child in 0..cursor.number_of_children() {
                cursor.to_child(child);
                any |= self.fill_pure_mask(cursor, intercepts, pure);
                cursor.to_parent();
            }
            masked || any
        };
        pure.set(global, value);
        value
    }

    /// Cached bounds of the unmasked leaves.
    pub fn bounds(&self) -> Bounds {
        if let Some(bounds) = self.cache.read().bounds {
            return bounds;
        }
        self.compute_bounds()
    }

    /// Recomputes the bounds of the unmasked leaves with a full traversal.
    pub fn compute_bounds(&self) -> Bounds {
        let mut bounds = Bounds::empty();
        for &index in self.trees.keys() {
            if let Ok(mut cursor) = self.geometry_cursor(index) {
                self.expand_bounds(&mut cursor, &mut bounds);
            }
        }
        self.cache.write().bounds = Some(bounds);
        bounds
    }

    fn expand_bounds(&self, cursor: &mut NonOrientedGeometryCursor<&HyperTree>, bounds: &mut Bounds) {
        if self.is_masked(cursor.global_node_index()) {
            return;
        }
        if cursor.is_leaf() {
            bounds.expand(&cursor.bounds());
            return;
        }
        for child in 0..cursor.number_of_children() {
            cursor.to_child(child);
            self.expand_bounds(cursor, bounds);
            cursor.to_parent();
        }
    }

    /// One bit per root: set when the root cell of its tree is a duplicate ghost.
    pub fn tree_ghost_array(&self) -> BitArray {
        if let Some(ghosts) = &self.cache.read().tree_ghosts {
            return ghosts.clone();
        }
        let mut ghosts = BitArray::with_len(self.number_of_roots(), false);
        if self.cell_data.ghost_array().is_some() {
            for (&index, tree) in &self.trees {
                let flags = self.cell_data.ghost_flags(tree.global_index(0));
                if flags.contains(GhostFlags::DUPLICATE_CELL) {
                    ghosts.set(index, true);
                }
            }
        }
        self.cache.write().tree_ghosts = Some(ghosts.clone());
        ghosts
    }

    pub fn has_any_ghost_cells(&self) -> bool {
        match self.cell_data.ghost_array() {
            Some(array) => (0..array.number_of_tuples())
                .any(|t| array.value_as_f64(t, 0).map(|v| v != 0.0).unwrap_or(false)),
            None => false,
        }
    }

    /// Range of `component` (or of the tuple norm when `None`) of array `name`,
    /// skipping masked cells and hidden or duplicate ghosts.
    pub fn cell_range(&self, name: &str, component: Option<usize>) -> Option<(f64, f64)> {
        let array = self.cell_data.get(name)?;
        array.range(component, |global| {
            self.is_masked(global) || self.cell_data.ghost_flags(global).intersects(GhostFlags::skipped())
        })
    }

    /// Leaf containing `point`, if any.
    pub fn locate(&self, point: [f64; 3]) -> Option<Location> {
        let axes = self.active_axes();
        let mut ijk = [0usize; 3];
        for &axis in axes.as_slice() {
            ijk[axis] = self.find_dichotomic(axis, point[axis], 0.0)?;
        }
        let index = self.index_from_level_zero_coordinates(ijk[0], ijk[1], ijk[2]);
        let mut cursor = self.geometry_cursor(index).ok()?;
        let f = self.branch_factor.value();
        let table = crate::cursor::SubdivisionTable::get(self.dimension(), self.branch_factor);
        while !cursor.is_leaf() {
            let origin = cursor.origin();
            let size = cursor.size();
            let mut coords = [0usize; 3];
            for (a, &axis) in axes.as_slice().iter().enumerate() {
                let child_size = size[axis] / f as f64;
                let c = if child_size > 0.0 {
                    ((point[axis] - origin[axis]) / child_size).floor()
                } else {
                    0.0
                };
                coords[a] = (c.max(0.0) as usize).min(f - 1);
            }
            cursor.to_child(table.child_at(coords));
        }
        Some(Location {
            tree_index: index,
            vertex: cursor.vertex_id(),
            level: cursor.level(),
            global_index: cursor.global_node_index(),
        })
    }
}

fn missing_tree(index: usize) -> HyperTreeError {
    log::error!("Tree {} does not exist", index);
    HyperTreeError::new(&format!("Tree {} does not exist", index), ErrorKind::NotFound)
}

fn unit_coordinates(dimensions: [usize; 3]) -> [Vec<f64>; 3] {
    dimensions.map(|n| (0..n).map(|i| i as f64).collect())
}

impl Clone for HyperTreeGrid {
    /// Deep copy with its own index allocator.
    fn clone(&self) -> Self {
        let allocator = IndexAllocator::starting_at(self.allocator.next_index());
        let trees = self
            .trees
            .iter()
            .map(|(&index, tree)| {
                let mut tree = tree.clone();
                tree.share_allocator(&allocator);
                (index, tree)
            })
            .collect();
        HyperTreeGrid {
            lattice: self.lattice,
            branch_factor: self.branch_factor,
            coordinates: self.coordinates.clone(),
            trees,
            allocator,
            cell_data: self.cell_data.clone(),
            mask: self.mask.clone(),
            interface_normals_name: self.interface_normals_name.clone(),
            interface_intercepts_name: self.interface_intercepts_name.clone(),
            cache: RwLock::new(self.cache.read().clone()),
        }
    }
}

impl Debug for HyperTreeGrid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTreeGrid")
            .field("dimensions", &self.dimensions())
            .field("branch_factor", &self.branch_factor)
            .field("transposed_root_indexing", &self.transposed_root_indexing())
            .field("trees", &self.trees.len())
            .field("cells", &self.number_of_cells())
            .field("arrays", &self.cell_data.names().collect::<Vec<_>>())
            .field("masked", &self.has_mask())
            .finish()
    }
}

/// Fluent builder for [`HyperTreeGrid`], validated in [`build`](HyperTreeGridBuilder::build).
#[derive(Clone, Debug)]
pub struct HyperTreeGridBuilder {
    dimensions: [usize; 3],
    branch_factor: usize,
    transposed_root_indexing: bool,
    coordinates: [Option<Vec<f64>>; 3],
    interface_normals_name: Option<String>,
    interface_intercepts_name: Option<String>,
}

impl Default for HyperTreeGridBuilder {
    fn default() -> Self {
        HyperTreeGridBuilder {
            dimensions: [1, 1, 1],
            branch_factor: 2,
            transposed_root_indexing: false,
            coordinates: [None, None, None],
            interface_normals_name: None,
            interface_intercepts_name: None,
        }
    }
}

impl HyperTreeGridBuilder {
    /// Point counts per axis.
    pub fn dimensions(mut self, dimensions: [usize; 3]) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn branch_factor(mut self, branch_factor: usize) -> Self {
        self.branch_factor = branch_factor;
        self
    }

    pub fn transposed_root_indexing(mut self, transposed: bool) -> Self {
        self.transposed_root_indexing = transposed;
        self
    }

    pub fn x_coordinates(mut self, values: Vec<f64>) -> Self {
        self.coordinates[0] = Some(values);
        self
    }

    pub fn y_coordinates(mut self, values: Vec<f64>) -> Self {
        self.coordinates[1] = Some(values);
        self
    }

    pub fn z_coordinates(mut self, values: Vec<f64>) -> Self {
        self.coordinates[2] = Some(values);
        self
    }

    pub fn interface(mut self, normals: &str, intercepts: &str) -> Self {
        self.interface_normals_name = Some(normals.to_string());
        self.interface_intercepts_name = Some(intercepts.to_string());
        self
    }

    pub fn build(self) -> HyperTreeResult<HyperTreeGrid> {
        let branch_factor = BranchFactor::try_from(self.branch_factor)?;
        let mut grid = HyperTreeGrid::new(self.dimensions, branch_factor, self.transposed_root_indexing);
        for (axis, values) in self.coordinates.into_iter().enumerate() {
            if let Some(values) = values {
                grid.set_coordinates(axis, values)?;
            }
        }
        grid.interface_normals_name = self.interface_normals_name;
        grid.interface_intercepts_name = self.interface_intercepts_name;
        Ok(grid)
    }
}
