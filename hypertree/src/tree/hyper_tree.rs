use crate::common::{LEAF, MAX_DIMENSION};
use crate::errors::{ErrorKind, HyperTreeError, HyperTreeResult};
use crate::tree::{GlobalIndexing, IndexAllocator};
use std::fmt::{Display, Formatter};

/// Number of children a refined vertex produces along each active axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BranchFactor {
    #[default]
    Two,
    Three,
}

impl BranchFactor {
    #[inline]
    pub fn value(self) -> usize {
        match self {
            BranchFactor::Two => 2,
            BranchFactor::Three => 3,
        }
    }

    /// `value^dimension`, the number of children of a refined vertex.
    pub fn number_of_children(self, dimension: usize) -> usize {
        self.value().pow(dimension as u32)
    }
}

impl TryFrom<usize> for BranchFactor {
    type Error = HyperTreeError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(BranchFactor::Two),
            3 => Ok(BranchFactor::Three),
            _ => {
                log::error!("Unsupported branch factor {}", value);
                Err(HyperTreeError::new(
                    &format!("Unsupported branch factor {}, expected 2 or 3", value),
                    ErrorKind::InvalidArgument,
                ))
            }
        }
    }
}

impl Display for BranchFactor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// One adaptive tree rooted at a single cell of the root lattice.
///
/// Vertices live in one arena indexed by local id. Local id `0` is the
/// root; refining a vertex appends its `branch_factor^dimension` children as
/// one contiguous block and records the block start as the vertex's elder
/// child. There are no parent links: cursors keep their own ancestor stack.
///
/// Every local id maps to a global cell index through [`GlobalIndexing`].
/// Trees materialized by a grid share that grid's [`IndexAllocator`].
#[derive(Clone, Debug)]
pub struct HyperTree {
    tree_index: usize,
    branch_factor: BranchFactor,
    dimension: usize,
    number_of_children: usize,
    elder_child: Vec<u32>,
    number_of_levels: usize,
    number_of_leaves: usize,
    indexing: GlobalIndexing,
    allocator: IndexAllocator,
}

impl HyperTree {
    /// Creates a standalone single-leaf tree with its own index space starting at `0`.
    pub fn new(branch_factor: BranchFactor, dimension: usize) -> HyperTreeResult<Self> {
        Self::with_allocator(0, branch_factor, dimension, IndexAllocator::new())
    }

    /// Creates a single-leaf tree whose root takes the next index of `allocator`.
    pub fn with_allocator(
        tree_index: usize,
        branch_factor: BranchFactor,
        dimension: usize,
        allocator: IndexAllocator,
    ) -> HyperTreeResult<Self> {
        if dimension == 0 || dimension > MAX_DIMENSION {
            log::error!("Invalid tree dimension {}", dimension);
            return Err(HyperTreeError::new(
                &format!("Tree dimension must be between 1 and 3, got {}", dimension),
                ErrorKind::InvalidArgument,
            ));
        }

        let start = allocator.allocate(1);
        Ok(HyperTree {
            tree_index,
            branch_factor,
            dimension,
            number_of_children: branch_factor.number_of_children(dimension),
            elder_child: vec![LEAF],
            number_of_levels: 1,
            number_of_leaves: 1,
            indexing: GlobalIndexing::Contiguous { start },
            allocator,
        })
    }

    pub fn tree_index(&self) -> usize {
        self.tree_index
    }

    pub fn branch_factor(&self) -> BranchFactor {
        self.branch_factor
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn number_of_children(&self) -> usize {
        self.number_of_children
    }

    pub fn number_of_vertices(&self) -> usize {
        self.elder_child.len()
    }

    pub fn number_of_leaves(&self) -> usize {
        self.number_of_leaves
    }

    pub fn number_of_refined_vertices(&self) -> usize {
        self.number_of_vertices() - self.number_of_leaves
    }

    /// Depth of the deepest vertex plus one; a lone root has one level.
    pub fn number_of_levels(&self) -> usize {
        self.number_of_levels
    }

    #[inline]
    pub fn is_leaf(&self, vertex: usize) -> bool {
        self.elder_child[vertex] == LEAF
    }

    /// Local id of the first child of `vertex`, or `None` for a leaf.
    #[inline]
    pub fn elder_child(&self, vertex: usize) -> Option<usize> {
        match self.elder_child[vertex] {
            LEAF => None,
            child => Some(child as usize),
        }
    }

    /// Local id of child `child` of the refined vertex `vertex`.
    ///
    /// # Panics
    ///
    /// Panics when `vertex` is a leaf or `child` is not a valid child slot.
    #[inline]
    pub fn child(&self, vertex: usize, child: usize) -> usize {
        assert!(child < self.number_of_children, "child slot {} out of range", child);
        match self.elder_child(vertex) {
            Some(first) => first + child,
            None => panic!("vertex {} of tree {} is a leaf", vertex, self.tree_index),
        }
    }

    #[inline]
    pub fn global_index(&self, vertex: usize) -> usize {
        self.indexing.global_index(vertex)
    }

    pub fn global_index_start(&self) -> usize {
        self.indexing.start()
    }

    pub fn global_indexing(&self) -> &GlobalIndexing {
        &self.indexing
    }

    /// Global indices of all vertices in local id order.
    pub fn global_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.number_of_vertices()).map(move |v| self.indexing.global_index(v))
    }

    /// Refines the leaf `vertex`, which sits at depth `level`, appending its children.
    pub(crate) fn subdivide_vertex(&mut self, vertex: usize, level: usize) -> HyperTreeResult<()> {
        if vertex >= self.elder_child.len() {
            log::error!("Vertex {} does not exist in tree {}", vertex, self.tree_index);
            return Err(HyperTreeError::new(
                &format!("Vertex {} does not exist in tree {}", vertex, self.tree_index),
                ErrorKind::IndexOutOfBounds,
            ));
        }
        if !self.is_leaf(vertex) {
            log::error!("Vertex {} of tree {} is already refined", vertex, self.tree_index);
            return Err(HyperTreeError::new(
                &format!("Vertex {} of tree {} is already refined", vertex, self.tree_index),
                ErrorKind::InvalidOperation,
            ));
        }

        let first = self.elder_child.len();
        if first + self.number_of_children >= LEAF as usize {
            log::error!("Tree {} cannot hold more vertices", self.tree_index);
            return Err(HyperTreeError::new(
                &format!("Tree {} cannot hold more vertices", self.tree_index),
                ErrorKind::InvalidOperation,
            ));
        }

        self.indexing.grow(&self.allocator, first, self.number_of_children);
        self.elder_child[vertex] = first as u32;
        self.elder_child.resize(first + self.number_of_children, LEAF);
        self.number_of_leaves += self.number_of_children - 1;
        self.number_of_levels = self.number_of_levels.max(level + 2);
        Ok(())
    }

    pub(crate) fn set_tree_index(&mut self, tree_index: usize) {
        self.tree_index = tree_index;
    }

    /// Moves the tree into `allocator`'s index space as one fresh contiguous range.
    pub(crate) fn attach(&mut self, allocator: &IndexAllocator) {
        let start = allocator.allocate(self.number_of_vertices());
        self.indexing = GlobalIndexing::Contiguous { start };
        self.allocator = allocator.clone();
    }

    /// Points the tree at another allocator without touching its indices.
    pub(crate) fn share_allocator(&mut self, allocator: &IndexAllocator) {
        self.allocator = allocator.clone();
    }

    /// Returns `true` when both trees have the same refinement pattern.
    pub fn same_shape(&self, other: &HyperTree) -> bool {
        if self.number_of_children != other.number_of_children
            || self.number_of_vertices() != other.number_of_vertices()
        {
            return false;
        }
        let mut pending = vec![(0usize, 0usize)];
        while let Some((a, b)) = pending.pop() {
            match (self.elder_child(a), other.elder_child(b)) {
                (None, None) => {}
                (Some(ca), Some(cb)) => {
                    pending.extend((0..self.number_of_children).map(|c| (ca + c, cb + c)));
                }
                _ => return false,
            }
        }
        true
    }
}
