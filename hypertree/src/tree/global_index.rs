use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Hands out global cell indices for every tree attached to one grid.
///
/// The allocator only ever moves forward: indices released by a removed tree
/// are never handed out again. Clones share the same counter.
#[derive(Clone, Debug, Default)]
pub struct IndexAllocator {
    next: Arc<AtomicUsize>,
}

impl IndexAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator whose first handed-out index is `next`.
    pub fn starting_at(next: usize) -> Self {
        IndexAllocator {
            next: Arc::new(AtomicUsize::new(next)),
        }
    }

    /// Size of the allocated index space, i.e. the next index to be handed out.
    pub fn next_index(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }

    /// Reserves `count` consecutive indices and returns the first one.
    pub fn allocate(&self, count: usize) -> usize {
        self.next.fetch_add(count, Ordering::SeqCst)
    }

    /// Reserves `count` indices right after `end`, provided nothing was
    /// allocated since `end`.
    pub fn try_extend(&self, end: usize, count: usize) -> bool {
        self.next
            .compare_exchange(end, end + count, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Returns `true` when both handles share the same counter.
    pub fn same_as(&self, other: &IndexAllocator) -> bool {
        Arc::ptr_eq(&self.next, &other.next)
    }
}

/// How a tree maps its local vertex ids to global cell indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GlobalIndexing {
    /// `global = start + local`; the tree owns one contiguous range.
    Contiguous { start: usize },
    /// One explicit global index per local vertex.
    Explicit { table: Vec<usize> },
}

impl GlobalIndexing {
    #[inline]
    pub fn global_index(&self, local: usize) -> usize {
        match self {
            GlobalIndexing::Contiguous { start } => start + local,
            GlobalIndexing::Explicit { table } => table[local],
        }
    }

    pub fn start(&self) -> usize {
        match self {
            GlobalIndexing::Contiguous { start } => *start,
            GlobalIndexing::Explicit { table } => table.first().copied().unwrap_or(0),
        }
    }

    pub fn is_contiguous(&self) -> bool {
        matches!(self, GlobalIndexing::Contiguous { .. })
    }

    /// Registers `count` new local vertices appended after `current_len`
    /// existing ones, switching to an explicit table when the contiguous
    /// range can no longer be extended.
    pub(crate) fn grow(&mut self, allocator: &IndexAllocator, current_len: usize, count: usize) {
        match self {
            GlobalIndexing::Contiguous { start } => {
                let start = *start;
                if allocator.try_extend(start + current_len, count) {
                    return;
                }
                log::debug!(
                    "Global range starting at {} cannot grow in place, switching to explicit indexing",
                    start
                );
                let first = allocator.allocate(count);
                let table = (start..start + current_len)
                    .chain(first..first + count)
                    .collect();
                *self = GlobalIndexing::Explicit { table };
            }
            GlobalIndexing::Explicit { table } => {
                let first = allocator.allocate(count);
                table.extend(first..first + count);
            }
        }
    }
}
