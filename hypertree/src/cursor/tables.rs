//! Fixed child-slot and adjacency tables keyed by `(dimension, branch factor)`.

use crate::tree::BranchFactor;
use once_cell::sync::Lazy;

/// Lookup tables describing how a refined vertex splits and how its
/// children see their neighbors.
///
/// Child slots are numbered `sum(c[a] * f^a)` over local axes `a` with
/// `c[a] in 0..f`. Stencil slots are numbered `sum((o[a] + 1) * 3^a)` with
/// offsets `o[a] in -1..=1`, so the center of the stencil is slot
/// `(3^D - 1) / 2`.
#[derive(Debug)]
pub struct SubdivisionTable {
    dimension: usize,
    branch_factor: usize,
    number_of_children: usize,
    stencil_size: usize,
    child_coordinates: Vec<[usize; 3]>,
    stencil_offsets: Vec<[i64; 3]>,
    von_neumann_slots: Vec<usize>,
    moore_slots: Vec<usize>,
    // (parent stencil slot, child slot in that neighbor) per (child, stencil slot)
    adjacency: Vec<(u8, u8)>,
}

static TABLES: Lazy<[SubdivisionTable; 6]> = Lazy::new(|| {
    [
        SubdivisionTable::build(1, 2),
        SubdivisionTable::build(2, 2),
        SubdivisionTable::build(3, 2),
        SubdivisionTable::build(1, 3),
        SubdivisionTable::build(2, 3),
        SubdivisionTable::build(3, 3),
    ]
});

impl SubdivisionTable {
    /// Shared table for `dimension` in `1..=3`.
    ///
    /// # Panics
    ///
    /// Panics when `dimension` is not in `1..=3`.
    pub fn get(dimension: usize, branch_factor: BranchFactor) -> &'static SubdivisionTable {
        assert!((1..=3).contains(&dimension), "invalid dimension {}", dimension);
        let offset = match branch_factor {
            BranchFactor::Two => 0,
            BranchFactor::Three => 3,
        };
        &TABLES[offset + dimension - 1]
    }

    fn build(dimension: usize, branch_factor: usize) -> Self {
        let number_of_children = branch_factor.pow(dimension as u32);
        let stencil_size = 3usize.pow(dimension as u32);

        let child_coordinates: Vec<[usize; 3]> = (0..number_of_children)
            .map(|child| {
                let mut coords = [0; 3];
                let mut rest = child;
                for c in coords.iter_mut().take(dimension) {
                    *c = rest % branch_factor;
                    rest /= branch_factor;
                }
                coords
            })
            .collect();

        let stencil_offsets: Vec<[i64; 3]> = (0..stencil_size)
            .map(|slot| {
                let mut offset = [0; 3];
                let mut rest = slot;
                for o in offset.iter_mut().take(dimension) {
                    *o = (rest % 3) as i64 - 1;
                    rest /= 3;
                }
                offset
            })
            .collect();

        let moore_slots: Vec<usize> = (0..stencil_size).collect();
        let von_neumann_slots: Vec<usize> = (0..stencil_size)
            .filter(|&slot| stencil_offsets[slot].iter().filter(|&&o| o != 0).count() <= 1)
            .collect();

        let f = branch_factor as i64;
        let mut adjacency = Vec::with_capacity(number_of_children * stencil_size);
        for coords in &child_coordinates {
            for offset in &stencil_offsets {
                let mut parent_slot = 0usize;
                let mut neighbor_child = 0usize;
                let mut stride_parent = 1usize;
                let mut stride_child = 1usize;
                for a in 0..dimension {
                    let n = coords[a] as i64 + offset[a];
                    let p = n.div_euclid(f);
                    let ichild = n - p * f;
                    parent_slot += (p + 1) as usize * stride_parent;
                    neighbor_child += ichild as usize * stride_child;
                    stride_parent *= 3;
                    stride_child *= branch_factor;
                }
                adjacency.push((parent_slot as u8, neighbor_child as u8));
            }
        }

        SubdivisionTable {
            dimension,
            branch_factor,
            number_of_children,
            stencil_size,
            child_coordinates,
            stencil_offsets,
            von_neumann_slots,
            moore_slots,
            adjacency,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn branch_factor(&self) -> usize {
        self.branch_factor
    }

    pub fn number_of_children(&self) -> usize {
        self.number_of_children
    }

    /// `3^dimension`.
    pub fn stencil_size(&self) -> usize {
        self.stencil_size
    }

    pub fn center_slot(&self) -> usize {
        (self.stencil_size - 1) / 2
    }

    /// Position of `child` inside its parent along each local axis.
    #[inline]
    pub fn child_coordinates(&self, child: usize) -> [usize; 3] {
        self.child_coordinates[child]
    }

    /// Child slot at local position `coords`.
    pub fn child_at(&self, coords: [usize; 3]) -> usize {
        let mut child = 0;
        let mut stride = 1;
        for &c in coords.iter().take(self.dimension) {
            child += c * stride;
            stride *= self.branch_factor;
        }
        child
    }

    /// Offset of stencil slot `slot` along each local axis.
    #[inline]
    pub fn stencil_offset(&self, slot: usize) -> [i64; 3] {
        self.stencil_offsets[slot]
    }

    /// Stencil slot with offset `offset` along local axes.
    pub fn slot_of(&self, offset: [i64; 3]) -> usize {
        let mut slot = 0;
        let mut stride = 1;
        for &o in offset.iter().take(self.dimension) {
            slot += (o + 1) as usize * stride;
            stride *= 3;
        }
        slot
    }

    /// Center plus the `2 * dimension` face neighbors.
    pub fn von_neumann_slots(&self) -> &[usize] {
        &self.von_neumann_slots
    }

    /// All `3^dimension` slots.
    pub fn moore_slots(&self) -> &[usize] {
        &self.moore_slots
    }

    /// For child `child` of a vertex, the stencil slot of the parent-level
    /// neighbor containing its neighbor at `slot`, and the child slot of that
    /// neighbor inside it.
    #[inline]
    pub fn adjacency(&self, child: usize, slot: usize) -> (usize, usize) {
        let (parent_slot, neighbor_child) = self.adjacency[child * self.stencil_size + slot];
        (parent_slot as usize, neighbor_child as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sizes() {
        let table = SubdivisionTable::get(3, BranchFactor::Three);
        assert_eq!(table.number_of_children(), 27);
        assert_eq!(table.stencil_size(), 27);
        assert_eq!(table.center_slot(), 13);
        assert_eq!(table.von_neumann_slots().len(), 7);
        assert_eq!(table.moore_slots().len(), 27);

        let table = SubdivisionTable::get(2, BranchFactor::Two);
        assert_eq!(table.number_of_children(), 4);
        assert_eq!(table.von_neumann_slots(), &[1, 3, 4, 5, 7]);
    }

    #[test]
    fn test_child_coordinates_round_trip() {
        for dimension in 1..=3 {
            for bf in [BranchFactor::Two, BranchFactor::Three] {
                let table = SubdivisionTable::get(dimension, bf);
                for child in 0..table.number_of_children() {
                    assert_eq!(table.child_at(table.child_coordinates(child)), child);
                }
                for slot in 0..table.stencil_size() {
                    assert_eq!(table.slot_of(table.stencil_offset(slot)), slot);
                }
            }
        }
    }

    #[test]
    fn test_center_maps_to_self() {
        let table = SubdivisionTable::get(2, BranchFactor::Three);
        for child in 0..table.number_of_children() {
            assert_eq!(table.adjacency(child, table.center_slot()), (table.center_slot(), child));
        }
    }

    #[test]
    fn test_adjacency_across_parent_boundary() {
        let table = SubdivisionTable::get(2, BranchFactor::Two);
        // child (0, 1) looking at -x lands in the left parent neighbor, child (1, 1)
        let child = table.child_at([0, 1, 0]);
        let left = table.slot_of([-1, 0, 0]);
        assert_eq!(table.adjacency(child, left), (left, table.child_at([1, 1, 0])));

        // child (1, 1) looking at +x+y lands in the diagonal parent neighbor, child (0, 0)
        let child = table.child_at([1, 1, 0]);
        let diagonal = table.slot_of([1, 1, 0]);
        assert_eq!(table.adjacency(child, diagonal), (diagonal, 0));

        // child (0, 0) looking at +x stays inside the parent
        let right = table.slot_of([1, 0, 0]);
        assert_eq!(table.adjacency(0, right), (table.center_slot(), table.child_at([1, 0, 0])));
    }

    #[test]
    fn test_branch_factor_three_middle_child() {
        let table = SubdivisionTable::get(1, BranchFactor::Three);
        assert_eq!(table.adjacency(1, 0), (1, 0));
        assert_eq!(table.adjacency(1, 2), (1, 2));
        assert_eq!(table.adjacency(0, 0), (0, 2));
        assert_eq!(table.adjacency(2, 2), (2, 0));
    }
}
