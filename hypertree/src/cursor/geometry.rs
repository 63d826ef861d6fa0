use crate::common::{Bounds, INLINE_DEPTH};
use crate::cursor::SubdivisionTable;
use crate::grid::ActiveAxes;
use smallvec::SmallVec;

/// Optional per-cursor state updated on every move.
///
/// Implemented by [`NoGeometry`] for topology-only cursors and by
/// [`GeometryTracker`] for cursors that know the extent of their cell.
pub trait CursorGeometry: Clone {
    fn descend(&mut self, table: &SubdivisionTable, child: usize);
    fn ascend(&mut self);
    fn reset(&mut self);
}

/// Geometry add-on that tracks nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoGeometry;

impl CursorGeometry for NoGeometry {
    #[inline]
    fn descend(&mut self, _table: &SubdivisionTable, _child: usize) {}

    #[inline]
    fn ascend(&mut self) {}

    #[inline]
    fn reset(&mut self) {}
}

/// Tracks the origin and size of the cell under a cursor.
///
/// Origins are kept on a stack, one per level. The size at level `l` is the
/// root size divided by `branch_factor^l` along every active axis; inactive
/// axes keep the root extent.
#[derive(Clone, Debug)]
pub struct GeometryTracker {
    root_size: [f64; 3],
    axes: ActiveAxes,
    branch_factor: f64,
    origins: SmallVec<[[f64; 3]; INLINE_DEPTH]>,
    size: [f64; 3],
}

impl GeometryTracker {
    pub fn new(origin: [f64; 3], size: [f64; 3], axes: ActiveAxes, branch_factor: usize) -> Self {
        let mut origins = SmallVec::new();
        origins.push(origin);
        GeometryTracker {
            root_size: size,
            axes,
            branch_factor: branch_factor as f64,
            origins,
            size,
        }
    }

    #[inline]
    pub fn origin(&self) -> [f64; 3] {
        self.origins[self.origins.len() - 1]
    }

    #[inline]
    pub fn size(&self) -> [f64; 3] {
        self.size
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_origin_size(self.origin(), self.size)
    }

    pub fn center(&self) -> [f64; 3] {
        let origin = self.origin();
        [
            origin[0] + self.size[0] / 2.0,
            origin[1] + self.size[1] / 2.0,
            origin[2] + self.size[2] / 2.0,
        ]
    }

    /// Product of the sizes along active axes.
    pub fn measure(&self) -> f64 {
        self.axes.as_slice().iter().map(|&a| self.size[a]).product()
    }

    pub fn active_axes(&self) -> ActiveAxes {
        self.axes
    }

    fn level_size(&self, level: usize) -> [f64; 3] {
        let scale = self.branch_factor.powi(level as i32);
        let mut size = self.root_size;
        for &axis in self.axes.as_slice() {
            size[axis] /= scale;
        }
        size
    }
}

impl CursorGeometry for GeometryTracker {
    fn descend(&mut self, table: &SubdivisionTable, child: usize) {
        let coords = table.child_coordinates(child);
        let level = self.origins.len();
        let size = self.level_size(level);
        let mut origin = self.origin();
        for (a, &axis) in self.axes.as_slice().iter().enumerate() {
            origin[axis] += coords[a] as f64 * size[axis];
        }
        self.origins.push(origin);
        self.size = size;
    }

    fn ascend(&mut self) {
        if self.origins.len() > 1 {
            self.origins.pop();
            self.size = self.level_size(self.origins.len() - 1);
        }
    }

    fn reset(&mut self) {
        self.origins.truncate(1);
        self.size = self.root_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::BranchFactor;

    #[test]
    fn test_descend_and_ascend() {
        let axes = ActiveAxes::from_points([3, 3, 1]);
        let table = SubdivisionTable::get(2, BranchFactor::Two);
        let mut tracker = GeometryTracker::new([0.0, 0.0, 5.0], [4.0, 2.0, 0.0], axes, 2);

        tracker.descend(table, 3);
        assert_eq!(tracker.origin(), [2.0, 1.0, 5.0]);
        assert_eq!(tracker.size(), [2.0, 1.0, 0.0]);
        assert_eq!(tracker.measure(), 2.0);

        tracker.descend(table, 1);
        assert_eq!(tracker.origin(), [3.0, 1.0, 5.0]);
        assert_eq!(tracker.size(), [1.0, 0.5, 0.0]);

        tracker.ascend();
        assert_eq!(tracker.origin(), [2.0, 1.0, 5.0]);
        assert_eq!(tracker.size(), [2.0, 1.0, 0.0]);

        tracker.reset();
        assert_eq!(tracker.origin(), [0.0, 0.0, 5.0]);
        assert_eq!(tracker.center(), [2.0, 1.0, 5.0]);
    }

    #[test]
    fn test_branch_factor_three_on_normal_plane() {
        let axes = ActiveAxes::from_points([4, 1, 4]);
        let table = SubdivisionTable::get(2, BranchFactor::Three);
        let mut tracker = GeometryTracker::new([0.0; 3], [3.0, 0.0, 9.0], axes, 3);
        tracker.descend(table, table.child_at([2, 1, 0]));
        assert_eq!(tracker.origin(), [2.0, 0.0, 3.0]);
        assert_eq!(tracker.size(), [1.0, 0.0, 3.0]);
        assert_eq!(tracker.bounds().max, [3.0, 0.0, 6.0]);
    }
}
