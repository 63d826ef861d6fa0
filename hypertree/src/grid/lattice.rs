//! Root lattice addressing: dimensions, orientation and root index mapping.

/// The axes along which trees refine, in ascending order.
///
/// A 3D grid refines along `[0, 1, 2]`, a 2D grid along the two axes other
/// than its normal and a 1D grid along its single line axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActiveAxes {
    axes: [usize; 3],
    count: usize,
}

impl ActiveAxes {
    pub fn from_points(points: [usize; 3]) -> Self {
        let mut axes = [0; 3];
        let mut count = 0;
        for (axis, &n) in points.iter().enumerate() {
            if n > 1 {
                axes[count] = axis;
                count += 1;
            }
        }
        ActiveAxes { axes, count }
    }

    pub fn all() -> Self {
        ActiveAxes { axes: [0, 1, 2], count: 3 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.axes[..self.count]
    }

    /// Global axis of local axis `local`.
    #[inline]
    pub fn axis(&self, local: usize) -> usize {
        self.axes[local]
    }

    pub fn contains(&self, axis: usize) -> bool {
        self.as_slice().contains(&axis)
    }

    /// Maps an offset expressed along local axes onto the three lattice axes.
    pub fn to_lattice(&self, local: [i64; 3]) -> [i64; 3] {
        let mut shift = [0; 3];
        for (a, &axis) in self.as_slice().iter().enumerate() {
            shift[axis] = local[a];
        }
        shift
    }
}

/// Shape of the root lattice and the root index mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootLattice {
    dimensions: [usize; 3],
    cell_dims: [usize; 3],
    dimension: usize,
    orientation: usize,
    axes: ActiveAxes,
    transposed: bool,
}

impl Default for RootLattice {
    fn default() -> Self {
        RootLattice::new([1, 1, 1], false)
    }
}

impl RootLattice {
    /// Builds a lattice from point counts per axis.
    pub fn new(dimensions: [usize; 3], transposed: bool) -> Self {
        let degenerate = dimensions.contains(&0);
        if degenerate {
            log::warn!("Degenerate grid dimensions {:?}, grid has no cells", dimensions);
        }

        let cell_dims = dimensions.map(|n| n.saturating_sub(1).max(1));
        let axes = if degenerate {
            ActiveAxes::default()
        } else {
            ActiveAxes::from_points(dimensions)
        };
        let orientation = match axes.len() {
            1 => axes.axis(0),
            2 => (0..3).find(|&a| !axes.contains(a)).unwrap_or(2),
            _ => 0,
        };

        RootLattice {
            dimensions,
            cell_dims,
            dimension: axes.len(),
            orientation,
            axes,
            transposed,
        }
    }

    /// Point counts per axis.
    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    /// Root cell counts per axis.
    pub fn cell_dims(&self) -> [usize; 3] {
        self.cell_dims
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Normal axis of a 2D grid, line axis of a 1D grid, `0` otherwise.
    pub fn orientation(&self) -> usize {
        self.orientation
    }

    pub fn active_axes(&self) -> ActiveAxes {
        self.axes
    }

    pub fn transposed_root_indexing(&self) -> bool {
        self.transposed
    }

    pub(crate) fn set_transposed_root_indexing(&mut self, transposed: bool) {
        self.transposed = transposed;
    }

    pub fn is_degenerate(&self) -> bool {
        self.dimension == 0
    }

    pub fn number_of_roots(&self) -> usize {
        if self.is_degenerate() {
            0
        } else {
            self.cell_dims.iter().product()
        }
    }

    /// Flat root index of lattice coordinates `(i, j, k)`.
    pub fn index_from_coordinates(&self, i: usize, j: usize, k: usize) -> usize {
        let [cd0, cd1, cd2] = self.cell_dims;
        if self.transposed {
            k + (j + i * cd1) * cd2
        } else {
            i + (j + k * cd1) * cd0
        }
    }

    /// Lattice coordinates of flat root index `index`.
    pub fn coordinates_from_index(&self, index: usize) -> [usize; 3] {
        let [cd0, cd1, cd2] = self.cell_dims;
        if self.transposed {
            let k = index % cd2;
            let rest = index / cd2;
            [rest / cd1, rest % cd1, k]
        } else {
            let i = index % cd0;
            let rest = index / cd0;
            [i, rest % cd1, rest / cd1]
        }
    }

    pub fn contains_coordinates(&self, coordinates: [i64; 3]) -> bool {
        (0..3).all(|a| coordinates[a] >= 0 && (coordinates[a] as usize) < self.cell_dims[a])
    }

    /// Root index shifted by `shift` lattice steps, `None` outside the lattice.
    pub fn shifted_index(&self, index: usize, shift: [i64; 3]) -> Option<usize> {
        if index >= self.number_of_roots() {
            return None;
        }
        let origin = self.coordinates_from_index(index);
        let target = [
            origin[0] as i64 + shift[0],
            origin[1] as i64 + shift[1],
            origin[2] as i64 + shift[2],
        ];
        if !self.contains_coordinates(target) {
            return None;
        }
        Some(self.index_from_coordinates(target[0] as usize, target[1] as usize, target[2] as usize))
    }
}

/// Binary search over a non-decreasing coordinate array.
///
/// Returns the index of the cell `[coords[i], coords[i + 1]]` containing
/// `value`, or `None` when `value` lies outside `[first - tol, last + tol]`.
/// A single-point array answers `Some(0)` within tolerance of its point.
pub fn find_dichotomic(coords: &[f64], value: f64, tolerance: f64) -> Option<usize> {
    let (first, last) = match (coords.first(), coords.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return None,
    };
    if value < first - tolerance || value > last + tolerance {
        return None;
    }
    if coords.len() < 2 {
        return Some(0);
    }

    // largest i with coords[i] <= value
    let mut low = 0usize;
    let mut high = coords.len() - 1;
    while high - low > 1 {
        let mid = (low + high) / 2;
        if coords[mid] <= value {
            low = mid;
        } else {
            high = mid;
        }
    }
    if value >= coords[high] {
        low = high;
    }
    Some(low.min(coords.len() - 2))
}
