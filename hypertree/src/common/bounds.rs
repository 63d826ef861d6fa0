use std::fmt::{Display, Formatter};

/// An axis-aligned box in 3D space.
///
/// `Bounds` follows the usual "empty is inverted" convention: a freshly
/// created [`Bounds::empty`] has `min = +inf` and `max = -inf`, so expanding it
/// with any point or box yields exactly that point or box.
///
/// # Examples
///
/// ```rust
/// use hypertree::common::Bounds;
///
/// let mut bounds = Bounds::empty();
/// bounds.expand_point([1.0, 2.0, 0.0]);
/// bounds.expand_point([3.0, -1.0, 0.0]);
/// assert_eq!(bounds.min, [1.0, -1.0, 0.0]);
/// assert_eq!(bounds.max, [3.0, 2.0, 0.0]);
/// assert!(bounds.contains_point([2.0, 0.0, 0.0]));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    /// Minimum corner
    pub min: [f64; 3],
    /// Maximum corner
    pub max: [f64; 3],
}

impl Bounds {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Bounds { min, max }
    }

    /// Builds bounds from `[xmin, xmax, ymin, ymax, zmin, zmax]`.
    pub fn from_extent(extent: [f64; 6]) -> Self {
        Bounds {
            min: [extent[0], extent[2], extent[4]],
            max: [extent[1], extent[3], extent[5]],
        }
    }

    /// Box spanning `origin .. origin + size`.
    pub fn from_origin_size(origin: [f64; 3], size: [f64; 3]) -> Self {
        Bounds {
            min: origin,
            max: [origin[0] + size[0], origin[1] + size[1], origin[2] + size[2]],
        }
    }

    pub fn empty() -> Self {
        Bounds {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }

    /// Returns `[xmin, xmax, ymin, ymax, zmin, zmax]`.
    pub fn to_extent(&self) -> [f64; 6] {
        [
            self.min[0], self.max[0], self.min[1], self.max[1], self.min[2], self.max[2],
        ]
    }

    pub fn expand_point(&mut self, point: [f64; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(point[axis]);
            self.max[axis] = self.max[axis].max(point[axis]);
        }
    }

    pub fn expand(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.expand_point(other.min);
        self.expand_point(other.max);
    }

    pub fn contains_point(&self, point: [f64; 3]) -> bool {
        (0..3).all(|axis| self.min[axis] <= point[axis] && point[axis] <= self.max[axis])
    }

    pub fn contains(&self, other: &Bounds) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.min[axis] && other.max[axis] <= self.max[axis])
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }

    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        ]
    }

    pub fn size(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

impl Display for Bounds {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bounds([{}, {}], [{}, {}], [{}, {}])",
            self.min[0], self.max[0], self.min[1], self.max[1], self.min[2], self.max[2]
        )
    }
}
