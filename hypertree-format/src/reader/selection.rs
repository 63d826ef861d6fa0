//! Which trees a reader loads, and how deep.
//!
//! A selection combines an optional fixed level with one of three mutually
//! exclusive modes: a coordinate box, an index box or an explicit list of
//! trees with optional per-tree levels. Coordinate boxes are resolved to
//! index boxes once, against the first grid read; after that the selection
//! is frozen.

use crate::errors::{FormatError, FormatResult};
use hypertree::common::{Bounds, DEFAULT_TOLERANCE};
use hypertree::grid::HyperTreeGrid;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum SelectionMode {
    /// Every tree.
    #[default]
    All,
    /// Trees whose root cell intersects the box.
    CoordinatesBox(Bounds),
    /// Trees whose root lattice coordinates lie in `min..=max`.
    IndicesBox { min: [usize; 3], max: [usize; 3] },
    /// Listed trees only, each with an optional level override.
    Ids(BTreeMap<usize, Option<usize>>),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    pub(super) fixed_level: Option<usize>,
    pub(super) mode: SelectionMode,
    finalized: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fixed_level(&self) -> Option<usize> {
        self.fixed_level
    }

    pub fn mode(&self) -> &SelectionMode {
        &self.mode
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// True when some tree may be skipped or cut short.
    pub fn is_restrictive(&self) -> bool {
        self.fixed_level.is_some() || self.mode != SelectionMode::All
    }

    fn check_open(&self, change: &str) -> FormatResult<()> {
        if self.finalized {
            log::error!("Cannot {} once the selection has been applied to a file", change);
            return Err(FormatError::TooLate(format!(
                "cannot {} once the selection has been applied to a file",
                change
            )));
        }
        Ok(())
    }

    /// Limits every tree to `level` levels. `None` reads full depth.
    pub fn set_fixed_level(&mut self, level: Option<usize>) -> FormatResult<()> {
        self.check_open("change the fixed level")?;
        self.fixed_level = level;
        Ok(())
    }

    pub fn set_coordinates_box(&mut self, bounds: Bounds) -> FormatResult<()> {
        self.check_open("select a coordinate box")?;
        self.mode = SelectionMode::CoordinatesBox(bounds);
        Ok(())
    }

    /// Selects roots with lattice coordinates in `min..=max` on every axis.
    pub fn set_indices_box(&mut self, min: [usize; 3], max: [usize; 3]) -> FormatResult<()> {
        self.check_open("select an index box")?;
        self.mode = SelectionMode::IndicesBox { min, max };
        Ok(())
    }

    /// Adds one tree to the explicit list, switching to list mode.
    pub fn add_selected_tree(&mut self, index: usize, level: Option<usize>) -> FormatResult<()> {
        self.check_open("select a tree")?;
        match &mut self.mode {
            SelectionMode::Ids(ids) => {
                ids.insert(index, level);
            }
            mode => *mode = SelectionMode::Ids(BTreeMap::from([(index, level)])),
        }
        Ok(())
    }

    /// Switches to list mode with an empty list.
    pub fn clear_selected_trees(&mut self) -> FormatResult<()> {
        self.check_open("clear the selected trees")?;
        self.mode = SelectionMode::Ids(BTreeMap::new());
        Ok(())
    }

    pub fn select_all(&mut self) -> FormatResult<()> {
        self.check_open("select all trees")?;
        self.mode = SelectionMode::All;
        Ok(())
    }

    /// Resolves a coordinate box against `grid` and freezes the selection.
    /// Later calls do nothing.
    pub(crate) fn finalize(&mut self, grid: &HyperTreeGrid) {
        if self.finalized {
            return;
        }
        if let SelectionMode::CoordinatesBox(bounds) = self.mode {
            self.mode = resolve_coordinates_box(grid, &bounds);
            log::debug!("Coordinate box resolved to {:?}", self.mode);
        }
        self.finalized = true;
    }

    pub fn is_selected(&self, grid: &HyperTreeGrid, tree_index: usize) -> bool {
        match &self.mode {
            SelectionMode::All => true,
            SelectionMode::CoordinatesBox(bounds) => {
                let resolved = resolve_coordinates_box(grid, bounds);
                in_index_box(grid, &resolved, tree_index)
            }
            mode @ SelectionMode::IndicesBox { .. } => in_index_box(grid, mode, tree_index),
            SelectionMode::Ids(ids) => ids.contains_key(&tree_index),
        }
    }

    /// Levels to read from a tree declaring `declared_levels`: the per-tree
    /// override, else the fixed level, capped by the declared depth and at
    /// least one.
    pub fn fixed_level_of(&self, declared_levels: usize, tree_index: usize) -> usize {
        let override_level = match &self.mode {
            SelectionMode::Ids(ids) => ids.get(&tree_index).copied().flatten(),
            _ => None,
        };
        override_level
            .or(self.fixed_level)
            .map(|level| level.min(declared_levels))
            .unwrap_or(declared_levels)
            .max(1)
    }
}

fn in_index_box(grid: &HyperTreeGrid, mode: &SelectionMode, tree_index: usize) -> bool {
    match mode {
        SelectionMode::IndicesBox { min, max } => {
            if tree_index >= grid.number_of_roots() {
                return false;
            }
            let ijk = grid.level_zero_coordinates_from_index(tree_index);
            (0..3).all(|axis| min[axis] <= ijk[axis] && ijk[axis] <= max[axis])
        }
        SelectionMode::Ids(ids) => ids.contains_key(&tree_index),
        _ => true,
    }
}

/// Index box of the roots a coordinate box touches, or an empty list when
/// the box misses the grid.
fn resolve_coordinates_box(grid: &HyperTreeGrid, bounds: &Bounds) -> SelectionMode {
    let cell_dims = grid.cell_dims();
    let mut min = [0usize; 3];
    let mut max = [0usize; 3];
    for axis in 0..3 {
        let coords = grid.coordinates(axis);
        if coords.len() < 2 {
            continue;
        }
        let first = coords[0].min(coords[coords.len() - 1]);
        let last = coords[0].max(coords[coords.len() - 1]);
        if bounds.max[axis] < first - DEFAULT_TOLERANCE || bounds.min[axis] > last + DEFAULT_TOLERANCE {
            log::warn!("Coordinate box {} misses the grid along axis {}", bounds, axis);
            return SelectionMode::Ids(BTreeMap::new());
        }
        let low = bounds.min[axis].clamp(first, last);
        let high = bounds.max[axis].clamp(first, last);
        min[axis] = grid.find_dichotomic(axis, low, DEFAULT_TOLERANCE).unwrap_or(0);
        max[axis] = grid
            .find_dichotomic(axis, high, DEFAULT_TOLERANCE)
            .unwrap_or(cell_dims[axis] - 1);
    }
    SelectionMode::IndicesBox { min, max }
}
