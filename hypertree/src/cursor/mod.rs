//! Cursors: the only way to walk and grow a [`HyperTree`].
//!
//! Every cursor is one core position (tree, vertex, level) plus optional
//! add-on state. The geometry add-on ([`GeometryTracker`]) tracks the
//! extent of the current cell; the super-cursor adds a neighborhood of
//! same-level neighbors. Algorithms depend on the capability traits below
//! rather than on a concrete cursor type.
//!
//! | Cursor                          | Ascend | Geometry | Neighbors |
//! |---------------------------------|--------|----------|-----------|
//! | [`OrientedCursor`]              | no     | optional | no        |
//! | [`NonOrientedCursor`]           | yes    | optional | no        |
//! | [`SuperCursor`]                 | yes    | optional | yes       |

mod geometry;
mod non_oriented;
mod oriented;
mod super_cursor;
mod tables;

pub use geometry::*;
pub use non_oriented::*;
pub use oriented::*;
pub use super_cursor::*;
pub use tables::*;

use crate::common::Bounds;
use crate::tree::HyperTree;

/// Core navigation capability shared by every cursor.
pub trait HyperTreeCursor {
    fn tree(&self) -> &HyperTree;

    /// Local id of the current vertex.
    fn vertex_id(&self) -> usize;

    /// Depth of the current vertex, `0` at the root.
    fn level(&self) -> usize;

    /// Moves to child slot `child` of the current vertex.
    ///
    /// # Panics
    ///
    /// Panics when the current vertex is a leaf.
    fn to_child(&mut self, child: usize);

    fn is_leaf(&self) -> bool {
        self.tree().is_leaf(self.vertex_id())
    }

    fn is_root(&self) -> bool {
        self.level() == 0
    }

    fn number_of_children(&self) -> usize {
        self.tree().number_of_children()
    }

    fn tree_index(&self) -> usize {
        self.tree().tree_index()
    }

    /// Global cell index of the current vertex.
    fn global_node_index(&self) -> usize {
        self.tree().global_index(self.vertex_id())
    }
}

/// Cursors that remember their ancestors.
pub trait AscendingCursor: HyperTreeCursor {
    /// Moves back to the parent vertex.
    ///
    /// # Panics
    ///
    /// Panics at the root.
    fn to_parent(&mut self);

    fn to_root(&mut self);
}

/// Cursors that know the extent of the current cell.
pub trait GeometryCursor: HyperTreeCursor {
    fn origin(&self) -> [f64; 3];

    fn size(&self) -> [f64; 3];

    fn bounds(&self) -> Bounds {
        Bounds::from_origin_size(self.origin(), self.size())
    }

    fn center(&self) -> [f64; 3] {
        let origin = self.origin();
        let size = self.size();
        [
            origin[0] + size[0] / 2.0,
            origin[1] + size[1] / 2.0,
            origin[2] + size[2] / 2.0,
        ]
    }
}
