// cell data constants
pub const GHOST_ARRAY_NAME: &str = "GhostType";

// tree constants
pub(crate) const LEAF: u32 = u32::MAX;
pub const MAX_DIMENSION: usize = 3;
pub const MAX_CHILDREN: usize = 27;
pub const MAX_STENCIL: usize = 27;

// cursor constants
pub(crate) const INLINE_DEPTH: usize = 16;

// grid constants
pub const DEFAULT_TOLERANCE: f64 = 1e-9;
pub const AXIS_NAMES: [&str; 3] = ["X", "Y", "Z"];

const _: () = {
    assert!(MAX_CHILDREN == 3 * 3 * 3);
    assert!(MAX_STENCIL == MAX_CHILDREN);
};
