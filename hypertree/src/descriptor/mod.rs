//! Tree topology serialization: the breadth-first bit codec and the
//! text form used to describe whole grids.

mod codec;
mod text;

pub use codec::*;
pub use text::*;
