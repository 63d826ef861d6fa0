mod bit_array;
mod bounds;
mod constants;

pub use bit_array::*;
pub use bounds::*;
pub use constants::*;
