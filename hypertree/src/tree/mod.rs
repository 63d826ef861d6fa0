//! Arena-backed adaptive trees and their global cell index bookkeeping.

mod global_index;
mod hyper_tree;

pub use global_index::*;
pub use hyper_tree::*;
