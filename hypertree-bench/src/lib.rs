//! Hypertree Benchmark Library
//!
//! Grid generators shared by the codec and file format benchmarks.

pub mod data_gen;
