//! Shared fixtures for the hypertree integration tests.

pub mod test_util;
