//! Module containing the numeric helpers: sparse-dense products and column
//! scans over dense matrices.

pub mod sparse_math;
pub mod utils;
