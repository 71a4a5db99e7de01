//! Module containing anything and everything related to data and data
//! structures

pub mod kernel;
pub mod sparse_structures;
