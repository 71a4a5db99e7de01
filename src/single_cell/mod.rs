//! Contains the core single cell functionalities. There are dependencies on
//! other parts of the crate, specifically around the sparse kernel
//! structures and sparse matrix methods.

pub mod methods;
