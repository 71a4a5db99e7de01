//! General utilities: logging setup and helper macros.

pub mod logger;
pub mod macros;
