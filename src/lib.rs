//! Kernel archetypal analysis for metacell detection (SEACells).
//!
//! The crate fits k archetypes on a sparse, symmetric, positive
//! semi-definite kernel over n points and maps every point to a metacell.
//!
//! ```no_run
//! use seacells::prelude::*;
//!
//! # fn main() -> seacells::error::Result<()> {
//! let kernel = KernelMatrix::from_triplets(&[0, 1, 2], &[0, 1, 2], &[1.0, 1.0, 1.0], 3)?;
//! let params = SEACellsParams::new(2);
//!
//! let res = SEACells::new(&kernel, &params)?.fit(&mut ProgressLog::default())?;
//! println!("{:?}", res.labels().labels);
//! # Ok(())
//! # }
//! ```

#[macro_use]
pub mod utils;

pub mod core;
pub mod error;
pub mod single_cell;

/// Commonly used types
pub mod prelude {
    pub use crate::core::data::kernel::{KernelMatrix, KernelRegistry};
    pub use crate::error::{Result, SeaCellsError};
    pub use crate::single_cell::methods::seacells::*;
    pub use crate::utils::logger::setup_log;
}
