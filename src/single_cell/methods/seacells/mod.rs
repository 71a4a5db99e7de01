//! SEACells kernel archetypal analysis.
//!
//! Finds k archetypes (metacells) as convex combinations of points, and
//! every point as a convex combination of archetypes, by alternating
//! Frank-Wolfe updates on a sparse kernel matrix. B0 comes from a greedy
//! adaptive column subset selection on the kernel unless supplied.

pub mod fit;
pub mod frank_wolfe;
pub mod initialisation;
pub mod labels;
pub mod observer;
pub mod params;
pub mod residual;

#[cfg(test)]
pub(crate) mod test_utils;

pub use fit::{FitResult, FitState, SEACells};
pub use initialisation::{
    initialiser_from_params, ArchetypeInitialiser, FixedArchetypes, FromCentres, GreedyCssp,
    RandomArchetypes,
};
pub use labels::{extract_labels, MetacellLabels};
pub use observer::{FitObserver, NoopObserver, ProgressLog};
pub use params::{InitMethod, SEACellsParams};
pub use residual::compute_residual;
