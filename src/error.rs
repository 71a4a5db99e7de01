//! Error types for the SEACells kernel archetypal analysis.

use thiserror::Error;

/// Errors that can occur while configuring or fitting a SEACells model.
#[derive(Debug, Error)]
pub enum SeaCellsError {
    /// No kernel registered under the requested key.
    #[error("Kernel '{0}' is not present in the kernel registry")]
    MissingKernel(String),

    /// Archetype count is zero or larger than the number of points.
    #[error("Invalid number of archetypes: requested {k} for {n} points")]
    InvalidArchetypeCount {
        /// Requested archetypes
        k: usize,
        /// Points in the kernel
        n: usize,
    },

    /// A caller supplied matrix does not match the expected shape.
    #[error("Shape mismatch for {name}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Which matrix is wrong
        name: &'static str,
        /// Expected `(nrow, ncol)`
        expected: (usize, usize),
        /// Actual `(nrow, ncol)`
        actual: (usize, usize),
    },

    /// An externally supplied centre index lies outside the kernel.
    #[error("Centre index {index} out of bounds for {n} points")]
    InvalidCentre {
        /// Offending index
        index: usize,
        /// Points in the kernel
        n: usize,
    },

    /// The kernel matrix is malformed.
    #[error("Invalid kernel matrix: {0}")]
    InvalidKernel(String),

    /// Parameters could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A global tracing subscriber could not be installed.
    #[error("Failed to initialise logging: {0}")]
    Logging(String),
}

impl SeaCellsError {
    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(
        name: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> Self {
        Self::ShapeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// Create an InvalidKernel error.
    pub fn invalid_kernel(message: impl Into<String>) -> Self {
        Self::InvalidKernel(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SeaCellsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SeaCellsError::shape_mismatch("B0", (10, 3), (10, 4));
        assert_eq!(
            err.to_string(),
            "Shape mismatch for B0: expected (10, 3), got (10, 4)"
        );

        let err = SeaCellsError::InvalidArchetypeCount { k: 0, n: 5 };
        assert_eq!(
            err.to_string(),
            "Invalid number of archetypes: requested 0 for 5 points"
        );

        let err = SeaCellsError::MissingKernel("X_pca".to_string());
        assert!(err.to_string().contains("X_pca"));
    }
}
