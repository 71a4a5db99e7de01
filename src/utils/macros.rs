///////////////////
// Matrix macros //
///////////////////

/// Return a `ShapeMismatch` error from the enclosing function if the matrix
/// does not have the expected `(nrows, ncols)`.
#[macro_export]
macro_rules! ensure_shape {
    ($matrix:expr, $expected:expr, $name:expr) => {
        let actual = ($matrix.nrows(), $matrix.ncols());
        if actual != $expected {
            return Err($crate::error::SeaCellsError::shape_mismatch(
                $name, $expected, actual,
            ));
        }
    };
}

/// Return an `InvalidArchetypeCount` error if `k` is zero or exceeds `n`.
#[macro_export]
macro_rules! ensure_archetype_count {
    ($k:expr, $n:expr) => {
        if $k == 0 || $k > $n {
            return Err($crate::error::SeaCellsError::InvalidArchetypeCount { k: $k, n: $n });
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::error::{Result, SeaCellsError};
    use faer::Mat;

    fn check(mat: &Mat<f64>, expected: (usize, usize)) -> Result<()> {
        ensure_shape!(mat, expected, "test matrix");
        Ok(())
    }

    fn check_k(k: usize, n: usize) -> Result<()> {
        ensure_archetype_count!(k, n);
        Ok(())
    }

    #[test]
    fn test_ensure_shape() {
        let mat = Mat::<f64>::zeros(3, 2);

        assert!(check(&mat, (3, 2)).is_ok());
        assert!(matches!(
            check(&mat, (2, 3)),
            Err(SeaCellsError::ShapeMismatch {
                expected: (2, 3),
                actual: (3, 2),
                ..
            })
        ));
    }

    #[test]
    fn test_ensure_archetype_count() {
        assert!(check_k(1, 1).is_ok());
        assert!(check_k(0, 5).is_err());
        assert!(check_k(6, 5).is_err());
    }
}
