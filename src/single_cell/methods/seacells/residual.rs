use faer::MatRef;

use crate::core::base::sparse_math::*;
use crate::core::base::utils::*;
use crate::core::data::kernel::KernelMatrix;
use crate::ensure_shape;
use crate::error::Result;

/// Reconstruction error of the archetype model via the trace trick
///
/// Computes `||X - X @ B @ A||_F^2` using only the kernel:
///
/// ```E = tr(K) - 2 * tr(A @ K @ B) + tr(B^T @ K @ B @ A @ A^T)```
///
/// Only n × k and k × k intermediates are formed. The value is used for
/// diagnostics; the solver never stops on it.
///
/// ### Params
///
/// * `kernel` - The n × n kernel
/// * `a` - Assignment matrix (k × n)
/// * `b` - Archetype matrix (n × k)
/// * `assume_unit_diagonal` - Use `n` in place of `tr(K)`. Only correct for
///   kernels with a unit diagonal (e.g. Jaccard similarities).
///
/// ### Returns
///
/// The squared residual (non-negative up to rounding)
pub fn compute_residual(
    kernel: &KernelMatrix,
    a: MatRef<f64>,
    b: MatRef<f64>,
    assume_unit_diagonal: bool,
) -> Result<f64> {
    let n = kernel.n_points();
    let k = a.nrows();
    ensure_shape!(a, (k, n), "A");
    ensure_shape!(b, (n, k), "B");

    // Term 1: tr(K)
    let k_trace = if assume_unit_diagonal {
        n as f64
    } else {
        kernel.trace()
    };

    // Term 2: tr(A @ (K @ B)), k x k product never formed
    let k_b = kernel_matmul(kernel, b);
    let cross = trace_of_product(a, k_b.as_ref());

    // Term 3: tr((B^T @ K @ B) @ (A @ A^T))
    let bt_k_b = b.transpose() * k_b.as_ref();
    let a_at = a * a.transpose();
    let reconstruction = trace_of_product(bt_k_b.as_ref(), a_at.as_ref());

    Ok(k_trace - 2.0 * cross + reconstruction)
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SeaCellsError;
    use crate::single_cell::methods::seacells::frank_wolfe::*;
    use crate::single_cell::methods::seacells::test_utils::*;
    use faer::Mat;

    #[test]
    fn test_residual_identity_single_archetype() {
        let kernel = identity_kernel(4);
        let a = Mat::from_fn(1, 4, |_, _| 1.0);

        let b = one_hot_columns(&[0], 4);
        let rss = compute_residual(&kernel, a.as_ref(), b.as_ref(), false).unwrap();
        assert!((rss - 6.0).abs() < 1e-12);

        // the centroid reconstructs better than any single point
        let b_uniform = Mat::from_fn(4, 1, |_, _| 0.25);
        let rss = compute_residual(&kernel, a.as_ref(), b_uniform.as_ref(), false).unwrap();
        assert!((rss - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_residual_exact_reconstruction() {
        let kernel = block_kernel(&[2]);
        let a = Mat::from_fn(1, 2, |_, _| 1.0);
        let b = one_hot_columns(&[0], 2);

        let rss = compute_residual(&kernel, a.as_ref(), b.as_ref(), false).unwrap();

        assert!(rss.abs() < 1e-12);
    }

    #[test]
    fn test_residual_unit_diagonal() {
        let kernel = block_kernel(&[2, 2]);
        let a = one_hot_columns(&[0, 0, 1, 1], 2);
        let b = one_hot_columns(&[0, 2], 4);

        let exact = compute_residual(&kernel, a.as_ref(), b.as_ref(), false).unwrap();
        let unit = compute_residual(&kernel, a.as_ref(), b.as_ref(), true).unwrap();

        assert!(exact.abs() < 1e-12);
        assert!((exact - unit).abs() < 1e-12);
    }

    #[test]
    fn test_residual_non_negative() {
        for seed in 0..5_u64 {
            let kernel = random_kernel(15, 4, seed);
            let b0 = one_hot_columns(&[2, 5, 11], 15);

            let a = update_a_mat(&kernel, b0.as_ref(), 10).unwrap();
            let b = update_b_mat(&kernel, a.as_ref(), 10).unwrap();

            let rss = compute_residual(&kernel, a.as_ref(), b.as_ref(), false).unwrap();
            assert!(rss >= -1e-9, "negative residual {}", rss);
        }
    }

    #[test]
    fn test_residual_shape_errors() {
        let kernel = identity_kernel(3);
        let a = Mat::from_fn(2, 3, |_, _| 0.5);
        let b = one_hot_columns(&[0], 3);

        let res = compute_residual(&kernel, a.as_ref(), b.as_ref(), false);

        assert!(matches!(
            res,
            Err(SeaCellsError::ShapeMismatch { name: "B", .. })
        ));
    }
}
