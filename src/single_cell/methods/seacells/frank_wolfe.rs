use faer::{Mat, MatRef};
use tracing::trace;

use crate::core::base::sparse_math::*;
use crate::core::base::utils::*;
use crate::core::data::kernel::KernelMatrix;
use crate::error::Result;
use crate::{ensure_archetype_count, ensure_shape};

/////////////
// Helpers //
/////////////

/// One-hot start with all mass of every column in row 0
fn first_row_start(nrow: usize, ncol: usize) -> Mat<f64> {
    let mut mat = Mat::zeros(nrow, ncol);
    for col in 0..ncol {
        mat[(0, col)] = 1.0;
    }
    mat
}

/// Conditional gradient step towards the simplex vertices in `argmins`
///
/// Writes `x + step * (e - x)` into a fresh matrix; `x` is only read.
fn step_towards_vertices(x: MatRef<f64>, argmins: &[usize], step: f64) -> Mat<f64> {
    Mat::from_fn(x.nrows(), x.ncols(), |i, j| {
        let e = if argmins[j] == i { 1.0 } else { 0.0 };
        let x_ij = x[(i, j)];
        x_ij + step * (e - x_ij)
    })
}

/// Frank-Wolfe step size for (zero-based) iteration `t`
#[inline]
fn step_size(t: usize) -> f64 {
    2.0 / (t as f64 + 2.0)
}

//////////
// Main //
//////////

/// Update assignment matrix A using Frank-Wolfe algorithm
///
/// Solves:
///
/// ```min ||X - X @ B @ A||^2```
///
/// subject to every column of A lying on the probability simplex, with X
/// only accessed through the kernel K = X^T X.
///
/// Computes gradient G = 2(t1 @ A - t2) where:
///
/// - t2 = (K @ B)^T
/// - t1 = t2 @ B
///
/// For each point, the archetype with the minimum gradient (lowest index on
/// ties) becomes the vertex, then a convex step of size 2 / (t + 2) is taken
/// towards it. A restarts from all mass on archetype 0 on every call; any
/// previous A is not used.
///
/// ### Params
///
/// * `kernel` - The n × n kernel
/// * `b` - Current archetype matrix (n × k)
/// * `max_fw_iters` - Number of Frank-Wolfe steps
///
/// ### Returns
///
/// Updated assignment matrix (k × n), column stochastic, or a
/// `ShapeMismatch` if B does not have one row per point
pub fn update_a_mat(
    kernel: &KernelMatrix,
    b: MatRef<f64>,
    max_fw_iters: usize,
) -> Result<Mat<f64>> {
    let n = kernel.n_points();
    let k = b.ncols();
    ensure_shape!(b, (n, k), "B");
    ensure_archetype_count!(k, n);

    let t2 = kernel_matmul(kernel, b).transpose().to_owned();
    let t1 = t2.as_ref() * b;

    let mut a = first_row_start(k, n);

    for t in 0..max_fw_iters {
        let t1_a = t1.as_ref() * a.as_ref();
        let grad = Mat::from_fn(k, n, |i, j| 2.0 * (t1_a[(i, j)] - t2[(i, j)]));

        let argmins = col_argmin(grad.as_ref());
        a = step_towards_vertices(a.as_ref(), &argmins, step_size(t));

        if (t + 1) % 10 == 0 {
            trace!("A matrix Frank-Wolfe iteration: {} / {}", t + 1, max_fw_iters);
        }
    }

    Ok(a)
}

/// Update archetype matrix B using Frank-Wolfe algorithm
///
/// Solves:
///
/// ```min ||X - X @ B @ A||^2```
///
/// subject to every column of B lying on the probability simplex.
///
/// Computes gradient G = 2(K @ B @ t1 - t2) where:
///
/// - t1 = A @ A^T
/// - t2 = K @ A^T
///
/// For each archetype, the point with the minimum gradient (lowest index on
/// ties) becomes the vertex, then a convex step of size 2 / (t + 2) is taken
/// towards it. B restarts from all mass on point 0 on every call.
///
/// ### Params
///
/// * `kernel` - The n × n kernel
/// * `a` - Current assignment matrix (k × n)
/// * `max_fw_iters` - Number of Frank-Wolfe steps
///
/// ### Returns
///
/// Updated archetype matrix (n × k), column stochastic, or a
/// `ShapeMismatch` if A does not have one column per point
pub fn update_b_mat(
    kernel: &KernelMatrix,
    a: MatRef<f64>,
    max_fw_iters: usize,
) -> Result<Mat<f64>> {
    let n = kernel.n_points();
    let k = a.nrows();
    ensure_shape!(a, (k, n), "A");
    ensure_archetype_count!(k, n);

    let a_t = a.transpose();
    let t1 = a * a_t;
    let t2 = kernel_matmul(kernel, a_t);

    let mut b = first_row_start(n, k);

    for t in 0..max_fw_iters {
        let k_b = kernel_matmul(kernel, b.as_ref());
        let k_b_t1 = k_b.as_ref() * t1.as_ref();
        let grad = Mat::from_fn(n, k, |i, j| 2.0 * (k_b_t1[(i, j)] - t2[(i, j)]));

        let argmins = col_argmin(grad.as_ref());
        b = step_towards_vertices(b.as_ref(), &argmins, step_size(t));

        if (t + 1) % 10 == 0 {
            trace!("B matrix Frank-Wolfe iteration: {} / {}", t + 1, max_fw_iters);
        }
    }

    Ok(b)
}

///////////
// Tests //
///////////
