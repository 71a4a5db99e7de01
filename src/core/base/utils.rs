use faer::{Mat, MatRef};
use rayon::prelude::*;

///////////////////
// Column scans  //
///////////////////

/// Index of the smallest entry of every column
///
/// Ties resolve to the lowest row index. Columns are scanned in parallel.
///
/// ### Params
///
/// * `mat` - The matrix to scan
///
/// ### Returns
///
/// One row index per column
pub fn col_argmin(mat: MatRef<f64>) -> Vec<usize> {
    let nrow = mat.nrows();
    (0..mat.ncols())
        .into_par_iter()
        .map(|col| {
            let mut min_val = mat[(0, col)];
            let mut min_idx = 0;
            for row in 1..nrow {
                let val = mat[(row, col)];
                if val < min_val {
                    min_val = val;
                    min_idx = row;
                }
            }
            min_idx
        })
        .collect()
}

/// Index of the largest entry of every column
///
/// Ties resolve to the lowest row index. Columns are scanned in parallel.
///
/// ### Params
///
/// * `mat` - The matrix to scan
///
/// ### Returns
///
/// One row index per column
pub fn col_argmax(mat: MatRef<f64>) -> Vec<usize> {
    let nrow = mat.nrows();
    (0..mat.ncols())
        .into_par_iter()
        .map(|col| {
            let mut max_val = mat[(0, col)];
            let mut max_idx = 0;
            for row in 1..nrow {
                let val = mat[(row, col)];
                if val > max_val {
                    max_val = val;
                    max_idx = row;
                }
            }
            max_idx
        })
        .collect()
}

/// One-hot matrix with a 1 at `(rows[col], col)` for every column
///
/// ### Params
///
/// * `rows` - Row index of the 1 in each column
/// * `nrow` - Number of rows of the output
///
/// ### Returns
///
/// Matrix of shape `nrow × rows.len()`
pub fn one_hot_columns(rows: &[usize], nrow: usize) -> Mat<f64> {
    let mut mat = Mat::zeros(nrow, rows.len());
    for (col, &row) in rows.iter().enumerate() {
        mat[(row, col)] = 1.0;
    }
    mat
}

/// Column-wise argmax, binarised
///
/// ### Params
///
/// * `mat` - The matrix to binarise
///
/// ### Returns
///
/// Matrix of the same shape with a single 1 per column at the column maximum
pub fn binarise_columns(mat: MatRef<f64>) -> Mat<f64> {
    one_hot_columns(&col_argmax(mat), mat.nrows())
}

/// Check that every column is a probability vector
///
/// ### Params
///
/// * `mat` - The matrix to check
/// * `tol` - Tolerance for negativity and for the column sum
///
/// ### Returns
///
/// `true` if all entries are `>= -tol` and all columns sum to `1 ± tol`
pub fn is_column_stochastic(mat: MatRef<f64>, tol: f64) -> bool {
    (0..mat.ncols()).all(|col| {
        let mut sum = 0_f64;
        for row in 0..mat.nrows() {
            let val = mat[(row, col)];
            if val < -tol {
                return false;
            }
            sum += val;
        }
        (sum - 1.0).abs() <= tol
    })
}

/// Trace of `a @ b` without forming the product
///
/// ### Params
///
/// * `a` - Matrix of shape m × p
/// * `b` - Matrix of shape p × m
///
/// ### Returns
///
/// `tr(a @ b)`
pub fn trace_of_product(a: MatRef<f64>, b: MatRef<f64>) -> f64 {
    let mut trace = 0_f64;
    for i in 0..a.nrows() {
        for j in 0..a.ncols() {
            trace += a[(i, j)] * b[(j, i)];
        }
    }
    trace
}

///////////
// Tests //
///////////
