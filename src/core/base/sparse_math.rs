use faer::{Mat, MatRef};
use rayon::prelude::*;

use crate::core::data::kernel::KernelMatrix;
use crate::core::data::sparse_structures::*;

/// Sparse (CSR) times dense matrix product
///
/// Output rows are computed in parallel into a row-major buffer and then
/// copied into a faer matrix.
///
/// ### Params
///
/// * `csr` - Sparse matrix (n × m) in CSR format
/// * `dense` - Dense matrix (m × p)
///
/// ### Returns
///
/// The dense product (n × p)
pub fn csr_matmul_dense(csr: &CompressedSparseData<f64>, dense: MatRef<f64>) -> Mat<f64> {
    let (nrow, _) = csr.shape();
    let p = dense.ncols();

    let mut buffer = vec![0_f64; nrow * p];

    buffer
        .par_chunks_mut(p.max(1))
        .take(nrow)
        .enumerate()
        .for_each(|(row, out)| {
            for idx in csr.indptr[row]..csr.indptr[row + 1] {
                let col = csr.indices[idx];
                let val = csr.data[idx];
                for (j, o) in out.iter_mut().enumerate() {
                    *o += val * dense[(col, j)];
                }
            }
        });

    Mat::from_fn(nrow, p, |i, j| buffer[i * p + j])
}

/// Sparse (CSR) matrix times vector
///
/// ### Params
///
/// * `csr` - Sparse matrix (n × m) in CSR format
/// * `v` - Vector of length m
///
/// ### Returns
///
/// The product as vector of length n
pub fn csr_matvec(csr: &CompressedSparseData<f64>, v: &[f64]) -> Vec<f64> {
    (0..csr.shape.0)
        .into_par_iter()
        .map(|row| {
            (csr.indptr[row]..csr.indptr[row + 1])
                .map(|idx| csr.data[idx] * v[csr.indices[idx]])
                .sum()
        })
        .collect()
}

/// Kernel times dense matrix
///
/// ### Params
///
/// * `kernel` - The n × n kernel
/// * `dense` - Dense matrix with n rows
///
/// ### Returns
///
/// `K @ dense`
pub fn kernel_matmul(kernel: &KernelMatrix, dense: MatRef<f64>) -> Mat<f64> {
    csr_matmul_dense(kernel.csr(), dense)
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;

    #[test]
    fn test_csr_matmul_dense() {
        let sparse = mat![[1.0, 0.0, 2.0], [0.0, 3.0, 0.0]];
        let csr = CompressedSparseData::from_dense_csr(sparse.as_ref());
        let dense = mat![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];

        let res = csr_matmul_dense(&csr, dense.as_ref());
        let expected = &sparse * &dense;

        assert_eq!(res.shape(), (2, 2));
        for i in 0..2 {
            for j in 0..2 {
                assert!((res[(i, j)] - expected[(i, j)]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_csr_matvec() {
        let sparse = mat![[1.0, 0.0, 2.0], [0.0, 3.0, 0.0]];
        let csr = CompressedSparseData::from_dense_csr(sparse.as_ref());

        let res = csr_matvec(&csr, &[1.0, 1.0, 1.0]);

        assert_eq!(res, vec![3.0, 3.0]);
    }

    #[test]
    fn test_csr_matmul_dense_empty_row() {
        let sparse = mat![[0.0, 0.0], [1.0, 1.0]];
        let csr = CompressedSparseData::from_dense_csr(sparse.as_ref());
        let dense = mat![[2.0], [3.0]];

        let res = csr_matmul_dense(&csr, dense.as_ref());

        assert_eq!(res[(0, 0)], 0.0);
        assert_eq!(res[(1, 0)], 5.0);
    }
}
