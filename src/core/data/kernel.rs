use rustc_hash::FxHashMap;

use crate::core::data::sparse_structures::*;
use crate::error::{Result, SeaCellsError};

/// Absolute tolerance for the symmetry check on construction
const SYMMETRY_TOL: f64 = 1e-9;

/////////////
// Kernels //
/////////////

/// Sparse, symmetric, positive semi-definite similarity matrix over n points
///
/// Stored as CSR with sorted column indices per row. Construction validates
/// the structure and symmetry; positive semi-definiteness is the caller's
/// responsibility (the graph builders that produce these kernels guarantee
/// it).
///
/// ### Fields
///
/// * `csr` - The validated CSR data.
#[derive(Debug, Clone)]
pub struct KernelMatrix {
    csr: CompressedSparseData<f64>,
}

impl KernelMatrix {
    /// Generate the kernel from COO triplets
    ///
    /// Duplicated entries are summed.
    ///
    /// ### Params
    ///
    /// * `rows` - Row index per entry
    /// * `cols` - Column index per entry
    /// * `vals` - Value per entry
    /// * `n` - Number of points
    ///
    /// ### Returns
    ///
    /// The validated kernel
    pub fn from_triplets(rows: &[usize], cols: &[usize], vals: &[f64], n: usize) -> Result<Self> {
        if rows.len() != cols.len() || rows.len() != vals.len() {
            return Err(SeaCellsError::invalid_kernel(format!(
                "triplet lengths differ: {} rows, {} cols, {} values",
                rows.len(),
                cols.len(),
                vals.len()
            )));
        }
        if let Some(&bad) = rows.iter().chain(cols.iter()).find(|&&i| i >= n) {
            return Err(SeaCellsError::invalid_kernel(format!(
                "index {} out of bounds for {} points",
                bad, n
            )));
        }

        Self::from_csr(coo_to_csr(rows, cols, vals, (n, n)))
    }

    /// Wrap an existing compressed matrix
    ///
    /// CSC input is converted to CSR. Column indices are sorted within each
    /// row.
    ///
    /// ### Params
    ///
    /// * `mat` - The compressed sparse matrix
    ///
    /// ### Returns
    ///
    /// The validated kernel
    pub fn from_csr(mat: CompressedSparseData<f64>) -> Result<Self> {
        let (nrow, ncol) = mat.shape();
        if nrow != ncol {
            return Err(SeaCellsError::invalid_kernel(format!(
                "kernel must be square, got {} x {}",
                nrow, ncol
            )));
        }
        if mat.indptr.len() != mat.n_outer() + 1
            || mat.indices.len() != mat.data.len()
            || mat.indptr.last().copied() != Some(mat.data.len())
            || mat.indptr.windows(2).any(|w| w[0] > w[1])
        {
            return Err(SeaCellsError::invalid_kernel(
                "inconsistent index pointers",
            ));
        }
        if mat.indices.iter().any(|&i| i >= mat.n_inner()) {
            return Err(SeaCellsError::invalid_kernel("index out of bounds"));
        }

        let mut csr = match mat.cs_type {
            CompressedSparseFormat::Csr => mat,
            CompressedSparseFormat::Csc => mat.transform(),
        };
        sort_rows(&mut csr);

        let kernel = Self { csr };
        if !kernel.is_symmetric(SYMMETRY_TOL) {
            return Err(SeaCellsError::invalid_kernel("kernel is not symmetric"));
        }

        Ok(kernel)
    }

    /// Number of points the kernel covers
    pub fn n_points(&self) -> usize {
        self.csr.shape.0
    }

    /// Number of stored non-zeros
    pub fn nnz(&self) -> usize {
        self.csr.get_nnz()
    }

    /// Borrow the CSR data
    pub fn csr(&self) -> &CompressedSparseData<f64> {
        &self.csr
    }

    /// The diagonal of the kernel (zero where no entry is stored)
    pub fn diagonal(&self) -> Vec<f64> {
        let n = self.n_points();
        let mut diag = vec![0_f64; n];

        for (i, d) in diag.iter_mut().enumerate() {
            let start = self.csr.indptr[i];
            let end = self.csr.indptr[i + 1];
            if let Ok(pos) = self.csr.indices[start..end].binary_search(&i) {
                *d = self.csr.data[start + pos];
            }
        }

        diag
    }

    /// Trace of the kernel
    pub fn trace(&self) -> f64 {
        self.diagonal().iter().sum()
    }

    /// Dense copy of column `j` (equal to row `j` by symmetry)
    pub fn column(&self, j: usize) -> Vec<f64> {
        let mut col = vec![0_f64; self.n_points()];
        for idx in self.csr.indptr[j]..self.csr.indptr[j + 1] {
            col[self.csr.indices[idx]] = self.csr.data[idx];
        }
        col
    }

    /// Per-column sum of squared entries
    pub fn column_square_sums(&self) -> Vec<f64> {
        let mut sums = vec![0_f64; self.n_points()];
        for (&col, &val) in self.csr.indices.iter().zip(&self.csr.data) {
            sums[col] += val * val;
        }
        sums
    }

    /// Checks the kernel against its own transpose
    ///
    /// ### Params
    ///
    /// * `tol` - Absolute tolerance per entry
    ///
    /// ### Returns
    ///
    /// `true` if the sparsity pattern matches and all entries agree
    pub fn is_symmetric(&self, tol: f64) -> bool {
        // the CSC arrays of K read as CSR describe K^T
        let transposed = self.csr.transform();

        transposed.indptr == self.csr.indptr
            && transposed.indices == self.csr.indices
            && transposed
                .data
                .iter()
                .zip(&self.csr.data)
                .all(|(a, b)| (a - b).abs() <= tol)
    }
}

/// Sort the column indices (and values) of every row
fn sort_rows(csr: &mut CompressedSparseData<f64>) {
    for row in 0..csr.shape.0 {
        let start = csr.indptr[row];
        let end = csr.indptr[row + 1];
        if csr.indices[start..end].windows(2).all(|w| w[0] < w[1]) {
            continue;
        }
        let mut pairs: Vec<(usize, f64)> = csr.indices[start..end]
            .iter()
            .copied()
            .zip(csr.data[start..end].iter().copied())
            .collect();
        pairs.sort_unstable_by_key(|&(c, _)| c);
        for (offset, (c, v)) in pairs.into_iter().enumerate() {
            csr.indices[start + offset] = c;
            csr.data[start + offset] = v;
        }
    }
}

//////////////
// Registry //
//////////////

/// Named collection of kernels, e.g. one per embedding the kernel was built
/// on (`"X_pca"`, `"X_svd"`, ...)
#[derive(Debug, Clone, Default)]
pub struct KernelRegistry {
    kernels: FxHashMap<String, KernelMatrix>,
}

impl KernelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kernel, replacing any previous one under the same key
    pub fn insert(&mut self, key: impl Into<String>, kernel: KernelMatrix) {
        self.kernels.insert(key.into(), kernel);
    }

    /// Look up a kernel by key
    ///
    /// ### Params
    ///
    /// * `key` - The key the kernel was registered under
    ///
    /// ### Returns
    ///
    /// The kernel or `SeaCellsError::MissingKernel`
    pub fn get(&self, key: &str) -> Result<&KernelMatrix> {
        self.kernels
            .get(key)
            .ok_or_else(|| SeaCellsError::MissingKernel(key.to_string()))
    }

    /// Whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.kernels.contains_key(key)
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;

    #[test]
    fn test_kernel_from_triplets() {
        let rows = vec![0, 1, 1, 0, 2];
        let cols = vec![0, 1, 0, 1, 2];
        let vals = vec![1.0, 1.0, 0.5, 0.5, 2.0];

        let kernel = KernelMatrix::from_triplets(&rows, &cols, &vals, 3).unwrap();

        assert_eq!(kernel.n_points(), 3);
        assert_eq!(kernel.nnz(), 5);
        assert_eq!(kernel.diagonal(), vec![1.0, 1.0, 2.0]);
        assert!((kernel.trace() - 4.0).abs() < 1e-12);
        assert_eq!(kernel.column(0), vec![1.0, 0.5, 0.0]);
        assert_eq!(kernel.column_square_sums(), vec![1.25, 1.25, 4.0]);
    }

    #[test]
    fn test_kernel_rejects_asymmetric() {
        let dense = mat![[1.0, 0.2], [0.0, 1.0]];
        let csr = CompressedSparseData::from_dense_csr(dense.as_ref());

        let res = KernelMatrix::from_csr(csr);

        assert!(matches!(res, Err(SeaCellsError::InvalidKernel(_))));
    }

    #[test]
    fn test_kernel_rejects_non_square() {
        let dense = mat![[1.0, 0.2, 0.0], [0.2, 1.0, 0.0]];
        let csr = CompressedSparseData::from_dense_csr(dense.as_ref());

        assert!(KernelMatrix::from_csr(csr).is_err());
    }

    #[test]
    fn test_kernel_rejects_out_of_bounds() {
        let res = KernelMatrix::from_triplets(&[0, 3], &[0, 3], &[1.0, 1.0], 3);

        assert!(matches!(res, Err(SeaCellsError::InvalidKernel(_))));
    }

    #[test]
    fn test_kernel_sorts_unsorted_rows() {
        // row 0 stored as (col 1, col 0)
        let csr = CompressedSparseData::new_csr(
            &[0.3, 1.0, 0.3, 1.0],
            &[1, 0, 0, 1],
            &[0, 2, 4],
            (2, 2),
        );

        let kernel = KernelMatrix::from_csr(csr).unwrap();

        assert_eq!(kernel.csr().indices, vec![0, 1, 0, 1]);
        assert_eq!(kernel.diagonal(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_kernel_from_csc() {
        // [2 1 0]
        // [1 2 0]
        // [0 0 3]
        let csc = CompressedSparseData::new_csc(
            &[2.0, 1.0, 1.0, 2.0, 3.0],
            &[0, 1, 0, 1, 2],
            &[0, 2, 4, 5],
            (3, 3),
        );

        let kernel = KernelMatrix::from_csr(csc).unwrap();

        assert_eq!(kernel.csr().cs_type, CompressedSparseFormat::Csr);
        assert_eq!(kernel.diagonal(), vec![2.0, 2.0, 3.0]);
        assert_eq!(kernel.column(1), vec![1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = KernelRegistry::new();
        let kernel = KernelMatrix::from_triplets(&[0, 1], &[0, 1], &[1.0, 1.0], 2).unwrap();
        registry.insert("X_pca", kernel);

        assert!(registry.contains("X_pca"));
        assert_eq!(registry.get("X_pca").unwrap().n_points(), 2);
        assert!(matches!(
            registry.get("X_svd"),
            Err(SeaCellsError::MissingKernel(key)) if key == "X_svd"
        ));
    }
}
