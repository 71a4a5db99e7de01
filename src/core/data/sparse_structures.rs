use faer::{Mat, MatRef};
use std::ops::AddAssign;

//////////////////////////////
// Sparse format conversion //
//////////////////////////////

/// Type to describe the CompressedSparseFormat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressedSparseFormat {
    /// CSC-formatted data
    Csc,
    /// CSR-formatted data
    Csr,
}

/// Compressed sparse matrix in either CSR or CSC layout
///
/// ### Fields
///
/// * `data` - The non-zero values.
/// * `indices` - Column indices (CSR) or row indices (CSC) of the values.
/// * `indptr` - Row pointers (CSR) or column pointers (CSC).
/// * `cs_type` - Which of the two layouts the data is stored in.
/// * `shape` - `(nrow, ncol)` of the matrix.
#[derive(Debug, Clone)]
pub struct CompressedSparseData<T>
where
    T: Clone + Default,
{
    pub data: Vec<T>,
    pub indices: Vec<usize>,
    pub indptr: Vec<usize>,
    pub cs_type: CompressedSparseFormat,
    pub shape: (usize, usize),
}

impl<T> CompressedSparseData<T>
where
    T: Clone + Default,
{
    /// Generate a new CSC version of the matrix
    ///
    /// ### Params
    ///
    /// * `data` - The underlying data
    /// * `indices` - The row indices of the data
    /// * `indptr` - The column index pointers
    /// * `shape` - `(nrow, ncol)` of the matrix
    pub fn new_csc(data: &[T], indices: &[usize], indptr: &[usize], shape: (usize, usize)) -> Self {
        Self {
            data: data.to_vec(),
            indices: indices.to_vec(),
            indptr: indptr.to_vec(),
            cs_type: CompressedSparseFormat::Csc,
            shape,
        }
    }

    /// Generate a new CSR version of the matrix
    ///
    /// ### Params
    ///
    /// * `data` - The underlying data
    /// * `indices` - The column indices of the data
    /// * `indptr` - The row index pointers
    /// * `shape` - `(nrow, ncol)` of the matrix
    pub fn new_csr(data: &[T], indices: &[usize], indptr: &[usize], shape: (usize, usize)) -> Self {
        Self {
            data: data.to_vec(),
            indices: indices.to_vec(),
            indptr: indptr.to_vec(),
            cs_type: CompressedSparseFormat::Csr,
            shape,
        }
    }

    /// Transform from CSC to CSR or vice versa
    ///
    /// ### Returns
    ///
    /// The same matrix in the other layout
    pub fn transform(&self) -> Self {
        match self.cs_type {
            CompressedSparseFormat::Csc => csc_to_csr(self),
            CompressedSparseFormat::Csr => csr_to_csc(self),
        }
    }

    /// Returns the shape of the matrix
    ///
    /// ### Returns
    ///
    /// A tuple of `(nrow, ncol)`
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Returns the NNZ
    ///
    /// ### Returns
    ///
    /// The number of NNZ
    pub fn get_nnz(&self) -> usize {
        self.data.len()
    }

    /// Number of outer slices (rows for CSR, columns for CSC)
    pub fn n_outer(&self) -> usize {
        match self.cs_type {
            CompressedSparseFormat::Csr => self.shape.0,
            CompressedSparseFormat::Csc => self.shape.1,
        }
    }

    /// Number of inner positions (columns for CSR, rows for CSC)
    pub fn n_inner(&self) -> usize {
        match self.cs_type {
            CompressedSparseFormat::Csr => self.shape.1,
            CompressedSparseFormat::Csc => self.shape.0,
        }
    }
}

impl CompressedSparseData<f64> {
    /// Convert a faer dense matrix into CSR format, dropping exact zeroes
    ///
    /// ### Params
    ///
    /// * `dense` - The original dense matrix.
    ///
    /// ### Returns
    ///
    /// The CSR representation.
    pub fn from_dense_csr(dense: MatRef<f64>) -> Self {
        let (nrow, ncol) = dense.shape();

        let mut data = Vec::new();
        let mut indices = Vec::new();
        let mut indptr = Vec::with_capacity(nrow + 1);
        indptr.push(0_usize);

        for row in 0..nrow {
            for col in 0..ncol {
                let val = dense[(row, col)];
                if val != 0.0 {
                    data.push(val);
                    indices.push(col);
                }
            }
            indptr.push(data.len());
        }

        Self {
            data,
            indices,
            indptr,
            cs_type: CompressedSparseFormat::Csr,
            shape: (nrow, ncol),
        }
    }

    /// To a dense faer matrix
    ///
    /// ### Returns
    ///
    /// Returns a dense faer matrix.
    pub fn to_dense_matrix(&self) -> Mat<f64> {
        let mut dense = Mat::zeros(self.shape.0, self.shape.1);

        for outer in 0..self.n_outer() {
            for idx in self.indptr[outer]..self.indptr[outer + 1] {
                let inner = self.indices[idx];
                match self.cs_type {
                    CompressedSparseFormat::Csr => dense[(outer, inner)] = self.data[idx],
                    CompressedSparseFormat::Csc => dense[(inner, outer)] = self.data[idx],
                }
            }
        }

        dense
    }
}

/// Transforms a CompressedSparseData that is CSC to CSR
///
/// ### Params
///
/// * `sparse_data` - The CompressedSparseData you want to transform
///
/// ### Returns
///
/// The data in CSR layout with sorted column indices per row
pub fn csc_to_csr<T>(sparse_data: &CompressedSparseData<T>) -> CompressedSparseData<T>
where
    T: Clone + Default,
{
    let (nrow, _) = sparse_data.shape();
    let nnz = sparse_data.get_nnz();
    let mut row_ptr = vec![0; nrow + 1];

    for &r in &sparse_data.indices {
        row_ptr[r + 1] += 1;
    }

    for i in 0..nrow {
        row_ptr[i + 1] += row_ptr[i];
    }

    let mut csr_data = vec![T::default(); nnz];
    let mut csr_col_ind = vec![0; nnz];
    let mut next = row_ptr[..nrow].to_vec();

    for col in 0..(sparse_data.indptr.len() - 1) {
        for idx in sparse_data.indptr[col]..sparse_data.indptr[col + 1] {
            let row = sparse_data.indices[idx];
            let pos = next[row];

            csr_data[pos] = sparse_data.data[idx].clone();
            csr_col_ind[pos] = col;

            next[row] += 1;
        }
    }

    CompressedSparseData {
        data: csr_data,
        indices: csr_col_ind,
        indptr: row_ptr,
        cs_type: CompressedSparseFormat::Csr,
        shape: sparse_data.shape(),
    }
}

/// Transform CSR stored data into CSC stored data
///
/// This version does a full memory copy of the data.
///
/// ### Params
///
/// * `sparse_data` - The data stored in CSR format.
///
/// ### Returns
///
/// The data in CSC layout with sorted row indices per column
pub fn csr_to_csc<T>(sparse_data: &CompressedSparseData<T>) -> CompressedSparseData<T>
where
    T: Clone + Default,
{
    let nnz = sparse_data.get_nnz();
    let (_, ncol) = sparse_data.shape();
    let mut col_ptr = vec![0; ncol + 1];

    for &c in &sparse_data.indices {
        col_ptr[c + 1] += 1;
    }

    for i in 0..ncol {
        col_ptr[i + 1] += col_ptr[i];
    }

    let mut csc_data = vec![T::default(); nnz];
    let mut csc_row_ind = vec![0; nnz];
    let mut next = col_ptr[..ncol].to_vec();

    for row in 0..(sparse_data.indptr.len() - 1) {
        for idx in sparse_data.indptr[row]..sparse_data.indptr[row + 1] {
            let col = sparse_data.indices[idx];
            let pos = next[col];

            csc_data[pos] = sparse_data.data[idx].clone();
            csc_row_ind[pos] = row;

            next[col] += 1;
        }
    }

    CompressedSparseData {
        data: csc_data,
        indices: csc_row_ind,
        indptr: col_ptr,
        cs_type: CompressedSparseFormat::Csc,
        shape: sparse_data.shape(),
    }
}

/// Build a CSR matrix from COO triplets
///
/// Column indices end up sorted within each row and duplicated `(row, col)`
/// entries are summed.
///
/// ### Params
///
/// * `rows` - Row index per entry
/// * `cols` - Column index per entry
/// * `vals` - Value per entry
/// * `shape` - `(nrow, ncol)` of the matrix
///
/// ### Returns
///
/// The CSR matrix
pub fn coo_to_csr<T>(
    rows: &[usize],
    cols: &[usize],
    vals: &[T],
    shape: (usize, usize),
) -> CompressedSparseData<T>
where
    T: Clone + Default + AddAssign,
{
    let mut order: Vec<usize> = (0..vals.len()).collect();
    order.sort_unstable_by_key(|&i| (rows[i], cols[i]));

    let mut data: Vec<T> = Vec::with_capacity(vals.len());
    let mut indices: Vec<usize> = Vec::with_capacity(vals.len());
    let mut indptr = vec![0_usize; shape.0 + 1];
    let mut last: Option<(usize, usize)> = None;

    for i in order {
        let key = (rows[i], cols[i]);
        if last == Some(key) {
            if let Some(prev) = data.last_mut() {
                *prev += vals[i].clone();
            }
            continue;
        }
        data.push(vals[i].clone());
        indices.push(cols[i]);
        indptr[rows[i] + 1] += 1;
        last = Some(key);
    }

    for i in 0..shape.0 {
        indptr[i + 1] += indptr[i];
    }

    CompressedSparseData {
        data,
        indices,
        indptr,
        cs_type: CompressedSparseFormat::Csr,
        shape,
    }
}

///////////
// Tests //
///////////
