//! Kernel fixtures shared by the SEACells unit tests.

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::core::data::kernel::KernelMatrix;

/// n × n identity kernel
pub fn identity_kernel(n: usize) -> KernelMatrix {
    let idx: Vec<usize> = (0..n).collect();
    KernelMatrix::from_triplets(&idx, &idx, &vec![1.0; n], n).unwrap()
}

/// Block diagonal kernel of all-ones blocks with the given sizes
pub fn block_kernel(sizes: &[usize]) -> KernelMatrix {
    let n: usize = sizes.iter().sum();
    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut offset = 0;
    for &size in sizes {
        for i in offset..offset + size {
            for j in offset..offset + size {
                rows.push(i);
                cols.push(j);
            }
        }
        offset += size;
    }
    let vals = vec![1.0; rows.len()];
    KernelMatrix::from_triplets(&rows, &cols, &vals, n).unwrap()
}

/// Dense PSD kernel `X @ X^T` for uniform random `X` (n × dim)
pub fn random_kernel(n: usize, dim: usize, seed: u64) -> KernelMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let x: Vec<Vec<f64>> = (0..n)
        .map(|_| (0..dim).map(|_| rng.random::<f64>()).collect())
        .collect();

    let mut rows = Vec::with_capacity(n * n);
    let mut cols = Vec::with_capacity(n * n);
    let mut vals = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            rows.push(i);
            cols.push(j);
            vals.push(x[i].iter().zip(&x[j]).map(|(a, b)| a * b).sum());
        }
    }
    KernelMatrix::from_triplets(&rows, &cols, &vals, n).unwrap()
}
