use faer::Mat;
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use thousands::Separable;
use tracing::{info, warn};

use crate::core::base::sparse_math::*;
use crate::core::base::utils::*;
use crate::core::data::kernel::KernelMatrix;
use crate::error::{Result, SeaCellsError};
use crate::single_cell::methods::seacells::observer::FitObserver;
use crate::single_cell::methods::seacells::params::{InitMethod, SEACellsParams};
use crate::{ensure_archetype_count, ensure_shape};

/// Floor for the square root of the pivot's self-residual
const PIVOT_EPSILON: f64 = 1e-6;

/// Points with a diagonal score at or below this are never pivots
const MIN_DIAGONAL: f64 = 1e-15;

///////////
// Trait //
///////////

/// Produces the initial archetype matrix B0 (n × k)
///
/// Implementations only need to return a column-stochastic n × k matrix
/// (usually one-hot); the solver does not care how it was obtained.
pub trait ArchetypeInitialiser {
    /// Generate B0
    ///
    /// ### Params
    ///
    /// * `kernel` - The n × n kernel
    /// * `k` - Number of archetypes
    /// * `observer` - Progress observer
    ///
    /// ### Returns
    ///
    /// The initial archetype matrix (n × k)
    fn initialise(
        &self,
        kernel: &KernelMatrix,
        k: usize,
        observer: &mut dyn FitObserver,
    ) -> Result<Mat<f64>>;
}

///////////////
// Greedy    //
///////////////

/// Greedy adaptive CSSP initialisation
///
/// Fast greedy column subset selection on the kernel (Farahat et al., 2013),
/// picking at every round the point with the highest residual energy
/// relative to its residual diagonal.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyCssp;

impl GreedyCssp {
    /// Select `k` centres
    ///
    /// Maintains per-point scores `f` (sum of squared kernel entries in the
    /// residual directions) and `g` (diagonal magnitude) plus one
    /// orthogonalised omega vector per selected centre.
    ///
    /// ### Params
    ///
    /// * `kernel` - The n × n kernel
    /// * `k` - Number of centres to select
    /// * `observer` - Notified after every round
    ///
    /// ### Returns
    ///
    /// Point indices in selection order
    pub fn select_centres(
        &self,
        kernel: &KernelMatrix,
        k: usize,
        observer: &mut dyn FitObserver,
    ) -> Result<Vec<usize>> {
        let n = kernel.n_points();
        ensure_archetype_count!(k, n);

        let mut f = kernel.column_square_sums();
        let mut g = kernel.diagonal();

        let mut omega: Vec<Vec<f64>> = Vec::with_capacity(k);
        let mut selected = vec![false; n];
        let mut centres: Vec<usize> = Vec::with_capacity(k);

        for round in 0..k {
            let p = match best_pivot(&f, &g, &selected) {
                Some(p) => p,
                None => {
                    // k <= n, so an unselected point always exists
                    let fallback = selected.iter().position(|&s| !s).unwrap_or(0);
                    warn!(
                        "No point with positive residual left in round {}, taking point {}",
                        round + 1,
                        fallback
                    );
                    fallback
                }
            };

            selected[p] = true;
            centres.push(p);

            let mut delta = kernel.column(p);
            for om in &omega {
                let w = om[p];
                for (d, &o) in delta.iter_mut().zip(om) {
                    *d -= w * o;
                }
            }

            // rounding can push the self-residual below zero
            delta[p] = delta[p].max(0.0);

            let denom = delta[p].sqrt().max(PIVOT_EPSILON);
            let omega_new: Vec<f64> = delta.iter().map(|d| d / denom).collect();

            let omega_sq_norm: f64 = omega_new.iter().map(|x| x * x).sum();
            let k_omega_new = csr_matvec(kernel.csr(), &omega_new);

            let dots: Vec<f64> = omega
                .iter()
                .map(|om| om.iter().zip(&omega_new).map(|(a, b)| a * b).sum())
                .collect();

            f.par_iter_mut()
                .zip(g.par_iter_mut())
                .enumerate()
                .for_each(|(i, (f_i, g_i))| {
                    let omega_hadamard = omega_new[i] * omega_new[i];
                    let term1 = omega_sq_norm * omega_hadamard;

                    let pl: f64 = dots.iter().zip(&omega).map(|(d, om)| d * om[i]).sum();
                    let term2 = omega_new[i] * (k_omega_new[i] - pl);

                    *f_i += -2.0 * term2 + term1;
                    *g_i += omega_hadamard;
                });

            omega.push(omega_new);
            observer.on_greedy_round(round, k, p);
        }

        Ok(centres)
    }
}

/// Unselected point with the highest f / g, lowest index on ties
fn best_pivot(f: &[f64], g: &[f64], selected: &[bool]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for i in 0..f.len() {
        if selected[i] || g[i] <= MIN_DIAGONAL {
            continue;
        }
        let score = f[i] / g[i];
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((i, score)),
        }
    }

    best.map(|(i, _)| i)
}

impl ArchetypeInitialiser for GreedyCssp {
    fn initialise(
        &self,
        kernel: &KernelMatrix,
        k: usize,
        observer: &mut dyn FitObserver,
    ) -> Result<Mat<f64>> {
        info!(
            "Initialising {} archetypes via greedy CSSP (kernel with {} non-zeros)",
            k,
            kernel.nnz().separate_with_underscores()
        );
        let centres = self.select_centres(kernel, k, observer)?;
        Ok(one_hot_columns(&centres, kernel.n_points()))
    }
}

////////////
// Random //
////////////

/// Seeded random selection of `k` distinct points
///
/// Much cheaper than the greedy selection; used for very large kernels.
#[derive(Debug, Clone, Copy)]
pub struct RandomArchetypes {
    pub seed: u64,
}

impl RandomArchetypes {
    /// Select `k` distinct random centres
    pub fn select_centres(&self, n: usize, k: usize) -> Result<Vec<usize>> {
        ensure_archetype_count!(k, n);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);
        indices.truncate(k);

        Ok(indices)
    }
}

impl ArchetypeInitialiser for RandomArchetypes {
    fn initialise(
        &self,
        kernel: &KernelMatrix,
        k: usize,
        observer: &mut dyn FitObserver,
    ) -> Result<Mat<f64>> {
        let n = kernel.n_points();
        info!(
            "Selecting {} random archetypes from {} points",
            k,
            n.separate_with_underscores()
        );
        let centres = self.select_centres(n, k)?;
        for (round, &centre) in centres.iter().enumerate() {
            observer.on_greedy_round(round, k, centre);
        }
        Ok(one_hot_columns(&centres, n))
    }
}

//////////////
// External //
//////////////

/// Externally supplied B0, e.g. from waypoint sampling
#[derive(Debug, Clone)]
pub struct FixedArchetypes(pub Mat<f64>);

impl ArchetypeInitialiser for FixedArchetypes {
    fn initialise(
        &self,
        kernel: &KernelMatrix,
        k: usize,
        _observer: &mut dyn FitObserver,
    ) -> Result<Mat<f64>> {
        let n = kernel.n_points();
        ensure_archetype_count!(k, n);
        ensure_shape!(self.0, (n, k), "B0");

        if !is_column_stochastic(self.0.as_ref(), 1e-9) {
            warn!("Supplied B0 is not column stochastic");
        }

        Ok(self.0.clone())
    }
}

/// Externally selected centre points (one per archetype), turned into a
/// one-hot B0
#[derive(Debug, Clone)]
pub struct FromCentres(pub Vec<usize>);

impl ArchetypeInitialiser for FromCentres {
    fn initialise(
        &self,
        kernel: &KernelMatrix,
        k: usize,
        _observer: &mut dyn FitObserver,
    ) -> Result<Mat<f64>> {
        let n = kernel.n_points();
        ensure_archetype_count!(k, n);

        if self.0.len() != k {
            return Err(SeaCellsError::shape_mismatch(
                "centres",
                (k, 1),
                (self.0.len(), 1),
            ));
        }
        if let Some(&index) = self.0.iter().find(|&&c| c >= n) {
            return Err(SeaCellsError::InvalidCentre { index, n });
        }

        Ok(one_hot_columns(&self.0, n))
    }
}

/// Pick the initialiser configured in the parameters
///
/// ### Params
///
/// * `params` - The SEACells parameters
/// * `n` - Number of points
///
/// ### Returns
///
/// The initialiser to use when no B0 is supplied
pub fn initialiser_from_params(params: &SEACellsParams, n: usize) -> Box<dyn ArchetypeInitialiser> {
    let random = RandomArchetypes { seed: params.seed };
    match params.init_method {
        InitMethod::Greedy => Box::new(GreedyCssp),
        InitMethod::Random => Box::new(random),
        InitMethod::Auto => {
            if n > params.greedy_threshold {
                if params.verbose {
                    info!(
                        "Dataset large (n = {}), using fast random init (threshold: {})",
                        n.separate_with_underscores(),
                        params.greedy_threshold.separate_with_underscores()
                    );
                }
                Box::new(random)
            } else {
                Box::new(GreedyCssp)
            }
        }
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::single_cell::methods::seacells::observer::NoopObserver;
    use crate::single_cell::methods::seacells::test_utils::*;
    use faer::mat;

    struct RoundRecorder(Vec<usize>);

    impl FitObserver for RoundRecorder {
        fn on_greedy_round(&mut self, _round: usize, _total: usize, centre: usize) {
            self.0.push(centre);
        }
    }

    #[test]
    fn test_greedy_identity_kernel() {
        let kernel = identity_kernel(4);

        let b0 = GreedyCssp
            .initialise(&kernel, 2, &mut NoopObserver)
            .unwrap();

        let expected = mat![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0], [0.0, 0.0]];
        assert_eq!(b0, expected);
    }

    #[test]
    fn test_greedy_block_kernel_picks_one_per_block() {
        let kernel = block_kernel(&[2, 2]);

        let centres = GreedyCssp
            .select_centres(&kernel, 2, &mut NoopObserver)
            .unwrap();

        assert_eq!(centres, vec![0, 2]);
    }

    #[test]
    fn test_greedy_prefers_high_energy_point() {
        // point 0 is similar to both others
        let kernel = KernelMatrix::from_triplets(
            &[0, 0, 0, 1, 1, 2, 2],
            &[0, 1, 2, 0, 1, 0, 2],
            &[1.0, 0.5, 0.5, 0.5, 1.0, 0.5, 1.0],
            3,
        )
        .unwrap();

        let centres = GreedyCssp
            .select_centres(&kernel, 1, &mut NoopObserver)
            .unwrap();

        assert_eq!(centres, vec![0]);
    }

    #[test]
    fn test_greedy_never_repeats() {
        for seed in 0..4_u64 {
            let kernel = random_kernel(20, 3, seed);
            let mut recorder = RoundRecorder(Vec::new());

            let centres = GreedyCssp.select_centres(&kernel, 8, &mut recorder).unwrap();

            let mut sorted = centres.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), 8, "duplicate centres: {:?}", centres);
            assert_eq!(recorder.0, centres);
        }
    }

    #[test]
    fn test_greedy_all_points() {
        let kernel = identity_kernel(5);

        let centres = GreedyCssp
            .select_centres(&kernel, 5, &mut NoopObserver)
            .unwrap();

        assert_eq!(centres, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_greedy_invalid_k() {
        let kernel = identity_kernel(3);

        assert!(matches!(
            GreedyCssp.select_centres(&kernel, 0, &mut NoopObserver),
            Err(SeaCellsError::InvalidArchetypeCount { k: 0, n: 3 })
        ));
        assert!(GreedyCssp.select_centres(&kernel, 4, &mut NoopObserver).is_err());
    }

    #[test]
    fn test_random_archetypes_distinct_and_seeded() {
        let init = RandomArchetypes { seed: 3 };

        let first = init.select_centres(50, 10).unwrap();
        let second = init.select_centres(50, 10).unwrap();

        assert_eq!(first, second);
        let mut sorted = first.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 10);
        assert!(first.iter().all(|&c| c < 50));
    }

    #[test]
    fn test_fixed_archetypes_shape_check() {
        let kernel = identity_kernel(4);
        let b0 = one_hot_columns(&[1, 3], 4);

        let ok = FixedArchetypes(b0.clone())
            .initialise(&kernel, 2, &mut NoopObserver)
            .unwrap();
        assert_eq!(ok, b0);

        let err = FixedArchetypes(b0).initialise(&kernel, 3, &mut NoopObserver);
        assert!(matches!(
            err,
            Err(SeaCellsError::ShapeMismatch {
                name: "B0",
                expected: (4, 3),
                actual: (4, 2)
            })
        ));
    }

    #[test]
    fn test_fixed_archetypes_keeps_non_stochastic_input() {
        let kernel = identity_kernel(3);
        let b0 = mat![[0.5, 2.0], [0.2, 0.0], [0.0, -1.0]];
        assert!(!is_column_stochastic(b0.as_ref(), 1e-9));

        let res = FixedArchetypes(b0.clone())
            .initialise(&kernel, 2, &mut NoopObserver)
            .unwrap();

        assert_eq!(res, b0);
    }

    #[test]
    fn test_from_centres() {
        let kernel = identity_kernel(4);

        let b0 = FromCentres(vec![3, 0])
            .initialise(&kernel, 2, &mut NoopObserver)
            .unwrap();
        assert_eq!(col_argmax(b0.as_ref()), vec![3, 0]);

        assert!(matches!(
            FromCentres(vec![4, 0]).initialise(&kernel, 2, &mut NoopObserver),
            Err(SeaCellsError::InvalidCentre { index: 4, n: 4 })
        ));
        assert!(FromCentres(vec![1]).initialise(&kernel, 2, &mut NoopObserver).is_err());
    }

    #[test]
    fn test_initialiser_from_params_auto() {
        let kernel = identity_kernel(6);
        let mut params = SEACellsParams::new(3);
        params.init_method = InitMethod::Auto;
        params.greedy_threshold = 4;

        let random = initialiser_from_params(&params, 6)
            .initialise(&kernel, 3, &mut NoopObserver)
            .unwrap();
        let expected = RandomArchetypes { seed: params.seed }
            .select_centres(6, 3)
            .unwrap();
        assert_eq!(col_argmax(random.as_ref()), expected);

        params.greedy_threshold = 100;
        let greedy = initialiser_from_params(&params, 6)
            .initialise(&kernel, 3, &mut NoopObserver)
            .unwrap();
        assert_eq!(col_argmax(greedy.as_ref()), vec![0, 1, 2]);
    }
}
