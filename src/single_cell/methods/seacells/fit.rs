use faer::{Mat, MatRef};
use thousands::Separable;
use tracing::{debug, info};

use crate::core::base::sparse_math::*;
use crate::core::base::utils::*;
use crate::core::data::kernel::{KernelMatrix, KernelRegistry};
use crate::error::{Result, SeaCellsError};
use crate::single_cell::methods::seacells::frank_wolfe::*;
use crate::single_cell::methods::seacells::initialisation::*;
use crate::single_cell::methods::seacells::labels::*;
use crate::single_cell::methods::seacells::observer::FitObserver;
use crate::single_cell::methods::seacells::params::SEACellsParams;
use crate::single_cell::methods::seacells::residual::compute_residual;
use crate::{ensure_archetype_count, ensure_shape};

///////////
// State //
///////////

/// Where a `SEACells` instance is in its life cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitState {
    /// Nothing has run yet (or the last fit failed)
    Uninitialised,
    /// Generating B0 and the first A
    Initialising,
    /// Running the zero-based outer iteration
    Iterating(usize),
    /// The last fit finished
    Converged,
}

////////////
// Result //
////////////

/// Immutable outcome of a SEACells fit
///
/// ### Fields
///
/// * `a` - Assignment matrix (k × n)
/// * `b` - Archetype matrix (n × k)
/// * `b0` - The initial archetype matrix the fit started from
/// * `z` - Archetypes in kernel space, `B^T @ K` (k × n)
/// * `labels` - Final point to metacell mapping
/// * `rss_history` - Residual before the first and after every outer
///   iteration, empty if not tracked
/// * `n_iter` - Outer iterations run
#[derive(Debug, Clone)]
pub struct FitResult {
    a: Mat<f64>,
    b: Mat<f64>,
    b0: Mat<f64>,
    z: Mat<f64>,
    labels: MetacellLabels,
    rss_history: Vec<f64>,
    n_iter: usize,
}

impl FitResult {
    /// Assignment matrix A (k × n)
    pub fn a(&self) -> MatRef<'_, f64> {
        self.a.as_ref()
    }

    /// Archetype matrix B (n × k)
    pub fn b(&self) -> MatRef<'_, f64> {
        self.b.as_ref()
    }

    /// The initial archetype matrix
    pub fn b0(&self) -> MatRef<'_, f64> {
        self.b0.as_ref()
    }

    /// Archetype coordinates Z = B^T @ K (k × n)
    pub fn archetypes(&self) -> MatRef<'_, f64> {
        self.z.as_ref()
    }

    /// Number of archetypes
    pub fn n_archetypes(&self) -> usize {
        self.a.nrows()
    }

    /// Closest point to each archetype (argmax of every B column)
    pub fn centres(&self) -> Vec<usize> {
        col_argmax(self.b.as_ref())
    }

    /// Soft archetype assignments per point, A^T (n × k)
    pub fn assignments(&self) -> Mat<f64> {
        self.a.transpose().to_owned()
    }

    /// Raw archetype index per point
    pub fn hard_assignments(&self) -> Vec<usize> {
        hard_assignments(self.a.as_ref())
    }

    /// Number of points whose hard label is each archetype (length k)
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0_usize; self.n_archetypes()];
        for archetype in self.hard_assignments() {
            sizes[archetype] += 1;
        }
        sizes
    }

    /// Point indices grouped per raw archetype
    pub fn metacells(&self) -> Vec<Vec<usize>> {
        assignments_to_metacells(&self.hard_assignments(), self.n_archetypes())
    }

    /// Aggregate an external feature matrix per archetype
    ///
    /// ### Params
    ///
    /// * `x` - Feature matrix with one row per point (n × d)
    ///
    /// ### Returns
    ///
    /// The binarised A times `x` (k × d), i.e. the per-archetype sum of the
    /// features of its hard members
    pub fn coordinates(&self, x: MatRef<f64>) -> Result<Mat<f64>> {
        let n = self.a.ncols();
        ensure_shape!(x, (n, x.ncols()), "X");

        let a_bin = binarise_columns(self.a.as_ref());
        Ok(a_bin.as_ref() * x)
    }

    /// Final point to metacell labels
    pub fn labels(&self) -> &MetacellLabels {
        &self.labels
    }

    /// Recorded residuals
    pub fn rss_history(&self) -> &[f64] {
        &self.rss_history
    }

    /// Outer iterations run
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Residual of the final A and B against a kernel
    ///
    /// ### Params
    ///
    /// * `kernel` - The kernel the model was fitted on
    /// * `assume_unit_diagonal` - Use `n` in place of `tr(K)`
    ///
    /// ### Returns
    ///
    /// The squared residual
    pub fn residual(&self, kernel: &KernelMatrix, assume_unit_diagonal: bool) -> Result<f64> {
        compute_residual(kernel, self.a.as_ref(), self.b.as_ref(), assume_unit_diagonal)
    }
}

//////////
// Main //
//////////

/// SEACells kernel archetypal analysis
///
/// Alternates Frank-Wolfe updates of the assignment matrix A (k × n) and the
/// archetype matrix B (n × k) to minimise `||X - X @ B @ A||^2`, with X only
/// seen through the kernel.
///
/// ### Fields
///
/// * `kernel` - The n × n kernel
/// * `params` - The SEACells parameters
/// * `initialiser` - Custom initialiser, overrides `params.init_method`
/// * `b0` - Caller supplied initial archetype matrix
/// * `fixed_a` - Ground-truth A, never re-estimated
/// * `fixed_b` - Ground-truth B, never re-estimated
/// * `state` - Life cycle state
pub struct SEACells<'a> {
    kernel: &'a KernelMatrix,
    params: &'a SEACellsParams,
    initialiser: Option<Box<dyn ArchetypeInitialiser + 'a>>,
    b0: Option<Mat<f64>>,
    fixed_a: Option<Mat<f64>>,
    fixed_b: Option<Mat<f64>>,
    state: FitState,
}

impl<'a> SEACells<'a> {
    /// Generate a new instance
    ///
    /// ### Params
    ///
    /// * `kernel` - The n × n kernel
    /// * `params` - The SEACells parameters
    ///
    /// ### Returns
    ///
    /// The instance or `InvalidArchetypeCount` if `params.n_sea_cells` is 0
    /// or larger than the number of points
    pub fn new(kernel: &'a KernelMatrix, params: &'a SEACellsParams) -> Result<Self> {
        ensure_archetype_count!(params.n_sea_cells, kernel.n_points());

        Ok(Self {
            kernel,
            params,
            initialiser: None,
            b0: None,
            fixed_a: None,
            fixed_b: None,
            state: FitState::Uninitialised,
        })
    }

    /// Generate a new instance on a kernel from a registry
    ///
    /// ### Params
    ///
    /// * `registry` - The available kernels
    /// * `key` - Key of the kernel to fit on
    /// * `params` - The SEACells parameters
    ///
    /// ### Returns
    ///
    /// The instance or `MissingKernel` if the key is absent
    pub fn from_registry(
        registry: &'a KernelRegistry,
        key: &str,
        params: &'a SEACellsParams,
    ) -> Result<Self> {
        let kernel = registry.get(key)?;
        Self::new(kernel, params)
    }

    /// Start from this B0 instead of running an initialiser
    pub fn with_initial_archetypes(mut self, b0: Mat<f64>) -> Self {
        self.b0 = Some(b0);
        self
    }

    /// Use a custom initialiser (e.g. waypoint centres)
    pub fn with_initialiser(mut self, initialiser: impl ArchetypeInitialiser + 'a) -> Self {
        self.initialiser = Some(Box::new(initialiser));
        self
    }

    /// Keep A fixed at this matrix for the whole fit
    pub fn with_fixed_assignments(mut self, a: Mat<f64>) -> Self {
        self.fixed_a = Some(a);
        self
    }

    /// Keep B fixed at this matrix for the whole fit
    pub fn with_fixed_archetypes(mut self, b: Mat<f64>) -> Self {
        self.fixed_b = Some(b);
        self
    }

    /// Current life cycle state
    pub fn state(&self) -> FitState {
        self.state
    }

    /// Number of points
    pub fn n_points(&self) -> usize {
        self.kernel.n_points()
    }

    /// Fit the model
    ///
    /// Runs exactly `params.n_iter` outer iterations of an A update followed
    /// by a B update, each with `params.max_fw_iters` Frank-Wolfe steps. All
    /// caller supplied matrices are validated before anything runs.
    ///
    /// ### Params
    ///
    /// * `observer` - Receives per-round and per-iteration progress
    ///
    /// ### Returns
    ///
    /// The `FitResult`
    pub fn fit(&mut self, observer: &mut dyn FitObserver) -> Result<FitResult> {
        self.validate()?;

        let res = self.run(observer);
        self.state = match res {
            Ok(_) => FitState::Converged,
            Err(_) => FitState::Uninitialised,
        };

        res
    }

    /// Shape checks of all supplied matrices
    fn validate(&self) -> Result<()> {
        let n = self.n_points();
        let k = self.params.n_sea_cells;
        ensure_archetype_count!(k, n);

        if let Some(b0) = &self.b0 {
            ensure_shape!(b0, (n, k), "B0");
        }
        if let Some(a) = &self.fixed_a {
            ensure_shape!(a, (k, n), "A");
        }
        if let Some(b) = &self.fixed_b {
            ensure_shape!(b, (n, k), "B");
        }

        Ok(())
    }

    fn run(&mut self, observer: &mut dyn FitObserver) -> Result<FitResult> {
        let params = self.params;
        let kernel = self.kernel;
        let n = kernel.n_points();
        let k = params.n_sea_cells;

        self.state = FitState::Initialising;

        if params.verbose {
            info!(
                "Fitting {} SEACells on {} points ({} kernel non-zeros)",
                k,
                n.separate_with_underscores(),
                kernel.nnz().separate_with_underscores()
            );
        }

        let b0 = self.initial_archetypes(observer)?;
        let mut b = b0.clone();

        // the A update restarts from a vertex, so one update against B0 is
        // the corrected warm start
        let mut a = match &self.fixed_a {
            Some(fixed) => fixed.clone(),
            None => update_a_mat(kernel, b.as_ref(), params.max_fw_iters)?,
        };

        let mut rss_history = Vec::new();
        if params.track_residuals {
            let rss = compute_residual(kernel, a.as_ref(), b.as_ref(), params.assume_unit_diagonal)?;
            if params.verbose {
                info!("Initial RSS: {:.6}", rss);
            }
            rss_history.push(rss);
        }

        for iter in 0..params.n_iter {
            self.state = FitState::Iterating(iter);

            if self.fixed_a.is_none() {
                a = update_a_mat(kernel, b.as_ref(), params.max_fw_iters)?;
            } else {
                debug!("Not updating A, fixed A provided");
            }

            if self.fixed_b.is_none() {
                b = update_b_mat(kernel, a.as_ref(), params.max_fw_iters)?;
            } else {
                debug!("Not updating B, fixed B provided");
            }

            let rss = if params.track_residuals {
                let rss =
                    compute_residual(kernel, a.as_ref(), b.as_ref(), params.assume_unit_diagonal)?;
                rss_history.push(rss);
                Some(rss)
            } else {
                None
            };

            debug!("Completed iteration {} of {}", iter + 1, params.n_iter);
            observer.on_iteration(iter, params.n_iter, rss);
        }

        let z = kernel_matmul(kernel, b.as_ref()).transpose().to_owned();
        let labels = extract_labels(a.as_ref(), b.as_ref());

        if params.verbose {
            info!(
                "Found {} metacells with realised centres out of {} archetypes",
                labels.n_metacells(),
                k
            );
        }

        Ok(FitResult {
            a,
            b,
            b0,
            z,
            labels,
            rss_history,
            n_iter: params.n_iter,
        })
    }

    /// B0 from (in order of precedence) the fixed B, the supplied B0, the
    /// custom initialiser or the configured init method
    fn initial_archetypes(&self, observer: &mut dyn FitObserver) -> Result<Mat<f64>> {
        let k = self.params.n_sea_cells;

        if let Some(b) = &self.fixed_b {
            if self.params.verbose {
                info!("Using fixed B matrix as provided");
            }
            return Ok(b.clone());
        }

        if let Some(b0) = &self.b0 {
            if self.params.verbose {
                info!("Using provided initial B matrix");
            }
            return FixedArchetypes(b0.clone()).initialise(self.kernel, k, observer);
        }

        let b0 = match &self.initialiser {
            Some(initialiser) => initialiser.initialise(self.kernel, k, observer)?,
            None => initialiser_from_params(self.params, self.n_points())
                .initialise(self.kernel, k, observer)?,
        };

        if b0.shape() != (self.n_points(), k) {
            return Err(SeaCellsError::shape_mismatch(
                "B0",
                (self.n_points(), k),
                b0.shape(),
            ));
        }

        Ok(b0)
    }
}

///////////
// Tests //
///////////
