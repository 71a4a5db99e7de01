use tracing::info;

/// Receives progress notifications during a fit
///
/// Both callbacks default to doing nothing. Observers only see the state,
/// they cannot influence the optimisation.
pub trait FitObserver {
    /// Called after every greedy selection round
    ///
    /// ### Params
    ///
    /// * `round` - Zero-based round that just finished
    /// * `total` - Number of rounds
    /// * `centre` - Point selected in this round
    fn on_greedy_round(&mut self, _round: usize, _total: usize, _centre: usize) {}

    /// Called after every outer iteration (A update followed by B update)
    ///
    /// ### Params
    ///
    /// * `iteration` - Zero-based iteration that just finished
    /// * `total` - Number of outer iterations
    /// * `residual` - Residual after this iteration, if tracked
    fn on_iteration(&mut self, _iteration: usize, _total: usize, _residual: Option<f64>) {}
}

/// Observer that ignores all notifications
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl FitObserver for NoopObserver {}

/// Observer that reports progress through `tracing`
///
/// ### Fields
///
/// * `every` - Report every n-th greedy round / outer iteration (the first
///   and last are always reported).
#[derive(Debug, Clone, Copy)]
pub struct ProgressLog {
    pub every: usize,
}

impl Default for ProgressLog {
    fn default() -> Self {
        Self { every: 10 }
    }
}

impl ProgressLog {
    fn should_report(&self, step: usize, total: usize) -> bool {
        step == 0 || step + 1 == total || (step + 1) % self.every.max(1) == 0
    }
}

impl FitObserver for ProgressLog {
    fn on_greedy_round(&mut self, round: usize, total: usize, centre: usize) {
        if self.should_report(round, total) {
            info!("Selected {} / {} archetypes (point {})", round + 1, total, centre);
        }
    }

    fn on_iteration(&mut self, iteration: usize, total: usize, residual: Option<f64>) {
        if self.should_report(iteration, total) {
            match residual {
                Some(rss) => info!(
                    "Completed iteration {} of {}: RSS = {:.6}",
                    iteration + 1,
                    total,
                    rss
                ),
                None => info!("Completed iteration {} of {}", iteration + 1, total),
            }
        }
    }
}
