//! Run-time controls shared by the search drivers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cooperative cancellation flag shared between the caller and a running
/// search. Drivers check it between cells (grid) or batches (sequential) and
/// return the partial history.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Controls for a tuning run
#[derive(Debug, Clone)]
pub struct TuneControl {
    /// Log every evaluated configuration at info level
    pub verbose: bool,
    /// Evaluate independent cells on the rayon pool
    pub parallel: bool,
    /// Per-cell wall clock limit for fit + score
    pub timeout: Option<Duration>,
    /// Seed for every random draw the driver makes
    pub seed: u64,
    /// Keep learner extraction artifacts in the history
    pub save_extracts: bool,
    /// Allow one fit to serve every value of the learner's sub-model parameter
    pub submodels: bool,
    /// Cancellation flag
    pub cancel: CancelToken,
}

impl Default for TuneControl {
    fn default() -> Self {
        Self {
            verbose: false,
            parallel: true,
            timeout: None,
            seed: 42,
            save_extracts: true,
            submodels: true,
            cancel: CancelToken::new(),
        }
    }
}

impl TuneControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_save_extracts(mut self, save: bool) -> Self {
        self.save_extracts = save;
        self
    }

    pub fn with_submodels(mut self, enabled: bool) -> Self {
        self.submodels = enabled;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}
