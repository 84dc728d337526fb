//! Bounded retry of transient solver failures.

use crate::solver::{PrimarySolver, SolveRequest, SolvedRecord, SolverError};
use backon::{ExponentialBuilder, Retryable};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Retry configuration.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first one.
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Create a retry configuration.
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    fn build_backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries as usize)
            .with_jitter()
    }
}

/// Run a solve, repeating it while the solver reports transient failures.
///
/// # Errors
/// Returns the first fatal error, or the last transient one once retries are
/// exhausted.
pub async fn solve_with_retry(
    solver: &dyn PrimarySolver,
    request: &SolveRequest,
    config: &RetryConfig,
) -> Result<Vec<SolvedRecord>, SolverError> {
    let start = Instant::now();
    let records = (|| solver.solve(request))
        .retry(config.build_backoff())
        .when(|e: &SolverError| {
            let transient = e.is_transient();
            if !transient {
                debug!(error = %e, "solve failed permanently");
            }
            transient
        })
        .notify(|e: &SolverError, dur: Duration| {
            warn!(error = %e, delay = ?dur, "solve failed, retrying");
        })
        .await?;

    info!(
        records = records.len(),
        "Solving took {:.3} seconds",
        start.elapsed().as_secs_f64()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        attempts: AtomicU32,
        failures: u32,
        error: SolverError,
    }

    #[async_trait]
    impl PrimarySolver for Flaky {
        async fn solve(&self, _request: &SolveRequest) -> Result<Vec<SolvedRecord>, SolverError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                Err(self.error.clone())
            } else {
                Ok(Vec::new())
            }
        }
    }

    fn fast(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let solver = Flaky {
            attempts: AtomicU32::new(0),
            failures: 2,
            error: SolverError::transient("timeout"),
        };
        let result = solve_with_retry(&solver, &SolveRequest::default(), &fast(3)).await;
        assert!(result.is_ok());
        assert_eq!(solver.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let solver = Flaky {
            attempts: AtomicU32::new(0),
            failures: u32::MAX,
            error: SolverError::transient("timeout"),
        };
        let result = solve_with_retry(&solver, &SolveRequest::default(), &fast(2)).await;
        assert!(result.unwrap_err().is_transient());
        assert_eq!(solver.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_failures_are_not_retried() {
        let solver = Flaky {
            attempts: AtomicU32::new(0),
            failures: u32::MAX,
            error: SolverError::fatal("nothing provides foo"),
        };
        let result = solve_with_retry(&solver, &SolveRequest::default(), &fast(3)).await;
        assert_eq!(result.unwrap_err(), SolverError::fatal("nothing provides foo"));
        assert_eq!(solver.attempts.load(Ordering::SeqCst), 1);
    }
}
