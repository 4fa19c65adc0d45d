//! Stationary distribution by power iteration
//!
//! Starts from the uniform distribution and applies the chain until the
//! L1 distance between successive distributions drops below the
//! convergence threshold, or the iteration budget runs out.

use super::chain::SparseMarkovChain;
use credrank_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Probability per chain index
pub type Distribution = Vec<f64>;

/// Default L1 distance at which iteration stops
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 1e-7;

/// Default iteration budget
pub const DEFAULT_MAX_ITERATIONS: usize = 255;

/// Shared flag asking a running solve to stop between iterations
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Solver configuration
#[derive(Debug, Clone)]
pub struct StationaryOptions {
    /// Log every iteration
    pub verbose: bool,

    /// L1 distance below which the distribution counts as converged
    pub convergence_threshold: f64,

    /// Iteration budget; 0 returns the uniform distribution
    pub max_iterations: usize,

    /// Checked between iterations
    pub cancellation: Option<CancellationFlag>,
}

impl Default for StationaryOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            cancellation: None,
        }
    }
}

/// How the solver stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    Converged,
    Exhausted,
    Cancelled,
}

impl SolverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverStatus::Converged => "converged",
            SolverStatus::Exhausted => "exhausted",
            SolverStatus::Cancelled => "cancelled",
        }
    }
}

/// Solver output
#[derive(Debug, Clone, PartialEq)]
pub struct StationaryDistribution {
    pub distribution: Distribution,
    pub status: SolverStatus,

    /// Chain applications performed
    pub iterations: usize,

    /// L1 distance of the last iteration, `None` if none ran
    pub delta: Option<f64>,
}

/// `1/n` for each of `n` nodes
pub fn uniform_distribution(n: usize) -> Distribution {
    vec![1.0 / n as f64; n]
}

/// L1 distance between two equally long distributions
pub fn l1_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

/// Approximate the stationary distribution of `chain`.
///
/// Running out of iterations is not an error: the latest distribution is
/// returned with status `Exhausted` and callers judge its quality from
/// `iterations` and `delta`.
pub fn find_stationary_distribution(
    chain: &SparseMarkovChain,
    options: &StationaryOptions,
) -> Result<StationaryDistribution> {
    if chain.is_empty() {
        return Err(AppError::EmptyGraph);
    }

    let mut pi = uniform_distribution(chain.len());
    let mut iterations = 0;
    let mut delta = None;

    let status = loop {
        if iterations >= options.max_iterations {
            break SolverStatus::Exhausted;
        }
        if options
            .cancellation
            .as_ref()
            .is_some_and(CancellationFlag::is_cancelled)
        {
            break SolverStatus::Cancelled;
        }

        let next = chain.step(&pi)?;
        let distance = l1_distance(&next, &pi);
        pi = next;
        iterations += 1;
        delta = Some(distance);

        if options.verbose {
            tracing::info!(iteration = iterations, delta = distance, "Power iteration");
        }
        if distance < options.convergence_threshold {
            break SolverStatus::Converged;
        }
    };

    match status {
        SolverStatus::Exhausted if options.max_iterations > 0 => tracing::warn!(
            iterations,
            delta = ?delta,
            threshold = options.convergence_threshold,
            "Stationary distribution did not converge"
        ),
        SolverStatus::Cancelled => tracing::warn!(iterations, "Stationary distribution cancelled"),
        _ => tracing::debug!(iterations, delta = ?delta, status = status.as_str(), "Stationary distribution found"),
    }

    Ok(StationaryDistribution {
        distribution: pi,
        status,
        iterations,
        delta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3-cycle 0 -> 1 -> 2 -> 0 with a small self loop on each node
    fn cycle_chain() -> SparseMarkovChain {
        let stay = 1e-3 / 1.001;
        let move_on = 1.0 / 1.001;
        SparseMarkovChain::new(vec![
            vec![(0, stay), (2, move_on)],
            vec![(1, stay), (0, move_on)],
            vec![(2, stay), (1, move_on)],
        ])
        .unwrap()
    }

    /// Two-state chain with stationary distribution [0.25, 0.75]
    fn biased_chain() -> SparseMarkovChain {
        SparseMarkovChain::new(vec![
            vec![(0, 0.7), (1, 0.1)],
            vec![(0, 0.3), (1, 0.9)],
        ])
        .unwrap()
    }

    #[test]
    fn test_uniform_distribution() {
        let pi = uniform_distribution(4);
        assert_eq!(pi, vec![0.25; 4]);
    }

    #[test]
    fn test_zero_iterations_returns_uniform() {
        let options = StationaryOptions {
            max_iterations: 0,
            ..Default::default()
        };
        let result = find_stationary_distribution(&biased_chain(), &options).unwrap();
        assert_eq!(result.distribution, vec![0.5, 0.5]);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.delta, None);
        assert_eq!(result.status, SolverStatus::Exhausted);
    }

    #[test]
    fn test_converges_to_known_distribution() {
        let result = find_stationary_distribution(&biased_chain(), &StationaryOptions::default()).unwrap();
        assert_eq!(result.status, SolverStatus::Converged);
        assert!((result.distribution[0] - 0.25).abs() < 1e-6);
        assert!((result.distribution[1] - 0.75).abs() < 1e-6);
        assert!(result.delta.unwrap() < DEFAULT_CONVERGENCE_THRESHOLD);
    }

    #[test]
    fn test_cycle_is_symmetric() {
        let result = find_stationary_distribution(&cycle_chain(), &StationaryOptions::default()).unwrap();
        for p in &result.distribution {
            assert!((p - 1.0 / 3.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_exhausted_returns_latest() {
        let options = StationaryOptions {
            max_iterations: 1,
            convergence_threshold: 0.0,
            ..Default::default()
        };
        let result = find_stationary_distribution(&biased_chain(), &options).unwrap();
        assert_eq!(result.status, SolverStatus::Exhausted);
        assert_eq!(result.iterations, 1);
        // one step from [0.5, 0.5]
        assert!((result.distribution[0] - 0.4).abs() < 1e-12);
        assert!((result.distribution[1] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_distribution_sums_to_one_every_step() {
        let chain = biased_chain();
        for max_iterations in 0..20 {
            let options = StationaryOptions {
                max_iterations,
                convergence_threshold: 0.0,
                ..Default::default()
            };
            let result = find_stationary_distribution(&chain, &options).unwrap();
            let total: f64 = result.distribution.iter().sum();
            assert!((total - 1.0).abs() < 1e-9, "sum {} after {} iterations", total, max_iterations);
        }
    }

    #[test]
    fn test_cancelled_before_first_iteration() {
        let flag = CancellationFlag::new();
        flag.cancel();
        let options = StationaryOptions {
            cancellation: Some(flag.clone()),
            ..Default::default()
        };
        let result = find_stationary_distribution(&biased_chain(), &options).unwrap();
        assert_eq!(result.status, SolverStatus::Cancelled);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.distribution, vec![0.5, 0.5]);
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_verbose_does_not_change_result() {
        let quiet = find_stationary_distribution(&cycle_chain(), &StationaryOptions::default()).unwrap();
        let verbose = find_stationary_distribution(
            &cycle_chain(),
            &StationaryOptions {
                verbose: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(quiet, verbose);
    }

    #[test]
    fn test_empty_chain_rejected() {
        let chain = SparseMarkovChain::new(Vec::new()).unwrap();
        let err = find_stationary_distribution(&chain, &StationaryOptions::default()).unwrap_err();
        assert_eq!(err.code(), credrank_common::ErrorCode::EmptyGraph);
    }
}
