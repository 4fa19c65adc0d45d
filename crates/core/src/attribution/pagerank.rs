//! PageRank with explainable scores
//!
//! Entry point of the engine: builds contributions and the Markov chain for
//! a graph, solves for the stationary distribution and decomposes every
//! node's score into the contributions that produced it.

use super::chain::{create_contributions, create_ordered_sparse_markov_chain, DEFAULT_SELF_LOOP_WEIGHT};
use super::decomposition::{decompose, distribution_to_node_distribution, PagerankNodeDecomposition};
use super::stationary::{
    find_stationary_distribution, CancellationFlag, SolverStatus, StationaryOptions,
    DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_MAX_ITERATIONS,
};
use super::weights::EdgeEvaluator;
use crate::graph::Graph;
use credrank_common::config::PagerankConfig;
use credrank_common::errors::{AppError, Result};
use credrank_common::metrics::RunMetrics;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// PageRank configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PagerankOptions {
    /// Weight of the synthetic self loop on every node
    #[validate(range(exclusive_min = 0.0))]
    pub self_loop_weight: f64,

    /// L1 distance below which the solver stops
    #[validate(range(min = 0.0))]
    pub convergence_threshold: f64,

    /// Maximum iterations
    pub max_iterations: usize,

    /// Log solver progress every iteration
    pub verbose: bool,

    #[serde(skip)]
    pub cancellation: Option<CancellationFlag>,
}

impl Default for PagerankOptions {
    fn default() -> Self {
        Self {
            self_loop_weight: DEFAULT_SELF_LOOP_WEIGHT,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            verbose: false,
            cancellation: None,
        }
    }
}

impl From<&PagerankConfig> for PagerankOptions {
    fn from(config: &PagerankConfig) -> Self {
        Self {
            self_loop_weight: config.self_loop_weight,
            convergence_threshold: config.convergence_threshold,
            max_iterations: config.max_iterations,
            verbose: config.verbose,
            cancellation: None,
        }
    }
}

impl PagerankOptions {
    fn stationary(&self) -> StationaryOptions {
        StationaryOptions {
            verbose: self.verbose,
            convergence_threshold: self.convergence_threshold,
            max_iterations: self.max_iterations,
            cancellation: self.cancellation.clone(),
        }
    }
}

/// Decomposition plus how the solver got there
#[derive(Debug, Clone, PartialEq)]
pub struct PagerankRun {
    pub decomposition: PagerankNodeDecomposition,
    pub status: SolverStatus,
    pub iterations: usize,
    pub delta: Option<f64>,
}

/// Rank every node of `graph` and report convergence
pub fn run_pagerank<E>(graph: &Graph, evaluator: &E, options: &PagerankOptions) -> Result<PagerankRun>
where
    E: EdgeEvaluator + ?Sized,
{
    options.validate()?;
    if !options.self_loop_weight.is_finite() {
        return Err(AppError::InvalidOptions {
            message: format!("self loop weight must be finite, got {}", options.self_loop_weight),
        });
    }

    let span = tracing::info_span!(
        "pagerank",
        nodes = graph.node_count(),
        edges = graph.edge_count()
    );
    let _guard = span.enter();
    let metrics = RunMetrics::start(graph.node_count(), graph.edge_count());

    let contributions = create_contributions(graph, evaluator, options.self_loop_weight)?;
    let osmc = create_ordered_sparse_markov_chain(&contributions)?;
    let solved = find_stationary_distribution(&osmc.chain, &options.stationary())?;
    let scores = distribution_to_node_distribution(&osmc.node_order, &solved.distribution)?;
    let decomposition = decompose(&scores, &contributions)?;

    metrics.finish(solved.iterations, solved.status.as_str());
    tracing::info!(
        status = solved.status.as_str(),
        iterations = solved.iterations,
        delta = ?solved.delta,
        "PageRank complete"
    );

    Ok(PagerankRun {
        decomposition,
        status: solved.status,
        iterations: solved.iterations,
        delta: solved.delta,
    })
}

/// Rank every node of `graph`
pub fn pagerank<E>(
    graph: &Graph,
    evaluator: &E,
    options: &PagerankOptions,
) -> Result<PagerankNodeDecomposition>
where
    E: EdgeEvaluator + ?Sized,
{
    run_pagerank(graph, evaluator, options).map(|run| run.decomposition)
}
