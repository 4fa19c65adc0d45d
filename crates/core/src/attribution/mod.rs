//! Cred attribution
//!
//! Turns a weighted graph into a Markov chain, solves it by power
//! iteration and explains each node's score by its contributions.

mod chain;
mod decomposition;
mod pagerank;
mod stationary;
mod weights;

pub use chain::{
    contributor_source, create_contributions, create_ordered_sparse_markov_chain, Contribution,
    ContributionTable, Contributor, OrderedSparseMarkovChain, SparseMarkovChain,
    DEFAULT_SELF_LOOP_WEIGHT, SYNTHETIC_LOOP_KEY,
};
pub use decomposition::{
    decompose, distribution_to_node_distribution, NodeDecomposition, NodeDistribution,
    PagerankNodeDecomposition, ScoredContribution,
};
pub use pagerank::{pagerank, run_pagerank, PagerankOptions, PagerankRun};
pub use stationary::{
    find_stationary_distribution, l1_distance, uniform_distribution, CancellationFlag,
    Distribution, SolverStatus, StationaryDistribution, StationaryOptions,
    DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_MAX_ITERATIONS,
};
pub use weights::{
    compose_node_evaluators, edge_by_prefix, evaluator_from_config, lift_node_evaluator,
    node_by_prefix, EdgeEvaluator, EdgePrefixWeight, EdgeWeight, EdgeWeightTable,
    NodeEvaluator, NodePrefixWeight, NodeWeightTable,
};
