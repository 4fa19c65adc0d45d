//! CredRank engine
//!
//! Scores every node of an addressable graph with a PageRank variant and
//! keeps, per node, the contributions that make up its score:
//! - Addressable graph store with prefix queries
//! - Edge and node weight evaluators
//! - Sparse Markov chain construction and power iteration
//! - Score decomposition

pub mod attribution;
pub mod graph;

pub use attribution::{pagerank, run_pagerank, PagerankNodeDecomposition, PagerankOptions};
pub use graph::{Edge, EdgeAddress, Graph, NodeAddress};
