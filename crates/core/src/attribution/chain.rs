//! Graph to Markov chain conversion
//!
//! Every node receives raw contributions: a synthetic self loop, the
//! forward weight of each edge pointing at it, and the backward weight of
//! each edge leaving it. Dividing each contribution by the total raw weight
//! its source hands out yields a column-stochastic sparse chain.

use super::weights::EdgeEvaluator;
use crate::graph::{Edge, Graph, NodeAddress};
use credrank_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default weight of the synthetic self loop
pub const DEFAULT_SELF_LOOP_WEIGHT: f64 = 1e-3;

/// Tie-break key used for synthetic loops when ordering contributions
pub const SYNTHETIC_LOOP_KEY: &str = "[synthetic loop]";

/// What carries a contribution into a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Contributor {
    /// An edge whose destination is the node; flows forward from its source
    InEdge { edge: Edge },

    /// An edge whose source is the node; flows backward from its destination
    OutEdge { edge: Edge },

    /// The node's own self loop
    SyntheticLoop,
}

impl Contributor {
    /// Deterministic key for ordering contributions with equal scores
    pub fn tie_break_key(&self) -> (String, u8) {
        match self {
            Contributor::InEdge { edge } => (edge.address.to_string(), 0),
            Contributor::OutEdge { edge } => (edge.address.to_string(), 1),
            Contributor::SyntheticLoop => (SYNTHETIC_LOOP_KEY.to_string(), 2),
        }
    }
}

/// One raw source of endorsement flowing into a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub contributor: Contributor,
    pub weight: f64,
}

/// Resolve the node a contribution into `target` comes from
pub fn contributor_source<'a>(
    target: &'a NodeAddress,
    contributor: &'a Contributor,
) -> Result<&'a NodeAddress> {
    match contributor {
        Contributor::InEdge { edge } if &edge.dst == target => Ok(&edge.src),
        Contributor::OutEdge { edge } if &edge.src == target => Ok(&edge.dst),
        Contributor::SyntheticLoop => Ok(target),
        Contributor::InEdge { edge } | Contributor::OutEdge { edge } => {
            Err(AppError::invariant(format!(
                "contribution via {} is not incident to {}",
                edge, target
            )))
        }
    }
}

/// Raw contributions into every node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContributionTable {
    contributions: BTreeMap<NodeAddress, Vec<Contribution>>,
}

impl ContributionTable {
    /// Get the contributions into `node`
    pub fn get(&self, node: &NodeAddress) -> Option<&[Contribution]> {
        self.contributions.get(node).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeAddress, &[Contribution])> + '_ {
        self.contributions
            .iter()
            .map(|(node, contributions)| (node, contributions.as_slice()))
    }

    /// Nodes in index order
    pub fn nodes(&self) -> impl Iterator<Item = &NodeAddress> + '_ {
        self.contributions.keys()
    }

    pub fn len(&self) -> usize {
        self.contributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    /// Total raw weight each node hands out across all its contributions.
    ///
    /// The chain and the decomposition both normalize by these totals, so
    /// they are computed in one fixed order to keep results bit-identical.
    pub fn source_totals(&self) -> Result<BTreeMap<&NodeAddress, f64>> {
        let mut totals: BTreeMap<&NodeAddress, f64> = BTreeMap::new();
        for (target, contributions) in &self.contributions {
            for contribution in contributions {
                let source = contributor_source(target, &contribution.contributor)?;
                *totals.entry(source).or_insert(0.0) += contribution.weight;
            }
        }
        Ok(totals)
    }

    fn push(&mut self, node: &NodeAddress, contribution: Contribution) {
        self.contributions
            .entry(node.clone())
            .or_default()
            .push(contribution);
    }
}

/// Collect the raw contributions of every node in `graph`.
///
/// Fails with `EmptyGraph` for a graph without nodes and with
/// `UnweightableEdge` if the evaluator yields a negative or non-finite
/// weight.
pub fn create_contributions<E>(
    graph: &Graph,
    evaluator: &E,
    self_loop_weight: f64,
) -> Result<ContributionTable>
where
    E: EdgeEvaluator + ?Sized,
{
    if graph.node_count() == 0 {
        return Err(AppError::EmptyGraph);
    }
    if !(self_loop_weight.is_finite() && self_loop_weight > 0.0) {
        return Err(AppError::InvalidOptions {
            message: format!(
                "self loop weight must be positive and finite, got {}",
                self_loop_weight
            ),
        });
    }

    let mut table = ContributionTable::default();
    for node in graph.nodes() {
        table.push(
            node,
            Contribution {
                contributor: Contributor::SyntheticLoop,
                weight: self_loop_weight,
            },
        );
    }

    for edge in graph.edges() {
        let weight = evaluator.evaluate(edge);
        let valid = |w: f64| w.is_finite() && w >= 0.0;
        if !valid(weight.forward) || !valid(weight.backward) {
            return Err(AppError::UnweightableEdge {
                edge: edge.to_string(),
                forward: weight.forward,
                backward: weight.backward,
            });
        }
        table.push(
            &edge.dst,
            Contribution {
                contributor: Contributor::InEdge { edge: edge.clone() },
                weight: weight.forward,
            },
        );
        table.push(
            &edge.src,
            Contribution {
                contributor: Contributor::OutEdge { edge: edge.clone() },
                weight: weight.backward,
            },
        );
    }

    tracing::debug!(
        nodes = table.len(),
        edges = graph.edge_count(),
        "Contributions created"
    );
    Ok(table)
}

/// Sparse column-stochastic transition chain.
///
/// Row `t` lists `(source index, probability)` pairs for every transition
/// into node `t`. Source indices are checked at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMarkovChain {
    rows: Vec<Vec<(usize, f64)>>,
}

impl SparseMarkovChain {
    pub fn new(rows: Vec<Vec<(usize, f64)>>) -> Result<Self> {
        let n = rows.len();
        for (target, row) in rows.iter().enumerate() {
            if let Some((source, _)) = row.iter().find(|(source, _)| *source >= n) {
                return Err(AppError::invariant(format!(
                    "row {} references source index {} outside chain of {} nodes",
                    target, source, n
                )));
            }
        }
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Transitions into node `target`
    pub fn row(&self, target: usize) -> &[(usize, f64)] {
        &self.rows[target]
    }

    /// Total outgoing probability per source; 1 for every node in a valid chain
    pub fn out_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.rows.len()];
        for row in &self.rows {
            for &(source, probability) in row {
                sums[source] += probability;
            }
        }
        sums
    }

    /// One application of the chain: `next[t] = Σ p(s → t) · pi[s]`
    pub fn step(&self, pi: &[f64]) -> Result<Vec<f64>> {
        if pi.len() != self.rows.len() {
            return Err(AppError::invariant(format!(
                "distribution of length {} applied to chain of {} nodes",
                pi.len(),
                self.rows.len()
            )));
        }
        Ok(self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&(source, probability)| probability * pi[source])
                    .sum()
            })
            .collect())
    }
}

/// A chain plus the node each index stands for
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedSparseMarkovChain {
    pub node_order: Vec<NodeAddress>,
    pub chain: SparseMarkovChain,
}

impl OrderedSparseMarkovChain {
    /// Index of `node` in the chain
    pub fn index_of(&self, node: &NodeAddress) -> Option<usize> {
        // node_order comes from a BTreeMap and is sorted
        self.node_order.binary_search(node).ok()
    }
}

/// Normalize raw contributions into a column-stochastic chain.
///
/// Nodes are indexed in address order. Each contribution becomes one
/// transition whose probability is its raw weight divided by the total
/// raw weight of its source.
pub fn create_ordered_sparse_markov_chain(
    table: &ContributionTable,
) -> Result<OrderedSparseMarkovChain> {
    if table.is_empty() {
        return Err(AppError::EmptyGraph);
    }
    let node_order: Vec<NodeAddress> = table.nodes().cloned().collect();
    let index: BTreeMap<&NodeAddress, usize> = node_order
        .iter()
        .enumerate()
        .map(|(i, node)| (node, i))
        .collect();
    let totals = table.source_totals()?;

    let mut rows = Vec::with_capacity(node_order.len());
    for (target, contributions) in table.iter() {
        let mut row = Vec::with_capacity(contributions.len());
        for contribution in contributions {
            let source = contributor_source(target, &contribution.contributor)?;
            let source_index = *index.get(source).ok_or_else(|| {
                AppError::invariant(format!("source {} has no chain index", source))
            })?;
            let total = normalizer(&totals, source)?;
            row.push((source_index, contribution.weight / total));
        }
        rows.push(row);
    }

    tracing::debug!(nodes = node_order.len(), "Markov chain created");
    Ok(OrderedSparseMarkovChain {
        node_order,
        chain: SparseMarkovChain::new(rows)?,
    })
}

/// Total raw weight of `source`, which must be positive to divide by
pub(crate) fn normalizer(totals: &BTreeMap<&NodeAddress, f64>, source: &NodeAddress) -> Result<f64> {
    match totals.get(source) {
        Some(&total) if total > 0.0 => Ok(total),
        Some(_) => Err(AppError::invariant(format!(
            "source {} hands out no weight",
            source
        ))),
        None => Err(AppError::invariant(format!(
            "source {} missing from contribution totals",
            source
        ))),
    }
}
