//! Explainable score decomposition
//!
//! Splits each node's score into the contributions that produced it.
//! Every contribution is divided by the same per-source total used to
//! build the chain, so a node's contribution scores add up to its score.

use super::chain::{contributor_source, normalizer, Contribution, ContributionTable};
use crate::graph::NodeAddress;
use credrank_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Score per node
pub type NodeDistribution = BTreeMap<NodeAddress, f64>;

/// Decomposition of every node's score
pub type PagerankNodeDecomposition = BTreeMap<NodeAddress, NodeDecomposition>;

/// One contribution resolved against the solved distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredContribution {
    /// Contribution with its weight normalized by the source's total
    pub contribution: Contribution,

    pub source: NodeAddress,
    pub source_score: f64,

    /// `source_score * contribution.weight`
    pub contribution_score: f64,
}

/// A node's score and its sorted breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDecomposition {
    pub score: f64,

    /// Descending by contribution score
    pub scored_contributions: Vec<ScoredContribution>,
}

impl NodeDecomposition {
    /// Sum of all contribution scores; matches `score` up to convergence
    pub fn contribution_total(&self) -> f64 {
        self.scored_contributions
            .iter()
            .map(|scored| scored.contribution_score)
            .sum()
    }
}

/// Pair a distribution with the node each index stands for
pub fn distribution_to_node_distribution(
    node_order: &[NodeAddress],
    pi: &[f64],
) -> Result<NodeDistribution> {
    if node_order.len() != pi.len() {
        return Err(AppError::invariant(format!(
            "{} nodes but distribution of length {}",
            node_order.len(),
            pi.len()
        )));
    }
    Ok(node_order.iter().cloned().zip(pi.iter().copied()).collect())
}

/// Resolve every contribution to its source and score it.
///
/// `scores` must cover every node in `table`.
pub fn decompose(
    scores: &NodeDistribution,
    table: &ContributionTable,
) -> Result<PagerankNodeDecomposition> {
    let totals = table.source_totals()?;
    let score_of = |node: &NodeAddress| {
        scores
            .get(node)
            .copied()
            .ok_or_else(|| AppError::invariant(format!("no score for {}", node)))
    };

    let mut decomposition = PagerankNodeDecomposition::new();
    for (target, contributions) in table.iter() {
        let mut keyed = Vec::with_capacity(contributions.len());
        for contribution in contributions {
            let source = contributor_source(target, &contribution.contributor)?;
            let source_score = score_of(source)?;
            let weight = contribution.weight / normalizer(&totals, source)?;
            let scored = ScoredContribution {
                contribution: Contribution {
                    contributor: contribution.contributor.clone(),
                    weight,
                },
                source: source.clone(),
                source_score,
                contribution_score: source_score * weight,
            };
            keyed.push((contribution.contributor.tie_break_key(), scored));
        }
        keyed.sort_by(|(a_key, a), (b_key, b)| {
            match b.contribution_score.total_cmp(&a.contribution_score) {
                Ordering::Equal => a_key.cmp(b_key),
                other => other,
            }
        });

        decomposition.insert(
            target.clone(),
            NodeDecomposition {
                score: score_of(target)?,
                scored_contributions: keyed.into_iter().map(|(_, scored)| scored).collect(),
            },
        );
    }
    Ok(decomposition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::chain::{create_contributions, Contributor};
    use crate::attribution::weights::EdgeWeight;
    use crate::graph::{Edge, EdgeAddress, Graph};

    fn n(name: &str) -> NodeAddress {
        NodeAddress::from_parts([name])
    }

    /// a -> b with forward 1, backward 0
    fn table() -> ContributionTable {
        let mut graph = Graph::new();
        graph.add_node(n("a")).add_node(n("b"));
        graph
            .add_edge(Edge::new(EdgeAddress::from_parts(["ab"]), n("a"), n("b")))
            .unwrap();
        create_contributions(&graph, &|_: &Edge| EdgeWeight::new(1.0, 0.0), 1e-3).unwrap()
    }

    fn scores(a: f64, b: f64) -> NodeDistribution {
        distribution_to_node_distribution(&[n("a"), n("b")], &[a, b]).unwrap()
    }

    #[test]
    fn test_node_distribution_length_mismatch() {
        let err = distribution_to_node_distribution(&[n("a")], &[0.5, 0.5]).unwrap_err();
        assert_eq!(err.code(), credrank_common::ErrorCode::InvariantViolation);
    }

    #[test]
    fn test_contribution_score_uses_normalized_weight() {
        let decomposition = decompose(&scores(0.2, 0.8), &table()).unwrap();
        let b = &decomposition[&n("b")];
        assert_eq!(b.score, 0.8);

        let via_edge = b
            .scored_contributions
            .iter()
            .find(|scored| matches!(scored.contribution.contributor, Contributor::InEdge { .. }))
            .unwrap();
        assert_eq!(via_edge.source, n("a"));
        assert_eq!(via_edge.source_score, 0.2);
        assert!((via_edge.contribution.weight - 1.0 / 1.001).abs() < 1e-12);
        assert_eq!(
            via_edge.contribution_score,
            via_edge.source_score * via_edge.contribution.weight
        );
    }

    #[test]
    fn test_sorted_descending() {
        let decomposition = decompose(&scores(0.9, 0.1), &table()).unwrap();
        for node in decomposition.values() {
            for pair in node.scored_contributions.windows(2) {
                assert!(pair[0].contribution_score >= pair[1].contribution_score);
            }
        }
        // b's edge contribution outweighs its loop
        let b = &decomposition[&n("b")];
        assert!(matches!(
            b.scored_contributions[0].contribution.contributor,
            Contributor::InEdge { .. }
        ));
    }

    #[test]
    fn test_ties_broken_by_edge_address_then_loop() {
        // both of a's contributions score 0
        let decomposition = decompose(&scores(0.0, 1.0), &table()).unwrap();
        let a = &decomposition[&n("a")];
        assert_eq!(a.scored_contributions.len(), 2);
        assert!(matches!(
            a.scored_contributions[0].contribution.contributor,
            Contributor::OutEdge { .. }
        ));
        assert_eq!(
            a.scored_contributions[1].contribution.contributor,
            Contributor::SyntheticLoop
        );
    }

    #[test]
    fn test_missing_score_is_invariant_error() {
        let partial: NodeDistribution = [(n("a"), 1.0)].into_iter().collect();
        let err = decompose(&partial, &table()).unwrap_err();
        assert_eq!(err.code(), credrank_common::ErrorCode::InvariantViolation);
    }
}
