//! Edge and node weight evaluators
//!
//! An `EdgeEvaluator` decides how much endorsement flows each way along an
//! edge. Node evaluators scale those flows by the weight of the node being
//! endorsed. Prefix tables turn configured weights into evaluators.

use crate::graph::{Edge, EdgeAddress, NodeAddress};
use credrank_common::config::WeightsConfig;
use serde::{Deserialize, Serialize};

/// Endorsement carried by one edge in each direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeWeight {
    /// Flow from src to dst
    pub forward: f64,

    /// Flow from dst to src
    pub backward: f64,
}

impl EdgeWeight {
    pub fn new(forward: f64, backward: f64) -> Self {
        Self { forward, backward }
    }
}

/// Assigns an `EdgeWeight` to every edge
pub trait EdgeEvaluator {
    fn evaluate(&self, edge: &Edge) -> EdgeWeight;
}

impl<F> EdgeEvaluator for F
where
    F: Fn(&Edge) -> EdgeWeight,
{
    fn evaluate(&self, edge: &Edge) -> EdgeWeight {
        self(edge)
    }
}

/// Assigns a weight to every node
pub trait NodeEvaluator {
    fn evaluate(&self, node: &NodeAddress) -> f64;
}

impl<F> NodeEvaluator for F
where
    F: Fn(&NodeAddress) -> f64,
{
    fn evaluate(&self, node: &NodeAddress) -> f64 {
        self(node)
    }
}

/// Scale an edge evaluator by node weights.
///
/// Forward flow endorses the destination, so it is scaled by the
/// destination's weight; backward flow by the source's weight.
pub fn lift_node_evaluator<N, E>(nodes: N, edges: E) -> impl EdgeEvaluator
where
    N: NodeEvaluator,
    E: EdgeEvaluator,
{
    move |edge: &Edge| {
        let EdgeWeight { forward, backward } = edges.evaluate(edge);
        EdgeWeight {
            forward: forward * nodes.evaluate(&edge.dst),
            backward: backward * nodes.evaluate(&edge.src),
        }
    }
}

/// Sum two node evaluators
pub fn compose_node_evaluators<A, B>(first: A, second: B) -> impl NodeEvaluator
where
    A: NodeEvaluator,
    B: NodeEvaluator,
{
    move |node: &NodeAddress| first.evaluate(node) + second.evaluate(node)
}

/// Weight for nodes under a prefix
#[derive(Debug, Clone, PartialEq)]
pub struct NodePrefixWeight {
    pub prefix: NodeAddress,
    pub weight: f64,
}

/// Weight and directionality for edges under a prefix
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePrefixWeight {
    pub prefix: EdgeAddress,
    pub weight: f64,

    /// Share of `weight` flowing forward, in [0, 1]
    pub directionality: f64,
}

/// Node weights by longest matching prefix
#[derive(Debug, Clone)]
pub struct NodeWeightTable {
    entries: Vec<NodePrefixWeight>,
    fallback: f64,
}

/// Edge weights by longest matching prefix
#[derive(Debug, Clone)]
pub struct EdgeWeightTable {
    entries: Vec<EdgePrefixWeight>,
    fallback: EdgeWeight,
}

/// Evaluate nodes by the longest matching prefix, weight 1 if none match
pub fn node_by_prefix(entries: Vec<NodePrefixWeight>) -> NodeWeightTable {
    NodeWeightTable {
        entries: longest_first(entries, |entry| entry.prefix.len()),
        fallback: 1.0,
    }
}

/// Evaluate edges by the longest matching prefix.
///
/// A match yields `directionality * weight` forward and
/// `(1 - directionality) * weight` backward; unmatched edges split a
/// weight of 1 evenly.
pub fn edge_by_prefix(entries: Vec<EdgePrefixWeight>) -> EdgeWeightTable {
    EdgeWeightTable {
        entries: longest_first(entries, |entry| entry.prefix.len()),
        fallback: EdgeWeight::new(0.5, 0.5),
    }
}

// Stable sort keeps the caller's order among equally long prefixes.
fn longest_first<T>(mut entries: Vec<T>, len: impl Fn(&T) -> usize) -> Vec<T> {
    entries.sort_by_key(|entry| std::cmp::Reverse(len(entry)));
    entries
}

impl NodeWeightTable {
    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }
}

impl EdgeWeightTable {
    pub fn with_fallback(mut self, fallback: EdgeWeight) -> Self {
        self.fallback = fallback;
        self
    }
}

impl NodeEvaluator for NodeWeightTable {
    fn evaluate(&self, node: &NodeAddress) -> f64 {
        self.entries
            .iter()
            .find(|entry| node.has_prefix(&entry.prefix))
            .map(|entry| entry.weight)
            .unwrap_or(self.fallback)
    }
}

impl EdgeEvaluator for EdgeWeightTable {
    fn evaluate(&self, edge: &Edge) -> EdgeWeight {
        self.entries
            .iter()
            .find(|entry| edge.address.has_prefix(&entry.prefix))
            .map(|entry| EdgeWeight {
                forward: entry.directionality * entry.weight,
                backward: (1.0 - entry.directionality) * entry.weight,
            })
            .unwrap_or(self.fallback)
    }
}

/// Build the combined evaluator from configured log2 weight tables
pub fn evaluator_from_config(config: &WeightsConfig) -> impl EdgeEvaluator {
    let nodes = node_by_prefix(
        config
            .nodes
            .iter()
            .map(|entry| NodePrefixWeight {
                prefix: NodeAddress::from_parts(entry.prefix.iter().cloned()),
                weight: entry.log_weight.exp2(),
            })
            .collect(),
    );
    let edges = edge_by_prefix(
        config
            .edges
            .iter()
            .map(|entry| EdgePrefixWeight {
                prefix: EdgeAddress::from_parts(entry.prefix.iter().cloned()),
                weight: entry.log_weight.exp2(),
                directionality: entry.directionality,
            })
            .collect(),
    );
    lift_node_evaluator(nodes, edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use credrank_common::config::{EdgeWeightConfig, NodeWeightConfig};

    fn edge(address: &[&str], src: &[&str], dst: &[&str]) -> Edge {
        Edge::new(
            EdgeAddress::from_parts(address.iter().copied()),
            NodeAddress::from_parts(src.iter().copied()),
            NodeAddress::from_parts(dst.iter().copied()),
        )
    }

    #[test]
    fn test_closure_is_evaluator() {
        let evaluator = |_: &Edge| EdgeWeight::new(1.0, 0.0);
        let weight = EdgeEvaluator::evaluate(&evaluator, &edge(&["e"], &["a"], &["b"]));
        assert_eq!(weight, EdgeWeight::new(1.0, 0.0));
    }

    #[test]
    fn test_lift_scales_by_endorsed_node() {
        let nodes = |node: &NodeAddress| if node.parts()[0] == "a" { 2.0 } else { 3.0 };
        let edges = |_: &Edge| EdgeWeight::new(1.0, 1.0);
        let lifted = lift_node_evaluator(nodes, edges);
        let weight = lifted.evaluate(&edge(&["e"], &["a"], &["b"]));
        assert_eq!(weight.forward, 3.0);
        assert_eq!(weight.backward, 2.0);
    }

    #[test]
    fn test_compose_is_additive() {
        let base = |_: &NodeAddress| 1.0;
        let heuristic = |node: &NodeAddress| {
            if node.has_prefix(&NodeAddress::from_parts(["github", "pull"])) {
                4.0
            } else {
                0.0
            }
        };
        let composed = compose_node_evaluators(base, heuristic);
        assert_eq!(composed.evaluate(&NodeAddress::from_parts(["github", "pull", "7"])), 5.0);
        assert_eq!(composed.evaluate(&NodeAddress::from_parts(["github", "issue", "7"])), 1.0);
    }

    #[test]
    fn test_node_by_prefix_longest_match_wins() {
        let table = node_by_prefix(vec![
            NodePrefixWeight { prefix: NodeAddress::from_parts(["git"]), weight: 2.0 },
            NodePrefixWeight { prefix: NodeAddress::from_parts(["git", "commit"]), weight: 8.0 },
        ]);
        assert_eq!(table.evaluate(&NodeAddress::from_parts(["git", "commit", "a"])), 8.0);
        assert_eq!(table.evaluate(&NodeAddress::from_parts(["git", "blob", "a"])), 2.0);
        assert_eq!(table.evaluate(&NodeAddress::from_parts(["github", "issue"])), 1.0);

        let strict = table.with_fallback(0.0);
        assert_eq!(strict.evaluate(&NodeAddress::from_parts(["github", "issue"])), 0.0);
    }

    #[test]
    fn test_edge_by_prefix_directionality() {
        let table = edge_by_prefix(vec![EdgePrefixWeight {
            prefix: EdgeAddress::from_parts(["github", "authors"]),
            weight: 4.0,
            directionality: 0.25,
        }]);
        let authored = table.evaluate(&edge(&["github", "authors", "1"], &["u"], &["i"]));
        assert_eq!(authored, EdgeWeight::new(1.0, 3.0));

        let other = table.evaluate(&edge(&["git", "hasParent", "1"], &["a"], &["b"]));
        assert_eq!(other, EdgeWeight::new(0.5, 0.5));
    }

    #[test]
    fn test_evaluator_from_config_uses_log2_weights() {
        let config = WeightsConfig {
            nodes: vec![NodeWeightConfig {
                prefix: vec!["git".into(), "commit".into()],
                log_weight: 1.0,
            }],
            edges: vec![EdgeWeightConfig {
                prefix: vec!["git".into(), "hasParent".into()],
                log_weight: 2.0,
                directionality: 1.0,
            }],
        };
        let evaluator = evaluator_from_config(&config);
        let weight = evaluator.evaluate(&edge(
            &["git", "hasParent", "x"],
            &["git", "commit", "x"],
            &["git", "commit", "y"],
        ));
        assert_eq!(weight.forward, 8.0);
        assert_eq!(weight.backward, 0.0);
    }
}
