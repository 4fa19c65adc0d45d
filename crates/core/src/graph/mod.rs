//! Addressable graph representation
//!
//! Nodes and edges keyed by hierarchical addresses. Provides prefix
//! filtered iteration and directional neighbor lookup over in-memory
//! adjacency indices.

mod address;

pub use address::{Address, AddressKind, EdgeAddress, EdgeKind, NodeAddress, NodeKind};

use credrank_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Bound;

/// Edge in the graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Unique edge address
    pub address: EdgeAddress,

    /// Source node
    pub src: NodeAddress,

    /// Destination node
    pub dst: NodeAddress,
}

impl Edge {
    pub fn new(address: EdgeAddress, src: NodeAddress, dst: NodeAddress) -> Self {
        Self { address, src, dst }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} -> {})", self.address, self.src, self.dst)
    }
}

/// Direction for neighbor lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Edges whose destination is the node
    In,
    /// Edges whose source is the node
    Out,
    /// Both directions
    Both,
}

/// Filters for neighbor lookup
#[derive(Debug, Clone)]
pub struct NeighborsOptions {
    pub direction: Direction,
    pub node_prefix: NodeAddress,
    pub edge_prefix: EdgeAddress,
}

impl NeighborsOptions {
    /// Match every neighbor in `direction`
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            node_prefix: NodeAddress::empty(),
            edge_prefix: EdgeAddress::empty(),
        }
    }

    pub fn with_node_prefix(mut self, prefix: NodeAddress) -> Self {
        self.node_prefix = prefix;
        self
    }

    pub fn with_edge_prefix(mut self, prefix: EdgeAddress) -> Self {
        self.edge_prefix = prefix;
        self
    }
}

/// A node adjacent to the queried node, with the edge joining them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor<'a> {
    pub node: &'a NodeAddress,
    pub edge: &'a Edge,
}

/// Conjunction of prefix filters over edges
#[derive(Debug, Clone, Default)]
pub struct EdgeFilter {
    pub address_prefix: EdgeAddress,
    pub src_prefix: NodeAddress,
    pub dst_prefix: NodeAddress,
}

impl EdgeFilter {
    pub fn with_address_prefix(mut self, prefix: EdgeAddress) -> Self {
        self.address_prefix = prefix;
        self
    }

    pub fn with_src_prefix(mut self, prefix: NodeAddress) -> Self {
        self.src_prefix = prefix;
        self
    }

    pub fn with_dst_prefix(mut self, prefix: NodeAddress) -> Self {
        self.dst_prefix = prefix;
        self
    }

    fn matches(&self, edge: &Edge) -> bool {
        edge.address.has_prefix(&self.address_prefix)
            && edge.src.has_prefix(&self.src_prefix)
            && edge.dst.has_prefix(&self.dst_prefix)
    }
}

/// In-memory addressable graph.
///
/// Iteration order everywhere is address order, so every enumeration is
/// deterministic for a fixed graph state and can be restarted freely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "GraphJson", try_from = "GraphJson")]
pub struct Graph {
    /// All nodes
    nodes: BTreeSet<NodeAddress>,

    /// All edges by address
    edges: BTreeMap<EdgeAddress, Edge>,

    /// Reverse adjacency: node -> edges whose destination it is
    in_edges: BTreeMap<NodeAddress, BTreeSet<EdgeAddress>>,

    /// Adjacency: node -> edges whose source it is
    out_edges: BTreeMap<NodeAddress, BTreeSet<EdgeAddress>>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; adding an existing node is a no-op
    pub fn add_node(&mut self, address: NodeAddress) -> &mut Self {
        self.nodes.insert(address);
        self
    }

    /// Add an edge.
    ///
    /// Re-adding an identical edge is a no-op. Fails with `AddressConflict`
    /// if the address is taken by an edge with different endpoints, and
    /// with `MissingEndpoint` if either endpoint is absent.
    pub fn add_edge(&mut self, edge: Edge) -> Result<&mut Self> {
        if let Some(existing) = self.edges.get(&edge.address) {
            if *existing == edge {
                return Ok(self);
            }
            return Err(AppError::AddressConflict {
                address: edge.address.to_string(),
                existing: existing.to_string(),
                attempted: edge.to_string(),
            });
        }
        for endpoint in [&edge.src, &edge.dst] {
            if !self.nodes.contains(endpoint) {
                return Err(AppError::MissingEndpoint {
                    edge: edge.to_string(),
                    endpoint: endpoint.to_string(),
                });
            }
        }

        self.in_edges
            .entry(edge.dst.clone())
            .or_default()
            .insert(edge.address.clone());
        self.out_edges
            .entry(edge.src.clone())
            .or_default()
            .insert(edge.address.clone());
        self.edges.insert(edge.address.clone(), edge);
        Ok(self)
    }

    /// Remove an edge, returning it if it was present
    pub fn remove_edge(&mut self, address: &EdgeAddress) -> Option<Edge> {
        let edge = self.edges.remove(address)?;
        detach(&mut self.in_edges, &edge.dst, address);
        detach(&mut self.out_edges, &edge.src, address);
        Some(edge)
    }

    /// Remove a node, returning whether it was present.
    ///
    /// Fails with `DanglingEdge` while any edge still references the node.
    pub fn remove_node(&mut self, address: &NodeAddress) -> Result<bool> {
        let incident = self
            .in_edges
            .get(address)
            .into_iter()
            .chain(self.out_edges.get(address))
            .flatten()
            .next();
        if let Some(edge) = incident {
            return Err(AppError::DanglingEdge {
                node: address.to_string(),
                edge: edge.to_string(),
            });
        }
        Ok(self.nodes.remove(address))
    }

    pub fn has_node(&self, address: &NodeAddress) -> bool {
        self.nodes.contains(address)
    }

    pub fn has_edge(&self, address: &EdgeAddress) -> bool {
        self.edges.contains_key(address)
    }

    /// Get an edge by address
    pub fn edge(&self, address: &EdgeAddress) -> Option<&Edge> {
        self.edges.get(address)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &NodeAddress> + '_ {
        self.nodes.iter()
    }

    /// Get nodes under `prefix`
    pub fn nodes_with_prefix<'a>(
        &'a self,
        prefix: &'a NodeAddress,
    ) -> impl Iterator<Item = &'a NodeAddress> + 'a {
        self.nodes
            .range((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |address| address.has_prefix(prefix))
    }

    /// Get all edges
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.values()
    }

    /// Get edges matching every prefix in `filter`
    pub fn edges_matching(&self, filter: EdgeFilter) -> impl Iterator<Item = &Edge> + '_ {
        self.edges
            .range(filter.address_prefix.clone()..)
            .map(|(_, edge)| edge)
            .take_while({
                let prefix = filter.address_prefix.clone();
                move |edge| edge.address.has_prefix(&prefix)
            })
            .filter(move |edge| filter.matches(edge))
    }

    /// Get the neighbors of `node`.
    ///
    /// `Direction::In` follows edges whose destination is `node`,
    /// `Direction::Out` edges whose source is `node`. With
    /// `Direction::Both` a loop edge is reported once.
    pub fn neighbors<'a>(
        &'a self,
        node: &NodeAddress,
        options: NeighborsOptions,
    ) -> Result<impl Iterator<Item = Neighbor<'a>> + 'a> {
        if !self.has_node(node) {
            return Err(AppError::NodeNotFound {
                address: node.to_string(),
            });
        }
        let direction = options.direction;

        let incoming = self
            .in_edges
            .get(node)
            .filter(|_| direction != Direction::Out)
            .into_iter()
            .flatten()
            .filter_map(move |address| self.edges.get(address))
            .map(|edge| Neighbor { node: &edge.src, edge });

        let outgoing = self
            .out_edges
            .get(node)
            .filter(|_| direction != Direction::In)
            .into_iter()
            .flatten()
            .filter_map(move |address| self.edges.get(address))
            .filter(move |edge| direction != Direction::Both || edge.src != edge.dst)
            .map(|edge| Neighbor { node: &edge.dst, edge });

        Ok(incoming.chain(outgoing).filter(move |neighbor| {
            neighbor.node.has_prefix(&options.node_prefix)
                && neighbor.edge.address.has_prefix(&options.edge_prefix)
        }))
    }

    /// Merge several graphs into one.
    ///
    /// Nodes are unioned; edges follow `add_edge` semantics, so two graphs
    /// holding different edges under one address fail with `AddressConflict`.
    pub fn merge<'a, I>(graphs: I) -> Result<Graph>
    where
        I: IntoIterator<Item = &'a Graph>,
    {
        let graphs: Vec<&Graph> = graphs.into_iter().collect();
        let mut merged = Graph::new();
        for graph in &graphs {
            for node in graph.nodes() {
                merged.add_node(node.clone());
            }
        }
        for graph in &graphs {
            for edge in graph.edges() {
                merged.add_edge(edge.clone())?;
            }
        }
        Ok(merged)
    }

    /// Check the adjacency indices against the node and edge sets.
    ///
    /// Mutators keep the indices consistent, so a failure here is an
    /// internal defect.
    pub fn validate(&self) -> Result<()> {
        for edge in self.edges.values() {
            for endpoint in [&edge.src, &edge.dst] {
                if !self.nodes.contains(endpoint) {
                    return Err(AppError::invariant(format!(
                        "edge {} references absent node {}",
                        edge, endpoint
                    )));
                }
            }
            let indexed_in = self
                .in_edges
                .get(&edge.dst)
                .is_some_and(|set| set.contains(&edge.address));
            let indexed_out = self
                .out_edges
                .get(&edge.src)
                .is_some_and(|set| set.contains(&edge.address));
            if !indexed_in || !indexed_out {
                return Err(AppError::invariant(format!(
                    "edge {} missing from adjacency indices",
                    edge
                )));
            }
        }

        check_index(&self.in_edges, &self.edges, self.edges.len(), |edge| &edge.dst)?;
        check_index(&self.out_edges, &self.edges, self.edges.len(), |edge| &edge.src)?;
        Ok(())
    }
}

fn detach(
    index: &mut BTreeMap<NodeAddress, BTreeSet<EdgeAddress>>,
    node: &NodeAddress,
    address: &EdgeAddress,
) {
    if let Some(set) = index.get_mut(node) {
        set.remove(address);
        if set.is_empty() {
            index.remove(node);
        }
    }
}

fn check_index(
    index: &BTreeMap<NodeAddress, BTreeSet<EdgeAddress>>,
    edges: &BTreeMap<EdgeAddress, Edge>,
    expected: usize,
    endpoint: impl Fn(&Edge) -> &NodeAddress,
) -> Result<()> {
    let mut seen = 0;
    for (node, addresses) in index {
        if addresses.is_empty() {
            return Err(AppError::invariant(format!(
                "empty adjacency entry for {}",
                node
            )));
        }
        for address in addresses {
            match edges.get(address) {
                Some(edge) if endpoint(edge) == node => seen += 1,
                Some(edge) => {
                    return Err(AppError::invariant(format!(
                        "edge {} indexed under wrong node {}",
                        edge, node
                    )))
                }
                None => {
                    return Err(AppError::invariant(format!(
                        "adjacency entry for {} names absent edge {}",
                        node, address
                    )))
                }
            }
        }
    }
    if seen != expected {
        return Err(AppError::invariant(format!(
            "adjacency index holds {} edges, graph holds {}",
            seen, expected
        )));
    }
    Ok(())
}

/// Serialized form of a graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphJson {
    pub nodes: Vec<NodeAddress>,
    pub edges: Vec<Edge>,
}

impl From<Graph> for GraphJson {
    fn from(graph: Graph) -> Self {
        Self {
            nodes: graph.nodes.into_iter().collect(),
            edges: graph.edges.into_values().collect(),
        }
    }
}

impl TryFrom<GraphJson> for Graph {
    type Error = AppError;

    /// Rebuild through `add_node`/`add_edge` so malformed input is rejected
    fn try_from(json: GraphJson) -> Result<Self> {
        let mut graph = Graph::new();
        for node in json.nodes {
            graph.add_node(node);
        }
        for edge in json.edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }
}
