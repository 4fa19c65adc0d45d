//! Plain text and JSON rendering of PageRank results

use credrank_core::attribution::{Contributor, NodeDecomposition, PagerankNodeDecomposition, ScoredContribution};
use credrank_core::NodeAddress;
use serde::Serialize;
use std::fmt::Write;

/// Parse a `/`-separated node address; an empty string is the root address
pub fn parse_address(input: &str) -> NodeAddress {
    if input.is_empty() {
        NodeAddress::empty()
    } else {
        NodeAddress::from_parts(input.split('/'))
    }
}

/// `/`-joined parts, the inverse of `parse_address`
pub fn format_address(address: &NodeAddress) -> String {
    address.parts().join("/")
}

/// Score on a log scale, `ln(score) + offset`, two decimals
pub fn display_score(score: f64, offset: f64) -> String {
    format!("{:.2}", score.ln() + offset)
}

/// Short label for how a contribution reaches its node
pub fn contribution_verb(contributor: &Contributor) -> &'static str {
    match contributor {
        Contributor::InEdge { .. } => "IN",
        Contributor::OutEdge { .. } => "OUT",
        Contributor::SyntheticLoop => "[synthetic loop]",
    }
}

/// Nodes under `prefix`, highest score first, at most `limit`
pub fn ranked<'a>(
    decomposition: &'a PagerankNodeDecomposition,
    prefix: &NodeAddress,
    limit: usize,
) -> Vec<(&'a NodeAddress, &'a NodeDecomposition)> {
    let mut rows: Vec<_> = decomposition
        .iter()
        .filter(|(node, _)| node.has_prefix(prefix))
        .collect();
    // stable sort keeps address order among equal scores
    rows.sort_by(|(_, a), (_, b)| b.score.total_cmp(&a.score));
    rows.truncate(limit);
    rows
}

/// Ranked table, one node per line
pub fn render_ranking(rows: &[(&NodeAddress, &NodeDecomposition)], offset: f64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>8}  NODE", "SCORE");
    for (node, decomposition) in rows {
        let _ = writeln!(
            out,
            "{:>8}  {}",
            display_score(decomposition.score, offset),
            format_address(node)
        );
    }
    out
}

/// Breakdown of one node's score, strongest contribution first
pub fn render_explanation(
    node: &NodeAddress,
    decomposition: &NodeDecomposition,
    limit: usize,
    offset: f64,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  score {}",
        format_address(node),
        display_score(decomposition.score, offset)
    );
    let _ = writeln!(
        out,
        "{:>8}  {:>8}  {:<16}  {:<24}  SOURCE",
        "CONTRIB", "SOURCE", "VERB", "EDGE"
    );
    for scored in decomposition.scored_contributions.iter().take(limit) {
        let _ = writeln!(out, "{}", explanation_row(scored, offset));
    }
    let hidden = decomposition.scored_contributions.len().saturating_sub(limit);
    if hidden > 0 {
        let _ = writeln!(out, "... {} more", hidden);
    }
    out
}

fn explanation_row(scored: &ScoredContribution, offset: f64) -> String {
    let contributor = &scored.contribution.contributor;
    let edge = match contributor {
        Contributor::InEdge { edge } | Contributor::OutEdge { edge } => edge.address.parts().join("/"),
        Contributor::SyntheticLoop => String::new(),
    };
    format!(
        "{:>8}  {:>8}  {:<16}  {:<24}  {}",
        display_score(scored.contribution_score, offset),
        display_score(scored.source_score, offset),
        contribution_verb(contributor),
        edge,
        format_address(&scored.source)
    )
}

/// One node of the JSON report
#[derive(Debug, Serialize)]
pub struct NodeReport<'a> {
    pub node: &'a NodeAddress,
    pub score: f64,
    pub scored_contributions: &'a [ScoredContribution],
}

/// JSON document for the ranked nodes.
///
/// Node addresses are arrays, so the report is a list of entries rather
/// than an object keyed by address.
pub fn json_report(rows: &[(&NodeAddress, &NodeDecomposition)]) -> serde_json::Result<String> {
    let entries: Vec<NodeReport<'_>> = rows
        .iter()
        .map(|(node, decomposition)| NodeReport {
            node,
            score: decomposition.score,
            scored_contributions: &decomposition.scored_contributions,
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use credrank_core::attribution::Contribution;
    use credrank_core::{Edge, EdgeAddress};

    fn node(path: &str) -> NodeAddress {
        parse_address(path)
    }

    fn decomposition_with(score: f64) -> NodeDecomposition {
        NodeDecomposition {
            score,
            scored_contributions: Vec::new(),
        }
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(node("git/commit/abc").parts(), &["git", "commit", "abc"]);
        assert!(node("").is_empty());
        assert_eq!(format_address(&node("a/b")), "a/b");
    }

    #[test]
    fn test_display_score() {
        assert_eq!(display_score(1.0, 10.0), "10.00");
        assert_eq!(display_score(std::f64::consts::E, 0.0), "1.00");
        assert_eq!(display_score(0.5, 10.0), "9.31");
    }

    #[test]
    fn test_ranked_filters_sorts_and_limits() {
        let mut decomposition = PagerankNodeDecomposition::new();
        decomposition.insert(node("git/a"), decomposition_with(0.1));
        decomposition.insert(node("git/b"), decomposition_with(0.5));
        decomposition.insert(node("github/c"), decomposition_with(0.4));

        let all = ranked(&decomposition, &NodeAddress::empty(), 10);
        let order: Vec<String> = all.iter().map(|(n, _)| format_address(n)).collect();
        assert_eq!(order, vec!["git/b", "github/c", "git/a"]);

        let git = ranked(&decomposition, &node("git"), 10);
        assert_eq!(git.len(), 2);

        let top = ranked(&decomposition, &NodeAddress::empty(), 1);
        assert_eq!(format_address(top[0].0), "git/b");
    }

    #[test]
    fn test_render_explanation() {
        let edge = Edge::new(EdgeAddress::from_parts(["e", "1"]), node("a"), node("b"));
        let scored = |contributor, contribution_score| ScoredContribution {
            contribution: Contribution {
                contributor,
                weight: 1.0,
            },
            source: node("a"),
            source_score: 0.5,
            contribution_score,
        };
        let decomposition = NodeDecomposition {
            score: 0.5,
            scored_contributions: vec![
                scored(Contributor::InEdge { edge }, 0.4),
                scored(Contributor::SyntheticLoop, 0.1),
            ],
        };
        let text = render_explanation(&node("b"), &decomposition, 1, 10.0);
        assert!(text.starts_with("b  score 9.31"));
        assert!(text.contains("IN"));
        assert!(text.contains("e/1"));
        assert!(!text.contains("[synthetic loop]"));
        assert!(text.contains("... 1 more"));
    }

    #[test]
    fn test_json_report_is_a_list() {
        let mut decomposition = PagerankNodeDecomposition::new();
        decomposition.insert(node("x/y"), decomposition_with(1.0));
        let rows = ranked(&decomposition, &NodeAddress::empty(), 10);
        let json: serde_json::Value = serde_json::from_str(&json_report(&rows).unwrap()).unwrap();
        assert_eq!(json[0]["node"], serde_json::json!(["x", "y"]));
        assert_eq!(json[0]["score"], 1.0);
    }

    #[test]
    fn test_verbs() {
        assert_eq!(contribution_verb(&Contributor::SyntheticLoop), "[synthetic loop]");
    }
}
