//! Statistics aggregation over an oriented edge list.
//!
//! Everything here is a pure fold: degree maps, the pair multiset for
//! duplicate accounting, per-side summaries, and the cardinality label are
//! built as local accumulators and returned as immutable results.
//!
//! # Invariants
//!
//! - `total_edges == unique_pairs + duplicate_edges`.
//! - Σ source-degree values == Σ target-degree values == `total_edges`.
//! - An identifier with no edges has no degree-map entry (absence, not zero).
//! - Empty degree maps summarize as min 0 / max 0 / avg 0.0, never NaN.

use std::collections::HashMap;

use serde::Serialize;

use crate::orient::OrientedEdge;

/// Edge-level counters for the report's `edges` object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EdgeCounts {
    pub total_edges: u64,
    pub unique_pairs: u64,
    pub duplicate_edges: u64,
    pub pairs_with_duplicates: u64,
    pub ambiguous_pairs: u64,
}

/// Degree distribution summary for one side of the relation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideSummary {
    #[serde(rename = "type")]
    pub node_type: String,
    pub total_nodes: u64,
    pub connected_nodes: u64,
    pub degree_min: u64,
    pub degree_max: u64,
    pub degree_avg: f64,
}

/// Maximal fan-out shape of the relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    Empty,
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Cardinality {
    /// The label used in report JSON and human output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::OneToOne => "one-to-one",
            Self::OneToMany => "one-to-many",
            Self::ManyToOne => "many-to-one",
            Self::ManyToMany => "many-to-many",
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The final report document, serialized as-is to JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationStatsReport {
    pub snapshot: String,
    pub relation_name: String,
    pub source_type: String,
    pub target_type: String,
    pub edges: EdgeCounts,
    pub source: SideSummary,
    pub target: SideSummary,
    pub cardinality: Cardinality,
}

/// Per-side degree maps: identifier → number of edges it appears in, in the
/// source role (`.0`) and target role (`.1`). Ambiguous edges contribute
/// under their unchanged left/right roles.
#[must_use]
pub fn degree_maps(edges: &[OrientedEdge]) -> (HashMap<String, u64>, HashMap<String, u64>) {
    let mut source_degrees: HashMap<String, u64> = HashMap::new();
    let mut target_degrees: HashMap<String, u64> = HashMap::new();
    for edge in edges {
        *source_degrees.entry(edge.source.clone()).or_insert(0) += 1;
        *target_degrees.entry(edge.target.clone()).or_insert(0) += 1;
    }
    (source_degrees, target_degrees)
}

/// Edge counters from the pair multiset and the ambiguity flags.
#[must_use]
pub fn edge_counts(edges: &[OrientedEdge]) -> EdgeCounts {
    let mut pair_counts: HashMap<(&str, &str), u64> = HashMap::new();
    let mut ambiguous_pairs = 0_u64;
    for edge in edges {
        *pair_counts
            .entry((edge.source.as_str(), edge.target.as_str()))
            .or_insert(0) += 1;
        if edge.is_ambiguous() {
            ambiguous_pairs += 1;
        }
    }

    let unique_pairs = pair_counts.len() as u64;
    let duplicate_edges = pair_counts.values().filter(|&&c| c > 1).map(|c| c - 1).sum();
    let pairs_with_duplicates = pair_counts.values().filter(|&&c| c > 1).count() as u64;

    EdgeCounts {
        total_edges: edges.len() as u64,
        unique_pairs,
        duplicate_edges,
        pairs_with_duplicates,
        ambiguous_pairs,
    }
}

/// Summarize one side's degree distribution.
///
/// `total_nodes` is the universe size for that side, independent of edge
/// participation. An empty degree map reports min 0, max 0, avg 0.0.
#[must_use]
pub fn summarize_side(
    node_type: &str,
    total_nodes: usize,
    degrees: &HashMap<String, u64>,
) -> SideSummary {
    let (degree_min, degree_max, degree_avg) = if degrees.is_empty() {
        (0, 0, 0.0)
    } else {
        let min = degrees.values().copied().min().unwrap_or(0);
        let max = degrees.values().copied().max().unwrap_or(0);
        #[allow(clippy::cast_precision_loss)]
        let avg = degrees.values().sum::<u64>() as f64 / degrees.len() as f64;
        (min, max, avg)
    };

    SideSummary {
        node_type: node_type.to_string(),
        total_nodes: total_nodes as u64,
        connected_nodes: degrees.len() as u64,
        degree_min,
        degree_max,
        degree_avg,
    }
}

/// Classify the relation's cardinality from the worst-case fan-out per side.
///
/// A single node with degree > 1 on a side disqualifies a "one"
/// classification for that side; averages play no part.
#[must_use]
pub fn classify_cardinality(
    source_degrees: &HashMap<String, u64>,
    target_degrees: &HashMap<String, u64>,
) -> Cardinality {
    if source_degrees.is_empty() && target_degrees.is_empty() {
        return Cardinality::Empty;
    }

    let source_max = source_degrees.values().copied().max().unwrap_or(0);
    let target_max = target_degrees.values().copied().max().unwrap_or(0);

    match (source_max > 1, target_max > 1) {
        (false, false) => Cardinality::OneToOne,
        (true, false) => Cardinality::OneToMany,
        (false, true) => Cardinality::ManyToOne,
        (true, true) => Cardinality::ManyToMany,
    }
}

/// Assemble the full report from the oriented edge list and universe sizes.
#[must_use]
pub fn compute_report(
    snapshot: &str,
    relation_name: &str,
    source_type: &str,
    target_type: &str,
    edges: &[OrientedEdge],
    source_total_nodes: usize,
    target_total_nodes: usize,
) -> RelationStatsReport {
    let (source_degrees, target_degrees) = degree_maps(edges);

    RelationStatsReport {
        snapshot: snapshot.to_string(),
        relation_name: relation_name.to_string(),
        source_type: source_type.to_string(),
        target_type: target_type.to_string(),
        edges: edge_counts(edges),
        source: summarize_side(source_type, source_total_nodes, &source_degrees),
        target: summarize_side(target_type, target_total_nodes, &target_degrees),
        cardinality: classify_cardinality(&source_degrees, &target_degrees),
    }
}

#[cfg(test)]
mod tests {
    use super::{Cardinality, classify_cardinality, compute_report, degree_maps, edge_counts};
    use crate::orient::orient_edges;
    use crate::table::RawEdge;
    use crate::universe::NodeUniverse;
    use std::collections::HashMap;

    fn degrees(pairs: &[(&str, u64)]) -> HashMap<String, u64> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn one_to_many_scenario() {
        let src = NodeUniverse::from_ids(["A1", "A2"]);
        let tgt = NodeUniverse::from_ids(["B1", "B2", "B3"]);
        let raw = vec![
            RawEdge::new("A1", "B1"),
            RawEdge::new("A1", "B2"),
            RawEdge::new("B3", "A1"),
        ];
        let edges = orient_edges(&raw, &src, &tgt);
        let report = compute_report("2025-11-10", "A_uses_B", "A", "B", &edges, src.len(), tgt.len());

        let (src_deg, tgt_deg) = degree_maps(&edges);
        assert_eq!(src_deg, degrees(&[("A1", 3)]));
        assert_eq!(tgt_deg, degrees(&[("B1", 1), ("B2", 1), ("B3", 1)]));

        assert_eq!(report.edges.total_edges, 3);
        assert_eq!(report.edges.unique_pairs, 3);
        assert_eq!(report.edges.duplicate_edges, 0);
        assert_eq!(report.edges.ambiguous_pairs, 0);
        assert_eq!(report.cardinality, Cardinality::OneToMany);
        assert_eq!(report.source.total_nodes, 2);
        assert_eq!(report.source.connected_nodes, 1);
        assert_eq!(report.target.connected_nodes, 3);
    }

    #[test]
    fn duplicate_pair_accounting() {
        let src = NodeUniverse::from_ids(["A1"]);
        let tgt = NodeUniverse::from_ids(["B1"]);
        let raw = vec![RawEdge::new("A1", "B1"), RawEdge::new("A1", "B1")];
        let edges = orient_edges(&raw, &src, &tgt);
        let counts = edge_counts(&edges);

        assert_eq!(counts.total_edges, 2);
        assert_eq!(counts.unique_pairs, 1);
        assert_eq!(counts.duplicate_edges, 1);
        assert_eq!(counts.pairs_with_duplicates, 1);
        assert_eq!(counts.total_edges, counts.unique_pairs + counts.duplicate_edges);
    }

    #[test]
    fn ambiguous_edges_still_count_everywhere() {
        let src = NodeUniverse::from_ids(["A1"]);
        let tgt = NodeUniverse::from_ids(["B1"]);
        let raw = vec![RawEdge::new("X9", "Y9")];
        let edges = orient_edges(&raw, &src, &tgt);
        let counts = edge_counts(&edges);
        let (src_deg, tgt_deg) = degree_maps(&edges);

        assert_eq!(counts.ambiguous_pairs, 1);
        assert_eq!(counts.total_edges, 1);
        assert_eq!(src_deg.get("X9"), Some(&1));
        assert_eq!(tgt_deg.get("Y9"), Some(&1));
    }

    #[test]
    fn empty_edge_list_summaries() {
        let report = compute_report("2025-11-10", "R", "A", "B", &[], 5, 7);
        assert_eq!(report.cardinality, Cardinality::Empty);
        for side in [&report.source, &report.target] {
            assert_eq!(side.connected_nodes, 0);
            assert_eq!(side.degree_min, 0);
            assert_eq!(side.degree_max, 0);
            assert!(side.degree_avg.abs() < f64::EPSILON);
        }
        // Universe sizes are reported even with no edges.
        assert_eq!(report.source.total_nodes, 5);
        assert_eq!(report.target.total_nodes, 7);
    }

    #[test]
    fn cardinality_table() {
        let empty = HashMap::new();
        assert_eq!(classify_cardinality(&empty, &empty), Cardinality::Empty);
        assert_eq!(
            classify_cardinality(&degrees(&[("a", 1)]), &degrees(&[("b", 1)])),
            Cardinality::OneToOne
        );
        assert_eq!(
            classify_cardinality(&degrees(&[("a", 2)]), &degrees(&[("b", 1), ("c", 1)])),
            Cardinality::OneToMany
        );
        assert_eq!(
            classify_cardinality(&degrees(&[("a", 1), ("b", 1)]), &degrees(&[("c", 2)])),
            Cardinality::ManyToOne
        );
        assert_eq!(
            classify_cardinality(&degrees(&[("a", 2)]), &degrees(&[("c", 2)])),
            Cardinality::ManyToMany
        );
    }

    #[test]
    fn cardinality_serializes_as_kebab_labels() {
        let json = serde_json::to_string(&Cardinality::OneToMany).expect("serializable");
        assert_eq!(json, "\"one-to-many\"");
        assert_eq!(Cardinality::ManyToMany.to_string(), "many-to-many");
    }

    #[test]
    fn report_json_shape_matches_contract() {
        let report = compute_report("2025-11-10", "R", "A", "B", &[], 0, 0);
        let value = serde_json::to_value(&report).expect("serializable");
        for key in [
            "snapshot",
            "relation_name",
            "source_type",
            "target_type",
            "edges",
            "source",
            "target",
            "cardinality",
        ] {
            assert!(value.get(key).is_some(), "missing top-level key {key}");
        }
        assert_eq!(value["cardinality"], "empty");
        assert_eq!(value["source"]["type"], "A");
        assert_eq!(value["edges"]["total_edges"], 0);
    }
}
