//! Edge orientation.
//!
//! Raw dumps do not reliably put the conceptual source in the first column,
//! so universe membership is the only trustworthy signal. Each raw pair is
//! classified independently against the two universes; when no combination
//! matches, the pair passes through unchanged and is flagged rather than
//! dropped or guessed at. Ambiguity is reported data, not an error.

use serde::Serialize;

use crate::table::RawEdge;
use crate::universe::NodeUniverse;

/// How a raw pair was resolved into (source, target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// The pair matched as written: left is the source, right the target.
    Forward,
    /// The pair matched after swapping its elements.
    Swapped,
    /// Neither combination matched; the pair kept its original roles.
    Ambiguous,
}

/// A pair with its source/target roles decided (or flagged undecidable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrientedEdge {
    pub source: String,
    pub target: String,
    pub orientation: Orientation,
}

impl OrientedEdge {
    /// Whether orientation could not be determined for this edge.
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        matches!(self.orientation, Orientation::Ambiguous)
    }
}

/// Resolve roles for every raw edge, order-preserving.
///
/// Every input edge yields exactly one output edge; nothing is dropped.
/// When both elements would match both universes (possible when the
/// universes overlap), the as-written orientation wins.
#[must_use]
pub fn orient_edges(
    raw: &[RawEdge],
    source_universe: &NodeUniverse,
    target_universe: &NodeUniverse,
) -> Vec<OrientedEdge> {
    raw.iter()
        .map(|edge| orient_edge(edge, source_universe, target_universe))
        .collect()
}

fn orient_edge(
    edge: &RawEdge,
    source_universe: &NodeUniverse,
    target_universe: &NodeUniverse,
) -> OrientedEdge {
    if source_universe.contains(&edge.left) && target_universe.contains(&edge.right) {
        OrientedEdge {
            source: edge.left.clone(),
            target: edge.right.clone(),
            orientation: Orientation::Forward,
        }
    } else if source_universe.contains(&edge.right) && target_universe.contains(&edge.left) {
        OrientedEdge {
            source: edge.right.clone(),
            target: edge.left.clone(),
            orientation: Orientation::Swapped,
        }
    } else {
        OrientedEdge {
            source: edge.left.clone(),
            target: edge.right.clone(),
            orientation: Orientation::Ambiguous,
        }
    }
}
