use proptest::prelude::*;
use relstat_core::table::RawEdge;
use relstat_core::universe::NodeUniverse;
use std::collections::HashMap;

/// Identifier drawn from a small pool so duplicate pairs, shared endpoints,
/// and out-of-universe ids all occur with useful frequency. `A*` ids live in
/// the source universe, `B*` in the target universe, `X*` in neither.
pub fn arb_id() -> impl Strategy<Value = String> + Clone {
    prop_oneof![
        (0u8..6).prop_map(|i| format!("A{i}")),
        (0u8..6).prop_map(|i| format!("B{i}")),
        (0u8..3).prop_map(|i| format!("X{i}")),
    ]
}

pub fn arb_raw_edge() -> impl Strategy<Value = RawEdge> + Clone {
    (arb_id(), arb_id()).prop_map(|(left, right)| RawEdge::new(left, right))
}

pub fn arb_raw_edges() -> impl Strategy<Value = Vec<RawEdge>> + Clone {
    prop::collection::vec(arb_raw_edge(), 0..48)
}

/// The universes matching [`arb_id`]'s pools.
#[must_use]
pub fn pool_universes() -> (NodeUniverse, NodeUniverse) {
    (
        NodeUniverse::from_ids((0u8..6).map(|i| format!("A{i}"))),
        NodeUniverse::from_ids((0u8..6).map(|i| format!("B{i}"))),
    )
}

/// Arbitrary degree map, for properties over the classifier alone.
pub fn arb_degree_map() -> impl Strategy<Value = HashMap<String, u64>> + Clone {
    prop::collection::hash_map(arb_id(), 1u64..5, 0..12)
}
