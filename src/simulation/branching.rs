// SPDX-License-Identifier: MIT

//! Outgoing edge selection
//!
//! Gateways take the first edge, in array order, whose condition is truthy.
//! When no condition holds the edge flagged as default is taken. There is no
//! priority ordering beyond array position.

use serde_json::Value;

use crate::expression::{self, truthy, Variables};
use crate::graph::{EdgeConfig, NodeConfig};

/// Whether the edge's condition holds. An edge without a condition never
/// matches.
pub fn condition_holds(edge: &EdgeConfig, variables: &Variables) -> bool {
    match edge.condition() {
        None => false,
        Some(Value::String(expression)) => {
            let holds = expression::evaluate_condition(expression, variables);
            log::debug!("Edge {} condition '{}' -> {}", edge.id, expression, holds);
            holds
        }
        Some(other) => truthy(other),
    }
}

/// First edge, in array order, whose condition evaluates truthy
pub fn select_by_first_truthy_condition<'a>(
    edges: &[&'a EdgeConfig],
    variables: &Variables,
) -> Option<&'a EdgeConfig> {
    edges
        .iter()
        .copied()
        .find(|edge| condition_holds(edge, variables))
}

/// First edge flagged as the default flow
pub fn select_default_edge<'a>(edges: &[&'a EdgeConfig]) -> Option<&'a EdgeConfig> {
    edges.iter().copied().find(|edge| edge.is_default())
}

/// Pick the edge the token follows out of `node`.
///
/// Gateways branch on conditions, falling back to the default edge. Every
/// other category takes its first outgoing edge.
pub fn select_next_edge<'a>(
    node: &NodeConfig,
    outgoing: &[&'a EdgeConfig],
    variables: &Variables,
) -> Option<&'a EdgeConfig> {
    if node.is_gateway() {
        select_by_first_truthy_condition(outgoing, variables)
            .or_else(|| select_default_edge(outgoing))
    } else {
        outgoing.first().copied()
    }
}
