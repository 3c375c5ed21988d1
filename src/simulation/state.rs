// SPDX-License-Identifier: MIT

//! Simulation run state

use serde::Serialize;

use crate::expression::Variables;

/// Lifecycle of a simulated run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    /// Reached a node with no outgoing edges
    Completed,
    /// A gateway had no truthy condition and no default edge
    Stuck,
    /// Step budget exhausted
    Halted,
}

/// Snapshot of a simulated run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
    pub active: bool,
    /// The token position; `None` once the run has stopped moving
    pub current_node_id: Option<String>,
    pub variables: Variables,
    /// Visited node ids in order, starting with the start node
    pub history: Vec<String>,
    pub status: RunStatus,
    pub steps_taken: usize,
}

/// What a single `step` did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum StepOutcome {
    /// Nothing to do: inactive, finished, or the current node is gone
    Skipped,
    #[serde(rename_all = "camelCase")]
    Advanced {
        from: String,
        to: String,
        edge_id: String,
    },
    Completed { at: String },
    Stuck { at: String },
    BudgetExhausted { at: String },
}

impl StepOutcome {
    pub fn is_advanced(&self) -> bool {
        matches!(self, StepOutcome::Advanced { .. })
    }
}
