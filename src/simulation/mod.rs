// SPDX-License-Identifier: MIT

//! Workflow simulation

mod branching;
mod engine;
mod state;

pub use branching::{
    condition_holds, select_by_first_truthy_condition, select_default_edge, select_next_edge,
};
pub use engine::SimulationEngine;
pub use state::{RunStatus, SimulationState, StepOutcome};
