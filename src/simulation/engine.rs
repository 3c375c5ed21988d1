// SPDX-License-Identifier: MIT

//! Token-based workflow simulation
//!
//! A single cursor walks the graph one node per `step`. Task scripts may
//! update the run variables; gateways branch on edge conditions evaluated
//! against them.

use serde_json::Value;

use super::branching::select_next_edge;
use super::state::{RunStatus, SimulationState, StepOutcome};
use crate::config::SimulationConfig;
use crate::error::SimulationError;
use crate::expression::{self, Variables};
use crate::graph::{NodeCategory, NodeConfig, WorkflowGraph};

/// Drives one simulated run over a workflow graph
pub struct SimulationEngine {
    config: SimulationConfig,
    state: SimulationState,
}

impl SimulationEngine {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            state: SimulationState::default(),
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Place the token on the start node.
    ///
    /// With no explicit id the first node of category `start` is used. On
    /// failure the state is left untouched. Variables set while idle are
    /// carried into the run.
    pub fn start(
        &mut self,
        graph: &WorkflowGraph,
        start_node_id: Option<&str>,
    ) -> Result<(), SimulationError> {
        let start = match start_node_id {
            Some(id) => graph.node(id),
            None => graph.first_of(NodeCategory::Start),
        }
        .ok_or_else(|| SimulationError::StartNodeNotFound(start_node_id.map(str::to_string)))?;

        log::info!("Starting simulation at node: {}", start.id);
        let variables = std::mem::take(&mut self.state.variables);
        self.state = SimulationState {
            active: true,
            current_node_id: Some(start.id.clone()),
            variables,
            history: vec![start.id.clone()],
            status: RunStatus::Running,
            steps_taken: 0,
        };
        Ok(())
    }

    /// Execute the current node and move the token along one edge
    pub fn step(&mut self, graph: &WorkflowGraph) -> StepOutcome {
        if !self.state.active {
            return StepOutcome::Skipped;
        }
        let Some(current_id) = self.state.current_node_id.clone() else {
            return StepOutcome::Skipped;
        };
        let Some(node) = graph.node(&current_id) else {
            log::warn!("Current node {} no longer exists in the graph", current_id);
            return StepOutcome::Skipped;
        };

        if self.state.steps_taken >= self.config.max_steps {
            log::warn!(
                "Step budget of {} exhausted at node {}, halting",
                self.config.max_steps,
                current_id
            );
            self.state.current_node_id = None;
            self.state.status = RunStatus::Halted;
            return StepOutcome::BudgetExhausted { at: current_id };
        }
        self.state.steps_taken += 1;

        log::info!("Executing node: {}", node.id);
        self.run_script(node);

        let outgoing = graph.outgoing(&node.id);
        if outgoing.is_empty() {
            log::info!("Simulation completed at node: {}", node.id);
            self.state.current_node_id = None;
            self.state.status = RunStatus::Completed;
            return StepOutcome::Completed { at: current_id };
        }

        let Some(edge) = select_next_edge(node, &outgoing, &self.state.variables) else {
            log::warn!(
                "Gateway {} has no matching condition and no default edge",
                node.id
            );
            self.state.current_node_id = None;
            self.state.status = RunStatus::Stuck;
            return StepOutcome::Stuck { at: current_id };
        };

        log::debug!("Following edge {} from {} to {}", edge.id, node.id, edge.target);
        self.state.history.push(edge.target.clone());
        self.state.current_node_id = Some(edge.target.clone());
        self.state.status = RunStatus::Running;

        StepOutcome::Advanced {
            from: current_id,
            to: edge.target.clone(),
            edge_id: edge.id.clone(),
        }
    }

    /// Step until the token stops advancing; returns the final outcome
    pub fn run(&mut self, graph: &WorkflowGraph) -> StepOutcome {
        loop {
            let outcome = self.step(graph);
            if !outcome.is_advanced() {
                return outcome;
            }
        }
    }

    /// Reset to idle, discarding the run and its variables
    pub fn stop(&mut self) {
        if self.state.active {
            log::info!("Simulation stopped after {} steps", self.state.steps_taken);
        }
        self.state = SimulationState::default();
    }

    /// Set one variable, whether or not a run is active
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.state.variables.insert(name.into(), value);
    }

    /// Run the node script on a copy of the variables and merge an object
    /// result back. A failing script leaves the variables unchanged.
    fn run_script(&mut self, node: &NodeConfig) {
        let Some(script) = node.script() else {
            return;
        };
        match expression::execute(script, &self.state.variables) {
            Value::Object(updates) => merge(&mut self.state.variables, updates),
            Value::Null => {}
            other => log::debug!(
                "Script on node {} returned a non-object value, ignoring: {}",
                node.id,
                other
            ),
        }
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

fn merge(variables: &mut Variables, updates: Variables) {
    for (key, value) in updates {
        variables.insert(key, value);
    }
}
