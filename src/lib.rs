// SPDX-License-Identifier: MIT

//! bpm-core: validation and simulation of business-process graphs
//!
//! - [`validation`] checks nodes, edges and whole workflows
//! - [`simulation`] walks a single token through a graph
//! - [`expression`] evaluates gateway conditions and task scripts

pub mod config;
pub mod error;
pub mod events;
pub mod expression;
pub mod graph;
pub mod loader;
pub mod simulation;
pub mod validation;

pub use config::{EngineConfig, SimulationConfig, UnknownRulePolicy, ValidationConfig};
pub use error::{BpmError, ExpressionError, SimulationError};
pub use events::{EngineEvent, EventBus, EventChannel};
pub use graph::{EdgeConfig, NodeCategory, NodeConfig, PropertyDefinition, WorkflowGraph};
pub use loader::GraphLoader;
pub use simulation::{RunStatus, SimulationEngine, SimulationState, StepOutcome};
pub use validation::{
    InMemoryRuleRegistry, RegisteredRule, RuleRegistry, RuleScope, ValidationEngine,
    ValidationError, ValidationResult, ValidationRule,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
