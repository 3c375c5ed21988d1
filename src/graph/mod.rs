// SPDX-License-Identifier: MIT

//! Workflow graph data model
//!
//! Nodes and edges as handed over by the owning graph store. Neither engine
//! writes to them.

mod connection;
mod types;

pub use connection::{
    ConnectionRule, ConnectionRules, ConnectionVerdict, FnConnectionRule, NoSelfLoop,
};
pub use types::{EdgeConfig, NodeCategory, NodeConfig, PropertyDefinition, WorkflowGraph};
