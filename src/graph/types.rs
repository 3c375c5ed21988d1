// SPDX-License-Identifier: MIT

//! Workflow graph type definitions
//!
//! This module defines the node and edge shapes shared by validation and
//! simulation. Both engines only read them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::connection::{ConnectionRule, ConnectionRules};
use crate::validation::ValidationRule;
use std::sync::Arc;

/// Semantic role of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Start,
    Task,
    Gateway,
    End,
    /// Anything else, including categories this crate does not know
    #[default]
    #[serde(other)]
    Other,
}

/// Specification of one editable node property
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    /// Property id, also the key into `NodeConfig::properties`
    pub id: String,
    /// Human-readable name used in messages
    #[serde(default)]
    pub label: Option<String>,
    /// Whether an empty value is an error
    #[serde(default)]
    pub required: bool,
    /// Rules applied to the property value
    #[serde(default)]
    pub validation: Vec<ValidationRule>,
    /// Value the editor pre-fills
    #[serde(default)]
    pub default: Option<Value>,
}

impl PropertyDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation.push(rule);
        self
    }

    /// Name shown in messages: the label when present, else the id
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// A node in the workflow graph
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    /// Unique identifier within the workflow
    #[serde(default)]
    pub id: String,
    /// Type discriminator, e.g. `userTask` or `exclusiveGateway`
    #[serde(default)]
    pub node_type: String,
    #[serde(default)]
    pub category: NodeCategory,
    /// Property id -> value
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub property_definitions: Vec<PropertyDefinition>,
    /// Rules evaluated against the whole node
    #[serde(default)]
    pub validation_rules: Vec<ValidationRule>,
    /// Constraints on edges leaving this node
    #[serde(skip)]
    pub connection_rules: ConnectionRules,
}

impl NodeConfig {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>, category: NodeCategory) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            category,
            ..Default::default()
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_definition(mut self, definition: PropertyDefinition) -> Self {
        self.property_definitions.push(definition);
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation_rules.push(rule);
        self
    }

    pub fn with_connection_rule(mut self, rule: Arc<dyn ConnectionRule>) -> Self {
        self.connection_rules.push(rule);
        self
    }

    pub fn with_script(self, script: impl Into<String>) -> Self {
        self.with_property("script", Value::String(script.into()))
    }

    /// The task script stored in `properties.script`, if non-empty
    pub fn script(&self) -> Option<&str> {
        self.properties
            .get("script")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn is_gateway(&self) -> bool {
        self.category == NodeCategory::Gateway
    }
}

/// A directed connection between two nodes
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeConfig {
    #[serde(default)]
    pub id: String,
    /// Source node id (existence is not enforced)
    #[serde(default)]
    pub source: String,
    /// Target node id (existence is not enforced)
    #[serde(default)]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    /// May include `condition` and `isDefault`
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Legacy location of the branch condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
    /// Editor metadata; may include `isDefault`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl EdgeConfig {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.properties
            .insert("condition".to_string(), Value::String(condition.into()));
        self
    }

    pub fn with_legacy_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(Value::String(condition.into()));
        self
    }

    /// Mark as the default flow via `properties.isDefault`
    pub fn as_default(mut self) -> Self {
        self.properties
            .insert("isDefault".to_string(), Value::Bool(true));
        self
    }

    /// Mark as the default flow via `data.isDefault`
    pub fn as_default_in_data(mut self) -> Self {
        self.data
            .get_or_insert_with(Map::new)
            .insert("isDefault".to_string(), Value::Bool(true));
        self
    }

    pub fn with_handles(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source_handle = Some(source.into());
        self.target_handle = Some(target.into());
        self
    }

    /// Branch condition: `properties.condition`, falling back to the legacy
    /// top-level `condition`. Null and blank strings count as absent.
    pub fn condition(&self) -> Option<&Value> {
        let present = |v: &&Value| match v {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        };
        self.properties
            .get("condition")
            .filter(present)
            .or_else(|| self.condition.as_ref().filter(present))
    }

    /// Default-flow flag: `properties.isDefault`, then `data.isDefault`
    pub fn is_default(&self) -> bool {
        let flagged = |map: &Map<String, Value>| {
            map.get("isDefault").and_then(Value::as_bool).unwrap_or(false)
        };
        flagged(&self.properties) || self.data.as_ref().map(flagged).unwrap_or(false)
    }
}

/// Read-only view of a workflow as supplied by the graph store
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowGraph {
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
    #[serde(default)]
    pub edges: Vec<EdgeConfig>,
}

impl WorkflowGraph {
    pub fn new(nodes: Vec<NodeConfig>, edges: Vec<EdgeConfig>) -> Self {
        Self { nodes, edges }
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&NodeConfig> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// First node of the given category, in array order
    pub fn first_of(&self, category: NodeCategory) -> Option<&NodeConfig> {
        self.nodes.iter().find(|n| n.category == category)
    }

    /// Edges leaving `node_id`, in array order
    pub fn outgoing(&self, node_id: &str) -> Vec<&EdgeConfig> {
        self.edges.iter().filter(|e| e.source == node_id).collect()
    }
}
