// SPDX-License-Identifier: MIT

//! Validation engine
//!
//! Validates nodes, edges and whole workflows. Data problems are reported as
//! [`ValidationError`] entries, never as `Err`. Rules run sequentially in
//! array order so a given input always yields the same result.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use super::checks::{is_empty_value, passes_max, passes_min, passes_pattern};
use super::registry::{RuleContext, RuleRegistry};
use super::rules::{RuleKind, ValidationRule};
use super::types::{ValidationError, ValidationResult};
use crate::config::{UnknownRulePolicy, ValidationConfig};
use crate::events::{EngineEvent, EventChannel};
use crate::graph::{EdgeConfig, NodeConfig};

/// Validates workflow graphs against their definitions and registered rules
pub struct ValidationEngine {
    registry: Arc<dyn RuleRegistry>,
    events: Option<Arc<dyn EventChannel>>,
    config: ValidationConfig,
}

impl ValidationEngine {
    pub fn new(registry: Arc<dyn RuleRegistry>) -> Self {
        Self {
            registry,
            events: None,
            config: ValidationConfig::default(),
        }
    }

    /// Publish `workflow:validated` events on `channel`
    pub fn with_events(mut self, channel: Arc<dyn EventChannel>) -> Self {
        self.events = Some(channel);
        self
    }

    pub fn with_config(mut self, config: ValidationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub async fn validate_node(&self, node: &NodeConfig) -> ValidationResult {
        ValidationResult::from_issues(self.node_issues(node).await)
    }

    /// Validate one edge. Endpoint nodes are optional; without a source node
    /// its connection rules cannot run.
    pub async fn validate_edge(
        &self,
        edge: &EdgeConfig,
        source_node: Option<&NodeConfig>,
        target_node: Option<&NodeConfig>,
    ) -> ValidationResult {
        ValidationResult::from_issues(self.edge_issues(edge, source_node, target_node).await)
    }

    /// Validate every node, then every edge, then workflow-scoped rules.
    ///
    /// Edge endpoints are resolved by id. An id with no matching node is
    /// passed on as `None`; it is not itself reported.
    pub async fn validate_workflow(
        &self,
        nodes: &[NodeConfig],
        edges: &[EdgeConfig],
    ) -> ValidationResult {
        log::debug!(
            "Validating workflow: {} nodes, {} edges",
            nodes.len(),
            edges.len()
        );
        let mut issues = Vec::new();

        for node in nodes {
            issues.extend(self.node_issues(node).await);
        }

        for edge in edges {
            let source = nodes.iter().find(|n| n.id == edge.source);
            let target = nodes.iter().find(|n| n.id == edge.target);
            issues.extend(self.edge_issues(edge, source, target).await);
        }

        let context = RuleContext::Workflow { nodes, edges };
        issues.extend(self.global_issues(&context, "workflow").await);

        let result = ValidationResult::from_issues(issues);
        log::info!(
            "Workflow validation finished: valid={}, {} errors, {} warnings",
            result.valid,
            result.errors.len(),
            result.warnings.len()
        );

        if let Some(events) = &self.events {
            events.emit(EngineEvent::WorkflowValidated {
                result: result.clone(),
                node_count: nodes.len(),
                edge_count: edges.len(),
                validated_at: Utc::now(),
            });
        }

        result
    }

    async fn node_issues(&self, node: &NodeConfig) -> Vec<ValidationError> {
        let mut issues = Vec::new();
        let prefix = format!("node:{}", node.id);

        if node.id.is_empty() {
            issues.push(
                ValidationError::error(format!("{}:id", prefix), "Node is missing an id")
                    .on_field("id")
                    .with_code("missing_id"),
            );
        }
        if node.node_type.is_empty() {
            issues.push(
                ValidationError::error(
                    format!("{}:nodeType", prefix),
                    format!("Node '{}' is missing a node type", node.id),
                )
                .for_node(&node.id)
                .on_field("nodeType")
                .with_code("missing_node_type"),
            );
        }

        for definition in &node.property_definitions {
            let value = node.properties.get(&definition.id);
            let subject = format!("Field '{}'", definition.display_name());

            if definition.required && is_empty_value(value) {
                issues.push(
                    ValidationError::error(
                        format!("{}:{}:required", prefix, definition.id),
                        format!("{} is required", subject),
                    )
                    .for_node(&node.id)
                    .on_field(&definition.id)
                    .with_code("required"),
                );
            }

            for rule in &definition.validation {
                if let Some(message) = self.apply_rule(rule, value, &subject, node).await {
                    issues.push(
                        ValidationError::new(
                            format!("{}:{}:{}", prefix, definition.id, rule.id),
                            rule.severity,
                            message,
                        )
                        .for_node(&node.id)
                        .on_field(&definition.id)
                        .with_code(rule_code(rule)),
                    );
                }
            }
        }

        if !node.validation_rules.is_empty() {
            let whole = Value::Object(node.properties.clone());
            let subject = format!("Node '{}'", node.id);
            for rule in &node.validation_rules {
                if let Some(message) = self.apply_rule(rule, Some(&whole), &subject, node).await {
                    issues.push(
                        ValidationError::new(
                            format!("{}:rule:{}", prefix, rule.id),
                            rule.severity,
                            message,
                        )
                        .for_node(&node.id)
                        .with_code(rule_code(rule)),
                    );
                }
            }
        }

        let context = RuleContext::Node { node };
        issues.extend(
            self.global_issues(&context, &prefix)
                .await
                .into_iter()
                .map(|issue| issue.for_node(&node.id)),
        );

        issues
    }

    async fn edge_issues(
        &self,
        edge: &EdgeConfig,
        source_node: Option<&NodeConfig>,
        target_node: Option<&NodeConfig>,
    ) -> Vec<ValidationError> {
        let mut issues = Vec::new();
        let prefix = format!("edge:{}", edge.id);

        if edge.source.is_empty() {
            issues.push(
                ValidationError::error(
                    format!("{}:source", prefix),
                    format!("Edge '{}' is missing a source node", edge.id),
                )
                .for_edge(&edge.id)
                .on_field("source")
                .with_code("missing_source"),
            );
        }
        if edge.target.is_empty() {
            issues.push(
                ValidationError::error(
                    format!("{}:target", prefix),
                    format!("Edge '{}' is missing a target node", edge.id),
                )
                .for_edge(&edge.id)
                .on_field("target")
                .with_code("missing_target"),
            );
        }

        if let Some(source) = source_node {
            for rule in source.connection_rules.iter() {
                let verdict = rule.validate(
                    &edge.source,
                    &edge.target,
                    edge.source_handle.as_deref(),
                    edge.target_handle.as_deref(),
                );
                if verdict.is_valid() {
                    continue;
                }
                let message = verdict
                    .message()
                    .or_else(|| rule.description())
                    .map(str::to_string)
                    .unwrap_or_else(|| {
                        format!(
                            "Connection from '{}' to '{}' violates rule '{}'",
                            edge.source,
                            edge.target,
                            rule.id()
                        )
                    });
                issues.push(
                    ValidationError::error(format!("{}:connection:{}", prefix, rule.id()), message)
                        .for_edge(&edge.id)
                        .for_node(&source.id)
                        .with_code("connection_rule"),
                );
            }
        }

        let context = RuleContext::Edge {
            edge,
            source: source_node,
            target: target_node,
        };
        issues.extend(
            self.global_issues(&context, &prefix)
                .await
                .into_iter()
                .map(|issue| issue.for_edge(&edge.id)),
        );

        issues
    }

    /// Run one attached rule. Returns the failure message, or `None` on pass.
    async fn apply_rule(
        &self,
        rule: &ValidationRule,
        value: Option<&Value>,
        subject: &str,
        node: &NodeConfig,
    ) -> Option<String> {
        let own_message = || Some(rule.message.clone()).filter(|m| !m.trim().is_empty());

        // min/max/pattern leave emptiness to `required`
        let present = value.filter(|v| !is_empty_value(Some(*v)));

        let failure = match &rule.kind {
            RuleKind::Required => {
                is_empty_value(value).then(|| format!("{} is required", subject))
            }
            RuleKind::Min(bound) => present
                .filter(|v| !passes_min(v, *bound))
                .map(|_| format!("{} must be at least {}", subject, bound)),
            RuleKind::Max(bound) => present
                .filter(|v| !passes_max(v, *bound))
                .map(|_| format!("{} must be at most {}", subject, bound)),
            RuleKind::Pattern(pattern) => present
                .filter(|v| !passes_pattern(v, pattern))
                .map(|_| format!("{} does not match pattern {}", subject, pattern)),
            RuleKind::Custom(validator) => {
                let value = value.unwrap_or(&Value::Null);
                match validator.run(value, node).await {
                    Ok(()) => None,
                    Err(message) if !message.trim().is_empty() => return Some(message),
                    Err(_) => Some(format!("Validation rule '{}' failed", rule.id)),
                }
            }
            RuleKind::Unrecognized { kind } => match self.config.unknown_rule_policy {
                UnknownRulePolicy::FailOpen => {
                    log::warn!(
                        "Unrecognized validation rule type '{}' (rule '{}'), treating as passing",
                        kind,
                        rule.id
                    );
                    None
                }
                UnknownRulePolicy::FailClosed => {
                    Some(format!("Unrecognized validation rule type '{}'", kind))
                }
            },
        };

        failure.map(|generated| own_message().unwrap_or(generated))
    }

    /// Execute enabled registry rules of the context's scope
    async fn global_issues(&self, context: &RuleContext<'_>, prefix: &str) -> Vec<ValidationError> {
        let scope = context.scope();
        let mut issues = Vec::new();

        for descriptor in self.registry.rules_by_scope(scope).await {
            if !descriptor.enabled {
                log::debug!("Skipping disabled {} rule '{}'", scope, descriptor.id);
                continue;
            }
            let id = format!("{}:global:{}", prefix, descriptor.id);

            match self.registry.execute_rule(&descriptor.id, context).await {
                Ok(true) => {}
                Ok(false) => {
                    let message = descriptor
                        .description
                        .clone()
                        .filter(|d| !d.trim().is_empty())
                        .unwrap_or_else(|| format!("Validation rule '{}' failed", descriptor.id));
                    issues.push(ValidationError::error(id, message).with_code("global_rule"));
                }
                Err(e) => {
                    log::error!("Failed to execute {} rule '{}': {}", scope, descriptor.id, e);
                    issues.push(
                        ValidationError::error(
                            id,
                            format!("Validation rule '{}' could not be executed: {}", descriptor.id, e),
                        )
                        .with_code("rule_execution_failed"),
                    );
                }
            }
        }

        issues
    }
}

fn rule_code(rule: &ValidationRule) -> &str {
    match &rule.kind {
        RuleKind::Unrecognized { .. } => "unrecognized_rule",
        kind => kind.name(),
    }
}
