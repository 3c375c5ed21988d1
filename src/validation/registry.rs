// SPDX-License-Identifier: MIT

//! Globally registered validation rules
//!
//! The engine consumes rules through the [`RuleRegistry`] trait; how rules
//! are loaded is up to the host. [`InMemoryRuleRegistry`] is the bundled
//! implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::BpmError;
use crate::graph::{EdgeConfig, NodeConfig};

/// Which entity kind a registered rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    Node,
    Edge,
    Workflow,
}

impl fmt::Display for RuleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleScope::Node => write!(f, "node"),
            RuleScope::Edge => write!(f, "edge"),
            RuleScope::Workflow => write!(f, "workflow"),
        }
    }
}

/// Registry-side description of a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDescriptor {
    pub id: String,
    pub scope: RuleScope,
    pub enabled: bool,
    /// Reported as the failure message when present
    pub description: Option<String>,
}

/// What a registered rule is executed against
#[derive(Debug, Clone, Copy)]
pub enum RuleContext<'a> {
    Node {
        node: &'a NodeConfig,
    },
    Edge {
        edge: &'a EdgeConfig,
        source: Option<&'a NodeConfig>,
        target: Option<&'a NodeConfig>,
    },
    Workflow {
        nodes: &'a [NodeConfig],
        edges: &'a [EdgeConfig],
    },
}

impl RuleContext<'_> {
    pub fn scope(&self) -> RuleScope {
        match self {
            RuleContext::Node { .. } => RuleScope::Node,
            RuleContext::Edge { .. } => RuleScope::Edge,
            RuleContext::Workflow { .. } => RuleScope::Workflow,
        }
    }
}

/// Source of globally registered rules
#[async_trait]
pub trait RuleRegistry: Send + Sync {
    /// Rules for one scope, in registration order
    async fn rules_by_scope(&self, scope: RuleScope) -> Vec<RuleDescriptor>;

    /// Run one rule. `Ok(false)` means the rule failed.
    async fn execute_rule(&self, rule_id: &str, context: &RuleContext<'_>)
        -> Result<bool, BpmError>;
}

type RuleCheckFn = dyn Fn(&RuleContext<'_>) -> bool + Send + Sync;

/// Rule body that needs to await
#[async_trait]
pub trait AsyncRuleCheck: Send + Sync {
    async fn check(&self, context: &RuleContext<'_>) -> Result<bool, BpmError>;
}

/// Body of a registered rule
#[derive(Clone)]
pub enum RuleCheck {
    Sync(Arc<RuleCheckFn>),
    Async(Arc<dyn AsyncRuleCheck>),
}

/// A rule held by [`InMemoryRuleRegistry`]
#[derive(Clone)]
pub struct RegisteredRule {
    pub descriptor: RuleDescriptor,
    pub check: RuleCheck,
}

impl RegisteredRule {
    pub fn new<F>(id: impl Into<String>, scope: RuleScope, check: F) -> Self
    where
        F: Fn(&RuleContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            descriptor: RuleDescriptor {
                id: id.into(),
                scope,
                enabled: true,
                description: None,
            },
            check: RuleCheck::Sync(Arc::new(check)),
        }
    }

    pub fn asynchronous<C: AsyncRuleCheck + 'static>(
        id: impl Into<String>,
        scope: RuleScope,
        check: C,
    ) -> Self {
        Self {
            descriptor: RuleDescriptor {
                id: id.into(),
                scope,
                enabled: true,
                description: None,
            },
            check: RuleCheck::Async(Arc::new(check)),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.descriptor.description = Some(description.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.descriptor.enabled = false;
        self
    }
}

/// Shared, cloneable in-memory rule registry
#[derive(Clone, Default)]
pub struct InMemoryRuleRegistry {
    rules: Arc<RwLock<Vec<RegisteredRule>>>,
}

impl InMemoryRuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule; a rule with the same id is replaced in place
    pub async fn register(&self, rule: RegisteredRule) {
        let mut rules = self.rules.write().await;
        match rules
            .iter_mut()
            .find(|r| r.descriptor.id == rule.descriptor.id)
        {
            Some(existing) => *existing = rule,
            None => rules.push(rule),
        }
    }

    /// Remove a rule, returning whether it existed
    pub async fn unregister(&self, rule_id: &str) -> bool {
        let mut rules = self.rules.write().await;
        let before = rules.len();
        rules.retain(|r| r.descriptor.id != rule_id);
        rules.len() != before
    }

    /// Enable or disable a rule, returning whether it exists
    pub async fn set_enabled(&self, rule_id: &str, enabled: bool) -> bool {
        let mut rules = self.rules.write().await;
        match rules.iter_mut().find(|r| r.descriptor.id == rule_id) {
            Some(rule) => {
                rule.descriptor.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.rules.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rules.read().await.is_empty()
    }
}

#[async_trait]
impl RuleRegistry for InMemoryRuleRegistry {
    async fn rules_by_scope(&self, scope: RuleScope) -> Vec<RuleDescriptor> {
        let rules = self.rules.read().await;
        rules
            .iter()
            .filter(|r| r.descriptor.scope == scope)
            .map(|r| r.descriptor.clone())
            .collect()
    }

    async fn execute_rule(
        &self,
        rule_id: &str,
        context: &RuleContext<'_>,
    ) -> Result<bool, BpmError> {
        // Release the lock before running the body; async checks may be slow.
        let check = {
            let rules = self.rules.read().await;
            rules
                .iter()
                .find(|r| r.descriptor.id == rule_id)
                .map(|r| r.check.clone())
                .ok_or_else(|| BpmError::RuleNotFound(rule_id.to_string()))?
        };

        match check {
            RuleCheck::Sync(f) => Ok(f(context)),
            RuleCheck::Async(c) => c.check(context).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeCategory;

    struct AlwaysFails;

    #[async_trait]
    impl AsyncRuleCheck for AlwaysFails {
        async fn check(&self, _context: &RuleContext<'_>) -> Result<bool, BpmError> {
            Err(BpmError::rule_execution("remote", "lookup service unavailable"))
        }
    }

    fn has_name(ctx: &RuleContext<'_>) -> bool {
        match ctx {
            RuleContext::Node { node } => node.properties.contains_key("name"),
            _ => true,
        }
    }

    #[tokio::test]
    async fn test_register_and_list_by_scope() {
        let registry = InMemoryRuleRegistry::new();
        registry
            .register(RegisteredRule::new("named", RuleScope::Node, has_name))
            .await;
        registry
            .register(RegisteredRule::new("acyclic", RuleScope::Workflow, |_| true))
            .await;

        let node_rules = registry.rules_by_scope(RuleScope::Node).await;
        assert_eq!(node_rules.len(), 1);
        assert_eq!(node_rules[0].id, "named");
        assert!(registry.rules_by_scope(RuleScope::Edge).await.is_empty());
    }

    #[tokio::test]
    async fn test_execute_sync_rule() {
        let registry = InMemoryRuleRegistry::new();
        registry
            .register(RegisteredRule::new("named", RuleScope::Node, has_name))
            .await;

        let node = NodeConfig::new("a", "task", NodeCategory::Task);
        let ctx = RuleContext::Node { node: &node };
        assert!(!registry.execute_rule("named", &ctx).await.unwrap());

        let named = node.with_property("name", serde_json::json!("A"));
        let ctx = RuleContext::Node { node: &named };
        assert!(registry.execute_rule("named", &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_execute_unknown_rule() {
        let registry = InMemoryRuleRegistry::new();
        let ctx = RuleContext::Workflow {
            nodes: &[],
            edges: &[],
        };
        assert!(matches!(
            registry.execute_rule("ghost", &ctx).await,
            Err(BpmError::RuleNotFound(id)) if id == "ghost"
        ));
    }

    #[tokio::test]
    async fn test_async_rule_error_propagates() {
        let registry = InMemoryRuleRegistry::new();
        registry
            .register(RegisteredRule::asynchronous(
                "remote",
                RuleScope::Workflow,
                AlwaysFails,
            ))
            .await;
        let ctx = RuleContext::Workflow {
            nodes: &[],
            edges: &[],
        };
        assert!(registry.execute_rule("remote", &ctx).await.is_err());
    }

    #[tokio::test]
    async fn test_register_overwrites_existing() {
        let registry = InMemoryRuleRegistry::new();
        registry
            .register(RegisteredRule::new("r", RuleScope::Node, |_| false))
            .await;
        registry
            .register(RegisteredRule::new("r", RuleScope::Node, |_| true).with_description("v2"))
            .await;

        assert_eq!(registry.len().await, 1);
        let rules = registry.rules_by_scope(RuleScope::Node).await;
        assert_eq!(rules[0].description.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_enable_disable_and_unregister() {
        let registry = InMemoryRuleRegistry::new();
        registry
            .register(RegisteredRule::new("r", RuleScope::Edge, |_| true).disabled())
            .await;
        assert!(!registry.rules_by_scope(RuleScope::Edge).await[0].enabled);

        assert!(registry.set_enabled("r", true).await);
        assert!(registry.rules_by_scope(RuleScope::Edge).await[0].enabled);
        assert!(!registry.set_enabled("missing", true).await);

        assert!(registry.unregister("r").await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_registry_is_clone() {
        let registry = InMemoryRuleRegistry::new();
        let cloned = registry.clone();
        cloned
            .register(RegisteredRule::new("shared", RuleScope::Node, |_| true))
            .await;
        assert_eq!(registry.len().await, 1);
    }

    #[test]
    fn test_context_scope() {
        let edge = EdgeConfig::new("e", "a", "b");
        let ctx = RuleContext::Edge {
            edge: &edge,
            source: None,
            target: None,
        };
        assert_eq!(ctx.scope(), RuleScope::Edge);
        assert_eq!(RuleScope::Workflow.to_string(), "workflow");
    }
}
