// SPDX-License-Identifier: MIT

//! Field and node validation rules
//!
//! Rule kinds form a closed set. Rule type strings that this crate does not
//! know deserialize into [`RuleKind::Unrecognized`] so that the engine's
//! [`crate::config::UnknownRulePolicy`] decides their fate explicitly.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::types::Severity;
use crate::graph::NodeConfig;

type ValidatorFn = dyn Fn(&Value, &NodeConfig) -> Result<(), String> + Send + Sync;

/// Validator that needs to await (e.g. a remote lookup)
#[async_trait]
pub trait AsyncValidator: Send + Sync {
    /// `Err(message)` fails the rule; an empty message falls back to the
    /// rule's own message.
    async fn validate(&self, value: &Value, node: &NodeConfig) -> Result<(), String>;
}

/// Custom predicate attached to a rule
#[derive(Clone)]
pub enum Validator {
    Sync(Arc<ValidatorFn>),
    Async(Arc<dyn AsyncValidator>),
}

impl Validator {
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Value, &NodeConfig) -> Result<(), String> + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(f))
    }

    pub fn from_async<V: AsyncValidator + 'static>(validator: V) -> Self {
        Self::Async(Arc::new(validator))
    }

    pub async fn run(&self, value: &Value, node: &NodeConfig) -> Result<(), String> {
        match self {
            Self::Sync(f) => f(value, node),
            Self::Async(v) => v.validate(value, node).await,
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => write!(f, "Validator::Sync(..)"),
            Self::Async(_) => write!(f, "Validator::Async(..)"),
        }
    }
}

/// What a rule checks
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Value must be non-empty
    Required,
    /// Numbers: value >= n. Strings, arrays, objects: length >= n
    Min(f64),
    /// Numbers: value <= n. Strings, arrays, objects: length <= n
    Max(f64),
    /// String values must match the regular expression
    Pattern(String),
    /// Caller-supplied predicate
    Custom(Validator),
    /// A rule type this crate does not know, or a built-in whose parameter
    /// could not be used
    Unrecognized { kind: String },
}

impl RuleKind {
    pub fn name(&self) -> &str {
        match self {
            Self::Required => "required",
            Self::Min(_) => "min",
            Self::Max(_) => "max",
            Self::Pattern(_) => "pattern",
            Self::Custom(_) => "custom",
            Self::Unrecognized { kind } => kind,
        }
    }
}

/// A validation rule attached to a property definition or to a node
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawRule")]
pub struct ValidationRule {
    pub id: String,
    pub kind: RuleKind,
    /// Message reported on failure; blank means a generated message
    pub message: String,
    pub severity: Severity,
}

/// Wire shape: `{ id, type, value, message, severity }`
#[derive(Deserialize)]
struct RawRule {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    message: String,
    #[serde(default)]
    severity: Severity,
}

impl From<RawRule> for ValidationRule {
    fn from(raw: RawRule) -> Self {
        let unusable = || RuleKind::Unrecognized {
            kind: raw.kind.clone(),
        };
        let kind = match raw.kind.as_str() {
            "required" => RuleKind::Required,
            "min" => raw.value.as_f64().map(RuleKind::Min).unwrap_or_else(unusable),
            "max" => raw.value.as_f64().map(RuleKind::Max).unwrap_or_else(unusable),
            "pattern" => raw
                .value
                .as_str()
                .map(|p| RuleKind::Pattern(p.to_string()))
                .unwrap_or_else(unusable),
            _ => unusable(),
        };
        let id = if raw.id.is_empty() {
            raw.kind.clone()
        } else {
            raw.id
        };
        Self {
            id,
            kind,
            message: raw.message,
            severity: raw.severity,
        }
    }
}

impl ValidationRule {
    pub fn new(id: impl Into<String>, kind: RuleKind, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn required(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(id, RuleKind::Required, message)
    }

    pub fn min(id: impl Into<String>, bound: f64, message: impl Into<String>) -> Self {
        Self::new(id, RuleKind::Min(bound), message)
    }

    pub fn max(id: impl Into<String>, bound: f64, message: impl Into<String>) -> Self {
        Self::new(id, RuleKind::Max(bound), message)
    }

    pub fn pattern(
        id: impl Into<String>,
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(id, RuleKind::Pattern(pattern.into()), message)
    }

    pub fn custom(id: impl Into<String>, validator: Validator, message: impl Into<String>) -> Self {
        Self::new(id, RuleKind::Custom(validator), message)
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> ValidationRule {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_deserialize_builtins() {
        assert!(matches!(parse("type: required").kind, RuleKind::Required));
        assert!(matches!(parse("type: min\nvalue: 3").kind, RuleKind::Min(n) if n == 3.0));
        assert!(matches!(parse("type: max\nvalue: 2.5").kind, RuleKind::Max(n) if n == 2.5));
        match parse("type: pattern\nvalue: '^[A-Z]+$'").kind {
            RuleKind::Pattern(p) => assert_eq!(p, "^[A-Z]+$"),
            other => panic!("Expected Pattern, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_is_unrecognized() {
        let rule = parse("id: r1\ntype: luhn\nmessage: bad card");
        assert_eq!(rule.id, "r1");
        assert_eq!(rule.kind.name(), "luhn");
        assert!(matches!(rule.kind, RuleKind::Unrecognized { .. }));
    }

    #[test]
    fn test_builtin_without_usable_value_is_unrecognized() {
        assert!(matches!(
            parse("type: min\nvalue: many").kind,
            RuleKind::Unrecognized { ref kind } if kind == "min"
        ));
        assert!(matches!(
            parse("type: pattern").kind,
            RuleKind::Unrecognized { .. }
        ));
    }

    #[test]
    fn test_custom_from_data_has_no_predicate() {
        assert!(matches!(
            parse("type: custom").kind,
            RuleKind::Unrecognized { .. }
        ));
    }

    #[test]
    fn test_missing_id_falls_back_to_type() {
        assert_eq!(parse("type: required").id, "required");
    }

    #[test]
    fn test_severity_deserialize() {
        assert_eq!(
            parse("type: required\nseverity: warning").severity,
            Severity::Warning
        );
        assert_eq!(parse("type: required").severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_sync_validator_runs() {
        let validator = Validator::sync(|value, _node| {
            if value.as_str() == Some("ok") {
                Ok(())
            } else {
                Err("not ok".to_string())
            }
        });
        let node = NodeConfig::default();
        assert!(validator.run(&Value::from("ok"), &node).await.is_ok());
        assert_eq!(
            validator.run(&Value::from("no"), &node).await,
            Err("not ok".to_string())
        );
    }
}
