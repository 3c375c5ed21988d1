// SPDX-License-Identifier: MIT

//! Validation issues and aggregated results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a validation issue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single validation issue, attributed to the entity that caused it.
///
/// `id` is derived from the entity id plus the field/rule id, so the same
/// problem produces the same id on every run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub id: String,
    #[serde(rename = "type")]
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Machine-readable kind (e.g. `required`, `connection_rule`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ValidationError {
    pub fn new(id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            node_id: None,
            edge_id: None,
            field: None,
            code: None,
        }
    }

    pub fn error(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(id, Severity::Error, message)
    }

    /// Attribute to a node; blank ids are left unattributed
    pub fn for_node(mut self, node_id: &str) -> Self {
        if !node_id.is_empty() {
            self.node_id = Some(node_id.to_string());
        }
        self
    }

    /// Attribute to an edge; blank ids are left unattributed
    pub fn for_edge(mut self, edge_id: &str) -> Self {
        if !edge_id.is_empty() {
            self.edge_id = Some(edge_id.to_string());
        }
        self
    }

    pub fn on_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Aggregate of one validation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationResult {
    /// True when `errors` is empty; warnings never invalidate
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    /// Issues of severity warning or info
    pub warnings: Vec<ValidationError>,
}

impl ValidationResult {
    /// Partition issues by severity, preserving order
    pub fn from_issues(issues: Vec<ValidationError>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            issues.into_iter().partition(ValidationError::is_error);
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Find an issue (error or warning) by its deterministic id
    pub fn find(&self, id: &str) -> Option<&ValidationError> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .find(|issue| issue.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_issues_partitions_by_severity() {
        let result = ValidationResult::from_issues(vec![
            ValidationError::error("a", "broken"),
            ValidationError::new("b", Severity::Warning, "odd"),
            ValidationError::new("c", Severity::Info, "fyi"),
        ]);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(result.find("c").unwrap().message, "fyi");
    }

    #[test]
    fn test_warnings_only_is_valid() {
        let result =
            ValidationResult::from_issues(vec![ValidationError::new("w", Severity::Warning, "hm")]);
        assert!(result.valid);
    }

    #[test]
    fn test_blank_entity_ids_are_not_attributed() {
        let err = ValidationError::error("x", "m").for_node("").for_edge("");
        assert_eq!(err.node_id, None);
        assert_eq!(err.edge_id, None);
    }

    #[test]
    fn test_serialize_shape() {
        let err = ValidationError::error("node:a:name:required", "Field 'Name' is required")
            .for_node("a")
            .on_field("name")
            .with_code("required");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "id": "node:a:name:required",
                "type": "error",
                "message": "Field 'Name' is required",
                "nodeId": "a",
                "field": "name",
                "code": "required"
            })
        );
    }
}
