// SPDX-License-Identifier: MIT

//! Typed error handling for bpm-core
//!
//! Structural and business-rule violations in a graph are *data* and are
//! reported as [`crate::validation::ValidationError`] values. The types in
//! this module cover the failures that are not data: bad configuration,
//! unreadable files, broken expressions and simulation misuse.

use thiserror::Error;

/// Top-level error type for bpm-core
#[derive(Debug, Error)]
pub enum BpmError {
    /// Configuration errors (bad values, unreadable config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Expression or script failure
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    /// Simulation errors
    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),

    /// A globally registered rule could not be executed
    #[error("Rule '{rule_id}' failed to execute: {message}")]
    RuleExecution { rule_id: String, message: String },

    /// A rule id that the registry does not know
    #[error("Rule '{0}' is not registered")]
    RuleNotFound(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors raised while tokenizing, parsing or interpreting user expressions
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExpressionError {
    /// Unexpected character in the source text
    #[error("Unexpected character '{found}' at position {position}")]
    UnexpectedChar { found: char, position: usize },

    /// String literal without a closing quote
    #[error("Unterminated string starting at position {0}")]
    UnterminatedString(usize),

    /// Malformed numeric literal
    #[error("Invalid number literal: {0}")]
    InvalidNumber(String),

    /// Grammar violation
    #[error("Parse error: {0}")]
    Parse(String),

    /// Identifier not bound in the evaluation context
    #[error("'{0}' is not defined")]
    UndefinedVariable(String),

    /// Operation applied to values of the wrong type
    #[error("Type error: {0}")]
    Type(String),

    /// Arithmetic produced NaN or infinity
    #[error("Arithmetic produced a non-finite result")]
    NonFinite,
}

/// Simulation-specific errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimulationError {
    /// No explicit start node was found, and no node has category "start"
    #[error("No start node found{}", .0.as_ref().map(|id| format!(" (requested '{}')", id)).unwrap_or_default())]
    StartNodeNotFound(Option<String>),
}

impl BpmError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a rule execution error
    pub fn rule_execution(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RuleExecution {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }
}

impl ExpressionError {
    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a type error
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }
}
