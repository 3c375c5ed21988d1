// SPDX-License-Identifier: MIT

//! Workflow validation
//!
//! Node, edge and workflow scope checks driven by property definitions,
//! attached rules, connection rules and a pluggable rule registry.

mod checks;
mod engine;
mod registry;
mod rules;
mod types;

pub use checks::{is_empty_value, passes_max, passes_min, passes_pattern};
pub use engine::ValidationEngine;
pub use registry::{
    AsyncRuleCheck, InMemoryRuleRegistry, RegisteredRule, RuleCheck, RuleContext, RuleDescriptor,
    RuleRegistry, RuleScope,
};
pub use rules::{AsyncValidator, RuleKind, ValidationRule, Validator};
pub use types::{Severity, ValidationError, ValidationResult};
