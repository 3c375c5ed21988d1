// SPDX-License-Identifier: MIT

//! Expression evaluation for gateway conditions and task scripts
//!
//! User-authored text is tokenized, parsed and interpreted by a small
//! tree-walking interpreter; nothing is handed to a host code runtime.
//! Conditions are single expressions like:
//! - `amount > 100`
//! - `status == 'approved' && !flagged`
//! - `tags contains 'vip' or customer.tier == 'gold'`
//!
//! Scripts are statement lists (`let`, assignment, `if`/`else`, `return`)
//! with no loops, so every script terminates.
//!
//! The infallible entry points ([`evaluate`], [`evaluate_condition`],
//! [`execute`]) never fail: errors are logged and replaced with safe
//! defaults. Every call re-tokenizes and re-parses its input.

mod ast;
mod evaluator;
mod lexer;
mod parser;
mod value;

pub use ast::{AssignOp, BinaryOp, Expr, LogicalOp, Script, Stmt, UnaryOp};
pub use parser::{parse_expression, parse_script};
pub use value::truthy;

use crate::error::ExpressionError;
use serde_json::{Map, Value};

/// Runtime variables visible to expressions, keyed by bare identifier
pub type Variables = Map<String, Value>;

/// Evaluate an expression, reporting failures to the caller
pub fn try_evaluate(expression: &str, context: &Variables) -> Result<Value, ExpressionError> {
    let expr = parse_expression(expression)?;
    evaluator::eval_expr(&expr, context)
}

/// Evaluate an expression. Any failure is logged and yields `false`.
pub fn evaluate(expression: &str, context: &Variables) -> Value {
    match try_evaluate(expression, context) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Failed to evaluate expression '{}': {}", expression, e);
            Value::Bool(false)
        }
    }
}

/// Evaluate an expression and reduce the result to its truthiness
pub fn evaluate_condition(expression: &str, context: &Variables) -> bool {
    truthy(&evaluate(expression, context))
}

/// Run a script against a copy of `context`, reporting failures to the caller.
///
/// Returns the value of the first `return` statement reached, or `null`.
pub fn try_execute(script: &str, context: &Variables) -> Result<Value, ExpressionError> {
    let parsed = parse_script(script)?;
    let mut scope = context.clone();
    evaluator::run_script(&parsed, &mut scope)
}

/// Run a script. Any failure is logged and yields the unmodified context.
pub fn execute(script: &str, context: &Variables) -> Value {
    match try_execute(script, context) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Failed to execute script: {}", e);
            Value::Object(context.clone())
        }
    }
}
