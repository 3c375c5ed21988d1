// SPDX-License-Identifier: MIT

//! Tree-walking interpreter for parsed expressions and scripts

use super::ast::{AssignOp, BinaryOp, Expr, LogicalOp, Script, Stmt, UnaryOp};
use super::value::{display, loose_equals, number_value, truthy, type_name};
use super::Variables;
use crate::error::ExpressionError;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Evaluate an expression against a read-only variable context
pub fn eval_expr(expr: &Expr, vars: &Variables) -> Result<Value, ExpressionError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Variable(name) => vars
            .get(name)
            .cloned()
            .ok_or_else(|| ExpressionError::UndefinedVariable(name.clone())),
        Expr::Member { object, property } => {
            let target = eval_expr(object, vars)?;
            member(&target, property)
        }
        Expr::Index { object, index } => {
            let target = eval_expr(object, vars)?;
            let key = eval_expr(index, vars)?;
            index_into(&target, &key)
        }
        Expr::Unary { op, operand } => {
            let value = eval_expr(operand, vars)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!truthy(&value))),
                UnaryOp::Negate => number_value(-as_number(&value, "-")?),
                UnaryOp::Plus => number_value(as_number(&value, "+")?),
            }
        }
        Expr::Binary { left, op, right } => {
            let l = eval_expr(left, vars)?;
            let r = eval_expr(right, vars)?;
            binary(&l, *op, &r)
        }
        Expr::Logical { left, op, right } => {
            let l = eval_expr(left, vars)?;
            match (op, truthy(&l)) {
                (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(l),
                _ => eval_expr(right, vars),
            }
        }
        Expr::Conditional {
            condition,
            consequent,
            alternate,
        } => {
            if truthy(&eval_expr(condition, vars)?) {
                eval_expr(consequent, vars)
            } else {
                eval_expr(alternate, vars)
            }
        }
        Expr::Array(items) => items
            .iter()
            .map(|item| eval_expr(item, vars))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Object(entries) => {
            let mut map = Map::new();
            for (key, value) in entries {
                map.insert(key.clone(), eval_expr(value, vars)?);
            }
            Ok(Value::Object(map))
        }
    }
}

enum Flow {
    Next,
    Return(Value),
}

/// Run a script, mutating `vars` as its statements assign.
///
/// Returns the value of the first `return` reached, or `null`.
pub fn run_script(script: &Script, vars: &mut Variables) -> Result<Value, ExpressionError> {
    match exec_block(&script.body, vars)? {
        Flow::Return(value) => Ok(value),
        Flow::Next => Ok(Value::Null),
    }
}

fn exec_block(body: &[Stmt], vars: &mut Variables) -> Result<Flow, ExpressionError> {
    for stmt in body {
        if let Flow::Return(value) = exec_stmt(stmt, vars)? {
            return Ok(Flow::Return(value));
        }
    }
    Ok(Flow::Next)
}

fn exec_stmt(stmt: &Stmt, vars: &mut Variables) -> Result<Flow, ExpressionError> {
    match stmt {
        Stmt::Let { name, value } => {
            let v = eval_expr(value, vars)?;
            vars.insert(name.clone(), v);
        }
        Stmt::Assign { name, op, value } => {
            let rhs = eval_expr(value, vars)?;
            let next = match op {
                AssignOp::Set => rhs,
                AssignOp::Add | AssignOp::Sub => {
                    let current = vars
                        .get(name)
                        .ok_or_else(|| ExpressionError::UndefinedVariable(name.clone()))?;
                    let bin = if *op == AssignOp::Add {
                        BinaryOp::Add
                    } else {
                        BinaryOp::Sub
                    };
                    binary(current, bin, &rhs)?
                }
            };
            vars.insert(name.clone(), next);
        }
        Stmt::Expr(expr) => {
            eval_expr(expr, vars)?;
        }
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let branch = if truthy(&eval_expr(condition, vars)?) {
                then_branch
            } else {
                else_branch
            };
            return exec_block(branch, vars);
        }
        Stmt::Return(value) => {
            let v = match value {
                Some(expr) => eval_expr(expr, vars)?,
                None => Value::Null,
            };
            return Ok(Flow::Return(v));
        }
    }
    Ok(Flow::Next)
}

fn member(target: &Value, property: &str) -> Result<Value, ExpressionError> {
    match target {
        Value::Null => Err(ExpressionError::type_error(format!(
            "Cannot read property '{}' of null",
            property
        ))),
        Value::Object(map) => Ok(map.get(property).cloned().unwrap_or(Value::Null)),
        Value::String(s) if property == "length" => Ok(Value::from(s.chars().count())),
        Value::Array(items) if property == "length" => Ok(Value::from(items.len())),
        _ => Ok(Value::Null),
    }
}

fn index_into(target: &Value, key: &Value) -> Result<Value, ExpressionError> {
    match (target, key) {
        (Value::Null, _) => Err(ExpressionError::type_error(format!(
            "Cannot read index {} of null",
            display(key)
        ))),
        (Value::Array(items), Value::Number(n)) => Ok(n
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0)
            .and_then(|f| items.get(f as usize))
            .cloned()
            .unwrap_or(Value::Null)),
        (Value::String(s), Value::Number(n)) => Ok(n
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0)
            .and_then(|f| s.chars().nth(f as usize))
            .map(|c| Value::String(c.to_string()))
            .unwrap_or(Value::Null)),
        (_, Value::String(name)) => member(target, name),
        _ => Ok(Value::Null),
    }
}

fn as_number(value: &Value, op: &str) -> Result<f64, ExpressionError> {
    value.as_f64().ok_or_else(|| {
        ExpressionError::type_error(format!(
            "Operator '{}' expects a number, got {}",
            op,
            type_name(value)
        ))
    })
}

fn binary(l: &Value, op: BinaryOp, r: &Value) -> Result<Value, ExpressionError> {
    match op {
        BinaryOp::Add => {
            if l.is_string() || r.is_string() {
                return Ok(Value::String(format!("{}{}", display(l), display(r))));
            }
            arithmetic(l, op, r, |a, b| a + b)
        }
        BinaryOp::Sub => arithmetic(l, op, r, |a, b| a - b),
        BinaryOp::Mul => arithmetic(l, op, r, |a, b| a * b),
        BinaryOp::Div => arithmetic(l, op, r, |a, b| a / b),
        BinaryOp::Rem => arithmetic(l, op, r, |a, b| a % b),
        BinaryOp::Eq => Ok(Value::Bool(loose_equals(l, r))),
        BinaryOp::NotEq => Ok(Value::Bool(!loose_equals(l, r))),
        BinaryOp::Lt => Ok(Value::Bool(compare(l, r) == Some(Ordering::Less))),
        BinaryOp::Lte => Ok(Value::Bool(matches!(
            compare(l, r),
            Some(Ordering::Less | Ordering::Equal)
        ))),
        BinaryOp::Gt => Ok(Value::Bool(compare(l, r) == Some(Ordering::Greater))),
        BinaryOp::Gte => Ok(Value::Bool(matches!(
            compare(l, r),
            Some(Ordering::Greater | Ordering::Equal)
        ))),
        BinaryOp::Contains => Ok(Value::Bool(contains(l, r))),
    }
}

fn arithmetic<F>(l: &Value, op: BinaryOp, r: &Value, f: F) -> Result<Value, ExpressionError>
where
    F: Fn(f64, f64) -> f64,
{
    let symbol = op.to_string();
    let a = as_number(l, &symbol)?;
    let b = as_number(r, &symbol)?;
    number_value(f(a, b))
}

/// Ordering for numbers and strings; anything else is unordered
fn compare(l: &Value, r: &Value) -> Option<Ordering> {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::String(s), Value::String(sub)) => s.contains(sub.as_str()),
        (Value::Array(items), _) => items.iter().any(|item| loose_equals(item, needle)),
        (Value::Object(map), Value::String(key)) => map.contains_key(key),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::parser::{parse_expression, parse_script};
    use serde_json::json;

    fn vars(value: Value) -> Variables {
        match value {
            Value::Object(map) => map,
            _ => panic!("test context must be an object"),
        }
    }

    fn eval(input: &str, ctx: Value) -> Result<Value, ExpressionError> {
        eval_expr(&parse_expression(input).unwrap(), &vars(ctx))
    }

    #[test]
    fn test_number_comparison() {
        let ctx = json!({"score": 7.5});
        assert_eq!(eval("score > 5", ctx.clone()).unwrap(), json!(true));
        assert_eq!(eval("score >= 7.5", ctx.clone()).unwrap(), json!(true));
        assert_eq!(eval("score < 7", ctx.clone()).unwrap(), json!(false));
        assert_eq!(eval("score <= 7.5", ctx).unwrap(), json!(true));
    }

    #[test]
    fn test_string_equality() {
        let ctx = json!({"intent": "search"});
        assert_eq!(eval("intent == 'search'", ctx.clone()).unwrap(), json!(true));
        assert_eq!(eval("intent === \"code\"", ctx.clone()).unwrap(), json!(false));
        assert_eq!(eval("intent != 'code'", ctx).unwrap(), json!(true));
    }

    #[test]
    fn test_arithmetic() {
        let ctx = json!({"price": 20, "qty": 3});
        assert_eq!(eval("price * qty + 1", ctx.clone()).unwrap(), json!(61));
        assert_eq!(eval("price / 8", ctx.clone()).unwrap(), json!(2.5));
        assert_eq!(eval("qty % 2", ctx.clone()).unwrap(), json!(1));
        assert_eq!(eval("-qty", ctx).unwrap(), json!(-3));
    }

    #[test]
    fn test_division_by_zero_is_error() {
        assert_eq!(eval("1 / 0", json!({})), Err(ExpressionError::NonFinite));
    }

    #[test]
    fn test_string_concatenation() {
        let ctx = json!({"name": "Ada", "n": 2});
        assert_eq!(
            eval("'hi ' + name + ' #' + n", ctx).unwrap(),
            json!("hi Ada #2")
        );
    }

    #[test]
    fn test_arithmetic_on_non_number_is_type_error() {
        let err = eval("flag - 1", json!({"flag": true})).unwrap_err();
        assert!(matches!(err, ExpressionError::Type(_)));
    }

    #[test]
    fn test_logical_returns_operand() {
        let ctx = json!({"label": "", "fallback": "n/a"});
        assert_eq!(eval("label || fallback", ctx.clone()).unwrap(), json!("n/a"));
        assert_eq!(eval("label && fallback", ctx).unwrap(), json!(""));
    }

    #[test]
    fn test_short_circuit_skips_undefined_variable() {
        assert_eq!(eval("false && missing", json!({})).unwrap(), json!(false));
        assert_eq!(eval("true || missing", json!({})).unwrap(), json!(true));
    }

    #[test]
    fn test_undefined_variable_is_error() {
        assert_eq!(
            eval("missing > 1", json!({})),
            Err(ExpressionError::UndefinedVariable("missing".to_string()))
        );
    }

    #[test]
    fn test_nested_member_access() {
        let ctx = json!({"order": {"customer": {"tier": "gold"}, "items": [1, 2, 3]}});
        assert_eq!(
            eval("order.customer.tier == 'gold'", ctx.clone()).unwrap(),
            json!(true)
        );
        assert_eq!(eval("order.items.length", ctx.clone()).unwrap(), json!(3));
        assert_eq!(eval("order.items[1]", ctx.clone()).unwrap(), json!(2));
        assert_eq!(eval("order['customer'].tier", ctx.clone()).unwrap(), json!("gold"));
        assert_eq!(eval("order.missing", ctx).unwrap(), json!(null));
    }

    #[test]
    fn test_member_of_null_is_error() {
        let err = eval("order.missing.tier", json!({"order": {}})).unwrap_err();
        assert!(matches!(err, ExpressionError::Type(_)));
    }

    #[test]
    fn test_contains() {
        let ctx = json!({"tags": ["bug", "urgent"], "message": "hello world", "meta": {"k": 1}});
        assert_eq!(eval("tags contains 'bug'", ctx.clone()).unwrap(), json!(true));
        assert_eq!(eval("tags contains 'ui'", ctx.clone()).unwrap(), json!(false));
        assert_eq!(eval("message contains 'world'", ctx.clone()).unwrap(), json!(true));
        assert_eq!(eval("meta contains 'k'", ctx).unwrap(), json!(true));
    }

    #[test]
    fn test_mixed_type_comparison_is_false() {
        assert_eq!(eval("'10' > 5", json!({})).unwrap(), json!(false));
        assert_eq!(eval("x < 1", json!({"x": null})).unwrap(), json!(false));
    }

    #[test]
    fn test_ternary() {
        assert_eq!(
            eval("amount > 100 ? 'manual' : 'auto'", json!({"amount": 150})).unwrap(),
            json!("manual")
        );
    }

    #[test]
    fn test_script_returns_object() {
        let script = parse_script(
            r#"
            let total = price * qty
            if (total > 50) {
                return { total, approved: false }
            }
            return { total, approved: true }
            "#,
        )
        .unwrap();
        let mut ctx = vars(json!({"price": 20, "qty": 3}));
        let result = run_script(&script, &mut ctx).unwrap();
        assert_eq!(result, json!({"total": 60, "approved": false}));
    }

    #[test]
    fn test_script_without_return_yields_null() {
        let script = parse_script("count += 1").unwrap();
        let mut ctx = vars(json!({"count": 1}));
        assert_eq!(run_script(&script, &mut ctx).unwrap(), json!(null));
        assert_eq!(ctx["count"], json!(2));
    }

    #[test]
    fn test_compound_assignment_to_undefined_is_error() {
        let script = parse_script("count += 1").unwrap();
        let mut ctx = Variables::new();
        assert_eq!(
            run_script(&script, &mut ctx),
            Err(ExpressionError::UndefinedVariable("count".to_string()))
        );
    }

    #[test]
    fn test_else_if_chain() {
        let script = parse_script(
            "if (n > 10) { return 'big' } else if (n > 5) { return 'mid' } else { return 'small' }",
        )
        .unwrap();
        let mut ctx = vars(json!({"n": 7}));
        assert_eq!(run_script(&script, &mut ctx).unwrap(), json!("mid"));
    }
}
