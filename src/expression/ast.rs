// SPDX-License-Identifier: MIT

//! Abstract Syntax Tree for conditions and task scripts

use serde_json::Value;

/// An expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value (`1`, `'text'`, `true`, `null`)
    Literal(Value),
    /// Bare identifier resolved against the variable context
    Variable(String),
    /// `object.property`
    Member {
        object: Box<Expr>,
        property: String,
    },
    /// `object[index]`
    Index { object: Box<Expr>, index: Box<Expr> },
    /// Prefix operator
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Arithmetic, comparison, equality and `contains`
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// Short-circuiting `&&` / `||`
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    /// `condition ? consequent : alternate`
    Conditional {
        condition: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    /// `[a, b, c]`
    Array(Vec<Expr>),
    /// `{ key: value }`
    Object(Vec<(String, Expr)>),
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// `!` / `not`
    Not,
    /// `-`
    Negate,
    /// `+`
    Plus,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    /// `==` / `===`
    Eq,
    /// `!=` / `!==`
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    /// contains (for strings, arrays and object keys)
    Contains,
}

/// Logical operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogicalOp {
    And,
    Or,
}

/// A script statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let name = value` (also `const` / `var`)
    Let { name: String, value: Expr },
    /// `name = value`, `name += value`, `name -= value`
    Assign {
        name: String,
        op: AssignOp,
        value: Expr,
    },
    /// Expression evaluated for its side-effect free value
    Expr(Expr),
    /// `if (condition) { ... } else { ... }`
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
    },
    /// `return value`
    Return(Option<Expr>),
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
}

/// A parsed multi-statement script
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    pub body: Vec<Stmt>,
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Rem => write!(f, "%"),
            BinaryOp::Eq => write!(f, "=="),
            BinaryOp::NotEq => write!(f, "!="),
            BinaryOp::Lt => write!(f, "<"),
            BinaryOp::Lte => write!(f, "<="),
            BinaryOp::Gt => write!(f, ">"),
            BinaryOp::Gte => write!(f, ">="),
            BinaryOp::Contains => write!(f, "contains"),
        }
    }
}
