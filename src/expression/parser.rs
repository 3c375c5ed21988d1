// SPDX-License-Identifier: MIT

//! Recursive-descent parser for conditions and scripts
//!
//! Precedence, lowest first:
//! ternary, `||`/`or`, `&&`/`and`, equality, comparison/`contains`,
//! additive, multiplicative, unary, member/index access.

use super::ast::{AssignOp, BinaryOp, Expr, LogicalOp, Script, Stmt, UnaryOp};
use super::lexer::{tokenize, Spanned, Token};
use crate::error::ExpressionError;
use serde_json::Value;

/// Deepest nesting of groups, operator chains and blocks a parse may reach
pub const MAX_DEPTH: usize = 128;

/// Parse a single expression. Trailing tokens are an error.
pub fn parse_expression(input: &str) -> Result<Expr, ExpressionError> {
    let mut parser = Parser::new(tokenize(input)?);
    let expr = parser.expression()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parse a multi-statement script
pub fn parse_script(input: &str) -> Result<Script, ExpressionError> {
    let mut parser = Parser::new(tokenize(input)?);
    let mut body = Vec::new();
    while !parser.check(&Token::Eof) {
        body.push(parser.statement()?);
    }
    Ok(Script { body })
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Go one level deeper; every level becomes at least one tree level
    /// that evaluation walks recursively.
    fn enter(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExpressionError::parse("Expression nested too deeply"));
        }
        Ok(())
    }

    fn leave(&mut self, levels: usize) {
        self.depth = self.depth.saturating_sub(levels);
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].token
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].token
    }

    fn position(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].position
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), ExpressionError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_end(&self) -> Result<(), ExpressionError> {
        if self.check(&Token::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("end of expression"))
        }
    }

    fn unexpected(&self, expected: &str) -> ExpressionError {
        match self.peek() {
            Token::Eof => ExpressionError::parse(format!(
                "Unexpected end of input, expected {}",
                expected
            )),
            other => ExpressionError::parse(format!(
                "Unexpected token {:?} at position {}, expected {}",
                other,
                self.position(),
                expected
            )),
        }
    }

    fn identifier(&mut self, what: &str) -> Result<String, ExpressionError> {
        match self.peek().clone() {
            Token::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    // ---- statements ----

    fn statement(&mut self) -> Result<Stmt, ExpressionError> {
        let stmt = match self.peek() {
            Token::Let => {
                self.advance();
                let name = self.identifier("variable name")?;
                self.expect(&Token::Assign, "'='")?;
                let value = self.expression()?;
                Stmt::Let { name, value }
            }
            Token::If => return self.if_statement(),
            Token::Return => {
                self.advance();
                if matches!(self.peek(), Token::Semicolon | Token::RBrace | Token::Eof) {
                    Stmt::Return(None)
                } else {
                    Stmt::Return(Some(self.expression()?))
                }
            }
            Token::Ident(_)
                if matches!(
                    self.peek_next(),
                    Token::Assign | Token::PlusAssign | Token::MinusAssign
                ) =>
            {
                let name = self.identifier("variable name")?;
                let op = match self.advance() {
                    Token::PlusAssign => AssignOp::Add,
                    Token::MinusAssign => AssignOp::Sub,
                    _ => AssignOp::Set,
                };
                let value = self.expression()?;
                Stmt::Assign { name, op, value }
            }
            _ => Stmt::Expr(self.expression()?),
        };

        while self.eat(&Token::Semicolon) {}
        Ok(stmt)
    }

    fn if_statement(&mut self) -> Result<Stmt, ExpressionError> {
        self.expect(&Token::If, "'if'")?;
        self.expect(&Token::LParen, "'('")?;
        let condition = self.expression()?;
        self.expect(&Token::RParen, "')'")?;
        let then_branch = self.block()?;

        let else_branch = if self.eat(&Token::Else) {
            if self.check(&Token::If) {
                self.enter()?;
                let nested = self.if_statement()?;
                self.leave(1);
                vec![nested]
            } else {
                self.block()?
            }
        } else {
            Vec::new()
        };

        while self.eat(&Token::Semicolon) {}
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ExpressionError> {
        self.enter()?;
        let body = self.block_body()?;
        self.leave(1);
        Ok(body)
    }

    fn block_body(&mut self) -> Result<Vec<Stmt>, ExpressionError> {
        self.expect(&Token::LBrace, "'{'")?;
        let mut body = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.check(&Token::Eof) {
                return Err(self.unexpected("'}'"));
            }
            body.push(self.statement()?);
        }
        self.advance();
        Ok(body)
    }

    // ---- expressions ----

    fn expression(&mut self) -> Result<Expr, ExpressionError> {
        self.enter()?;
        let expr = self.conditional()?;
        self.leave(1);
        Ok(expr)
    }

    fn conditional(&mut self) -> Result<Expr, ExpressionError> {
        let condition = self.logical_or()?;
        if !self.eat(&Token::Question) {
            return Ok(condition);
        }
        let consequent = self.expression()?;
        self.expect(&Token::Colon, "':'")?;
        let alternate = self.expression()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn logical_or(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.logical_and()?;
        let mut levels = 0;
        while matches!(self.peek(), Token::OrOr | Token::Or) {
            self.advance();
            self.enter()?;
            levels += 1;
            let right = self.logical_and()?;
            left = Expr::Logical {
                left: Box::new(left),
                op: LogicalOp::Or,
                right: Box::new(right),
            };
        }
        self.leave(levels);
        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.equality()?;
        let mut levels = 0;
        while matches!(self.peek(), Token::AndAnd | Token::And) {
            self.advance();
            self.enter()?;
            levels += 1;
            let right = self.equality()?;
            left = Expr::Logical {
                left: Box::new(left),
                op: LogicalOp::And,
                right: Box::new(right),
            };
        }
        self.leave(levels);
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.comparison()?;
        let mut levels = 0;
        loop {
            let op = match self.peek() {
                Token::Eq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            self.advance();
            self.enter()?;
            levels += 1;
            left = binary(left, op, self.comparison()?);
        }
        self.leave(levels);
        Ok(left)
    }

    fn comparison(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.additive()?;
        let mut levels = 0;
        loop {
            let op = match self.peek() {
                Token::Lt => BinaryOp::Lt,
                Token::Lte => BinaryOp::Lte,
                Token::Gt => BinaryOp::Gt,
                Token::Gte => BinaryOp::Gte,
                Token::Contains => BinaryOp::Contains,
                _ => break,
            };
            self.advance();
            self.enter()?;
            levels += 1;
            left = binary(left, op, self.additive()?);
        }
        self.leave(levels);
        Ok(left)
    }

    fn additive(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.multiplicative()?;
        let mut levels = 0;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            self.enter()?;
            levels += 1;
            left = binary(left, op, self.multiplicative()?);
        }
        self.leave(levels);
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.unary()?;
        let mut levels = 0;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Rem,
                _ => break,
            };
            self.advance();
            self.enter()?;
            levels += 1;
            left = binary(left, op, self.unary()?);
        }
        self.leave(levels);
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ExpressionError> {
        let op = match self.peek() {
            Token::Bang | Token::Not => UnaryOp::Not,
            Token::Minus => UnaryOp::Negate,
            Token::Plus => UnaryOp::Plus,
            _ => return self.postfix(),
        };
        self.advance();
        self.enter()?;
        let operand = self.unary()?;
        self.leave(1);
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.primary()?;
        let mut levels = 0;
        loop {
            if matches!(self.peek(), Token::Dot | Token::LBracket) {
                self.enter()?;
                levels += 1;
            }
            if self.eat(&Token::Dot) {
                let property = self.identifier("property name")?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                };
            } else if self.eat(&Token::LBracket) {
                let index = self.expression()?;
                self.expect(&Token::RBracket, "']'")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                self.leave(levels);
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ExpressionError> {
        let expr = match self.peek().clone() {
            Token::Number(n) => Expr::Literal(
                serde_json::Number::from_f64(n)
                    .map(Value::Number)
                    .ok_or(ExpressionError::NonFinite)?,
            ),
            Token::Str(s) => Expr::Literal(Value::String(s)),
            Token::True => Expr::Literal(Value::Bool(true)),
            Token::False => Expr::Literal(Value::Bool(false)),
            Token::Null | Token::Undefined => Expr::Literal(Value::Null),
            Token::Ident(name) => Expr::Variable(name),
            Token::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(&Token::RParen, "')'")?;
                return Ok(inner);
            }
            Token::LBracket => return self.array_literal(),
            Token::LBrace => return self.object_literal(),
            _ => return Err(self.unexpected("a value")),
        };
        self.advance();
        Ok(expr)
    }

    fn array_literal(&mut self) -> Result<Expr, ExpressionError> {
        self.expect(&Token::LBracket, "'['")?;
        let mut items = Vec::new();
        while !self.check(&Token::RBracket) {
            items.push(self.expression()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RBracket, "']'")?;
        Ok(Expr::Array(items))
    }

    fn object_literal(&mut self) -> Result<Expr, ExpressionError> {
        self.expect(&Token::LBrace, "'{'")?;
        let mut entries = Vec::new();
        while !self.check(&Token::RBrace) {
            let key = match self.advance() {
                Token::Ident(name) | Token::Str(name) => name,
                _ => return Err(ExpressionError::parse("Object keys must be names or strings")),
            };
            let value = if self.eat(&Token::Colon) {
                self.expression()?
            } else {
                // Shorthand `{ amount }`
                Expr::Variable(key.clone())
            };
            entries.push((key, value));
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RBrace, "'}'")?;
        Ok(Expr::Object(entries))
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::Variable(name.to_string()))
    }

    fn lit(value: Value) -> Box<Expr> {
        Box::new(Expr::Literal(value))
    }

    #[test]
    fn test_parse_simple_comparison() {
        let expr = parse_expression("amount > 100").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                left: var("amount"),
                op: BinaryOp::Gt,
                right: lit(json!(100.0)),
            }
        );
    }

    #[test]
    fn test_parse_string_equality() {
        let expr = parse_expression("status == 'approved'").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                left: var("status"),
                op: BinaryOp::Eq,
                right: lit(json!("approved")),
            }
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse_expression("a || b && c").unwrap();
        match expr {
            Expr::Logical {
                op: LogicalOp::Or,
                right,
                ..
            } => assert!(matches!(
                *right,
                Expr::Logical {
                    op: LogicalOp::And,
                    ..
                }
            )),
            other => panic!("Expected Or at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        match expr {
            Expr::Binary {
                op: BinaryOp::Add,
                right,
                ..
            } => assert!(matches!(
                *right,
                Expr::Binary {
                    op: BinaryOp::Mul,
                    ..
                }
            )),
            other => panic!("Expected Add at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_member_and_index() {
        let expr = parse_expression("order.items[0]").unwrap();
        assert_eq!(
            expr,
            Expr::Index {
                object: Box::new(Expr::Member {
                    object: var("order"),
                    property: "items".to_string(),
                }),
                index: lit(json!(0.0)),
            }
        );
    }

    #[test]
    fn test_parse_word_operators() {
        let expr = parse_expression("not rejected and tags contains 'vip'").unwrap();
        assert!(matches!(
            expr,
            Expr::Logical {
                op: LogicalOp::And,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_ternary() {
        let expr = parse_expression("score > 5 ? 'high' : 'low'").unwrap();
        assert!(matches!(expr, Expr::Conditional { .. }));
    }

    #[test]
    fn test_parse_object_literal_with_shorthand() {
        let expr = parse_expression("{ approved: true, amount }").unwrap();
        assert_eq!(
            expr,
            Expr::Object(vec![
                ("approved".to_string(), Expr::Literal(json!(true))),
                ("amount".to_string(), Expr::Variable("amount".to_string())),
            ])
        );
    }

    #[test]
    fn test_incomplete_expression_is_error() {
        let err = parse_expression("amount >").unwrap_err();
        assert!(err.to_string().contains("Unexpected end of input"));
    }

    #[test]
    fn test_trailing_tokens_are_error() {
        assert!(parse_expression("a b").is_err());
        assert!(parse_expression("(a").is_err());
        assert!(parse_expression("").is_err());
    }

    #[test]
    fn test_parse_script_statements() {
        let script = parse_script(
            r#"
            let total = price * qty;
            discount = 0
            total -= discount
            if (total > 1000) { return { tier: 'gold' } } else { return { tier: 'std' } }
            "#,
        )
        .unwrap();

        assert_eq!(script.body.len(), 4);
        assert!(matches!(script.body[0], Stmt::Let { .. }));
        assert!(matches!(
            script.body[1],
            Stmt::Assign {
                op: AssignOp::Set,
                ..
            }
        ));
        assert!(matches!(
            script.body[2],
            Stmt::Assign {
                op: AssignOp::Sub,
                ..
            }
        ));
        match &script.body[3] {
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                assert_eq!(then_branch.len(), 1);
                assert_eq!(else_branch.len(), 1);
            }
            other => panic!("Expected If, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_else_if_chain() {
        let script =
            parse_script("if (a) { return 1 } else if (b) { return 2 } else { return 3 }").unwrap();
        match &script.body[0] {
            Stmt::If { else_branch, .. } => {
                assert!(matches!(else_branch[0], Stmt::If { .. }));
            }
            other => panic!("Expected If, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_return() {
        let script = parse_script("return;").unwrap();
        assert_eq!(script.body, vec![Stmt::Return(None)]);
    }

    #[test]
    fn test_unclosed_block_is_error() {
        assert!(parse_script("if (x) { return 1").is_err());
    }

    fn too_deep(result: Result<impl std::fmt::Debug, ExpressionError>) -> bool {
        matches!(result, Err(ExpressionError::Parse(ref m)) if m.contains("nested too deeply"))
    }

    #[test]
    fn test_deep_parentheses_are_rejected() {
        let input = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert!(too_deep(parse_expression(&input)));
    }

    #[test]
    fn test_deep_unary_and_chains_are_rejected() {
        assert!(too_deep(parse_expression(&format!("{}true", "!".repeat(200_000)))));
        assert!(too_deep(parse_expression(&vec!["a"; 5_000].join(" + "))));
        assert!(too_deep(parse_expression(&format!("a{}", ".b".repeat(5_000)))));
        assert!(too_deep(parse_expression(&format!(
            "{}1{}",
            "[".repeat(5_000),
            "]".repeat(5_000)
        ))));
    }

    #[test]
    fn test_deep_blocks_are_rejected() {
        let input = format!("{}return 1{}", "if (a) { ".repeat(5_000), " }".repeat(5_000));
        assert!(too_deep(parse_script(&input)));
        let chain = format!("{}{{ return 1 }}", "if (a) { return 1 } else ".repeat(5_000));
        assert!(too_deep(parse_script(&chain)));
    }

    #[test]
    fn test_moderate_nesting_still_parses() {
        let input = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        assert_eq!(parse_expression(&input).unwrap(), *lit(json!(1.0)));
        assert!(parse_expression(&vec!["a"; 50].join(" && ")).is_ok());
        assert!(parse_script("let x = 1; let y = 2; let z = 3; return x + y + z").is_ok());
    }
}
