// SPDX-License-Identifier: MIT

//! Tokenizer for conditions and scripts

use crate::error::ExpressionError;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A lexical token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),

    // Keywords
    True,
    False,
    Null,
    Undefined,
    And,
    Or,
    Not,
    Contains,
    Let,
    If,
    Else,
    Return,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Question,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    AndAnd,
    OrOr,
    Assign,
    PlusAssign,
    MinusAssign,

    Eof,
}

/// A token with the character offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

static KEYWORDS: Lazy<HashMap<&'static str, Token>> = Lazy::new(|| {
    HashMap::from([
        ("true", Token::True),
        ("false", Token::False),
        ("null", Token::Null),
        ("undefined", Token::Undefined),
        ("and", Token::And),
        ("or", Token::Or),
        ("not", Token::Not),
        ("contains", Token::Contains),
        ("let", Token::Let),
        ("const", Token::Let),
        ("var", Token::Let),
        ("if", Token::If),
        ("else", Token::Else),
        ("return", Token::Return),
    ])
});

/// Split source text into tokens. The returned vector always ends with `Eof`.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, ExpressionError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Line comment
        if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }

        if c.is_ascii_digit() {
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if chars.get(i) == Some(&'.') && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())
            {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let text: String = chars[start..i].iter().collect();
            let n = text
                .parse::<f64>()
                .map_err(|_| ExpressionError::InvalidNumber(text.clone()))?;
            tokens.push(Spanned {
                token: Token::Number(n),
                position: start,
            });
            continue;
        }

        if c == '\'' || c == '"' {
            let (s, next) = read_string(&chars, i)?;
            tokens.push(Spanned {
                token: Token::Str(s),
                position: start,
            });
            i = next;
            continue;
        }

        if c.is_alphabetic() || c == '_' || c == '$' {
            while i < chars.len()
                && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
            {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let token = KEYWORDS
                .get(word.as_str())
                .cloned()
                .unwrap_or(Token::Ident(word));
            tokens.push(Spanned {
                token,
                position: start,
            });
            continue;
        }

        let (token, width) = read_operator(&chars, i)?;
        tokens.push(Spanned {
            token,
            position: start,
        });
        i += width;
    }

    tokens.push(Spanned {
        token: Token::Eof,
        position: chars.len(),
    });
    Ok(tokens)
}

fn read_string(chars: &[char], start: usize) -> Result<(String, usize), ExpressionError> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        let c = chars[i];
        if c == quote {
            return Ok((out, i + 1));
        }
        if c == '\\' {
            let escaped = chars
                .get(i + 1)
                .ok_or(ExpressionError::UnterminatedString(start))?;
            out.push(match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                other => *other,
            });
            i += 2;
            continue;
        }
        out.push(c);
        i += 1;
    }

    Err(ExpressionError::UnterminatedString(start))
}

fn read_operator(chars: &[char], i: usize) -> Result<(Token, usize), ExpressionError> {
    let at = |offset: usize| chars.get(i + offset).copied();
    let c = chars[i];

    let matched = match (c, at(1), at(2)) {
        ('=', Some('='), Some('=')) => (Token::Eq, 3),
        ('!', Some('='), Some('=')) => (Token::NotEq, 3),
        ('=', Some('='), _) => (Token::Eq, 2),
        ('!', Some('='), _) => (Token::NotEq, 2),
        ('<', Some('='), _) => (Token::Lte, 2),
        ('>', Some('='), _) => (Token::Gte, 2),
        ('&', Some('&'), _) => (Token::AndAnd, 2),
        ('|', Some('|'), _) => (Token::OrOr, 2),
        ('+', Some('='), _) => (Token::PlusAssign, 2),
        ('-', Some('='), _) => (Token::MinusAssign, 2),
        ('=', _, _) => (Token::Assign, 1),
        ('!', _, _) => (Token::Bang, 1),
        ('<', _, _) => (Token::Lt, 1),
        ('>', _, _) => (Token::Gt, 1),
        ('+', _, _) => (Token::Plus, 1),
        ('-', _, _) => (Token::Minus, 1),
        ('*', _, _) => (Token::Star, 1),
        ('/', _, _) => (Token::Slash, 1),
        ('%', _, _) => (Token::Percent, 1),
        ('(', _, _) => (Token::LParen, 1),
        (')', _, _) => (Token::RParen, 1),
        ('{', _, _) => (Token::LBrace, 1),
        ('}', _, _) => (Token::RBrace, 1),
        ('[', _, _) => (Token::LBracket, 1),
        (']', _, _) => (Token::RBracket, 1),
        (',', _, _) => (Token::Comma, 1),
        (':', _, _) => (Token::Colon, 1),
        (';', _, _) => (Token::Semicolon, 1),
        ('.', _, _) => (Token::Dot, 1),
        ('?', _, _) => (Token::Question, 1),
        (found, _, _) => {
            return Err(ExpressionError::UnexpectedChar { found, position: i });
        }
    };

    Ok(matched)
}
