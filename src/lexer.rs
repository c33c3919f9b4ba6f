use std::fmt;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    And,
    Asc,
    By,
    Desc,
    From,
    Order,
    Or,
    Select,
    Where,

    // Identifiers and literals, with their spelling as written
    Ident(String),
    IntLiteral(String),
    StringLiteral(String), // quotes included

    // Symbols
    Asterisk,   // *
    Comma,      // ,
    Dot,        // .
    LParen,     // (
    RParen,     // )
    Eq,         // =
    Ne,         // <>
    Lt,         // <
    Le,         // <=
    Gt,         // >
    Ge,         // >=
    Plus,       // +
    Minus,      // -
    Slash,      // /

    Eof,
}

// Tried in order; whole-word, case-insensitive.
const KEYWORDS: &[(&str, Token)] = &[
    ("AND", Token::And),
    ("ASC", Token::Asc),
    ("BY", Token::By),
    ("DESC", Token::Desc),
    ("FROM", Token::From),
    ("ORDER", Token::Order),
    ("OR", Token::Or),
    ("SELECT", Token::Select),
    ("WHERE", Token::Where),
];

// Longest spelling first so `>=` wins over `>`.
const SYMBOLS: &[(&str, Token)] = &[
    (">=", Token::Ge),
    ("<=", Token::Le),
    ("<>", Token::Ne),
    ("*", Token::Asterisk),
    (",", Token::Comma),
    (")", Token::RParen),
    (".", Token::Dot),
    ("=", Token::Eq),
    (">", Token::Gt),
    ("<", Token::Lt),
    ("-", Token::Minus),
    ("(", Token::LParen),
    ("+", Token::Plus),
    ("/", Token::Slash),
];

impl Token {
    /// Literal text carried by identifiers and literals.
    pub fn text(&self) -> Option<&str> {
        match self {
            Token::Ident(s) | Token::IntLiteral(s) | Token::StringLiteral(s) => Some(s),
            _ => None,
        }
    }

    /// How the token is written in a query.
    pub fn spelling(&self) -> &str {
        if let Some(text) = self.text() {
            return text;
        }
        if *self == Token::Eof {
            return "";
        }
        KEYWORDS
            .iter()
            .chain(SYMBOLS)
            .find(|(_, token)| *token == *self)
            .map(|(spelling, _)| *spelling)
            .unwrap_or_default()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => f.write_str("end of input"),
            other => write!(f, "'{}'", other.spelling()),
        }
    }
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, pos: 0 }
    }

    fn peek_at(&self, pos: usize) -> Option<u8> {
        self.input.as_bytes().get(pos).copied()
    }

    fn peek(&self) -> Option<u8> {
        self.peek_at(self.pos)
    }

    fn rest(&self) -> &'a [u8] {
        &self.input.as_bytes()[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(is_space) {
            self.pos += 1;
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if token == Token::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        if self.peek().is_none() {
            return Ok(Token::Eof);
        }

        if let Some(token) = self.read_int_literal() {
            return Ok(token);
        }
        if let Some(token) = self.read_string_literal()? {
            return Ok(token);
        }
        if let Some(token) = self.read_keyword() {
            return Ok(token);
        }
        if let Some(token) = self.read_symbol() {
            return Ok(token);
        }
        if let Some(token) = self.read_ident() {
            return Ok(token);
        }
        Err(Error::TokenCantRead { offset: self.pos })
    }

    // A digit run directly followed by an identifier character is not a number (`1TABLE`).
    fn read_int_literal(&mut self) -> Option<Token> {
        let len = self.rest().iter().take_while(|b| b.is_ascii_digit()).count();
        if len == 0 || self.peek_at(self.pos + len).is_some_and(is_ident_start) {
            return None;
        }
        let start = self.pos;
        self.pos += len;
        Some(Token::IntLiteral(self.input[start..self.pos].to_string()))
    }

    fn read_string_literal(&mut self) -> Result<Option<Token>> {
        if self.peek() != Some(b'\'') {
            return Ok(None);
        }
        let start = self.pos;
        let close = self.rest()[1..]
            .iter()
            .position(|&b| b == b'\'')
            .ok_or(Error::TokenCantRead { offset: start })?;
        self.pos += close + 2;
        Ok(Some(Token::StringLiteral(
            self.input[start..self.pos].to_string(),
        )))
    }

    fn read_keyword(&mut self) -> Option<Token> {
        let rest = self.rest();
        for (word, token) in KEYWORDS {
            let len = word.len();
            if rest.len() >= len
                && rest[..len].eq_ignore_ascii_case(word.as_bytes())
                && !self.peek_at(self.pos + len).is_some_and(is_ident_continue)
            {
                self.pos += len;
                return Some(token.clone());
            }
        }
        None
    }

    fn read_symbol(&mut self) -> Option<Token> {
        let rest = self.rest();
        let (spelling, token) = SYMBOLS
            .iter()
            .find(|(spelling, _)| rest.starts_with(spelling.as_bytes()))?;
        self.pos += spelling.len();
        Some(token.clone())
    }

    fn read_ident(&mut self) -> Option<Token> {
        if !self.peek().is_some_and(is_ident_start) {
            return None;
        }
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.pos += 1;
        }
        Some(Token::Ident(self.input[start..self.pos].to_string()))
    }
}

pub fn tokenize(sql: &str) -> Result<Vec<Token>> {
    Lexer::new(sql).tokenize()
}
