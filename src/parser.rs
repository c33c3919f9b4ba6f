use tracing::debug;

use crate::ast::*;
use crate::error::{Error, Result};
use crate::expression::{BinaryOperator, ExpressionBuilder, ExpressionTree};
use crate::lexer::{tokenize, Token};
use crate::tuple::Value;

fn syntax(message: impl Into<String>) -> Error {
    Error::SqlSyntax(message.into())
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> &Token {
        self.pos += 1;
        self.tokens.get(self.pos - 1).unwrap_or(&Token::Eof)
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(syntax(format!("expected {expected}, got {}", self.peek())))
        }
    }

    /// SELECT (* | columns) (ORDER BY items | WHERE expr)* FROM tables
    pub fn parse(&mut self) -> Result<QueryPlan> {
        let mut plan = QueryPlan::default();

        self.expect(Token::Select)?;
        if *self.peek() == Token::Asterisk {
            self.advance();
        } else {
            loop {
                plan.select_columns.push(self.parse_column()?);
                if *self.peek() == Token::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let mut seen_order = false;
        loop {
            match self.peek() {
                Token::Order => {
                    if seen_order {
                        return Err(syntax("ORDER BY given twice"));
                    }
                    seen_order = true;
                    self.advance();
                    self.expect(Token::By)?;
                    loop {
                        plan.order_by.push(self.parse_order_item()?);
                        if *self.peek() == Token::Comma {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                Token::Where => {
                    if plan.where_clause.is_some() {
                        return Err(syntax("WHERE given twice"));
                    }
                    self.advance();
                    plan.where_clause = Some(self.parse_where()?);
                }
                _ => break,
            }
        }

        self.expect(Token::From)?;
        loop {
            plan.table_names.push(self.parse_ident()?);
            if *self.peek() == Token::Comma {
                self.advance();
            } else {
                break;
            }
        }

        if *self.peek() != Token::Eof {
            return Err(syntax(format!(
                "unexpected {} after table list",
                self.peek()
            )));
        }
        Ok(plan)
    }

    fn parse_ident(&mut self) -> Result<String> {
        match self.peek().clone() {
            Token::Ident(s) => {
                self.advance();
                Ok(s)
            }
            other => Err(syntax(format!("expected identifier, got {other}"))),
        }
    }

    // ident | ident . ident
    fn parse_column(&mut self) -> Result<Column> {
        let first = self.parse_ident()?;
        if *self.peek() == Token::Dot {
            self.advance();
            let column_name = self.parse_ident()?;
            Ok(Column::qualified(first, column_name))
        } else {
            Ok(Column::new(first))
        }
    }

    fn parse_order_item(&mut self) -> Result<OrderByItem> {
        let column = self.parse_column()?;
        let direction = match self.peek() {
            Token::Asc => {
                self.advance();
                SortDirection::Asc
            }
            Token::Desc => {
                self.advance();
                SortDirection::Desc
            }
            _ => SortDirection::Asc,
        };
        Ok(OrderByItem { column, direction })
    }

    fn parse_where(&mut self) -> Result<ExpressionTree> {
        let mut builder = ExpressionBuilder::new();
        let mut current = None;

        loop {
            let leaf = builder.attach_operand(current);

            while *self.peek() == Token::LParen {
                self.advance();
                builder.open_paren(leaf);
            }

            let sign = match self.peek() {
                Token::Plus => Some(1),
                Token::Minus => Some(-1),
                _ => None,
            };
            if sign.is_some() {
                self.advance();
                if !matches!(self.peek(), Token::Ident(_) | Token::IntLiteral(_)) {
                    return Err(Error::WhereOperandType(format!(
                        "sign cannot be applied to {}",
                        self.peek()
                    )));
                }
            }

            match self.peek().clone() {
                Token::Ident(_) => {
                    let column = self.parse_column()?;
                    let node = builder.node_mut(leaf);
                    node.column = Some(column);
                    node.sign = sign.unwrap_or(1);
                }
                Token::IntLiteral(text) => {
                    self.advance();
                    let value = parse_integer(&text, sign.unwrap_or(1))?;
                    builder.node_mut(leaf).literal = Some(Value::Integer(value));
                }
                Token::StringLiteral(text) => {
                    self.advance();
                    let inner = &text[1..text.len() - 1];
                    builder.node_mut(leaf).literal = Some(Value::String(inner.to_string()));
                }
                other => return Err(syntax(format!("expected operand, got {other}"))),
            }

            while *self.peek() == Token::RParen {
                self.advance();
                builder.close_paren(leaf);
            }

            match BinaryOperator::from_token(self.peek()) {
                Some(op) => {
                    self.advance();
                    current = Some(builder.insert_operator(leaf, op));
                }
                None => return Ok(builder.finish(leaf)),
            }
        }
    }
}

// The sign is folded in before parsing so i64::MIN is representable.
fn parse_integer(digits: &str, sign: i64) -> Result<i64> {
    let text = if sign < 0 {
        format!("-{digits}")
    } else {
        digits.to_string()
    };
    text.parse::<i64>()
        .map_err(|_| syntax(format!("integer literal {text} is out of range")))
}

pub fn parse(sql: &str) -> Result<QueryPlan> {
    let tokens = tokenize(sql)?;
    let plan = Parser::new(tokens).parse()?;
    debug!(
        tables = ?plan.table_names,
        columns = plan.select_columns.len(),
        order_keys = plan.order_by.len(),
        filtered = plan.where_clause.is_some(),
        "parsed query"
    );
    Ok(plan)
}
