//! Parser for equations written in Einstein index notation.
//!
//! Input is a textual equation such as
//! `Eq(Der(rho, t), -Conservative(rhou_j, x_j))`. Underscores are part of
//! identifiers, so `tau_i_j` lexes as a single token and its index structure
//! is recovered by the arena when the term is interned. Calls dispatch on the
//! callee name: `Eq`, `Der`, `Conservative`, `KD` and `LC` are recognized
//! forms, anything else is a plain function application.

use smallvec::SmallVec;
use thiserror::Error;

use crate::arena::ExprArena;
use crate::expr::{ExprNode, FunctionKind};
use crate::handle::ExprHandle;

/// A syntax error, with the byte offset at which it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at byte {position}: {message}")]
pub struct ParseError {
    /// Byte offset into the input.
    pub position: usize,
    /// What went wrong.
    pub message: String,
}

impl ParseError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Int(i64),
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    LParen,
    RParen,
    Comma,
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let c = bytes[pos] as char;
        match c {
            ' ' | '\t' | '\n' | '\r' => pos += 1,
            '+' => {
                tokens.push((Token::Plus, pos));
                pos += 1;
            }
            '-' => {
                tokens.push((Token::Minus, pos));
                pos += 1;
            }
            '/' => {
                tokens.push((Token::Slash, pos));
                pos += 1;
            }
            '(' => {
                tokens.push((Token::LParen, pos));
                pos += 1;
            }
            ')' => {
                tokens.push((Token::RParen, pos));
                pos += 1;
            }
            ',' => {
                tokens.push((Token::Comma, pos));
                pos += 1;
            }
            '*' => {
                if bytes.get(pos + 1) == Some(&b'*') {
                    tokens.push((Token::StarStar, pos));
                    pos += 2;
                } else {
                    tokens.push((Token::Star, pos));
                    pos += 1;
                }
            }
            '0'..='9' => {
                let start = pos;
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
                let value: i64 = text[start..pos]
                    .parse()
                    .map_err(|_| ParseError::new(start, "integer literal out of range"))?;
                tokens.push((Token::Int(value), start));
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let start = pos;
                while pos < bytes.len()
                    && ((bytes[pos] as char).is_ascii_alphanumeric() || bytes[pos] == b'_')
                {
                    pos += 1;
                }
                tokens.push((Token::Ident(text[start..pos].to_string()), start));
            }
            _ => return Err(ParseError::new(pos, format!("unexpected character `{c}`"))),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<(Token, usize)>,
    cursor: usize,
    end: usize,
    arena: &'a mut ExprArena,
}

impl<'a> Parser<'a> {
    fn new(text: &str, arena: &'a mut ExprArena) -> Result<Self, ParseError> {
        Ok(Self {
            tokens: tokenize(text)?,
            cursor: 0,
            end: text.len(),
            arena,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|(t, _)| t)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.cursor)
            .map_or(self.end, |&(_, p)| p)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).map(|(t, _)| t.clone());
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), ParseError> {
        if self.peek() == Some(expected) {
            self.cursor += 1;
            Ok(())
        } else {
            Err(ParseError::new(self.position(), format!("expected {what}")))
        }
    }

    fn finish(&self) -> Result<(), ParseError> {
        if self.cursor == self.tokens.len() {
            Ok(())
        } else {
            Err(ParseError::new(self.position(), "unexpected trailing input"))
        }
    }

    fn parse_sum(&mut self) -> Result<ExprHandle, ParseError> {
        let mut addends: SmallVec<[ExprHandle; 4]> = SmallVec::new();
        addends.push(self.parse_product()?);
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.cursor += 1;
                    addends.push(self.parse_product()?);
                }
                Some(Token::Minus) => {
                    self.cursor += 1;
                    let rhs = self.parse_product()?;
                    addends.push(self.arena.neg(rhs));
                }
                _ => break,
            }
        }
        Ok(self.arena.add(addends))
    }

    fn parse_product(&mut self) -> Result<ExprHandle, ParseError> {
        let mut factors: SmallVec<[ExprHandle; 4]> = SmallVec::new();
        factors.push(self.parse_unary()?);
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.cursor += 1;
                    factors.push(self.parse_unary()?);
                }
                Some(Token::Slash) => {
                    self.cursor += 1;
                    let rhs = self.parse_unary()?;
                    if let Some(lhs) = factors.pop() {
                        let combined = self.divide(lhs, rhs);
                        factors.push(combined);
                    }
                }
                _ => break,
            }
        }
        Ok(self.arena.mul(factors))
    }

    /// `a/b` of two integer literals folds to a rational; otherwise it is
    /// `a * b**-1`.
    fn divide(&mut self, lhs: ExprHandle, rhs: ExprHandle) -> ExprHandle {
        if let (&ExprNode::Integer(n), &ExprNode::Integer(d)) =
            (self.arena.get(lhs), self.arena.get(rhs))
        {
            if d != 0 {
                return self.arena.rational(n, d);
            }
        }
        let minus_one = self.arena.integer(-1);
        let inverse = self.arena.pow(rhs, minus_one);
        self.arena.mul([lhs, inverse])
    }

    fn parse_unary(&mut self) -> Result<ExprHandle, ParseError> {
        if self.peek() == Some(&Token::Minus) {
            self.cursor += 1;
            let inner = self.parse_unary()?;
            return Ok(self.arena.neg(inner));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<ExprHandle, ParseError> {
        let base = self.parse_atom()?;
        if self.peek() == Some(&Token::StarStar) {
            self.cursor += 1;
            // Right-associative; the exponent may carry its own sign.
            let exp = self.parse_unary()?;
            return Ok(self.arena.pow(base, exp));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> Result<ExprHandle, ParseError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Int(v)) => Ok(self.arena.integer(v)),
            Some(Token::LParen) => {
                let inner = self.parse_sum()?;
                self.expect(&Token::RParen, "`)`")?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.cursor += 1;
                    let args = self.parse_args()?;
                    self.build_call(&name, args, position)
                } else {
                    Ok(self.arena.term_expr(&name))
                }
            }
            _ => Err(ParseError::new(position, "expected an expression")),
        }
    }

    fn parse_args(&mut self) -> Result<SmallVec<[ExprHandle; 2]>, ParseError> {
        let mut args: SmallVec<[ExprHandle; 2]> = SmallVec::new();
        if self.peek() == Some(&Token::RParen) {
            self.cursor += 1;
            return Ok(args);
        }
        loop {
            args.push(self.parse_sum()?);
            match self.advance() {
                Some(Token::Comma) => {}
                Some(Token::RParen) => break,
                _ => {
                    return Err(ParseError::new(
                        self.position(),
                        "expected `,` or `)` in argument list",
                    ))
                }
            }
        }
        Ok(args)
    }

    fn build_call(
        &mut self,
        name: &str,
        args: SmallVec<[ExprHandle; 2]>,
        position: usize,
    ) -> Result<ExprHandle, ParseError> {
        let kind = match name {
            "Der" => {
                if args.len() < 2 {
                    return Err(ParseError::new(
                        position,
                        "Der expects a target and at least one direction",
                    ));
                }
                FunctionKind::Der
            }
            "Conservative" => {
                if args.len() < 2 {
                    return Err(ParseError::new(
                        position,
                        "Conservative expects a target and at least one direction",
                    ));
                }
                FunctionKind::Conservative
            }
            "KD" => {
                if args.len() != 2 {
                    return Err(ParseError::new(position, "KD expects exactly 2 indices"));
                }
                FunctionKind::KroneckerDelta
            }
            "LC" => {
                if args.len() != 3 {
                    return Err(ParseError::new(position, "LC expects exactly 3 indices"));
                }
                FunctionKind::LeviCivita
            }
            "Eq" => {
                return Err(ParseError::new(
                    position,
                    "Eq(...) is only allowed at the top level",
                ))
            }
            _ => {
                let id = self.arena.intern_term(name);
                FunctionKind::Plain(id)
            }
        };
        Ok(self.arena.function(kind, args))
    }
}

/// Parses a standalone expression.
pub fn parse_expression(text: &str, arena: &mut ExprArena) -> Result<ExprHandle, ParseError> {
    let mut parser = Parser::new(text, arena)?;
    let expr = parser.parse_sum()?;
    parser.finish()?;
    Ok(expr)
}

/// Parses a top-level equation `Eq(lhs, rhs)`, returning the two sides.
pub fn parse_equation(
    text: &str,
    arena: &mut ExprArena,
) -> Result<(ExprHandle, ExprHandle), ParseError> {
    let mut parser = Parser::new(text, arena)?;
    let position = parser.position();
    match parser.advance() {
        Some(Token::Ident(name)) if name == "Eq" => {}
        _ => return Err(ParseError::new(position, "expected `Eq(lhs, rhs)`")),
    }
    parser.expect(&Token::LParen, "`(`")?;
    let lhs = parser.parse_sum()?;
    parser.expect(&Token::Comma, "`,`")?;
    let rhs = parser.parse_sum()?;
    parser.expect(&Token::RParen, "`)`")?;
    parser.finish()?;
    Ok((lhs, rhs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_terms_and_precedence() {
        let mut arena = ExprArena::new();
        let expr = parse_expression("a + b*c", &mut arena).unwrap();

        let a = arena.term_expr("a");
        let b = arena.term_expr("b");
        let c = arena.term_expr("c");
        let bc = arena.mul([b, c]);
        let expected = arena.add([a, bc]);
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_parse_indexed_names() {
        let mut arena = ExprArena::new();
        let expr = parse_expression("tau_i_j", &mut arena).unwrap();
        match arena.get(expr) {
            ExprNode::Term(id) => {
                assert_eq!(arena.term(*id).base, "tau");
                assert_eq!(arena.term(*id).rank(), 2);
            }
            other => panic!("expected a term, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_power_and_unary() {
        let mut arena = ExprArena::new();
        let expr = parse_expression("-u_i**2", &mut arena).unwrap();

        let u = arena.term_expr("u_i");
        let two = arena.integer(2);
        let sq = arena.pow(u, two);
        let expected = arena.neg(sq);
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_parse_division() {
        let mut arena = ExprArena::new();
        let half = parse_expression("1/2", &mut arena).unwrap();
        assert_eq!(arena.get(half), &ExprNode::Rational(1, 2));

        let expr = parse_expression("a/b", &mut arena).unwrap();
        let a = arena.term_expr("a");
        let b = arena.term_expr("b");
        let minus_one = arena.integer(-1);
        let inv = arena.pow(b, minus_one);
        let expected = arena.mul([a, inv]);
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_parse_equation_with_functions() {
        let mut arena = ExprArena::new();
        let (lhs, rhs) = parse_equation("Eq(Der(u_i, x_j), KD(i, j))", &mut arena).unwrap();

        match arena.get(lhs) {
            ExprNode::Function { kind, args } => {
                assert_eq!(*kind, FunctionKind::Der);
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected Der(...), got {other:?}"),
        }
        match arena.get(rhs) {
            ExprNode::Function { kind, args } => {
                assert_eq!(*kind, FunctionKind::KroneckerDelta);
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected KD(...), got {other:?}"),
        }
    }

    #[test]
    fn test_display_reparse_round_trip() {
        let mut arena = ExprArena::new();
        for text in [
            "a + b*c",
            "tau_i_j*u_j - p",
            "Der(u_i, x_j)",
            "u_i**2/2",
            "-Conservative(rhou_j, x_j)",
        ] {
            let expr = parse_expression(text, &mut arena).unwrap();
            let rendered = format!("{}", arena.display(expr));
            let reparsed = parse_expression(&rendered, &mut arena).unwrap();
            assert_eq!(expr, reparsed, "round trip through `{rendered}`");
        }
    }

    #[test]
    fn test_parse_errors() {
        let mut arena = ExprArena::new();
        assert!(parse_expression("a +", &mut arena).is_err());
        assert!(parse_expression("KD(i)", &mut arena).is_err());
        assert!(parse_expression("LC(i, j)", &mut arena).is_err());
        assert!(parse_expression("a $ b", &mut arena).is_err());
        assert!(parse_equation("Der(u, x)", &mut arena).is_err());
        assert!(parse_equation("Eq(a, b) c", &mut arena).is_err());

        let err = parse_expression("a $ b", &mut arena).unwrap_err();
        assert_eq!(err.position, 2);
    }
}
