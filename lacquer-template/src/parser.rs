//! Recursive-descent parser, precedence-climbing by grammar level (C1).
//!
//! Precedence, lowest to highest: ternary, `||`, `&&`, equality,
//! comparison, additive, multiplicative, unary, postfix, primary.

use crate::ast::{BinOp, Expr, UnaryOp};
use crate::error::ExpressionError;
use crate::lexer::{tokenize, Token};

/// Parse an expression fragment into an AST.
pub fn parse(src: &str) -> Result<Expr, ExpressionError> {
    let tokens = tokenize(src)?;
    let mut p = Parser { tokens, pos: 0 };
    let expr = p.parse_ternary()?;
    p.expect_eof()?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn expect_eof(&self) -> Result<(), ExpressionError> {
        if matches!(self.peek(), Token::Eof) {
            Ok(())
        } else {
            Err(ExpressionError::Parse(format!(
                "unexpected trailing token: {:?}",
                self.peek()
            )))
        }
    }

    fn parse_ternary(&mut self) -> Result<Expr, ExpressionError> {
        let cond = self.parse_or()?;
        if matches!(self.peek(), Token::Question) {
            self.advance();
            let then_branch = self.parse_ternary()?;
            self.expect(Token::Colon)?;
            let else_branch = self.parse_ternary()?;
            Ok(Expr::Ternary(
                Box::new(cond),
                Box::new(then_branch),
                Box::new(else_branch),
            ))
        } else {
            Ok(cond)
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Token::OrOr) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.parse_equality()?;
        while matches!(self.peek(), Token::AndAnd) {
            self.advance();
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.peek() {
                Token::EqEq => BinOp::Eq,
                Token::NotEq => BinOp::Ne,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_comparison()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinOp::Lt,
                Token::Gt => BinOp::Gt,
                Token::LtEq => BinOp::Le,
                Token::GtEq => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExpressionError> {
        match self.peek() {
            Token::Bang => {
                self.advance();
                Ok(Expr::Unary(UnaryOp::Not, Box::new(self.parse_unary()?)))
            }
            Token::Minus => {
                self.advance();
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.parse_unary()?)))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    let name = match self.advance() {
                        Token::Ident(name) => name,
                        other => {
                            return Err(ExpressionError::Parse(format!(
                                "expected field name after `.`, got {other:?}"
                            )))
                        }
                    };
                    expr = Expr::Field(Box::new(expr), name);
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_ternary()?;
                    self.expect(Token::RBracket)?;
                    expr = Expr::Index(Box::new(expr), Box::new(index));
                }
                Token::LParen => {
                    let name = match &expr {
                        Expr::Ident(name) => name.clone(),
                        _ => {
                            return Err(ExpressionError::Parse(
                                "call target must be a bare identifier".into(),
                            ))
                        }
                    };
                    self.advance();
                    let mut args = Vec::new();
                    if !matches!(self.peek(), Token::RParen) {
                        loop {
                            args.push(self.parse_ternary()?);
                            if matches!(self.peek(), Token::Comma) {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(Token::RParen)?;
                    expr = Expr::Call(name, args);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        match self.advance() {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::String(s) => Ok(Expr::String(s)),
            Token::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                "null" => Ok(Expr::Nil),
                _ => Ok(Expr::Ident(name)),
            },
            Token::LParen => {
                let inner = self.parse_ternary()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            other => Err(ExpressionError::Parse(format!(
                "unexpected token: {other:?}"
            ))),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExpressionError> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(ExpressionError::Parse(format!(
                "expected {expected:?}, got {:?}",
                self.peek()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ternary_with_correct_associativity() {
        let expr = parse("a ? b : c ? d : e").unwrap();
        // `?:` is right-associative in the grammar's recursive-descent form.
        assert!(matches!(expr, Expr::Ternary(_, _, _)));
    }

    #[test]
    fn parses_precedence_additive_before_comparison() {
        let expr = parse("1 + 2 < 3 * 4").unwrap();
        match expr {
            Expr::Binary(BinOp::Lt, lhs, rhs) => {
                assert!(matches!(*lhs, Expr::Binary(BinOp::Add, _, _)));
                assert!(matches!(*rhs, Expr::Binary(BinOp::Mul, _, _)));
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn parses_dotted_path_as_nested_field() {
        let expr = parse("steps.greeting.response").unwrap();
        match expr {
            Expr::Field(base, field) => {
                assert_eq!(field, "response");
                match *base {
                    Expr::Field(base2, field2) => {
                        assert_eq!(field2, "greeting");
                        assert_eq!(*base2, Expr::Ident("steps".into()));
                    }
                    other => panic!("unexpected base: {other:?}"),
                }
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn parses_function_call_with_args() {
        let expr = parse("len(inputs.items)").unwrap();
        match expr {
            Expr::Call(name, args) => {
                assert_eq!(name, "len");
                assert_eq!(args.len(), 1);
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn call_on_non_identifier_is_a_parse_error() {
        assert!(parse("(1 + 2)(3)").is_err());
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("1 + 2 3").is_err());
    }
}
