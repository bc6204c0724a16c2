//! Recursive descent parser for marker expressions
//!
//! Precedence, lowest first:
//!
//! | Level      | Operators                                  |
//! |------------|--------------------------------------------|
//! | or         | `or`                                       |
//! | and        | `and`                                      |
//! | not        | `not`, `!` (prefix)                        |
//! | comparison | `==` `!=` `<` `<=` `>` `>=` `in` `not in`  |
//! | sum        | `+` `-`                                    |
//! | term       | `*` `/` `//` `%`                           |
//! | factor     | unary `-` `+`                              |
//! | power      | `**` (right associative)                   |
//! | postfix    | call `f(..)`, index `x[..]`, attribute `x.a` |

use crate::ast::{BinaryOp, CompareOp, Expr, ExprKind, LogicalOp, UnaryOp};
use crate::error::{EvalErrorKind, EvalResult, Failure};
use crate::token::{tokenize, Span, Token};

/// Deepest nesting accepted, both for parser recursion and for the resulting tree.
pub const MAX_DEPTH: usize = 100;

/// Parse a complete expression. Trailing tokens are an error.
pub fn parse(source: &str) -> EvalResult<Expr> {
    let tokens = tokenize(source).map_err(|span| {
        let found = source.get(span.clone()).unwrap_or("").to_string();
        if !found.is_empty() && found.bytes().all(|b| b.is_ascii_digit()) {
            // digits only fail to lex when the literal does not fit an i64
            return EvalErrorKind::Overflow.at(span);
        }
        EvalErrorKind::Syntax(format!("unexpected character '{}'", found)).at(span)
    })?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
        depth: 0,
    };
    let expr = parser.expression()?;
    if let Some((token, span)) = parser.tokens.get(parser.pos) {
        return Err(
            EvalErrorKind::Syntax(format!("unexpected {}", describe(token))).at(span.clone()),
        );
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    end: usize,
    depth: usize,
}

fn describe(token: &Token) -> String {
    match token {
        Token::Integer(i) => format!("number {}", i),
        Token::Float(f) => format!("number {}", f),
        Token::Str(_) => "string".to_string(),
        Token::Identifier(name) => format!("name '{}'", name),
        other => format!("token {:?}", other),
    }
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|(token, _)| token)
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.clone())
            .unwrap_or(self.end..self.end)
    }

    fn advance(&mut self) -> Option<(Token, Span)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn check(&self, expected: &Token) -> bool {
        self.peek() == Some(expected)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> EvalResult<Span> {
        match self.advance() {
            Some((token, span)) if &token == expected => Ok(span),
            Some((token, span)) => Err(EvalErrorKind::Syntax(format!(
                "expected {}, found {}",
                what,
                describe(&token)
            ))
            .at(span)),
            None => Err(self.unexpected_end(what)),
        }
    }

    fn unexpected_end(&self, what: &str) -> Failure {
        EvalErrorKind::Syntax(format!("expected {}, found end of expression", what))
            .at(self.end..self.end)
    }

    /// Run a recursive step one level deeper.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        if self.depth >= MAX_DEPTH {
            return Err(too_deep(self.current_span()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Reject trees that evaluation could not walk.
    fn bounded(&self, expr: Expr) -> EvalResult<Expr> {
        if expr.depth() > MAX_DEPTH {
            return Err(too_deep(expr.span.clone()));
        }
        Ok(expr)
    }

    fn expression(&mut self) -> EvalResult<Expr> {
        self.nested(Self::or_expr)
    }

    fn or_expr(&mut self) -> EvalResult<Expr> {
        let mut left = self.and_expr()?;
        while self.eat(&Token::Or) {
            let right = self.and_expr()?;
            left = self.bounded(logical(LogicalOp::Or, left, right))?;
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> EvalResult<Expr> {
        let mut left = self.not_expr()?;
        while self.eat(&Token::And) {
            let right = self.not_expr()?;
            left = self.bounded(logical(LogicalOp::And, left, right))?;
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> EvalResult<Expr> {
        if matches!(self.peek(), Some(Token::Not) | Some(Token::Bang)) {
            let start = self.current_span().start;
            self.pos += 1;
            let operand = self.nested(Self::not_expr)?;
            let span = start..operand.span.end;
            return self.bounded(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.comparison()
    }

    fn comparison_operator(&mut self) -> Option<CompareOp> {
        let op = match self.peek()? {
            Token::EqualEqual => CompareOp::Eq,
            Token::BangEqual => CompareOp::Ne,
            Token::Less => CompareOp::Lt,
            Token::LessEqual => CompareOp::Le,
            Token::Greater => CompareOp::Gt,
            Token::GreaterEqual => CompareOp::Ge,
            Token::In => CompareOp::In,
            Token::Not if self.peek_at(1) == Some(&Token::In) => {
                self.pos += 1;
                CompareOp::NotIn
            }
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn comparison(&mut self) -> EvalResult<Expr> {
        let first = self.sum()?;
        let mut rest = Vec::new();
        while let Some(op) = self.comparison_operator() {
            rest.push((op, self.sum()?));
        }
        match rest.last() {
            None => Ok(first),
            Some((_, last)) => {
                let span = first.span.start..last.span.end;
                self.bounded(Expr::new(
                    ExprKind::Compare {
                        first: Box::new(first),
                        rest,
                    },
                    span,
                ))
            }
        }
    }

    fn sum(&mut self) -> EvalResult<Expr> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.term()?;
            left = self.bounded(binary(op, left, right))?;
        }
    }

    fn term(&mut self) -> EvalResult<Expr> {
        let mut left = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::SlashSlash) => BinaryOp::FloorDiv,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.factor()?;
            left = self.bounded(binary(op, left, right))?;
        }
    }

    fn factor(&mut self) -> EvalResult<Expr> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Negate,
            Some(Token::Plus) => UnaryOp::Plus,
            _ => return self.power(),
        };
        let start = self.current_span().start;
        self.pos += 1;
        let operand = self.nested(Self::factor)?;
        let span = start..operand.span.end;
        self.bounded(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn power(&mut self) -> EvalResult<Expr> {
        let base = self.postfix()?;
        if self.eat(&Token::StarStar) {
            let exponent = self.nested(Self::factor)?;
            return self.bounded(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> EvalResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                Some(Token::LParen) => {
                    self.pos += 1;
                    let args = self.sequence(&Token::RParen, "')'")?;
                    let end = self.expect(&Token::RParen, "')'")?.end;
                    let span = expr.span.start..end;
                    expr = self.bounded(Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    ))?;
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.expression()?;
                    let end = self.expect(&Token::RBracket, "']'")?.end;
                    let span = expr.span.start..end;
                    expr = self.bounded(Expr::new(
                        ExprKind::Index {
                            target: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    ))?;
                }
                Some(Token::Dot) => {
                    self.pos += 1;
                    match self.advance() {
                        Some((Token::Identifier(name), span)) => {
                            let span = expr.span.start..span.end;
                            expr = self.bounded(Expr::new(
                                ExprKind::Attribute {
                                    target: Box::new(expr),
                                    name,
                                },
                                span,
                            ))?;
                        }
                        Some((token, span)) => {
                            return Err(EvalErrorKind::Syntax(format!(
                                "expected attribute name, found {}",
                                describe(&token)
                            ))
                            .at(span))
                        }
                        None => return Err(self.unexpected_end("attribute name")),
                    }
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Comma separated expressions up to (not including) `close`; trailing comma allowed.
    fn sequence(&mut self, close: &Token, what: &str) -> EvalResult<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.check(close) {
            if self.peek().is_none() {
                return Err(self.unexpected_end(what));
            }
            items.push(self.expression()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(items)
    }

    fn primary(&mut self) -> EvalResult<Expr> {
        let (token, span) = match self.advance() {
            Some(item) => item,
            None => return Err(self.unexpected_end("an expression")),
        };
        let kind = match token {
            Token::Integer(i) => ExprKind::Int(i),
            Token::Float(f) => ExprKind::Float(f),
            Token::Str(s) => ExprKind::Str(s),
            Token::True => ExprKind::Bool(true),
            Token::False => ExprKind::Bool(false),
            Token::None => ExprKind::None,
            Token::Identifier(name) => ExprKind::Name(name),
            Token::LParen => {
                let inner = self.expression()?;
                let end = self.expect(&Token::RParen, "')'")?.end;
                return Ok(Expr::new(inner.kind, span.start..end));
            }
            Token::LBracket => {
                let items = self.sequence(&Token::RBracket, "']'")?;
                let end = self.expect(&Token::RBracket, "']'")?.end;
                return self.bounded(Expr::new(ExprKind::List(items), span.start..end));
            }
            Token::LBrace => {
                let mut pairs = Vec::new();
                while !self.check(&Token::RBrace) {
                    if self.peek().is_none() {
                        return Err(self.unexpected_end("'}'"));
                    }
                    let key = self.expression()?;
                    self.expect(&Token::Colon, "':'")?;
                    let value = self.expression()?;
                    pairs.push((key, value));
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                }
                let end = self.expect(&Token::RBrace, "'}'")?.end;
                return self.bounded(Expr::new(ExprKind::Map(pairs), span.start..end));
            }
            other => {
                return Err(
                    EvalErrorKind::Syntax(format!("unexpected {}", describe(&other))).at(span),
                )
            }
        };
        Ok(Expr::new(kind, span))
    }
}

fn too_deep(span: Span) -> Failure {
    EvalErrorKind::Syntax("expression too deeply nested".to_string()).at(span)
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.start..right.span.end;
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

fn logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.start..right.span.end;
    Expr::new(
        ExprKind::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(source: &str) -> ExprKind {
        parse(source).expect("expression to parse").kind
    }

    #[test]
    fn test_literals() {
        assert_eq!(kind("42"), ExprKind::Int(42));
        assert_eq!(kind("'hi'"), ExprKind::Str("hi".to_string()));
        assert_eq!(kind("None"), ExprKind::None);
        assert_eq!(kind("(True)"), ExprKind::Bool(true));
    }

    #[test]
    fn test_precedence() {
        let expr = parse("1 + 2 * 3").unwrap();
        match expr.kind {
            ExprKind::Binary {
                op: BinaryOp::Add,
                right,
                ..
            } => assert!(matches!(
                right.kind,
                ExprKind::Binary {
                    op: BinaryOp::Mul,
                    ..
                }
            )),
            other => panic!("Expected addition at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_power_is_right_associative() {
        let expr = parse("2 ** 3 ** 2").unwrap();
        match expr.kind {
            ExprKind::Binary {
                op: BinaryOp::Pow,
                left,
                right,
            } => {
                assert_eq!(left.kind, ExprKind::Int(2));
                assert!(matches!(
                    right.kind,
                    ExprKind::Binary {
                        op: BinaryOp::Pow,
                        ..
                    }
                ));
            }
            other => panic!("Expected power at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_chained_comparison() {
        match kind("1 < x <= 3") {
            ExprKind::Compare { rest, .. } => {
                let ops: Vec<CompareOp> = rest.iter().map(|(op, _)| *op).collect();
                assert_eq!(ops, vec![CompareOp::Lt, CompareOp::Le]);
            }
            other => panic!("Expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_not_in() {
        match kind("'a' not in xs") {
            ExprKind::Compare { rest, .. } => assert_eq!(rest[0].0, CompareOp::NotIn),
            other => panic!("Expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_method_call_chain() {
        match kind("user.name.upper()") {
            ExprKind::Call { callee, args } => {
                assert!(args.is_empty());
                assert!(matches!(callee.kind, ExprKind::Attribute { ref name, .. } if name == "upper"));
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_collections() {
        assert!(matches!(kind("[1, 2,]"), ExprKind::List(items) if items.len() == 2));
        assert!(matches!(kind("{'a': 1, 'b': 2}"), ExprKind::Map(pairs) if pairs.len() == 2));
        assert!(matches!(kind("f()"), ExprKind::Call { args, .. } if args.is_empty()));
    }

    #[test]
    fn test_spans_cover_subexpressions() {
        let expr = parse("a * (5 / 0)").unwrap();
        match expr.kind {
            ExprKind::Binary { right, .. } => assert_eq!(right.span, 4..11),
            other => panic!("Expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            parse("").unwrap_err().kind,
            EvalErrorKind::Syntax(ref msg) if msg.contains("end of expression")
        ));
        assert!(parse("1 +").is_err());
        assert!(parse("(1").is_err());
        assert!(parse("a b").is_err());
        assert_eq!(parse("a $").unwrap_err().span, 2..3);
    }

    #[test]
    fn test_integer_literal_too_large() {
        let error = parse("x == 99999999999999999999").unwrap_err();
        assert_eq!(error.kind, EvalErrorKind::Overflow);
        assert_eq!(error.span, 5..25);
    }

    #[test]
    fn test_nesting_within_limit() {
        let source = format!("{}1{}", "(".repeat(MAX_DEPTH - 1), ")".repeat(MAX_DEPTH - 1));
        assert_eq!(kind(&source), ExprKind::Int(1));
        let negated = format!("{}1", "-".repeat(MAX_DEPTH - 2));
        assert_eq!(parse(&negated).unwrap().depth(), MAX_DEPTH - 1);
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        let too_deep = |source: &str| {
            matches!(
                parse(source).unwrap_err().kind,
                EvalErrorKind::Syntax(ref msg) if msg == "expression too deeply nested"
            )
        };
        assert!(too_deep(&format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000))));
        assert!(too_deep(&format!("{}1", "not ".repeat(20_000))));
        assert!(too_deep(&format!("{}1", "-".repeat(20_000))));
        assert!(too_deep(&format!("{}0", "[".repeat(20_000))));
        assert!(too_deep(&vec!["1"; 20_000].join(" + ")));
        assert!(too_deep(&format!("a{}", ".b".repeat(20_000))));
        assert!(too_deep(&vec!["2"; 20_000].join(" ** ")));
    }
}
