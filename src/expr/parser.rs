//! Expression grammar, built as a `chumsky` Pratt parser over lexer tokens.
//!
//! Precedence, lowest first:
//!
//! ```text
//! ternary     a ? b : c          (right associative)
//! or          a || b
//! and         a && b
//! equality    === !== == !=
//! comparison  < <= > >=
//! additive    + -
//! multiply    * / %
//! unary       ! -
//! postfix     a.b  a[b]
//! ```

use chumsky::{input::ValueInput, pratt::*, prelude::*};
use serde_json::Value;

use super::lexer::{Span, Token};
use super::ExprError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    StrictEquals,
    StrictNotEquals,
    LooseEquals,
    LooseNotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Remainder => "%",
            BinaryOp::StrictEquals => "===",
            BinaryOp::StrictNotEquals => "!==",
            BinaryOp::LooseEquals => "==",
            BinaryOp::LooseNotEquals => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Undefined,
    Variable(String),
    Member {
        object: Box<Expr>,
        property: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
}

/// Deepest nesting of groups, ternaries and prefix operators accepted.
pub const MAX_DEPTH: usize = 32;

/// Longest expression, in tokens, accepted.
pub const MAX_TOKENS: usize = 256;

enum Access {
    Member(String),
    Index(Expr),
}

fn expression<'src, I>() -> impl Parser<'src, I, Expr, extra::Err<Rich<'src, Token, Span>>> + Clone
where
    I: ValueInput<'src, Token = Token, Span = Span>,
{
    recursive(|expr| {
        let literal = select! {
            Token::Number(n) => Expr::Literal(number_value(n)),
            Token::Str(s) => Expr::Literal(Value::String(s)),
            Token::True => Expr::Literal(Value::Bool(true)),
            Token::False => Expr::Literal(Value::Bool(false)),
            Token::Null => Expr::Literal(Value::Null),
            Token::Undefined => Expr::Undefined,
            Token::Ident(name) => Expr::Variable(name),
        };
        let property = select! { Token::Ident(name) => name };

        let atom = literal.or(expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen)));

        let access = just(Token::Dot)
            .ignore_then(property)
            .map(Access::Member)
            .or(expr
                .clone()
                .delimited_by(just(Token::LBracket), just(Token::RBracket))
                .map(Access::Index));

        let operand = atom.foldl(access.repeated(), |object, access| match access {
            Access::Member(property) => Expr::Member {
                object: Box::new(object),
                property,
            },
            Access::Index(index) => Expr::Index {
                object: Box::new(object),
                index: Box::new(index),
            },
        });

        let branches = just(Token::Question)
            .ignore_then(expr.clone())
            .then_ignore(just(Token::Colon));

        operand.pratt((
            infix(right(1), branches, |test, consequent, alternate, _| {
                Expr::Conditional {
                    test: Box::new(test),
                    consequent: Box::new(consequent),
                    alternate: Box::new(alternate),
                }
            }),
            infix(left(2), just(Token::Or).to(BinaryOp::Or), |l, op, r, _| {
                binary(op, l, r)
            }),
            infix(left(3), just(Token::And).to(BinaryOp::And), |l, op, r, _| {
                binary(op, l, r)
            }),
            infix(
                left(4),
                select! {
                    Token::StrictEq => BinaryOp::StrictEquals,
                    Token::StrictNotEq => BinaryOp::StrictNotEquals,
                    Token::LooseEq => BinaryOp::LooseEquals,
                    Token::LooseNotEq => BinaryOp::LooseNotEquals,
                },
                |l, op, r, _| binary(op, l, r),
            ),
            infix(
                left(5),
                select! {
                    Token::Less => BinaryOp::LessThan,
                    Token::LessEq => BinaryOp::LessThanOrEqual,
                    Token::Greater => BinaryOp::GreaterThan,
                    Token::GreaterEq => BinaryOp::GreaterThanOrEqual,
                },
                |l, op, r, _| binary(op, l, r),
            ),
            infix(
                left(6),
                select! {
                    Token::Plus => BinaryOp::Add,
                    Token::Minus => BinaryOp::Subtract,
                },
                |l, op, r, _| binary(op, l, r),
            ),
            infix(
                left(7),
                select! {
                    Token::Star => BinaryOp::Multiply,
                    Token::Slash => BinaryOp::Divide,
                    Token::Percent => BinaryOp::Remainder,
                },
                |l, op, r, _| binary(op, l, r),
            ),
            prefix(
                8,
                select! {
                    Token::Bang => UnaryOp::Not,
                    Token::Minus => UnaryOp::Negate,
                },
                |op, operand, _| Expr::Unary {
                    op,
                    operand: Box::new(operand),
                },
            ),
        ))
    })
}

/// Parses a complete token stream; trailing tokens are an error.
pub fn parse_tokens(tokens: &[(Token, Span)], source_len: usize) -> Result<Expr, ExprError> {
    if tokens.len() > MAX_TOKENS {
        return Err(ExprError::TooLong { limit: MAX_TOKENS });
    }
    if nesting_depth(tokens) > MAX_DEPTH {
        return Err(ExprError::TooDeep { limit: MAX_DEPTH });
    }

    let eoi: Span = (source_len..source_len).into();
    expression()
        .then_ignore(end())
        .parse(tokens.map(eoi, |(token, span)| (token, span)))
        .into_result()
        .map_err(|errors| match errors.first() {
            Some(error) => match error.found() {
                Some(token) => ExprError::UnexpectedToken {
                    found: format!("{token:?}"),
                    offset: error.span().start,
                },
                None => ExprError::UnexpectedEnd {
                    offset: error.span().start,
                },
            },
            None => ExprError::UnexpectedEnd { offset: source_len },
        })
}

/// Upper bound on how deeply the parser and evaluator recurse for `tokens`.
///
/// Brackets open a level that closes with them. Ternaries and prefix
/// operators open a level that stays open until the enclosing bracket
/// closes.
fn nesting_depth(tokens: &[(Token, Span)]) -> usize {
    let mut depth = 0;
    let mut deepest = 0;
    let mut open: Vec<usize> = Vec::new();
    let mut previous: Option<&Token> = None;

    for (token, _) in tokens {
        match token {
            Token::LParen | Token::LBracket => {
                open.push(depth);
                depth += 1;
            }
            Token::RParen | Token::RBracket => {
                if let Some(before) = open.pop() {
                    depth = before;
                }
            }
            Token::Question | Token::Bang => depth += 1,
            Token::Minus if starts_operand(previous) => depth += 1,
            _ => {}
        }
        deepest = deepest.max(depth);
        previous = Some(token);
    }
    deepest
}

/// True if a token after `previous` begins an operand rather than continuing one.
fn starts_operand(previous: Option<&Token>) -> bool {
    !matches!(
        previous,
        Some(
            Token::Ident(_)
                | Token::Number(_)
                | Token::Str(_)
                | Token::True
                | Token::False
                | Token::Null
                | Token::Undefined
                | Token::RParen
                | Token::RBracket
        )
    )
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Integral literals stay integers so they print without a fraction.
pub(crate) fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
