//! Restricted expression language for text bindings inside repeated
//! templates.
//!
//! Expressions are tokenized, parsed into an [`Expr`] tree and evaluated
//! against a context of named values. Nothing is ever compiled or
//! executed as code: the grammar covers literals, variables, property and
//! index access, arithmetic, comparison, logical operators and the
//! ternary, and nothing else.
//!
//! ```
//! use serde_json::{json, Map};
//! use xatom::expr;
//!
//! let mut context = Map::new();
//! context.insert("user".into(), json!({"name": "Ada", "age": 36}));
//! context.insert("index".into(), json!(0));
//!
//! assert_eq!(expr::evaluate("index + 1 + '. ' + user.name", &context), "1. Ada");
//! assert_eq!(expr::evaluate("user.age >= 18 ? 'adult' : 'minor'", &context), "adult");
//! assert_eq!(expr::evaluate("user.name(", &context), "user.name(");
//! ```

mod eval;
mod lexer;
mod parser;

use serde_json::{Map, Value};
use thiserror::Error;

pub use eval::ExprValue;
pub use parser::{BinaryOp, Expr, UnaryOp, MAX_DEPTH, MAX_TOKENS};

/// Errors from tokenizing, parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("Unexpected character '{found}' at {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("Unterminated string starting at {offset}")]
    UnterminatedString { offset: usize },

    #[error("Unexpected token {found} at {offset}")]
    UnexpectedToken { found: String, offset: usize },

    #[error("Unexpected end of expression at {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("Expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("Expression is longer than {limit} tokens")]
    TooLong { limit: usize },

    #[error("Variable '{name}' is not defined")]
    UnknownVariable { name: String },

    #[error("Cannot read property '{property}' of {target}")]
    PropertyOfNothing {
        property: String,
        target: &'static str,
    },

    #[error("Invalid operands for operator {operator}: {details}")]
    InvalidOperands { operator: String, details: String },

    #[error("Division by zero")]
    DivisionByZero,
}

/// Parses an expression without evaluating it.
pub fn parse(expression: &str) -> Result<Expr, ExprError> {
    let tokens = lexer::tokenize(expression)?;
    parser::parse_tokens(&tokens, expression.len())
}

/// Parses and evaluates `expression`, reporting the first failure.
pub fn try_evaluate(expression: &str, context: &Map<String, Value>) -> Result<ExprValue, ExprError> {
    let expr = parse(expression)?;
    eval::eval(&expr, context)
}

/// Evaluates `expression` to its display string, or returns the
/// expression text unchanged if it cannot be evaluated.
pub fn evaluate(expression: &str, context: &Map<String, Value>) -> String {
    match try_evaluate(expression, context) {
        Ok(value) => value.to_display_string(),
        Err(_) => expression.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> Map<String, Value> {
        let mut context = Map::new();
        context.insert(
            "user".to_string(),
            json!({"name": "John", "age": 30, "tags": ["a", "b"], "active": true, "nick": null}),
        );
        context.insert("i".to_string(), json!(2));
        context
    }

    fn eval_str(expression: &str) -> String {
        evaluate(expression, &context())
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval_str("i + 1"), "3");
        assert_eq!(eval_str("i * 2 - 1"), "3");
        assert_eq!(eval_str("(i + 1) * 2"), "6");
        assert_eq!(eval_str("7 / 2"), "3.5");
        assert_eq!(eval_str("7 % i"), "1");
        assert_eq!(eval_str("-i + 1"), "-1");
        assert_eq!(eval_str("0.1 + 0.2"), "0.30000000000000004");
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(eval_str("user.name + ' (' + user.age + ')'"), "John (30)");
        assert_eq!(eval_str("i + 1 + 'x'"), "3x");
        assert_eq!(eval_str("'x' + i + 1"), "x21");
        assert_eq!(eval_str("user.tags + ''"), "a,b");
    }

    #[test]
    fn test_property_and_index_access() {
        assert_eq!(eval_str("user.tags[1]"), "b");
        assert_eq!(eval_str("user.tags.length"), "2");
        assert_eq!(eval_str("user.name.length"), "4");
        assert_eq!(eval_str("user['name']"), "John");
        assert_eq!(eval_str("user.missing"), "undefined");
    }

    #[test]
    fn test_comparison_and_ternary() {
        assert_eq!(eval_str("i === 2"), "true");
        assert_eq!(eval_str("i === '2'"), "false");
        assert_eq!(eval_str("i == '2'"), "true");
        assert_eq!(eval_str("i !== 2 ? 'no' : 'yes'"), "yes");
        assert_eq!(eval_str("user.age > 18 && user.active ? 'adult' : 'minor'"), "adult");
        assert_eq!(eval_str("user.nick || user.name"), "John");
        assert_eq!(eval_str("!user.active"), "false");
        assert_eq!(eval_str("'abc' < 'abd'"), "true");
        assert_eq!(eval_str("user.nick == undefined"), "true");
    }

    #[test]
    fn test_failures_fall_back_to_expression_text() {
        assert_eq!(eval_str("unknown + 1"), "unknown + 1");
        assert_eq!(eval_str("user.missing.deeper"), "user.missing.deeper");
        assert_eq!(eval_str("i / 0"), "i / 0");
        assert_eq!(eval_str("i +"), "i +");
        assert_eq!(eval_str("user.name; alert(1)"), "user.name; alert(1)");
    }

    #[test]
    fn test_try_evaluate_reports_cause() {
        let err = try_evaluate("nope", &context()).unwrap_err();
        assert_eq!(err, ExprError::UnknownVariable { name: "nope".to_string() });
        assert_eq!(err.to_string(), "Variable 'nope' is not defined");

        let err = try_evaluate("user.nick.first", &context()).unwrap_err();
        assert_eq!(err.to_string(), "Cannot read property 'first' of null");

        let value = try_evaluate("user.tags", &context()).unwrap();
        assert_eq!(value.into_value(), Some(json!(["a", "b"])));
    }

    #[test]
    fn test_short_circuit_skips_failing_branch() {
        assert_eq!(eval_str("false && nope"), "false");
        assert_eq!(eval_str("true || nope"), "true");
        assert_eq!(eval_str("true ? 1 : nope"), "1");
    }
}
