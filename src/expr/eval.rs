use serde_json::{Map, Value};

use super::parser::{number_value, BinaryOp, Expr, UnaryOp};
use super::ExprError;
use crate::state::{display_number, display_value, is_truthy};

/// Result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue {
    Undefined,
    Value(Value),
}

impl ExprValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            ExprValue::Undefined => false,
            ExprValue::Value(value) => is_truthy(value),
        }
    }

    /// String form as it appears in rendered text.
    pub fn to_display_string(&self) -> String {
        match self {
            ExprValue::Undefined => "undefined".to_string(),
            ExprValue::Value(value) => display_value(value),
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            ExprValue::Undefined => None,
            ExprValue::Value(value) => Some(value),
        }
    }

    fn to_number(&self) -> f64 {
        match self {
            ExprValue::Undefined => f64::NAN,
            ExprValue::Value(value) => match value {
                Value::Null => 0.0,
                Value::Bool(b) => f64::from(u8::from(*b)),
                Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
                Value::String(s) => {
                    let trimmed = s.trim();
                    if trimmed.is_empty() {
                        0.0
                    } else {
                        trimmed.parse().unwrap_or(f64::NAN)
                    }
                }
                Value::Array(_) | Value::Object(_) => f64::NAN,
            },
        }
    }

    fn is_stringish(&self) -> bool {
        matches!(
            self,
            ExprValue::Value(Value::String(_) | Value::Array(_) | Value::Object(_))
        )
    }
}

/// Evaluates a parsed expression against a context of variable bindings.
pub fn eval(expr: &Expr, context: &Map<String, Value>) -> Result<ExprValue, ExprError> {
    match expr {
        Expr::Literal(value) => Ok(ExprValue::Value(value.clone())),
        Expr::Undefined => Ok(ExprValue::Undefined),
        Expr::Variable(name) => context
            .get(name)
            .cloned()
            .map(ExprValue::Value)
            .ok_or_else(|| ExprError::UnknownVariable { name: name.clone() }),
        Expr::Member { object, property } => {
            let object = eval(object, context)?;
            member(object, property)
        }
        Expr::Index { object, index } => {
            let object = eval(object, context)?;
            let index = eval(index, context)?;
            let key = match &index {
                ExprValue::Value(Value::Number(_)) => display_number(index.to_number()),
                other => other.to_display_string(),
            };
            member(object, &key)
        }
        Expr::Unary { op, operand } => {
            let operand = eval(operand, context)?;
            match op {
                UnaryOp::Not => Ok(ExprValue::Value(Value::Bool(!operand.is_truthy()))),
                UnaryOp::Negate => numeric(-operand.to_number(), "-"),
            }
        }
        Expr::Binary { op, left, right } => match op {
            BinaryOp::And => {
                let left = eval(left, context)?;
                if left.is_truthy() {
                    eval(right, context)
                } else {
                    Ok(left)
                }
            }
            BinaryOp::Or => {
                let left = eval(left, context)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    eval(right, context)
                }
            }
            _ => {
                let left = eval(left, context)?;
                let right = eval(right, context)?;
                binary(*op, &left, &right)
            }
        },
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            if eval(test, context)?.is_truthy() {
                eval(consequent, context)
            } else {
                eval(alternate, context)
            }
        }
    }
}

fn member(object: ExprValue, property: &str) -> Result<ExprValue, ExprError> {
    let value = match object {
        ExprValue::Undefined => {
            return Err(ExprError::PropertyOfNothing {
                property: property.to_string(),
                target: "undefined",
            })
        }
        ExprValue::Value(Value::Null) => {
            return Err(ExprError::PropertyOfNothing {
                property: property.to_string(),
                target: "null",
            })
        }
        ExprValue::Value(value) => value,
    };

    let found = match (&value, property) {
        (Value::Object(map), _) => map.get(property).cloned(),
        (Value::Array(items), "length") => Some(Value::from(items.len())),
        (Value::Array(items), _) => property
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i).cloned()),
        // Strings measure and index in UTF-16 code units; a lone surrogate
        // reads back as U+FFFD.
        (Value::String(s), "length") => Some(Value::from(s.encode_utf16().count())),
        (Value::String(s), _) => property
            .parse::<usize>()
            .ok()
            .and_then(|i| s.encode_utf16().nth(i))
            .map(|unit| Value::String(String::from_utf16_lossy(&[unit]))),
        _ => None,
    };

    Ok(found.map_or(ExprValue::Undefined, ExprValue::Value))
}

fn numeric(n: f64, operator: &str) -> Result<ExprValue, ExprError> {
    if n.is_finite() {
        Ok(ExprValue::Value(number_value(n)))
    } else {
        Err(ExprError::InvalidOperands {
            operator: operator.to_string(),
            details: format!("result {} is not a finite number", display_number(n)),
        })
    }
}

fn strict_equals(left: &ExprValue, right: &ExprValue) -> bool {
    match (left, right) {
        (ExprValue::Undefined, ExprValue::Undefined) => true,
        (ExprValue::Value(Value::Number(a)), ExprValue::Value(Value::Number(b))) => {
            a.as_f64() == b.as_f64()
        }
        (ExprValue::Value(a), ExprValue::Value(b)) => a == b,
        _ => false,
    }
}

fn loose_equals(left: &ExprValue, right: &ExprValue) -> bool {
    use ExprValue::{Undefined, Value as V};
    match (left, right) {
        (Undefined | V(Value::Null), Undefined | V(Value::Null)) => true,
        (Undefined | V(Value::Null), _) | (_, Undefined | V(Value::Null)) => false,
        (V(Value::String(_)), V(Value::String(_))) => strict_equals(left, right),
        (V(Value::Object(_) | Value::Array(_)), _) | (_, V(Value::Object(_) | Value::Array(_))) => {
            strict_equals(left, right)
        }
        _ => left.to_number() == right.to_number(),
    }
}

fn binary(op: BinaryOp, left: &ExprValue, right: &ExprValue) -> Result<ExprValue, ExprError> {
    let boolean = |b: bool| Ok(ExprValue::Value(Value::Bool(b)));
    match op {
        BinaryOp::Add => {
            if left.is_stringish() || right.is_stringish() {
                let joined = format!("{}{}", left.to_display_string(), right.to_display_string());
                Ok(ExprValue::Value(Value::String(joined)))
            } else {
                numeric(left.to_number() + right.to_number(), op.symbol())
            }
        }
        BinaryOp::Subtract => numeric(left.to_number() - right.to_number(), op.symbol()),
        BinaryOp::Multiply => numeric(left.to_number() * right.to_number(), op.symbol()),
        BinaryOp::Divide | BinaryOp::Remainder => {
            let divisor = right.to_number();
            if divisor == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            let dividend = left.to_number();
            let result = if op == BinaryOp::Divide {
                dividend / divisor
            } else {
                dividend % divisor
            };
            numeric(result, op.symbol())
        }
        BinaryOp::StrictEquals => boolean(strict_equals(left, right)),
        BinaryOp::StrictNotEquals => boolean(!strict_equals(left, right)),
        BinaryOp::LooseEquals => boolean(loose_equals(left, right)),
        BinaryOp::LooseNotEquals => boolean(!loose_equals(left, right)),
        BinaryOp::LessThan
        | BinaryOp::LessThanOrEqual
        | BinaryOp::GreaterThan
        | BinaryOp::GreaterThanOrEqual => {
            let ordering = match (left, right) {
                (ExprValue::Value(Value::String(a)), ExprValue::Value(Value::String(b))) => {
                    Some(a.cmp(b))
                }
                _ => left.to_number().partial_cmp(&right.to_number()),
            };
            let Some(ordering) = ordering else {
                return boolean(false);
            };
            boolean(match op {
                BinaryOp::LessThan => ordering.is_lt(),
                BinaryOp::LessThanOrEqual => ordering.is_le(),
                BinaryOp::GreaterThan => ordering.is_gt(),
                _ => ordering.is_ge(),
            })
        }
        // Only reached for already-evaluated operands; `eval` short-circuits.
        BinaryOp::And => Ok(if left.is_truthy() { right } else { left }.clone()),
        BinaryOp::Or => Ok(if left.is_truthy() { left } else { right }.clone()),
    }
}
