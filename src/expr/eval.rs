//! Expression evaluation against JSON bindings

use std::borrow::Cow;

use serde_json::Value;

use crate::error::EvalError;

use super::ast::{BinaryOp, Expr, Literal};

/// Chain of named bindings visible to an expression
///
/// A render starts with a single binding; `th:each` pushes one child scope per item.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    name: &'a str,
    value: &'a Value,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    /// Create a root scope with a single binding
    pub fn new(name: &'a str, value: &'a Value) -> Self {
        Self {
            name,
            value,
            parent: None,
        }
    }

    /// Create a nested scope that shadows `name`
    pub fn child<'b>(&'b self, name: &'b str, value: &'b Value) -> Scope<'b> {
        Scope {
            name,
            value,
            parent: Some(self),
        }
    }

    /// Find the innermost binding for `name`
    pub fn lookup(&self, name: &str) -> Option<&'a Value> {
        if self.name == name {
            return Some(self.value);
        }
        self.parent.and_then(|p| p.lookup(name))
    }
}

static NULL: Value = Value::Null;

/// Evaluate an expression to an owned value
pub fn evaluate(expr: &Expr, scope: &Scope<'_>) -> Result<Value, EvalError> {
    evaluate_ref(expr, scope).map(Cow::into_owned)
}

/// Evaluate an expression, borrowing from the bindings where possible
///
/// Property and index paths rooted at a variable walk the bound value by
/// reference; only computed values are owned.
pub fn evaluate_ref<'a>(expr: &Expr, scope: &Scope<'a>) -> Result<Cow<'a, Value>, EvalError> {
    match expr {
        Expr::Literal(lit) => Ok(Cow::Owned(match lit {
            Literal::String(s) => Value::String(s.clone()),
            Literal::Number(n) => number_value(*n),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Null => Value::Null,
        })),
        Expr::Variable(name) => scope
            .lookup(name)
            .map(Cow::Borrowed)
            .ok_or_else(|| EvalError::UnknownVariable { name: name.clone() }),
        Expr::Member {
            target,
            name,
            null_safe,
        } => match evaluate_ref(target, scope)? {
            Cow::Borrowed(Value::Object(map)) => Ok(Cow::Borrowed(map.get(name).unwrap_or(&NULL))),
            Cow::Owned(Value::Object(mut map)) => {
                Ok(Cow::Owned(map.remove(name).unwrap_or(Value::Null)))
            }
            value => match &*value {
                Value::Null if *null_safe => Ok(Cow::Borrowed(&NULL)),
                Value::Null => Err(EvalError::NullDereference {
                    property: name.clone(),
                    expression: target.to_string(),
                }),
                other => Err(EvalError::NotAnObject {
                    property: name.clone(),
                    kind: kind(other),
                    expression: target.to_string(),
                }),
            },
        },
        Expr::Index { target, index } => match evaluate_ref(target, scope)? {
            Cow::Borrowed(Value::Array(items)) => {
                Ok(Cow::Borrowed(items.get(*index).unwrap_or(&NULL)))
            }
            Cow::Owned(Value::Array(mut items)) if *index < items.len() => {
                Ok(Cow::Owned(items.swap_remove(*index)))
            }
            Cow::Owned(Value::Array(_)) => Ok(Cow::Borrowed(&NULL)),
            other => Err(EvalError::NotAnArray {
                kind: kind(&other),
                expression: target.to_string(),
            }),
        },
        Expr::Not(inner) => Ok(Cow::Owned(Value::Bool(!truthy(&*evaluate_ref(
            inner, scope,
        )?)))),
        Expr::Binary { op, lhs, rhs } => evaluate_binary(*op, lhs, rhs, scope),
    }
}

fn evaluate_binary<'a>(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    scope: &Scope<'a>,
) -> Result<Cow<'a, Value>, EvalError> {
    let value = match op {
        BinaryOp::And => Value::Bool(
            truthy(&*evaluate_ref(lhs, scope)?) && truthy(&*evaluate_ref(rhs, scope)?),
        ),
        BinaryOp::Or => Value::Bool(
            truthy(&*evaluate_ref(lhs, scope)?) || truthy(&*evaluate_ref(rhs, scope)?),
        ),
        BinaryOp::Elvis => {
            return match evaluate_ref(lhs, scope)? {
                value if value.is_null() => evaluate_ref(rhs, scope),
                value => Ok(value),
            }
        }
        BinaryOp::Equal => Value::Bool(values_equal(
            &*evaluate_ref(lhs, scope)?,
            &*evaluate_ref(rhs, scope)?,
        )),
        BinaryOp::NotEqual => Value::Bool(!values_equal(
            &*evaluate_ref(lhs, scope)?,
            &*evaluate_ref(rhs, scope)?,
        )),
        BinaryOp::Add => {
            let left = evaluate_ref(lhs, scope)?;
            let right = evaluate_ref(rhs, scope)?;
            match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => number_value(a + b),
                _ => Value::String(display(&left) + &display(&right)),
            }
        }
    };
    Ok(Cow::Owned(value))
}

/// Integral numbers stay integral so they display without a trailing `.0`
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Conditional truthiness used by `th:if`, `th:unless`, `and`, `or` and `not`
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !matches!(s.as_str(), "" | "false" | "off" | "no"),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text form of a value as written into the output
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) => items
            .iter()
            .map(display)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
