//! Abstract syntax tree for template expressions

use std::fmt;

/// A parsed expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value: string, number, boolean or null
    Literal(Literal),
    /// Bare variable reference (`resource`)
    Variable(String),
    /// Member access (`target.name` or `target?.name`)
    Member {
        target: Box<Expr>,
        name: String,
        null_safe: bool,
    },
    /// Array index (`target[0]`)
    Index { target: Box<Expr>, index: usize },
    /// Logical negation
    Not(Box<Expr>),
    /// Binary operation
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Equal,
    NotEqual,
    And,
    Or,
    /// `lhs ?: rhs`, rhs when lhs is null
    Elvis,
}

impl Expr {
    pub fn member(target: Expr, name: impl Into<String>, null_safe: bool) -> Self {
        Expr::Member {
            target: Box::new(target),
            name: name.into(),
            null_safe,
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Last path segment of a member chain, used as a type hint for embedded values
    pub fn last_segment(&self) -> Option<&str> {
        match self {
            Expr::Member { name, .. } => Some(name),
            Expr::Index { target, .. } => target.last_segment(),
            Expr::Variable(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Elvis => "?:",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Literal::String(s)) => write!(f, "'{}'", s),
            Expr::Literal(Literal::Number(n)) => write!(f, "{}", n),
            Expr::Literal(Literal::Bool(b)) => write!(f, "{}", b),
            Expr::Literal(Literal::Null) => f.write_str("null"),
            Expr::Variable(name) => f.write_str(name),
            Expr::Member {
                target,
                name,
                null_safe,
            } => {
                let dot = if *null_safe { "?." } else { "." };
                write!(f, "{}{}{}", target, dot, name)
            }
            Expr::Index { target, index } => write!(f, "{}[{}]", target, index),
            Expr::Not(inner) => write!(f, "not {}", inner),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
        }
    }
}

/// Iteration header of a `th:each` attribute (`item : ${items}`)
#[derive(Debug, Clone, PartialEq)]
pub struct Iteration {
    pub variable: String,
    pub source: Expr,
}
