//! Expression language embedded in narrative templates
//!
//! Expressions appear in `th:*` attribute values and in `[[...]]` inline text.
//! A `${ ... }` wrapper is accepted and ignored.

pub mod ast;
pub mod eval;
mod grammar;
pub mod lexer;

pub use ast::{BinaryOp, Expr, Iteration, Literal};
pub use eval::{display, evaluate, evaluate_ref, truthy, Scope};
pub use grammar::{parse_expression, parse_iteration};
