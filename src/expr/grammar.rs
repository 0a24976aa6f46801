//! Expression parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::ExpressionError;
use crate::expr::ast::*;
use crate::expr::lexer::{lex, Token};

/// Postfix accessor collected before folding into the member chain
#[derive(Debug, Clone)]
enum Accessor {
    Member { name: String, null_safe: bool },
    Index(usize),
}

/// Parse a single expression, optionally wrapped in `${ ... }`
pub fn parse_expression(input: &str) -> Result<Expr, Vec<ExpressionError>> {
    let tokens = lex(input).map_err(|span| vec![ExpressionError::invalid_character(span)])?;
    let len = input.len();

    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    expression_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Parse a `th:each` header: `variable : expression`
pub fn parse_iteration(input: &str) -> Result<Iteration, Vec<ExpressionError>> {
    let tokens = lex(input).map_err(|span| vec![ExpressionError::invalid_character(span)])?;
    let len = input.len();

    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));
    let token_stream = Stream::from_iter(token_iter)
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    let variable = select! {
        Token::Ident(s) => s,
    };

    variable
        .then_ignore(just(Token::Colon))
        .then(expression_parser())
        .then_ignore(end())
        .map(|(variable, source)| Iteration { variable, source })
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Fold a left-associative operator chain
fn fold_binary((first, rest): (Expr, Vec<(BinaryOp, Expr)>)) -> Expr {
    rest.into_iter()
        .fold(first, |lhs, (op, rhs)| Expr::binary(op, lhs, rhs))
}

fn expression_parser<'a, I>() -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    recursive(|expr| {
        let identifier = select! {
            Token::Ident(s) => s,
        };

        let literal = select! {
            Token::String(s) => Expr::Literal(Literal::String(s)),
            Token::Number(n) => Expr::Literal(Literal::Number(n)),
            Token::True => Expr::Literal(Literal::Bool(true)),
            Token::False => Expr::Literal(Literal::Bool(false)),
            Token::Null => Expr::Literal(Literal::Null),
        };

        // Primary: literal, variable, (expr) or ${expr}
        let atom = choice((
            literal,
            identifier.clone().map(Expr::Variable),
            expr.clone()
                .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
            expr.clone()
                .delimited_by(just(Token::DollarBrace), just(Token::BraceClose)),
        ));

        let index = select! {
            Token::Number(n) => n,
        }
        .try_map(|n, span| {
            if n >= 0.0 && n.fract() == 0.0 {
                Ok(n as usize)
            } else {
                Err(Rich::custom(span, "index must be a non-negative integer"))
            }
        });

        let accessor = choice((
            just(Token::Dot)
                .ignore_then(identifier.clone())
                .map(|name| Accessor::Member {
                    name,
                    null_safe: false,
                }),
            just(Token::SafeDot)
                .ignore_then(identifier.clone())
                .map(|name| Accessor::Member {
                    name,
                    null_safe: true,
                }),
            index
                .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
                .map(Accessor::Index),
        ));

        let postfix = atom
            .then(accessor.repeated().collect::<Vec<_>>())
            .map(|(base, accessors): (Expr, Vec<Accessor>)| {
                accessors
                    .into_iter()
                    .fold(base, |target, accessor| match accessor {
                        Accessor::Member { name, null_safe } => {
                            Expr::member(target, name, null_safe)
                        }
                        Accessor::Index(index) => Expr::Index {
                            target: Box::new(target),
                            index,
                        },
                    })
            });

        // `not` / `!` prefixes, any number of them
        let unary = choice((just(Token::Not), just(Token::Bang)))
            .repeated()
            .collect::<Vec<_>>()
            .then(postfix)
            .map(|(negations, inner): (Vec<Token>, Expr)| {
                negations
                    .iter()
                    .fold(inner, |e, _| Expr::Not(Box::new(e)))
            });

        let sum = unary
            .clone()
            .then(
                just(Token::Plus)
                    .to(BinaryOp::Add)
                    .then(unary)
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .map(fold_binary);

        let equality_op = choice((
            just(Token::EqualEqual).to(BinaryOp::Equal),
            just(Token::NotEqual).to(BinaryOp::NotEqual),
        ));
        let equality = sum
            .clone()
            .then(equality_op.then(sum).repeated().collect::<Vec<_>>())
            .map(fold_binary);

        let conjunction = equality
            .clone()
            .then(
                just(Token::And)
                    .to(BinaryOp::And)
                    .then(equality)
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .map(fold_binary);

        let disjunction = conjunction
            .clone()
            .then(
                just(Token::Or)
                    .to(BinaryOp::Or)
                    .then(conjunction)
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .map(fold_binary);

        disjunction
            .clone()
            .then(
                just(Token::Elvis)
                    .to(BinaryOp::Elvis)
                    .then(disjunction)
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .map(fold_binary)
            .boxed()
    })
}
