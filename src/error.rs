//! Error types for configuration loading, rendering and narrative generation

use std::path::PathBuf;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::expr::lexer::{Span, Token};

/// Syntax error in a template expression
#[derive(Error, Debug, Clone)]
pub enum ExpressionError {
    #[error("Expression error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl ExpressionError {
    pub(crate) fn invalid_character(span: Span) -> Self {
        ExpressionError::Syntax {
            span,
            message: "Unexpected character".to_string(),
            expected: vec![],
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        match self {
            ExpressionError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };

                let written = Report::build(ReportKind::Error, filename, span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((filename, span.clone()))
                            .with_message(format!("{}{}", message, expected_str))
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut buf);
                if written.is_err() {
                    return self.to_string();
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for ExpressionError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of input".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        ExpressionError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::Ident(s) => format!("identifier '{}'", s),
        Token::String(s) => format!("string '{}'", s),
        Token::Number(n) => format!("number {}", n),
        Token::And => "keyword 'and'".to_string(),
        Token::Or => "keyword 'or'".to_string(),
        Token::Not => "keyword 'not'".to_string(),
        Token::True => "keyword 'true'".to_string(),
        Token::False => "keyword 'false'".to_string(),
        Token::Null => "keyword 'null'".to_string(),
        Token::Elvis => "'?:'".to_string(),
        Token::SafeDot => "'?.'".to_string(),
        Token::EqualEqual => "'=='".to_string(),
        Token::NotEqual => "'!='".to_string(),
        Token::Bang => "'!'".to_string(),
        Token::Plus => "'+'".to_string(),
        Token::DollarBrace => "'${'".to_string(),
        Token::BraceClose => "'}'".to_string(),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::BracketOpen => "'['".to_string(),
        Token::BracketClose => "']'".to_string(),
        Token::Dot => "'.'".to_string(),
        Token::Colon => "':'".to_string(),
    }
}

/// Errors raised while evaluating an expression against a binding
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Reference to a variable that is not bound in the current scope
    #[error("unknown variable '{name}'")]
    UnknownVariable { name: String },

    /// Property access on null without the null-safe operator
    #[error("cannot read property '{property}' of null in '{expression}'")]
    NullDereference { property: String, expression: String },

    /// Property access on a value that has no properties
    #[error("cannot read property '{property}' of {kind} in '{expression}'")]
    NotAnObject {
        property: String,
        kind: &'static str,
        expression: String,
    },

    /// Index applied to a non-array value
    #[error("cannot index {kind} in '{expression}'")]
    NotAnArray {
        kind: &'static str,
        expression: String,
    },
}

/// Errors that make the generator impossible to build (ConfigurationLoadError)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A named resource (manifest or template) could not be located
    #[error("can not find resource '{name}'")]
    ResourceNotFound { name: String },

    /// A resource exists but could not be read
    #[error("failed to read resource {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid TOML
    #[error("failed to parse narrative manifest: {0}")]
    Manifest(#[from] toml::de::Error),

    /// Two manifest entries map the same profile or data type
    #[error("duplicate narrative template for {kind} '{key}'")]
    Duplicate { kind: &'static str, key: String },
}

/// Errors raised by a single render (RenderFailure)
#[derive(Error, Debug)]
pub enum RenderError {
    /// Template or nested fragment is not well-formed markup
    #[error("malformed markup: {0}")]
    Markup(#[from] quick_xml::Error),

    /// Unbalanced or stray tags the XML reader tolerates
    #[error("malformed markup: {0}")]
    Structure(String),

    /// Expression in an attribute or inline text failed to parse
    #[error("invalid expression '{source_text}': {}", format_expression_errors(.errors))]
    Expression {
        source_text: String,
        errors: Vec<ExpressionError>,
    },

    /// Processor attribute with a value it does not accept
    #[error("invalid value '{value}' for attribute {attribute}")]
    InvalidAttribute { attribute: String, value: String },

    /// Processor attribute no visitor of this engine handles
    #[error("attribute {attribute} is not supported in this template")]
    UnhandledAttribute { attribute: String },

    /// Rendered narrative is not exactly one `<div>` element
    #[error("narrative must be a single <div> element, found {found}")]
    NotADiv { found: String },

    /// Expression evaluation failed
    #[error("evaluation failed: {0}")]
    Eval(#[from] EvalError),

    /// Embedded value whose data type could not be determined
    #[error("cannot determine data type of embedded value '{expression}'")]
    UnknownDataType { expression: String },

    /// Profile without a template while missing templates are not ignored
    #[error("no narrative template for profile '{profile}'")]
    MissingTemplate { profile: String },
}

impl RenderError {
    pub(crate) fn expression(source_text: &str, errors: Vec<ExpressionError>) -> Self {
        RenderError::Expression {
            source_text: source_text.to_string(),
            errors,
        }
    }
}

fn format_expression_errors(errors: &[ExpressionError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Caller-visible error when narrative failures are not suppressed
#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("failed to generate narrative for profile '{profile}': {source}")]
    Format {
        profile: String,
        #[source]
        source: RenderError,
    },
}

impl NarrativeError {
    /// The underlying render failure
    pub fn render_error(&self) -> &RenderError {
        match self {
            NarrativeError::Format { source, .. } => source,
        }
    }
}
