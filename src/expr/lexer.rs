//! Lexer for template expressions using logos

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Keywords
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // Operators (longer patterns first)
    #[token("?:")]
    Elvis,
    #[token("?.")]
    SafeDot,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    NotEqual,
    #[token("!")]
    Bang,
    #[token("+")]
    Plus,

    // Delimiters
    #[token("${")]
    DollarBrace,
    #[token("}")]
    BraceClose,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unquote(lex.slice()))]
    #[regex(r"'([^'\\]|\\.)*'", |lex| unquote(lex.slice()))]
    String(String),

    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),
}

/// Strip the surrounding quotes and resolve backslash escapes
fn unquote(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Lex input string into tokens with spans
///
/// Stops at the first character that does not start a token and reports its span.
pub fn lex(input: &str) -> Result<Vec<(Token, Span)>, Span> {
    Token::lexer(input)
        .spanned()
        .map(|(tok, span)| tok.map(|t| (t, span.clone())).map_err(|_| span))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        lex(input)
            .expect("Should lex")
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn test_path_tokens() {
        assert_eq!(
            tokens("resource.name[0]"),
            vec![
                Token::Ident("resource".to_string()),
                Token::Dot,
                Token::Ident("name".to_string()),
                Token::BracketOpen,
                Token::Number(0.0),
                Token::BracketClose,
            ]
        );
    }

    #[test]
    fn test_dollar_wrapper() {
        assert_eq!(
            tokens("${a}"),
            vec![
                Token::DollarBrace,
                Token::Ident("a".to_string()),
                Token::BraceClose
            ]
        );
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(
            tokens("a?.b ?: c != d == e !f"),
            vec![
                Token::Ident("a".to_string()),
                Token::SafeDot,
                Token::Ident("b".to_string()),
                Token::Elvis,
                Token::Ident("c".to_string()),
                Token::NotEqual,
                Token::Ident("d".to_string()),
                Token::EqualEqual,
                Token::Ident("e".to_string()),
                Token::Bang,
                Token::Ident("f".to_string()),
            ]
        );
    }

    #[test]
    fn test_keywords_versus_identifiers() {
        assert_eq!(
            tokens("and android not nothing"),
            vec![
                Token::And,
                Token::Ident("android".to_string()),
                Token::Not,
                Token::Ident("nothing".to_string()),
            ]
        );
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(
            tokens(r#"'single' "double" 'it\'s'"#),
            vec![
                Token::String("single".to_string()),
                Token::String("double".to_string()),
                Token::String("it's".to_string()),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("42 3.5"),
            vec![Token::Number(42.0), Token::Number(3.5)]
        );
    }

    #[test]
    fn test_invalid_character_reports_span() {
        let err = lex("a @ b").unwrap_err();
        assert_eq!(err, 2..3);
    }
}
