//! Lexer for template patterns using logos

use logos::Logos;

pub use super::ast::Span;

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    // Delimiters
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token(":")]
    Colon,
    #[token("@")]
    At,

    // Braces that belong to the text rather than the grammar
    #[token(r"\{")]
    EscapedBraceOpen,
    #[token(r"\}")]
    EscapedBraceClose,

    // Any other backslash sequence is kept verbatim (`\d`, `\.`, a trailing `\`)
    #[regex(r"\\[^{}]?", |lex| lex.slice().to_string())]
    Escape(String),

    #[regex(r"[^{}:@\\]+", |lex| lex.slice().to_string())]
    Text(String),
}

/// Lex a pattern into tokens with spans
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}
