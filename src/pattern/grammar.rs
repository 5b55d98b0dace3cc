//! Pattern parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::PatternError;
use crate::pattern::ast::{PlaceholderName, Segment, Spanned};
use crate::pattern::lexer::Token;
use crate::template::matcher::{OCCURRENCE_CODE, PERIOD_CODE};

/// Segment as written, before name validation
#[derive(Debug, Clone)]
enum RawSegment {
    Literal(String),
    Placeholder {
        name: Option<Spanned<String>>,
        expression: Option<String>,
    },
    Reference(Spanned<String>),
}

/// Parse a pattern into segments, validating placeholder names
pub fn parse(pattern: &str) -> Result<Vec<Spanned<Segment>>, PatternError> {
    let len = pattern.len();

    let token_iter = crate::pattern::lexer::lex(pattern).map(|(tok, span)| (tok, span.into()));

    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    let raw = pattern_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| {
            errs.into_iter()
                .next()
                .map(PatternError::from)
                .unwrap_or_else(|| PatternError::InvalidPattern {
                    message: "unparseable pattern".to_string(),
                })
        })?;

    raw.into_iter().map(validate).collect()
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn pattern_parser<'a, I>(
) -> impl Parser<'a, I, Vec<Spanned<RawSegment>>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let name = select! {
        Token::Text(s) => s,
    }
    .map_with(|s, e| Spanned::new(s, span_range(&e.span())));

    // Inside an expression escaped braces become real braces for the regex
    let expression = select! {
        Token::Text(s) => s,
        Token::Escape(s) => s,
        Token::Colon => ":".to_string(),
        Token::At => "@".to_string(),
        Token::EscapedBraceOpen => "{".to_string(),
        Token::EscapedBraceClose => "}".to_string(),
    }
    .repeated()
    .at_least(1)
    .collect::<Vec<String>>()
    .map(|pieces| pieces.concat());

    let reference = just(Token::At)
        .ignore_then(name.clone())
        .map(RawSegment::Reference);

    let placeholder = name
        .or_not()
        .then(just(Token::Colon).ignore_then(expression).or_not())
        .map(|(name, expression)| RawSegment::Placeholder { name, expression });

    let braced = choice((reference, placeholder))
        .delimited_by(just(Token::BraceOpen), just(Token::BraceClose));

    // A stray closing brace outside a placeholder is plain text
    let literal = select! {
        Token::Text(s) => s,
        Token::Escape(s) => s,
        Token::Colon => ":".to_string(),
        Token::At => "@".to_string(),
        Token::EscapedBraceOpen => "{".to_string(),
        Token::EscapedBraceClose => "}".to_string(),
        Token::BraceClose => "}".to_string(),
    }
    .repeated()
    .at_least(1)
    .collect::<Vec<String>>()
    .map(|pieces| RawSegment::Literal(pieces.concat()));

    choice((braced, literal))
        .map_with(|segment, e| Spanned::new(segment, span_range(&e.span())))
        .repeated()
        .collect()
        .then_ignore(end())
}

fn validate(raw: Spanned<RawSegment>) -> Result<Spanned<Segment>, PatternError> {
    let Spanned { node, span } = raw;
    let segment = match node {
        RawSegment::Literal(text) => Segment::Literal(text),
        RawSegment::Reference(name) => Segment::Reference(validate_reference(name)?),
        RawSegment::Placeholder { name: None, .. } => {
            return Err(PatternError::MissingName { span });
        }
        RawSegment::Placeholder {
            name: Some(name),
            expression,
        } => Segment::Placeholder {
            name: validate_name(name)?,
            expression,
        },
    };
    Ok(Spanned::new(segment, span))
}

fn validate_name(name: Spanned<String>) -> Result<PlaceholderName, PatternError> {
    let Spanned { node, span } = name;
    if node.contains(PERIOD_CODE) || node.contains(OCCURRENCE_CODE) {
        return Err(PatternError::ReservedName { name: node, span });
    }
    PlaceholderName::new(&node).ok_or(PatternError::InvalidName { name: node, span })
}

/// Template names may also contain dashes and start with a digit
fn validate_reference(name: Spanned<String>) -> Result<String, PatternError> {
    let Spanned { node, span } = name;
    let legal = node
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if legal {
        Ok(node)
    } else {
        Err(PatternError::InvalidName { name: node, span })
    }
}
