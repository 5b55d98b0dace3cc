//! Error types for template construction, parsing, formatting and resolution

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::data::Data;
use crate::pattern::ast::Span;
use crate::pattern::lexer::Token;
use crate::template::RegistryError;

/// Errors raised while building a template from its pattern
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("Invalid pattern at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },

    #[error("Placeholder name not specified at {span:?}")]
    MissingName { span: Span },

    #[error("Placeholder name '{name}' contains invalid characters")]
    InvalidName { name: String, span: Span },

    #[error("Placeholder name '{name}' uses a reserved internal code")]
    ReservedName { name: String, span: Span },

    #[error("Invalid pattern: expression '{expression}' for placeholder '{name}' is invalid: {message}")]
    InvalidExpression {
        name: String,
        expression: String,
        message: String,
    },

    #[error("Invalid pattern: {message}")]
    InvalidPattern { message: String },

    #[error("Placeholder '{name}' is used both as a value and as a nested key")]
    KeyConflict { name: String },
}

impl PatternError {
    /// Location of the offending text in the pattern, if known
    pub fn span(&self) -> Option<&Span> {
        match self {
            PatternError::Syntax { span, .. }
            | PatternError::MissingName { span }
            | PatternError::InvalidName { span, .. }
            | PatternError::ReservedName { span, .. } => Some(span),
            _ => None,
        }
    }

    /// Format the error with pattern context using ariadne, as plain text
    pub fn format(&self, source: &str, filename: &str) -> String {
        let span = self.span().cloned().unwrap_or(0..source.len());
        let label = match self {
            PatternError::Syntax {
                message, expected, ..
            } if !expected.is_empty() => {
                format!("{}\nExpected: {}", message, expected.join(", "))
            }
            other => other.to_string(),
        };

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_config(Config::default().with_color(false))
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, span))
                    .with_message(label)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for PatternError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of pattern".to_string(),
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
                chumsky::error::RichPattern::EndOfInput => Some("end of pattern".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("'{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        PatternError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::BraceOpen => "'{'".to_string(),
        Token::BraceClose => "'}'".to_string(),
        Token::Colon => "':'".to_string(),
        Token::At => "'@'".to_string(),
        Token::EscapedBraceOpen => r"'\{'".to_string(),
        Token::EscapedBraceClose => r"'\}'".to_string(),
        Token::Escape(s) => format!("escape '{}'", s),
        Token::Text(s) => format!("text '{}'", s),
    }
}

/// Errors raised when a path cannot be parsed
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Input '{path}' did not match pattern of template '{template}'.")]
    NoMatch { template: String, path: String },

    #[error("Different extracted values for placeholder '{placeholder}' detected. Values were '{first}' and '{second}'.")]
    DuplicateMismatch {
        placeholder: String,
        first: String,
        second: String,
    },

    #[error("Path '{path}' did not match any of the supplied template patterns.")]
    NoTemplateMatched { path: String },
}

/// Errors raised when data cannot be formatted into a path
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Could not format data {data:?} due to missing key '{placeholder}'.")]
    MissingKey { placeholder: String, data: Data },

    #[error("Could not format data {data:?}: '{key}' is not a mapping while looking up '{placeholder}'.")]
    NotAMapping {
        placeholder: String,
        key: String,
        data: Data,
    },

    #[error("Could not format data {data:?}: value for '{placeholder}' is a mapping, not a string.")]
    NotAString { placeholder: String, data: Data },

    #[error("Data {data:?} was not formattable by any of the supplied templates.")]
    NoTemplateFormatted { data: Data },
}

/// Errors raised while expanding `{@template}` references
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Template '{template}' references '{reference}' but has no template resolver.")]
    NoResolver { template: String, reference: String },

    #[error("Failed to resolve reference to template '{name}'.")]
    NotFound { name: String },

    #[error("circular template reference detected: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },
}

/// Any error produced by this crate
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("{name} template not found in specified templates.")]
    NotFound { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_error_format_points_at_span() {
        let source = "/{variable-dashed}";
        let err = crate::pattern::parse(source).unwrap_err();
        assert_eq!(err.span(), Some(&(2..17)));

        let report = err.format(source, "pattern");
        assert!(!report.contains('\u{1b}'), "report should be plain text: {report:?}");
        assert!(report.contains("Placeholder name 'variable-dashed' contains invalid characters"));
        assert!(report.contains(source));
    }

    #[test]
    fn test_spanless_error_formats() {
        let err = PatternError::KeyConflict {
            name: "a".to_string(),
        };
        assert!(err.span().is_none());
        assert!(err.format("{a}/{a.b}", "pattern").contains("nested key"));
    }

    #[test]
    fn test_cycle_message() {
        let err = ResolveError::Cycle {
            chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "circular template reference detected: a -> b -> a");
    }
}
