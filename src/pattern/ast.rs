//! Syntax tree types for template patterns

use std::fmt;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Dot-delimited placeholder name such as `job.code`
///
/// Every segment is an identifier (`[A-Za-z_][A-Za-z0-9_]*`). The dots describe
/// where a value lives in nested [`Data`](crate::Data).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceholderName(String);

impl PlaceholderName {
    /// Validate `name`, returning `None` if it is not a legal placeholder name
    pub fn new(name: &str) -> Option<Self> {
        if name.split('.').all(is_identifier) {
            Some(Self(name.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into the enclosing mapping keys and the leaf key
    pub fn split_leaf(&self) -> (impl Iterator<Item = &str>, &str) {
        let (parents, leaf) = self.0.rsplit_once('.').unwrap_or(("", self.0.as_str()));
        // segments are never empty once validated, so "" only means "no parents"
        (parents.split('.').filter(|key| !key.is_empty()), leaf)
    }

    /// True if `other` lives inside the mapping named by `self`
    pub fn is_parent_of(&self, other: &PlaceholderName) -> bool {
        other
            .0
            .strip_prefix(self.0.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

impl fmt::Display for PlaceholderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// One element of a parsed pattern, in source order
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text, with escaped braces already unescaped
    Literal(String),
    /// `{name}` or `{name:expression}`
    Placeholder {
        name: PlaceholderName,
        expression: Option<String>,
    },
    /// `{@template}`
    Reference(String),
}

/// Escape braces so `text` reads back as literal text in a pattern
pub(crate) fn escape_braces(text: &str) -> String {
    text.replace('{', r"\{").replace('}', r"\}")
}
