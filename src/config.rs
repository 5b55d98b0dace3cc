//! Options controlling how a template matches and reconciles values

use serde::{Deserialize, Serialize};

/// Expression used for placeholders that do not declare their own
pub const DEFAULT_PLACEHOLDER_EXPRESSION: &str = r"[\w_.\-]+";

/// Where a pattern must match within a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    /// Match must begin at the start of the path
    #[default]
    Start,
    /// Match must finish at the end of the path
    End,
    /// Match must cover the whole path
    Both,
    /// Match may occur anywhere in the path
    None,
}

/// How repeated placeholders are reconciled when parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePlaceholderMode {
    /// The last occurrence wins
    #[default]
    Relaxed,
    /// Every occurrence must extract the same value
    Strict,
}

/// Configuration options for a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateOptions {
    pub anchor: Anchor,
    pub duplicate_mode: DuplicatePlaceholderMode,
    /// Expression for placeholders without an explicit one
    pub default_expression: String,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            anchor: Anchor::Start,
            duplicate_mode: DuplicatePlaceholderMode::Relaxed,
            default_expression: DEFAULT_PLACEHOLDER_EXPRESSION.to_string(),
        }
    }
}

impl TemplateOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the anchor mode
    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Set the duplicate placeholder mode
    pub fn with_duplicate_mode(mut self, mode: DuplicatePlaceholderMode) -> Self {
        self.duplicate_mode = mode;
        self
    }

    /// Set the expression used by placeholders without one
    pub fn with_default_expression(mut self, expression: impl Into<String>) -> Self {
        self.default_expression = expression.into();
        self
    }
}
