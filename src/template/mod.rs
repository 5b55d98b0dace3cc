//! Templates bind a pattern to its compiled matcher and formatter
//!
//! A [`Template`] parses and validates its pattern on construction. Templates
//! without `{@reference}` placeholders compile straight away; templates with
//! references compile the first time they are used, once their resolver can
//! supply the referenced templates.
//!
//! # Example
//!
//! ```rust
//! use path_template::{data, Template, Value};
//!
//! let template = Template::new("model", "/jobs/{job.code}/assets/model/{lod}").unwrap();
//!
//! let parsed = template.parse("/jobs/monty/assets/model/high").unwrap();
//! assert_eq!(parsed["lod"], Value::from("high"));
//!
//! let path = template.format(&parsed).unwrap();
//! assert_eq!(path, "/jobs/monty/assets/model/high");
//! ```

pub(crate) mod formatter;
pub(crate) mod matcher;
mod registry;
mod resolver;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::config::{Anchor, DuplicatePlaceholderMode, TemplateOptions};
use crate::data::Data;
use crate::error::{Error, PatternError};
use crate::pattern::{Segment, Spanned};

use formatter::Formatter;
use matcher::Matcher;
use resolver::{Piece, ResolutionContext};

pub use registry::{RegistryError, TemplateRegistry};
pub use resolver::Resolver;

/// Matcher and formatter built from the fully expanded pattern
#[derive(Debug, Clone)]
struct Compiled {
    matcher: Matcher,
    formatter: Formatter,
}

impl Compiled {
    fn build(pieces: &[Piece], options: &TemplateOptions) -> Result<Self, PatternError> {
        matcher::check_key_conflicts(pieces)?;
        Ok(Self {
            matcher: Matcher::compile(pieces, options)?,
            formatter: Formatter::compile(pieces),
        })
    }
}

/// A named pattern that can parse paths into data and format data into paths
///
/// Cloning a template clones its compiled state, so clones never share
/// anything mutable.
#[derive(Clone)]
pub struct Template {
    name: String,
    pattern: String,
    options: TemplateOptions,
    segments: Vec<Spanned<Segment>>,
    resolver: Option<Arc<dyn Resolver>>,
    compiled: OnceLock<Compiled>,
}

impl Template {
    /// Create a template with default options
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Result<Self, PatternError> {
        Self::with_options(name, pattern, TemplateOptions::default())
    }

    /// Create a template with custom options
    pub fn with_options(
        name: impl Into<String>,
        pattern: impl Into<String>,
        options: TemplateOptions,
    ) -> Result<Self, PatternError> {
        let name = name.into();
        let pattern = pattern.into();
        let segments = crate::pattern::parse(&pattern)?;

        // Sub-expressions are checked now even if the full matcher has to wait
        matcher::validate_expression("(default)", &options.default_expression)?;
        for segment in &segments {
            if let Segment::Placeholder {
                name,
                expression: Some(expression),
            } = &segment.node
            {
                matcher::validate_expression(name.as_str(), expression)?;
            }
        }

        let template = Self {
            name,
            pattern,
            options,
            segments,
            resolver: None,
            compiled: OnceLock::new(),
        };

        if !template.has_references() {
            let pieces: Vec<Piece> = template
                .segments
                .iter()
                .filter_map(|segment| Piece::from_segment(&segment.node))
                .collect();
            let compiled = Compiled::build(&pieces, &template.options)?;
            debug!(
                template = template.name.as_str(),
                expression = compiled.matcher.as_str(),
                "compiled template"
            );
            let _ = template.compiled.set(compiled);
        }

        Ok(template)
    }

    /// Set the resolver used for `{@reference}` placeholders
    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        if self.has_references() {
            self.compiled = OnceLock::new();
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn options(&self) -> &TemplateOptions {
        &self.options
    }

    pub fn anchor(&self) -> Anchor {
        self.options.anchor
    }

    pub fn duplicate_mode(&self) -> DuplicatePlaceholderMode {
        self.options.duplicate_mode
    }

    pub fn default_expression(&self) -> &str {
        &self.options.default_expression
    }

    pub fn resolver(&self) -> Option<&Arc<dyn Resolver>> {
        self.resolver.as_ref()
    }

    /// Return data extracted from `path` using this template
    pub fn parse(&self, path: &str) -> Result<Data, Error> {
        Ok(self.compiled()?.matcher.parse(&self.name, path)?)
    }

    /// Return a path formatted by applying `data` to this template
    pub fn format(&self, data: &Data) -> Result<String, Error> {
        Ok(self.compiled()?.formatter.format(data)?)
    }

    /// Placeholder names used by this template, including referenced templates
    ///
    /// The returned set is a fresh copy.
    pub fn keys(&self) -> Result<BTreeSet<String>, Error> {
        Ok(self.compiled()?.formatter.keys())
    }

    /// Names of templates referenced directly by this pattern
    pub fn references(&self) -> BTreeSet<String> {
        self.segments
            .iter()
            .filter_map(|segment| match &segment.node {
                Segment::Reference(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Pattern with every reference replaced by the referenced pattern
    pub fn expanded_pattern(&self) -> Result<String, Error> {
        let pieces = resolver::expand(self, None, &mut ResolutionContext::new())?;
        Ok(pieces.iter().map(Piece::to_pattern).collect())
    }

    /// Source of the compiled regular expression
    pub fn regex(&self) -> Result<&str, Error> {
        Ok(self.compiled()?.matcher.as_str())
    }

    fn has_references(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment.node, Segment::Reference(_)))
    }

    fn compiled(&self) -> Result<&Compiled, Error> {
        if let Some(compiled) = self.compiled.get() {
            return Ok(compiled);
        }

        let pieces = resolver::expand(self, None, &mut ResolutionContext::new())?;
        let compiled = Compiled::build(&pieces, &self.options)?;
        debug!(
            template = self.name.as_str(),
            expression = compiled.matcher.as_str(),
            "compiled template with references"
        );
        Ok(self.compiled.get_or_init(|| compiled))
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.pattern == other.pattern
    }
}

impl Eq for Template {}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{data, Value};
    use crate::error::{FormatError, ParseError, ResolveError};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn resolver_of(templates: Vec<Template>) -> Arc<dyn Resolver> {
        let map: HashMap<String, Template> = templates
            .into_iter()
            .map(|t| (t.name().to_string(), t))
            .collect();
        Arc::new(map)
    }

    #[test]
    fn test_valid_patterns() {
        for pattern in ["", "{variable}", "{dotted.variable}", "{variable}/{variable}", r"{variable:\w+?}"] {
            assert!(Template::new("test", pattern).is_ok(), "{pattern} should be valid");
        }
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(
            Template::new("test", "{}"),
            Err(PatternError::MissingName { .. })
        ));
        assert!(matches!(
            Template::new("test", "{variable-dashed}"),
            Err(PatternError::InvalidName { .. })
        ));
        assert!(matches!(
            Template::new("test", "{variable:(?P<missing_closing_angle_bracket)}"),
            Err(PatternError::InvalidExpression { .. })
        ));
        assert!(matches!(
            Template::new("test", "{a}/{a.b}"),
            Err(PatternError::KeyConflict { .. })
        ));
    }

    #[test]
    fn test_invalid_default_expression() {
        let options = TemplateOptions::new().with_default_expression("(");
        assert!(matches!(
            Template::with_options("test", "{a}", options),
            Err(PatternError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_invalid_expression_detected_before_resolution() {
        assert!(matches!(
            Template::new("test", r"{@other}/{a:[}"),
            Err(PatternError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_debug_shows_name_and_pattern_only() {
        let template = Template::new("test", r"/foo/{bar}/{baz:\d+}").unwrap();
        assert_eq!(
            format!("{:?}", template),
            r#"Template { name: "test", pattern: "/foo/{bar}/{baz:\\d+}" }"#
        );
    }

    #[test]
    fn test_equality_ignores_options() {
        let a = Template::new("test", "/{a}").unwrap();
        let b = Template::with_options("test", "/{a}", TemplateOptions::new().with_anchor(Anchor::Both))
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, Template::new("other", "/{a}").unwrap());
    }

    #[test]
    fn test_clone_recompiles_equal_regex() {
        let template = Template::new("test", "/single/{variable}").unwrap();
        let copied = template.clone();
        assert_eq!(template.regex().unwrap(), copied.regex().unwrap());
        assert_eq!(copied.parse("/single/value").unwrap(), data([("variable", "value")]));
    }

    #[test]
    fn test_escaping_pattern() {
        let template = Template::new("test", r"{filename}.{index:\d\{4\}}.{ext}").unwrap();
        assert_eq!(
            template.parse("filename.0001.ext").unwrap(),
            data([("filename", "filename"), ("index", "0001"), ("ext", "ext")])
        );
    }

    #[test]
    fn test_regex_special_characters_in_literals() {
        let template = Template::with_options(
            "test",
            "/a+b/(c)/{x}",
            TemplateOptions::new().with_anchor(Anchor::Both),
        )
        .unwrap();
        assert_eq!(template.parse("/a+b/(c)/y").unwrap(), data([("x", "y")]));
        assert!(template.parse("/aab/c/y").is_err());
    }

    #[test]
    fn test_reference_parse_format_keys() {
        let resolver = resolver_of(vec![Template::new("reference", "{variable}").unwrap()]);
        let nested = Template::new("nested", "/root/{@reference}")
            .unwrap()
            .with_resolver(resolver);

        assert_eq!(nested.parse("/root/value").unwrap(), data([("variable", "value")]));
        assert_eq!(nested.format(&data([("variable", "value")])).unwrap(), "/root/value");
        assert!(nested.keys().unwrap().contains("variable"));
        assert_eq!(nested.expanded_pattern().unwrap(), "/root/{variable}");
        assert_eq!(
            nested.references().into_iter().collect::<Vec<_>>(),
            vec!["reference".to_string()]
        );
    }

    #[test]
    fn test_reference_keeps_explicit_expression() {
        let resolver = resolver_of(vec![Template::new("frame", r"{frame:\d\{4\}}").unwrap()]);
        let template = Template::with_options(
            "shot",
            "/{shot}.{@frame}.exr",
            TemplateOptions::new().with_anchor(Anchor::Both),
        )
        .unwrap()
        .with_resolver(resolver);

        assert_eq!(
            template.parse("/sh010.0042.exr").unwrap(),
            data([("shot", "sh010"), ("frame", "0042")])
        );
        assert!(template.parse("/sh010.42.exr").is_err());
    }

    #[test]
    fn test_missing_resolver_fails_every_operation() {
        let template = Template::new("nested", "/root/{@reference}").unwrap();
        assert!(matches!(
            template.parse("/root/value"),
            Err(Error::Resolve(ResolveError::NoResolver { .. }))
        ));
        assert!(matches!(
            template.format(&data([("variable", "value")])),
            Err(Error::Resolve(ResolveError::NoResolver { .. }))
        ));
        assert!(matches!(
            template.keys(),
            Err(Error::Resolve(ResolveError::NoResolver { .. }))
        ));
        assert!(matches!(
            template.expanded_pattern(),
            Err(Error::Resolve(ResolveError::NoResolver { .. }))
        ));
    }

    #[test]
    fn test_unresolvable_reference() {
        let template = Template::new("nested", "/root/{@reference}")
            .unwrap()
            .with_resolver(resolver_of(vec![]));
        assert!(matches!(
            template.parse("/root/value"),
            Err(Error::Resolve(ResolveError::NotFound { ref name })) if name == "reference"
        ));
    }

    #[test]
    fn test_reference_key_conflict_is_reported_on_use() {
        let resolver = resolver_of(vec![Template::new("inner", "{a.b}").unwrap()]);
        let template = Template::new("outer", "{a}/{@inner}")
            .unwrap()
            .with_resolver(resolver);
        assert!(matches!(
            template.parse("x/y"),
            Err(Error::Pattern(PatternError::KeyConflict { .. }))
        ));
    }

    #[test]
    fn test_format_errors_are_wrapped() {
        let template = Template::new("test", "/single/{variable}").unwrap();
        assert!(matches!(
            template.format(&Data::new()),
            Err(Error::Format(FormatError::MissingKey { .. }))
        ));
        assert!(matches!(
            template.parse("/other/value"),
            Err(Error::Parse(ParseError::NoMatch { .. }))
        ));
    }

    #[test]
    fn test_accessors() {
        let template = Template::with_options(
            "test",
            "/{a}",
            TemplateOptions::new()
                .with_anchor(Anchor::End)
                .with_duplicate_mode(DuplicatePlaceholderMode::Strict),
        )
        .unwrap();
        assert_eq!(template.name(), "test");
        assert_eq!(template.pattern(), "/{a}");
        assert_eq!(template.anchor(), Anchor::End);
        assert_eq!(template.duplicate_mode(), DuplicatePlaceholderMode::Strict);
        assert_eq!(template.default_expression(), crate::config::DEFAULT_PLACEHOLDER_EXPRESSION);
        assert!(template.resolver().is_none());
    }

    #[test]
    fn test_templates_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Template>();
        assert_send_sync::<Value>();
    }
}
