//! Template reference resolution - expands `{@name}` into the referenced grammar

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};

use tracing::debug;

use crate::error::ResolveError;
use crate::pattern::ast::{escape_braces, PlaceholderName, Segment};

use super::Template;

/// Looks up templates by name on behalf of `{@name}` references
///
/// Any host type can act as a resolver; maps of templates and the
/// [`TemplateRegistry`](super::TemplateRegistry) implement it out of the box.
pub trait Resolver: Send + Sync {
    /// Return the template called `name`, if known
    fn get(&self, name: &str) -> Option<Template>;
}

impl Resolver for HashMap<String, Template> {
    fn get(&self, name: &str) -> Option<Template> {
        HashMap::get(self, name).cloned()
    }
}

impl Resolver for BTreeMap<String, Template> {
    fn get(&self, name: &str) -> Option<Template> {
        BTreeMap::get(self, name).cloned()
    }
}

impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    fn get(&self, name: &str) -> Option<Template> {
        (**self).get(name)
    }
}

/// A weak handle resolves nothing once its target is dropped
impl<R: Resolver> Resolver for Weak<R> {
    fn get(&self, name: &str) -> Option<Template> {
        self.upgrade().and_then(|resolver| resolver.get(name))
    }
}

/// A pattern element after every reference has been expanded
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Piece {
    Literal(String),
    Placeholder {
        name: PlaceholderName,
        expression: Option<String>,
    },
}

impl Piece {
    /// Convert a segment that needs no resolution
    pub(crate) fn from_segment(segment: &Segment) -> Option<Self> {
        match segment {
            Segment::Literal(text) => Some(Piece::Literal(text.clone())),
            Segment::Placeholder { name, expression } => Some(Piece::Placeholder {
                name: name.clone(),
                expression: expression.clone(),
            }),
            Segment::Reference(_) => None,
        }
    }

    /// Write the piece back in pattern syntax
    pub(crate) fn to_pattern(&self) -> String {
        match self {
            Piece::Literal(text) => escape_braces(text),
            Piece::Placeholder {
                name,
                expression: None,
            } => format!("{{{}}}", name),
            Piece::Placeholder {
                name,
                expression: Some(expression),
            } => format!("{{{}:{}}}", name, escape_braces(expression)),
        }
    }
}

/// Context for reference expansion
#[derive(Debug, Clone, Default)]
pub(crate) struct ResolutionContext {
    /// Root template name, then the reference keys being expanded, outermost first
    resolving: Vec<String>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a template or reference key is currently being expanded
    pub fn is_resolving(&self, name: &str) -> bool {
        self.resolving.iter().any(|n| n == name)
    }

    pub fn start_resolving(&mut self, name: &str) {
        self.resolving.push(name.to_string());
    }

    pub fn done_resolving(&mut self) {
        self.resolving.pop();
    }

    /// The chain of templates that leads back to `name`
    fn cycle_to(&self, name: &str) -> Vec<String> {
        let mut chain = self.resolving.clone();
        chain.push(name.to_string());
        chain
    }
}

/// Expand all references in `template`, recursively
///
/// A referenced template is expanded with its own resolver when it has one and
/// with `inherited` otherwise.
pub(crate) fn expand(
    template: &Template,
    inherited: Option<&(dyn Resolver + 'static)>,
    ctx: &mut ResolutionContext,
) -> Result<Vec<Piece>, ResolveError> {
    ctx.start_resolving(template.name());
    let pieces = expand_segments(template, inherited, ctx)?;
    ctx.done_resolving();
    Ok(pieces)
}

/// Cycle detection runs on reference keys, which need not match the names of
/// the templates a resolver hands back
fn expand_segments(
    template: &Template,
    inherited: Option<&(dyn Resolver + 'static)>,
    ctx: &mut ResolutionContext,
) -> Result<Vec<Piece>, ResolveError> {
    let resolver = template.resolver.as_deref().or(inherited);
    let mut pieces = Vec::with_capacity(template.segments.len());

    for segment in &template.segments {
        let reference = match &segment.node {
            Segment::Reference(reference) => reference,
            other => {
                pieces.extend(Piece::from_segment(other));
                continue;
            }
        };

        let resolver = resolver.ok_or_else(|| ResolveError::NoResolver {
            template: template.name().to_string(),
            reference: reference.clone(),
        })?;

        if ctx.is_resolving(reference) {
            return Err(ResolveError::Cycle {
                chain: ctx.cycle_to(reference),
            });
        }

        let target = resolver
            .get(reference)
            .ok_or_else(|| ResolveError::NotFound {
                name: reference.clone(),
            })?;

        debug!(
            template = template.name(),
            reference = reference.as_str(),
            pattern = target.pattern(),
            "expanding template reference"
        );

        ctx.start_resolving(reference);
        pieces.extend(expand_segments(&target, Some(resolver), ctx)?);
        ctx.done_resolving();
    }

    Ok(pieces)
}
