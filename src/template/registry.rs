//! Template registry for storing and retrieving templates by name

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::{Anchor, DuplicatePlaceholderMode, TemplateOptions};
use crate::error::PatternError;

use super::resolver::Resolver;
use super::Template;

/// Errors that can occur while filling a registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Duplicate template definition
    #[error("duplicate template definition: {name}")]
    Duplicate { name: String },

    #[error("Failed to parse template registry TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid pattern for template '{name}': {source}")]
    Pattern {
        name: String,
        #[source]
        source: PatternError,
    },
}

#[derive(Debug, Default)]
struct Entries {
    /// Templates in registration order
    templates: Vec<Template>,
    index: HashMap<String, usize>,
}

/// Registry of named templates
///
/// The registry is a [`Resolver`], so templates can reference each other by
/// name. It can be shared behind an [`Arc`] while templates are still being
/// added.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    entries: RwLock<Entries>,
}

/// TOML structure for deserializing registries
#[derive(Deserialize)]
struct TomlRegistry {
    #[serde(default)]
    defaults: TemplateOptions,
    #[serde(default, rename = "template")]
    templates: Vec<TomlTemplate>,
}

#[derive(Deserialize)]
struct TomlTemplate {
    name: String,
    pattern: String,
    anchor: Option<Anchor>,
    duplicate_mode: Option<DuplicatePlaceholderMode>,
    default_expression: Option<String>,
}

impl TomlTemplate {
    fn options(&self, defaults: &TemplateOptions) -> TemplateOptions {
        TemplateOptions {
            anchor: self.anchor.unwrap_or(defaults.anchor),
            duplicate_mode: self.duplicate_mode.unwrap_or(defaults.duplicate_mode),
            default_expression: self
                .default_expression
                .clone()
                .unwrap_or_else(|| defaults.default_expression.clone()),
        }
    }
}

impl TemplateRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load templates from a TOML document
    ///
    /// ```rust
    /// use path_template::TemplateRegistry;
    ///
    /// let registry = TemplateRegistry::from_toml(r#"
    ///     [defaults]
    ///     anchor = "both"
    ///
    ///     [[template]]
    ///     name = "job"
    ///     pattern = "/jobs/{job.code}"
    ///
    ///     [[template]]
    ///     name = "model"
    ///     pattern = "{@job}/assets/model/{lod}"
    /// "#).unwrap();
    ///
    /// let model = registry.get("model").unwrap();
    /// assert!(model.parse("/jobs/monty/assets/model/high").is_ok());
    /// ```
    ///
    /// Every loaded template resolves references through this registry.
    pub fn from_toml(content: &str) -> Result<Arc<Self>, RegistryError> {
        let parsed: TomlRegistry = toml::from_str(content)?;

        let registry = Arc::new(Self::new());
        let resolver: Arc<dyn Resolver> = Arc::new(Arc::downgrade(&registry));

        for entry in &parsed.templates {
            let template =
                Template::with_options(&entry.name, &entry.pattern, entry.options(&parsed.defaults))
                    .map_err(|source| RegistryError::Pattern {
                        name: entry.name.clone(),
                        source,
                    })?
                    .with_resolver(resolver.clone());
            registry.insert(template)?;
        }

        Ok(registry)
    }

    /// Register a template under its own name
    pub fn insert(&self, template: Template) -> Result<(), RegistryError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.index.contains_key(template.name()) {
            return Err(RegistryError::Duplicate {
                name: template.name().to_string(),
            });
        }

        debug!(
            template = template.name(),
            pattern = template.pattern(),
            "registered template"
        );
        let position = entries.templates.len();
        entries.index.insert(template.name().to_string(), position);
        entries.templates.push(template);
        Ok(())
    }

    /// Get a template by name
    pub fn get(&self, name: &str) -> Option<Template> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .index
            .get(name)
            .map(|&position| entries.templates[position].clone())
    }

    /// Check if a template exists
    pub fn contains(&self, name: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.index.contains_key(name)
    }

    /// Get all template names in registration order
    pub fn names(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .templates
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    /// Snapshot of all templates in registration order
    pub fn templates(&self) -> Vec<Template> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.templates.clone()
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Resolver for TemplateRegistry {
    fn get(&self, name: &str) -> Option<Template> {
        TemplateRegistry::get(self, name)
    }
}
