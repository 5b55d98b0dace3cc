//! Path Template - bidirectional templating for filesystem-like paths
//!
//! A template such as `/jobs/{job.code}/assets/{asset_type}` can parse a path
//! into nested data and format the same data back into a path.
//!
//! # Example
//!
//! ```rust
//! use path_template::{data, Template, Value};
//!
//! let template = Template::new("asset", "/jobs/{job.code}/assets/{asset_type}").unwrap();
//!
//! let parsed = template.parse("/jobs/monty/assets/model").unwrap();
//! assert_eq!(
//!     parsed,
//!     data([
//!         ("job", Value::map([("code", "monty")])),
//!         ("asset_type", Value::from("model")),
//!     ])
//! );
//! assert_eq!(template.format(&parsed).unwrap(), "/jobs/monty/assets/model");
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod pattern;
pub mod template;

pub use config::{Anchor, DuplicatePlaceholderMode, TemplateOptions, DEFAULT_PLACEHOLDER_EXPRESSION};
pub use data::{data, Data, Value};
pub use error::{Error, FormatError, ParseError, PatternError, ResolveError};
pub use template::{RegistryError, Resolver, Template, TemplateRegistry};

use tracing::trace;

/// Parse `path` with the first template in `templates` that matches
///
/// Templates that fail to match are skipped. Errors that are not parse
/// failures, such as an unresolvable reference, are returned immediately.
///
/// ```rust
/// use path_template::{parse, Template};
///
/// let templates = [
///     Template::new("model", "/jobs/{job.code}/assets/model/{lod}").unwrap(),
///     Template::new("rig", "/jobs/{job.code}/assets/rig/{rig_type}").unwrap(),
/// ];
///
/// let (_, template) = parse("/jobs/monty/assets/rig/anim", &templates).unwrap();
/// assert_eq!(template.name(), "rig");
/// ```
pub fn parse<'a, I>(path: &str, templates: I) -> Result<(Data, &'a Template), Error>
where
    I: IntoIterator<Item = &'a Template>,
{
    for template in templates {
        match template.parse(path) {
            Ok(data) => return Ok((data, template)),
            Err(Error::Parse(err)) => {
                trace!(template = template.name(), path, error = %err, "template did not parse path");
            }
            Err(err) => return Err(err),
        }
    }

    Err(ParseError::NoTemplateMatched {
        path: path.to_string(),
    }
    .into())
}

/// Format `data` with the first template in `templates` that accepts it
pub fn format<'a, I>(data: &Data, templates: I) -> Result<(String, &'a Template), Error>
where
    I: IntoIterator<Item = &'a Template>,
{
    for template in templates {
        match template.format(data) {
            Ok(path) => return Ok((path, template)),
            Err(Error::Format(err)) => {
                trace!(template = template.name(), error = %err, "template did not format data");
            }
            Err(err) => return Err(err),
        }
    }

    Err(FormatError::NoTemplateFormatted { data: data.clone() }.into())
}

/// Find the template called `name`
pub fn get_template<'a, I>(name: &str, templates: I) -> Result<&'a Template, Error>
where
    I: IntoIterator<Item = &'a Template>,
{
    templates
        .into_iter()
        .find(|template| template.name() == name)
        .ok_or_else(|| Error::NotFound {
            name: name.to_string(),
        })
}
