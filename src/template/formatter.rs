//! Substitutes data into expanded patterns

use std::collections::BTreeSet;

use crate::data::{Data, Value};
use crate::error::FormatError;
use crate::pattern::ast::PlaceholderName;

use super::resolver::Piece;

#[derive(Debug, Clone, PartialEq)]
enum Fragment {
    Literal(String),
    Placeholder(PlaceholderName),
}

/// Ordered literal and placeholder fragments of a template
#[derive(Debug, Clone)]
pub(crate) struct Formatter {
    fragments: Vec<Fragment>,
}

impl Formatter {
    /// Build fragments from expanded pieces, dropping sub-expressions
    pub fn compile(pieces: &[Piece]) -> Self {
        let fragments = pieces
            .iter()
            .map(|piece| match piece {
                Piece::Literal(text) => Fragment::Literal(text.clone()),
                Piece::Placeholder { name, .. } => Fragment::Placeholder(name.clone()),
            })
            .collect();
        Self { fragments }
    }

    pub fn format(&self, data: &Data) -> Result<String, FormatError> {
        let mut path = String::new();
        for fragment in &self.fragments {
            match fragment {
                Fragment::Literal(text) => path.push_str(text),
                Fragment::Placeholder(name) => path.push_str(lookup(data, name)?),
            }
        }
        Ok(path)
    }

    /// Unique placeholder names
    pub fn keys(&self) -> BTreeSet<String> {
        self.fragments
            .iter()
            .filter_map(|fragment| match fragment {
                Fragment::Placeholder(name) => Some(name.to_string()),
                Fragment::Literal(_) => None,
            })
            .collect()
    }
}

/// Follow the dotted `name` through nested mappings
fn lookup<'d>(data: &'d Data, name: &PlaceholderName) -> Result<&'d str, FormatError> {
    let (parents, leaf) = name.split_leaf();

    let mut current = data;
    for key in parents {
        current = match current.get(key) {
            Some(Value::Map(map)) => map,
            Some(Value::String(_)) => {
                return Err(FormatError::NotAMapping {
                    placeholder: name.to_string(),
                    key: key.to_string(),
                    data: data.clone(),
                })
            }
            None => return Err(missing(name, data)),
        };
    }

    match current.get(leaf) {
        Some(Value::String(value)) => Ok(value.as_str()),
        Some(Value::Map(_)) => Err(FormatError::NotAString {
            placeholder: name.to_string(),
            data: data.clone(),
        }),
        None => Err(missing(name, data)),
    }
}

fn missing(name: &PlaceholderName, data: &Data) -> FormatError {
    FormatError::MissingKey {
        placeholder: name.to_string(),
        data: data.clone(),
    }
}
