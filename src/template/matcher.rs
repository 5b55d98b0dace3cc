//! Compiles expanded patterns into regular expressions and parses paths with them

use std::collections::{BTreeMap, HashMap};

use regex::Regex;

use crate::config::{Anchor, DuplicatePlaceholderMode, TemplateOptions};
use crate::data::{insert_nested, Data};
use crate::error::{ParseError, PatternError};
use crate::pattern::ast::PlaceholderName;

use super::resolver::Piece;

/// Stands in for `.` inside capture group names
pub(crate) const PERIOD_CODE: &str = "_LPD_";
/// Separates a placeholder name from its occurrence counter in group names
pub(crate) const OCCURRENCE_CODE: &str = "_LPC_";

/// One capture group per placeholder occurrence
#[derive(Debug, Clone)]
struct Slot {
    group: String,
    name: PlaceholderName,
}

/// Compiled regular expression for a template
#[derive(Debug, Clone)]
pub(crate) struct Matcher {
    regex: Regex,
    /// Capture slots in pattern order
    slots: Vec<Slot>,
    duplicate_mode: DuplicatePlaceholderMode,
}

impl Matcher {
    pub fn compile(pieces: &[Piece], options: &TemplateOptions) -> Result<Self, PatternError> {
        let mut expression = String::new();
        let mut occurrences: HashMap<&PlaceholderName, usize> = HashMap::new();
        let mut slots = Vec::new();

        for piece in pieces {
            match piece {
                Piece::Literal(text) => expression.push_str(&regex::escape(text)),
                Piece::Placeholder {
                    name,
                    expression: sub_expression,
                } => {
                    // Regex group names must be unique, so each occurrence gets its own
                    let count = occurrences.entry(name).or_insert(0);
                    *count += 1;
                    let group = group_name(name, *count);

                    let sub_expression = sub_expression
                        .as_deref()
                        .unwrap_or(&options.default_expression);
                    expression.push_str(&format!("(?P<{}>{})", group, sub_expression));

                    slots.push(Slot {
                        group,
                        name: name.clone(),
                    });
                }
            }
        }

        let expression = match options.anchor {
            Anchor::Start => format!("^{}", expression),
            Anchor::End => format!("{}$", expression),
            Anchor::Both => format!("^{}$", expression),
            Anchor::None => expression,
        };

        let regex = Regex::new(&expression).map_err(|err| PatternError::InvalidPattern {
            message: err.to_string(),
        })?;

        Ok(Self {
            regex,
            slots,
            duplicate_mode: options.duplicate_mode,
        })
    }

    /// The compiled regular expression source
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Extract data from `path`
    pub fn parse(&self, template: &str, path: &str) -> Result<Data, ParseError> {
        let captures = self
            .regex
            .captures(path)
            .ok_or_else(|| ParseError::NoMatch {
                template: template.to_string(),
                path: path.to_string(),
            })?;

        let mut values: BTreeMap<&PlaceholderName, &str> = BTreeMap::new();
        for slot in &self.slots {
            let Some(value) = captures.name(&slot.group).map(|m| m.as_str()) else {
                continue;
            };

            let seen = values.get(&slot.name).copied();
            match (self.duplicate_mode, seen) {
                (DuplicatePlaceholderMode::Strict, Some(first)) if first != value => {
                    return Err(ParseError::DuplicateMismatch {
                        placeholder: slot.name.to_string(),
                        first: first.to_string(),
                        second: value.to_string(),
                    });
                }
                (DuplicatePlaceholderMode::Strict, Some(_)) => {}
                _ => {
                    values.insert(&slot.name, value);
                }
            }
        }

        let mut data = Data::new();
        for (name, value) in values {
            let (parents, leaf) = name.split_leaf();
            insert_nested(&mut data, parents, leaf, value);
        }
        Ok(data)
    }
}

fn group_name(name: &PlaceholderName, occurrence: usize) -> String {
    format!(
        "{}{}{}",
        name.as_str().replace('.', PERIOD_CODE),
        OCCURRENCE_CODE,
        occurrence
    )
}

/// Check that `expression` compiles on its own
pub(crate) fn validate_expression(name: &str, expression: &str) -> Result<(), PatternError> {
    Regex::new(expression)
        .map(|_| ())
        .map_err(|err| PatternError::InvalidExpression {
            name: name.to_string(),
            expression: expression.to_string(),
            message: err.to_string(),
        })
}

/// Reject patterns that use a name both as a value and as a mapping
pub(crate) fn check_key_conflicts(pieces: &[Piece]) -> Result<(), PatternError> {
    let names: Vec<&PlaceholderName> = pieces
        .iter()
        .filter_map(|piece| match piece {
            Piece::Placeholder { name, .. } => Some(name),
            Piece::Literal(_) => None,
        })
        .collect();

    for name in &names {
        if names.iter().any(|other| name.is_parent_of(other)) {
            return Err(PatternError::KeyConflict {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{data, Value};
    use pretty_assertions::assert_eq;

    fn literal(text: &str) -> Piece {
        Piece::Literal(text.to_string())
    }

    fn placeholder(name: &str, expression: Option<&str>) -> Piece {
        Piece::Placeholder {
            name: PlaceholderName::new(name).unwrap(),
            expression: expression.map(str::to_string),
        }
    }

    fn compile(pieces: &[Piece], options: TemplateOptions) -> Matcher {
        Matcher::compile(pieces, &options).expect("Should compile")
    }

    #[test]
    fn test_compiled_expression() {
        let matcher = compile(
            &[
                literal("/a.b/"),
                placeholder("x.y", None),
                literal("/"),
                placeholder("x.y", Some(r"\d+")),
            ],
            TemplateOptions::new().with_anchor(Anchor::Both),
        );
        assert_eq!(
            matcher.as_str(),
            r"^/a\.b/(?P<x_LPD_y_LPC_1>[\w_.\-]+)/(?P<x_LPD_y_LPC_2>\d+)$"
        );
    }

    #[test]
    fn test_relaxed_duplicates_last_wins() {
        let matcher = compile(
            &[
                literal("/"),
                placeholder("variable", None),
                literal("/"),
                placeholder("variable", None),
            ],
            TemplateOptions::default(),
        );
        assert_eq!(
            matcher.parse("t", "/first/second").unwrap(),
            data([("variable", "second")])
        );
    }

    #[test]
    fn test_strict_duplicates() {
        let matcher = compile(
            &[
                literal("/"),
                placeholder("variable", None),
                literal("/"),
                placeholder("variable", None),
            ],
            TemplateOptions::new().with_duplicate_mode(DuplicatePlaceholderMode::Strict),
        );
        assert_eq!(
            matcher.parse("t", "/value/value").unwrap(),
            data([("variable", "value")])
        );
        let err = matcher.parse("t", "/a/b").unwrap_err();
        assert!(matches!(
            err,
            ParseError::DuplicateMismatch { ref first, ref second, .. } if first == "a" && second == "b"
        ));
    }

    #[test]
    fn test_nested_output() {
        let matcher = compile(
            &[
                literal("/"),
                placeholder("a.b.c", None),
                literal("/static/"),
                placeholder("a.b.d", None),
            ],
            TemplateOptions::default(),
        );
        assert_eq!(
            matcher.parse("t", "/first/static/second").unwrap(),
            data([(
                "a",
                Value::map([("b", Value::map([("c", "first"), ("d", "second")]))])
            )])
        );
    }

    #[test]
    fn test_no_match() {
        let matcher = compile(&[literal("/static/string")], TemplateOptions::default());
        assert!(matches!(
            matcher.parse("t", "/static/"),
            Err(ParseError::NoMatch { .. })
        ));
    }

    #[test]
    fn test_invalid_group_collision() {
        let result = Matcher::compile(
            &[placeholder("a", Some("(?P<b_LPC_1>x)")), placeholder("b", None)],
            &TemplateOptions::default(),
        );
        assert!(matches!(result, Err(PatternError::InvalidPattern { .. })));
    }

    #[test]
    fn test_validate_expression() {
        assert!(validate_expression("a", r"\d{4}").is_ok());
        assert!(matches!(
            validate_expression("a", "(?P<missing_closing_angle_bracket)"),
            Err(PatternError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_key_conflicts() {
        assert!(check_key_conflicts(&[placeholder("a.b", None), placeholder("a.c", None)]).is_ok());
        assert!(matches!(
            check_key_conflicts(&[placeholder("a", None), placeholder("a.b", None)]),
            Err(PatternError::KeyConflict { name }) if name == "a"
        ));
    }
}
