//! Minimal CSS selector matching.
//!
//! Supports comma-separated lists of compound selectors built from `*`, tag
//! names, `#id`, `.class`, `[attr]` and `[attr=value]`, each optionally prefixed
//! by `>` meaning "direct child of the context element". Descendant combinators
//! are not supported.

use super::{Dom, DomError, DomResult, ElementId};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Universal,
    Tag(String),
    Id(String),
    Class(String),
    Attr(String, Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound {
    child_of_context: bool,
    parts: Vec<Part>,
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

impl Selector {
    pub fn parse(input: &str) -> DomResult<Self> {
        let invalid = || DomError::InvalidSelector(input.to_string());
        let mut alternatives = Vec::new();
        for raw in input.split(',') {
            let mut s = raw.trim();
            let child_of_context = s.starts_with('>');
            if child_of_context {
                s = s[1..].trim_start();
            }
            if s.is_empty() || s.contains(char::is_whitespace) {
                return Err(invalid());
            }
            alternatives.push(Compound {
                child_of_context,
                parts: parse_compound(s).ok_or_else(invalid)?,
            });
        }
        Ok(Self { alternatives })
    }

    /// Check `element` against the selector. A leading `>` only matches when
    /// `context` is given and is the element's parent.
    pub fn matches(&self, dom: &dyn Dom, element: ElementId, context: Option<ElementId>) -> bool {
        self.alternatives.iter().any(|c| {
            if c.child_of_context && (context.is_none() || dom.parent(element) != context) {
                return false;
            }
            c.parts.iter().all(|p| part_matches(p, dom, element))
        })
    }
}

fn parse_compound(s: &str) -> Option<Vec<Part>> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(c) = rest.chars().next() {
        match c {
            '*' => {
                parts.push(Part::Universal);
                rest = &rest[1..];
            }
            '#' | '.' => {
                let (name, tail) = take_ident(&rest[1..]);
                if name.is_empty() {
                    return None;
                }
                parts.push(if c == '#' {
                    Part::Id(name.to_string())
                } else {
                    Part::Class(name.to_string())
                });
                rest = tail;
            }
            '[' => {
                let close = rest.find(']')?;
                let inner = &rest[1..close];
                let part = match inner.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                        Part::Attr(name.trim().to_string(), Some(value.to_string()))
                    }
                    None => Part::Attr(inner.trim().to_string(), None),
                };
                parts.push(part);
                rest = &rest[close + 1..];
            }
            _ => {
                let (name, tail) = take_ident(rest);
                if name.is_empty() {
                    return None;
                }
                parts.push(Part::Tag(name.to_ascii_lowercase()));
                rest = tail;
            }
        }
    }
    Some(parts)
}

fn take_ident(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(s.len());
    s.split_at(end)
}

fn part_matches(part: &Part, dom: &dyn Dom, element: ElementId) -> bool {
    match part {
        Part::Universal => true,
        Part::Tag(tag) => dom.tag_name(element).as_deref() == Some(tag.as_str()),
        Part::Id(id) => dom.attribute(element, "id").as_deref() == Some(id.as_str()),
        Part::Class(class) => dom.has_class(element, class),
        Part::Attr(name, None) => dom.attribute(element, name).is_some(),
        Part::Attr(name, Some(value)) => dom.attribute(element, name).as_deref() == Some(value.as_str()),
    }
}
