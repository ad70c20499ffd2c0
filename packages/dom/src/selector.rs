use crate::error::{DomError, DomResult};
use crate::node::ElementData;
use std::str::FromStr;

/// A list of compound selectors separated by commas.
///
/// Each compound may combine a tag (or `*`), `#id`, `.class` and attribute
/// conditions. Combinators are not supported.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Compound {
    tag: Option<String>,
    conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Id(String),
    Class(String),
    Has(String),
    Equals(String, String),
    Contains(String, String),
}

impl Selector {
    pub fn parse(source: &str) -> DomResult<Self> {
        let mut alternatives = Vec::new();
        let mut offset = 0;
        for part in source.split(',') {
            alternatives.push(parse_compound(part, offset)?);
            offset += part.len() + 1;
        }
        Ok(Self { alternatives })
    }

    pub fn matches(&self, element: &ElementData) -> bool {
        self.alternatives.iter().any(|c| c.matches(element))
    }
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl Compound {
    fn matches(&self, element: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if *tag != element.tag {
                return false;
            }
        }
        self.conditions.iter().all(|condition| match condition {
            Condition::Id(id) => element.id() == Some(id.as_str()),
            Condition::Class(class) => element.class_list().any(|c| c == class),
            Condition::Has(name) => element.has_attribute(name),
            Condition::Equals(name, value) => element.get_attribute(name) == Some(value.as_str()),
            Condition::Contains(name, value) => element
                .get_attribute(name)
                .map(|v| v.contains(value.as_str()))
                .unwrap_or(false),
        })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn parse_compound(source: &str, offset: usize) -> DomResult<Compound> {
    let leading = source.len() - source.trim_start().len();
    let trimmed = source.trim();
    let base = offset + leading;

    if trimmed.is_empty() {
        return Err(DomError::invalid_selector(offset, "empty selector"));
    }

    let mut compound = Compound::default();
    let mut pos = 0;

    let tag_end = trimmed
        .find(|c: char| !(is_ident_char(c) || c == '*'))
        .unwrap_or(trimmed.len());
    if tag_end > 0 {
        let tag = &trimmed[..tag_end];
        if tag != "*" {
            if tag.contains('*') {
                return Err(DomError::invalid_selector(base, "unexpected '*'"));
            }
            compound.tag = Some(tag.to_ascii_lowercase());
        }
        pos = tag_end;
    }

    while pos < trimmed.len() {
        let rest = &trimmed[pos..];
        let Some(first) = rest.chars().next() else {
            break;
        };

        match first {
            '#' | '.' => {
                let name_len = rest[1..]
                    .find(|c: char| !is_ident_char(c))
                    .unwrap_or(rest.len() - 1);
                if name_len == 0 {
                    return Err(DomError::invalid_selector(base + pos, "expected a name"));
                }
                let name = rest[1..1 + name_len].to_string();
                compound.conditions.push(if first == '#' {
                    Condition::Id(name)
                } else {
                    Condition::Class(name)
                });
                pos += 1 + name_len;
            }
            '[' => {
                let Some(close) = rest.find(']') else {
                    return Err(DomError::invalid_selector(base + pos, "unclosed '['"));
                };
                compound.conditions.push(parse_attribute(&rest[1..close], base + pos)?);
                pos += close + 1;
            }
            c if c.is_whitespace() || c == '>' || c == '+' || c == '~' => {
                return Err(DomError::invalid_selector(
                    base + pos,
                    "combinators are not supported",
                ));
            }
            other => {
                return Err(DomError::invalid_selector(
                    base + pos,
                    format!("unexpected '{}'", other),
                ));
            }
        }
    }

    Ok(compound)
}

fn parse_attribute(body: &str, pos: usize) -> DomResult<Condition> {
    let unquote = |value: &str| {
        let value = value.trim();
        value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(value)
            .to_string()
    };

    let (name, value, contains) = match body.split_once("*=") {
        Some((name, value)) => (name, Some(value), true),
        None => match body.split_once('=') {
            Some((name, value)) => (name, Some(value), false),
            None => (body, None, false),
        },
    };

    let name = name.trim().to_ascii_lowercase();
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return Err(DomError::invalid_selector(pos, "invalid attribute name"));
    }

    Ok(match value {
        None => Condition::Has(name),
        Some(value) if contains => Condition::Contains(name, unquote(value)),
        Some(value) => Condition::Equals(name, unquote(value)),
    })
}
