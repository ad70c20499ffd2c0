use crate::stash::Stash;
use crate::value::{format_number, Props, Value};
use regex::{Captures, Regex};
use std::fmt;
use std::sync::OnceLock;
use tracing::error;
use trellis_common::{escape_html, to_kebab_case, IDGenerator};

/// Markup produced by a template call.
///
/// Interpolating a `TemplateResult` into another template inserts its text as
/// is; it is never escaped a second time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemplateResult {
    text: String,
    trusted: bool,
}

impl TemplateResult {
    pub(crate) fn new(text: String) -> Self {
        Self {
            text,
            trusted: false,
        }
    }

    /// Wrap markup that bypasses escaping entirely. The caller vouches for it.
    pub fn unsafe_raw(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            trusted: true,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for TemplateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// `...<value token>` spread marker inside markup
fn spread_pattern() -> &'static Regex {
    static SPREAD: OnceLock<Regex> = OnceLock::new();
    SPREAD.get_or_init(|| Regex::new(r"\.\.\.\s?(__[\w-]+?__[A-Za-z]+\d+__)").unwrap())
}

/// Turns template fragments and interpolated values into a [`TemplateResult`].
///
/// Values that cannot be written into markup are stashed under tokens owned by
/// `identity`; the decoder and the commit step resolve them later.
pub struct Encoder<'a> {
    stash: &'a mut Stash,
    ids: &'a mut IDGenerator,
    identity: &'a str,
}

impl<'a> Encoder<'a> {
    pub fn new(stash: &'a mut Stash, ids: &'a mut IDGenerator, identity: &'a str) -> Self {
        Self {
            stash,
            ids,
            identity,
        }
    }

    /// Interleave `strings` with encoded `values`, then expand spread markers.
    pub fn encode(&mut self, strings: &[&str], values: Vec<Value>) -> TemplateResult {
        let mut out = String::new();
        let mut values = values.into_iter();

        for fragment in strings {
            out.push_str(fragment);
            if let Some(value) = values.next() {
                let encoded = self.encode_value(value);
                out.push_str(&encoded);
            }
        }
        for value in values {
            let encoded = self.encode_value(value);
            out.push_str(&encoded);
        }

        TemplateResult::new(self.expand_spreads(out))
    }

    fn encode_value(&mut self, value: Value) -> String {
        match value {
            // A child collection keeps its marker even when empty
            Value::Nodes(list) if list.is_empty() && !list.children => String::new(),
            Value::Nodes(list) => self.stash.stash_nodes(self.ids, self.identity, list.nodes),
            Value::Node(node) => self.stash.stash_nodes(self.ids, self.identity, vec![node]),
            Value::Template(template) => template.into_text(),
            Value::Array(items) if is_markup_list(&items) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n"),
            Value::Attributes(attrs) => {
                let normalized: Props = attrs
                    .into_iter()
                    .map(|(name, value)| (name, Value::String(value)))
                    .collect();
                self.stash
                    .stash_value(self.ids, self.identity, Value::Object(normalized))
            }
            value @ (Value::Array(_) | Value::Object(_) | Value::Callback(_)) => {
                self.stash.stash_value(self.ids, self.identity, value)
            }
            Value::Number(n) => format!("{}__float", format_number(n)),
            Value::Bool(b) => format!("{}__boolean", b),
            Value::Null => "null__null".to_string(),
            Value::String(s) => escape_html(&s),
        }
    }

    fn expand_spreads(&self, text: String) -> String {
        if !text.contains("...") {
            return text;
        }

        spread_pattern()
            .replace_all(&text, |caps: &Captures| {
                let token = &caps[1];
                match self.stash.value(token) {
                    Some(value) => render_spread(value),
                    None => {
                        error!(token, "Spread marker references a missing stash entry");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }
}

/// A list made only of engine-built templates joins into one fragment
fn is_markup_list(items: &[Value]) -> bool {
    items
        .iter()
        .all(|item| matches!(item, Value::Template(t) if !t.is_trusted()))
}

fn render_spread(value: &Value) -> String {
    let entries: Vec<(String, &Value)> = match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|(key, value)| {
            let key = to_kebab_case(&key);
            match value {
                Value::Bool(true) => Some(key),
                value if value.is_truthy() => {
                    Some(format!("{}=\"{}\"", key, escape_html(&value.to_string())))
                }
                _ => None,
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tagged-template call.
///
/// `html!(scope; "<p class=" {class} ">" {label} "</p>")` alternates string
/// literals with `{expr}` values; each value goes through `Value::from`.
#[macro_export]
macro_rules! html {
    ($scope:expr; $($lit:literal $({ $val:expr })?)*) => {
        $scope.html(
            &[$($lit),*],
            vec![$($($crate::Value::from($val),)?)*],
        )
    };
}
