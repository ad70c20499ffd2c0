use crate::stash::Stash;
use crate::value::{Props, Value};
use tracing::warn;
use trellis_common::to_camel_case;

/// Reconstruct a typed value from a serialized attribute.
///
/// Checks run in a fixed order: value token, number, null, boolean, node
/// token. Anything else stays a string, including JSON, which components
/// parse themselves.
pub fn decode_attribute(raw: &str, stash: &Stash) -> Value {
    if let Some(value) = stash.value(raw) {
        return value.clone();
    }

    if let Some(number) = raw.strip_suffix("__float") {
        if let Ok(n) = number.parse::<f64>() {
            return Value::Number(n);
        }
    }

    match raw {
        "null__null" => return Value::Null,
        "true__boolean" => return Value::Bool(true),
        "false__boolean" => return Value::Bool(false),
        _ => {}
    }

    if let Some(nodes) = stash.nodes(raw) {
        return nodes.first().copied().map(Value::Node).unwrap_or(Value::Null);
    }

    if looks_like_token(raw) {
        warn!(token = raw, "Attribute holds a token with no stash entry");
    }

    Value::String(raw.to_string())
}

/// Decode every attribute, converting kebab-case names to camelCase
pub fn decode_attributes(attributes: &[(String, String)], stash: &Stash) -> Props {
    attributes
        .iter()
        .map(|(name, raw)| (to_camel_case(name), decode_attribute(raw, stash)))
        .collect()
}

fn looks_like_token(raw: &str) -> bool {
    (raw.starts_with("placehold:") || raw.starts_with("__")) && raw.ends_with("__") && raw.len() > 4
}
