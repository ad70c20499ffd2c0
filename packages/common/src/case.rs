//! Identifier case conversion between attribute names, property names and type names.

/// Convert a kebab-case attribute name to a camelCase property name.
///
/// Every `-x` pair becomes `X`; a trailing hyphen is kept.
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();

    while let Some(c) = chars.next() {
        if c != '-' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next) => out.extend(next.to_uppercase()),
            None => out.push('-'),
        }
    }

    out
}

/// Convert a camelCase property name to a lowercase kebab-case attribute name.
pub fn to_kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;

    for c in name.chars() {
        if prev_lower && c.is_ascii_uppercase() {
            out.push('-');
            // The uppercase char just consumed a boundary
            prev_lower = false;
        } else {
            prev_lower = c.is_ascii_lowercase();
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// Split a PascalCase type name into its segments (`NycoNav` → `["Nyco", "Nav"]`).
///
/// A segment is an uppercase ASCII letter followed by lowercase letters or digits.
/// Characters outside any segment are dropped.
pub fn split_pascal_case(name: &str) -> Vec<&str> {
    let bytes = name.as_bytes();
    let mut segments = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if !bytes[i].is_ascii_uppercase() {
            i += 1;
            continue;
        }
        let start = i;
        i += 1;
        while i < bytes.len() && (bytes[i].is_ascii_lowercase() || bytes[i].is_ascii_digit()) {
            i += 1;
        }
        segments.push(&name[start..i]);
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case() {
        assert_eq!(to_camel_case("data-foo-bar"), "dataFooBar");
        assert_eq!(to_camel_case("classes"), "classes");
        assert_eq!(to_camel_case("trailing-"), "trailing-");
    }

    #[test]
    fn test_kebab_case() {
        assert_eq!(to_kebab_case("ariaLabel"), "aria-label");
        assert_eq!(to_kebab_case("dataToggleTabindex"), "data-toggle-tabindex");
        assert_eq!(to_kebab_case("aBC"), "a-bc");
        assert_eq!(to_kebab_case("plain"), "plain");
    }

    #[test]
    fn test_split_pascal_case() {
        assert_eq!(split_pascal_case("NycoNav"), vec!["Nyco", "Nav"]);
        assert_eq!(split_pascal_case("Widget2Panel"), vec!["Widget2", "Panel"]);
        assert_eq!(split_pascal_case("HTMLView"), vec!["H", "T", "M", "L", "View"]);
        assert!(split_pascal_case("lowercase").is_empty());
    }
}
