use crate::component::{Component, RenderFn};
use crate::error::{RuntimeError, RuntimeResult};
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;
use trellis_common::split_pascal_case;

pub type ComponentFactory = Rc<dyn Fn() -> Rc<dyn Component>>;

/// A registered component type, resolved once at registration
pub struct Definition {
    pub tag: String,
    pub type_name: String,
    pub factory: ComponentFactory,
    pub render: Option<RenderFn>,
    pub events: Vec<String>,
    pub shadow: bool,
    pub stylesheet: Option<fn() -> String>,
}

impl Definition {
    /// Build a definition, reading type level answers from a prototype instance
    pub fn new(tag: String, type_name: String, factory: ComponentFactory) -> Self {
        let prototype = factory();
        Self {
            tag,
            type_name,
            render: prototype.render(),
            events: prototype.events().iter().map(|e| e.to_string()).collect(),
            shadow: prototype.shadow(),
            stylesheet: prototype.stylesheet(),
            factory,
        }
    }

    pub fn instantiate(&self) -> Rc<dyn Component> {
        (self.factory)()
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("tag", &self.tag)
            .field("type_name", &self.type_name)
            .field("render", &self.render)
            .field("events", &self.events)
            .field("shadow", &self.shadow)
            .finish()
    }
}

/// Last path segment of a type name, without generic arguments
pub fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Derive a custom element name from a PascalCase type name (`NycoNav` → `nyco-nav`)
pub fn derive_tag_name(type_name: &str) -> RuntimeResult<String> {
    let name = short_type_name(type_name);
    if name.len() <= 1 {
        return Err(RuntimeError::InvalidTagName(type_name.to_string()));
    }

    let tag = split_pascal_case(name).join("-").to_lowercase();
    validate_tag_name(&tag).map_err(|_| RuntimeError::InvalidTagName(type_name.to_string()))
}

/// Custom element names start with a lowercase letter and contain a hyphen
pub fn validate_tag_name(tag: &str) -> RuntimeResult<String> {
    let valid = tag.starts_with(|c: char| c.is_ascii_lowercase())
        && tag.contains('-')
        && tag
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_'));

    if valid {
        Ok(tag.to_string())
    } else {
        Err(RuntimeError::InvalidTagName(tag.to_string()))
    }
}

/// Tag name to definition
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    definitions: IndexMap<String, Rc<Definition>>,
}

impl ComponentRegistry {
    /// Add a definition. A taken tag is an error and keeps the first registration.
    pub fn insert(&mut self, definition: Definition) -> RuntimeResult<Rc<Definition>> {
        if self.definitions.contains_key(&definition.tag) {
            return Err(RuntimeError::DuplicateTag {
                type_name: definition.type_name,
                tag: definition.tag,
            });
        }

        let definition = Rc::new(definition);
        self.definitions
            .insert(definition.tag.clone(), definition.clone());
        Ok(definition)
    }

    pub fn get(&self, tag: &str) -> Option<Rc<Definition>> {
        self.definitions.get(tag).cloned()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.definitions.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
