//! Component runtime for custom elements: templates with typed interpolation,
//! a render pipeline with coalesced updates, and state kept across re-attach.

pub mod component;
pub mod config;
pub mod decoder;
pub mod error;
pub mod events;
pub mod instance;
mod lifecycle;
mod pipeline;
pub mod registry;
pub mod runtime;
pub mod scope;
pub mod stash;
pub mod styles;
pub mod template;
pub mod value;

#[cfg(test)]
mod tests_runtime;

pub use component::{frames, Component, Content, RenderFn, RenderResult, RenderSource, StyleGroups};
pub use config::{RuntimeConfig, DEFAULT_CONFIG_NAME};
pub use decoder::{decode_attribute, decode_attributes};
pub use error::{ConfigError, RuntimeError, RuntimeResult};
pub use events::{Event, ListenerId};
pub use instance::RenderHandle;
pub use registry::{derive_tag_name, validate_tag_name};
pub use runtime::Runtime;
pub use scope::Scope;
pub use stash::{StateStore, Stash};
pub use template::{Encoder, TemplateResult};
pub use value::{Callback, NodeList, Props, Value};

pub use trellis_dom::NodeId;
