//! Small helpers shared by the document model and the component runtime.

pub mod case;
pub mod escape;
pub mod id_generator;

pub use case::{split_pascal_case, to_camel_case, to_kebab_case};
pub use escape::{decode_entities, escape_attribute, escape_html, escape_text};
pub use id_generator::IDGenerator;
