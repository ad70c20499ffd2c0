//! In-memory document model: an arena of nodes with shadow roots, a lenient
//! markup parser, a serializer and simple selector queries.

pub mod document;
pub mod error;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod selector;
pub mod serializer;
pub mod visitor;

#[cfg(test)]
mod tests_parser;

pub use document::Document;
pub use error::{DomError, DomResult};
pub use node::{
    is_escapable_raw_text_element, is_raw_text_element, is_void_element, ElementData, Node,
    NodeId, NodeKind,
};
pub use parser::parse_fragment;
pub use selector::Selector;
pub use serializer::{serialize_children, serialize_node};
pub use visitor::{walk_children, walk_node, Visitor};
