//! Error types for the component runtime

use std::sync::Arc;
use thiserror::Error;
use trellis_dom::{DomError, NodeId};

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    #[error("Cannot register {type_name} as <{tag}>: tag is already registered")]
    DuplicateTag { type_name: String, tag: String },

    #[error("Cannot derive a custom element name from '{0}'")]
    InvalidTagName(String),

    #[error("Component {markup} has no id")]
    MissingIdentity { markup: String },

    #[error("Render failed: {0}")]
    Render(Arc<anyhow::Error>),

    #[error("Node {0:?} is not a component host")]
    NotAComponent(NodeId),

    #[error("Document error: {0}")]
    Dom(#[from] DomError),
}

impl RuntimeError {
    pub fn render(err: anyhow::Error) -> Self {
        RuntimeError::Render(Arc::new(err))
    }

    pub fn is_render(&self) -> bool {
        matches!(self, RuntimeError::Render(_))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("idPrefix must be a non-empty run of ASCII letters, got '{0}'")]
    InvalidPrefix(String),
}
