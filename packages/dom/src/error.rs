use crate::node::NodeId;
use thiserror::Error;

pub type DomResult<T> = Result<T, DomError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("Node {node:?} is not an element")]
    NotAnElement { node: NodeId },

    #[error("Node {node:?} cannot have children")]
    NotAContainer { node: NodeId },

    #[error("Node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("Inserting {child:?} into {parent:?} would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("Element {host:?} already has a shadow root")]
    ShadowRootExists { host: NodeId },

    #[error("Invalid selector at {pos}: {message}")]
    InvalidSelector { pos: usize, message: String },
}

impl DomError {
    pub fn invalid_selector(pos: usize, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            pos,
            message: message.into(),
        }
    }
}
