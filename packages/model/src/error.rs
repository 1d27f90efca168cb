use crate::kind::NodeKind;
use crate::tree::NodeId;
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Expected {expected} at {id}, found {found}")]
    WrongKind {
        id: NodeId,
        expected: NodeKind,
        found: NodeKind,
    },

    #[error("{child} cannot be placed inside {parent}")]
    Containment { parent: NodeKind, child: NodeKind },

    #[error("Node {0} is already attached to a parent")]
    AlreadyAttached(NodeId),

    #[error("Attaching {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("Unknown attribute '{key}' for {kind}")]
    UnknownAttribute { kind: NodeKind, key: String },

    #[error("Invalid value '{value}' for attribute '{key}'")]
    InvalidAttribute { key: String, value: String },

    #[error("Text of a {0} may not contain a line break")]
    LineBreakInText(NodeKind),

    #[error("The document root cannot be detached or removed")]
    RootRemoval,
}

impl ModelError {
    pub fn wrong_kind(id: NodeId, expected: NodeKind, found: NodeKind) -> Self {
        Self::WrongKind {
            id,
            expected,
            found,
        }
    }

    pub fn unknown_attribute(kind: NodeKind, key: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            kind,
            key: key.into(),
        }
    }

    pub fn invalid_attribute(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            key: key.into(),
            value: value.into(),
        }
    }
}
