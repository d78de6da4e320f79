//! Mutation records collected while a document is observed

use super::NodeId;

/// A single observed change to the host tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    /// Children were inserted into or removed from `target`
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    /// An attribute of `target` was written or removed
    Attributes {
        target: NodeId,
        name: String,
        old_value: Option<String>,
    },
    /// Text, comment or CDATA data of `target` changed
    CharacterData { target: NodeId, old_value: String },
    /// An event handler slot of `target` was rebound
    Handler { target: NodeId, event: String },
}

impl MutationRecord {
    /// The node the record is about
    pub fn target(&self) -> NodeId {
        match self {
            Self::ChildList { target, .. }
            | Self::Attributes { target, .. }
            | Self::CharacterData { target, .. }
            | Self::Handler { target, .. } => *target,
        }
    }
}
