//! fOS DOM - Document Object Model
//!
//! Arena-backed DOM tree. Nodes of every document live in one arena and
//! are addressed by `NodeId`, so higher layers (accessibility, layout)
//! can hold plain copyable handles instead of pointers.

mod node;
mod tree;
mod document;

pub use node::{Node, NodeData};
pub use tree::{DomTree, Children};
pub use document::Document;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Sentinel for "no node" in intrusive links
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Build an id from its raw arena index
    pub const fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    /// Raw arena index
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn some(self) -> Option<NodeId> {
        if self.is_valid() { Some(self) } else { None }
    }
}

/// Document identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub(crate) u32);

impl DocumentId {
    pub const fn from_raw(raw: u32) -> Self {
        DocumentId(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// DOM error
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DomError {
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("Unknown document {0:?}")]
    UnknownDocument(DocumentId),

    #[error("Node {child:?} cannot be inserted under {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("Node {0:?} belongs to another document")]
    WrongDocument(NodeId),
}
