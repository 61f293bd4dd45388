//! DOM Node - Compact representation
//!
//! Links to relatives are stored as `NodeId`s with `NodeId::NONE` as the
//! empty value, which keeps the node free of pointers and `Option` padding.

use crate::{DocumentId, NodeId};

/// DOM Node - Core structure
#[derive(Debug, Clone)]
pub struct Node {
    /// Owner document
    pub document: DocumentId,
    /// Parent node (NONE if root or detached)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    fn with_data(document: DocumentId, data: NodeData) -> Self {
        Self {
            document,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(document: DocumentId, tag: &str) -> Self {
        Self::with_data(document, NodeData::Element { tag: tag.to_string() })
    }

    /// Create a new text node
    pub fn text(document: DocumentId, content: &str) -> Self {
        Self::with_data(document, NodeData::Text(content.to_string()))
    }

    /// Create a document node
    pub fn document(document: DocumentId) -> Self {
        Self::with_data(document, NodeData::Document)
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element { .. })
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    #[inline]
    pub fn is_document(&self) -> bool {
        matches!(self.data, NodeData::Document)
    }

    /// Tag name if this is an element
    pub fn tag(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element { tag } => Some(tag),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Parent as an option
    pub fn parent(&self) -> Option<NodeId> {
        self.parent.some()
    }
}

/// Node-specific data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element { tag: String },
    /// Text content
    Text(String),
}
