//! Document - per-document state kept next to the node arena

use crate::NodeId;

/// HTML Document
#[derive(Debug, Clone)]
pub struct Document {
    /// Document node (root of the tree)
    root: NodeId,
    /// Whether an input event is being handled for this document right now
    handling_user_input: bool,
}

impl Document {
    pub(crate) fn new(root: NodeId) -> Self {
        Self {
            root,
            handling_user_input: false,
        }
    }

    /// Get document node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Check if the document is inside a user input handler
    pub fn is_handling_user_input(&self) -> bool {
        self.handling_user_input
    }

    /// Enter or leave a user input handler
    pub fn set_handling_user_input(&mut self, handling: bool) {
        self.handling_user_input = handling;
    }
}
