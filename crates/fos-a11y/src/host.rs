//! Host Integration
//!
//! The event queue does not own the accessible tree. Everything it needs to
//! know about nodes, accessibles, text and editors is asked through
//! [`AccessibleTree`], implemented by the document layer.

use fos_dom::{DocumentId, NodeId};

/// Accessible object identifier (index into the host's accessible arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessibleId(pub u32);

/// Editor identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditorId(pub u32);

/// Accessible role, reduced to what event processing looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccRole {
    Application,
    Document,
    Paragraph,
    Section,
    TextLeaf,
    /// Line break or other whitespace-only accessible
    Whitespace,
    List,
    ListItem,
    Outline,
    OutlineItem,
    Table,
    Row,
    Cell,
    PushButton,
    Entry,
    #[default]
    Other,
}

bitflags::bitflags! {
    /// Accessible states
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct States: u32 {
        const UNAVAILABLE = 1 << 0;
        const SELECTED = 1 << 1;
        const FOCUSED = 1 << 2;
        const PRESSED = 1 << 3;
        const CHECKED = 1 << 4;
        const MIXED = 1 << 5;
        const READONLY = 1 << 6;
        const EXPANDED = 1 << 9;
        const COLLAPSED = 1 << 10;
        const BUSY = 1 << 11;
        const INVISIBLE = 1 << 15;
        const OFFSCREEN = 1 << 16;
        const FOCUSABLE = 1 << 20;
        const SELECTABLE = 1 << 21;
        const LINKED = 1 << 22;
        const REQUIRED = 1 << 26;
        const INVALID = 1 << 28;
    }
}

bitflags::bitflags! {
    /// Extended accessible states
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ExtraStates: u32 {
        const SUPPORTS_AUTOCOMPLETION = 1 << 0;
        const DEFUNCT = 1 << 1;
        const SELECTABLE_TEXT = 1 << 2;
        const EDITABLE = 1 << 3;
        const ACTIVE = 1 << 4;
        const MODAL = 1 << 5;
        const MULTI_LINE = 1 << 6;
        const HORIZONTAL = 1 << 7;
        const SINGLE_LINE = 1 << 9;
        const VERTICAL = 1 << 12;
        const ENABLED = 1 << 15;
        const SENSITIVE = 1 << 16;
    }
}

/// Tree and document queries the event machinery depends on
pub trait AccessibleTree {
    // Nodes

    fn owner_document(&self, node: NodeId) -> Option<DocumentId>;

    fn parent_node(&self, node: NodeId) -> Option<NodeId>;

    /// Whether the node is still attached to its document
    fn is_in_document(&self, node: NodeId) -> bool;

    /// Strict ancestor test
    fn is_ancestor_of(&self, possible_ancestor: NodeId, node: NodeId) -> bool;

    /// Whether the document is inside a user input handler.
    /// `None` when the document has no input state to ask.
    fn is_handling_user_input(&self, document: DocumentId) -> Option<bool>;

    // Accessibles

    /// Accessible of a node, if one is materialized
    fn accessible_for(&self, node: NodeId) -> Option<AccessibleId>;

    fn node_for(&self, accessible: AccessibleId) -> Option<NodeId>;

    /// The node-less accessible standing for the whole application
    fn application_accessible(&self) -> Option<AccessibleId> {
        None
    }

    fn cached_parent(&self, accessible: AccessibleId) -> Option<AccessibleId>;

    fn cached_next_sibling(&self, accessible: AccessibleId) -> Option<AccessibleId>;

    fn cached_prev_sibling(&self, accessible: AccessibleId) -> Option<AccessibleId>;

    fn index_in_parent(&self, accessible: AccessibleId) -> Option<usize>;

    /// Whether any accessible is materialized below the node
    fn has_accessible_children(&self, node: NodeId) -> bool;

    fn is_defunct(&self, _accessible: AccessibleId) -> bool {
        false
    }

    fn role(&self, accessible: AccessibleId) -> AccRole;

    fn states(&self, accessible: AccessibleId) -> (States, ExtraStates);

    // Text

    /// Nearest text container accessible holding the node
    fn container_text_accessible(&self, node: NodeId) -> Option<AccessibleId>;

    /// Offset of `child` inside the text of `container`
    fn child_offset(&self, container: AccessibleId, child: AccessibleId) -> Option<i32>;

    /// Append the text the accessible's subtree represents
    fn append_text_to(&self, accessible: AccessibleId, out: &mut String);

    fn associated_editor(&self, _text_accessible: AccessibleId) -> Option<EditorId> {
        None
    }

    fn is_editor_empty(&self, _editor: EditorId) -> bool {
        false
    }

    // Tree widgets

    /// Current index if the node is a tree container addressing its rows
    /// indirectly; `None` for every other node.
    fn tree_current_index(&self, _node: NodeId) -> Option<i32> {
        None
    }

    /// Row accessible already materialized at `index` of a tree container
    fn tree_item_accessible(&self, _tree: AccessibleId, _index: i32) -> Option<AccessibleId> {
        None
    }
}
