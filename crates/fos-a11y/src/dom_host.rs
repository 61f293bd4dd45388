//! DOM-backed Accessible Tree
//!
//! A small accessible layer over [`fos_dom::DomTree`]: accessibles are
//! created per node on request and live in an arena indexed by
//! `AccessibleId`. Used by headless embedders and by the tests.

use std::collections::HashMap;

use fos_dom::{DocumentId, DomError, DomTree, NodeId};

use crate::host::{AccRole, AccessibleId, AccessibleTree, EditorId, ExtraStates, States};

#[derive(Debug, Clone)]
struct AccessibleEntry {
    node: Option<NodeId>,
    role: AccRole,
    states: States,
    extra_states: ExtraStates,
    defunct: bool,
    editor: Option<EditorId>,
}

impl AccessibleEntry {
    fn new(node: Option<NodeId>, role: AccRole) -> Self {
        Self {
            node,
            role,
            states: States::empty(),
            extra_states: ExtraStates::empty(),
            defunct: false,
            editor: None,
        }
    }
}

/// Accessible tree over an arena DOM
#[derive(Debug)]
pub struct DomAccessibleTree {
    dom: DomTree,
    accessibles: Vec<AccessibleEntry>,
    by_node: HashMap<NodeId, AccessibleId>,
    bodies: HashMap<DocumentId, NodeId>,
    /// Empty flag per editor
    editors: Vec<bool>,
    tree_indices: HashMap<NodeId, i32>,
    application: AccessibleId,
}

impl Default for DomAccessibleTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomAccessibleTree {
    pub fn new() -> Self {
        Self {
            dom: DomTree::new(),
            accessibles: vec![AccessibleEntry::new(None, AccRole::Application)],
            by_node: HashMap::new(),
            bodies: HashMap::new(),
            editors: Vec::new(),
            tree_indices: HashMap::new(),
            application: AccessibleId(0),
        }
    }

    pub fn dom(&self) -> &DomTree {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut DomTree {
        &mut self.dom
    }

    /// Create a document with a `body` element, both accessible
    pub fn create_document(&mut self, url: &str) -> DocumentId {
        let doc = self.dom.create_document(url);
        let root = self.dom.root(doc).unwrap_or(NodeId::NONE);
        let body = self.dom.create_element(doc, "body");
        if self.dom.append_child(root, body).is_ok() {
            self.create_accessible(root, AccRole::Document);
            self.create_accessible(body, AccRole::Section);
            self.bodies.insert(doc, body);
        }
        doc
    }

    pub fn body(&self, document: DocumentId) -> Option<NodeId> {
        self.bodies.get(&document).copied()
    }

    /// Materialize an accessible for a node
    pub fn create_accessible(&mut self, node: NodeId, role: AccRole) -> AccessibleId {
        if let Some(&existing) = self.by_node.get(&node) {
            return existing;
        }
        let id = AccessibleId(self.accessibles.len() as u32);
        self.accessibles.push(AccessibleEntry::new(Some(node), role));
        self.by_node.insert(node, id);
        id
    }

    /// Drop the accessible of a node, marking it defunct
    pub fn remove_accessible(&mut self, node: NodeId) {
        if let Some(id) = self.by_node.remove(&node) {
            self.accessibles[id.0 as usize].defunct = true;
        }
    }

    /// Append an element with an accessible of the given role
    pub fn append_element(&mut self, parent: NodeId, tag: &str, role: AccRole) -> Result<NodeId, DomError> {
        let node = self.append_plain(parent, tag)?;
        self.create_accessible(node, role);
        Ok(node)
    }

    /// Append an element that has no accessible
    pub fn append_plain(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, DomError> {
        let doc = self.dom.owner_document(parent).ok_or(DomError::UnknownNode(parent))?;
        let node = self.dom.create_element(doc, tag);
        self.dom.append_child(parent, node)?;
        Ok(node)
    }

    /// Append a text node with a text leaf accessible
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, DomError> {
        let doc = self.dom.owner_document(parent).ok_or(DomError::UnknownNode(parent))?;
        let node = self.dom.create_text(doc, text);
        self.dom.append_child(parent, node)?;
        self.create_accessible(node, AccRole::TextLeaf);
        Ok(node)
    }

    /// Detach a node from its parent
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        self.dom.remove_child(node)
    }

    pub fn set_handling_user_input(&mut self, document: DocumentId, handling: bool) {
        if let Some(doc) = self.dom.document_mut(document) {
            doc.set_handling_user_input(handling);
        }
    }

    pub fn set_states(&mut self, accessible: AccessibleId, states: States, extra: ExtraStates) {
        if let Some(entry) = self.accessibles.get_mut(accessible.0 as usize) {
            entry.states = states;
            entry.extra_states = extra;
        }
    }

    pub fn set_defunct(&mut self, accessible: AccessibleId) {
        if let Some(entry) = self.accessibles.get_mut(accessible.0 as usize) {
            entry.defunct = true;
        }
    }

    /// Mark a node as a tree container with the given current index
    pub fn set_tree_current_index(&mut self, node: NodeId, index: Option<i32>) {
        match index {
            Some(index) => {
                self.tree_indices.insert(node, index);
            }
            None => {
                self.tree_indices.remove(&node);
            }
        }
    }

    /// Attach an editor to a text container
    pub fn attach_editor(&mut self, text_accessible: AccessibleId, is_empty: bool) -> EditorId {
        let editor = EditorId(self.editors.len() as u32);
        self.editors.push(is_empty);
        if let Some(entry) = self.accessibles.get_mut(text_accessible.0 as usize) {
            entry.editor = Some(editor);
        }
        editor
    }

    pub fn set_editor_empty(&mut self, editor: EditorId, is_empty: bool) {
        if let Some(flag) = self.editors.get_mut(editor.0 as usize) {
            *flag = is_empty;
        }
    }

    fn entry(&self, accessible: AccessibleId) -> Option<&AccessibleEntry> {
        self.accessibles.get(accessible.0 as usize)
    }

    fn is_text_container(role: AccRole) -> bool {
        matches!(
            role,
            AccRole::Document
                | AccRole::Section
                | AccRole::Paragraph
                | AccRole::Entry
                | AccRole::ListItem
                | AccRole::Cell
                | AccRole::PushButton
        )
    }

    /// Text length a single node contributes to its container
    fn own_text_len(&self, node: NodeId) -> i32 {
        if let Some(text) = self.dom.get(node).and_then(|n| n.as_text()) {
            return text.chars().count() as i32;
        }
        match self.by_node.get(&node).and_then(|&id| self.entry(id)) {
            Some(entry) if entry.role == AccRole::Whitespace => 1,
            _ => 0,
        }
    }

    fn append_own_text(&self, node: NodeId, out: &mut String) {
        if let Some(text) = self.dom.get(node).and_then(|n| n.as_text()) {
            out.push_str(text);
            return;
        }
        if let Some(entry) = self.by_node.get(&node).and_then(|&id| self.entry(id)) {
            if entry.role == AccRole::Whitespace {
                out.push('\n');
            }
        }
    }

    fn accessible_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.dom.children(node).filter(|child| self.by_node.contains_key(child))
    }
}

impl AccessibleTree for DomAccessibleTree {
    fn owner_document(&self, node: NodeId) -> Option<DocumentId> {
        self.dom.owner_document(node)
    }

    fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.dom.parent(node)
    }

    fn is_in_document(&self, node: NodeId) -> bool {
        self.dom.is_in_document(node)
    }

    fn is_ancestor_of(&self, possible_ancestor: NodeId, node: NodeId) -> bool {
        self.dom.is_ancestor_of(possible_ancestor, node)
    }

    fn is_handling_user_input(&self, document: DocumentId) -> Option<bool> {
        self.dom.document(document).map(|doc| doc.is_handling_user_input())
    }

    fn accessible_for(&self, node: NodeId) -> Option<AccessibleId> {
        self.by_node.get(&node).copied()
    }

    fn node_for(&self, accessible: AccessibleId) -> Option<NodeId> {
        self.entry(accessible)?.node
    }

    fn application_accessible(&self) -> Option<AccessibleId> {
        Some(self.application)
    }

    fn cached_parent(&self, accessible: AccessibleId) -> Option<AccessibleId> {
        let node = self.node_for(accessible)?;
        let mut current = self.dom.parent(node);
        while let Some(id) = current {
            if let Some(&acc) = self.by_node.get(&id) {
                return Some(acc);
            }
            current = self.dom.parent(id);
        }
        // Documents hang off the application accessible.
        self.dom.get(node).filter(|n| n.is_document()).map(|_| self.application)
    }

    fn cached_next_sibling(&self, accessible: AccessibleId) -> Option<AccessibleId> {
        let mut current = self.dom.next_sibling(self.node_for(accessible)?);
        while let Some(id) = current {
            if let Some(&acc) = self.by_node.get(&id) {
                return Some(acc);
            }
            current = self.dom.next_sibling(id);
        }
        None
    }

    fn cached_prev_sibling(&self, accessible: AccessibleId) -> Option<AccessibleId> {
        let mut current = self.dom.prev_sibling(self.node_for(accessible)?);
        while let Some(id) = current {
            if let Some(&acc) = self.by_node.get(&id) {
                return Some(acc);
            }
            current = self.dom.prev_sibling(id);
        }
        None
    }

    fn index_in_parent(&self, accessible: AccessibleId) -> Option<usize> {
        let node = self.node_for(accessible)?;
        let parent = self.dom.parent(node)?;
        self.accessible_children(parent).position(|child| child == node)
    }

    fn has_accessible_children(&self, node: NodeId) -> bool {
        self.dom.descendants(node).any(|id| self.by_node.contains_key(&id))
    }

    fn is_defunct(&self, accessible: AccessibleId) -> bool {
        self.entry(accessible).is_none_or(|entry| entry.defunct)
    }

    fn role(&self, accessible: AccessibleId) -> AccRole {
        self.entry(accessible).map(|entry| entry.role).unwrap_or_default()
    }

    fn states(&self, accessible: AccessibleId) -> (States, ExtraStates) {
        self.entry(accessible)
            .map(|entry| (entry.states, entry.extra_states))
            .unwrap_or_default()
    }

    fn container_text_accessible(&self, node: NodeId) -> Option<AccessibleId> {
        let mut current = self.dom.parent(node);
        while let Some(id) = current {
            if let Some(&acc) = self.by_node.get(&id) {
                if self.entry(acc).is_some_and(|entry| Self::is_text_container(entry.role)) {
                    return Some(acc);
                }
            }
            current = self.dom.parent(id);
        }
        None
    }

    fn child_offset(&self, container: AccessibleId, child: AccessibleId) -> Option<i32> {
        let container_node = self.node_for(container)?;
        let child_node = self.node_for(child)?;
        if !self.dom.is_ancestor_of(container_node, child_node) {
            return None;
        }

        let mut offset = 0;
        for id in self.dom.descendants(container_node) {
            if id == child_node {
                return Some(offset);
            }
            offset += self.own_text_len(id);
        }
        None
    }

    fn append_text_to(&self, accessible: AccessibleId, out: &mut String) {
        let Some(node) = self.node_for(accessible) else {
            return;
        };
        self.append_own_text(node, out);
        for id in self.dom.descendants(node) {
            self.append_own_text(id, out);
        }
    }

    fn associated_editor(&self, text_accessible: AccessibleId) -> Option<EditorId> {
        self.entry(text_accessible)?.editor
    }

    fn is_editor_empty(&self, editor: EditorId) -> bool {
        self.editors.get(editor.0 as usize).copied().unwrap_or(false)
    }

    fn tree_current_index(&self, node: NodeId) -> Option<i32> {
        self.tree_indices.get(&node).copied()
    }

    fn tree_item_accessible(&self, tree: AccessibleId, index: i32) -> Option<AccessibleId> {
        let node = self.node_for(tree)?;
        let index = usize::try_from(index).ok()?;
        let row = self.accessible_children(node).nth(index)?;
        self.accessible_for(row)
    }
}
