//! DOM Tree (arena-based allocation)

use crate::{Document, DocumentId, DomError, Node, NodeId};

/// Arena-based DOM tree for memory efficiency
///
/// Nodes are never freed: a removed node is only unlinked from its parent,
/// so ids stay stable and a detached subtree can still be inspected.
#[derive(Debug, Default)]
pub struct DomTree {
    nodes: Vec<Node>,
    documents: Vec<Document>,
}

impl DomTree {
    /// Create a new empty DOM tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document and its document node
    pub fn create_document(&mut self, url: &str) -> DocumentId {
        let id = DocumentId(self.documents.len() as u32);
        let root = self.alloc(Node::document(id));
        self.documents.push(Document::new(root));
        tracing::debug!("Created document {:?} for {}", id, url);
        id
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id.0 as usize)
    }

    pub fn document_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.get_mut(id.0 as usize)
    }

    /// Document node of a document
    pub fn root(&self, document: DocumentId) -> Option<NodeId> {
        self.document(document).map(Document::root)
    }

    /// Create a detached element owned by `document`
    pub fn create_element(&mut self, document: DocumentId, tag: &str) -> NodeId {
        self.alloc(Node::element(document, tag))
    }

    /// Create a detached text node owned by `document`
    pub fn create_text(&mut self, document: DocumentId, content: &str) -> NodeId {
        self.alloc(Node::text(document, content))
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent_node = self.get(parent).ok_or(DomError::UnknownNode(parent))?;
        let child_node = self.get(child).ok_or(DomError::UnknownNode(child))?;

        if child_node.document != parent_node.document {
            return Err(DomError::WrongDocument(child));
        }
        if child_node.is_document() || parent_node.is_text() {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        Ok(())
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        self.detach(child);

        let prev = self.nodes[parent.index()].last_child;
        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = NodeId::NONE;
        }
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        self.nodes[parent.index()].last_child = child;
        Ok(())
    }

    /// Unlink `child` from its parent; the subtree below it stays intact
    pub fn remove_child(&mut self, child: NodeId) -> Result<(), DomError> {
        if self.get(child).is_none() {
            return Err(DomError::UnknownNode(child));
        }
        let tag = self.nodes[child.index()].tag().unwrap_or("#text");
        tracing::trace!("Removing <{}> node {:?}", tag, child);
        self.detach(child);
        Ok(())
    }

    fn detach(&mut self, child: NodeId) {
        let (parent, prev, next) = {
            let node = &self.nodes[child.index()];
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if !parent.is_valid() {
            return;
        }

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }

        let node = &mut self.nodes[child.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.first_child.some())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling.some())
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling.some())
    }

    /// Iterate direct children
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(id).unwrap_or(NodeId::NONE),
        }
    }

    /// Iterate the subtree below `id` in document order (excluding `id`)
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut current = id;
        std::iter::from_fn(move || {
            current = self.next_in_preorder(current, id)?;
            Some(current)
        })
    }

    fn next_in_preorder(&self, current: NodeId, root: NodeId) -> Option<NodeId> {
        if let Some(child) = self.first_child(current) {
            return Some(child);
        }
        let mut node = current;
        while node != root {
            if let Some(next) = self.next_sibling(node) {
                return Some(next);
            }
            node = self.parent(node)?;
        }
        None
    }

    /// Strict ancestor check: a node is not its own ancestor
    pub fn is_ancestor_of(&self, possible_ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == possible_ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    pub fn owner_document(&self, node: NodeId) -> Option<DocumentId> {
        self.get(node).map(|n| n.document)
    }

    /// Check whether the node is connected to its document node
    pub fn is_in_document(&self, node: NodeId) -> bool {
        let Some(mut current) = self.get(node) else {
            return false;
        };
        while let Some(parent) = current.parent() {
            current = &self.nodes[parent.index()];
        }
        current.is_document()
    }
}

/// Iterator over the direct children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.some()?;
        self.next = self.tree.nodes[current.index()].next_sibling;
        Some(current)
    }
}
