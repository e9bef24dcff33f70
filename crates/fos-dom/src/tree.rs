//! DOM Tree (arena-based allocation)
//!
//! Nodes are never freed: removing a node only unlinks it, so a `NodeId`
//! stays valid for the lifetime of the tree and a detached subtree can be
//! re-inserted later.

use crate::{DomError, DomResult, ElementData, Node, NodeId};

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
        }
    }

    /// Root (document) node
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::text(content))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push(Node::comment(content))
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Element data of a node
    pub fn element(&self, id: NodeId) -> DomResult<&ElementData> {
        self.get(id)
            .ok_or(DomError::NodeNotFound(id))?
            .as_element()
            .ok_or(DomError::NotAnElement(id))
    }

    /// Mutable element data of a node
    pub fn element_mut(&mut self, id: NodeId) -> DomResult<&mut ElementData> {
        self.get_mut(id)
            .ok_or(DomError::NodeNotFound(id))?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NodeNotFound(id))
    }

    /// Parent of a node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.option())
    }

    /// Child ids in document order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.get(id).map_or(NodeId::NONE, |n| n.first_child);
        while let Some(node) = cur.option().and_then(|c| self.get(c)) {
            out.push(cur);
            cur = node.next_sibling;
        }
        out
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Check whether `node` is `ancestor` or one of its descendants
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// All descendants in document (pre-)order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        out
    }

    /// Fail unless `before` is absent or a child of `parent`
    pub fn check_sibling(&self, parent: NodeId, before: Option<NodeId>) -> DomResult<()> {
        self.node(parent)?;
        match before {
            Some(sibling) if self.parent(sibling) != Some(parent) => {
                Err(DomError::InvalidSibling { parent, sibling })
            }
            _ => Ok(()),
        }
    }

    /// Validate an `insert_before` without mutating the tree
    pub fn check_insert(&self, parent: NodeId, child: NodeId, before: Option<NodeId>) -> DomResult<()> {
        self.node(parent)?;
        self.node(child)?;
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        self.check_sibling(parent, before)
    }

    /// Insert `child` into `parent` before `before` (append when `None`).
    ///
    /// A child that is already attached somewhere is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> DomResult<()> {
        self.check_insert(parent, child, before)?;
        if before == Some(child) {
            return Ok(());
        }

        self.detach(child);

        let (prev, next) = match before {
            Some(sibling) => (self.nodes[sibling.index()].prev_sibling, sibling),
            None => (self.nodes[parent.index()].last_child, NodeId::NONE),
        };

        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        match prev.option() {
            Some(p) => self.nodes[p.index()].next_sibling = child,
            None => self.nodes[parent.index()].first_child = child,
        }
        match next.option() {
            Some(n) => self.nodes[n.index()].prev_sibling = child,
            None => self.nodes[parent.index()].last_child = child,
        }
        Ok(())
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Unlink a node from its parent. Returns false if it had none.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(node) = self.get(id) else {
            return false;
        };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);
        let Some(parent) = parent.option() else {
            return false;
        };

        match prev.option() {
            Some(p) => self.nodes[p.index()].next_sibling = next,
            None => self.nodes[parent.index()].first_child = next,
        }
        match next.option() {
            Some(n) => self.nodes[n.index()].prev_sibling = prev,
            None => self.nodes[parent.index()].last_child = prev,
        }

        let node = &mut self.nodes[id.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
        true
    }

    /// Concatenated text of a subtree
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in std::iter::once(id).chain(self.descendants(id)) {
            if let Some(text) = self.get(node).and_then(Node::as_text) {
                out.push_str(text);
            }
        }
        out
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree holds nothing but the document node
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
}
