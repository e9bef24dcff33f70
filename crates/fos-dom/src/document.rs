//! Document - High-level document API
//!
//! This is the surface components talk to: element lookup and creation,
//! class list and display manipulation, connectivity checks and listener
//! registration.

use crate::{
    parse_fragment, ClassList, DomError, DomResult, DomTree, EventListeners, Listener, ListenerId,
    NodeId, Selector,
};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    tree: DomTree,
    /// Registered event listeners
    listeners: EventListeners,
    /// Document URL
    url: String,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
}

impl Document {
    /// Create a document with the `html/head/body` scaffold
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();
        let root = tree.root();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // Fresh detached nodes under a fresh root cannot violate hierarchy rules.
        let _ = tree.append_child(root, html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self {
            tree,
            listeners: EventListeners::new(),
            url: url.to_string(),
            html_element: html,
            head_element: head,
            body_element: body,
        }
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// Access the listener registry
    pub fn listeners(&self) -> &EventListeners {
        &self.listeners
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.create_element(tag)
    }

    /// Resolve an element from markup (`"<div>..."`) or a selector.
    ///
    /// Markup produces a new detached element; a selector is looked up in
    /// the live document.
    pub fn to_element(&mut self, source: &str) -> DomResult<NodeId> {
        let trimmed = source.trim_start();
        if trimmed.starts_with('<') {
            parse_fragment(&mut self.tree, trimmed)
        } else {
            self.query_selector(self.tree.root(), source)?
                .ok_or_else(|| DomError::SelectorNotFound(source.to_string()))
        }
    }

    /// Get connected element by id
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.descendants(self.tree.root()).into_iter().find(|&n| {
            self.tree
                .element(n)
                .is_ok_and(|el| el.id.as_deref() == Some(id))
        })
    }

    /// First descendant of `root` matching `selector`
    pub fn query_selector(&self, root: NodeId, selector: &str) -> DomResult<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .tree
            .descendants(root)
            .into_iter()
            .find(|&n| selector.matches(&self.tree, n)))
    }

    /// All descendants of `root` matching `selector`, in document order
    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> DomResult<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .tree
            .descendants(root)
            .into_iter()
            .filter(|&n| selector.matches(&self.tree, n))
            .collect())
    }

    /// Check whether `node` matches `selector`
    pub fn matches(&self, node: NodeId, selector: &str) -> DomResult<bool> {
        Ok(Selector::parse(selector)?.matches(&self.tree, node))
    }

    /// Check whether `node` is attached to the live document tree
    pub fn is_connected(&self, node: NodeId) -> bool {
        node != self.tree.root() && self.tree.contains(self.tree.root(), node)
    }

    /// Insert `node` into `parent` before `before` (append when `None`)
    pub fn insert(&mut self, parent: NodeId, node: NodeId, before: Option<NodeId>) -> DomResult<()> {
        self.tree.insert_before(parent, node, before)
    }

    /// Check that `insert(parent, node, before)` would succeed
    pub fn check_insert(&self, parent: NodeId, node: NodeId, before: Option<NodeId>) -> DomResult<()> {
        self.tree.check_insert(parent, node, before)
    }

    /// Remove `node` from its parent; returns false if it had none
    pub fn remove(&mut self, node: NodeId) -> bool {
        self.tree.detach(node)
    }

    /// Class list of an element
    pub fn class_list(&self, node: NodeId) -> DomResult<&ClassList> {
        Ok(&self.tree.element(node)?.classes)
    }

    /// Mutable class list of an element
    pub fn class_list_mut(&mut self, node: NodeId) -> DomResult<&mut ClassList> {
        Ok(&mut self.tree.element_mut(node)?.classes)
    }

    /// Element `id` attribute
    pub fn id_of(&self, node: NodeId) -> Option<&str> {
        self.tree.element(node).ok()?.id.as_deref()
    }

    /// Set the element `id` attribute
    pub fn set_id(&mut self, node: NodeId, id: &str) -> DomResult<()> {
        self.tree.element_mut(node)?.id = Some(id.to_string());
        Ok(())
    }

    /// Inline `display` style
    pub fn display(&self, node: NodeId) -> Option<&str> {
        self.tree.element(node).ok()?.display.as_deref()
    }

    /// Set (or clear, with `None`) the inline `display` style
    pub fn set_display(&mut self, node: NodeId, display: Option<&str>) -> DomResult<()> {
        self.tree.element_mut(node)?.display = display.map(str::to_string);
        Ok(())
    }

    /// Listen for `event_type` directly on `node`
    pub fn add_listener(&mut self, node: NodeId, event_type: &str, handler: Listener) -> ListenerId {
        self.listeners.add(node, event_type, handler)
    }

    /// Listen on `root` for events whose target matches `selector`
    pub fn add_delegated_listener(
        &mut self,
        root: NodeId,
        event_type: &str,
        selector: &str,
        handler: Listener,
    ) -> DomResult<ListenerId> {
        let selector = Selector::parse(selector)?;
        Ok(self.listeners.add_delegated(root, event_type, selector, handler))
    }

    /// Remove a listener
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Number of listeners registered on `node`
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.listeners.count_for(node)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
