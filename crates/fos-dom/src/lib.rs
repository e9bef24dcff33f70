//! fOS DOM - Document Object Model
//!
//! Arena-backed, single-threaded DOM used as the host tree for fOS
//! components: element creation from tags, HTML fragments or selectors,
//! class lists, insertion/removal, selector matching and direct or
//! delegated event listeners.

mod classlist;
mod document;
mod events;
mod fragment;
mod node;
mod selector;
mod tree;

pub use classlist::ClassList;
pub use document::Document;
pub use events::{dispatch, DomEvent, EventListeners, Listener, ListenerId};
pub use fragment::parse_fragment;
pub use node::{ElementData, Node, NodeData};
pub use selector::Selector;
pub use tree::DomTree;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check whether this id points at a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Raw arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn option(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }
}

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("Hierarchy request error: cannot insert {child:?} into {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("Reference node {sibling:?} is not a child of {parent:?}")]
    InvalidSibling { parent: NodeId, sibling: NodeId },

    #[error("Invalid HTML fragment at offset {offset}: {message}")]
    InvalidFragment { offset: usize, message: String },

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("No element matches selector: {0}")]
    SelectorNotFound(String),
}
