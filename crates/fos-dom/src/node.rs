//! DOM Node
//!
//! Nodes link to each other through `NodeId`s instead of pointers, so the
//! whole tree lives in one arena and handles stay `Copy`.

use crate::{ClassList, NodeId};

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (NONE if detached or root)
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
    fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(tag: &str) -> Self {
        Self::with_data(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a new text node
    pub fn text(content: impl Into<String>) -> Self {
        Self::with_data(NodeData::Text(content.into()))
    }

    /// Create a comment node
    pub fn comment(content: impl Into<String>) -> Self {
        Self::with_data(NodeData::Comment(content.into()))
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
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
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Comment
    Comment(String),
}

/// Element-specific data
#[derive(Debug, Clone, Default)]
pub struct ElementData {
    /// Lower-cased tag name
    pub tag: String,
    /// Reflected `id` attribute
    pub id: Option<String>,
    /// Reflected `class` attribute
    pub classes: ClassList,
    /// Inline `display` style, `None` when unset
    pub display: Option<String>,
    /// Remaining attributes in source order
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// Get an attribute value, including the reflected ones
    pub fn get_attr(&self, name: &str) -> Option<String> {
        match name {
            "id" => self.id.clone(),
            "class" => Some(self.classes.value()),
            "style" => self.display.as_ref().map(|d| format!("display: {d}")),
            _ => self
                .attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
        }
    }

    /// Set an attribute; `id`, `class` and `style` are reflected
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match name {
            "id" => self.id = Some(value.to_string()),
            "class" => self.classes = ClassList::parse(value),
            "style" => self.display = parse_display(value),
            _ => {
                if let Some(slot) = self.attrs.iter_mut().find(|(n, _)| n == name) {
                    slot.1 = value.to_string();
                } else {
                    self.attrs.push((name.to_string(), value.to_string()));
                }
            }
        }
    }

    /// Remove an attribute
    pub fn remove_attr(&mut self, name: &str) {
        match name {
            "id" => self.id = None,
            "class" => self.classes = ClassList::new(),
            "style" => self.display = None,
            _ => self.attrs.retain(|(n, _)| n != name),
        }
    }
}

/// Extract the `display` declaration from an inline style string.
fn parse_display(style: &str) -> Option<String> {
    style.split(';').find_map(|decl| {
        let (prop, value) = decl.split_once(':')?;
        (prop.trim().eq_ignore_ascii_case("display")).then(|| value.trim().to_string())
    })
}
