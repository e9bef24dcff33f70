//! Selectors
//!
//! The subset needed for `querySelector`, `matches` and event delegation:
//! compound selectors (`tag#id.class`, `*`) joined by the descendant
//! combinator, in comma-separated groups.

use crate::{DomError, DomResult, DomTree, ElementData, NodeId};

/// One simple selector component
#[derive(Debug, Clone, PartialEq, Eq)]
enum Simple {
    Tag(String),
    Id(String),
    Class(String),
    Universal,
}

/// Compound selector: every component must match the same element
#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound {
    parts: Vec<Simple>,
}

impl Compound {
    fn parse(s: &str) -> DomResult<Self> {
        let mut parts = Vec::new();
        let mut rest = s;
        while !rest.is_empty() {
            let (prefix, body) = match rest.as_bytes()[0] {
                b'#' | b'.' => (Some(rest.as_bytes()[0]), &rest[1..]),
                _ => (None, rest),
            };
            let end = body.find(['#', '.']).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() {
                return Err(DomError::InvalidSelector(s.to_string()));
            }
            let part = match (prefix, name) {
                (Some(b'#'), id) => Simple::Id(id.to_string()),
                (Some(_), class) => Simple::Class(class.to_string()),
                (None, "*") => Simple::Universal,
                (None, tag) if tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') => {
                    Simple::Tag(tag.to_ascii_lowercase())
                }
                _ => return Err(DomError::InvalidSelector(s.to_string())),
            };
            parts.push(part);
            rest = &body[end..];
        }
        if parts.is_empty() {
            return Err(DomError::InvalidSelector(s.to_string()));
        }
        Ok(Self { parts })
    }

    fn matches(&self, el: &ElementData) -> bool {
        self.parts.iter().all(|part| match part {
            Simple::Universal => true,
            Simple::Tag(tag) => el.tag == *tag,
            Simple::Id(id) => el.id.as_deref() == Some(id.as_str()),
            Simple::Class(class) => el.classes.contains(class),
        })
    }
}

/// Parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Alternatives; each is a chain of compounds, outermost first
    groups: Vec<Vec<Compound>>,
}

impl Selector {
    /// Parse a selector string
    pub fn parse(s: &str) -> DomResult<Self> {
        let groups = s
            .split(',')
            .map(|group| {
                let chain = group
                    .split_whitespace()
                    .map(Compound::parse)
                    .collect::<DomResult<Vec<_>>>()?;
                if chain.is_empty() {
                    return Err(DomError::InvalidSelector(s.to_string()));
                }
                Ok(chain)
            })
            .collect::<DomResult<Vec<_>>>()?;
        Ok(Self { groups })
    }

    /// Check whether `node` matches anywhere in the tree
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.matches_within(tree, node, None)
    }

    /// Check whether `node` matches, with ancestor steps confined to
    /// descendants of `scope` (the scope itself is excluded).
    pub fn matches_within(&self, tree: &DomTree, node: NodeId, scope: Option<NodeId>) -> bool {
        self.groups
            .iter()
            .any(|chain| Self::match_chain(tree, node, chain, scope))
    }

    fn match_chain(tree: &DomTree, node: NodeId, chain: &[Compound], scope: Option<NodeId>) -> bool {
        let Some((last, outer)) = chain.split_last() else {
            return false;
        };
        let Ok(el) = tree.element(node) else {
            return false;
        };
        if !last.matches(el) {
            return false;
        }

        // Greedy right-to-left walk is enough for descendant-only chains.
        let mut remaining = outer.iter().rev().peekable();
        for ancestor in tree.ancestors(node) {
            if Some(ancestor) == scope {
                break;
            }
            let Some(wanted) = remaining.peek() else {
                break;
            };
            if tree.element(ancestor).is_ok_and(|el| wanted.matches(el)) {
                remaining.next();
            }
        }
        remaining.peek().is_none()
    }
}
