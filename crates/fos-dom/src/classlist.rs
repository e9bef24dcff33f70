//! Class list
//!
//! Ordered, duplicate-free list of CSS class tokens (`element.classList`).

use std::fmt;

/// Space-separated class tokens in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList {
    tokens: Vec<String>,
}

impl ClassList {
    /// Create an empty class list
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `class` attribute value, dropping duplicates
    pub fn parse(value: &str) -> Self {
        let mut list = Self::new();
        list.extend(value.split_whitespace());
        list
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check for an empty list
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Iterate over tokens
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Check if a token is present
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Append a token; returns false if it was already present or empty
    pub fn add(&mut self, token: &str) -> bool {
        if token.is_empty() || self.contains(token) {
            return false;
        }
        self.tokens.push(token.to_string());
        true
    }

    /// Append several tokens in order
    pub fn extend<'a>(&mut self, tokens: impl IntoIterator<Item = &'a str>) {
        for token in tokens {
            self.add(token);
        }
    }

    /// Remove a token; returns whether it was present
    pub fn remove(&mut self, token: &str) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| t != token);
        before != self.tokens.len()
    }

    /// Toggle a token, returns the new state
    pub fn toggle(&mut self, token: &str, force: Option<bool>) -> bool {
        let present = self.contains(token);
        match force.unwrap_or(!present) {
            true => {
                self.add(token);
                true
            }
            false => {
                self.remove(token);
                false
            }
        }
    }

    /// Replace a token in place
    pub fn replace(&mut self, old_token: &str, new_token: &str) -> bool {
        let Some(pos) = self.tokens.iter().position(|t| t == old_token) else {
            return false;
        };
        if self.contains(new_token) {
            self.tokens.remove(pos);
        } else {
            self.tokens[pos] = new_token.to_string();
        }
        true
    }

    /// Serialized `class` attribute value
    pub fn value(&self) -> String {
        self.tokens.join(" ")
    }
}

impl fmt::Display for ClassList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dedupes() {
        let list = ClassList::parse("btn  btn-primary btn");
        assert_eq!(list.tokens(), ["btn", "btn-primary"]);
        assert_eq!(list.value(), "btn btn-primary");
    }

    #[test]
    fn test_add_remove() {
        let mut list = ClassList::new();
        assert!(list.add("foo"));
        assert!(!list.add("foo"));
        assert!(!list.add(""));
        assert!(list.remove("foo"));
        assert!(list.is_empty());
    }

    #[test]
    fn test_toggle() {
        let mut list = ClassList::new();
        assert!(list.toggle("active", None));
        assert!(!list.toggle("active", None));
        assert!(list.toggle("active", Some(true)));
        assert!(list.toggle("active", Some(true)));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut list = ClassList::parse("a old c");
        assert!(list.replace("old", "new"));
        assert_eq!(list.value(), "a new c");
        assert!(list.replace("new", "a"));
        assert_eq!(list.value(), "a c");
    }
}
