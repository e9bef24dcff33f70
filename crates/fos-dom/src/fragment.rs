//! HTML fragments
//!
//! Small recursive-descent parser for element markup handed to
//! `Document::to_element` (`"<div class='x'><span>hi</span></div>"`).
//! Exactly one root element is produced; it is left detached.

use crate::{DomError, DomResult, DomTree, NodeId};

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Parse `html` into a detached element subtree of `tree`
pub fn parse_fragment(tree: &mut DomTree, html: &str) -> DomResult<NodeId> {
    let mut parser = Parser { src: html, pos: 0 };
    parser.skip_ws();
    let root = parser.element(tree)?;
    parser.skip_ws();
    if parser.pos != html.len() {
        return Err(parser.error("trailing content after root element"));
    }
    Ok(root)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn error(&self, message: &str) -> DomError {
        DomError::InvalidFragment {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> DomResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `{token}`")))
        }
    }

    fn name(&mut self) -> DomResult<&'a str> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':')))
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(self.error("expected a name"));
        }
        self.pos += end;
        Ok(&rest[..end])
    }

    fn element(&mut self, tree: &mut DomTree) -> DomResult<NodeId> {
        self.expect("<")?;
        let tag = self.name()?.to_ascii_lowercase();
        let node = tree.create_element(&tag);

        loop {
            self.skip_ws();
            if self.eat("/>") {
                return Ok(node);
            }
            if self.eat(">") {
                break;
            }
            let name = self.name()?.to_ascii_lowercase();
            self.skip_ws();
            let value = if self.eat("=") {
                self.skip_ws();
                self.attr_value()?
            } else {
                String::new()
            };
            tree.element_mut(node)?.set_attr(&name, &value);
        }

        if VOID_TAGS.contains(&tag.as_str()) {
            return Ok(node);
        }

        loop {
            if self.rest().is_empty() {
                return Err(self.error(&format!("unclosed <{tag}>")));
            }
            if self.eat("</") {
                let closing = self.name()?.to_ascii_lowercase();
                if closing != tag {
                    return Err(self.error(&format!("expected </{tag}>, found </{closing}>")));
                }
                self.skip_ws();
                self.expect(">")?;
                return Ok(node);
            }
            if self.eat("<!--") {
                let end = self
                    .rest()
                    .find("-->")
                    .ok_or_else(|| self.error("unclosed comment"))?;
                let comment = tree.create_comment(&self.rest()[..end]);
                self.pos += end + 3;
                tree.append_child(node, comment)?;
            } else if self.rest().starts_with('<') {
                let child = self.element(tree)?;
                tree.append_child(node, child)?;
            } else {
                let end = self.rest().find('<').unwrap_or(self.rest().len());
                let text = decode_entities(&self.rest()[..end]);
                self.pos += end;
                let child = tree.create_text(&text);
                tree.append_child(node, child)?;
            }
        }
    }

    fn attr_value(&mut self) -> DomResult<String> {
        for quote in ['"', '\''] {
            if self.rest().starts_with(quote) {
                self.pos += 1;
                let end = self
                    .rest()
                    .find(quote)
                    .ok_or_else(|| self.error("unterminated attribute value"))?;
                let value = decode_entities(&self.rest()[..end]);
                self.pos += end + 1;
                return Ok(value);
            }
        }
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        self.pos += end;
        Ok(decode_entities(&rest[..end]))
    }
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
