//! Elements that views render into and bindings read from.
//!
//! The [`Element`] trait is the only surface the router, views and
//! attribute bindings touch. [`Node`] is an in-memory implementation with a
//! small, forgiving markup parser: it understands tags, quoted and bare
//! attributes, void and self-closing elements, comments and text. Anything
//! else is kept as text.

use knockup_model::Model;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared handle to an element.
pub type ElementRef = Rc<dyn Element>;

/// A markup element.
pub trait Element {
    /// Returns the lowercase tag name.
    fn tag(&self) -> String;

    fn attribute(&self, name: &str) -> Option<String>;

    fn set_attribute(&self, name: &str, value: &str);

    /// Removes an attribute, returning true if it existed.
    fn remove_attribute(&self, name: &str) -> bool;

    /// Returns attribute names in document order.
    fn attribute_names(&self) -> Vec<String>;

    /// Returns the child elements, skipping text.
    fn children(&self) -> Vec<ElementRef>;

    fn inner_html(&self) -> String;

    /// Replaces the content of the element with parsed `markup`.
    fn set_inner_html(&self, markup: &str);

    fn outer_html(&self) -> String;

    /// Attaches `model` as the element's binding context, or detaches it.
    fn bind_model(&self, model: Option<&Model>);

    /// Returns the model bound to this element.
    fn model(&self) -> Option<Model>;

    /// Finds a descendant by its `id` attribute, depth first.
    fn find_by_id(&self, id: &str) -> Option<ElementRef> {
        for child in self.children() {
            if child.attribute("id").as_deref() == Some(id) {
                return Some(child);
            }
            if let Some(found) = child.find_by_id(id) {
                return Some(found);
            }
        }
        None
    }
}

const VOID: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Clone)]
enum Content {
    Element(Rc<Node>),
    Text(String),
}

/// An in-memory element.
pub struct Node {
    tag: String,
    attributes: RefCell<Vec<(String, String)>>,
    content: RefCell<Vec<Content>>,
    model: RefCell<Option<Model>>,
}

impl Node {
    /// Creates an empty element.
    pub fn new(tag: &str) -> Rc<Node> {
        Rc::new(Node {
            tag: tag.to_ascii_lowercase(),
            attributes: RefCell::new(Vec::new()),
            content: RefCell::new(Vec::new()),
            model: RefCell::new(None),
        })
    }

    /// Creates an element whose content is parsed from `markup`.
    pub fn with_html(tag: &str, markup: &str) -> Rc<Node> {
        let node = Node::new(tag);
        node.set_inner_html(markup);
        node
    }

    /// Returns the concatenated text of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for content in self.content.borrow().iter() {
            match content {
                Content::Text(text) => out.push_str(text),
                Content::Element(node) => out.push_str(&node.text()),
            }
        }
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in self.attributes.borrow().iter() {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attribute(value));
            out.push('"');
        }
        out.push('>');

        if VOID.contains(&self.tag.as_str()) {
            return;
        }

        self.write_content(out);
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }

    fn write_content(&self, out: &mut String) {
        for content in self.content.borrow().iter() {
            match content {
                Content::Text(text) => out.push_str(text),
                Content::Element(node) => node.write_html(out),
            }
        }
    }
}

impl Element for Node {
    fn tag(&self) -> String {
        self.tag.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes
            .borrow()
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    fn set_attribute(&self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        let mut attributes = self.attributes.borrow_mut();
        match attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attributes.push((name, value.to_string())),
        }
    }

    fn remove_attribute(&self, name: &str) -> bool {
        let mut attributes = self.attributes.borrow_mut();
        let before = attributes.len();
        attributes.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        attributes.len() != before
    }

    fn attribute_names(&self) -> Vec<String> {
        self.attributes.borrow().iter().map(|(n, _)| n.clone()).collect()
    }

    fn children(&self) -> Vec<ElementRef> {
        self.content
            .borrow()
            .iter()
            .filter_map(|content| match content {
                Content::Element(node) => Some(node.clone() as ElementRef),
                Content::Text(_) => None,
            })
            .collect()
    }

    fn inner_html(&self) -> String {
        let mut out = String::new();
        self.write_content(&mut out);
        out
    }

    fn set_inner_html(&self, markup: &str) {
        let parsed = parse(markup);
        *self.content.borrow_mut() = parsed;
    }

    fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn bind_model(&self, model: Option<&Model>) {
        *self.model.borrow_mut() = model.cloned();
    }

    fn model(&self) -> Option<Model> {
        self.model.borrow().clone()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.outer_html())
    }
}

// ==================== Markup ====================

fn parse(markup: &str) -> Vec<Content> {
    let mut roots = Vec::new();
    let mut open: Vec<Rc<Node>> = Vec::new();
    let mut rest = markup;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("<!--") {
            let end = after.find("-->").map_or(after.len(), |i| i + 3);
            rest = &after[end..];
            continue;
        }

        if let Some(after) = rest.strip_prefix("</") {
            let end = after.find('>').unwrap_or(after.len());
            let name = after[..end].trim().to_ascii_lowercase();
            rest = after.get(end + 1..).unwrap_or("");
            // Unmatched closing tags are dropped.
            if let Some(pos) = open.iter().rposition(|node| node.tag == name) {
                open.truncate(pos);
            }
            continue;
        }

        let opens_tag = rest
            .strip_prefix('<')
            .and_then(|after| after.chars().next())
            .is_some_and(|c| c.is_ascii_alphabetic());

        if opens_tag {
            if let Some((node, self_closing, remaining)) = parse_tag(&rest[1..]) {
                append(&open, &mut roots, Content::Element(node.clone()));
                if !self_closing && !VOID.contains(&node.tag.as_str()) {
                    open.push(node);
                }
                rest = remaining;
                continue;
            }
        }

        let end = rest
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '<')
            .map_or(rest.len(), |(i, _)| i);
        append(&open, &mut roots, Content::Text(rest[..end].to_string()));
        rest = &rest[end..];
    }

    roots
}

fn append(open: &[Rc<Node>], roots: &mut Vec<Content>, content: Content) {
    match open.last() {
        Some(parent) => parent.content.borrow_mut().push(content),
        None => roots.push(content),
    }
}

/// Parses the inside of a start tag. `input` begins right after `<`.
fn parse_tag(input: &str) -> Option<(Rc<Node>, bool, &str)> {
    let bytes = input.as_bytes();
    let mut quote = None;
    let mut end = None;
    for (i, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => {
                end = Some(i);
                break;
            }
            None => {}
        }
    }
    let end = end?;

    let mut inside = &input[..end];
    let self_closing = inside.ends_with('/');
    if self_closing {
        inside = &inside[..inside.len() - 1];
    }

    let name_end = inside.find(char::is_whitespace).unwrap_or(inside.len());
    let node = Node::new(&inside[..name_end]);
    *node.attributes.borrow_mut() = parse_attributes(&inside[name_end..]);

    Some((node, self_closing, &input[end + 1..]))
}

fn parse_attributes(input: &str) -> Vec<(String, String)> {
    let mut attributes: Vec<(String, String)> = Vec::new();
    let mut rest = input.trim_start();

    while !rest.is_empty() {
        let name_end = rest
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let name = rest[..name_end].to_ascii_lowercase();
        rest = rest[name_end..].trim_start();

        let mut value = String::new();
        if let Some(after) = rest.strip_prefix('=') {
            let after = after.trim_start();
            let (raw, remaining) = match after.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let body = &after[1..];
                    let close = body.find(q).unwrap_or(body.len());
                    (&body[..close], body.get(close + 1..).unwrap_or(""))
                }
                _ => {
                    let close = after.find(char::is_whitespace).unwrap_or(after.len());
                    (&after[..close], &after[close..])
                }
            };
            value = unescape_attribute(raw);
            rest = remaining.trim_start();
        }

        // First occurrence wins.
        if !name.is_empty() && !attributes.iter().any(|(n, _)| *n == name) {
            attributes.push((name, value));
        }
    }

    attributes
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn unescape_attribute(value: &str) -> String {
    value.replace("&quot;", "\"").replace("&amp;", "&")
}
