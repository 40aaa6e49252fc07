use super::parse::parse_fragment;
use thiserror::Error;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is kept as one inert text node.
pub(crate) const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("`{0}` is not a valid element name")]
    InvalidCharacter(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Element(element) => element.write_outer_html(out),
            Node::Text(text) => out.push_str(text),
            Node::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    tag_name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

/// Checks `name` the way `createElement` does: a leading ASCII letter, then
/// no whitespace, markup delimiters or NUL.
pub fn is_valid_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| !c.is_whitespace() && !matches!(c, '<' | '>' | '/' | '=' | '"' | '\'' | '\0'))
}

pub(crate) fn is_void(tag_name: &str) -> bool {
    VOID_ELEMENTS.contains(&tag_name)
}

impl Element {
    pub fn new(tag_name: &str) -> Result<Self, DomError> {
        if !is_valid_element_name(tag_name) {
            return Err(DomError::InvalidCharacter(tag_name.to_string()));
        }
        Ok(Self::new_unchecked(tag_name.to_ascii_lowercase()))
    }

    pub(crate) fn new_unchecked(tag_name: String) -> Self {
        Element {
            tag_name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attributes.push((name, value.to_string())),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn append_child(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Replaces the children with the nodes parsed from `markup`.
    ///
    /// Script content becomes inert text; nothing in the markup is run.
    pub fn set_inner_html(&mut self, markup: &str) {
        self.children = parse_fragment(markup);
    }

    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_html(&mut out);
        }
        out
    }

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_outer_html(&mut out);
        out
    }

    fn write_outer_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag_name);
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&value.replace('"', "&quot;"));
            out.push('"');
        }
        out.push('>');
        if is_void(&self.tag_name) {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.tag_name);
        out.push('>');
    }

    /// Depth-first search over descendants, not including `self`.
    pub fn find_descendant<P>(&self, pred: &P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        for element in self.children.iter().filter_map(Node::as_element) {
            if pred(element) {
                return Some(element);
            }
            if let Some(found) = element.find_descendant(pred) {
                return Some(found);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_names() {
        assert!(is_valid_element_name("section"));
        assert!(is_valid_element_name("my-widget"));
        assert!(is_valid_element_name("h1"));
        assert!(!is_valid_element_name(""));
        assert!(!is_valid_element_name("1div"));
        assert!(!is_valid_element_name("di v"));
        assert!(!is_valid_element_name("<div>"));
    }

    #[test]
    fn new_lowercases_and_rejects() {
        assert_eq!(Element::new("SECTION").unwrap().tag_name(), "section");
        assert_eq!(
            Element::new("bad tag"),
            Err(DomError::InvalidCharacter("bad tag".to_string()))
        );
    }

    #[test]
    fn clone_is_deep() {
        let mut original = Element::new("div").unwrap();
        original.set_inner_html("<p>one</p>");
        let copy = original.clone();
        original.set_inner_html("<p>two</p>");
        assert_eq!(copy.inner_html(), "<p>one</p>");
        assert_eq!(original.inner_html(), "<p>two</p>");
    }

    #[test]
    fn classes_and_attributes() {
        let mut el = Element::new("div").unwrap();
        el.set_attribute("class", "nav main");
        el.set_attribute("CLASS", "nav footer");
        assert!(el.has_class("footer"));
        assert!(!el.has_class("main"));
        assert_eq!(el.outer_html(), "<div class=\"nav footer\"></div>");
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        let mut el = Element::new("p").unwrap();
        el.set_inner_html("a<br>b");
        assert_eq!(el.outer_html(), "<p>a<br>b</p>");
    }
}
