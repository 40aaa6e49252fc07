use super::node::{DomError, Element, Node};

/// An in-memory document rooted at a `<body>` element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    body: Element,
}

impl Default for Document {
    fn default() -> Self {
        Document {
            body: Element::new_unchecked("body".to_string()),
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document whose body holds `markup`.
    pub fn from_body_html(markup: &str) -> Self {
        let mut doc = Self::default();
        doc.body.set_inner_html(markup);
        doc
    }

    pub fn create_element(&self, tag_name: &str) -> Result<Element, DomError> {
        Element::new(tag_name)
    }

    pub fn body(&self) -> &Element {
        &self.body
    }

    pub fn append_to_body(&mut self, element: Element) {
        self.body.append_child(Node::Element(element));
    }

    /// Returns the first element in the body matching a simple selector:
    /// `.class`, `#id` or a tag name. Anything else matches nothing.
    pub fn query_selector(&self, selector: &str) -> Option<&Element> {
        let selector = selector.trim();
        if let Some(class) = selector.strip_prefix('.') {
            if class.is_empty() {
                return None;
            }
            self.body.find_descendant(&|el: &Element| el.has_class(class))
        } else if let Some(id) = selector.strip_prefix('#') {
            if id.is_empty() {
                return None;
            }
            self.body.find_descendant(&|el: &Element| el.attribute("id") == Some(id))
        } else if selector.eq_ignore_ascii_case("body") {
            Some(&self.body)
        } else if super::node::is_valid_element_name(selector) {
            let tag = selector.to_ascii_lowercase();
            self.body.find_descendant(&|el: &Element| el.tag_name() == tag)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_empty_body() {
        let doc = Document::new();
        assert_eq!(doc.body().tag_name(), "body");
        assert!(doc.body().children().is_empty());
    }

    #[test]
    fn queries() {
        let doc = Document::from_body_html(
            "<header class=\"site top\"><nav id=\"menu\"><a>x</a></nav></header>",
        );
        assert_eq!(doc.query_selector(".top").unwrap().tag_name(), "header");
        assert_eq!(doc.query_selector("#menu").unwrap().tag_name(), "nav");
        assert_eq!(doc.query_selector("A").unwrap().tag_name(), "a");
        assert_eq!(doc.query_selector("body").unwrap().tag_name(), "body");
        assert!(doc.query_selector(".missing").is_none());
        assert!(doc.query_selector(".").is_none());
        assert!(doc.query_selector("div > p").is_none());
    }

    #[test]
    fn append_accumulates() {
        let mut doc = Document::new();
        let el = doc.create_element("section").unwrap();
        doc.append_to_body(el.clone());
        doc.append_to_body(el);
        assert_eq!(doc.body().inner_html(), "<section></section><section></section>");
    }
}
