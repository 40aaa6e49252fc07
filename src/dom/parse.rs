use super::node::{is_void, Element, Node, RAW_TEXT_ELEMENTS};

/// Deepest nesting the builder produces. Once reached, further start tags
/// become leaves of the deepest open element and their content lands beside
/// them instead of inside.
pub const MAX_DEPTH: usize = 512;

/// Parses fragment markup into a list of sibling nodes.
///
/// This is a forgiving tree builder, not a full HTML5 parser: text and
/// entities are kept verbatim, unmatched end tags are dropped and anything
/// still open at the end of input is closed. Nesting stops at [`MAX_DEPTH`].
pub fn parse_fragment(markup: &str) -> Vec<Node> {
    let mut builder = TreeBuilder::default();
    let mut cursor = Cursor { input: markup, pos: 0 };
    let mut text = String::new();

    while let Some(c) = cursor.peek() {
        if c != '<' {
            text.push(c);
            cursor.bump();
            continue;
        }
        let rest = cursor.rest();
        if rest.starts_with("<!--") {
            builder.flush_text(&mut text);
            cursor.advance(4);
            let comment = cursor.take_until("-->");
            builder.append(Node::Comment(comment.to_string()));
            cursor.advance(3);
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            builder.flush_text(&mut text);
            cursor.take_until(">");
            cursor.advance(1);
        } else if rest.starts_with("</") && starts_name(&rest[2..]) {
            builder.flush_text(&mut text);
            cursor.advance(2);
            let name = cursor.take_name().to_ascii_lowercase();
            cursor.take_until(">");
            cursor.advance(1);
            builder.close(&name);
        } else if starts_name(&rest[1..]) {
            builder.flush_text(&mut text);
            cursor.advance(1);
            let (element, self_closing) = parse_start_tag(&mut cursor);
            let name = element.tag_name().to_string();
            if RAW_TEXT_ELEMENTS.contains(&name.as_str()) && !self_closing {
                let mut element = element;
                let content = cursor.take_until_ignore_case(&format!("</{}", name));
                if !content.is_empty() {
                    element.append_child(Node::Text(content.to_string()));
                }
                cursor.take_until(">");
                cursor.advance(1);
                builder.append(Node::Element(element));
            } else if self_closing || is_void(&name) {
                builder.append(Node::Element(element));
            } else {
                builder.open(element);
            }
        } else {
            text.push(c);
            cursor.bump();
        }
    }
    builder.flush_text(&mut text);
    builder.finish()
}

fn starts_name(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn parse_start_tag(cursor: &mut Cursor<'_>) -> (Element, bool) {
    let mut element = Element::new_unchecked(cursor.take_name().to_ascii_lowercase());
    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            None => return (element, false),
            Some('>') => {
                cursor.bump();
                return (element, false);
            }
            Some('/') => {
                cursor.bump();
                if cursor.peek() == Some('>') {
                    cursor.bump();
                    return (element, true);
                }
            }
            Some(_) => {
                let name = cursor.take_attribute_name();
                if name.is_empty() {
                    cursor.bump();
                    continue;
                }
                cursor.skip_whitespace();
                let value = if cursor.peek() == Some('=') {
                    cursor.bump();
                    cursor.skip_whitespace();
                    cursor.take_attribute_value()
                } else {
                    ""
                };
                if element.attribute(&name.to_ascii_lowercase()).is_none() {
                    element.set_attribute(name, value);
                }
            }
        }
    }
}

#[derive(Default)]
struct TreeBuilder {
    roots: Vec<Node>,
    open: Vec<Element>,
}

impl TreeBuilder {
    fn append(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.append_child(node),
            None => self.roots.push(node),
        }
    }

    fn flush_text(&mut self, text: &mut String) {
        if !text.is_empty() {
            self.append(Node::Text(std::mem::take(text)));
        }
    }

    fn open(&mut self, element: Element) {
        if self.open.len() + 1 >= MAX_DEPTH {
            self.append(Node::Element(element));
        } else {
            self.open.push(element);
        }
    }

    fn close(&mut self, name: &str) {
        if !self.open.iter().any(|el| el.tag_name() == name) {
            return;
        }
        while let Some(element) = self.open.pop() {
            let done = element.tag_name() == name;
            self.append(Node::Element(element));
            if done {
                break;
            }
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while let Some(element) = self.open.pop() {
            self.append(Node::Element(element));
        }
        self.roots
    }
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    /// Advances by `n` bytes of ASCII, stopping at the end of input.
    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    fn take_while<F: Fn(char) -> bool>(&mut self, f: F) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !f(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn take_until(&mut self, pat: &str) -> &'a str {
        let rest = self.rest();
        let len = rest.find(pat).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn take_until_ignore_case(&mut self, pat: &str) -> &'a str {
        let rest = self.rest();
        let len = rest
            .to_ascii_lowercase()
            .find(&pat.to_ascii_lowercase())
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn take_name(&mut self) -> &'a str {
        self.take_while(|c| !c.is_whitespace() && c != '>' && c != '/')
    }

    fn take_attribute_name(&mut self) -> &'a str {
        self.take_while(|c| !c.is_whitespace() && !matches!(c, '>' | '/' | '='))
    }

    fn take_attribute_value(&mut self) -> &'a str {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let value = self.take_while(|c| c != quote);
                self.bump();
                value
            }
            _ => self.take_while(|c| !c.is_whitespace() && c != '>'),
        }
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }
}
