mod document;
mod node;
mod parse;

pub use document::Document;
pub use node::{is_valid_element_name, DomError, Element, Node};
pub use parse::parse_fragment;
