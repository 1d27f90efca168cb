//! Parsed clipboard markup as handed over by the host's paste pipeline

use serde::{Deserialize, Serialize};
use tabula_model::Attributes;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MarkupNode {
    Element(MarkupElement),
    Text { text: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkupElement {
    pub tag: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub children: Vec<MarkupNode>,
}

impl MarkupNode {
    pub fn element(tag: &str, attributes: Attributes, children: Vec<MarkupNode>) -> Self {
        MarkupNode::Element(MarkupElement {
            tag: tag.to_ascii_lowercase(),
            attributes,
            children,
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        MarkupNode::Text { text: text.into() }
    }

    pub fn as_element(&self) -> Option<&MarkupElement> {
        match self {
            MarkupNode::Element(element) => Some(element),
            MarkupNode::Text { .. } => None,
        }
    }

    /// Whether this node or any descendant element satisfies `predicate`
    pub fn any_element(&self, predicate: &dyn Fn(&MarkupElement) -> bool) -> bool {
        match self {
            MarkupNode::Element(element) => {
                predicate(element) || element.children.iter().any(|child| child.any_element(predicate))
            }
            MarkupNode::Text { .. } => false,
        }
    }
}

impl MarkupElement {
    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Direct child elements, skipping text
    pub fn elements(&self) -> impl Iterator<Item = &MarkupElement> {
        self.children.iter().filter_map(MarkupNode::as_element)
    }

    /// First descendant element (self excluded) carrying `key`
    pub fn find_attribute(&self, key: &str) -> Option<&str> {
        self.elements()
            .find_map(|child| child.attribute(key).or_else(|| child.find_attribute(key)))
    }

    /// Concatenated text of the subtree; `<br>` becomes a line break
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[MarkupNode], out: &mut String) {
    for node in nodes {
        match node {
            MarkupNode::Text { text } => out.push_str(text),
            MarkupNode::Element(element) if element.is("br") => out.push('\n'),
            MarkupNode::Element(element) => collect_text(&element.children, out),
        }
    }
}
