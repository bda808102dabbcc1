//! # Node Model
//!
//! A document is a tree of [`Node`]s. Elements carry a type tag, a free-form
//! property map and ordered children; text leaves carry a string and a map of
//! formatting marks. Nodes never point back at their parents: a node's address
//! is its [`Path`], computed by walking down from the root.
//!
//! The serialized layout is the persisted document format:
//!
//! ```json
//! { "type": "check-list-item", "checked": true, "children": [{ "text": "Slide to the left." }] }
//! ```
//!
//! Text offsets everywhere in the engine count Unicode scalar values, not bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::location::Path;

/// Element properties or text marks, keyed by name.
pub type Props = BTreeMap<String, Value>;

/// Type tag of the synthetic root element owning the top-level blocks.
pub const ROOT_TYPE: &str = "editor";

/// Key under which an element's type tag travels in property maps.
pub const TYPE_KEY: &str = "type";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Element(Element),
    Text(Text),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub kind: String,
    pub children: Vec<Node>,
    #[serde(flatten)]
    pub props: Props,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    #[serde(flatten)]
    pub marks: Props,
}

impl Element {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            children: Vec::new(),
            props: Props::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub fn is_root(&self) -> bool {
        self.kind == ROOT_TYPE
    }

    /// Properties including the `type` tag, as carried by split and merge operations.
    pub fn extract_props(&self) -> Props {
        let mut props = self.props.clone();
        props.insert(TYPE_KEY.to_string(), Value::String(self.kind.clone()));
        props
    }

    /// Rebuild an element from extracted properties and a set of children.
    pub fn from_props(props: &Props, children: Vec<Node>) -> Result<Self> {
        let mut props = props.clone();
        let kind = match props.remove(TYPE_KEY) {
            Some(Value::String(kind)) => kind,
            _ => {
                return Err(EngineError::InvalidProperty {
                    key: TYPE_KEY.to_string(),
                    reason: "element properties must carry a string type".to_string(),
                });
            }
        };
        Ok(Self {
            kind,
            children,
            props,
        })
    }
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Props::new(),
        }
    }

    pub fn with_mark(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.marks.insert(key.into(), value.into());
        self
    }

    pub fn mark(&self, key: &str) -> Option<&Value> {
        self.marks.get(key)
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Two leaves with identical marks can be merged into one.
    pub fn same_marks(&self, other: &Text) -> bool {
        self.marks == other.marks
    }
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(Text::new(text))
    }

    pub fn element(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Element(Element::new(kind).with_children(children))
    }

    pub(crate) fn root(children: Vec<Node>) -> Self {
        Node::element(ROOT_TYPE, children)
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    /// True for elements whose tag is `kind`.
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind() == Some(kind)
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            Node::Element(element) => Some(&element.kind),
            Node::Text(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    pub(crate) fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(element) => &element.children,
            Node::Text(_) => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Element(element) => Some(&mut element.children),
            Node::Text(_) => None,
        }
    }

    /// Property (element) or mark (text) map.
    pub fn props(&self) -> &Props {
        match self {
            Node::Element(element) => &element.props,
            Node::Text(text) => &text.marks,
        }
    }

    /// Look up a property by name. For elements `type` resolves to the tag.
    pub fn prop(&self, key: &str) -> Option<Value> {
        match self {
            Node::Element(element) if key == TYPE_KEY => Some(Value::String(element.kind.clone())),
            _ => self.props().get(key).cloned(),
        }
    }

    /// Properties that identify this node apart from its content.
    pub fn extract_props(&self) -> Props {
        match self {
            Node::Element(element) => element.extract_props(),
            Node::Text(text) => text.marks.clone(),
        }
    }

    /// Concatenated text content of the subtree.
    pub fn string(&self) -> String {
        match self {
            Node::Text(text) => text.text.clone(),
            Node::Element(element) => element.children.iter().map(Node::string).collect(),
        }
    }

    pub fn get(&self, path: &Path) -> Result<&Node> {
        let mut node = self;
        for (depth, &index) in path.iter().enumerate() {
            node = node.children().get(index).ok_or_else(|| {
                EngineError::invalid_location(path, format!("no node at depth {depth}"))
            })?;
        }
        Ok(node)
    }

    pub(crate) fn get_mut(&mut self, path: &Path) -> Result<&mut Node> {
        let mut node = self;
        for (depth, &index) in path.iter().enumerate() {
            node = node
                .children_mut()
                .and_then(|children| children.get_mut(index))
                .ok_or_else(|| {
                    EngineError::invalid_location(path, format!("no node at depth {depth}"))
                })?;
        }
        Ok(node)
    }

    pub fn has(&self, path: &Path) -> bool {
        self.get(path).is_ok()
    }

    /// Descend along first children from `path` until a leaf or an empty element.
    pub fn first(&self, path: &Path) -> Result<(&Node, Path)> {
        let mut node = self.get(path)?;
        let mut path = path.clone();
        while let Some(child) = node.children().first() {
            node = child;
            path = path.child(0);
        }
        Ok((node, path))
    }

    /// Descend along last children from `path` until a leaf or an empty element.
    pub fn last(&self, path: &Path) -> Result<(&Node, Path)> {
        let mut node = self.get(path)?;
        let mut path = path.clone();
        while let Some(child) = node.children().last() {
            path = path.child(node.children().len() - 1);
            node = child;
        }
        Ok((node, path))
    }

    /// The text leaf at `path`.
    pub fn leaf(&self, path: &Path) -> Result<&Text> {
        self.get(path)?
            .as_text()
            .ok_or_else(|| EngineError::invalid_location(path, "node is not a text leaf"))
    }

    /// All text leaves below `path` in document order.
    pub fn texts(&self) -> Vec<(&Text, Path)> {
        let mut out = Vec::new();
        collect_texts(self, Path::root(), &mut out);
        out
    }

    /// Paths of every node in the subtree, parents before children.
    pub fn descendant_paths(&self) -> Vec<Path> {
        let mut out = Vec::new();
        collect_paths(self, Path::root(), &mut out);
        out
    }
}

fn collect_texts<'a>(node: &'a Node, path: Path, out: &mut Vec<(&'a Text, Path)>) {
    match node {
        Node::Text(text) => out.push((text, path)),
        Node::Element(element) => {
            for (index, child) in element.children.iter().enumerate() {
                collect_texts(child, path.child(index), out);
            }
        }
    }
}

fn collect_paths(node: &Node, path: Path, out: &mut Vec<Path>) {
    for (index, child) in node.children().iter().enumerate() {
        let child_path = path.child(index);
        out.push(child_path.clone());
        collect_paths(child, child_path, out);
    }
}

/// Byte index of the `offset`-th character, clamped to the end of the string.
pub(crate) fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

/// Substring between two character offsets.
pub(crate) fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    let start = byte_index(text, start);
    let end = byte_index(text, end).max(start);
    &text[start..end]
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Node {
        Node::root(vec![
            Node::element("paragraph", vec![Node::text("one")]),
            Node::Element(
                Element::new("check-list-item")
                    .with_prop("checked", true)
                    .with_children(vec![Node::text("two"), Node::text("three")]),
            ),
        ])
    }

    #[test]
    fn test_element_roundtrips_persisted_layout() {
        let value = json!({
            "type": "check-list-item",
            "checked": true,
            "children": [{ "text": "Slide to the left.", "bold": true }]
        });

        let node: Node = serde_json::from_value(value.clone()).unwrap();
        let element = node.as_element().unwrap();
        assert_eq!(element.kind, "check-list-item");
        assert_eq!(element.prop("checked"), Some(&json!(true)));
        let leaf = element.children[0].as_text().unwrap();
        assert_eq!(leaf.text, "Slide to the left.");
        assert_eq!(leaf.mark("bold"), Some(&json!(true)));

        assert_eq!(serde_json::to_value(&node).unwrap(), value);
    }

    #[test]
    fn test_get_follows_child_indices() {
        let root = sample();
        let node = root.get(&Path::from([1, 1])).unwrap();
        assert_eq!(node.as_text().unwrap().text, "three");
        assert!(root.get(&Path::from([2])).is_err());
        assert!(root.get(&Path::from([0, 0, 0])).is_err());
    }

    #[test]
    fn test_first_and_last_descend_to_leaves() {
        let root = sample();
        let (_, first) = root.first(&Path::root()).unwrap();
        let (_, last) = root.last(&Path::root()).unwrap();
        assert_eq!(first, Path::from([0, 0]));
        assert_eq!(last, Path::from([1, 1]));
    }

    #[test]
    fn test_string_concatenates_leaves() {
        assert_eq!(sample().string(), "onetwothree");
    }

    #[test]
    fn test_extract_props_round_trips_type() {
        let element = Element::new("link").with_prop("url", "https://x.test");
        let props = element.extract_props();
        assert_eq!(props.get(TYPE_KEY), Some(&json!("link")));

        let rebuilt = Element::from_props(&props, vec![]).unwrap();
        assert_eq!(rebuilt, element);
    }

    #[test]
    fn test_char_offsets_ignore_byte_width() {
        assert_eq!(char_len("Cha cha…"), 8);
        assert_eq!(slice_chars("Cha cha…", 4, 8), "cha…");
        assert_eq!(byte_index("…x", 1), "…".len());
    }
}
