//! Primitive, invertible tree operations.
//!
//! Every transform bottoms out in a sequence of [`Operation`]s. Applying an
//! operation mutates the tree in exactly one place, and its [`inverse`]
//! undoes that mutation exactly, which is what history replays.
//!
//! [`inverse`]: Operation::inverse

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::location::{Path, Range};
use crate::node::{Element, Node, Props, TYPE_KEY, byte_index, char_len, slice_chars};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    InsertNode {
        path: Path,
        node: Node,
    },
    RemoveNode {
        path: Path,
        node: Node,
    },
    InsertText {
        path: Path,
        offset: usize,
        text: String,
    },
    RemoveText {
        path: Path,
        offset: usize,
        text: String,
    },
    /// Merge the node at `path` into its previous sibling. `position` is the
    /// previous sibling's length before the merge.
    MergeNode {
        path: Path,
        position: usize,
        properties: Props,
    },
    /// Split the node at `path` at `position`; the second half gets `properties`.
    SplitNode {
        path: Path,
        position: usize,
        properties: Props,
    },
    MoveNode {
        path: Path,
        new_path: Path,
    },
    /// `properties` holds the previous values of changed keys that existed;
    /// keys present there but absent from `new_properties` are removed.
    SetNode {
        path: Path,
        properties: Props,
        new_properties: Props,
    },
    SetSelection {
        selection: Option<Range>,
        new_selection: Option<Range>,
    },
}

impl Operation {
    /// True for operations that can shift node paths.
    pub fn moves_paths(&self) -> bool {
        matches!(
            self,
            Operation::InsertNode { .. }
                | Operation::RemoveNode { .. }
                | Operation::MergeNode { .. }
                | Operation::SplitNode { .. }
                | Operation::MoveNode { .. }
        )
    }

    pub fn is_selection(&self) -> bool {
        matches!(self, Operation::SetSelection { .. })
    }

    pub fn inverse(&self) -> Result<Operation> {
        Ok(match self {
            Operation::InsertNode { path, node } => Operation::RemoveNode {
                path: path.clone(),
                node: node.clone(),
            },
            Operation::RemoveNode { path, node } => Operation::InsertNode {
                path: path.clone(),
                node: node.clone(),
            },
            Operation::InsertText { path, offset, text } => Operation::RemoveText {
                path: path.clone(),
                offset: *offset,
                text: text.clone(),
            },
            Operation::RemoveText { path, offset, text } => Operation::InsertText {
                path: path.clone(),
                offset: *offset,
                text: text.clone(),
            },
            Operation::MergeNode {
                path,
                position,
                properties,
            } => Operation::SplitNode {
                path: path.previous()?,
                position: *position,
                properties: properties.clone(),
            },
            Operation::SplitNode {
                path,
                position,
                properties,
            } => Operation::MergeNode {
                path: path.next()?,
                position: *position,
                properties: properties.clone(),
            },
            Operation::MoveNode { path, new_path } => {
                if path == new_path {
                    self.clone()
                } else if path.is_sibling(new_path) {
                    Operation::MoveNode {
                        path: new_path.clone(),
                        new_path: path.clone(),
                    }
                } else {
                    // The node now lives where `path` transforms to, and must go
                    // back before whatever now follows its old position.
                    let inverse_path = path.transform(self, None).ok_or_else(|| {
                        EngineError::invalid_location(path, "cannot invert move")
                    })?;
                    let inverse_new_path = path.next()?.transform(self, None).ok_or_else(|| {
                        EngineError::invalid_location(path, "cannot invert move")
                    })?;
                    Operation::MoveNode {
                        path: inverse_path,
                        new_path: inverse_new_path,
                    }
                }
            }
            Operation::SetNode {
                path,
                properties,
                new_properties,
            } => Operation::SetNode {
                path: path.clone(),
                properties: new_properties.clone(),
                new_properties: properties.clone(),
            },
            Operation::SetSelection {
                selection,
                new_selection,
            } => Operation::SetSelection {
                selection: new_selection.clone(),
                new_selection: selection.clone(),
            },
        })
    }

    /// Mutate `root` in place. Selection operations do not touch the tree.
    pub(crate) fn apply_to(&self, root: &mut Node) -> Result<()> {
        match self {
            Operation::InsertNode { path, node } => {
                let index = last_index(path)?;
                let children = parent_children(root, path)?;
                if index > children.len() {
                    return Err(EngineError::invalid_location(path, "insert index out of bounds"));
                }
                children.insert(index, node.clone());
            }
            Operation::RemoveNode { path, .. } => {
                let index = last_index(path)?;
                let children = parent_children(root, path)?;
                if index >= children.len() {
                    return Err(EngineError::invalid_location(path, "no node to remove"));
                }
                children.remove(index);
            }
            Operation::InsertText { path, offset, text } => {
                let leaf = text_mut(root, path)?;
                if *offset > char_len(&leaf.text) {
                    return Err(EngineError::invalid_location(path, "text offset out of bounds"));
                }
                let at = byte_index(&leaf.text, *offset);
                leaf.text.insert_str(at, text);
            }
            Operation::RemoveText { path, offset, text } => {
                let leaf = text_mut(root, path)?;
                let end = offset + char_len(text);
                if end > char_len(&leaf.text) {
                    return Err(EngineError::invalid_location(path, "text range out of bounds"));
                }
                let start_byte = byte_index(&leaf.text, *offset);
                let end_byte = byte_index(&leaf.text, end);
                leaf.text.replace_range(start_byte..end_byte, "");
            }
            Operation::MergeNode { path, .. } => {
                let index = last_index(path)?;
                if index == 0 {
                    return Err(EngineError::invalid_location(path, "no previous sibling to merge into"));
                }
                let children = parent_children(root, path)?;
                if index >= children.len() {
                    return Err(EngineError::invalid_location(path, "no node to merge"));
                }
                if children[index].is_text() != children[index - 1].is_text() {
                    return Err(EngineError::invariant(
                        path,
                        "cannot merge a text leaf with an element",
                    ));
                }
                let node = children.remove(index);
                match (&mut children[index - 1], node) {
                    (Node::Text(prev), Node::Text(node)) => prev.text.push_str(&node.text),
                    (Node::Element(prev), Node::Element(node)) => prev.children.extend(node.children),
                    _ => {}
                }
            }
            Operation::SplitNode {
                path,
                position,
                properties,
            } => {
                let index = last_index(path)?;
                let children = parent_children(root, path)?;
                let node = children
                    .get_mut(index)
                    .ok_or_else(|| EngineError::invalid_location(path, "no node to split"))?;
                let new_node = match node {
                    Node::Text(text) => {
                        if *position > char_len(&text.text) {
                            return Err(EngineError::invalid_location(path, "split offset out of bounds"));
                        }
                        let after = slice_chars(&text.text, *position, usize::MAX).to_string();
                        text.text = slice_chars(&text.text, 0, *position).to_string();
                        let mut new_text = crate::node::Text::new(after);
                        new_text.marks = properties.clone();
                        Node::Text(new_text)
                    }
                    Node::Element(element) => {
                        if *position > element.children.len() {
                            return Err(EngineError::invalid_location(path, "split index out of bounds"));
                        }
                        let after = element.children.split_off(*position);
                        Node::Element(Element::from_props(properties, after)?)
                    }
                };
                children.insert(index + 1, new_node);
            }
            Operation::MoveNode { path, new_path } => {
                if path.is_ancestor(new_path) {
                    return Err(EngineError::invalid_location(
                        new_path,
                        format!("cannot move [{path}] inside itself"),
                    ));
                }
                if path == new_path {
                    return Ok(());
                }
                let index = last_index(path)?;
                let children = parent_children(root, path)?;
                if index >= children.len() {
                    return Err(EngineError::invalid_location(path, "no node to move"));
                }
                let node = children.remove(index);

                let true_path = path
                    .transform(self, None)
                    .ok_or_else(|| EngineError::invalid_location(new_path, "move target vanished"))?;
                let new_index = last_index(&true_path)?;
                let new_children = parent_children(root, &true_path)?;
                if new_index > new_children.len() {
                    return Err(EngineError::invalid_location(new_path, "move index out of bounds"));
                }
                new_children.insert(new_index, node);
            }
            Operation::SetNode {
                path,
                properties,
                new_properties,
            } => {
                if path.is_empty() {
                    return Err(EngineError::invalid_location(path, "cannot set properties on the root"));
                }
                let node = root.get_mut(path)?;
                for (key, value) in new_properties {
                    set_prop(node, key, value.clone())?;
                }
                for key in properties.keys() {
                    if !new_properties.contains_key(key) {
                        unset_prop(node, key);
                    }
                }
            }
            Operation::SetSelection { .. } => {}
        }
        Ok(())
    }
}

fn last_index(path: &Path) -> Result<usize> {
    path.last_index()
        .ok_or_else(|| EngineError::invalid_location(path, "operation cannot target the root"))
}

fn parent_children<'a>(root: &'a mut Node, path: &Path) -> Result<&'a mut Vec<Node>> {
    root.get_mut(&path.parent()?)?
        .children_mut()
        .ok_or_else(|| EngineError::invalid_location(path, "parent is a text leaf"))
}

fn text_mut<'a>(root: &'a mut Node, path: &Path) -> Result<&'a mut crate::node::Text> {
    root.get_mut(path)?
        .as_text_mut()
        .ok_or_else(|| EngineError::invalid_location(path, "node is not a text leaf"))
}

fn set_prop(node: &mut Node, key: &str, value: Value) -> Result<()> {
    match node {
        Node::Element(element) if key == TYPE_KEY => match value {
            Value::String(kind) => element.kind = kind,
            _ => {
                return Err(EngineError::InvalidProperty {
                    key: key.to_string(),
                    reason: "element type must be a string".to_string(),
                });
            }
        },
        Node::Element(element) => {
            element.props.insert(key.to_string(), value);
        }
        Node::Text(text) => {
            text.marks.insert(key.to_string(), value);
        }
    }
    Ok(())
}

fn unset_prop(node: &mut Node, key: &str) {
    match node {
        Node::Element(_) if key == TYPE_KEY => {}
        Node::Element(element) => {
            element.props.remove(key);
        }
        Node::Text(text) => {
            text.marks.remove(key);
        }
    }
}
