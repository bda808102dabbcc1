//! # Snapshot Testing Support
//!
//! - **`outline`**: renders the tree and selection as indented text, stable
//!   enough for `insta` snapshot assertions
//! - **`violations`**: lists structural invariants a tree breaks; a
//!   normalized tree has none

use std::fmt::Write;

use crate::editor::Editor;
use crate::location::Path;
use crate::node::{Node, Props};

/// One line per node, children indented by two spaces, then the selection.
///
/// ```text
/// check-list-item checked=true
///   "Slide to the left."
/// selection: 0.0:3
/// ```
pub fn outline(editor: &Editor) -> String {
    let mut out = String::new();
    for child in editor.children() {
        write_node(&mut out, child, 0);
    }
    if let Some(selection) = editor.selection() {
        let _ = writeln!(out, "selection: {selection}");
    }
    out
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    match node {
        Node::Text(text) => {
            let _ = writeln!(out, "{indent}{:?}{}", text.text, props_suffix(&text.marks));
        }
        Node::Element(element) => {
            let _ = writeln!(out, "{indent}{}{}", element.kind, props_suffix(&element.props));
            for child in &element.children {
                write_node(out, child, depth + 1);
            }
        }
    }
}

fn props_suffix(props: &Props) -> String {
    props
        .iter()
        .map(|(key, value)| format!(" {key}={value}"))
        .collect()
}

/// Structural problems in the current tree, as human-readable messages.
pub fn violations(editor: &Editor) -> Vec<String> {
    let mut found = Vec::new();
    let root = editor.root();
    if root.children().is_empty() {
        found.push("document has no blocks".to_string());
    }
    for path in root.descendant_paths() {
        let Ok(node) = root.get(&path) else {
            continue;
        };
        let Some(element) = node.as_element() else {
            continue;
        };
        if element.children.is_empty() {
            found.push(format!("{path}: element `{}` has no children", element.kind));
            continue;
        }

        let inline_flow = element
            .children
            .iter()
            .any(|child| child.is_text() || editor.node_is_inline(child));
        for (index, child) in element.children.iter().enumerate() {
            let child_inline = child.is_text() || editor.node_is_inline(child);
            if inline_flow != child_inline {
                found.push(format!("{}: mixes block and inline children", path.child(index)));
            }
        }
        check_texts(editor, &path, &element.children, &mut found);
    }
    found
}

fn check_texts(editor: &Editor, parent: &Path, children: &[Node], found: &mut Vec<String>) {
    for (index, pair) in children.windows(2).enumerate() {
        if let (Node::Text(a), Node::Text(b)) = (&pair[0], &pair[1])
            && a.same_marks(b)
        {
            found.push(format!("{}: adjacent texts with equal marks", parent.child(index)));
        }
    }
    for (index, child) in children.iter().enumerate() {
        if !editor.node_is_inline(child) {
            continue;
        }
        let before = index.checked_sub(1).and_then(|i| children.get(i));
        let after = children.get(index + 1);
        if !before.is_some_and(Node::is_text) || !after.is_some_and(Node::is_text) {
            found.push(format!("{}: inline not surrounded by text", parent.child(index)));
        }
    }
}
