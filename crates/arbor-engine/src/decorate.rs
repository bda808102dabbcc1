//! # Decorations
//!
//! Decorations are display-only ranges carrying arbitrary mark data, computed
//! from the tree on demand and never stored in it. A [`Decorate`]
//! implementation is called per node; [`leaves`] then splits a text node at
//! the decoration boundaries so a renderer can style each segment.

use serde::Serialize;

use crate::editor::Editor;
use crate::location::{Path, Range};
use crate::node::{Node, Props, Text, char_len, slice_chars};

/// A marked range that exists only for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecoratedRange {
    pub range: Range,
    pub data: Props,
}

/// Computes decorations for one node. Must be pure: the same node and
/// parameters always give the same ranges.
pub trait Decorate {
    fn decorate(&self, node: &Node, path: &Path) -> Vec<DecoratedRange>;
}

impl<F> Decorate for F
where
    F: Fn(&Node, &Path) -> Vec<DecoratedRange>,
{
    fn decorate(&self, node: &Node, path: &Path) -> Vec<DecoratedRange> {
        self(node, path)
    }
}

impl Editor {
    /// Decorations for every node of the document, in document order.
    pub fn decorations(&self, decorator: &dyn Decorate) -> Vec<DecoratedRange> {
        let root = self.root();
        std::iter::once(Path::root())
            .chain(root.descendant_paths())
            .filter_map(|path| root.get(&path).ok().map(|node| decorator.decorate(node, &path)))
            .flatten()
            .collect()
    }
}

/// A run of text with uniform marks and decoration data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaf {
    pub text: String,
    /// Start offset of the run within its text node.
    pub offset: usize,
    pub marks: Props,
}

/// Split the text node at `path` into runs at decoration boundaries. Each run
/// carries the node's marks plus the data of every decoration covering it.
pub fn leaves(text: &Text, path: &Path, decorations: &[DecoratedRange]) -> Vec<Leaf> {
    let len = char_len(&text.text);
    let covering: Vec<(usize, usize, &Props)> = decorations
        .iter()
        .filter_map(|decoration| {
            let (start, end) = decoration.range.edges();
            if start.path.compare(path).is_gt() || end.path.compare(path).is_lt() {
                return None;
            }
            let from = if start.path == *path { start.offset.min(len) } else { 0 };
            let to = if end.path == *path { end.offset.min(len) } else { len };
            Some((from, to, &decoration.data))
        })
        .collect();

    let mut cuts: Vec<usize> = covering
        .iter()
        .flat_map(|&(from, to, _)| [from, to])
        .chain([0, len])
        .collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut out = Vec::new();
    for window in cuts.windows(2) {
        let (from, to) = (window[0], window[1]);
        let mut marks = text.marks.clone();
        for &(start, end, data) in &covering {
            if start <= from && to <= end {
                marks.extend(data.iter().map(|(key, value)| (key.clone(), value.clone())));
            }
        }
        out.push(Leaf {
            text: slice_chars(&text.text, from, to).to_string(),
            offset: from,
            marks,
        });
    }
    if out.is_empty() {
        out.push(Leaf {
            text: String::new(),
            offset: 0,
            marks: text.marks.clone(),
        });
    }
    out
}
