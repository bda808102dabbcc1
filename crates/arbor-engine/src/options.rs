//! Shared options for queries and transforms.
//!
//! Each query or transform reads the fields that concern it and documents its
//! own defaults; unrelated fields are ignored.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::editor::Editor;
use crate::location::{Location, Path, SelectionEdge};
use crate::node::Node;

/// Node predicate evaluated against the editor's current state.
#[derive(Clone)]
pub struct Match(Rc<dyn Fn(&Editor, &Node, &Path) -> bool>);

impl Match {
    pub fn new(predicate: impl Fn(&Editor, &Node, &Path) -> bool + 'static) -> Self {
        Match(Rc::new(predicate))
    }

    pub fn any() -> Self {
        Match::new(|_, _, _| true)
    }

    pub fn text() -> Self {
        Match::new(|_, node, _| node.is_text())
    }

    /// Any element except the root.
    pub fn element() -> Self {
        Match::new(|_, node, path| node.is_element() && !path.is_empty())
    }

    pub fn block() -> Self {
        Match::new(|editor, node, path| {
            !path.is_empty() && node.as_element().is_some_and(|element| editor.is_block(element))
        })
    }

    pub fn inline() -> Self {
        Match::new(|editor, node, path| {
            !path.is_empty() && node.as_element().is_some_and(|element| editor.is_inline(element))
        })
    }

    /// Texts and inline elements.
    pub fn inline_or_text() -> Self {
        Match::new(|editor, node, path| node.is_text() || (!path.is_empty() && editor.node_is_inline(node)))
    }

    pub fn void() -> Self {
        Match::new(|editor, node, path| {
            !path.is_empty() && node.as_element().is_some_and(|element| editor.is_void(element))
        })
    }

    pub fn read_only() -> Self {
        Match::new(|editor, node, path| {
            !path.is_empty()
                && node
                    .as_element()
                    .is_some_and(|element| editor.is_element_read_only(element))
        })
    }

    pub fn kind(kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Match::new(move |_, node, path| !path.is_empty() && node.is_kind(&kind))
    }

    pub fn kinds(kinds: &[&str]) -> Self {
        let kinds: Vec<String> = kinds.iter().map(|kind| kind.to_string()).collect();
        Match::new(move |_, node, path| {
            !path.is_empty() && node.kind().is_some_and(|kind| kinds.iter().any(|k| k == kind))
        })
    }

    /// Non-root elements whose property `key` equals `value`.
    pub fn prop(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        Match::new(move |_, node, path| {
            !path.is_empty() && node.is_element() && node.prop(&key).as_ref() == Some(&value)
        })
    }

    pub fn path(target: Path) -> Self {
        Match::new(move |_, _, path| *path == target)
    }

    /// Direct children of the node at `parent`.
    pub fn child_of(parent: Path) -> Self {
        Match::new(move |_, _, path| parent.is_parent(path))
    }

    pub fn and(self, other: Match) -> Self {
        Match::new(move |editor, node, path| self.test(editor, node, path) && other.test(editor, node, path))
    }

    pub fn or(self, other: Match) -> Self {
        Match::new(move |editor, node, path| self.test(editor, node, path) || other.test(editor, node, path))
    }

    pub fn test(&self, editor: &Editor, node: &Node, path: &Path) -> bool {
        (self.0)(editor, node, path)
    }
}

impl fmt::Debug for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Match(..)")
    }
}

/// Which matches along one branch a query reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    All,
    Highest,
    Lowest,
}

/// Step size for cursor movement and deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    /// One position in the tree; may stop on inline boundaries.
    Offset,
    /// One grapheme cluster.
    #[default]
    Character,
    Word,
    Line,
    Block,
}

impl std::str::FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "offset" => Ok(Unit::Offset),
            "character" | "char" => Ok(Unit::Character),
            "word" => Ok(Unit::Word),
            "line" => Ok(Unit::Line),
            "block" => Ok(Unit::Block),
            other => Err(format!("unknown unit `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub at: Option<Location>,
    /// Explicit `(from, to)` path span for node traversal; overrides `at`.
    pub span: Option<(Path, Path)>,
    pub matches: Option<Match>,
    pub mode: Option<Mode>,
    pub voids: bool,
    pub hanging: bool,
    pub split: bool,
    pub always: bool,
    pub select: Option<bool>,
    pub reverse: bool,
    pub height: usize,
    pub unit: Option<Unit>,
    pub distance: Option<usize>,
    pub edge: Option<SelectionEdge>,
    pub ignore_non_selectable: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, at: impl Into<Location>) -> Self {
        self.at = Some(at.into());
        self
    }

    pub fn span(mut self, from: Path, to: Path) -> Self {
        self.span = Some((from, to));
        self
    }

    pub fn matching(mut self, matches: Match) -> Self {
        self.matches = Some(matches);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn voids(mut self, voids: bool) -> Self {
        self.voids = voids;
        self
    }

    pub fn hanging(mut self, hanging: bool) -> Self {
        self.hanging = hanging;
        self
    }

    pub fn split(mut self, split: bool) -> Self {
        self.split = split;
        self
    }

    pub fn always(mut self, always: bool) -> Self {
        self.always = always;
        self
    }

    pub fn select(mut self, select: bool) -> Self {
        self.select = Some(select);
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn height(mut self, height: usize) -> Self {
        self.height = height;
        self
    }

    pub fn unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn distance(mut self, distance: usize) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn edge(mut self, edge: SelectionEdge) -> Self {
        self.edge = Some(edge);
        self
    }

    pub fn ignore_non_selectable(mut self, ignore: bool) -> Self {
        self.ignore_non_selectable = ignore;
        self
    }

    pub(crate) fn mode_or(&self, default: Mode) -> Mode {
        self.mode.unwrap_or(default)
    }

    pub(crate) fn unit_or_default(&self) -> Unit {
        self.unit.unwrap_or_default()
    }

    pub(crate) fn distance_or_default(&self) -> usize {
        self.distance.unwrap_or(1)
    }
}
