//! # Normalization
//!
//! Every applied operation marks the paths it may have invalidated as dirty.
//! When the outermost batch exits, the dirty paths are popped one at a time
//! and the node at each is repaired:
//!
//! - an empty element is filled according to its [`ContentRule`], or removed
//! - children of the wrong flow (blocks among inlines, or the reverse) are removed
//! - inline elements get empty text neighbours so the cursor can sit beside them
//! - adjacent texts with identical marks merge, and empty texts next to other
//!   texts disappear
//!
//! Repairs dirty further paths, so the loop runs until none are left. A tree
//! that keeps dirtying itself beyond the iteration budget is reported as a
//! [`EngineError::StructuralInvariantViolation`].

use std::collections::HashSet;

use log::debug;

use crate::editor::Editor;
use crate::error::{EngineError, Result};
use crate::location::{Affinity, Path};
use crate::node::{Element, Node};
use crate::operation::Operation;
use crate::schema::ContentRule;

enum Repair {
    Keep,
    TextBefore,
    TextAfter,
    MergeIntoPrevious { position: usize },
    RemovePrevious,
    RemoveCurrent,
}

impl Editor {
    /// Normalize the whole tree, not just the dirty paths.
    pub fn normalize(&mut self) -> Result<()> {
        let mut paths = vec![Path::root()];
        paths.extend(self.root.descendant_paths());
        self.dirty_paths = paths;
        let result = self.normalize_dirty();
        if self.is_normalizing() {
            self.history.commit(self.selection.clone());
        }
        result
    }

    pub(crate) fn normalize_dirty(&mut self) -> Result<()> {
        if !self.is_normalizing() || self.dirty_paths.is_empty() {
            return Ok(());
        }
        self.batch_depth += 1;
        let result = self.drain_dirty_paths();
        self.batch_depth -= 1;
        if result.is_err() {
            self.dirty_paths.clear();
        }
        result
    }

    fn drain_dirty_paths(&mut self) -> Result<()> {
        // Empty elements first: other repairs assume every element has a child.
        for path in self.dirty_paths.clone() {
            let empty = matches!(
                self.root.get(&path),
                Ok(Node::Element(element)) if element.children.is_empty()
            );
            if empty {
                self.normalize_node(&path)?;
            }
        }

        let budget = self.dirty_paths.len() * self.iterations_per_dirty_path;
        let mut iteration = 0;
        while let Some(path) = self.dirty_paths.pop() {
            if iteration > budget {
                return Err(EngineError::invariant(
                    &path,
                    format!("normalization did not settle after {iteration} iterations"),
                ));
            }
            if self.root.has(&path) {
                self.normalize_node(&path)?;
            }
            iteration += 1;
        }
        debug!("normalized {iteration} dirty paths");
        Ok(())
    }

    fn normalize_node(&mut self, path: &Path) -> Result<()> {
        let Node::Element(element) = self.root.get(path)? else {
            return Ok(());
        };
        if element.children.is_empty() {
            let kind = element.kind.clone();
            return self.fill_empty(path, &kind);
        }

        let should_have_inlines = self.should_have_inlines(element, path);
        let flows: Vec<bool> = element
            .children
            .iter()
            .map(|child| child.is_text() || self.node_is_inline(child))
            .collect();
        let count = flows.len();

        let mut n = 0;
        for (i, inline_flow) in flows.into_iter().enumerate() {
            if inline_flow != should_have_inlines {
                debug!("removing misplaced child {}", path.child(n));
                self.remove_at(&path.child(n))?;
                continue;
            }

            match self.repair_for(path, n, i + 1 == count)? {
                Repair::Keep => n += 1,
                Repair::TextBefore => {
                    self.insert_empty_text(path.child(n))?;
                    n += 2;
                }
                Repair::TextAfter => {
                    self.insert_empty_text(path.child(n + 1))?;
                    n += 2;
                }
                Repair::MergeIntoPrevious { position } => {
                    let properties = self.root.get(&path.child(n))?.extract_props();
                    self.apply(Operation::MergeNode {
                        path: path.child(n),
                        position,
                        properties,
                    })?;
                }
                Repair::RemovePrevious => self.remove_at(&path.child(n - 1))?,
                Repair::RemoveCurrent => self.remove_at(&path.child(n))?,
            }
        }
        Ok(())
    }

    fn repair_for(&self, parent: &Path, n: usize, is_last: bool) -> Result<Repair> {
        let children = self.root.get(parent)?.children();
        let child = children
            .get(n)
            .ok_or_else(|| EngineError::invariant(&parent.child(n), "child vanished during repair"))?;
        let prev = n.checked_sub(1).and_then(|index| children.get(index));

        Ok(match child {
            Node::Element(element) if self.is_inline(element) => match prev {
                Some(Node::Text(_)) if is_last => Repair::TextAfter,
                Some(Node::Text(_)) => Repair::Keep,
                _ => Repair::TextBefore,
            },
            Node::Element(_) => Repair::Keep,
            Node::Text(text) => match prev {
                Some(Node::Text(prev)) if prev.same_marks(text) => {
                    Repair::MergeIntoPrevious { position: prev.len() }
                }
                Some(Node::Text(prev)) if prev.is_empty() => Repair::RemovePrevious,
                Some(Node::Text(_)) if text.is_empty() => Repair::RemoveCurrent,
                _ => Repair::Keep,
            },
        })
    }

    fn should_have_inlines(&self, element: &Element, path: &Path) -> bool {
        if path.is_empty() || matches!(self.schema.content(&element.kind), ContentRule::Blocks { .. }) {
            return false;
        }
        self.is_inline(element)
            || element
                .children
                .first()
                .is_none_or(|first| first.is_text() || self.node_is_inline(first))
    }

    fn fill_empty(&mut self, path: &Path, kind: &str) -> Result<()> {
        let child = if path.is_empty() {
            let tag = self.schema.root_fill().to_string();
            debug!("document has no blocks, inserting an empty `{tag}`");
            Some(Node::element(tag, Vec::new()))
        } else {
            self.fill_for(path, kind)?
        };
        let Some(child) = child else {
            return Ok(());
        };
        self.apply(Operation::InsertNode {
            path: path.child(0),
            node: child,
        })
    }

    fn fill_for(&mut self, path: &Path, kind: &str) -> Result<Option<Node>> {
        let child = match self.schema.content(kind) {
            ContentRule::Inline => Node::text(""),
            ContentRule::Blocks { fill: Some(tag), .. } => Node::element(tag, Vec::new()),
            ContentRule::Blocks { removable: true, .. } => {
                debug!("removing empty container `{kind}` at {path}");
                self.remove_at(path)?;
                return Ok(None);
            }
            ContentRule::Blocks { .. } => {
                return Err(EngineError::invariant(
                    path,
                    format!("`{kind}` needs block children and has no fill to synthesize"),
                ));
            }
        };
        Ok(Some(child))
    }

    fn insert_empty_text(&mut self, path: Path) -> Result<()> {
        self.apply(Operation::InsertNode {
            path,
            node: Node::text(""),
        })
    }

    fn remove_at(&mut self, path: &Path) -> Result<()> {
        let node = self.root.get(path)?.clone();
        self.apply(Operation::RemoveNode {
            path: path.clone(),
            node,
        })
    }

    /// Carry the dirty set through `op` and add the paths it touched.
    pub(crate) fn update_dirty_paths(&mut self, op: &Operation) {
        let old = std::mem::take(&mut self.dirty_paths);
        let carried: Vec<Path> = if op.moves_paths() {
            old.into_iter().filter_map(|path| path.transform(op, Some(Affinity::Forward))).collect()
        } else {
            old
        };

        let mut seen = HashSet::with_capacity(carried.len());
        let mut dirty = Vec::with_capacity(carried.len());
        for path in carried.into_iter().chain(touched_paths(op)) {
            if seen.insert(path.clone()) {
                dirty.push(path);
            }
        }
        self.dirty_paths = dirty;
    }
}

/// Paths whose subtree shape `op` may have broken, as seen after it applied.
fn touched_paths(op: &Operation) -> Vec<Path> {
    match op {
        Operation::InsertText { path, .. }
        | Operation::RemoveText { path, .. }
        | Operation::SetNode { path, .. } => path.levels(),
        Operation::InsertNode { path, node } => {
            let mut paths = path.levels();
            if node.is_element() {
                paths.extend(node.descendant_paths().iter().map(|tail| path.concat(tail)));
            }
            paths
        }
        Operation::MergeNode { path, .. } => {
            let mut paths = path.ancestors();
            paths.extend(path.previous().ok());
            paths
        }
        Operation::MoveNode { path, new_path } => {
            if path == new_path {
                return Vec::new();
            }
            let old_ancestors: Vec<Path> = path
                .ancestors()
                .iter()
                .filter_map(|ancestor| ancestor.transform(op, Some(Affinity::Forward)))
                .collect();
            let new_ancestors: Vec<Path> = new_path
                .ancestors()
                .iter()
                .filter_map(|ancestor| ancestor.transform(op, Some(Affinity::Forward)))
                .collect();
            let moved = match (new_ancestors.last(), new_path.last_index()) {
                (Some(parent), Some(index)) => Some(parent.child(index)),
                _ => None,
            };
            old_ancestors.into_iter().chain(new_ancestors).chain(moved).collect()
        }
        Operation::RemoveNode { path, .. } => path.ancestors(),
        Operation::SplitNode { path, .. } => {
            let mut paths = path.levels();
            paths.extend(path.next().ok());
            paths
        }
        Operation::SetSelection { .. } => Vec::new(),
    }
}
