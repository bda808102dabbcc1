//! Lazy document-order traversal.

use crate::editor::Editor;
use crate::location::Path;
use crate::node::Node;
use crate::options::{Match, Mode};

type Pass<'a> = Box<dyn Fn(&Node) -> bool + 'a>;

/// Pre-order walk of `root` between two paths.
///
/// Every node on the way from the root to `from` is reported, then every node
/// up to and including the ancestors of `to`. Nodes for which `pass` returns
/// true are reported but not descended into.
pub struct Walk<'a> {
    root: &'a Node,
    path: Path,
    ascended: bool,
    from: Path,
    to: Option<Path>,
    reverse: bool,
    pass: Option<Pass<'a>>,
    done: bool,
}

impl<'a> Walk<'a> {
    pub fn new(root: &'a Node) -> Self {
        Self {
            root,
            path: Path::root(),
            ascended: false,
            from: Path::root(),
            to: None,
            reverse: false,
            pass: None,
            done: false,
        }
    }

    pub fn between(mut self, from: Path, to: Path) -> Self {
        self.from = from;
        self.to = Some(to);
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub(crate) fn pass(mut self, pass: impl Fn(&Node) -> bool + 'a) -> Self {
        self.pass = Some(Box::new(pass));
        self
    }

    fn advance(&mut self, node: &Node, fresh: bool) {
        let current = &self.path;

        let descend = fresh
            && !node.children().is_empty()
            && !self.pass.as_ref().is_some_and(|pass| pass(node));
        if descend {
            let mut index = if self.reverse { node.children().len() - 1 } else { 0 };
            if current.is_ancestor(&self.from) {
                index = self.from[current.len()];
            }
            self.path = current.child(index);
            self.ascended = false;
            return;
        }

        if current.is_empty() {
            self.done = true;
            return;
        }

        if !self.reverse
            && let Ok(next) = current.next()
            && self.root.has(&next)
        {
            self.path = next;
            self.ascended = false;
            return;
        }

        if self.reverse && current.has_previous() {
            if let Ok(previous) = current.previous() {
                self.path = previous;
                self.ascended = false;
                return;
            }
        }

        match current.parent() {
            Ok(parent) => {
                self.path = parent;
                self.ascended = true;
            }
            Err(_) => self.done = true,
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = (&'a Node, Path);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            let root = self.root;
            let Ok(node) = root.get(&self.path) else {
                self.done = true;
                return None;
            };

            if let Some(to) = &self.to {
                let past = if self.reverse {
                    self.path.is_before(to)
                } else {
                    self.path.is_after(to)
                };
                if past {
                    self.done = true;
                    return None;
                }
            }

            let current = self.path.clone();
            let fresh = !self.ascended;
            self.advance(node, fresh);
            if fresh {
                return Some((node, current));
            }
        }
    }
}

/// Matching entries of a [`Walk`], filtered by [`Mode`].
///
/// `Highest` skips descendants of a reported match; `Lowest` reports only the
/// deepest match along each branch, so it runs one entry behind the walk.
pub struct Nodes<'a> {
    editor: &'a Editor,
    walk: Walk<'a>,
    matches: Option<Match>,
    mode: Mode,
    ignore_non_selectable: bool,
    hit: Option<(&'a Node, Path)>,
    finished: bool,
}

impl<'a> Nodes<'a> {
    pub(crate) fn new(
        editor: &'a Editor,
        walk: Walk<'a>,
        matches: Option<Match>,
        mode: Mode,
        ignore_non_selectable: bool,
    ) -> Self {
        Self {
            editor,
            walk,
            matches,
            mode,
            ignore_non_selectable,
            hit: None,
            finished: false,
        }
    }

    /// Paths of the remaining entries.
    pub fn paths(self) -> Vec<Path> {
        self.map(|(_, path)| path).collect()
    }
}

impl<'a> Iterator for Nodes<'a> {
    type Item = (&'a Node, Path);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        while let Some((node, path)) = self.walk.next() {
            if self.ignore_non_selectable
                && let Some(element) = node.as_element()
                && !path.is_empty()
                && !self.editor.is_selectable(element)
            {
                continue;
            }

            let is_lower = self
                .hit
                .as_ref()
                .is_some_and(|(_, hit_path)| path.compare(hit_path).is_eq());

            if self.mode == Mode::Highest && is_lower {
                continue;
            }

            let matched = self
                .matches
                .as_ref()
                .is_none_or(|matches| matches.test(self.editor, node, &path));
            if !matched {
                continue;
            }

            if self.mode == Mode::Lowest && is_lower {
                self.hit = Some((node, path));
                continue;
            }

            let emit = if self.mode == Mode::Lowest {
                self.hit.replace((node, path))
            } else {
                self.hit = Some((node, path.clone()));
                Some((node, path))
            };
            if emit.is_some() {
                return emit;
            }
        }

        self.finished = true;
        if self.mode == Mode::Lowest {
            self.hit.take()
        } else {
            None
        }
    }
}
