//! # Editor
//!
//! The [`Editor`] owns one document tree and everything that has to stay
//! consistent with it: the selection, pending cursor marks, live location
//! refs, the dirty-path set that drives normalization, undo history and the
//! installed extension chain.
//!
//! ## Mutation model
//!
//! - **Operations only**: the tree changes exclusively through [`Editor::apply`],
//!   which applies one primitive [`Operation`] and transforms the selection,
//!   refs and dirty paths through it
//! - **Batched normalization**: [`Editor::without_normalizing`] suspends the
//!   repair pass; it runs once when the outermost batch exits, on every exit
//!   path
//! - **Turns**: [`Editor::end_turn`] runs deferred follow-up tasks and drains
//!   the operations of the turn into a [`Patch`]
//!
//! ```rust
//! # use arbor_engine::{Editor, Node, Point, Range};
//! let mut editor = Editor::new(vec![Node::element("paragraph", vec![Node::text("Hi")])]);
//! editor.select(Range::collapsed(Point::new([0, 0], 2))).unwrap();
//! editor.insert_text("!").unwrap();
//! assert_eq!(editor.root().string(), "Hi!");
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use log::trace;

use crate::deferred::{PendingDiff, Task};
use crate::error::Result;
use crate::history::History;
use crate::hooks::Extension;
use crate::location::{Affinity, Path, Point, Range};
use crate::node::{Element, Node, Props};
use crate::operation::Operation;
use crate::patch::Patch;
use crate::refs::Refs;
use crate::schema::Schema;

/// Normalization passes allowed per initially dirty path before giving up.
pub const DEFAULT_ITERATIONS_PER_DIRTY_PATH: usize = 42;

pub struct Editor {
    pub(crate) root: Node,
    pub(crate) selection: Option<Range>,
    /// Marks applied to the next inserted text at a collapsed selection.
    pub(crate) marks: Option<Props>,
    pub(crate) schema: Schema,
    pub(crate) extensions: Rc<Vec<Rc<dyn Extension>>>,
    pub(crate) dirty_paths: Vec<Path>,
    /// Nesting depth of `without_normalizing` scopes.
    pub(crate) batch_depth: usize,
    pub(crate) iterations_per_dirty_path: usize,
    pub(crate) refs: Refs,
    /// Operations applied since the last flush.
    pub(crate) operations: Vec<Operation>,
    pub(crate) version: u64,
    pub(crate) history: History,
    pub(crate) deferred: VecDeque<Task>,
    pub(crate) pending_diffs: Vec<PendingDiff>,
}

impl Editor {
    pub fn new(children: Vec<Node>) -> Self {
        Self::with_schema(children, Schema::default())
    }

    pub fn with_schema(children: Vec<Node>, schema: Schema) -> Self {
        Self {
            root: Node::root(children),
            selection: None,
            marks: None,
            schema,
            extensions: Rc::new(Vec::new()),
            dirty_paths: Vec::new(),
            batch_depth: 0,
            iterations_per_dirty_path: DEFAULT_ITERATIONS_PER_DIRTY_PATH,
            refs: Refs::default(),
            operations: Vec::new(),
            version: 0,
            history: History::default(),
            deferred: VecDeque::new(),
            pending_diffs: Vec::new(),
        }
    }

    /// Load top-level blocks from the persisted JSON layout.
    pub fn from_json(json: &str) -> Result<Self> {
        let children: Vec<Node> = serde_json::from_str(json)?;
        Ok(Self::new(children))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self.children())?)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn children(&self) -> &[Node] {
        self.root.children()
    }

    pub fn selection(&self) -> Option<&Range> {
        self.selection.as_ref()
    }

    /// Marks queued for the next insertion, if any were set explicitly.
    pub fn pending_marks(&self) -> Option<&Props> {
        self.marks.as_ref()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Operations applied since the last [`Editor::flush`].
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn set_iterations_per_dirty_path(&mut self, iterations: usize) {
        self.iterations_per_dirty_path = iterations.max(1);
    }

    /// Install an extension on top of the chain. It sees every hook call
    /// before the extensions installed earlier.
    pub fn install(&mut self, extension: impl Extension + 'static) {
        extension.configure(&mut self.schema);
        log::debug!("installing extension {}", extension.name());
        Rc::make_mut(&mut self.extensions).push(Rc::new(extension));
    }

    pub fn extension_names(&self) -> Vec<&'static str> {
        self.extensions.iter().map(|extension| extension.name()).collect()
    }

    pub fn is_normalizing(&self) -> bool {
        self.batch_depth == 0
    }

    /// Apply one primitive operation.
    ///
    /// Outside a batch the tree is normalized immediately afterwards and the
    /// change is committed to history.
    pub fn apply(&mut self, op: Operation) -> Result<()> {
        trace!("apply {op:?}");
        let selection_before = self.selection.clone();

        op.apply_to(&mut self.root)?;

        self.refs.transform(&op);
        self.transform_pending_diffs(&op);
        self.update_dirty_paths(&op);
        self.transform_selection(&op);
        if op.is_selection() {
            self.marks = None;
        }

        self.history.record(&op, &selection_before);
        self.operations.push(op);
        self.version += 1;

        self.settle()
    }

    /// Run `f` with normalization suspended, then normalize once.
    ///
    /// Normalization runs even when `f` fails; the closure's error wins.
    pub fn without_normalizing<T>(
        &mut self,
        f: impl FnOnce(&mut Editor) -> Result<T>,
    ) -> Result<T> {
        self.batch_depth += 1;
        let result = f(self);
        self.batch_depth -= 1;
        let settled = self.settle();
        let value = result?;
        settled?;
        Ok(value)
    }

    fn settle(&mut self) -> Result<()> {
        if !self.is_normalizing() {
            return Ok(());
        }
        let normalized = self.normalize_dirty();
        self.history.commit(self.selection.clone());
        normalized
    }

    /// Drain the operations applied so far into a patch.
    pub fn flush(&mut self) -> Patch {
        let operations = std::mem::take(&mut self.operations);
        Patch::new(operations, self.selection.clone(), self.version)
    }

    fn transform_selection(&mut self, op: &Operation) {
        match op {
            Operation::SetSelection { new_selection, .. } => {
                self.selection = new_selection.clone();
            }
            Operation::RemoveNode { path, .. } => {
                let Some(selection) = self.selection.take() else {
                    return;
                };
                let anchor = selection
                    .anchor
                    .transform(op, Some(Affinity::Forward))
                    .or_else(|| self.nearest_text_point(path));
                let focus = selection
                    .focus
                    .transform(op, Some(Affinity::Forward))
                    .or_else(|| self.nearest_text_point(path));
                self.selection = match (anchor, focus) {
                    (Some(anchor), Some(focus)) => Some(Range { anchor, focus }),
                    _ => None,
                };
            }
            _ => {
                if let Some(selection) = &self.selection
                    && let (Some(anchor), Some(focus)) = (
                        selection.anchor.transform(op, Some(Affinity::Forward)),
                        selection.focus.transform(op, Some(Affinity::Forward)),
                    )
                {
                    self.selection = Some(Range { anchor, focus });
                }
            }
        }
    }

    /// Closest surviving text position to a removed node: the end of the
    /// previous leaf, unless the next leaf shares more ancestry.
    fn nearest_text_point(&self, removed: &Path) -> Option<Point> {
        let mut prev = None;
        let mut next = None;
        for (text, path) in self.root.texts() {
            if path.compare(removed).is_lt() {
                prev = Some((text, path));
            } else {
                next = Some(path);
                break;
            }
        }

        let prefer_next = match (&prev, &next) {
            (Some((_, prev_path)), Some(next_path)) => {
                if next_path == removed {
                    !next_path.has_previous()
                } else {
                    prev_path.common(removed).len() < next_path.common(removed).len()
                }
            }
            _ => false,
        };

        match (prev, next) {
            (Some((text, path)), _) if !prefer_next => Some(Point::new(path, text.len())),
            (_, Some(path)) => Some(Point::new(path, 0)),
            _ => None,
        }
    }

    /// Resolve an element classifier through the extension chain.
    pub fn is_inline(&self, element: &Element) -> bool {
        crate::hooks::Next::new(&self.extensions).is_inline(self, element)
    }

    pub fn is_block(&self, element: &Element) -> bool {
        !self.is_inline(element)
    }

    pub fn is_void(&self, element: &Element) -> bool {
        crate::hooks::Next::new(&self.extensions).is_void(self, element)
    }

    pub fn is_element_read_only(&self, element: &Element) -> bool {
        crate::hooks::Next::new(&self.extensions).is_element_read_only(self, element)
    }

    pub fn is_selectable(&self, element: &Element) -> bool {
        crate::hooks::Next::new(&self.extensions).is_selectable(self, element)
    }

    /// Node-level convenience: texts are never inline elements.
    pub(crate) fn node_is_inline(&self, node: &Node) -> bool {
        node.as_element().is_some_and(|element| self.is_inline(element))
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("children", &self.children())
            .field("selection", &self.selection)
            .field("marks", &self.marks)
            .field("version", &self.version)
            .field("extensions", &self.extension_names())
            .finish()
    }
}
