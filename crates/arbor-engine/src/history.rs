//! Undo and redo.
//!
//! Every top-level call that changes the document becomes one [`Batch`]:
//! the operations it applied, including the ones normalization added, plus
//! the selection on either side. Selection-only batches are not recorded.

use log::debug;

use crate::editor::Editor;
use crate::error::Result;
use crate::location::Range;
use crate::operation::Operation;

/// Batches kept on the undo stack before the oldest is dropped.
const MAX_UNDOS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub operations: Vec<Operation>,
    pub selection_before: Option<Range>,
    pub selection_after: Option<Range>,
}

#[derive(Debug, Default)]
pub(crate) struct History {
    undos: Vec<Batch>,
    redos: Vec<Batch>,
    current: Option<Batch>,
    replaying: bool,
}

impl History {
    pub(crate) fn record(&mut self, op: &Operation, selection_before: &Option<Range>) {
        if self.replaying {
            return;
        }
        self.current
            .get_or_insert_with(|| Batch {
                operations: Vec::new(),
                selection_before: selection_before.clone(),
                selection_after: None,
            })
            .operations
            .push(op.clone());
    }

    pub(crate) fn commit(&mut self, selection: Option<Range>) {
        let Some(mut batch) = self.current.take() else {
            return;
        };
        if batch.operations.iter().all(Operation::is_selection) {
            return;
        }
        batch.selection_after = selection;
        self.undos.push(batch);
        if self.undos.len() > MAX_UNDOS {
            self.undos.remove(0);
        }
        self.redos.clear();
    }
}

impl Editor {
    pub fn can_undo(&self) -> bool {
        !self.history.undos.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.history.redos.is_empty()
    }

    pub fn undos(&self) -> &[Batch] {
        &self.history.undos
    }

    /// Revert the latest batch. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(batch) = self.history.undos.pop() else {
            return Ok(false);
        };
        debug!("undo {} operations", batch.operations.len());

        let result = self.replay(|editor| {
            for op in batch.operations.iter().rev() {
                editor.apply(op.inverse()?)?;
            }
            editor.replace_selection(batch.selection_before.clone())
        });
        self.history.redos.push(batch);
        result.map(|_| true)
    }

    /// Reapply the latest undone batch.
    pub fn redo(&mut self) -> Result<bool> {
        let Some(batch) = self.history.redos.pop() else {
            return Ok(false);
        };
        debug!("redo {} operations", batch.operations.len());

        let result = self.replay(|editor| {
            for op in &batch.operations {
                editor.apply(op.clone())?;
            }
            editor.replace_selection(batch.selection_after.clone())
        });
        self.history.undos.push(batch);
        result.map(|_| true)
    }

    fn replay(&mut self, f: impl FnOnce(&mut Editor) -> Result<()>) -> Result<()> {
        self.history.replaying = true;
        let result = self.without_normalizing(f);
        self.history.replaying = false;
        result
    }
}
