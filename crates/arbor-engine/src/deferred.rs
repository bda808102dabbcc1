//! Follow-up work scheduled after the current synchronous turn.
//!
//! Input methods may report text they have already committed natively as
//! pending diffs instead of individual `insert_text` calls. Handlers that need
//! to inspect those diffs [`defer`](Editor::defer) a task; deferred tasks run
//! in order at [`end_turn`](Editor::end_turn), after the mutation of the
//! current event has completed, and may decide to flush the diffs through the
//! hook chain.

use log::debug;

use crate::editor::Editor;
use crate::error::Result;
use crate::location::{Path, Point, Range, RangeAffinity};
use crate::operation::Operation;
use crate::patch::Patch;

pub type Task = Box<dyn FnOnce(&mut Editor) -> Result<()>>;

/// Replacement of the characters `start..end` of a leaf by `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDiff {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDiff {
    pub path: Path,
    pub diff: TextDiff,
}

impl Editor {
    pub fn defer(&mut self, task: impl FnOnce(&mut Editor) -> Result<()> + 'static) {
        self.deferred.push_back(Box::new(task));
    }

    /// Run deferred tasks, including any they schedule, then flush.
    pub fn end_turn(&mut self) -> Result<Patch> {
        while let Some(task) = self.deferred.pop_front() {
            task(self)?;
        }
        Ok(self.flush())
    }

    pub fn queue_diff(&mut self, path: Path, diff: TextDiff) {
        self.pending_diffs.push(PendingDiff { path, diff });
    }

    pub fn pending_diffs(&self) -> &[PendingDiff] {
        &self.pending_diffs
    }

    /// Apply every pending diff through `insert_text`, so extensions see them.
    pub fn flush_pending_diffs(&mut self) -> Result<()> {
        let diffs = std::mem::take(&mut self.pending_diffs);
        debug!("flushing {} pending diffs", diffs.len());
        for PendingDiff { path, diff } in diffs {
            let range = Range::new(
                Point::new(path.clone(), diff.start),
                Point::new(path, diff.end),
            );
            self.select(range)?;
            self.insert_text(&diff.text)?;
        }
        Ok(())
    }

    pub(crate) fn transform_pending_diffs(&mut self, op: &Operation) {
        if self.pending_diffs.is_empty() || op.is_selection() {
            return;
        }
        self.pending_diffs = std::mem::take(&mut self.pending_diffs)
            .into_iter()
            .filter_map(|PendingDiff { path, diff }| {
                let range = Range::new(
                    Point::new(path.clone(), diff.start),
                    Point::new(path, diff.end),
                );
                let range = range.transform(op, RangeAffinity::Inward)?;
                let (start, end) = range.edges();
                (start.path == end.path).then(|| PendingDiff {
                    path: start.path,
                    diff: TextDiff {
                        start: start.offset,
                        end: end.offset,
                        text: diff.text,
                    },
                })
            })
            .collect();
    }
}
