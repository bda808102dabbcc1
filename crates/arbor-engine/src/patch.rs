use crate::location::{Path, Range};
use crate::operation::Operation;

/// Result of an editing turn
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub operations: Vec<Operation>,
    /// Top-level blocks touched by the turn, in their final positions
    pub changed: Vec<Path>,
    pub selection: Option<Range>,
    pub version: u64,
}

impl Patch {
    pub(crate) fn new(operations: Vec<Operation>, selection: Option<Range>, version: u64) -> Self {
        let changed = changed_blocks(&operations);
        Self {
            operations,
            changed,
            selection,
            version,
        }
    }

    /// True when the turn changed nothing, not even the selection.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn changes_document(&self) -> bool {
        self.operations.iter().any(|op| !op.is_selection())
    }
}

fn changed_blocks(operations: &[Operation]) -> Vec<Path> {
    let mut changed: Vec<Path> = Vec::new();
    for op in operations {
        changed = changed
            .iter()
            .filter_map(|path| path.transform(op, None))
            .collect();

        let touched = match op {
            Operation::InsertNode { path, .. }
            | Operation::InsertText { path, .. }
            | Operation::RemoveText { path, .. }
            | Operation::SetNode { path, .. } => vec![path.clone()],
            Operation::MergeNode { path, .. } => path.previous().into_iter().collect(),
            Operation::SplitNode { path, .. } => {
                vec![path.clone(), path.next().unwrap_or_else(|_| path.clone())]
            }
            Operation::MoveNode { path, new_path } => {
                let mut touched: Vec<Path> = path.parent().into_iter().collect();
                touched.extend(path.transform(op, None));
                touched.extend(new_path.parent());
                touched
            }
            Operation::RemoveNode { path, .. } => path.parent().into_iter().collect(),
            Operation::SetSelection { .. } => Vec::new(),
        };

        for path in touched {
            let block = path.slice(1);
            if !block.is_empty() && !changed.contains(&block) {
                changed.push(block);
            }
        }
    }
    changed.sort_by(|a, b| a.compare(b));
    changed
}
