use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::location::Affinity;
use crate::operation::Operation;

/// Child indices leading from the root to a node.
///
/// The empty path addresses the root itself. Paths order the way the document
/// reads: an ancestor compares equal to its descendants, siblings compare by
/// index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn new(indices: Vec<usize>) -> Self {
        Path(indices)
    }

    pub fn child(&self, index: usize) -> Path {
        let mut indices = self.0.clone();
        indices.push(index);
        Path(indices)
    }

    pub fn concat(&self, tail: &[usize]) -> Path {
        let mut indices = self.0.clone();
        indices.extend_from_slice(tail);
        Path(indices)
    }

    pub fn slice(&self, len: usize) -> Path {
        Path(self.0[..len.min(self.0.len())].to_vec())
    }

    pub fn last_index(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn parent(&self) -> Result<Path> {
        if self.0.is_empty() {
            return Err(EngineError::invalid_location(self, "the root has no parent"));
        }
        Ok(Path(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn next(&self) -> Result<Path> {
        let mut indices = self.0.clone();
        match indices.last_mut() {
            Some(last) => {
                *last += 1;
                Ok(Path(indices))
            }
            None => Err(EngineError::invalid_location(self, "the root has no siblings")),
        }
    }

    pub fn previous(&self) -> Result<Path> {
        let mut indices = self.0.clone();
        match indices.last_mut() {
            Some(last) if *last > 0 => {
                *last -= 1;
                Ok(Path(indices))
            }
            _ => Err(EngineError::invalid_location(self, "no previous sibling")),
        }
    }

    pub fn has_previous(&self) -> bool {
        self.0.last().is_some_and(|&last| last > 0)
    }

    /// Every ancestor from the root down, excluding `self`.
    pub fn ancestors(&self) -> Vec<Path> {
        (0..self.0.len()).map(|len| self.slice(len)).collect()
    }

    /// Every ancestor from the root down, including `self`.
    pub fn levels(&self) -> Vec<Path> {
        (0..=self.0.len()).map(|len| self.slice(len)).collect()
    }

    /// Longest shared prefix.
    pub fn common(&self, other: &Path) -> Path {
        let len = self
            .0
            .iter()
            .zip(other.0.iter())
            .take_while(|(a, b)| a == b)
            .count();
        self.slice(len)
    }

    /// Compare up to the shorter length, so ancestors equal their descendants.
    pub fn compare(&self, other: &Path) -> Ordering {
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }

    pub fn is_before(&self, other: &Path) -> bool {
        self.compare(other) == Ordering::Less
    }

    pub fn is_after(&self, other: &Path) -> bool {
        self.compare(other) == Ordering::Greater
    }

    pub fn is_ancestor(&self, other: &Path) -> bool {
        self.0.len() < other.0.len() && self.compare(other) == Ordering::Equal
    }

    pub fn is_descendant(&self, other: &Path) -> bool {
        other.is_ancestor(self)
    }

    pub fn is_parent(&self, other: &Path) -> bool {
        self.0.len() + 1 == other.0.len() && self.compare(other) == Ordering::Equal
    }

    pub fn is_child(&self, other: &Path) -> bool {
        other.is_parent(self)
    }

    /// `self` equals `other` or is one of its ancestors.
    pub fn is_common(&self, other: &Path) -> bool {
        self.0.len() <= other.0.len() && self.compare(other) == Ordering::Equal
    }

    pub fn is_sibling(&self, other: &Path) -> bool {
        if self.0.is_empty() || self.0.len() != other.0.len() {
            return false;
        }
        let depth = self.0.len() - 1;
        self.0[..depth] == other.0[..depth] && self.0[depth] != other.0[depth]
    }

    /// Same parent prefix at `self`'s depth and a smaller final index there.
    pub fn ends_before(&self, other: &Path) -> bool {
        match self.0.len().checked_sub(1) {
            Some(depth) if other.0.len() > depth => {
                self.0[..depth] == other.0[..depth] && self.0[depth] < other.0[depth]
            }
            _ => false,
        }
    }

    pub fn ends_after(&self, other: &Path) -> bool {
        match self.0.len().checked_sub(1) {
            Some(depth) if other.0.len() > depth => {
                self.0[..depth] == other.0[..depth] && self.0[depth] > other.0[depth]
            }
            _ => false,
        }
    }

    pub fn ends_at(&self, other: &Path) -> bool {
        match self.0.len().checked_sub(1) {
            Some(depth) if other.0.len() > depth => self.0[..=depth] == other.0[..=depth],
            _ => false,
        }
    }

    /// Where this path points after `op` has been applied, or `None` when the
    /// addressed node was removed.
    pub fn transform(&self, op: &Operation, affinity: Option<Affinity>) -> Option<Path> {
        let mut p = self.0.clone();
        if p.is_empty() {
            return Some(self.clone());
        }

        match op {
            Operation::InsertNode { path: op_path, .. } => {
                if op_path == self || op_path.ends_before(self) || op_path.is_ancestor(self) {
                    p[op_path.len() - 1] += 1;
                }
            }
            Operation::RemoveNode { path: op_path, .. } => {
                if op_path == self || op_path.is_ancestor(self) {
                    return None;
                }
                if op_path.ends_before(self) {
                    p[op_path.len() - 1] -= 1;
                }
            }
            Operation::MergeNode {
                path: op_path,
                position,
                ..
            } => {
                if op_path == self || op_path.ends_before(self) {
                    p[op_path.len() - 1] -= 1;
                } else if op_path.is_ancestor(self) {
                    p[op_path.len() - 1] -= 1;
                    p[op_path.len()] += position;
                }
            }
            Operation::SplitNode {
                path: op_path,
                position,
                ..
            } => {
                if op_path == self {
                    match affinity {
                        Some(Affinity::Forward) => {
                            let last = p.len() - 1;
                            p[last] += 1;
                        }
                        Some(Affinity::Backward) => {}
                        None => return None,
                    }
                } else if op_path.ends_before(self) {
                    p[op_path.len() - 1] += 1;
                } else if op_path.is_ancestor(self) && self.0[op_path.len()] >= *position {
                    p[op_path.len() - 1] += 1;
                    p[op_path.len()] -= position;
                }
            }
            Operation::MoveNode {
                path: op_path,
                new_path,
            } => {
                if op_path == new_path {
                    return Some(self.clone());
                }

                if op_path.is_ancestor(self) || op_path == self {
                    let mut copy = new_path.0.clone();
                    if op_path.ends_before(new_path) && op_path.len() < new_path.len() {
                        copy[op_path.len() - 1] -= 1;
                    }
                    copy.extend_from_slice(&self.0[op_path.len()..]);
                    return Some(Path(copy));
                } else if op_path.is_sibling(new_path)
                    && (new_path.is_ancestor(self) || new_path == self)
                {
                    if op_path.ends_before(self) {
                        p[op_path.len() - 1] -= 1;
                    } else {
                        p[op_path.len() - 1] += 1;
                    }
                } else if new_path.ends_before(self) || new_path == self || new_path.is_ancestor(self)
                {
                    if op_path.ends_before(self) {
                        p[op_path.len() - 1] -= 1;
                    }
                    p[new_path.len() - 1] += 1;
                } else if op_path.ends_before(self) {
                    if new_path == self {
                        p[new_path.len() - 1] += 1;
                    }
                    p[op_path.len() - 1] -= 1;
                }
            }
            Operation::InsertText { .. }
            | Operation::RemoveText { .. }
            | Operation::SetNode { .. }
            | Operation::SetSelection { .. } => {}
        }

        Some(Path(p))
    }
}

impl Deref for Path {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Path(indices)
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(indices: [usize; N]) -> Self {
        Path(indices.to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(usize::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl FromStr for Path {
    type Err = EngineError;

    /// Parse dotted notation such as `1.0`; an empty string is the root.
    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Path::root());
        }
        s.trim()
            .split('.')
            .map(|part| {
                part.parse::<usize>()
                    .map_err(|_| EngineError::invalid_location(s, "path segments must be integers"))
            })
            .collect::<Result<Vec<_>>>()
            .map(Path)
    }
}
