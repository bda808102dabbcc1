use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::location::{Affinity, Path};
use crate::operation::Operation;

/// A position inside a text leaf: the leaf's path plus a character offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: impl Into<Path>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }

    pub fn compare(&self, other: &Point) -> Ordering {
        match self.path.compare(&other.path) {
            Ordering::Equal => self.offset.cmp(&other.offset),
            unequal => unequal,
        }
    }

    pub fn is_before(&self, other: &Point) -> bool {
        self.compare(other) == Ordering::Less
    }

    pub fn is_after(&self, other: &Point) -> bool {
        self.compare(other) == Ordering::Greater
    }

    /// Where this point sits after `op`, or `None` if its leaf was removed.
    ///
    /// With `Forward` affinity a point at an insertion or split position moves
    /// along with the content that follows it.
    pub fn transform(&self, op: &Operation, affinity: Option<Affinity>) -> Option<Point> {
        let mut point = self.clone();

        match op {
            Operation::InsertNode { .. } | Operation::MoveNode { .. } => {
                point.path = self.path.transform(op, affinity)?;
            }
            Operation::InsertText { path, offset, text } => {
                if *path == self.path
                    && (*offset < self.offset
                        || (*offset == self.offset && affinity == Some(Affinity::Forward)))
                {
                    point.offset += text.chars().count();
                }
            }
            Operation::MergeNode { path, position, .. } => {
                if *path == self.path {
                    point.offset += position;
                }
                point.path = self.path.transform(op, affinity)?;
            }
            Operation::RemoveText { path, offset, text } => {
                if *path == self.path && *offset <= self.offset {
                    point.offset -= (self.offset - offset).min(text.chars().count());
                }
            }
            Operation::RemoveNode { path, .. } => {
                if *path == self.path || path.is_ancestor(&self.path) {
                    return None;
                }
                point.path = self.path.transform(op, affinity)?;
            }
            Operation::SplitNode { path, position, .. } => {
                if *path == self.path {
                    if *position == self.offset && affinity.is_none() {
                        return None;
                    }
                    if *position < self.offset
                        || (*position == self.offset && affinity == Some(Affinity::Forward))
                    {
                        point.offset -= position;
                        point.path = self.path.next().ok()?;
                    }
                } else {
                    point.path = self.path.transform(op, affinity)?;
                }
            }
            Operation::SetNode { .. } | Operation::SetSelection { .. } => {}
        }

        Some(point)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.offset)
    }
}

impl FromStr for Point {
    type Err = EngineError;

    /// Parse `path:offset`, e.g. `1.0:3`.
    fn from_str(s: &str) -> Result<Self> {
        let (path, offset) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| EngineError::invalid_location(s, "expected `path:offset`"))?;
        let offset = offset
            .parse()
            .map_err(|_| EngineError::invalid_location(s, "offset must be an integer"))?;
        Ok(Point::new(path.parse::<Path>()?, offset))
    }
}
