//! Addressing into the document tree.
//!
//! A [`Path`] names a node, a [`Point`] names a position inside a text leaf and a
//! [`Range`] is an anchor/focus pair of points. All three transform through
//! [`Operation`](crate::operation::Operation)s so that locations captured before
//! an edit stay meaningful after it.

mod path;
mod point;
mod range;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use path::Path;
pub use point::Point;
pub use range::{Range, RangeAffinity};

/// Which side a location sticks to when an edit lands exactly on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Affinity {
    Forward,
    Backward,
}

/// One end of a node or range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Edge {
    #[default]
    Start,
    End,
}

/// One end of a selection, named by role or by document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionEdge {
    #[default]
    Anchor,
    Focus,
    Start,
    End,
}

/// Anything a query or transform can target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    Path(Path),
    Point(Point),
    Range(Range),
}

impl Location {
    pub fn as_range(&self) -> Option<&Range> {
        match self {
            Location::Range(range) => Some(range),
            _ => None,
        }
    }
}

impl From<Path> for Location {
    fn from(path: Path) -> Self {
        Location::Path(path)
    }
}

impl From<Point> for Location {
    fn from(point: Point) -> Self {
        Location::Point(point)
    }
}

impl From<Range> for Location {
    fn from(range: Range) -> Self {
        Location::Range(range)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Path(path) => write!(f, "[{path}]"),
            Location::Point(point) => write!(f, "{point}"),
            Location::Range(range) => write!(f, "{range}"),
        }
    }
}
