use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::location::{Affinity, Path, Point};
use crate::operation::Operation;

/// An anchor/focus pair. The anchor is where a selection started, so a range
/// can run backwards through the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub anchor: Point,
    pub focus: Point,
}

/// How the two ends of a range react to edits landing exactly on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeAffinity {
    /// Both ends lean towards the inside, so the range does not grow.
    #[default]
    Inward,
    /// Both ends lean away from each other, so the range absorbs insertions.
    Outward,
    Forward,
    Backward,
}

impl Range {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_expanded(&self) -> bool {
        !self.is_collapsed()
    }

    pub fn is_backward(&self) -> bool {
        self.anchor.is_after(&self.focus)
    }

    pub fn is_forward(&self) -> bool {
        !self.is_backward()
    }

    /// `(start, end)` in document order.
    pub fn edges(&self) -> (Point, Point) {
        if self.is_backward() {
            (self.focus.clone(), self.anchor.clone())
        } else {
            (self.anchor.clone(), self.focus.clone())
        }
    }

    pub fn start(&self) -> Point {
        self.edges().0
    }

    pub fn end(&self) -> Point {
        self.edges().1
    }

    pub fn includes_point(&self, point: &Point) -> bool {
        let (start, end) = self.edges();
        point.compare(&start) != Ordering::Less && point.compare(&end) != Ordering::Greater
    }

    /// True when `path` overlaps the span between the edges, ancestors included.
    pub fn includes_path(&self, path: &Path) -> bool {
        let (start, end) = self.edges();
        path.compare(&start.path) != Ordering::Less && path.compare(&end.path) != Ordering::Greater
    }

    /// True when both edges sit inside the same leaf.
    pub fn is_within_leaf(&self) -> bool {
        self.anchor.path == self.focus.path
    }

    pub fn intersection(&self, other: &Range) -> Option<Range> {
        let (s1, e1) = self.edges();
        let (s2, e2) = other.edges();
        let start = if s1.is_before(&s2) { s2 } else { s1 };
        let end = if e1.is_before(&e2) { e1 } else { e2 };
        if end.is_before(&start) {
            None
        } else {
            Some(Range::new(start, end))
        }
    }

    /// Both points transformed through `op`; `None` if either end was removed.
    pub fn transform(&self, op: &Operation, affinity: RangeAffinity) -> Option<Range> {
        let (anchor_affinity, focus_affinity) = match affinity {
            RangeAffinity::Inward => {
                if self.is_forward() {
                    let anchor = Affinity::Forward;
                    let focus = if self.is_collapsed() { anchor } else { Affinity::Backward };
                    (anchor, focus)
                } else {
                    let anchor = Affinity::Backward;
                    let focus = if self.is_collapsed() { anchor } else { Affinity::Forward };
                    (anchor, focus)
                }
            }
            RangeAffinity::Outward => {
                if self.is_forward() {
                    (Affinity::Backward, Affinity::Forward)
                } else {
                    (Affinity::Forward, Affinity::Backward)
                }
            }
            RangeAffinity::Forward => (Affinity::Forward, Affinity::Forward),
            RangeAffinity::Backward => (Affinity::Backward, Affinity::Backward),
        };

        let anchor = self.anchor.transform(op, Some(anchor_affinity))?;
        let focus = self.focus.transform(op, Some(focus_affinity))?;
        Some(Range { anchor, focus })
    }
}

impl From<Point> for Range {
    fn from(point: Point) -> Self {
        Range::collapsed(point)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_collapsed() {
            write!(f, "{}", self.anchor)
        } else {
            write!(f, "{}..{}", self.anchor, self.focus)
        }
    }
}
