//! Locations that stay valid across a sequence of operations.
//!
//! A transform that applies several operations captures the locations it
//! still needs as refs. Each applied operation transforms every live ref, and
//! a ref whose target was removed reads as `None`. Refs must be released with
//! `unref`; the slot is reused afterwards.

use crate::editor::Editor;
use crate::location::{Affinity, Path, Point, Range, RangeAffinity};
use crate::operation::Operation;

#[derive(Debug, Clone)]
enum Tracked {
    Path {
        current: Option<Path>,
        affinity: Option<Affinity>,
    },
    Point {
        current: Option<Point>,
        affinity: Option<Affinity>,
    },
    Range {
        current: Option<Range>,
        affinity: RangeAffinity,
    },
}

impl Tracked {
    fn transform(&mut self, op: &Operation) {
        match self {
            Tracked::Path { current, affinity } => {
                *current = current.as_ref().and_then(|path| path.transform(op, *affinity));
            }
            Tracked::Point { current, affinity } => {
                *current = current.as_ref().and_then(|point| point.transform(op, *affinity));
            }
            Tracked::Range { current, affinity } => {
                *current = current.as_ref().and_then(|range| range.transform(op, *affinity));
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Refs {
    slots: Vec<Option<Tracked>>,
    free: Vec<usize>,
}

impl Refs {
    fn insert(&mut self, tracked: Tracked) -> usize {
        match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(tracked);
                id
            }
            None => {
                self.slots.push(Some(tracked));
                self.slots.len() - 1
            }
        }
    }

    fn get(&self, id: usize) -> Option<&Tracked> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: usize) -> Option<&mut Tracked> {
        self.slots.get_mut(id).and_then(Option::as_mut)
    }

    fn remove(&mut self, id: usize) -> Option<Tracked> {
        let tracked = self.slots.get_mut(id).and_then(Option::take);
        if tracked.is_some() {
            self.free.push(id);
        }
        tracked
    }

    pub(crate) fn transform(&mut self, op: &Operation) {
        for tracked in self.slots.iter_mut().flatten() {
            tracked.transform(op);
        }
    }

    #[cfg(test)]
    pub(crate) fn live(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}

/// Handle to a tracked [`Path`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "refs must be released with `unref`"]
pub struct PathRef(usize);

/// Handle to a tracked [`Point`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "refs must be released with `unref`"]
pub struct PointRef(usize);

/// Handle to a tracked [`Range`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "refs must be released with `unref`"]
pub struct RangeRef(usize);

impl PathRef {
    pub fn current(&self, editor: &Editor) -> Option<Path> {
        match editor.refs.get(self.0) {
            Some(Tracked::Path { current, .. }) => current.clone(),
            _ => None,
        }
    }

    /// Point the ref somewhere else, e.g. to keep a group of moves in order.
    pub fn set(&self, editor: &mut Editor, path: Path) {
        if let Some(Tracked::Path { current, .. }) = editor.refs.get_mut(self.0) {
            *current = Some(path);
        }
    }

    pub fn unref(self, editor: &mut Editor) -> Option<Path> {
        match editor.refs.remove(self.0) {
            Some(Tracked::Path { current, .. }) => current,
            _ => None,
        }
    }
}

impl PointRef {
    pub fn current(&self, editor: &Editor) -> Option<Point> {
        match editor.refs.get(self.0) {
            Some(Tracked::Point { current, .. }) => current.clone(),
            _ => None,
        }
    }

    pub fn unref(self, editor: &mut Editor) -> Option<Point> {
        match editor.refs.remove(self.0) {
            Some(Tracked::Point { current, .. }) => current,
            _ => None,
        }
    }
}

impl RangeRef {
    pub fn current(&self, editor: &Editor) -> Option<Range> {
        match editor.refs.get(self.0) {
            Some(Tracked::Range { current, .. }) => current.clone(),
            _ => None,
        }
    }

    pub fn unref(self, editor: &mut Editor) -> Option<Range> {
        match editor.refs.remove(self.0) {
            Some(Tracked::Range { current, .. }) => current,
            _ => None,
        }
    }
}

impl Editor {
    pub fn path_ref(&mut self, path: Path, affinity: Option<Affinity>) -> PathRef {
        PathRef(self.refs.insert(Tracked::Path {
            current: Some(path),
            affinity,
        }))
    }

    pub fn point_ref(&mut self, point: Point, affinity: Option<Affinity>) -> PointRef {
        PointRef(self.refs.insert(Tracked::Point {
            current: Some(point),
            affinity,
        }))
    }

    pub fn range_ref(&mut self, range: Range, affinity: RangeAffinity) -> RangeRef {
        RangeRef(self.refs.insert(Tracked::Range {
            current: Some(range),
            affinity,
        }))
    }
}
