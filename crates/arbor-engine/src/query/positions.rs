//! Cursor positions a unit apart.
//!
//! Distances are measured over the text of each block, so a word or
//! character that spans several leaves (say a bold run followed by plain
//! text) is still stepped over in one go.

use std::collections::VecDeque;

use unicode_segmentation::UnicodeSegmentation;

use crate::editor::Editor;
use crate::error::Result;
use crate::location::{Location, Path, Point, Range};
use crate::node::{char_len, slice_chars};
use crate::options::{Options, Unit};
use crate::query::Nodes;

/// Lazily yields the positions inside a range, one unit apart.
pub struct Positions<'a> {
    editor: &'a Editor,
    nodes: Nodes<'a>,
    unit: Unit,
    reverse: bool,
    voids: bool,
    start: Point,
    end: Point,
    first: Point,
    block_text: String,
    is_new_block: bool,
    distance: usize,
    buffer: VecDeque<Point>,
}

impl Editor {
    /// Positions within `options.at` (default: the selection), stepping by
    /// `options.unit` (default: offset).
    pub fn positions(&self, options: &Options) -> Result<Positions<'_>> {
        let at = self
            .resolve_at(options)
            .unwrap_or_else(|| Location::Path(Path::root()));
        let range = self.range(&at)?;
        let (start, end) = range.edges();
        let first = if options.reverse { end.clone() } else { start.clone() };
        let nodes = self.nodes(
            &Options::new()
                .at(at)
                .reverse(options.reverse)
                .voids(options.voids)
                .ignore_non_selectable(options.ignore_non_selectable),
        )?;

        Ok(Positions {
            editor: self,
            nodes,
            unit: options.unit.unwrap_or(Unit::Offset),
            reverse: options.reverse,
            voids: options.voids,
            start,
            end,
            first,
            block_text: String::new(),
            is_new_block: false,
            distance: 0,
            buffer: VecDeque::new(),
        })
    }

    /// The point `options.distance` units before `at`, if the document has one.
    pub fn before(&self, at: &Location, options: &Options) -> Result<Option<Point>> {
        let anchor = self.document_start()?;
        let focus = self.start(at)?;
        let mut options = options.clone();
        options.at = Some(Range::new(anchor, focus).into());
        options.reverse = true;
        self.nth_position(&options)
    }

    /// The point `options.distance` units after `at`, if the document has one.
    pub fn after(&self, at: &Location, options: &Options) -> Result<Option<Point>> {
        let anchor = self.end(at)?;
        let focus = self.document_end()?;
        let mut options = options.clone();
        options.at = Some(Range::new(anchor, focus).into());
        options.reverse = false;
        self.nth_position(&options)
    }

    fn nth_position(&self, options: &Options) -> Result<Option<Point>> {
        let distance = options.distance_or_default();
        let mut target = None;
        for (steps, point) in self.positions(options)?.enumerate() {
            if steps > distance {
                break;
            }
            if steps != 0 {
                target = Some(point);
            }
        }
        Ok(target)
    }
}

impl Positions<'_> {
    fn visit_element(&mut self, node: &crate::node::Node, path: &Path) {
        let Some(element) = node.as_element() else {
            return;
        };
        if path.is_empty() {
            return;
        }
        let editor = self.editor;

        if !editor.is_selectable(element) {
            let neighbour = if self.reverse {
                path.previous()
                    .ok()
                    .and_then(|previous| editor.end(&previous.into()).ok())
            } else {
                path.next()
                    .ok()
                    .and_then(|next| editor.start(&next.into()).ok())
            };
            self.buffer.extend(neighbour);
            return;
        }

        if !self.voids && (editor.is_void(element) || editor.is_element_read_only(element)) {
            if let Ok(start) = editor.start(&path.clone().into()) {
                self.buffer.push_back(start);
            }
            return;
        }

        if editor.is_inline(element) {
            return;
        }

        if editor.has_inlines(element) {
            let e = if path.is_ancestor(&self.end.path) {
                Ok(self.end.clone())
            } else {
                editor.end(&path.clone().into())
            };
            let s = if path.is_ancestor(&self.start.path) {
                Ok(self.start.clone())
            } else {
                editor.start(&path.clone().into())
            };
            if let (Ok(s), Ok(e)) = (s, e) {
                self.block_text = editor
                    .string(&Range::new(s, e).into(), self.voids)
                    .unwrap_or_default();
                self.is_new_block = true;
            }
        }
    }

    fn visit_text(&mut self, len: usize, path: &Path) {
        let is_first = *path == self.first.path;
        let (mut remaining, mut offset) = if is_first {
            let remaining = if self.reverse {
                self.first.offset
            } else {
                len.saturating_sub(self.first.offset)
            };
            (remaining as isize, self.first.offset as isize)
        } else {
            (len as isize, if self.reverse { len as isize } else { 0 })
        };

        if is_first || self.is_new_block || self.unit == Unit::Offset {
            self.buffer.push_back(Point::new(path.clone(), offset as usize));
            self.is_new_block = false;
        }

        loop {
            if self.distance == 0 {
                if self.block_text.is_empty() {
                    break;
                }
                self.distance = unit_distance(&self.block_text, self.unit, self.reverse);
                self.block_text = remainder(&self.block_text, self.distance, self.reverse);
            }

            let step = self.distance as isize;
            offset = if self.reverse { offset - step } else { offset + step };
            remaining -= step;

            if remaining < 0 {
                self.distance = (-remaining) as usize;
                break;
            }

            self.distance = 0;
            self.buffer.push_back(Point::new(path.clone(), offset as usize));
        }
    }
}

impl Iterator for Positions<'_> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        loop {
            if let Some(point) = self.buffer.pop_front() {
                return Some(point);
            }
            let (node, path) = self.nodes.next()?;
            match node.as_text() {
                Some(text) => self.visit_text(text.len(), &path),
                None => self.visit_element(node, &path),
            }
        }
    }
}

fn unit_distance(text: &str, unit: Unit, reverse: bool) -> usize {
    match unit {
        Unit::Character => character_distance(text, reverse),
        Unit::Word => word_distance(text, reverse),
        Unit::Line | Unit::Block => char_len(text),
        Unit::Offset => 1,
    }
}

/// What is left of `text` once `distance` characters are taken from the
/// front (or the back, in reverse).
fn remainder(text: &str, distance: usize, reverse: bool) -> String {
    let len = char_len(text);
    if reverse {
        slice_chars(text, 0, len.saturating_sub(distance)).to_string()
    } else {
        slice_chars(text, distance, len).to_string()
    }
}

/// Length in characters of the grapheme cluster at the front (or back).
pub(crate) fn character_distance(text: &str, reverse: bool) -> usize {
    let grapheme = if reverse {
        text.graphemes(true).next_back()
    } else {
        text.graphemes(true).next()
    };
    grapheme.map(char_len).unwrap_or(0)
}

/// Distance to the far edge of the next word, including leading whitespace
/// and punctuation.
pub(crate) fn word_distance(text: &str, reverse: bool) -> usize {
    let mut distance = 0;
    let mut started = false;
    let mut rest = text.to_string();

    while !rest.is_empty() {
        let step = character_distance(&rest, reverse);
        let len = char_len(&rest);
        let grapheme = if reverse {
            slice_chars(&rest, len - step, len)
        } else {
            slice_chars(&rest, 0, step)
        };

        if is_word_character(grapheme) {
            started = true;
            distance += step;
        } else if !started {
            distance += step;
        } else {
            break;
        }
        rest = remainder(&rest, step, reverse);
    }
    distance
}

fn is_word_character(grapheme: &str) -> bool {
    grapheme
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '\'')
}
