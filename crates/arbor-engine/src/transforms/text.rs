use log::trace;
use serde_json::Value;

use crate::editor::Editor;
use crate::error::Result;
use crate::location::{Affinity, Location, Path, Point, Range};
use crate::node::{Node, Props, slice_chars};
use crate::operation::Operation;
use crate::options::{Match, Mode, Options};
use crate::refs::PathRef;

impl Editor {
    /// Delete content at `options.at` or the selection.
    ///
    /// A point deletes `distance` units of `unit` forwards (or backwards with
    /// `reverse`); a point inside a void removes the whole void. A range
    /// removes everything it covers and merges the blocks at its edges when it
    /// spans more than one.
    pub fn delete(&mut self, options: &Options) -> Result<()> {
        self.without_normalizing(|editor| {
            let Some(mut at) = editor.resolve_at(options) else {
                return Ok(());
            };
            let voids = options.voids;
            let mut hanging = options.hanging;

            if let Location::Range(range) = &at {
                editor.check_range(range)?;
            }
            if let Location::Range(range) = &at
                && range.is_collapsed()
            {
                at = Location::Point(range.anchor.clone());
            }

            if let Location::Point(point) = &at {
                let furthest_void = editor
                    .void(&Options::new().at(point.clone()).mode(Mode::Highest))?
                    .map(|(_, path)| path);
                match furthest_void {
                    Some(void_path) if !voids => at = Location::Path(void_path),
                    _ => {
                        let step = Options::new()
                            .unit(options.unit_or_default())
                            .distance(options.distance_or_default());
                        let here = Location::Point(point.clone());
                        let target = if options.reverse {
                            match editor.before(&here, &step)? {
                                Some(point) => point,
                                None => editor.document_start()?,
                            }
                        } else {
                            match editor.after(&here, &step)? {
                                Some(point) => point,
                                None => editor.document_end()?,
                            }
                        };
                        at = Location::Range(Range::new(point.clone(), target));
                        hanging = true;
                    }
                }
            }

            let range = match at {
                Location::Path(path) => {
                    return editor.remove_nodes(&Options::new().at(path).voids(voids));
                }
                Location::Range(range) => range,
                Location::Point(_) => return Ok(()),
            };
            if range.is_collapsed() {
                return Ok(());
            }

            let range = if hanging || range.end() == editor.document_end()? {
                range
            } else {
                editor.unhang_range(&range, voids)?
            };
            editor.delete_expanded(range, voids, options)
        })
    }

    fn delete_expanded(&mut self, range: Range, voids: bool, options: &Options) -> Result<()> {
        let (mut start, mut end) = range.edges();
        let start_block = self.block_path_above(&start, voids)?;
        let end_block = self.block_path_above(&end, voids)?;
        let across_blocks = matches!((&start_block, &end_block), (Some(a), Some(b)) if a != b);
        let single_text = start.path == end.path;

        let start_locked = !voids && self.is_non_editable_at(&start)?;
        let end_locked = !voids && self.is_non_editable_at(&end)?;
        if start_locked
            && let Some(before) = self.before(&Location::Point(start.clone()), &Options::new())?
            && start_block.as_ref().is_some_and(|block| block.is_ancestor(&before.path))
        {
            start = before;
        }
        if end_locked
            && let Some(after) = self.after(&Location::Point(end.clone()), &Options::new())?
            && end_block.as_ref().is_some_and(|block| block.is_ancestor(&after.path))
        {
            end = after;
        }

        let mut covered: Vec<Path> = Vec::new();
        for (node, path) in self.nodes(&Options::new().at(range).voids(voids))? {
            if covered.last().is_some_and(|last| path.compare(last).is_eq()) {
                continue;
            }
            let locked = !voids
                && node
                    .as_element()
                    .is_some_and(|element| self.is_void(element) || self.is_element_read_only(element));
            if locked || (!path.is_common(&start.path) && !path.is_common(&end.path)) {
                covered.push(path);
            }
        }
        let covered_refs: Vec<PathRef> = covered
            .into_iter()
            .map(|path| self.path_ref(path, Some(Affinity::Forward)))
            .collect();
        let start_ref = self.point_ref(start.clone(), Some(Affinity::Forward));
        let end_ref = self.point_ref(end.clone(), Some(Affinity::Forward));

        if !single_text
            && !start_locked
            && let Some(point) = start_ref.current(self)
        {
            let text = self.leaf(&Location::Point(point.clone()))?.0.text.clone();
            let tail = slice_chars(&text, start.offset, usize::MAX).to_string();
            if !tail.is_empty() {
                self.apply(Operation::RemoveText {
                    path: point.path,
                    offset: start.offset,
                    text: tail,
                })?;
            }
        }

        for path_ref in covered_refs.into_iter().rev() {
            if let Some(path) = path_ref.unref(self) {
                self.remove_nodes(&Options::new().at(path).voids(voids))?;
            }
        }

        if !end_locked && let Some(point) = end_ref.current(self) {
            let text = self.leaf(&Location::Point(point.clone()))?.0.text.clone();
            let offset = if single_text { start.offset } else { 0 };
            let head = slice_chars(&text, offset, end.offset).to_string();
            if !head.is_empty() {
                self.apply(Operation::RemoveText {
                    path: point.path,
                    offset,
                    text: head,
                })?;
            }
        }

        if !single_text
            && across_blocks
            && start_ref.current(self).is_some()
            && let Some(point) = end_ref.current(self)
        {
            self.merge_nodes(&Options::new().at(point).hanging(true).voids(voids))?;
        }

        let start = start_ref.unref(self);
        let end = end_ref.unref(self);
        let point = if options.reverse { start.or(end) } else { end.or(start) };
        if options.at.is_none()
            && let Some(point) = point
        {
            self.select(point)?;
        }
        Ok(())
    }

    fn block_path_above(&self, point: &Point, voids: bool) -> Result<Option<Path>> {
        Ok(self
            .above(
                &Options::new()
                    .at(point.clone())
                    .matching(Match::block())
                    .voids(voids),
            )?
            .map(|(_, path)| path))
    }

    fn is_non_editable_at(&self, point: &Point) -> Result<bool> {
        let at = Options::new().at(point.clone()).mode(Mode::Highest);
        Ok(self.void(&at)?.is_some() || self.element_read_only(&at)?.is_some())
    }

    /// Delete a range for a transform that continues at a point.
    ///
    /// Collapsed ranges yield their anchor. Otherwise the content is deleted
    /// and the tracked end of the range comes back, or `None` if it did not
    /// survive.
    pub(crate) fn delete_range(&mut self, range: Range) -> Result<Option<Point>> {
        if range.is_collapsed() {
            return Ok(Some(range.anchor));
        }
        let end_ref = self.point_ref(range.end(), Some(Affinity::Forward));
        self.delete(&Options::new().at(range))?;
        Ok(end_ref.unref(self))
    }

    /// Delete the selected content, if the selection is expanded.
    pub fn delete_fragment(&mut self, reverse: bool) -> Result<()> {
        if self.selection.as_ref().is_some_and(Range::is_expanded) {
            self.delete(&Options::new().reverse(reverse))?;
        }
        Ok(())
    }

    /// Insert `text` at a point, replacing the covered content first when the
    /// target is an expanded range. Text never goes into voids (unless
    /// `voids` is set) or read-only elements.
    pub fn insert_text_with(&mut self, text: &str, options: &Options) -> Result<()> {
        self.without_normalizing(|editor| {
            let voids = options.voids;
            let at = match options.at.clone() {
                Some(at) => at,
                None => editor.default_insert_location(),
            };
            let at = match at {
                Location::Path(path) => Location::Range(editor.range(&Location::Path(path))?),
                other => other,
            };

            let point = match at {
                Location::Point(point) => point,
                Location::Range(range) if range.is_collapsed() => range.anchor,
                Location::Range(range) => {
                    editor.check_range(&range)?;
                    let end = range.end();
                    if !voids && editor.void(&Options::new().at(end.clone()))?.is_some() {
                        return Ok(());
                    }
                    let start_ref = editor.point_ref(range.start(), Some(Affinity::Forward));
                    let end_ref = editor.point_ref(end, Some(Affinity::Forward));
                    editor.delete(&Options::new().at(range).voids(voids))?;
                    let start = start_ref.unref(editor);
                    let end = end_ref.unref(editor);
                    let Some(point) = start.or(end) else {
                        return Ok(());
                    };
                    editor.set_selection(Range::collapsed(point.clone()))?;
                    point
                }
                Location::Path(_) => return Ok(()),
            };

            let here = Options::new().at(point.clone());
            if (!voids && editor.void(&here)?.is_some()) || editor.element_read_only(&here)?.is_some() {
                trace!("skipping text insertion into non-editable content at {point}");
                return Ok(());
            }
            editor.check_point(&point)?;
            if !text.is_empty() {
                editor.apply(Operation::InsertText {
                    path: point.path,
                    offset: point.offset,
                    text: text.to_string(),
                })?;
            }
            Ok(())
        })
    }

    /// Apply a mark to the selected text, or queue it for the next insertion
    /// when the selection is collapsed.
    pub fn add_mark(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let Some(selection) = &self.selection else {
            return Ok(());
        };
        let value = value.into();
        if selection.is_expanded() {
            let props = Props::from([(key.to_string(), value)]);
            return self.set_nodes(props, &markable_text());
        }
        let mut marks = self.marks()?.unwrap_or_default();
        marks.insert(key.to_string(), value);
        self.marks = Some(marks);
        Ok(())
    }

    pub fn remove_mark(&mut self, key: &str) -> Result<()> {
        let Some(selection) = &self.selection else {
            return Ok(());
        };
        if selection.is_expanded() {
            return self.unset_nodes(&[key], &markable_text());
        }
        let mut marks = self.marks()?.unwrap_or_default();
        marks.remove(key);
        self.marks = Some(marks);
        Ok(())
    }
}

/// Texts outside voids, split at the selection edges.
fn markable_text() -> Options {
    Options::new()
        .matching(Match::new(|editor: &Editor, node: &Node, path: &Path| {
            node.is_text()
                && editor
                    .parent(path)
                    .is_ok_and(|(parent, _)| parent.as_element().is_none_or(|element| !editor.is_void(element)))
        }))
        .split(true)
        .voids(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::node::Text;
    use crate::options::Unit;
    use crate::schema::Schema;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn paragraph(text: &str) -> Node {
        Node::element("paragraph", vec![Node::text(text)])
    }

    fn editor(children: Vec<Node>) -> Editor {
        Editor::with_schema(
            children,
            Schema::default()
                .with_inline(["link", "badge"])
                .with_void(["image"])
                .with_read_only(["badge"]),
        )
    }

    #[test]
    fn test_delete_rejects_range_past_text_end() {
        let mut editor = editor(vec![paragraph("abc")]);
        let past_end = Range::new(Point::new([0, 0], 1), Point::new([0, 0], 9));

        let result = editor.delete(&Options::new().at(past_end));

        assert!(matches!(result, Err(EngineError::InvalidLocation { .. })));
        assert_eq!(editor.children(), &[paragraph("abc")]);
        assert_eq!(editor.version(), 0);
    }

    #[test]
    fn test_insert_text_rejects_range_past_text_end() {
        let mut editor = editor(vec![paragraph("abc")]);
        let past_end = Range::new(Point::new([0, 0], 1), Point::new([0, 0], 9));

        let result = editor.insert_text_with("Z", &Options::new().at(past_end));

        assert!(matches!(result, Err(EngineError::InvalidLocation { .. })));
        assert_eq!(editor.children(), &[paragraph("abc")]);
        assert_eq!(editor.version(), 0);
    }

    #[test]
    fn test_delete_character_backward() {
        let mut editor = editor(vec![paragraph("word")]);
        editor.select(Point::new([0, 0], 4)).unwrap();
        editor.delete(&Options::new().reverse(true)).unwrap();
        assert_eq!(editor.children(), &[paragraph("wor")]);
        assert_eq!(editor.selection(), Some(&Range::collapsed(Point::new([0, 0], 3))));
    }

    #[test]
    fn test_delete_word_forward() {
        let mut editor = editor(vec![paragraph("one two")]);
        editor.select(Point::new([0, 0], 0)).unwrap();
        editor.delete(&Options::new().unit(Unit::Word)).unwrap();
        assert_eq!(editor.children(), &[paragraph(" two")]);
    }

    #[test]
    fn test_delete_across_blocks_merges_them() {
        let mut editor = editor(vec![paragraph("hello"), paragraph("world")]);
        editor
            .select(Range::new(Point::new([0, 0], 2), Point::new([1, 0], 3)))
            .unwrap();
        editor.delete(&Options::new()).unwrap();
        assert_eq!(editor.children(), &[paragraph("held")]);
        assert_eq!(editor.selection(), Some(&Range::collapsed(Point::new([0, 0], 2))));
    }

    #[test]
    fn test_backspace_at_block_start_joins_previous() {
        let mut editor = editor(vec![paragraph("one"), paragraph("two")]);
        editor.select(Point::new([1, 0], 0)).unwrap();
        editor.delete(&Options::new().reverse(true)).unwrap();
        assert_eq!(editor.children(), &[paragraph("onetwo")]);
        assert_eq!(editor.selection(), Some(&Range::collapsed(Point::new([0, 0], 3))));
    }

    #[test]
    fn test_delete_at_document_start_is_noop() {
        let mut editor = editor(vec![paragraph("one")]);
        editor.select(Point::new([0, 0], 0)).unwrap();
        editor.delete(&Options::new().reverse(true)).unwrap();
        assert_eq!(editor.children(), &[paragraph("one")]);
    }

    #[test]
    fn test_delete_inside_void_removes_it() {
        let mut editor = editor(vec![
            paragraph("a"),
            Node::element("image", vec![Node::text("")]),
            paragraph("b"),
        ]);
        editor
            .delete(&Options::new().at(Point::new([1, 0], 0)))
            .unwrap();
        assert_eq!(editor.children(), &[paragraph("a"), paragraph("b")]);
    }

    #[test]
    fn test_insert_text_replaces_expanded_selection() {
        let mut editor = editor(vec![paragraph("hello world")]);
        editor
            .select(Range::new(Point::new([0, 0], 6), Point::new([0, 0], 11)))
            .unwrap();
        editor.insert_text_with("there", &Options::new()).unwrap();
        assert_eq!(editor.children(), &[paragraph("hello there")]);
        assert_eq!(editor.selection(), Some(&Range::collapsed(Point::new([0, 0], 11))));
    }

    #[test]
    fn test_insert_text_skips_read_only_inline() {
        let mut editor = editor(vec![Node::element(
            "paragraph",
            vec![
                Node::text(""),
                Node::element("badge", vec![Node::text("new")]),
                Node::text(""),
            ],
        )]);
        editor
            .insert_text_with("x", &Options::new().at(Point::new([0, 1, 0], 1)))
            .unwrap();
        assert_eq!(editor.root().string(), "new");
    }

    #[test]
    fn test_add_mark_on_expanded_selection_splits_text() {
        let mut editor = editor(vec![paragraph("bold move")]);
        editor
            .select(Range::new(Point::new([0, 0], 0), Point::new([0, 0], 4)))
            .unwrap();
        editor.add_mark("bold", true).unwrap();
        assert_eq!(
            editor.children(),
            &[Node::element(
                "paragraph",
                vec![Node::Text(Text::new("bold").with_mark("bold", true)), Node::text(" move")]
            )]
        );

        editor.remove_mark("bold").unwrap();
        assert_eq!(editor.children(), &[paragraph("bold move")]);
    }

    #[test]
    fn test_add_mark_on_collapsed_selection_queues_it() {
        let mut editor = editor(vec![paragraph("ab")]);
        editor.select(Point::new([0, 0], 1)).unwrap();
        editor.add_mark("italic", true).unwrap();
        assert_eq!(editor.pending_marks(), Some(&Props::from([("italic".to_string(), json!(true))])));
        assert_eq!(editor.children(), &[paragraph("ab")]);
    }
}
