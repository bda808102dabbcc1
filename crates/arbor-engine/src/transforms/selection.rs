use crate::editor::Editor;
use crate::error::Result;
use crate::location::{Location, Range, SelectionEdge};
use crate::operation::Operation;
use crate::options::Options;

impl Editor {
    /// Select a location. Paths expand to the full range of the node.
    pub fn select(&mut self, target: impl Into<Location>) -> Result<()> {
        let range = self.range(&target.into())?;
        self.check_range(&range)?;
        self.replace_selection(Some(range))
    }

    /// Move the selection to `range`. Does nothing without a selection.
    pub fn set_selection(&mut self, range: Range) -> Result<()> {
        if self.selection.is_none() {
            return Ok(());
        }
        self.check_range(&range)?;
        self.replace_selection(Some(range))
    }

    pub fn deselect(&mut self) -> Result<()> {
        self.replace_selection(None)
    }

    pub(crate) fn replace_selection(&mut self, new_selection: Option<Range>) -> Result<()> {
        if self.selection == new_selection {
            return Ok(());
        }
        self.apply(Operation::SetSelection {
            selection: self.selection.clone(),
            new_selection,
        })
    }

    /// Collapse the selection onto one of its edges.
    pub fn collapse(&mut self, edge: SelectionEdge) -> Result<()> {
        let Some(selection) = &self.selection else {
            return Ok(());
        };
        let point = match edge {
            SelectionEdge::Anchor => selection.anchor.clone(),
            SelectionEdge::Focus => selection.focus.clone(),
            SelectionEdge::Start => selection.start(),
            SelectionEdge::End => selection.end(),
        };
        self.select(point)
    }

    /// Move the selection by `distance` units of `unit`.
    ///
    /// Without an edge both anchor and focus move. `Start`/`End` resolve to the
    /// anchor or focus depending on the selection's direction. An edge that
    /// cannot move further stays where it is.
    pub fn move_selection(&mut self, options: &Options) -> Result<()> {
        let Some(selection) = self.selection.clone() else {
            return Ok(());
        };
        let edge = match options.edge {
            Some(SelectionEdge::Start) if selection.is_backward() => Some(SelectionEdge::Focus),
            Some(SelectionEdge::Start) => Some(SelectionEdge::Anchor),
            Some(SelectionEdge::End) if selection.is_backward() => Some(SelectionEdge::Anchor),
            Some(SelectionEdge::End) => Some(SelectionEdge::Focus),
            other => other,
        };
        let step = Options::new()
            .unit(options.unit_or_default())
            .distance(options.distance_or_default())
            .ignore_non_selectable(true);

        let shift = |editor: &Editor, point| -> Result<Option<_>> {
            let at = Location::Point(point);
            if options.reverse {
                editor.before(&at, &step)
            } else {
                editor.after(&at, &step)
            }
        };

        let mut moved = selection.clone();
        if matches!(edge, None | Some(SelectionEdge::Anchor))
            && let Some(anchor) = shift(&*self, selection.anchor.clone())?
        {
            moved.anchor = anchor;
        }
        if matches!(edge, None | Some(SelectionEdge::Focus))
            && let Some(focus) = shift(&*self, selection.focus.clone())?
        {
            moved.focus = focus;
        }
        self.set_selection(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Point;
    use crate::node::Node;
    use crate::options::Unit;
    use crate::schema::Schema;
    use pretty_assertions::assert_eq;

    fn editor() -> Editor {
        Editor::with_schema(
            vec![Node::element(
                "paragraph",
                vec![
                    Node::text("one "),
                    Node::element("badge", vec![Node::text("new")]),
                    Node::text(" two"),
                ],
            )],
            Schema::default().with_inline(["badge"]).with_unselectable(["badge"]),
        )
    }

    #[test]
    fn test_select_path_covers_node() {
        let mut editor = editor();
        editor.select(crate::location::Path::from([0, 0])).unwrap();
        assert_eq!(
            editor.selection(),
            Some(&Range::new(Point::new([0, 0], 0), Point::new([0, 0], 4)))
        );
    }

    #[test]
    fn test_select_rejects_missing_point() {
        let mut editor = editor();
        assert!(editor.select(Point::new([0, 0], 9)).is_err());
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_collapse_to_end_of_backward_selection() {
        let mut editor = editor();
        editor
            .select(Range::new(Point::new([0, 0], 3), Point::new([0, 0], 1)))
            .unwrap();
        editor.collapse(SelectionEdge::End).unwrap();
        assert_eq!(editor.selection(), Some(&Range::collapsed(Point::new([0, 0], 3))));
    }

    #[test]
    fn test_move_word_forward() {
        let mut editor = editor();
        editor.select(Point::new([0, 0], 0)).unwrap();
        editor
            .move_selection(&Options::new().unit(Unit::Word))
            .unwrap();
        assert_eq!(editor.selection(), Some(&Range::collapsed(Point::new([0, 0], 3))));
    }

    #[test]
    fn test_move_skips_unselectable_inline() {
        let mut editor = editor();
        editor.select(Point::new([0, 0], 4)).unwrap();
        editor.move_selection(&Options::new()).unwrap();
        let selection = editor.selection().unwrap();
        assert!(selection.is_collapsed());
        assert_eq!(selection.anchor.path, crate::location::Path::from([0, 2]));
    }

    #[test]
    fn test_move_focus_only_extends() {
        let mut editor = editor();
        editor.select(Point::new([0, 0], 1)).unwrap();
        editor
            .move_selection(&Options::new().edge(SelectionEdge::Focus).distance(2))
            .unwrap();
        assert_eq!(
            editor.selection(),
            Some(&Range::new(Point::new([0, 0], 1), Point::new([0, 0], 3)))
        );
    }

    #[test]
    fn test_deselect() {
        let mut editor = editor();
        editor.select(Point::new([0, 0], 1)).unwrap();
        editor.deselect().unwrap();
        assert_eq!(editor.selection(), None);
    }
}
