//! # Query Engine
//!
//! Read-only lookups over the editor's tree: resolving locations to paths
//! and points, ancestor and sibling searches, string extraction and the
//! generalized [`Editor::nodes`] traversal the rest of the engine builds on.
//! Nothing here mutates the tree or the selection.

mod nodes;
mod positions;

use std::cmp::Ordering;

use crate::editor::Editor;
use crate::error::{EngineError, Result};
use crate::location::{Edge, Location, Path, Point, Range};
use crate::node::{Element, Node, Props, Text, slice_chars};
use crate::options::{Match, Mode, Options};

pub use nodes::{Nodes, Walk};
pub use positions::Positions;

impl Editor {
    pub fn node(&self, path: &Path) -> Result<&Node> {
        self.root.get(path)
    }

    pub fn has_node(&self, path: &Path) -> bool {
        self.root.has(path)
    }

    /// The node at a location, with its path.
    pub fn entry(&self, at: &Location) -> Result<(&Node, Path)> {
        let path = self.path(at, None)?;
        Ok((self.root.get(&path)?, path))
    }

    pub fn parent(&self, path: &Path) -> Result<(&Node, Path)> {
        let parent = path.parent()?;
        Ok((self.root.get(&parent)?, parent))
    }

    pub fn leaf(&self, at: &Location) -> Result<(&Text, Path)> {
        let path = self.path(at, None)?;
        Ok((self.root.leaf(&path)?, path))
    }

    /// First leaf (or empty element) under a location.
    pub fn first(&self, at: &Location) -> Result<(&Node, Path)> {
        let path = self.path(at, Some(Edge::Start))?;
        Ok((self.root.get(&path)?, path))
    }

    pub fn last(&self, at: &Location) -> Result<(&Node, Path)> {
        let path = self.path(at, Some(Edge::End))?;
        Ok((self.root.get(&path)?, path))
    }

    /// Resolve a location to a path. With an edge, paths descend to their
    /// first or last leaf and ranges pick that end; without one a range
    /// resolves to the common ancestor of its ends.
    pub fn path(&self, at: &Location, edge: Option<Edge>) -> Result<Path> {
        let path = match at {
            Location::Path(path) => match edge {
                Some(Edge::Start) => self.root.first(path)?.1,
                Some(Edge::End) => self.root.last(path)?.1,
                None => {
                    self.root.get(path)?;
                    path.clone()
                }
            },
            Location::Point(point) => point.path.clone(),
            Location::Range(range) => match edge {
                Some(Edge::Start) => range.start().path,
                Some(Edge::End) => range.end().path,
                None => range.anchor.path.common(&range.focus.path),
            },
        };
        Ok(path)
    }

    /// Resolve a location to a point, validating it against the tree.
    pub fn point(&self, at: &Location, edge: Edge) -> Result<Point> {
        match at {
            Location::Path(path) => {
                let (node, leaf_path) = match edge {
                    Edge::Start => self.root.first(path)?,
                    Edge::End => self.root.last(path)?,
                };
                let text = node.as_text().ok_or_else(|| {
                    EngineError::invalid_location(
                        at,
                        format!("no {} text node", if edge == Edge::Start { "start" } else { "end" }),
                    )
                })?;
                let offset = if edge == Edge::End { text.len() } else { 0 };
                Ok(Point::new(leaf_path, offset))
            }
            Location::Point(point) => {
                self.check_point(point)?;
                Ok(point.clone())
            }
            Location::Range(range) => {
                let point = if edge == Edge::Start { range.start() } else { range.end() };
                self.check_point(&point)?;
                Ok(point)
            }
        }
    }

    /// A point is valid when it names a text leaf and an offset within it.
    pub fn check_point(&self, point: &Point) -> Result<()> {
        let text = self.root.leaf(&point.path)?;
        if point.offset > text.len() {
            return Err(EngineError::invalid_location(
                point,
                format!("offset exceeds text length {}", text.len()),
            ));
        }
        Ok(())
    }

    pub fn check_range(&self, range: &Range) -> Result<()> {
        self.check_point(&range.anchor)?;
        self.check_point(&range.focus)
    }

    pub fn start(&self, at: &Location) -> Result<Point> {
        self.point(at, Edge::Start)
    }

    pub fn end(&self, at: &Location) -> Result<Point> {
        self.point(at, Edge::End)
    }

    /// Start and end of the whole document.
    pub fn document_start(&self) -> Result<Point> {
        self.start(&Location::Path(Path::root()))
    }

    pub fn document_end(&self) -> Result<Point> {
        self.end(&Location::Path(Path::root()))
    }

    pub fn range(&self, at: &Location) -> Result<Range> {
        match at {
            Location::Range(range) => {
                self.check_range(range)?;
                Ok(range.clone())
            }
            _ => Ok(Range::new(self.start(at)?, self.end(at)?)),
        }
    }

    /// Range from the start of `from` to the end of `to`.
    pub fn range_between(&self, from: &Location, to: &Location) -> Result<Range> {
        Ok(Range::new(self.start(from)?, self.end(to)?))
    }

    /// Text content of a location, honouring partial leaves at range edges.
    pub fn string(&self, at: &Location, voids: bool) -> Result<String> {
        let range = self.range(at)?;
        let (start, end) = range.edges();
        let mut out = String::new();
        let options = Options::new()
            .at(range)
            .matching(Match::text())
            .voids(voids);
        for (node, path) in self.nodes(&options)? {
            let Some(text) = node.as_text() else {
                continue;
            };
            let mut from = 0;
            let mut to = text.len();
            if path == end.path {
                to = end.offset;
            }
            if path == start.path {
                from = start.offset;
            }
            out.push_str(slice_chars(&text.text, from, to));
        }
        Ok(out)
    }

    /// Traverse the nodes covered by `options.at` (or `options.span`),
    /// defaulting to the selection and then to the whole document.
    ///
    /// Void and read-only elements are reported but not descended into
    /// unless `voids` is set.
    pub fn nodes(&self, options: &Options) -> Result<Nodes<'_>> {
        let (from, to) = match &options.span {
            Some((from, to)) => (from.clone(), to.clone()),
            None => {
                let at = match (&options.at, &self.selection) {
                    (Some(at), _) => at.clone(),
                    (None, Some(selection)) => Location::Range(selection.clone()),
                    (None, None) => Location::Path(Path::root()),
                };
                let first = self.path(&at, Some(Edge::Start))?;
                let last = self.path(&at, Some(Edge::End))?;
                if options.reverse { (last, first) } else { (first, last) }
            }
        };

        let voids = options.voids;
        let ignore_non_selectable = options.ignore_non_selectable;
        let walk = Walk::new(&self.root)
            .between(from, to)
            .reverse(options.reverse)
            .pass(move |node| {
                let Some(element) = node.as_element() else {
                    return false;
                };
                if element.is_root() {
                    return false;
                }
                if !voids && (self.is_void(element) || self.is_element_read_only(element)) {
                    return true;
                }
                ignore_non_selectable && !self.is_selectable(element)
            });

        Ok(Nodes::new(
            self,
            walk,
            options.matches.clone(),
            options.mode_or(Mode::All),
            ignore_non_selectable,
        ))
    }

    /// First entry of [`Editor::nodes`].
    pub fn find(&self, options: &Options) -> Result<Option<(&Node, Path)>> {
        Ok(self.nodes(options)?.next())
    }

    /// Ancestors of `at` from the root down, including the node itself.
    ///
    /// Stops below the first void or read-only element unless `voids` is set.
    pub fn levels(&self, options: &Options) -> Result<Vec<(&Node, Path)>> {
        let Some(at) = self.resolve_at(options) else {
            return Ok(Vec::new());
        };
        let path = self.path(&at, None)?;
        let mut levels = Vec::new();
        for level in path.levels() {
            let node = self.root.get(&level)?;
            if let Some(matches) = &options.matches
                && !matches.test(self, node, &level)
            {
                continue;
            }
            let stop = !options.voids
                && !level.is_empty()
                && node
                    .as_element()
                    .is_some_and(|element| self.is_void(element) || self.is_element_read_only(element));
            levels.push((node, level));
            if stop {
                break;
            }
        }
        if options.reverse {
            levels.reverse();
        }
        Ok(levels)
    }

    /// Closest matching ancestor of `at`, never the node at `at` itself.
    /// `Mode::Highest` returns the furthest one instead.
    pub fn above(&self, options: &Options) -> Result<Option<(&Node, Path)>> {
        let Some(at) = self.resolve_at(options) else {
            return Ok(None);
        };
        let path = self.path(&at, None)?;
        let reverse = options.mode_or(Mode::Lowest) == Mode::Lowest;
        let levels = self.levels(
            &Options::new()
                .at(path.clone())
                .voids(options.voids)
                .matching(options.matches.clone().unwrap_or_else(Match::any))
                .reverse(reverse),
        )?;

        for (node, level) in levels {
            if node.is_text() {
                continue;
            }
            match &at {
                Location::Range(range) => {
                    if level.is_ancestor(&range.anchor.path) && level.is_ancestor(&range.focus.path) {
                        return Ok(Some((node, level)));
                    }
                }
                _ => {
                    if level != path {
                        return Ok(Some((node, level)));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Closest block element containing `at`.
    pub fn block_above(&self, at: impl Into<Location>) -> Result<Option<(&Node, Path)>> {
        self.above(&Options::new().at(at).matching(Match::block()))
    }

    /// Furthest void ancestor of `at`.
    pub fn void(&self, options: &Options) -> Result<Option<(&Node, Path)>> {
        let mut options = options.clone();
        options.matches = Some(Match::void());
        self.above(&options)
    }

    pub fn element_read_only(&self, options: &Options) -> Result<Option<(&Node, Path)>> {
        let mut options = options.clone();
        options.matches = Some(Match::read_only());
        self.above(&options)
    }

    /// Matching node immediately before `at` in document order.
    /// Without a predicate, `at` being a path restricts the search to its siblings.
    pub fn previous(&self, options: &Options) -> Result<Option<(&Node, Path)>> {
        let Some(at) = self.resolve_at(options) else {
            return Ok(None);
        };
        if let Location::Path(path) = &at
            && path.is_empty()
        {
            return Err(EngineError::invalid_location(&at, "the root has no previous node"));
        }
        let Some(before) = self.before(&at, &Options::new().voids(options.voids))? else {
            return Ok(None);
        };
        let (_, to) = self.first(&Location::Path(Path::root()))?;
        let matches = match (&options.matches, &at) {
            (Some(matches), _) => matches.clone(),
            (None, Location::Path(path)) => Match::child_of(path.parent()?),
            (None, _) => Match::any(),
        };
        self.find(
            &Options::new()
                .span(before.path, to)
                .reverse(true)
                .matching(matches)
                .mode(options.mode_or(Mode::Lowest))
                .voids(options.voids),
        )
    }

    /// Matching node immediately after `at` in document order.
    pub fn next(&self, options: &Options) -> Result<Option<(&Node, Path)>> {
        let Some(at) = self.resolve_at(options) else {
            return Ok(None);
        };
        let Some(after) = self.after(&at, &Options::new().voids(options.voids))? else {
            return Ok(None);
        };
        let (_, to) = self.last(&Location::Path(Path::root()))?;
        let matches = match (&options.matches, &at) {
            (Some(matches), _) => matches.clone(),
            (None, Location::Path(path)) if !path.is_empty() => Match::child_of(path.parent()?),
            (None, _) => Match::any(),
        };
        self.find(
            &Options::new()
                .span(after.path, to)
                .matching(matches)
                .mode(options.mode_or(Mode::Lowest))
                .voids(options.voids),
        )
    }

    pub fn is_start(&self, point: &Point, at: &Location) -> Result<bool> {
        if point.offset != 0 {
            return Ok(false);
        }
        Ok(*point == self.start(at)?)
    }

    pub fn is_end(&self, point: &Point, at: &Location) -> Result<bool> {
        Ok(*point == self.end(at)?)
    }

    pub fn is_edge(&self, point: &Point, at: &Location) -> Result<bool> {
        Ok(self.is_start(point, at)? || self.is_end(point, at)?)
    }

    /// No children, or a single empty text in a non-void element.
    pub fn is_empty(&self, element: &Element) -> bool {
        match element.children.as_slice() {
            [] => true,
            [Node::Text(text)] => text.is_empty() && !self.is_void(element),
            _ => false,
        }
    }

    pub fn has_inlines(&self, element: &Element) -> bool {
        element
            .children
            .iter()
            .all(|child| child.is_text() || self.node_is_inline(child))
    }

    pub fn has_blocks(&self, element: &Element) -> bool {
        element
            .children
            .iter()
            .all(|child| child.as_element().is_some_and(|element| self.is_block(element)))
    }

    pub fn has_texts(&self, element: &Element) -> bool {
        element.children.iter().all(Node::is_text)
    }

    /// Retract a range that ends at offset 0 of a following block back to the
    /// end of the last non-empty text before it.
    ///
    /// Only applies when both ends sit at offset 0 and the end leaf is the
    /// first child of its parent, i.e. the end block is covered from its own
    /// start. Collapsed and mid-block ranges come back unchanged.
    pub fn unhang_range(&self, range: &Range, voids: bool) -> Result<Range> {
        let (start, mut end) = range.edges();
        if start.offset != 0 || end.offset != 0 || range.is_collapsed() || end.path.has_previous() {
            return Ok(range.clone());
        }

        let block_path = self
            .above(
                &Options::new()
                    .at(end.clone())
                    .matching(Match::block())
                    .voids(voids),
            )?
            .map(|(_, path)| path)
            .unwrap_or_default();

        let before = Range::new(start.clone(), end.clone());
        let options = Options::new()
            .at(before)
            .matching(Match::text())
            .reverse(true)
            .voids(voids);
        for (node, path) in self.nodes(&options)?.skip(1) {
            let Some(text) = node.as_text() else {
                continue;
            };
            if !text.is_empty() || path.is_before(&block_path) {
                end = Point::new(path, text.len());
                break;
            }
        }

        Ok(Range::new(start, end))
    }

    /// Marks that text typed at the selection would carry.
    ///
    /// Explicitly queued marks win. A collapsed selection at the start of a
    /// leaf borrows the marks of the previous leaf in the same block.
    pub fn marks(&self) -> Result<Option<Props>> {
        let Some(selection) = &self.selection else {
            return Ok(None);
        };
        if let Some(marks) = &self.marks {
            return Ok(Some(marks.clone()));
        }

        if selection.is_expanded() {
            let (mut anchor, focus) = selection.edges();
            if self.is_end(&anchor, &Location::Path(anchor.path.clone()))?
                && let Some(after) = self.after(&Location::Point(anchor.clone()), &Options::new())?
            {
                anchor = after;
            }
            let found = self.find(
                &Options::new()
                    .at(Range::new(anchor, focus))
                    .matching(Match::text()),
            )?;
            return Ok(Some(
                found
                    .and_then(|(node, _)| node.as_text().map(|text| text.marks.clone()))
                    .unwrap_or_default(),
            ));
        }

        let anchor = &selection.anchor;
        let mut marks = self.root.leaf(&anchor.path)?.marks.clone();
        if anchor.offset == 0 {
            let previous = self.previous(
                &Options::new()
                    .at(anchor.path.clone())
                    .matching(Match::text()),
            )?;
            let block = self.block_above(anchor.path.clone())?;
            if let (Some((prev_node, prev_path)), Some((_, block_path))) = (previous, block)
                && block_path.is_ancestor(&prev_path)
                && let Some(text) = prev_node.as_text()
            {
                marks = text.marks.clone();
            }
        }
        Ok(Some(marks))
    }

    pub(crate) fn resolve_at(&self, options: &Options) -> Option<Location> {
        options
            .at
            .clone()
            .or_else(|| self.selection.clone().map(Location::Range))
    }

    /// Compare two points in document order.
    pub fn compare_points(&self, a: &Point, b: &Point) -> Ordering {
        a.compare(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn editor() -> Editor {
        let children: Vec<Node> = serde_json::from_value(json!([
            { "type": "paragraph", "children": [
                { "text": "Here is a " },
                { "type": "link", "url": "https://x.test", "children": [{ "text": "link" }] },
                { "text": "." }
            ]},
            { "type": "quote", "children": [
                { "type": "paragraph", "children": [{ "text": "quoted" }] }
            ]},
            { "type": "paragraph", "children": [{ "text": "" }] }
        ]))
        .unwrap();
        Editor::with_schema(children, Schema::new().with_inline(["link"]))
    }

    fn paths(entries: Vec<(&Node, Path)>) -> Vec<String> {
        entries.into_iter().map(|(_, path)| path.to_string()).collect()
    }

    #[test]
    fn test_start_and_end_descend_to_text() {
        let editor = editor();
        assert_eq!(editor.start(&Path::from([1]).into()).unwrap(), Point::new([1, 0, 0], 0));
        assert_eq!(editor.end(&Path::from([0]).into()).unwrap(), Point::new([0, 2], 1));
    }

    #[test]
    fn test_invalid_point_is_rejected() {
        let editor = editor();
        let err = editor.point(&Point::new([0, 0], 99).into(), Edge::Start).unwrap_err();
        assert!(matches!(err, EngineError::InvalidLocation { .. }));
        assert!(editor.point(&Point::new([0], 0).into(), Edge::Start).is_err());
    }

    #[test]
    fn test_above_skips_the_node_itself() {
        let editor = editor();
        let (node, path) = editor
            .above(&Options::new().at(Path::from([1, 0])).matching(Match::element()))
            .unwrap()
            .unwrap();
        assert!(node.is_kind("quote"));
        assert_eq!(path, Path::from([1]));

        let highest = editor
            .above(
                &Options::new()
                    .at(Point::new([1, 0, 0], 2))
                    .matching(Match::block())
                    .mode(Mode::Highest),
            )
            .unwrap()
            .unwrap();
        assert_eq!(highest.1, Path::from([1]));
    }

    #[test]
    fn test_nodes_modes() {
        let editor = editor();
        let at = Options::new().at(Path::from([1])).matching(Match::block());
        let all: Vec<_> = editor.nodes(&at).unwrap().collect();
        assert_eq!(paths(all), vec!["1", "1.0"]);

        let lowest: Vec<_> = editor.nodes(&at.clone().mode(Mode::Lowest)).unwrap().collect();
        assert_eq!(paths(lowest), vec!["1.0"]);

        let highest: Vec<_> = editor.nodes(&at.mode(Mode::Highest)).unwrap().collect();
        assert_eq!(paths(highest), vec!["1"]);
    }

    #[test]
    fn test_nodes_defaults_to_whole_document_without_selection() {
        let editor = editor();
        let texts = editor
            .nodes(&Options::new().matching(Match::text()))
            .unwrap()
            .count();
        assert_eq!(texts, 5);
    }

    #[test]
    fn test_string_of_partial_range() {
        let editor = editor();
        let range = Range::new(Point::new([0, 0], 8), Point::new([0, 1, 0], 2));
        assert_eq!(editor.string(&range.into(), false).unwrap(), "a li");
        assert_eq!(editor.string(&Path::from([0]).into(), false).unwrap(), "Here is a link.");
    }

    #[test]
    fn test_previous_and_next_siblings() {
        let editor = editor();
        let (_, previous) = editor
            .previous(&Options::new().at(Path::from([0, 2])))
            .unwrap()
            .unwrap();
        assert_eq!(previous, Path::from([0, 1]));

        let (_, next) = editor
            .next(&Options::new().at(Path::from([0])))
            .unwrap()
            .unwrap();
        assert_eq!(next, Path::from([1]));
        assert!(editor.next(&Options::new().at(Path::from([2]))).unwrap().is_none());
    }

    #[test]
    fn test_emptiness_and_inline_content() {
        let editor = editor();
        let empty = editor.node(&Path::from([2])).unwrap().as_element().unwrap();
        let first = editor.node(&Path::from([0])).unwrap().as_element().unwrap();
        let quote = editor.node(&Path::from([1])).unwrap().as_element().unwrap();
        assert!(editor.is_empty(empty));
        assert!(!editor.is_empty(first));
        assert!(editor.has_inlines(first));
        assert!(editor.has_blocks(quote));
        assert!(!editor.has_texts(first));
    }

    #[test]
    fn test_unhang_range_retracts_end_to_previous_text() {
        let editor = editor();
        let hanging = Range::new(Point::new([1, 0, 0], 0), Point::new([2, 0], 0));
        assert_eq!(
            editor.unhang_range(&hanging, false).unwrap(),
            Range::new(Point::new([1, 0, 0], 0), Point::new([1, 0, 0], 6))
        );
    }

    #[test]
    fn test_unhang_range_leaves_collapsed_and_mid_block_ranges() {
        let editor = editor();
        let collapsed = Range::collapsed(Point::new([0, 0], 0));
        assert_eq!(editor.unhang_range(&collapsed, false).unwrap(), collapsed);

        let mid = Range::new(Point::new([0, 0], 0), Point::new([1, 0, 0], 3));
        assert_eq!(editor.unhang_range(&mid, false).unwrap(), mid);
    }

    #[test]
    fn test_marks_borrow_from_previous_leaf_at_offset_zero() {
        let children: Vec<Node> = serde_json::from_value(json!([
            { "type": "paragraph", "children": [
                { "text": "bold", "bold": true },
                { "text": "plain" }
            ]}
        ]))
        .unwrap();
        let mut editor = Editor::new(children);
        editor.select(Range::collapsed(Point::new([0, 1], 0))).unwrap();
        let marks = editor.marks().unwrap().unwrap();
        assert_eq!(marks.get("bold"), Some(&json!(true)));

        editor.select(Range::collapsed(Point::new([0, 1], 2))).unwrap();
        assert!(editor.marks().unwrap().unwrap().is_empty());
    }
}
