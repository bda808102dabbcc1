//! Search highlighting as a decoration: every occurrence of the search string
//! inside a text node is marked without touching the document.

use serde_json::Value;

use crate::decorate::{Decorate, DecoratedRange};
use crate::location::{Path, Point, Range};
use crate::node::{Node, Props};

pub const DEFAULT_MARK: &str = "highlight";

#[derive(Debug, Clone)]
pub struct SearchHighlighter {
    search: String,
    mark: String,
}

impl SearchHighlighter {
    pub fn new(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            mark: DEFAULT_MARK.to_string(),
        }
    }

    /// Use `mark` as the decoration key instead of `highlight`.
    pub fn with_mark(mut self, mark: impl Into<String>) -> Self {
        self.mark = mark.into();
        self
    }

    pub fn search(&self) -> &str {
        &self.search
    }
}

impl Decorate for SearchHighlighter {
    fn decorate(&self, node: &Node, path: &Path) -> Vec<DecoratedRange> {
        let Some(text) = node.as_text() else {
            return Vec::new();
        };
        if self.search.is_empty() {
            return Vec::new();
        }

        let data = Props::from([(self.mark.clone(), Value::Bool(true))]);
        let search_len = self.search.chars().count();
        text.text
            .match_indices(&self.search)
            .map(|(byte_start, _)| {
                let start = text.text[..byte_start].chars().count();
                DecoratedRange {
                    range: Range::new(
                        Point::new(path.clone(), start),
                        Point::new(path.clone(), start + search_len),
                    ),
                    data: data.clone(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorate::leaves;
    use crate::editor::Editor;
    use crate::extensions::Fixture;
    use pretty_assertions::assert_eq;

    fn offsets(ranges: &[DecoratedRange]) -> Vec<(usize, usize)> {
        ranges
            .iter()
            .map(|decoration| (decoration.range.anchor.offset, decoration.range.focus.offset))
            .collect()
    }

    #[test]
    fn test_every_occurrence_is_decorated() {
        let node = Node::text("Slide to the left. Slide to the right.");
        let ranges = SearchHighlighter::new("Slide").decorate(&node, &Path::from([0, 0]));
        assert_eq!(offsets(&ranges), vec![(0, 5), (19, 24)]);
        assert_eq!(ranges[0].data.get(DEFAULT_MARK), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_occurrences_do_not_overlap() {
        let node = Node::text("aaaa");
        let ranges = SearchHighlighter::new("aa").decorate(&node, &Path::from([0, 0]));
        assert_eq!(offsets(&ranges), vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn test_offsets_count_characters() {
        let node = Node::text("héllo wörld");
        let ranges = SearchHighlighter::new("wö").decorate(&node, &Path::from([0, 0]));
        assert_eq!(offsets(&ranges), vec![(6, 8)]);
    }

    #[test]
    fn test_empty_search_and_elements_yield_nothing() {
        let text = Node::text("anything");
        assert!(SearchHighlighter::new("").decorate(&text, &Path::from([0, 0])).is_empty());
        let element = Node::element("paragraph", vec![Node::text("anything")]);
        assert!(SearchHighlighter::new("any").decorate(&element, &Path::from([0])).is_empty());
    }

    #[test]
    fn test_fixture_decorations_and_leaves() {
        let editor = Fixture::SearchHighlighting.editor().unwrap();
        let highlighter = SearchHighlighter::new("search").with_mark("found");
        let ranges = editor.decorations(&highlighter);

        let spans: Vec<String> = ranges.iter().map(|decoration| decoration.range.to_string()).collect();
        assert_eq!(spans, vec!["0.0:35..0.0:41", "0.0:50..0.0:56", "1.0:41..1.0:47"]);
        assert_eq!(editor.decorations(&highlighter), ranges);

        let Some(Node::Text(first)) = editor.children()[0].children().first() else {
            panic!("fixture starts with text");
        };
        let split: Vec<String> = leaves(first, &Path::from([0, 0]), &ranges)
            .into_iter()
            .filter(|leaf| leaf.marks.contains_key("found"))
            .map(|leaf| leaf.text)
            .collect();
        assert_eq!(split, vec!["search", "search"]);
    }

    #[test]
    fn test_decorating_leaves_editor_unchanged() {
        let editor = Editor::new(vec![Node::element("paragraph", vec![Node::text("find me")])]);
        let before = editor.version();
        let _ = editor.decorations(&SearchHighlighter::new("me"));
        assert_eq!(editor.version(), before);
    }
}
