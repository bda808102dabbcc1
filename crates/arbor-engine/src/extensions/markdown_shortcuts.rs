//! Markdown-style block shortcuts.
//!
//! Typing a prefix such as `##` or `>` at the start of a block followed by a
//! space converts the block; backspace at the start of a converted block
//! turns it back into a paragraph.

use std::collections::BTreeMap;

use log::debug;
use serde_json::Value;

use crate::editor::Editor;
use crate::error::Result;
use crate::hooks::{Extension, Next};
use crate::location::{Location, Path, Range};
use crate::node::{Element, Props, TYPE_KEY, slice_chars};
use crate::options::{Match, Options, Unit};
use crate::schema::{ContentRule, Schema};

pub const PARAGRAPH: &str = "paragraph";
pub const LIST_ITEM: &str = "list-item";
pub const BULLETED_LIST: &str = "bulleted-list";

/// Default prefix table.
pub const SHORTCUTS: &[(&str, &str)] = &[
    ("*", LIST_ITEM),
    ("-", LIST_ITEM),
    ("+", LIST_ITEM),
    (">", "block-quote"),
    ("#", "heading-one"),
    ("##", "heading-two"),
    ("###", "heading-three"),
    ("####", "heading-four"),
    ("#####", "heading-five"),
    ("######", "heading-six"),
];

#[derive(Debug, Clone)]
pub struct MarkdownShortcuts {
    shortcuts: BTreeMap<String, String>,
}

impl Default for MarkdownShortcuts {
    fn default() -> Self {
        Self {
            shortcuts: SHORTCUTS
                .iter()
                .map(|(prefix, kind)| (prefix.to_string(), kind.to_string()))
                .collect(),
        }
    }
}

impl MarkdownShortcuts {
    /// Add to or override the default prefix table.
    pub fn with_shortcuts(mut self, shortcuts: impl IntoIterator<Item = (String, String)>) -> Self {
        self.shortcuts.extend(shortcuts);
        self
    }

    /// Block type a prefix converts to.
    pub fn shortcut(&self, prefix: &str) -> Option<&str> {
        self.shortcuts.get(prefix).map(String::as_str)
    }

    /// Inspect the pending diffs once the current event is done and, if any
    /// of them completes a shortcut, apply them through the hook chain.
    pub fn on_before_input(&self, editor: &mut Editor) {
        let shortcuts = self.clone();
        editor.defer(move |editor| {
            let mut triggered = false;
            for pending in editor.pending_diffs() {
                if shortcuts.diff_completes_shortcut(editor, &pending.path, &pending.diff.text, pending.diff.start)? {
                    triggered = true;
                    break;
                }
            }
            if triggered {
                debug!("pending input completes a markdown shortcut");
                editor.flush_pending_diffs()?;
            }
            Ok(())
        });
    }

    fn diff_completes_shortcut(&self, editor: &Editor, path: &Path, text: &str, start: usize) -> Result<bool> {
        let Some(typed) = text.strip_suffix(' ') else {
            return Ok(false);
        };
        let (leaf, _) = editor.leaf(&Location::Path(path.clone()))?;
        let prefix = format!("{}{typed}", slice_chars(&leaf.text, 0, start));
        if self.shortcut(&prefix).is_none() {
            return Ok(false);
        }
        let Some((_, block)) = editor.block_above(path.clone())? else {
            return Ok(false);
        };
        let leaf_start = editor.start(&Location::Path(path.clone()))?;
        editor.is_start(&leaf_start, &Location::Path(block))
    }

    fn type_props(kind: &str) -> Props {
        Props::from([(TYPE_KEY.to_string(), Value::from(kind))])
    }
}

impl Extension for MarkdownShortcuts {
    fn name(&self) -> &'static str {
        "markdown-shortcuts"
    }

    fn configure(&self, schema: &mut Schema) {
        schema.set_content(BULLETED_LIST, ContentRule::blocks());
    }

    fn insert_text(&self, editor: &mut Editor, text: &str, next: Next<'_>) -> Result<()> {
        let Some(typed) = text.strip_suffix(' ') else {
            return next.insert_text(editor, text);
        };
        let Some(anchor) = editor
            .selection()
            .filter(|selection| selection.is_collapsed())
            .map(|selection| selection.anchor.clone())
        else {
            return next.insert_text(editor, text);
        };

        let block = editor
            .above(&Options::new().matching(Match::block()))?
            .map(|(_, path)| path)
            .unwrap_or_else(Path::root);
        let start = editor.start(&Location::Path(block))?;
        let range = Range::new(anchor, start);
        let prefix = editor.string(&Location::Range(range.clone()), false)? + typed;

        let Some(kind) = self.shortcut(&prefix).map(str::to_string) else {
            return next.insert_text(editor, text);
        };
        debug!("markdown shortcut `{prefix}` converts block to `{kind}`");

        editor.select(range.clone())?;
        if range.is_expanded() {
            editor.delete(&Options::new())?;
        }
        editor.set_nodes(Self::type_props(&kind), &Options::new().matching(Match::block()))?;
        if kind == LIST_ITEM {
            editor.wrap_nodes(
                Element::new(BULLETED_LIST),
                &Options::new().matching(Match::kind(LIST_ITEM)),
            )?;
        }
        Ok(())
    }

    fn delete_backward(&self, editor: &mut Editor, unit: Unit, next: Next<'_>) -> Result<()> {
        let Some(anchor) = editor
            .selection()
            .filter(|selection| selection.is_collapsed())
            .map(|selection| selection.anchor.clone())
        else {
            return next.delete_backward(editor, unit);
        };

        let Some((block, path)) = editor.above(&Options::new().matching(Match::block()))? else {
            return next.delete_backward(editor, unit);
        };
        let kind = block.kind().unwrap_or_default().to_string();
        if kind == PARAGRAPH || anchor != editor.start(&Location::Path(path))? {
            return next.delete_backward(editor, unit);
        }

        debug!("backspace at start of `{kind}` restores a paragraph");
        editor.set_nodes(Self::type_props(PARAGRAPH), &Options::new())?;
        if kind == LIST_ITEM {
            editor.unwrap_nodes(&Options::new().matching(Match::kind(BULLETED_LIST)).split(true))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred::TextDiff;
    use crate::extensions::Fixture;
    use crate::location::Point;
    use crate::node::Node;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn editor(text: &str) -> Editor {
        let mut editor = Editor::new(vec![Node::element(PARAGRAPH, vec![Node::text(text)])]);
        editor.install(MarkdownShortcuts::default());
        editor
    }

    fn type_chars(editor: &mut Editor, text: &str) {
        for c in text.chars() {
            editor.insert_text(&c.to_string()).unwrap();
        }
    }

    #[rstest]
    #[case("#", "heading-one")]
    #[case("##", "heading-two")]
    #[case("######", "heading-six")]
    #[case(">", "block-quote")]
    fn test_prefix_converts_block(#[case] prefix: &str, #[case] kind: &str) {
        let mut editor = editor("");
        editor.select(Point::new([0, 0], 0)).unwrap();
        type_chars(&mut editor, prefix);
        type_chars(&mut editor, " ");

        assert_eq!(editor.children(), &[Node::element(kind, vec![Node::text("")])]);
    }

    #[test]
    fn test_unknown_prefix_is_typed() {
        let mut editor = editor("");
        editor.select(Point::new([0, 0], 0)).unwrap();
        type_chars(&mut editor, "####### ");
        assert_eq!(editor.children(), &[Node::element(PARAGRAPH, vec![Node::text("####### ")])]);
    }

    #[test]
    fn test_prefix_mid_block_is_typed() {
        let mut editor = editor("a");
        editor.select(Point::new([0, 0], 1)).unwrap();
        type_chars(&mut editor, "## ");
        assert_eq!(editor.children(), &[Node::element(PARAGRAPH, vec![Node::text("a## ")])]);
    }

    #[test]
    fn test_dash_makes_bulleted_list_and_backspace_undoes_it() {
        let mut editor = editor("item");
        editor.select(Point::new([0, 0], 0)).unwrap();
        type_chars(&mut editor, "- ");

        assert_eq!(
            editor.children(),
            &[Node::element(
                BULLETED_LIST,
                vec![Node::element(LIST_ITEM, vec![Node::text("item")])]
            )]
        );

        editor.delete_backward(Unit::Character).unwrap();
        assert_eq!(editor.children(), &[Node::element(PARAGRAPH, vec![Node::text("item")])]);
    }

    #[test]
    fn test_backspace_in_heading_restores_paragraph() {
        let mut editor = Fixture::MarkdownShortcuts.editor().unwrap();
        editor.install(MarkdownShortcuts::default());
        editor.select(Point::new([3, 0], 0)).unwrap();
        editor.delete_backward(Unit::Character).unwrap();
        assert!(editor.node(&Path::from([3])).unwrap().is_kind(PARAGRAPH));
        assert_eq!(editor.node(&Path::from([3])).unwrap().string(), "Try it out!");
    }

    #[test]
    fn test_custom_shortcut() {
        let shortcuts = MarkdownShortcuts::default().with_shortcuts([("!".to_string(), "callout".to_string())]);
        assert_eq!(shortcuts.shortcut("!"), Some("callout"));
        assert_eq!(shortcuts.shortcut("##"), Some("heading-two"));
    }

    #[test]
    fn test_deferred_input_flushes_completed_shortcut() {
        let shortcuts = MarkdownShortcuts::default();
        let mut editor = editor("##");
        editor.queue_diff(
            Path::from([0, 0]),
            TextDiff {
                start: 2,
                end: 2,
                text: " ".to_string(),
            },
        );

        shortcuts.on_before_input(&mut editor);
        editor.end_turn().unwrap();

        assert!(editor.pending_diffs().is_empty());
        assert_eq!(editor.children(), &[Node::element("heading-two", vec![Node::text("")])]);
    }

    #[test]
    fn test_deferred_input_without_shortcut_stays_pending() {
        let shortcuts = MarkdownShortcuts::default();
        let mut editor = editor("hello");
        editor.queue_diff(
            Path::from([0, 0]),
            TextDiff {
                start: 5,
                end: 5,
                text: " ".to_string(),
            },
        );

        shortcuts.on_before_input(&mut editor);
        editor.end_turn().unwrap();

        assert_eq!(editor.pending_diffs().len(), 1);
        assert_eq!(editor.root().string(), "hello");
    }
}
