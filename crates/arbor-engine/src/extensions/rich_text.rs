//! Rich text formatting: mark toggles bound to hotkeys, and block toggles for
//! headings, quotes, lists and alignment.

use serde_json::Value;

use crate::editor::Editor;
use crate::error::Result;
use crate::hooks::Extension;
use crate::location::Location;
use crate::node::{Element, Props, TYPE_KEY};
use crate::options::{Match, Options};
use crate::schema::{ContentRule, Schema};

pub const HOTKEYS: &[(&str, &str)] = &[
    ("mod+b", "bold"),
    ("mod+i", "italic"),
    ("mod+u", "underline"),
    ("mod+`", "code"),
];

pub const LIST_TYPES: &[&str] = &["numbered-list", "bulleted-list"];
pub const TEXT_ALIGN_TYPES: &[&str] = &["left", "center", "right", "justify"];

const ALIGN_KEY: &str = "align";

/// The mark a key chord toggles. `mod` matches `ctrl`, `cmd` and `meta`.
pub fn mark_for_hotkey(hotkey: &str) -> Option<&'static str> {
    let normalized = hotkey.to_ascii_lowercase();
    let (modifier, key) = normalized.split_once('+')?;
    if !matches!(modifier, "mod" | "ctrl" | "cmd" | "meta") {
        return None;
    }
    HOTKEYS
        .iter()
        .find(|(chord, _)| chord.strip_prefix("mod+") == Some(key))
        .map(|(_, mark)| *mark)
}

/// Which block property a format is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockAttr {
    Type,
    Align,
}

impl BlockAttr {
    pub fn for_format(format: &str) -> Self {
        if TEXT_ALIGN_TYPES.contains(&format) {
            BlockAttr::Align
        } else {
            BlockAttr::Type
        }
    }

    fn key(self) -> &'static str {
        match self {
            BlockAttr::Type => TYPE_KEY,
            BlockAttr::Align => ALIGN_KEY,
        }
    }
}

pub fn is_mark_active(editor: &Editor, format: &str) -> Result<bool> {
    Ok(editor
        .marks()?
        .is_some_and(|marks| marks.get(format) == Some(&Value::Bool(true))))
}

pub fn toggle_mark(editor: &mut Editor, format: &str) -> Result<()> {
    if is_mark_active(editor, format)? {
        editor.remove_mark(format)
    } else {
        editor.add_mark(format, true)
    }
}

/// True when a block in the selection carries `format` in `attr`.
pub fn is_block_active(editor: &Editor, format: &str, attr: BlockAttr) -> Result<bool> {
    let Some(range) = editor.unhung_selection()? else {
        return Ok(false);
    };
    let found = editor.find(
        &Options::new()
            .at(Location::Range(range))
            .matching(Match::prop(attr.key(), format)),
    )?;
    Ok(found.is_some())
}

/// Switch the selected blocks to `format`, or back to paragraphs when they
/// already have it. List formats wrap the blocks as list items; alignments
/// only set or clear the `align` property.
pub fn toggle_block(editor: &mut Editor, format: &str) -> Result<()> {
    let attr = BlockAttr::for_format(format);
    let active = is_block_active(editor, format, attr)?;
    let is_list = LIST_TYPES.contains(&format);

    editor.without_normalizing(|editor| {
        if attr == BlockAttr::Type {
            editor.unwrap_nodes(&Options::new().matching(Match::kinds(LIST_TYPES)).split(true))?;
        }

        let value = match attr {
            BlockAttr::Align if active => Value::Null,
            BlockAttr::Align => Value::from(format),
            BlockAttr::Type if active => Value::from("paragraph"),
            BlockAttr::Type if is_list => Value::from("list-item"),
            BlockAttr::Type => Value::from(format),
        };
        editor.set_nodes(Props::from([(attr.key().to_string(), value)]), &Options::new())?;

        if !active && is_list {
            editor.wrap_nodes(Element::new(format), &Options::new())?;
        }
        Ok(())
    })
}

pub struct RichText;

impl Extension for RichText {
    fn name(&self) -> &'static str {
        "rich-text"
    }

    fn configure(&self, schema: &mut Schema) {
        for list in LIST_TYPES {
            schema.set_content(*list, ContentRule::blocks());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::Fixture;
    use crate::location::{Path, Point, Range};
    use crate::node::Node;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn editor() -> Editor {
        let mut editor = Fixture::RichText.editor().unwrap();
        editor.install(RichText);
        editor
    }

    #[rstest]
    #[case("mod+b", Some("bold"))]
    #[case("Ctrl+I", Some("italic"))]
    #[case("cmd+`", Some("code"))]
    #[case("meta+u", Some("underline"))]
    #[case("alt+b", None)]
    #[case("mod+k", None)]
    fn test_mark_for_hotkey(#[case] hotkey: &str, #[case] expected: Option<&str>) {
        assert_eq!(mark_for_hotkey(hotkey), expected);
    }

    #[test]
    fn test_toggle_mark_on_selection() {
        let mut editor = editor();
        editor
            .select(Range::new(Point::new([0, 0], 0), Point::new([0, 0], 4)))
            .unwrap();

        toggle_mark(&mut editor, "bold").unwrap();
        assert!(is_mark_active(&editor, "bold").unwrap());
        assert_eq!(editor.node(&Path::from([0, 0])).unwrap(), &Node::Text(crate::node::Text::new("This").with_mark("bold", true)));

        toggle_mark(&mut editor, "bold").unwrap();
        assert!(!is_mark_active(&editor, "bold").unwrap());
        assert_eq!(editor.node(&Path::from([0, 0])).unwrap().string(), "This is editable ");
    }

    #[test]
    fn test_toggle_mark_collapsed_queues_pending_marks() {
        let mut editor = editor();
        editor.select(Point::new([3, 0], 3)).unwrap();
        toggle_mark(&mut editor, "italic").unwrap();
        assert!(is_mark_active(&editor, "italic").unwrap());
        editor.insert_text("!").unwrap();
        assert_eq!(
            editor.node(&Path::from([3, 1])).unwrap(),
            &Node::Text(crate::node::Text::new("!").with_mark("italic", true))
        );
    }

    #[test]
    fn test_toggle_heading_and_back() {
        let mut editor = editor();
        editor.select(Point::new([1, 0], 5)).unwrap();

        toggle_block(&mut editor, "heading-one").unwrap();
        assert!(editor.node(&Path::from([1])).unwrap().is_kind("heading-one"));
        assert!(is_block_active(&editor, "heading-one", BlockAttr::Type).unwrap());

        toggle_block(&mut editor, "heading-one").unwrap();
        assert!(editor.node(&Path::from([1])).unwrap().is_kind("paragraph"));
    }

    #[test]
    fn test_toggle_list_wraps_and_unwraps() {
        let mut editor = editor();
        editor
            .select(Range::new(Point::new([0, 0], 2), Point::new([1, 0], 2)))
            .unwrap();

        toggle_block(&mut editor, "bulleted-list").unwrap();
        let list = editor.node(&Path::from([0])).unwrap();
        assert!(list.is_kind("bulleted-list"));
        assert_eq!(list.children().len(), 2);
        assert!(list.children().iter().all(|item| item.is_kind("list-item")));

        toggle_block(&mut editor, "bulleted-list").unwrap();
        assert!(editor.node(&Path::from([0])).unwrap().is_kind("paragraph"));
        assert!(editor.node(&Path::from([1])).unwrap().is_kind("paragraph"));
        assert_eq!(editor.children().len(), 4);
    }

    #[test]
    fn test_switch_between_list_types() {
        let mut editor = editor();
        editor.select(Point::new([2, 0], 0)).unwrap();
        toggle_block(&mut editor, "numbered-list").unwrap();
        toggle_block(&mut editor, "bulleted-list").unwrap();

        let list = editor.node(&Path::from([2])).unwrap();
        assert!(list.is_kind("bulleted-list"));
        assert_eq!(list.children().len(), 1);
    }

    #[test]
    fn test_toggle_alignment() {
        let mut editor = editor();
        editor.select(Point::new([3, 0], 0)).unwrap();
        assert!(is_block_active(&editor, "center", BlockAttr::Type).is_ok_and(|active| !active));
        assert!(is_block_active(&editor, "center", BlockAttr::Align).unwrap());

        toggle_block(&mut editor, "center").unwrap();
        assert_eq!(editor.node(&Path::from([3])).unwrap().prop("align"), None);

        toggle_block(&mut editor, "right").unwrap();
        assert_eq!(editor.node(&Path::from([3])).unwrap().prop("align"), Some(Value::from("right")));
        assert!(editor.node(&Path::from([3])).unwrap().is_kind("paragraph"));
    }
}
