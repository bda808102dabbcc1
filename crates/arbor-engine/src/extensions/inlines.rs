//! Inline elements: links, editable buttons and read-only badges.
//!
//! Typing or pasting a URL wraps it in a link. With a collapsed cursor the
//! link is inserted with the URL as its text and the cursor placed just after
//! it; with an expanded selection the selected text becomes the link.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::editor::Editor;
use crate::error::Result;
use crate::hooks::{DataTransfer, Extension, Next};
use crate::location::{Point, SelectionEdge};
use crate::node::{Element, Node};
use crate::options::{Match, Options, Unit};

pub const LINK: &str = "link";
pub const BUTTON: &str = "button";
pub const BADGE: &str = "badge";

static URL_REGEX: OnceLock<Regex> = OnceLock::new();

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| {
        Regex::new(r"^(?:\w+:)?//([^\s.]+\.\S{2}|localhost[:?\d]*)\S*$").expect("URL regex is valid")
    })
}

/// Protocol-relative or absolute URL with a dotted host, or localhost.
pub fn is_url(text: &str) -> bool {
    url_regex().is_match(text)
}

pub struct Inlines;

impl Extension for Inlines {
    fn name(&self) -> &'static str {
        "inlines"
    }

    fn insert_text(&self, editor: &mut Editor, text: &str, next: Next<'_>) -> Result<()> {
        if !text.is_empty() && is_url(text) {
            return wrap_link(editor, text);
        }
        next.insert_text(editor, text)
    }

    fn insert_data(&self, editor: &mut Editor, data: &DataTransfer, next: Next<'_>) -> Result<()> {
        if let Some(text) = data.text()
            && is_url(text)
        {
            return wrap_link(editor, text);
        }
        next.insert_data(editor, data)
    }

    fn is_inline(&self, editor: &Editor, element: &Element, next: Next<'_>) -> bool {
        matches!(element.kind.as_str(), LINK | BUTTON | BADGE) || next.is_inline(editor, element)
    }

    fn is_element_read_only(&self, editor: &Editor, element: &Element, next: Next<'_>) -> bool {
        element.kind == BADGE || next.is_element_read_only(editor, element)
    }

    fn is_selectable(&self, editor: &Editor, element: &Element, next: Next<'_>) -> bool {
        element.kind != BADGE && next.is_selectable(editor, element)
    }
}

fn is_active(editor: &Editor, kind: &str) -> Result<bool> {
    if editor.selection().is_none() {
        return Ok(false);
    }
    Ok(editor.find(&Options::new().matching(Match::kind(kind)))?.is_some())
}

pub fn is_link_active(editor: &Editor) -> Result<bool> {
    is_active(editor, LINK)
}

pub fn is_button_active(editor: &Editor) -> Result<bool> {
    is_active(editor, BUTTON)
}

pub fn unwrap_link(editor: &mut Editor) -> Result<()> {
    editor.unwrap_nodes(&Options::new().matching(Match::kind(LINK)))
}

pub fn unwrap_button(editor: &mut Editor) -> Result<()> {
    editor.unwrap_nodes(&Options::new().matching(Match::kind(BUTTON)))
}

/// Link the selection to `url`. Does nothing without a selection.
pub fn insert_link(editor: &mut Editor, url: &str) -> Result<()> {
    if editor.selection().is_some() {
        wrap_link(editor, url)?;
    }
    Ok(())
}

pub fn insert_button(editor: &mut Editor) -> Result<()> {
    if editor.selection().is_some() {
        wrap_button(editor)?;
    }
    Ok(())
}

pub fn wrap_link(editor: &mut Editor, url: &str) -> Result<()> {
    let link = Element::new(LINK).with_prop("url", url);
    wrap_inline(editor, link, url, is_link_active, unwrap_link)
}

pub fn wrap_button(editor: &mut Editor) -> Result<()> {
    wrap_inline(editor, Element::new(BUTTON), "Edit me!", is_button_active, unwrap_button)
}

fn wrap_inline(
    editor: &mut Editor,
    element: Element,
    placeholder: &str,
    is_active: fn(&Editor) -> Result<bool>,
    unwrap: fn(&mut Editor) -> Result<()>,
) -> Result<()> {
    editor.without_normalizing(|editor| {
        if is_active(editor)? {
            unwrap(editor)?;
        }
        let Some(selection) = editor.selection().cloned() else {
            return Ok(());
        };

        if selection.is_expanded() {
            debug!("wrapping {selection} in `{}`", element.kind);
            editor.wrap_nodes(element, &Options::new().split(true))?;
            return editor.collapse(SelectionEdge::End);
        }

        let kind = element.kind.clone();
        let node = Node::Element(element.with_children(vec![Node::text(placeholder)]));
        editor.insert_nodes(vec![node], &Options::new())?;

        let Some((_, inline)) = editor.above(&Options::new().matching(Match::kind(kind)))? else {
            return Ok(());
        };
        let after = inline.next()?;
        if !editor.node(&after).is_ok_and(Node::is_text) {
            editor.insert_nodes(vec![Node::text("")], &Options::new().at(after.clone()))?;
        }
        editor.select(Point::new(after, 0))
    })
}

/// Move the cursor one character, so it can step out of an inline whose
/// edge it sits on.
pub fn step_cursor(editor: &mut Editor, reverse: bool) -> Result<()> {
    if editor.selection().is_some_and(|selection| selection.is_collapsed()) {
        editor.move_selection(&Options::new().unit(Unit::Offset).reverse(reverse))?;
    }
    Ok(())
}
