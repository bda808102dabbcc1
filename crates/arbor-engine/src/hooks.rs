//! # Extension Hook Table
//!
//! Editing events and element classifiers are dispatched through a chain of
//! installed [`Extension`]s. The most recently installed extension sees an
//! event first; it may handle it completely, or hand it on by calling the
//! matching method of the [`Next`] continuation it receives. The end of the
//! chain is the engine's base behavior.
//!
//! ```rust
//! # use arbor_engine::{Editor, Extension, Next, Node, Point, Result, Unit};
//! struct NoBackspace;
//!
//! impl Extension for NoBackspace {
//!     fn name(&self) -> &'static str {
//!         "no-backspace"
//!     }
//!
//!     fn delete_backward(&self, _editor: &mut Editor, _unit: Unit, _next: Next<'_>) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let mut editor = Editor::new(vec![Node::element("paragraph", vec![Node::text("ab")])]);
//! editor.install(NoBackspace);
//! editor.select(Point::new([0, 0], 2)).unwrap();
//! editor.delete_backward(Unit::Character).unwrap();
//! assert_eq!(editor.root().string(), "ab");
//! ```

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::editor::Editor;
use crate::error::Result;
use crate::location::Range;
use crate::node::{Element, Node};
use crate::options::{Options, Unit};
use crate::schema::Schema;

pub const TEXT_PLAIN: &str = "text/plain";

/// A set of overrides layered on top of the base editing behavior.
///
/// Every hook defaults to delegating, so an extension only implements the
/// events it cares about.
pub trait Extension {
    fn name(&self) -> &'static str;

    /// Contribute classification and content rules when installed.
    fn configure(&self, _schema: &mut Schema) {}

    fn delete_backward(&self, editor: &mut Editor, unit: Unit, next: Next<'_>) -> Result<()> {
        next.delete_backward(editor, unit)
    }

    fn delete_forward(&self, editor: &mut Editor, unit: Unit, next: Next<'_>) -> Result<()> {
        next.delete_forward(editor, unit)
    }

    fn insert_break(&self, editor: &mut Editor, next: Next<'_>) -> Result<()> {
        next.insert_break(editor)
    }

    fn insert_text(&self, editor: &mut Editor, text: &str, next: Next<'_>) -> Result<()> {
        next.insert_text(editor, text)
    }

    fn insert_data(&self, editor: &mut Editor, data: &DataTransfer, next: Next<'_>) -> Result<()> {
        next.insert_data(editor, data)
    }

    fn is_inline(&self, editor: &Editor, element: &Element, next: Next<'_>) -> bool {
        next.is_inline(editor, element)
    }

    fn is_void(&self, editor: &Editor, element: &Element, next: Next<'_>) -> bool {
        next.is_void(editor, element)
    }

    fn is_element_read_only(&self, editor: &Editor, element: &Element, next: Next<'_>) -> bool {
        next.is_element_read_only(editor, element)
    }

    fn is_selectable(&self, editor: &Editor, element: &Element, next: Next<'_>) -> bool {
        next.is_selectable(editor, element)
    }
}

/// The rest of the chain below the extension currently handling an event.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a [Rc<dyn Extension>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [Rc<dyn Extension>]) -> Self {
        Self { chain }
    }

    fn split(self) -> Option<(&'a Rc<dyn Extension>, Next<'a>)> {
        self.chain
            .split_last()
            .map(|(top, rest)| (top, Next { chain: rest }))
    }

    pub fn delete_backward(self, editor: &mut Editor, unit: Unit) -> Result<()> {
        match self.split() {
            Some((top, next)) => top.delete_backward(editor, unit, next),
            None => base_delete(editor, unit, true),
        }
    }

    pub fn delete_forward(self, editor: &mut Editor, unit: Unit) -> Result<()> {
        match self.split() {
            Some((top, next)) => top.delete_forward(editor, unit, next),
            None => base_delete(editor, unit, false),
        }
    }

    pub fn insert_break(self, editor: &mut Editor) -> Result<()> {
        match self.split() {
            Some((top, next)) => top.insert_break(editor, next),
            None => editor.split_nodes(&Options::new().always(true)),
        }
    }

    pub fn insert_text(self, editor: &mut Editor, text: &str) -> Result<()> {
        match self.split() {
            Some((top, next)) => top.insert_text(editor, text, next),
            None => base_insert_text(editor, text),
        }
    }

    pub fn insert_data(self, editor: &mut Editor, data: &DataTransfer) -> Result<()> {
        match self.split() {
            Some((top, next)) => top.insert_data(editor, data, next),
            None => base_insert_data(editor, data),
        }
    }

    pub fn is_inline(self, editor: &Editor, element: &Element) -> bool {
        match self.split() {
            Some((top, next)) => top.is_inline(editor, element, next),
            None => !element.is_root() && editor.schema().is_inline(&element.kind),
        }
    }

    pub fn is_void(self, editor: &Editor, element: &Element) -> bool {
        match self.split() {
            Some((top, next)) => top.is_void(editor, element, next),
            None => editor.schema().is_void(&element.kind),
        }
    }

    pub fn is_element_read_only(self, editor: &Editor, element: &Element) -> bool {
        match self.split() {
            Some((top, next)) => top.is_element_read_only(editor, element, next),
            None => editor.schema().is_read_only(&element.kind),
        }
    }

    pub fn is_selectable(self, editor: &Editor, element: &Element) -> bool {
        match self.split() {
            Some((top, next)) => top.is_selectable(editor, element, next),
            None => editor.schema().is_selectable(&element.kind),
        }
    }
}

fn base_delete(editor: &mut Editor, unit: Unit, reverse: bool) -> Result<()> {
    match editor.selection() {
        Some(selection) if selection.is_collapsed() => {
            editor.delete(&Options::new().unit(unit).reverse(reverse))
        }
        Some(_) => editor.delete_fragment(reverse),
        None => Ok(()),
    }
}

fn base_insert_text(editor: &mut Editor, text: &str) -> Result<()> {
    if editor.selection().is_none() {
        return Ok(());
    }
    match editor.pending_marks().cloned() {
        Some(marks) => {
            let mut node = crate::node::Text::new(text);
            node.marks = marks;
            editor.insert_nodes(vec![Node::Text(node)], &Options::new())?;
        }
        None => editor.insert_text_with(text, &Options::new())?,
    }
    editor.marks = None;
    Ok(())
}

/// Plain text is inserted line by line, with a block break between lines.
fn base_insert_data(editor: &mut Editor, data: &DataTransfer) -> Result<()> {
    let Some(text) = data.text() else {
        return Ok(());
    };
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            editor.split_nodes(&Options::new().always(true))?;
        }
        editor.insert_text(line)?;
    }
    Ok(())
}

/// Clipboard or drag payload, keyed by MIME type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTransfer {
    items: BTreeMap<String, String>,
}

impl DataTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A payload carrying only plain text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new().with(TEXT_PLAIN, text)
    }

    pub fn with(mut self, mime: impl Into<String>, data: impl Into<String>) -> Self {
        self.items.insert(mime.into(), data.into());
        self
    }

    pub fn get(&self, mime: &str) -> Option<&str> {
        self.items.get(mime).map(String::as_str)
    }

    pub fn text(&self) -> Option<&str> {
        self.get(TEXT_PLAIN)
    }
}

/// Entry points for editing events. Each runs the full extension chain as one
/// batch: normalization and history see a single change.
impl Editor {
    pub fn delete_backward(&mut self, unit: Unit) -> Result<()> {
        let chain = Rc::clone(&self.extensions);
        self.without_normalizing(|editor| Next::new(&chain).delete_backward(editor, unit))
    }

    pub fn delete_forward(&mut self, unit: Unit) -> Result<()> {
        let chain = Rc::clone(&self.extensions);
        self.without_normalizing(|editor| Next::new(&chain).delete_forward(editor, unit))
    }

    pub fn insert_break(&mut self) -> Result<()> {
        let chain = Rc::clone(&self.extensions);
        self.without_normalizing(|editor| Next::new(&chain).insert_break(editor))
    }

    pub fn insert_text(&mut self, text: &str) -> Result<()> {
        let chain = Rc::clone(&self.extensions);
        self.without_normalizing(|editor| Next::new(&chain).insert_text(editor, text))
    }

    pub fn insert_data(&mut self, data: &DataTransfer) -> Result<()> {
        let chain = Rc::clone(&self.extensions);
        self.without_normalizing(|editor| Next::new(&chain).insert_data(editor, data))
    }

    /// The selection with hanging block ends retracted.
    pub fn unhung_selection(&self) -> Result<Option<Range>> {
        self.selection()
            .map(|selection| self.unhang_range(selection, false))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Point;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    struct Recorder {
        name: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
        swallow: bool,
    }

    impl Extension for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn insert_break(&self, editor: &mut Editor, next: Next<'_>) -> Result<()> {
            self.log.borrow_mut().push(self.name);
            if self.swallow {
                return Ok(());
            }
            next.insert_break(editor)
        }
    }

    struct InlineQuote;

    impl Extension for InlineQuote {
        fn name(&self) -> &'static str {
            "inline-quote"
        }

        fn is_inline(&self, editor: &Editor, element: &Element, next: Next<'_>) -> bool {
            element.kind == "quote" || next.is_inline(editor, element)
        }
    }

    fn paragraph(text: &str) -> Node {
        Node::element("paragraph", vec![Node::text(text)])
    }

    #[test]
    fn test_last_installed_runs_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut editor = Editor::new(vec![paragraph("ab")]);
        editor.install(Recorder { name: "first", log: log.clone(), swallow: false });
        editor.install(Recorder { name: "second", log: log.clone(), swallow: false });
        editor.select(Point::new([0, 0], 1)).unwrap();

        editor.insert_break().unwrap();
        assert_eq!(*log.borrow(), vec!["second", "first"]);
        assert_eq!(editor.children(), &[paragraph("a"), paragraph("b")]);
    }

    #[test]
    fn test_short_circuit_skips_base_behavior() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut editor = Editor::new(vec![paragraph("ab")]);
        editor.install(Recorder { name: "inner", log: log.clone(), swallow: false });
        editor.install(Recorder { name: "outer", log: log.clone(), swallow: true });
        editor.select(Point::new([0, 0], 1)).unwrap();

        editor.insert_break().unwrap();
        assert_eq!(*log.borrow(), vec!["outer"]);
        assert_eq!(editor.children(), &[paragraph("ab")]);
    }

    #[test]
    fn test_classifier_override_composes_with_schema() {
        let mut editor = Editor::with_schema(vec![], Schema::default().with_inline(["link"]));
        editor.install(InlineQuote);
        assert!(editor.is_inline(&Element::new("quote")));
        assert!(editor.is_inline(&Element::new("link")));
        assert!(!editor.is_inline(&Element::new("paragraph")));
        assert_eq!(editor.extension_names(), vec!["inline-quote"]);
    }

    #[test]
    fn test_insert_text_uses_pending_marks() {
        let mut editor = Editor::new(vec![paragraph("ab")]);
        editor.select(Point::new([0, 0], 2)).unwrap();
        editor.add_mark("bold", true).unwrap();
        editor.insert_text("c").unwrap();

        assert_eq!(
            editor.children(),
            &[Node::element(
                "paragraph",
                vec![Node::text("ab"), Node::Text(crate::node::Text::new("c").with_mark("bold", true))]
            )]
        );
        assert_eq!(editor.pending_marks(), None);
    }

    #[test]
    fn test_insert_data_splits_lines_into_blocks() {
        let mut editor = Editor::new(vec![paragraph("")]);
        editor.select(Point::new([0, 0], 0)).unwrap();
        editor.insert_data(&DataTransfer::plain("one\r\ntwo\rthree")).unwrap();
        assert_eq!(
            editor.children(),
            &[paragraph("one"), paragraph("two"), paragraph("three")]
        );
    }

    #[test]
    fn test_backspace_with_expanded_selection_deletes_fragment() {
        let mut editor = Editor::new(vec![paragraph("abcd")]);
        editor
            .select(Range::new(Point::new([0, 0], 1), Point::new([0, 0], 3)))
            .unwrap();
        editor.delete_backward(Unit::Character).unwrap();
        assert_eq!(editor.children(), &[paragraph("ad")]);
    }

    #[test]
    fn test_data_transfer_lookup() {
        let data = DataTransfer::new().with("text/html", "<b>x</b>");
        assert_eq!(data.text(), None);
        assert_eq!(data.get("text/html"), Some("<b>x</b>"));
    }
}
