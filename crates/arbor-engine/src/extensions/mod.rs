//! # Bundled Extensions
//!
//! Editing behaviors built on the hook chain, each with a sample document:
//!
//! - **checklists**: check list items that revert to paragraphs on backspace
//! - **inlines**: links, buttons and read-only badges; URLs become links
//! - **markdown shortcuts**: `## `, `> `, `- ` and friends convert blocks
//! - **rich text**: mark and block toggles with hotkeys
//! - **search highlighting**: a decoration marking search matches
//! - **tables**: cells that keep their content on delete and break

pub mod checklists;
pub mod inlines;
pub mod markdown_shortcuts;
pub mod rich_text;
pub mod search_highlighting;
pub mod tables;

use std::fmt;
use std::str::FromStr;

use crate::editor::Editor;
use crate::error::{EngineError, Result};
use crate::node::Node;

pub use checklists::CheckLists;
pub use inlines::Inlines;
pub use markdown_shortcuts::MarkdownShortcuts;
pub use rich_text::RichText;
pub use search_highlighting::SearchHighlighter;
pub use tables::Tables;

/// Sample documents shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixture {
    CheckLists,
    Inlines,
    MarkdownShortcuts,
    RichText,
    SearchHighlighting,
    Tables,
}

impl Fixture {
    pub const ALL: [Fixture; 6] = [
        Fixture::CheckLists,
        Fixture::Inlines,
        Fixture::MarkdownShortcuts,
        Fixture::RichText,
        Fixture::SearchHighlighting,
        Fixture::Tables,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Fixture::CheckLists => "checklists",
            Fixture::Inlines => "inlines",
            Fixture::MarkdownShortcuts => "markdown-shortcuts",
            Fixture::RichText => "rich-text",
            Fixture::SearchHighlighting => "search-highlighting",
            Fixture::Tables => "tables",
        }
    }

    pub fn json(self) -> &'static str {
        match self {
            Fixture::CheckLists => include_str!("../../fixtures/checklists.json"),
            Fixture::Inlines => include_str!("../../fixtures/inlines.json"),
            Fixture::MarkdownShortcuts => include_str!("../../fixtures/markdown_shortcuts.json"),
            Fixture::RichText => include_str!("../../fixtures/rich_text.json"),
            Fixture::SearchHighlighting => include_str!("../../fixtures/search_highlighting.json"),
            Fixture::Tables => include_str!("../../fixtures/tables.json"),
        }
    }

    pub fn load(self) -> Result<Vec<Node>> {
        Ok(serde_json::from_str(self.json())?)
    }

    /// A fresh editor over the fixture, without extensions or normalization.
    pub fn editor(self) -> Result<Editor> {
        Ok(Editor::new(self.load()?))
    }
}

impl fmt::Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Fixture {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Fixture::ALL
            .into_iter()
            .find(|fixture| fixture.name() == s || fixture.name().replace('-', "_") == s)
            .ok_or_else(|| EngineError::Document(format!("unknown fixture `{s}`")))
    }
}

/// Install every bundled editing extension. Tables go last so their cell
/// guards run before the block conversions of the other extensions.
pub fn install_all(editor: &mut Editor, shortcuts: MarkdownShortcuts) {
    editor.install(RichText);
    editor.install(Inlines);
    editor.install(shortcuts);
    editor.install(CheckLists);
    editor.install(Tables);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::violations;
    use rstest::rstest;

    #[rstest]
    #[case(Fixture::CheckLists, 8)]
    #[case(Fixture::Inlines, 2)]
    #[case(Fixture::MarkdownShortcuts, 5)]
    #[case(Fixture::RichText, 4)]
    #[case(Fixture::SearchHighlighting, 2)]
    #[case(Fixture::Tables, 3)]
    fn test_fixture_loads_normalized(#[case] fixture: Fixture, #[case] blocks: usize) {
        let mut editor = fixture.editor().unwrap();
        install_all(&mut editor, MarkdownShortcuts::default());
        let before = editor.children().to_vec();

        editor.normalize().unwrap();

        assert_eq!(editor.children().len(), blocks);
        assert_eq!(editor.children(), before.as_slice());
        assert!(violations(&editor).is_empty());
    }

    #[test]
    fn test_fixture_names_round_trip() {
        for fixture in Fixture::ALL {
            assert_eq!(fixture.name().parse::<Fixture>().unwrap(), fixture);
        }
        assert_eq!("rich_text".parse::<Fixture>().unwrap(), Fixture::RichText);
        assert!("nope".parse::<Fixture>().is_err());
    }

    #[test]
    fn test_install_order() {
        let mut editor = Editor::new(Vec::new());
        install_all(&mut editor, MarkdownShortcuts::default());
        assert_eq!(
            editor.extension_names(),
            vec!["rich-text", "inlines", "markdown-shortcuts", "checklists", "tables"]
        );
    }
}
