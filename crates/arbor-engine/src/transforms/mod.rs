//! # Transforms
//!
//! Compound edits built from primitive [`Operation`](crate::Operation)s.
//!
//! Every transform runs inside [`Editor::without_normalizing`], so the tree is
//! repaired once when the outermost call returns and intermediate states are
//! never observed from outside. Transforms read their target from
//! [`Options::at`](crate::Options) and fall back to the selection; with
//! neither, or when a predicate matches nothing, they do nothing.
//!
//! Locations that must survive the operations a transform applies are held as
//! refs and released before returning.

mod node;
mod selection;
mod text;

use crate::editor::Editor;
use crate::location::{Location, Path};
use crate::options::Match;

/// Default target predicate: the node at a path, or the blocks of a range.
fn default_match(at: &Location) -> Match {
    match at {
        Location::Path(path) => Match::path(path.clone()),
        _ => Match::block(),
    }
}

impl Editor {
    /// Where insertions go without an explicit target: the selection, else the
    /// end of the document.
    fn default_insert_location(&self) -> Location {
        if let Some(selection) = &self.selection {
            return Location::Range(selection.clone());
        }
        match self.document_end() {
            Ok(end) => Location::Point(end),
            Err(_) => Location::Path(Path::from([self.children().len()])),
        }
    }
}
