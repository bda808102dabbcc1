//! Tables: cells keep their content when deleting across their edges, and
//! breaks are swallowed inside a table.

use log::debug;

use crate::editor::Editor;
use crate::error::Result;
use crate::hooks::{Extension, Next};
use crate::location::{Edge, Location};
use crate::options::{Match, Options, Unit};
use crate::schema::{ContentRule, Schema};

pub const TABLE: &str = "table";
pub const TABLE_ROW: &str = "table-row";
pub const TABLE_CELL: &str = "table-cell";

pub struct Tables;

impl Tables {
    /// True when the cursor is collapsed on the given edge of its cell.
    fn at_cell_edge(editor: &Editor, edge: Edge) -> Result<bool> {
        let Some(selection) = editor.selection().filter(|selection| selection.is_collapsed()) else {
            return Ok(false);
        };
        let Some((_, cell)) = editor.find(&Options::new().matching(Match::kind(TABLE_CELL)))? else {
            return Ok(false);
        };
        Ok(selection.anchor == editor.point(&Location::Path(cell), edge)?)
    }
}

impl Extension for Tables {
    fn name(&self) -> &'static str {
        "tables"
    }

    fn configure(&self, schema: &mut Schema) {
        schema.set_content(TABLE, ContentRule::blocks_filled_with(TABLE_ROW));
        schema.set_content(TABLE_ROW, ContentRule::blocks_filled_with(TABLE_CELL));
    }

    fn delete_backward(&self, editor: &mut Editor, unit: Unit, next: Next<'_>) -> Result<()> {
        if Self::at_cell_edge(editor, Edge::Start)? {
            debug!("backspace at the start of a table cell ignored");
            return Ok(());
        }
        next.delete_backward(editor, unit)
    }

    fn delete_forward(&self, editor: &mut Editor, unit: Unit, next: Next<'_>) -> Result<()> {
        if Self::at_cell_edge(editor, Edge::End)? {
            debug!("delete at the end of a table cell ignored");
            return Ok(());
        }
        next.delete_forward(editor, unit)
    }

    fn insert_break(&self, editor: &mut Editor, next: Next<'_>) -> Result<()> {
        if editor.selection().is_some()
            && editor.find(&Options::new().matching(Match::kind(TABLE)))?.is_some()
        {
            debug!("break inside a table ignored");
            return Ok(());
        }
        next.insert_break(editor)
    }
}
