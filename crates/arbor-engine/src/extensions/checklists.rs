//! Check list items: a block with a `checked` flag that turns back into a
//! paragraph when backspace is pressed at its very start.

use log::debug;
use serde_json::Value;

use crate::editor::Editor;
use crate::error::Result;
use crate::hooks::{Extension, Next};
use crate::location::{Location, Path};
use crate::node::{Props, TYPE_KEY};
use crate::options::{Match, Options, Unit};

pub const CHECK_LIST_ITEM: &str = "check-list-item";

pub struct CheckLists;

impl Extension for CheckLists {
    fn name(&self) -> &'static str {
        "checklists"
    }

    fn delete_backward(&self, editor: &mut Editor, unit: Unit, next: Next<'_>) -> Result<()> {
        if let Some(selection) = editor.selection().filter(|selection| selection.is_collapsed()).cloned()
            && let Some((_, path)) = editor.find(&Options::new().matching(Match::kind(CHECK_LIST_ITEM)))?
            && selection.anchor == editor.start(&Location::Path(path.clone()))?
        {
            debug!("turning check list item at {path} into a paragraph");
            let props = Props::from([(TYPE_KEY.to_string(), Value::from("paragraph"))]);
            return editor.set_nodes(props, &Options::new().matching(Match::kind(CHECK_LIST_ITEM)));
        }
        next.delete_backward(editor, unit)
    }
}

/// Tick or untick the item at `path`.
pub fn set_checked(editor: &mut Editor, path: Path, checked: bool) -> Result<()> {
    let props = Props::from([("checked".to_string(), Value::Bool(checked))]);
    editor.set_nodes(props, &Options::new().at(path))
}

pub fn is_checked(editor: &Editor, path: &Path) -> Result<bool> {
    Ok(editor.node(path)?.prop("checked") == Some(Value::Bool(true)))
}
