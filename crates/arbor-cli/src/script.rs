//! Line-oriented editing scripts.
//!
//! One command per line; blank lines and lines starting with `#` are skipped.
//! Text arguments run to the end of the line and understand the escapes `\s`
//! (space), `\t` and `\n`, so trailing spaces survive editors that strip them.

use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use arbor_engine::extensions::search_highlighting::SearchHighlighter;
use arbor_engine::extensions::{checklists, inlines, rich_text};
use arbor_engine::snapshot::outline;
use arbor_engine::{DataTransfer, Editor, Path, Point, Range, Unit, write_document};
use log::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Select(Range),
    Type(String),
    Insert(String),
    Paste(String),
    Backspace(Unit),
    Delete(Unit),
    Enter,
    Left,
    Right,
    Mark(String),
    Block(String),
    Hotkey(String),
    Link(String),
    Unlink,
    Button,
    Check(Path, bool),
    Search(String),
    Undo,
    Redo,
    Print,
    Save(PathBuf),
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim_start().trim_end_matches(['\r', '\n']);
        let (name, rest) = line.split_once(' ').unwrap_or((line, ""));
        let arg = rest.trim();

        let command = match name {
            "select" => Command::Select(parse_selection(arg)?),
            "type" => Command::Type(unescape(rest)),
            "insert" => Command::Insert(unescape(rest)),
            "paste" => Command::Paste(unescape(rest)),
            "backspace" => Command::Backspace(parse_unit(arg)?),
            "delete" => Command::Delete(parse_unit(arg)?),
            "enter" => Command::Enter,
            "left" => Command::Left,
            "right" => Command::Right,
            "mark" => Command::Mark(required(name, arg)?),
            "block" => Command::Block(required(name, arg)?),
            "hotkey" => Command::Hotkey(required(name, arg)?),
            "link" => Command::Link(required(name, arg)?),
            "unlink" => Command::Unlink,
            "button" => Command::Button,
            "check" => {
                let (path, checked) = arg.split_once(' ').unwrap_or((arg, "true"));
                let checked = checked
                    .trim()
                    .parse()
                    .with_context(|| format!("`check` expects true or false, got `{checked}`"))?;
                Command::Check(path.parse()?, checked)
            }
            "search" => Command::Search(unescape(rest)),
            "undo" => Command::Undo,
            "redo" => Command::Redo,
            "print" => Command::Print,
            "save" => Command::Save(PathBuf::from(required(name, arg)?)),
            other => bail!("unknown command `{other}`"),
        };
        Ok(command)
    }
}

fn required(name: &str, arg: &str) -> Result<String> {
    if arg.is_empty() {
        bail!("`{name}` needs an argument");
    }
    Ok(arg.to_string())
}

fn parse_unit(arg: &str) -> Result<Unit> {
    if arg.is_empty() {
        return Ok(Unit::default());
    }
    arg.parse().map_err(|err: String| anyhow!(err))
}

/// `0.0:3` for a cursor, `0.0:3 1.0:2` for anchor and focus.
fn parse_selection(arg: &str) -> Result<Range> {
    let mut points = arg.split_whitespace().map(str::parse::<Point>);
    let anchor = points.next().ok_or_else(|| anyhow!("`select` needs a point"))??;
    let focus = points.next().transpose()?.unwrap_or_else(|| anchor.clone());
    Ok(Range::new(anchor, focus))
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Parse a whole script, reporting the line number of the first bad line.
pub fn parse(script: &str) -> Result<Vec<Command>> {
    script
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(index, line)| line.parse::<Command>().with_context(|| format!("line {}: `{line}`", index + 1)))
        .collect()
}

/// Replays commands against an editor, writing requested output to `out`.
pub struct Runner<'a, W: Write> {
    pub editor: &'a mut Editor,
    pub search_mark: String,
    pub out: W,
}

impl<W: Write> Runner<'_, W> {
    pub fn run(&mut self, commands: &[Command]) -> Result<()> {
        for command in commands {
            debug!("running {command:?}");
            self.run_one(command)?;
            self.editor.end_turn()?;
        }
        Ok(())
    }

    fn run_one(&mut self, command: &Command) -> Result<()> {
        let editor = &mut *self.editor;
        match command {
            Command::Select(range) => editor.select(range.clone())?,
            Command::Type(text) => {
                for c in text.chars() {
                    if c == '\n' {
                        editor.insert_break()?;
                    } else {
                        editor.insert_text(&c.to_string())?;
                    }
                }
            }
            Command::Insert(text) => editor.insert_text(text)?,
            Command::Paste(text) => editor.insert_data(&DataTransfer::plain(text.clone()))?,
            Command::Backspace(unit) => editor.delete_backward(*unit)?,
            Command::Delete(unit) => editor.delete_forward(*unit)?,
            Command::Enter => editor.insert_break()?,
            Command::Left => inlines::step_cursor(editor, true)?,
            Command::Right => inlines::step_cursor(editor, false)?,
            Command::Mark(mark) => rich_text::toggle_mark(editor, mark)?,
            Command::Block(format) => rich_text::toggle_block(editor, format)?,
            Command::Hotkey(chord) => match rich_text::mark_for_hotkey(chord) {
                Some(mark) => rich_text::toggle_mark(editor, mark)?,
                None => warn!("no mark bound to `{chord}`"),
            },
            Command::Link(url) => inlines::insert_link(editor, url)?,
            Command::Unlink => {
                if inlines::is_link_active(editor)? {
                    inlines::unwrap_link(editor)?;
                }
            }
            Command::Button => inlines::insert_button(editor)?,
            Command::Check(path, checked) => checklists::set_checked(editor, path.clone(), *checked)?,
            Command::Search(term) => {
                let highlighter = SearchHighlighter::new(term.clone()).with_mark(self.search_mark.clone());
                for decoration in editor.decorations(&highlighter) {
                    writeln!(
                        self.out,
                        "{} {}",
                        decoration.range,
                        serde_json::to_string(&decoration.data)?
                    )?;
                }
            }
            Command::Undo => {
                if !editor.undo()? {
                    debug!("nothing to undo");
                }
            }
            Command::Redo => {
                if !editor.redo()? {
                    debug!("nothing to redo");
                }
            }
            Command::Print => write!(self.out, "{}", outline(editor))?,
            Command::Save(path) => write_document(path, editor.children())
                .with_context(|| format!("saving to {}", path.display()))?,
        }
        Ok(())
    }
}
