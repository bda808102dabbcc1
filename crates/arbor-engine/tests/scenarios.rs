use arbor_engine::extensions::inlines::{LINK, wrap_link};
use arbor_engine::extensions::{Fixture, MarkdownShortcuts, SearchHighlighter, install_all};
use arbor_engine::snapshot::{outline, violations};
use arbor_engine::{Decorate, Editor, Node, Path, Point, Range, Unit};
use pretty_assertions::assert_eq;

fn fixture_editor(fixture: Fixture) -> Editor {
    let mut editor = fixture.editor().unwrap();
    install_all(&mut editor, MarkdownShortcuts::default());
    editor.normalize().unwrap();
    editor
}

fn type_chars(editor: &mut Editor, text: &str) {
    for c in text.chars() {
        editor.insert_text(&c.to_string()).unwrap();
    }
}

#[test]
fn checklist_backspace_at_item_start_makes_paragraph() {
    let mut editor = fixture_editor(Fixture::CheckLists);
    editor.select(Point::new([1, 0], 0)).unwrap();

    editor.delete_backward(Unit::Character).unwrap();

    let item = editor.node(&Path::from([1])).unwrap();
    assert!(item.is_kind("paragraph"));
    assert_eq!(item.string(), "Slide to the left.");
    assert_eq!(editor.children().len(), 8);
    assert_eq!(editor.selection(), Some(&Range::collapsed(Point::new([1, 0], 0))));
}

#[test]
fn markdown_hashes_and_space_make_heading_two() {
    let mut editor = Editor::new(vec![Node::element("paragraph", vec![Node::text("")])]);
    install_all(&mut editor, MarkdownShortcuts::default());
    editor.select(Point::new([0, 0], 0)).unwrap();

    type_chars(&mut editor, "## ");

    assert_eq!(editor.children(), &[Node::element("heading-two", vec![Node::text("")])]);
}

#[test]
fn markdown_list_shortcut_then_typing() {
    let mut editor = Editor::new(vec![Node::element("paragraph", vec![Node::text("")])]);
    install_all(&mut editor, MarkdownShortcuts::default());
    editor.select(Point::new([0, 0], 0)).unwrap();

    type_chars(&mut editor, "- item");

    insta::assert_snapshot!(outline(&editor), @r#"
    bulleted-list
      list-item
        "item"
    selection: 0.0.0:4
    "#);
}

#[test]
fn link_wrap_with_collapsed_selection() {
    let mut editor = Editor::new(vec![Node::element("paragraph", vec![Node::text("hello world")])]);
    install_all(&mut editor, MarkdownShortcuts::default());
    editor.select(Point::new([0, 0], 5)).unwrap();

    wrap_link(&mut editor, "https://x.test").unwrap();

    let paragraph = editor.node(&Path::from([0])).unwrap();
    let link = &paragraph.children()[1];
    assert!(link.is_kind(LINK));
    assert_eq!(link.children(), &[Node::text("https://x.test")]);
    assert_eq!(paragraph.children()[0], Node::text("hello"));
    assert_eq!(paragraph.children()[2], Node::text(" world"));
    assert_eq!(editor.selection(), Some(&Range::collapsed(Point::new([0, 2], 0))));
    assert!(violations(&editor).is_empty());
}

#[test]
fn typing_a_url_inserts_a_link() {
    let mut editor = fixture_editor(Fixture::Inlines);
    let end = editor.end(&arbor_engine::Location::Path(Path::from([1]))).unwrap();
    editor.select(end).unwrap();

    editor.insert_text("https://example.com/page").unwrap();

    let paragraph = editor.node(&Path::from([1])).unwrap();
    let links: Vec<String> = paragraph
        .children()
        .iter()
        .filter(|child| child.is_kind(LINK))
        .map(Node::string)
        .collect();
    assert_eq!(
        links,
        vec!["Finally, here is our favorite dog video.", "https://example.com/page"]
    );
}

#[test]
fn table_cell_backspace_at_start_is_a_no_op() {
    let mut editor = fixture_editor(Fixture::Tables);
    let cell = Path::from([1, 1, 2]);
    assert_eq!(editor.node(&cell).unwrap().string(), "4");
    let before = editor.children().to_vec();
    editor.select(Point::new([1, 1, 2, 0], 0)).unwrap();

    editor.delete_backward(Unit::Character).unwrap();

    assert_eq!(editor.children(), before.as_slice());
    assert_eq!(editor.selection(), Some(&Range::collapsed(Point::new([1, 1, 2, 0], 0))));
}

#[test]
fn search_highlight_matches_are_overlap_free() {
    let node = Node::text("Slide to the left. Slide to the right.");
    let path = Path::from([0, 0]);

    let ranges = SearchHighlighter::new("Slide").decorate(&node, &path);
    let offsets: Vec<(usize, usize)> = ranges
        .iter()
        .map(|decoration| (decoration.range.anchor.offset, decoration.range.focus.offset))
        .collect();
    assert_eq!(offsets, vec![(0, 5), (19, 24)]);

    assert!(SearchHighlighter::new("xyz").decorate(&node, &path).is_empty());
}

#[test]
fn rich_text_hotkey_then_typing_uses_pending_mark() {
    use arbor_engine::extensions::rich_text::{mark_for_hotkey, toggle_mark};

    let mut editor = Editor::new(vec![Node::element("paragraph", vec![Node::text("ab")])]);
    install_all(&mut editor, MarkdownShortcuts::default());
    editor.select(Point::new([0, 0], 1)).unwrap();

    let mark = mark_for_hotkey("mod+b").unwrap();
    toggle_mark(&mut editor, mark).unwrap();
    editor.insert_text("X").unwrap();

    insta::assert_snapshot!(outline(&editor), @r#"
    paragraph
      "a"
      "X" bold=true
      "b"
    selection: 0.1:1
    "#);
}

#[test]
fn undo_and_redo_a_scenario() {
    let mut editor = fixture_editor(Fixture::CheckLists);
    let original = editor.children().to_vec();
    editor.select(Point::new([1, 0], 0)).unwrap();
    editor.delete_backward(Unit::Character).unwrap();
    let converted = editor.children().to_vec();

    assert!(editor.undo().unwrap());
    assert_eq!(editor.children(), original.as_slice());
    assert_eq!(editor.selection(), Some(&Range::collapsed(Point::new([1, 0], 0))));

    assert!(editor.redo().unwrap());
    assert_eq!(editor.children(), converted.as_slice());
    assert!(!editor.redo().unwrap());
}

#[test]
fn fixture_survives_save_and_load() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("tables.json");
    let editor = fixture_editor(Fixture::Tables);

    arbor_engine::write_document(&path, editor.children()).unwrap();
    let loaded = arbor_engine::read_document(&path).unwrap();

    assert_eq!(loaded, editor.children());
}
