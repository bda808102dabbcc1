use arbor_engine::deferred::TextDiff;
use arbor_engine::extensions::{Fixture, MarkdownShortcuts, SearchHighlighter, install_all};
use arbor_engine::{Editor, Element, Location, Match, Node, Options, Path, Point, Range, Unit};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn fixture_editor(fixture: Fixture) -> Editor {
    let mut editor = fixture.editor().unwrap();
    install_all(&mut editor, MarkdownShortcuts::default());
    editor
}

#[rstest]
fn normalize_is_idempotent(
    #[values(
        Fixture::CheckLists,
        Fixture::Inlines,
        Fixture::MarkdownShortcuts,
        Fixture::RichText,
        Fixture::SearchHighlighting,
        Fixture::Tables
    )]
    fixture: Fixture,
) {
    let mut editor = fixture_editor(fixture);
    editor.normalize().unwrap();
    let once = editor.children().to_vec();
    editor.normalize().unwrap();
    assert_eq!(editor.children(), once.as_slice());
}

#[test]
fn normalize_is_idempotent_on_a_broken_tree() {
    let mut editor = Editor::new(vec![
        Node::element(
            "paragraph",
            vec![
                Node::text("a"),
                Node::text("b"),
                Node::element("link", vec![]),
                Node::element("paragraph", vec![Node::text("nested")]),
            ],
        ),
        Node::element("table", vec![]),
    ]);
    install_all(&mut editor, MarkdownShortcuts::default());

    editor.normalize().unwrap();
    let once = editor.children().to_vec();
    editor.normalize().unwrap();

    assert_eq!(editor.children(), once.as_slice());
    assert!(arbor_engine::snapshot::violations(&editor).is_empty());
}

#[rstest]
#[case(Point::new([0, 0], 0))]
#[case(Point::new([1, 0], 7))]
#[case(Point::new([3, 0], 24))]
fn collapsed_range_is_left_alone_by_unhang(#[case] point: Point) {
    let editor = fixture_editor(Fixture::RichText);
    let range = Range::new(point.clone(), point);
    assert!(range.is_collapsed());
    assert_eq!(editor.unhang_range(&range, false).unwrap(), range);
}

#[test]
fn unhang_retracts_a_hanging_end() {
    let editor = fixture_editor(Fixture::RichText);
    let hanging = Range::new(Point::new([0, 0], 0), Point::new([1, 0], 0));
    assert_eq!(
        editor.unhang_range(&hanging, false).unwrap(),
        Range::new(Point::new([0, 0], 0), Point::new([0, 6], 1))
    );
}

#[test]
fn wrap_then_unwrap_restores_siblings() {
    let mut editor = fixture_editor(Fixture::MarkdownShortcuts);
    let original = editor.children().to_vec();
    let covered = Range::new(Point::new([1, 0], 2), Point::new([3, 0], 2));

    editor
        .wrap_nodes(Element::new("section"), &Options::new().at(covered))
        .unwrap();
    assert_eq!(editor.children().len(), 3);
    assert!(editor.children()[1].is_kind("section"));
    assert_eq!(editor.children()[1].children().len(), 3);

    let everything = editor.range(&Location::Path(Path::root())).unwrap();
    editor
        .unwrap_nodes(&Options::new().at(everything).matching(Match::kind("section")))
        .unwrap();
    assert_eq!(editor.children(), original.as_slice());
}

#[test]
fn backspace_at_document_start_changes_nothing() {
    let mut editor = Editor::new(vec![
        Node::element("paragraph", vec![Node::text("first")]),
        Node::element("paragraph", vec![Node::text("second")]),
    ]);
    install_all(&mut editor, MarkdownShortcuts::default());
    let start = editor.start(&Location::Path(Path::root())).unwrap();
    editor.select(start.clone()).unwrap();
    let before = editor.children().to_vec();
    let version = editor.version();

    editor.delete_backward(Unit::Character).unwrap();
    editor.delete_backward(Unit::Word).unwrap();

    assert_eq!(editor.children(), before.as_slice());
    assert_eq!(editor.selection(), Some(&Range::collapsed(start)));
    assert_eq!(editor.version(), version);
}

#[test]
fn delete_forward_at_document_end_changes_nothing() {
    let mut editor = Editor::new(vec![Node::element("paragraph", vec![Node::text("only")])]);
    let end = editor.document_end().unwrap();
    editor.select(end).unwrap();
    let before = editor.children().to_vec();

    editor.delete_forward(Unit::Character).unwrap();

    assert_eq!(editor.children(), before.as_slice());
}

#[rstest]
#[case("search")]
#[case("e")]
#[case("")]
fn decorations_are_deterministic(#[case] search: &str) {
    let editor = fixture_editor(Fixture::SearchHighlighting);
    let highlighter = SearchHighlighter::new(search);
    let first = editor.decorations(&highlighter);
    let second = editor.decorations(&highlighter);
    assert_eq!(first, second);
    if search.is_empty() {
        assert!(first.is_empty());
    } else {
        assert!(!first.is_empty());
    }
}

#[test]
fn operations_invert_exactly() {
    let mut editor = fixture_editor(Fixture::Inlines);
    editor.normalize().unwrap();
    let original = editor.children().to_vec();
    editor.flush();

    editor.select(Point::new([0, 0], 10)).unwrap();
    editor.insert_break().unwrap();
    editor.insert_text("new ").unwrap();
    let patch = editor.flush();

    editor
        .without_normalizing(|editor| {
            for op in patch.operations.iter().rev() {
                editor.apply(op.inverse()?)?;
            }
            Ok(())
        })
        .unwrap();
    assert_eq!(editor.children(), original.as_slice());
}

#[test]
fn deferred_input_reaches_the_shortcut_hook_after_the_turn() {
    let shortcuts = MarkdownShortcuts::default();
    let mut editor = Editor::new(vec![Node::element("paragraph", vec![Node::text(">")])]);
    install_all(&mut editor, shortcuts.clone());

    editor.queue_diff(
        Path::from([0, 0]),
        TextDiff {
            start: 1,
            end: 1,
            text: " ".to_string(),
        },
    );
    shortcuts.on_before_input(&mut editor);
    assert_eq!(editor.children()[0].kind(), Some("paragraph"));

    let patch = editor.end_turn().unwrap();

    assert!(patch.changes_document());
    assert_eq!(editor.children(), &[Node::element("block-quote", vec![Node::text("")])]);
}
