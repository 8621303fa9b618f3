use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use rstest::rstest;
use theme_editor_engine::editing::invariants::{assert_consistent, tree_violations};
use theme_editor_engine::editing::*;
use theme_editor_engine::markup::{self, MarkupOptions};

fn clock() -> Component {
    Component::new("clock", "", "Current time", "12:00")
}

/// body > "AB", clock "12:00", "CD"
fn straddle() -> (Document, NodeId, NodeId, NodeId) {
    let mut doc = Document::new();
    let root = doc.root();
    let ab = doc.create_text("AB");
    let component = doc.create_component(clock());
    let cd = doc.create_text("CD");
    doc.append_child(root, ab);
    doc.append_child(root, component);
    doc.append_child(root, cd);
    (doc, ab, component, cd)
}

/// body > "AB", span > [clock, "xy"], "CD", Minute "07"
fn nested() -> Document {
    let mut doc = Document::new();
    let root = doc.root();
    let ab = doc.create_text("AB");
    let span = doc.create_container(Container::new("span"));
    let component = doc.create_component(clock());
    let xy = doc.create_text("xy");
    let cd = doc.create_text("CD");
    let minute = doc.create_component(Component::new("Minute", "", "Minute", "07"));
    doc.append_child(root, ab);
    doc.append_child(root, span);
    doc.append_child(span, component);
    doc.append_child(span, xy);
    doc.append_child(root, cd);
    doc.append_child(root, minute);
    doc
}

fn all_positions(doc: &Document) -> Vec<Position> {
    doc.descendants(doc.root())
        .into_iter()
        .flat_map(|node| (0..=doc.length(node)).map(move |offset| Position::new(node, offset)))
        .collect()
}

fn component_values(doc: &Document) -> Vec<String> {
    doc.components()
        .into_iter()
        .filter_map(|node| doc.component(node).map(|c| c.value.clone()))
        .collect()
}

#[rstest]
#[case(Direction::Forward)]
#[case(Direction::Backward)]
fn normalized_boundaries_never_sit_inside_components(#[case] direction: Direction) {
    let doc = nested();
    let positions = all_positions(&doc);

    for &anchor in &positions {
        for &focus in &positions {
            let raw = Selection::new(anchor, focus);
            let fixed = normalize(&doc, &raw, direction);
            assert!(
                is_normalized(&doc, &fixed),
                "{raw:?} normalized to {fixed:?} ({direction:?})"
            );
        }
    }
}

#[test]
fn styling_any_selection_keeps_components_whole() {
    let reference = nested();
    let positions = all_positions(&reference);
    let values = component_values(&reference);

    for &anchor in &positions {
        for &focus in &positions {
            let mut doc = nested();
            doc.set_selection(Selection::new(anchor, focus));

            doc.apply_style("color", "red");

            assert_eq!(component_values(&doc), values, "{anchor:?}..{focus:?}");
            assert!(
                tree_violations(&doc).is_empty(),
                "{anchor:?}..{focus:?}:\n{}",
                doc.format_tree()
            );
        }
    }
}

#[test]
fn extending_over_a_component_and_back_returns_to_the_cursor() {
    let (doc, _, component, _) = straddle();
    let root = doc.root();
    let mut editor = Editor::new(doc, EditorOptions::default());
    let cursor = Selection::collapsed(Position::new(root, 1));

    editor.handle(EditorEvent::SelectionChanged(cursor));
    editor.handle(EditorEvent::KeyUp { shift: false });
    assert_eq!(editor.selection(), Some(cursor));

    // Forward over most of the component
    editor.handle(EditorEvent::SelectionChanged(Selection::new(
        Position::new(root, 1),
        Position::new(component, 3),
    )));
    editor.handle(EditorEvent::KeyUp { shift: false });
    assert_eq!(
        editor.selection(),
        Some(Selection::new(Position::new(root, 1), Position::new(root, 2)))
    );

    // And back again
    editor.handle(EditorEvent::SelectionChanged(Selection::new(
        Position::new(root, 1),
        Position::new(component, 1),
    )));
    editor.handle(EditorEvent::KeyUp { shift: false });
    assert_eq!(editor.selection(), Some(cursor));
    assert_consistent(editor.document());
}

#[test]
fn selection_around_a_component_is_left_alone() {
    let (doc, ab, _, cd) = straddle();
    let mut editor = Editor::new(doc, EditorOptions::default());
    let raw = Selection::new(Position::new(ab, 1), Position::new(cd, 1));

    editor.handle(EditorEvent::SelectionChanged(raw));
    editor.handle(EditorEvent::PointerUp { shift: false });

    assert_eq!(editor.session().direction(), Direction::Forward);
    assert_eq!(editor.selection(), Some(raw));
}

#[test]
fn anchor_on_a_component_is_pushed_outside() {
    let (doc, _, component, cd) = straddle();
    let root = doc.root();
    let mut editor = Editor::new(doc, EditorOptions::default());

    editor.handle(EditorEvent::SelectionChanged(Selection::new(
        Position::new(component, 2),
        Position::new(cd, 1),
    )));
    editor.handle(EditorEvent::PointerUp { shift: false });

    assert_eq!(
        editor.selection(),
        Some(Selection::new(Position::new(root, 1), Position::new(cd, 1)))
    );
    assert_consistent(editor.document());
}

#[test]
fn styling_a_normalized_drag_wraps_only_the_dragged_content() {
    let (doc, ab, component, _) = straddle();
    let root = doc.root();
    let mut editor = Editor::new(doc, EditorOptions::default());

    editor.handle(EditorEvent::SelectionChanged(Selection::new(
        Position::new(ab, 1),
        Position::new(component, 2),
    )));
    editor.handle(EditorEvent::PointerUp { shift: false });
    assert_eq!(
        editor.selection(),
        Some(Selection::new(Position::new(ab, 1), Position::new(root, 2)))
    );

    let target = editor.apply_style("color", "red");

    let doc = editor.document();
    assert!(matches!(target, StyleTarget::Wrapped(_)));
    assert_eq!(doc.style(root).and_then(|style| style.get("color")), None);
    assert_snapshot!(doc.format_tree(), @r#"
    body
      text "A"
      span [color: red]
        text "B"
        component clock "12:00"
      text "CD"
    "#);
    assert_consistent(doc);
}

#[test]
fn inserting_a_component_splits_the_text_run() {
    let mut doc = Document::new();
    let text = doc.create_text("ABCD");
    doc.append_child(doc.root(), text);
    let mut editor = Editor::new(doc, EditorOptions::default());
    editor.handle(EditorEvent::SelectionChanged(Selection::collapsed(Position::new(
        text, 2,
    ))));

    let patch = editor.apply(Cmd::InsertComponent(clock()));

    let doc = editor.document();
    let children = doc.children(doc.root());
    assert_eq!(children.len(), 3);
    assert_eq!(doc.text(children[0]), Some("AB"));
    assert_eq!(patch.changed, [children[1]]);
    assert!(doc.component(children[1]).unwrap().options.is_empty());
    assert_eq!(doc.text(children[2]), Some("CD"));
    assert_eq!(
        markup::serialize(doc, &MarkupOptions::default()),
        r#"AB<span component="clock" title="Current time">12:00</span>CD"#
    );
}

#[test]
fn styling_two_sibling_runs_wraps_them_once() {
    let mut doc = Document::new();
    let root = doc.root();
    let first = doc.create_container(Container::new("span"));
    let second = doc.create_container(Container::new("span"));
    let ab = doc.create_text("AB");
    let cd = doc.create_text("CD");
    doc.append_child(root, first);
    doc.append_child(root, second);
    doc.append_child(first, ab);
    doc.append_child(second, cd);
    let mut editor = Editor::new(doc, EditorOptions::default());
    editor.handle(EditorEvent::SelectionChanged(Selection::new(
        Position::new(ab, 0),
        Position::new(cd, 2),
    )));

    let target = editor.apply_style("color", "red");

    let doc = editor.document();
    assert!(matches!(target, StyleTarget::Wrapped(_)));
    assert!(!doc.is_attached(first));
    assert!(!doc.is_attached(second));
    assert_eq!(editor.resolved_style("color").as_deref(), Some("red"));
    assert_snapshot!(doc.format_tree(), @r#"
    body
      span [color: red]
        span
          text "AB"
        span
          text "CD"
    "#);
}

#[test]
fn theme_fixture_edit_session() {
    let source = std::fs::read_to_string(format!(
        "{}/tests/fixtures/digital.html",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap();
    let doc = markup::parse(&source).unwrap();
    let components = doc.components();
    let (hour, date) = (components[0], components[3]);
    let mut editor = Editor::new(doc, EditorOptions::default());
    editor.refresh_titles(|kind| format!("{kind} (live)"));

    // Drag from inside the hour to inside the date
    editor.handle(EditorEvent::SelectionChanged(Selection::new(
        Position::new(hour, 1),
        Position::new(date, 4),
    )));
    editor.handle(EditorEvent::PointerUp { shift: false });
    assert_consistent(editor.document());

    editor.apply(Cmd::SetStyle {
        property: "color".to_string(),
        value: "red".to_string(),
    });
    assert_consistent(editor.document());

    assert_snapshot!(editor.document().format_tree(), @r#"
    body [color: #eeeeee; font-family: Sans]
      text "\n"
      div
        span
          text "Time: "
      span [color: red]
        div
          component Hour "21"
          text ":"
          component Minute "07"
        text "\n"
        div
          component DayOfWeek "Mon"
          text ", "
          component Date "2026-10-19"
      text "\n"
    "#);

    let saved = markup::serialize(
        editor.document(),
        &MarkupOptions {
            include_titles: false,
        },
    );
    assert!(!saved.contains("title="));
    let reloaded = markup::parse(&saved).unwrap();
    assert_eq!(reloaded.format_tree(), editor.document().format_tree());
}
