use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::editing::{Document, NodeId, Position, Selection, StyleMap};

static OPTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'([A-Za-z_][A-Za-z0-9_]*)'\s*:\s*([^,]+)").expect("option pattern is valid")
});

/// Options payload of a component, e.g. `'short': true, 'text': true`
///
/// Values are kept verbatim; interpreting them belongs to whoever computes
/// the component's value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComponentOptions(BTreeMap<String, String>);

impl ComponentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the theme-source syntax; unrecognised fragments are skipped
    pub fn parse(source: &str) -> Self {
        Self(
            OPTION_PATTERN
                .captures_iter(source)
                .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Theme-source form; empty options give an empty string
    pub fn to_source(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| format!("'{key}': {value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<&str> for ComponentOptions {
    fn from(source: &str) -> Self {
        Self::parse(source)
    }
}

impl From<BTreeMap<String, String>> for ComponentOptions {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Atomic placeholder node: a single indivisible rendered value
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Which value this placeholder shows, e.g. `Hour` or `clock`
    pub kind: String,
    pub options: ComponentOptions,
    /// Human-readable name shown on hover in the editor
    pub title: String,
    /// Currently rendered value
    pub value: String,
    /// When set, the value is written to this attribute instead of the content
    pub attribute: Option<String>,
    pub style: StyleMap,
    /// Source element name, `span` unless the theme used another
    pub tag: String,
    /// Other source attributes, kept for round-tripping
    pub attributes: BTreeMap<String, String>,
}

impl Component {
    pub fn new(
        kind: impl Into<String>,
        options: impl Into<ComponentOptions>,
        title: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            options: options.into(),
            title: title.into(),
            value: value.into(),
            attribute: None,
            style: StyleMap::new(),
            tag: "span".to_string(),
            attributes: BTreeMap::new(),
        }
    }
}

/// Named notification dispatched to rendering collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Notification {
    /// Every component of `kind` has a freshly computed value
    ComponentValueChanged { kind: String },
}

impl Notification {
    /// Event name observed by theme scripts, e.g. `ClockHourChanged`
    pub fn name(&self) -> String {
        match self {
            Notification::ComponentValueChanged { kind } => {
                let mut chars = kind.chars();
                let capitalized: String = match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                };
                format!("Clock{capitalized}Changed")
            }
        }
    }
}

/// Replace the current selection with a new component node.
///
/// The selection's content is deleted first (components caught by a
/// boundary go as a whole), then the node is placed at the collapsed point
/// and the cursor is left just after it. Without a selection nothing happens.
pub(crate) fn insert_component(doc: &mut Document, component: Component) -> Option<NodeId> {
    let selection = doc.selection?;
    if !doc.is_valid_position(&selection.anchor) || !doc.is_valid_position(&selection.focus) {
        log::warn!("selection {selection:?} is stale; component not inserted");
        return None;
    }

    let range = selection.range(doc);
    let at = doc.delete_contents(&range);

    log::debug!(
        "inserting {} component {:?} at {at:?}",
        component.kind,
        component.value
    );
    let node = doc.create_component(component);
    doc.insert_at(at, node);

    let after = doc.position_after(node)?;
    doc.selection = Some(Selection::collapsed(after));
    Some(node)
}

/// Recompute the value of every component of `kind`; returns how many changed
pub(crate) fn refresh_components<F>(doc: &mut Document, kind: &str, mut value_for: F) -> usize
where
    F: FnMut(&ComponentOptions) -> String,
{
    let targets: Vec<NodeId> = doc
        .components()
        .into_iter()
        .filter(|&node| doc.component(node).is_some_and(|c| c.kind == kind))
        .collect();

    for &node in &targets {
        if let Some(component) = doc.component_mut(node) {
            component.value = value_for(&component.options);
        }
    }

    // Cursor offsets inside a component may now point past its value
    if let Some(selection) = doc.selection
        && !(doc.is_valid_position(&selection.anchor) && doc.is_valid_position(&selection.focus))
    {
        let anchor = clamp(doc, selection.anchor);
        let focus = clamp(doc, selection.focus);
        doc.selection = Some(Selection::new(anchor, focus));
    }

    targets.len()
}

/// Re-derive display titles from component kinds
pub(crate) fn refresh_titles<F>(doc: &mut Document, mut title_for: F)
where
    F: FnMut(&str) -> String,
{
    for node in doc.components() {
        if let Some(component) = doc.component_mut(node) {
            component.title = title_for(&component.kind);
        }
    }
}

fn clamp(doc: &Document, position: Position) -> Position {
    Position::new(position.node, position.offset.min(doc.length(position.node)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("", &[])]
    #[case("'short': true", &[("short", "true")])]
    #[case("'text': true, 'alternative': false", &[("alternative", "false"), ("text", "true")])]
    #[case("garbage, 'short' :  true ", &[("short", "true")])]
    fn test_parse_options(#[case] source: &str, #[case] expected: &[(&str, &str)]) {
        let options = ComponentOptions::parse(source);
        let pairs: Vec<(&str, &str)> = options.iter().collect();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_options_source_form() {
        let mut options = ComponentOptions::new();
        options.insert("text", "true");
        options.insert("possessive", "false");
        assert_eq!(options.to_source(), "'possessive': false, 'text': true");
        assert_eq!(ComponentOptions::new().to_source(), "");
    }

    #[test]
    fn test_notification_name() {
        let hour = Notification::ComponentValueChanged {
            kind: "Hour".to_string(),
        };
        let clock = Notification::ComponentValueChanged {
            kind: "clock".to_string(),
        };
        assert_eq!(hour.name(), "ClockHourChanged");
        assert_eq!(clock.name(), "ClockClockChanged");
    }

    #[test]
    fn test_insert_component_splits_text_run() {
        let mut doc = Document::new();
        let text = doc.create_text("ABCD");
        doc.append_child(doc.root(), text);
        doc.set_selection(Selection::collapsed(Position::new(text, 2)));

        let node = insert_component(
            &mut doc,
            Component::new("clock", "", "Current time", "12:00"),
        )
        .unwrap();

        let root = doc.root();
        assert_eq!(doc.children(root).len(), 3);
        assert_eq!(doc.children(root)[1], node);
        assert!(doc.component(node).unwrap().options.is_empty());
        assert_eq!(
            doc.selection(),
            Some(Selection::collapsed(Position::new(root, 2)))
        );
    }

    #[test]
    fn test_insert_component_replaces_selected_text() {
        let mut doc = Document::new();
        let text = doc.create_text("Time: XX!");
        doc.append_child(doc.root(), text);
        doc.set_selection(Selection::new(Position::new(text, 6), Position::new(text, 8)));

        insert_component(&mut doc, Component::new("Time", "'short': true", "Time", "9:41"));

        assert_snapshot!(doc.format_tree(), @r#"
        body
          text "Time: "
          component Time "9:41"
          text "!"
        "#);
    }

    #[test]
    fn test_insert_component_replaces_selected_component() {
        let mut doc = Document::new();
        let old = doc.create_component(Component::new("Hour", "", "Hour", "12"));
        doc.append_child(doc.root(), old);
        doc.set_selection(Selection::new(Position::new(old, 0), Position::new(old, 1)));

        let new = insert_component(&mut doc, Component::new("Minute", "", "Minute", "30")).unwrap();

        assert!(!doc.is_attached(old));
        assert_eq!(doc.children(doc.root()), &[new]);
    }

    #[test]
    fn test_insert_component_without_selection_is_noop() {
        let mut doc = Document::new();
        let inserted = insert_component(&mut doc, Component::new("Hour", "", "Hour", "12"));
        assert_eq!(inserted, None);
        assert!(doc.children(doc.root()).is_empty());
    }

    #[test]
    fn test_refresh_components_only_touches_kind() {
        let mut doc = Document::new();
        let root = doc.root();
        let hour = doc.create_component(Component::new("Hour", "'alternative': true", "Hour", "1"));
        let minute = doc.create_component(Component::new("Minute", "", "Minute", "2"));
        doc.append_child(root, hour);
        doc.append_child(root, minute);

        let changed = refresh_components(&mut doc, "Hour", |options| {
            if options.get("alternative") == Some("true") {
                "13".to_string()
            } else {
                "1".to_string()
            }
        });

        assert_eq!(changed, 1);
        assert_eq!(doc.component(hour).unwrap().value, "13");
        assert_eq!(doc.component(minute).unwrap().value, "2");
    }

    #[test]
    fn test_refresh_components_clamps_stale_offsets() {
        let mut doc = Document::new();
        let node = doc.create_component(Component::new("Time", "", "Time", "12:00:00"));
        doc.append_child(doc.root(), node);
        doc.set_selection(Selection::collapsed(Position::new(node, 7)));

        refresh_components(&mut doc, "Time", |_| "9:41".to_string());

        assert_eq!(
            doc.selection(),
            Some(Selection::collapsed(Position::new(node, 4)))
        );
    }

    #[test]
    fn test_refresh_titles() {
        let mut doc = Document::new();
        let node = doc.create_component(Component::new("Hour", "", "", "12"));
        doc.append_child(doc.root(), node);

        refresh_titles(&mut doc, |kind| format!("{kind} of the day"));

        assert_eq!(doc.component(node).unwrap().title, "Hour of the day");
    }
}
