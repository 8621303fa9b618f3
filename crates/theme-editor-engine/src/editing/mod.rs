/*!
 * # Editing Core Module
 *
 * Selection management for an editable theme document in which some inline
 * nodes ("components") are atomic placeholders for a computed value, such as
 * the current hour. A component is selected, moved, styled and deleted as a
 * whole, never character by character.
 *
 * ## Architecture Overview
 *
 * ### 1. Arena Document Tree
 * - The document is an arena of nodes addressed by stable [`NodeId`]s
 * - Nodes are text runs, components or style containers; only containers have children
 * - The root is the body container, whose style is the document-wide default
 * - Detached nodes keep their ids, so queued corrections can detect removal
 *
 * ### 2. Explicit Editing Session
 * - Selection history lives in a caller-owned [`EditingSession`], one per surface
 * - The direction tracker compares each reported selection with the previous one
 *
 * ### 3. Boundary Normalization
 * - On pointer and key release the host's selection is snapped out of components
 * - The correction rule depends on the tracked [`Direction`]
 * - Shift-extensions are left to the host's native behaviour
 *
 * ### 4. Atomic-Safe Edits
 * - Styling a multi-element selection extracts it and re-wraps it in one container
 * - Component insertion replaces the selection with a new atomic node
 * - Extraction widens any boundary inside a component to the component's edge
 *
 * ### 5. Two-Phase Events
 * - [`Editor::handle`] reacts immediately; [`Editor::settle`] runs corrections
 *   that must observe the host's post-event selection (click-to-select)
 *
 * ## Module Structure
 *
 * - **`tree`**: arena [`Document`] and structural edits
 * - **`position`**: [`Position`], [`Selection`], [`DocRange`], [`Direction`]
 * - **`session`**: [`EditingSession`] and the direction rule
 * - **`normalize`**: boundary normalizer
 * - **`style`**: style applicator and resolved-style query
 * - **`components`**: component inserter, value refresh, notifications
 * - **`events`**: [`Editor`], event handlers and commands
 * - **`patch`**: command result metadata
 * - **`invariants`**: consistency checks used by tests and tooling
 *
 * ## Usage Pattern
 *
 * ```rust
 * use theme_editor_engine::editing::*;
 *
 * let mut doc = Document::new();
 * let text = doc.create_text("Time: ");
 * doc.append_child(doc.root(), text);
 *
 * let mut editor = Editor::new(doc, EditorOptions::default());
 *
 * // Host reports a caret at the end of the text, then the key is released
 * editor.handle(EditorEvent::SelectionChanged(Selection::collapsed(Position::new(text, 6))));
 * editor.handle(EditorEvent::KeyUp { shift: false });
 *
 * // Toolbar inserts a clock placeholder
 * let patch = editor.apply(Cmd::InsertComponent(Component::new(
 *     "Hour", "'alternative': true", "Hour", "21",
 * )));
 * assert_eq!(patch.version, 1);
 * ```
 */

pub mod components;
pub mod events;
pub mod invariants;
pub mod normalize;
pub mod patch;
pub mod position;
pub mod session;
pub mod style;
pub mod tree;

// Public API re-exports
pub use components::{Component, ComponentOptions, Notification};
pub use events::{Cmd, Editor, EditorEvent, EditorOptions, EventOutcome, SelectionEvents};
pub use normalize::{is_normalized, normalize, select_component};
pub use patch::Patch;
pub use position::{DocRange, Direction, Position, Selection};
pub use session::{EditingSession, infer_direction};
pub use style::StyleTarget;
pub use tree::{Container, Document, NodeId, NodeKind, StyleMap};

impl Document {
    /// Apply a style property to the current selection (see [`Editor::apply_style`])
    pub fn apply_style(&mut self, property: &str, value: &str) -> StyleTarget {
        style::apply_style(self, property, value)
    }

    /// Value of a style property in effect at the selection anchor
    pub fn resolved_style(&self, property: &str) -> Option<String> {
        style::resolved_style(self, property)
    }

    /// Replace the current selection with a component node
    pub fn insert_component(&mut self, component: Component) -> Option<NodeId> {
        components::insert_component(self, component)
    }
}
