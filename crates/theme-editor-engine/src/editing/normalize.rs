//! Boundary normalization.
//!
//! Hosts report selections wherever the pointer or caret happened to land,
//! including offsets inside a component's rendered value. Normalization
//! moves such boundaries to the component's outer edges so a component is
//! either wholly selected or not at all.
//!
//! The anchor side and the focus side are corrected independently, each by
//! walking up from its node to the nearest component:
//!
//! | side   | forward                  | backward                 |
//! |--------|--------------------------|--------------------------|
//! | anchor | start before component   | end after component      |
//! | focus  | end after component      | start before component   |
//!
//! A boundary the directional rule leaves inside a component (the rule only
//! moves one edge per side) is finally snapped to the nearer outer edge.

use crate::editing::{DocRange, Direction, Document, NodeId, Position, Selection};

/// Correct a raw selection so no boundary lies inside a component.
///
/// The result is a forward selection over the corrected range.
pub fn normalize(doc: &Document, raw: &Selection, direction: Direction) -> Selection {
    let mut range = raw.range(doc);

    if let Some(component) = doc.component_ancestor(raw.anchor.node) {
        match direction {
            Direction::Forward => {
                if let Some(before) = doc.position_before(component) {
                    range.set_start(doc, before);
                }
            }
            Direction::Backward => {
                if let Some(after) = doc.position_after(component) {
                    range.set_end(doc, after);
                }
            }
        }
    }

    if let Some(component) = doc.component_ancestor(raw.focus.node) {
        match direction {
            Direction::Forward => {
                if let Some(after) = doc.position_after(component) {
                    range.set_end(doc, after);
                }
            }
            Direction::Backward => {
                if let Some(before) = doc.position_before(component) {
                    range.set_start(doc, before);
                }
            }
        }
    }

    let range = snap_residual(doc, range);
    Selection::from_range(&range)
}

fn snap_residual(doc: &Document, range: DocRange) -> DocRange {
    let start = doc.outside_components(range.start);
    let end = doc.outside_components(range.end);
    DocRange::new(doc, start, end)
}

/// True when neither boundary sits inside a component
pub fn is_normalized(doc: &Document, selection: &Selection) -> bool {
    !inside_component(doc, &selection.anchor) && !inside_component(doc, &selection.focus)
}

fn inside_component(doc: &Document, position: &Position) -> bool {
    doc.component_ancestor(position.node).is_some()
}

/// Selection covering exactly one component, used after a click lands on it
pub fn select_component(doc: &Document, component: NodeId) -> Option<Selection> {
    let before = doc.position_before(component)?;
    let after = doc.position_after(component)?;
    Some(Selection::new(before, after))
}
