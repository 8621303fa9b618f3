use crate::editing::{Container, DocRange, Document, NodeId, Position, Selection};

/// Where a style application ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleTarget {
    /// No active selection; nothing changed
    Nothing,
    /// Collapsed selection: the document-wide default was changed
    Document,
    /// A single element (shared by both endpoints, or exactly selected) was restyled in place
    Element(NodeId),
    /// Selected content moved into a newly created container
    Wrapped(NodeId),
    /// Selected content filled its emptied common parent, which was restyled
    Reused(NodeId),
}

impl StyleTarget {
    /// Node whose declared style now holds the property, if any
    pub fn node(&self, root: NodeId) -> Option<NodeId> {
        match *self {
            StyleTarget::Nothing => None,
            StyleTarget::Document => Some(root),
            StyleTarget::Element(node) | StyleTarget::Wrapped(node) | StyleTarget::Reused(node) => {
                Some(node)
            }
        }
    }
}

/// Apply `property: value` to the current selection without splitting any component.
pub(crate) fn apply_style(doc: &mut Document, property: &str, value: &str) -> StyleTarget {
    let Some(selection) = doc.selection else {
        return StyleTarget::Nothing;
    };
    if !doc.is_valid_position(&selection.anchor) || !doc.is_valid_position(&selection.focus) {
        log::warn!("selection {selection:?} is stale; {property} not applied");
        return StyleTarget::Nothing;
    }

    if selection.is_collapsed() {
        log::debug!("collapsed selection, setting document default {property}: {value}");
        let root = doc.root();
        doc.set_style_property(root, property, value);
        return StyleTarget::Document;
    }

    if let Some(element) = selected_element(doc, &selection) {
        log::debug!("restyling selected {element:?}: {property}: {value}");
        doc.set_style_property(element, property, value);
        return StyleTarget::Element(element);
    }

    let start_element = owning_element(doc, &selection.anchor);
    let end_element = owning_element(doc, &selection.focus);
    if let (Some(start), Some(end)) = (start_element, end_element)
        && start == end
    {
        log::debug!("restyling {start:?} in place: {property}: {value}");
        doc.set_style_property(start, property, value);
        return StyleTarget::Element(start);
    }

    wrap_selection(doc, &selection, start_element, end_element, property, value)
}

/// Element an endpoint sits in: a text run's parent or the component itself.
/// A boundary between a container's children belongs to no single element.
fn owning_element(doc: &Document, position: &Position) -> Option<NodeId> {
    if doc.is_container(position.node) {
        None
    } else {
        doc.containing_element(position)
    }
}

/// The one element child a selection covers exactly, as left behind by a
/// wrap or a component click
fn selected_element(doc: &Document, selection: &Selection) -> Option<NodeId> {
    let range = selection.range(doc);
    if range.start.node != range.end.node || range.end.offset != range.start.offset + 1 {
        return None;
    }
    if !doc.is_container(range.start.node) {
        return None;
    }
    let child = *doc.children(range.start.node).get(range.start.offset)?;
    (!doc.is_text(child)).then_some(child)
}

/// Multi-element case: lift the selected content out, drop the husks it
/// leaves behind and re-home it under one styled container.
fn wrap_selection(
    doc: &mut Document,
    selection: &Selection,
    start_element: Option<NodeId>,
    end_element: Option<NodeId>,
    property: &str,
    value: &str,
) -> StyleTarget {
    let shared_parent = match (
        start_element.and_then(|node| doc.parent(node)),
        end_element.and_then(|node| doc.parent(node)),
    ) {
        (Some(a), Some(b)) if a == b => Some(a),
        _ => None,
    };

    let range = doc.expand_to_atomic_edges(&selection.range(doc));
    let (fragment, at) = doc.extract(&range);
    if fragment.is_empty() {
        log::debug!("selection {selection:?} holds no content, {property} not applied");
        return StyleTarget::Nothing;
    }
    let Some((parent, index)) = split_point(doc, at) else {
        return StyleTarget::Nothing;
    };

    let left = index
        .checked_sub(1)
        .and_then(|i| doc.children(parent).get(i).copied());
    doc.prune_empty(range.start.node, parent);
    doc.prune_empty(range.end.node, parent);
    let left_pruned = left.is_some_and(|node| doc.parent(node) != Some(parent));
    let index = index - usize::from(left_pruned);

    if let Some(shared) = shared_parent
        && shared != doc.root()
        && doc.is_container(shared)
        && doc.is_attached(shared)
        && doc.children(shared).is_empty()
    {
        log::debug!("reusing emptied {shared:?} as wrapper for {property}: {value}");
        for node in fragment {
            doc.append_child(shared, node);
        }
        doc.set_style_property(shared, property, value);
        let end = doc.length(shared);
        doc.selection = Some(Selection::new(
            Position::new(shared, 0),
            Position::new(shared, end),
        ));
        return StyleTarget::Reused(shared);
    }

    let wrapper = doc.create_container(Container::new("span"));
    for node in fragment {
        doc.append_child(wrapper, node);
    }
    doc.set_style_property(wrapper, property, value);
    doc.insert_child(parent, index, wrapper);
    log::debug!("wrapped selection in {wrapper:?} under {parent:?}: {property}: {value}");

    let selected = DocRange {
        start: Position::new(parent, index),
        end: Position::new(parent, index + 1),
    };
    doc.selection = Some(Selection::from_range(&selected));
    StyleTarget::Wrapped(wrapper)
}

/// Express a collapsed point as (container, child index), splitting a text run if needed
fn split_point(doc: &mut Document, at: Position) -> Option<(NodeId, usize)> {
    if doc.is_container(at.node) {
        return Some((at.node, at.offset));
    }

    let at = doc.outside_components(at);
    if doc.is_container(at.node) {
        return Some((at.node, at.offset));
    }

    let parent = doc.parent(at.node)?;
    let index = doc.index_in_parent(at.node)?;
    if at.offset == 0 {
        Some((parent, index))
    } else if at.offset >= doc.length(at.node) {
        Some((parent, index + 1))
    } else {
        doc.split_text(at.node, at.offset);
        Some((parent, index + 1))
    }
}

/// Value of `property` in effect at the selection anchor.
///
/// Walks from the anchor's element up to the body and returns the nearest
/// declaration. A boundary between children reads the element just after it.
pub(crate) fn resolved_style(doc: &Document, property: &str) -> Option<String> {
    let selection = doc.selection?;
    let anchor = selection.anchor;
    if !doc.is_valid_position(&anchor) {
        return None;
    }
    let element = match doc.children(anchor.node).get(anchor.offset) {
        Some(&child) if doc.is_container(anchor.node) && !doc.is_text(child) => child,
        _ => doc.containing_element(&anchor)?,
    };
    doc.ancestors(element)
        .find_map(|node| doc.style(node).and_then(|style| style.get(property)))
        .cloned()
}
