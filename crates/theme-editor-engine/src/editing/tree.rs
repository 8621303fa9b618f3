use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::editing::{Component, DocRange, Position, Selection};

/// Presentation property → value, ordered so serialization is deterministic
pub type StyleMap = BTreeMap<String, String>;

/// Stable index of a node in the document arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

/// Non-atomic element carrying presentation properties over a run of content
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Container {
    pub tag: String,
    pub style: StyleMap,
    /// Other source attributes (`class`, `id`, ...), kept for round-tripping
    pub attributes: BTreeMap<String, String>,
}

impl Container {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Text(String),
    Component(Component),
    Container(Container),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Editable theme document stored as an arena of nodes.
///
/// Nodes are addressed by [`NodeId`]s that stay valid for the lifetime of the
/// document. Removing a node only detaches it; the slot is never reused, so a
/// stale id held by a pending correction can be detected with
/// [`Document::is_attached`] instead of silently aliasing a new node.
///
/// The arena only grows: text splits, extraction clones and detached nodes
/// keep their slots for the life of the document. Long sessions reclaim them
/// by saving and re-parsing the theme source, which builds a fresh arena
/// holding only attached nodes.
///
/// The root is the document body: a container whose style map is the
/// document-wide default.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    /// Host's active selection (None until the user places a cursor)
    pub(crate) selection: Option<Selection>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the body
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Container(Container::new("body")),
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
            selection: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // ============ Selection ============

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Position is attached and its offset fits the node
    pub fn is_valid_position(&self, position: &Position) -> bool {
        self.is_attached(position.node) && position.offset <= self.length(position.node)
    }

    // ============ Queries ============

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Id was handed out by this document
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(id) && self.ancestors(id).last() == Some(self.root)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Text(_))
    }

    pub fn is_component(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Component(_))
    }

    pub fn is_container(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Container(_))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn component(&self, id: NodeId) -> Option<&Component> {
        match self.kind(id) {
            NodeKind::Component(component) => Some(component),
            _ => None,
        }
    }

    pub fn component_mut(&mut self, id: NodeId) -> Option<&mut Component> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Component(component) => Some(component),
            _ => None,
        }
    }

    /// Number of offsets a position in this node can take
    pub fn length(&self, id: NodeId) -> usize {
        match self.kind(id) {
            NodeKind::Text(text) => text.chars().count(),
            NodeKind::Component(component) => component.value.chars().count(),
            NodeKind::Container(_) => self.children(id).len(),
        }
    }

    /// Empty text, or a container without children; components never count as empty
    pub fn is_empty_node(&self, id: NodeId) -> bool {
        match self.kind(id) {
            NodeKind::Text(text) => text.is_empty(),
            NodeKind::Component(_) => false,
            NodeKind::Container(_) => self.children(id).is_empty(),
        }
    }

    /// `id` followed by its parent chain up to the topmost ancestor
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&node| self.parent(node))
    }

    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, of: NodeId) -> bool {
        self.ancestors(of).any(|node| node == ancestor)
    }

    /// Nearest atomic node at or above `id`
    pub fn component_ancestor(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).find(|&node| self.is_component(node))
    }

    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        self.ancestors(a)
            .find(|&candidate| self.is_inclusive_ancestor(candidate, b))
    }

    /// Child of `ancestor` on the path down to `descendant`
    fn child_toward(&self, ancestor: NodeId, descendant: NodeId) -> Option<NodeId> {
        self.ancestors(descendant)
            .find(|&node| self.parent(node) == Some(ancestor))
    }

    /// Subtree of `id` in document order, `id` first
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev());
        }
        out
    }

    /// All component nodes in document order
    pub fn components(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&node| self.is_component(node))
            .collect()
    }

    /// Concatenated visible text (component values included)
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|node| match self.kind(node) {
                NodeKind::Text(text) => Some(text.as_str()),
                NodeKind::Component(component) => Some(component.value.as_str()),
                NodeKind::Container(_) => None,
            })
            .collect()
    }

    pub fn position_before(&self, id: NodeId) -> Option<Position> {
        Some(Position::new(self.parent(id)?, self.index_in_parent(id)?))
    }

    pub fn position_after(&self, id: NodeId) -> Option<Position> {
        Some(Position::new(self.parent(id)?, self.index_in_parent(id)? + 1))
    }

    // ============ Style ============

    /// Declared style of an element; text runs have none
    pub fn style(&self, id: NodeId) -> Option<&StyleMap> {
        match self.kind(id) {
            NodeKind::Container(container) => Some(&container.style),
            NodeKind::Component(component) => Some(&component.style),
            NodeKind::Text(_) => None,
        }
    }

    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str) {
        let style = match &mut self.nodes[id.0].kind {
            NodeKind::Container(container) => &mut container.style,
            NodeKind::Component(component) => &mut component.style,
            NodeKind::Text(_) => return,
        };
        style.insert(property.to_string(), value.to_string());
    }

    /// Element whose style governs a position: the parent of a text run, otherwise the node itself
    pub fn containing_element(&self, position: &Position) -> Option<NodeId> {
        if self.is_text(position.node) {
            self.parent(position.node)
        } else {
            Some(position.node)
        }
    }

    // ============ Node creation ============

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    pub fn create_container(&mut self, container: Container) -> NodeId {
        self.push(NodeKind::Container(container))
    }

    pub fn create_component(&mut self, component: Component) -> NodeId {
        self.push(NodeKind::Component(component))
    }

    // ============ Structural edits ============

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child);
    }

    /// Insert `child` under `parent`, detaching it from wherever it was.
    /// Only containers accept children.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if !self.is_container(parent) {
            log::warn!("refusing to insert {child:?} under non-container {parent:?}");
            return;
        }
        if self.is_inclusive_ancestor(child, parent) {
            log::warn!("refusing to insert {child:?} inside itself");
            return;
        }

        let mut index = index;
        if self.parent(child) == Some(parent)
            && let Some(old) = self.index_in_parent(child)
            && old < index
        {
            index -= 1;
        }
        self.detach(child);

        let index = index.min(self.children(parent).len());
        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Remove `id` from its parent; the subtree stays intact and can be reinserted
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != id);
        }
    }

    /// Shallow copy of `original` holding `children`, detached
    fn wrap_in_clone(&mut self, original: NodeId, children: Vec<NodeId>) -> NodeId {
        let kind = self.kind(original).clone();
        let clone = self.push(kind);
        for child in children {
            self.append_child(clone, child);
        }
        clone
    }

    /// Split a text run at a character offset; returns the new right-hand run
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Option<NodeId> {
        let text = self.text(id)?;
        let at = byte_index(text, offset);
        let right = text[at..].to_string();
        if let NodeKind::Text(text) = &mut self.nodes[id.0].kind {
            text.truncate(at);
        }

        let right = self.create_text(right);
        if let (Some(parent), Some(index)) = (self.parent(id), self.index_in_parent(id)) {
            self.insert_child(parent, index + 1, right);
        }
        Some(right)
    }

    /// Remove characters `start..end` from a text run and return them
    fn take_text(&mut self, id: NodeId, start: usize, end: usize) -> String {
        match &mut self.nodes[id.0].kind {
            NodeKind::Text(text) => {
                let from = byte_index(text, start);
                let to = byte_index(text, end);
                text.drain(from..to).collect()
            }
            _ => String::new(),
        }
    }

    /// Insert a detached node at a boundary point.
    ///
    /// A position inside a text run splits the run; a position inside a
    /// component is moved to whichever outer edge is nearer, so the new node
    /// never lands within atomic content.
    pub fn insert_at(&mut self, position: Position, node: NodeId) {
        let position = self.outside_components(position);
        match self.kind(position.node) {
            NodeKind::Text(_) => {
                let length = self.length(position.node);
                let (Some(parent), Some(index)) = (
                    self.parent(position.node),
                    self.index_in_parent(position.node),
                ) else {
                    return;
                };
                if position.offset == 0 {
                    self.insert_child(parent, index, node);
                } else if position.offset >= length {
                    self.insert_child(parent, index + 1, node);
                } else {
                    self.split_text(position.node, position.offset);
                    self.insert_child(parent, index + 1, node);
                }
            }
            NodeKind::Container(_) => self.insert_child(position.node, position.offset, node),
            NodeKind::Component(_) => {}
        }
    }

    /// Nearest legal boundary for a position that may sit inside a component
    pub fn outside_components(&self, position: Position) -> Position {
        let Some(component) = self.component_ancestor(position.node) else {
            return position;
        };
        let nearer_start = position.node == component
            && position.offset * 2 <= self.length(component);
        let edge = if nearer_start {
            self.position_before(component)
        } else {
            self.position_after(component)
        };
        edge.unwrap_or(position)
    }

    /// Widen a range so neither boundary lies inside a component
    pub fn expand_to_atomic_edges(&self, range: &DocRange) -> DocRange {
        let mut range = *range;
        if let Some(component) = self.component_ancestor(range.start.node)
            && let Some(before) = self.position_before(component)
        {
            range.start = before;
        }
        if let Some(component) = self.component_ancestor(range.end.node)
            && let Some(after) = self.position_after(component)
        {
            range.end = after;
        }
        range
    }

    /// Remove the content of a range from the tree and return it as detached
    /// top-level nodes, together with the collapsed point the range now denotes.
    ///
    /// Partially selected elements are split: the selected half moves into a
    /// shallow clone, the rest stays in place. Empty halves are dropped
    /// rather than carried as empty runs. Components are never split; a
    /// boundary inside one widens to take the whole node.
    pub fn extract(&mut self, range: &DocRange) -> (Vec<NodeId>, Position) {
        let range = self.expand_to_atomic_edges(range);
        if range.is_collapsed() {
            return (Vec::new(), range.start);
        }
        self.extract_inner(range.start, range.end)
    }

    fn extract_inner(&mut self, start: Position, end: Position) -> (Vec<NodeId>, Position) {
        let mut fragment = Vec::new();

        if start.node == end.node {
            if self.is_text(start.node) {
                let taken = self.take_text(start.node, start.offset, end.offset);
                fragment.push(self.create_text(taken));
            } else {
                let moved: Vec<NodeId> =
                    self.children(start.node)[start.offset..end.offset].to_vec();
                for child in moved {
                    self.detach(child);
                    fragment.push(child);
                }
            }
            return (fragment, start);
        }

        let Some(common) = self.common_ancestor(start.node, end.node) else {
            return (fragment, start);
        };

        let first_partial = if self.is_inclusive_ancestor(start.node, end.node) {
            None
        } else {
            self.child_toward(common, start.node)
        };
        let last_partial = if self.is_inclusive_ancestor(end.node, start.node) {
            None
        } else {
            self.child_toward(common, end.node)
        };

        let from = match first_partial {
            Some(child) => self.index_in_parent(child).map_or(0, |i| i + 1),
            None => start.offset,
        };
        let to = match last_partial {
            Some(child) => self.index_in_parent(child).unwrap_or(from),
            None => end.offset,
        };
        let contained: Vec<NodeId> = self.children(common)[from..to.max(from)].to_vec();

        let collapsed = match first_partial {
            None => start,
            Some(_) => Position::new(common, from),
        };

        if let Some(child) = first_partial {
            if self.is_text(child) {
                let length = self.length(child);
                let taken = self.take_text(child, start.offset, length);
                if !taken.is_empty() {
                    fragment.push(self.create_text(taken));
                }
            } else {
                let child_end = Position::new(child, self.length(child));
                let (inner, _) = self.extract_inner(start, child_end);
                if !inner.is_empty() {
                    fragment.push(self.wrap_in_clone(child, inner));
                }
            }
        }

        for child in contained {
            self.detach(child);
            fragment.push(child);
        }

        if let Some(child) = last_partial {
            if self.is_text(child) {
                let taken = self.take_text(child, 0, end.offset);
                if !taken.is_empty() {
                    fragment.push(self.create_text(taken));
                }
            } else {
                let (inner, _) = self.extract_inner(Position::new(child, 0), end);
                if !inner.is_empty() {
                    fragment.push(self.wrap_in_clone(child, inner));
                }
            }
        }

        (fragment, collapsed)
    }

    /// Delete the content of a range; returns the collapsed point left behind
    pub fn delete_contents(&mut self, range: &DocRange) -> Position {
        let (_, collapsed) = self.extract(range);
        collapsed
    }

    /// Detach `from` and its ancestors below `stop` while they are empty.
    /// Returns the topmost node removed.
    pub fn prune_empty(&mut self, from: NodeId, stop: NodeId) -> Option<NodeId> {
        let mut removed = None;
        let mut current = from;
        while current != stop && current != self.root && self.is_empty_node(current) {
            let parent = self.parent(current);
            self.detach(current);
            removed = Some(current);
            match parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        removed
    }

    // ============ Debugging ============

    /// Indented dump of the attached tree, one node per line
    pub fn format_tree(&self) -> String {
        let mut out = String::new();
        self.format_node(self.root, 0, &mut out);
        out
    }

    fn format_node(&self, id: NodeId, indent: usize, out: &mut String) {
        let prefix = "  ".repeat(indent);
        let _ = match self.kind(id) {
            NodeKind::Text(text) => writeln!(out, "{prefix}text {text:?}"),
            NodeKind::Component(component) => writeln!(
                out,
                "{prefix}component {} {:?}{}",
                component.kind,
                component.value,
                format_style(&component.style)
            ),
            NodeKind::Container(container) => writeln!(
                out,
                "{prefix}{}{}",
                container.tag,
                format_style(&container.style)
            ),
        };
        for &child in self.children(id) {
            self.format_node(child, indent + 1, out);
        }
    }
}

fn format_style(style: &StyleMap) -> String {
    if style.is_empty() {
        return String::new();
    }
    let declarations: Vec<String> = style.iter().map(|(p, v)| format!("{p}: {v}")).collect();
    format!(" [{}]", declarations.join("; "))
}

/// Byte index of a character offset, clamped to the end of the string
pub(crate) fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map_or(text.len(), |(index, _)| index)
}
