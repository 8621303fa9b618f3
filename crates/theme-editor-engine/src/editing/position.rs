use std::cmp::Ordering;

use serde::Serialize;

use crate::editing::{Document, NodeId};

/// A boundary point in the document tree.
///
/// For a text run the offset counts characters; for a container it counts
/// children. A position whose node is a component addresses a character of
/// the component's rendered value, which is never a legal place for a user
/// boundary to rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Which way the user is currently extending the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// Anchor/focus pair as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Where the gesture started
    pub anchor: Position,
    /// Where the gesture currently ends
    pub focus: Position,
}

impl Selection {
    pub fn new(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    /// A plain cursor
    pub fn collapsed(at: Position) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }

    /// Forward selection covering the range, the way a host writes back an added range
    pub fn from_range(range: &DocRange) -> Self {
        Self {
            anchor: range.start,
            focus: range.end,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Forward when focus is at or after anchor in document order
    pub fn direction(&self, doc: &Document) -> Direction {
        match doc.compare_positions(&self.focus, &self.anchor) {
            Ordering::Less => Direction::Backward,
            _ => Direction::Forward,
        }
    }

    /// Ordered start/end view of this selection
    pub fn range(&self, doc: &Document) -> DocRange {
        match self.direction(doc) {
            Direction::Forward => DocRange {
                start: self.anchor,
                end: self.focus,
            },
            Direction::Backward => DocRange {
                start: self.focus,
                end: self.anchor,
            },
        }
    }
}

/// Ordered pair of positions, `start` never after `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocRange {
    pub start: Position,
    pub end: Position,
}

impl DocRange {
    pub fn new(doc: &Document, a: Position, b: Position) -> Self {
        if doc.compare_positions(&a, &b) == Ordering::Greater {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    pub fn collapsed(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Move the start boundary; if it passes the end the range collapses onto it
    pub fn set_start(&mut self, doc: &Document, position: Position) {
        self.start = position;
        if doc.compare_positions(&self.start, &self.end) == Ordering::Greater {
            self.end = position;
        }
    }

    /// Move the end boundary; if it passes the start the range collapses onto it
    pub fn set_end(&mut self, doc: &Document, position: Position) {
        self.end = position;
        if doc.compare_positions(&self.end, &self.start) == Ordering::Less {
            self.start = position;
        }
    }
}

impl Document {
    /// Compare two boundary points in document order.
    ///
    /// Points in different trees (a detached subtree, or an id this document
    /// never handed out) are ordered by the id of their topmost node, so the
    /// result stays a total order.
    pub fn compare_positions(&self, a: &Position, b: &Position) -> Ordering {
        if a.node == b.node {
            return a.offset.cmp(&b.offset);
        }

        let top_a = self.topmost(a.node);
        let top_b = self.topmost(b.node);
        if top_a != top_b {
            return top_a.cmp(&top_b);
        }

        let path_a = self.path(a.node);
        let path_b = self.path(b.node);

        if path_b.starts_with(&path_a)
            && let Some(&child_index) = path_b.get(path_a.len())
        {
            // a's node is an ancestor of b's node
            return if a.offset <= child_index {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }

        if path_a.starts_with(&path_b)
            && let Some(&child_index) = path_a.get(path_b.len())
        {
            return if b.offset <= child_index {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        path_a.cmp(&path_b)
    }

    fn topmost(&self, node: NodeId) -> NodeId {
        if !self.contains(node) {
            return node;
        }
        self.ancestors(node).last().unwrap_or(node)
    }

    /// Child indices leading from the root to `node`
    fn path(&self, node: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = node;
        while let Some(index) = self.index_in_parent(current) {
            path.push(index);
            match self.parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        path.reverse();
        path
    }
}
