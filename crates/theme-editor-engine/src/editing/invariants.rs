//! Structural and atomicity checks over a document.
//!
//! None of the editing operations report errors; a bug shows up as a tree
//! that quietly breaks one of these rules. Tests and the CLI run the checks
//! after every operation.

use std::collections::HashSet;

use crate::editing::{Document, NodeId, NodeKind, Position};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("{child:?} is a child of {parent:?} but points at {actual:?}")]
    BrokenParentLink {
        parent: NodeId,
        child: NodeId,
        actual: Option<NodeId>,
    },
    #[error("{0:?} is reachable more than once")]
    SharedNode(NodeId),
    #[error("{0:?} has children but only containers may")]
    LeafWithChildren(NodeId),
    #[error("selection boundary {0:?} is not a valid position")]
    InvalidBoundary(Position),
    #[error("selection boundary {0:?} lies inside a component")]
    BoundaryInsideComponent(Position),
}

/// Every rule the attached tree breaks, in document order
pub fn tree_violations(doc: &Document) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut seen = HashSet::new();

    for node in doc.descendants(doc.root()) {
        if !seen.insert(node) {
            violations.push(Violation::SharedNode(node));
            continue;
        }
        if !matches!(doc.kind(node), NodeKind::Container(_)) && !doc.children(node).is_empty() {
            violations.push(Violation::LeafWithChildren(node));
        }
        for &child in doc.children(node) {
            let actual = doc.parent(child);
            if actual != Some(node) {
                violations.push(Violation::BrokenParentLink {
                    parent: node,
                    child,
                    actual,
                });
            }
        }
    }

    violations
}

/// Problems with the active selection; an absent selection has none
pub fn selection_violations(doc: &Document) -> Vec<Violation> {
    let Some(selection) = doc.selection() else {
        return Vec::new();
    };

    [selection.anchor, selection.focus]
        .into_iter()
        .filter_map(|boundary| {
            if !doc.is_valid_position(&boundary) {
                Some(Violation::InvalidBoundary(boundary))
            } else if doc.component_ancestor(boundary.node).is_some() {
                Some(Violation::BoundaryInsideComponent(boundary))
            } else {
                None
            }
        })
        .collect()
}

/// Panic with every violation listed
pub fn assert_consistent(doc: &Document) {
    let mut violations = tree_violations(doc);
    violations.extend(selection_violations(doc));
    if !violations.is_empty() {
        let listed: Vec<String> = violations.iter().map(ToString::to_string).collect();
        panic!(
            "document is inconsistent:\n  {}\n{}",
            listed.join("\n  "),
            doc.format_tree()
        );
    }
}
