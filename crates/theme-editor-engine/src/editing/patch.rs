use crate::editing::{NodeId, Selection};

/// Result of applying a command
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Nodes that were created, restyled or moved by the command
    pub changed: Vec<NodeId>,
    pub new_selection: Option<Selection>,
    pub version: u64,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }
}
