use crate::editing::{DocRange, Direction, Document, Selection};

/// Decide the extension direction from the previous and current selection.
///
/// Backward exactly when the start point stayed where it was and the end
/// point moved. Anything else, including the very first selection and a
/// fresh click that shares no endpoint with the previous one, counts as
/// forward.
///
/// This compares one shared endpoint only, so a new gesture that happens to
/// start where the previous selection started is classified the same way as
/// an extension. Kept as is: callers depend on the exact rule.
pub fn infer_direction(previous: Option<&DocRange>, current: &DocRange) -> Direction {
    match previous {
        Some(previous) if previous.start == current.start && previous.end != current.end => {
            Direction::Backward
        }
        _ => Direction::Forward,
    }
}

/// Per-surface selection history used to infer direction.
///
/// One session belongs to one editable surface and lives as long as that
/// surface's editing session; hosts with several surfaces keep one each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditingSession {
    previous: Option<DocRange>,
    direction: Direction,
}

impl EditingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn previous(&self) -> Option<&DocRange> {
        self.previous.as_ref()
    }

    /// Run the direction tracker for a freshly reported selection and
    /// remember it for the next call
    pub fn update_direction(&mut self, doc: &Document, current: &Selection) -> Direction {
        let range = current.range(doc);
        self.direction = infer_direction(self.previous.as_ref(), &range);
        log::trace!("direction {:?} for {range:?}", self.direction);
        self.previous = Some(range);
        self.direction
    }

    /// Record the outcome of a normalization as the latest selection
    pub fn remember(&mut self, range: DocRange) {
        self.previous = Some(range);
    }

    /// Forget all history, as at the start of a session
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
