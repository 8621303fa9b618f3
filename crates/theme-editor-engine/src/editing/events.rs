use std::collections::VecDeque;

use crate::editing::components::{self, Notification};
use crate::editing::normalize::{normalize, select_component};
use crate::editing::style::{self, StyleTarget};
use crate::editing::{Component, ComponentOptions, Document, EditingSession, NodeId, Patch, Selection};

/// Behaviour switches a host can flip per surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorOptions {
    /// A plain click on a component selects the whole component once the
    /// host's own click handling has settled
    pub click_selects_component: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            click_selects_component: true,
        }
    }
}

/// Input events a host forwards to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    /// The host's native selection moved
    SelectionChanged(Selection),
    PointerDown { shift: bool },
    PointerUp { shift: bool },
    KeyUp { shift: bool },
    Click { target: NodeId, shift: bool },
    DragStart,
}

/// What the host should do after dispatching an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The editor acted on the event
    Handled,
    /// Nothing to do; host default behaviour applies
    Ignored,
    /// Host must cancel its default action
    PreventDefault,
    /// A correction is queued and runs on the next [`Editor::settle`]
    Deferred,
}

/// Edits requested by toolbar and command collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    SetStyle { property: String, value: String },
    InsertComponent(Component),
}

/// Handler set a host registers against its event source.
///
/// `dispatch` routes an [`EditorEvent`] to the matching handler so hosts that
/// already have an event enum don't need their own match.
pub trait SelectionEvents {
    fn selection_changed(&mut self, selection: Selection) -> EventOutcome;
    fn pointer_down(&mut self, shift: bool) -> EventOutcome;
    fn pointer_up(&mut self, shift: bool) -> EventOutcome;
    fn key_up(&mut self, shift: bool) -> EventOutcome;
    fn click(&mut self, target: NodeId, shift: bool) -> EventOutcome;

    fn drag_start(&mut self) -> EventOutcome {
        EventOutcome::PreventDefault
    }

    fn dispatch(&mut self, event: EditorEvent) -> EventOutcome {
        match event {
            EditorEvent::SelectionChanged(selection) => self.selection_changed(selection),
            EditorEvent::PointerDown { shift } => self.pointer_down(shift),
            EditorEvent::PointerUp { shift } => self.pointer_up(shift),
            EditorEvent::KeyUp { shift } => self.key_up(shift),
            EditorEvent::Click { target, shift } => self.click(target, shift),
            EditorEvent::DragStart => self.drag_start(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeferredTask {
    SelectComponent(NodeId),
}

/// One editable surface: its document, selection history and pending
/// corrections.
///
/// Events go through two phases. [`Editor::handle`] runs the immediate
/// reaction; anything that must observe the host's post-event selection is
/// queued and runs on [`Editor::settle`]. Queued work is also flushed before
/// the next event or command, so a correction never runs against a newer
/// gesture than the one that queued it.
#[derive(Debug, Clone)]
pub struct Editor {
    document: Document,
    session: EditingSession,
    options: EditorOptions,
    pending: VecDeque<DeferredTask>,
    outbox: Vec<Notification>,
    version: u64,
}

impl Editor {
    pub fn new(document: Document, options: EditorOptions) -> Self {
        Self {
            document,
            session: EditingSession::new(),
            options,
            pending: VecDeque::new(),
            outbox: Vec::new(),
            version: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn session(&self) -> &EditingSession {
        &self.session
    }

    pub fn options(&self) -> EditorOptions {
        self.options
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn selection(&self) -> Option<Selection> {
        self.document.selection()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// First phase: flush earlier corrections, then react to `event`
    pub fn handle(&mut self, event: EditorEvent) -> EventOutcome {
        self.settle();
        self.dispatch(event)
    }

    /// Second phase: run queued corrections against the current selection.
    /// Returns how many ran.
    pub fn settle(&mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.pending.pop_front() {
            match task {
                DeferredTask::SelectComponent(node) => {
                    if !self.document.is_attached(node) {
                        log::warn!("clicked component {node:?} is gone, skipping selection");
                        continue;
                    }
                    if let Some(selection) = select_component(&self.document, node) {
                        log::debug!("selecting clicked component {node:?}");
                        self.document.set_selection(selection);
                        self.session.remember(selection.range(&self.document));
                    }
                }
            }
            ran += 1;
        }
        ran
    }

    /// Snap the host's selection out of any component, unless the user is
    /// shift-extending and the host's native extension should carry on
    fn fix_final_selection(&mut self, shift: bool) -> EventOutcome {
        if shift {
            return EventOutcome::Ignored;
        }
        let Some(raw) = self.document.selection() else {
            return EventOutcome::Ignored;
        };
        if !self.document.is_valid_position(&raw.anchor)
            || !self.document.is_valid_position(&raw.focus)
        {
            log::warn!("ignoring stale selection {raw:?}");
            return EventOutcome::Ignored;
        }

        let direction = self.session.direction();
        let fixed = normalize(&self.document, &raw, direction);
        if fixed != raw {
            log::debug!("normalized {direction:?} selection {raw:?} to {fixed:?}");
        }
        self.document.set_selection(fixed);
        self.session.remember(fixed.range(&self.document));
        EventOutcome::Handled
    }

    // ============ Commands ============

    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        self.settle();
        let changed = match cmd {
            Cmd::SetStyle { property, value } => self
                .apply_style(&property, &value)
                .node(self.document.root())
                .into_iter()
                .collect(),
            Cmd::InsertComponent(component) => {
                self.insert_component(component).into_iter().collect()
            }
        };
        Patch {
            changed,
            new_selection: self.document.selection(),
            version: self.version,
        }
    }

    pub fn apply_style(&mut self, property: &str, value: &str) -> StyleTarget {
        let target = style::apply_style(&mut self.document, property, value);
        if target != StyleTarget::Nothing {
            self.version += 1;
        }
        target
    }

    pub fn insert_component(&mut self, component: Component) -> Option<NodeId> {
        let node = components::insert_component(&mut self.document, component)?;
        self.version += 1;
        Some(node)
    }

    pub fn resolved_style(&self, property: &str) -> Option<String> {
        style::resolved_style(&self.document, property)
    }

    /// Recompute every `kind` component and queue a change notification
    /// when there was at least one
    pub fn refresh_components<F>(&mut self, kind: &str, value_for: F) -> usize
    where
        F: FnMut(&ComponentOptions) -> String,
    {
        let changed = components::refresh_components(&mut self.document, kind, value_for);
        if changed > 0 {
            self.version += 1;
            let notification = Notification::ComponentValueChanged {
                kind: kind.to_string(),
            };
            log::debug!("{} for {changed} component(s)", notification.name());
            self.outbox.push(notification);
        }
        changed
    }

    pub fn refresh_titles<F>(&mut self, title_for: F)
    where
        F: FnMut(&str) -> String,
    {
        components::refresh_titles(&mut self.document, title_for);
    }

    /// Take the notifications produced since the last call
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }
}

impl SelectionEvents for Editor {
    fn selection_changed(&mut self, selection: Selection) -> EventOutcome {
        if !self.document.is_valid_position(&selection.anchor)
            || !self.document.is_valid_position(&selection.focus)
        {
            log::warn!("ignoring selection {selection:?} outside the document");
            return EventOutcome::Ignored;
        }
        self.document.set_selection(selection);
        self.session.update_direction(&self.document, &selection);
        EventOutcome::Handled
    }

    fn pointer_down(&mut self, shift: bool) -> EventOutcome {
        self.fix_final_selection(shift)
    }

    fn pointer_up(&mut self, shift: bool) -> EventOutcome {
        self.fix_final_selection(shift)
    }

    fn key_up(&mut self, shift: bool) -> EventOutcome {
        self.fix_final_selection(shift)
    }

    fn click(&mut self, target: NodeId, shift: bool) -> EventOutcome {
        if shift || !self.options.click_selects_component {
            return EventOutcome::Ignored;
        }
        if !self.document.is_attached(target) {
            log::warn!("ignoring click on {target:?}, not in the document");
            return EventOutcome::Ignored;
        }
        let Some(component) = self.document.component_ancestor(target) else {
            return EventOutcome::Ignored;
        };
        self.pending.push_back(DeferredTask::SelectComponent(component));
        EventOutcome::Deferred
    }
}
