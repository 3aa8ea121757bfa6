//! Project management and edit events.

use std::path::PathBuf;
use uuid::Uuid;

use crate::entities::{ActionDraft, ActionPatch, RegistryEdit};

// === Project Management ===

#[derive(Clone, Debug)]
pub struct NewProjectEvent;

#[derive(Clone, Debug)]
pub struct LoadDemoProjectEvent;

#[derive(Clone, Debug)]
pub struct LoadProjectEvent(pub PathBuf);

#[derive(Clone, Debug)]
pub struct SaveProjectEvent(pub PathBuf);

// === Edits ===

#[derive(Clone, Debug)]
pub struct AddActionEvent(pub ActionDraft);

#[derive(Clone, Debug)]
pub struct UpdateActionEvent {
    pub id: Uuid,
    pub patch: ActionPatch,
}

#[derive(Clone, Debug)]
pub struct RemoveActionEvent(pub Uuid);

/// Several edits applied as one mutation and one history entry.
#[derive(Clone, Debug)]
pub struct ApplyEditsEvent(pub Vec<RegistryEdit>);

#[derive(Clone, Debug)]
pub struct UndoEvent;

#[derive(Clone, Debug)]
pub struct RedoEvent;

// === Notifications (emitted by the session) ===

#[derive(Clone, Debug)]
pub struct ScheduleRebuiltEvent {
    pub action_count: usize,
    pub total_duration: f64,
}
