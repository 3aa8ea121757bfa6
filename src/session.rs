//! Headless session: project + schedule + player + history in one place.
//!
//! Every registry mutation goes through here so that one edit means exactly
//! one registry mutation, one history entry and one schedule rebuild. The
//! schedule is never read for an action list it was not built from.
//!
//! Front-ends either call methods directly or emit events on
//! [`Session::event_bus`] and call [`Session::process_events`] once per
//! frame.

use std::path::Path;

use anyhow::Result;
use log::{debug, error, info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::config::Settings;
use crate::core::event_bus::{BoxedEvent, EventBus, downcast_event};
use crate::core::history::History;
use crate::core::occupancy::{FillMode, Occupancy, occupancy};
use crate::core::player::{PlaybackState, Player};
use crate::core::player_events::*;
use crate::core::project_events::*;
use crate::core::schedule::Schedule;
use crate::entities::{Action, ActionDraft, ActionPatch, EditError, Project, RegistryEdit};

/// Per-action render input for one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActionFrame {
    pub id: Uuid,
    /// Registry index, i.e. display row.
    pub row: usize,
    /// Column of the action's first cell.
    pub resolved_start: i64,
    pub occupancy: Occupancy,
}

#[derive(Debug)]
pub struct Session {
    project: Project,
    player: Player,
    history: History,
    schedule: Schedule,
    fill_mode: FillMode,
    event_bus: EventBus,
    /// Registry differs from what was last loaded or saved
    unsaved_changes: bool,
    /// Last user-facing failure, cleared on the next successful project load
    pub error_msg: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl Session {
    /// Empty project, clock configured from settings.
    pub fn new(settings: &Settings) -> Self {
        Self::with_project(Project::new(), settings)
    }

    pub fn with_project(project: Project, settings: &Settings) -> Self {
        let settings = settings.sanitized();
        let player = Player::with_state(PlaybackState {
            speed: settings.speed,
            loop_enabled: settings.loop_enabled,
            ..Default::default()
        });
        let mut session = Self {
            project,
            player,
            history: History::new(),
            schedule: Schedule::default(),
            fill_mode: settings.fill_mode,
            event_bus: EventBus::new(),
            unsaved_changes: false,
            error_msg: None,
        };
        session.rebuild_schedule();
        session
    }

    // === Accessors ===

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn actions(&self) -> &[Action] {
        self.project.registry.actions()
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved_changes
    }

    pub fn fill_mode(&self) -> FillMode {
        self.fill_mode
    }

    pub fn total_duration(&self) -> f64 {
        self.schedule.total_duration()
    }

    pub fn grid_extent(&self) -> i64 {
        self.schedule.grid_extent(self.actions())
    }

    // === Schedule & occupancy ===

    /// Recompute the schedule from the current action list and push the new
    /// timeline length into the player.
    pub fn rebuild_schedule(&mut self) -> &Schedule {
        self.schedule = Schedule::build(self.project.registry.actions());
        self.player.set_total_duration(self.schedule.total_duration());
        debug!(
            "Schedule rebuilt: {} actions, total {:.2} ms",
            self.schedule.len(),
            self.schedule.total_duration()
        );
        self.event_bus.notify(ScheduleRebuiltEvent {
            action_count: self.schedule.len(),
            total_duration: self.schedule.total_duration(),
        });
        &self.schedule
    }

    /// Occupancy of every action at `time`, in registry order.
    pub fn occupancy_at(&self, time: f64, mode: FillMode) -> Vec<ActionFrame> {
        self.actions()
            .iter()
            .zip(self.schedule.entries())
            .map(|(action, entry)| ActionFrame {
                id: action.id,
                row: entry.index,
                resolved_start: entry.resolved_start,
                occupancy: occupancy(entry, action, time, mode),
            })
            .collect()
    }

    /// Occupancy at the player's current time with the session fill mode.
    pub fn current_frame(&self) -> Vec<ActionFrame> {
        self.occupancy_at(self.player.current_time(), self.fill_mode)
    }

    // === Project lifecycle ===

    /// Swap in a project: playback state reset, history cleared.
    pub fn set_project(&mut self, project: Project) {
        info!("Project '{}' activated ({} actions)", project.name, project.registry.len());
        self.project = project;
        self.history.clear();
        self.unsaved_changes = false;
        self.player.reset_state();
        self.rebuild_schedule();
        self.notify_playback();
    }

    pub fn new_project(&mut self) {
        self.set_project(Project::new());
    }

    pub fn load_demo(&mut self) {
        self.set_project(Project::demo());
    }

    pub fn load_project(&mut self, path: &Path) -> Result<()> {
        let project = Project::load(path)?;
        self.set_project(project);
        self.error_msg = None;
        Ok(())
    }

    pub fn save_project(&mut self, path: &Path) -> Result<()> {
        self.project.save(path)?;
        self.unsaved_changes = false;
        Ok(())
    }

    // === Edits ===

    /// Validate a draft and append it.
    pub fn add_action(&mut self, draft: ActionDraft) -> Result<Uuid, EditError> {
        let action = draft.validate()?;
        self.insert_action(action)
    }

    /// Append an already-built action.
    pub fn insert_action(&mut self, action: Action) -> Result<Uuid, EditError> {
        let id = action.id;
        self.apply_edits(vec![RegistryEdit::Add(action)])?;
        Ok(id)
    }

    pub fn update_action(&mut self, id: Uuid, patch: ActionPatch) -> Result<(), EditError> {
        if patch.is_empty() {
            return Ok(());
        }
        self.apply_edits(vec![RegistryEdit::Update { id, patch }])
    }

    pub fn remove_action(&mut self, id: Uuid) -> Result<(), EditError> {
        self.apply_edits(vec![RegistryEdit::Remove(id)])
    }

    /// Apply edits as one mutation: all or nothing, one history entry, one
    /// rebuild.
    pub fn apply_edits(&mut self, edits: Vec<RegistryEdit>) -> Result<(), EditError> {
        if edits.is_empty() {
            return Ok(());
        }
        let base = self.history.is_empty().then(|| self.project.registry.snapshot());
        if let Err(e) = self.project.registry.apply(edits) {
            warn!("Edit rejected: {}", e);
            return Err(e);
        }
        // First edit of a fresh history also records the pre-edit state
        if let Some(base) = base {
            self.history.push(&base);
        }
        self.history.push(self.project.registry.actions());
        self.mark_dirty();
        self.rebuild_schedule();
        self.notify_playback();
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, snapshot: Vec<Action>) {
        self.project.registry.replace(snapshot);
        self.mark_dirty();
        self.rebuild_schedule();
        self.notify_playback();
    }

    fn mark_dirty(&mut self) {
        self.project.touch();
        self.unsaved_changes = true;
    }

    // === Clock control surface ===

    pub fn play(&mut self) -> PlaybackState {
        if self.project.registry.is_empty() {
            debug!("Play ignored: no actions");
        } else {
            self.player.play();
        }
        self.notify_playback()
    }

    pub fn pause(&mut self) -> PlaybackState {
        self.player.pause();
        self.notify_playback()
    }

    pub fn stop(&mut self) -> PlaybackState {
        self.player.stop();
        self.notify_playback()
    }

    pub fn toggle_play_pause(&mut self) -> PlaybackState {
        if self.player.is_playing() {
            self.pause()
        } else {
            self.play()
        }
    }

    pub fn reset(&mut self) -> PlaybackState {
        self.player.reset();
        self.notify_playback()
    }

    pub fn seek(&mut self, time: f64) -> PlaybackState {
        self.player.seek(time);
        self.notify_playback()
    }

    pub fn set_speed(&mut self, speed: f64) -> PlaybackState {
        self.player.set_speed(speed);
        self.notify_playback()
    }

    pub fn speed_up(&mut self) -> PlaybackState {
        self.player.speed_up();
        self.notify_playback()
    }

    pub fn speed_down(&mut self) -> PlaybackState {
        self.player.speed_down();
        self.notify_playback()
    }

    pub fn toggle_loop(&mut self) -> PlaybackState {
        self.player.toggle_loop();
        self.notify_playback()
    }

    pub fn next_frame(&mut self) -> PlaybackState {
        self.player.next_frame();
        self.notify_playback()
    }

    pub fn previous_frame(&mut self) -> PlaybackState {
        self.player.previous_frame();
        self.notify_playback()
    }

    /// One virtual frame. Returns the new time if the clock moved.
    pub fn tick(&mut self) -> Option<f64> {
        let t = self.player.tick();
        if t.is_some() {
            self.notify_playback();
        }
        t
    }

    /// Wall-clock driven tick, see [`Player::update`].
    pub fn update(&mut self) -> Option<f64> {
        let t = self.player.update();
        if t.is_some() {
            self.notify_playback();
        }
        t
    }

    fn notify_playback(&self) -> PlaybackState {
        let state = self.player.state();
        self.event_bus.notify(PlaybackChangedEvent(state));
        state
    }

    // === Event dispatch ===

    /// Drain the event bus and apply every command event.
    /// Returns the number of events handled.
    pub fn process_events(&mut self) -> usize {
        let mut handled = 0;
        for event in self.event_bus.poll() {
            if self.handle_event(&event) {
                handled += 1;
            }
        }
        handled
    }

    /// Apply one command event. Notification events are ignored.
    pub fn handle_event(&mut self, event: &BoxedEvent) -> bool {
        // === Playback Control ===
        if downcast_event::<PlayEvent>(event).is_some() {
            self.play();
        } else if downcast_event::<PauseEvent>(event).is_some() {
            self.pause();
        } else if downcast_event::<StopEvent>(event).is_some() {
            self.stop();
        } else if downcast_event::<TogglePlayPauseEvent>(event).is_some() {
            self.toggle_play_pause();
        } else if downcast_event::<ResetEvent>(event).is_some() {
            self.reset();
        } else if let Some(SeekEvent(t)) = downcast_event::<SeekEvent>(event) {
            self.seek(*t);
        } else if downcast_event::<NextFrameEvent>(event).is_some() {
            self.next_frame();
        } else if downcast_event::<PreviousFrameEvent>(event).is_some() {
            self.previous_frame();
        } else if let Some(SetSpeedEvent(s)) = downcast_event::<SetSpeedEvent>(event) {
            self.set_speed(*s);
        } else if downcast_event::<SpeedUpEvent>(event).is_some() {
            self.speed_up();
        } else if downcast_event::<SpeedDownEvent>(event).is_some() {
            self.speed_down();
        } else if downcast_event::<ToggleLoopEvent>(event).is_some() {
            self.toggle_loop();
        }
        // === Project Management ===
        else if downcast_event::<NewProjectEvent>(event).is_some() {
            self.new_project();
        } else if downcast_event::<LoadDemoProjectEvent>(event).is_some() {
            self.load_demo();
        } else if let Some(LoadProjectEvent(path)) = downcast_event::<LoadProjectEvent>(event) {
            if let Err(e) = self.load_project(path) {
                error!("Load failed: {:#}", e);
                self.error_msg = Some(format!("Load failed: {e:#}"));
            }
        } else if let Some(SaveProjectEvent(path)) = downcast_event::<SaveProjectEvent>(event) {
            if let Err(e) = self.save_project(path) {
                error!("Save failed: {:#}", e);
                self.error_msg = Some(format!("Save failed: {e:#}"));
            }
        }
        // === Edits ===
        // Edit failures are already logged by apply_edits
        else if let Some(AddActionEvent(draft)) = downcast_event::<AddActionEvent>(event) {
            if let Err(e) = self.add_action(draft.clone()) {
                self.error_msg = Some(e.to_string());
            }
        } else if let Some(e) = downcast_event::<UpdateActionEvent>(event) {
            if let Err(e) = self.update_action(e.id, e.patch.clone()) {
                self.error_msg = Some(e.to_string());
            }
        } else if let Some(RemoveActionEvent(id)) = downcast_event::<RemoveActionEvent>(event) {
            if let Err(e) = self.remove_action(*id) {
                self.error_msg = Some(e.to_string());
            }
        } else if let Some(ApplyEditsEvent(edits)) = downcast_event::<ApplyEditsEvent>(event) {
            if let Err(e) = self.apply_edits(edits.clone()) {
                self.error_msg = Some(e.to_string());
            }
        } else if downcast_event::<UndoEvent>(event).is_some() {
            self.undo();
        } else if downcast_event::<RedoEvent>(event).is_some() {
            self.redo();
        } else {
            return false;
        }
        true
    }
}
