//! actiongrid - action schedule computation and playback engine
//!
//! Re-exports all modules for use by the binary target.

// Core engine (schedule, occupancy, player, history, events)
pub mod core;

// App modules
pub mod cli;
pub mod config;
pub mod entities;
pub mod report;
pub mod session;

// Re-export commonly used types from core
pub use core::event_bus::{BoxedEvent, EventBus, EventEmitter, downcast_event};
pub use core::history::History;
pub use core::occupancy::{FillMode, Occupancy, occupancy};
pub use core::player::{PlaybackState, PlaybackStatus, Player};
pub use core::schedule::{Schedule, ScheduledAction};

// Re-export entities
pub use entities::{Action, ActionDraft, ActionPatch, ActionRegistry, EditError, Project, RegistryEdit, ValidationError};

pub use session::{ActionFrame, Session};
