//! Core engine modules - schedule, occupancy, player, history, events
//!
//! These modules form the scheduling and playback engine, independent of any
//! front-end.

pub mod event_bus;
pub mod history;
pub mod occupancy;
pub mod player;
pub mod player_events;
pub mod project_events;
pub mod schedule;

// Re-exports for convenience
pub use event_bus::{BoxedEvent, EventBus, EventEmitter, downcast_event};
pub use history::History;
pub use occupancy::{CellFill, FillMode, Occupancy, occupancy};
pub use player::{PlaybackState, PlaybackStatus, Player};
pub use schedule::{Schedule, ScheduledAction};
