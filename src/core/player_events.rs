//! Player and playback events.

use super::player::PlaybackState;

// === Playback Control ===

#[derive(Clone, Debug)]
pub struct PlayEvent;

#[derive(Clone, Debug)]
pub struct PauseEvent;

#[derive(Clone, Debug)]
pub struct StopEvent;

#[derive(Clone, Debug)]
pub struct TogglePlayPauseEvent;

/// Rewind to 0 and pause
#[derive(Clone, Debug)]
pub struct ResetEvent;

/// Jump to time in milliseconds
#[derive(Clone, Debug)]
pub struct SeekEvent(pub f64);

#[derive(Clone, Debug)]
pub struct NextFrameEvent;

#[derive(Clone, Debug)]
pub struct PreviousFrameEvent;

// === Speed ===

#[derive(Clone, Debug)]
pub struct SetSpeedEvent(pub f64);

#[derive(Clone, Debug)]
pub struct SpeedUpEvent;

#[derive(Clone, Debug)]
pub struct SpeedDownEvent;

// === Loop ===

#[derive(Clone, Debug)]
pub struct ToggleLoopEvent;

// === Notifications (emitted by the session) ===

/// Clock state after any control command.
#[derive(Clone, Debug)]
pub struct PlaybackChangedEvent(pub PlaybackState);
