//! Playback clock with a fixed virtual frame step.
//!
//! **Architecture**: Player does NOT own the action registry or schedule. The
//! session pushes the current total duration in via
//! [`Player::set_total_duration`] after every schedule rebuild; the player
//! only owns time, play flag, speed and loop.
//!
//! # Timing Model
//!
//! Virtual, not wall-clock: each [`Player::tick`] advances current time by
//! [`FRAME_STEP_MS`] x speed, no matter how much real time passed.
//! [`Player::update`] is the wall-clock driver for interactive use and issues
//! at most one tick per nominal frame interval.
//!
//! # States
//!
//! - **Stopped**: time 0, not playing
//! - **Paused**: time T, not playing
//! - **Playing**: time T, advancing on tick
//!
//! Reaching the end either wraps to 0 (loop) or clamps and pauses.

use log::{info, trace};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Virtual milliseconds per frame (~60 fps).
pub const FRAME_STEP_MS: f64 = 16.67;

/// Nominal wall-clock interval between ticks.
pub const FRAME_INTERVAL: Duration = Duration::from_micros(16_670);

pub const SPEED_MIN: f64 = 0.1;
pub const SPEED_MAX: f64 = 4.0;

/// Speed presets for speed up / speed down
pub const SPEED_PRESETS: &[f64] = &[0.1, 0.25, 0.5, 1.0, 2.0, 4.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    Stopped,
    Paused,
    Playing,
}

/// Snapshot of the clock read by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub current_time: f64,
    pub is_playing: bool,
    pub speed: f64,
    pub loop_enabled: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            is_playing: false,
            speed: 1.0,
            loop_enabled: false,
        }
    }
}

/// Playback state manager (does NOT own the schedule)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    current_time: f64,
    is_playing: bool,
    speed: f64,
    loop_enabled: bool,
    /// Timeline length, mirrored from the latest schedule.
    total_duration: f64,

    /// Last tick timestamp (runtime-only, not serializable)
    #[serde(skip)]
    last_tick: Option<Instant>,
}

impl Player {
    pub fn new() -> Self {
        Self::with_state(PlaybackState::default())
    }

    pub fn with_state(state: PlaybackState) -> Self {
        Self {
            current_time: state.current_time.max(0.0),
            is_playing: false,
            speed: clamp_speed(state.speed),
            loop_enabled: state.loop_enabled,
            total_duration: 0.0,
            last_tick: None,
        }
    }

    // === Accessors ===

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            current_time: self.current_time,
            is_playing: self.is_playing,
            speed: self.speed,
            loop_enabled: self.loop_enabled,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        if self.is_playing {
            PlaybackStatus::Playing
        } else if self.current_time > 0.0 {
            PlaybackStatus::Paused
        } else {
            PlaybackStatus::Stopped
        }
    }

    /// Position in [0, 1] for progress bars (0 for an empty timeline).
    pub fn progress(&self) -> f64 {
        if self.total_duration > 0.0 {
            (self.current_time / self.total_duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Update timeline length. Clamps current time if the timeline shrank;
    /// an empty timeline also halts playback.
    pub fn set_total_duration(&mut self, total: f64) {
        self.total_duration = if total.is_finite() { total.max(0.0) } else { 0.0 };
        if self.current_time > self.total_duration {
            trace!("Clamping time {:.2} -> {:.2} after timeline shrank", self.current_time, self.total_duration);
            self.current_time = self.total_duration;
        }
        if self.total_duration == 0.0 && self.is_playing {
            self.is_playing = false;
            self.last_tick = None;
        }
    }

    /// Back to `{0, false, 1, false}`; used on new/loaded project.
    pub fn reset_state(&mut self) {
        let total = self.total_duration;
        *self = Self::new();
        self.total_duration = total;
        info!("Playback state reset");
    }

    // === Transport ===

    /// Start playing. No-op on a zero-length timeline.
    pub fn play(&mut self) {
        if self.total_duration <= 0.0 {
            trace!("Play ignored: empty timeline");
            return;
        }
        if !self.is_playing {
            self.is_playing = true;
            self.last_tick = Some(Instant::now());
            trace!("Playback started at {:.2}", self.current_time);
        }
    }

    pub fn pause(&mut self) {
        if self.is_playing {
            self.is_playing = false;
            self.last_tick = None;
            trace!("Playback paused at {:.2}", self.current_time);
        }
    }

    /// Stop playback and rewind to 0.
    pub fn stop(&mut self) {
        self.is_playing = false;
        self.current_time = 0.0;
        self.last_tick = None;
        trace!("Playback stopped");
    }

    pub fn toggle_play_pause(&mut self) {
        if self.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Rewind to start and pause, keeping speed and loop.
    pub fn reset(&mut self) {
        self.current_time = 0.0;
        self.pause();
    }

    /// Advance one virtual frame. Returns the new time if it changed.
    pub fn tick(&mut self) -> Option<f64> {
        if !self.is_playing || self.total_duration <= 0.0 {
            return None;
        }
        let next = self.current_time + FRAME_STEP_MS * self.speed;
        if next >= self.total_duration {
            if self.loop_enabled {
                trace!("Time loop: {:.2} -> 0", self.current_time);
                self.current_time = 0.0;
            } else {
                trace!("Reached end of timeline, pausing");
                self.current_time = self.total_duration;
                self.is_playing = false;
                self.last_tick = None;
            }
        } else {
            self.current_time = next;
        }
        Some(self.current_time)
    }

    /// Wall-clock driver: ticks once if a frame interval has elapsed since
    /// the previous tick. Returns the new time if it changed.
    pub fn update(&mut self) -> Option<f64> {
        if !self.is_playing {
            return None;
        }
        let now = Instant::now();
        match self.last_tick {
            Some(last) if now.duration_since(last) >= FRAME_INTERVAL => {
                self.last_tick = Some(now);
                self.tick()
            }
            Some(_) => None,
            None => {
                self.last_tick = Some(now);
                None
            }
        }
    }

    /// Jump to `time`, clamped to the timeline. Play flag unchanged.
    pub fn seek(&mut self, time: f64) {
        if time.is_nan() {
            return;
        }
        self.current_time = time.clamp(0.0, self.total_duration);
        self.last_tick = self.is_playing.then(Instant::now);
    }

    /// Step one virtual frame forward, regardless of play state.
    pub fn next_frame(&mut self) {
        self.seek(self.current_time + FRAME_STEP_MS);
    }

    /// Step one virtual frame backward, regardless of play state.
    pub fn previous_frame(&mut self) {
        self.seek(self.current_time - FRAME_STEP_MS);
    }

    // === Speed & loop ===

    /// Clamped to [SPEED_MIN, SPEED_MAX]; applies from the next tick.
    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_nan() {
            return;
        }
        self.speed = clamp_speed(speed);
        trace!("Speed set to {}", self.speed);
    }

    /// Next preset strictly above current speed.
    pub fn speed_up(&mut self) {
        if let Some(&s) = SPEED_PRESETS.iter().find(|&&s| s > self.speed) {
            self.set_speed(s);
        }
    }

    /// Last preset strictly below current speed.
    pub fn speed_down(&mut self) {
        if let Some(&s) = SPEED_PRESETS.iter().rev().find(|&&s| s < self.speed) {
            self.set_speed(s);
        }
    }

    pub fn toggle_loop(&mut self) {
        self.loop_enabled = !self.loop_enabled;
        trace!("Loop {}", if self.loop_enabled { "enabled" } else { "disabled" });
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_speed(speed: f64) -> f64 {
    if speed.is_nan() { 1.0 } else { speed.clamp(SPEED_MIN, SPEED_MAX) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(total: f64) -> Player {
        let mut p = Player::new();
        p.set_total_duration(total);
        p
    }

    #[test]
    fn test_initial_state() {
        let p = Player::new();
        assert_eq!(p.state(), PlaybackState::default());
        assert_eq!(p.status(), PlaybackStatus::Stopped);
    }

    #[test]
    fn test_play_noop_on_empty_timeline() {
        let mut p = player(0.0);
        p.play();
        assert!(!p.is_playing());
        assert_eq!(p.tick(), None);
    }

    #[test]
    fn test_play_pause_stop_transitions() {
        let mut p = player(1000.0);
        p.play();
        assert_eq!(p.status(), PlaybackStatus::Playing);
        p.tick();
        p.pause();
        assert_eq!(p.status(), PlaybackStatus::Paused);
        assert!((p.current_time() - FRAME_STEP_MS).abs() < 1e-9);
        p.stop();
        assert_eq!(p.status(), PlaybackStatus::Stopped);
        assert_eq!(p.current_time(), 0.0);
    }

    #[test]
    fn test_tick_only_while_playing() {
        let mut p = player(1000.0);
        assert_eq!(p.tick(), None);
        assert_eq!(p.current_time(), 0.0);
    }

    #[test]
    fn test_tick_scales_with_speed() {
        let mut p = player(1000.0);
        p.set_speed(2.0);
        p.play();
        let t = p.tick().unwrap();
        assert!((t - FRAME_STEP_MS * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_run_to_end_pauses() {
        let mut p = player(100.0);
        p.play();
        for _ in 0..100 {
            p.tick();
        }
        assert_eq!(p.current_time(), 100.0);
        assert!(!p.is_playing());
        assert_eq!(p.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn test_loop_wraps_and_keeps_playing() {
        let mut p = player(100.0);
        p.toggle_loop();
        p.play();
        let mut wrapped = false;
        for _ in 0..10 {
            if p.tick() == Some(0.0) {
                wrapped = true;
                break;
            }
        }
        assert!(wrapped);
        assert!(p.is_playing());
    }

    #[test]
    fn test_seek_clamps_and_keeps_play_flag() {
        let mut p = player(500.0);
        p.seek(700.0);
        assert_eq!(p.current_time(), 500.0);
        p.seek(-3.0);
        assert_eq!(p.current_time(), 0.0);
        p.play();
        p.seek(250.0);
        assert!(p.is_playing());
        assert_eq!(p.current_time(), 250.0);
        p.seek(f64::NAN);
        assert_eq!(p.current_time(), 250.0);
    }

    #[test]
    fn test_speed_clamped() {
        let mut p = Player::new();
        p.set_speed(10.0);
        assert_eq!(p.speed(), SPEED_MAX);
        p.set_speed(0.0);
        assert_eq!(p.speed(), SPEED_MIN);
    }

    #[test]
    fn test_speed_presets() {
        let mut p = Player::new();
        p.speed_up();
        assert_eq!(p.speed(), 2.0);
        p.speed_up();
        p.speed_up();
        assert_eq!(p.speed(), 4.0);
        p.set_speed(0.3);
        p.speed_down();
        assert_eq!(p.speed(), 0.25);
        p.set_speed(0.1);
        p.speed_down();
        assert_eq!(p.speed(), 0.1);
    }

    #[test]
    fn test_frame_steps_ignore_play_state() {
        let mut p = player(20.0);
        p.next_frame();
        assert!((p.current_time() - FRAME_STEP_MS).abs() < 1e-9);
        p.next_frame();
        assert_eq!(p.current_time(), 20.0);
        p.previous_frame();
        assert!((p.current_time() - (20.0 - FRAME_STEP_MS)).abs() < 1e-9);
        p.previous_frame();
        assert_eq!(p.current_time(), 0.0);
        assert!(!p.is_playing());
    }

    #[test]
    fn test_shrinking_timeline_clamps_time() {
        let mut p = player(1000.0);
        p.seek(800.0);
        p.set_total_duration(300.0);
        assert_eq!(p.current_time(), 300.0);
        p.play();
        p.set_total_duration(0.0);
        assert_eq!(p.current_time(), 0.0);
        assert!(!p.is_playing());
    }

    #[test]
    fn test_toggle_and_reset() {
        let mut p = player(1000.0);
        p.set_speed(2.0);
        p.toggle_loop();
        p.toggle_play_pause();
        assert!(p.is_playing());
        p.tick();
        p.toggle_play_pause();
        assert!(!p.is_playing());
        p.reset();
        assert_eq!(p.current_time(), 0.0);
        assert_eq!(p.speed(), 2.0);
        assert!(p.loop_enabled());

        p.reset_state();
        assert_eq!(p.state(), PlaybackState::default());
        assert_eq!(p.total_duration(), 1000.0);
    }

    #[test]
    fn test_progress() {
        let mut p = player(200.0);
        assert_eq!(p.progress(), 0.0);
        p.seek(50.0);
        assert_eq!(p.progress(), 0.25);
        assert_eq!(player(0.0).progress(), 0.0);
    }

    #[test]
    fn test_update_waits_for_frame_interval() {
        let mut p = player(1000.0);
        p.play();
        // First call right after play: interval not yet elapsed
        assert_eq!(p.update(), None);
        std::thread::sleep(FRAME_INTERVAL + Duration::from_millis(2));
        assert!(p.update().is_some());
    }
}
