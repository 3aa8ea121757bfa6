//! Action: one timed, cell-traversing operation owned by a module.
//!
//! Raw user input enters as [`ActionDraft`] (or [`ActionPatch`] for edits)
//! and is validated here, before anything reaches the registry. The engine
//! in `core` only ever sees well-typed [`Action`]s: `duration > 0`,
//! `move_count >= 0`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rejection reasons for raw action input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Module name is required")]
    MissingModuleName,

    #[error("Action description is required")]
    MissingDescription,

    #[error("Start position must be a non-negative number, got {0}")]
    InvalidStartPosition(f64),

    #[error("Move count must be a non-negative number, got {0}")]
    InvalidMoveCount(f64),

    #[error("Duration must be a positive number, got {0}")]
    InvalidDuration(f64),
}

/// A validated action.
///
/// Derived scheduling data (resolved start, sequential flag, start/end time)
/// is not stored here; see `core::schedule::Schedule`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: Uuid,
    pub module_name: String,
    #[serde(default)]
    pub description: String,
    /// User-entered start column. `<= 0` requests chaining after the
    /// previous action of the same module.
    pub declared_start: i32,
    /// Number of cells the action traverses.
    pub move_count: u32,
    /// Milliseconds spent per cell.
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Action {
    /// Build an action directly, bypassing draft validation.
    ///
    /// Caller guarantees `duration > 0`. Used for demo data and tests, where
    /// negative declared starts are legitimate sequencing requests.
    pub fn new(module_name: impl Into<String>, description: impl Into<String>, declared_start: i32, move_count: u32, duration: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            module_name: module_name.into(),
            description: description.into(),
            declared_start,
            move_count,
            duration,
            stage: None,
            color: None,
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Total time to traverse every cell.
    pub fn span(&self) -> f64 {
        self.move_count as f64 * self.duration
    }

    /// Check the invariants the scheduler relies on, for actions that did
    /// not come through a draft (loaded files).
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.module_name.trim().is_empty() {
            return Err(ValidationError::MissingModuleName);
        }
        check_duration(self.duration)
    }

    /// Apply a validated patch in place.
    pub fn apply_patch(&mut self, patch: &ActionPatch) -> Result<(), ValidationError> {
        patch.validate()?;
        if let Some(name) = &patch.module_name {
            self.module_name = name.trim().to_string();
        }
        if let Some(desc) = &patch.description {
            self.description = desc.trim().to_string();
        }
        if let Some(start) = patch.start_position {
            self.declared_start = start.floor() as i32;
        }
        if let Some(count) = patch.move_count {
            self.move_count = count.floor() as u32;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(stage) = &patch.stage {
            self.stage = normalize_label(stage.as_deref());
        }
        if let Some(color) = &patch.color {
            self.color = normalize_label(color.as_deref());
        }
        Ok(())
    }
}

/// Unvalidated action input, as typed by a user or read from a table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionDraft {
    pub module_name: String,
    pub description: String,
    pub start_position: f64,
    pub move_count: f64,
    pub duration: f64,
    pub stage: Option<String>,
    pub color: Option<String>,
}

impl ActionDraft {
    pub fn new(module_name: impl Into<String>, description: impl Into<String>, start_position: f64, move_count: f64, duration: f64) -> Self {
        Self {
            module_name: module_name.into(),
            description: description.into(),
            start_position,
            move_count,
            duration,
            stage: None,
            color: None,
        }
    }

    /// Validate and convert into an [`Action`] with a fresh id.
    ///
    /// Start and move count are floored; duration keeps fractions.
    pub fn validate(self) -> Result<Action, ValidationError> {
        let module_name = self.module_name.trim();
        if module_name.is_empty() {
            return Err(ValidationError::MissingModuleName);
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::MissingDescription);
        }
        check_start(self.start_position)?;
        check_move_count(self.move_count)?;
        check_duration(self.duration)?;

        Ok(Action {
            id: Uuid::new_v4(),
            module_name: module_name.to_string(),
            description: description.to_string(),
            declared_start: self.start_position.floor() as i32,
            move_count: self.move_count.floor() as u32,
            duration: self.duration,
            stage: normalize_label(self.stage.as_deref()),
            color: normalize_label(self.color.as_deref()),
        })
    }
}

/// Partial edit of an existing action. `None` fields are left untouched.
///
/// `stage` / `color` use a nested option: `Some(None)` clears the label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionPatch {
    pub module_name: Option<String>,
    pub description: Option<String>,
    pub start_position: Option<f64>,
    pub move_count: Option<f64>,
    pub duration: Option<f64>,
    pub stage: Option<Option<String>>,
    pub color: Option<Option<String>>,
}

impl ActionPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.module_name
            && name.trim().is_empty()
        {
            return Err(ValidationError::MissingModuleName);
        }
        if let Some(desc) = &self.description
            && desc.trim().is_empty()
        {
            return Err(ValidationError::MissingDescription);
        }
        if let Some(start) = self.start_position {
            check_start(start)?;
        }
        if let Some(count) = self.move_count {
            check_move_count(count)?;
        }
        if let Some(duration) = self.duration {
            check_duration(duration)?;
        }
        Ok(())
    }
}

fn check_start(v: f64) -> Result<(), ValidationError> {
    if v.is_nan() || v < 0.0 || v > i32::MAX as f64 {
        return Err(ValidationError::InvalidStartPosition(v));
    }
    Ok(())
}

fn check_move_count(v: f64) -> Result<(), ValidationError> {
    if v.is_nan() || v < 0.0 || v > u32::MAX as f64 {
        return Err(ValidationError::InvalidMoveCount(v));
    }
    Ok(())
}

fn check_duration(v: f64) -> Result<(), ValidationError> {
    if !v.is_finite() || v <= 0.0 {
        return Err(ValidationError::InvalidDuration(v));
    }
    Ok(())
}

fn normalize_label(label: Option<&str>) -> Option<String> {
    label.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
