//! Progress evaluator: (schedule entry, time, fill mode) -> cell occupancy.
//!
//! Stateless. Called once per action per redraw; the renderer only consumes
//! the resulting [`Occupancy`].
//!
//! # Fill modes
//!
//! - **Gradual**: completed cells are full, the cell being traversed fills
//!   continuously with elapsed time.
//! - **Instant**: a cell becomes full the moment traversal of it begins and
//!   stays full; the cell being traversed is flagged as advancing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::schedule::ScheduledAction;
use crate::entities::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    #[default]
    Gradual,
    Instant,
}

impl fmt::Display for FillMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillMode::Gradual => f.write_str("gradual"),
            FillMode::Instant => f.write_str("instant"),
        }
    }
}

impl FromStr for FillMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gradual" => Ok(FillMode::Gradual),
            "instant" => Ok(FillMode::Instant),
            other => Err(format!("unknown fill mode '{other}' (expected gradual|instant)")),
        }
    }
}

/// Display state of a single cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellFill {
    Empty,
    /// Fraction in (0, 1) of the cell traversed so far (gradual mode).
    Partial(f64),
    Filled,
    /// Full, and currently being traversed (instant mode).
    Advancing,
}

/// Occupancy of one action's cells at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Occupancy {
    /// Cells reported fully filled, counted from the action's first cell.
    pub filled_cells: u32,
    /// Fill of the cell at `filled_cells`, always in [0, 1). Instant mode
    /// never produces a fraction.
    pub partial_fraction: f64,
    /// Cell currently being traversed, if any.
    pub active_cell: Option<u32>,
}

impl Occupancy {
    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn is_inactive(&self) -> bool {
        self.filled_cells == 0 && self.partial_fraction == 0.0 && self.active_cell.is_none()
    }

    pub fn cell(&self, index: u32) -> CellFill {
        if self.active_cell == Some(index) && index < self.filled_cells {
            CellFill::Advancing
        } else if index < self.filled_cells {
            CellFill::Filled
        } else if index == self.filled_cells && self.partial_fraction > 0.0 {
            CellFill::Partial(self.partial_fraction)
        } else {
            CellFill::Empty
        }
    }
}

/// Occupancy of `action` at `time`.
pub fn occupancy(entry: &ScheduledAction, action: &Action, time: f64, mode: FillMode) -> Occupancy {
    if time < entry.start_time {
        return Occupancy::inactive();
    }
    let move_count = action.move_count;
    let elapsed = (time - entry.start_time).max(0.0);
    if elapsed >= action.span() {
        return Occupancy {
            filled_cells: move_count,
            partial_fraction: 0.0,
            active_cell: None,
        };
    }

    // Index and fraction come from one quotient (== elapsed mod duration / duration)
    let cells = elapsed / action.duration;
    let current = (cells.floor() as u32).min(move_count);
    match mode {
        FillMode::Gradual => {
            let mut fraction = cells - cells.floor();
            if !(0.0..1.0).contains(&fraction) || current >= move_count {
                fraction = 0.0;
            }
            Occupancy {
                filled_cells: current,
                partial_fraction: fraction,
                active_cell: (fraction > 0.0).then_some(current),
            }
        }
        FillMode::Instant => {
            if current >= move_count {
                return Occupancy {
                    filled_cells: move_count,
                    partial_fraction: 0.0,
                    active_cell: None,
                };
            }
            Occupancy {
                filled_cells: current + 1,
                partial_fraction: 0.0,
                active_cell: Some(current),
            }
        }
    }
}
