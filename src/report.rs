//! Plain-text rendering of schedules and occupancy for the CLI.

use std::fmt::{self, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::occupancy::{CellFill, FillMode};
use crate::core::player::PlaybackState;
use crate::entities::Action;
use crate::session::Session;

/// Cell glyphs: empty, partial (<50%), partial (>=50%), filled, advancing
const GLYPHS: [char; 5] = ['.', '-', '+', '#', '>'];

fn glyph(cell: CellFill) -> char {
    match cell {
        CellFill::Empty => GLYPHS[0],
        CellFill::Partial(f) if f < 0.5 => GLYPHS[1],
        CellFill::Partial(_) => GLYPHS[2],
        CellFill::Filled => GLYPHS[3],
        CellFill::Advancing => GLYPHS[4],
    }
}

/// Text shown in front of each grid row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridLabel {
    Module,
    /// Empty for actions without a stage
    Stage,
    /// Action description
    #[default]
    Action,
}

impl GridLabel {
    pub fn text<'a>(&self, action: &'a Action) -> &'a str {
        match self {
            GridLabel::Module => action.module_name.as_str(),
            GridLabel::Stage => action.stage.as_deref().unwrap_or(""),
            GridLabel::Action => action.description.as_str(),
        }
    }
}

impl fmt::Display for GridLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridLabel::Module => f.write_str("module"),
            GridLabel::Stage => f.write_str("stage"),
            GridLabel::Action => f.write_str("action"),
        }
    }
}

impl FromStr for GridLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "module" => Ok(GridLabel::Module),
            "stage" => Ok(GridLabel::Stage),
            "action" => Ok(GridLabel::Action),
            other => Err(format!("unknown label '{other}' (expected module|stage|action)")),
        }
    }
}

/// One row per action with its resolved timing, then the total.
pub fn schedule_table(session: &Session) -> String {
    let mut out = String::new();
    let actions = session.actions();
    let module_w = actions.iter().map(|a| a.module_name.len()).max().unwrap_or(0).max(6);
    let desc_w = actions.iter().map(|a| a.description.len()).max().unwrap_or(0).max(11);

    let _ = writeln!(
        out,
        "{:>3}  {:<module_w$}  {:<desc_w$}  {:>5}  {:>5}  {:>8}  {:>4}  {:>10}  {:>10}",
        "#", "Module", "Description", "Start", "Moves", "Dur(ms)", "Seq", "Begin(ms)", "End(ms)"
    );
    for (action, entry) in actions.iter().zip(session.schedule().entries()) {
        let _ = writeln!(
            out,
            "{:>3}  {:<module_w$}  {:<desc_w$}  {:>5}  {:>5}  {:>8.1}  {:>4}  {:>10.2}  {:>10.2}",
            entry.index,
            action.module_name,
            action.description,
            entry.resolved_start,
            action.move_count,
            action.duration,
            if entry.is_sequential { "yes" } else { "no" },
            entry.start_time,
            entry.end_time,
        );
    }
    let _ = writeln!(
        out,
        "Total duration: {:.2} ms, {} actions, {} columns",
        session.total_duration(),
        actions.len(),
        session.grid_extent()
    );
    out
}

/// Grid snapshot at `time`: each row draws the action's cells at its
/// resolved columns.
pub fn occupancy_grid(session: &Session, time: f64, mode: FillMode, label: GridLabel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "t = {:.2} ms ({})", time, mode);

    let actions = session.actions();
    let frames = session.occupancy_at(time, mode);
    // Leftmost column may be negative
    let origin = frames.iter().map(|f| f.resolved_start).min().unwrap_or(0).min(0);
    let label_w = actions.iter().map(|a| label.text(a).len()).max().unwrap_or(0);

    for (action, frame) in actions.iter().zip(&frames) {
        let offset = (frame.resolved_start - origin) as usize;
        let cells: String = (0..action.move_count).map(|i| glyph(frame.occupancy.cell(i))).collect();
        let _ = writeln!(
            out,
            "{:<label_w$}  |{}{}| {}/{}",
            label.text(action),
            " ".repeat(offset),
            cells,
            frame.occupancy.filled_cells,
            action.move_count
        );
    }
    out
}

/// Single-line clock summary.
pub fn progress_line(state: &PlaybackState, total: f64) -> String {
    let pct = if total > 0.0 { (state.current_time / total * 100.0).clamp(0.0, 100.0) } else { 0.0 };
    format!(
        "[{:5.1}%] {:>9.2} / {:.2} ms  x{}  {}{}",
        pct,
        state.current_time,
        total,
        state.speed,
        if state.is_playing { "playing" } else { "paused" },
        if state.loop_enabled { " loop" } else { "" }
    )
}
