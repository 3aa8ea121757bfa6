//! Schedule builder: action list -> absolute timeline.
//!
//! Pure and deterministic. Rebuilt wholesale after every registry mutation;
//! one edit can shift every later action of its module, so entries are never
//! patched incrementally.
//!
//! # Policies
//!
//! Within a module group, each action after the first is placed relative to
//! its immediate predecessor only:
//!
//! - **Sequential** (`declared_start <= 0`): starts when the predecessor has
//!   traversed all its cells; resolved column continues where it ended.
//! - **Positional** (`declared_start > 0`): keeps its declared column and
//!   waits only for the predecessor cells between the two start columns.
//!
//! Groups never affect each other; total duration is the latest end time.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::entities::Action;
use crate::entities::registry::group_indices;

/// Derived timing of one action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScheduledAction {
    pub id: Uuid,
    /// Index in the registry's backing list.
    pub index: usize,
    pub is_sequential: bool,
    /// Effective start column.
    pub resolved_start: i64,
    /// Milliseconds from timeline origin.
    pub start_time: f64,
    pub end_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    /// Index-aligned with the action list the schedule was built from.
    entries: Vec<ScheduledAction>,
    by_id: HashMap<Uuid, usize>,
    total_duration: f64,
}

impl Schedule {
    pub fn build(actions: &[Action]) -> Self {
        let mut slots: Vec<Option<ScheduledAction>> = vec![None; actions.len()];

        for (_, members) in group_indices(actions) {
            let mut prev: Option<ScheduledAction> = None;
            for idx in members {
                let action = &actions[idx];
                let (is_sequential, resolved_start, start_time) = match prev {
                    None => (false, action.declared_start as i64, 0.0),
                    Some(p) => {
                        let prev_action = &actions[p.index];
                        if action.declared_start <= 0 {
                            (
                                true,
                                p.resolved_start + prev_action.move_count as i64,
                                p.start_time + prev_action.span(),
                            )
                        } else {
                            let declared = action.declared_start as i64;
                            let cells_needed = (declared - p.resolved_start).max(0);
                            (false, declared, p.start_time + cells_needed as f64 * prev_action.duration)
                        }
                    }
                };
                let entry = ScheduledAction {
                    id: action.id,
                    index: idx,
                    is_sequential,
                    resolved_start,
                    start_time,
                    end_time: start_time + action.span(),
                };
                slots[idx] = Some(entry);
                prev = Some(entry);
            }
        }

        // Every index belongs to exactly one group
        let entries: Vec<ScheduledAction> = slots.into_iter().flatten().collect();
        let by_id = entries.iter().map(|e| (e.id, e.index)).collect();
        let total_duration = entries.iter().map(|e| e.end_time).fold(0.0, f64::max);

        log::trace!("Schedule built: {} actions, total {:.2} ms", entries.len(), total_duration);

        Self { entries, by_id, total_duration }
    }

    pub fn entries(&self) -> &[ScheduledAction] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&ScheduledAction> {
        self.entries.get(index)
    }

    pub fn entry(&self, id: Uuid) -> Option<&ScheduledAction> {
        self.by_id.get(&id).and_then(|&i| self.entries.get(i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Latest end time over all actions, 0 when empty.
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Number of position columns needed to show every action.
    pub fn grid_extent(&self, actions: &[Action]) -> i64 {
        self.entries
            .iter()
            .zip(actions)
            .map(|(e, a)| e.resolved_start + a.move_count as i64)
            .max()
            .unwrap_or(0)
            .max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Project;

    fn times(s: &Schedule, i: usize) -> (f64, f64) {
        let e = s.get(i).unwrap();
        (e.start_time, e.end_time)
    }

    #[test]
    fn test_feeder_sequential_chain() {
        let actions = vec![
            Action::new("Feeder_1", "a", 0, 25, 100.0),
            Action::new("Feeder_1", "b", 0, 20, 120.0),
            Action::new("Feeder_1", "c", -1, 15, 150.0),
        ];
        let s = Schedule::build(&actions);
        assert_eq!(times(&s, 0), (0.0, 2500.0));
        assert_eq!(times(&s, 1), (2500.0, 4900.0));
        assert_eq!(times(&s, 2), (4900.0, 7900.0));
        assert_eq!(s.total_duration(), 7900.0);

        assert!(!s.get(0).unwrap().is_sequential);
        assert!(s.get(1).unwrap().is_sequential);
        assert!(s.get(2).unwrap().is_sequential);
        assert_eq!(s.get(1).unwrap().resolved_start, 25);
        assert_eq!(s.get(2).unwrap().resolved_start, 45);
    }

    #[test]
    fn test_conveyor_positional_then_sequential() {
        let actions = vec![
            Action::new("Conveyor_1", "d", 10, 30, 100.0),
            Action::new("Conveyor_1", "e", 0, 25, 110.0),
        ];
        let s = Schedule::build(&actions);
        assert_eq!(times(&s, 0), (0.0, 3000.0));
        assert_eq!(times(&s, 1), (3000.0, 5750.0));
        assert_eq!(s.get(0).unwrap().resolved_start, 10);
        assert_eq!(s.get(1).unwrap().resolved_start, 40);
    }

    #[test]
    fn test_demo_total_is_max_over_groups() {
        let p = Project::demo();
        let s = Schedule::build(p.registry.actions());
        assert_eq!(s.total_duration(), 7900.0);
        assert_eq!(s.grid_extent(p.registry.actions()), 65);
    }

    #[test]
    fn test_positional_gap_waits_for_vacated_cells() {
        let actions = vec![
            Action::new("M", "a", 10, 20, 50.0),
            Action::new("M", "b", 15, 4, 10.0),
        ];
        let s = Schedule::build(&actions);
        // 5 cells of the predecessor must be vacated first
        assert_eq!(times(&s, 1), (250.0, 290.0));
        assert!(!s.get(1).unwrap().is_sequential);
        assert_eq!(s.get(1).unwrap().resolved_start, 15);
    }

    #[test]
    fn test_positional_behind_predecessor_has_no_delay() {
        let actions = vec![
            Action::new("M", "a", 10, 20, 50.0),
            Action::new("M", "b", 3, 4, 10.0),
            Action::new("M", "c", 3, 2, 10.0),
        ];
        let s = Schedule::build(&actions);
        assert_eq!(times(&s, 1), (0.0, 40.0));
        // Identical declared start: cells_needed = 0
        assert_eq!(times(&s, 2), (0.0, 20.0));
    }

    #[test]
    fn test_first_action_keeps_declared_start_even_if_nonpositive() {
        let actions = vec![Action::new("M", "a", -3, 2, 10.0)];
        let s = Schedule::build(&actions);
        let e = s.get(0).unwrap();
        assert!(!e.is_sequential);
        assert_eq!(e.resolved_start, -3);
        assert_eq!(e.start_time, 0.0);
        assert_eq!(s.grid_extent(&actions), 0);
    }

    #[test]
    fn test_zero_move_count_advances_position_only() {
        let actions = vec![
            Action::new("M", "a", 5, 0, 100.0),
            Action::new("M", "b", 0, 3, 10.0),
        ];
        let s = Schedule::build(&actions);
        assert_eq!(times(&s, 0), (0.0, 0.0));
        assert_eq!(times(&s, 1), (0.0, 30.0));
        assert_eq!(s.get(1).unwrap().resolved_start, 5);
    }

    #[test]
    fn test_groups_are_independent_when_interleaved() {
        let actions = vec![
            Action::new("A", "a1", 0, 10, 10.0),
            Action::new("B", "b1", 0, 5, 10.0),
            Action::new("A", "a2", 0, 10, 10.0),
            Action::new("B", "b2", 0, 5, 10.0),
        ];
        let s = Schedule::build(&actions);
        assert_eq!(times(&s, 2), (100.0, 200.0));
        assert_eq!(times(&s, 3), (50.0, 100.0));
        assert_eq!(s.total_duration(), 200.0);
    }

    #[test]
    fn test_empty_registry() {
        let s = Schedule::build(&[]);
        assert!(s.is_empty());
        assert_eq!(s.total_duration(), 0.0);
        assert_eq!(s.grid_extent(&[]), 0);
    }

    #[test]
    fn test_invariants_hold_for_every_action() {
        let p = Project::demo();
        let actions = p.registry.actions();
        let s = Schedule::build(actions);

        for (e, a) in s.entries().iter().zip(actions) {
            assert_eq!(e.end_time, e.start_time + a.move_count as f64 * a.duration);
        }
        for (_, members) in p.registry.groups() {
            let first = s.get(members[0]).unwrap();
            assert!(!first.is_sequential);
            assert_eq!(first.resolved_start, actions[members[0]].declared_start as i64);
            for pair in members.windows(2) {
                let (prev, cur) = (s.get(pair[0]).unwrap(), s.get(pair[1]).unwrap());
                let (pa, ca) = (&actions[pair[0]], &actions[pair[1]]);
                assert_eq!(cur.is_sequential, ca.declared_start <= 0);
                let expected = if cur.is_sequential {
                    prev.start_time + pa.move_count as f64 * pa.duration
                } else {
                    prev.start_time + (ca.declared_start as i64 - prev.resolved_start).max(0) as f64 * pa.duration
                };
                assert_eq!(cur.start_time, expected);
            }
        }
        let max_end = s.entries().iter().map(|e| e.end_time).fold(0.0, f64::max);
        assert_eq!(s.total_duration(), max_end);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let p = Project::demo();
        let a = Schedule::build(p.registry.actions());
        let b = Schedule::build(p.registry.actions());
        assert_eq!(a, b);
    }

    #[test]
    fn test_lookup_by_id() {
        let p = Project::demo();
        let s = Schedule::build(p.registry.actions());
        let id = p.registry.actions()[4].id;
        assert_eq!(s.entry(id).unwrap().index, 4);
        assert!(s.entry(Uuid::new_v4()).is_none());
    }
}
