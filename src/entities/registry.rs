//! Action registry: ordered action store grouped by module name.
//!
//! Actions live in a single backing `Vec` in input order. Groups are an
//! ordered map from module name to indices into that vec, rebuilt wholesale
//! after every mutation. Group order is first-appearance order; member order
//! is insertion order and is never re-sorted.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::action::{Action, ActionPatch, ValidationError};

/// Module colour palette, assigned by module first-appearance order.
pub const MODULE_COLORS: &[&str] = &[
    "#3b82f6", // blue
    "#10b981", // green
    "#f59e0b", // amber
    "#ef4444", // red
    "#8b5cf6", // violet
    "#14b8a6", // teal
    "#f97316", // orange
    "#ec4899", // pink
    "#6366f1", // indigo
    "#84cc16", // lime
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("Action not found: {0}")]
    UnknownAction(Uuid),

    #[error("Duplicate action id: {0}")]
    DuplicateId(Uuid),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// One structural edit. A batch of these is applied atomically by
/// [`ActionRegistry::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEdit {
    Add(Action),
    Update { id: Uuid, patch: ActionPatch },
    Remove(Uuid),
}

/// Group actions by module name, preserving first-appearance order of
/// modules and input order within each module.
pub fn group_indices(actions: &[Action]) -> IndexMap<&str, Vec<usize>> {
    let mut groups: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (idx, action) in actions.iter().enumerate() {
        groups.entry(action.module_name.as_str()).or_default().push(idx);
    }
    groups
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Action>", into = "Vec<Action>")]
pub struct ActionRegistry {
    actions: Vec<Action>,
    groups: IndexMap<String, Vec<usize>>,
}

impl PartialEq for ActionRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.actions == other.actions
    }
}

impl From<Vec<Action>> for ActionRegistry {
    fn from(actions: Vec<Action>) -> Self {
        let mut registry = Self { actions, groups: IndexMap::new() };
        registry.regroup();
        registry
    }
}

impl From<ActionRegistry> for Vec<Action> {
    fn from(registry: ActionRegistry) -> Self {
        registry.actions
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// Check every action and id uniqueness. Lists built through `apply` are
    /// always valid; deserialized ones are not.
    pub fn validate(&self) -> Result<(), EditError> {
        let mut seen = HashSet::with_capacity(self.actions.len());
        for action in &self.actions {
            action.validate()?;
            if !seen.insert(action.id) {
                return Err(EditError::DuplicateId(action.id));
            }
        }
        Ok(())
    }

    /// Module names in first-appearance order.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Actions of one module, in insertion order.
    pub fn group(&self, module_name: &str) -> Vec<&Action> {
        self.groups
            .get(module_name)
            .map(|idxs| idxs.iter().map(|&i| &self.actions[i]).collect())
            .unwrap_or_default()
    }

    /// All groups as (module name, member indices).
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Deep copy of the action list, for history snapshots.
    pub fn snapshot(&self) -> Vec<Action> {
        self.actions.clone()
    }

    /// Replace the whole action list (undo/redo, project load).
    pub fn replace(&mut self, actions: Vec<Action>) {
        self.actions = actions;
        self.regroup();
    }

    pub fn add(&mut self, action: Action) -> Result<Uuid, EditError> {
        let id = action.id;
        self.apply(vec![RegistryEdit::Add(action)])?;
        Ok(id)
    }

    pub fn update(&mut self, id: Uuid, patch: ActionPatch) -> Result<(), EditError> {
        self.apply(vec![RegistryEdit::Update { id, patch }])
    }

    pub fn remove(&mut self, id: Uuid) -> Result<Action, EditError> {
        let removed = self.get(id).cloned().ok_or(EditError::UnknownAction(id))?;
        self.apply(vec![RegistryEdit::Remove(id)])?;
        Ok(removed)
    }

    /// Apply a batch of edits as one mutation.
    ///
    /// Edits are applied in order to a working copy; the registry is only
    /// replaced if every edit succeeds.
    pub fn apply(&mut self, edits: Vec<RegistryEdit>) -> Result<(), EditError> {
        let mut working = self.actions.clone();
        for edit in edits {
            match edit {
                RegistryEdit::Add(mut action) => {
                    action.validate()?;
                    if working.iter().any(|a| a.id == action.id) {
                        return Err(EditError::DuplicateId(action.id));
                    }
                    if action.color.is_none() {
                        action.color = Some(color_for_module(&working, &action.module_name).to_string());
                    }
                    trace!("Add action {} to module {}", action.id, action.module_name);
                    working.push(action);
                }
                RegistryEdit::Update { id, patch } => {
                    let action = working.iter_mut().find(|a| a.id == id).ok_or(EditError::UnknownAction(id))?;
                    action.apply_patch(&patch)?;
                    trace!("Update action {}", id);
                }
                RegistryEdit::Remove(id) => {
                    let idx = working.iter().position(|a| a.id == id).ok_or(EditError::UnknownAction(id))?;
                    working.remove(idx);
                    trace!("Remove action {}", id);
                }
            }
        }
        self.actions = working;
        self.regroup();
        debug!("Registry now holds {} actions in {} modules", self.actions.len(), self.groups.len());
        Ok(())
    }

    fn regroup(&mut self) {
        self.groups = group_indices(&self.actions)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
    }
}

/// Colour for a new action: the module's existing colour, else the palette
/// entry for the module's position among distinct module names.
fn color_for_module<'a>(actions: &'a [Action], module_name: &str) -> &'a str {
    if let Some(color) = actions.iter().filter(|a| a.module_name == module_name).find_map(|a| a.color.as_deref()) {
        return color;
    }
    let groups = group_indices(actions);
    let idx = groups.get_index_of(module_name).unwrap_or(groups.len());
    MODULE_COLORS[idx % MODULE_COLORS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ActionRegistry {
        ActionRegistry::from(vec![
            Action::new("Feeder_1", "load", 0, 25, 100.0),
            Action::new("Conveyor_1", "belt", 10, 30, 100.0),
            Action::new("Feeder_1", "vibrate", 0, 20, 120.0),
        ])
    }

    #[test]
    fn test_groups_keep_first_appearance_and_insertion_order() {
        let reg = sample();
        let names: Vec<_> = reg.module_names().collect();
        assert_eq!(names, vec!["Feeder_1", "Conveyor_1"]);
        let feeder: Vec<_> = reg.group("Feeder_1").iter().map(|a| a.description.clone()).collect();
        assert_eq!(feeder, vec!["load", "vibrate"]);
        assert!(reg.group("missing").is_empty());
    }

    #[test]
    fn test_add_assigns_module_color() {
        let mut reg = ActionRegistry::new();
        reg.add(Action::new("A", "x", 0, 1, 1.0)).unwrap();
        reg.add(Action::new("B", "y", 0, 1, 1.0)).unwrap();
        reg.add(Action::new("A", "z", 0, 1, 1.0)).unwrap();
        let colors: Vec<_> = reg.actions().iter().map(|a| a.color.clone().unwrap()).collect();
        assert_eq!(colors, vec![MODULE_COLORS[0], MODULE_COLORS[1], MODULE_COLORS[0]]);
    }

    #[test]
    fn test_add_keeps_explicit_color() {
        let mut reg = ActionRegistry::new();
        reg.add(Action::new("A", "x", 0, 1, 1.0).with_color("#000000")).unwrap();
        reg.add(Action::new("A", "y", 0, 1, 1.0)).unwrap();
        assert_eq!(reg.actions()[1].color.as_deref(), Some("#000000"));
    }

    #[test]
    fn test_batch_is_atomic() {
        let mut reg = sample();
        let before = reg.snapshot();
        let first = before[0].id;
        let result = reg.apply(vec![
            RegistryEdit::Remove(first),
            RegistryEdit::Update { id: Uuid::new_v4(), patch: ActionPatch::default() },
        ]);
        assert!(matches!(result, Err(EditError::UnknownAction(_))));
        assert_eq!(reg.snapshot(), before);
    }

    #[test]
    fn test_batch_applies_in_order() {
        let mut reg = sample();
        let first = reg.actions()[0].id;
        let patch = ActionPatch { module_name: Some("Conveyor_1".into()), ..Default::default() };
        reg.apply(vec![RegistryEdit::Update { id: first, patch }]).unwrap();
        let conveyor: Vec<_> = reg.group("Conveyor_1").iter().map(|a| a.description.clone()).collect();
        // Group order follows backing-store order, not edit order
        assert_eq!(conveyor, vec!["load", "belt"]);
        assert_eq!(reg.module_names().collect::<Vec<_>>(), vec!["Conveyor_1", "Feeder_1"]);
    }

    #[test]
    fn test_remove_regroups() {
        let mut reg = sample();
        let belt = reg.actions()[1].id;
        let removed = reg.remove(belt).unwrap();
        assert_eq!(removed.description, "belt");
        assert_eq!(reg.module_names().collect::<Vec<_>>(), vec!["Feeder_1"]);
        assert_eq!(reg.remove(belt), Err(EditError::UnknownAction(belt)));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut reg = sample();
        let dup = reg.actions()[0].clone();
        assert_eq!(reg.add(dup.clone()), Err(EditError::DuplicateId(dup.id)));
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn test_validate_catches_bad_lists() {
        assert!(sample().validate().is_ok());

        let a = Action::new("m", "a", 0, 10, 100.0);
        let mut b = Action::new("m", "b", 0, 10, 50.0);
        b.id = a.id;
        let reg = ActionRegistry::from(vec![a.clone(), b]);
        assert_eq!(reg.validate(), Err(EditError::DuplicateId(a.id)));

        let reg = ActionRegistry::from(vec![Action::new("m", "a", 0, 10, 0.0)]);
        assert_eq!(reg.validate(), Err(EditError::Validation(ValidationError::InvalidDuration(0.0))));
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let reg = sample();
        let json = serde_json::to_value(&reg).unwrap();
        assert!(json.is_array());
        let back: ActionRegistry = serde_json::from_value(json).unwrap();
        assert_eq!(back, reg);
        assert_eq!(back.module_names().count(), 2);
    }
}
