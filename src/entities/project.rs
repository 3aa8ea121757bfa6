//! Project: top-level container for one action list.
//!
//! Project is the unit of serialization: saved and loaded via
//! `Project::to_json` / `Project::from_json`. Only the data model is
//! written; schedule data is derived on load.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::Action;
use super::registry::ActionRegistry;

pub const PROJECT_VERSION: &str = "1.0.0";
pub const DEFAULT_PROJECT_NAME: &str = "Untitled Project";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Last edit; files do not record saves separately.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    /// Serialized as the plain ordered action list.
    #[serde(rename = "actions", default)]
    pub registry: ActionRegistry,
}

fn default_version() -> String {
    PROJECT_VERSION.to_string()
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            name: DEFAULT_PROJECT_NAME.to_string(),
            version: PROJECT_VERSION.to_string(),
            created_at: now,
            updated_at: now,
            registry: ActionRegistry::new(),
        }
    }

    /// Built-in sample: two modules exercising both scheduling policies.
    pub fn demo() -> Self {
        let blue = "#3b82f6";
        let green = "#10b981";
        let actions = vec![
            Action::new("Feeder_1", "material_loading", 0, 25, 100.0).with_stage("A").with_color(blue),
            Action::new("Feeder_1", "vibration_control", 0, 20, 120.0).with_stage("A").with_color(blue),
            Action::new("Feeder_1", "flow_regulation", -1, 15, 150.0).with_stage("B").with_color(blue),
            Action::new("Conveyor_1", "belt_operation", 10, 30, 100.0).with_stage("A").with_color(green),
            Action::new("Conveyor_1", "speed_control", 0, 25, 110.0).with_stage("B").with_color(green),
        ];
        Self {
            name: "Demo Project".to_string(),
            registry: ActionRegistry::from(actions),
            ..Self::new()
        }
    }

    /// Stamp `updated_at` after an edit.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize project")
    }

    /// Parse and validate. Rejects lists a draft could never have produced:
    /// non-positive durations, empty module names, duplicate ids.
    pub fn from_json(json: &str) -> Result<Self> {
        let project: Self = serde_json::from_str(json).context("Failed to parse project JSON")?;
        project.registry.validate().context("Invalid action list")?;
        Ok(project)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        fs::write(path, json).with_context(|| format!("Failed to write project: {}", path.display()))?;
        log::info!("Project '{}' saved to {}", self.name, path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).with_context(|| format!("Failed to read project: {}", path.display()))?;
        let project = Self::from_json(&json).with_context(|| format!("Invalid project file: {}", path.display()))?;
        log::info!(
            "Project '{}' loaded from {} ({} actions)",
            project.name,
            path.display(),
            project.registry.len()
        );
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_project_is_empty() {
        let p = Project::new();
        assert_eq!(p.name, DEFAULT_PROJECT_NAME);
        assert_eq!(p.version, PROJECT_VERSION);
        assert!(p.registry.is_empty());
    }

    #[test]
    fn test_demo_layout() {
        let p = Project::demo();
        assert_eq!(p.registry.len(), 5);
        assert_eq!(p.registry.module_names().collect::<Vec<_>>(), vec!["Feeder_1", "Conveyor_1"]);
        assert_eq!(p.registry.group("Feeder_1")[2].declared_start, -1);
    }

    #[test]
    fn test_json_keeps_order_and_ids() {
        let p = Project::demo();
        let json = p.to_json().unwrap();
        assert!(json.contains("\"actions\""));
        assert!(!json.contains("start_time"));
        let back = Project::from_json(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_from_json_defaults_missing_fields() {
        let json = r#"{"name":"p","actions":[{"id":"67e55044-10b1-426f-9247-bb680e5fe0c8","module_name":"m","declared_start":2,"move_count":3,"duration":10.0}]}"#;
        let p = Project::from_json(json).unwrap();
        assert_eq!(p.version, PROJECT_VERSION);
        assert_eq!(p.registry.actions()[0].description, "");
        assert_eq!(p.registry.actions()[0].stage, None);
    }

    #[test]
    fn test_from_json_fills_missing_timestamps() {
        let p = Project::from_json(r#"{"name":"p"}"#).unwrap();
        assert!(p.created_at <= Utc::now());
        assert!(p.registry.is_empty());
    }

    #[test]
    fn test_load_rejects_invalid_actions() {
        let dir = std::env::temp_dir().join("actiongrid_test_invalid_project");
        let _ = fs::create_dir_all(&dir);

        let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let dup = format!(
            r#"{{"name":"p","actions":[
                {{"id":"{id}","module_name":"m","declared_start":0,"move_count":10,"duration":100.0}},
                {{"id":"{id}","module_name":"m","declared_start":0,"move_count":5,"duration":50.0}}]}}"#
        );
        let path = dir.join("dup.json");
        fs::write(&path, dup).unwrap();
        let err = format!("{:#}", Project::load(&path).unwrap_err());
        assert!(err.contains("dup.json"));
        assert!(err.contains("Duplicate action id"));

        for duration in ["-100.0", "0.0"] {
            let json = format!(
                r#"{{"name":"p","actions":[{{"id":"{id}","module_name":"m","declared_start":0,"move_count":10,"duration":{duration}}}]}}"#
            );
            let path = dir.join("bad_duration.json");
            fs::write(&path, json).unwrap();
            let err = format!("{:#}", Project::load(&path).unwrap_err());
            assert!(err.contains("Duration must be a positive number"), "{err}");
        }

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_load_file() {
        let dir = std::env::temp_dir().join("actiongrid_test_project");
        let _ = fs::create_dir_all(&dir);
        let path = dir.join("demo.json");

        let p = Project::demo();
        p.save(&path).unwrap();
        let back = Project::load(&path).unwrap();
        assert_eq!(back, p);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = Project::load(Path::new("/nonexistent/actiongrid/nope.json")).unwrap_err();
        assert!(format!("{err:#}").contains("nope.json"));
    }
}
