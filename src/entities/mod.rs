//! Entities module - data model types, separate from scheduling and playback
//!
//! - [`Action`]: one timed operation, plus its raw/partial input forms
//! - [`ActionRegistry`]: ordered store grouped by module name
//! - [`Project`]: unit of serialization

pub mod action;
pub mod project;
pub mod registry;

pub use action::{Action, ActionDraft, ActionPatch, ValidationError};
pub use project::Project;
pub use registry::{ActionRegistry, EditError, RegistryEdit};
