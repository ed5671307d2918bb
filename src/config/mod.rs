//! TOML edit plans.

pub mod applicator;
pub mod loader;
pub mod schema;

pub use applicator::{apply_plan, ApplicationError};
pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{
    Action, Cleanup, EditDefinition, EditPlan, Engine, Metadata, ValidationError, ValidationIssue,
};
