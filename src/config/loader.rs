use crate::config::schema::{EditPlan, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn at(self, plan: &Path) -> Self {
        let path = Some(plan.to_path_buf());
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml { path, source },
            ConfigError::Validation { path: None, source } => {
                ConfigError::Validation { path, source }
            }
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read edit plan {}: {}", path.display(), source)
            }
            ConfigError::Toml { path: Some(path), source } => {
                write!(f, "edit plan {} is not valid TOML: {}", path.display(), source)
            }
            ConfigError::Toml { path: None, source } => {
                write!(f, "edit plan is not valid TOML: {}", source)
            }
            ConfigError::Validation { path: Some(path), source } => {
                write!(f, "invalid edit plan {}:\n{}", path.display(), source)
            }
            ConfigError::Validation { path: None, source } => {
                write!(f, "invalid edit plan:\n{}", source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

/// Parse and validate an edit plan.
pub fn load_from_str(input: &str) -> Result<EditPlan, ConfigError> {
    let plan: EditPlan = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    plan.validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(plan)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<EditPlan, ConfigError> {
    let path = path.as_ref();
    let input = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&input).map_err(|e| e.at(path))
}
