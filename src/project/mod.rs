//! File storage the engine reads from and writes to.
//!
//! The engine only needs three operations, captured by [`Project`]. Paths
//! are relative to the project root and use `/` separators in globs.

pub mod deferred;
pub mod local;
pub mod memory;
pub mod staged;

pub use deferred::DeferredWrites;
pub use local::LocalProject;
pub use memory::InMemoryProject;
pub use staged::{StagedChange, StagedProject};

use crate::safety::SafetyError;
use globset::{GlobBuilder, GlobMatcher};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A set of files that can be listed, read and written.
pub trait Project {
    /// Read a file's current content.
    fn read(&self, path: &Path) -> Result<String, ProjectError>;

    /// Replace a file's content.
    fn write(&mut self, path: &Path, content: &str) -> Result<(), ProjectError>;

    /// Paths matching `glob`, sorted.
    fn list(&self, glob: &str) -> Result<Vec<PathBuf>, ProjectError>;
}

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid glob '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("failed to walk project: {0}")]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Safety(#[from] SafetyError),
}

/// Compile a glob where `*` stops at `/` and `**` crosses directories.
pub fn compile_glob(pattern: &str) -> Result<GlobMatcher, ProjectError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|source| ProjectError::InvalidGlob {
            pattern: pattern.to_string(),
            source,
        })
}
