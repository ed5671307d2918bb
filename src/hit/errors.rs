use crate::project::ProjectError;
use std::ops::Range;
use std::path::PathBuf;
use thiserror::Error;

/// A mutation could not be queued on a match.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("cannot update {name}={value:?}: node has no source offset")]
    MissingOffset { name: String, value: String },

    #[error("{name} at offset {offset} already has a pending value edit")]
    DoubleEdit { name: String, offset: usize },

    #[error("cannot update {name}: its file hit has already been flushed")]
    AlreadyFlushed { name: String },
}

/// Queued updates could not be applied to a file.
#[derive(Error, Debug)]
pub enum FlushError {
    #[error("overlapping edits in {}: {first:?} and {second:?}", path.display())]
    FlushConflict {
        path: PathBuf,
        first: Range<usize>,
        second: Range<usize>,
    },

    #[error("content changed in {} at byte {offset}: expected {expected:?}, found {found:?}", path.display())]
    ContentMismatch {
        path: PathBuf,
        offset: usize,
        expected: String,
        found: String,
    },

    #[error("invalid byte range [{start}, {end}) in {} of length {len}", path.display())]
    InvalidRange {
        path: PathBuf,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error(transparent)]
    Project(#[from] ProjectError),
}
