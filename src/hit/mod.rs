//! Matches, queued updates and the per-file flush.
//!
//! A [`FileHit`] owns one file's parsed tree, the [`Match`]es a query
//! produced against it, and the queue of [`Update`]s those matches record.
//! Nothing touches the file until the hit is flushed, at which point every
//! queued update is applied in a single pass and the file is written once.
//!
//! # Offset discipline
//!
//! Every update is anchored to a byte offset in the *original* text. The
//! flush applies updates from the highest offset to the lowest, so each
//! splice happens in a region no earlier splice has shifted.

pub mod errors;
pub mod file_hit;
pub mod matches;
pub mod update;

pub use errors::{FlushError, MutationError};
pub use file_hit::{FileHit, FlushOutcome, PendingFlush};
pub use matches::Match;
pub use update::{apply_updates, ReplacementOptions, TrailingCleanup, Update, UpdateQueue};
