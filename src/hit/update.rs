use crate::hit::errors::FlushError;
use regex::Regex;
use std::cmp::Reverse;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

/// A pattern to replace immediately after an edit point.
///
/// Typically absorbs whitespace left dangling by a deletion. The first match of
/// the pattern in the text following the edit point is replaced.
#[derive(Debug, Clone)]
pub struct TrailingCleanup {
    pub after: Regex,
    pub replacement: String,
}

impl TrailingCleanup {
    pub fn new(after: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            after: Regex::new(after)?,
            replacement: replacement.into(),
        })
    }

    fn apply(&self, text: &mut String, at: usize) {
        if let Some(found) = self.after.find(&text[at..]) {
            text.replace_range(at + found.start()..at + found.end(), &self.replacement);
        }
    }
}

/// Options for replacing or deleting a matched node.
#[derive(Debug, Clone, Default)]
pub struct ReplacementOptions {
    pub replace_after: Option<TrailingCleanup>,
}

impl ReplacementOptions {
    /// Remove whatever whitespace follows the edit.
    pub fn zap_trailing_whitespace() -> Self {
        Self::whitespace_to("")
    }

    /// Collapse whatever whitespace follows the edit to a single space.
    pub fn collapse_trailing_whitespace() -> Self {
        Self::whitespace_to(" ")
    }

    /// Replace the first text matching `after` that follows the edit.
    pub fn replace_after(after: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            replace_after: Some(TrailingCleanup::new(after, replacement)?),
        })
    }

    fn whitespace_to(replacement: &str) -> Self {
        Self {
            replace_after: Some(TrailingCleanup {
                after: Regex::new(r"\s*").expect("whitespace pattern is valid"),
                replacement: replacement.to_string(),
            }),
        }
    }
}

/// One pending text edit, anchored in the original file text.
#[derive(Debug, Clone)]
pub struct Update {
    /// Text expected at `offset`; empty for a pure insertion
    pub initial_value: String,
    /// Text that replaces `initial_value`
    pub current_value: String,
    /// Byte offset in the original text
    pub offset: usize,
    pub trailing_cleanup: Option<TrailingCleanup>,
}

impl Update {
    pub fn insertion(offset: usize, content: impl Into<String>) -> Self {
        Self {
            initial_value: String::new(),
            current_value: content.into(),
            offset,
            trailing_cleanup: None,
        }
    }

    pub fn replacement(
        offset: usize,
        initial_value: impl Into<String>,
        current_value: impl Into<String>,
        trailing_cleanup: Option<TrailingCleanup>,
    ) -> Self {
        Self {
            initial_value: initial_value.into(),
            current_value: current_value.into(),
            offset,
            trailing_cleanup,
        }
    }

    /// Original byte range this update replaces.
    pub fn consumed(&self) -> Range<usize> {
        self.offset..self.offset + self.initial_value.len()
    }

    pub fn is_insertion(&self) -> bool {
        self.initial_value.is_empty()
    }
}

/// Ordered collection of updates for one file.
///
/// Shared between a [`FileHit`](crate::hit::FileHit) and its matches. Once
/// sealed by a flush it accepts no further updates.
#[derive(Debug, Default)]
pub struct UpdateQueue {
    updates: Vec<Update>,
    sealed: bool,
}

impl UpdateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, update: Update) {
        self.updates.push(update);
    }

    pub fn updates(&self) -> &[Update] {
        &self.updates
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Refuse any further updates.
    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }

    /// Seal the queue and take every queued update.
    pub(crate) fn drain(&mut self) -> Vec<Update> {
        self.seal();
        std::mem::take(&mut self.updates)
    }
}

/// Apply `updates` to `content` in one pass.
///
/// Updates are applied from the highest offset down. At a shared offset the
/// replacing update goes first and insertions follow in reverse queue order,
/// so that in the result insertions read in the order they were queued and
/// precede the replacement text. Each replacement is spliced at its exact
/// original position after checking the text there is still
/// `initial_value`.
pub fn apply_updates(path: &Path, content: &str, updates: &[Update]) -> Result<String, FlushError> {
    check_conflicts(path, updates)?;

    let mut order: Vec<usize> = (0..updates.len()).collect();
    order.sort_by_key(|&i| (Reverse(updates[i].offset), updates[i].is_insertion(), Reverse(i)));

    let mut text = content.to_string();
    for i in order {
        let update = &updates[i];
        let range = update.consumed();

        if range.end > text.len()
            || !text.is_char_boundary(range.start)
            || !text.is_char_boundary(range.end)
        {
            return Err(FlushError::InvalidRange {
                path: path.to_path_buf(),
                start: range.start,
                end: range.end,
                len: text.len(),
            });
        }

        let found = &text[range.clone()];
        if found != update.initial_value {
            return Err(FlushError::ContentMismatch {
                path: path.to_path_buf(),
                offset: update.offset,
                expected: update.initial_value.clone(),
                found: found.to_string(),
            });
        }

        debug!(
            offset = update.offset,
            initial = ?update.initial_value,
            current = ?update.current_value,
            "applying update"
        );
        text.replace_range(range.clone(), &update.current_value);

        if let Some(cleanup) = &update.trailing_cleanup {
            cleanup.apply(&mut text, range.start + update.current_value.len());
        }
    }

    Ok(text)
}

/// Reject updates whose consumed ranges overlap, or insertions that land
/// strictly inside another update's consumed range.
fn check_conflicts(path: &Path, updates: &[Update]) -> Result<(), FlushError> {
    let conflict = |first: Range<usize>, second: Range<usize>| FlushError::FlushConflict {
        path: path.to_path_buf(),
        first,
        second,
    };

    let mut consumed: Vec<Range<usize>> = updates
        .iter()
        .filter(|u| !u.is_insertion())
        .map(Update::consumed)
        .collect();
    consumed.sort_by_key(|r| (r.start, r.end));

    for pair in consumed.windows(2) {
        if pair[0].end > pair[1].start {
            return Err(conflict(pair[0].clone(), pair[1].clone()));
        }
    }

    for insertion in updates.iter().filter(|u| u.is_insertion()) {
        let at = insertion.offset;
        if let Some(range) = consumed.iter().find(|r| r.start < at && at < r.end) {
            return Err(conflict(range.clone(), at..at));
        }
    }

    Ok(())
}
