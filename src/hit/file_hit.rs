use crate::hit::errors::FlushError;
use crate::hit::matches::Match;
use crate::hit::update::{apply_updates, UpdateQueue};
use crate::path::{PathEvaluator, QueryError};
use crate::project::{DeferredWrites, Project};
use crate::tree::TreeNode;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

/// One file's parsed tree, the matches a query found in it, and the edits
/// queued against them.
///
/// A file hit has exactly one flush. [`flush`](FileHit::flush) and
/// [`defer`](FileHit::defer) both consume it; dropping it without either
/// discards every queued edit.
#[derive(Debug)]
pub struct FileHit {
    path: PathBuf,
    file_node: Arc<TreeNode>,
    matches: Vec<Match>,
    queue: Rc<RefCell<UpdateQueue>>,
}

impl FileHit {
    /// Wrap the nodes a query selected in `file_node`, the tree parsed from `path`.
    pub fn new(path: impl Into<PathBuf>, file_node: Arc<TreeNode>, nodes: Vec<Arc<TreeNode>>) -> Self {
        let queue = Rc::new(RefCell::new(UpdateQueue::new()));
        let matches = nodes
            .into_iter()
            .map(|node| Match::new(node, Rc::clone(&queue)))
            .collect();

        Self {
            path: path.into(),
            file_node,
            matches,
            queue,
        }
    }

    /// Project-relative path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Root of the parsed tree, kept so further queries need no reparse.
    pub fn file_node(&self) -> &Arc<TreeNode> {
        &self.file_node
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn matches_mut(&mut self) -> &mut [Match] {
        &mut self.matches
    }

    /// Number of updates queued so far.
    pub fn pending_updates(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run another query over the whole file, sharing this hit's queue.
    pub fn evaluate_expression<E: PathEvaluator + ?Sized>(
        &self,
        evaluator: &E,
        query: &str,
    ) -> Result<Vec<Match>, QueryError> {
        let nodes = evaluator.evaluate(&self.file_node, query)?;
        Ok(nodes
            .into_iter()
            .map(|node| Match::new(node, Rc::clone(&self.queue)))
            .collect())
    }

    /// Apply every queued update and write the file now.
    pub fn flush<P: Project + ?Sized>(self, project: &mut P) -> Result<FlushOutcome, FlushError> {
        self.into_pending().run(project)
    }

    /// Hand this hit's single flush action to a deferred-write registry.
    pub fn defer(self, writes: &mut DeferredWrites) {
        writes.record(self.into_pending());
    }

    /// The flush action for this hit, detached from its tree and matches.
    ///
    /// Seals the queue: matches still alive from
    /// [`evaluate_expression`](FileHit::evaluate_expression) can no longer
    /// queue edits.
    pub fn into_pending(self) -> PendingFlush {
        self.queue.borrow_mut().seal();
        PendingFlush {
            path: self.path,
            queue: self.queue,
        }
    }
}

/// Result of flushing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "FlushOutcome reports whether the file was written"]
pub enum FlushOutcome {
    /// The file was rewritten
    Written { path: PathBuf, updates: usize },
    /// Nothing was queued, or the edits left the content as it was
    Unchanged { path: PathBuf },
}

impl FlushOutcome {
    pub fn path(&self) -> &Path {
        match self {
            FlushOutcome::Written { path, .. } | FlushOutcome::Unchanged { path } => path,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, FlushOutcome::Written { .. })
    }
}

/// A file hit's pending write.
///
/// Reads the file when run, not when created, so several pending flushes
/// for the same file compose in the order they run.
#[derive(Debug)]
pub struct PendingFlush {
    path: PathBuf,
    queue: Rc<RefCell<UpdateQueue>>,
}

impl PendingFlush {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pending_updates(&self) -> usize {
        self.queue.borrow().len()
    }

    /// The content running this flush would write, leaving the queue open.
    /// `None` when the file would not change.
    pub fn render<P: Project + ?Sized>(&self, project: &P) -> Result<Option<String>, FlushError> {
        let queue = self.queue.borrow();
        if queue.is_empty() {
            return Ok(None);
        }
        let current = project.read(&self.path)?;
        let rewritten = apply_updates(&self.path, &current, queue.updates())?;
        Ok((rewritten != current).then_some(rewritten))
    }

    /// Apply the queued updates to the file's current content and write it
    /// once. The file is left untouched on any error.
    pub fn run<P: Project + ?Sized>(self, project: &mut P) -> Result<FlushOutcome, FlushError> {
        let updates = self.queue.borrow_mut().drain();
        if updates.is_empty() {
            debug!(path = %self.path.display(), "no updates queued");
            return Ok(FlushOutcome::Unchanged { path: self.path });
        }

        let current = project.read(&self.path)?;
        let rewritten = apply_updates(&self.path, &current, &updates)?;
        if rewritten == current {
            return Ok(FlushOutcome::Unchanged { path: self.path });
        }

        project.write(&self.path, &rewritten)?;
        debug!(path = %self.path.display(), updates = updates.len(), "flushed file");

        Ok(FlushOutcome::Written {
            path: self.path,
            updates: updates.len(),
        })
    }
}
