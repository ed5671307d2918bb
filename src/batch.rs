//! Apply one query and one edit policy across every file matching a glob.
//!
//! The driver validates the query once, then walks the matching files in
//! path order. A file that fails to read, parse, query, edit or flush is
//! recorded in the [`BatchReport`] and skipped; the rest of the batch
//! carries on. A file is never partially rewritten.

use crate::hit::{FileHit, FlushError, Match, MutationError, ReplacementOptions};
use crate::parse::{FileParser, ParseError, QueryIncompatible};
use crate::path::{PathEvaluator, QueryError};
use crate::project::{DeferredWrites, Project, ProjectError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// What to do to every match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditPolicy {
    Zap,
    Replace(String),
    Prepend(String),
    Append(String),
}

impl EditPolicy {
    /// Queue this policy's edit on `m`. `cleanup` applies to zap and replace.
    pub fn apply(&self, m: &mut Match, cleanup: &ReplacementOptions) -> Result<(), MutationError> {
        match self {
            EditPolicy::Zap => m.zap(cleanup),
            EditPolicy::Replace(text) => m.replace(text, cleanup),
            EditPolicy::Prepend(text) => m.prepend(text),
            EditPolicy::Append(text) => m.append(text),
        }
    }
}

/// Shared stop signal for a running batch. Checked between files.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Trailing cleanup for zap and replace policies.
    pub cleanup: ReplacementOptions,
    pub cancel: Option<CancelFlag>,
}

impl BatchOptions {
    pub fn with_cleanup(mut self, cleanup: ReplacementOptions) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Files where the query found at least one match.
    pub matched: Vec<PathBuf>,
    /// Files rewritten. Empty for deferred batches until the writes commit.
    pub modified: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
    /// The cancel flag was raised before every file was visited.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

/// A file the batch skipped, and why.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: FileError,
}

/// Per-file failure inside a batch.
#[derive(Error, Debug)]
pub enum FileError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Flush(#[from] FlushError),
}

/// Failure that stops a batch before any file is edited.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Incompatible(#[from] QueryIncompatible),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Project(#[from] ProjectError),
}

/// Edit queued at one match. Receives the batch's trailing cleanup.
pub type MatchEdit<'a> = Box<dyn Fn(&mut Match, &ReplacementOptions) -> Result<(), MutationError> + 'a>;

/// A query plus the edit to make at every match.
pub struct BatchEdit<'a> {
    parser: &'a dyn FileParser,
    evaluator: &'a dyn PathEvaluator,
    glob: &'a str,
    query: &'a str,
    edit: MatchEdit<'a>,
    options: BatchOptions,
}

impl<'a> BatchEdit<'a> {
    pub fn new(
        parser: &'a dyn FileParser,
        evaluator: &'a dyn PathEvaluator,
        glob: &'a str,
        query: &'a str,
        policy: EditPolicy,
    ) -> Self {
        Self::with_edit(parser, evaluator, glob, query, move |m, cleanup| policy.apply(m, cleanup))
    }

    /// Run `edit` on every match. It may inspect the match and leave it
    /// untouched; a file whose matches queue nothing is not written.
    pub fn with_edit<F>(
        parser: &'a dyn FileParser,
        evaluator: &'a dyn PathEvaluator,
        glob: &'a str,
        query: &'a str,
        edit: F,
    ) -> Self
    where
        F: Fn(&mut Match, &ReplacementOptions) -> Result<(), MutationError> + 'a,
    {
        Self {
            parser,
            evaluator,
            glob,
            query,
            edit: Box::new(edit),
            options: BatchOptions::default(),
        }
    }

    pub fn options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Edit and flush each file as it is visited.
    pub fn run<P: Project + ?Sized>(&self, project: &mut P) -> Result<BatchReport, BatchError> {
        let paths = self.prepare(&*project)?;
        let mut report = BatchReport::default();

        for path in paths {
            if self.options.cancelled() {
                report.cancelled = true;
                break;
            }

            let hit = match self.edit_file(&*project, &path) {
                Ok(Some(hit)) => hit,
                Ok(None) => continue,
                Err(error) => {
                    record_failure(&mut report, path, error);
                    continue;
                }
            };
            report.matched.push(path.clone());

            match hit.flush(project) {
                Ok(outcome) if outcome.is_written() => report.modified.push(path),
                Ok(_) => {}
                Err(error) => record_failure(&mut report, path, error.into()),
            }
        }

        debug!(
            matched = report.matched.len(),
            modified = report.modified.len(),
            failed = report.failures.len(),
            "batch finished"
        );
        Ok(report)
    }

    /// Edit each file and register its flush with `writes` instead of
    /// writing. The project is only read.
    pub fn run_deferred<P: Project + ?Sized>(
        &self,
        project: &P,
        writes: &mut DeferredWrites,
    ) -> Result<BatchReport, BatchError> {
        let paths = self.prepare(project)?;
        let mut report = BatchReport::default();

        for path in paths {
            if self.options.cancelled() {
                report.cancelled = true;
                break;
            }

            match self.edit_file(project, &path) {
                Ok(Some(hit)) => {
                    report.matched.push(path);
                    hit.defer(writes);
                }
                Ok(None) => {}
                Err(error) => record_failure(&mut report, path, error),
            }
        }
        Ok(report)
    }

    /// Check the query against the grammar, then list the files.
    fn prepare<P: Project + ?Sized>(&self, project: &P) -> Result<Vec<PathBuf>, BatchError> {
        if let Some(expression) = self.evaluator.path_expression(self.query) {
            self.parser.validate(&expression?)?;
        }
        let paths = project.list(self.glob)?;
        debug!(glob = self.glob, files = paths.len(), query = self.query, "starting batch");
        Ok(paths)
    }

    /// Parse, query and edit one file. `None` when the query matched nothing.
    fn edit_file<P: Project + ?Sized>(&self, project: &P, path: &Path) -> Result<Option<FileHit>, FileError> {
        let Some(mut hit) = find_hits(project, self.parser, self.evaluator, path, self.query)? else {
            return Ok(None);
        };
        for m in hit.matches_mut() {
            (self.edit)(m, &self.options.cleanup)?;
        }
        Ok(Some(hit))
    }
}

fn record_failure(report: &mut BatchReport, path: PathBuf, error: FileError) {
    warn!(path = %path.display(), %error, "skipping file");
    report.failures.push(FileFailure { path, error });
}

/// Parse one file and evaluate `query` against it.
///
/// Returns `None` when nothing matched, so no hit (and no flush) exists for
/// an untouched file.
pub fn find_hits<P, F, E>(
    project: &P,
    parser: &F,
    evaluator: &E,
    path: &Path,
    query: &str,
) -> Result<Option<FileHit>, FileError>
where
    P: Project + ?Sized,
    F: FileParser + ?Sized,
    E: PathEvaluator + ?Sized,
{
    let content = project.read(path)?;
    let root = parser.to_ast(path, &content)?;
    let nodes = evaluator.evaluate(&root, query)?;
    if nodes.is_empty() {
        return Ok(None);
    }
    debug!(path = %path.display(), matches = nodes.len(), "query matched");
    Ok(Some(FileHit::new(path, root, nodes)))
}

/// Call `edit` at every match of `query` in files matching `glob`, flushing
/// each file immediately.
pub fn edit_each_match<P, F>(
    project: &mut P,
    parser: &dyn FileParser,
    evaluator: &dyn PathEvaluator,
    glob: &str,
    query: &str,
    options: BatchOptions,
    edit: F,
) -> Result<BatchReport, BatchError>
where
    P: Project + ?Sized,
    F: Fn(&mut Match, &ReplacementOptions) -> Result<(), MutationError>,
{
    BatchEdit::with_edit(parser, evaluator, glob, query, edit)
        .options(options)
        .run(project)
}

/// Apply `policy` at every match of `query` in files matching `glob`,
/// flushing each file immediately.
pub fn edit_all<P: Project + ?Sized>(
    project: &mut P,
    parser: &dyn FileParser,
    evaluator: &dyn PathEvaluator,
    glob: &str,
    query: &str,
    policy: EditPolicy,
    options: BatchOptions,
) -> Result<BatchReport, BatchError> {
    edit_each_match(project, parser, evaluator, glob, query, options, |m, cleanup| {
        policy.apply(m, cleanup)
    })
}

/// Delete every match of `query` in files matching `glob`.
pub fn zap_all_matches<P: Project + ?Sized>(
    project: &mut P,
    parser: &dyn FileParser,
    evaluator: &dyn PathEvaluator,
    glob: &str,
    query: &str,
    options: BatchOptions,
) -> Result<BatchReport, BatchError> {
    edit_each_match(project, parser, evaluator, glob, query, options, |m, cleanup| m.zap(cleanup))
}
