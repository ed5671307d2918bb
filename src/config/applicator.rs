//! Runs an edit plan against a project.
//!
//! Edits run in plan order, each as its own batch, so a later edit sees the
//! files as earlier edits left them. One edit failing does not stop the
//! ones after it.

use crate::batch::{BatchEdit, BatchError, BatchOptions, BatchReport, CancelFlag};
use crate::config::schema::{EditDefinition, EditPlan, Engine};
use crate::path::{PathEngine, PathEvaluator};
use crate::project::Project;
use crate::sg::PatternEvaluator;
use crate::ts::{TreeSitterError, TreeSitterParser};
use std::fmt;
use tracing::info_span;

/// Errors that stop a single edit of a plan.
#[derive(Debug)]
pub enum ApplicationError {
    /// No grammar for the edit's language or glob
    UnknownLanguage { id: String },
    /// The cleanup regex does not compile
    Cleanup(regex::Error),
    /// The grammar could not be loaded
    Parser(TreeSitterError),
    Batch(BatchError),
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::UnknownLanguage { id } => {
                write!(f, "no grammar available for edit '{id}'")
            }
            ApplicationError::Cleanup(e) => write!(f, "invalid cleanup pattern: {e}"),
            ApplicationError::Parser(e) => write!(f, "parser error: {e}"),
            ApplicationError::Batch(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ApplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplicationError::Cleanup(e) => Some(e),
            ApplicationError::Parser(e) => Some(e),
            ApplicationError::Batch(e) => Some(e),
            ApplicationError::UnknownLanguage { .. } => None,
        }
    }
}

impl From<BatchError> for ApplicationError {
    fn from(e: BatchError) -> Self {
        ApplicationError::Batch(e)
    }
}

impl From<TreeSitterError> for ApplicationError {
    fn from(e: TreeSitterError) -> Self {
        ApplicationError::Parser(e)
    }
}

/// Apply every edit of `plan`, returning one result per edit id.
///
/// Once `cancel` is raised the remaining edits are not started.
pub fn apply_plan<P: Project + ?Sized>(
    plan: &EditPlan,
    project: &mut P,
    cancel: Option<&CancelFlag>,
) -> Vec<(String, Result<BatchReport, ApplicationError>)> {
    let mut results = Vec::with_capacity(plan.edits.len());
    for edit in &plan.edits {
        if cancel.is_some_and(CancelFlag::is_cancelled) {
            break;
        }
        let _span = info_span!("edit", id = %edit.id).entered();
        results.push((edit.id.clone(), apply_edit(edit, project, cancel)));
    }
    results
}

fn apply_edit<P: Project + ?Sized>(
    edit: &EditDefinition,
    project: &mut P,
    cancel: Option<&CancelFlag>,
) -> Result<BatchReport, ApplicationError> {
    let lang = edit.language().ok_or_else(|| ApplicationError::UnknownLanguage {
        id: edit.id.clone(),
    })?;
    let parser = TreeSitterParser::for_language(lang)?;

    let pattern_engine;
    let evaluator: &dyn PathEvaluator = match edit.engine {
        Engine::Path => &PathEngine,
        Engine::Pattern => {
            pattern_engine = PatternEvaluator::new(lang);
            &pattern_engine
        }
    };

    let mut options = BatchOptions::default();
    if let Some(cleanup) = &edit.cleanup {
        options.cleanup = cleanup.options().map_err(ApplicationError::Cleanup)?;
    }
    options.cancel = cancel.cloned();

    let report = BatchEdit::new(&parser, evaluator, &edit.glob, &edit.query, edit.action.policy())
        .options(options)
        .run(project)?;
    Ok(report)
}
