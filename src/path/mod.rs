//! Structural path queries over [`TreeNode`](crate::tree::TreeNode) trees.
//!
//! The engine treats query evaluation as a black box behind
//! [`PathEvaluator`]. [`PathEngine`] evaluates the XPath-like expressions
//! implemented in [`expr`]; the ast-grep evaluator lives in
//! [`crate::sg`].

pub mod errors;
pub mod expr;

pub use errors::QueryError;
pub use expr::{Axis, NodeTest, PathExpression, Predicate};

use crate::tree::TreeNode;
use std::sync::Arc;

/// Evaluates a query against a root node, returning matches in document order.
pub trait PathEvaluator {
    /// Run `query` with `root` as the context node.
    fn evaluate(&self, root: &Arc<TreeNode>, query: &str) -> Result<Vec<Arc<TreeNode>>, QueryError>;

    /// Parse `query` as a path expression, if this evaluator speaks that
    /// language. Grammar plugins use the result to reject queries before any
    /// file is read.
    fn path_expression(&self, _query: &str) -> Option<Result<PathExpression, QueryError>> {
        None
    }
}

/// Evaluator for [`PathExpression`] queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathEngine;

impl PathEvaluator for PathEngine {
    fn evaluate(&self, root: &Arc<TreeNode>, query: &str) -> Result<Vec<Arc<TreeNode>>, QueryError> {
        Ok(PathExpression::parse(query)?.evaluate(root))
    }

    fn path_expression(&self, query: &str) -> Option<Result<PathExpression, QueryError>> {
        Some(PathExpression::parse(query))
    }
}
