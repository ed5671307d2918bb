//! The grammar-plugin contract.
//!
//! A [`FileParser`] turns file text into a [`TreeNode`] tree using a single
//! grammar. Plugins are chosen by the caller; the engine never inspects the
//! grammar beyond this trait.

use crate::path::PathExpression;
use crate::tree::TreeNode;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Parses a file into an AST using a single grammar.
pub trait FileParser {
    /// Name of the top level production: the name of the root node.
    fn root_name(&self) -> &str;

    /// Parse `content` (the text of `path`) into a tree.
    fn to_ast(&self, path: &Path, content: &str) -> Result<Arc<TreeNode>, ParseError>;

    /// Can this path expression possibly match trees from this grammar?
    ///
    /// Called once per query, before any file is read.
    fn validate(&self, _query: &PathExpression) -> Result<(), QueryIncompatible> {
        Ok(())
    }
}

/// A file's text does not conform to the parser's grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to parse {}: {message}", path.display())]
pub struct ParseError {
    pub path: PathBuf,
    pub message: String,
}

impl ParseError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A path query names a production the grammar does not have.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("query '{query}' cannot match {root_name} trees: unknown node name '{name}'")]
pub struct QueryIncompatible {
    pub query: String,
    pub root_name: String,
    pub name: String,
}
