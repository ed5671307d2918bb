//! Tree-sitter grammar plugin.
//!
//! Uses the grammars bundled with `ast-grep-language` and converts the
//! concrete syntax tree into [`TreeNode`](crate::tree::TreeNode)s, keeping
//! anonymous tokens so that punctuation can be selected and edited too.

pub mod errors;
pub mod lang;
pub mod parser;

pub use errors::TreeSitterError;
pub use ast_grep_language::SupportLang;
pub use lang::{language_for_glob, language_for_path, language_named};
pub use parser::TreeSitterParser;
