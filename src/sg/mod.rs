//! Structural pattern queries via ast-grep.
//!
//! An alternative to path expressions: the query is a code snippet with
//! metavariables (`$NAME`, `$$$ARGS`), and every matching node of the
//! parsed tree becomes a match.

pub mod matcher;

pub use matcher::PatternEvaluator;
