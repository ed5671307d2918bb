//! Tree Patcher: structural, offset-exact edits across a project.
//!
//! Files are parsed into location-annotated trees, a query selects nodes,
//! and edits queued against those nodes are applied to the original text in
//! one pass per file. Formatting outside the edited spans is left exactly
//! as it was.
//!
//! # Architecture
//!
//! - [`FileParser`] plugins turn text into [`TreeNode`] trees. The bundled
//!   [`TreeSitterParser`] covers every grammar shipped with ast-grep.
//! - [`PathEvaluator`]s select nodes: [`PathEngine`] for path expressions
//!   such as `//type_annotation`, [`PatternEvaluator`] for ast-grep code
//!   patterns.
//! - A [`FileHit`] wraps one file's matches. Each [`Match`] queues its edits
//!   in the hit's update queue; flushing the hit writes the file once.
//! - The batch driver ([`edit_all`], [`zap_all_matches`]) does all of the
//!   above for every file matching a glob.
//!
//! # Safety
//!
//! - Every splice verifies the text it replaces
//! - Overlapping edits are rejected, never guessed at
//! - Disk writes are atomic (tempfile + fsync + rename) and stay inside the
//!   project root
//!
//! # Example
//!
//! ```
//! use tree_patcher::{
//!     zap_all_matches, BatchOptions, InMemoryProject, PathEngine, SupportLang, TreeSitterParser,
//! };
//!
//! let mut project = InMemoryProject::of([("src/a.ts", "const x: number = 10;\n")]);
//! let parser = TreeSitterParser::for_language(SupportLang::TypeScript)?;
//!
//! let report = zap_all_matches(
//!     &mut project,
//!     &parser,
//!     &PathEngine,
//!     "src/**/*.ts",
//!     "//type_annotation",
//!     BatchOptions::default(),
//! )?;
//!
//! assert_eq!(report.modified.len(), 1);
//! assert_eq!(project.content("src/a.ts"), Some("const x = 10;\n"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod batch;
pub mod cache;
pub mod config;
pub mod hit;
pub mod logging;
pub mod parse;
pub mod path;
pub mod pool;
pub mod project;
pub mod safety;
pub mod sg;
pub mod tree;
pub mod ts;

// Re-exports
pub use batch::{
    edit_all, edit_each_match, find_hits, zap_all_matches, BatchEdit, BatchError, BatchOptions,
    BatchReport, CancelFlag, EditPolicy, FileError, FileFailure, MatchEdit,
};
pub use config::{apply_plan, load_from_path, load_from_str, ApplicationError, ConfigError, EditPlan};
pub use hit::{
    FileHit, FlushError, FlushOutcome, Match, MutationError, PendingFlush, ReplacementOptions,
    TrailingCleanup,
};
pub use parse::{FileParser, ParseError, QueryIncompatible};
pub use path::{PathEngine, PathEvaluator, PathExpression, QueryError};
pub use project::{
    DeferredWrites, InMemoryProject, LocalProject, Project, ProjectError, StagedChange,
    StagedProject,
};
pub use safety::{SafetyError, WorkspaceGuard};
pub use sg::PatternEvaluator;
pub use tree::{SourceText, TreeNode};
pub use ts::{SupportLang, TreeSitterError, TreeSitterParser};
