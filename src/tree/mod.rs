//! Location-annotated syntax trees.
//!
//! Every grammar plugin produces the same [`TreeNode`] shape, so queries and
//! edits never depend on which parser built the tree.

pub mod node;
pub mod text;

pub use node::TreeNode;
pub use text::SourceText;
