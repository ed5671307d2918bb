use crate::cache;
use crate::path::{PathEvaluator, QueryError};
use crate::tree::TreeNode;
use ast_grep_core::AstGrep;
use ast_grep_language::SupportLang;
use std::sync::Arc;
use tracing::trace;

/// [`PathEvaluator`] whose queries are ast-grep patterns.
///
/// # Pattern syntax
///
/// - `$NAME` matches a single node
/// - `$$$NAME` matches zero or more nodes
/// - `$_` matches any single node without capturing it
///
/// ```text
/// console.log($$$ARGS)        // every console.log call
/// const $NAME: $TYPE = $VAL   // typed const declarations
/// $EXPR.unwrap()              // unwrap calls
/// ```
///
/// The evaluated node's text is reparsed with the evaluator's grammar and
/// each pattern match is mapped back to the node of the same kind and span
/// in the given tree, so the result can be edited like any other match.
/// Evaluating against a fragment that does not parse on its own yields
/// whatever ast-grep recovers.
#[derive(Debug, Clone, Copy)]
pub struct PatternEvaluator {
    lang: SupportLang,
}

impl PatternEvaluator {
    pub fn new(lang: SupportLang) -> Self {
        Self { lang }
    }

    pub fn language(&self) -> SupportLang {
        self.lang
    }
}

impl PathEvaluator for PatternEvaluator {
    fn evaluate(&self, root: &Arc<TreeNode>, query: &str) -> Result<Vec<Arc<TreeNode>>, QueryError> {
        let base = root.offset.ok_or(QueryError::UnlocatedRoot)?;
        let pattern =
            cache::compile_pattern(query, self.lang).map_err(|message| QueryError::InvalidPattern {
                pattern: query.to_string(),
                message,
            })?;

        let sg = AstGrep::new(root.value.as_str(), self.lang);
        let sg_root = sg.root();
        let mut found = Vec::new();
        for m in sg_root.find_all(&pattern) {
            let range = m.range();
            let kind = m.kind();
            match root.find_spanning(base + range.start, base + range.end, Some(&*kind)) {
                Some(node) => found.push(node),
                None => trace!(kind = %kind, ?range, "pattern match has no tree counterpart"),
            }
        }
        Ok(found)
    }
}
