use crate::hit::errors::MutationError;
use crate::hit::update::{ReplacementOptions, TrailingCleanup, Update, UpdateQueue};
use crate::path::{PathEvaluator, QueryError};
use crate::tree::TreeNode;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

/// A matched node that can queue edits against its file.
///
/// The node itself is never modified. Mutations record [`Update`]s in the
/// owning file hit's queue, anchored to the node's original offset, and are
/// applied when the hit is flushed.
///
/// A match allows any number of [`prepend`](Match::prepend) and
/// [`append`](Match::append) calls but at most one value edit
/// ([`zap`](Match::zap), [`replace`](Match::replace) or
/// [`replace_value`](Match::replace_value)).
#[derive(Debug)]
pub struct Match {
    node: Arc<TreeNode>,
    pending_value: String,
    value_edited: bool,
    queue: Rc<RefCell<UpdateQueue>>,
}

impl Match {
    pub(crate) fn new(node: Arc<TreeNode>, queue: Rc<RefCell<UpdateQueue>>) -> Self {
        Self {
            pending_value: node.value.to_string(),
            value_edited: false,
            node,
            queue,
        }
    }

    /// The underlying tree node.
    pub fn node(&self) -> &Arc<TreeNode> {
        &self.node
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// The value this node will have once the file is flushed.
    pub fn value(&self) -> &str {
        &self.pending_value
    }

    /// The value as parsed.
    pub fn original_value(&self) -> &str {
        &self.node.value
    }

    pub fn offset(&self) -> Option<usize> {
        self.node.offset
    }

    pub fn children(&self) -> &[Arc<TreeNode>] {
        &self.node.children
    }

    /// Whether a value edit is pending for this match.
    pub fn is_edited(&self) -> bool {
        self.value_edited
    }

    /// Insert `content` immediately before the node.
    pub fn prepend(&mut self, content: &str) -> Result<(), MutationError> {
        let offset = self.require_offset()?;
        self.queue.borrow_mut().push(Update::insertion(offset, content));
        Ok(())
    }

    /// Insert `content` immediately after the node's value.
    ///
    /// The anchor is the end of the *original* value: that is where the
    /// pending value ends once a value edit on this match has been applied.
    /// Repeated appends come out in call order.
    pub fn append(&mut self, content: &str) -> Result<(), MutationError> {
        let offset = self.require_offset()?;
        let end = offset + self.node.value.len();
        self.queue.borrow_mut().push(Update::insertion(end, content));
        Ok(())
    }

    /// Delete the node's value, optionally cleaning up what follows it.
    pub fn zap(&mut self, options: &ReplacementOptions) -> Result<(), MutationError> {
        self.edit_value(String::new(), options.replace_after.clone())
    }

    /// Replace the node's value, optionally cleaning up what follows it.
    pub fn replace(&mut self, new_content: &str, options: &ReplacementOptions) -> Result<(), MutationError> {
        self.edit_value(new_content.to_string(), options.replace_after.clone())
    }

    /// Set a new value for the node.
    pub fn replace_value(&mut self, value: &str) -> Result<(), MutationError> {
        self.edit_value(value.to_string(), None)
    }

    /// Run a further query scoped to this node.
    ///
    /// The returned matches share this match's update queue, so their edits
    /// are flushed together with the rest of the file.
    pub fn evaluate_expression<E: PathEvaluator + ?Sized>(
        &self,
        evaluator: &E,
        query: &str,
    ) -> Result<Vec<Match>, QueryError> {
        let nodes = evaluator.evaluate(&self.node, query)?;
        Ok(nodes
            .into_iter()
            .map(|node| Match::new(node, Rc::clone(&self.queue)))
            .collect())
    }

    fn edit_value(
        &mut self,
        new_value: String,
        cleanup: Option<TrailingCleanup>,
    ) -> Result<(), MutationError> {
        let offset = self.require_offset()?;
        if self.value_edited {
            return Err(MutationError::DoubleEdit {
                name: self.node.name.clone(),
                offset,
            });
        }

        debug!(
            name = %self.node.name,
            from = ?self.pending_value,
            to = ?new_value,
            "updating value"
        );
        self.queue.borrow_mut().push(Update::replacement(
            offset,
            self.node.value.to_string(),
            new_value.clone(),
            cleanup,
        ));
        self.pending_value = new_value;
        self.value_edited = true;
        Ok(())
    }

    fn require_offset(&self) -> Result<usize, MutationError> {
        let offset = self.node.offset.ok_or_else(|| MutationError::MissingOffset {
            name: self.node.name.clone(),
            value: self.node.value.to_string(),
        })?;
        if self.queue.borrow().is_sealed() {
            return Err(MutationError::AlreadyFlushed {
                name: self.node.name.clone(),
            });
        }
        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::update::apply_updates;
    use crate::path::PathEngine;
    use std::path::Path;

    const SOURCE: &str = "const x: number = 10;";

    fn queue() -> Rc<RefCell<UpdateQueue>> {
        Rc::new(RefCell::new(UpdateQueue::new()))
    }

    fn flushed(queue: &Rc<RefCell<UpdateQueue>>) -> String {
        let updates = queue.borrow_mut().drain();
        apply_updates(Path::new("src/test.ts"), SOURCE, &updates).unwrap()
    }

    fn number(queue: &Rc<RefCell<UpdateQueue>>) -> Match {
        Match::new(Arc::new(TreeNode::located("predefined_type", "number", 9)), Rc::clone(queue))
    }

    #[test]
    fn append_and_prepend() {
        let q = queue();
        let mut m = number(&q);
        m.prepend("<").unwrap();
        m.append(">").unwrap();
        assert_eq!(m.value(), "number");
        assert_eq!(flushed(&q), "const x: <number> = 10;");
    }

    #[test]
    fn chained_appends_follow_each_other() {
        let q = queue();
        let mut m = number(&q);
        m.append(" | string").unwrap();
        m.append(" | null").unwrap();
        assert_eq!(flushed(&q), "const x: number | string | null = 10;");
    }

    #[test]
    fn append_lands_after_replaced_value() {
        let q = queue();
        let mut m = number(&q);
        m.replace_value("bigint").unwrap();
        m.append("[]").unwrap();
        m.prepend("readonly ").unwrap();
        assert_eq!(m.value(), "bigint");
        assert_eq!(flushed(&q), "const x: readonly bigint[] = 10;");
    }

    #[test]
    fn second_value_edit_is_rejected() {
        let q = queue();
        let mut m = number(&q);
        m.replace("string", &ReplacementOptions::default()).unwrap();
        let err = m.zap(&ReplacementOptions::default()).unwrap_err();
        assert_eq!(
            err,
            MutationError::DoubleEdit {
                name: "predefined_type".to_string(),
                offset: 9
            }
        );
        assert_eq!(q.borrow().len(), 1);
        assert_eq!(flushed(&q), "const x: string = 10;");
    }

    #[test]
    fn missing_offset_is_fatal() {
        let q = queue();
        let mut m = Match::new(Arc::new(TreeNode::synthesized("predefined_type", "number")), Rc::clone(&q));
        assert!(matches!(m.append("x"), Err(MutationError::MissingOffset { .. })));
        assert!(matches!(m.prepend("x"), Err(MutationError::MissingOffset { .. })));
        assert!(matches!(
            m.zap(&ReplacementOptions::default()),
            Err(MutationError::MissingOffset { .. })
        ));
        assert!(matches!(m.replace_value("x"), Err(MutationError::MissingOffset { .. })));
        assert!(q.borrow().is_empty());
    }

    #[test]
    fn mutation_after_seal_is_rejected() {
        let q = queue();
        let mut m = number(&q);
        q.borrow_mut().seal();
        assert!(matches!(m.append("x"), Err(MutationError::AlreadyFlushed { .. })));
    }

    #[test]
    fn nested_matches_share_the_queue() {
        let q = queue();
        let annotation = Arc::new(TreeNode::located("type_annotation", ": number", 7).with_children([
            TreeNode::located(":", ":", 7),
            TreeNode::located("predefined_type", "number", 9),
        ]));
        let parent = Match::new(annotation, Rc::clone(&q));

        let mut nested = parent.evaluate_expression(&PathEngine, "predefined_type").unwrap();
        assert_eq!(nested.len(), 1);
        nested[0].replace_value("string").unwrap();

        assert_eq!(flushed(&q), "const x: string = 10;");
    }
}
