use crate::hit::{FlushError, FlushOutcome, PendingFlush};
use crate::project::{Project, StagedChange, StagedProject};
use tracing::debug;

/// Flushes registered by [`FileHit::defer`](crate::hit::FileHit::defer),
/// run together once the caller is done collecting edits.
///
/// Each pending flush still applies exactly once. Commit runs them in
/// registration order and keeps going after a failure.
#[derive(Debug, Default)]
pub struct DeferredWrites {
    pending: Vec<PendingFlush>,
}

impl DeferredWrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, flush: PendingFlush) {
        debug!(path = %flush.path().display(), "deferred flush");
        self.pending.push(flush);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Run every registered flush against `project`.
    pub fn commit<P: Project + ?Sized>(
        self,
        project: &mut P,
    ) -> Vec<Result<FlushOutcome, FlushError>> {
        self.pending
            .into_iter()
            .map(|flush| flush.run(project))
            .collect()
    }

    /// What [`commit`](Self::commit) would write, computed against an
    /// in-memory overlay of `project`. Nothing is sealed or written.
    pub fn preview<P: Project + ?Sized>(&self, project: &P) -> Result<Vec<StagedChange>, FlushError> {
        let mut staged = StagedProject::new(project);
        for flush in &self.pending {
            if let Some(content) = flush.render(&staged)? {
                staged.write(flush.path(), &content)?;
            }
        }
        Ok(staged.changes()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::FileHit;
    use crate::path::{PathEngine, PathEvaluator};
    use crate::project::InMemoryProject;
    use crate::tree::TreeNode;
    use std::sync::Arc;

    fn hit(path: &str, source: &str) -> FileHit {
        let root = Arc::new(TreeNode::located("program", source, 0).with_children([
            TreeNode::located("identifier", &source[..1], 0),
        ]));
        let nodes = PathEngine.evaluate(&root, "/program/identifier").unwrap();
        FileHit::new(path, root, nodes)
    }

    #[test]
    fn preview_then_commit() {
        let mut project = InMemoryProject::of([("a.ts", "a;"), ("b.ts", "b;")]);
        let mut writes = DeferredWrites::new();

        for (path, source) in [("a.ts", "a;"), ("b.ts", "b;")] {
            let mut hit = hit(path, source);
            hit.matches_mut()[0].append("1").unwrap();
            hit.defer(&mut writes);
        }
        assert_eq!(writes.len(), 2);

        let preview = writes.preview(&project).unwrap();
        assert_eq!(preview.len(), 2);
        assert_eq!(preview[0].updated, "a1;");
        assert_eq!(project.write_count("a.ts"), 0);

        let results = writes.commit(&mut project);
        assert!(results.iter().all(|r| r.as_ref().is_ok_and(FlushOutcome::is_written)));
        assert_eq!(project.content("a.ts"), Some("a1;"));
        assert_eq!(project.content("b.ts"), Some("b1;"));
    }

    #[test]
    fn commit_continues_after_failure() {
        let mut project = InMemoryProject::of([("a.ts", "x;"), ("b.ts", "b;")]);
        let mut writes = DeferredWrites::new();

        for (path, source) in [("a.ts", "a;"), ("b.ts", "b;")] {
            let mut hit = hit(path, source);
            hit.matches_mut()[0].zap(&Default::default()).unwrap();
            hit.defer(&mut writes);
        }

        let results = writes.commit(&mut project);
        assert!(matches!(results[0], Err(FlushError::ContentMismatch { .. })));
        assert!(results[1].is_ok());
        assert_eq!(project.content("a.ts"), Some("x;"));
        assert_eq!(project.content("b.ts"), Some(";"));
    }
}
