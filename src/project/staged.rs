use crate::project::{Project, ProjectError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Read-through overlay that keeps writes in memory.
///
/// Used for dry runs: edits flush into the overlay and the base project is
/// never touched. [`StagedProject::changes`] reports what would be written.
#[derive(Debug)]
pub struct StagedProject<'a, P: Project + ?Sized> {
    base: &'a P,
    staged: BTreeMap<PathBuf, String>,
}

/// A file whose staged content differs from the base project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedChange {
    pub path: PathBuf,
    pub original: String,
    pub updated: String,
}

impl<'a, P: Project + ?Sized> StagedProject<'a, P> {
    pub fn new(base: &'a P) -> Self {
        Self {
            base,
            staged: BTreeMap::new(),
        }
    }

    /// Staged files whose content differs from the base, in path order.
    pub fn changes(&self) -> Result<Vec<StagedChange>, ProjectError> {
        let mut changes = Vec::new();
        for (path, updated) in &self.staged {
            let original = self.base.read(path)?;
            if &original != updated {
                changes.push(StagedChange {
                    path: path.clone(),
                    original,
                    updated: updated.clone(),
                });
            }
        }
        Ok(changes)
    }
}

impl<P: Project + ?Sized> Project for StagedProject<'_, P> {
    fn read(&self, path: &Path) -> Result<String, ProjectError> {
        match self.staged.get(path) {
            Some(content) => Ok(content.clone()),
            None => self.base.read(path),
        }
    }

    fn write(&mut self, path: &Path, content: &str) -> Result<(), ProjectError> {
        self.staged.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn list(&self, glob: &str) -> Result<Vec<PathBuf>, ProjectError> {
        self.base.list(glob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::InMemoryProject;

    #[test]
    fn writes_stay_in_overlay() {
        let base = InMemoryProject::of([("a.ts", "one"), ("b.ts", "two")]);
        let mut staged = StagedProject::new(&base);

        staged.write(Path::new("a.ts"), "ONE").unwrap();
        staged.write(Path::new("b.ts"), "two").unwrap();

        assert_eq!(staged.read(Path::new("a.ts")).unwrap(), "ONE");
        assert_eq!(base.content("a.ts"), Some("one"));
        assert_eq!(base.write_count("a.ts"), 0);

        let changes = staged.changes().unwrap();
        assert_eq!(
            changes,
            vec![StagedChange {
                path: PathBuf::from("a.ts"),
                original: "one".into(),
                updated: "ONE".into(),
            }]
        );
    }
}
