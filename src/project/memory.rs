use crate::project::{compile_glob, Project, ProjectError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A project held entirely in memory.
///
/// Counts writes per file so callers can tell an untouched file from one
/// rewritten with identical content.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProject {
    files: BTreeMap<PathBuf, String>,
    writes: BTreeMap<PathBuf, usize>,
}

impl InMemoryProject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a project from `(path, content)` pairs.
    pub fn of<P, S>(files: impl IntoIterator<Item = (P, S)>) -> Self
    where
        P: Into<PathBuf>,
        S: Into<String>,
    {
        Self {
            files: files
                .into_iter()
                .map(|(path, content)| (path.into(), content.into()))
                .collect(),
            writes: BTreeMap::new(),
        }
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    pub fn content(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    /// How many times `path` has been written.
    pub fn write_count(&self, path: impl AsRef<Path>) -> usize {
        self.writes.get(path.as_ref()).copied().unwrap_or(0)
    }
}

impl Project for InMemoryProject {
    fn read(&self, path: &Path) -> Result<String, ProjectError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ProjectError::NotFound(path.to_path_buf()))
    }

    fn write(&mut self, path: &Path, content: &str) -> Result<(), ProjectError> {
        self.files.insert(path.to_path_buf(), content.to_string());
        *self.writes.entry(path.to_path_buf()).or_default() += 1;
        Ok(())
    }

    fn list(&self, glob: &str) -> Result<Vec<PathBuf>, ProjectError> {
        let matcher = compile_glob(glob)?;
        Ok(self
            .files
            .keys()
            .filter(|path| matcher.is_match(path))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_list() {
        let mut project = InMemoryProject::of([
            ("src/a.ts", "a"),
            ("src/nested/b.ts", "b"),
            ("README.md", "readme"),
        ]);

        assert_eq!(
            project.list("src/**/*.ts").unwrap(),
            vec![PathBuf::from("src/a.ts"), PathBuf::from("src/nested/b.ts")]
        );

        project.write(Path::new("src/a.ts"), "A").unwrap();
        assert_eq!(project.read(Path::new("src/a.ts")).unwrap(), "A");
        assert_eq!(project.write_count("src/a.ts"), 1);
        assert_eq!(project.write_count("src/nested/b.ts"), 0);
    }

    #[test]
    fn missing_file() {
        let project = InMemoryProject::new();
        assert!(matches!(
            project.read(Path::new("nope.ts")),
            Err(ProjectError::NotFound(_))
        ));
    }
}
