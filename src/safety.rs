use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory names never edited, wherever they appear under the root.
const SKIPPED_DIRS: &[&str] = &[".git", ".hg", ".svn", "target", "node_modules"];

/// Keeps writes inside a project root.
///
/// A path is writable when its canonical form lives under the root and
/// passes through none of the skipped directories or package caches.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    root: PathBuf,
    caches: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("path escapes project root: {path} (root: {root})")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("path is inside protected directory: {path} (protected: {protected})")]
    Protected { path: PathBuf, protected: PathBuf },

    #[error("failed to resolve path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl WorkspaceGuard {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = root.as_ref().canonicalize()?;

        // Package caches under $HOME may be symlinked into a project.
        let caches = home::home_dir()
            .map(|home| {
                [".cargo/registry", ".cargo/git", ".rustup", ".npm"]
                    .iter()
                    .filter_map(|dir| home.join(dir).canonicalize().ok())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { root, caches })
    }

    #[cfg(test)]
    fn with_caches(root: impl AsRef<Path>, caches: Vec<PathBuf>) -> Result<Self, SafetyError> {
        Ok(Self {
            root: root.as_ref().canonicalize()?,
            caches,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a directory entry name is one the project walk never enters.
    pub fn is_skipped_dir(name: &str) -> bool {
        SKIPPED_DIRS.contains(&name)
    }

    /// Resolve `path` (relative to the root) and check it may be written.
    ///
    /// Returns the canonical absolute path. The file must exist.
    pub fn check(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let canonical = absolute.canonicalize()?;

        let Ok(relative) = canonical.strip_prefix(&self.root) else {
            return Err(SafetyError::OutsideRoot {
                path: canonical,
                root: self.root.clone(),
            });
        };

        let mut protected = self.root.clone();
        for component in relative.components() {
            protected.push(component);
            if component
                .as_os_str()
                .to_str()
                .is_some_and(Self::is_skipped_dir)
            {
                return Err(SafetyError::Protected {
                    path: canonical.clone(),
                    protected,
                });
            }
        }

        if let Some(cache) = self.caches.iter().find(|c| canonical.starts_with(c)) {
            return Err(SafetyError::Protected {
                path: canonical.clone(),
                protected: cache.clone(),
            });
        }

        Ok(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn accepts_file_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("src/index.ts");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "").unwrap();

        let guard = WorkspaceGuard::new(dir.path()).unwrap();
        assert!(guard.check("src/index.ts").is_ok());
        assert!(guard.check(&file).is_ok());
    }

    #[test]
    fn rejects_file_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        fs::create_dir_all(&root).unwrap();
        let outside = dir.path().join("outside.ts");
        fs::write(&outside, "").unwrap();

        let guard = WorkspaceGuard::new(&root).unwrap();
        assert!(matches!(
            guard.check(&outside),
            Err(SafetyError::OutsideRoot { .. })
        ));
    }

    #[test]
    fn rejects_skipped_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("node_modules/pkg/index.js");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "").unwrap();

        let guard = WorkspaceGuard::new(dir.path()).unwrap();
        assert!(matches!(
            guard.check("node_modules/pkg/index.js"),
            Err(SafetyError::Protected { .. })
        ));
    }

    #[test]
    fn rejects_cache_paths() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("vendor");
        fs::create_dir_all(&cache).unwrap();
        fs::write(cache.join("lib.rs"), "").unwrap();

        let guard = WorkspaceGuard::with_caches(dir.path(), vec![cache.canonicalize().unwrap()])
            .unwrap();
        assert!(matches!(
            guard.check("vendor/lib.rs"),
            Err(SafetyError::Protected { .. })
        ));
    }

    #[test]
    #[cfg(unix)]
    fn rejects_symlink_escape() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        fs::create_dir_all(&root).unwrap();
        let outside = dir.path().join("secret.ts");
        fs::write(&outside, "").unwrap();
        symlink(&outside, root.join("escape.ts")).unwrap();

        let guard = WorkspaceGuard::new(&root).unwrap();
        assert!(matches!(
            guard.check("escape.ts"),
            Err(SafetyError::OutsideRoot { .. })
        ));
    }
}
