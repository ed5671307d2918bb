use crate::project::{compile_glob, Project, ProjectError};
use crate::safety::WorkspaceGuard;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A project rooted in a directory on disk.
///
/// Listing skips VCS metadata and build output. Writes are atomic: the new
/// content goes to a temporary file in the same directory, is synced, then
/// renamed over the original.
#[derive(Debug, Clone)]
pub struct LocalProject {
    guard: WorkspaceGuard,
}

impl LocalProject {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ProjectError> {
        Ok(Self {
            guard: WorkspaceGuard::new(root)?,
        })
    }

    pub fn root(&self) -> &Path {
        self.guard.root()
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.guard.root().join(path)
        }
    }
}

impl Project for LocalProject {
    fn read(&self, path: &Path) -> Result<String, ProjectError> {
        let absolute = self.absolute(path);
        std::fs::read_to_string(&absolute).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ProjectError::NotFound(path.to_path_buf())
            } else {
                ProjectError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })
    }

    fn write(&mut self, path: &Path, content: &str) -> Result<(), ProjectError> {
        let target = self.guard.check(path)?;
        atomic_write(&target, content.as_bytes()).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = content.len(), "wrote file");
        Ok(())
    }

    fn list(&self, glob: &str) -> Result<Vec<PathBuf>, ProjectError> {
        let matcher = compile_glob(glob)?;
        let root = self.guard.root();
        let mut paths = Vec::new();

        let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(WorkspaceGuard::is_skipped_dir)
        });

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            if matcher.is_match(relative) {
                paths.push(relative.to_path_buf());
            }
        }

        paths.sort();
        Ok(paths)
    }
}

/// Tempfile in the same directory, fsync, rename, then bump the mtime so
/// file watchers notice the change even when the rename preserved it.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent")
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    // Keep the original permissions.
    if let Ok(metadata) = std::fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;
    filetime::set_file_mtime(path, filetime::FileTime::now())?;
    Ok(())
}
