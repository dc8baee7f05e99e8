//! Read access to the working tree.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use walkdir::WalkDir;

use crate::error::{IndexError, IndexResult};

/// Directories never reported as part of the working tree.
const IGNORED_DIRS: &[&str] = &[".grove", ".git"];

/// Read-only view of the files a repository tracks.
///
/// Paths are relative to the working root and `/`-separated.
pub trait FileProbe: Send + Sync {
    /// Returns `true` if `path` names a regular file.
    fn exists(&self, path: &str) -> bool;

    /// Read a file's bytes, or `None` if `path` is not a regular file.
    fn read(&self, path: &str) -> IndexResult<Option<Vec<u8>>>;

    /// Every file in the working tree, sorted.
    fn list_files(&self) -> IndexResult<Vec<String>>;
}

/// Normalize a user-supplied path into the `/`-separated relative form.
///
/// Strips `.` components; rejects empty, absolute, and `..` paths.
pub fn normalize_path(path: &str) -> IndexResult<String> {
    let mut parts = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return Err(IndexError::InvalidPath(path.to_string())),
        }
    }
    if parts.is_empty() {
        return Err(IndexError::InvalidPath(path.to_string()));
    }
    Ok(parts.join("/"))
}

/// [`FileProbe`] over a directory on disk.
#[derive(Clone, Debug)]
pub struct WorkdirProbe {
    root: PathBuf,
}

impl WorkdirProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileProbe for WorkdirProbe {
    fn exists(&self, path: &str) -> bool {
        self.root.join(path).is_file()
    }

    fn read(&self, path: &str) -> IndexResult<Option<Vec<u8>>> {
        let full = self.root.join(path);
        if full.is_dir() {
            return Ok(None);
        }
        match fs::read(full) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_files(&self) -> IndexResult<Vec<String>> {
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !(entry.file_type().is_dir()
                    && IGNORED_DIRS
                        .iter()
                        .any(|dir| entry.file_name() == std::ffi::OsStr::new(dir)))
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable working tree entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let parts: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.push(parts.join("/"));
        }
        files.sort();
        Ok(files)
    }
}

/// In-memory [`FileProbe`] for tests.
#[derive(Debug, Default)]
pub struct InMemoryWorkdir {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryWorkdir {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a file.
    pub fn write(&self, path: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.files
            .write()
            .expect("lock poisoned")
            .insert(path.into(), content.into());
    }

    /// Remove a file, returning `true` if it existed.
    pub fn remove(&self, path: &str) -> bool {
        self.files
            .write()
            .expect("lock poisoned")
            .remove(path)
            .is_some()
    }
}

impl FileProbe for InMemoryWorkdir {
    fn exists(&self, path: &str) -> bool {
        self.files.read().expect("lock poisoned").contains_key(path)
    }

    fn read(&self, path: &str) -> IndexResult<Option<Vec<u8>>> {
        Ok(self.files.read().expect("lock poisoned").get(path).cloned())
    }

    fn list_files(&self) -> IndexResult<Vec<String>> {
        Ok(self
            .files
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect())
    }
}
