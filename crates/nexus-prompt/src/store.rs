//! Prompt document stores
//!
//! A [`PromptStore`] resolves `{name}/{version}` to raw document text. Two
//! implementations are provided: [`FileStore`] for a directory tree on disk
//! and [`MemoryStore`] for compiled-in or test documents.

use crate::{PromptError, Result};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Source of raw prompt documents
pub trait PromptStore: Send + Sync {
    /// Load the raw document for `name` at `version`
    fn load(&self, name: &str, version: &str) -> Result<String>;
}

fn not_found(name: &str, version: &str, detail: impl Into<String>) -> PromptError {
    PromptError::TemplateNotFound {
        name: name.to_string(),
        version: version.to_string(),
        detail: detail.into(),
    }
}

/// Documents laid out as `{root}/{name}/{version}.md`
///
/// ```text
/// prompts/
/// ├── chat/
/// │   └── latest.md
/// └── stock/
///     ├── latest.md
///     └── v1.md
/// ```
///
/// Files are read on every load, so edits show up without a restart.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, name: &str, version: &str) -> Option<PathBuf> {
        let valid = |part: &str| {
            !part.is_empty() && part != "." && part != ".." && !part.contains(['/', '\\'])
        };
        (valid(name) && valid(version))
            .then(|| self.root.join(name).join(format!("{version}.md")))
    }
}

impl PromptStore for FileStore {
    fn load(&self, name: &str, version: &str) -> Result<String> {
        let path = self
            .path_for(name, version)
            .ok_or_else(|| not_found(name, version, "Invalid template path"))?;

        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => not_found(name, version, format!("{} does not exist", path.display())),
            _ => PromptError::FileLoadError {
                path: path.display().to_string(),
                detail: e.to_string(),
            },
        })
    }
}

/// In-memory documents keyed by `(name, version)`
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: HashMap<(String, String), String>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, replacing any previous one at the same key
    pub fn insert(&mut self, name: impl Into<String>, version: impl Into<String>, raw: impl Into<String>) {
        self.documents
            .insert((name.into(), version.into()), raw.into());
    }

    /// Builder-style [`MemoryStore::insert`]
    pub fn with_document(
        mut self,
        name: impl Into<String>,
        version: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        self.insert(name, version, raw);
        self
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl PromptStore for MemoryStore {
    fn load(&self, name: &str, version: &str) -> Result<String> {
        self.documents
            .get(&(name.to_string(), version.to_string()))
            .cloned()
            .ok_or_else(|| not_found(name, version, "Not registered"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, version: &str, content: &str) {
        let folder = dir.join(name);
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join(format!("{version}.md")), content).unwrap();
    }

    #[test]
    fn test_file_store_load() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "stock", "latest", "Analyze {{ symbol }}");
        write(temp.path(), "stock", "v1", "Old {{ symbol }}");

        let store = FileStore::new(temp.path());
        assert_eq!(store.load("stock", "latest").unwrap(), "Analyze {{ symbol }}");
        assert_eq!(store.load("stock", "v1").unwrap(), "Old {{ symbol }}");
    }

    #[test]
    fn test_file_store_missing() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());

        let err = store.load("chat", "latest").unwrap_err();
        assert!(matches!(
            err,
            PromptError::TemplateNotFound { ref name, ref version, .. }
                if name == "chat" && version == "latest"
        ));
    }

    #[test]
    fn test_file_store_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("prompts"));
        write(temp.path(), "secret", "latest", "hidden");

        assert!(store.load("../secret", "latest").is_err());
        assert!(store.load("..", "latest").is_err());
        assert!(store.load("chat", "../../x").is_err());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());

        store.insert("chat", "latest", "one");
        store.insert("chat", "latest", "two");
        assert_eq!(store.len(), 1);
        assert_eq!(store.load("chat", "latest").unwrap(), "two");
        assert!(matches!(
            store.load("chat", "v9"),
            Err(PromptError::TemplateNotFound { .. })
        ));
    }
}
