//! Temp-file mirrors of in-memory buffers
//!
//! The sidecar only ever reads and edits these mirrors, never the real
//! files, so unsaved changes are visible to it and its edits can be diffed
//! against the host buffer. A mirror is allocated once per buffer and
//! reused for the life of the process.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::host::EditorId;

/// What a mirror stands in for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MirrorKey {
    /// A buffer backed by a file
    File(PathBuf),
    /// An unsaved buffer with no path
    Buffer(EditorId),
}

impl MirrorKey {
    pub fn for_editor(editor: EditorId, path: Option<&Path>) -> Self {
        match path {
            Some(p) => MirrorKey::File(p.to_path_buf()),
            None => MirrorKey::Buffer(editor),
        }
    }

    fn stem_and_extension(&self) -> (String, Option<String>) {
        match self {
            MirrorKey::File(path) => (
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "untitled".into()),
                path.extension().map(|e| e.to_string_lossy().into_owned()),
            ),
            MirrorKey::Buffer(_) => ("untitled".into(), Some("txt".into())),
        }
    }
}

/// Memoized mirror paths
#[derive(Debug, Default)]
pub struct MirrorStore {
    /// Where mirrors are created (system temp dir when unset)
    dir: Option<PathBuf>,
    files: HashMap<MirrorKey, PathBuf>,
}

impl MirrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create mirrors under `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            files: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Overwrite the mirror for `key` with `contents`, allocating it first
    pub fn write(&mut self, key: MirrorKey, contents: &str) -> io::Result<PathBuf> {
        let path = match self.files.get(&key) {
            Some(path) => path.clone(),
            None => {
                let path = self.allocate(&key)?;
                debug!("Allocated mirror {:?} for {:?}", path, key);
                self.files.insert(key, path.clone());
                path
            }
        };

        std::fs::write(&path, contents)?;
        Ok(path)
    }

    fn allocate(&self, key: &MirrorKey) -> io::Result<PathBuf> {
        let (stem, extension) = key.stem_and_extension();
        let prefix = format!("cursorless-{}-", stem);
        let suffix = extension.map(|e| format!(".{}", e)).unwrap_or_default();

        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(&suffix);
        let file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        let (_file, path) = file.keep().map_err(|e| e.error)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_is_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MirrorStore::in_dir(dir.path());
        let key = MirrorKey::File(PathBuf::from("/src/main.rs"));

        let first = store.write(key.clone(), "one").unwrap();
        let second = store.write(key.clone(), "two").unwrap();
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "two");
    }

    #[test]
    fn test_mirror_name_keeps_stem_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MirrorStore::in_dir(dir.path());
        let path = store
            .write(MirrorKey::File(PathBuf::from("/src/lib.rs")), "")
            .unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("cursorless-lib-"));
        assert!(name.ends_with(".rs"));
    }

    #[test]
    fn test_unsaved_buffers_get_distinct_mirrors() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MirrorStore::in_dir(dir.path());

        let a = store.write(MirrorKey::for_editor(1, None), "a").unwrap();
        let b = store.write(MirrorKey::for_editor(2, None), "b").unwrap();
        assert_ne!(a, b);
        assert!(a.to_string_lossy().ends_with(".txt"));
    }

    #[test]
    fn test_deleted_mirror_is_recreated_at_same_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MirrorStore::in_dir(dir.path());
        let key = MirrorKey::File(PathBuf::from("/x/Makefile"));

        let path = store.write(key.clone(), "all:").unwrap();
        std::fs::remove_file(&path).unwrap();
        let again = store.write(key, "all: build").unwrap();
        assert_eq!(path, again);
        assert_eq!(std::fs::read_to_string(again).unwrap(), "all: build");
    }
}
