use std::{
    fs, io,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::error::ReapError;

/// A regular file found under the storage root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StorageFile {
    /// Path relative to the root, `/` separated.
    pub relative: String,
    pub path: PathBuf,
}

/// The directory holding every file subject to cleanup.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    root: PathBuf,
    strip_prefixes: Vec<String>,
}

impl StorageRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            strip_prefixes: Vec::new(),
        }
    }

    /// Prefixes removed from references before they are resolved, e.g. the
    /// `storage/` segment of public URLs pointing into the root.
    pub fn with_strip_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.strip_prefixes = prefixes
            .into_iter()
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Recursively list every regular file under the root, sorted by
    /// relative path. Any failure while walking aborts the listing.
    pub fn list_files(&self) -> Result<Vec<StorageFile>, ReapError> {
        let meta = fs::metadata(&self.root).map_err(|source| ReapError::StorageRoot {
            path: self.root.clone(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(ReapError::NotADirectory(self.root.clone()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_dir() || !entry.path().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let relative = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push(StorageFile {
                relative,
                path: entry.path().to_path_buf(),
            });
        }
        files.sort();
        Ok(files)
    }

    /// Reduce a reference to a root-relative path. Only leading `/` and `./`
    /// segments and one configured prefix are removed.
    ///
    /// `"/a.jpg"` therefore protects `a.jpg`, which keeps more files than
    /// comparing the raw strings would.
    pub fn normalize<'a>(&self, candidate: &'a str) -> &'a str {
        let mut rel = candidate;
        loop {
            if let Some(rest) = rel.strip_prefix('/') {
                rel = rest;
            } else if let Some(rest) = rel.strip_prefix("./") {
                rel = rest;
            } else {
                break;
            }
        }
        for prefix in &self.strip_prefixes {
            if let Some(rest) = rel
                .strip_prefix(prefix.as_str())
                .and_then(|r| r.strip_prefix('/'))
            {
                return rest;
            }
        }
        rel
    }

    /// Resolve a reference to the relative path of an existing file under the
    /// root. Directories and missing paths resolve to `None`.
    pub fn resolve(&self, candidate: &str) -> Option<String> {
        let rel = self.normalize(candidate);
        if rel.is_empty() || Path::new(rel).is_absolute() {
            return None;
        }
        let path = self.root.join(rel);
        if path.exists() && !path.is_dir() {
            Some(rel.to_string())
        } else {
            None
        }
    }

    pub fn remove(&self, file: &StorageFile) -> io::Result<()> {
        fs::remove_file(&file.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn lists_nested_files_relative_to_root() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "b.jpg");
        touch(tmp.path(), "avatars/2024/a.png");
        fs::create_dir_all(tmp.path().join("empty")).unwrap();

        let root = StorageRoot::new(tmp.path());
        let files: Vec<String> = root
            .list_files()
            .unwrap()
            .into_iter()
            .map(|f| f.relative)
            .collect();
        assert_eq!(files, vec!["avatars/2024/a.png", "b.jpg"]);
    }

    #[test]
    fn missing_root_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(tmp.path().join("nope"));
        assert!(matches!(
            root.list_files(),
            Err(ReapError::StorageRoot { .. })
        ));
    }

    #[test]
    fn file_as_root_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "plain.txt");
        let root = StorageRoot::new(tmp.path().join("plain.txt"));
        assert!(matches!(root.list_files(), Err(ReapError::NotADirectory(_))));
    }

    #[test]
    fn resolve_requires_existing_regular_file() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "docs/a.pdf");
        let root = StorageRoot::new(tmp.path());

        assert_eq!(root.resolve("docs/a.pdf").as_deref(), Some("docs/a.pdf"));
        assert_eq!(root.resolve("/docs/a.pdf").as_deref(), Some("docs/a.pdf"));
        assert_eq!(root.resolve("./docs/a.pdf").as_deref(), Some("docs/a.pdf"));
        assert_eq!(root.resolve("docs"), None);
        assert_eq!(root.resolve("docs/missing.pdf"), None);
        assert_eq!(root.resolve("hello"), None);
        assert_eq!(root.resolve(""), None);
        assert_eq!(root.resolve("/"), None);
    }

    #[test]
    fn strip_prefixes_apply_once() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "a.jpg");
        let root = StorageRoot::new(tmp.path()).with_strip_prefixes(vec!["/storage/".into()]);

        assert_eq!(root.normalize("/storage/a.jpg"), "a.jpg");
        assert_eq!(root.normalize("storage/storage/a.jpg"), "storage/a.jpg");
        assert_eq!(root.normalize("storagea.jpg"), "storagea.jpg");
        assert_eq!(root.resolve("/storage/a.jpg").as_deref(), Some("a.jpg"));
    }
}
