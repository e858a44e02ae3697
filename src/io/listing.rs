use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Optional narrowing of a directory listing. Both comparisons ignore ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Accepted extensions without the dot; empty accepts everything
    pub extensions: Vec<String>,
    /// Exact file stem to keep
    pub stem: Option<String>,
}

impl ListFilter {
    pub fn images() -> Self {
        Self {
            extensions: ["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            stem: None,
        }
    }

    pub fn with_stem(mut self, stem: impl Into<String>) -> Self {
        self.stem = Some(stem.into());
        self
    }

    pub fn matches(&self, path: &Path) -> bool {
        if !self.extensions.is_empty() {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
                return false;
            }
        }
        if let Some(stem) = &self.stem {
            let file_stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            if !file_stem.eq_ignore_ascii_case(stem) {
                return false;
            }
        }
        true
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

/// Recursively list regular files under `root` in a stable order (sorted by file name
/// within each directory). Entries whose name, or any directory name between `root`
/// and the entry, starts with `.` are left out. A plain file is returned as-is when it
/// passes the filter.
pub fn list_visible_files(root: &Path, filter: &ListFilter) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(if filter.matches(root) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        });
    }
    if !root.is_dir() {
        return Err(Error::InvalidDirectory {
            path: root.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() && filter.matches(entry.path()) {
            files.push(entry.into_path());
        }
    }
    debug!("Listed {} file(s) under {:?}", files.len(), root);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn skips_hidden_entries_below_root() {
        let dir = tempfile::Builder::new().prefix(".hidden-root").tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("b.jpg"));
        touch(&root.join("a.png"));
        touch(&root.join(".secret.jpg"));
        touch(&root.join(".cache/c.jpg"));
        touch(&root.join("sub/d.JPG"));

        let files = list_visible_files(root, &ListFilter::default()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["a.png", "b.jpg", "sub/d.JPG"]);
    }

    #[test]
    fn filters_by_extension_and_stem() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("xq.JPG"));
        touch(&dir.path().join("xq.mp4"));
        touch(&dir.path().join("other.jpg"));

        let filter = ListFilter::images().with_stem("XQ");
        let files = list_visible_files(dir.path(), &filter).unwrap();
        assert_eq!(files, vec![dir.path().join("xq.JPG")]);
    }

    #[test]
    fn missing_root_is_invalid_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            list_visible_files(&dir.path().join("nope"), &ListFilter::default()),
            Err(Error::InvalidDirectory { .. })
        ));
    }
}
