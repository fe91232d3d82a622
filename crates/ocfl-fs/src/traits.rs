use std::io::{Read, Write};

use crate::error::{FsError, FsResult};

/// Metadata about a file or directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    /// Normalized path relative to the filesystem root.
    pub path: String,
    /// Size in bytes (0 for directories).
    pub size: u64,
    pub is_dir: bool,
}

/// One entry of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirEntry {
    /// Entry name (a single path segment).
    pub name: String,
    pub is_dir: bool,
}

/// The narrow storage capability consumed by the OCFL core.
///
/// Implementations must satisfy these invariants:
/// - Paths are relative and `/`-separated; `..` segments are rejected.
/// - `create` makes missing parent directories and truncates existing files.
///   The written data becomes visible once the returned writer is flushed
///   or dropped.
/// - `stat` and `open` report [`FsError::NotFound`] for missing paths.
/// - All I/O errors are propagated, never silently ignored.
pub trait Filesystem: Send + Sync {
    /// Open a file for reading.
    fn open(&self, path: &str) -> FsResult<Box<dyn Read + Send>>;

    /// Metadata for a file or directory.
    fn stat(&self, path: &str) -> FsResult<FileInfo>;

    /// Immediate children of a directory, sorted by name.
    fn read_dir(&self, path: &str) -> FsResult<Vec<DirEntry>>;

    /// Create (or truncate) a file for writing.
    fn create(&self, path: &str) -> FsResult<Box<dyn Write + Send>>;

    /// Delete a file, or a directory and everything beneath it.
    fn delete(&self, path: &str) -> FsResult<()>;

    /// Whether `create`/`delete` are permitted.
    fn is_writable(&self) -> bool {
        true
    }

    /// Check whether a path exists.
    fn exists(&self, path: &str) -> FsResult<bool> {
        match self.stat(path) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Read a whole file into memory.
    fn read_to_vec(&self, path: &str) -> FsResult<Vec<u8>> {
        let mut reader = self.open(path)?;
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| FsError::io(path, e))?;
        Ok(data)
    }

    /// Write a whole file.
    fn write_file(&self, path: &str, data: &[u8]) -> FsResult<()> {
        let mut writer = self.create(path)?;
        writer.write_all(data).map_err(|e| FsError::io(path, e))?;
        writer.flush().map_err(|e| FsError::io(path, e))
    }

    /// Every file below `dir`, as paths relative to the filesystem root,
    /// sorted.
    fn walk(&self, dir: &str) -> FsResult<Vec<String>> {
        let base = normalize_path(dir)?;
        let mut files = Vec::new();
        let mut pending = vec![base];
        while let Some(current) = pending.pop() {
            for entry in self.read_dir(&current)? {
                let path = join_path(&current, &entry.name);
                if entry.is_dir {
                    pending.push(path);
                } else {
                    files.push(path);
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Normalize a relative path: drop empty and `.` segments, reject `..`.
pub fn normalize_path(path: &str) -> FsResult<String> {
    let mut segments = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(FsError::InvalidPath {
                    path: path.to_string(),
                    reason: "parent directory segments are not allowed".into(),
                })
            }
            s => segments.push(s),
        }
    }
    Ok(segments.join("/"))
}

/// Join two relative paths with a single `/`.
pub fn join_path(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    match (base.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base}/{name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_noise() {
        assert_eq!(normalize_path("/a//b/./c/").unwrap(), "a/b/c");
        assert_eq!(normalize_path("").unwrap(), "");
        assert_eq!(normalize_path("a\\b").unwrap(), "a/b");
    }

    #[test]
    fn normalize_rejects_parent() {
        assert!(matches!(
            normalize_path("a/../b"),
            Err(FsError::InvalidPath { .. })
        ));
    }

    #[test]
    fn join_handles_empty_sides() {
        assert_eq!(join_path("", "x"), "x");
        assert_eq!(join_path("a/", "/x"), "a/x");
        assert_eq!(join_path("a", ""), "a");
    }
}
