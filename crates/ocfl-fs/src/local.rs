use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{FsError, FsResult};
use crate::traits::{normalize_path, DirEntry, FileInfo, Filesystem};

/// A directory on local disk.
///
/// All paths are resolved below `root`; `..` never reaches outside it.
#[derive(Clone, Debug)]
pub struct LocalFs {
    root: PathBuf,
    read_only: bool,
}

impl LocalFs {
    /// Open (and create if necessary) a writable filesystem rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> FsResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| FsError::io(root.display().to_string(), e))?;
        debug!(root = %root.display(), "opened local filesystem");
        Ok(Self {
            root,
            read_only: false,
        })
    }

    /// A read-only view of an existing directory.
    pub fn open_read_only(root: impl Into<PathBuf>) -> FsResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(FsError::NotFound(root.display().to_string()));
        }
        Ok(Self {
            root,
            read_only: true,
        })
    }

    /// The directory this filesystem is rooted at.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> FsResult<(String, PathBuf)> {
        let rel = normalize_path(path)?;
        let full = if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&rel)
        };
        Ok((rel, full))
    }

    fn check_writable(&self) -> FsResult<()> {
        if self.read_only {
            Err(FsError::ReadOnly)
        } else {
            Ok(())
        }
    }
}

impl Filesystem for LocalFs {
    fn open(&self, path: &str) -> FsResult<Box<dyn Read + Send>> {
        let (rel, full) = self.resolve(path)?;
        if full.is_dir() {
            return Err(FsError::InvalidPath {
                path: rel,
                reason: "is a directory".into(),
            });
        }
        let file = File::open(&full).map_err(|e| FsError::io(&rel, e))?;
        Ok(Box::new(file))
    }

    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        let (rel, full) = self.resolve(path)?;
        let meta = fs::metadata(&full).map_err(|e| FsError::io(&rel, e))?;
        Ok(FileInfo {
            path: rel,
            size: if meta.is_dir() { 0 } else { meta.len() },
            is_dir: meta.is_dir(),
        })
    }

    fn read_dir(&self, path: &str) -> FsResult<Vec<DirEntry>> {
        let (rel, full) = self.resolve(path)?;
        let mut entries = Vec::new();
        for entry in fs::read_dir(&full).map_err(|e| FsError::io(&rel, e))? {
            let entry = entry.map_err(|e| FsError::io(&rel, e))?;
            let file_type = entry.file_type().map_err(|e| FsError::io(&rel, e))?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: file_type.is_dir(),
            });
        }
        entries.sort();
        Ok(entries)
    }

    fn create(&self, path: &str) -> FsResult<Box<dyn Write + Send>> {
        self.check_writable()?;
        let (rel, full) = self.resolve(path)?;
        if rel.is_empty() {
            return Err(FsError::InvalidPath {
                path: rel,
                reason: "cannot create the root".into(),
            });
        }
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| FsError::io(&rel, e))?;
        }
        let file = File::create(&full).map_err(|e| FsError::io(&rel, e))?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn delete(&self, path: &str) -> FsResult<()> {
        self.check_writable()?;
        let (rel, full) = self.resolve(path)?;
        let meta = fs::metadata(&full).map_err(|e| FsError::io(&rel, e))?;
        if meta.is_dir() {
            if rel.is_empty() {
                // Empty the root but keep the directory itself.
                for entry in self.read_dir("")? {
                    self.delete(&entry.name)?;
                }
                return Ok(());
            }
            fs::remove_dir_all(&full).map_err(|e| FsError::io(&rel, e))
        } else {
            fs::remove_file(&full).map_err(|e| FsError::io(&rel, e))
        }
    }

    fn is_writable(&self) -> bool {
        !self.read_only
    }

    fn walk(&self, dir: &str) -> FsResult<Vec<String>> {
        let (rel, full) = self.resolve(dir)?;
        let mut files = Vec::new();
        for entry in WalkDir::new(&full).follow_links(false) {
            let entry = entry.map_err(|e| FsError::Io {
                path: rel.clone(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| FsError::InvalidPath {
                    path: entry.path().display().to_string(),
                    reason: e.to_string(),
                })?;
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.push(parts.join("/"));
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_fs() -> (tempfile::TempDir, LocalFs) {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFs::new(dir.path()).unwrap();
        (dir, fs)
    }

    #[test]
    fn create_makes_parents() {
        let (_dir, fs) = temp_fs();
        fs.write_file("deep/nested/file.txt", b"hello").unwrap();
        assert_eq!(fs.read_to_vec("deep/nested/file.txt").unwrap(), b"hello");
        assert!(fs.stat("deep/nested").unwrap().is_dir);
        assert_eq!(fs.stat("deep/nested/file.txt").unwrap().size, 5);
    }

    #[test]
    fn missing_is_not_found() {
        let (_dir, fs) = temp_fs();
        assert!(fs.open("nope").err().unwrap().is_not_found());
        assert!(!fs.exists("nope").unwrap());
    }

    #[test]
    fn walk_lists_all_files() {
        let (_dir, fs) = temp_fs();
        fs.write_file("b.txt", b"b").unwrap();
        fs.write_file("a/x.txt", b"x").unwrap();
        fs.write_file("a/y/z.txt", b"z").unwrap();
        assert_eq!(fs.walk("").unwrap(), vec!["a/x.txt", "a/y/z.txt", "b.txt"]);
        assert_eq!(fs.walk("a/y").unwrap(), vec!["a/y/z.txt"]);
    }

    #[test]
    fn read_dir_is_sorted() {
        let (_dir, fs) = temp_fs();
        fs.write_file("z", b"").unwrap();
        fs.write_file("m/inner", b"").unwrap();
        let names: Vec<_> = fs.read_dir("").unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["m", "z"]);
    }

    #[test]
    fn delete_directory_tree() {
        let (_dir, fs) = temp_fs();
        fs.write_file("tree/a", b"1").unwrap();
        fs.write_file("tree/b/c", b"2").unwrap();
        fs.delete("tree").unwrap();
        assert!(!fs.exists("tree").unwrap());
    }

    #[test]
    fn read_only_refuses_writes() {
        let (dir, fs) = temp_fs();
        fs.write_file("keep", b"k").unwrap();
        let ro = LocalFs::open_read_only(dir.path()).unwrap();
        assert!(matches!(ro.create("new"), Err(FsError::ReadOnly)));
        assert!(matches!(ro.delete("keep"), Err(FsError::ReadOnly)));
        assert_eq!(ro.read_to_vec("keep").unwrap(), b"k");
    }

    #[test]
    fn parent_segments_rejected() {
        let (_dir, fs) = temp_fs();
        assert!(matches!(
            fs.create("../outside"),
            Err(FsError::InvalidPath { .. })
        ));
    }
}
