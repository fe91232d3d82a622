use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, RwLock};

use crate::error::{FsError, FsResult};
use crate::traits::{normalize_path, DirEntry, FileInfo, Filesystem};

type FileMap = Arc<RwLock<BTreeMap<String, Vec<u8>>>>;

/// In-memory, `BTreeMap`-based filesystem.
///
/// Intended for tests and embedding. Directories are implicit: a directory
/// exists while at least one file lives beneath it. Files are cloned on
/// open; writes become visible when the writer is flushed or dropped.
#[derive(Clone)]
pub struct MemoryFs {
    files: FileMap,
    read_only: bool,
}

impl MemoryFs {
    /// Create a new empty, writable filesystem.
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(BTreeMap::new())),
            read_only: false,
        }
    }

    /// A read-only handle onto the same files.
    pub fn read_only(&self) -> Self {
        Self {
            files: Arc::clone(&self.files),
            read_only: true,
        }
    }

    /// Number of files stored.
    pub fn len(&self) -> usize {
        self.files.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if no files are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of every file path.
    pub fn paths(&self) -> Vec<String> {
        self.files
            .read()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn poisoned<E: std::fmt::Display>(e: E) -> FsError {
        FsError::LockPoisoned(e.to_string())
    }

    fn is_dir(map: &BTreeMap<String, Vec<u8>>, path: &str) -> bool {
        if path.is_empty() {
            return true;
        }
        let prefix = format!("{path}/");
        map.range(prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&prefix))
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFs")
            .field("file_count", &self.len())
            .field("read_only", &self.read_only)
            .finish()
    }
}

impl Filesystem for MemoryFs {
    fn open(&self, path: &str) -> FsResult<Box<dyn Read + Send>> {
        let path = normalize_path(path)?;
        let map = self.files.read().map_err(Self::poisoned)?;
        let data = map.get(&path).cloned().ok_or(FsError::NotFound(path))?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        let path = normalize_path(path)?;
        let map = self.files.read().map_err(Self::poisoned)?;
        if let Some(data) = map.get(&path) {
            return Ok(FileInfo {
                size: data.len() as u64,
                path,
                is_dir: false,
            });
        }
        if Self::is_dir(&map, &path) {
            return Ok(FileInfo {
                path,
                size: 0,
                is_dir: true,
            });
        }
        Err(FsError::NotFound(path))
    }

    fn read_dir(&self, path: &str) -> FsResult<Vec<DirEntry>> {
        let path = normalize_path(path)?;
        let map = self.files.read().map_err(Self::poisoned)?;
        if !Self::is_dir(&map, &path) {
            return Err(FsError::NotFound(path));
        }
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        let mut entries = BTreeSet::new();
        for key in map.keys().filter(|k| k.starts_with(&prefix)) {
            let rest = &key[prefix.len()..];
            match rest.split_once('/') {
                Some((dir, _)) => entries.insert(DirEntry {
                    name: dir.to_string(),
                    is_dir: true,
                }),
                None => entries.insert(DirEntry {
                    name: rest.to_string(),
                    is_dir: false,
                }),
            };
        }
        Ok(entries.into_iter().collect())
    }

    fn create(&self, path: &str) -> FsResult<Box<dyn Write + Send>> {
        if self.read_only {
            return Err(FsError::ReadOnly);
        }
        let path = normalize_path(path)?;
        if path.is_empty() {
            return Err(FsError::InvalidPath {
                path,
                reason: "cannot create the root".into(),
            });
        }
        let mut map = self.files.write().map_err(Self::poisoned)?;
        if Self::is_dir(&map, &path) {
            return Err(FsError::InvalidPath {
                path,
                reason: "a directory exists at this path".into(),
            });
        }
        map.insert(path.clone(), Vec::new());
        Ok(Box::new(MemoryFile {
            files: Arc::clone(&self.files),
            path,
            buf: Vec::new(),
        }))
    }

    fn delete(&self, path: &str) -> FsResult<()> {
        if self.read_only {
            return Err(FsError::ReadOnly);
        }
        let path = normalize_path(path)?;
        let mut map = self.files.write().map_err(Self::poisoned)?;
        if map.remove(&path).is_some() {
            return Ok(());
        }
        if path.is_empty() || Self::is_dir(&map, &path) {
            let prefix = if path.is_empty() {
                String::new()
            } else {
                format!("{path}/")
            };
            map.retain(|k, _| !k.starts_with(&prefix));
            return Ok(());
        }
        Err(FsError::NotFound(path))
    }

    fn is_writable(&self) -> bool {
        !self.read_only
    }
}

/// Buffered writer committing into the shared map on flush and drop.
struct MemoryFile {
    files: FileMap,
    path: String,
    buf: Vec<u8>,
}

impl MemoryFile {
    fn commit(&mut self) -> io::Result<()> {
        let mut map = self
            .files
            .write()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        map.insert(self.path.clone(), self.buf.clone());
        Ok(())
    }
}

impl Write for MemoryFile {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit()
    }
}

impl Drop for MemoryFile {
    fn drop(&mut self) {
        let _ = self.commit();
    }
}
