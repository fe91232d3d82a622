use std::io::{Read, Write};
use std::sync::Arc;

use crate::error::FsResult;
use crate::traits::{join_path, normalize_path, DirEntry, FileInfo, Filesystem};

/// A view of the sub-tree `prefix` of another filesystem.
///
/// Extensions are bound to one of these so each only ever sees its own
/// directory.
#[derive(Clone)]
pub struct SubFs {
    parent: Arc<dyn Filesystem>,
    prefix: String,
}

impl SubFs {
    /// The prefix within the parent filesystem.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn full(&self, path: &str) -> FsResult<String> {
        Ok(join_path(&self.prefix, &normalize_path(path)?))
    }

    fn strip(&self, path: String) -> String {
        path.strip_prefix(&self.prefix)
            .map(|rest| rest.trim_start_matches('/').to_string())
            .unwrap_or(path)
    }
}

impl std::fmt::Debug for SubFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubFs").field("prefix", &self.prefix).finish()
    }
}

/// Bind a view of `dir` inside `parent`.
pub fn sub_fs(parent: &Arc<dyn Filesystem>, dir: &str) -> FsResult<Arc<dyn Filesystem>> {
    Ok(Arc::new(SubFs {
        parent: Arc::clone(parent),
        prefix: normalize_path(dir)?,
    }))
}

impl Filesystem for SubFs {
    fn open(&self, path: &str) -> FsResult<Box<dyn Read + Send>> {
        self.parent.open(&self.full(path)?)
    }

    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        let mut info = self.parent.stat(&self.full(path)?)?;
        info.path = self.strip(info.path);
        Ok(info)
    }

    fn read_dir(&self, path: &str) -> FsResult<Vec<DirEntry>> {
        self.parent.read_dir(&self.full(path)?)
    }

    fn create(&self, path: &str) -> FsResult<Box<dyn Write + Send>> {
        self.parent.create(&self.full(path)?)
    }

    fn delete(&self, path: &str) -> FsResult<()> {
        self.parent.delete(&self.full(path)?)
    }

    fn is_writable(&self) -> bool {
        self.parent.is_writable()
    }

    fn walk(&self, dir: &str) -> FsResult<Vec<String>> {
        Ok(self
            .parent
            .walk(&self.full(dir)?)?
            .into_iter()
            .map(|p| self.strip(p))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryFs;

    #[test]
    fn sub_tree_is_isolated() {
        let root: Arc<dyn Filesystem> = Arc::new(MemoryFs::new());
        root.write_file("outside.txt", b"o").unwrap();
        let ext = sub_fs(&root, "extensions/0001-digest-algorithms").unwrap();
        ext.write_file("config.json", b"{}").unwrap();

        assert_eq!(
            root.read_to_vec("extensions/0001-digest-algorithms/config.json")
                .unwrap(),
            b"{}"
        );
        assert_eq!(ext.walk("").unwrap(), vec!["config.json"]);
        assert_eq!(ext.stat("config.json").unwrap().path, "config.json");
        assert!(!ext.exists("outside.txt").unwrap());
        assert!(ext.open("../outside.txt").is_err());
    }

    #[test]
    fn nested_views_compose() {
        let root: Arc<dyn Filesystem> = Arc::new(MemoryFs::new());
        let a = sub_fs(&root, "a").unwrap();
        let ab = sub_fs(&a, "b").unwrap();
        ab.write_file("f", b"x").unwrap();
        assert!(root.exists("a/b/f").unwrap());
        assert_eq!(a.walk("").unwrap(), vec!["b/f"]);
    }
}
