//! Manifest, version state and fixity blocks.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use ocfl_types::DigestAlgorithm;
use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, InventoryResult};

/// Digest to path set, the shape shared by the manifest, every version
/// state and every fixity block.
///
/// A path appears under at most one digest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DigestPathMap(BTreeMap<String, BTreeSet<String>>);

/// Digest to content paths.
pub type Manifest = DigestPathMap;

/// Digest to logical paths.
pub type VersionState = DigestPathMap;

/// Secondary algorithm to digest to content paths.
pub type Fixity = BTreeMap<DigestAlgorithm, DigestPathMap>;

impl DigestPathMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct digests.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_digest(&self, digest: &str) -> bool {
        self.0.contains_key(digest)
    }

    /// Paths recorded under `digest`.
    pub fn paths(&self, digest: &str) -> Option<&BTreeSet<String>> {
        self.0.get(digest)
    }

    /// The digest a path is recorded under.
    pub fn digest_for(&self, path: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, paths)| paths.contains(path))
            .map(|(digest, _)| digest.as_str())
    }

    /// Every path, sorted.
    pub fn all_paths(&self) -> BTreeSet<&str> {
        self.0.values().flatten().map(String::as_str).collect()
    }

    /// Path to digest.
    pub fn by_path(&self) -> BTreeMap<&str, &str> {
        self.0
            .iter()
            .flat_map(|(digest, paths)| paths.iter().map(move |p| (p.as_str(), digest.as_str())))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.0.iter()
    }

    pub fn digests(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub(crate) fn insert(&mut self, digest: &str, path: &str) {
        self.0
            .entry(digest.to_string())
            .or_default()
            .insert(path.to_string());
    }

    /// Remove `path`; the digest entry goes too once it has no paths left.
    pub(crate) fn remove_path(&mut self, path: &str) -> Option<String> {
        let digest = self.digest_for(path)?.to_string();
        if let Some(paths) = self.0.get_mut(&digest) {
            paths.remove(path);
            if paths.is_empty() {
                self.0.remove(&digest);
            }
        }
        Some(digest)
    }

    pub(crate) fn remove_digest(&mut self, digest: &str) -> Option<BTreeSet<String>> {
        self.0.remove(digest)
    }

    /// Rewrite every digest key to lowercase, merging path sets.
    pub(crate) fn lowercase_digests(&mut self) {
        if self.0.keys().all(|d| !d.bytes().any(|b| b.is_ascii_uppercase())) {
            return;
        }
        let old = std::mem::take(&mut self.0);
        for (digest, paths) in old {
            self.0
                .entry(digest.to_ascii_lowercase())
                .or_default()
                .extend(paths);
        }
    }
}

impl FromIterator<(String, String)> for DigestPathMap {
    /// Build from `(digest, path)` pairs.
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (digest, path) in iter {
            map.insert(&digest, &path);
        }
        map
    }
}

/// The person or agent responsible for a version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// One version of an object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    pub state: VersionState,
}

impl Version {
    pub(crate) fn new(message: &str, user: &str, address: &str, state: VersionState) -> Self {
        let user = (!user.is_empty()).then(|| User {
            name: user.to_string(),
            address: (!address.is_empty()).then(|| address.to_string()),
        });
        Self {
            created: Utc::now(),
            message: (!message.is_empty()).then(|| message.to_string()),
            user,
            state,
        }
    }
}

/// Check a logical or content path: relative, `/`-separated, no empty,
/// `.` or `..` segments.
pub fn validate_path(path: &str) -> InventoryResult<()> {
    let invalid = |reason: &str| InventoryError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    if path.is_empty() {
        return Err(invalid("path is empty"));
    }
    if path.starts_with('/') || path.ends_with('/') {
        return Err(invalid("path must not start or end with '/'"));
    }
    for segment in path.split('/') {
        match segment {
            "" => return Err(invalid("path contains an empty segment")),
            "." | ".." => return Err(invalid("path contains a '.' or '..' segment")),
            _ => {}
        }
    }
    Ok(())
}

/// The first path in `existing` that `path` would shadow or be shadowed
/// by (`a` versus `a/b`).
pub(crate) fn prefix_conflict<'a>(
    path: &str,
    existing: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    existing.into_iter().find(|other| {
        *other != path
            && (other
                .strip_prefix(path)
                .is_some_and(|rest| rest.starts_with('/'))
                || path
                    .strip_prefix(*other)
                    .is_some_and(|rest| rest.starts_with('/')))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove_paths() {
        let mut map = DigestPathMap::new();
        map.insert("abc", "a.txt");
        map.insert("abc", "b.txt");
        map.insert("def", "c.txt");
        assert_eq!(map.digest_for("b.txt"), Some("abc"));
        assert_eq!(map.remove_path("a.txt").as_deref(), Some("abc"));
        assert!(map.contains_digest("abc"));
        map.remove_path("b.txt");
        assert!(!map.contains_digest("abc"));
        assert_eq!(map.remove_path("missing"), None);
    }

    #[test]
    fn lowercase_merges() {
        let mut map: DigestPathMap = [
            ("ABC".to_string(), "x".to_string()),
            ("abc".to_string(), "y".to_string()),
        ]
        .into_iter()
        .collect();
        map.lowercase_digests();
        assert_eq!(map.len(), 1);
        assert_eq!(map.paths("abc").unwrap().len(), 2);
    }

    #[test]
    fn path_rules() {
        assert!(validate_path("a/b.txt").is_ok());
        assert!(validate_path("").is_err());
        assert!(validate_path("/a").is_err());
        assert!(validate_path("a/").is_err());
        assert!(validate_path("a//b").is_err());
        assert!(validate_path("a/../b").is_err());
        assert!(validate_path("./a").is_err());
    }

    #[test]
    fn prefix_conflicts() {
        let existing = ["a/b", "c"];
        assert_eq!(prefix_conflict("a", existing), Some("a/b"));
        assert_eq!(prefix_conflict("c/d", existing), Some("c"));
        assert_eq!(prefix_conflict("ab", existing), None);
        assert_eq!(prefix_conflict("a/b", existing), None);
    }

    #[test]
    fn serde_shape_is_plain_map() {
        let map: DigestPathMap = [("abc".to_string(), "x".to_string())].into_iter().collect();
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"abc":["x"]}"#);
    }
}
