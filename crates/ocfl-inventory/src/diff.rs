//! Logical-path level comparison of two version states.

use std::collections::BTreeMap;

use crate::model::VersionState;

/// The result of comparing two version states.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VersionDiff {
    pub changes: Vec<PathChange>,
}

impl VersionDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn additions(&self) -> usize {
        self.count(|c| matches!(c, PathChange::Added { .. }))
    }

    pub fn removals(&self) -> usize {
        self.count(|c| matches!(c, PathChange::Removed { .. }))
    }

    pub fn modifications(&self) -> usize {
        self.count(|c| matches!(c, PathChange::Modified { .. }))
    }

    pub fn renames(&self) -> usize {
        self.count(|c| matches!(c, PathChange::Renamed { .. }))
    }

    fn count(&self, pred: impl Fn(&PathChange) -> bool) -> usize {
        self.changes.iter().filter(|c| pred(c)).count()
    }
}

/// A single logical path change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathChange {
    Added { path: String, digest: String },
    Removed { path: String, digest: String },
    Modified { path: String, old: String, new: String },
    /// Content left `from` and appeared unchanged at `to`.
    Renamed { from: String, to: String, digest: String },
}

/// Compare two states.
///
/// A removed path and an added path with the same digest are reported as a
/// rename; pairing is in path order.
pub fn diff_states(old: &VersionState, new: &VersionState) -> VersionDiff {
    let old_paths = old.by_path();
    let new_paths = new.by_path();

    let mut changes = Vec::new();
    let mut removed: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (path, digest) in &old_paths {
        match new_paths.get(path) {
            Some(new_digest) if new_digest != digest => changes.push(PathChange::Modified {
                path: path.to_string(),
                old: digest.to_string(),
                new: new_digest.to_string(),
            }),
            Some(_) => {}
            None => removed.entry(*digest).or_default().push(*path),
        }
    }

    for (path, digest) in &new_paths {
        if old_paths.contains_key(path) {
            continue;
        }
        match removed.get_mut(digest).filter(|paths| !paths.is_empty()) {
            Some(paths) => {
                let from = paths.remove(0);
                changes.push(PathChange::Renamed {
                    from: from.to_string(),
                    to: path.to_string(),
                    digest: digest.to_string(),
                });
            }
            None => changes.push(PathChange::Added {
                path: path.to_string(),
                digest: digest.to_string(),
            }),
        }
    }

    for (digest, paths) in removed {
        for path in paths {
            changes.push(PathChange::Removed {
                path: path.to_string(),
                digest: digest.to_string(),
            });
        }
    }

    VersionDiff { changes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(entries: &[(&str, &str)]) -> VersionState {
        entries
            .iter()
            .map(|(d, p)| (d.to_string(), p.to_string()))
            .collect()
    }

    #[test]
    fn identical_states() {
        let s = state(&[("d1", "a")]);
        assert!(diff_states(&s, &s).is_empty());
    }

    #[test]
    fn classifies_changes() {
        let old = state(&[("d1", "keep"), ("d2", "edit"), ("d3", "gone"), ("d4", "old-name")]);
        let new = state(&[("d1", "keep"), ("d5", "edit"), ("d4", "new-name"), ("d6", "fresh")]);
        let diff = diff_states(&old, &new);
        assert_eq!(diff.modifications(), 1);
        assert_eq!(diff.renames(), 1);
        assert_eq!(diff.additions(), 1);
        assert_eq!(diff.removals(), 1);
        assert!(diff.changes.contains(&PathChange::Renamed {
            from: "old-name".into(),
            to: "new-name".into(),
            digest: "d4".into(),
        }));
    }

    #[test]
    fn copy_is_an_addition() {
        let old = state(&[("d1", "a")]);
        let new = state(&[("d1", "a"), ("d1", "b")]);
        let diff = diff_states(&old, &new);
        assert_eq!(diff.additions(), 1);
        assert_eq!(diff.renames(), 0);
    }
}
