//! The [`Inventory`]: an object's versions, manifest and fixity.
//!
//! All edits go to the head version. Earlier versions are history and never
//! change. The head is mutable until [`Inventory::finalize`] freezes it; a
//! parsed inventory starts frozen and [`Inventory::new_version`] thaws it.

use std::collections::{BTreeMap, BTreeSet};

use ocfl_checksum::digest_bytes;
use ocfl_types::{DigestAlgorithm, VersionNumber};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::diff::{diff_states, VersionDiff};
use crate::error::{InventoryError, InventoryResult};
use crate::model::{prefix_conflict, validate_path, Fixity, Manifest, Version, VersionState};
use crate::validation::{ValidationIssue, ValidationReport};

/// The `type` value of OCFL 1.1 inventories.
pub const INVENTORY_TYPE: &str = "https://ocfl.io/1.1/spec/#inventory";

/// File name of the inventory in the object root and version directories.
pub const INVENTORY_FILE: &str = "inventory.json";

pub const DEFAULT_CONTENT_DIRECTORY: &str = "content";

fn default_content_directory() -> String {
    DEFAULT_CONTENT_DIRECTORY.to_string()
}

fn is_default_content_directory(dir: &str) -> bool {
    dir == DEFAULT_CONTENT_DIRECTORY
}

/// What [`Inventory::add_file`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddOutcome {
    /// Primary digest of the added content.
    pub digest: String,
    /// The content was already in the manifest; the caller must not keep
    /// the physical file at the requested manifest path.
    pub deduplicated: bool,
    /// Content paths of head-version files that are no longer referenced
    /// and should be removed from storage.
    pub orphaned: Vec<String>,
}

/// An OCFL object inventory.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    id: String,
    #[serde(rename = "type")]
    inventory_type: String,
    digest_algorithm: DigestAlgorithm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    head: Option<VersionNumber>,
    #[serde(
        default = "default_content_directory",
        skip_serializing_if = "is_default_content_directory"
    )]
    content_directory: String,
    #[serde(default)]
    manifest: Manifest,
    #[serde(default)]
    versions: BTreeMap<VersionNumber, Version>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    fixity: Fixity,
    #[serde(skip)]
    frozen: bool,
    #[serde(skip)]
    version_padding: usize,
}

impl Inventory {
    /// Create an empty inventory. Call [`Self::new_version`] to open `v1`.
    pub fn new(
        id: impl Into<String>,
        digest_algorithm: DigestAlgorithm,
        content_directory: impl Into<String>,
    ) -> InventoryResult<Self> {
        let id = id.into();
        let content_directory = content_directory.into();
        if id.is_empty() {
            return Err(InventoryError::Configuration("object id must not be empty".into()));
        }
        if !digest_algorithm.is_content_algorithm() {
            return Err(InventoryError::Configuration(format!(
                "{digest_algorithm} cannot be used as the content digest algorithm"
            )));
        }
        if content_directory.is_empty()
            || content_directory.contains('/')
            || content_directory == "."
            || content_directory == ".."
        {
            return Err(InventoryError::Configuration(format!(
                "invalid content directory {content_directory:?}"
            )));
        }
        Ok(Self {
            id,
            inventory_type: INVENTORY_TYPE.to_string(),
            digest_algorithm,
            head: None,
            content_directory,
            manifest: Manifest::new(),
            versions: BTreeMap::new(),
            fixity: Fixity::new(),
            frozen: false,
            version_padding: 0,
        })
    }

    /// Use zero-padded version names (`v001`) with `width` digits.
    pub fn with_version_padding(mut self, width: usize) -> Self {
        self.version_padding = width;
        self
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest_algorithm
    }

    pub fn content_directory(&self) -> &str {
        &self.content_directory
    }

    pub fn head(&self) -> Option<VersionNumber> {
        self.head
    }

    pub fn head_version(&self) -> Option<&Version> {
        self.head.and_then(|h| self.versions.get(&h))
    }

    pub fn head_state(&self) -> Option<&VersionState> {
        self.head_version().map(|v| &v.state)
    }

    pub fn version(&self, version: VersionNumber) -> Option<&Version> {
        self.versions.get(&version)
    }

    pub fn versions(&self) -> &BTreeMap<VersionNumber, Version> {
        &self.versions
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn fixity(&self) -> &Fixity {
        &self.fixity
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Primary digest of a logical path in the head state.
    pub fn digest_for(&self, logical_path: &str) -> Option<&str> {
        self.head_state()?.digest_for(logical_path)
    }

    /// Content paths stored for `digest`.
    pub fn content_paths(&self, digest: &str) -> Option<&BTreeSet<String>> {
        self.manifest.paths(&digest.to_ascii_lowercase())
    }

    /// `<head>/<contentDirectory>`, where new content files belong.
    pub fn content_prefix(&self) -> InventoryResult<String> {
        let head = self.head.ok_or(InventoryError::NoHead)?;
        Ok(format!("{head}/{}", self.content_directory))
    }

    /// Whether every content path of `digest` lives in the head version.
    pub fn is_new_in_head(&self, digest: &str) -> bool {
        let (Some(head), Some(paths)) = (self.head, self.manifest.paths(digest)) else {
            return false;
        };
        let prefix = format!("{head}/");
        paths.iter().all(|p| p.starts_with(&prefix))
    }

    // ---------------------------------------------------------------
    // Version lifecycle
    // ---------------------------------------------------------------

    /// Open a new head version whose state starts as a copy of the previous
    /// head's state (empty for the first version).
    pub fn new_version(
        &mut self,
        message: &str,
        user: &str,
        address: &str,
    ) -> InventoryResult<VersionNumber> {
        let (next, state) = match self.head {
            Some(head) => {
                let state = self
                    .versions
                    .get(&head)
                    .map(|v| v.state.clone())
                    .unwrap_or_default();
                (head.next()?, state)
            }
            None => (VersionNumber::padded(1, self.version_padding)?, VersionState::new()),
        };
        self.versions
            .insert(next, Version::new(message, user, address, state));
        self.head = Some(next);
        self.frozen = false;
        info!(id = %self.id, version = %next, "opened version");
        Ok(next)
    }

    /// Validate the structure, then freeze the inventory unless the object
    /// is still being created.
    pub fn finalize(&mut self, in_creation: bool) -> InventoryResult<()> {
        let report = self.validate();
        if !report.is_valid() {
            return Err(InventoryError::Invalid(report));
        }
        if !in_creation {
            self.frozen = true;
        }
        debug!(id = %self.id, head = ?self.head.map(|h| h.to_string()), frozen = self.frozen, "inventory finalized");
        Ok(())
    }

    fn mutable_head(&self) -> InventoryResult<VersionNumber> {
        if self.frozen {
            return Err(InventoryError::Frozen);
        }
        self.head.ok_or(InventoryError::NoHead)
    }

    fn state_mut(&mut self, head: VersionNumber) -> InventoryResult<&mut VersionState> {
        self.versions
            .get_mut(&head)
            .map(|v| &mut v.state)
            .ok_or_else(|| InventoryError::VersionNotFound(head.to_string()))
    }

    fn check_digest(algorithm: DigestAlgorithm, digest: &str) -> InventoryResult<()> {
        if algorithm.is_valid_digest(digest) {
            Ok(())
        } else {
            Err(InventoryError::InvalidDigest {
                algorithm: algorithm.to_string(),
                digest: digest.to_string(),
            })
        }
    }

    // ---------------------------------------------------------------
    // State edits
    // ---------------------------------------------------------------

    /// Record new content under one or more logical paths.
    ///
    /// `digests` must contain the inventory's digest algorithm; further
    /// algorithms are recorded in the fixity block for new manifest entries.
    /// Existing logical paths are overwritten.
    pub fn add_file(
        &mut self,
        logical_paths: &[&str],
        manifest_path: &str,
        digests: &BTreeMap<DigestAlgorithm, String>,
    ) -> InventoryResult<AddOutcome> {
        let head = self.mutable_head()?;
        if logical_paths.is_empty() {
            return Err(InventoryError::InvalidPath {
                path: String::new(),
                reason: "at least one logical path is required".into(),
            });
        }
        for path in logical_paths {
            validate_path(path)?;
            if let Some(other) = prefix_conflict(path, logical_paths.iter().copied()) {
                return Err(InventoryError::PathConflict {
                    path: path.to_string(),
                    existing: other.to_string(),
                });
            }
        }
        validate_path(manifest_path)?;
        let prefix = format!("{}/", self.content_prefix()?);
        if !manifest_path.starts_with(&prefix) {
            return Err(InventoryError::InvalidPath {
                path: manifest_path.to_string(),
                reason: format!("new content must be stored below {prefix}"),
            });
        }

        let digest = digests
            .get(&self.digest_algorithm)
            .ok_or_else(|| InventoryError::MissingDigest(self.digest_algorithm.to_string()))?
            .to_ascii_lowercase();
        for (algorithm, value) in digests {
            Self::check_digest(*algorithm, &value.to_ascii_lowercase())?;
        }

        let deduplicated = self.manifest.contains_digest(&digest);
        if !deduplicated {
            if let Some(other) = self.manifest.digest_for(manifest_path) {
                return Err(InventoryError::PathConflict {
                    path: manifest_path.to_string(),
                    existing: format!("content of {other}"),
                });
            }
            if let Some(other) = prefix_conflict(manifest_path, self.manifest.all_paths()) {
                return Err(InventoryError::PathConflict {
                    path: manifest_path.to_string(),
                    existing: other.to_string(),
                });
            }
        }

        {
            let state = self.head_state().ok_or(InventoryError::NoHead)?;
            let existing = state.all_paths();
            for path in logical_paths {
                if let Some(other) = prefix_conflict(path, existing.iter().copied()) {
                    return Err(InventoryError::PathConflict {
                        path: path.to_string(),
                        existing: other.to_string(),
                    });
                }
            }
        }

        let state = self.state_mut(head)?;
        let mut replaced = BTreeSet::new();
        for path in logical_paths {
            if let Some(old) = state.remove_path(path) {
                replaced.insert(old);
            }
            state.insert(&digest, path);
        }

        if !deduplicated {
            self.manifest.insert(&digest, manifest_path);
            for (algorithm, value) in digests {
                if *algorithm == self.digest_algorithm {
                    continue;
                }
                self.fixity
                    .entry(*algorithm)
                    .or_default()
                    .insert(&value.to_ascii_lowercase(), manifest_path);
            }
        }

        let mut orphaned = Vec::new();
        for old in replaced.iter().filter(|old| **old != digest) {
            orphaned.extend(self.release(old));
        }

        debug!(
            id = %self.id,
            digest = %digest,
            paths = logical_paths.len(),
            deduplicated,
            "added file"
        );
        Ok(AddOutcome {
            digest,
            deduplicated,
            orphaned,
        })
    }

    /// Remove a logical path from the head state.
    ///
    /// Returns content paths that became orphaned.
    pub fn delete_file(&mut self, logical_path: &str) -> InventoryResult<Vec<String>> {
        let head = self.mutable_head()?;
        let digest = self
            .state_mut(head)?
            .remove_path(logical_path)
            .ok_or_else(|| InventoryError::PathNotFound(logical_path.to_string()))?;
        debug!(id = %self.id, path = logical_path, "deleted file");
        Ok(self.release(&digest))
    }

    /// Move a logical path within the head state.
    pub fn rename_file(&mut self, source: &str, destination: &str) -> InventoryResult<()> {
        let head = self.mutable_head()?;
        validate_path(destination)?;
        let state = self.head_state().ok_or(InventoryError::NoHead)?;
        let digest = state
            .digest_for(source)
            .ok_or_else(|| InventoryError::PathNotFound(source.to_string()))?
            .to_string();
        if source == destination {
            return Ok(());
        }
        let all = state.all_paths();
        let others = all.iter().copied().filter(|p| *p != source);
        if let Some(other) = prefix_conflict(destination, others)
            .or_else(|| state.digest_for(destination).map(|_| destination))
        {
            return Err(InventoryError::PathConflict {
                path: destination.to_string(),
                existing: other.to_string(),
            });
        }

        let state = self.state_mut(head)?;
        state.remove_path(source);
        state.insert(&digest, destination);
        debug!(id = %self.id, from = source, to = destination, "renamed file");
        Ok(())
    }

    /// Point `destination` at content already in the manifest.
    ///
    /// Returns content paths orphaned by overwriting `destination`.
    pub fn copy_file(&mut self, destination: &str, digest: &str) -> InventoryResult<Vec<String>> {
        let head = self.mutable_head()?;
        validate_path(destination)?;
        let digest = digest.to_ascii_lowercase();
        if !self.manifest.contains_digest(&digest) {
            return Err(InventoryError::UnknownDigest(digest));
        }
        let state = self.head_state().ok_or(InventoryError::NoHead)?;
        if let Some(other) = prefix_conflict(destination, state.all_paths()) {
            return Err(InventoryError::PathConflict {
                path: destination.to_string(),
                existing: other.to_string(),
            });
        }

        let state = self.state_mut(head)?;
        let previous = state.remove_path(destination);
        state.insert(&digest, destination);
        debug!(id = %self.id, path = destination, digest = %digest, "copied file");
        Ok(match previous {
            Some(old) if old != digest => self.release(&old),
            _ => Vec::new(),
        })
    }

    /// Drop a head-only manifest entry once the head state no longer
    /// references it.
    fn release(&mut self, digest: &str) -> Vec<String> {
        let referenced = self
            .head_state()
            .is_some_and(|state| state.contains_digest(digest));
        if referenced || !self.is_new_in_head(digest) {
            return Vec::new();
        }
        let paths = self.manifest.remove_digest(digest).unwrap_or_default();
        for block in self.fixity.values_mut() {
            for path in &paths {
                block.remove_path(path);
            }
        }
        self.fixity.retain(|_, block| !block.is_empty());
        debug!(id = %self.id, digest, count = paths.len(), "released orphaned content");
        paths.into_iter().collect()
    }

    // ---------------------------------------------------------------
    // Comparison and persistence
    // ---------------------------------------------------------------

    /// Structural equality, ignoring runtime-only state.
    pub fn is_equal(&self, other: &Inventory) -> bool {
        self.id == other.id
            && self.inventory_type == other.inventory_type
            && self.digest_algorithm == other.digest_algorithm
            && self.head.map(|h| h.to_string()) == other.head.map(|h| h.to_string())
            && self.content_directory == other.content_directory
            && self.manifest == other.manifest
            && self.versions == other.versions
            && self.fixity == other.fixity
    }

    /// Changes between two versions' states.
    pub fn diff_versions(
        &self,
        from: VersionNumber,
        to: VersionNumber,
    ) -> InventoryResult<VersionDiff> {
        let old = self
            .version(from)
            .ok_or_else(|| InventoryError::VersionNotFound(from.to_string()))?;
        let new = self
            .version(to)
            .ok_or_else(|| InventoryError::VersionNotFound(to.to_string()))?;
        Ok(diff_states(&old.state, &new.state))
    }

    /// Pretty-printed `inventory.json` bytes.
    pub fn to_json(&self) -> InventoryResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parse `inventory.json`. Digests are normalized to lowercase and the
    /// result is frozen.
    pub fn from_json(data: &[u8]) -> InventoryResult<Self> {
        let mut inventory: Inventory = serde_json::from_slice(data)?;
        inventory.manifest.lowercase_digests();
        for version in inventory.versions.values_mut() {
            version.state.lowercase_digests();
        }
        for block in inventory.fixity.values_mut() {
            block.lowercase_digests();
        }
        inventory.version_padding = inventory.head.map(|h| h.padding()).unwrap_or(0);
        inventory.frozen = true;
        Ok(inventory)
    }

    /// `inventory.json.<algorithm>`.
    pub fn sidecar_name(&self) -> String {
        format!("{INVENTORY_FILE}.{}", self.digest_algorithm)
    }

    /// Sidecar file contents for serialized inventory bytes.
    pub fn sidecar(&self, json: &[u8]) -> String {
        format!(
            "{} {INVENTORY_FILE}\n",
            digest_bytes(self.digest_algorithm, json)
        )
    }

    /// Check serialized inventory bytes against sidecar contents.
    pub fn verify_sidecar(&self, json: &[u8], sidecar: &str) -> InventoryResult<()> {
        let expected = sidecar
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let actual = digest_bytes(self.digest_algorithm, json);
        if expected != actual {
            return Err(InventoryError::SidecarMismatch { expected, actual });
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------

    /// Structural validation of the whole inventory.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        let id = self.id.as_str();

        if self.id.is_empty() {
            report.push(ValidationIssue::error("E036", "inventory id is missing", "id"));
        }
        if self.inventory_type != INVENTORY_TYPE {
            report.push(ValidationIssue::error(
                "E038",
                format!("unexpected inventory type {:?}", self.inventory_type),
                id,
            ));
        }
        match self.digest_algorithm {
            DigestAlgorithm::Sha512 => {}
            DigestAlgorithm::Sha256 => report.push(ValidationIssue::warning(
                "W004",
                "sha512 is the recommended digest algorithm",
                id,
            )),
            other => report.push(ValidationIssue::error(
                "E025",
                format!("{other} is not a permitted content digest algorithm"),
                id,
            )),
        }

        self.validate_versions(&mut report);
        self.validate_manifest(&mut report);
        self.validate_states(&mut report);
        self.validate_fixity(&mut report);
        report
    }

    fn validate_versions(&self, report: &mut ValidationReport) {
        let id = self.id.as_str();
        if self.versions.is_empty() {
            report.push(ValidationIssue::error("E008", "object has no versions", id));
            return;
        }
        for (expected, version) in (1u32..).zip(self.versions.keys()) {
            if version.number() != expected {
                report.push(ValidationIssue::error(
                    "E010",
                    format!("version sequence has a gap before {version}"),
                    id,
                ));
                break;
            }
        }
        let padding: BTreeSet<usize> = self.versions.keys().map(|v| v.padding()).collect();
        if padding.len() > 1 {
            report.push(ValidationIssue::error(
                "E012",
                "version names mix zero-padding widths",
                id,
            ));
        }
        let latest = self.versions.keys().next_back().copied();
        if self.head != latest {
            report.push(ValidationIssue::error(
                "E040",
                format!(
                    "head {} is not the latest version",
                    self.head.map(|h| h.to_string()).unwrap_or_else(|| "(none)".into())
                ),
                id,
            ));
        }
    }

    fn validate_manifest(&self, report: &mut ValidationReport) {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for (digest, paths) in self.manifest.iter() {
            if !self.digest_algorithm.is_valid_digest(digest) {
                report.push(ValidationIssue::error(
                    "E096",
                    format!("manifest digest is not a valid {}", self.digest_algorithm),
                    digest.as_str(),
                ));
            }
            for path in paths {
                if let Err(e) = validate_path(path) {
                    report.push(ValidationIssue::error("E099", e.to_string(), path.as_str()));
                    continue;
                }
                if !self.is_version_content_path(path) {
                    report.push(ValidationIssue::error(
                        "E042",
                        "content path is not inside a version content directory",
                        path.as_str(),
                    ));
                }
                if !seen.insert(path.as_str()) {
                    report.push(ValidationIssue::error(
                        "E101",
                        "content path appears under more than one digest",
                        path.as_str(),
                    ));
                }
            }
        }
        for path in &seen {
            if let Some(other) = prefix_conflict(path, seen.iter().copied()) {
                if path < &other {
                    report.push(ValidationIssue::error(
                        "E101",
                        format!("content path conflicts with {other}"),
                        *path,
                    ));
                }
            }
        }

        let referenced: BTreeSet<&String> = self
            .versions
            .values()
            .flat_map(|v| v.state.digests())
            .collect();
        for digest in self.manifest.digests() {
            if !referenced.contains(digest) {
                report.push(ValidationIssue::error(
                    "E107",
                    "manifest digest is not referenced by any version state",
                    digest.as_str(),
                ));
            }
        }
    }

    fn is_version_content_path(&self, path: &str) -> bool {
        let mut parts = path.splitn(3, '/');
        let (Some(version), Some(dir), Some(_)) = (parts.next(), parts.next(), parts.next()) else {
            return false;
        };
        version
            .parse::<VersionNumber>()
            .is_ok_and(|v| self.versions.contains_key(&v))
            && dir == self.content_directory
    }

    fn validate_states(&self, report: &mut ValidationReport) {
        for (version, v) in &self.versions {
            let context = |path: &str| format!("{version}:{path}");
            let mut seen: BTreeSet<&str> = BTreeSet::new();
            for (digest, paths) in v.state.iter() {
                if !self.manifest.contains_digest(digest) {
                    report.push(ValidationIssue::error(
                        "E050",
                        format!("state digest {digest} is missing from the manifest"),
                        version.to_string(),
                    ));
                }
                for path in paths {
                    if let Err(e) = validate_path(path) {
                        report.push(ValidationIssue::error("E053", e.to_string(), context(path.as_str())));
                    }
                    if !seen.insert(path.as_str()) {
                        report.push(ValidationIssue::error(
                            "E095",
                            "logical path appears under more than one digest",
                            context(path.as_str()),
                        ));
                    }
                }
            }
            for path in &seen {
                if let Some(other) = prefix_conflict(path, seen.iter().copied()) {
                    if path < &other {
                        report.push(ValidationIssue::error(
                            "E095",
                            format!("logical path conflicts with {other}"),
                            context(*path),
                        ));
                    }
                }
            }
        }
    }

    fn validate_fixity(&self, report: &mut ValidationReport) {
        let content = self.manifest.all_paths();
        for (algorithm, block) in &self.fixity {
            for (digest, paths) in block.iter() {
                if !algorithm.is_valid_digest(digest) {
                    report.push(ValidationIssue::error(
                        "E097",
                        format!("fixity digest is not a valid {algorithm}"),
                        digest.as_str(),
                    ));
                }
                for path in paths {
                    if !content.contains(path.as_str()) {
                        report.push(ValidationIssue::error(
                            "E057",
                            format!("{algorithm} fixity path is not in the manifest"),
                            path.as_str(),
                        ));
                    }
                }
            }
        }
    }

    /// Cross-check the manifest against content files found in storage.
    ///
    /// `found` maps each content path to the digests computed for it. Files
    /// missing from storage, files missing from the manifest, and digest or
    /// fixity mismatches are reported; nothing aborts the pass.
    pub fn check_files(
        &self,
        found: &BTreeMap<String, BTreeMap<DigestAlgorithm, String>>,
    ) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let by_path = self.manifest.by_path();

        for (path, digest) in &by_path {
            let Some(computed) = found.get(*path) else {
                issues.push(ValidationIssue::error(
                    "E092",
                    "content file listed in the manifest is missing",
                    *path,
                ));
                continue;
            };
            if let Some(actual) = computed.get(&self.digest_algorithm) {
                if !actual.eq_ignore_ascii_case(digest) {
                    issues.push(ValidationIssue::error(
                        "E092",
                        format!("{} digest mismatch: manifest {digest}, file {actual}", self.digest_algorithm),
                        *path,
                    ));
                }
            }
        }

        for (algorithm, block) in &self.fixity {
            for (path, expected) in block.by_path() {
                let Some(actual) = found.get(path).and_then(|c| c.get(algorithm)) else {
                    continue;
                };
                if !actual.eq_ignore_ascii_case(expected) {
                    issues.push(ValidationIssue::error(
                        "E093",
                        format!("{algorithm} fixity mismatch: recorded {expected}, file {actual}"),
                        path,
                    ));
                }
            }
        }

        for path in found.keys() {
            if !by_path.contains_key(path.as_str()) {
                issues.push(ValidationIssue::error(
                    "E023",
                    "content file is not listed in the manifest",
                    path.as_str(),
                ));
            }
        }
        issues
    }
}
