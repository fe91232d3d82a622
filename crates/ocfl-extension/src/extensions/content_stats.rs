use std::collections::BTreeMap;
use std::io::{self, Read};
use std::sync::Arc;

use ocfl_fs::Filesystem;
use ocfl_inventory::Inventory;
use ocfl_types::VersionNumber;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::capability::{
    Capability, ContentChange, ContentEvent, Extension, Metadata, NewVersion, ObjectChange,
    Stream,
};
use crate::error::ExtensionResult;
use crate::extensions::check_name;
use crate::session::Session;

const STATS_FILE: &str = "stats.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStatsConfig {
    pub extension_name: String,
    /// Leading bytes inspected to tell text from binary content.
    #[serde(default = "default_sniff_bytes")]
    pub sniff_bytes: usize,
}

fn default_sniff_bytes() -> usize {
    512
}

impl Default for ContentStatsConfig {
    fn default() -> Self {
        Self {
            extension_name: ContentStats::NAME.to_string(),
            sniff_bytes: default_sniff_bytes(),
        }
    }
}

/// Rough content class from the leading bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteClass {
    Empty,
    Text,
    Binary,
}

/// What is recorded for one file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    pub size: u64,
    pub lines: u64,
    pub class: ByteClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl FileStats {
    /// Measure `reader` to its end.
    pub fn measure(reader: &mut dyn Read, sniff_bytes: usize) -> io::Result<Self> {
        let mut head = Vec::with_capacity(sniff_bytes);
        let mut buf = [0u8; 8192];
        let mut size = 0u64;
        let mut lines = 0u64;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            let chunk = &buf[..n];
            if head.len() < sniff_bytes {
                let take = (sniff_bytes - head.len()).min(n);
                head.extend_from_slice(&chunk[..take]);
            }
            lines += chunk.iter().filter(|b| **b == b'\n').count() as u64;
            size += n as u64;
        }
        Ok(Self {
            size,
            lines,
            class: classify(&head),
            digest: None,
        })
    }
}

fn classify(head: &[u8]) -> ByteClass {
    if head.is_empty() {
        return ByteClass::Empty;
    }
    if head.contains(&0) {
        return ByteClass::Binary;
    }
    match std::str::from_utf8(head) {
        Ok(_) => ByteClass::Text,
        // Cut in the middle of a character at the end of the sniff window.
        Err(e) if e.error_len().is_none() => ByteClass::Text,
        Err(_) => ByteClass::Binary,
    }
}

fn with_digest(mut value: Value, digest: &str) -> Value {
    if let Some(fields) = value.as_object_mut() {
        fields.insert("digest".into(), Value::String(digest.to_string()));
    }
    value
}

/// Size, line count and byte class of every stored file.
///
/// Statistics are gathered while files stream into the object and written
/// to `<version>/stats.json` inside the extension's directory once the
/// version is persisted. Each file covers the whole state of its version.
pub struct ContentStats {
    config: ContentStatsConfig,
    fs: Arc<dyn Filesystem>,
}

impl ContentStats {
    pub const NAME: &'static str = "NNNN-content-stats";

    /// `fs` is the extension's directory inside the object.
    pub fn new(fs: Arc<dyn Filesystem>) -> Self {
        Self {
            config: ContentStatsConfig::default(),
            fs,
        }
    }

    pub fn from_json(data: &[u8], fs: Arc<dyn Filesystem>) -> ExtensionResult<Self> {
        let config: ContentStatsConfig = serde_json::from_slice(data)?;
        check_name(&config.extension_name, Self::NAME)?;
        Ok(Self { config, fs })
    }

    fn stats_path(version: VersionNumber) -> String {
        format!("{version}/{STATS_FILE}")
    }

    /// Statistics written for `version`, if any.
    pub fn load(&self, version: VersionNumber) -> ExtensionResult<Option<BTreeMap<String, FileStats>>> {
        let path = Self::stats_path(version);
        if !self.fs.exists(&path)? {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&self.fs.read_to_vec(&path)?)?))
    }

    fn head_stats(session: &Session, inventory: &Inventory) -> BTreeMap<String, Value> {
        let Some(records) = session.records(Self::NAME) else {
            return BTreeMap::new();
        };
        records
            .iter()
            .filter_map(|(path, value)| {
                let digest = inventory.digest_for(path)?;
                Some((path.clone(), with_digest(value.clone(), digest)))
            })
            .collect()
    }
}

impl std::fmt::Debug for ContentStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStats")
            .field("config", &self.config)
            .finish()
    }
}

impl Extension for ContentStats {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "size, line count and byte class of stored files"
    }

    fn config_json(&self) -> ExtensionResult<Value> {
        Ok(serde_json::to_value(&self.config)?)
    }

    fn capabilities(self: Arc<Self>) -> Vec<Capability> {
        vec![
            Capability::Stream(self.clone()),
            Capability::Metadata(self.clone()),
            Capability::ContentChange(self.clone()),
            Capability::ObjectChange(self.clone()),
            Capability::NewVersion(self),
        ]
    }
}

impl Stream for ContentStats {
    fn stream(
        &self,
        _logical_path: &str,
        _area: &str,
        reader: &mut dyn Read,
    ) -> ExtensionResult<Option<Value>> {
        let stats = FileStats::measure(reader, self.config.sniff_bytes)?;
        Ok(Some(serde_json::to_value(stats)?))
    }
}

impl ContentChange for ContentStats {
    fn content_change(&self, session: &mut Session, event: &ContentEvent) -> ExtensionResult<()> {
        match event {
            ContentEvent::Added { path, digest } => {
                if let Some(value) = session.take(Self::NAME, path) {
                    session.record(Self::NAME, path.clone(), with_digest(value, digest));
                }
            }
            ContentEvent::Deleted { path } => {
                session.take(Self::NAME, path);
            }
            ContentEvent::Renamed { from, to } => {
                if let Some(value) = session.take(Self::NAME, from) {
                    session.record(Self::NAME, to.clone(), value);
                }
            }
            ContentEvent::Copied { path, digest } => {
                let source = session.records(Self::NAME).and_then(|records| {
                    records
                        .values()
                        .find(|v| v.get("digest").and_then(Value::as_str) == Some(digest.as_str()))
                        .cloned()
                });
                if let Some(value) = source {
                    session.record(Self::NAME, path.clone(), value);
                }
            }
        }
        Ok(())
    }
}

impl Metadata for ContentStats {
    fn metadata(
        &self,
        session: &Session,
        inventory: &Inventory,
    ) -> ExtensionResult<BTreeMap<String, Value>> {
        Ok(Self::head_stats(session, inventory)
            .into_values()
            .filter_map(|mut value| {
                let digest = value.as_object_mut()?.remove("digest")?;
                Some((digest.as_str()?.to_string(), value))
            })
            .collect())
    }
}

impl ObjectChange for ContentStats {
    fn update_object_before(
        &self,
        _session: &mut Session,
        _inventory: &Inventory,
    ) -> ExtensionResult<()> {
        Ok(())
    }

    fn update_object_after(
        &self,
        session: &mut Session,
        inventory: &Inventory,
    ) -> ExtensionResult<()> {
        let Some(head) = inventory.head() else {
            return Ok(());
        };
        let stats = Self::head_stats(session, inventory);
        self.fs
            .write_file(&Self::stats_path(head), &serde_json::to_vec_pretty(&stats)?)?;
        debug!(object = %session.object_id(), version = %head, files = stats.len(), "content stats written");
        Ok(())
    }
}

impl NewVersion for ContentStats {
    fn needs_new_version(&self, _session: &Session, _inventory: &Inventory) -> bool {
        false
    }

    fn do_new_version(&self, session: &mut Session, inventory: &Inventory) -> ExtensionResult<()> {
        let Some(previous) = inventory.head().and_then(|h| h.previous()) else {
            return Ok(());
        };
        let Some(stats) = self.load(previous)? else {
            return Ok(());
        };
        for (path, file) in stats {
            if session.get(Self::NAME, &path).is_none() {
                session.record(Self::NAME, path, serde_json::to_value(file)?);
            }
        }
        Ok(())
    }
}
