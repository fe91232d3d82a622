use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Read, Write};
use std::sync::Arc;

use ocfl_checksum::FanOutGroup;
use ocfl_fs::Filesystem;
use ocfl_inventory::Inventory;
use ocfl_types::{DigestAlgorithm, ErrorList};
use serde_json::Value;
use tracing::{debug, info};

use crate::capability::{
    Area, Capability, CapabilityKind, ContentChange, ContentEvent, Extension, FixityDigest,
    Metadata, NewVersion, ObjectChange, ObjectContentPath, ObjectExtractPath, ObjectStatePath,
    StorageRootPath, Stream,
};
use crate::config::{ManagerConfig, MANAGER_NAME};
use crate::error::{ExtensionError, ExtensionResult};
use crate::extensions::BUILTIN_NAMES;
use crate::session::Session;

/// File advertising the storage root layout.
pub const LAYOUT_FILE: &str = "ocfl_layout.json";

/// Area that needs no Area extension.
pub const CONTENT_AREA: &str = "content";

const STREAM_BUFFER: usize = 64 * 1024;

/// One active capability, tagged with its extension's name.
struct Slot<T: ?Sized> {
    name: String,
    inner: Arc<T>,
}

impl<T: ?Sized> Slot<T> {
    fn new(name: String, inner: Arc<T>) -> Self {
        Self { name, inner }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects extensions, then compiles them into an [`ExtensionManager`].
pub struct ExtensionManagerBuilder {
    config: ManagerConfig,
    known: BTreeSet<String>,
    extensions: Vec<Arc<dyn Extension>>,
    tables: BTreeMap<CapabilityKind, Vec<(String, Capability)>>,
}

impl Default for ExtensionManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionManagerBuilder {
    /// An empty builder that accepts the built-in extension names in rules.
    pub fn new() -> Self {
        Self {
            config: ManagerConfig::default(),
            known: BUILTIN_NAMES.iter().map(|s| s.to_string()).collect(),
            extensions: Vec::new(),
            tables: BTreeMap::new(),
        }
    }

    /// Use `config` for exclusion and sort rules.
    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Accept `name` in rules even if it is never registered.
    pub fn allow_name(&mut self, name: impl Into<String>) {
        self.known.insert(name.into());
    }

    /// Register an extension and every capability it declares.
    pub fn add(&mut self, extension: Arc<dyn Extension>) -> ExtensionResult<()> {
        let name = extension.name().to_string();
        if self.extensions.iter().any(|e| e.name() == name) {
            return Err(ExtensionError::Duplicate(name));
        }
        let capabilities = Arc::clone(&extension).capabilities();
        debug!(extension = %name, capabilities = capabilities.len(), "extension registered");
        for capability in capabilities {
            self.tables
                .entry(capability.kind())
                .or_default()
                .push((name.clone(), capability));
        }
        self.known.insert(name);
        self.extensions.push(extension);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Apply exclusion then sort rules per capability and freeze the result.
    ///
    /// Fails if a rule names an extension that is neither registered nor a
    /// known extension name.
    pub fn finalize(self) -> ExtensionResult<ExtensionManager> {
        let unknown: BTreeSet<&String> = self
            .config
            .referenced_names()
            .filter(|name| !self.known.contains(*name))
            .collect();
        if !unknown.is_empty() {
            let names: Vec<&str> = unknown.iter().map(|s| s.as_str()).collect();
            return Err(ExtensionError::Configuration(format!(
                "extension manager rules name unknown extensions: {}",
                names.join(", ")
            )));
        }

        let mut manager = ExtensionManager {
            config: self.config,
            extensions: self.extensions,
            ..Default::default()
        };
        for (kind, mut entries) in self.tables {
            if let Some(groups) = manager.config.exclusion.get(&kind) {
                entries = apply_exclusion(kind, entries, groups);
            }
            if let Some(order) = manager.config.sort.get(&kind) {
                apply_sort(&mut entries, order);
            }
            for (name, capability) in entries {
                manager.install(name, capability);
            }
        }
        info!(extensions = manager.extensions.len(), "extension manager finalized");
        Ok(manager)
    }
}

/// Within each group, keep the earliest listed extension that is present.
fn apply_exclusion<T>(
    kind: CapabilityKind,
    entries: Vec<(String, T)>,
    groups: &[Vec<String>],
) -> Vec<(String, T)> {
    let mut dropped = BTreeSet::new();
    for group in groups {
        let present: Vec<&String> = group
            .iter()
            .filter(|name| !dropped.contains(*name) && entries.iter().any(|(n, _)| n == *name))
            .collect();
        if let Some((kept, rest)) = present.split_first() {
            for name in rest {
                debug!(capability = %kind, kept = %kept, excluded = %name, "exclusion applied");
                dropped.insert((*name).clone());
            }
        }
    }
    entries
        .into_iter()
        .filter(|(name, _)| !dropped.contains(name))
        .collect()
}

/// Listed names first in listed order, the rest in registration order.
fn apply_sort<T>(entries: &mut [(String, T)], order: &[String]) {
    let rank = |name: &str| order.iter().position(|n| n == name).unwrap_or(order.len());
    entries.sort_by_key(|(name, _)| rank(name));
}

// ---------------------------------------------------------------------------
// ExtensionManager
// ---------------------------------------------------------------------------

/// Immutable, compiled capability dispatcher.
///
/// Built by [`ExtensionManagerBuilder::finalize`]; every dispatch method
/// walks one precomputed per-capability list.
#[derive(Default)]
pub struct ExtensionManager {
    config: ManagerConfig,
    extensions: Vec<Arc<dyn Extension>>,
    storage_root_path: Vec<Slot<dyn StorageRootPath>>,
    object_content_path: Vec<Slot<dyn ObjectContentPath>>,
    object_state_path: Vec<Slot<dyn ObjectStatePath>>,
    object_extract_path: Vec<Slot<dyn ObjectExtractPath>>,
    content_change: Vec<Slot<dyn ContentChange>>,
    object_change: Vec<Slot<dyn ObjectChange>>,
    fixity_digest: Vec<Slot<dyn FixityDigest>>,
    metadata: Vec<Slot<dyn Metadata>>,
    area: Vec<Slot<dyn Area>>,
    stream: Vec<Slot<dyn Stream>>,
    new_version: Vec<Slot<dyn NewVersion>>,
}

impl ExtensionManager {
    fn install(&mut self, name: String, capability: Capability) {
        match capability {
            Capability::StorageRootPath(c) => self.storage_root_path.push(Slot::new(name, c)),
            Capability::ObjectContentPath(c) => self.object_content_path.push(Slot::new(name, c)),
            Capability::ObjectStatePath(c) => self.object_state_path.push(Slot::new(name, c)),
            Capability::ObjectExtractPath(c) => self.object_extract_path.push(Slot::new(name, c)),
            Capability::ContentChange(c) => self.content_change.push(Slot::new(name, c)),
            Capability::ObjectChange(c) => self.object_change.push(Slot::new(name, c)),
            Capability::FixityDigest(c) => self.fixity_digest.push(Slot::new(name, c)),
            Capability::Metadata(c) => self.metadata.push(Slot::new(name, c)),
            Capability::Area(c) => self.area.push(Slot::new(name, c)),
            Capability::Stream(c) => self.stream.push(Slot::new(name, c)),
            Capability::NewVersion(c) => self.new_version.push(Slot::new(name, c)),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Every registered extension, in registration order.
    pub fn extensions(&self) -> &[Arc<dyn Extension>] {
        &self.extensions
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Extension>> {
        self.extensions.iter().find(|e| e.name() == name)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Names of the active extensions for `kind`, in dispatch order.
    pub fn active(&self, kind: CapabilityKind) -> Vec<&str> {
        fn names<T: ?Sized>(slots: &[Slot<T>]) -> Vec<&str> {
            slots.iter().map(|s| s.name.as_str()).collect()
        }
        match kind {
            CapabilityKind::StorageRootPath => names(&self.storage_root_path),
            CapabilityKind::ObjectContentPath => names(&self.object_content_path),
            CapabilityKind::ObjectStatePath => names(&self.object_state_path),
            CapabilityKind::ObjectExtractPath => names(&self.object_extract_path),
            CapabilityKind::ContentChange => names(&self.content_change),
            CapabilityKind::ObjectChange => names(&self.object_change),
            CapabilityKind::FixityDigest => names(&self.fixity_digest),
            CapabilityKind::Metadata => names(&self.metadata),
            CapabilityKind::Area => names(&self.area),
            CapabilityKind::Stream => names(&self.stream),
            CapabilityKind::NewVersion => names(&self.new_version),
        }
    }

    // -- path chains --------------------------------------------------------

    /// Object id to storage root relative path.
    pub fn build_storage_root_path(&self, id: &str) -> ExtensionResult<String> {
        chain(&self.storage_root_path, id, |ext, path| {
            ext.build_storage_root_path(path)
        })
    }

    /// Logical path to content path inside the version's content directory.
    pub fn build_object_manifest_path(
        &self,
        session: &Session,
        path: &str,
        area: &str,
    ) -> ExtensionResult<String> {
        chain(&self.object_content_path, path, |ext, path| {
            ext.build_object_manifest_path(session, path, area)
        })
    }

    /// Logical path as recorded in the version state.
    pub fn build_object_state_path(
        &self,
        session: &Session,
        path: &str,
        area: &str,
    ) -> ExtensionResult<String> {
        chain(&self.object_state_path, path, |ext, path| {
            ext.build_object_state_path(session, path, area)
        })
    }

    /// Logical path to extraction target; stops at the first failure.
    pub fn build_object_extract_path(
        &self,
        session: &Session,
        path: &str,
        area: &str,
    ) -> ExtensionResult<String> {
        let mut current = path.to_string();
        for slot in &self.object_extract_path {
            let next = slot
                .inner
                .build_object_extract_path(session, &current, area)
                .map_err(|e| ExtensionError::in_extension(&slot.name, e))?;
            if !next.is_empty() {
                current = next;
            }
        }
        Ok(current)
    }

    // -- hooks --------------------------------------------------------------

    pub fn content_change(&self, session: &mut Session, event: &ContentEvent) -> ExtensionResult<()> {
        run_all(&self.content_change, |ext| ext.content_change(session, event))
    }

    pub fn update_object_before(
        &self,
        session: &mut Session,
        inventory: &Inventory,
    ) -> ExtensionResult<()> {
        run_all(&self.object_change, |ext| {
            ext.update_object_before(session, inventory)
        })
    }

    pub fn update_object_after(
        &self,
        session: &mut Session,
        inventory: &Inventory,
    ) -> ExtensionResult<()> {
        run_all(&self.object_change, |ext| {
            ext.update_object_after(session, inventory)
        })
    }

    /// `true` if any extension wants a version even without state changes.
    pub fn needs_new_version(&self, session: &Session, inventory: &Inventory) -> bool {
        self.new_version
            .iter()
            .any(|slot| slot.inner.needs_new_version(session, inventory))
    }

    pub fn do_new_version(&self, session: &mut Session, inventory: &Inventory) -> ExtensionResult<()> {
        run_all(&self.new_version, |ext| ext.do_new_version(session, inventory))
    }

    // -- queries ------------------------------------------------------------

    /// Union of every requested fixity algorithm, sorted and deduplicated.
    pub fn fixity_digests(&self) -> Vec<DigestAlgorithm> {
        self.fixity_digest
            .iter()
            .flat_map(|slot| slot.inner.fixity_digests())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Digest to extension name to metadata value.
    pub fn metadata(
        &self,
        session: &Session,
        inventory: &Inventory,
    ) -> ExtensionResult<BTreeMap<String, BTreeMap<String, Value>>> {
        let mut result: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();
        let mut errors = ErrorList::new();
        for slot in &self.metadata {
            match slot.inner.metadata(session, inventory) {
                Ok(values) => {
                    for (digest, value) in values {
                        result
                            .entry(digest)
                            .or_default()
                            .insert(slot.name.clone(), value);
                    }
                }
                Err(e) => errors.push(ExtensionError::in_extension(&slot.name, e)),
            }
        }
        errors.into_result(ExtensionError::Aggregate)?;
        Ok(result)
    }

    /// Directory of `area`; the first Area extension that knows it wins.
    ///
    /// The `content` area maps to the content root when no extension claims
    /// it.
    pub fn area_path(&self, area: &str) -> ExtensionResult<String> {
        if let Some(path) = self.area.iter().find_map(|slot| slot.inner.area_path(area)) {
            return Ok(path);
        }
        if area.is_empty() || area == CONTENT_AREA {
            return Ok(String::new());
        }
        Err(ExtensionError::UnknownArea(area.to_string()))
    }

    // -- streaming ----------------------------------------------------------

    /// Start one worker per Stream extension for the file `logical_path`.
    ///
    /// Write the file's bytes into the returned sink, then call
    /// [`StreamSink::finish`] to collect the records into the session, or
    /// [`StreamSink::discard`] when the source failed.
    pub fn stream_sink(&self, logical_path: &str, area: &str) -> ExtensionResult<StreamSink> {
        let mut group = FanOutGroup::new();
        for slot in &self.stream {
            let ext = Arc::clone(&slot.inner);
            let path = logical_path.to_string();
            let area = area.to_string();
            group.spawn(slot.name.clone(), move |reader| ext.stream(&path, &area, reader))?;
        }
        Ok(StreamSink {
            group: Some(group),
            logical_path: logical_path.to_string(),
        })
    }

    /// Feed `reader` to every Stream extension; returns the byte count.
    pub fn stream_object(
        &self,
        session: &mut Session,
        logical_path: &str,
        area: &str,
        reader: &mut dyn Read,
    ) -> ExtensionResult<u64> {
        let mut sink = self.stream_sink(logical_path, area)?;
        let mut buf = vec![0u8; STREAM_BUFFER];
        let mut total = 0u64;
        let copied = loop {
            match reader.read(&mut buf) {
                Ok(0) => break Ok(()),
                Ok(n) => {
                    sink.write_all(&buf[..n])?;
                    total += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(e),
            }
        };
        if let Err(e) = copied {
            sink.discard();
            return Err(e.into());
        }
        sink.finish(session)?;
        Ok(total)
    }

    // -- persistence --------------------------------------------------------

    /// Write `<name>/config.json` for every extension, and the manager's
    /// own config when it has rules.
    pub fn write_config(&self, fs: &dyn Filesystem) -> ExtensionResult<()> {
        for extension in &self.extensions {
            let config = extension.config_json()?;
            let path = format!("{}/config.json", extension.name());
            fs.write_file(&path, &serde_json::to_vec_pretty(&config)?)?;
        }
        if !self.config.is_empty() {
            fs.write_file(&format!("{MANAGER_NAME}/config.json"), &self.config.to_json()?)?;
        }
        debug!(extensions = self.extensions.len(), "extension configs written");
        Ok(())
    }

    /// Write `ocfl_layout.json` naming the first active StorageRootPath
    /// extension. Returns `false` when there is none.
    pub fn store_root_layout(&self, fs: &dyn Filesystem) -> ExtensionResult<bool> {
        let Some(slot) = self.storage_root_path.first() else {
            return Ok(false);
        };
        let description = self
            .get(&slot.name)
            .map(|e| e.description().to_string())
            .unwrap_or_default();
        let layout = serde_json::json!({
            "extension": slot.name,
            "description": description,
        });
        fs.write_file(LAYOUT_FILE, &serde_json::to_vec_pretty(&layout)?)?;
        Ok(true)
    }
}

impl std::fmt::Debug for ExtensionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.extensions.iter().map(|e| e.name()).collect();
        f.debug_struct("ExtensionManager")
            .field("extensions", &names)
            .field("config", &self.config)
            .finish()
    }
}

/// Thread each slot's output into the next; errors are collected and the
/// chain continues with the unchanged value.
fn chain<T: ?Sized>(
    slots: &[Slot<T>],
    start: &str,
    step: impl Fn(&T, &str) -> ExtensionResult<String>,
) -> ExtensionResult<String> {
    let mut current = start.to_string();
    let mut errors = ErrorList::new();
    for slot in slots {
        match step(&*slot.inner, &current) {
            Ok(next) if next.is_empty() => {}
            Ok(next) => current = next,
            Err(e) => errors.push(ExtensionError::in_extension(&slot.name, e)),
        }
    }
    errors.into_result(ExtensionError::Aggregate)?;
    Ok(current)
}

fn run_all<T: ?Sized>(
    slots: &[Slot<T>],
    mut hook: impl FnMut(&T) -> ExtensionResult<()>,
) -> ExtensionResult<()> {
    let mut errors = ErrorList::new();
    for slot in slots {
        if let Err(e) = hook(&*slot.inner) {
            errors.push(ExtensionError::in_extension(&slot.name, e));
        }
    }
    errors.into_result(ExtensionError::Aggregate)
}

// ---------------------------------------------------------------------------
// StreamSink
// ---------------------------------------------------------------------------

type StreamOutcome = ExtensionResult<Option<Value>>;

/// Writer end of the Stream fan-out for one file.
///
/// Consumers that stop reading early are simply skipped; their results are
/// still collected by [`Self::finish`].
pub struct StreamSink {
    group: Option<FanOutGroup<StreamOutcome>>,
    logical_path: String,
}

impl StreamSink {
    /// Number of stream consumers.
    pub fn len(&self) -> usize {
        self.group.as_ref().map_or(0, |g| g.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close the pipes, join the workers and combine their errors. The
    /// records reach `session` only when every consumer succeeded.
    pub fn finish(mut self, session: &mut Session) -> ExtensionResult<()> {
        let Some(group) = self.group.take() else {
            return Ok(());
        };
        let mut records = Vec::new();
        let mut errors = ErrorList::new();
        for outcome in group.finish() {
            match outcome.result {
                Ok(Ok(Some(value))) => records.push((outcome.label, value)),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => errors.push(ExtensionError::in_extension(outcome.label, e)),
                Err(message) => errors.push(ExtensionError::Stream {
                    name: outcome.label,
                    message,
                }),
            }
        }
        errors.into_result(ExtensionError::Aggregate)?;
        for (name, value) in records {
            session.record(&name, self.logical_path.clone(), value);
        }
        Ok(())
    }

    /// Close the pipes and join the workers, dropping whatever they
    /// measured. Used when the source failed partway.
    pub fn discard(mut self) {
        let Some(group) = self.group.take() else {
            return;
        };
        let joined = group.finish().len();
        debug!(path = %self.logical_path, consumers = joined, "stream results discarded");
    }
}

impl Write for StreamSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(group) = self.group.as_mut() {
            for label in group.send(buf) {
                debug!(extension = %label, path = %self.logical_path, "stream consumer stopped early");
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
