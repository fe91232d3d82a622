use std::collections::BTreeMap;
use std::io::{self, Read};
use std::sync::Arc;

use ocfl_checksum::{ChecksumError, ChecksumWriter};
use ocfl_extension::{
    ContentEvent, ExtensionFactory, ExtensionManager, ExtensionManagerBuilder, Session,
};
use ocfl_fs::{join_path, sub_fs, Filesystem};
use ocfl_inventory::{AddOutcome, Inventory, InventoryError, VersionState, INVENTORY_FILE};
use ocfl_types::{DigestAlgorithm, VersionNumber};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ObjectConfig;
use crate::error::{ObjectError, ObjectResult};
use crate::version::VersionInfo;
use crate::{EXTENSIONS_DIR, OBJECT_NAMASTE};

/// One update of one object: a new version opened on creation, written by
/// [`Self::commit`].
///
/// Content is staged directly into the new version directory. Dropping a
/// session without committing leaves staged files behind but never touches
/// the root inventory.
pub struct ObjectSession {
    fs: Arc<dyn Filesystem>,
    manager: Arc<ExtensionManager>,
    inventory: Inventory,
    session: Session,
    algorithms: Vec<DigestAlgorithm>,
    previous_state: Option<VersionState>,
    created: bool,
}

impl ObjectSession {
    /// Start a new object in the empty directory `fs`.
    ///
    /// The object's extensions are built from `config.extensions` and bound
    /// below `extensions/`.
    pub fn create(
        fs: Arc<dyn Filesystem>,
        id: &str,
        factory: &ExtensionFactory,
        config: &ObjectConfig,
        info: &VersionInfo,
    ) -> ObjectResult<Self> {
        config.check()?;
        if fs.exists(OBJECT_NAMASTE)? {
            return Err(ObjectError::ObjectExists(id.to_string()));
        }
        let extensions = sub_fs(&fs, EXTENSIONS_DIR)?;
        let mut builder =
            ExtensionManagerBuilder::new().with_config(config.extension_manager.clone());
        for name in factory.names() {
            builder.allow_name(name);
        }
        for extension_config in &config.extensions {
            let data = serde_json::to_vec(extension_config)?;
            builder.add(factory.create(&data, &extensions)?)?;
        }
        let manager = Arc::new(builder.finalize()?);

        let inventory = Inventory::new(id, config.digest_algorithm, &config.content_directory)?
            .with_version_padding(config.version_padding);
        Self::open_version(fs, manager, inventory, config, info, true)
    }

    /// Start a new version of the object stored in `fs`.
    pub fn update(
        fs: Arc<dyn Filesystem>,
        id: &str,
        factory: &ExtensionFactory,
        config: &ObjectConfig,
        info: &VersionInfo,
    ) -> ObjectResult<Self> {
        if !fs.exists(OBJECT_NAMASTE)? {
            return Err(ObjectError::ObjectNotFound(id.to_string()));
        }
        let inventory = read_inventory(fs.as_ref(), "")?;
        if inventory.id() != id {
            return Err(ObjectError::IdMismatch {
                expected: id.to_string(),
                found: inventory.id().to_string(),
            });
        }
        let extensions = sub_fs(&fs, EXTENSIONS_DIR)?;
        let manager = Arc::new(factory.builder(&extensions)?.finalize()?);
        Self::open_version(fs, manager, inventory, config, info, false)
    }

    fn open_version(
        fs: Arc<dyn Filesystem>,
        manager: Arc<ExtensionManager>,
        mut inventory: Inventory,
        config: &ObjectConfig,
        info: &VersionInfo,
        created: bool,
    ) -> ObjectResult<Self> {
        let previous_state = inventory.head_state().cloned();
        let version =
            inventory.new_version(&info.message, &info.user_name, &info.user_address)?;

        let mut algorithms = vec![inventory.digest_algorithm()];
        for algorithm in config
            .fixity_algorithms
            .iter()
            .copied()
            .chain(manager.fixity_digests())
        {
            if !algorithms.contains(&algorithm) {
                algorithms.push(algorithm);
            }
        }

        let mut session = Session::new(inventory.id());
        session.set_version(version);
        manager.do_new_version(&mut session, &inventory)?;
        info!(id = %inventory.id(), version = %version, created, "object session opened");
        Ok(Self {
            fs,
            manager,
            inventory,
            session,
            algorithms,
            previous_state,
            created,
        })
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn id(&self) -> &str {
        self.inventory.id()
    }

    /// The version this session writes.
    pub fn version(&self) -> Option<VersionNumber> {
        self.inventory.head()
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn manager(&self) -> &ExtensionManager {
        &self.manager
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Every digest computed for added content.
    pub fn digest_algorithms(&self) -> &[DigestAlgorithm] {
        &self.algorithms
    }

    /// Digest to extension name to metadata value.
    pub fn metadata(&self) -> ObjectResult<BTreeMap<String, BTreeMap<String, Value>>> {
        Ok(self.manager.metadata(&self.session, &self.inventory)?)
    }

    // ---------------------------------------------------------------
    // Content operations
    // ---------------------------------------------------------------

    /// Store the bytes of `reader` as `logical_path` in `area`.
    ///
    /// The bytes are read once: they are digested, written to the content
    /// file and fed to every Stream extension in the same pass. Content
    /// already in the manifest is not kept twice.
    pub fn add_file(
        &mut self,
        logical_path: &str,
        area: &str,
        reader: &mut dyn Read,
    ) -> ObjectResult<AddOutcome> {
        self.manager.area_path(area)?;
        let state_path = self
            .manager
            .build_object_state_path(&self.session, logical_path, area)?;
        let content_path = self
            .manager
            .build_object_manifest_path(&self.session, logical_path, area)?;
        let manifest_path = join_path(&self.inventory.content_prefix()?, &content_path);
        if let Some(digest) = self.inventory.manifest().digest_for(&manifest_path) {
            return Err(InventoryError::PathConflict {
                path: manifest_path,
                existing: format!("content of {digest}"),
            }
            .into());
        }

        let storage = self.fs.create(&manifest_path)?;
        let mut sink = self.manager.stream_sink(&state_path, area)?;
        let digests = {
            let mut writer = ChecksumWriter::new(&self.algorithms, vec![storage, Box::new(&mut sink)])?;
            match io::copy(reader, &mut writer) {
                Ok(_) => writer.into_checksums(),
                Err(e) => Err(ChecksumError::Io(e)),
            }
        };
        let digests = match digests {
            Ok(digests) => digests,
            Err(e) => {
                sink.discard();
                self.discard(&manifest_path);
                return Err(e.into());
            }
        };
        if let Err(e) = sink.finish(&mut self.session) {
            self.discard(&manifest_path);
            return Err(e.into());
        }

        let outcome = match self
            .inventory
            .add_file(&[state_path.as_str()], &manifest_path, &digests)
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.discard(&manifest_path);
                return Err(e.into());
            }
        };
        if outcome.deduplicated {
            self.fs.delete(&manifest_path)?;
        }
        self.remove_orphans(&outcome.orphaned)?;
        self.manager.content_change(
            &mut self.session,
            &ContentEvent::Added {
                path: state_path,
                digest: outcome.digest.clone(),
            },
        )?;
        Ok(outcome)
    }

    /// Remove `logical_path` from the new version.
    pub fn delete_file(&mut self, logical_path: &str, area: &str) -> ObjectResult<()> {
        let path = self
            .manager
            .build_object_state_path(&self.session, logical_path, area)?;
        let orphaned = self.inventory.delete_file(&path)?;
        self.remove_orphans(&orphaned)?;
        self.manager
            .content_change(&mut self.session, &ContentEvent::Deleted { path })?;
        Ok(())
    }

    pub fn rename_file(&mut self, source: &str, destination: &str, area: &str) -> ObjectResult<()> {
        let from = self
            .manager
            .build_object_state_path(&self.session, source, area)?;
        let to = self
            .manager
            .build_object_state_path(&self.session, destination, area)?;
        self.inventory.rename_file(&from, &to)?;
        self.manager
            .content_change(&mut self.session, &ContentEvent::Renamed { from, to })?;
        Ok(())
    }

    /// Make `destination` a second logical path of the content of `source`.
    pub fn copy_file(&mut self, source: &str, destination: &str, area: &str) -> ObjectResult<()> {
        let from = self
            .manager
            .build_object_state_path(&self.session, source, area)?;
        let path = self
            .manager
            .build_object_state_path(&self.session, destination, area)?;
        let digest = self
            .inventory
            .digest_for(&from)
            .ok_or_else(|| InventoryError::PathNotFound(from.clone()))?
            .to_string();
        let orphaned = self.inventory.copy_file(&path, &digest)?;
        self.remove_orphans(&orphaned)?;
        self.manager
            .content_change(&mut self.session, &ContentEvent::Copied { path, digest })?;
        Ok(())
    }

    fn remove_orphans(&self, paths: &[String]) -> ObjectResult<()> {
        for path in paths {
            debug!(id = %self.inventory.id(), path = %path, "removing orphaned content");
            self.fs.delete(path)?;
        }
        Ok(())
    }

    /// Best-effort removal of a staged file after a failed add.
    fn discard(&self, path: &str) {
        if let Err(e) = self.fs.delete(path) {
            warn!(id = %self.inventory.id(), path, error = %e, "staged file not removed");
        }
    }

    // ---------------------------------------------------------------
    // Commit
    // ---------------------------------------------------------------

    /// Write the new version.
    ///
    /// Returns `None`, writing nothing, when an existing object's state is
    /// unchanged and no extension asks for a new version anyway.
    pub fn commit(mut self) -> ObjectResult<Option<VersionNumber>> {
        let unchanged = !self.created && self.previous_state.as_ref() == self.inventory.head_state();
        if unchanged && !self.manager.needs_new_version(&self.session, &self.inventory) {
            info!(id = %self.inventory.id(), "state unchanged, no version written");
            return Ok(None);
        }

        self.manager
            .update_object_before(&mut self.session, &self.inventory)?;
        self.inventory.finalize(false)?;
        let head = self.inventory.head().ok_or(InventoryError::NoHead)?;

        if self.created {
            self.fs
                .write_file(OBJECT_NAMASTE, namaste_body(OBJECT_NAMASTE).as_bytes())?;
            let extensions = sub_fs(&self.fs, EXTENSIONS_DIR)?;
            self.manager.write_config(extensions.as_ref())?;
        }

        let json = self.inventory.to_json()?;
        let sidecar = self.inventory.sidecar(&json);
        let sidecar_name = self.inventory.sidecar_name();
        for dir in [head.to_string(), String::new()] {
            self.fs.write_file(&join_path(&dir, INVENTORY_FILE), &json)?;
            self.fs
                .write_file(&join_path(&dir, &sidecar_name), sidecar.as_bytes())?;
        }

        self.manager
            .update_object_after(&mut self.session, &self.inventory)?;
        info!(
            id = %self.inventory.id(),
            version = %head,
            files = self.inventory.head_state().map_or(0, |s| s.all_paths().len()),
            "version committed"
        );
        Ok(Some(head))
    }
}

impl std::fmt::Debug for ObjectSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectSession")
            .field("id", &self.inventory.id())
            .field("version", &self.inventory.head().map(|v| v.to_string()))
            .field("created", &self.created)
            .finish()
    }
}

/// Body of a namaste file: its name after `0=`, newline terminated.
pub(crate) fn namaste_body(name: &str) -> String {
    format!("{}\n", name.trim_start_matches("0="))
}

/// Read and verify `<dir>/inventory.json` against its sidecar.
pub(crate) fn read_inventory(fs: &dyn Filesystem, dir: &str) -> ObjectResult<Inventory> {
    let json = fs.read_to_vec(&join_path(dir, INVENTORY_FILE))?;
    let inventory = Inventory::from_json(&json)?;
    let sidecar = fs.read_to_vec(&join_path(dir, &inventory.sidecar_name()))?;
    inventory.verify_sidecar(&json, &String::from_utf8_lossy(&sidecar))?;
    Ok(inventory)
}
