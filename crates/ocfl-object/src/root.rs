use std::sync::Arc;

use ocfl_extension::{
    CapabilityKind, Extension, ExtensionFactory, ExtensionManager, ExtensionManagerBuilder,
};
use ocfl_fs::{normalize_path, sub_fs, Filesystem};
use ocfl_inventory::ValidationReport;
use tracing::{debug, info};

use crate::config::ObjectConfig;
use crate::error::{ObjectError, ObjectResult};
use crate::session::{namaste_body, ObjectSession};
use crate::validate::validate_object;
use crate::version::VersionInfo;
use crate::{EXTENSIONS_DIR, OBJECT_NAMASTE, ROOT_NAMASTE};

/// An OCFL storage root: objects placed by the root's layout extensions.
pub struct StorageRoot {
    fs: Arc<dyn Filesystem>,
    factory: ExtensionFactory,
    manager: ExtensionManager,
    config: ObjectConfig,
}

impl StorageRoot {
    /// Initialize an empty storage root with `root_extensions`.
    pub fn init(
        fs: Arc<dyn Filesystem>,
        root_extensions: Vec<Arc<dyn Extension>>,
        config: ObjectConfig,
    ) -> ObjectResult<Self> {
        let mut builder = ExtensionManagerBuilder::new();
        for extension in root_extensions {
            builder.add(extension)?;
        }
        Self::init_with(fs, builder, config)
    }

    /// Like [`Self::init`], with exclusion and sort rules already set on
    /// `builder`.
    pub fn init_with(
        fs: Arc<dyn Filesystem>,
        builder: ExtensionManagerBuilder,
        config: ObjectConfig,
    ) -> ObjectResult<Self> {
        config.check()?;
        if fs.exists(ROOT_NAMASTE)? {
            return Err(ObjectError::RootExists);
        }
        let manager = builder.finalize()?;
        fs.write_file(ROOT_NAMASTE, namaste_body(ROOT_NAMASTE).as_bytes())?;
        let extensions = sub_fs(&fs, EXTENSIONS_DIR)?;
        manager.write_config(extensions.as_ref())?;
        let layout = manager.store_root_layout(fs.as_ref())?;
        info!(extensions = manager.len(), layout, "storage root initialized");
        Ok(Self {
            fs,
            factory: ExtensionFactory::with_builtins(),
            manager,
            config,
        })
    }

    /// Open an existing storage root, loading its extensions with `factory`.
    pub fn open(
        fs: Arc<dyn Filesystem>,
        factory: ExtensionFactory,
        config: ObjectConfig,
    ) -> ObjectResult<Self> {
        config.check()?;
        if !fs.exists(ROOT_NAMASTE)? {
            return Err(ObjectError::NotStorageRoot(ROOT_NAMASTE.to_string()));
        }
        let extensions = sub_fs(&fs, EXTENSIONS_DIR)?;
        let manager = factory.builder(&extensions)?.finalize()?;
        info!(extensions = manager.len(), "storage root opened");
        Ok(Self {
            fs,
            factory,
            manager,
            config,
        })
    }

    /// Use `factory` for the extensions of objects below this root.
    pub fn with_factory(mut self, factory: ExtensionFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn manager(&self) -> &ExtensionManager {
        &self.manager
    }

    pub fn config(&self) -> &ObjectConfig {
        &self.config
    }

    /// Directory of object `id`, relative to the storage root.
    pub fn object_path(&self, id: &str) -> ObjectResult<String> {
        if self.manager.active(CapabilityKind::StorageRootPath).is_empty() {
            return Err(ObjectError::Configuration(
                "storage root has no layout extension".into(),
            ));
        }
        let path = normalize_path(&self.manager.build_storage_root_path(id)?)?;
        if path.is_empty() {
            return Err(ObjectError::Configuration(format!(
                "layout maps {id:?} to the storage root itself"
            )));
        }
        debug!(id, path = %path, "object path resolved");
        Ok(path)
    }

    fn object_fs(&self, id: &str) -> ObjectResult<Arc<dyn Filesystem>> {
        Ok(sub_fs(&self.fs, &self.object_path(id)?)?)
    }

    pub fn object_exists(&self, id: &str) -> ObjectResult<bool> {
        Ok(self.object_fs(id)?.exists(OBJECT_NAMASTE)?)
    }

    /// Start the first version of a new object.
    pub fn create_object(&self, id: &str, info: &VersionInfo) -> ObjectResult<ObjectSession> {
        ObjectSession::create(self.object_fs(id)?, id, &self.factory, &self.config, info)
    }

    /// Start the next version of an existing object.
    pub fn update_object(&self, id: &str, info: &VersionInfo) -> ObjectResult<ObjectSession> {
        ObjectSession::update(self.object_fs(id)?, id, &self.factory, &self.config, info)
    }

    pub fn validate_object(&self, id: &str) -> ObjectResult<ValidationReport> {
        validate_object(self.object_fs(id)?.as_ref())
    }
}

impl std::fmt::Debug for StorageRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageRoot")
            .field("manager", &self.manager)
            .field("factory", &self.factory)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocfl_extension::{ContentStats, LAYOUT_FILE};
    use ocfl_fs::{LocalFs, MemoryFs};
    use ocfl_layout::{FlatDirect, HashedNTuple};
    use serde_json::json;

    use ocfl_extension::LayoutExtension;

    fn hashed_root(mem: &MemoryFs) -> StorageRoot {
        StorageRoot::init(
            Arc::new(mem.clone()),
            vec![Arc::new(LayoutExtension::new(HashedNTuple::default()))],
            ObjectConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn init_writes_root_documents() {
        let mem = MemoryFs::new();
        hashed_root(&mem);
        assert_eq!(mem.read_to_vec(ROOT_NAMASTE).unwrap(), b"ocfl_1.1\n");
        assert!(mem
            .exists("extensions/0004-hashed-n-tuple-storage-layout/config.json")
            .unwrap());
        let layout: serde_json::Value =
            serde_json::from_slice(&mem.read_to_vec(LAYOUT_FILE).unwrap()).unwrap();
        assert_eq!(layout["extension"], HashedNTuple::NAME);

        let again = StorageRoot::init(Arc::new(mem.clone()), vec![], ObjectConfig::default());
        assert!(matches!(again, Err(ObjectError::RootExists)));
    }

    #[test]
    fn objects_are_placed_by_the_layout() {
        let mem = MemoryFs::new();
        let root = hashed_root(&mem);
        let path = root.object_path("object-01").unwrap();
        assert!(path.starts_with("3c0/ff4/240/"));

        let mut object = root.create_object("object-01", &VersionInfo::new("ingest")).unwrap();
        object.add_file("hello.txt", "", &mut &b"hi"[..]).unwrap();
        object.commit().unwrap();
        assert!(root.object_exists("object-01").unwrap());
        assert!(!root.object_exists("object-02").unwrap());
        assert!(mem
            .exists(&format!("{path}/v1/content/hello.txt"))
            .unwrap());
        assert!(root.validate_object("object-01").unwrap().is_valid());
    }

    #[test]
    fn reopened_root_resolves_same_paths() {
        let mem = MemoryFs::new();
        let path = hashed_root(&mem).object_path("x").unwrap();
        let root = StorageRoot::open(
            Arc::new(mem.clone()),
            ExtensionFactory::with_builtins(),
            ObjectConfig::default(),
        )
        .unwrap();
        assert_eq!(root.object_path("x").unwrap(), path);
    }

    #[test]
    fn open_requires_declaration() {
        let err = StorageRoot::open(
            Arc::new(MemoryFs::new()),
            ExtensionFactory::with_builtins(),
            ObjectConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ObjectError::NotStorageRoot(_)));
    }

    #[test]
    fn root_without_layout_cannot_place_objects() {
        let mem = MemoryFs::new();
        let root =
            StorageRoot::init(Arc::new(mem.clone()), vec![], ObjectConfig::default()).unwrap();
        assert!(!mem.exists(LAYOUT_FILE).unwrap());
        assert!(matches!(
            root.object_path("obj"),
            Err(ObjectError::Configuration(_))
        ));
    }

    #[test]
    fn object_lifecycle_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let fs: Arc<dyn Filesystem> = Arc::new(LocalFs::new(dir.path()).unwrap());
        let config = ObjectConfig::default()
            .with_extension(json!({"extensionName": ContentStats::NAME}));
        let root = StorageRoot::init(
            fs.clone(),
            vec![Arc::new(LayoutExtension::new(FlatDirect::new()))],
            config,
        )
        .unwrap();

        let mut object = root
            .create_object("book", &VersionInfo::new("scan").with_user("Bob", ""))
            .unwrap();
        object.add_file("p1.txt", "", &mut &b"page one\n"[..]).unwrap();
        object.add_file("p2.txt", "", &mut &b"page two\n"[..]).unwrap();
        assert_eq!(object.commit().unwrap().unwrap().to_string(), "v1");

        let mut object = root.update_object("book", &VersionInfo::new("fix")).unwrap();
        object.delete_file("p2.txt", "").unwrap();
        object.add_file("p2.txt", "", &mut &b"page 2\n"[..]).unwrap();
        assert_eq!(object.commit().unwrap().unwrap().to_string(), "v2");

        assert!(dir.path().join("book/v2/content/p2.txt").is_file());
        assert!(dir
            .path()
            .join("book/extensions/NNNN-content-stats/v2/stats.json")
            .is_file());
        let report = root.validate_object("book").unwrap();
        assert!(report.is_valid(), "{report}");
    }
}
