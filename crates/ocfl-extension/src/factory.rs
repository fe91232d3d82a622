use std::collections::BTreeMap;
use std::sync::Arc;

use ocfl_fs::{sub_fs, Filesystem};
use ocfl_types::ErrorList;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::capability::Extension;
use crate::config::{ManagerConfig, MANAGER_NAME};
use crate::error::{ExtensionError, ExtensionResult};
use crate::extensions::{
    ContentStats, ContentSubpath, DigestAlgorithms, LayoutExtension, BUILTIN_NAMES,
};
use crate::manager::ExtensionManagerBuilder;

/// Name of each extension's persisted configuration.
pub const CONFIG_FILE: &str = "config.json";

/// Builds an extension from its `config.json` and its own directory.
pub type Constructor = fn(&[u8], Arc<dyn Filesystem>) -> ExtensionResult<Arc<dyn Extension>>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NameOnly {
    extension_name: String,
}

/// The `extensionName` of a config document.
pub fn extension_name(config: &[u8]) -> ExtensionResult<String> {
    let NameOnly { extension_name } = serde_json::from_slice(config)?;
    Ok(extension_name)
}

/// Registry of extension constructors keyed by extension name.
#[derive(Clone, Default)]
pub struct ExtensionFactory {
    constructors: BTreeMap<String, Constructor>,
}

impl ExtensionFactory {
    /// A factory that knows nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory for every built-in extension.
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.register(DigestAlgorithms::NAME, |config, _| {
            Ok(Arc::new(DigestAlgorithms::from_json(config)?))
        });
        for name in BUILTIN_NAMES.iter().filter(|n| LayoutExtension::handles(n)) {
            factory.register(*name, |config, _| {
                let name = extension_name(config)?;
                Ok(Arc::new(LayoutExtension::from_json(&name, config)?))
            });
        }
        factory.register(ContentSubpath::NAME, |config, _| {
            Ok(Arc::new(ContentSubpath::from_json(config)?))
        });
        factory.register(ContentStats::NAME, |config, fs| {
            Ok(Arc::new(ContentStats::from_json(config, fs)?))
        });
        factory
    }

    /// Add or replace the constructor for `name`.
    pub fn register(&mut self, name: impl Into<String>, constructor: Constructor) {
        self.constructors.insert(name.into(), constructor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Every registered name, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Build the extension described by `config`, bound to
    /// `<extensions>/<name>`.
    pub fn create(
        &self,
        config: &[u8],
        extensions: &Arc<dyn Filesystem>,
    ) -> ExtensionResult<Arc<dyn Extension>> {
        let name = extension_name(config)?;
        let constructor = self
            .constructors
            .get(&name)
            .ok_or_else(|| ExtensionError::UnknownExtension(name.clone()))?;
        let fs = sub_fs(extensions, &name)?;
        constructor(config, fs)
    }

    /// Load every extension found below `extensions`, plus the manager
    /// config if one was persisted.
    ///
    /// A directory without `config.json` is skipped. Every failure is
    /// collected before returning.
    pub fn load_all(
        &self,
        extensions: &Arc<dyn Filesystem>,
    ) -> ExtensionResult<(Vec<Arc<dyn Extension>>, ManagerConfig)> {
        let mut loaded = Vec::new();
        let mut manager = ManagerConfig::default();
        if !extensions.exists("")? {
            return Ok((loaded, manager));
        }

        let mut errors = ErrorList::<ExtensionError>::new();
        for entry in extensions.read_dir("")? {
            if !entry.is_dir {
                continue;
            }
            let path = format!("{}/{CONFIG_FILE}", entry.name);
            if !extensions.exists(&path)? {
                warn!(extension = %entry.name, "extension directory without config, skipped");
                continue;
            }
            let data = match extensions.read_to_vec(&path) {
                Ok(data) => data,
                Err(e) => {
                    errors.push(e.into());
                    continue;
                }
            };
            if entry.name == MANAGER_NAME {
                if let Some(config) = errors.collect(ManagerConfig::from_json(&data)) {
                    manager = config;
                }
                continue;
            }
            let result = extension_name(&data).and_then(|name| {
                if name != entry.name {
                    return Err(ExtensionError::Configuration(format!(
                        "directory {} holds the config of {name}",
                        entry.name
                    )));
                }
                self.create(&data, extensions)
            });
            match result {
                Ok(extension) => loaded.push(extension),
                Err(e) => errors.push(ExtensionError::in_extension(entry.name, e)),
            }
        }
        errors.into_result(ExtensionError::Aggregate)?;
        debug!(count = loaded.len(), "extensions loaded");
        Ok((loaded, manager))
    }

    /// Load every extension below `extensions` into a builder that accepts
    /// this factory's names in its rules.
    pub fn builder(&self, extensions: &Arc<dyn Filesystem>) -> ExtensionResult<ExtensionManagerBuilder> {
        let (loaded, config) = self.load_all(extensions)?;
        let mut builder = ExtensionManagerBuilder::new().with_config(config);
        for name in self.names() {
            builder.allow_name(name);
        }
        for extension in loaded {
            builder.add(extension)?;
        }
        Ok(builder)
    }
}

impl std::fmt::Debug for ExtensionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionFactory")
            .field("names", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocfl_fs::MemoryFs;
    use ocfl_layout::HashedNTuple;

    fn extensions_dir() -> (MemoryFs, Arc<dyn Filesystem>) {
        let mem = MemoryFs::new();
        let root: Arc<dyn Filesystem> = Arc::new(mem.clone());
        let dir = sub_fs(&root, "extensions").unwrap();
        (mem, dir)
    }

    #[test]
    fn builtins_are_registered() {
        let factory = ExtensionFactory::with_builtins();
        for name in BUILTIN_NAMES {
            assert!(factory.contains(name), "{name}");
        }
        assert_eq!(factory.names().count(), BUILTIN_NAMES.len());
    }

    #[test]
    fn create_binds_extension_directory() {
        let (mem, dir) = extensions_dir();
        let factory = ExtensionFactory::with_builtins();
        let ext = factory
            .create(br#"{"extensionName": "NNNN-content-stats"}"#, &dir)
            .unwrap();
        assert_eq!(ext.name(), ContentStats::NAME);
        assert!(mem.is_empty());
    }

    #[test]
    fn unknown_name_is_reported() {
        let (_, dir) = extensions_dir();
        let err = ExtensionFactory::with_builtins()
            .create(br#"{"extensionName": "NNNN-unheard-of"}"#, &dir)
            .err()
            .unwrap();
        assert!(matches!(err, ExtensionError::UnknownExtension(_)));
        assert!(extension_name(b"{}").is_err());
    }

    #[test]
    fn load_all_reads_configs_and_manager() {
        let (mem, dir) = extensions_dir();
        mem.write_file(
            "extensions/0004-hashed-n-tuple-storage-layout/config.json",
            br#"{"extensionName": "0004-hashed-n-tuple-storage-layout", "tupleSize": 2}"#,
        )
        .unwrap();
        mem.write_file(
            "extensions/NNNN-extension-manager/config.json",
            br#"{"extensionName": "NNNN-extension-manager", "sort": {"StorageRootPath": ["0004-hashed-n-tuple-storage-layout"]}}"#,
        )
        .unwrap();
        mem.write_file("extensions/notes/readme.txt", b"no config here").unwrap();

        let factory = ExtensionFactory::with_builtins();
        let (loaded, config) = factory.load_all(&dir).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name(), HashedNTuple::NAME);
        assert_eq!(loaded[0].config_json().unwrap()["tupleSize"], 2);
        assert!(!config.is_empty());
    }

    #[test]
    fn load_all_of_missing_directory_is_empty() {
        let (_, dir) = extensions_dir();
        let (loaded, config) = ExtensionFactory::with_builtins().load_all(&dir).unwrap();
        assert!(loaded.is_empty());
        assert!(config.is_empty());
    }

    #[test]
    fn load_all_collects_every_failure() {
        let (mem, dir) = extensions_dir();
        mem.write_file("extensions/a/config.json", br#"{"extensionName": "NNNN-unheard-of"}"#)
            .unwrap();
        mem.write_file(
            "extensions/b/config.json",
            br#"{"extensionName": "NNNN-content-stats"}"#,
        )
        .unwrap();
        let err = ExtensionFactory::with_builtins().load_all(&dir).err().unwrap();
        match err {
            ExtensionError::Aggregate(list) => assert_eq!(list.len(), 2),
            other => panic!("expected aggregate, got {other}"),
        }
    }
}
