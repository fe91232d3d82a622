use std::sync::Arc;

use ocfl_layout::{
    DirectClean, FlatDirect, FlatOmitPrefix, HashAndIdNTuple, HashedNTuple, NTupleOmitPrefix,
    PairTree, StorageLayout,
};

use crate::capability::{Capability, Extension, ObjectContentPath, StorageRootPath};
use crate::error::{ExtensionError, ExtensionResult};
use crate::session::Session;

/// Exposes a [`StorageLayout`] as an extension.
///
/// Every layout maps storage root paths. `NNNN-direct-clean-path-layout`
/// additionally cleans content paths inside objects.
#[derive(Debug)]
pub struct LayoutExtension {
    layout: Box<dyn StorageLayout>,
    manifest_paths: bool,
}

impl LayoutExtension {
    pub fn new(layout: impl StorageLayout + 'static) -> Self {
        let manifest_paths = layout.name() == DirectClean::NAME;
        Self {
            layout: Box::new(layout),
            manifest_paths,
        }
    }

    /// Whether `name` is one of the wrapped layouts.
    pub fn handles(name: &str) -> bool {
        [
            FlatDirect::NAME,
            HashAndIdNTuple::NAME,
            HashedNTuple::NAME,
            FlatOmitPrefix::NAME,
            NTupleOmitPrefix::NAME,
            PairTree::NAME,
            DirectClean::NAME,
        ]
        .contains(&name)
    }

    /// Build the layout named `name` from its `config.json`.
    pub fn from_json(name: &str, data: &[u8]) -> ExtensionResult<Self> {
        let extension = match name {
            FlatDirect::NAME => Self::new(FlatDirect::from_json(data)?),
            HashAndIdNTuple::NAME => Self::new(HashAndIdNTuple::from_json(data)?),
            HashedNTuple::NAME => Self::new(HashedNTuple::from_json(data)?),
            FlatOmitPrefix::NAME => Self::new(FlatOmitPrefix::from_json(data)?),
            NTupleOmitPrefix::NAME => Self::new(NTupleOmitPrefix::from_json(data)?),
            PairTree::NAME => Self::new(PairTree::from_json(data)?),
            DirectClean::NAME => Self::new(DirectClean::from_json(data)?),
            other => return Err(ExtensionError::UnknownExtension(other.to_string())),
        };
        Ok(extension)
    }

    pub fn layout(&self) -> &dyn StorageLayout {
        self.layout.as_ref()
    }
}

impl Extension for LayoutExtension {
    fn name(&self) -> &str {
        self.layout.name()
    }

    fn description(&self) -> &str {
        self.layout.description()
    }

    fn config_json(&self) -> ExtensionResult<serde_json::Value> {
        Ok(self.layout.config_json()?)
    }

    fn capabilities(self: Arc<Self>) -> Vec<Capability> {
        let mut capabilities = vec![Capability::StorageRootPath(self.clone())];
        if self.manifest_paths {
            capabilities.push(Capability::ObjectContentPath(self));
        }
        capabilities
    }
}

impl StorageRootPath for LayoutExtension {
    fn build_storage_root_path(&self, id: &str) -> ExtensionResult<String> {
        Ok(self.layout.build_storage_root_path(id)?)
    }
}

impl ObjectContentPath for LayoutExtension {
    fn build_object_manifest_path(
        &self,
        _session: &Session,
        path: &str,
        area: &str,
    ) -> ExtensionResult<String> {
        Ok(self.layout.build_object_manifest_path(path, area)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityKind;

    #[test]
    fn wraps_hashed_ntuple() {
        let ext = Arc::new(LayoutExtension::new(HashedNTuple::default()));
        assert_eq!(ext.name(), HashedNTuple::NAME);
        let path = ext.build_storage_root_path("object-01").unwrap();
        assert!(path.starts_with("3c0/ff4/240/"));
        let kinds: Vec<_> = ext.capabilities().iter().map(Capability::kind).collect();
        assert_eq!(kinds, vec![CapabilityKind::StorageRootPath]);
    }

    #[test]
    fn direct_clean_also_maps_content_paths() {
        let data = br#"{"extensionName": "NNNN-direct-clean-path-layout"}"#;
        let ext = Arc::new(LayoutExtension::from_json(DirectClean::NAME, data).unwrap());
        let session = Session::new("obj");
        assert_eq!(
            ext.build_object_manifest_path(&session, "a/b?.txt", "content")
                .unwrap(),
            ext.layout().build_object_manifest_path("a/b?.txt", "content").unwrap()
        );
        let kinds: Vec<_> = ext.capabilities().iter().map(Capability::kind).collect();
        assert_eq!(
            kinds,
            vec![CapabilityKind::StorageRootPath, CapabilityKind::ObjectContentPath]
        );
    }

    #[test]
    fn from_json_dispatches_on_name() {
        let data = br#"{"extensionName": "0006-flat-omit-prefix-storage-layout", "delimiter": ":"}"#;
        let ext = LayoutExtension::from_json(FlatOmitPrefix::NAME, data).unwrap();
        assert_eq!(ext.build_storage_root_path("namespace:12887296").unwrap(), "12887296");
        assert!(matches!(
            LayoutExtension::from_json("NNNN-nope", data),
            Err(ExtensionError::UnknownExtension(_))
        ));
        assert!(LayoutExtension::handles(PairTree::NAME));
        assert!(!LayoutExtension::handles("NNNN-content-stats"));
    }

    #[test]
    fn config_is_the_layout_config() {
        let ext = LayoutExtension::new(PairTree::new(2).unwrap());
        let json = ext.config_json().unwrap();
        assert_eq!(json["extensionName"], PairTree::NAME);
    }
}
