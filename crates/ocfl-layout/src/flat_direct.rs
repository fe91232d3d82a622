use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult};
use crate::{require_id, StorageLayout};

/// Configuration of [`FlatDirect`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlatDirectConfig {
    pub extension_name: String,
}

impl Default for FlatDirectConfig {
    fn default() -> Self {
        Self {
            extension_name: FlatDirect::NAME.into(),
        }
    }
}

/// The identifier is the object's directory name.
///
/// The mapping is the identity, restricted to identifiers that name one
/// directory directly below the storage root: `.`, `..` and identifiers
/// containing `/` are rejected with a path error instead of being mapped.
#[derive(Clone, Debug, Default)]
pub struct FlatDirect {
    config: FlatDirectConfig,
}

impl FlatDirect {
    pub const NAME: &'static str = "0002-flat-direct-storage-layout";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: FlatDirectConfig) -> LayoutResult<Self> {
        if config.extension_name != Self::NAME {
            return Err(LayoutError::Configuration(format!(
                "expected extension {}, got {}",
                Self::NAME,
                config.extension_name
            )));
        }
        Ok(Self { config })
    }

    pub fn from_json(data: &[u8]) -> LayoutResult<Self> {
        Self::from_config(serde_json::from_slice(data)?)
    }
}

impl StorageLayout for FlatDirect {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "one object per directory named after the identifier"
    }

    fn config_json(&self) -> LayoutResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.config)?)
    }

    fn build_storage_root_path(&self, id: &str) -> LayoutResult<String> {
        require_id(id)?;
        if id == "." || id == ".." || id.contains('/') {
            return Err(LayoutError::input(id, "not usable as a single directory name"));
        }
        Ok(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity() {
        let layout = FlatDirect::new();
        assert_eq!(layout.build_storage_root_path("object-01").unwrap(), "object-01");
        assert_eq!(
            layout.build_storage_root_path("..hor_rib:le-$id").unwrap(),
            "..hor_rib:le-$id"
        );
    }

    #[test]
    fn rejects_unusable_ids() {
        let layout = FlatDirect::new();
        assert!(layout.build_storage_root_path("").is_err());
        assert!(layout.build_storage_root_path("a/b").is_err());
        assert!(layout.build_storage_root_path("..").is_err());
        let err = layout.build_storage_root_path(".").unwrap_err();
        assert_eq!(err.kind(), ocfl_types::ErrorKind::Path);
        assert!(layout.build_storage_root_path("a.b..c").is_ok());
    }

    #[test]
    fn config_round_trip() {
        let layout = FlatDirect::from_json(br#"{"extensionName":"0002-flat-direct-storage-layout"}"#)
            .unwrap();
        assert_eq!(
            layout.config_json().unwrap()["extensionName"],
            "0002-flat-direct-storage-layout"
        );
        assert!(FlatDirect::from_json(br#"{"extensionName":"other"}"#).is_err());
    }
}
