use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use ocfl_fs::{join_path, normalize_path};
use serde::{Deserialize, Serialize};

use crate::capability::{
    Area, Capability, Extension, ObjectContentPath, ObjectExtractPath, ObjectStatePath,
};
use crate::error::{ExtensionError, ExtensionResult};
use crate::extensions::check_name;
use crate::manager::CONTENT_AREA;
use crate::session::Session;

/// Where one area lives inside the object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubpathEntry {
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSubpathConfig {
    pub extension_name: String,
    /// Area name to sub-directory.
    #[serde(default = "default_areas")]
    pub sub_path: BTreeMap<String, SubpathEntry>,
}

fn default_areas() -> BTreeMap<String, SubpathEntry> {
    BTreeMap::from([(
        "metadata".to_string(),
        SubpathEntry {
            path: "metadata".into(),
            description: "descriptive and technical metadata".into(),
        },
    )])
}

impl Default for ContentSubpathConfig {
    fn default() -> Self {
        Self {
            extension_name: ContentSubpath::NAME.to_string(),
            sub_path: default_areas(),
        }
    }
}

/// Named areas stored under their own sub-directories.
///
/// A file added to area `metadata` is recorded as `metadata/<path>` in the
/// state and stored below `metadata/` in the content directory. Extraction
/// of an area only yields files below that area's directory, with the
/// prefix removed.
#[derive(Clone, Debug, Default)]
pub struct ContentSubpath {
    config: ContentSubpathConfig,
}

impl ContentSubpath {
    pub const NAME: &'static str = "NNNN-content-subpath";

    pub fn from_config(mut config: ContentSubpathConfig) -> ExtensionResult<Self> {
        check_name(&config.extension_name, Self::NAME)?;
        let mut seen = BTreeSet::new();
        for (area, entry) in &mut config.sub_path {
            if area.is_empty() {
                return Err(ExtensionError::Configuration("area name is empty".into()));
            }
            let path = normalize_path(&entry.path)
                .map_err(|e| ExtensionError::Configuration(e.to_string()))?;
            if path.is_empty() {
                return Err(ExtensionError::Configuration(format!(
                    "area {area} has an empty path"
                )));
            }
            if !seen.insert(path.clone()) {
                return Err(ExtensionError::Configuration(format!(
                    "path {path} is used by more than one area"
                )));
            }
            entry.path = path;
        }
        Ok(Self { config })
    }

    pub fn from_json(data: &[u8]) -> ExtensionResult<Self> {
        Self::from_config(serde_json::from_slice(data)?)
    }

    pub fn config(&self) -> &ContentSubpathConfig {
        &self.config
    }

    fn prefixed(&self, path: &str, area: &str) -> String {
        match self.config.sub_path.get(area) {
            Some(entry) => join_path(&entry.path, path),
            None => String::new(),
        }
    }

    fn inside(path: &str, dir: &str) -> bool {
        path.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
    }
}

impl Extension for ContentSubpath {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "named areas stored in sub-directories of the object"
    }

    fn config_json(&self) -> ExtensionResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.config)?)
    }

    fn capabilities(self: Arc<Self>) -> Vec<Capability> {
        vec![
            Capability::Area(self.clone()),
            Capability::ObjectContentPath(self.clone()),
            Capability::ObjectStatePath(self.clone()),
            Capability::ObjectExtractPath(self),
        ]
    }
}

impl Area for ContentSubpath {
    fn area_path(&self, area: &str) -> Option<String> {
        self.config.sub_path.get(area).map(|e| e.path.clone())
    }
}

impl ObjectContentPath for ContentSubpath {
    fn build_object_manifest_path(
        &self,
        _session: &Session,
        path: &str,
        area: &str,
    ) -> ExtensionResult<String> {
        Ok(self.prefixed(path, area))
    }
}

impl ObjectStatePath for ContentSubpath {
    fn build_object_state_path(
        &self,
        _session: &Session,
        path: &str,
        area: &str,
    ) -> ExtensionResult<String> {
        Ok(self.prefixed(path, area))
    }
}

impl ObjectExtractPath for ContentSubpath {
    fn build_object_extract_path(
        &self,
        _session: &Session,
        path: &str,
        area: &str,
    ) -> ExtensionResult<String> {
        if area.is_empty() {
            return Ok(String::new());
        }
        if let Some(entry) = self.config.sub_path.get(area) {
            return match path.strip_prefix(&entry.path) {
                Some(rest) if rest.starts_with('/') => Ok(rest[1..].to_string()),
                _ => Err(ExtensionError::OutsideArea {
                    path: path.to_string(),
                    area: area.to_string(),
                }),
            };
        }
        if area == CONTENT_AREA {
            // Unmapped content area: everything except the mapped areas.
            if self
                .config
                .sub_path
                .values()
                .any(|entry| Self::inside(path, &entry.path))
            {
                return Err(ExtensionError::OutsideArea {
                    path: path.to_string(),
                    area: area.to_string(),
                });
            }
            return Ok(String::new());
        }
        Err(ExtensionError::UnknownArea(area.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ext() -> ContentSubpath {
        ContentSubpath::default()
    }

    #[test]
    fn prefixes_paths_of_mapped_areas() {
        let session = Session::new("obj");
        let ext = ext();
        assert_eq!(
            ext.build_object_state_path(&session, "mods.xml", "metadata").unwrap(),
            "metadata/mods.xml"
        );
        assert_eq!(
            ext.build_object_manifest_path(&session, "a/b.txt", "metadata").unwrap(),
            "metadata/a/b.txt"
        );
        // Unmapped area: no change.
        assert_eq!(
            ext.build_object_state_path(&session, "a.txt", "content").unwrap(),
            ""
        );
        assert_eq!(ext.area_path("metadata").as_deref(), Some("metadata"));
        assert!(ext.area_path("content").is_none());
    }

    #[test]
    fn extraction_strips_area_prefix() {
        let session = Session::new("obj");
        let ext = ext();
        assert_eq!(
            ext.build_object_extract_path(&session, "metadata/mods.xml", "metadata")
                .unwrap(),
            "mods.xml"
        );
        assert_eq!(
            ext.build_object_extract_path(&session, "metadata/mods.xml", "").unwrap(),
            ""
        );
    }

    #[test]
    fn extraction_outside_area_is_refused() {
        let session = Session::new("obj");
        let ext = ext();
        assert!(matches!(
            ext.build_object_extract_path(&session, "data/a.txt", "metadata"),
            Err(ExtensionError::OutsideArea { .. })
        ));
        assert!(matches!(
            ext.build_object_extract_path(&session, "metadata/a.txt", "content"),
            Err(ExtensionError::OutsideArea { .. })
        ));
        // `metadatax/` is not inside `metadata/`.
        assert_eq!(
            ext.build_object_extract_path(&session, "metadatax/a.txt", "content")
                .unwrap(),
            ""
        );
        assert!(matches!(
            ext.build_object_extract_path(&session, "x", "thumbnails"),
            Err(ExtensionError::UnknownArea(_))
        ));
    }

    #[test]
    fn config_validation() {
        let dup = br#"{"extensionName": "NNNN-content-subpath",
            "subPath": {"a": {"path": "x"}, "b": {"path": "x/"}}}"#;
        assert!(ContentSubpath::from_json(dup).is_err());
        let escape = br#"{"extensionName": "NNNN-content-subpath",
            "subPath": {"a": {"path": "../x"}}}"#;
        assert!(ContentSubpath::from_json(escape).is_err());
        let ok = br#"{"extensionName": "NNNN-content-subpath",
            "subPath": {"doc": {"path": "/docs/", "description": "documentation"}}}"#;
        let ext = ContentSubpath::from_json(ok).unwrap();
        assert_eq!(ext.area_path("doc").as_deref(), Some("docs"));
        assert!(ext.area_path("metadata").is_none());
    }
}
