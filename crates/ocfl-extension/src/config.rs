use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::capability::CapabilityKind;
use crate::error::{ExtensionError, ExtensionResult};

/// Name under which the manager persists its own configuration.
pub const MANAGER_NAME: &str = "NNNN-extension-manager";

/// Ordering and exclusion rules applied per capability at finalize time.
///
/// ```json
/// {
///   "extensionName": "NNNN-extension-manager",
///   "exclusion": { "StorageRootPath": [["a", "b"]] },
///   "sort": { "ObjectContentPath": ["b", "a"] }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerConfig {
    #[serde(default = "default_name")]
    pub extension_name: String,
    /// Groups of mutually exclusive extensions; within a group only the
    /// earliest listed extension that is registered stays active.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub exclusion: BTreeMap<CapabilityKind, Vec<Vec<String>>>,
    /// Explicit dispatch order; unlisted extensions follow in registration
    /// order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sort: BTreeMap<CapabilityKind, Vec<String>>,
}

fn default_name() -> String {
    MANAGER_NAME.to_string()
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            extension_name: default_name(),
            exclusion: BTreeMap::new(),
            sort: BTreeMap::new(),
        }
    }
}

impl ManagerConfig {
    /// Returns `true` when there is nothing worth persisting.
    pub fn is_empty(&self) -> bool {
        self.exclusion.values().all(Vec::is_empty) && self.sort.values().all(Vec::is_empty)
    }

    /// Add an exclusion group for `kind`.
    pub fn exclude(mut self, kind: CapabilityKind, group: &[&str]) -> Self {
        self.exclusion
            .entry(kind)
            .or_default()
            .push(group.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Set the explicit order for `kind`.
    pub fn order(mut self, kind: CapabilityKind, names: &[&str]) -> Self {
        self.sort
            .insert(kind, names.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Every extension name mentioned in a rule.
    pub fn referenced_names(&self) -> impl Iterator<Item = &String> {
        self.exclusion
            .values()
            .flatten()
            .flatten()
            .chain(self.sort.values().flatten())
    }

    pub fn from_json(data: &[u8]) -> ExtensionResult<Self> {
        let config: Self = serde_json::from_slice(data)?;
        if config.extension_name != MANAGER_NAME {
            return Err(ExtensionError::Configuration(format!(
                "manager config names {:?}, expected {MANAGER_NAME}",
                config.extension_name
            )));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> ExtensionResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let config = ManagerConfig::default();
        assert!(config.is_empty());
        assert_eq!(config.extension_name, MANAGER_NAME);
    }

    #[test]
    fn json_shape() {
        let config = ManagerConfig::default()
            .exclude(CapabilityKind::StorageRootPath, &["a", "b"])
            .order(CapabilityKind::ObjectContentPath, &["b", "a"]);
        assert!(!config.is_empty());
        let value: serde_json::Value = serde_json::from_slice(&config.to_json().unwrap()).unwrap();
        assert_eq!(value["exclusion"]["StorageRootPath"][0][1], "b");
        assert_eq!(value["sort"]["ObjectContentPath"][0], "b");
        let back = ManagerConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.referenced_names().count(), 4);
    }

    #[test]
    fn empty_tables_are_not_serialized() {
        let json = String::from_utf8(ManagerConfig::default().to_json().unwrap()).unwrap();
        assert!(!json.contains("exclusion"));
        assert!(!json.contains("sort"));
    }

    #[test]
    fn wrong_name_rejected() {
        let err = ManagerConfig::from_json(br#"{"extensionName": "other"}"#).unwrap_err();
        assert!(matches!(err, ExtensionError::Configuration(_)));
    }

    #[test]
    fn unknown_capability_rejected() {
        let data = br#"{"extensionName": "NNNN-extension-manager", "sort": {"Teleport": []}}"#;
        assert!(ManagerConfig::from_json(data).is_err());
    }
}
