use ocfl_extension::ManagerConfig;
use ocfl_inventory::DEFAULT_CONTENT_DIRECTORY;
use ocfl_types::DigestAlgorithm;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ObjectError, ObjectResult};

/// Settings applied to objects created below a storage root.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectConfig {
    /// Content digest of new inventories.
    pub digest_algorithm: DigestAlgorithm,
    /// Extra digests recorded in the fixity block, on top of those the
    /// object's extensions ask for.
    pub fixity_algorithms: Vec<DigestAlgorithm>,
    pub content_directory: String,
    /// Zero-padding width of version names; 0 means `v1`, `v2`, ...
    pub version_padding: usize,
    /// `config.json` documents of the extensions every new object gets.
    pub extensions: Vec<Value>,
    /// Exclusion and sort rules for new objects.
    pub extension_manager: ManagerConfig,
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            digest_algorithm: DigestAlgorithm::Sha512,
            fixity_algorithms: Vec::new(),
            content_directory: DEFAULT_CONTENT_DIRECTORY.to_string(),
            version_padding: 0,
            extensions: Vec::new(),
            extension_manager: ManagerConfig::default(),
        }
    }
}

impl ObjectConfig {
    /// Add an extension configuration for new objects.
    pub fn with_extension(mut self, config: Value) -> Self {
        self.extensions.push(config);
        self
    }

    pub fn with_fixity(mut self, algorithm: DigestAlgorithm) -> Self {
        self.fixity_algorithms.push(algorithm);
        self
    }

    pub fn check(&self) -> ObjectResult<()> {
        if !self.digest_algorithm.is_content_algorithm() {
            return Err(ObjectError::Configuration(format!(
                "{} cannot be the content digest algorithm",
                self.digest_algorithm
            )));
        }
        if self.version_padding == 1 {
            return Err(ObjectError::Configuration(
                "version padding must be 0 or at least 2".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ObjectConfig::default();
        assert_eq!(config.digest_algorithm, DigestAlgorithm::Sha512);
        assert_eq!(config.content_directory, "content");
        assert!(config.extensions.is_empty());
        assert!(config.check().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ObjectConfig =
            serde_json::from_str(r#"{"digestAlgorithm": "sha256", "fixityAlgorithms": ["MD5"]}"#)
                .unwrap();
        assert_eq!(config.digest_algorithm, DigestAlgorithm::Sha256);
        assert_eq!(config.fixity_algorithms, vec![DigestAlgorithm::Md5]);
        assert_eq!(config.content_directory, "content");
    }

    #[test]
    fn check_rejects_fixity_only_algorithms() {
        let config = ObjectConfig {
            digest_algorithm: DigestAlgorithm::Md5,
            ..Default::default()
        };
        assert!(matches!(config.check(), Err(ObjectError::Configuration(_))));
        let padded = ObjectConfig {
            version_padding: 1,
            ..Default::default()
        };
        assert!(padded.check().is_err());
    }
}
