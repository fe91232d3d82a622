use std::sync::Arc;

use ocfl_types::DigestAlgorithm;
use serde::{Deserialize, Serialize};

use crate::capability::{Capability, Extension, FixityDigest};
use crate::error::ExtensionResult;
use crate::extensions::check_name;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestAlgorithmsConfig {
    pub extension_name: String,
    /// Fixity algorithms computed for every newly added file.
    #[serde(default)]
    pub digest_algorithms: Vec<DigestAlgorithm>,
}

impl Default for DigestAlgorithmsConfig {
    fn default() -> Self {
        Self {
            extension_name: DigestAlgorithms::NAME.to_string(),
            digest_algorithms: Vec::new(),
        }
    }
}

/// Requests additional fixity digests.
#[derive(Clone, Debug)]
pub struct DigestAlgorithms {
    config: DigestAlgorithmsConfig,
}

impl DigestAlgorithms {
    pub const NAME: &'static str = "0001-digest-algorithms";

    pub fn new(algorithms: &[DigestAlgorithm]) -> Self {
        Self {
            config: DigestAlgorithmsConfig {
                digest_algorithms: algorithms.to_vec(),
                ..Default::default()
            },
        }
    }

    pub fn from_json(data: &[u8]) -> ExtensionResult<Self> {
        let config: DigestAlgorithmsConfig = serde_json::from_slice(data)?;
        check_name(&config.extension_name, Self::NAME)?;
        Ok(Self { config })
    }
}

impl Extension for DigestAlgorithms {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "additional fixity digest algorithms"
    }

    fn config_json(&self) -> ExtensionResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.config)?)
    }

    fn capabilities(self: Arc<Self>) -> Vec<Capability> {
        vec![Capability::FixityDigest(self)]
    }
}

impl FixityDigest for DigestAlgorithms {
    fn fixity_digests(&self) -> Vec<DigestAlgorithm> {
        self.config.digest_algorithms.clone()
    }
}
