use ocfl_checksum::digest_bytes;
use ocfl_types::DigestAlgorithm;
use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult};
use crate::{require_id, tuple, StorageLayout};

/// Configuration of [`HashedNTuple`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HashedNTupleConfig {
    pub extension_name: String,
    pub digest_algorithm: DigestAlgorithm,
    pub tuple_size: usize,
    pub number_of_tuples: usize,
    pub short_object_root: bool,
}

impl Default for HashedNTupleConfig {
    fn default() -> Self {
        Self {
            extension_name: HashedNTuple::NAME.into(),
            digest_algorithm: DigestAlgorithm::Sha256,
            tuple_size: 3,
            number_of_tuples: 3,
            short_object_root: false,
        }
    }
}

/// Nested directories cut from the identifier's digest.
///
/// `3c0/ff4/240/<digest>` for `sha256`, three tuples of three. With
/// `shortObjectRoot` the final segment is the digest remainder after the
/// tuples instead of the whole digest.
#[derive(Clone, Debug)]
pub struct HashedNTuple {
    config: HashedNTupleConfig,
}

impl HashedNTuple {
    pub const NAME: &'static str = "0004-hashed-n-tuple-storage-layout";

    pub fn new(
        digest_algorithm: DigestAlgorithm,
        tuple_size: usize,
        number_of_tuples: usize,
        short_object_root: bool,
    ) -> LayoutResult<Self> {
        Self::from_config(HashedNTupleConfig {
            digest_algorithm,
            tuple_size,
            number_of_tuples,
            short_object_root,
            ..Default::default()
        })
    }

    pub fn from_config(mut config: HashedNTupleConfig) -> LayoutResult<Self> {
        if config.extension_name != Self::NAME {
            return Err(LayoutError::Configuration(format!(
                "expected extension {}, got {}",
                Self::NAME,
                config.extension_name
            )));
        }
        let (size, count) = tuple::normalize(config.tuple_size, config.number_of_tuples);
        tuple::check_span(
            size,
            count,
            config.digest_algorithm.hex_len(),
            config.short_object_root,
        )?;
        config.tuple_size = size;
        config.number_of_tuples = count;
        Ok(Self { config })
    }

    pub fn from_json(data: &[u8]) -> LayoutResult<Self> {
        Self::from_config(serde_json::from_slice(data)?)
    }

    pub fn config(&self) -> &HashedNTupleConfig {
        &self.config
    }
}

impl Default for HashedNTuple {
    fn default() -> Self {
        Self {
            config: HashedNTupleConfig::default(),
        }
    }
}

impl StorageLayout for HashedNTuple {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "hashed n-tuple directory layout"
    }

    fn config_json(&self) -> LayoutResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.config)?)
    }

    fn build_storage_root_path(&self, id: &str) -> LayoutResult<String> {
        require_id(id)?;
        let c = &self.config;
        let digest = digest_bytes(c.digest_algorithm, id.as_bytes());
        let mut segments = tuple::split(&digest, c.tuple_size, c.number_of_tuples);
        if c.short_object_root {
            segments.push(&digest[c.tuple_size * c.number_of_tuples..]);
        } else {
            segments.push(&digest);
        }
        Ok(segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const OBJECT_01: &str = "3c0ff4240c1e116dba14c7627f2319b58aa3d77606d0d90dfc6161608ac987d4";

    #[test]
    fn published_vector() {
        let layout = HashedNTuple::new(DigestAlgorithm::Sha256, 3, 3, false).unwrap();
        assert_eq!(
            layout.build_storage_root_path("object-01").unwrap(),
            format!("3c0/ff4/240/{OBJECT_01}")
        );
    }

    #[test]
    fn short_object_root() {
        let layout = HashedNTuple::new(DigestAlgorithm::Sha256, 3, 3, true).unwrap();
        assert_eq!(
            layout.build_storage_root_path("object-01").unwrap(),
            format!("3c0/ff4/240/{}", &OBJECT_01[9..])
        );
    }

    #[test]
    fn zero_tuples_is_bare_digest() {
        let layout = HashedNTuple::new(DigestAlgorithm::Sha256, 0, 3, false).unwrap();
        assert_eq!(layout.build_storage_root_path("object-01").unwrap(), OBJECT_01);
        assert_eq!(layout.config().number_of_tuples, 0);
    }

    #[test]
    fn md5_tuples() {
        let layout = HashedNTuple::new(DigestAlgorithm::Md5, 2, 15, true).unwrap();
        let path = layout.build_storage_root_path("object-01").unwrap();
        let segments: Vec<_> = path.split('/').collect();
        assert_eq!(segments.len(), 16);
        assert_eq!(segments[15].len(), 2);
    }

    #[test]
    fn span_must_fit_digest() {
        assert!(HashedNTuple::new(DigestAlgorithm::Md5, 4, 8, false).is_ok());
        assert!(HashedNTuple::new(DigestAlgorithm::Md5, 4, 8, true).is_err());
        assert!(HashedNTuple::new(DigestAlgorithm::Sha1, 32, 2, false).is_err());
    }

    #[test]
    fn config_from_json_uses_defaults() {
        let layout = HashedNTuple::from_json(
            br#"{"extensionName":"0004-hashed-n-tuple-storage-layout","tupleSize":2}"#,
        )
        .unwrap();
        assert_eq!(layout.config().tuple_size, 2);
        assert_eq!(layout.config().number_of_tuples, 3);
        assert_eq!(layout.config_json().unwrap()["digestAlgorithm"], "sha256");
    }

    proptest! {
        #[test]
        fn deterministic(id in "\\PC{1,64}") {
            let layout = HashedNTuple::default();
            prop_assert_eq!(
                layout.build_storage_root_path(&id).unwrap(),
                layout.build_storage_root_path(&id).unwrap()
            );
        }
    }
}
