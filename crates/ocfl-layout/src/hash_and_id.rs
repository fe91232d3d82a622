use std::fmt::Write as _;

use ocfl_checksum::digest_bytes;
use ocfl_types::DigestAlgorithm;
use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult};
use crate::{require_id, tuple, StorageLayout};

/// Escaped identifiers longer than this are truncated and suffixed with the
/// digest.
const MAX_ENCAPSULATION_LEN: usize = 100;

/// Configuration of [`HashAndIdNTuple`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HashAndIdNTupleConfig {
    pub extension_name: String,
    pub digest_algorithm: DigestAlgorithm,
    pub tuple_size: usize,
    pub number_of_tuples: usize,
}

impl Default for HashAndIdNTupleConfig {
    fn default() -> Self {
        Self {
            extension_name: HashAndIdNTuple::NAME.into(),
            digest_algorithm: DigestAlgorithm::Sha256,
            tuple_size: 3,
            number_of_tuples: 3,
        }
    }
}

/// Digest tuples followed by the percent-escaped identifier.
#[derive(Clone, Debug)]
pub struct HashAndIdNTuple {
    config: HashAndIdNTupleConfig,
}

impl HashAndIdNTuple {
    pub const NAME: &'static str = "0003-hash-and-id-n-tuple-storage-layout";

    pub fn new(
        digest_algorithm: DigestAlgorithm,
        tuple_size: usize,
        number_of_tuples: usize,
    ) -> LayoutResult<Self> {
        Self::from_config(HashAndIdNTupleConfig {
            digest_algorithm,
            tuple_size,
            number_of_tuples,
            ..Default::default()
        })
    }

    pub fn from_config(mut config: HashAndIdNTupleConfig) -> LayoutResult<Self> {
        if config.extension_name != Self::NAME {
            return Err(LayoutError::Configuration(format!(
                "expected extension {}, got {}",
                Self::NAME,
                config.extension_name
            )));
        }
        let (size, count) = tuple::normalize(config.tuple_size, config.number_of_tuples);
        tuple::check_span(size, count, config.digest_algorithm.hex_len(), false)?;
        config.tuple_size = size;
        config.number_of_tuples = count;
        Ok(Self { config })
    }

    pub fn from_json(data: &[u8]) -> LayoutResult<Self> {
        Self::from_config(serde_json::from_slice(data)?)
    }

    pub fn config(&self) -> &HashAndIdNTupleConfig {
        &self.config
    }
}

impl Default for HashAndIdNTuple {
    fn default() -> Self {
        Self {
            config: HashAndIdNTupleConfig::default(),
        }
    }
}

/// Keep `[A-Za-z0-9_-]`, write every other UTF-8 byte as lowercase `%xx`.
fn percent_escape(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            out.push(byte as char);
        } else {
            let _ = write!(out, "%{byte:02x}");
        }
    }
    out
}

impl StorageLayout for HashAndIdNTuple {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "hashed n-tuple directories ending in the escaped identifier"
    }

    fn config_json(&self) -> LayoutResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.config)?)
    }

    fn build_storage_root_path(&self, id: &str) -> LayoutResult<String> {
        require_id(id)?;
        let c = &self.config;
        let digest = digest_bytes(c.digest_algorithm, id.as_bytes());
        let mut encapsulation = percent_escape(id);
        if encapsulation.len() > MAX_ENCAPSULATION_LEN {
            encapsulation.truncate(MAX_ENCAPSULATION_LEN);
            encapsulation.push('-');
            encapsulation.push_str(&digest);
        }
        let mut segments = tuple::split(&digest, c.tuple_size, c.number_of_tuples);
        segments.push(&encapsulation);
        Ok(segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn layout() -> HashAndIdNTuple {
        HashAndIdNTuple::new(DigestAlgorithm::Sha256, 3, 3).unwrap()
    }

    #[test]
    fn published_vectors() {
        assert_eq!(
            layout().build_storage_root_path("object-01").unwrap(),
            "3c0/ff4/240/object-01"
        );
        assert_eq!(
            layout().build_storage_root_path("..hor/rib:le-$id").unwrap(),
            "487/326/d8c/%2e%2ehor%2frib%3ale-%24id"
        );
    }

    #[test]
    fn multibyte_is_escaped_per_byte() {
        assert_eq!(percent_escape("é"), "%c3%a9");
    }

    #[test]
    fn long_ids_are_truncated_with_digest() {
        let id = "a".repeat(150);
        let path = layout().build_storage_root_path(&id).unwrap();
        let last = path.rsplit('/').next().unwrap();
        let digest = digest_bytes(DigestAlgorithm::Sha256, id.as_bytes());
        assert_eq!(last, format!("{}-{digest}", "a".repeat(100)));
    }

    #[test]
    fn zero_tuples_is_bare_id() {
        let layout = HashAndIdNTuple::new(DigestAlgorithm::Md5, 3, 0).unwrap();
        assert_eq!(layout.build_storage_root_path("object-01").unwrap(), "object-01");
    }

    proptest! {
        #[test]
        fn escaped_segment_is_filesystem_safe(id in "\\PC{1,40}") {
            let path = layout().build_storage_root_path(&id).unwrap();
            let last = path.rsplit('/').next().unwrap();
            prop_assert!(last.bytes().all(|b| b.is_ascii_alphanumeric() || b"_-%".contains(&b)));
            prop_assert_eq!(path.clone(), layout().build_storage_root_path(&id).unwrap());
        }
    }
}
