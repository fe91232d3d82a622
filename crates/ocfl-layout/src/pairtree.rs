use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult};
use crate::{require_id, StorageLayout};

/// Characters that are `^`-escaped even though they are printable.
const ESCAPED: &[u8] = b"\"*+,<=>?\\^|";

/// Configuration of [`PairTree`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PairTreeConfig {
    pub extension_name: String,
    pub shorty_length: usize,
}

impl Default for PairTreeConfig {
    fn default() -> Self {
        Self {
            extension_name: PairTree::NAME.into(),
            shorty_length: 2,
        }
    }
}

/// Pairtree: the cleaned identifier cut into fixed width "shorties".
#[derive(Clone, Debug, Default)]
pub struct PairTree {
    config: PairTreeConfig,
}

impl PairTree {
    pub const NAME: &'static str = "NNNN-pairtree-storage-layout";

    pub fn new(shorty_length: usize) -> LayoutResult<Self> {
        Self::from_config(PairTreeConfig {
            shorty_length,
            ..Default::default()
        })
    }

    pub fn from_config(config: PairTreeConfig) -> LayoutResult<Self> {
        if config.extension_name != Self::NAME {
            return Err(LayoutError::Configuration(format!(
                "expected extension {}, got {}",
                Self::NAME,
                config.extension_name
            )));
        }
        if config.shorty_length == 0 {
            return Err(LayoutError::Configuration(
                "shortyLength must be at least 1".into(),
            ));
        }
        Ok(Self { config })
    }

    pub fn from_json(data: &[u8]) -> LayoutResult<Self> {
        Self::from_config(serde_json::from_slice(data)?)
    }

    /// The pairtree cleaned form of `id`, before splitting.
    pub fn clean(id: &str) -> String {
        let mut escaped = String::with_capacity(id.len());
        for byte in id.bytes() {
            if !(b'!'..=b'~').contains(&byte) || ESCAPED.contains(&byte) {
                let _ = write!(escaped, "^{byte:02x}");
            } else {
                escaped.push(byte as char);
            }
        }
        escaped
            .chars()
            .map(|c| match c {
                '/' => '=',
                ':' => '+',
                '.' => ',',
                c => c,
            })
            .collect()
    }
}

impl StorageLayout for PairTree {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "pairtree directories cut from the cleaned identifier"
    }

    fn config_json(&self) -> LayoutResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.config)?)
    }

    fn build_storage_root_path(&self, id: &str) -> LayoutResult<String> {
        require_id(id)?;
        let cleaned = Self::clean(id);
        let shorties: Vec<&str> = cleaned
            .as_bytes()
            .chunks(self.config.shorty_length)
            .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
            .collect();
        Ok(shorties.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn published_vector() {
        let layout = PairTree::new(2).unwrap();
        assert_eq!(
            layout.build_storage_root_path("ark:/13030/xt12t3").unwrap(),
            "ar/k+/=1/30/30/=x/t1/2t/3"
        );
    }

    #[test]
    fn cleaning_rules() {
        assert_eq!(PairTree::clean("http://n2t.info/urn:nbn:se:kb:repos-1"),
            "http+==n2t,info=urn+nbn+se+kb+repos-1");
        assert_eq!(PairTree::clean("what-the-*@?#!^!?"), "what-the-^2a@^3f#!^5e!^3f");
        assert_eq!(PairTree::clean("a b"), "a^20b");
        assert_eq!(PairTree::clean("\u{e9}"), "^c3^a9");
    }

    #[test]
    fn zero_shorty_is_rejected() {
        assert!(PairTree::new(0).is_err());
    }

    proptest! {
        #[test]
        fn segments_are_at_most_shorty_long(id in "\\PC{1,40}", shorty in 1usize..5) {
            let layout = PairTree::new(shorty).unwrap();
            let path = layout.build_storage_root_path(&id).unwrap();
            prop_assert!(path.split('/').all(|s| !s.is_empty() && s.len() <= shorty));
            prop_assert_eq!(path, layout.build_storage_root_path(&id).unwrap());
        }
    }
}
