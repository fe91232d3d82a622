//! Layouts that drop an identifier's namespace prefix.

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult};
use crate::{require_id, tuple, StorageLayout};

fn check_name(expected: &str, actual: &str) -> LayoutResult<()> {
    if expected != actual {
        return Err(LayoutError::Configuration(format!(
            "expected extension {expected}, got {actual}"
        )));
    }
    Ok(())
}

fn check_delimiter(delimiter: &str) -> LayoutResult<()> {
    if delimiter.is_empty() {
        return Err(LayoutError::Configuration("delimiter must not be empty".into()));
    }
    Ok(())
}

/// Everything after the last occurrence of `delimiter`; the whole id if
/// the delimiter does not occur.
fn strip_prefix<'a>(id: &'a str, delimiter: &str) -> LayoutResult<&'a str> {
    require_id(id)?;
    let rest = match id.rfind(delimiter) {
        Some(pos) => &id[pos + delimiter.len()..],
        None => id,
    };
    if rest.is_empty() {
        return Err(LayoutError::input(id, "nothing left after removing the prefix"));
    }
    Ok(rest)
}

/// Configuration of [`FlatOmitPrefix`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlatOmitPrefixConfig {
    pub extension_name: String,
    pub delimiter: String,
}

impl Default for FlatOmitPrefixConfig {
    fn default() -> Self {
        Self {
            extension_name: FlatOmitPrefix::NAME.into(),
            delimiter: ":".into(),
        }
    }
}

/// `namespace:12887296` becomes `12887296`.
#[derive(Clone, Debug)]
pub struct FlatOmitPrefix {
    config: FlatOmitPrefixConfig,
}

impl FlatOmitPrefix {
    pub const NAME: &'static str = "0006-flat-omit-prefix-storage-layout";

    pub fn new(delimiter: impl Into<String>) -> LayoutResult<Self> {
        Self::from_config(FlatOmitPrefixConfig {
            delimiter: delimiter.into(),
            ..Default::default()
        })
    }

    pub fn from_config(config: FlatOmitPrefixConfig) -> LayoutResult<Self> {
        check_name(Self::NAME, &config.extension_name)?;
        check_delimiter(&config.delimiter)?;
        Ok(Self { config })
    }

    pub fn from_json(data: &[u8]) -> LayoutResult<Self> {
        Self::from_config(serde_json::from_slice(data)?)
    }
}

impl StorageLayout for FlatOmitPrefix {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "flat directories named after the identifier without its prefix"
    }

    fn config_json(&self) -> LayoutResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.config)?)
    }

    fn build_storage_root_path(&self, id: &str) -> LayoutResult<String> {
        let rest = strip_prefix(id, &self.config.delimiter)?;
        if rest == "." || rest == ".." || rest.contains('/') {
            return Err(LayoutError::input(id, "not usable as a single directory name"));
        }
        Ok(rest.to_string())
    }
}

/// Which side short identifiers are padded with zeros on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroPadding {
    #[default]
    Left,
    Right,
}

/// Configuration of [`NTupleOmitPrefix`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NTupleOmitPrefixConfig {
    pub extension_name: String,
    pub delimiter: String,
    pub tuple_size: usize,
    pub number_of_tuples: usize,
    pub zero_padding: ZeroPadding,
    pub reverse_object_root: bool,
}

impl Default for NTupleOmitPrefixConfig {
    fn default() -> Self {
        Self {
            extension_name: NTupleOmitPrefix::NAME.into(),
            delimiter: ":".into(),
            tuple_size: 3,
            number_of_tuples: 3,
            zero_padding: ZeroPadding::Left,
            reverse_object_root: false,
        }
    }
}

/// Tuples cut from the prefix-stripped identifier, which also names the
/// final directory.
///
/// The remainder is optionally reversed, then zero-padded to the tuple span
/// before cutting. The final segment is always the plain remainder.
#[derive(Clone, Debug)]
pub struct NTupleOmitPrefix {
    config: NTupleOmitPrefixConfig,
}

impl NTupleOmitPrefix {
    pub const NAME: &'static str = "0007-n-tuple-omit-prefix-storage-layout";

    pub fn new(
        delimiter: impl Into<String>,
        tuple_size: usize,
        number_of_tuples: usize,
        zero_padding: ZeroPadding,
        reverse_object_root: bool,
    ) -> LayoutResult<Self> {
        Self::from_config(NTupleOmitPrefixConfig {
            delimiter: delimiter.into(),
            tuple_size,
            number_of_tuples,
            zero_padding,
            reverse_object_root,
            ..Default::default()
        })
    }

    pub fn from_config(mut config: NTupleOmitPrefixConfig) -> LayoutResult<Self> {
        check_name(Self::NAME, &config.extension_name)?;
        check_delimiter(&config.delimiter)?;
        let (size, count) = tuple::normalize(config.tuple_size, config.number_of_tuples);
        config.tuple_size = size;
        config.number_of_tuples = count;
        Ok(Self { config })
    }

    pub fn from_json(data: &[u8]) -> LayoutResult<Self> {
        Self::from_config(serde_json::from_slice(data)?)
    }

    pub fn config(&self) -> &NTupleOmitPrefixConfig {
        &self.config
    }
}

impl StorageLayout for NTupleOmitPrefix {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "n-tuple directories cut from the identifier without its prefix"
    }

    fn config_json(&self) -> LayoutResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.config)?)
    }

    fn build_storage_root_path(&self, id: &str) -> LayoutResult<String> {
        let c = &self.config;
        let rest = strip_prefix(id, &c.delimiter)?;
        if !rest.is_ascii() {
            return Err(LayoutError::input(id, "identifier must be ASCII"));
        }
        if rest == "." || rest == ".." || rest.contains('/') {
            return Err(LayoutError::input(id, "not usable as a single directory name"));
        }

        let span = c.tuple_size * c.number_of_tuples;
        let mut source: String = if c.reverse_object_root {
            rest.chars().rev().collect()
        } else {
            rest.to_string()
        };
        if source.len() < span {
            let zeros = "0".repeat(span - source.len());
            source = match c.zero_padding {
                ZeroPadding::Left => zeros + &source,
                ZeroPadding::Right => source + &zeros,
            };
        }

        let mut segments = tuple::split(&source, c.tuple_size, c.number_of_tuples);
        segments.push(rest);
        Ok(segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ntuple(size: usize, count: usize, padding: ZeroPadding, reverse: bool) -> NTupleOmitPrefix {
        NTupleOmitPrefix::new(":", size, count, padding, reverse).unwrap()
    }

    #[test]
    fn flat_vector() {
        let layout = FlatOmitPrefix::new(":").unwrap();
        assert_eq!(
            layout.build_storage_root_path("namespace:12887296").unwrap(),
            "12887296"
        );
    }

    #[test]
    fn flat_uses_last_delimiter() {
        let layout = FlatOmitPrefix::new(":").unwrap();
        assert_eq!(
            layout
                .build_storage_root_path("urn:uuid:6e8bc430-9c3a-11d9-9669-0800200c9a66")
                .unwrap(),
            "6e8bc430-9c3a-11d9-9669-0800200c9a66"
        );
        let multi = FlatOmitPrefix::new("edu/").unwrap();
        assert_eq!(
            multi.build_storage_root_path("https://institution.edu/3448793").unwrap(),
            "3448793"
        );
    }

    #[test]
    fn flat_rejects_empty_remainder() {
        let layout = FlatOmitPrefix::new(":").unwrap();
        assert!(layout.build_storage_root_path("namespace:").is_err());
        assert!(FlatOmitPrefix::new("").is_err());
    }

    #[test]
    fn ntuple_vectors() {
        assert_eq!(
            ntuple(4, 2, ZeroPadding::Left, false)
                .build_storage_root_path("namespace:12887296")
                .unwrap(),
            "1288/7296/12887296"
        );
        assert_eq!(
            ntuple(3, 3, ZeroPadding::Left, true)
                .build_storage_root_path("urn:uuid:6e8bc430-9c3a-11d9-9669-0800200c9a66")
                .unwrap(),
            "66a/9c0/020/6e8bc430-9c3a-11d9-9669-0800200c9a66"
        );
    }

    #[test]
    fn ntuple_padding_sides() {
        assert_eq!(
            ntuple(4, 2, ZeroPadding::Left, false)
                .build_storage_root_path("ns:abc")
                .unwrap(),
            "0000/0abc/abc"
        );
        assert_eq!(
            ntuple(4, 2, ZeroPadding::Right, false)
                .build_storage_root_path("ns:abc")
                .unwrap(),
            "abc0/0000/abc"
        );
        assert_eq!(
            ntuple(2, 2, ZeroPadding::Right, true)
                .build_storage_root_path("ns:abc")
                .unwrap(),
            "cb/a0/abc"
        );
    }

    #[test]
    fn ntuple_requires_ascii() {
        let err = ntuple(3, 3, ZeroPadding::Left, false)
            .build_storage_root_path("ns:caf\u{e9}")
            .unwrap_err();
        assert_eq!(err.kind(), ocfl_types::ErrorKind::Path);
    }

    #[test]
    fn ntuple_config_json_keys() {
        let layout = NTupleOmitPrefix::from_json(
            br#"{"extensionName":"0007-n-tuple-omit-prefix-storage-layout","delimiter":":","tupleSize":4,"numberOfTuples":2,"zeroPadding":"right","reverseObjectRoot":true}"#,
        )
        .unwrap();
        assert_eq!(layout.config().zero_padding, ZeroPadding::Right);
        assert!(layout.config().reverse_object_root);
        assert_eq!(layout.config_json().unwrap()["zeroPadding"], "right");
    }

    #[test]
    fn ntuple_new_matches_config() {
        let layout = NTupleOmitPrefix::new("/", 4, 2, ZeroPadding::Right, true).unwrap();
        assert_eq!(layout.config().delimiter, "/");
        assert_eq!(layout.config().extension_name, NTupleOmitPrefix::NAME);
        assert_eq!(
            layout.build_storage_root_path("ark:/13030/xt12t3").unwrap(),
            "3t21/tx00/xt12t3"
        );
        assert!(NTupleOmitPrefix::new("", 4, 2, ZeroPadding::Left, false).is_err());
    }

    proptest! {
        #[test]
        fn ntuple_ends_with_remainder(id in "[a-z]{1,6}:[0-9a-f]{1,20}") {
            let layout = ntuple(3, 3, ZeroPadding::Left, false);
            let path = layout.build_storage_root_path(&id).unwrap();
            let rest = id.rsplit(':').next().unwrap();
            let suffix = format!("/{rest}");
            prop_assert!(path.ends_with(&suffix));
            prop_assert_eq!(path.split('/').count(), 4);
        }
    }
}
