use std::fmt::Write as _;
use std::sync::LazyLock;

use ocfl_checksum::digest_bytes;
use ocfl_types::DigestAlgorithm;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LayoutError, LayoutResult};
use crate::{tuple, StorageLayout};

/// Printable characters that are unsafe on at least one common filesystem
/// or shell.
const UNSAFE_CHARS: &str = "*?:[]\"<>|(){}&'!;#@\\";

static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[\p{Cc}*?:\[\]"<>|(){}&'!;#@\\]"#).expect("static pattern")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static pattern"));

const DEFAULT_REPLACEMENT: &str = "_";
const DEFAULT_WHITESPACE_REPLACEMENT: &str = " ";

/// Configuration of [`DirectClean`].
///
/// `utfEncode` selects the escaping mode. The replacement strings belong to
/// the regex mode only; setting them together with `utfEncode` is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectCleanConfig {
    pub extension_name: String,
    pub max_pathname_len: usize,
    pub max_filename_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whitespace_replacement_string: Option<String>,
    pub utf_encode: bool,
    pub fallback_digest_algorithm: DigestAlgorithm,
    pub fallback_folder: String,
    pub fallback_subdirs: usize,
    pub fallback_tuple_size: usize,
}

impl Default for DirectCleanConfig {
    fn default() -> Self {
        Self {
            extension_name: DirectClean::NAME.into(),
            max_pathname_len: 32_000,
            max_filename_len: 127,
            replacement_string: None,
            whitespace_replacement_string: None,
            utf_encode: false,
            fallback_digest_algorithm: DigestAlgorithm::Md5,
            fallback_folder: "fallback".into(),
            fallback_subdirs: 0,
            fallback_tuple_size: 2,
        }
    }
}

#[derive(Clone, Debug)]
enum Mode {
    /// `=uXXXX` escapes; reversible.
    Escape,
    /// Lossy substitution.
    Replace {
        replacement: String,
        whitespace: String,
    },
}

/// Sanitizes every path segment; paths over the length limits are replaced
/// by a digest-derived fallback path.
#[derive(Clone, Debug)]
pub struct DirectClean {
    config: DirectCleanConfig,
    mode: Mode,
}

impl DirectClean {
    pub const NAME: &'static str = "NNNN-direct-clean-path-layout";

    pub fn from_config(mut config: DirectCleanConfig) -> LayoutResult<Self> {
        if config.extension_name != Self::NAME {
            return Err(LayoutError::Configuration(format!(
                "expected extension {}, got {}",
                Self::NAME,
                config.extension_name
            )));
        }
        if config.max_pathname_len == 0 || config.max_filename_len == 0 {
            return Err(LayoutError::Configuration(
                "maxPathnameLen and maxFilenameLen must be at least 1".into(),
            ));
        }
        let folder = &config.fallback_folder;
        if folder.contains('/') || folder == "." || folder == ".." || DISALLOWED.is_match(folder) {
            return Err(LayoutError::Configuration(format!(
                "fallbackFolder {folder:?} is not a plain directory name"
            )));
        }
        let (size, count) = tuple::normalize(config.fallback_tuple_size, config.fallback_subdirs);
        tuple::check_span(size, count, config.fallback_digest_algorithm.hex_len(), true)?;
        config.fallback_tuple_size = size;
        config.fallback_subdirs = count;

        let mode = if config.utf_encode {
            if config.replacement_string.is_some() || config.whitespace_replacement_string.is_some() {
                return Err(LayoutError::Configuration(
                    "utfEncode cannot be combined with replacementString or whitespaceReplacementString"
                        .into(),
                ));
            }
            Mode::Escape
        } else {
            let replacement = config
                .replacement_string
                .clone()
                .unwrap_or_else(|| DEFAULT_REPLACEMENT.into());
            let whitespace = config
                .whitespace_replacement_string
                .clone()
                .unwrap_or_else(|| DEFAULT_WHITESPACE_REPLACEMENT.into());
            if replacement.is_empty() {
                return Err(LayoutError::Configuration(
                    "replacementString must not be empty".into(),
                ));
            }
            for value in [&replacement, &whitespace] {
                if value.contains('/') || DISALLOWED.is_match(value) {
                    return Err(LayoutError::Configuration(format!(
                        "replacement {value:?} contains characters it would have to replace"
                    )));
                }
            }
            Mode::Replace {
                replacement,
                whitespace,
            }
        };
        Ok(Self { config, mode })
    }

    pub fn from_json(data: &[u8]) -> LayoutResult<Self> {
        Self::from_config(serde_json::from_slice(data)?)
    }

    pub fn config(&self) -> &DirectCleanConfig {
        &self.config
    }

    /// Sanitize `path` segment by segment, falling back to a digest path
    /// when the result exceeds the configured limits.
    pub fn clean_path(&self, path: &str) -> LayoutResult<String> {
        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| self.clean_segment(s))
            .collect();
        if segments.is_empty() {
            return Err(LayoutError::input(path, "path has no segments"));
        }
        let joined = segments.join("/");
        let too_long = joined.len() > self.config.max_pathname_len
            || segments.iter().any(|s| s.len() > self.config.max_filename_len);
        if too_long {
            debug!(path, cleaned_len = joined.len(), "path exceeds limits, using fallback");
            return Ok(self.fallback(path));
        }
        Ok(joined)
    }

    fn clean_segment(&self, segment: &str) -> String {
        match &self.mode {
            Mode::Escape => escape_segment(segment),
            Mode::Replace {
                replacement,
                whitespace,
            } => replace_segment(segment, replacement, whitespace),
        }
    }

    /// `fallbackFolder/<tuples>/<digest>`, shrunk until it fits.
    fn fallback(&self, original: &str) -> String {
        let c = &self.config;
        let digest = digest_bytes(c.fallback_digest_algorithm, original.as_bytes());
        let mut tuples = tuple::split(&digest, c.fallback_tuple_size, c.fallback_subdirs);
        let mut folder = (!c.fallback_folder.is_empty()).then_some(c.fallback_folder.as_str());

        loop {
            let segments: Vec<&str> = folder
                .into_iter()
                .chain(tuples.iter().copied())
                .chain(std::iter::once(digest.as_str()))
                .collect();
            let joined = segments.join("/");
            let fits = joined.len() <= c.max_pathname_len
                && segments.iter().all(|s| s.len() <= c.max_filename_len);
            if fits {
                return joined;
            }
            if tuples.pop().is_some() {
                continue;
            }
            if folder.take().is_some() {
                continue;
            }
            break;
        }
        let limit = c.max_filename_len.min(c.max_pathname_len).min(digest.len());
        digest[..limit].to_string()
    }
}

impl Default for DirectClean {
    fn default() -> Self {
        Self {
            config: DirectCleanConfig::default(),
            mode: Mode::Replace {
                replacement: DEFAULT_REPLACEMENT.into(),
                whitespace: DEFAULT_WHITESPACE_REPLACEMENT.into(),
            },
        }
    }
}

fn is_periods_only(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c == '.')
}

fn escape_segment(segment: &str) -> String {
    let periods_only = is_periods_only(segment);
    let mut out = String::with_capacity(segment.len());
    for (i, c) in segment.chars().enumerate() {
        let leading = i == 0 && (c == '-' || c == '~' || (periods_only && c == '.'));
        if leading || c == '=' || c.is_control() || c.is_whitespace() || UNSAFE_CHARS.contains(c) {
            let _ = write!(out, "=u{:04x}", c as u32);
        } else {
            out.push(c);
        }
    }
    out
}

fn replace_segment(segment: &str, replacement: &str, whitespace: &str) -> String {
    let collapsed = WHITESPACE.replace_all(segment, whitespace);
    let replaced = DISALLOWED.replace_all(&collapsed, replacement);
    let trimmed = replaced
        .trim_start_matches(|c: char| c == '-' || c == '~' || c.is_whitespace())
        .trim_end();
    if trimmed.is_empty() {
        return replacement.to_string();
    }
    if is_periods_only(trimmed) {
        return format!("{replacement}{}", &trimmed[1..]);
    }
    trimmed.to_string()
}

impl StorageLayout for DirectClean {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "sanitized direct paths with a digest fallback for overlong paths"
    }

    fn config_json(&self) -> LayoutResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.config)?)
    }

    fn build_storage_root_path(&self, id: &str) -> LayoutResult<String> {
        self.clean_path(id)
    }

    fn build_object_manifest_path(&self, logical_path: &str, _area: &str) -> LayoutResult<String> {
        self.clean_path(logical_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn utf() -> DirectClean {
        DirectClean::from_config(DirectCleanConfig {
            utf_encode: true,
            ..Default::default()
        })
        .unwrap()
    }

    fn limited(max_path: usize, max_file: usize, subdirs: usize) -> DirectClean {
        DirectClean::from_config(DirectCleanConfig {
            max_pathname_len: max_path,
            max_filename_len: max_file,
            fallback_subdirs: subdirs,
            fallback_tuple_size: 2,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn utf_mode_escapes() {
        let layout = utf();
        assert_eq!(layout.clean_path("a b/c:d=e").unwrap(), "a=u0020b/c=u003ad=u003de");
        assert_eq!(layout.clean_path("-x/~y").unwrap(), "=u002dx/=u007ey");
        assert_eq!(layout.clean_path("../.").unwrap(), "=u002e./=u002e");
        assert_eq!(layout.clean_path("tab\there").unwrap(), "tab=u0009here");
        assert_eq!(layout.clean_path("caf\u{e9}.txt").unwrap(), "caf\u{e9}.txt");
    }

    #[test]
    fn replace_mode_defaults() {
        let layout = DirectClean::default();
        assert_eq!(layout.clean_path("a   b/c:d").unwrap(), "a b/c_d");
        assert_eq!(layout.clean_path("  -~name ").unwrap(), "name");
        assert_eq!(layout.clean_path("../x").unwrap(), "_./x");
        assert_eq!(layout.clean_path("/a//b/").unwrap(), "a/b");
        assert_eq!(layout.clean_path("-").unwrap(), "_");
        assert_eq!(layout.clean_path("why?(really)").unwrap(), "why__really_");
    }

    #[test]
    fn custom_replacements() {
        let layout = DirectClean::from_config(DirectCleanConfig {
            replacement_string: Some("-".into()),
            whitespace_replacement_string: Some("_".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(layout.clean_path("my file?.txt").unwrap(), "my_file-.txt");
    }

    #[test]
    fn modes_are_exclusive() {
        let err = DirectClean::from_config(DirectCleanConfig {
            utf_encode: true,
            replacement_string: Some("_".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.kind(), ocfl_types::ErrorKind::Configuration);
    }

    #[test]
    fn invalid_limits_and_replacements() {
        assert!(DirectClean::from_config(DirectCleanConfig {
            max_filename_len: 0,
            ..Default::default()
        })
        .is_err());
        assert!(DirectClean::from_config(DirectCleanConfig {
            replacement_string: Some("a/b".into()),
            ..Default::default()
        })
        .is_err());
        assert!(DirectClean::from_config(DirectCleanConfig {
            fallback_subdirs: 16,
            fallback_tuple_size: 2,
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn empty_path_is_error() {
        assert!(DirectClean::default().clean_path("//").is_err());
    }

    #[test]
    fn overlong_segment_uses_fallback() {
        let layout = limited(100, 40, 2);
        let original = format!("dir/{}", "x".repeat(60));
        let digest = digest_bytes(DigestAlgorithm::Md5, original.as_bytes());
        assert_eq!(
            layout.clean_path(&original).unwrap(),
            format!("fallback/{}/{}/{digest}", &digest[..2], &digest[2..4])
        );
    }

    #[test]
    fn fallback_shrinks_to_fit() {
        let original = "a".repeat(50);
        let digest = digest_bytes(DigestAlgorithm::Md5, original.as_bytes());
        // No room for tuples.
        assert_eq!(limited(41, 40, 2).clean_path(&original).unwrap(), format!("fallback/{digest}"));
        // No room for the folder either.
        assert_eq!(limited(35, 40, 2).clean_path(&original).unwrap(), digest);
        // Digest truncated.
        assert_eq!(limited(10, 40, 2).clean_path(&original).unwrap(), &digest[..10]);
        assert_eq!(limited(100, 5, 2).clean_path(&original).unwrap(), &digest[..5]);
    }

    #[test]
    fn config_serializes_camel_case() {
        let json = DirectClean::default().config_json().unwrap();
        assert_eq!(json["maxPathnameLen"], 32_000);
        assert_eq!(json["fallbackDigestAlgorithm"], "md5");
        assert!(json.get("replacementString").is_none());
        let parsed = DirectClean::from_json(br#"{"extensionName":"NNNN-direct-clean-path-layout","utfEncode":true}"#)
            .unwrap();
        assert!(parsed.config().utf_encode);
    }

    proptest! {
        #[test]
        fn fallback_never_errors_and_fits(
            path in "[a-z ?:/]{0,30}[a-z]{1,200}",
            max_path in 1usize..120,
            max_file in 1usize..60,
        ) {
            let layout = limited(max_path, max_file, 3);
            let cleaned = layout.clean_path(&path).unwrap();
            prop_assert!(cleaned.len() <= max_path);
            prop_assert!(cleaned.split('/').all(|s| !s.is_empty() && s.len() <= max_file));
            prop_assert_eq!(cleaned, layout.clean_path(&path).unwrap());
        }

        #[test]
        fn escaped_segments_keep_no_unsafe_chars(segment in "\\PC{1,30}") {
            let cleaned = utf().clean_path(&segment.replace('/', "x")).unwrap();
            prop_assert!(!cleaned.chars().any(|c| UNSAFE_CHARS.contains(c) || c.is_whitespace()));
        }
    }
}
