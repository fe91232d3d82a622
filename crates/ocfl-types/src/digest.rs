use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// A digest algorithm recognised by OCFL inventories and extensions.
///
/// The string form is the lowercase identifier used in `inventory.json`
/// (`digestAlgorithm`, fixity block keys) and in extension configs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
    Blake2b160,
    Blake2b256,
    Blake2b384,
    Blake2b512,
}

impl DigestAlgorithm {
    /// Every supported algorithm, in identifier order.
    pub const ALL: [Self; 8] = [
        Self::Md5,
        Self::Sha1,
        Self::Sha256,
        Self::Sha512,
        Self::Blake2b160,
        Self::Blake2b256,
        Self::Blake2b384,
        Self::Blake2b512,
    ];

    /// The lowercase OCFL identifier.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Blake2b160 => "blake2b-160",
            Self::Blake2b256 => "blake2b-256",
            Self::Blake2b384 => "blake2b-384",
            Self::Blake2b512 => "blake2b-512",
        }
    }

    /// Length of the digest in bytes.
    pub const fn output_len(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 | Self::Blake2b160 => 20,
            Self::Sha256 | Self::Blake2b256 => 32,
            Self::Blake2b384 => 48,
            Self::Sha512 | Self::Blake2b512 => 64,
        }
    }

    /// Length of the lowercase hex rendering of the digest.
    pub const fn hex_len(&self) -> usize {
        self.output_len() * 2
    }

    /// Whether OCFL permits this algorithm as an inventory's primary digest.
    pub const fn is_content_algorithm(&self) -> bool {
        matches!(self, Self::Sha256 | Self::Sha512)
    }

    /// Returns `true` if `value` has the shape of a hex digest of this algorithm.
    pub fn is_valid_digest(&self, value: &str) -> bool {
        value.len() == self.hex_len() && value.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|alg| alg.as_str() == lower)
            .ok_or_else(|| TypeError::UnknownDigestAlgorithm(s.to_string()))
    }
}

impl Serialize for DigestAlgorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DigestAlgorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
