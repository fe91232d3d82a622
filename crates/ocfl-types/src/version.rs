use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// An OCFL version name.
///
/// Versions are `v1`, `v2`, ... or, for objects created with a fixed width,
/// zero-padded (`v001`, `v002`). The padding width is part of the value so
/// that `next()` keeps the object's naming scheme.
#[derive(Clone, Copy, Debug, Eq)]
pub struct VersionNumber {
    number: u32,
    /// Total digit count for zero-padded names, 0 when unpadded.
    padding: usize,
}

impl VersionNumber {
    /// The first unpadded version, `v1`.
    pub const FIRST: Self = Self {
        number: 1,
        padding: 0,
    };

    /// Create an unpadded version number. Returns `None` for `0`.
    pub fn new(number: u32) -> Option<Self> {
        (number > 0).then_some(Self { number, padding: 0 })
    }

    /// Create a zero-padded version number with `width` digits.
    pub fn padded(number: u32, width: usize) -> Result<Self, TypeError> {
        let candidate = Self {
            number,
            padding: width,
        };
        if number == 0 || (width > 0 && number.to_string().len() > width) {
            return Err(TypeError::InvalidVersion(candidate.to_string()));
        }
        Ok(candidate)
    }

    /// The numeric part.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// The padding width (0 = unpadded).
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// The following version with the same padding.
    pub fn next(&self) -> Result<Self, TypeError> {
        let number = self
            .number
            .checked_add(1)
            .ok_or_else(|| TypeError::VersionOverflow(self.to_string()))?;
        if self.padding > 0 && number.to_string().len() > self.padding {
            return Err(TypeError::VersionOverflow(self.to_string()));
        }
        Ok(Self {
            number,
            padding: self.padding,
        })
    }

    /// The preceding version, or `None` for the first.
    pub fn previous(&self) -> Option<Self> {
        (self.number > 1).then(|| Self {
            number: self.number - 1,
            padding: self.padding,
        })
    }
}

impl PartialEq for VersionNumber {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
    }
}

impl Hash for VersionNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.number.hash(state);
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number.cmp(&other.number)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.padding > 0 {
            write!(f, "v{:0width$}", self.number, width = self.padding)
        } else {
            write!(f, "v{}", self.number)
        }
    }
}

impl FromStr for VersionNumber {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypeError::InvalidVersion(s.to_string());
        let digits = s.strip_prefix('v').ok_or_else(invalid)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let number: u32 = digits.parse().map_err(|_| invalid())?;
        if number == 0 {
            return Err(invalid());
        }
        let padding = if digits.starts_with('0') { digits.len() } else { 0 };
        Ok(Self { number, padding })
    }
}

impl Serialize for VersionNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn padding_does_not_change_identity() {
        let plain: VersionNumber = "v1".parse().unwrap();
        let padded: VersionNumber = "v001".parse().unwrap();
        assert_eq!(plain, padded);
        let set: HashSet<VersionNumber> = [plain, padded].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert!(set.contains(&VersionNumber::padded(1, 5).unwrap()));
    }

    #[test]
    fn parse_unpadded() {
        let v: VersionNumber = "v12".parse().unwrap();
        assert_eq!(v.number(), 12);
        assert_eq!(v.padding(), 0);
        assert_eq!(v.to_string(), "v12");
    }

    #[test]
    fn parse_padded_preserves_width() {
        let v: VersionNumber = "v003".parse().unwrap();
        assert_eq!(v.number(), 3);
        assert_eq!(v.padding(), 3);
        assert_eq!(v.next().unwrap().to_string(), "v004");
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "v", "1", "v0", "v00", "V1", "v1a", "v-1"] {
            assert!(bad.parse::<VersionNumber>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn padded_overflow() {
        let v: VersionNumber = "v99".parse().unwrap();
        assert_eq!(v.next().unwrap().to_string(), "v100");
        let padded: VersionNumber = "v09".parse().unwrap();
        assert_eq!(padded.next().unwrap().to_string(), "v10");
        let full: VersionNumber = "v099".parse().unwrap();
        assert_eq!(full.next().unwrap().to_string(), "v100");
        let capped = VersionNumber::padded(99, 2).unwrap();
        assert!(capped.next().is_err());
    }

    #[test]
    fn previous_of_first_is_none() {
        assert!(VersionNumber::FIRST.previous().is_none());
        let v3 = VersionNumber::new(3).unwrap();
        assert_eq!(v3.previous().unwrap().number(), 2);
    }

    #[test]
    fn ordering_is_numeric() {
        let v2: VersionNumber = "v2".parse().unwrap();
        let v10: VersionNumber = "v10".parse().unwrap();
        assert!(v2 < v10);
    }

    #[test]
    fn serde_as_string() {
        let v = VersionNumber::padded(7, 3).unwrap();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"v007\"");
        let back: VersionNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
        assert_eq!(back.padding(), 3);
    }

    proptest! {
        #[test]
        fn display_parse_roundtrip(n in 1u32..1_000_000) {
            let v = VersionNumber::new(n).unwrap();
            let parsed: VersionNumber = v.to_string().parse().unwrap();
            prop_assert_eq!(parsed.number(), n);
            prop_assert_eq!(parsed.padding(), 0);
        }
    }
}
