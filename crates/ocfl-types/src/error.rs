use std::fmt;

use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown digest algorithm: {0}")]
    UnknownDigestAlgorithm(String),

    #[error("invalid version number: {0}")]
    InvalidVersion(String),

    #[error("version number overflow: {0} has no successor at its padding width")]
    VersionOverflow(String),
}

/// Coarse classification shared by the error enums of every crate.
///
/// Each crate keeps its own `thiserror` enum; `kind()` on those enums maps
/// the variant into this taxonomy so callers can branch without matching
/// every crate's variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad, missing, or unknown configuration (including unknown algorithms).
    Configuration,
    /// Sanitization or layout failure, not-found, wrong-area extraction.
    Path,
    /// Digest or manifest mismatch, missing state entry.
    Integrity,
    /// Wrapped backend I/O failure.
    Filesystem,
    /// Combined independent errors from a fan-out dispatch.
    Aggregate,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::Path => "path",
            Self::Integrity => "integrity",
            Self::Filesystem => "filesystem",
            Self::Aggregate => "aggregate",
        };
        f.write_str(name)
    }
}

/// A list of independent errors collected while running every consumer of
/// a fan-out to completion.
#[derive(Debug, PartialEq, Eq)]
pub struct ErrorList<E> {
    errors: Vec<E>,
}

impl<E> ErrorList<E> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Append an error.
    pub fn push(&mut self, error: E) {
        self.errors.push(error);
    }

    /// Record the error of `result`, if any, and return its success value.
    pub fn collect<T>(&mut self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }

    /// Number of collected errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` if nothing failed.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The collected errors in the order they were recorded.
    pub fn errors(&self) -> &[E] {
        &self.errors
    }

    /// Consume the list, returning the inner errors.
    pub fn into_inner(self) -> Vec<E> {
        self.errors
    }

    /// `Ok(())` if empty, otherwise the list wrapped by `wrap`.
    ///
    /// A list holding exactly one error yields that error unwrapped so that
    /// single failures keep their precise variant.
    pub fn into_result<F>(mut self, wrap: F) -> Result<(), E>
    where
        F: FnOnce(Self) -> E,
    {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(wrap(self)),
        }
    }
}

impl<E> Default for ErrorList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> FromIterator<E> for ErrorList<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl<E: fmt::Display> fmt::Display for ErrorList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors occurred", self.errors.len())?;
        for (i, e) in self.errors.iter().enumerate() {
            write!(f, "; [{}] {e}", i + 1)?;
        }
        Ok(())
    }
}

impl<E: std::error::Error + 'static> std::error::Error for ErrorList<E> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq, Error)]
    enum Sample {
        #[error("leaf {0}")]
        Leaf(u8),
        #[error("{0}")]
        Many(ErrorList<Sample>),
    }

    #[test]
    fn empty_list_is_ok() {
        let list: ErrorList<Sample> = ErrorList::new();
        assert!(list.into_result(Sample::Many).is_ok());
    }

    #[test]
    fn single_error_is_unwrapped() {
        let mut list = ErrorList::new();
        list.push(Sample::Leaf(1));
        assert_eq!(list.into_result(Sample::Many).unwrap_err(), Sample::Leaf(1));
    }

    #[test]
    fn multiple_errors_are_wrapped() {
        let list: ErrorList<Sample> = vec![Sample::Leaf(1), Sample::Leaf(2)].into_iter().collect();
        let err = list.into_result(Sample::Many).unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("2 errors occurred"));
        assert!(text.contains("[1] leaf 1"));
        assert!(text.contains("[2] leaf 2"));
    }

    #[test]
    fn collect_keeps_success_values() {
        let mut list = ErrorList::new();
        assert_eq!(list.collect::<u8>(Ok(3)), Some(3));
        assert_eq!(list.collect::<u8>(Err(Sample::Leaf(9))), None);
        assert_eq!(list.len(), 1);
        assert_eq!(list.errors(), &[Sample::Leaf(9)]);
    }

    #[test]
    fn kind_display() {
        assert_eq!(ErrorKind::Integrity.to_string(), "integrity");
        assert_eq!(ErrorKind::Aggregate.to_string(), "aggregate");
    }
}
