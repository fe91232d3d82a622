//! Structured validation issues with OCFL error and warning codes.

use std::fmt;

/// How serious a validation finding is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// The object is not valid OCFL.
    Error,
    /// Valid, but not following a recommendation.
    Warning,
    /// Informational only.
    Info,
}

/// A single finding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    /// OCFL code such as `E040` or `W004`.
    pub code: &'static str,
    pub severity: Severity,
    pub description: String,
    /// The id, version or path the finding is about.
    pub context: String,
}

impl ValidationIssue {
    pub fn error(code: &'static str, description: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            description: description.into(),
            context: context.into(),
        }
    }

    pub fn warning(code: &'static str, description: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            description: description.into(),
            context: context.into(),
        }
    }

    pub fn info(description: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            code: "I000",
            severity: Severity::Info,
            description: description.into(),
            context: context.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.code, self.description, self.context)
    }
}

/// Every finding of a validation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no issue has [`Severity::Error`].
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        self.issues.extend(issues);
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    /// Whether any issue carries `code`.
    pub fn has_code(&self, code: &str) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors: Vec<String> = self.errors().map(ToString::to_string).collect();
        write!(
            f,
            "{} error(s), {} warning(s)",
            errors.len(),
            self.warnings().count()
        )?;
        if !errors.is_empty() {
            write!(f, ": {}", errors.join("; "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_keep_report_valid() {
        let mut report = ValidationReport::new();
        report.push(ValidationIssue::warning("W004", "sha256 used", "obj"));
        report.push(ValidationIssue::info("note", "obj"));
        assert!(report.is_valid());
        report.push(ValidationIssue::error("E040", "wrong head", "obj"));
        assert!(!report.is_valid());
        assert!(report.has_code("E040"));
        assert_eq!(report.errors().count(), 1);
        assert!(report.to_string().starts_with("1 error(s), 1 warning(s)"));
    }
}
