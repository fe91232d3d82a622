/// Message and user recorded for a new version.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VersionInfo {
    pub message: String,
    pub user_name: String,
    pub user_address: String,
}

impl VersionInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, name: impl Into<String>, address: impl Into<String>) -> Self {
        self.user_name = name.into();
        self.user_address = address.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let info = VersionInfo::new("ingest").with_user("Alice", "mailto:alice@example.org");
        assert_eq!(info.message, "ingest");
        assert_eq!(info.user_name, "Alice");
        assert_eq!(info.user_address, "mailto:alice@example.org");
    }

    #[test]
    fn default_is_anonymous() {
        let info = VersionInfo::new("x");
        assert!(info.user_name.is_empty());
        assert!(info.user_address.is_empty());
    }
}
