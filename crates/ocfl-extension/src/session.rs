use std::collections::BTreeMap;

use ocfl_types::VersionNumber;
use serde_json::Value;

/// State of one object update, passed explicitly to every hook.
///
/// Extensions are shared between sessions and hold no mutable state of
/// their own. What they learn while an object is updated (stream results,
/// reloaded statistics) is recorded here, keyed by extension name and then
/// by an extension-chosen key, usually the logical path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    object_id: String,
    version: Option<VersionNumber>,
    records: BTreeMap<String, BTreeMap<String, Value>>,
}

impl Session {
    pub fn new(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            ..Default::default()
        }
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// The version being written, once opened.
    pub fn version(&self) -> Option<VersionNumber> {
        self.version
    }

    pub fn set_version(&mut self, version: VersionNumber) {
        self.version = Some(version);
    }

    /// Store `value` for `extension` under `key`, replacing any previous one.
    pub fn record(&mut self, extension: &str, key: impl Into<String>, value: Value) {
        self.records
            .entry(extension.to_string())
            .or_default()
            .insert(key.into(), value);
    }

    /// Every record of `extension`.
    pub fn records(&self, extension: &str) -> Option<&BTreeMap<String, Value>> {
        self.records.get(extension)
    }

    pub fn get(&self, extension: &str, key: &str) -> Option<&Value> {
        self.records.get(extension).and_then(|r| r.get(key))
    }

    /// Remove and return one record.
    pub fn take(&mut self, extension: &str, key: &str) -> Option<Value> {
        self.records.get_mut(extension).and_then(|r| r.remove(key))
    }
}
