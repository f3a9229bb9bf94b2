/// Opaque serialized document state.
use std::fmt;

use serde::{Deserialize, Serialize};

/// The full state of a document at one instant, as produced by the
/// document's own serializer.
///
/// The history never looks inside a snapshot; entries are only told apart by
/// their position in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(String);

impl Snapshot {
    pub fn new(data: impl Into<String>) -> Self {
        Self(data.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Size of the serialized data in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Snapshot {
    fn from(data: String) -> Self {
        Self(data)
    }
}

impl From<&str> for Snapshot {
    fn from(data: &str) -> Self {
        Self(data.to_string())
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_plain_string() {
        let snap = Snapshot::new(r#"{"objects":[]}"#);
        let json = serde_json::to_string(&snap).unwrap();
        assert_eq!(json, r#""{\"objects\":[]}""#);
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn test_len_counts_bytes() {
        assert_eq!(Snapshot::from("héllo").len(), 6);
        assert!(Snapshot::from("").is_empty());
    }
}
