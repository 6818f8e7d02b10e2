//! Container and object records returned by the storage service

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::listing::Named;

/// A container as listed by `GET {account}?format=json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub bytes: u64,
}

impl Named for ContainerRecord {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// An object as listed by `GET {account}/{container}?format=json`
///
/// The digests are filled in by a completed download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    /// Server-side ETag (lowercase MD5 hex)
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub md5_hex: Option<String>,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub sha1_hex: Option<String>,
}

impl ObjectRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Whether a computed MD5 matches the server-side hash
    pub fn md5_matches_etag(&self) -> Option<bool> {
        match (&self.md5_hex, &self.hash) {
            (Some(md5), Some(etag)) => Some(md5.eq_ignore_ascii_case(etag)),
            _ => None,
        }
    }
}

impl Named for ObjectRecord {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Outcome of a completed object download
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadResult {
    pub object_name: String,
    pub md5_hex: String,
    pub sha1_hex: String,
    pub local_path: PathBuf,
    pub bytes_written: u64,
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_listing_entry_parses() {
        let records: Vec<ObjectRecord> = serde_json::from_str(
            r#"[{"name": "a.txt", "bytes": 12, "content_type": "text/plain",
                 "last_modified": "2014-01-02T03:04:05.000000", "hash": "abc"}]"#,
        )
        .unwrap();
        assert_eq!(records[0].name.as_deref(), Some("a.txt"));
        assert_eq!(records[0].bytes, Some(12));
        assert_eq!(records[0].md5_hex, None);
    }

    #[test]
    fn test_object_without_name_parses() {
        let record: ObjectRecord = serde_json::from_str(r#"{"bytes": 1}"#).unwrap();
        assert_eq!(Named::name(&record), None);
    }

    #[test]
    fn test_container_defaults() {
        let record: ContainerRecord = serde_json::from_str(r#"{"name": "logs"}"#).unwrap();
        assert_eq!(record.bytes, 0);
        assert_eq!(record.count, 0);
    }

    #[test]
    fn test_md5_matches_etag() {
        let mut record = ObjectRecord::named("x");
        assert_eq!(record.md5_matches_etag(), None);
        record.hash = Some("d41d8cd98f00b204e9800998ecf8427e".into());
        record.md5_hex = Some("D41D8CD98F00B204E9800998ECF8427E".into());
        assert_eq!(record.md5_matches_etag(), Some(true));
    }
}
