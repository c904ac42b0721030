use serde::{Deserialize, Serialize};

/// Expected content hashes for one layer of an image.
///
/// Sequences of `DiffPair`s are ordered root to leaf: index 0 is the oldest
/// ancestor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiffPair {
    /// Digest of the uncompressed layer tar (e.g. "sha256:abcdef…").
    pub diff_id: String,
    /// Digest of the stored blob bytes, possibly compressed.
    pub blobsum: String,
}

impl DiffPair {
    pub fn new(diff_id: impl Into<String>, blobsum: impl Into<String>) -> Self {
        Self {
            diff_id: diff_id.into(),
            blobsum: blobsum.into(),
        }
    }
}

/// Metadata recorded on a cached layer snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefInfo {
    /// Digest of the uncompressed layer tar.
    pub diff_id: String,
    /// Digest of the stored blob.
    pub blob: String,
    /// Media type the blob was recorded with.
    pub media_type: String,
}

impl RefInfo {
    /// Returns `true` when both digests agree with `pair`.
    pub fn matches(&self, pair: &DiffPair) -> bool {
        self.diff_id == pair.diff_id && self.blob == pair.blobsum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(diff_id: &str, blob: &str) -> RefInfo {
        RefInfo {
            diff_id: diff_id.to_string(),
            blob: blob.to_string(),
            media_type: "application/vnd.oci.image.layer.v1.tar".to_string(),
        }
    }

    #[test]
    fn matches_requires_both_digests() {
        let pair = DiffPair::new("sha256:d1", "sha256:b1");
        assert!(info("sha256:d1", "sha256:b1").matches(&pair));
        assert!(!info("sha256:d1", "sha256:b2").matches(&pair));
        assert!(!info("sha256:d2", "sha256:b1").matches(&pair));
    }

    #[test]
    fn diff_pair_from_json() {
        let pairs: Vec<DiffPair> = serde_json::from_str(
            r#"[{"diff_id": "sha256:d1", "blobsum": "sha256:b1"}]"#,
        )
        .unwrap();
        assert_eq!(pairs, vec![DiffPair::new("sha256:d1", "sha256:b1")]);
    }
}
