//! Layer media-type plumbing for OCI and Docker images.
//!
//! - [`compression`] sniffs the compression of a layer blob.
//! - [`media_type`] maps a compression onto the canonical layer media type
//!   of either naming convention, and converts between the two.
//! - [`reconcile`] recovers already-recorded media types by walking a chain
//!   of cached layer snapshots ([`chain::CacheRef`]).
//! - [`cache`] is a digest-addressed blob store implementing
//!   [`cache::ContentStore`].

pub mod cache;
pub mod chain;
pub mod compression;
pub mod error;
pub mod layer;
pub mod media_type;
pub mod reconcile;

pub use cache::{BlobCache, ContentStore};
pub use chain::{CacheRef, ChainCursor, MemoryChain, SnapshotRef};
pub use compression::{detect_compression_type, CompressionType};
pub use error::{OciError, Result};
pub use layer::{DiffPair, RefInfo};
pub use media_type::{convert_layer_media_type, layer_media_type, LayerSchema};
pub use reconcile::layer_media_types;

use tracing::debug;

/// Detect the media type of a stored layer blob from its leading bytes.
pub fn detect_layer_media_type<S: ContentStore>(
    store: &S,
    digest: &str,
    schema: LayerSchema,
) -> Result<&'static str> {
    let reader = store.reader_at(digest)?;
    let compression = detect_compression_type(reader)?;
    let media_type = layer_media_type(compression, schema, digest)?;
    debug!(digest, %compression, media_type, "detected layer media type");
    Ok(media_type)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_type::{
        MEDIA_TYPE_DOCKER_LAYER, MEDIA_TYPE_DOCKER_LAYER_GZIP, MEDIA_TYPE_OCI_LAYER,
        MEDIA_TYPE_OCI_LAYER_GZIP,
    };
    use std::collections::HashMap;
    use std::io::{self, Cursor, Read, Seek, SeekFrom};

    /// In-memory store keyed by digest.
    #[derive(Default)]
    struct MemStore(HashMap<String, Vec<u8>>);

    impl ContentStore for MemStore {
        type Reader = Cursor<Vec<u8>>;

        fn reader_at(&self, digest: &str) -> Result<Self::Reader> {
            self.0
                .get(digest)
                .cloned()
                .map(Cursor::new)
                .ok_or_else(|| OciError::NotFound(digest.to_string()))
        }
    }

    /// Store whose readers fail on first read.
    struct BrokenStore;

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "backend went away"))
        }
    }

    impl Seek for BrokenReader {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Ok(0)
        }
    }

    impl ContentStore for BrokenStore {
        type Reader = BrokenReader;

        fn reader_at(&self, _digest: &str) -> Result<Self::Reader> {
            Ok(BrokenReader)
        }
    }

    fn store() -> MemStore {
        let mut s = MemStore::default();
        s.0.insert("sha256:gz".into(), vec![0x1f, 0x8b, 0x08, 0x00, 0x00]);
        s.0.insert("sha256:tar".into(), b"etc/\0\0\0\0".to_vec());
        s.0.insert("sha256:empty".into(), Vec::new());
        s
    }

    #[test]
    fn detects_gzip_layer() {
        let s = store();
        assert_eq!(
            detect_layer_media_type(&s, "sha256:gz", LayerSchema::Oci).unwrap(),
            MEDIA_TYPE_OCI_LAYER_GZIP
        );
        assert_eq!(
            detect_layer_media_type(&s, "sha256:gz", LayerSchema::Docker).unwrap(),
            MEDIA_TYPE_DOCKER_LAYER_GZIP
        );
    }

    #[test]
    fn detects_uncompressed_layer() {
        let s = store();
        assert_eq!(
            detect_layer_media_type(&s, "sha256:tar", LayerSchema::Oci).unwrap(),
            MEDIA_TYPE_OCI_LAYER
        );
    }

    #[test]
    fn empty_layer_is_uncompressed() {
        let s = store();
        assert_eq!(
            detect_layer_media_type(&s, "sha256:empty", LayerSchema::Docker).unwrap(),
            MEDIA_TYPE_DOCKER_LAYER
        );
    }

    #[test]
    fn missing_blob_is_not_found() {
        let err = detect_layer_media_type(&store(), "sha256:nope", LayerSchema::Oci).unwrap_err();
        assert!(matches!(err, OciError::NotFound(_)));
    }

    #[test]
    fn read_failure_propagates_io_error() {
        let err = detect_layer_media_type(&BrokenStore, "sha256:any", LayerSchema::Oci).unwrap_err();
        match err {
            OciError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
