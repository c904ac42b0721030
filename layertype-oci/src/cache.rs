use crate::error::{OciError, Result};
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::compression::{detect_compression_type, CompressionType};

// ---------------------------------------------------------------------------
// ContentStore
// ---------------------------------------------------------------------------

/// A digest-addressed blob source.
pub trait ContentStore {
    type Reader: Read + Seek;

    /// Open a random-access reader over the blob stored under `digest`.
    fn reader_at(&self, digest: &str) -> Result<Self::Reader>;
}

// ---------------------------------------------------------------------------
// BlobCache
// ---------------------------------------------------------------------------

/// Content-addressed blob cache stored under `<cache_dir>/blobs/sha256/<hex>`.
pub struct BlobCache {
    cache_dir: PathBuf,
}

impl BlobCache {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Directory that holds all blobs: `<cache_dir>/blobs/sha256/`.
    fn blobs_dir(&self) -> PathBuf {
        self.cache_dir.join("blobs").join("sha256")
    }

    /// Check whether a blob for `digest` already exists on disk.
    pub fn has_blob(&self, digest: &str) -> bool {
        self.blob_path(digest).map(|p| p.exists()).unwrap_or(false)
    }

    /// Return the expected path for a blob with the given digest.
    pub fn blob_path(&self, digest: &str) -> Result<PathBuf> {
        Ok(self.blobs_dir().join(hex_from_digest(digest)?))
    }

    /// Persist `data` into the cache under `digest`, after checking that the
    /// bytes actually hash to it.  Returns the file path.
    pub async fn store_blob(&self, digest: &str, data: &[u8]) -> Result<PathBuf> {
        let expected = hex_from_digest(digest)?;
        let actual = hex_digest(data);
        if actual != expected {
            return Err(OciError::DigestMismatch {
                expected: expected.to_string(),
                actual,
            });
        }

        let dir = self.blobs_dir();
        fs::create_dir_all(&dir).await?;

        let path = dir.join(expected);
        let dest = path.clone();
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &dest, &data))
            .await
            .map_err(|e| OciError::Io(io::Error::other(format!("blob write task failed: {e}"))))??;
        debug!(path = %path.display(), "stored blob");
        Ok(path)
    }

    /// Check that the blob for `digest` exists and hashes to `digest`.
    pub async fn verify_blob(&self, digest: &str) -> Result<bool> {
        let expected = hex_from_digest(digest)?;
        match fs::read(self.blob_path(digest)?).await {
            Ok(bytes) => Ok(hex_digest(&bytes) == expected),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Store `data` under its own SHA-256 digest.  Returns the digest.
    ///
    /// An existing blob is only reused when its contents still match the
    /// digest; a corrupt one is overwritten.
    pub async fn ingest(&self, data: &[u8]) -> Result<String> {
        let digest = sha256_digest(data);
        if self.verify_blob(&digest).await? {
            debug!(%digest, "blob already cached");
            return Ok(digest);
        }
        if self.has_blob(&digest) {
            warn!(%digest, "cached blob does not match its digest, rewriting");
        }
        self.store_blob(&digest, data).await?;
        Ok(digest)
    }

    /// Compute the DiffID of a stored layer: the digest of its uncompressed
    /// contents.
    pub fn diff_id(&self, digest: &str) -> Result<String> {
        let mut reader = self.reader_at(digest)?;
        let compression = detect_compression_type(&mut reader)?;
        reader.rewind()?;

        let mut hasher = Sha256::new();
        match compression {
            CompressionType::Gzip => {
                io::copy(&mut GzDecoder::new(reader), &mut hasher)?;
            }
            _ => {
                io::copy(&mut reader, &mut hasher)?;
            }
        }
        Ok(format!("sha256:{}", hex_encode(&hasher.finalize())))
    }

    /// Return a reference to the underlying cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

impl ContentStore for BlobCache {
    type Reader = std::fs::File;

    fn reader_at(&self, digest: &str) -> Result<Self::Reader> {
        let path = self.blob_path(digest)?;
        match std::fs::File::open(&path) {
            Ok(f) => Ok(f),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(OciError::NotFound(digest.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `data` to a temporary file in `dir`, then rename it onto `dest`.
/// Readers never see a partially written blob.
fn write_atomic(dir: &Path, dest: &Path, data: &[u8]) -> Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Digest helpers
// ---------------------------------------------------------------------------

/// Extract the hex portion from a digest string like "sha256:abcdef…".
///
/// A bare hex string is accepted as well.
pub fn hex_from_digest(digest: &str) -> Result<&str> {
    let hex = digest.strip_prefix("sha256:").unwrap_or(digest);
    let valid = hex.len() == 64 && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if valid {
        Ok(hex)
    } else {
        Err(OciError::InvalidDigest(digest.to_string()))
    }
}

/// `sha256:<hex>` digest of `data`.
pub fn sha256_digest(data: &[u8]) -> String {
    format!("sha256:{}", hex_digest(data))
}

/// Compute the SHA-256 hex digest of `data`.
fn hex_digest(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    hex_encode(&hash)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
