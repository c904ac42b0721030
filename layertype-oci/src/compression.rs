use std::fmt;
use std::io::{ErrorKind, Read};

use tracing::debug;

use crate::error::Result;

/// Number of bytes sniffed from the head of a blob.  Large enough to hold
/// every signature in [`SIGNATURES`].
const SNIFF_LEN: usize = 10;

/// Magic-byte prefixes for the compression formats we recognise.
const SIGNATURES: &[(CompressionType, &[u8])] = &[(CompressionType::Gzip, &[0x1f, 0x8b, 0x08])];

/// Compression format of a layer blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionType {
    /// Plain tar stream.
    Uncompressed,
    /// gzip-compressed tar stream.
    Gzip,
    /// Classification failed.  Never produced by [`detect_compression_type`].
    Unknown,
}

impl CompressionType {
    /// Compression used for newly produced layers.
    pub const DEFAULT: CompressionType = CompressionType::Gzip;
}

impl Default for CompressionType {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionType::Uncompressed => write!(f, "uncompressed"),
            CompressionType::Gzip => write!(f, "gzip"),
            CompressionType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classify a blob by the magic bytes at the start of `reader`.
///
/// Reads at most [`SNIFF_LEN`] bytes.  A stream that ends early (including a
/// zero-byte blob) is not an error: whatever prefix was available is matched
/// against the signature table, and anything that doesn't match is treated
/// as uncompressed.  Any other read error is returned unchanged.
pub fn detect_compression_type<R: Read>(mut reader: R) -> Result<CompressionType> {
    let mut buf = [0u8; SNIFF_LEN];
    let mut n = 0;

    while n < buf.len() {
        match reader.read(&mut buf[n..]) {
            Ok(0) => break,
            Ok(read) => n += read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    let head = &buf[..n];
    let detected = SIGNATURES
        .iter()
        .find(|(_, magic)| head.starts_with(magic))
        .map(|(ct, _)| *ct)
        .unwrap_or(CompressionType::Uncompressed);

    debug!(sniffed = n, compression = %detected, "classified blob");
    Ok(detected)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
