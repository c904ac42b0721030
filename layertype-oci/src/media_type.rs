use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::compression::CompressionType;
use crate::{OciError, Result};

// ---------------------------------------------------------------------------
// Layer media type constants
// ---------------------------------------------------------------------------

pub const MEDIA_TYPE_OCI_LAYER: &str = "application/vnd.oci.image.layer.v1.tar";
pub const MEDIA_TYPE_OCI_LAYER_GZIP: &str = "application/vnd.oci.image.layer.v1.tar+gzip";
pub const MEDIA_TYPE_DOCKER_LAYER: &str = "application/vnd.docker.image.rootfs.diff.tar";
pub const MEDIA_TYPE_DOCKER_LAYER_GZIP: &str = "application/vnd.docker.image.rootfs.diff.tar.gzip";

/// Conversion to the OCI naming convention.
const TO_OCI_LAYER_TYPE: [(&str, &str); 4] = [
    (MEDIA_TYPE_OCI_LAYER, MEDIA_TYPE_OCI_LAYER),
    (MEDIA_TYPE_DOCKER_LAYER, MEDIA_TYPE_OCI_LAYER),
    (MEDIA_TYPE_OCI_LAYER_GZIP, MEDIA_TYPE_OCI_LAYER_GZIP),
    (MEDIA_TYPE_DOCKER_LAYER_GZIP, MEDIA_TYPE_OCI_LAYER_GZIP),
];

/// Conversion to the Docker schema 2 naming convention.
const TO_DOCKER_LAYER_TYPE: [(&str, &str); 4] = [
    (MEDIA_TYPE_OCI_LAYER, MEDIA_TYPE_DOCKER_LAYER),
    (MEDIA_TYPE_DOCKER_LAYER, MEDIA_TYPE_DOCKER_LAYER),
    (MEDIA_TYPE_OCI_LAYER_GZIP, MEDIA_TYPE_DOCKER_LAYER_GZIP),
    (MEDIA_TYPE_DOCKER_LAYER_GZIP, MEDIA_TYPE_DOCKER_LAYER_GZIP),
];

// ---------------------------------------------------------------------------
// LayerSchema
// ---------------------------------------------------------------------------

/// Naming convention an image manifest follows for its layer media types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerSchema {
    /// OCI image-spec (`application/vnd.oci.image.layer.v1.*`).
    #[default]
    Oci,
    /// Docker image manifest schema 2 (`application/vnd.docker.image.rootfs.*`).
    Docker,
}

impl LayerSchema {
    /// Map an "use OCI media types" flag onto a schema.
    pub fn from_oci_flag(oci: bool) -> Self {
        if oci {
            LayerSchema::Oci
        } else {
            LayerSchema::Docker
        }
    }

    pub fn is_oci(self) -> bool {
        self == LayerSchema::Oci
    }
}

impl fmt::Display for LayerSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerSchema::Oci => write!(f, "oci"),
            LayerSchema::Docker => write!(f, "docker"),
        }
    }
}

impl FromStr for LayerSchema {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oci" => Ok(LayerSchema::Oci),
            "docker" => Ok(LayerSchema::Docker),
            other => Err(format!("unknown layer schema '{other}', expected 'oci' or 'docker'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution and conversion
// ---------------------------------------------------------------------------

/// Canonical layer media type for a blob of the given compression.
///
/// `digest` identifies the blob in the error when `compression` is
/// [`CompressionType::Unknown`].
pub fn layer_media_type(
    compression: CompressionType,
    schema: LayerSchema,
    digest: &str,
) -> Result<&'static str> {
    match (compression, schema) {
        (CompressionType::Uncompressed, LayerSchema::Oci) => Ok(MEDIA_TYPE_OCI_LAYER),
        (CompressionType::Uncompressed, LayerSchema::Docker) => Ok(MEDIA_TYPE_DOCKER_LAYER),
        (CompressionType::Gzip, LayerSchema::Oci) => Ok(MEDIA_TYPE_OCI_LAYER_GZIP),
        (CompressionType::Gzip, LayerSchema::Docker) => Ok(MEDIA_TYPE_DOCKER_LAYER_GZIP),
        (CompressionType::Unknown, _) => Err(OciError::DetectionFailed {
            digest: digest.to_string(),
        }),
    }
}

/// Convert a layer media type to the naming convention of `schema`.
///
/// Unrecognised media types are returned unchanged, with a warning.
pub fn convert_layer_media_type(media_type: &str, schema: LayerSchema) -> &str {
    let table = match schema {
        LayerSchema::Oci => &TO_OCI_LAYER_TYPE,
        LayerSchema::Docker => &TO_DOCKER_LAYER_TYPE,
    };

    match table.iter().find(|(from, _)| *from == media_type) {
        Some(&(_, to)) => to,
        None => {
            warn!(media_type, %schema, "unhandled conversion for media type");
            media_type
        }
    }
}

/// Returns `true` when `media_type` is one of the four canonical layer types.
pub fn is_layer_media_type(media_type: &str) -> bool {
    TO_OCI_LAYER_TYPE.iter().any(|(from, _)| *from == media_type)
}

/// Compression implied by a canonical layer media type.
pub fn compression_of(media_type: &str) -> CompressionType {
    match media_type {
        MEDIA_TYPE_OCI_LAYER | MEDIA_TYPE_DOCKER_LAYER => CompressionType::Uncompressed,
        MEDIA_TYPE_OCI_LAYER_GZIP | MEDIA_TYPE_DOCKER_LAYER_GZIP => CompressionType::Gzip,
        _ => CompressionType::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
