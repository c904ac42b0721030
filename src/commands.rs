//! Implementations behind the `layertype` subcommands.

use std::path::Path;

use layertype_oci::{
    convert_layer_media_type, detect_compression_type, detect_layer_media_type, layer_media_type,
    BlobCache, ContentStore, LayerSchema,
};
use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::stack::load_stack;
use crate::{Error, Result};

/// Summary of a blob added to the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub digest: String,
    pub diff_id: String,
    pub compression: String,
    pub media_type: String,
}

/// Media type of a blob already in the cache.
pub fn detect(config: &Config, digest: &str) -> Result<&'static str> {
    let cache = BlobCache::new(config.cache_dir.clone());
    Ok(detect_layer_media_type(&cache, digest, config.schema)?)
}

/// Copy `file` into the cache and describe it.
pub async fn ingest(config: &Config, file: &Path) -> Result<IngestReport> {
    let data = tokio::fs::read(file).await?;
    let cache = BlobCache::new(config.cache_dir.clone());

    let digest = cache.ingest(&data).await?;

    // Sniffing and decompressing for the DiffID are synchronous reads.
    let cache_dir = config.cache_dir.clone();
    let schema = config.schema;
    let blob = digest.clone();
    let (compression, media_type, diff_id) = tokio::task::spawn_blocking(move || -> Result<_> {
        let cache = BlobCache::new(cache_dir);
        let compression = detect_compression_type(cache.reader_at(&blob)?)?;
        let media_type = layer_media_type(compression, schema, &blob)?;
        let diff_id = cache.diff_id(&blob)?;
        Ok((compression, media_type, diff_id))
    })
    .await
    .map_err(|e| Error::Task(format!("layer inspection task failed: {e}")))??;

    info!(
        file = %file.display(),
        %digest,
        %diff_id,
        media_type,
        "ingested layer",
    );

    Ok(IngestReport {
        digest,
        diff_id,
        compression: compression.to_string(),
        media_type: media_type.to_string(),
    })
}

/// Convert `media_type` to the naming convention of `schema`.
pub fn convert(media_type: &str, schema: LayerSchema) -> String {
    convert_layer_media_type(media_type, schema).to_string()
}

/// Reconcile the stack file at `path`.
pub fn reconcile(path: &Path) -> Result<Vec<String>> {
    let stack = load_stack(path)?;
    Ok(stack.reconcile())
}
