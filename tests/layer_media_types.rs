//! End-to-end tests for layertype: config loading, blob cache -> detection ->
//! resolution, stack files -> reconciliation, and media-type conversion.
//!
//! ```bash
//! cargo test --test layer_media_types
//! ```

use std::fs;
use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

use layertype::oci::media_type::{
    MEDIA_TYPE_DOCKER_LAYER, MEDIA_TYPE_DOCKER_LAYER_GZIP, MEDIA_TYPE_OCI_LAYER,
    MEDIA_TYPE_OCI_LAYER_GZIP,
};
use layertype::oci::{LayerSchema, OciError};
use layertype::config::{ENV_CACHE_DIR, ENV_SCHEMA};
use layertype::{commands, Config, Error};

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

fn config(dir: &std::path::Path, schema: LayerSchema) -> Config {
    Config {
        cache_dir: dir.to_path_buf(),
        schema,
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Configuration
// ──────────────────────────────────────────────────────────────────────────────

#[test]
fn load_config_files_from_disk() {
    // Only this test reads the process environment; make sure it can't
    // override the file values.
    std::env::remove_var(ENV_CACHE_DIR);
    std::env::remove_var(ENV_SCHEMA);

    let tmp = tempfile::tempdir().unwrap();

    let yaml = tmp.path().join("layertype.yaml");
    fs::write(&yaml, "cache_dir: /srv/layertype\nschema: docker\n").unwrap();
    let cfg = Config::load(Some(&yaml)).unwrap();
    assert_eq!(cfg.cache_dir, std::path::PathBuf::from("/srv/layertype"));
    assert_eq!(cfg.schema, LayerSchema::Docker);

    let json = tmp.path().join("layertype.json");
    fs::write(&json, r#"{"cache_dir": "/var/lib/layertype", "schema": "oci"}"#).unwrap();
    let cfg = Config::load(Some(&json)).unwrap();
    assert_eq!(cfg.cache_dir, std::path::PathBuf::from("/var/lib/layertype"));
    assert_eq!(cfg.schema, LayerSchema::Oci);

    let bad = tmp.path().join("bad.yml");
    fs::write(&bad, "schema: appc\n").unwrap();
    assert!(matches!(Config::load(Some(&bad)), Err(Error::Config(_))));
}

// ──────────────────────────────────────────────────────────────────────────────
// Detection
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ingest_then_detect_gzip_layer() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path(), LayerSchema::Docker);

    let tar = b"usr/\0bin/\0pretend tar".to_vec();
    let file = tmp.path().join("layer.tar.gz");
    fs::write(&file, gzip(&tar)).unwrap();

    let report = commands::ingest(&cfg, &file).await.unwrap();
    assert_eq!(report.compression, "gzip");
    assert_eq!(report.media_type, MEDIA_TYPE_DOCKER_LAYER_GZIP);
    assert_eq!(report.diff_id, layertype::oci::cache::sha256_digest(&tar));

    assert_eq!(
        commands::detect(&cfg, &report.digest).unwrap(),
        MEDIA_TYPE_DOCKER_LAYER_GZIP
    );

    let oci = config(tmp.path(), LayerSchema::Oci);
    assert_eq!(
        commands::detect(&oci, &report.digest).unwrap(),
        MEDIA_TYPE_OCI_LAYER_GZIP
    );
}

#[tokio::test]
async fn empty_layer_detects_as_uncompressed() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path(), LayerSchema::Oci);

    let file = tmp.path().join("empty.tar");
    fs::write(&file, b"").unwrap();

    let report = commands::ingest(&cfg, &file).await.unwrap();
    assert_eq!(report.compression, "uncompressed");
    assert_eq!(report.media_type, MEDIA_TYPE_OCI_LAYER);
    assert_eq!(report.diff_id, report.digest);
    assert_eq!(
        commands::detect(&cfg, &report.digest).unwrap(),
        MEDIA_TYPE_OCI_LAYER
    );
}

#[test]
fn detect_missing_blob_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path(), LayerSchema::Oci);
    let digest = layertype::oci::cache::sha256_digest(b"never stored");

    let err = commands::detect(&cfg, &digest).unwrap_err();
    assert!(matches!(err, Error::Oci(OciError::NotFound(_))), "{err:?}");
}

// ──────────────────────────────────────────────────────────────────────────────
// Conversion
// ──────────────────────────────────────────────────────────────────────────────

#[test]
fn convert_round_trips_canonical_types() {
    for m in [
        MEDIA_TYPE_DOCKER_LAYER,
        MEDIA_TYPE_DOCKER_LAYER_GZIP,
    ] {
        let oci = commands::convert(m, LayerSchema::Oci);
        assert_eq!(commands::convert(&oci, LayerSchema::Docker), m);
    }
    assert_eq!(
        commands::convert(MEDIA_TYPE_OCI_LAYER_GZIP, LayerSchema::Docker),
        MEDIA_TYPE_DOCKER_LAYER_GZIP
    );
}

#[test]
fn convert_passes_unknown_through() {
    let unknown = "application/vnd.example.custom.layer";
    assert_eq!(commands::convert(unknown, LayerSchema::Oci), unknown);
    assert_eq!(commands::convert(unknown, LayerSchema::Docker), unknown);
}

// ──────────────────────────────────────────────────────────────────────────────
// Reconciliation
// ──────────────────────────────────────────────────────────────────────────────

#[test]
fn reconcile_stack_file_with_broken_middle_layer() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("stack.json");
    let stack = serde_json::json!({
        "diff_pairs": [
            {"diff_id": "sha256:d0", "blobsum": "sha256:b0"},
            {"diff_id": "sha256:d1", "blobsum": "sha256:b1"},
            {"diff_id": "sha256:d2", "blobsum": "sha256:b2"},
            {"diff_id": "sha256:d3", "blobsum": "sha256:b3"}
        ],
        "chain": [
            {"diff_id": "sha256:d0", "blob": "sha256:b0", "media_type": MEDIA_TYPE_OCI_LAYER},
            {"diff_id": "sha256:d1", "blob": "sha256:XX", "media_type": MEDIA_TYPE_OCI_LAYER},
            {"diff_id": "sha256:d2", "blob": "sha256:b2", "media_type": MEDIA_TYPE_DOCKER_LAYER},
            {"diff_id": "sha256:d3", "blob": "sha256:b3", "media_type": MEDIA_TYPE_OCI_LAYER_GZIP}
        ]
    });
    fs::write(&path, serde_json::to_vec(&stack).unwrap()).unwrap();

    let out = commands::reconcile(&path).unwrap();
    assert_eq!(
        out,
        vec![
            String::new(),
            String::new(),
            MEDIA_TYPE_DOCKER_LAYER.to_string(),
            MEDIA_TYPE_OCI_LAYER_GZIP.to_string(),
        ]
    );
}

#[test]
fn reconcile_yaml_stack_without_chain() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("stack.yml");
    fs::write(
        &path,
        "diff_pairs:\n  - diff_id: sha256:d0\n    blobsum: sha256:b0\n  - diff_id: sha256:d1\n    blobsum: sha256:b1\n",
    )
    .unwrap();

    let out = commands::reconcile(&path).unwrap();
    assert_eq!(out, vec![String::new(), String::new()]);
}

#[test]
fn reconcile_missing_file_is_config_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = commands::reconcile(&tmp.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
