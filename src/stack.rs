//! Stack files: a layer stack and a snapshot chain described side by side.
//!
//! ```yaml
//! diff_pairs:            # root -> leaf
//!   - diff_id: sha256:…
//!     blobsum: sha256:…
//! chain:                 # root -> leaf
//!   - diff_id: sha256:…
//!     blob: sha256:…
//!     media_type: application/vnd.oci.image.layer.v1.tar+gzip
//! ```

use std::path::Path;

use layertype_oci::{layer_media_types, CacheRef, DiffPair, MemoryChain, RefInfo};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::load_document;
use crate::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackFile {
    /// Expected digests, ordered root to leaf.
    pub diff_pairs: Vec<DiffPair>,
    /// Recorded snapshots, ordered root to leaf.
    #[serde(default)]
    pub chain: Vec<RefInfo>,
}

impl StackFile {
    /// Reconcile `diff_pairs` against `chain`.  The result is aligned with
    /// `diff_pairs`; untrusted layers have an empty media type.
    pub fn reconcile(&self) -> Vec<String> {
        let chain = MemoryChain::from_infos(self.chain.iter().cloned());
        let head = chain.head();
        let media_types = layer_media_types(&self.diff_pairs, head.as_ref());
        if let Some(head) = head {
            head.release();
        }

        if chain.outstanding() != 0 {
            warn!(outstanding = chain.outstanding(), "snapshot handles not released");
        }
        media_types
    }
}

pub fn load_stack(path: &Path) -> Result<StackFile> {
    load_document(path)
}
