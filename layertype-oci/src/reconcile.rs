use tracing::debug;

use crate::chain::{CacheRef, ChainCursor};
use crate::layer::DiffPair;

/// Recover recorded media types for a stack of layers from a cached chain.
///
/// `diff_pairs` is ordered parent to child; `head` is the child-most
/// snapshot.  The chain is walked from `head` towards the root while each
/// snapshot's digests agree with the corresponding pair.  The walk stops at
/// the first mismatch or when the chain runs out, and that layer plus all of
/// its ancestors keep an empty media type: nothing below a layer that fails
/// to verify can be trusted.
///
/// The returned vector is aligned index for index with `diff_pairs`.  Every
/// handle acquired during the walk is released before returning; `head`
/// itself is left to the caller.
pub fn layer_media_types<R: CacheRef>(diff_pairs: &[DiffPair], head: Option<&R>) -> Vec<String> {
    let n = diff_pairs.len();
    let mut media_types = vec![String::new(); n];

    let mut cursor = ChainCursor::new(head.map(CacheRef::clone_ref));

    // diff_pairs runs parent->child but the chain runs child->parent.
    for i in 0..n {
        let idx = n - 1 - i;
        let expected = &diff_pairs[idx];

        let Some(info) = cursor.info() else {
            debug!(index = idx, "ref chain exhausted");
            break;
        };

        if !info.matches(expected) {
            debug!(
                index = idx,
                expected_diff_id = %expected.diff_id,
                expected_blob = %expected.blobsum,
                diff_id = %info.diff_id,
                blob = %info.blob,
                "layer digests diverge from ref chain",
            );
            break;
        }

        media_types[idx] = info.media_type;
        cursor.advance();
    }

    media_types
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
