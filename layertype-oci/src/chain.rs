use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::layer::RefInfo;

// ---------------------------------------------------------------------------
// CacheRef
// ---------------------------------------------------------------------------

/// A handle onto one immutable layer snapshot in a chain of cached layers.
///
/// Every handle obtained through [`CacheRef::clone_ref`] or
/// [`CacheRef::parent`] must be given back exactly once via
/// [`CacheRef::release`].
pub trait CacheRef: Sized {
    /// Digests and media type recorded on this snapshot.
    fn info(&self) -> RefInfo;

    /// A new handle onto the parent snapshot, or `None` at the root.
    fn parent(&self) -> Option<Self>;

    /// A new handle onto the same snapshot.
    fn clone_ref(&self) -> Self;

    /// Give up this handle's claim on the snapshot.
    fn release(self);
}

// ---------------------------------------------------------------------------
// ChainCursor
// ---------------------------------------------------------------------------

/// Owns at most one handle while walking a chain from child to parent.
///
/// The handle currently held is released when the cursor advances past it
/// or when the cursor is dropped, whichever comes first.
pub struct ChainCursor<R: CacheRef> {
    current: Option<R>,
}

impl<R: CacheRef> ChainCursor<R> {
    pub fn new(start: Option<R>) -> Self {
        Self { current: start }
    }

    /// Info of the snapshot under the cursor, `None` once the chain is exhausted.
    pub fn info(&self) -> Option<RefInfo> {
        self.current.as_ref().map(CacheRef::info)
    }

    pub fn is_exhausted(&self) -> bool {
        self.current.is_none()
    }

    /// Step to the parent.  The parent handle is acquired before the current
    /// one is released.
    pub fn advance(&mut self) {
        if let Some(current) = self.current.take() {
            let parent = current.parent();
            current.release();
            self.current = parent;
        }
    }
}

impl<R: CacheRef> Drop for ChainCursor<R> {
    fn drop(&mut self) {
        if let Some(current) = self.current.take() {
            current.release();
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryChain
// ---------------------------------------------------------------------------

struct Snapshot {
    info: RefInfo,
    parent: Option<Arc<Snapshot>>,
}

#[derive(Default)]
struct HandleCounts {
    acquired: AtomicUsize,
    outstanding: AtomicUsize,
}

/// An in-process chain of layer snapshots.
///
/// Keeps count of the handles it has given out so callers can check that a
/// walk returned every one of them.
pub struct MemoryChain {
    leaf: Option<Arc<Snapshot>>,
    len: usize,
    counts: Arc<HandleCounts>,
}

impl MemoryChain {
    /// Build a chain from snapshot records ordered root to leaf.
    pub fn from_infos(infos: impl IntoIterator<Item = RefInfo>) -> Self {
        let mut leaf: Option<Arc<Snapshot>> = None;
        let mut len = 0;
        for info in infos {
            leaf = Some(Arc::new(Snapshot { info, parent: leaf }));
            len += 1;
        }
        Self {
            leaf,
            len,
            counts: Arc::new(HandleCounts::default()),
        }
    }

    /// A new handle onto the leaf snapshot, or `None` for an empty chain.
    pub fn head(&self) -> Option<SnapshotRef> {
        self.leaf
            .as_ref()
            .map(|snap| SnapshotRef::acquire(snap.clone(), self.counts.clone()))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total handles ever handed out.
    pub fn acquired(&self) -> usize {
        self.counts.acquired.load(Ordering::SeqCst)
    }

    /// Handles handed out but not yet released.
    pub fn outstanding(&self) -> usize {
        self.counts.outstanding.load(Ordering::SeqCst)
    }
}

/// Handle onto a [`MemoryChain`] snapshot.
pub struct SnapshotRef {
    snapshot: Arc<Snapshot>,
    counts: Arc<HandleCounts>,
}

impl SnapshotRef {
    fn acquire(snapshot: Arc<Snapshot>, counts: Arc<HandleCounts>) -> Self {
        counts.acquired.fetch_add(1, Ordering::SeqCst);
        counts.outstanding.fetch_add(1, Ordering::SeqCst);
        Self { snapshot, counts }
    }
}

impl CacheRef for SnapshotRef {
    fn info(&self) -> RefInfo {
        self.snapshot.info.clone()
    }

    fn parent(&self) -> Option<Self> {
        self.snapshot
            .parent
            .as_ref()
            .map(|p| SnapshotRef::acquire(p.clone(), self.counts.clone()))
    }

    fn clone_ref(&self) -> Self {
        SnapshotRef::acquire(self.snapshot.clone(), self.counts.clone())
    }

    fn release(self) {
        self.counts.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
