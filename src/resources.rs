//! Ownership-scoped tracking of graphics and rasterization resources.
//!
//! Every native resource is wrapped in [`Tracked`] as soon as it is created. Dropping the wrapper
//! releases the resource, so each one is released exactly once on every exit path, and the
//! tracker's counters make leaks observable.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Categories of tracked resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Imaging factory / device-level handles.
    Factory,
    /// Device bitmaps holding page pixels.
    Bitmap,
    /// Recorded command sequences.
    CommandList,
    /// Format-conversion buffers between rasterizer and bitmap upload.
    Intermediate,
}

impl ResourceKind {
    /// All kinds, in index order.
    pub const ALL: [Self; 4] = [
        Self::Factory,
        Self::Bitmap,
        Self::CommandList,
        Self::Intermediate,
    ];

    fn index(self) -> usize {
        match self {
            Self::Factory => 0,
            Self::Bitmap => 1,
            Self::CommandList => 2,
            Self::Intermediate => 3,
        }
    }
}

#[derive(Default)]
struct Counters {
    created: [AtomicU64; 4],
    released: [AtomicU64; 4],
}

/// Shared resource counters. Clones observe the same counters.
#[derive(Clone, Default)]
pub struct ResourceTracker {
    counters: Arc<Counters>,
}

impl fmt::Debug for ResourceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTracker")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Snapshot of created/released counts per [`ResourceKind`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceStats {
    created: [u64; 4],
    released: [u64; 4],
}

impl ResourceStats {
    /// Resources of `kind` created so far.
    pub fn created(&self, kind: ResourceKind) -> u64 {
        self.created[kind.index()]
    }

    /// Resources of `kind` released so far.
    pub fn released(&self, kind: ResourceKind) -> u64 {
        self.released[kind.index()]
    }

    /// Resources of `kind` still alive.
    pub fn live(&self, kind: ResourceKind) -> u64 {
        self.created(kind).saturating_sub(self.released(kind))
    }

    /// Resources of any kind still alive.
    pub fn total_live(&self) -> u64 {
        ResourceKind::ALL.iter().map(|&k| self.live(k)).sum()
    }
}

impl ResourceTracker {
    /// Fresh tracker with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `value` as a resource of `kind`.
    pub fn track<T>(&self, kind: ResourceKind, value: T) -> Tracked<T> {
        self.counters.created[kind.index()].fetch_add(1, Ordering::Relaxed);
        Tracked {
            value,
            kind,
            tracker: self.clone(),
        }
    }

    /// Current counts.
    pub fn stats(&self) -> ResourceStats {
        let mut out = ResourceStats::default();
        for kind in ResourceKind::ALL {
            let i = kind.index();
            out.created[i] = self.counters.created[i].load(Ordering::Relaxed);
            out.released[i] = self.counters.released[i].load(Ordering::Relaxed);
        }
        out
    }

    fn release(&self, kind: ResourceKind) {
        self.counters.released[kind.index()].fetch_add(1, Ordering::Relaxed);
    }
}

/// An owned resource that is released when dropped.
pub struct Tracked<T> {
    value: T,
    kind: ResourceKind,
    tracker: ResourceTracker,
}

impl<T> Tracked<T> {
    /// Kind this resource was registered as.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("kind", &self.kind)
            .field("value", &self.value)
            .finish()
    }
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        self.tracker.release(self.kind);
    }
}

#[cfg(test)]
#[path = "../tests/unit/resources.rs"]
mod tests;
