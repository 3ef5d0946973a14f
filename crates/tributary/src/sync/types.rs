//! Shared sync types.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use super::progress::ProgressCallback;

/// Cooperative cancellation flag shared between a caller and running syncs.
///
/// Clones observe the same flag. Syncs check it before pulling each item,
/// so a request already in flight completes but nothing further is fetched.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    flag: Arc<AtomicBool>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing flag, e.g. one set by a signal handler.
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Options for a single sync call.
#[derive(Clone, Default)]
pub struct SyncOptions {
    /// Caller-supplied lower bound; the later of this and the last finished
    /// sync becomes the cutoff.
    pub newer_than: Option<DateTime<Utc>>,
    /// Cancellation flag.
    pub signal: Option<AbortSignal>,
    /// Receives one event per synced item plus start/finish events.
    pub progress: Option<Arc<ProgressCallback>>,
}

impl SyncOptions {
    #[must_use]
    pub fn newer_than(mut self, at: DateTime<Utc>) -> Self {
        self.newer_than = Some(at);
        self
    }

    #[must_use]
    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    #[must_use]
    pub fn progress(mut self, callback: Arc<ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    pub(crate) fn is_aborted(&self) -> bool {
        self.signal.as_ref().is_some_and(AbortSignal::is_aborted)
    }
}

impl std::fmt::Debug for SyncOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncOptions")
            .field("newer_than", &self.newer_than)
            .field("signal", &self.signal)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Result of a completed sync.
#[derive(Debug, Clone)]
pub struct SyncOutcome<T> {
    /// When the sync was marked finished; the next sync's watermark.
    pub synced_at: DateTime<Utc>,
    /// Every item written during this sync, in fetch order.
    pub synced_items: Vec<T>,
}
