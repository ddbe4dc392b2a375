use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::shared::frame::Frame;

/// Single-slot, newest-wins hand-off between the producer and the worker.
///
/// `put` overwrites any frame still pending, so the worker only ever sees
/// the latest one. Overwritten frames are counted as dropped.
#[derive(Default)]
pub struct FrameMailbox {
    pending: Mutex<Option<Frame>>,
    dropped: AtomicU64,
}

impl FrameMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `frame` as the pending frame. Returns `true` if an unconsumed
    /// frame was replaced.
    pub fn put(&self, frame: Frame) -> bool {
        let replaced = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(frame)
            .is_some();
        if replaced {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        replaced
    }

    /// Removes and returns the pending frame, if any.
    pub fn take(&self) -> Option<Frame> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Frames overwritten before the worker consumed them.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
