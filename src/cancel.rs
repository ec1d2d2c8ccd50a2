//! Cooperative cancellation for long-running compiles.

use crate::error::SiloError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cheap, cloneable flag polled between chunked stream reads.
///
/// Cloning shares the same underlying flag: cancelling one handle cancels
/// every clone.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// A token that is never cancelled, for callers that don't need one.
    pub fn never() -> Self {
        Self::new()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns `Err(SiloError::Cancelled)` iff this token has been cancelled.
    pub fn check(&self) -> Result<(), SiloError> {
        if self.is_cancelled() {
            Err(SiloError::Cancelled)
        } else {
            Ok(())
        }
    }
}
