//! Cooperative cancellation for the async entry points.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, SlurperError};

/// Shared flag checked at coarse boundaries: before reading, before parsing
/// and before the tree walk. A walk already in progress runs to completion.
#[derive(Clone, Debug, Default)]
pub struct CancelSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self { Self::default() }

    pub fn cancel(&self) { self.cancelled.store(true, Ordering::Relaxed); }

    pub fn is_cancelled(&self) -> bool { self.cancelled.load(Ordering::Relaxed) }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() { Err(SlurperError::Cancelled) } else { Ok(()) }
    }
}
