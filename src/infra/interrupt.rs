// ============================================================
// Layer 6 — Interrupt Flag
// ============================================================
// Ctrl-C during training asks for a clean early stop: the
// handler only sets a shared flag, and the training loop polls
// it between batches, saves, and returns.

use anyhow::{Context, Result};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

#[derive(Clone, Debug, Default)]
pub struct InterruptFlag {
    requested: Arc<AtomicBool>,
}

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Relaxed)
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::Relaxed);
    }

    /// Route Ctrl-C to this flag. Can only be installed once per process.
    pub fn install_ctrlc_handler(&self) -> Result<()> {
        let requested = Arc::clone(&self.requested);
        ctrlc::set_handler(move || {
            tracing::warn!("Interrupt received — stopping after the current batch");
            requested.store(true, Ordering::Relaxed);
        })
        .context("Failed to install Ctrl-C handler")
    }
}
