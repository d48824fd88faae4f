use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::OnceLock;

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Default)]
pub struct CaptureSlot {
    in_use: Arc<AtomicBool>,
}

impl CaptureSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide slot shared by every game.
    pub fn global() -> CaptureSlot {
        static GLOBAL: OnceLock<CaptureSlot> = OnceLock::new();
        GLOBAL.get_or_init(CaptureSlot::new).clone()
    }

    pub fn acquire(&self, owner: &str) -> Result<CaptureLease> {
        self.in_use
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CoreError::CaptureBusy)?;
        log::info!("capture session acquired by {owner}");
        Ok(CaptureLease {
            in_use: Arc::clone(&self.in_use),
            owner: owner.to_string(),
            released: false,
        })
    }

    pub fn is_in_use(&self) -> bool {
        self.in_use.load(Ordering::Acquire)
    }
}

/// Held while a game owns the capture session.
#[derive(Debug)]
pub struct CaptureLease {
    in_use: Arc<AtomicBool>,
    owner: String,
    released: bool,
}

impl CaptureLease {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if !self.released {
            self.released = true;
            self.in_use.store(false, Ordering::Release);
            log::info!("capture session released by {}", self.owner);
        }
    }
}

impl Drop for CaptureLease {
    fn drop(&mut self) {
        self.release_inner();
    }
}
