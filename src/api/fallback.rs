//! Automatic mock-fallback latch.
//!
//! Engaged by the first domain call that fails after retries, released by the
//! next one that succeeds. Only the facade flips it; everyone else reads.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct FallbackLatch {
    engaged: AtomicBool,
}

impl FallbackLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::Acquire)
    }

    /// Engage the latch. Returns `true` only for the call that flipped it.
    pub(crate) fn engage(&self) -> bool {
        !self.engaged.swap(true, Ordering::AcqRel)
    }

    /// Release the latch. Returns `true` only for the call that flipped it.
    pub(crate) fn release(&self) -> bool {
        self.engaged.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_reported_once() {
        let latch = FallbackLatch::new();
        assert!(!latch.is_engaged());
        assert!(!latch.release());

        assert!(latch.engage());
        assert!(!latch.engage());
        assert!(latch.is_engaged());

        assert!(latch.release());
        assert!(!latch.release());
        assert!(!latch.is_engaged());
    }
}
