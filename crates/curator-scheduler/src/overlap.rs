//! Single-run guard for a job whose previous run has not finished.
//!
//! A digest run that is still composing or delivering when the next tick
//! fires must not be doubled, so the new tick is skipped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Tracks whether a run of one job holds its slot.
#[derive(Debug, Default)]
pub struct OverlapGuard {
    active: Arc<AtomicBool>,
}

impl OverlapGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the run slot, or `None` if a previous run still holds it.
    pub fn try_acquire(&self) -> Option<RunGuard> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(RunGuard {
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Releases the run slot on drop, including when the job panics.
#[derive(Debug)]
pub struct RunGuard {
    active: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_one_run() {
        let guard = OverlapGuard::new();

        let first = guard.try_acquire();
        assert!(first.is_some());
        assert!(guard.try_acquire().is_none());
        assert!(guard.is_running());

        drop(first);
        assert!(!guard.is_running());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_slot_released_after_panic() {
        let guard = Arc::new(OverlapGuard::new());
        let inner = Arc::clone(&guard);
        let result = std::thread::spawn(move || {
            let _run = inner.try_acquire().unwrap();
            panic!("job blew up");
        })
        .join();

        assert!(result.is_err());
        assert!(!guard.is_running());
    }
}
