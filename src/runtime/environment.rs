//! Process-wide native environment initialization.
//!
//! Every generated wrapper calls the configured initializer before its first
//! native call. The initializer owns a static [`EnvironmentGuard`]:
//!
//! ```rust,ignore
//! static ENVIRONMENT: EnvironmentGuard = EnvironmentGuard::new();
//!
//! pub fn initialize() {
//!     ENVIRONMENT.initialize(|| unsafe { Environment_Initialize() });
//! }
//! ```
//!
//! Concurrent first callers block until the single winner has finished; the
//! environment is never torn down.

use std::sync::Once;

pub struct EnvironmentGuard {
    once: Once,
}

impl EnvironmentGuard {
    pub const fn new() -> Self {
        Self { once: Once::new() }
    }

    /// Run `init` unless some caller already has.
    pub fn initialize(&self, init: impl FnOnce()) {
        self.once.call_once(|| {
            tracing::debug!("initializing native environment");
            init();
        });
    }

    pub fn is_initialized(&self) -> bool {
        self.once.is_completed()
    }
}

impl Default for EnvironmentGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn initializes_once_under_concurrent_first_use() {
        let guard = EnvironmentGuard::new();
        let runs = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    guard.initialize(|| {
                        runs.fetch_add(1, Ordering::SeqCst);
                    });
                    assert!(guard.is_initialized());
                });
            }
        });

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn later_calls_are_noops() {
        let guard = EnvironmentGuard::new();
        let mut runs = 0;
        guard.initialize(|| runs += 1);
        guard.initialize(|| runs += 1);
        assert_eq!(runs, 1);
    }
}
