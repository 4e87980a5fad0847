//! Test hooks and cooperative cancellation

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// User callback run around iterations
pub type Hook = Box<dyn FnMut() + Send>;

/// Callbacks invoked by the engines
///
/// - `setup` before every iteration
/// - `iteration_teardown` after every iteration, even one that panicked
/// - `teardown` once, when the run ends
#[derive(Default)]
pub struct TestHooks {
    setup: Option<Hook>,
    iteration_teardown: Option<Hook>,
    teardown: Option<Hook>,
}

impl TestHooks {
    /// No hooks
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` before every iteration
    #[must_use]
    pub fn with_setup(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.setup = Some(Box::new(hook));
        self
    }

    /// Run `hook` after every iteration
    #[must_use]
    pub fn with_iteration_teardown(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.iteration_teardown = Some(Box::new(hook));
        self
    }

    /// Run `hook` once when the run ends
    #[must_use]
    pub fn with_teardown(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.teardown = Some(Box::new(hook));
        self
    }

    pub(crate) fn setup(&mut self) {
        if let Some(hook) = self.setup.as_mut() {
            hook();
        }
    }

    pub(crate) fn iteration_teardown(&mut self) {
        if let Some(hook) = self.iteration_teardown.as_mut() {
            hook();
        }
    }

    pub(crate) fn teardown(&mut self) {
        if let Some(hook) = self.teardown.as_mut() {
            hook();
        }
    }
}

impl fmt::Debug for TestHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestHooks")
            .field("setup", &self.setup.is_some())
            .field("iteration_teardown", &self.iteration_teardown.is_some())
            .field("teardown", &self.teardown.is_some())
            .finish()
    }
}

/// Shared flag checked by engines between iterations
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
