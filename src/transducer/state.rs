//! Per-invocation shared context.
//!
//! A [`TState`] is created once per top-level invocation and passed by
//! reference through every nested reduction. It carries:
//!
//! - a cancellation signal, optionally shared with the outside world through
//!   a [`CancelToken`]
//! - a resource table of pending release functions
//!
//! When the `TState` is dropped, every resource still registered is
//! released, in reverse registration order. This covers both normal returns
//! and unwinding out of a panicking reducer.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::effect::Error;

type Release = Box<dyn FnOnce() + Send>;

/// Handle to a resource registered with a [`TState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(u64);

/// A position in the resource table, used to release everything registered
/// after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceMark(u64);

/// A cloneable cancellation signal.
///
/// Cancelling the token makes every run that shares it observe
/// cancellation at its next check point.
///
/// # Examples
///
/// ```rust
/// use reductive::transducer::{CancelToken, TState};
///
/// let token = CancelToken::new();
/// let state = TState::with_cancel_token(token.clone());
/// assert!(!state.is_cancelled());
///
/// token.cancel();
/// assert!(state.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that is not yet cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Shared, per-invocation mutable context.
///
/// Never share one `TState` between concurrent invocations; each top-level
/// run allocates its own.
pub struct TState {
    cancel: CancelToken,
    next_id: AtomicU64,
    resources: Mutex<BTreeMap<ResourceId, Release>>,
}

impl TState {
    /// Creates a fresh state with its own cancellation signal.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cancel_token(CancelToken::new())
    }

    /// Creates a fresh state observing an external cancellation token.
    #[must_use]
    pub fn with_cancel_token(cancel: CancelToken) -> Self {
        Self {
            cancel,
            next_id: AtomicU64::new(0),
            resources: Mutex::new(BTreeMap::new()),
        }
    }

    // =========================================================================
    // Cancellation
    // =========================================================================

    /// Signals cancellation for this run.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` if this run has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The token backing this state's cancellation signal.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    // =========================================================================
    // Resources
    // =========================================================================

    /// Registers a release function, returning its handle.
    pub fn register<F>(&self, release: F) -> ResourceId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = ResourceId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.resources.lock().insert(id, Box::new(release));
        tracing::trace!(resource = id.0, "resource registered");
        id
    }

    /// Removes a resource from the table without releasing it.
    ///
    /// Returns `false` if the resource was already released or removed.
    pub fn deregister(&self, id: ResourceId) -> bool {
        self.resources.lock().remove(&id).is_some()
    }

    /// Releases a single resource now.
    ///
    /// Returns `false` if the resource was already released.
    pub fn release(&self, id: ResourceId) -> bool {
        let release = self.resources.lock().remove(&id);
        match release {
            Some(release) => {
                run_release(id, release);
                true
            }
            None => false,
        }
    }

    /// Number of resources awaiting release.
    pub fn pending_resources(&self) -> usize {
        self.resources.lock().len()
    }

    /// Marks the current end of the resource table.
    pub fn mark(&self) -> ResourceMark {
        ResourceMark(self.next_id.load(Ordering::SeqCst))
    }

    /// Releases every resource registered after `mark`, newest first.
    pub fn release_from(&self, mark: ResourceMark) {
        let released = self.resources.lock().split_off(&ResourceId(mark.0));
        for (id, release) in released.into_iter().rev() {
            run_release(id, release);
        }
    }

    /// Opens a resource scope that releases on drop.
    pub(crate) fn scope(&self) -> ScopeGuard<'_> {
        ScopeGuard {
            state: self,
            mark: self.mark(),
        }
    }

    /// Checks for cancellation, producing the matching outcome.
    pub(crate) fn check(&self) -> Result<(), super::TResult<()>> {
        if self.is_cancelled() {
            Err(super::TResult::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for TState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TState")
            .field("cancelled", &self.is_cancelled())
            .field("pending_resources", &self.pending_resources())
            .finish()
    }
}

impl Drop for TState {
    fn drop(&mut self) {
        let residual = std::mem::take(self.resources.get_mut());
        for (id, release) in residual.into_iter().rev() {
            run_release(id, release);
        }
    }
}

fn run_release(id: ResourceId, release: Release) {
    tracing::trace!(resource = id.0, "releasing resource");
    if let Err(payload) = catch_unwind(AssertUnwindSafe(release)) {
        tracing::warn!(
            resource = id.0,
            error = %Error::from_panic(payload.as_ref()),
            "release function panicked"
        );
    }
}

/// Releases the resources registered inside a scope when dropped.
pub(crate) struct ScopeGuard<'s> {
    state: &'s TState,
    mark: ResourceMark,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.state.release_from(self.mark);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let clone = count.clone();
        (count, move || {
            clone.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[rstest]
    fn test_release_runs_once() {
        let state = TState::new();
        let (count, release) = counter();
        let id = state.register(release);

        assert!(state.release(id));
        assert!(!state.release(id));
        drop(state);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    fn test_drop_releases_residual_in_reverse_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let state = TState::new();
        for index in 0..3 {
            let order = order.clone();
            state.register(move || order.lock().push(index));
        }
        drop(state);
        assert_eq!(*order.lock(), vec![2, 1, 0]);
    }

    #[rstest]
    fn test_release_from_mark_keeps_older_resources() {
        let state = TState::new();
        let (outer, outer_release) = counter();
        let (inner, inner_release) = counter();
        state.register(outer_release);
        let mark = state.mark();
        state.register(inner_release);

        state.release_from(mark);
        assert_eq!(inner.load(Ordering::SeqCst), 1);
        assert_eq!(outer.load(Ordering::SeqCst), 0);
        assert_eq!(state.pending_resources(), 1);
    }

    #[rstest]
    fn test_deregister_skips_release() {
        let state = TState::new();
        let (count, release) = counter();
        let id = state.register(release);
        assert!(state.deregister(id));
        drop(state);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    fn test_panicking_release_does_not_stop_others() {
        let state = TState::new();
        let (count, release) = counter();
        state.register(release);
        state.register(|| panic!("release failed"));
        drop(state);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
