//! Retry and repeat policies.
//!
//! A [`Schedule`] is an immutable description of the waits between
//! successive attempts of a looping computation. [`Schedule::run`] yields a
//! fresh, lazy and possibly unbounded iterator of [`Duration`]s; the fold
//! engine consumes exactly one duration per attempt after the first, and
//! stops looping once the iterator is exhausted.
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//! use reductive::schedule::Schedule;
//!
//! let policy = Schedule::exponential(Duration::from_millis(10))
//!     .max_delay(Duration::from_millis(50))
//!     .take(4);
//!
//! let delays: Vec<_> = policy.run().collect();
//! assert_eq!(
//!     delays,
//!     vec![
//!         Duration::from_millis(10),
//!         Duration::from_millis(20),
//!         Duration::from_millis(40),
//!         Duration::from_millis(50),
//!     ]
//! );
//! ```

mod fold;

use std::fmt;
use std::iter;
use std::sync::Arc;
use std::time::Duration;

pub use fold::{Fold, FoldSum, fold, fold_until, fold_while};

pub(crate) use fold::{always, keep_last, keep_left, keep_right};

/// A lazy sequence of waits produced by [`Schedule::run`].
pub type Delays = Box<dyn Iterator<Item = Duration> + Send>;

type Factory = dyn Fn() -> Delays + Send + Sync;

/// An immutable retry/repeat policy.
///
/// Cloning is cheap; every call to [`run`](Self::run) starts the sequence
/// from the beginning.
#[derive(Clone)]
pub struct Schedule {
    factory: Arc<Factory>,
}

impl Schedule {
    /// Creates a schedule from a factory of duration iterators.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use reductive::schedule::Schedule;
    ///
    /// let custom = Schedule::from_fn(|| (1..=3).map(Duration::from_secs));
    /// assert_eq!(custom.run().count(), 3);
    /// ```
    pub fn from_fn<F, I>(factory: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: IntoIterator<Item = Duration>,
        I::IntoIter: Send + 'static,
    {
        Self {
            factory: Arc::new(move || Box::new(factory().into_iter()) as Delays),
        }
    }

    /// Starts a fresh run of this schedule.
    #[must_use]
    pub fn run(&self) -> Delays {
        (self.factory)()
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    /// No further attempts: the computation runs exactly once.
    #[must_use]
    pub fn never() -> Self {
        Self::from_fn(iter::empty)
    }

    /// One further attempt, immediately.
    #[must_use]
    pub fn once() -> Self {
        Self::recurs(1)
    }

    /// Unbounded immediate re-attempts.
    #[must_use]
    pub fn forever() -> Self {
        Self::spaced(Duration::ZERO)
    }

    /// `times` further attempts, immediately.
    #[must_use]
    pub fn recurs(times: usize) -> Self {
        Self::from_fn(move || iter::repeat_n(Duration::ZERO, times))
    }

    /// Unbounded re-attempts separated by a fixed wait.
    #[must_use]
    pub fn spaced(delay: Duration) -> Self {
        Self::from_fn(move || iter::repeat(delay))
    }

    /// Waits `base`, `2 * base`, `3 * base`, ...
    #[must_use]
    pub fn linear(base: Duration) -> Self {
        Self::from_fn(move || {
            iter::successors(Some(base), move |&delay| Some(delay.saturating_add(base)))
        })
    }

    /// Waits `base`, `2 * base`, `4 * base`, ...
    #[must_use]
    pub fn exponential(base: Duration) -> Self {
        Self::from_fn(move || {
            iter::successors(Some(base), |&delay| Some(delay.saturating_mul(2)))
        })
    }

    /// Waits `base * factor^n` for `n = 0, 1, 2, ...`.
    ///
    /// Non-finite or negative products saturate to [`Duration::MAX`] and
    /// [`Duration::ZERO`] respectively.
    #[must_use]
    pub fn exponential_by(base: Duration, factor: f64) -> Self {
        Self::from_fn(move || {
            let mut current = base.as_secs_f64();
            iter::from_fn(move || {
                let delay = seconds_to_duration(current);
                current *= factor;
                Some(delay)
            })
        })
    }

    /// Waits following the Fibonacci sequence scaled by `base`.
    #[must_use]
    pub fn fibonacci(base: Duration) -> Self {
        Self::from_fn(move || {
            iter::successors(Some((base, base)), |&(current, next)| {
                Some((next, current.saturating_add(next)))
            })
            .map(|(current, _)| current)
        })
    }

    /// Exactly the given waits, in order.
    #[must_use]
    pub fn from_durations<I>(durations: I) -> Self
    where
        I: IntoIterator<Item = Duration>,
    {
        let durations: Arc<[Duration]> = durations.into_iter().collect();
        Self::from_fn(move || {
            let durations = Arc::clone(&durations);
            (0..durations.len()).map(move |index| durations[index])
        })
    }

    // =========================================================================
    // Combinators
    // =========================================================================

    /// Keeps at most `count` waits.
    #[must_use]
    pub fn take(self, count: usize) -> Self {
        self.derive(move |delays| Box::new(delays.take(count)))
    }

    /// Caps every wait at `cap`.
    #[must_use]
    pub fn max_delay(self, cap: Duration) -> Self {
        self.derive(move |delays| Box::new(delays.map(move |delay| delay.min(cap))))
    }

    /// Stops once the total waited time would exceed `total`.
    #[must_use]
    pub fn max_cumulative(self, total: Duration) -> Self {
        self.derive(move |delays| {
            let mut elapsed = Duration::ZERO;
            Box::new(delays.take_while(move |delay| {
                elapsed = elapsed.saturating_add(*delay);
                elapsed <= total
            }))
        })
    }

    /// Continues while either schedule does, waiting the shorter delay.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        self.zip_with(other, |left, right| match (left, right) {
            (Some(left), Some(right)) => Some(left.min(right)),
            (Some(delay), None) | (None, Some(delay)) => Some(delay),
            (None, None) => None,
        })
    }

    /// Continues while both schedules do, waiting the longer delay.
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        self.zip_with(other, |left, right| Some(left?.max(right?)))
    }

    /// Runs `self` to exhaustion, then `other`.
    #[must_use]
    pub fn append(self, other: Self) -> Self {
        Self {
            factory: Arc::new(move || Box::new(self.run().chain(other.run())) as Delays),
        }
    }

    fn derive<F>(self, transform: F) -> Self
    where
        F: Fn(Delays) -> Delays + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(move || transform(self.run())),
        }
    }

    fn zip_with<F>(self, other: Self, combine: F) -> Self
    where
        F: Fn(Option<Duration>, Option<Duration>) -> Option<Duration> + Copy + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(move || {
                let mut left = self.run().fuse();
                let mut right = other.run().fuse();
                Box::new(iter::from_fn(move || combine(left.next(), right.next()))) as Delays
            }),
        }
    }
}

fn seconds_to_duration(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        Duration::ZERO
    } else {
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }
}

impl fmt::Debug for Schedule {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Schedule").finish_non_exhaustive()
    }
}
