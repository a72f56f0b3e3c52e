//! Outcome of a single reduction step.

use crate::effect::Error;

/// The outcome of one reduction step.
///
/// Exactly one variant is produced per step. Only `Continue` and `Complete`
/// carry a state value; `Fail` carries an [`Error`]. `Cancelled` and `None`
/// are terminal signals without payload.
///
/// Every combinator inspects the upstream outcome before doing more work:
/// only `Continue` permits forward progress, everything else propagates
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TResult<S> {
    /// The step succeeded and the reduction may continue.
    Continue(S),
    /// The step succeeded and the reduction should stop.
    Complete(S),
    /// The reduction was cancelled.
    Cancelled,
    /// The reduction ended without a value.
    None,
    /// The reduction failed.
    Fail(Error),
}

impl<S> TResult<S> {
    /// Returns `true` for `Continue`.
    #[inline]
    pub const fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    /// Returns `true` for `Complete`.
    #[inline]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// Returns `true` for `Cancelled`.
    #[inline]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` for `None`.
    #[inline]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns `true` for `Fail`.
    #[inline]
    pub const fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }

    /// Returns `true` for the variants that carry a state value.
    #[inline]
    pub const fn has_value(&self) -> bool {
        matches!(self, Self::Continue(_) | Self::Complete(_))
    }

    /// Returns the carried state, if any.
    #[inline]
    pub fn value(self) -> Option<S> {
        match self {
            Self::Continue(state) | Self::Complete(state) => Some(state),
            _ => Option::None,
        }
    }

    /// Maps the carried state, keeping the variant.
    #[inline]
    pub fn map<T, F>(self, function: F) -> TResult<T>
    where
        F: FnOnce(S) -> T,
    {
        match self {
            Self::Continue(state) => TResult::Continue(function(state)),
            Self::Complete(state) => TResult::Complete(function(state)),
            Self::Cancelled => TResult::Cancelled,
            Self::None => TResult::None,
            Self::Fail(error) => TResult::Fail(error),
        }
    }

    /// Replaces the carried state with `value`, keeping the variant.
    #[inline]
    pub fn with_value<T>(self, value: T) -> TResult<T> {
        self.map(|_| value)
    }

    /// Re-types a payload-free outcome.
    ///
    /// `Continue`/`Complete` are mapped through `otherwise`.
    #[inline]
    pub fn propagate<T, F>(self, otherwise: F) -> TResult<T>
    where
        F: FnOnce(S) -> TResult<T>,
    {
        match self {
            Self::Continue(state) | Self::Complete(state) => otherwise(state),
            Self::Cancelled => TResult::Cancelled,
            Self::None => TResult::None,
            Self::Fail(error) => TResult::Fail(error),
        }
    }

    /// Converts a step outcome into a [`Fin`](crate::effect::Fin).
    ///
    /// `Cancelled` and `None` become the fixed `Error::Cancelled` and
    /// `Error::NoValue` failures.
    pub fn into_fin(self) -> Result<S, Error> {
        match self {
            Self::Continue(state) | Self::Complete(state) => Ok(state),
            Self::Cancelled => Err(Error::Cancelled),
            Self::None => Err(Error::NoValue),
            Self::Fail(error) => Err(error),
        }
    }
}

impl TResult<()> {
    /// `Continue(())`, the neutral outcome of a reducer that wants more input.
    pub const CONTINUE: Self = Self::Continue(());

    /// `Complete(())`, the outcome of a reducer that wants no more input.
    pub const COMPLETE: Self = Self::Complete(());
}
