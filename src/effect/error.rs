//! Error types for the effect system.
//!
//! [`Error`] is the single failure type that flows through the `Left`
//! channel of an [`Eff`](super::Eff) and through `TResult::Fail`. The
//! terminal no-payload outcomes of a run (`Cancelled`, `None`) and the
//! never-constructed effect (`Bottom`) are translated into fixed variants of
//! this type only at the outermost `run` boundary.
//!
//! [`Fin`] is the materialised result of running an effect.
//!
//! # Examples
//!
//! ```rust
//! use reductive::effect::Error;
//!
//! let first = Error::new("disk full");
//! let second = Error::with_code(503, "unavailable");
//! let both = first.combine(second);
//!
//! assert_eq!(both.errors().len(), 2);
//! assert_eq!(format!("{}", Error::Cancelled), "cancelled");
//! ```

use std::any::Any;

/// The result of running an effect: success, or an [`Error`].
pub type Fin<A> = Result<A, Error>;

/// Failure raised by effect composition and execution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// An expected, typed failure raised by user code.
    #[error("{message}")]
    Expected {
        /// Application specific error code (`0` when unspecified).
        code: i32,
        /// Human readable description.
        message: String,
    },

    /// An abnormal failure, typically a panic caught at an invoke boundary.
    #[error("exceptional: {message}")]
    Exceptional {
        /// Description of the cause (the panic message when available).
        message: String,
    },

    /// The computation was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// The computation completed without producing a value.
    #[error("no value")]
    NoValue,

    /// An effect that was never constructed was run.
    #[error("bottom: effect was never initialised")]
    Bottom,

    /// Several failures aggregated together.
    #[error("{}", render_many(.0))]
    Many(Vec<Error>),
}

fn render_many(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Creates an expected failure with code `0`.
    pub fn new(message: impl Into<String>) -> Self {
        Self::Expected {
            code: 0,
            message: message.into(),
        }
    }

    /// Creates an expected failure with an explicit code.
    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self::Expected {
            code,
            message: message.into(),
        }
    }

    /// Creates an exceptional failure.
    pub fn exceptional(message: impl Into<String>) -> Self {
        Self::Exceptional {
            message: message.into(),
        }
    }

    /// Converts a panic payload captured by `catch_unwind` into an error.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(string) = payload.downcast_ref::<&str>() {
            (*string).to_string()
        } else if let Some(string) = payload.downcast_ref::<String>() {
            string.clone()
        } else {
            "Unknown panic".to_string()
        };
        Self::Exceptional { message }
    }

    /// Aggregates two failures, flattening nested `Many` values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use reductive::effect::Error;
    ///
    /// let combined = Error::new("a")
    ///     .combine(Error::new("b").combine(Error::new("c")));
    /// assert_eq!(combined.errors().len(), 3);
    /// ```
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        let mut errors = self.into_errors();
        errors.extend(other.into_errors());
        Self::Many(errors)
    }

    /// Returns the individual failures contained in this error.
    pub fn errors(&self) -> Vec<&Self> {
        match self {
            Self::Many(errors) => errors.iter().flat_map(Self::errors).collect(),
            other => vec![other],
        }
    }

    fn into_errors(self) -> Vec<Self> {
        match self {
            Self::Many(errors) => errors.into_iter().flat_map(Self::into_errors).collect(),
            other => vec![other],
        }
    }

    /// The code of an expected failure, if any.
    pub const fn code(&self) -> Option<i32> {
        match self {
            Self::Expected { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns `true` for failures raised deliberately by user code.
    pub fn is_expected(&self) -> bool {
        match self {
            Self::Expected { .. } => true,
            Self::Many(errors) => errors.iter().all(Self::is_expected),
            _ => false,
        }
    }

    /// Returns `true` for abnormal failures.
    pub fn is_exceptional(&self) -> bool {
        match self {
            Self::Exceptional { .. } | Self::Bottom => true,
            Self::Many(errors) => errors.iter().any(Self::is_exceptional),
            _ => false,
        }
    }

    /// Returns `true` if this error represents cancellation.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_error_display() {
        assert_eq!(Error::new("boom").to_string(), "boom");
        assert_eq!(Error::NoValue.to_string(), "no value");
        assert_eq!(
            Error::new("a").combine(Error::new("b")).to_string(),
            "a; b"
        );
    }

    #[rstest]
    fn test_error_combine_flattens() {
        let combined = Error::new("a")
            .combine(Error::new("b"))
            .combine(Error::new("c").combine(Error::new("d")));
        match combined {
            Error::Many(errors) => assert_eq!(errors.len(), 4),
            other => panic!("expected Many, got {other:?}"),
        }
    }

    #[rstest]
    fn test_error_from_panic_payload() {
        let payload = std::panic::catch_unwind(|| panic!("oops")).unwrap_err();
        assert_eq!(Error::from_panic(payload.as_ref()), Error::exceptional("oops"));
    }

    #[rstest]
    #[case(Error::new("x"), true, false)]
    #[case(Error::exceptional("x"), false, true)]
    #[case(Error::Bottom, false, true)]
    #[case(Error::Cancelled, false, false)]
    fn test_error_classification(
        #[case] error: Error,
        #[case] expected: bool,
        #[case] exceptional: bool,
    ) {
        assert_eq!(error.is_expected(), expected);
        assert_eq!(error.is_exceptional(), exceptional);
    }
}
