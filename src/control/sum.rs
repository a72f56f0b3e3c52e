//! Sum type - a two-case co-product value.
//!
//! This module provides the `Sum<X, A>` type, which holds exactly one of
//! `Left(X)` or `Right(A)`. The engine uses it as the carrier of its two
//! channels:
//!
//! - `Left` is the alternative/error channel
//! - `Right` is the success channel
//!
//! # Examples
//!
//! ```rust
//! use reductive::control::Sum;
//!
//! let left: Sum<String, i32> = Sum::Left("boom".to_string());
//! let right: Sum<String, i32> = Sum::Right(42);
//!
//! assert!(left.is_left());
//! assert_eq!(right.map_right(|x| x + 1), Sum::Right(43));
//!
//! let rendered = Sum::<i32, String>::Right("hello".to_string()).fold(
//!     |n| format!("Number: {n}"),
//!     |s| format!("String: {s}"),
//! );
//! assert_eq!(rendered, "String: hello");
//! ```

use std::fmt;
use std::hash::Hash;

/// A value holding exactly one of two types.
///
/// By convention `Left` carries the alternative (failure) value and `Right`
/// carries the success value. A `Sum` is immutable once produced.
///
/// # Type Parameters
///
/// * `X` - The type of the left (alternative) value
/// * `A` - The type of the right (success) value
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sum<X, A> {
    /// The alternative/error channel.
    Left(X),
    /// The success channel.
    Right(A),
}

impl<X, A> Sum<X, A> {
    // =========================================================================
    // Type Checking
    // =========================================================================

    /// Returns `true` if this is a `Left` value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use reductive::control::Sum;
    ///
    /// let left: Sum<i32, String> = Sum::Left(42);
    /// assert!(left.is_left());
    /// ```
    #[inline]
    pub const fn is_left(&self) -> bool {
        matches!(self, Self::Left(_))
    }

    /// Returns `true` if this is a `Right` value.
    #[inline]
    pub const fn is_right(&self) -> bool {
        matches!(self, Self::Right(_))
    }

    // =========================================================================
    // Value Extraction
    // =========================================================================

    /// Converts into an `Option<X>`, discarding a right value.
    #[inline]
    pub fn left(self) -> Option<X> {
        match self {
            Self::Left(value) => Some(value),
            Self::Right(_) => None,
        }
    }

    /// Converts into an `Option<A>`, discarding a left value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use reductive::control::Sum;
    ///
    /// let right: Sum<i32, &str> = Sum::Right("hello");
    /// assert_eq!(right.right(), Some("hello"));
    /// ```
    #[inline]
    pub fn right(self) -> Option<A> {
        match self {
            Self::Left(_) => None,
            Self::Right(value) => Some(value),
        }
    }

    /// Returns a reference to the left value if present.
    #[inline]
    pub const fn left_ref(&self) -> Option<&X> {
        match self {
            Self::Left(value) => Some(value),
            Self::Right(_) => None,
        }
    }

    /// Returns a reference to the right value if present.
    #[inline]
    pub const fn right_ref(&self) -> Option<&A> {
        match self {
            Self::Left(_) => None,
            Self::Right(value) => Some(value),
        }
    }

    /// Borrows both channels.
    #[inline]
    pub const fn as_ref(&self) -> Sum<&X, &A> {
        match self {
            Self::Left(value) => Sum::Left(value),
            Self::Right(value) => Sum::Right(value),
        }
    }

    // =========================================================================
    // Mapping Operations
    // =========================================================================

    /// Applies a function to the left value, leaving a right value untouched.
    #[inline]
    pub fn map_left<Y, F>(self, function: F) -> Sum<Y, A>
    where
        F: FnOnce(X) -> Y,
    {
        match self {
            Self::Left(value) => Sum::Left(function(value)),
            Self::Right(value) => Sum::Right(value),
        }
    }

    /// Applies a function to the right value, leaving a left value untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use reductive::control::Sum;
    ///
    /// let right: Sum<i32, String> = Sum::Right("hello".to_string());
    /// assert_eq!(right.map_right(|s| s.len()), Sum::Right(5));
    /// ```
    #[inline]
    pub fn map_right<B, F>(self, function: F) -> Sum<X, B>
    where
        F: FnOnce(A) -> B,
    {
        match self {
            Self::Left(value) => Sum::Left(value),
            Self::Right(value) => Sum::Right(function(value)),
        }
    }

    /// Maps whichever channel is populated.
    #[inline]
    pub fn bimap<Y, B, F, G>(self, left_function: F, right_function: G) -> Sum<Y, B>
    where
        F: FnOnce(X) -> Y,
        G: FnOnce(A) -> B,
    {
        match self {
            Self::Left(value) => Sum::Left(left_function(value)),
            Self::Right(value) => Sum::Right(right_function(value)),
        }
    }

    /// Chains a computation on the right value; a left value short-circuits.
    #[inline]
    pub fn and_then<B, F>(self, function: F) -> Sum<X, B>
    where
        F: FnOnce(A) -> Sum<X, B>,
    {
        match self {
            Self::Left(value) => Sum::Left(value),
            Self::Right(value) => function(value),
        }
    }

    // =========================================================================
    // Elimination
    // =========================================================================

    /// Eliminates the sum by applying one of two functions.
    #[inline]
    pub fn fold<T, F, G>(self, left_function: F, right_function: G) -> T
    where
        F: FnOnce(X) -> T,
        G: FnOnce(A) -> T,
    {
        match self {
            Self::Left(value) => left_function(value),
            Self::Right(value) => right_function(value),
        }
    }

    /// Swaps the channels: `Left(x)` becomes `Right(x)` and vice versa.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use reductive::control::Sum;
    ///
    /// let left: Sum<i32, String> = Sum::Left(42);
    /// assert_eq!(left.swap(), Sum::Right(42));
    /// ```
    #[inline]
    pub fn swap(self) -> Sum<A, X> {
        match self {
            Self::Left(value) => Sum::Right(value),
            Self::Right(value) => Sum::Left(value),
        }
    }
}

impl<A> Sum<A, A> {
    /// Collapses a sum whose channels share a type.
    #[inline]
    pub fn merge(self) -> A {
        match self {
            Self::Left(value) | Self::Right(value) => value,
        }
    }
}

// =============================================================================
// Debug Implementation
// =============================================================================

impl<X: fmt::Debug, A: fmt::Debug> fmt::Debug for Sum<X, A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left(value) => formatter.debug_tuple("Left").field(value).finish(),
            Self::Right(value) => formatter.debug_tuple("Right").field(value).finish(),
        }
    }
}

// =============================================================================
// From Implementations
// =============================================================================

impl<X, A> From<Result<A, X>> for Sum<X, A> {
    /// `Ok(a)` becomes `Right(a)`, and `Err(x)` becomes `Left(x)`.
    #[inline]
    fn from(result: Result<A, X>) -> Self {
        match result {
            Ok(value) => Self::Right(value),
            Err(error) => Self::Left(error),
        }
    }
}

impl<X, A> From<Sum<X, A>> for Result<A, X> {
    /// `Right(a)` becomes `Ok(a)`, and `Left(x)` becomes `Err(x)`.
    #[inline]
    fn from(sum: Sum<X, A>) -> Self {
        match sum {
            Sum::Left(value) => Err(value),
            Sum::Right(value) => Ok(value),
        }
    }
}
