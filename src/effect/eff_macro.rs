//! `eff!` do-notation for [`Eff`](super::Eff) and
//! [`EffAsync`](super::EffAsync).
//!
//! # Syntax
//!
//! - `pattern <= effect;` binds the success value of `effect`
//! - `let pattern = expression;` is a plain let binding
//! - the final expression must itself be an effect
//!
//! `<-` is not a valid token sequence in a macro pattern, so `<=` stands in
//! for it.
//!
//! The macro expands `pattern <= effect; rest` into
//!
//! ```rust,ignore
//! effect.bind(move |pattern| { /* rest */ })
//! ```
//!
//! Continuations are `Fn` closures that may run more than once, so a bound
//! value used by a later step is copied into it: bound values referenced
//! after a further `<=` must be `Copy`, or cloned into a `let` first.

/// Chains effects in do-notation style.
///
/// # Examples
///
/// ```rust
/// use reductive::eff;
/// use reductive::effect::{Eff, Error};
///
/// let total = eff! {
///     base <= Eff::<u32, u32>::ask();
///     bonus <= Eff::success(7);
///     Eff::success(base + bonus)
/// };
/// assert_eq!(total.run(35), Ok(42));
///
/// // The first failure short-circuits the rest of the block.
/// let failed = eff! {
///     _ <= Eff::<(), i32>::fail(Error::new("stop"));
///     Eff::success(1)
/// };
/// assert_eq!(failed.run(()), Err(Error::new("stop")));
/// ```
#[macro_export]
macro_rules! eff {
    ($result:expr) => {
        $result
    };

    ($pattern:ident <= $effect:expr ; $($rest:tt)+) => {
        $effect.bind(move |$pattern| {
            $crate::eff!($($rest)+)
        })
    };

    (($($pattern:tt)*) <= $effect:expr ; $($rest:tt)+) => {
        $effect.bind(move |($($pattern)*)| {
            $crate::eff!($($rest)+)
        })
    };

    (_ <= $effect:expr ; $($rest:tt)+) => {
        $effect.bind(move |_| {
            $crate::eff!($($rest)+)
        })
    };

    (let $pattern:ident = $expr:expr ; $($rest:tt)+) => {
        {
            let $pattern = $expr;
            $crate::eff!($($rest)+)
        }
    };

    (let ($($pattern:tt)*) = $expr:expr ; $($rest:tt)+) => {
        {
            let ($($pattern)*) = $expr;
            $crate::eff!($($rest)+)
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::{Eff, EffAsync, Error};

    #[test]
    fn binds_in_order() {
        let result = eff! {
            x <= Eff::<(), i32>::success(5);
            y <= Eff::success(10);
            Eff::success(x + y)
        };
        assert_eq!(result.run(()), Ok(15));
    }

    #[test]
    fn let_binding() {
        let result = eff! {
            x <= Eff::<(), i32>::success(5);
            let doubled = x * 2;
            Eff::success(doubled)
        };
        assert_eq!(result.run(()), Ok(10));
    }

    #[test]
    fn short_circuits_on_failure() {
        let result = eff! {
            x <= Eff::<(), i32>::success(5);
            y <= Eff::<(), i32>::fail(Error::new("missing"));
            Eff::success(x + y)
        };
        assert_eq!(result.run(()), Err(Error::new("missing")));
    }

    #[test]
    fn tuple_pattern() {
        let result = eff! {
            (a, b) <= Eff::<(), (i32, i32)>::success((1, 2));
            Eff::success(a + b)
        };
        assert_eq!(result.run(()), Ok(3));
    }

    #[test]
    fn single_expression() {
        let result = eff! { Eff::<(), i32>::success(42) };
        assert_eq!(result.run(()), Ok(42));
    }

    #[tokio::test]
    async fn async_effects() {
        let result = eff! {
            x <= EffAsync::<i32, i32>::ask();
            _ <= EffAsync::success(());
            EffAsync::success(x + 1)
        };
        assert_eq!(result.run(1).await, Ok(2));
    }
}
