//! Entry points that turn the reducer-passing protocol into values.
//!
//! These are the only places where a transducer tree actually runs. Each
//! top-level entry point owns a fresh [`TState`] and converts panics raised
//! by user functions into `TResult::Fail`.

use std::panic::{AssertUnwindSafe, catch_unwind};

use futures::FutureExt;
use futures::future::{self, BoxFuture};

use super::{AsyncReduce, TResult, TState, Transducer, TransducerAsync};
use crate::effect::{Error, Fin};

// =============================================================================
// Terminal reducers
// =============================================================================

/// Keeps the first value and completes.
struct First<B> {
    slot: Option<B>,
}

impl<B: Send> AsyncReduce<B> for First<B> {
    fn reduce<'a>(&'a mut self, _state: &'a TState, value: B) -> BoxFuture<'a, TResult<()>> {
        self.slot = Some(value);
        Box::pin(future::ready(TResult::COMPLETE))
    }
}

/// Keeps every value.
struct Collect<B> {
    values: Vec<B>,
}

impl<B: Send> AsyncReduce<B> for Collect<B> {
    fn reduce<'a>(&'a mut self, _state: &'a TState, value: B) -> BoxFuture<'a, TResult<()>> {
        self.values.push(value);
        Box::pin(future::ready(TResult::CONTINUE))
    }
}

fn settle<B>(outcome: TResult<()>, slot: Option<B>) -> TResult<B> {
    outcome.propagate(|()| slot.map_or(TResult::None, TResult::Complete))
}

fn panicked<B>(payload: &(dyn std::any::Any + Send)) -> TResult<B> {
    let error = Error::from_panic(payload);
    tracing::warn!(%error, "panic converted to failure at invoke boundary");
    TResult::Fail(error)
}

// =============================================================================
// Internal single-step helpers
// =============================================================================

/// Runs `transducer` and captures its first output, without catching panics.
pub(crate) fn collect_first<A, B, T>(transducer: &T, state: &TState, input: A) -> TResult<B>
where
    T: Transducer<A, B> + ?Sized,
{
    if state.is_cancelled() {
        return TResult::Cancelled;
    }
    let mut slot = None;
    let outcome = transducer.transform(state, input, &mut |_: &TState, value: B| {
        slot = Some(value);
        TResult::COMPLETE
    });
    settle(outcome, slot)
}

/// Runs `transducer` once, capturing its first output and converting a panic
/// into `Fail`.
pub(crate) fn step_once<A, B, T>(transducer: &T, state: &TState, input: A) -> TResult<B>
where
    T: Transducer<A, B> + ?Sized,
{
    catch_unwind(AssertUnwindSafe(|| collect_first(transducer, state, input)))
        .unwrap_or_else(|payload| panicked(payload.as_ref()))
}

/// Async twin of [`collect_first`].
pub(crate) async fn collect_first_async<A, B, T>(
    transducer: &T,
    state: &TState,
    input: A,
) -> TResult<B>
where
    T: TransducerAsync<A, B> + ?Sized,
    A: Send + 'static,
    B: Send + 'static,
{
    if state.is_cancelled() {
        return TResult::Cancelled;
    }
    let mut first = First { slot: None };
    let outcome = transducer.transform_async(state, input, &mut first).await;
    settle(outcome, first.slot)
}

/// Async twin of [`step_once`].
pub(crate) async fn step_once_async<A, B, T>(transducer: &T, state: &TState, input: A) -> TResult<B>
where
    T: TransducerAsync<A, B> + ?Sized,
    A: Send + 'static,
    B: Send + 'static,
{
    AssertUnwindSafe(collect_first_async(transducer, state, input))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| panicked(payload.as_ref()))
}

/// Runs `transducer` to the end and captures every output, keeping the
/// variant the run finished with.
pub(crate) fn collect_all<A, B, T>(transducer: &T, state: &TState, input: A) -> TResult<Vec<B>>
where
    T: Transducer<A, B> + ?Sized,
{
    if state.is_cancelled() {
        return TResult::Cancelled;
    }
    let mut values = Vec::new();
    let outcome = transducer.transform(state, input, &mut |_: &TState, value: B| {
        values.push(value);
        TResult::CONTINUE
    });
    outcome.with_value(values)
}

/// Async twin of [`collect_all`].
pub(crate) async fn collect_all_async<A, B, T>(
    transducer: &T,
    state: &TState,
    input: A,
) -> TResult<Vec<B>>
where
    T: TransducerAsync<A, B> + ?Sized,
    A: Send + 'static,
    B: Send + 'static,
{
    if state.is_cancelled() {
        return TResult::Cancelled;
    }
    let mut collect = Collect { values: Vec::new() };
    let outcome = transducer.transform_async(state, input, &mut collect).await;
    outcome.with_value(collect.values)
}

// =============================================================================
// Public entry points
// =============================================================================

/// Runs a transducer on `input` and returns its first output.
///
/// A run that produces no value fails with `Error::NoValue`; a cancelled run
/// fails with `Error::Cancelled`.
///
/// # Examples
///
/// ```rust
/// use reductive::transducer::{self, invoke1};
///
/// assert_eq!(invoke1(&transducer::map(|x: i32| x * 2), 21), Ok(42));
/// ```
pub fn invoke1<A, B, T>(transducer: &T, input: A) -> Fin<B>
where
    T: Transducer<A, B> + ?Sized,
{
    let state = TState::new();
    invoke1_with(transducer, &state, input)
}

/// Like [`invoke1`], sharing a caller-supplied [`TState`].
pub fn invoke1_with<A, B, T>(transducer: &T, state: &TState, input: A) -> Fin<B>
where
    T: Transducer<A, B> + ?Sized,
{
    step_once(transducer, state, input).into_fin()
}

/// Runs a transducer on `input` and collects every output.
///
/// # Examples
///
/// ```rust
/// use reductive::transducer::{self, TransducerExt, invoke_many};
///
/// let evens = transducer::each::<Vec<i32>>().filter(|x: &i32| x % 2 == 0);
/// assert_eq!(invoke_many(&evens, vec![1, 2, 3, 4]), Ok(vec![2, 4]));
/// ```
pub fn invoke_many<A, B, T>(transducer: &T, input: A) -> Fin<Vec<B>>
where
    T: Transducer<A, B> + ?Sized,
{
    let state = TState::new();
    invoke_many_with(transducer, &state, input)
}

/// Like [`invoke_many`], sharing a caller-supplied [`TState`].
pub fn invoke_many_with<A, B, T>(transducer: &T, state: &TState, input: A) -> Fin<Vec<B>>
where
    T: Transducer<A, B> + ?Sized,
{
    if state.is_cancelled() {
        return Err(Error::Cancelled);
    }
    let mut values = Vec::new();
    catch_unwind(AssertUnwindSafe(|| {
        transducer.transform(state, input, &mut |_: &TState, value: B| {
            values.push(value);
            TResult::CONTINUE
        })
    }))
    .unwrap_or_else(|payload| panicked(payload.as_ref()))
    .propagate(|()| TResult::Complete(values))
    .into_fin()
}

/// Folds the outputs of a transducer with a `(state, S, B) -> TResult<S>`
/// reducer, starting from `seed`.
///
/// The reducer may stop early by returning `Complete`, or abort with
/// `Cancelled`, `None` or `Fail`; whatever it returns last is reported.
///
/// # Examples
///
/// ```rust
/// use reductive::transducer::{self, TResult, TState, reduce};
///
/// let state = TState::new();
/// let sum = reduce(
///     &transducer::each::<Vec<i32>>(),
///     &state,
///     0,
///     vec![1, 2, 3],
///     |_, total, x| TResult::Continue(total + x),
/// );
/// assert_eq!(sum, TResult::Continue(6));
/// ```
pub fn reduce<A, B, S, T, F>(
    transducer: &T,
    state: &TState,
    seed: S,
    input: A,
    mut reducer: F,
) -> TResult<S>
where
    T: Transducer<A, B> + ?Sized,
    F: FnMut(&TState, S, B) -> TResult<S>,
{
    if state.is_cancelled() {
        return TResult::Cancelled;
    }
    let mut running = Some(seed);
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        transducer.transform(state, input, &mut |state: &TState, value: B| {
            let Some(current) = running.take() else {
                return TResult::None;
            };
            match reducer(state, current, value) {
                TResult::Continue(next) => {
                    running = Some(next);
                    TResult::CONTINUE
                }
                TResult::Complete(next) => {
                    running = Some(next);
                    TResult::COMPLETE
                }
                TResult::Cancelled => TResult::Cancelled,
                TResult::None => TResult::None,
                TResult::Fail(error) => TResult::Fail(error),
            }
        })
    }))
    .unwrap_or_else(|payload| panicked(payload.as_ref()));

    match outcome {
        TResult::Continue(()) => running.map_or(TResult::None, TResult::Continue),
        TResult::Complete(()) => running.map_or(TResult::None, TResult::Complete),
        TResult::Cancelled => TResult::Cancelled,
        TResult::None => TResult::None,
        TResult::Fail(error) => TResult::Fail(error),
    }
}

/// Async twin of [`invoke1`].
pub async fn invoke1_async<A, B, T>(transducer: &T, input: A) -> Fin<B>
where
    T: TransducerAsync<A, B> + ?Sized,
    A: Send + 'static,
    B: Send + 'static,
{
    let state = TState::new();
    invoke1_with_async(transducer, &state, input).await
}

/// Async twin of [`invoke1_with`].
pub async fn invoke1_with_async<A, B, T>(transducer: &T, state: &TState, input: A) -> Fin<B>
where
    T: TransducerAsync<A, B> + ?Sized,
    A: Send + 'static,
    B: Send + 'static,
{
    step_once_async(transducer, state, input).await.into_fin()
}

/// Async twin of [`invoke_many`].
pub async fn invoke_many_async<A, B, T>(transducer: &T, input: A) -> Fin<Vec<B>>
where
    T: TransducerAsync<A, B> + ?Sized,
    A: Send + 'static,
    B: Send + 'static,
{
    let state = TState::new();
    invoke_many_with_async(transducer, &state, input).await
}

/// Async twin of [`invoke_many_with`].
pub async fn invoke_many_with_async<A, B, T>(
    transducer: &T,
    state: &TState,
    input: A,
) -> Fin<Vec<B>>
where
    T: TransducerAsync<A, B> + ?Sized,
    A: Send + 'static,
    B: Send + 'static,
{
    if state.is_cancelled() {
        return Err(Error::Cancelled);
    }
    let mut collect = Collect { values: Vec::new() };
    let outcome = AssertUnwindSafe(transducer.transform_async(state, input, &mut collect))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| panicked(payload.as_ref()));
    outcome.propagate(|()| TResult::Complete(collect.values)).into_fin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transducer::{self, TransducerExt};
    use rstest::rstest;

    #[rstest]
    fn test_invoke1_takes_first_value() {
        let many = transducer::each::<Vec<i32>>();
        assert_eq!(invoke1(&many, vec![7, 8, 9]), Ok(7));
    }

    #[rstest]
    fn test_invoke1_without_value_is_no_value() {
        let none = transducer::filter(|_: &i32| false);
        assert_eq!(invoke1(&none, 1), Err(Error::NoValue));
    }

    #[rstest]
    fn test_invoke1_converts_panic_to_failure() {
        let boom = transducer::map(|_: i32| -> i32 { panic!("kaboom") });
        assert_eq!(invoke1(&boom, 1), Err(Error::exceptional("kaboom")));
    }

    #[rstest]
    fn test_invoke_many_on_cancelled_state() {
        let state = TState::new();
        state.cancel();
        let identity = transducer::identity::<i32>();
        assert_eq!(invoke_many_with(&identity, &state, 1), Err(Error::Cancelled));
    }

    #[rstest]
    fn test_reduce_stops_on_complete() {
        let state = TState::new();
        let result = reduce(
            &transducer::each::<Vec<i32>>().map(|x: i32| x * 2),
            &state,
            Vec::new(),
            vec![1, 2, 3, 4],
            |_, mut seen: Vec<i32>, x| {
                seen.push(x);
                if seen.len() == 2 {
                    TResult::Complete(seen)
                } else {
                    TResult::Continue(seen)
                }
            },
        );
        assert_eq!(result, TResult::Complete(vec![2, 4]));
    }

    #[rstest]
    #[tokio::test]
    async fn test_invoke_many_async_collects() {
        let each = transducer::each::<Vec<i32>>().map(|x: i32| x + 1);
        assert_eq!(invoke_many_async(&each, vec![1, 2]).await, Ok(vec![2, 3]));
    }
}
