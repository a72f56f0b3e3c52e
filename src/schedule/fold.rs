//! Schedule-driven fold engine.
//!
//! Both node types evaluate a source transducer once per attempt on a copy
//! of the same input, fold each produced value into a running state, and
//! wait the next scheduled duration before the following attempt. The loop
//! ends when:
//!
//! - the schedule is exhausted (the running state is reported)
//! - the predicate stops it (the value that stopped it is folded first)
//! - the source yields `Left` (only for [`FoldSum`]; the `Left` is reported)
//! - the source fails, is cancelled or produces nothing (propagated as is)
//!
//! A panic raised by the source is caught per attempt and ends the loop
//! with `Fail`; it is never retried.

use std::future::Future;
use std::marker::PhantomData;
use std::ops::ControlFlow;

use futures::future::BoxFuture;

use super::{Delays, Schedule};
use crate::control::Sum;
use crate::effect::Error;
use crate::transducer::{
    AsyncReduce, Reducer, TResult, TState, Transducer, TransducerAsync, step_once,
    step_once_async,
};

pub(crate) fn always<A>(_: &A) -> bool {
    true
}

pub(crate) fn keep_last<A>(_: Option<A>, value: A) -> Option<A> {
    Some(value)
}

/// Settles a repeat loop: the last success, or the failure that ended it.
pub(crate) fn keep_right<A>(output: Sum<Error, Option<A>>) -> Option<Sum<Error, A>> {
    match output {
        Sum::Left(error) => Some(Sum::Left(error)),
        Sum::Right(last) => last.map(Sum::Right),
    }
}

/// Settles a swapped retry loop: the success that ended it, or the last
/// failure once the schedule ran out.
pub(crate) fn keep_left<A>(output: Sum<A, Option<Error>>) -> Option<Sum<Error, A>> {
    match output {
        Sum::Left(value) => Some(Sum::Right(value)),
        Sum::Right(last) => last.map(Sum::Left),
    }
}

// =============================================================================
// Loop driver
// =============================================================================

fn next_delay(delays: &mut Delays, attempt: u64) -> Option<std::time::Duration> {
    let delay = delays.next();
    match delay {
        Some(delay) => tracing::debug!(attempt, ?delay, "scheduling next attempt"),
        None => tracing::debug!(attempt, "schedule exhausted"),
    }
    delay
}

fn drive<O, St, R>(
    schedule: &Schedule,
    state: &TState,
    initial: St,
    mut attempt: impl FnMut() -> TResult<O>,
    mut step: impl FnMut(St, O) -> ControlFlow<R, St>,
    exhausted: impl FnOnce(St) -> R,
) -> TResult<R> {
    let mut delays = schedule.run();
    let mut running = initial;
    let mut attempts = 0_u64;
    loop {
        if state.is_cancelled() {
            return TResult::Cancelled;
        }
        attempts += 1;
        let output = match attempt() {
            TResult::Continue(output) | TResult::Complete(output) => output,
            TResult::Cancelled => return TResult::Cancelled,
            TResult::None => return TResult::None,
            TResult::Fail(error) => return TResult::Fail(error),
        };
        running = match step(running, output) {
            ControlFlow::Continue(next) => next,
            ControlFlow::Break(result) => return TResult::Complete(result),
        };
        let Some(delay) = next_delay(&mut delays, attempts) else {
            return TResult::Complete(exhausted(running));
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

async fn drive_async<O, St, R, Fut>(
    schedule: &Schedule,
    state: &TState,
    initial: St,
    mut attempt: impl FnMut() -> Fut,
    mut step: impl FnMut(St, O) -> ControlFlow<R, St>,
    exhausted: impl FnOnce(St) -> R,
) -> TResult<R>
where
    Fut: Future<Output = TResult<O>>,
{
    let mut delays = schedule.run();
    let mut running = initial;
    let mut attempts = 0_u64;
    loop {
        if state.is_cancelled() {
            return TResult::Cancelled;
        }
        attempts += 1;
        let output = match attempt().await {
            TResult::Continue(output) | TResult::Complete(output) => output,
            TResult::Cancelled => return TResult::Cancelled,
            TResult::None => return TResult::None,
            TResult::Fail(error) => return TResult::Fail(error),
        };
        running = match step(running, output) {
            ControlFlow::Continue(next) => next,
            ControlFlow::Break(result) => return TResult::Complete(result),
        };
        let Some(delay) = next_delay(&mut delays, attempts) else {
            return TResult::Complete(exhausted(running));
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

// =============================================================================
// Fold over plain values
// =============================================================================

/// Repeatedly runs a transducer under a [`Schedule`], folding its outputs.
pub struct Fold<T, S, F, P, B> {
    source: T,
    schedule: Schedule,
    initial: S,
    folder: F,
    predicate: P,
    expect: bool,
    _value: PhantomData<fn(B)>,
}

impl<T, S, F, P, B> Fold<T, S, F, P, B>
where
    F: Fn(S, B) -> S,
    P: Fn(&B) -> bool,
{
    fn step(&self, running: S, value: B) -> ControlFlow<S, S> {
        let more = (self.predicate)(&value) == self.expect;
        let running = (self.folder)(running, value);
        if more {
            ControlFlow::Continue(running)
        } else {
            ControlFlow::Break(running)
        }
    }
}

impl<A, B, S, T, F, P> TransducerAsync<A, S> for Fold<T, S, F, P, B>
where
    A: Clone + Send + Sync + 'static,
    B: Send + 'static,
    S: Clone + Send + Sync + 'static,
    T: TransducerAsync<A, B>,
    F: Fn(S, B) -> S + Send + Sync,
    P: Fn(&B) -> bool + Send + Sync,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: A,
        reducer: &'a mut dyn AsyncReduce<S>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(async move {
            let source = &self.source;
            let input = &input;
            let outcome = drive_async(
                &self.schedule,
                state,
                self.initial.clone(),
                move || step_once_async(source, state, input.clone()),
                |running, value| self.step(running, value),
                |running| running,
            )
            .await;
            match outcome {
                TResult::Continue(result) | TResult::Complete(result) => {
                    reducer.reduce(state, result).await
                }
                TResult::Cancelled => TResult::Cancelled,
                TResult::None => TResult::None,
                TResult::Fail(error) => TResult::Fail(error),
            }
        })
    }
}

impl<A, B, S, T, F, P> Transducer<A, S> for Fold<T, S, F, P, B>
where
    A: Clone + Send + Sync + 'static,
    B: Send + 'static,
    S: Clone + Send + Sync + 'static,
    T: Transducer<A, B>,
    F: Fn(S, B) -> S + Send + Sync,
    P: Fn(&B) -> bool + Send + Sync,
{
    fn transform(&self, state: &TState, input: A, reducer: &mut Reducer<'_, S>) -> TResult<()> {
        drive(
            &self.schedule,
            state,
            self.initial.clone(),
            || step_once(&self.source, state, input.clone()),
            |running, value| self.step(running, value),
            |running| running,
        )
        .propagate(|result| reducer(state, result))
    }
}

/// Folds every output of `source` until `schedule` is exhausted.
///
/// # Examples
///
/// ```rust
/// use reductive::schedule::{self, Schedule};
/// use reductive::transducer::{self, invoke1};
///
/// let summed = schedule::fold(
///     transducer::map(|x: i32| x * 2),
///     Schedule::recurs(2),
///     0,
///     |total: i32, x: i32| total + x,
/// );
/// assert_eq!(invoke1(&summed, 5), Ok(30));
/// ```
pub fn fold<T, S, F, B>(
    source: T,
    schedule: Schedule,
    initial: S,
    folder: F,
) -> Fold<T, S, F, fn(&B) -> bool, B> {
    Fold {
        source,
        schedule,
        initial,
        folder,
        predicate: always::<B>,
        expect: true,
        _value: PhantomData,
    }
}

/// Like [`fold`], stopping after the first output that fails `predicate`.
pub fn fold_while<T, S, F, P, B>(
    source: T,
    schedule: Schedule,
    initial: S,
    folder: F,
    predicate: P,
) -> Fold<T, S, F, P, B> {
    Fold {
        source,
        schedule,
        initial,
        folder,
        predicate,
        expect: true,
        _value: PhantomData,
    }
}

/// Like [`fold`], stopping after the first output that satisfies `predicate`.
pub fn fold_until<T, S, F, P, B>(
    source: T,
    schedule: Schedule,
    initial: S,
    folder: F,
    predicate: P,
) -> Fold<T, S, F, P, B> {
    Fold {
        source,
        schedule,
        initial,
        folder,
        predicate,
        expect: false,
        _value: PhantomData,
    }
}

// =============================================================================
// Fold over the right channel of a Sum
// =============================================================================

/// Repeatedly runs a sum transducer under a [`Schedule`], folding its
/// `Right` outputs. A `Left` output ends the loop and is reported as is.
///
/// `O` is the `Sum` type produced by the source.
pub struct FoldSum<T, S, F, P, O> {
    source: T,
    schedule: Schedule,
    initial: S,
    folder: F,
    predicate: P,
    expect: bool,
    _output: PhantomData<fn(O)>,
}

impl<T, S, F, B, X> FoldSum<T, S, F, fn(&B) -> bool, Sum<X, B>> {
    /// Folds every `Right` output until `schedule` is exhausted.
    pub fn new(source: T, schedule: Schedule, initial: S, folder: F) -> Self {
        Self::with_predicate(source, schedule, initial, folder, always::<B>, true)
    }
}

impl<T, S, F, P, O> FoldSum<T, S, F, P, O> {
    /// Folds `Right` outputs, continuing while `predicate(value) == expect`.
    ///
    /// The value that stops the loop is folded before the loop ends.
    pub fn with_predicate(
        source: T,
        schedule: Schedule,
        initial: S,
        folder: F,
        predicate: P,
        expect: bool,
    ) -> Self {
        Self {
            source,
            schedule,
            initial,
            folder,
            predicate,
            expect,
            _output: PhantomData,
        }
    }

    fn step<X, B>(&self, running: S, output: Sum<X, B>) -> ControlFlow<Sum<X, S>, S>
    where
        F: Fn(S, B) -> S,
        P: Fn(&B) -> bool,
    {
        match output {
            Sum::Left(alternative) => ControlFlow::Break(Sum::Left(alternative)),
            Sum::Right(value) => {
                let more = (self.predicate)(&value) == self.expect;
                let running = (self.folder)(running, value);
                if more {
                    ControlFlow::Continue(running)
                } else {
                    ControlFlow::Break(Sum::Right(running))
                }
            }
        }
    }
}

impl<I, X, B, S, T, F, P> TransducerAsync<I, Sum<X, S>> for FoldSum<T, S, F, P, Sum<X, B>>
where
    I: Clone + Send + Sync + 'static,
    X: Send + 'static,
    B: Send + 'static,
    S: Clone + Send + Sync + 'static,
    T: TransducerAsync<I, Sum<X, B>>,
    F: Fn(S, B) -> S + Send + Sync,
    P: Fn(&B) -> bool + Send + Sync,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: I,
        reducer: &'a mut dyn AsyncReduce<Sum<X, S>>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(async move {
            let source = &self.source;
            let input = &input;
            let outcome = drive_async(
                &self.schedule,
                state,
                self.initial.clone(),
                move || step_once_async(source, state, input.clone()),
                |running, output| self.step(running, output),
                Sum::Right,
            )
            .await;
            match outcome {
                TResult::Continue(result) | TResult::Complete(result) => {
                    reducer.reduce(state, result).await
                }
                TResult::Cancelled => TResult::Cancelled,
                TResult::None => TResult::None,
                TResult::Fail(error) => TResult::Fail(error),
            }
        })
    }
}

impl<I, X, B, S, T, F, P> Transducer<I, Sum<X, S>> for FoldSum<T, S, F, P, Sum<X, B>>
where
    I: Clone + Send + Sync + 'static,
    X: Send + 'static,
    B: Send + 'static,
    S: Clone + Send + Sync + 'static,
    T: Transducer<I, Sum<X, B>>,
    F: Fn(S, B) -> S + Send + Sync,
    P: Fn(&B) -> bool + Send + Sync,
{
    fn transform(
        &self,
        state: &TState,
        input: I,
        reducer: &mut Reducer<'_, Sum<X, S>>,
    ) -> TResult<()> {
        drive(
            &self.schedule,
            state,
            self.initial.clone(),
            || step_once(&self.source, state, input.clone()),
            |running, output| self.step(running, output),
            Sum::Right,
        )
        .propagate(|result| reducer(state, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transducer::{self, TransducerExt, invoke1, invoke1_async};
    use rstest::rstest;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI32, Ordering};

    fn counting() -> (Arc<AtomicI32>, impl Fn(()) -> i32 + Send + Sync + 'static) {
        let calls = Arc::new(AtomicI32::new(0));
        let counter = calls.clone();
        (calls, move |()| counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[rstest]
    #[case(Sum::Right(Some(3)), Some(Sum::Right(3)))]
    #[case(Sum::Right(None), None)]
    #[case(Sum::Left(Error::new("stop")), Some(Sum::Left(Error::new("stop"))))]
    fn test_keep_right(
        #[case] output: Sum<Error, Option<i32>>,
        #[case] expected: Option<Sum<Error, i32>>,
    ) {
        assert_eq!(keep_right(output), expected);
    }

    #[rstest]
    #[case(Sum::Left(3), Some(Sum::Right(3)))]
    #[case(Sum::Right(None), None)]
    #[case(Sum::Right(Some(Error::new("last"))), Some(Sum::Left(Error::new("last"))))]
    fn test_keep_left(
        #[case] output: Sum<i32, Option<Error>>,
        #[case] expected: Option<Sum<Error, i32>>,
    ) {
        assert_eq!(keep_left(output), expected);
    }

    #[rstest]
    fn test_fold_consumes_every_duration() {
        let (calls, source) = counting();
        let summed = fold(transducer::map(source), Schedule::recurs(3), 0, |a: i32, b: i32| a + b);
        assert_eq!(invoke1(&summed, ()), Ok(1 + 2 + 3 + 4));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[rstest]
    fn test_fold_while_folds_stopping_value() {
        let (_, source) = counting();
        let collected = fold_while(
            transducer::map(source),
            Schedule::forever(),
            Vec::new(),
            |mut seen: Vec<i32>, x: i32| {
                seen.push(x);
                seen
            },
            |x: &i32| *x < 3,
        );
        assert_eq!(invoke1(&collected, ()), Ok(vec![1, 2, 3]));
    }

    #[rstest]
    fn test_fold_until_stops_on_match() {
        let (calls, source) = counting();
        let last = fold_until(
            transducer::map(source),
            Schedule::forever(),
            0,
            |_: i32, x: i32| x,
            |x: &i32| *x == 5,
        );
        assert_eq!(invoke1(&last, ()), Ok(5));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[rstest]
    fn test_fold_sum_stops_on_left() {
        let (calls, source) = counting();
        let mixed = transducer::map(source).map(|x: i32| {
            if x == 2 {
                Sum::Left("stop")
            } else {
                Sum::Right(x)
            }
        });
        let folded = FoldSum::new(mixed, Schedule::forever(), 0, |a: i32, b: i32| a + b);
        assert_eq!(invoke1(&folded, ()), Ok(Sum::Left("stop")));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[rstest]
    fn test_source_panic_is_not_retried() {
        let (calls, source) = counting();
        let exploding = transducer::map(source).map(|x: i32| -> i32 {
            if x == 2 {
                panic!("second attempt")
            }
            x
        });
        let folded = fold(exploding, Schedule::forever(), 0, |a: i32, b: i32| a + b);
        assert_eq!(
            invoke1(&folded, ()),
            Err(Error::exceptional("second attempt"))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[rstest]
    fn test_cancelled_state_stops_before_first_attempt() {
        let (calls, source) = counting();
        let state = TState::new();
        state.cancel();
        let folded = fold(transducer::map(source), Schedule::forever(), 0, |a: i32, b: i32| a + b);
        assert_eq!(
            transducer::invoke1_with(&folded, &state, ()),
            Err(Error::Cancelled)
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_async_fold_waits_between_attempts() {
        let (calls, source) = counting();
        let schedule = Schedule::spaced(std::time::Duration::from_secs(10)).take(2);
        let folded = fold(transducer::map(source), schedule, 0, |a: i32, b: i32| a + b);

        let started = tokio::time::Instant::now();
        assert_eq!(invoke1_async(&folded, ()).await, Ok(6));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= std::time::Duration::from_secs(20));
    }
}
