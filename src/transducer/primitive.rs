//! Leaf transducers.

use std::future::Future;
use std::marker::PhantomData;

use futures::future::{self, BoxFuture};

use super::{AsyncReduce, Reducer, TResult, TState, Transducer, TransducerAsync};
use crate::effect::Error;

// =============================================================================
// Identity
// =============================================================================

/// Passes every input through unchanged.
pub struct Identity<A> {
    _value: PhantomData<fn(A) -> A>,
}

impl<A> Identity<A> {
    /// Creates the identity transducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _value: PhantomData,
        }
    }
}

impl<A> Default for Identity<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for Identity<A> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<A> TransducerAsync<A, A> for Identity<A>
where
    A: Send + 'static,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: A,
        reducer: &'a mut dyn AsyncReduce<A>,
    ) -> BoxFuture<'a, TResult<()>> {
        reducer.reduce(state, input)
    }
}

impl<A> Transducer<A, A> for Identity<A>
where
    A: Send + 'static,
{
    fn transform(&self, state: &TState, input: A, reducer: &mut Reducer<'_, A>) -> TResult<()> {
        reducer(state, input)
    }
}

/// Creates the identity transducer.
#[must_use]
pub const fn identity<A>() -> Identity<A> {
    Identity::new()
}

// =============================================================================
// Constant
// =============================================================================

/// Ignores its input and produces a fixed value.
pub struct Constant<A, B> {
    value: B,
    _input: PhantomData<fn(A)>,
}

impl<A, B> Constant<A, B> {
    /// Creates a transducer producing `value` for every input.
    pub const fn new(value: B) -> Self {
        Self {
            value,
            _input: PhantomData,
        }
    }
}

impl<A, B: Clone> Clone for Constant<A, B> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<A, B> TransducerAsync<A, B> for Constant<A, B>
where
    A: Send + 'static,
    B: Clone + Send + Sync + 'static,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        _input: A,
        reducer: &'a mut dyn AsyncReduce<B>,
    ) -> BoxFuture<'a, TResult<()>> {
        reducer.reduce(state, self.value.clone())
    }
}

impl<A, B> Transducer<A, B> for Constant<A, B>
where
    A: Send + 'static,
    B: Clone + Send + Sync + 'static,
{
    fn transform(&self, state: &TState, _input: A, reducer: &mut Reducer<'_, B>) -> TResult<()> {
        reducer(state, self.value.clone())
    }
}

/// Creates a transducer that always produces `value`.
pub const fn constant<A, B>(value: B) -> Constant<A, B> {
    Constant::new(value)
}

// =============================================================================
// Map
// =============================================================================

/// Lifts a pure function.
#[derive(Clone)]
pub struct Map<F> {
    function: F,
}

impl<F> Map<F> {
    /// Wraps `function`.
    pub const fn new(function: F) -> Self {
        Self { function }
    }
}

impl<A, B, F> TransducerAsync<A, B> for Map<F>
where
    A: Send + 'static,
    B: Send + 'static,
    F: Fn(A) -> B + Send + Sync,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: A,
        reducer: &'a mut dyn AsyncReduce<B>,
    ) -> BoxFuture<'a, TResult<()>> {
        reducer.reduce(state, (self.function)(input))
    }
}

impl<A, B, F> Transducer<A, B> for Map<F>
where
    A: Send + 'static,
    B: Send + 'static,
    F: Fn(A) -> B + Send + Sync,
{
    fn transform(&self, state: &TState, input: A, reducer: &mut Reducer<'_, B>) -> TResult<()> {
        reducer(state, (self.function)(input))
    }
}

/// Lifts a pure function into a transducer.
pub const fn map<F>(function: F) -> Map<F> {
    Map::new(function)
}

// =============================================================================
// MapAsync
// =============================================================================

/// Lifts an asynchronous function. Only usable through the async protocol.
#[derive(Clone)]
pub struct MapAsync<F> {
    function: F,
}

impl<F> MapAsync<F> {
    /// Wraps `function`.
    pub const fn new(function: F) -> Self {
        Self { function }
    }
}

impl<A, B, F, Fut> TransducerAsync<A, B> for MapAsync<F>
where
    A: Send + 'static,
    B: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync,
    Fut: Future<Output = B> + Send + 'static,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: A,
        reducer: &'a mut dyn AsyncReduce<B>,
    ) -> BoxFuture<'a, TResult<()>> {
        let pending = (self.function)(input);
        Box::pin(async move {
            let value = pending.await;
            reducer.reduce(state, value).await
        })
    }
}

/// Lifts an asynchronous function into a transducer.
pub const fn map_async<F>(function: F) -> MapAsync<F> {
    MapAsync::new(function)
}

// =============================================================================
// Filter / FilterMap
// =============================================================================

/// Passes on the inputs satisfying a predicate.
#[derive(Clone)]
pub struct Filter<F> {
    predicate: F,
}

impl<F> Filter<F> {
    /// Wraps `predicate`.
    pub const fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<A, F> TransducerAsync<A, A> for Filter<F>
where
    A: Send + 'static,
    F: Fn(&A) -> bool + Send + Sync,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: A,
        reducer: &'a mut dyn AsyncReduce<A>,
    ) -> BoxFuture<'a, TResult<()>> {
        if (self.predicate)(&input) {
            reducer.reduce(state, input)
        } else {
            Box::pin(future::ready(TResult::CONTINUE))
        }
    }
}

impl<A, F> Transducer<A, A> for Filter<F>
where
    A: Send + 'static,
    F: Fn(&A) -> bool + Send + Sync,
{
    fn transform(&self, state: &TState, input: A, reducer: &mut Reducer<'_, A>) -> TResult<()> {
        if (self.predicate)(&input) {
            reducer(state, input)
        } else {
            TResult::CONTINUE
        }
    }
}

/// Keeps the inputs satisfying `predicate`.
pub const fn filter<F>(predicate: F) -> Filter<F> {
    Filter::new(predicate)
}

/// Maps and filters in one step: `None` results are dropped.
#[derive(Clone)]
pub struct FilterMap<F> {
    function: F,
}

impl<F> FilterMap<F> {
    /// Wraps `function`.
    pub const fn new(function: F) -> Self {
        Self { function }
    }
}

impl<A, B, F> TransducerAsync<A, B> for FilterMap<F>
where
    A: Send + 'static,
    B: Send + 'static,
    F: Fn(A) -> Option<B> + Send + Sync,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: A,
        reducer: &'a mut dyn AsyncReduce<B>,
    ) -> BoxFuture<'a, TResult<()>> {
        match (self.function)(input) {
            Some(value) => reducer.reduce(state, value),
            None => Box::pin(future::ready(TResult::CONTINUE)),
        }
    }
}

impl<A, B, F> Transducer<A, B> for FilterMap<F>
where
    A: Send + 'static,
    B: Send + 'static,
    F: Fn(A) -> Option<B> + Send + Sync,
{
    fn transform(&self, state: &TState, input: A, reducer: &mut Reducer<'_, B>) -> TResult<()> {
        match (self.function)(input) {
            Some(value) => reducer(state, value),
            None => TResult::CONTINUE,
        }
    }
}

/// Maps inputs through `function`, dropping `None` results.
pub const fn filter_map<F>(function: F) -> FilterMap<F> {
    FilterMap::new(function)
}

// =============================================================================
// Each
// =============================================================================

/// Produces every element of an iterable input, stopping as soon as the
/// downstream reducer does.
pub struct Each<I> {
    _input: PhantomData<fn(I)>,
}

impl<I> Each<I> {
    /// Creates the element-wise transducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _input: PhantomData,
        }
    }
}

impl<I> Default for Each<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> TransducerAsync<I, I::Item> for Each<I>
where
    I: IntoIterator + Send + 'static,
    I::Item: Send + 'static,
    I::IntoIter: Send,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: I,
        reducer: &'a mut dyn AsyncReduce<I::Item>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(async move {
            for item in input {
                match reducer.reduce(state, item).await {
                    TResult::Continue(()) => {}
                    other => return other,
                }
            }
            TResult::CONTINUE
        })
    }
}

impl<I> Transducer<I, I::Item> for Each<I>
where
    I: IntoIterator + Send + 'static,
    I::Item: Send + 'static,
    I::IntoIter: Send,
{
    fn transform(
        &self,
        state: &TState,
        input: I,
        reducer: &mut Reducer<'_, I::Item>,
    ) -> TResult<()> {
        for item in input {
            match reducer(state, item) {
                TResult::Continue(()) => {}
                other => return other,
            }
        }
        TResult::CONTINUE
    }
}

/// Creates a transducer producing every element of its input.
#[must_use]
pub const fn each<I>() -> Each<I> {
    Each::new()
}

// =============================================================================
// Terminal signals
// =============================================================================

/// Yields `Cancelled` for every input.
pub struct Cancel<A, B> {
    _types: PhantomData<fn(A) -> B>,
}

impl<A, B> TransducerAsync<A, B> for Cancel<A, B>
where
    A: Send + 'static,
{
    fn transform_async<'a>(
        &'a self,
        _state: &'a TState,
        _input: A,
        _reducer: &'a mut dyn AsyncReduce<B>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(future::ready(TResult::Cancelled))
    }
}

impl<A, B> Transducer<A, B> for Cancel<A, B>
where
    A: Send + 'static,
{
    fn transform(&self, _state: &TState, _input: A, _reducer: &mut Reducer<'_, B>) -> TResult<()> {
        TResult::Cancelled
    }
}

/// Creates a transducer that cancels the reduction.
#[must_use]
pub const fn cancel<A, B>() -> Cancel<A, B> {
    Cancel {
        _types: PhantomData,
    }
}

/// Yields `Fail(error)` for every input.
pub struct Raise<A, B> {
    error: Error,
    _types: PhantomData<fn(A) -> B>,
}

impl<A, B> TransducerAsync<A, B> for Raise<A, B>
where
    A: Send + 'static,
{
    fn transform_async<'a>(
        &'a self,
        _state: &'a TState,
        _input: A,
        _reducer: &'a mut dyn AsyncReduce<B>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(future::ready(TResult::Fail(self.error.clone())))
    }
}

impl<A, B> Transducer<A, B> for Raise<A, B>
where
    A: Send + 'static,
{
    fn transform(&self, _state: &TState, _input: A, _reducer: &mut Reducer<'_, B>) -> TResult<()> {
        TResult::Fail(self.error.clone())
    }
}

/// Creates a transducer that aborts the reduction with `error`.
#[must_use]
pub const fn fail<A, B>(error: Error) -> Raise<A, B> {
    Raise {
        error,
        _types: PhantomData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transducer::{TransducerExt, invoke_many, invoke1};
    use rstest::rstest;

    #[rstest]
    fn test_constant_ignores_input() {
        assert_eq!(invoke1(&constant::<i32, _>("fixed"), 99), Ok("fixed"));
    }

    #[rstest]
    fn test_filter_map_drops_none() {
        let parse = each::<Vec<&str>>().then(filter_map(|s: &str| s.parse::<i32>().ok()));
        assert_eq!(invoke_many(&parse, vec!["1", "x", "3"]), Ok(vec![1, 3]));
    }

    #[rstest]
    fn test_each_stops_when_reducer_completes() {
        let seen = std::sync::Mutex::new(Vec::new());
        let spy = each::<Vec<i32>>().map(|x: i32| {
            seen.lock().unwrap().push(x);
            x
        });
        assert_eq!(invoke1(&spy, vec![1, 2, 3]), Ok(1));
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[rstest]
    fn test_cancel_and_fail_signals() {
        assert_eq!(invoke1(&cancel::<i32, i32>(), 1), Err(Error::Cancelled));
        assert_eq!(
            invoke1(&fail::<i32, i32>(Error::new("nope")), 1),
            Err(Error::new("nope"))
        );
    }
}
