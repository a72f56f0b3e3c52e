//! Composition of transducers.
//!
//! Every node here is inert: building a [`Compose`] or a [`Bind`] never runs
//! either part. The async forms thread small reducer adapters through the
//! inner reduction instead of closures, since a boxed future has to own what
//! it borrows from the step that created it.

use std::marker::PhantomData;

use futures::future::{self, BoxFuture};

use super::{AsyncReduce, Reducer, TResult, TState, Transducer, TransducerAsync};

// =============================================================================
// Compose
// =============================================================================

/// Sequential composition: every output of `first` is fed into `second`.
pub struct Compose<F, G, B> {
    first: F,
    second: G,
    _middle: PhantomData<fn(B) -> B>,
}

impl<F, G, B> Compose<F, G, B> {
    /// Composes `first` with `second`.
    pub const fn new(first: F, second: G) -> Self {
        Self {
            first,
            second,
            _middle: PhantomData,
        }
    }
}

impl<F: Clone, G: Clone, B> Clone for Compose<F, G, B> {
    fn clone(&self) -> Self {
        Self::new(self.first.clone(), self.second.clone())
    }
}

/// Feeds every value it receives through a downstream transducer.
struct Then<'t, T: ?Sized, C> {
    transducer: &'t T,
    reducer: &'t mut dyn AsyncReduce<C>,
}

impl<B, C, T> AsyncReduce<B> for Then<'_, T, C>
where
    T: TransducerAsync<B, C> + ?Sized,
{
    fn reduce<'a>(&'a mut self, state: &'a TState, value: B) -> BoxFuture<'a, TResult<()>> {
        self.transducer.transform_async(state, value, &mut *self.reducer)
    }
}

impl<A, B, C, F, G> TransducerAsync<A, C> for Compose<F, G, B>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    F: TransducerAsync<A, B>,
    G: TransducerAsync<B, C>,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: A,
        reducer: &'a mut dyn AsyncReduce<C>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(async move {
            let mut then = Then {
                transducer: &self.second,
                reducer,
            };
            self.first.transform_async(state, input, &mut then).await
        })
    }
}

impl<A, B, C, F, G> Transducer<A, C> for Compose<F, G, B>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    F: Transducer<A, B>,
    G: Transducer<B, C>,
{
    fn transform(&self, state: &TState, input: A, reducer: &mut Reducer<'_, C>) -> TResult<()> {
        self.first.transform(state, input, &mut |state: &TState, value: B| {
            self.second.transform(state, value, reducer)
        })
    }
}

/// Composes two transducers left to right.
///
/// # Examples
///
/// ```rust
/// use reductive::transducer::{self, compose, invoke1};
///
/// let both = compose(transducer::map(|x: i32| x + 1), transducer::map(|x: i32| x * 3));
/// assert_eq!(invoke1(&both, 1), Ok(6));
/// ```
pub const fn compose<F, G, B>(first: F, second: G) -> Compose<F, G, B> {
    Compose::new(first, second)
}

// =============================================================================
// Bind / Flatten
// =============================================================================

/// Dependent composition: each output of the first stage picks the
/// transducer that then runs on the original input.
pub struct Bind<T, F, B> {
    transducer: T,
    next: F,
    _value: PhantomData<fn(B) -> B>,
}

impl<T, F, B> Bind<T, F, B> {
    /// Binds `transducer` to the continuation `next`.
    pub const fn new(transducer: T, next: F) -> Self {
        Self {
            transducer,
            next,
            _value: PhantomData,
        }
    }
}

/// Runs the transducer chosen by each value on a copy of the input.
struct BindReduce<'t, F, A, C> {
    next: &'t F,
    input: A,
    reducer: &'t mut dyn AsyncReduce<C>,
}

impl<A, B, C, F, U> AsyncReduce<B> for BindReduce<'_, F, A, C>
where
    A: Clone + Send + 'static,
    C: Send + 'static,
    F: Fn(B) -> U + Send + Sync,
    U: TransducerAsync<A, C> + 'static,
{
    fn reduce<'a>(&'a mut self, state: &'a TState, value: B) -> BoxFuture<'a, TResult<()>> {
        if let Err(outcome) = state.check() {
            return Box::pin(future::ready(outcome));
        }
        let next = (self.next)(value);
        let input = self.input.clone();
        let reducer = &mut *self.reducer;
        Box::pin(async move { next.transform_async(state, input, reducer).await })
    }
}

impl<A, B, C, T, F, U> TransducerAsync<A, C> for Bind<T, F, B>
where
    A: Clone + Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    T: TransducerAsync<A, B>,
    F: Fn(B) -> U + Send + Sync,
    U: TransducerAsync<A, C> + 'static,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: A,
        reducer: &'a mut dyn AsyncReduce<C>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(async move {
            let mut bind = BindReduce {
                next: &self.next,
                input: input.clone(),
                reducer,
            };
            self.transducer.transform_async(state, input, &mut bind).await
        })
    }
}

impl<A, B, C, T, F, U> Transducer<A, C> for Bind<T, F, B>
where
    A: Clone + Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    T: Transducer<A, B>,
    F: Fn(B) -> U + Send + Sync,
    U: Transducer<A, C> + 'static,
{
    fn transform(&self, state: &TState, input: A, reducer: &mut Reducer<'_, C>) -> TResult<()> {
        let again = input.clone();
        self.transducer.transform(state, input, &mut |state: &TState, value: B| {
            if let Err(outcome) = state.check() {
                return outcome;
            }
            (self.next)(value).transform(state, again.clone(), reducer)
        })
    }
}

/// Binds a transducer to a continuation producing the next transducer.
pub const fn bind<T, F, B>(transducer: T, next: F) -> Bind<T, F, B> {
    Bind::new(transducer, next)
}

/// Collapses a transducer that produces transducers.
///
/// The outer step is inspected before the produced transducer runs, so a
/// failing or cancelled outer stage never reaches the inner one.
pub struct Flatten<T, U> {
    outer: T,
    _inner: PhantomData<fn() -> U>,
}

impl<T, U> Flatten<T, U> {
    /// Flattens `outer`.
    pub const fn new(outer: T) -> Self {
        Self {
            outer,
            _inner: PhantomData,
        }
    }
}

impl<A, B, T, U> TransducerAsync<A, B> for Flatten<T, U>
where
    A: Clone + Send + 'static,
    B: Send + 'static,
    T: TransducerAsync<A, U>,
    U: TransducerAsync<A, B> + 'static,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: A,
        reducer: &'a mut dyn AsyncReduce<B>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(async move {
            let select: fn(U) -> U = std::convert::identity;
            let mut bind = BindReduce {
                next: &select,
                input: input.clone(),
                reducer,
            };
            self.outer.transform_async(state, input, &mut bind).await
        })
    }
}

impl<A, B, T, U> Transducer<A, B> for Flatten<T, U>
where
    A: Clone + Send + 'static,
    B: Send + 'static,
    T: Transducer<A, U>,
    U: Transducer<A, B> + 'static,
{
    fn transform(&self, state: &TState, input: A, reducer: &mut Reducer<'_, B>) -> TResult<()> {
        let again = input.clone();
        self.outer.transform(state, input, &mut |state: &TState, inner: U| {
            if let Err(outcome) = state.check() {
                return outcome;
            }
            inner.transform(state, again.clone(), reducer)
        })
    }
}

/// Flattens a transducer of transducers.
pub const fn flatten<T, U>(outer: T) -> Flatten<T, U> {
    Flatten::new(outer)
}

// =============================================================================
// Apply
// =============================================================================

/// Runs two transducers on the same input and combines their outputs.
///
/// The first transducer is evaluated first; if it fails, is cancelled or
/// produces nothing, the second never runs.
pub struct Apply<T1, T2, F, B, C> {
    first: T1,
    second: T2,
    combine: F,
    _values: PhantomData<fn(B, C)>,
}

impl<T1, T2, F, B, C> Apply<T1, T2, F, B, C> {
    /// Creates the applicative combination of `first` and `second`.
    pub const fn new(first: T1, second: T2, combine: F) -> Self {
        Self {
            first,
            second,
            combine,
            _values: PhantomData,
        }
    }
}

/// Receives each output of the first stage and runs the second stage.
struct ApplyFirst<'t, T2, F, A, C, D> {
    second: &'t T2,
    combine: &'t F,
    input: A,
    reducer: &'t mut dyn AsyncReduce<D>,
    _right: PhantomData<fn(C)>,
}

/// Combines each output of the second stage with the held first output.
struct ApplySecond<'t, F, B, D> {
    combine: &'t F,
    left: B,
    reducer: &'t mut dyn AsyncReduce<D>,
}

impl<B, C, D, F> AsyncReduce<C> for ApplySecond<'_, F, B, D>
where
    B: Clone + Send,
    F: Fn(B, C) -> D + Send + Sync,
{
    fn reduce<'a>(&'a mut self, state: &'a TState, value: C) -> BoxFuture<'a, TResult<()>> {
        let combined = (self.combine)(self.left.clone(), value);
        self.reducer.reduce(state, combined)
    }
}

impl<A, B, C, D, T2, F> AsyncReduce<B> for ApplyFirst<'_, T2, F, A, C, D>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Send + 'static,
    D: Send + 'static,
    T2: TransducerAsync<A, C>,
    F: Fn(B, C) -> D + Send + Sync,
{
    fn reduce<'a>(&'a mut self, state: &'a TState, value: B) -> BoxFuture<'a, TResult<()>> {
        let transducer = self.second;
        let input = self.input.clone();
        let mut second = ApplySecond {
            combine: self.combine,
            left: value,
            reducer: &mut *self.reducer,
        };
        Box::pin(async move { transducer.transform_async(state, input, &mut second).await })
    }
}

impl<A, B, C, D, T1, T2, F> TransducerAsync<A, D> for Apply<T1, T2, F, B, C>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Send + 'static,
    D: Send + 'static,
    T1: TransducerAsync<A, B>,
    T2: TransducerAsync<A, C>,
    F: Fn(B, C) -> D + Send + Sync,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: A,
        reducer: &'a mut dyn AsyncReduce<D>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(async move {
            let mut first = ApplyFirst {
                second: &self.second,
                combine: &self.combine,
                input: input.clone(),
                reducer,
                _right: PhantomData,
            };
            self.first.transform_async(state, input, &mut first).await
        })
    }
}

impl<A, B, C, D, T1, T2, F> Transducer<A, D> for Apply<T1, T2, F, B, C>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Send + 'static,
    D: Send + 'static,
    T1: Transducer<A, B>,
    T2: Transducer<A, C>,
    F: Fn(B, C) -> D + Send + Sync,
{
    fn transform(&self, state: &TState, input: A, reducer: &mut Reducer<'_, D>) -> TResult<()> {
        let again = input.clone();
        self.first.transform(state, input, &mut |state: &TState, left: B| {
            self.second
                .transform(state, again.clone(), &mut |state: &TState, right: C| {
                    reducer(state, (self.combine)(left.clone(), right))
                })
        })
    }
}

/// Combines the outputs of two transducers run on the same input.
///
/// # Examples
///
/// ```rust
/// use reductive::transducer::{self, apply, invoke1};
///
/// let pair = apply(
///     transducer::map(|x: i32| x + 1),
///     transducer::map(|x: i32| x * 10),
///     |a: i32, b: i32| (a, b),
/// );
/// assert_eq!(invoke1(&pair, 2), Ok((3, 20)));
/// ```
pub const fn apply<T1, T2, F, B, C>(first: T1, second: T2, combine: F) -> Apply<T1, T2, F, B, C> {
    Apply::new(first, second, combine)
}

// =============================================================================
// Action
// =============================================================================

/// Sequences two transducers on the same input, keeping only the outputs of
/// the second.
pub struct Action<T1, T2, B> {
    first: T1,
    second: T2,
    _discarded: PhantomData<fn(B)>,
}

impl<T1, T2, B> Action<T1, T2, B> {
    /// Runs `second` after each output of `first`.
    pub const fn new(first: T1, second: T2) -> Self {
        Self {
            first,
            second,
            _discarded: PhantomData,
        }
    }
}

/// Discards each value and runs the follow-up stage instead.
struct ActionReduce<'t, T, A, C> {
    next: &'t T,
    input: A,
    reducer: &'t mut dyn AsyncReduce<C>,
}

impl<A, B, C, T> AsyncReduce<B> for ActionReduce<'_, T, A, C>
where
    A: Clone + Send + 'static,
    T: TransducerAsync<A, C>,
{
    fn reduce<'a>(&'a mut self, state: &'a TState, _value: B) -> BoxFuture<'a, TResult<()>> {
        if let Err(outcome) = state.check() {
            return Box::pin(future::ready(outcome));
        }
        self.next
            .transform_async(state, self.input.clone(), &mut *self.reducer)
    }
}

impl<A, B, C, T1, T2> TransducerAsync<A, C> for Action<T1, T2, B>
where
    A: Clone + Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    T1: TransducerAsync<A, B>,
    T2: TransducerAsync<A, C>,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: A,
        reducer: &'a mut dyn AsyncReduce<C>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(async move {
            let mut action = ActionReduce {
                next: &self.second,
                input: input.clone(),
                reducer,
            };
            self.first.transform_async(state, input, &mut action).await
        })
    }
}

impl<A, B, C, T1, T2> Transducer<A, C> for Action<T1, T2, B>
where
    A: Clone + Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    T1: Transducer<A, B>,
    T2: Transducer<A, C>,
{
    fn transform(&self, state: &TState, input: A, reducer: &mut Reducer<'_, C>) -> TResult<()> {
        let again = input.clone();
        self.first.transform(state, input, &mut |state: &TState, _: B| {
            if let Err(outcome) = state.check() {
                return outcome;
            }
            self.second.transform(state, again.clone(), reducer)
        })
    }
}

/// Runs `second` on the input after each output of `first`.
pub const fn action<T1, T2, B>(first: T1, second: T2) -> Action<T1, T2, B> {
    Action::new(first, second)
}
