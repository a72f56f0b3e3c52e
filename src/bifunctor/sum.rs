//! Transducers over the two channels of a [`Sum`].
//!
//! A sum transducer maps `Sum<X, A>` to `Sum<Y, B>`. Sequential composition
//! is plain [`Compose`](crate::transducer::Compose): a `Left` output of the
//! first stage arrives on the left channel of the second, a `Right` output
//! on its right channel.
//!
//! [`SumBind`] and [`SumApply`] are the short-circuiting forms: a `Left`
//! stops the computation and is passed on unchanged, and no continuation or
//! second stage ever runs after it.

use std::marker::PhantomData;

use futures::future::{self, BoxFuture};

use crate::control::Sum;
use crate::transducer::{AsyncReduce, Reducer, TResult, TState, Transducer, TransducerAsync};

/// A synchronous transducer from `Sum<X, A>` to `Sum<Y, B>`.
pub trait SumTransducer<X, Y, A, B>: Transducer<Sum<X, A>, Sum<Y, B>> {}

impl<X, Y, A, B, T> SumTransducer<X, Y, A, B> for T where
    T: Transducer<Sum<X, A>, Sum<Y, B>> + ?Sized
{
}

/// An asynchronous transducer from `Sum<X, A>` to `Sum<Y, B>`.
pub trait SumTransducerAsync<X, Y, A, B>: TransducerAsync<Sum<X, A>, Sum<Y, B>> {}

impl<X, Y, A, B, T> SumTransducerAsync<X, Y, A, B> for T where
    T: TransducerAsync<Sum<X, A>, Sum<Y, B>> + ?Sized
{
}

// =============================================================================
// Channel dispatch
// =============================================================================

/// Runs a sum transducer, routing each output to the reducer of its channel.
pub fn bi_transform<X, Y, A, B, T>(
    transducer: &T,
    state: &TState,
    input: Sum<X, A>,
    left: &mut Reducer<'_, Y>,
    right: &mut Reducer<'_, B>,
) -> TResult<()>
where
    T: SumTransducer<X, Y, A, B> + ?Sized,
{
    transducer.transform(state, input, &mut |state: &TState, output: Sum<Y, B>| match output {
        Sum::Left(value) => left(state, value),
        Sum::Right(value) => right(state, value),
    })
}

/// Runs a sum transducer, reducing only its `Left` outputs.
pub fn transform_left<X, Y, A, B, T>(
    transducer: &T,
    state: &TState,
    input: Sum<X, A>,
    reducer: &mut Reducer<'_, Y>,
) -> TResult<()>
where
    T: SumTransducer<X, Y, A, B> + ?Sized,
{
    bi_transform(transducer, state, input, reducer, &mut |_: &TState, _: B| {
        TResult::CONTINUE
    })
}

/// Runs a sum transducer, reducing only its `Right` outputs.
pub fn transform_right<X, Y, A, B, T>(
    transducer: &T,
    state: &TState,
    input: Sum<X, A>,
    reducer: &mut Reducer<'_, B>,
) -> TResult<()>
where
    T: SumTransducer<X, Y, A, B> + ?Sized,
{
    bi_transform(transducer, state, input, &mut |_: &TState, _: Y| TResult::CONTINUE, reducer)
}

/// The left-channel projection of a sum transducer.
pub struct LeftChannel<T, B> {
    transducer: T,
    _dropped: PhantomData<fn(B)>,
}

/// The right-channel projection of a sum transducer.
pub struct RightChannel<T, Y> {
    transducer: T,
    _dropped: PhantomData<fn(Y)>,
}

struct KeepLeft<'t, Y, B> {
    reducer: &'t mut dyn AsyncReduce<Y>,
    _dropped: PhantomData<fn(B)>,
}

impl<Y: Send, B> AsyncReduce<Sum<Y, B>> for KeepLeft<'_, Y, B> {
    fn reduce<'a>(&'a mut self, state: &'a TState, value: Sum<Y, B>) -> BoxFuture<'a, TResult<()>> {
        match value {
            Sum::Left(value) => self.reducer.reduce(state, value),
            Sum::Right(_) => Box::pin(future::ready(TResult::CONTINUE)),
        }
    }
}

struct KeepRight<'t, Y, B> {
    reducer: &'t mut dyn AsyncReduce<B>,
    _dropped: PhantomData<fn(Y)>,
}

impl<Y, B: Send> AsyncReduce<Sum<Y, B>> for KeepRight<'_, Y, B> {
    fn reduce<'a>(&'a mut self, state: &'a TState, value: Sum<Y, B>) -> BoxFuture<'a, TResult<()>> {
        match value {
            Sum::Left(_) => Box::pin(future::ready(TResult::CONTINUE)),
            Sum::Right(value) => self.reducer.reduce(state, value),
        }
    }
}

impl<X, Y, A, B, T> TransducerAsync<Sum<X, A>, Y> for LeftChannel<T, B>
where
    X: Send + 'static,
    Y: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    T: SumTransducerAsync<X, Y, A, B>,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: Sum<X, A>,
        reducer: &'a mut dyn AsyncReduce<Y>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(async move {
            let mut keep = KeepLeft {
                reducer,
                _dropped: PhantomData::<fn(B)>,
            };
            self.transducer.transform_async(state, input, &mut keep).await
        })
    }
}

impl<X, Y, A, B, T> Transducer<Sum<X, A>, Y> for LeftChannel<T, B>
where
    X: Send + 'static,
    Y: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    T: SumTransducer<X, Y, A, B>,
{
    fn transform(
        &self,
        state: &TState,
        input: Sum<X, A>,
        reducer: &mut Reducer<'_, Y>,
    ) -> TResult<()> {
        transform_left(&self.transducer, state, input, reducer)
    }
}

impl<X, Y, A, B, T> TransducerAsync<Sum<X, A>, B> for RightChannel<T, Y>
where
    X: Send + 'static,
    Y: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    T: SumTransducerAsync<X, Y, A, B>,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: Sum<X, A>,
        reducer: &'a mut dyn AsyncReduce<B>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(async move {
            let mut keep = KeepRight {
                reducer,
                _dropped: PhantomData::<fn(Y)>,
            };
            self.transducer.transform_async(state, input, &mut keep).await
        })
    }
}

impl<X, Y, A, B, T> Transducer<Sum<X, A>, B> for RightChannel<T, Y>
where
    X: Send + 'static,
    Y: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    T: SumTransducer<X, Y, A, B>,
{
    fn transform(
        &self,
        state: &TState,
        input: Sum<X, A>,
        reducer: &mut Reducer<'_, B>,
    ) -> TResult<()> {
        transform_right(&self.transducer, state, input, reducer)
    }
}

/// Keeps only the `Left` outputs of a sum transducer.
pub const fn left_channel<T, B>(transducer: T) -> LeftChannel<T, B> {
    LeftChannel {
        transducer,
        _dropped: PhantomData,
    }
}

/// Keeps only the `Right` outputs of a sum transducer.
pub const fn right_channel<T, Y>(transducer: T) -> RightChannel<T, Y> {
    RightChannel {
        transducer,
        _dropped: PhantomData,
    }
}

// =============================================================================
// Leaves
// =============================================================================

/// Maps each channel with its own function.
#[derive(Clone)]
pub struct BiMap<L, R> {
    left: L,
    right: R,
}

impl<X, Y, A, B, L, R> TransducerAsync<Sum<X, A>, Sum<Y, B>> for BiMap<L, R>
where
    X: Send + 'static,
    Y: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    L: Fn(X) -> Y + Send + Sync,
    R: Fn(A) -> B + Send + Sync,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: Sum<X, A>,
        reducer: &'a mut dyn AsyncReduce<Sum<Y, B>>,
    ) -> BoxFuture<'a, TResult<()>> {
        reducer.reduce(state, input.bimap(&self.left, &self.right))
    }
}

impl<X, Y, A, B, L, R> Transducer<Sum<X, A>, Sum<Y, B>> for BiMap<L, R>
where
    X: Send + 'static,
    Y: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    L: Fn(X) -> Y + Send + Sync,
    R: Fn(A) -> B + Send + Sync,
{
    fn transform(
        &self,
        state: &TState,
        input: Sum<X, A>,
        reducer: &mut Reducer<'_, Sum<Y, B>>,
    ) -> TResult<()> {
        reducer(state, input.bimap(&self.left, &self.right))
    }
}

/// Maps both channels.
///
/// # Examples
///
/// ```rust
/// use reductive::bifunctor::bimap;
/// use reductive::control::Sum;
/// use reductive::transducer::invoke1;
///
/// let both = bimap(|e: &str| e.len(), |x: i32| x + 1);
/// assert_eq!(invoke1(&both, Sum::Left("four")), Ok(Sum::Left(4)));
/// assert_eq!(invoke1(&both, Sum::Right(1)), Ok(Sum::<usize, i32>::Right(2)));
/// ```
pub const fn bimap<L, R>(left: L, right: R) -> BiMap<L, R> {
    BiMap { left, right }
}

/// Maps the left channel only.
pub fn map_left<L, A>(left: L) -> BiMap<L, fn(A) -> A> {
    bimap(left, std::convert::identity as fn(A) -> A)
}

/// Maps the right channel only.
pub fn map_right<R, X>(right: R) -> BiMap<fn(X) -> X, R> {
    bimap(std::convert::identity as fn(X) -> X, right)
}

/// Runs a plain transducer on the right channel, passing `Left` through.
pub struct OnRight<T, X> {
    transducer: T,
    _left: PhantomData<fn(X) -> X>,
}

struct WrapRight<'t, X, B> {
    reducer: &'t mut dyn AsyncReduce<Sum<X, B>>,
}

impl<X, B> AsyncReduce<B> for WrapRight<'_, X, B> {
    fn reduce<'a>(&'a mut self, state: &'a TState, value: B) -> BoxFuture<'a, TResult<()>> {
        self.reducer.reduce(state, Sum::Right(value))
    }
}

impl<X, A, B, T> TransducerAsync<Sum<X, A>, Sum<X, B>> for OnRight<T, X>
where
    X: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    T: TransducerAsync<A, B>,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: Sum<X, A>,
        reducer: &'a mut dyn AsyncReduce<Sum<X, B>>,
    ) -> BoxFuture<'a, TResult<()>> {
        match input {
            Sum::Left(alternative) => reducer.reduce(state, Sum::Left(alternative)),
            Sum::Right(value) => Box::pin(async move {
                let mut wrap = WrapRight { reducer };
                self.transducer.transform_async(state, value, &mut wrap).await
            }),
        }
    }
}

impl<X, A, B, T> Transducer<Sum<X, A>, Sum<X, B>> for OnRight<T, X>
where
    X: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    T: Transducer<A, B>,
{
    fn transform(
        &self,
        state: &TState,
        input: Sum<X, A>,
        reducer: &mut Reducer<'_, Sum<X, B>>,
    ) -> TResult<()> {
        match input {
            Sum::Left(alternative) => reducer(state, Sum::Left(alternative)),
            Sum::Right(value) => self
                .transducer
                .transform(state, value, &mut |state: &TState, value: B| {
                    reducer(state, Sum::Right(value))
                }),
        }
    }
}

/// Lifts a plain transducer into the right channel of a sum.
pub const fn on_right<T, X>(transducer: T) -> OnRight<T, X> {
    OnRight {
        transducer,
        _left: PhantomData,
    }
}

/// Exchanges the two channels.
pub struct Swap<X, A> {
    _channels: PhantomData<fn(Sum<X, A>)>,
}

impl<X, A> TransducerAsync<Sum<X, A>, Sum<A, X>> for Swap<X, A>
where
    X: Send + 'static,
    A: Send + 'static,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: Sum<X, A>,
        reducer: &'a mut dyn AsyncReduce<Sum<A, X>>,
    ) -> BoxFuture<'a, TResult<()>> {
        reducer.reduce(state, input.swap())
    }
}

impl<X, A> Transducer<Sum<X, A>, Sum<A, X>> for Swap<X, A>
where
    X: Send + 'static,
    A: Send + 'static,
{
    fn transform(
        &self,
        state: &TState,
        input: Sum<X, A>,
        reducer: &mut Reducer<'_, Sum<A, X>>,
    ) -> TResult<()> {
        reducer(state, input.swap())
    }
}

/// Creates the channel-swapping transducer.
#[must_use]
pub const fn swap<X, A>() -> Swap<X, A> {
    Swap {
        _channels: PhantomData,
    }
}

/// Collapses a sum whose channels share a type.
pub struct Merge<A> {
    _value: PhantomData<fn(A) -> A>,
}

impl<A> TransducerAsync<Sum<A, A>, A> for Merge<A>
where
    A: Send + 'static,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: Sum<A, A>,
        reducer: &'a mut dyn AsyncReduce<A>,
    ) -> BoxFuture<'a, TResult<()>> {
        reducer.reduce(state, input.merge())
    }
}

impl<A> Transducer<Sum<A, A>, A> for Merge<A>
where
    A: Send + 'static,
{
    fn transform(&self, state: &TState, input: Sum<A, A>, reducer: &mut Reducer<'_, A>) -> TResult<()> {
        reducer(state, input.merge())
    }
}

/// Creates the merge adapter `Sum<A, A> -> A`.
#[must_use]
pub const fn merge<A>() -> Merge<A> {
    Merge {
        _value: PhantomData,
    }
}

// =============================================================================
// Bind
// =============================================================================

/// Short-circuiting dependent composition over the right channel.
///
/// A `Left` from the first stage is passed on unchanged and the
/// continuation is never called.
pub struct SumBind<T, F, A> {
    transducer: T,
    next: F,
    _value: PhantomData<fn(A)>,
}

struct SumBindReduce<'t, F, I, O> {
    next: &'t F,
    input: I,
    reducer: &'t mut dyn AsyncReduce<O>,
}

impl<X, E, A, B, F, U> AsyncReduce<Sum<X, A>> for SumBindReduce<'_, F, Sum<X, E>, Sum<X, B>>
where
    X: Clone + Send + 'static,
    E: Clone + Send + 'static,
    B: Send + 'static,
    F: Fn(A) -> U + Send + Sync,
    U: TransducerAsync<Sum<X, E>, Sum<X, B>> + 'static,
{
    fn reduce<'a>(&'a mut self, state: &'a TState, value: Sum<X, A>) -> BoxFuture<'a, TResult<()>> {
        match value {
            Sum::Left(alternative) => self.reducer.reduce(state, Sum::Left(alternative)),
            Sum::Right(value) => {
                if let Err(outcome) = state.check() {
                    return Box::pin(future::ready(outcome));
                }
                let next = (self.next)(value);
                let input = self.input.clone();
                let reducer = &mut *self.reducer;
                Box::pin(async move { next.transform_async(state, input, reducer).await })
            }
        }
    }
}

impl<X, E, A, B, T, F, U> TransducerAsync<Sum<X, E>, Sum<X, B>> for SumBind<T, F, A>
where
    X: Clone + Send + 'static,
    E: Clone + Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    T: TransducerAsync<Sum<X, E>, Sum<X, A>>,
    F: Fn(A) -> U + Send + Sync,
    U: TransducerAsync<Sum<X, E>, Sum<X, B>> + 'static,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: Sum<X, E>,
        reducer: &'a mut dyn AsyncReduce<Sum<X, B>>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(async move {
            let mut bind = SumBindReduce {
                next: &self.next,
                input: input.clone(),
                reducer,
            };
            self.transducer.transform_async(state, input, &mut bind).await
        })
    }
}

impl<X, E, A, B, T, F, U> Transducer<Sum<X, E>, Sum<X, B>> for SumBind<T, F, A>
where
    X: Clone + Send + 'static,
    E: Clone + Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    T: Transducer<Sum<X, E>, Sum<X, A>>,
    F: Fn(A) -> U + Send + Sync,
    U: Transducer<Sum<X, E>, Sum<X, B>> + 'static,
{
    fn transform(
        &self,
        state: &TState,
        input: Sum<X, E>,
        reducer: &mut Reducer<'_, Sum<X, B>>,
    ) -> TResult<()> {
        let again = input.clone();
        self.transducer
            .transform(state, input, &mut |state: &TState, output: Sum<X, A>| match output {
                Sum::Left(alternative) => reducer(state, Sum::Left(alternative)),
                Sum::Right(value) => {
                    if let Err(outcome) = state.check() {
                        return outcome;
                    }
                    (self.next)(value).transform(state, again.clone(), reducer)
                }
            })
    }
}

/// Binds the right channel of `transducer` to `next`.
pub const fn sum_bind<T, F, A>(transducer: T, next: F) -> SumBind<T, F, A> {
    SumBind {
        transducer,
        next,
        _value: PhantomData,
    }
}

// =============================================================================
// Apply
// =============================================================================

/// Runs two sum transducers on the same input and combines their `Right`
/// values.
///
/// Left-biased: a `Left` from the first stage is passed on and the second
/// stage never runs; otherwise a `Left` from the second stage is passed on.
pub struct SumApply<T1, T2, F, A, B> {
    first: T1,
    second: T2,
    combine: F,
    _values: PhantomData<fn(A, B)>,
}

struct SumApplyFirst<'t, T2, F, I, B, O> {
    second: &'t T2,
    combine: &'t F,
    input: I,
    reducer: &'t mut dyn AsyncReduce<O>,
    _right: PhantomData<fn(B)>,
}

struct SumApplySecond<'t, F, A, O> {
    combine: &'t F,
    left: A,
    reducer: &'t mut dyn AsyncReduce<O>,
}

impl<X, A, B, C, F> AsyncReduce<Sum<X, B>> for SumApplySecond<'_, F, A, Sum<X, C>>
where
    X: Send,
    A: Clone + Send,
    F: Fn(A, B) -> C + Send + Sync,
{
    fn reduce<'a>(&'a mut self, state: &'a TState, value: Sum<X, B>) -> BoxFuture<'a, TResult<()>> {
        let combined = value.map_right(|right| (self.combine)(self.left.clone(), right));
        self.reducer.reduce(state, combined)
    }
}

impl<X, E, A, B, C, T2, F> AsyncReduce<Sum<X, A>> for SumApplyFirst<'_, T2, F, Sum<X, E>, B, Sum<X, C>>
where
    X: Clone + Send + 'static,
    E: Clone + Send + 'static,
    A: Clone + Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    T2: TransducerAsync<Sum<X, E>, Sum<X, B>>,
    F: Fn(A, B) -> C + Send + Sync,
{
    fn reduce<'a>(&'a mut self, state: &'a TState, value: Sum<X, A>) -> BoxFuture<'a, TResult<()>> {
        match value {
            Sum::Left(alternative) => self.reducer.reduce(state, Sum::Left(alternative)),
            Sum::Right(left) => {
                let transducer = self.second;
                let input = self.input.clone();
                let mut second = SumApplySecond {
                    combine: self.combine,
                    left,
                    reducer: &mut *self.reducer,
                };
                Box::pin(async move { transducer.transform_async(state, input, &mut second).await })
            }
        }
    }
}

impl<X, E, A, B, C, T1, T2, F> TransducerAsync<Sum<X, E>, Sum<X, C>> for SumApply<T1, T2, F, A, B>
where
    X: Clone + Send + 'static,
    E: Clone + Send + 'static,
    A: Clone + Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    T1: TransducerAsync<Sum<X, E>, Sum<X, A>>,
    T2: TransducerAsync<Sum<X, E>, Sum<X, B>>,
    F: Fn(A, B) -> C + Send + Sync,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: Sum<X, E>,
        reducer: &'a mut dyn AsyncReduce<Sum<X, C>>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(async move {
            let mut first = SumApplyFirst {
                second: &self.second,
                combine: &self.combine,
                input: input.clone(),
                reducer,
                _right: PhantomData::<fn(B)>,
            };
            self.first.transform_async(state, input, &mut first).await
        })
    }
}

impl<X, E, A, B, C, T1, T2, F> Transducer<Sum<X, E>, Sum<X, C>> for SumApply<T1, T2, F, A, B>
where
    X: Clone + Send + 'static,
    E: Clone + Send + 'static,
    A: Clone + Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    T1: Transducer<Sum<X, E>, Sum<X, A>>,
    T2: Transducer<Sum<X, E>, Sum<X, B>>,
    F: Fn(A, B) -> C + Send + Sync,
{
    fn transform(
        &self,
        state: &TState,
        input: Sum<X, E>,
        reducer: &mut Reducer<'_, Sum<X, C>>,
    ) -> TResult<()> {
        let again = input.clone();
        self.first
            .transform(state, input, &mut |state: &TState, first: Sum<X, A>| match first {
                Sum::Left(alternative) => reducer(state, Sum::Left(alternative)),
                Sum::Right(left) => self.second.transform(
                    state,
                    again.clone(),
                    &mut |state: &TState, second: Sum<X, B>| {
                        reducer(
                            state,
                            second.map_right(|right| (self.combine)(left.clone(), right)),
                        )
                    },
                ),
            })
    }
}

/// Combines the `Right` values of two sum transducers, left-biased.
pub const fn sum_apply<T1, T2, F, A, B>(
    first: T1,
    second: T2,
    combine: F,
) -> SumApply<T1, T2, F, A, B> {
    SumApply {
        first,
        second,
        combine,
        _values: PhantomData,
    }
}
