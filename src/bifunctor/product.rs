//! Transducers over `(context, value)` pairs.
//!
//! A product transducer maps `(X, A)` to `(Y, B)`. The usual shape keeps
//! the context unchanged: [`Second`] runs a plain transducer on the value
//! and re-attaches the context to every output, and [`ProductBind`] chains
//! value computations while the context rides along.

use std::marker::PhantomData;

use futures::future::BoxFuture;

use crate::transducer::{
    AsyncReduce, Map, Reducer, TResult, TState, Transducer, TransducerAsync,
};

/// A synchronous transducer from `(X, A)` to `(Y, B)`.
pub trait ProductTransducer<X, Y, A, B>: Transducer<(X, A), (Y, B)> {}

impl<X, Y, A, B, T> ProductTransducer<X, Y, A, B> for T where
    T: Transducer<(X, A), (Y, B)> + ?Sized
{
}

/// An asynchronous transducer from `(X, A)` to `(Y, B)`.
pub trait ProductTransducerAsync<X, Y, A, B>: TransducerAsync<(X, A), (Y, B)> {}

impl<X, Y, A, B, T> ProductTransducerAsync<X, Y, A, B> for T where
    T: TransducerAsync<(X, A), (Y, B)> + ?Sized
{
}

// =============================================================================
// Pairing adapters
// =============================================================================

/// Pairs each value with a fixed right-hand element.
struct WithRight<'t, K, Y> {
    keep: K,
    reducer: &'t mut dyn AsyncReduce<(Y, K)>,
}

impl<K: Clone + Send, Y> AsyncReduce<Y> for WithRight<'_, K, Y> {
    fn reduce<'a>(&'a mut self, state: &'a TState, value: Y) -> BoxFuture<'a, TResult<()>> {
        self.reducer.reduce(state, (value, self.keep.clone()))
    }
}

/// Pairs each value with a fixed left-hand element.
struct WithLeft<'t, K, B> {
    keep: K,
    reducer: &'t mut dyn AsyncReduce<(K, B)>,
}

impl<K: Clone + Send, B> AsyncReduce<B> for WithLeft<'_, K, B> {
    fn reduce<'a>(&'a mut self, state: &'a TState, value: B) -> BoxFuture<'a, TResult<()>> {
        self.reducer.reduce(state, (self.keep.clone(), value))
    }
}

// =============================================================================
// First / Second / Both
// =============================================================================

/// Runs a transducer on the context, keeping the value.
pub struct First<T, A> {
    transducer: T,
    _value: PhantomData<fn(A) -> A>,
}

impl<X, Y, A, T> TransducerAsync<(X, A), (Y, A)> for First<T, A>
where
    X: Send + 'static,
    Y: Send + 'static,
    A: Clone + Send + 'static,
    T: TransducerAsync<X, Y>,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        (context, value): (X, A),
        reducer: &'a mut dyn AsyncReduce<(Y, A)>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(async move {
            let mut pair = WithRight {
                keep: value,
                reducer,
            };
            self.transducer.transform_async(state, context, &mut pair).await
        })
    }
}

impl<X, Y, A, T> Transducer<(X, A), (Y, A)> for First<T, A>
where
    X: Send + 'static,
    Y: Send + 'static,
    A: Clone + Send + 'static,
    T: Transducer<X, Y>,
{
    fn transform(
        &self,
        state: &TState,
        (context, value): (X, A),
        reducer: &mut Reducer<'_, (Y, A)>,
    ) -> TResult<()> {
        self.transducer
            .transform(state, context, &mut |state: &TState, context: Y| {
                reducer(state, (context, value.clone()))
            })
    }
}

/// Transforms the context channel.
pub const fn first<T, A>(transducer: T) -> First<T, A> {
    First {
        transducer,
        _value: PhantomData,
    }
}

/// Runs a transducer on the value, threading the context unchanged.
pub struct Second<T, X> {
    transducer: T,
    _context: PhantomData<fn(X) -> X>,
}

impl<X, A, B, T> TransducerAsync<(X, A), (X, B)> for Second<T, X>
where
    X: Clone + Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    T: TransducerAsync<A, B>,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        (context, value): (X, A),
        reducer: &'a mut dyn AsyncReduce<(X, B)>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(async move {
            let mut pair = WithLeft {
                keep: context,
                reducer,
            };
            self.transducer.transform_async(state, value, &mut pair).await
        })
    }
}

impl<X, A, B, T> Transducer<(X, A), (X, B)> for Second<T, X>
where
    X: Clone + Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    T: Transducer<A, B>,
{
    fn transform(
        &self,
        state: &TState,
        (context, value): (X, A),
        reducer: &mut Reducer<'_, (X, B)>,
    ) -> TResult<()> {
        self.transducer
            .transform(state, value, &mut |state: &TState, value: B| {
                reducer(state, (context.clone(), value))
            })
    }
}

/// Transforms the value channel.
///
/// # Examples
///
/// ```rust
/// use reductive::bifunctor::second;
/// use reductive::transducer::{self, invoke1};
///
/// let doubled = second::<_, &str>(transducer::map(|x: i32| x * 2));
/// assert_eq!(invoke1(&doubled, ("config", 21)), Ok(("config", 42)));
/// ```
pub const fn second<T, X>(transducer: T) -> Second<T, X> {
    Second {
        transducer,
        _context: PhantomData,
    }
}

/// Transforms both channels independently.
///
/// The context transducer runs first; for each of its outputs the value
/// transducer runs on the value.
pub struct Both<TX, TA> {
    context: TX,
    value: TA,
}

struct BothReduce<'t, T, A, Y, B> {
    value: &'t T,
    input: A,
    reducer: &'t mut dyn AsyncReduce<(Y, B)>,
}

impl<A, Y, B, T> AsyncReduce<Y> for BothReduce<'_, T, A, Y, B>
where
    A: Clone + Send + 'static,
    Y: Clone + Send + 'static,
    B: Send + 'static,
    T: TransducerAsync<A, B>,
{
    fn reduce<'a>(&'a mut self, state: &'a TState, context: Y) -> BoxFuture<'a, TResult<()>> {
        let transducer = self.value;
        let input = self.input.clone();
        let mut pair = WithLeft {
            keep: context,
            reducer: &mut *self.reducer,
        };
        Box::pin(async move { transducer.transform_async(state, input, &mut pair).await })
    }
}

impl<X, Y, A, B, TX, TA> TransducerAsync<(X, A), (Y, B)> for Both<TX, TA>
where
    X: Send + 'static,
    Y: Clone + Send + 'static,
    A: Clone + Send + 'static,
    B: Send + 'static,
    TX: TransducerAsync<X, Y>,
    TA: TransducerAsync<A, B>,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        (context, value): (X, A),
        reducer: &'a mut dyn AsyncReduce<(Y, B)>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(async move {
            let mut both = BothReduce {
                value: &self.value,
                input: value,
                reducer,
            };
            self.context.transform_async(state, context, &mut both).await
        })
    }
}

impl<X, Y, A, B, TX, TA> Transducer<(X, A), (Y, B)> for Both<TX, TA>
where
    X: Send + 'static,
    Y: Clone + Send + 'static,
    A: Clone + Send + 'static,
    B: Send + 'static,
    TX: Transducer<X, Y>,
    TA: Transducer<A, B>,
{
    fn transform(
        &self,
        state: &TState,
        (context, value): (X, A),
        reducer: &mut Reducer<'_, (Y, B)>,
    ) -> TResult<()> {
        self.context
            .transform(state, context, &mut |state: &TState, context: Y| {
                self.value
                    .transform(state, value.clone(), &mut |state: &TState, value: B| {
                        reducer(state, (context.clone(), value))
                    })
            })
    }
}

/// Transforms the context with `context` and the value with `value`.
pub const fn both<TX, TA>(context: TX, value: TA) -> Both<TX, TA> {
    Both { context, value }
}

/// Maps the context with `context` and the value with `value`.
///
/// # Examples
///
/// ```rust
/// use reductive::bifunctor::product_bimap;
/// use reductive::transducer::invoke1;
///
/// let pair = product_bimap(|locale: &str| locale.len(), |x: i32| x + 1);
/// assert_eq!(invoke1(&pair, ("en-GB", 1)), Ok((5, 2)));
/// ```
pub const fn product_bimap<F, G>(context: F, value: G) -> Both<Map<F>, Map<G>> {
    both(Map::new(context), Map::new(value))
}

// =============================================================================
// Context-aware leaves
// =============================================================================

/// Computes the value from the value and a borrowed context.
#[derive(Clone)]
pub struct WithContext<F> {
    function: F,
}

impl<X, A, B, F> TransducerAsync<(X, A), (X, B)> for WithContext<F>
where
    X: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    F: Fn(&X, A) -> B + Send + Sync,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        (context, value): (X, A),
        reducer: &'a mut dyn AsyncReduce<(X, B)>,
    ) -> BoxFuture<'a, TResult<()>> {
        let value = (self.function)(&context, value);
        reducer.reduce(state, (context, value))
    }
}

impl<X, A, B, F> Transducer<(X, A), (X, B)> for WithContext<F>
where
    X: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    F: Fn(&X, A) -> B + Send + Sync,
{
    fn transform(
        &self,
        state: &TState,
        (context, value): (X, A),
        reducer: &mut Reducer<'_, (X, B)>,
    ) -> TResult<()> {
        let value = (self.function)(&context, value);
        reducer(state, (context, value))
    }
}

/// Maps the value with access to the context.
pub const fn with_context<F>(function: F) -> WithContext<F> {
    WithContext { function }
}

/// Replaces the value with a copy of the context.
pub struct Context<X, A> {
    _channels: PhantomData<fn(X, A) -> X>,
}

impl<X, A> TransducerAsync<(X, A), (X, X)> for Context<X, A>
where
    X: Clone + Send + 'static,
    A: Send + 'static,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        (context, _): (X, A),
        reducer: &'a mut dyn AsyncReduce<(X, X)>,
    ) -> BoxFuture<'a, TResult<()>> {
        reducer.reduce(state, (context.clone(), context))
    }
}

impl<X, A> Transducer<(X, A), (X, X)> for Context<X, A>
where
    X: Clone + Send + 'static,
    A: Send + 'static,
{
    fn transform(
        &self,
        state: &TState,
        (context, _): (X, A),
        reducer: &mut Reducer<'_, (X, X)>,
    ) -> TResult<()> {
        reducer(state, (context.clone(), context))
    }
}

/// Projects the context into the value channel.
#[must_use]
pub const fn context<X, A>() -> Context<X, A> {
    Context {
        _channels: PhantomData,
    }
}

// =============================================================================
// Bind
// =============================================================================

/// Dependent composition with the context threaded through.
///
/// For each `(x, b)` produced by the first stage, `next(&b)` picks the
/// product transducer that then runs on `(x, b)`.
pub struct ProductBind<T, F, B> {
    transducer: T,
    next: F,
    _value: PhantomData<fn(B)>,
}

struct ProductBindReduce<'t, F, O> {
    next: &'t F,
    reducer: &'t mut dyn AsyncReduce<O>,
}

impl<X, B, C, F, U> AsyncReduce<(X, B)> for ProductBindReduce<'_, F, (X, C)>
where
    X: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    F: Fn(&B) -> U + Send + Sync,
    U: TransducerAsync<(X, B), (X, C)> + 'static,
{
    fn reduce<'a>(&'a mut self, state: &'a TState, pair: (X, B)) -> BoxFuture<'a, TResult<()>> {
        let next = (self.next)(&pair.1);
        let reducer = &mut *self.reducer;
        Box::pin(async move {
            if let Err(outcome) = state.check() {
                return outcome;
            }
            next.transform_async(state, pair, reducer).await
        })
    }
}

impl<X, A, B, C, T, F, U> TransducerAsync<(X, A), (X, C)> for ProductBind<T, F, B>
where
    X: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    T: TransducerAsync<(X, A), (X, B)>,
    F: Fn(&B) -> U + Send + Sync,
    U: TransducerAsync<(X, B), (X, C)> + 'static,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: (X, A),
        reducer: &'a mut dyn AsyncReduce<(X, C)>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(async move {
            let mut bind = ProductBindReduce {
                next: &self.next,
                reducer,
            };
            self.transducer.transform_async(state, input, &mut bind).await
        })
    }
}

impl<X, A, B, C, T, F, U> Transducer<(X, A), (X, C)> for ProductBind<T, F, B>
where
    X: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    T: Transducer<(X, A), (X, B)>,
    F: Fn(&B) -> U + Send + Sync,
    U: Transducer<(X, B), (X, C)> + 'static,
{
    fn transform(
        &self,
        state: &TState,
        input: (X, A),
        reducer: &mut Reducer<'_, (X, C)>,
    ) -> TResult<()> {
        self.transducer
            .transform(state, input, &mut |state: &TState, pair: (X, B)| {
                if let Err(outcome) = state.check() {
                    return outcome;
                }
                (self.next)(&pair.1).transform(state, pair, reducer)
            })
    }
}

/// Binds the value channel of `transducer` to `next`.
pub const fn product_bind<T, F, B>(transducer: T, next: F) -> ProductBind<T, F, B> {
    ProductBind {
        transducer,
        next,
        _value: PhantomData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transducer::{self, TransducerExt, invoke_many, invoke1};
    use rstest::rstest;

    #[rstest]
    fn test_first_keeps_value() {
        let upper = first::<_, i32>(transducer::map(|s: &str| s.to_uppercase()));
        assert_eq!(invoke1(&upper, ("ctx", 7)), Ok(("CTX".to_string(), 7)));
    }

    #[rstest]
    fn test_second_threads_context_to_every_output() {
        let spread = second::<_, char>(transducer::each::<Vec<i32>>());
        assert_eq!(
            invoke_many(&spread, ('k', vec![1, 2])),
            Ok(vec![('k', 1), ('k', 2)])
        );
    }

    #[rstest]
    fn test_both_and_context() {
        let pair = both(transducer::map(|x: i32| x + 1), transducer::map(|s: &str| s.len()));
        assert_eq!(invoke1(&pair, (1, "abc")), Ok((2, 3)));
        assert_eq!(invoke1(&context::<i32, &str>(), (5, "x")), Ok((5, 5)));
    }

    #[rstest]
    fn test_bind_reads_context() {
        let scaled = with_context(|factor: &i32, x: i32| x * factor).then(second::<_, i32>(
            transducer::map(|x: i32| x + 1),
        ));
        let chained = product_bind(scaled, |value: &i32| {
            let offset = *value;
            with_context(move |factor: &i32, x: i32| x + offset * factor)
        });
        assert_eq!(invoke1(&chained, (10, 2)), Ok((10, 21 + 21 * 10)));
    }
}
