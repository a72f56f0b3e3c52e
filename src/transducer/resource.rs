//! Resource tracking nodes.
//!
//! [`Use`] registers each value it passes on with the run's [`TState`], and
//! [`Scope`] releases whatever was registered while its inner transducer ran.
//! Anything still registered when the top-level run ends is released when
//! its `TState` is dropped.

use std::sync::Arc;

use futures::future::BoxFuture;

use super::{
    AsyncReduce, Reducer, TResult, TState, Transducer, TransducerAsync, collect_all,
    collect_all_async,
};

/// Registers every value with a release function, then passes it on.
pub struct Use<F> {
    release: Arc<F>,
}

impl<F> Use<F> {
    /// Tracks values with `release`.
    pub fn new(release: F) -> Self {
        Self {
            release: Arc::new(release),
        }
    }

    fn track<A>(&self, state: &TState, value: &A)
    where
        A: Clone + Send + 'static,
        F: Fn(A) + Send + Sync + 'static,
    {
        let release = Arc::clone(&self.release);
        let resource = value.clone();
        state.register(move || release(resource));
    }
}

impl<F> Clone for Use<F> {
    fn clone(&self) -> Self {
        Self {
            release: Arc::clone(&self.release),
        }
    }
}

impl<A, F> TransducerAsync<A, A> for Use<F>
where
    A: Clone + Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: A,
        reducer: &'a mut dyn AsyncReduce<A>,
    ) -> BoxFuture<'a, TResult<()>> {
        self.track(state, &input);
        reducer.reduce(state, input)
    }
}

impl<A, F> Transducer<A, A> for Use<F>
where
    A: Clone + Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    fn transform(&self, state: &TState, input: A, reducer: &mut Reducer<'_, A>) -> TResult<()> {
        self.track(state, &input);
        reducer(state, input)
    }
}

/// Registers each value with `release`, to be called once the enclosing
/// scope (or the whole run) ends.
pub fn use_resource<F>(release: F) -> Use<F> {
    Use::new(release)
}

/// Releases the resources registered by its inner transducer as soon as
/// that transducer has finished.
///
/// Release happens on every exit, including failure, cancellation and
/// unwinding out of a panic. Every value the inner transducer produced is
/// passed downstream after the release, in order, so a consumer never sees
/// a live resource from a closed scope.
#[derive(Clone)]
pub struct Scope<T> {
    transducer: T,
}

impl<T> Scope<T> {
    /// Scopes `transducer`.
    pub const fn new(transducer: T) -> Self {
        Self { transducer }
    }
}

impl<A, B, T> TransducerAsync<A, B> for Scope<T>
where
    A: Send + 'static,
    B: Send + 'static,
    T: TransducerAsync<A, B>,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: A,
        reducer: &'a mut dyn AsyncReduce<B>,
    ) -> BoxFuture<'a, TResult<()>> {
        Box::pin(async move {
            let outcome = {
                let _scope = state.scope();
                collect_all_async(&self.transducer, state, input).await
            };
            match outcome {
                TResult::Continue(values) | TResult::Complete(values) => {
                    for value in values {
                        match reducer.reduce(state, value).await {
                            TResult::Continue(()) => {}
                            other => return other,
                        }
                    }
                    TResult::CONTINUE
                }
                TResult::Cancelled => TResult::Cancelled,
                TResult::None => TResult::None,
                TResult::Fail(error) => TResult::Fail(error),
            }
        })
    }
}

impl<A, B, T> Transducer<A, B> for Scope<T>
where
    A: Send + 'static,
    B: Send + 'static,
    T: Transducer<A, B>,
{
    fn transform(&self, state: &TState, input: A, reducer: &mut Reducer<'_, B>) -> TResult<()> {
        let outcome = {
            let _scope = state.scope();
            collect_all(&self.transducer, state, input)
        };
        outcome.propagate(|values| {
            for value in values {
                match reducer(state, value) {
                    TResult::Continue(()) => {}
                    other => return other,
                }
            }
            TResult::CONTINUE
        })
    }
}

/// Scopes `transducer`, releasing its resources when it finishes.
pub const fn scope<T>(transducer: T) -> Scope<T> {
    Scope::new(transducer)
}
