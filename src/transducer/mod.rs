//! Transducer protocol.
//!
//! A transducer is an inert, reusable description of a reduction-step
//! transformation: given a reducer over `B` it drives a reduction over `A`.
//! Nothing runs until an input and a terminal reducer are supplied through
//! one of the invoke entry points ([`invoke1`], [`invoke_many`], [`reduce`]
//! and their `_async` forms).
//!
//! # Sync and async
//!
//! [`TransducerAsync`] is the general protocol: every step returns a
//! [`BoxFuture`]. [`Transducer`] is the synchronous specialisation and has
//! `TransducerAsync` as a supertrait, so every synchronous node can also be
//! driven asynchronously. Async-only leaves (see [`map_async`]) implement
//! only `TransducerAsync`; there is no way back from async to sync.
//!
//! # Outcomes
//!
//! Reducers return [`TResult<()>`]: the running state lives in the terminal
//! reducer, and [`reduce`] exposes the `(state, S, B) -> TResult<S>` form.
//! Every combinator inspects the outcome of the stage it wraps; only
//! `Continue` lets further work happen.
//!
//! # Examples
//!
//! ```rust
//! use reductive::transducer::{self, TransducerExt, invoke1, invoke_many};
//!
//! let pipeline = transducer::map(|x: i32| x + 1)
//!     .then(transducer::filter(|x: &i32| x % 2 == 0))
//!     .map(|x: i32| x * 10);
//!
//! assert_eq!(invoke1(&pipeline, 1), Ok(20));
//!
//! let each = transducer::each::<Vec<i32>>().map(|x: i32| x * 2);
//! assert_eq!(invoke_many(&each, vec![1, 2, 3]), Ok(vec![2, 4, 6]));
//! ```

mod compose;
mod invoke;
mod primitive;
mod resource;
mod result;
mod state;

use std::sync::Arc;

use futures::future::BoxFuture;

pub use compose::{Action, Apply, Bind, Compose, Flatten, action, apply, bind, compose, flatten};
pub use invoke::{
    invoke_many, invoke_many_async, invoke_many_with, invoke_many_with_async, invoke1,
    invoke1_async, invoke1_with, invoke1_with_async, reduce,
};
pub use primitive::{
    Cancel, Constant, Each, Filter, FilterMap, Identity, Map, MapAsync, Raise, cancel, constant,
    each, fail, filter, filter_map, identity, map, map_async,
};
pub use resource::{Scope, Use, scope, use_resource};
pub use result::TResult;
pub use state::{CancelToken, ResourceId, ResourceMark, TState};

pub(crate) use invoke::{collect_all, collect_all_async, step_once, step_once_async};

/// A synchronous reducer: consumes a value and reports how to proceed.
pub type Reducer<'r, B> = dyn FnMut(&TState, B) -> TResult<()> + 'r;

/// An asynchronous reducer.
///
/// Implemented by the adapter structs the async nodes thread through a
/// reduction; a closure cannot lend its captured state to the future it
/// returns, so this is a trait rather than a function type.
pub trait AsyncReduce<B>: Send {
    /// Consumes one value.
    fn reduce<'a>(&'a mut self, state: &'a TState, value: B) -> BoxFuture<'a, TResult<()>>;
}

/// The asynchronous transducer protocol.
pub trait TransducerAsync<A, B>: Send + Sync {
    /// Drives `reducer` with the values this transducer produces from `input`.
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: A,
        reducer: &'a mut dyn AsyncReduce<B>,
    ) -> BoxFuture<'a, TResult<()>>;
}

/// The synchronous transducer protocol.
///
/// Implementors run on the calling thread and block on schedule waits.
pub trait Transducer<A, B>: TransducerAsync<A, B> {
    /// Drives `reducer` with the values this transducer produces from `input`.
    fn transform(&self, state: &TState, input: A, reducer: &mut Reducer<'_, B>) -> TResult<()>;
}

impl<A, B, T> TransducerAsync<A, B> for Arc<T>
where
    T: TransducerAsync<A, B> + ?Sized,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: A,
        reducer: &'a mut dyn AsyncReduce<B>,
    ) -> BoxFuture<'a, TResult<()>> {
        (**self).transform_async(state, input, reducer)
    }
}

impl<A, B, T> Transducer<A, B> for Arc<T>
where
    T: Transducer<A, B> + ?Sized,
{
    fn transform(&self, state: &TState, input: A, reducer: &mut Reducer<'_, B>) -> TResult<()> {
        (**self).transform(state, input, reducer)
    }
}

/// Combinator methods available on every transducer.
///
/// The returned nodes are synchronous when all their parts are, and
/// asynchronous otherwise.
pub trait TransducerExt<A, B>: TransducerAsync<A, B> + Sized {
    /// Sequential composition: feeds every output of `self` into `next`.
    fn then<T>(self, next: T) -> Compose<Self, T, B> {
        Compose::new(self, next)
    }

    /// Maps every output value.
    fn map<C, F>(self, function: F) -> Compose<Self, Map<F>, B>
    where
        F: Fn(B) -> C + Send + Sync,
    {
        Compose::new(self, Map::new(function))
    }

    /// Keeps the output values satisfying `predicate`.
    fn filter<F>(self, predicate: F) -> Compose<Self, Filter<F>, B>
    where
        F: Fn(&B) -> bool + Send + Sync,
    {
        Compose::new(self, Filter::new(predicate))
    }

    /// Dependent composition: the next stage is chosen by each output and
    /// runs on the same input.
    fn bind<F, U>(self, next: F) -> Bind<Self, F, B>
    where
        F: Fn(B) -> U + Send + Sync,
    {
        Bind::new(self, next)
    }

    /// Runs `self` and `other` on the same input and combines their outputs.
    fn apply<C, D, T, F>(self, other: T, combine: F) -> Apply<Self, T, F, B, C>
    where
        T: TransducerAsync<A, C>,
        F: Fn(B, C) -> D + Send + Sync,
    {
        Apply::new(self, other, combine)
    }

    /// Runs `next` on the same input after each output, discarding the
    /// outputs of `self`.
    fn action<T>(self, next: T) -> Action<Self, T, B> {
        Action::new(self, next)
    }

    /// Releases resources registered inside `self` as soon as it finishes.
    fn scoped(self) -> Scope<Self> {
        Scope::new(self)
    }

    /// Erases the node type behind a shared pointer.
    fn boxed(self) -> Arc<dyn Transducer<A, B>>
    where
        Self: Transducer<A, B> + 'static,
    {
        Arc::new(self)
    }

    /// Erases the node type behind a shared pointer, keeping only the async
    /// protocol.
    fn boxed_async(self) -> Arc<dyn TransducerAsync<A, B>>
    where
        Self: 'static,
    {
        Arc::new(self)
    }
}

impl<A, B, T> TransducerExt<A, B> for T where T: TransducerAsync<A, B> {}
