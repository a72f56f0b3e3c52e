//! The synchronous effect type.

use std::fmt;
use std::sync::Arc;

use futures::future::{self, BoxFuture};

use super::{EffAsync, Error, Fin};
use crate::bifunctor;
use crate::control::Sum;
use crate::schedule::{self, FoldSum, Schedule};
use crate::transducer::{
    self, AsyncReduce, CancelToken, Reducer, TResult, TState, Transducer, TransducerAsync,
    TransducerExt,
};

type Node<Env, A> = Arc<dyn Transducer<Sum<Error, Env>, Sum<Error, A>>>;

enum Inner<Env, A> {
    Ready(Node<Env, A>),
    Bottom,
}

/// A deferred computation that reads an environment `Env` and either
/// succeeds with an `A` or fails with an [`Error`].
///
/// An `Eff` wraps exactly one sum transducer from `Sum<Error, Env>` to
/// `Sum<Error, A>`. Building and combining effects never runs anything;
/// [`run`](Self::run) pushes the environment through the composed tree and
/// converts the outcome into a [`Fin`].
///
/// The default value is the *bottom* effect, which fails with
/// [`Error::Bottom`] when run.
///
/// # Examples
///
/// ```rust
/// use reductive::effect::{Eff, Error};
///
/// let doubled = Eff::<(), i32>::success(5).map(|x| x * 2);
/// assert_eq!(doubled.run(()), Ok(10));
///
/// let failed = Eff::<(), i32>::fail(Error::new("boom")).bind(|x| Eff::success(x + 1));
/// assert_eq!(failed.run(()), Err(Error::new("boom")));
///
/// assert_eq!(Eff::<(), i32>::default().run(()), Err(Error::Bottom));
/// ```
pub struct Eff<Env, A> {
    inner: Inner<Env, A>,
}

static_assertions::assert_impl_all!(Eff<(), ()>: Send, Sync, Clone, Default);

impl<Env, A> Eff<Env, A> {
    /// The effect that fails with [`Error::Bottom`].
    #[must_use]
    pub const fn bottom() -> Self {
        Self {
            inner: Inner::Bottom,
        }
    }

    /// Returns `true` for the bottom effect.
    #[must_use]
    pub const fn is_bottom(&self) -> bool {
        matches!(self.inner, Inner::Bottom)
    }
}

impl<Env, A> Eff<Env, A>
where
    Env: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    // =========================================================================
    // Construction
    // =========================================================================

    /// Wraps a sum transducer.
    pub fn from_transducer<T>(transducer: T) -> Self
    where
        T: Transducer<Sum<Error, Env>, Sum<Error, A>> + 'static,
    {
        Self {
            inner: Inner::Ready(Arc::new(transducer)),
        }
    }

    /// An effect that always succeeds with `value`.
    pub fn success(value: A) -> Self
    where
        A: Clone + Sync,
    {
        Self::from_transducer(transducer::map(move |input: Sum<Error, Env>| {
            input.map_right(|_| value.clone())
        }))
    }

    /// An effect that always fails with `error`.
    pub fn fail(error: Error) -> Self {
        Self::from_transducer(transducer::map(move |input: Sum<Error, Env>| {
            input.and_then(|_| Sum::Left(error.clone()))
        }))
    }

    /// An effect computed from the environment.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use reductive::effect::{Eff, Error};
    ///
    /// let port = Eff::lift(|env: &Vec<(&str, u16)>| {
    ///     env.iter()
    ///         .find(|(key, _)| *key == "port")
    ///         .map(|(_, value)| *value)
    ///         .ok_or_else(|| Error::new("port missing"))
    /// });
    /// assert_eq!(port.run(vec![("port", 8080)]), Ok(8080));
    /// assert!(port.run(vec![]).is_err());
    /// ```
    pub fn lift<F>(function: F) -> Self
    where
        F: Fn(&Env) -> Fin<A> + Send + Sync + 'static,
    {
        Self::from_transducer(transducer::map(move |input: Sum<Error, Env>| {
            input.and_then(|env| Sum::from(function(&env)))
        }))
    }

    /// An effect that projects a value out of the environment.
    pub fn asks<F>(function: F) -> Self
    where
        F: Fn(&Env) -> A + Send + Sync + 'static,
    {
        Self::lift(move |env| Ok(function(env)))
    }

    /// An effect that cancels the run.
    #[must_use]
    pub fn cancel() -> Self {
        Self::from_transducer(transducer::cancel::<Sum<Error, Env>, Sum<Error, A>>())
    }

    // =========================================================================
    // Mapping and chaining
    // =========================================================================

    /// Maps the success value.
    pub fn map<B, F>(self, function: F) -> Eff<Env, B>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        Eff::from_transducer(self.then(bifunctor::map_right(function)))
    }

    /// Maps the failure.
    pub fn map_err<F>(self, function: F) -> Self
    where
        F: Fn(Error) -> Error + Send + Sync + 'static,
    {
        Self::from_transducer(self.then(bifunctor::map_left(function)))
    }

    /// Maps the failure and the success value.
    pub fn bimap<B, F, G>(self, on_error: F, on_success: G) -> Eff<Env, B>
    where
        B: Send + 'static,
        F: Fn(Error) -> Error + Send + Sync + 'static,
        G: Fn(A) -> B + Send + Sync + 'static,
    {
        Eff::from_transducer(self.then(bifunctor::bimap(on_error, on_success)))
    }

    /// Chains a dependent effect. A failure is passed on unchanged and
    /// `next` is never called.
    pub fn bind<B, F>(self, next: F) -> Eff<Env, B>
    where
        B: Send + 'static,
        F: Fn(A) -> Eff<Env, B> + Send + Sync + 'static,
    {
        Eff::from_transducer(bifunctor::sum_bind(self, next))
    }

    /// Alias for [`bind`](Self::bind).
    pub fn and_then<B, F>(self, next: F) -> Eff<Env, B>
    where
        B: Send + 'static,
        F: Fn(A) -> Eff<Env, B> + Send + Sync + 'static,
    {
        self.bind(next)
    }

    /// Runs `next` after `self` succeeds, keeping the result of `next`.
    #[must_use]
    pub fn action<B>(self, next: Eff<Env, B>) -> Eff<Env, B>
    where
        B: Send + 'static,
    {
        self.bind(move |_| next.clone())
    }

    /// Fails with [`Error::NoValue`] when `predicate` rejects the value.
    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Self::from_transducer(self.then(transducer::map(move |output: Sum<Error, A>| {
            output.and_then(|value| {
                if predicate(&value) {
                    Sum::Right(value)
                } else {
                    Sum::Left(Error::NoValue)
                }
            })
        })))
    }

    /// Runs `self` then `other` on the same environment and combines both
    /// values. The first failure wins; `other` never runs after `self`
    /// fails.
    pub fn apply<B, C, F>(self, other: Eff<Env, B>, combine: F) -> Eff<Env, C>
    where
        A: Clone,
        B: Send + 'static,
        C: Send + 'static,
        F: Fn(A, B) -> C + Send + Sync + 'static,
    {
        Eff::from_transducer(bifunctor::sum_apply(self, other, combine))
    }

    /// Pairs the values of `self` and `other`.
    #[must_use]
    pub fn zip<B>(self, other: Eff<Env, B>) -> Eff<Env, (A, B)>
    where
        A: Clone,
        B: Send + 'static,
    {
        self.apply(other, |left, right| (left, right))
    }

    // =========================================================================
    // Schedule-driven loops
    // =========================================================================

    /// Re-runs the effect under `schedule`, folding every success.
    ///
    /// A failure ends the loop and is reported; otherwise the folded state
    /// is reported once the schedule is exhausted.
    pub fn fold<S, F>(self, schedule: Schedule, initial: S, folder: F) -> Eff<Env, S>
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(S, A) -> S + Send + Sync + 'static,
    {
        Eff::from_transducer(FoldSum::new(self, schedule, initial, folder))
    }

    /// Like [`fold`](Self::fold), stopping after the first value that fails
    /// `predicate`. That value is still folded.
    pub fn fold_while<S, F, P>(
        self,
        schedule: Schedule,
        initial: S,
        folder: F,
        predicate: P,
    ) -> Eff<Env, S>
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(S, A) -> S + Send + Sync + 'static,
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Eff::from_transducer(FoldSum::with_predicate(
            self, schedule, initial, folder, predicate, true,
        ))
    }

    /// Like [`fold`](Self::fold), stopping after the first value that
    /// satisfies `predicate`. That value is still folded.
    pub fn fold_until<S, F, P>(
        self,
        schedule: Schedule,
        initial: S,
        folder: F,
        predicate: P,
    ) -> Eff<Env, S>
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(S, A) -> S + Send + Sync + 'static,
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Eff::from_transducer(FoldSum::with_predicate(
            self, schedule, initial, folder, predicate, false,
        ))
    }

    fn repeating<P>(self, schedule: Schedule, predicate: P, expect: bool) -> Self
    where
        A: Clone + Sync,
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        let folded = FoldSum::with_predicate(
            self,
            schedule,
            None,
            schedule::keep_last::<A>,
            predicate,
            expect,
        );
        Self::from_transducer(folded.then(transducer::filter_map(schedule::keep_right::<A>)))
    }

    /// Re-runs the effect under `schedule` while it succeeds, reporting the
    /// last value.
    #[must_use]
    pub fn repeat(self, schedule: Schedule) -> Self
    where
        A: Clone + Sync,
    {
        self.repeating(schedule, schedule::always::<A>, true)
    }

    /// Repeats while `predicate` holds for the produced value.
    pub fn repeat_while<P>(self, schedule: Schedule, predicate: P) -> Self
    where
        A: Clone + Sync,
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        self.repeating(schedule, predicate, true)
    }

    /// Repeats until `predicate` holds for the produced value.
    pub fn repeat_until<P>(self, schedule: Schedule, predicate: P) -> Self
    where
        A: Clone + Sync,
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        self.repeating(schedule, predicate, false)
    }

    fn retrying<P>(self, schedule: Schedule, predicate: P, expect: bool) -> Self
    where
        P: Fn(&Error) -> bool + Send + Sync + 'static,
    {
        let swapped = self.then(bifunctor::swap::<Error, A>());
        let folded = FoldSum::with_predicate(
            swapped,
            schedule,
            None,
            schedule::keep_last::<Error>,
            predicate,
            expect,
        );
        Self::from_transducer(folded.then(transducer::filter_map(schedule::keep_left::<A>)))
    }

    /// Re-runs the effect under `schedule` while it fails.
    ///
    /// A schedule of `n` durations allows `n + 1` attempts; when all of
    /// them fail, the last failure is reported.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use reductive::effect::{Eff, Error};
    /// use reductive::schedule::Schedule;
    ///
    /// let attempts = Arc::new(AtomicUsize::new(0));
    /// let counter = attempts.clone();
    /// let flaky = Eff::<(), usize>::lift(move |_| {
    ///     let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
    ///     if attempt < 3 { Err(Error::new("not yet")) } else { Ok(attempt) }
    /// });
    ///
    /// assert_eq!(flaky.retry(Schedule::recurs(5)).run(()), Ok(3));
    /// assert_eq!(attempts.load(Ordering::SeqCst), 3);
    /// ```
    #[must_use]
    pub fn retry(self, schedule: Schedule) -> Self {
        self.retrying(schedule, schedule::always::<Error>, true)
    }

    /// Retries while `predicate` holds for the failure.
    pub fn retry_while<P>(self, schedule: Schedule, predicate: P) -> Self
    where
        P: Fn(&Error) -> bool + Send + Sync + 'static,
    {
        self.retrying(schedule, predicate, true)
    }

    /// Retries until `predicate` holds for the failure.
    pub fn retry_until<P>(self, schedule: Schedule, predicate: P) -> Self
    where
        P: Fn(&Error) -> bool + Send + Sync + 'static,
    {
        self.retrying(schedule, predicate, false)
    }

    // =========================================================================
    // Resources
    // =========================================================================

    /// Registers the success value with `release`, which runs exactly once
    /// when the enclosing [`scope`](Self::scope) or the whole run ends.
    pub fn use_resource<F>(self, release: F) -> Self
    where
        A: Clone,
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::from_transducer(
            self.then(bifunctor::on_right::<_, Error>(transducer::use_resource(release))),
        )
    }

    /// Releases every resource registered inside this effect as soon as it
    /// finishes, on success, failure and panic alike.
    #[must_use]
    pub fn scope(self) -> Self {
        Self::from_transducer(transducer::scope(self))
    }

    /// Acquires a resource, uses it, and releases it once the use finishes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicBool, Ordering};
    /// use reductive::effect::Eff;
    ///
    /// let closed = Arc::new(AtomicBool::new(false));
    /// let flag = closed.clone();
    /// let read = Eff::bracket(
    ///     Eff::<(), &str>::success("handle"),
    ///     |handle: &str| Eff::success(handle.len()),
    ///     move |_: &str| flag.store(true, Ordering::SeqCst),
    /// );
    /// assert_eq!(read.run(()), Ok(6));
    /// assert!(closed.load(Ordering::SeqCst));
    /// ```
    pub fn bracket<R, U, F>(acquire: Eff<Env, R>, use_resource: U, release: F) -> Self
    where
        R: Clone + Send + 'static,
        U: Fn(R) -> Self + Send + Sync + 'static,
        F: Fn(R) + Send + Sync + 'static,
    {
        acquire.use_resource(release).bind(use_resource).scope()
    }

    // =========================================================================
    // Running
    // =========================================================================

    /// Runs the effect against `env`.
    ///
    /// Panics raised by user functions are caught and reported as
    /// [`Error::Exceptional`].
    pub fn run(&self, env: Env) -> Fin<A> {
        self.run_with_state(env, &TState::new())
    }

    /// Runs the effect sharing a caller-supplied [`TState`].
    pub fn run_with_state(&self, env: Env, state: &TState) -> Fin<A> {
        transducer::invoke1_with(self, state, Sum::Right(env)).and_then(Fin::<A>::from)
    }

    /// Runs the effect, observing `token` for cancellation.
    pub fn run_cancellable(&self, env: Env, token: &CancelToken) -> Fin<A> {
        self.run_with_state(env, &TState::with_cancel_token(token.clone()))
    }

    /// Runs a multi-valued effect, collecting every success. The first
    /// failure is reported instead.
    pub fn run_many(&self, env: Env) -> Fin<Vec<A>> {
        transducer::invoke_many(self, Sum::Right(env))?
            .into_iter()
            .map(Fin::<A>::from)
            .collect()
    }

    /// Converts into the asynchronous effect type.
    #[must_use]
    pub fn into_async(self) -> EffAsync<Env, A> {
        EffAsync::from(self)
    }
}

impl<Env> Eff<Env, Env>
where
    Env: Clone + Send + Sync + 'static,
{
    /// An effect whose value is the environment itself.
    #[must_use]
    pub fn ask() -> Self {
        Self::from_transducer(transducer::identity::<Sum<Error, Env>>())
    }
}

// =============================================================================
// Trait implementations
// =============================================================================

impl<Env, A> Clone for Eff<Env, A> {
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            Inner::Ready(node) => Inner::Ready(Arc::clone(node)),
            Inner::Bottom => Inner::Bottom,
        };
        Self { inner }
    }
}

impl<Env, A> Default for Eff<Env, A> {
    fn default() -> Self {
        Self::bottom()
    }
}

impl<Env, A> fmt::Debug for Eff<Env, A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Eff")
            .field("bottom", &self.is_bottom())
            .finish_non_exhaustive()
    }
}

impl<Env, A> TransducerAsync<Sum<Error, Env>, Sum<Error, A>> for Eff<Env, A>
where
    Env: Send + 'static,
    A: Send + 'static,
{
    fn transform_async<'a>(
        &'a self,
        state: &'a TState,
        input: Sum<Error, Env>,
        reducer: &'a mut dyn AsyncReduce<Sum<Error, A>>,
    ) -> BoxFuture<'a, TResult<()>> {
        match &self.inner {
            Inner::Ready(node) => node.transform_async(state, input, reducer),
            Inner::Bottom => Box::pin(future::ready(TResult::Fail(Error::Bottom))),
        }
    }
}

impl<Env, A> Transducer<Sum<Error, Env>, Sum<Error, A>> for Eff<Env, A>
where
    Env: Send + 'static,
    A: Send + 'static,
{
    fn transform(
        &self,
        state: &TState,
        input: Sum<Error, Env>,
        reducer: &mut Reducer<'_, Sum<Error, A>>,
    ) -> TResult<()> {
        match &self.inner {
            Inner::Ready(node) => node.transform(state, input, reducer),
            Inner::Bottom => TResult::Fail(Error::Bottom),
        }
    }
}

impl<Env, A> From<Error> for Eff<Env, A>
where
    Env: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    fn from(error: Error) -> Self {
        Self::fail(error)
    }
}

impl<Env, A> From<Sum<Error, A>> for Eff<Env, A>
where
    Env: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    fn from(value: Sum<Error, A>) -> Self {
        Self::from_transducer(transducer::map(move |input: Sum<Error, Env>| {
            input.and_then(|_| value.clone())
        }))
    }
}

impl<Env, A> From<Fin<A>> for Eff<Env, A>
where
    Env: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    fn from(result: Fin<A>) -> Self {
        Self::from(Sum::from(result))
    }
}
