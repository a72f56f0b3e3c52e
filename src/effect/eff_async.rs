//! The asynchronous effect type.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture};

use super::{Eff, Error, Fin};
use crate::bifunctor;
use crate::control::Sum;
use crate::schedule::{self, FoldSum, Schedule};
use crate::transducer::{
    self, AsyncReduce, CancelToken, TResult, TState, TransducerAsync, TransducerExt,
};

type Node<Env, A> = Arc<dyn TransducerAsync<Sum<Error, Env>, Sum<Error, A>>>;

enum Inner<Env, A> {
    Ready(Node<Env, A>),
    Bottom,
}

/// The asynchronous counterpart of [`Eff`].
///
/// Stages may await futures (see [`map_async`](Self::map_async) and
/// [`bind_async`](Self::bind_async)) and schedule waits use
/// `tokio::time::sleep`, so running an `EffAsync` never blocks a worker
/// thread. Every synchronous [`Eff`] converts into an `EffAsync` with
/// [`From`] or [`Eff::into_async`].
///
/// # Examples
///
/// ```rust
/// use reductive::effect::EffAsync;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let value = EffAsync::<u32, u32>::asks(|env: &u32| env + 1)
///     .map_async(|x: u32| async move { x * 10 })
///     .run(4)
///     .await;
/// assert_eq!(value, Ok(50));
/// # }
/// ```
pub struct EffAsync<Env, A> {
    inner: Inner<Env, A>,
}

static_assertions::assert_impl_all!(EffAsync<(), ()>: Send, Sync, Clone, Default);

impl<Env, A> EffAsync<Env, A> {
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

impl<Env, A> EffAsync<Env, A>
where
    Env: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Wraps an asynchronous sum transducer.
    pub fn from_transducer<T>(transducer: T) -> Self
    where
        T: TransducerAsync<Sum<Error, Env>, Sum<Error, A>> + 'static,
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
        Eff::success(value).into_async()
    }

    /// An effect that always fails with `error`.
    pub fn fail(error: Error) -> Self {
        Eff::fail(error).into_async()
    }

    /// An effect computed from the environment.
    pub fn lift<F>(function: F) -> Self
    where
        F: Fn(&Env) -> Fin<A> + Send + Sync + 'static,
    {
        Eff::lift(function).into_async()
    }

    /// An effect computed asynchronously from the environment.
    pub fn lift_async<F, Fut>(function: F) -> Self
    where
        F: Fn(Env) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Fin<A>> + Send + 'static,
    {
        EffAsync::<Env, Env>::ask().bind_async(function)
    }

    /// An effect that projects a value out of the environment.
    pub fn asks<F>(function: F) -> Self
    where
        F: Fn(&Env) -> A + Send + Sync + 'static,
    {
        Eff::asks(function).into_async()
    }

    /// An effect that cancels the run.
    #[must_use]
    pub fn cancel() -> Self {
        Eff::cancel().into_async()
    }

    /// Maps the success value.
    pub fn map<B, F>(self, function: F) -> EffAsync<Env, B>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        EffAsync::from_transducer(self.then(bifunctor::map_right(function)))
    }

    /// Maps the success value with an asynchronous function.
    pub fn map_async<B, F, Fut>(self, function: F) -> EffAsync<Env, B>
    where
        B: Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = B> + Send + 'static,
    {
        EffAsync::from_transducer(
            self.then(bifunctor::on_right::<_, Error>(transducer::map_async(function))),
        )
    }

    /// Maps the failure.
    pub fn map_err<F>(self, function: F) -> Self
    where
        F: Fn(Error) -> Error + Send + Sync + 'static,
    {
        Self::from_transducer(self.then(bifunctor::map_left(function)))
    }

    /// Maps the failure and the success value.
    pub fn bimap<B, F, G>(self, on_error: F, on_success: G) -> EffAsync<Env, B>
    where
        B: Send + 'static,
        F: Fn(Error) -> Error + Send + Sync + 'static,
        G: Fn(A) -> B + Send + Sync + 'static,
    {
        EffAsync::from_transducer(self.then(bifunctor::bimap(on_error, on_success)))
    }

    /// Chains a dependent effect. A failure is passed on unchanged and
    /// `next` is never called.
    pub fn bind<B, F>(self, next: F) -> EffAsync<Env, B>
    where
        B: Send + 'static,
        F: Fn(A) -> EffAsync<Env, B> + Send + Sync + 'static,
    {
        EffAsync::from_transducer(bifunctor::sum_bind(self, next))
    }

    /// Alias for [`bind`](Self::bind).
    pub fn and_then<B, F>(self, next: F) -> EffAsync<Env, B>
    where
        B: Send + 'static,
        F: Fn(A) -> EffAsync<Env, B> + Send + Sync + 'static,
    {
        self.bind(next)
    }

    /// Chains a fallible asynchronous function.
    pub fn bind_async<B, F, Fut>(self, function: F) -> EffAsync<Env, B>
    where
        B: Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Fin<B>> + Send + 'static,
    {
        let settled = self.map_async(function);
        EffAsync::from_transducer(
            settled.then(transducer::map(|output: Sum<Error, Fin<B>>| {
                output.and_then(Sum::from)
            })),
        )
    }

    /// Runs `next` after `self` succeeds, keeping the result of `next`.
    #[must_use]
    pub fn action<B>(self, next: EffAsync<Env, B>) -> EffAsync<Env, B>
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

    /// Runs `self` then `other` and combines both values, left-biased.
    pub fn apply<B, C, F>(self, other: EffAsync<Env, B>, combine: F) -> EffAsync<Env, C>
    where
        A: Clone,
        B: Send + 'static,
        C: Send + 'static,
        F: Fn(A, B) -> C + Send + Sync + 'static,
    {
        EffAsync::from_transducer(bifunctor::sum_apply(self, other, combine))
    }

    /// Pairs the values of `self` and `other`.
    #[must_use]
    pub fn zip<B>(self, other: EffAsync<Env, B>) -> EffAsync<Env, (A, B)>
    where
        A: Clone,
        B: Send + 'static,
    {
        self.apply(other, |left, right| (left, right))
    }

    /// Re-runs the effect under `schedule`, folding every success.
    pub fn fold<S, F>(self, schedule: Schedule, initial: S, folder: F) -> EffAsync<Env, S>
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(S, A) -> S + Send + Sync + 'static,
    {
        EffAsync::from_transducer(FoldSum::new(self, schedule, initial, folder))
    }

    /// Folds while `predicate` holds for the produced value.
    pub fn fold_while<S, F, P>(
        self,
        schedule: Schedule,
        initial: S,
        folder: F,
        predicate: P,
    ) -> EffAsync<Env, S>
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(S, A) -> S + Send + Sync + 'static,
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        EffAsync::from_transducer(FoldSum::with_predicate(
            self, schedule, initial, folder, predicate, true,
        ))
    }

    /// Folds until `predicate` holds for the produced value.
    pub fn fold_until<S, F, P>(
        self,
        schedule: Schedule,
        initial: S,
        folder: F,
        predicate: P,
    ) -> EffAsync<Env, S>
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(S, A) -> S + Send + Sync + 'static,
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        EffAsync::from_transducer(FoldSum::with_predicate(
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

    /// Re-runs the effect under `schedule` while it succeeds.
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

    /// Registers the success value with `release`.
    pub fn use_resource<F>(self, release: F) -> Self
    where
        A: Clone,
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::from_transducer(
            self.then(bifunctor::on_right::<_, Error>(transducer::use_resource(release))),
        )
    }

    /// Releases every resource registered inside this effect once it
    /// finishes.
    #[must_use]
    pub fn scope(self) -> Self {
        Self::from_transducer(transducer::scope(self))
    }

    /// Acquires a resource, uses it, and releases it once the use finishes.
    pub fn bracket<R, U, F>(acquire: EffAsync<Env, R>, use_resource: U, release: F) -> Self
    where
        R: Clone + Send + 'static,
        U: Fn(R) -> Self + Send + Sync + 'static,
        F: Fn(R) + Send + Sync + 'static,
    {
        acquire.use_resource(release).bind(use_resource).scope()
    }

    /// Runs the effect against `env`.
    pub async fn run(&self, env: Env) -> Fin<A> {
        let state = TState::new();
        self.run_with_state(env, &state).await
    }

    /// Runs the effect sharing a caller-supplied [`TState`].
    pub async fn run_with_state(&self, env: Env, state: &TState) -> Fin<A> {
        transducer::invoke1_with_async(self, state, Sum::Right(env))
            .await
            .and_then(Fin::<A>::from)
    }

    /// Runs the effect, observing `token` for cancellation.
    pub async fn run_cancellable(&self, env: Env, token: &CancelToken) -> Fin<A> {
        let state = TState::with_cancel_token(token.clone());
        self.run_with_state(env, &state).await
    }

    /// Runs a multi-valued effect, collecting every success.
    pub async fn run_many(&self, env: Env) -> Fin<Vec<A>> {
        transducer::invoke_many_async(self, Sum::Right(env))
            .await?
            .into_iter()
            .map(Fin::<A>::from)
            .collect()
    }
}

impl<Env> EffAsync<Env, Env>
where
    Env: Clone + Send + Sync + 'static,
{
    /// An effect whose value is the environment itself.
    #[must_use]
    pub fn ask() -> Self {
        Eff::ask().into_async()
    }
}

impl<Env, A> Clone for EffAsync<Env, A> {
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            Inner::Ready(node) => Inner::Ready(Arc::clone(node)),
            Inner::Bottom => Inner::Bottom,
        };
        Self { inner }
    }
}

impl<Env, A> Default for EffAsync<Env, A> {
    fn default() -> Self {
        Self::bottom()
    }
}

impl<Env, A> fmt::Debug for EffAsync<Env, A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("EffAsync")
            .field("bottom", &self.is_bottom())
            .finish_non_exhaustive()
    }
}

impl<Env, A> TransducerAsync<Sum<Error, Env>, Sum<Error, A>> for EffAsync<Env, A>
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

impl<Env, A> From<Eff<Env, A>> for EffAsync<Env, A>
where
    Env: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    fn from(eff: Eff<Env, A>) -> Self {
        if eff.is_bottom() {
            return Self::bottom();
        }
        Self::from_transducer(eff)
    }
}

impl<Env, A> From<Error> for EffAsync<Env, A>
where
    Env: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    fn from(error: Error) -> Self {
        Self::fail(error)
    }
}

impl<Env, A> From<Fin<A>> for EffAsync<Env, A>
where
    Env: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    fn from(result: Fin<A>) -> Self {
        Eff::from(result).into_async()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_map_async_awaits_stage() {
        let effect = EffAsync::<(), i32>::success(20).map_async(|x: i32| async move {
            tokio::task::yield_now().await;
            x + 1
        });
        assert_eq!(effect.run(()).await, Ok(21));
    }

    #[tokio::test]
    async fn test_bind_async_propagates_failure() {
        let effect = EffAsync::<(), i32>::success(1)
            .bind_async(|_: i32| async move { Err::<i32, _>(Error::new("remote")) })
            .map(|x| x + 1);
        assert_eq!(effect.run(()).await, Err(Error::new("remote")));
    }

    #[tokio::test]
    async fn test_lift_async_reads_environment() {
        let effect = EffAsync::lift_async(|env: String| async move { Ok(env.len()) });
        assert_eq!(effect.run("abc".to_string()).await, Ok(3));
    }

    #[tokio::test]
    async fn test_default_is_bottom() {
        assert_eq!(
            EffAsync::<(), i32>::default().run(()).await,
            Err(Error::Bottom)
        );
        assert!(EffAsync::from(Eff::<(), i32>::bottom()).is_bottom());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_between_attempts() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let effect = EffAsync::<(), usize>::lift(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(Error::new("down"))
        })
        .retry(Schedule::spaced(Duration::from_secs(1)).take(2));

        let started = tokio::time::Instant::now();
        assert_eq!(effect.run(()).await, Err(Error::new("down")));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_run() {
        let token = CancelToken::new();
        token.cancel();
        let effect = EffAsync::<(), i32>::success(1);
        assert_eq!(
            effect.run_cancellable((), &token).await,
            Err(Error::Cancelled)
        );
    }
}
