//! Integration tests for `EffAsync`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reductive::effect::{Eff, EffAsync, Error};
use reductive::schedule::Schedule;
use reductive::transducer::CancelToken;
use rstest::rstest;

fn flaky(failures: usize) -> (Arc<AtomicUsize>, EffAsync<(), usize>) {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let effect = EffAsync::lift_async(move |()| {
        let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            tokio::task::yield_now().await;
            if attempt <= failures {
                Err(Error::new("transient"))
            } else {
                Ok(attempt)
            }
        }
    });
    (attempts, effect)
}

#[tokio::test]
async fn converted_eff_behaves_the_same() {
    let sync = Eff::<i32, i32>::ask().map(|x| x * 3).filter(|x| *x > 5);
    let asynchronous = sync.clone().into_async();

    for env in [1, 2, 3] {
        assert_eq!(asynchronous.run(env).await, sync.run(env));
    }
}

#[tokio::test]
async fn bind_async_chains_futures() {
    let lookup = EffAsync::<u32, u32>::ask()
        .bind_async(|id: u32| async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            if id == 0 { Err(Error::new("no such id")) } else { Ok(format!("user-{id}")) }
        })
        .map(|name| name.len());

    assert_eq!(lookup.run(7).await, Ok(6));
    assert_eq!(lookup.run(0).await, Err(Error::new("no such id")));
}

#[tokio::test]
async fn failed_bind_never_calls_continuation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let chained = EffAsync::<(), i32>::fail(Error::new("boom")).bind(move |x| {
        counter.fetch_add(1, Ordering::SeqCst);
        EffAsync::success(x)
    });
    assert_eq!(chained.run(()).await, Err(Error::new("boom")));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[rstest]
#[case(0, Ok(1), 1)]
#[case(2, Ok(3), 3)]
#[case(10, Err(Error::new("transient")), 4)]
#[tokio::test(start_paused = true)]
async fn retry_with_backoff(
    #[case] failures: usize,
    #[case] expected: Result<usize, Error>,
    #[case] attempts_made: usize,
) {
    let (attempts, effect) = flaky(failures);
    let retried = effect.retry(Schedule::exponential(Duration::from_millis(100)).take(3));

    assert_eq!(retried.run(()).await, expected);
    assert_eq!(attempts.load(Ordering::SeqCst), attempts_made);
}

#[tokio::test(start_paused = true)]
async fn schedule_waits_use_tokio_time() {
    let (_, effect) = flaky(2);
    let retried = effect.retry(Schedule::spaced(Duration::from_secs(60)).take(5));

    let started = tokio::time::Instant::now();
    assert_eq!(retried.run(()).await, Ok(3));
    assert_eq!(started.elapsed().as_secs(), 120);
}

#[tokio::test]
async fn repeat_while_and_fold() {
    let counter = Arc::new(AtomicUsize::new(0));
    let shared = counter.clone();
    let tick = EffAsync::<(), usize>::lift(move |_| Ok(shared.fetch_add(1, Ordering::SeqCst) + 1));

    let repeated = tick.clone().repeat_while(Schedule::forever(), |x| *x < 3);
    assert_eq!(repeated.run(()).await, Ok(3));

    let total = tick.fold(Schedule::recurs(2), 0, |total, x| total + x);
    assert_eq!(total.run(()).await, Ok(4 + 5 + 6));
}

#[tokio::test]
async fn cancellation_is_observed_between_attempts() {
    let token = CancelToken::new();
    let trigger = token.clone();
    let effect = EffAsync::<(), i32>::lift(move |_| {
        trigger.cancel();
        Err(Error::new("again"))
    })
    .retry(Schedule::forever());

    assert_eq!(effect.run_cancellable((), &token).await, Err(Error::Cancelled));
}

#[tokio::test]
async fn apply_and_zip() {
    let left = EffAsync::<(), i32>::success(2);
    let right = EffAsync::<(), &str>::success("two");
    assert_eq!(left.clone().zip(right).run(()).await, Ok((2, "two")));

    let biased = EffAsync::<(), i32>::fail(Error::new("first"))
        .apply(EffAsync::<(), i32>::fail(Error::new("second")), |a, b| a + b);
    assert_eq!(biased.run(()).await, Err(Error::new("first")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn effects_run_concurrently_from_spawned_tasks() {
    let effect = EffAsync::<u64, u64>::ask().map_async(|x: u64| async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        x * 2
    });

    let handles: Vec<_> = (0..4)
        .map(|env| {
            let effect = effect.clone();
            tokio::spawn(async move { effect.run(env).await })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.expect("task panicked"));
    }
    assert_eq!(results, vec![Ok(0), Ok(2), Ok(4), Ok(6)]);
}
