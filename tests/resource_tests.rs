//! Resource safety: every acquired resource is released exactly once,
//! whatever way the computation using it ends.

use std::sync::Arc;

use parking_lot::Mutex;
use reductive::effect::{Eff, EffAsync, Error};
use reductive::schedule::Schedule;
use reductive::bifunctor::on_right;
use reductive::transducer::{self, TState, TransducerExt, invoke_many, invoke1_with};
use rstest::rstest;

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn acquire(log: &Log, name: &'static str) -> Eff<(), &'static str> {
    let log = log.clone();
    Eff::lift(move |_: &()| {
        log.lock().push(format!("acquire {name}"));
        Ok(name)
    })
}

fn releaser(log: &Log) -> impl Fn(&'static str) + Send + Sync + 'static {
    let log = log.clone();
    move |name| log.lock().push(format!("release {name}"))
}

fn releases(log: &Log, name: &str) -> usize {
    let entry = format!("release {name}");
    log.lock().iter().filter(|line| **line == entry).count()
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Success,
    Failure,
    Panic,
}

fn using(outcome: Outcome) -> impl Fn(&'static str) -> Eff<(), usize> + Send + Sync + 'static {
    move |handle| match outcome {
        Outcome::Success => Eff::success(handle.len()),
        Outcome::Failure => Eff::fail(Error::new("use failed")),
        Outcome::Panic => Eff::success(handle).map(|_| -> usize { panic!("use panicked") }),
    }
}

#[rstest]
#[case(Outcome::Success)]
#[case(Outcome::Failure)]
#[case(Outcome::Panic)]
fn bracket_releases_exactly_once(#[case] outcome: Outcome) {
    let log = log();
    let effect = Eff::bracket(acquire(&log, "file"), using(outcome), releaser(&log));

    let result = effect.run(());
    match outcome {
        Outcome::Success => assert_eq!(result, Ok(4)),
        Outcome::Failure => assert_eq!(result, Err(Error::new("use failed"))),
        Outcome::Panic => assert!(result.is_err_and(|error| error.is_exceptional())),
    }
    assert_eq!(releases(&log, "file"), 1);
}

#[rstest]
fn release_happens_before_the_value_leaves_the_scope() {
    let log = log();
    let observer = log.clone();
    let effect = Eff::bracket(
        acquire(&log, "socket"),
        |handle| Eff::success(handle),
        releaser(&log),
    )
    .map(move |handle| {
        observer.lock().push(format!("after {handle}"));
        handle
    });

    assert_eq!(effect.run(()), Ok("socket"));
    assert_eq!(
        *log.lock(),
        vec!["acquire socket", "release socket", "after socket"]
    );
}

#[rstest]
fn nested_scopes_release_inner_first() {
    let log = log();
    let inner_log = log.clone();
    let outer = Eff::bracket(
        acquire(&log, "outer"),
        move |_| {
            Eff::bracket(
                acquire(&inner_log, "inner"),
                |_| Eff::success(()),
                releaser(&inner_log),
            )
        },
        releaser(&log),
    );

    assert_eq!(outer.run(()), Ok(()));
    assert_eq!(
        *log.lock(),
        vec![
            "acquire outer",
            "acquire inner",
            "release inner",
            "release outer"
        ]
    );
}

#[rstest]
fn unscoped_resources_are_released_when_the_run_ends() {
    let log = log();
    let effect = acquire(&log, "a")
        .use_resource(releaser(&log))
        .bind({
            let log = log.clone();
            move |_| acquire(&log, "b").use_resource(releaser(&log))
        });

    assert_eq!(effect.run(()), Ok("b"));
    assert_eq!(
        *log.lock(),
        vec!["acquire a", "acquire b", "release b", "release a"]
    );
}

#[rstest]
fn retried_acquisition_releases_every_attempt() {
    let log = log();
    let attempts = Arc::new(Mutex::new(0));
    let counter = attempts.clone();
    let effect = Eff::bracket(
        acquire(&log, "conn"),
        move |_| {
            let mut count = counter.lock();
            *count += 1;
            if *count < 3 {
                Eff::fail(Error::new("flaky"))
            } else {
                Eff::success(*count)
            }
        },
        releaser(&log),
    )
    .retry(Schedule::recurs(5));

    assert_eq!(effect.run(()), Ok(3));
    assert_eq!(releases(&log, "conn"), 3);
}

#[rstest]
fn state_releases_in_reverse_registration_order() {
    let log = log();
    {
        let state = TState::new();
        for name in ["first", "second"] {
            let log = log.clone();
            state.register(move || log.lock().push(name.to_string()));
        }
        assert_eq!(state.pending_resources(), 2);
    }
    assert_eq!(*log.lock(), vec!["second", "first"]);
}

#[rstest]
fn scoped_transducer_releases_on_cancellation() {
    let log = log();
    let state = TState::new();
    let release = releaser(&log);
    let pipeline = transducer::use_resource(move |name: &'static str| release(name))
        .then(transducer::cancel::<&'static str, &'static str>())
        .scoped();

    assert_eq!(invoke1_with(&pipeline, &state, "lease"), Err(Error::Cancelled));
    assert_eq!(releases(&log, "lease"), 1);
    assert_eq!(state.pending_resources(), 0);
    drop(state);
    assert_eq!(releases(&log, "lease"), 1);
}

#[rstest]
fn scoped_stream_passes_every_value_after_release() {
    let log = log();
    let release = releaser(&log);
    let observer = log.clone();
    let pipeline = transducer::each::<Vec<&'static str>>()
        .then(transducer::use_resource(move |name: &'static str| release(name)))
        .scoped()
        .map(move |name: &'static str| (name, observer.lock().len()));

    assert_eq!(
        invoke_many(&pipeline, vec!["a", "b", "c"]),
        Ok(vec![("a", 3), ("b", 3), ("c", 3)])
    );
    assert_eq!(*log.lock(), vec!["release c", "release b", "release a"]);
}

fn spread() -> Eff<Vec<i32>, i32> {
    Eff::from_transducer(on_right::<_, Error>(transducer::each::<Vec<i32>>()))
}

#[rstest]
fn scoped_effect_keeps_every_value() {
    assert_eq!(spread().scope().run_many(vec![1, 2, 3]), Ok(vec![1, 2, 3]));
    assert_eq!(spread().scope().run(vec![4, 5]), Ok(4));
}

#[tokio::test]
async fn scoped_async_effect_keeps_every_value() {
    let scoped = spread().into_async().scope();
    assert_eq!(scoped.run_many(vec![1, 2, 3]).await, Ok(vec![1, 2, 3]));
}

#[tokio::test]
async fn async_bracket_releases_on_failure() {
    let log = log();
    let acquire_async = acquire(&log, "stream").into_async();
    let effect = EffAsync::bracket(
        acquire_async,
        |_| EffAsync::<(), usize>::fail(Error::new("broken pipe")),
        releaser(&log),
    );

    assert_eq!(effect.run(()).await, Err(Error::new("broken pipe")));
    assert_eq!(releases(&log, "stream"), 1);
}
