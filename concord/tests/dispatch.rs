mod common;

use concord::{FutureError, PoolSelection, RunConfig, TaskException, ThreadPool, pool};

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

#[derive(Debug, PartialEq)]
struct QuotaExceeded(u32);

impl fmt::Display for QuotaExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "quota exceeded by {}", self.0)
    }
}

impl std::error::Error for QuotaExceeded {}

#[test]
fn test_run_on_custom_pool() {
    common::init_test_logging();
    let pool = ThreadPool::new(2);

    let future = concord::run_on(Some(&pool), || 6 * 7);

    assert_eq!(future.result().unwrap(), 42);
    assert!(future.is_finished());
    assert!(!future.is_canceled());
}

#[test]
fn test_run_on_null_pool_refuses() {
    let entered = Arc::new(AtomicUsize::new(0));

    let counter = entered.clone();
    let future = concord::run_on(None, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        1
    });

    assert!(future.is_finished());
    assert!(future.is_canceled());
    assert!(!future.is_started());
    assert!(matches!(future.result(), Err(FutureError::Canceled)));
    assert_eq!(entered.load(Ordering::SeqCst), 0);

    let refused = RunConfig::new()
        .selection(PoolSelection::Null)
        .run(|| "never");
    assert!(refused.is_canceled());
}

#[test]
fn test_cancel_before_start_skips_body() {
    common::init_test_logging();
    let pool = ThreadPool::new(1);
    let release = common::occupy_worker(&pool);

    let entered = Arc::new(AtomicUsize::new(0));
    let counter = entered.clone();
    let future = concord::run_on(Some(&pool), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    future.cancel();

    assert!(future.is_finished());
    assert!(future.is_canceled());
    assert!(!future.is_started());
    assert_eq!(pool.queued_count(), 0);

    drop(release);
    pool.wait_for_done();

    assert_eq!(entered.load(Ordering::SeqCst), 0);
}

#[test]
fn test_priorities_on_single_worker() {
    common::init_test_logging();
    let pool = ThreadPool::new(1);
    let release = common::occupy_worker(&pool);

    let order = Arc::new(std::sync::Mutex::new(Vec::new()));

    let futures: Vec<_> = [(2, 0), (3, 5), (4, 5)]
        .into_iter()
        .map(|(x, priority)| {
            let order = order.clone();
            RunConfig::new().pool(&pool).priority(priority).run(move || {
                order.lock().unwrap().push(x);
                x * x
            })
        })
        .collect();

    drop(release);
    pool.wait_for_done();

    let results: Vec<i32> = futures.iter().map(|f| f.result().unwrap()).collect();
    assert_eq!(results, vec![4, 9, 16]);
    assert!(futures.iter().all(|f| f.is_finished() && f.result_count() == 1));
    assert_eq!(*order.lock().unwrap(), vec![3, 4, 2]);
}

#[test]
fn test_try_run_keeps_error_type() {
    let pool = ThreadPool::new(1);

    let future = RunConfig::new()
        .pool(&pool)
        .try_run(|| -> Result<u32, QuotaExceeded> { Err(QuotaExceeded(3)) });

    match future.result() {
        Err(FutureError::Exception(exception)) => {
            assert_eq!(exception.downcast_ref::<QuotaExceeded>(), Some(&QuotaExceeded(3)));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert!(future.is_finished());
    assert!(!future.is_canceled());

    let ok = RunConfig::new()
        .pool(&pool)
        .try_run(|| Ok::<_, QuotaExceeded>(5));
    assert_eq!(ok.result().unwrap(), 5);
}

#[test]
fn test_panic_message_is_captured() {
    let pool = ThreadPool::new(1);

    let future = concord::run_on(Some(&pool), || -> u8 { panic!("disk on fire") });

    for _ in 0..2 {
        match future.result() {
            Err(FutureError::Exception(TaskException::Panicked(message))) => {
                assert_eq!(message, "disk on fire");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    // The worker survived the panic.
    assert_eq!(concord::run_on(Some(&pool), || 1).result().unwrap(), 1);
}

#[test]
fn test_panic_with_opaque_payload_is_unhandled() {
    let pool = ThreadPool::new(1);

    let future = concord::run_on(Some(&pool), || -> u8 { std::panic::panic_any(17u32) });

    match future.result() {
        Err(FutureError::Exception(TaskException::Unhandled(payload))) => {
            assert!(payload.is::<u32>());
            assert!(!payload.is::<String>());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_panic_carrying_task_exception_is_preserved() {
    let pool = ThreadPool::new(1);

    let future = concord::run_on(Some(&pool), || -> u8 {
        std::panic::panic_any(TaskException::failed(QuotaExceeded(9)))
    });

    future.wait_for_finished();

    let exception = future.exception().unwrap();
    assert_eq!(exception.downcast_ref::<QuotaExceeded>(), Some(&QuotaExceeded(9)));
}

#[test]
fn test_run_with_promise_streams_results() {
    let pool = ThreadPool::new(2);

    let future = RunConfig::new()
        .pool(&pool)
        .run_with_promise::<u32, _>(|promise| {
            for i in 0..5 {
                promise.add_result(i * 2);
            }
        });

    assert_eq!(future.results().unwrap(), vec![0, 2, 4, 6, 8]);
    assert_eq!(future.result_at(4).unwrap(), 8);
}

#[test]
fn test_result_at_returns_before_finish() {
    let pool = ThreadPool::new(1);
    let (release, gate) = std::sync::mpsc::channel::<()>();
    let (started_tx, started_rx) = std::sync::mpsc::channel::<()>();

    let future = RunConfig::new()
        .pool(&pool)
        .run_with_promise::<&'static str, _>(move |promise| {
            let _ = started_tx.send(());
            promise.add_result("early");
            let _ = gate.recv();
            promise.add_result("late");
        });

    started_rx.recv().unwrap();
    assert_eq!(future.result_at(0).unwrap(), "early");
    assert!(!future.is_finished());

    drop(release);
    assert_eq!(future.result_at(1).unwrap(), "late");
}

#[test]
fn test_running_task_observes_cancellation() {
    let pool = ThreadPool::new(1);
    let (started_tx, started_rx) = std::sync::mpsc::channel::<()>();

    let future = RunConfig::new()
        .pool(&pool)
        .run_with_promise::<usize, _>(move |promise| {
            let _ = started_tx.send(());
            let mut rounds = 0;

            while !promise.is_canceled() {
                rounds += 1;
                thread::sleep(Duration::from_millis(1));
            }

            promise.add_result(rounds);
        });

    started_rx.recv().unwrap();
    future.cancel();
    future.wait_for_finished();

    assert!(future.is_started());
    assert!(future.is_canceled());
    assert!(future.results().unwrap().is_empty());
}

#[test]
fn test_waiting_runs_queued_task_inline() {
    let pool = ThreadPool::new(1);
    let release = common::occupy_worker(&pool);

    let future = concord::run_on(Some(&pool), || thread::current().id());

    future.wait_for_finished();

    assert!(future.is_finished());
    assert_eq!(future.result().unwrap(), thread::current().id());

    drop(release);
}

#[test]
fn test_run_macro_applies_arguments() {
    let pool = ThreadPool::new(1);

    fn describe(name: String, count: usize, flag: bool) -> String {
        format!("{name}:{count}:{flag}")
    }

    let name = String::from("jobs");
    let future = concord::run!(pool = Some(&pool); describe, name, 3, true);
    assert_eq!(future.result().unwrap(), "jobs:3:true");

    let nullary = concord::run!(pool = Some(&pool); || 5);
    assert_eq!(nullary.result().unwrap(), 5);

    let refused = concord::run!(pool = None; describe, String::new(), 0, false);
    assert!(refused.is_canceled());
}

#[test]
fn test_default_pool_override() {
    let isolated = ThreadPool::builder()
        .worker_threads(1)
        .thread_name("isolated")
        .build();

    let name = pool::with_default_pool(&isolated, || {
        concord::run(|| thread::current().name().map(str::to_owned))
    });

    isolated.wait_for_done();
    assert_eq!(name.result().unwrap().as_deref(), Some("isolated-0"));

    let macro_name = pool::with_default_pool(&isolated, || {
        concord::run!(|suffix: &str| format!("{}{suffix}", thread::current().name().unwrap_or("")), "!")
    });

    isolated.wait_for_done();
    assert_eq!(macro_name.result().unwrap(), "isolated-0!");
}

#[test]
fn test_global_pool_is_shared() {
    let first = pool::global();
    let second = pool::global();

    assert!(std::ptr::eq(first, second));
    assert!(first.max_threads() >= 1);

    let future = concord::run(|| "global");
    assert_eq!(future.result().unwrap(), "global");

    let failed = concord::try_run(|| "x".parse::<u8>());
    assert!(matches!(failed.result(), Err(FutureError::Exception(TaskException::Failed(_)))));

    let streamed = concord::run_with_promise::<u8, _>(|promise| {
        promise.add_results([1, 2, 3]);
    });
    assert_eq!(streamed.results().unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_invoke_keeps_return_type() {
    use concord::task::Invoke;

    let sum: u32 = Invoke::invoke(|a: u32, b: u32| a + b, (2u32, 3u32));
    assert_eq!(sum, 5);

    let label: String = Invoke::invoke(|| String::from("none"), ());
    assert_eq!(label, "none");

    let pool = ThreadPool::new(1);
    let lengths = concord::run!(pool = Some(&pool); |a: &str, b: Vec<u8>| (a.len(), b.len()), "four", vec![1, 2]);
    assert_eq!(lengths.result().unwrap(), (4, 2));
}

#[test]
fn test_default_pool_restored_after_panic() {
    let outer = ThreadPool::builder()
        .worker_threads(1)
        .thread_name("outer")
        .build();
    let inner = ThreadPool::builder()
        .worker_threads(1)
        .thread_name("inner")
        .build();

    let name = pool::with_default_pool(&outer, || {
        let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pool::with_default_pool(&inner, || -> u8 { panic!("scope failed") });
        }));
        assert!(unwound.is_err());

        concord::run(|| thread::current().name().map(str::to_owned))
    });

    outer.wait_for_done();
    assert_eq!(name.result().unwrap().as_deref(), Some("outer-0"));
}
