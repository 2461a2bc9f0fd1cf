mod common;

use concord::{RunConfig, ThreadPool};

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

#[test]
fn test_execute_runs_every_job() {
    common::init_test_logging();
    let pool = ThreadPool::new(4);
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..100 {
        let counter = counter.clone();
        assert!(pool.execute(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
    }

    pool.wait_for_done();

    assert_eq!(counter.load(Ordering::SeqCst), 100);
    assert_eq!(pool.active_count(), 0);
    assert_eq!(pool.queued_count(), 0);
}

#[test]
fn test_thread_names_and_max_threads() {
    let pool = ThreadPool::builder()
        .worker_threads(3)
        .thread_name("named")
        .build();

    assert_eq!(pool.max_threads(), 3);

    let names = Arc::new(Mutex::new(HashSet::new()));
    let (release, gate) = std::sync::mpsc::channel::<()>();
    let gate = Arc::new(Mutex::new(gate));
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<()>();

    // Hold all three workers at once so each records its own name.
    for _ in 0..3 {
        let names = names.clone();
        let gate = gate.clone();
        let ready_tx = ready_tx.clone();

        pool.execute(move || {
            names
                .lock()
                .unwrap()
                .insert(thread::current().name().unwrap_or_default().to_owned());
            let _ = ready_tx.send(());
            let _ = gate.lock().unwrap().recv();
        });
    }

    for _ in 0..3 {
        ready_rx.recv().unwrap();
    }
    assert_eq!(pool.active_count(), 3);

    drop(release);
    pool.wait_for_done();

    let names = names.lock().unwrap();
    for id in 0..3 {
        assert!(names.contains(&format!("named-{id}")));
    }
}

#[test]
fn test_queued_count_and_priority() {
    let pool = ThreadPool::new(1);
    let release = common::occupy_worker(&pool);
    let order = Arc::new(Mutex::new(Vec::new()));

    for (label, priority) in [("low", -1), ("normal", 0), ("high", 10), ("normal-2", 0)] {
        let order = order.clone();
        pool.execute_with_priority(priority, move || {
            order.lock().unwrap().push(label);
        });
    }

    assert_eq!(pool.queued_count(), 4);
    assert_eq!(pool.active_count(), 1);

    drop(release);
    pool.wait_for_done();

    assert_eq!(*order.lock().unwrap(), vec!["high", "normal", "normal-2", "low"]);
}

#[test]
fn test_clear_cancels_queued_computations() {
    let pool = ThreadPool::new(1);
    let release = common::occupy_worker(&pool);
    let entered = Arc::new(AtomicUsize::new(0));

    let futures: Vec<_> = (0..4)
        .map(|_| {
            let counter = entered.clone();
            RunConfig::new().pool(&pool).run(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    assert_eq!(pool.queued_count(), 4);
    pool.clear();
    assert_eq!(pool.queued_count(), 0);

    for future in &futures {
        assert!(future.is_finished());
        assert!(future.is_canceled());
        assert!(!future.is_started());
    }

    drop(release);
    pool.wait_for_done();
    assert_eq!(entered.load(Ordering::SeqCst), 0);
}

#[test]
fn test_dropping_pool_drains_queue() {
    let counter = Arc::new(AtomicUsize::new(0));

    let futures: Vec<_> = {
        let pool = ThreadPool::new(2);

        (0..10)
            .map(|i| {
                let counter = counter.clone();
                concord::run_on(Some(&pool), move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    i
                })
            })
            .collect()
    };

    assert_eq!(counter.load(Ordering::SeqCst), 10);

    let values: Vec<i32> = futures.iter().map(|f| f.result().unwrap()).collect();
    assert_eq!(values, (0..10).collect::<Vec<_>>());
}

#[test]
fn test_worker_survives_panicking_job() {
    let pool = ThreadPool::new(1);

    pool.execute(|| panic!("job failure"));
    pool.wait_for_done();

    let counter = Arc::new(AtomicUsize::new(0));
    let inner = counter.clone();
    pool.execute(move || {
        inner.fetch_add(1, Ordering::SeqCst);
    });
    pool.wait_for_done();

    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_pool_debug_output() {
    let pool = ThreadPool::new(2);
    let rendered = format!("{pool:?}");

    assert!(rendered.contains("max_threads: 2"));
    assert!(rendered.contains("queued: 0"));
}

#[test]
fn test_inline_run_counts_as_active() {
    let pool = ThreadPool::new(1);
    let release = common::occupy_worker(&pool);

    let (gate_tx, gate_rx) = std::sync::mpsc::channel::<()>();
    let (started_tx, started_rx) = std::sync::mpsc::channel::<()>();

    let future = concord::run_on(Some(&pool), move || {
        let _ = started_tx.send(());
        let _ = gate_rx.recv();
        7
    });

    let waiter = {
        let future = future.clone();
        thread::spawn(move || future.result().unwrap())
    };

    started_rx.recv().unwrap();
    assert_eq!(pool.queued_count(), 0);
    assert_eq!(pool.active_count(), 2);

    drop(release);

    let done = Arc::new(AtomicUsize::new(0));
    let idle = {
        let pool = pool.clone();
        let done = done.clone();
        thread::spawn(move || {
            pool.wait_for_done();
            done.store(1, Ordering::SeqCst);
        })
    };

    thread::sleep(std::time::Duration::from_millis(20));
    assert_eq!(done.load(Ordering::SeqCst), 0);

    drop(gate_tx);

    assert_eq!(waiter.join().unwrap(), 7);
    idle.join().unwrap();
    assert_eq!(done.load(Ordering::SeqCst), 1);
    assert_eq!(pool.active_count(), 0);
}
