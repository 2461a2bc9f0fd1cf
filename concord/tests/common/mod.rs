#![allow(dead_code)]

use concord::ThreadPool;

use std::sync::Once;
use std::sync::mpsc::{self, Sender};

use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initializes test logging once per test binary.
///
/// Honors `RUST_LOG`, defaulting to `concord=trace`.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("concord=trace"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_thread_names(true)
            .with_ansi(false)
            .try_init();
    });
}

/// Keeps one worker of `pool` busy until the returned sender is used or
/// dropped. Returns once the worker is actually blocked.
pub fn occupy_worker(pool: &ThreadPool) -> Sender<()> {
    let (release, gate) = mpsc::channel::<()>();
    let (started_tx, started_rx) = mpsc::channel::<()>();

    assert!(pool.execute(move || {
        let _ = started_tx.send(());
        let _ = gate.recv();
    }));

    started_rx.recv().unwrap();
    release
}
