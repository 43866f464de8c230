//! Integration Tests for Signals
//!
//! These tests exercise signals, connections, scoped holders and event loops
//! together, including reentrant and multi-threaded use.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use switchboard_core::dispatch::{Invalidator, QueuedEventLoop, TokioEventLoop};
use switchboard_core::signals::{
    CollectAll, Connection, ScopedConnection, ScopedConnectionList, Signal, VoidSignal,
};
use switchboard_core::LoopConfig;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

/// Slots run in the order they were connected.
#[test]
fn slots_run_in_connection_order() {
    let signal: VoidSignal<()> = Signal::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let list = ScopedConnectionList::new();
    for name in ["s1", "s2", "s3"] {
        let log = log.clone();
        list.add_connection(signal.connect_same_thread(move || log.lock().unwrap().push(name)));
    }

    signal.emit(());
    assert_eq!(*log.lock().unwrap(), vec!["s1", "s2", "s3"]);
}

/// A slot that disconnects a later slot causes it to be skipped in the
/// same pass.
#[test]
fn disconnect_during_emission_skips_later_slot() {
    init_tracing();
    let signal: VoidSignal<()> = Signal::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let victim: Arc<Mutex<Option<Connection>>> = Arc::new(Mutex::new(None));

    let log1 = log.clone();
    let victim1 = victim.clone();
    let _c1 = signal.connect_same_thread(move || {
        log1.lock().unwrap().push(1);
        if let Some(conn) = victim1.lock().unwrap().as_ref() {
            conn.disconnect();
        }
    });
    let log2 = log.clone();
    let _c2 = signal.connect_same_thread(move || log2.lock().unwrap().push(2));
    let log3 = log.clone();
    let c3 = signal.connect_same_thread(move || log3.lock().unwrap().push(3));
    *victim.lock().unwrap() = Some(c3);

    signal.emit(());
    assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    assert_eq!(signal.len(), 2);

    signal.emit(());
    assert_eq!(*log.lock().unwrap(), vec![1, 2, 1, 2]);
}

/// A slot may disconnect itself mid-emission.
#[test]
fn slot_disconnects_itself() {
    let signal: Signal<(), u8, CollectAll> = Signal::new();
    let own: Arc<Mutex<Option<Connection>>> = Arc::new(Mutex::new(None));

    let own_clone = own.clone();
    let conn = signal.connect_same_thread(move || {
        if let Some(conn) = own_clone.lock().unwrap().take() {
            conn.disconnect();
        }
        1
    });
    *own.lock().unwrap() = Some(conn);
    let _c2 = signal.connect_same_thread(|| 2);

    assert_eq!(signal.emit(()), vec![1, 2]);
    assert_eq!(signal.emit(()), vec![2]);
}

/// A slot connected during emission first runs on the next emission.
#[test]
fn connect_during_emission_waits_for_next_pass() {
    let signal: Arc<VoidSignal<(u32,)>> = Arc::new(Signal::new());
    let log = Arc::new(Mutex::new(Vec::new()));
    let late_connections = Arc::new(ScopedConnectionList::new());
    let connected_once = Arc::new(AtomicBool::new(false));

    let weak = Arc::downgrade(&signal);
    let log_outer = log.clone();
    let late = late_connections.clone();
    let _c = signal.connect_same_thread(move |pass: u32| {
        log_outer.lock().unwrap().push(format!("early{pass}"));
        if connected_once.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(signal) = weak.upgrade() {
            let log_inner = log_outer.clone();
            late.add_connection(signal.connect_same_thread(move |pass: u32| {
                log_inner.lock().unwrap().push(format!("late{pass}"));
            }));
        }
    });

    signal.emit((1,));
    assert_eq!(*log.lock().unwrap(), vec!["early1"]);

    signal.emit((2,));
    assert_eq!(*log.lock().unwrap(), vec!["early1", "early2", "late2"]);
}

/// Dropping the signal first leaves holders harmless.
#[test]
fn signal_dropped_before_holders() {
    let signal: VoidSignal<()> = Signal::new();
    let list = ScopedConnectionList::new();
    let conn = signal.connect_same_thread(|| {});
    list.add_connection(conn.clone());
    let scoped = ScopedConnection::from(signal.connect_same_thread(|| {}));

    drop(signal);

    assert!(!conn.is_connected());
    assert!(!scoped.is_connected());
    drop(list);
    drop(scoped);
    conn.disconnect();
}

/// Dropping a holder first removes its slot from the live signal.
#[test]
fn holder_dropped_before_signal() {
    let signal: VoidSignal<()> = Signal::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let calls_clone = calls.clone();
    let scoped = ScopedConnection::from(signal.connect_same_thread(move || {
        calls_clone.fetch_add(1, Ordering::SeqCst);
    }));
    signal.emit(());
    drop(scoped);
    signal.emit(());

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(signal.is_empty());
}

/// Dropping one slot may drop a holder that disconnects another slot of the
/// same signal.
#[test]
fn dropping_a_slot_may_disconnect_another() {
    let signal: VoidSignal<()> = Signal::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let calls_clone = calls.clone();
    let inner = ScopedConnection::from(signal.connect_same_thread(move || {
        calls_clone.fetch_add(1, Ordering::SeqCst);
    }));
    let outer = signal.connect_same_thread(move || {
        let _keep = &inner;
    });
    assert_eq!(signal.len(), 2);

    outer.disconnect();
    assert!(signal.is_empty());
    signal.emit(());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// The default combiner keeps the last value, or none at all.
#[test]
fn default_combiner_returns_last_value() {
    let signal: Signal<(), i32> = Signal::new();
    assert_eq!(signal.emit(()), None);

    let list = ScopedConnectionList::new();
    list.add_connection(signal.connect_same_thread(|| 1));
    list.add_connection(signal.connect_same_thread(|| 2));
    list.add_connection(signal.connect_same_thread(|| 3));
    assert_eq!(signal.emit(()), Some(3));
}

/// Cross-context slots run only when their loop runs.
#[test]
fn cross_context_slot_runs_in_loop() {
    init_tracing();
    let signal: VoidSignal<(String,)> = Signal::new();
    let gui = Arc::new(QueuedEventLoop::new("gui"));
    let invalidator = Invalidator::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let log_clone = log.clone();
    let _c = ScopedConnection::from(signal.connect(
        move |name: String| log_clone.lock().unwrap().push(name),
        gui.clone(),
        Some(invalidator.record()),
    ));
    assert_eq!(invalidator.record().event_loop_name().as_deref(), Some("gui"));

    signal.emit(("bass".to_string(),));
    signal.emit(("drums".to_string(),));
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(gui.pending(), 2);
    assert_eq!(invalidator.record().pending_calls(), 2);

    assert_eq!(gui.run_pending(), 2);
    assert_eq!(*log.lock().unwrap(), vec!["bass", "drums"]);
    assert_eq!(invalidator.record().pending_calls(), 0);
}

/// Invalidating the record suppresses calls already queued.
#[test]
fn invalidated_record_suppresses_queued_calls() {
    let signal: VoidSignal<()> = Signal::new();
    let gui = Arc::new(QueuedEventLoop::new("gui"));
    let ran = Arc::new(AtomicBool::new(false));

    let invalidator = Invalidator::new();
    let record = invalidator.record();
    let ran_clone = ran.clone();
    let _c = ScopedConnection::from(signal.connect(
        move || ran_clone.store(true, Ordering::SeqCst),
        gui.clone(),
        Some(invalidator.record()),
    ));

    signal.emit(());
    drop(invalidator);
    signal.emit(());

    assert_eq!(gui.run_pending(), 0);
    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(record.pending_calls(), 0);
}

/// Without a record the call is always attempted.
#[test]
fn missing_invalidator_always_runs() {
    let signal: VoidSignal<(u8,)> = Signal::new();
    let worker = Arc::new(QueuedEventLoop::new("worker"));
    let total = Arc::new(AtomicUsize::new(0));

    let total_clone = total.clone();
    let _c = ScopedConnection::from(signal.connect(
        move |v: u8| {
            total_clone.fetch_add(v as usize, Ordering::SeqCst);
        },
        worker.clone(),
        None,
    ));

    signal.emit((4,));
    signal.emit((5,));
    assert_eq!(worker.run_pending(), 2);
    assert_eq!(total.load(Ordering::SeqCst), 9);
}

/// Emission from a plain thread, delivery on a tokio-hosted loop.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tokio_loop_receives_emissions_from_other_threads() {
    let signal: Arc<VoidSignal<(u32,)>> = Arc::new(Signal::new());
    let event_loop = Arc::new(TokioEventLoop::spawn(LoopConfig::named("audio-ui")).unwrap());
    let invalidator = Invalidator::new();
    let total = Arc::new(AtomicUsize::new(0));

    let total_clone = total.clone();
    let _c = ScopedConnection::from(signal.connect(
        move |v: u32| {
            total_clone.fetch_add(v as usize, Ordering::SeqCst);
        },
        event_loop.clone(),
        Some(invalidator.record()),
    ));

    let emitter = signal.clone();
    thread::spawn(move || {
        for v in 1..=10 {
            emitter.emit((v,));
        }
    })
    .join()
    .unwrap();

    event_loop.shutdown().await.unwrap();
    assert_eq!(total.load(Ordering::SeqCst), 55);
    assert_eq!(invalidator.record().pending_calls(), 0);
}

/// Concurrent connect, disconnect and emit never corrupt the table, and a
/// slot emitted strictly between its connect and disconnect is observed.
#[test]
fn concurrent_connect_disconnect_emit() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 200;

    let signal: VoidSignal<()> = Signal::new();
    let barrier = Barrier::new(THREADS);
    let missed = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                barrier.wait();
                for _ in 0..ROUNDS {
                    let seen = Arc::new(AtomicBool::new(false));
                    let seen_clone = seen.clone();
                    let conn = signal.connect_same_thread(move || {
                        seen_clone.store(true, Ordering::SeqCst);
                    });

                    signal.emit(());
                    if !seen.load(Ordering::SeqCst) {
                        missed.fetch_add(1, Ordering::SeqCst);
                    }

                    conn.disconnect();
                    assert!(!conn.is_connected());
                }
            });
        }
    });

    assert_eq!(missed.load(Ordering::SeqCst), 0);
    assert!(signal.is_empty());
    assert_eq!(signal.len(), 0);
}

/// Holders shared across threads tear down cleanly while emissions run.
#[test]
fn concurrent_holder_teardown() {
    const THREADS: usize = 4;

    let signal: Signal<(), usize> = Signal::new();
    let list = ScopedConnectionList::new();
    let stop = AtomicBool::new(false);

    thread::scope(|scope| {
        scope.spawn(|| {
            while !stop.load(Ordering::SeqCst) {
                let _ = signal.emit(());
            }
        });

        let adders: Vec<_> = (0..THREADS)
            .map(|i| {
                let signal = &signal;
                let list = &list;
                scope.spawn(move || {
                    for _ in 0..100 {
                        list.add_connection(signal.connect_same_thread(move || i));
                    }
                })
            })
            .collect();
        for adder in adders {
            adder.join().unwrap();
        }

        assert_eq!(list.len(), THREADS * 100);
        list.drop_connections();
        stop.store(true, Ordering::SeqCst);
    });

    assert!(signal.is_empty());
    assert_eq!(signal.emit(()), None);
}
