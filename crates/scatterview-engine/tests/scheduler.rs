use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use scatterview_engine::{GpuTaskScheduler, SchedulerConfig, SchedulerError};

fn scheduler() -> Arc<GpuTaskScheduler> {
    Arc::new(GpuTaskScheduler::new(&SchedulerConfig::default()).expect("spawn worker"))
}

// ── ordering ──────────────────────────────────────────────────────────────

#[test]
fn per_submitter_order_is_preserved() {
    let s = scheduler();
    let log = Arc::new(Mutex::new(Vec::<(usize, usize)>::new()));

    let submitters: Vec<_> = (0..4)
        .map(|t| {
            let s = Arc::clone(&s);
            let log = Arc::clone(&log);
            thread::spawn(move || {
                let handles: Vec<_> = (0..250)
                    .map(|i| {
                        let log = Arc::clone(&log);
                        s.submit(move || {
                            if let Ok(mut l) = log.lock() {
                                l.push((t, i));
                            }
                        })
                    })
                    .collect();
                handles.into_iter().all(|h| h.wait().is_ok())
            })
        })
        .collect();

    for t in submitters {
        assert!(t.join().expect("submitter thread"));
    }

    let log = log.lock().expect("log").clone();
    assert_eq!(log.len(), 1000);
    for t in 0..4 {
        let seq: Vec<usize> = log.iter().filter(|(who, _)| *who == t).map(|(_, i)| *i).collect();
        assert_eq!(seq, (0..250).collect::<Vec<_>>());
    }
}

#[test]
fn at_most_one_task_in_flight() {
    let s = scheduler();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..10_000)
        .map(|_| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            s.submit(move || {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                in_flight.fetch_sub(1, Ordering::SeqCst);
            })
        })
        .collect();

    assert!(handles.into_iter().all(|h| h.wait().is_ok()));
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

// ── async handles ─────────────────────────────────────────────────────────

#[test]
fn handle_is_a_future() {
    let s = scheduler();
    let v = pollster::block_on(async {
        let a = s.submit(|| 20).await?;
        let b = s.submit(move || a + 22).await?;
        Ok::<_, SchedulerError>(b)
    });
    assert_eq!(v.ok(), Some(42));
}

// ── shutdown ──────────────────────────────────────────────────────────────

#[test]
fn shutdown_drains_queued_work() {
    let s = scheduler();
    let done = Arc::new(AtomicUsize::new(0));
    for _ in 0..100 {
        let done = Arc::clone(&done);
        let _ = s.submit(move || {
            thread::sleep(Duration::from_micros(50));
            done.fetch_add(1, Ordering::SeqCst);
        });
    }
    s.shutdown();
    assert_eq!(done.load(Ordering::SeqCst), 100);
    assert!(matches!(s.submit(|| ()).wait(), Err(SchedulerError::Closed)));
}

#[test]
fn dropping_last_reference_joins_worker() {
    let done = Arc::new(AtomicUsize::new(0));
    {
        let s = scheduler();
        let d = Arc::clone(&done);
        let _ = s.submit(move || {
            thread::sleep(Duration::from_millis(5));
            d.fetch_add(1, Ordering::SeqCst);
        });
    }
    assert_eq!(done.load(Ordering::SeqCst), 1);
}

#[test]
fn panics_are_contained() {
    let s = scheduler();
    let results: Vec<_> = (0..5_usize)
        .map(|i| s.submit(move || if i % 2 == 0 { panic!("task {i}") } else { i }))
        .map(|h| h.wait())
        .collect();
    for (i, r) in results.into_iter().enumerate() {
        if i % 2 == 0 {
            assert!(matches!(r, Err(SchedulerError::TaskPanicked(ref m)) if m == &format!("task {i}")));
        } else {
            assert_eq!(r.ok(), Some(i));
        }
    }
    assert!(!s.is_closed());
}
