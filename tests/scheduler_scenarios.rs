//! End-to-end scheduling scenarios: dispatch order, affinity, callbacks and shutdown

use job_scheduler::prelude::*;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const DEADLINE: Duration = Duration::from_secs(5);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config(masks: &[JobType]) -> SchedulerConfig {
    SchedulerConfig::new(1)
        .with_workers(masks.iter().copied())
        .with_poll_interval(Duration::from_millis(1))
        .with_thread_name_prefix("scenario")
}

/// Sleep until `condition` holds, without ticking the scheduler
fn wait_for<F: Fn() -> bool>(condition: F) {
    let start = Instant::now();
    while !condition() {
        assert!(start.elapsed() < DEADLINE, "condition not reached in time");
        thread::sleep(Duration::from_millis(1));
    }
}

/// Tick the scheduler until `condition` holds
fn pump_until<F: Fn() -> bool>(scheduler: &Scheduler, condition: F) {
    let start = Instant::now();
    while !condition() {
        assert!(start.elapsed() < DEADLINE, "condition not reached in time");
        scheduler.update();
        thread::sleep(Duration::from_millis(1));
    }
}

/// A job that blocks its worker until `gate` opens
fn gated_job(gate: &Arc<AtomicBool>) -> Job {
    let gate = Arc::clone(gate);
    Job::new(
        move |_, _| {
            while !gate.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
            Ok(())
        },
        &[],
        0,
    )
}

fn recording_job(order: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> Job {
    let order = Arc::clone(order);
    Job::new(
        move |_, _| {
            order.lock().push(label);
            Ok(())
        },
        &[],
        0,
    )
}

// ============================================================================
// Dispatch
// ============================================================================

#[test]
fn test_high_priority_starts_before_update() {
    init_logging();
    let scheduler = Scheduler::init(config(&[JobType::ANY])).unwrap();

    let started = Arc::new(AtomicBool::new(false));
    let started_clone = Arc::clone(&started);
    scheduler
        .submit(
            Job::new(
                move |_, _| {
                    started_clone.store(true, Ordering::SeqCst);
                    Ok(())
                },
                &[],
                0,
            )
            .with_priority(Priority::High),
        )
        .unwrap();

    wait_for(|| started.load(Ordering::SeqCst));
    assert_eq!(scheduler.stats().jobs_fast_path, 1);

    scheduler.shutdown().unwrap();
}

#[test]
fn test_one_worker_dispatches_one_job_per_free_slot() {
    init_logging();
    let scheduler = Scheduler::init(config(&[JobType::ANY])).unwrap();
    let gate = Arc::new(AtomicBool::new(false));

    for _ in 0..3 {
        scheduler.submit(gated_job(&gate)).unwrap();
    }
    assert_eq!(scheduler.queue_len(Priority::Normal), 3);

    scheduler.update();
    assert_eq!(scheduler.queue_len(Priority::Normal), 2);
    assert_eq!(scheduler.stats().jobs_dispatched, 1);

    // Worker still busy: nothing more leaves the queue
    scheduler.update();
    assert_eq!(scheduler.queue_len(Priority::Normal), 2);

    gate.store(true, Ordering::SeqCst);
    wait_for(|| scheduler.idle_workers() == 1);
    gate.store(false, Ordering::SeqCst);

    scheduler.update();
    assert_eq!(scheduler.stats().jobs_dispatched, 2);
    assert_eq!(scheduler.queue_len(Priority::Normal), 1);

    gate.store(true, Ordering::SeqCst);
    pump_until(&scheduler, || scheduler.stats().jobs_executed() == 3);

    scheduler.shutdown().unwrap();
}

#[test]
fn test_high_is_dispatched_before_normal_and_low() {
    init_logging();
    let scheduler = Scheduler::init(config(&[JobType::ANY])).unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));

    // Occupy the only worker so the next jobs are all queued
    let blocker_gate = Arc::new(AtomicBool::new(false));
    scheduler
        .submit(gated_job(&blocker_gate).with_priority(Priority::High))
        .unwrap();
    wait_for(|| scheduler.idle_workers() == 0);

    let high_gate = Arc::new(AtomicBool::new(false));
    let high_order = Arc::clone(&order);
    let high_gate_clone = Arc::clone(&high_gate);
    let high = Job::new(
        move |_, _| {
            high_order.lock().push("high");
            while !high_gate_clone.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
            Ok(())
        },
        &[],
        0,
    )
    .with_priority(Priority::High);

    scheduler
        .submit(recording_job(&order, "low").with_priority(Priority::Low))
        .unwrap();
    scheduler.submit(recording_job(&order, "normal")).unwrap();
    scheduler.submit(high).unwrap();
    assert_eq!(scheduler.queue_len(Priority::High), 1);

    blocker_gate.store(true, Ordering::SeqCst);
    wait_for(|| scheduler.idle_workers() == 1);

    scheduler.update();
    assert_eq!(scheduler.queue_len(Priority::High), 0);
    assert_eq!(scheduler.queue_len(Priority::Normal), 1);
    assert_eq!(scheduler.queue_len(Priority::Low), 1);

    high_gate.store(true, Ordering::SeqCst);
    pump_until(&scheduler, || order.lock().len() == 3);
    assert_eq!(*order.lock(), vec!["high", "normal", "low"]);

    scheduler.shutdown().unwrap();
}

#[test]
fn test_same_priority_is_fifo() {
    init_logging();
    let scheduler = Scheduler::init(config(&[JobType::ANY])).unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));

    let labels = ["a", "b", "c", "d", "e"];
    for label in labels {
        scheduler.submit(recording_job(&order, label)).unwrap();
    }

    pump_until(&scheduler, || order.lock().len() == labels.len());
    assert_eq!(*order.lock(), labels.to_vec());

    scheduler.shutdown().unwrap();
}

#[test]
fn test_blocked_head_stops_its_level() {
    init_logging();
    let scheduler = Scheduler::init(config(&[JobType::IO])).unwrap();
    let ran = Arc::new(AtomicBool::new(false));
    let ran_clone = Arc::clone(&ran);

    // No worker accepts COMPUTE, so the IO job behind it waits as well
    scheduler
        .submit(Job::new(|_, _| Ok(()), &[], 0).with_type(JobType::COMPUTE))
        .unwrap();
    scheduler
        .submit(
            Job::new(
                move |_, _| {
                    ran_clone.store(true, Ordering::SeqCst);
                    Ok(())
                },
                &[],
                0,
            )
            .with_type(JobType::IO),
        )
        .unwrap();

    for _ in 0..5 {
        scheduler.update();
    }
    assert_eq!(scheduler.queue_len(Priority::Normal), 2);
    assert!(!ran.load(Ordering::SeqCst));

    scheduler.shutdown().unwrap();
}

// ============================================================================
// Affinity
// ============================================================================

#[test]
fn test_jobs_only_run_on_matching_workers() {
    init_logging();
    let scheduler = Scheduler::init(config(&[JobType::IO, JobType::COMPUTE])).unwrap();
    let runs = Arc::new(Mutex::new(Vec::new()));

    for i in 0..20 {
        let job_type = if i % 2 == 0 {
            JobType::IO
        } else {
            JobType::COMPUTE
        };
        let runs = Arc::clone(&runs);
        let priority = if i % 3 == 0 {
            Priority::High
        } else {
            Priority::Normal
        };
        scheduler
            .submit(
                Job::new(
                    move |_, _| {
                        let name = thread::current().name().unwrap_or_default().to_string();
                        runs.lock().push((job_type, name));
                        Ok(())
                    },
                    &[],
                    0,
                )
                .with_type(job_type)
                .with_priority(priority),
            )
            .unwrap();
    }

    pump_until(&scheduler, || runs.lock().len() == 20);
    for (job_type, worker) in runs.lock().iter() {
        let expected = if *job_type == JobType::IO {
            "scenario-0"
        } else {
            "scenario-1"
        };
        assert_eq!(worker, expected, "{:?} job ran on {}", job_type, worker);
    }

    scheduler.shutdown().unwrap();
}

#[test]
fn test_multi_type_job_runs_on_any_matching_worker() {
    init_logging();
    let scheduler = Scheduler::init(config(&[JobType::ASSET])).unwrap();
    let done = Arc::new(AtomicBool::new(false));
    let done_clone = Arc::clone(&done);

    scheduler
        .submit(
            Job::new(|_, _| Ok(()), &[], 0)
                .with_type(JobType::IO | JobType::ASSET)
                .on_success(move |_| done_clone.store(true, Ordering::SeqCst)),
        )
        .unwrap();

    pump_until(&scheduler, || done.load(Ordering::SeqCst));
    scheduler.shutdown().unwrap();
}

// ============================================================================
// Buffers and callbacks
// ============================================================================

#[test]
fn test_params_reach_entry_point_unchanged() {
    init_logging();
    let scheduler = Scheduler::init(config(&[JobType::ANY])).unwrap();
    let params: Vec<u8> = (0..=255).collect();
    let expected = params.clone();
    let received = Arc::new(Mutex::new(None));
    let received_clone = Arc::clone(&received);

    scheduler
        .submit(
            Job::new(
                |params, result| {
                    result.copy_from_slice(params);
                    Ok(())
                },
                &params,
                params.len(),
            )
            .on_success(move |result| *received_clone.lock() = Some(result.to_vec())),
        )
        .unwrap();
    drop(params);

    pump_until(&scheduler, || received.lock().is_some());
    let got = received.lock().clone();
    assert_eq!(got.as_deref(), Some(&expected[..]));

    scheduler.shutdown().unwrap();
}

#[test]
fn test_failure_fires_on_fail_once_with_result_bytes() {
    init_logging();
    let scheduler = Scheduler::init(config(&[JobType::ANY])).unwrap();
    let failures = Arc::new(Mutex::new(Vec::new()));
    let failures_clone = Arc::clone(&failures);

    scheduler
        .submit(
            Job::new(
                |_, result| {
                    result.copy_from_slice(&[0xAB, 0xCD]);
                    Err(SchedulerError::other("decode failed"))
                },
                &[],
                2,
            )
            .on_fail(move |result| failures_clone.lock().push(result.to_vec())),
        )
        .unwrap();

    pump_until(&scheduler, || !failures.lock().is_empty());
    for _ in 0..5 {
        scheduler.update();
    }

    assert_eq!(*failures.lock(), vec![vec![0xAB, 0xCD]]);
    assert_eq!(scheduler.stats().jobs_failed, 1);

    scheduler.shutdown().unwrap();
}

#[test]
fn test_panicking_job_routes_to_on_fail() {
    init_logging();
    let scheduler = Scheduler::init(config(&[JobType::ANY])).unwrap();
    let succeeded = Arc::new(AtomicBool::new(false));
    let failed = Arc::new(AtomicUsize::new(0));
    let succeeded_clone = Arc::clone(&succeeded);
    let failed_clone = Arc::clone(&failed);

    scheduler
        .submit(
            Job::new(|_, _| panic!("corrupt asset"), &[], 0)
                .on_success(move |_| succeeded_clone.store(true, Ordering::SeqCst))
                .on_fail(move |_| {
                    failed_clone.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .unwrap();

    pump_until(&scheduler, || failed.load(Ordering::SeqCst) == 1);
    assert!(!succeeded.load(Ordering::SeqCst));
    assert_eq!(scheduler.stats().jobs_panicked, 1);

    // The worker survives the panic
    let after = Arc::new(AtomicBool::new(false));
    let after_clone = Arc::clone(&after);
    scheduler
        .submit(
            Job::new(|_, _| Ok(()), &[], 0)
                .on_success(move |_| after_clone.store(true, Ordering::SeqCst)),
        )
        .unwrap();
    pump_until(&scheduler, || after.load(Ordering::SeqCst));

    scheduler.shutdown().unwrap();
}

#[test]
fn test_panicking_callback_does_not_lose_other_results() {
    init_logging();
    let scheduler = Scheduler::init(config(&[JobType::ANY, JobType::ANY])).unwrap();
    let good_calls = Arc::new(AtomicUsize::new(0));
    let good_calls_clone = Arc::clone(&good_calls);

    scheduler
        .submit(
            Job::new(|_, _| Ok(()), &[], 0)
                .with_priority(Priority::High)
                .on_success(|_| panic!("callback bug")),
        )
        .unwrap();
    scheduler
        .submit(
            Job::new(|_, _| Ok(()), &[], 0)
                .with_priority(Priority::High)
                .on_success(move |_| {
                    good_calls_clone.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .unwrap();

    // Both results land in the same tick
    wait_for(|| scheduler.pending_results() == 2);
    scheduler.update();

    assert_eq!(good_calls.load(Ordering::SeqCst), 1);
    let stats = scheduler.stats();
    assert_eq!(stats.callbacks_panicked, 1);
    assert_eq!(stats.results_delivered, 1);
    assert_eq!(scheduler.pending_results(), 0);

    // The scheduler keeps ticking normally afterwards
    for _ in 0..5 {
        scheduler.update();
    }
    assert_eq!(good_calls.load(Ordering::SeqCst), 1);

    scheduler.shutdown().unwrap();
}

#[test]
fn test_callbacks_run_on_update_thread() {
    init_logging();
    let scheduler = Scheduler::init(config(&[JobType::ANY, JobType::ANY])).unwrap();
    let producer = thread::current().id();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for i in 0..10 {
        let seen = Arc::clone(&seen);
        let job = Job::new(
            move |_, _| {
                if i % 2 == 0 {
                    Ok(())
                } else {
                    Err(SchedulerError::other("odd"))
                }
            },
            &[],
            0,
        );
        let fail_seen = Arc::clone(&seen);
        scheduler
            .submit(
                job.on_success(move |_| seen.lock().push(thread::current().id()))
                    .on_fail(move |_| fail_seen.lock().push(thread::current().id())),
            )
            .unwrap();
    }

    pump_until(&scheduler, || seen.lock().len() == 10);
    assert!(seen.lock().iter().all(|id| *id == producer));

    scheduler.shutdown().unwrap();
}

#[test]
fn test_each_callback_delivered_exactly_once() {
    init_logging();
    let scheduler = Scheduler::init(config(&[JobType::ANY; 4])).unwrap();
    let successes = Arc::new(AtomicUsize::new(0));
    let failures = Arc::new(AtomicUsize::new(0));
    const JOBS: usize = 200;

    for i in 0..JOBS {
        let successes = Arc::clone(&successes);
        let failures = Arc::clone(&failures);
        let priority = match i % 3 {
            0 => Priority::Low,
            1 => Priority::Normal,
            _ => Priority::High,
        };
        scheduler
            .submit(
                Job::new(|_, _| Ok(()), &[], 0)
                    .with_priority(priority)
                    .on_success(move |_| {
                        successes.fetch_add(1, Ordering::SeqCst);
                    })
                    .on_fail(move |_| {
                        failures.fetch_add(1, Ordering::SeqCst);
                    }),
            )
            .unwrap();
    }

    pump_until(&scheduler, || successes.load(Ordering::SeqCst) == JOBS);
    for _ in 0..10 {
        scheduler.update();
        thread::sleep(Duration::from_millis(1));
    }

    assert_eq!(successes.load(Ordering::SeqCst), JOBS);
    assert_eq!(failures.load(Ordering::SeqCst), 0);
    assert_eq!(scheduler.stats().results_delivered, JOBS as u64);

    scheduler.shutdown().unwrap();
}

// ============================================================================
// Capacity
// ============================================================================

#[test]
fn test_queue_overflow_drops_excess_submissions() {
    init_logging();
    let scheduler = Scheduler::init(config(&[JobType::ANY])).unwrap();
    let capacity = scheduler.config().queue_capacity;

    // Without update() nothing leaves the Normal queue
    for _ in 0..capacity + 1 {
        scheduler.submit(Job::new(|_, _| Ok(()), &[], 0)).unwrap();
    }

    assert_eq!(capacity, 1024);
    assert_eq!(scheduler.queue_len(Priority::Normal), capacity);
    let stats = scheduler.stats();
    assert_eq!(stats.jobs_submitted, capacity as u64 + 1);
    assert_eq!(stats.jobs_dropped, 1);

    // Other levels keep accepting work
    scheduler
        .try_submit(Job::new(|_, _| Ok(()), &[], 0).with_priority(Priority::Low))
        .unwrap();

    scheduler.shutdown().unwrap();
}

#[test]
fn test_try_submit_reports_overflow() {
    init_logging();
    let scheduler = Scheduler::init(config(&[JobType::IO]).with_queue_capacity(2)).unwrap();
    let job = || Job::new(|_, _| Ok(()), &[], 0).with_type(JobType::COMPUTE);

    scheduler.try_submit(job()).unwrap();
    scheduler.try_submit(job()).unwrap();
    let err = scheduler.try_submit(job()).unwrap_err();
    assert!(matches!(err, SchedulerError::QueueFull { capacity: 2, .. }));

    scheduler.shutdown().unwrap();
}

#[test]
fn test_full_result_table_loses_results() {
    init_logging();
    let scheduler = Scheduler::init(
        config(&[JobType::ANY, JobType::ANY]).with_result_capacity(1),
    )
    .unwrap();
    let delivered = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let delivered = Arc::clone(&delivered);
        scheduler
            .submit(
                Job::new(|_, _| Ok(()), &[], 0)
                    .with_priority(Priority::High)
                    .on_success(move |_| {
                        delivered.fetch_add(1, Ordering::SeqCst);
                    }),
            )
            .unwrap();
    }

    // Do not tick until both workers finished, so the table overflows
    wait_for(|| scheduler.stats().jobs_executed() == 2);
    wait_for(|| scheduler.stats().results_lost == 1);

    scheduler.update();
    assert_eq!(delivered.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.pending_results(), 0);

    scheduler.shutdown().unwrap();
}

// ============================================================================
// Shutdown
// ============================================================================

#[test]
fn test_submit_after_shutdown_fails() {
    init_logging();
    let scheduler = Scheduler::init(config(&[JobType::ANY])).unwrap();
    scheduler.shutdown().unwrap();
    scheduler.shutdown().unwrap();

    assert!(!scheduler.is_running());
    let err = scheduler
        .submit(Job::new(|_, _| Ok(()), &[], 0))
        .unwrap_err();
    assert!(matches!(err, SchedulerError::NotRunning { .. }));
}

#[test]
fn test_shutdown_does_not_wait_for_stuck_job() {
    init_logging();
    let scheduler = Scheduler::init(
        config(&[JobType::ANY]).with_join_timeout(Duration::from_millis(50)),
    )
    .unwrap();
    let called = Arc::new(AtomicBool::new(false));
    let called_clone = Arc::clone(&called);

    scheduler
        .submit(
            Job::new(
                |_, _| {
                    thread::sleep(Duration::from_secs(2));
                    Ok(())
                },
                &[],
                0,
            )
            .with_priority(Priority::High)
            .on_success(move |_| called_clone.store(true, Ordering::SeqCst)),
        )
        .unwrap();
    wait_for(|| scheduler.idle_workers() == 0);

    let start = Instant::now();
    scheduler.shutdown().unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));

    scheduler.update();
    assert!(!called.load(Ordering::SeqCst));
}

#[test]
fn test_drop_stops_workers() {
    init_logging();
    let counter = Arc::new(AtomicUsize::new(0));
    {
        let scheduler = Scheduler::init(config(&[JobType::ANY, JobType::ANY])).unwrap();
        for _ in 0..4 {
            let counter = Arc::clone(&counter);
            scheduler
                .submit(
                    Job::new(
                        move |_, _| {
                            counter.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        },
                        &[],
                        0,
                    )
                    .with_priority(Priority::High),
                )
                .unwrap();
        }
        scheduler.update();
    }

    // Entry points own the only other clones; all are gone once workers exit
    wait_for(|| Arc::strong_count(&counter) == 1);
}
