//! Type affinity example
//!
//! Dedicates workers to IO and compute jobs and shows which worker thread
//! picked up each job.
//!
//! Run with: cargo run --example type_affinity

use job_scheduler::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::init();
    println!("=== Job Scheduler - Type Affinity Example ===\n");

    // Worker 0 takes anything, worker 1 only IO/asset work, worker 2 only compute
    let config = SchedulerConfig::new(1)
        .with_workers([
            JobType::ANY,
            JobType::IO | JobType::ASSET,
            JobType::COMPUTE,
        ])
        .with_thread_name_prefix("affinity");
    let scheduler = Scheduler::init(config)?;

    let kinds = [
        ("read", JobType::IO),
        ("decode", JobType::ASSET),
        ("hash", JobType::COMPUTE),
        ("log", JobType::BACKGROUND),
    ];

    let done = Arc::new(AtomicUsize::new(0));
    let total = kinds.len() * 3;
    for round in 0..3 {
        for (name, job_type) in kinds {
            let done = Arc::clone(&done);
            scheduler.submit(
                Job::new(
                    move |_, _| {
                        println!(
                            "   {:<6} #{} ({:?}) ran on {}",
                            name,
                            round,
                            job_type,
                            thread::current().name().unwrap_or("?")
                        );
                        thread::sleep(Duration::from_millis(10));
                        Ok(())
                    },
                    &[],
                    0,
                )
                .with_type(job_type)
                .on_success(move |_| {
                    done.fetch_add(1, Ordering::SeqCst);
                }),
            )?;
        }
    }

    while done.load(Ordering::SeqCst) < total {
        scheduler.update();
        thread::sleep(Duration::from_millis(5));
    }

    println!("\nPer-worker job counts:");
    for (i, worker) in scheduler.worker_stats().iter().enumerate() {
        println!("   affinity-{}: {}", i, worker.get_jobs_executed());
    }

    scheduler.shutdown()?;
    println!("\n=== Example completed ===");
    Ok(())
}
