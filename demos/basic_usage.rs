//! Basic scheduler usage example
//!
//! Drives `submit`/`update` from a fixed-rate main loop, the way a game or
//! UI thread would, and prints the statistics at the end.
//!
//! Run with: cargo run --example basic_usage

use job_scheduler::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const JOBS: usize = 20;

fn main() -> Result<()> {
    env_logger::init();
    println!("=== Job Scheduler - Basic Usage Example ===\n");

    let scheduler = Scheduler::init(SchedulerConfig::new(4).with_thread_name_prefix("demo"))?;
    println!("1. Started scheduler with {} workers", scheduler.num_workers());

    println!("\n2. Submitting {} jobs:", JOBS);
    let finished = Arc::new(AtomicUsize::new(0));
    for i in 0..JOBS {
        let priority = match i % 4 {
            0 => Priority::High,
            1 | 2 => Priority::Normal,
            _ => Priority::Low,
        };
        let ok_count = Arc::clone(&finished);
        let fail_count = Arc::clone(&finished);

        scheduler.submit(
            Job::new(
                |params, result| {
                    let n = u32::from_le_bytes([params[0], params[1], params[2], params[3]]);
                    if n % 7 == 6 {
                        return Err(SchedulerError::other(format!("{} is unlucky", n)));
                    }
                    thread::sleep(Duration::from_millis(20));
                    result.copy_from_slice(&(n * n).to_le_bytes());
                    Ok(())
                },
                &(i as u32).to_le_bytes(),
                4,
            )
            .with_name(format!("square-{}", i))
            .with_priority(priority)
            .on_success(move |result| {
                let square = u32::from_le_bytes([result[0], result[1], result[2], result[3]]);
                println!("   {:>3}^2 = {}", i, square);
                ok_count.fetch_add(1, Ordering::SeqCst);
            })
            .on_fail(move |_| {
                println!("   job {} failed", i);
                fail_count.fetch_add(1, Ordering::SeqCst);
            }),
        )?;
    }

    println!("\n3. Ticking the main loop:");
    let mut ticks = 0;
    while finished.load(Ordering::SeqCst) < JOBS {
        scheduler.update();
        ticks += 1;
        thread::sleep(Duration::from_millis(16));
    }
    println!("   All callbacks delivered after {} ticks", ticks);

    println!("\n4. Statistics:");
    let stats = scheduler.stats();
    println!("   Submitted:  {}", stats.jobs_submitted);
    println!("   Fast path:  {}", stats.jobs_fast_path);
    println!("   Dispatched: {}", stats.jobs_dispatched);
    println!("   Succeeded:  {}", stats.jobs_succeeded);
    println!("   Failed:     {}", stats.jobs_failed);
    for (i, worker) in scheduler.worker_stats().iter().enumerate() {
        println!(
            "   Worker {}: {} jobs, {:.1} us average",
            i,
            worker.get_jobs_executed(),
            worker.get_average_processing_time_us()
        );
    }

    scheduler.shutdown()?;
    println!("\n=== Example completed ===");
    Ok(())
}
