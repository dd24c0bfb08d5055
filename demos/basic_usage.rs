//! Basic usage example for the heap timer

use heap_timer::{CancellationToken, Duration, Timer, TimerConfig};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    let cancel_token = CancellationToken::new();

    let timer = Timer::new(
        TimerConfig::default()
            .with_name("example_timer")
            .with_alloc_cap(64),
        cancel_token.clone(),
    );
    timer.start()?;

    let (tx, mut rx) = mpsc::unbounded_channel();

    // Schedule multiple events
    for (name, secs) in [("long_timer", 3), ("short_timer", 1), ("medium_timer", 2)] {
        let tx = tx.clone();
        timer.add(Duration::from_secs(secs), move || {
            let _ = tx.send(name);
        });
    }

    println!("Events scheduled! Pending: {}", timer.len());
    for info in timer.snapshot() {
        println!("  {}", info);
    }

    // Wait for the events to fire
    for _ in 0..3 {
        if let Some(name) = rx.recv().await {
            println!("Timer '{}' expired!", name);
        }
    }

    // Demonstrate cancellation
    let tx_cancelled = tx.clone();
    let cancelled = timer.add(Duration::from_secs(10), move || {
        let _ = tx_cancelled.send("cancelled_timer");
    });
    println!("Scheduled an event that will be cancelled...");

    tokio::time::sleep(Duration::from_millis(100)).await;
    timer.cancel(&cancelled);
    println!("Event cancelled! Pending: {}", timer.len());

    // Demonstrate rescheduling
    let rescheduled = timer.add(Duration::from_secs(10), move || {
        let _ = tx.send("rescheduled_timer");
    });
    timer.reschedule(&rescheduled, Duration::from_millis(500));
    if let Some(name) = rx.recv().await {
        println!("Timer '{}' expired early!", name);
    }
    println!(
        "Rescheduling a fired event succeeds? {}",
        timer.reschedule(&rescheduled, Duration::from_secs(1))
    );

    // Shutdown gracefully
    timer.shutdown().await?;

    println!("Timer shut down successfully!");
    Ok(())
}
