//! # Heap Timer
//!
//! A timer-event manager for Rust built on top of Tokio.
//!
//! Many independent deferred callbacks share one alarm: events are kept in a
//! binary min-heap ordered by deadline, their records are recycled through a
//! free-list pool, and a single background wake loop sleeps until the earliest
//! deadline, fires everything that is due, and re-arms itself.
//!
//! ## Features
//!
//! - **Single wakeup source**: One Tokio task and one alarm, no matter how many events
//! - **Pooled records**: Event records are allocated in batches and reused
//! - **Generation-tagged handles**: Stale handles are detected instead of hitting recycled slots
//! - **Reentrant callbacks**: Callbacks run with the lock released and may add or cancel events
//! - **Graceful Shutdown**: Support for cancellation tokens and clean shutdowns
//! - **Pluggable time**: Clock and alarm are traits with Tokio-backed defaults
//!
//! ## Quick Start
//!
//! ```rust
//! use heap_timer::{Timer, TimerConfig};
//! use tokio_util::sync::CancellationToken;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cancel_token = CancellationToken::new();
//!
//!     let timer = Timer::new(
//!         TimerConfig::default().with_name("my_timer"),
//!         cancel_token.clone(),
//!     );
//!     timer.start()?;
//!
//!     let (tx, rx) = tokio::sync::oneshot::channel();
//!     let event = timer.add(Duration::from_millis(20), move || {
//!         let _ = tx.send(());
//!     });
//!
//!     // Push the deadline back a little
//!     timer.reschedule(&event, Duration::from_millis(30));
//!
//!     rx.await?;
//!     println!("Event fired!");
//!
//!     // Shutdown gracefully
//!     timer.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod alarm;
mod clock;
mod config;
mod error;
mod event;
mod heap;
mod pool;
mod timer;

pub use alarm::{Alarm, TokioAlarm, INFINITE_DURATION};
pub use clock::{Clock, TokioClock};
pub use config::{TimerConfig, DEFAULT_ALLOC_CAP};
pub use error::TimerError;
pub use event::{EventInfo, EventRef, ExpireFn};
pub use timer::Timer;

// Re-export commonly used types for convenience
pub use std::time::Duration;
pub use tokio_util::sync::CancellationToken;
