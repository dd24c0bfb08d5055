use async_trait::async_trait;
use futures::future::{self, Either};
use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Delay meaning "never fire", used when no event is pending.
pub const INFINITE_DURATION: Duration = Duration::MAX;

/// Resettable one-shot alarm the wake loop sleeps on.
#[async_trait]
pub trait Alarm: Send + Sync + 'static {
    /// Replace any pending firing with one after `delay`.
    ///
    /// [`INFINITE_DURATION`], or any delay that overflows the clock, leaves the alarm idle.
    fn arm(&self, delay: Duration);

    /// Drop the pending firing, if any.
    fn disarm(&self);

    /// Resolves once the armed deadline passes. Re-arming while waiting moves the deadline.
    async fn fired(&self);
}

/// [`Alarm`] built on the Tokio timer.
#[derive(Debug, Default)]
pub struct TokioAlarm {
    deadline: Mutex<Option<Instant>>,
    rearmed: Notify,
}

impl TokioAlarm {
    /// Create an idle alarm.
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently armed deadline.
    pub fn deadline(&self) -> Option<Instant> {
        *self.deadline.lock()
    }

    fn set(&self, deadline: Option<Instant>) {
        *self.deadline.lock() = deadline;
        self.rearmed.notify_one();
    }
}

#[async_trait]
impl Alarm for TokioAlarm {
    fn arm(&self, delay: Duration) {
        let deadline = if delay == INFINITE_DURATION {
            None
        } else {
            Instant::now().checked_add(delay)
        };
        log::trace!("Alarm armed for {:?}", deadline);
        self.set(deadline);
    }

    fn disarm(&self) {
        self.set(None);
    }

    async fn fired(&self) {
        loop {
            let deadline = self.deadline();
            let sleep = match deadline {
                Some(at) => Either::Left(tokio::time::sleep_until(at)),
                None => Either::Right(future::pending::<()>()),
            };

            tokio::select! {
                _ = self.rearmed.notified() => continue,
                _ = sleep => {
                    let mut current = self.deadline.lock();
                    // One shot: consume the deadline unless it moved while we slept.
                    if *current == deadline {
                        *current = None;
                        return;
                    }
                }
            }
        }
    }
}
