use tokio::time::Instant;

/// Source of monotonic time used to compute event deadlines.
pub trait Clock: Send + Sync + 'static {
    /// Current monotonic time.
    fn now(&self) -> Instant;
}

/// Clock backed by the Tokio time driver.
///
/// Honours paused time (`tokio::time::pause`) in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
