use thiserror::Error;

/// Failures reported by the timer lifecycle.
///
/// None of these are fatal; the timer state is left untouched when one is returned.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    #[error("timer has started")]
    Started,

    #[error("timer has not started")]
    NotStarted,

    #[error("timer has stopped")]
    Stopped,

    #[error("no tokio runtime available to drive the timer")]
    NoRuntime,
}
