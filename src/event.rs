use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Action run once when an event expires.
pub type ExpireFn = Box<dyn FnOnce() + Send + 'static>;

/// Free-list terminator.
pub(crate) const NIL: usize = usize::MAX;

/// One event record, either live in the heap or parked in the pool.
pub(crate) struct Event {
    /// Requested time to live, kept for introspection only
    pub(crate) ttl: Duration,

    /// Absolute deadline
    pub(crate) expire: Instant,

    pub(crate) callback: Option<ExpireFn>,

    /// Position in the heap array, `None` when not a heap member
    pub(crate) heap_index: Option<usize>,

    /// Live and caller visible, as opposed to sitting in the free list
    pub(crate) active: bool,

    /// Bumped on every release
    pub(crate) generation: u64,

    /// Next free slot, only meaningful while pooled
    pub(crate) next_free: usize,
}

impl Event {
    pub(crate) fn vacant(expire: Instant, next_free: usize) -> Self {
        Event {
            ttl: Duration::ZERO,
            expire,
            callback: None,
            heap_index: None,
            active: false,
            generation: 0,
            next_free,
        }
    }

    pub(crate) fn less(&self, other: &Event) -> bool {
        self.expire < other.expire
    }

    /// Time left until the deadline, zero once it has passed.
    pub(crate) fn delay(&self, now: Instant) -> Duration {
        self.expire.saturating_duration_since(now)
    }

    pub(crate) fn info(&self) -> EventInfo {
        EventInfo {
            heap_index: self.heap_index,
            ttl: self.ttl,
            expire: self.expire,
        }
    }
}

/// Opaque handle to a scheduled event.
///
/// The handle stays valid until the event fires or is cancelled. After that the
/// slot may be recycled for another event; the generation tag makes such stale
/// handles inert for [`Timer::cancel`](crate::Timer::cancel) and
/// [`Timer::reschedule`](crate::Timer::reschedule).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventRef {
    pub(crate) index: usize,
    pub(crate) generation: u64,
}

/// Read-only copy of a live event, as returned by [`Timer::snapshot`](crate::Timer::snapshot).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventInfo {
    pub heap_index: Option<usize>,
    pub ttl: Duration,
    pub expire: Instant,
}

impl fmt::Display for EventInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.heap_index {
            Some(index) => write!(f, "index {} ", index)?,
            None => write!(f, "detached ")?,
        }
        write!(f, "ttl {:?}, expire at {:?}", self.ttl, self.expire)
    }
}
