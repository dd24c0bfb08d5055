use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::alarm::{Alarm, TokioAlarm, INFINITE_DURATION};
use crate::clock::{Clock, TokioClock};
use crate::config::TimerConfig;
use crate::error::TimerError;
use crate::event::{EventInfo, EventRef, ExpireFn};
use crate::heap::EventHeap;
use crate::pool::EventPool;

/// Stand-in deadline for TTLs too large for the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// A set of deferred callbacks driven by one background wake loop.
///
/// Events live in a min-heap keyed by deadline; their records are recycled
/// through a free-list pool. Cloning yields another handle to the same timer.
#[derive(Clone)]
pub struct Timer {
    shared: Arc<Shared>,
}

struct Shared {
    /// Instance name for logging
    name: String,

    /// Heap and pool, every mutation goes through this lock
    state: Mutex<State>,

    clock: Arc<dyn Clock>,
    alarm: Arc<dyn Alarm>,

    started: AtomicBool,
    stopped: AtomicBool,

    /// Child of the caller's token, cancelled by `stop`
    cancel_token: CancellationToken,

    /// Wake loop task, present once started
    task: Mutex<Option<JoinHandle<()>>>,
}

struct State {
    pool: EventPool,
    heap: EventHeap,
}

/// Background task owning the alarm.
///
/// Holds the timer weakly so dropping every [`Timer`] handle ends the loop.
struct WakeLoop {
    name: String,
    shared: Weak<Shared>,
    alarm: Arc<dyn Alarm>,
    cancel_token: CancellationToken,
}

impl Timer {
    /// Create a timer driven by the Tokio clock and timer.
    ///
    /// # Arguments
    /// * `config` - Instance name and pool batch size
    /// * `cancel_token` - Cancelling this token stops the wake loop
    pub fn new(config: TimerConfig, cancel_token: CancellationToken) -> Self {
        Self::with_driver(
            config,
            cancel_token,
            Arc::new(TokioClock),
            Arc::new(TokioAlarm::new()),
        )
    }

    /// Create a timer with a custom clock and alarm.
    pub fn with_driver(
        config: TimerConfig,
        cancel_token: CancellationToken,
        clock: Arc<dyn Clock>,
        alarm: Arc<dyn Alarm>,
    ) -> Self {
        let alloc_cap = config.effective_alloc_cap();
        let state = State {
            pool: EventPool::new(alloc_cap),
            heap: EventHeap::with_capacity(alloc_cap),
        };

        Timer {
            shared: Arc::new(Shared {
                name: config.name,
                state: Mutex::new(state),
                clock,
                alarm,
                started: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                cancel_token: cancel_token.child_token(),
                task: Mutex::new(None),
            }),
        }
    }

    /// Instance name used in log lines.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Schedule `callback` to run once `ttl` has elapsed.
    pub fn add<F>(&self, ttl: Duration, callback: F) -> EventRef
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.schedule(ttl, Some(Box::new(callback)))
    }

    /// Schedule an event with no callback.
    pub fn add_empty(&self, ttl: Duration) -> EventRef {
        self.shared.schedule(ttl, None)
    }

    /// Remove an event before it fires.
    ///
    /// Stale handles, including events that already fired, are ignored.
    pub fn cancel(&self, event: &EventRef) {
        let callback = {
            let mut state = self.shared.state.lock();
            let State { pool, heap } = &mut *state;
            if !pool.is_live(event) {
                return;
            }
            heap.remove(pool, event.index);
            let callback = pool[event.index].callback.take();
            pool.release(event.index);
            callback
        };
        // Callback state is dropped after unlocking.
        drop(callback);
        log::debug!("Event {:?} cancelled in timer '{}'", event, self.shared.name);
    }

    /// Move an event's deadline to `ttl` from now.
    ///
    /// Returns false if the event already fired or was cancelled.
    pub fn reschedule(&self, event: &EventRef, ttl: Duration) -> bool {
        let mut state = self.shared.state.lock();
        let State { pool, heap } = &mut *state;
        // The loop fires events under this same lock, so a live handle cannot
        // be recycled between this check and the removal below.
        if !pool.is_live(event) {
            return false;
        }
        heap.remove(pool, event.index);

        let now = self.shared.clock.now();
        pool[event.index].ttl = ttl;
        pool[event.index].expire = deadline_after(now, ttl);
        if heap.insert(pool, event.index) {
            self.shared.alarm.arm(pool[event.index].delay(now));
        }
        true
    }

    /// Time left before the event fires, `None` for stale handles.
    pub fn remaining(&self, event: &EventRef) -> Option<Duration> {
        let state = self.shared.state.lock();
        state
            .pool
            .is_live(event)
            .then(|| state.pool[event.index].delay(self.shared.clock.now()))
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.shared.state.lock().heap.len()
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().heap.is_empty()
    }

    /// Copy of the pending events in heap order, root first.
    pub fn snapshot(&self) -> Vec<EventInfo> {
        let state = self.shared.state.lock();
        state
            .heap
            .iter()
            .map(|index| state.pool[index].info())
            .collect()
    }

    /// Number of event records allocated so far, live or pooled.
    pub fn capacity(&self) -> usize {
        self.shared.state.lock().pool.capacity()
    }

    /// Spawn the wake loop on the current Tokio runtime.
    pub fn start(&self) -> Result<(), TimerError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| TimerError::NoRuntime)?;

        if self.shared.started.load(Ordering::Acquire) {
            return Err(TimerError::Started);
        }
        // A cancelled caller token leaves the timer stopped before it ever ran.
        if self.shared.cancel_token.is_cancelled() {
            self.shared.stopped.store(true, Ordering::Release);
            return Err(TimerError::Stopped);
        }

        if self
            .shared
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TimerError::Started);
        }

        let wake_loop = WakeLoop {
            name: self.shared.name.clone(),
            shared: Arc::downgrade(&self.shared),
            alarm: self.shared.alarm.clone(),
            cancel_token: self.shared.cancel_token.clone(),
        };
        let task = runtime.spawn(wake_loop.run());
        *self.shared.task.lock() = Some(task);
        Ok(())
    }

    /// Signal the wake loop to exit. Pending events never fire afterwards.
    pub fn stop(&self) -> Result<(), TimerError> {
        if self.shared.cancel_token.is_cancelled() {
            self.shared.stopped.store(true, Ordering::Release);
            return Err(TimerError::Stopped);
        }
        if !self.shared.started.load(Ordering::Acquire) {
            return Err(TimerError::NotStarted);
        }
        if self
            .shared
            .stopped
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TimerError::Stopped);
        }

        self.shared.cancel_token.cancel();
        Ok(())
    }

    /// Stop the timer and wait for the wake loop to exit.
    pub async fn shutdown(&self) -> Result<(), TimerError> {
        self.stop()?;

        let task = self.shared.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                log::warn!("Timer '{}' wake loop ended abnormally: {}", self.shared.name, e);
            }
        }
        Ok(())
    }

    /// Whether `start` has spawned the wake loop.
    pub fn is_started(&self) -> bool {
        self.shared.started.load(Ordering::Acquire)
    }

    /// Whether the timer was stopped, by `stop` or by its caller's token.
    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::Acquire) || self.shared.cancel_token.is_cancelled()
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("name", &self.shared.name)
            .field("len", &self.len())
            .field("started", &self.is_started())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl Shared {
    fn schedule(&self, ttl: Duration, callback: Option<ExpireFn>) -> EventRef {
        let mut state = self.state.lock();
        let State { pool, heap } = &mut *state;

        let now = self.clock.now();
        let index = pool.acquire();
        let event = &mut pool[index];
        event.ttl = ttl;
        event.expire = deadline_after(now, ttl);
        event.callback = callback;

        if heap.insert(pool, index) {
            // New minimum, the loop may be sleeping towards a later deadline.
            self.alarm.arm(pool[index].delay(now));
        }

        let handle = pool.handle(index);
        log::debug!(
            "Event {:?} set in timer '{}' to expire in {:?}",
            handle,
            self.name,
            ttl
        );
        handle
    }

    /// Fire every due event, then rearm the alarm for the next deadline.
    fn expire(&self) {
        let mut state = self.state.lock();
        let delay = loop {
            let Some(index) = state.heap.peek() else {
                break INFINITE_DURATION;
            };
            let delay = state.pool[index].delay(self.clock.now());
            if !delay.is_zero() {
                break delay;
            }

            let State { pool, heap } = &mut *state;
            heap.remove(pool, index);
            let handle = pool.handle(index);
            let callback = pool[index].callback.take();
            pool.release(index);
            log::debug!("Event {:?} expired in timer '{}'", handle, self.name);

            if let Some(callback) = callback {
                MutexGuard::unlocked(&mut state, || self.run_callback(callback));
            }
        };

        self.alarm.arm(delay);
    }

    fn run_callback(&self, callback: ExpireFn) {
        if panic::catch_unwind(AssertUnwindSafe(callback)).is_err() {
            log::error!("Event callback panicked in timer '{}'", self.name);
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl WakeLoop {
    async fn run(self) {
        log::info!("Timer '{}' started", self.name);

        loop {
            tokio::select! {
                biased;

                _ = self.cancel_token.cancelled() => {
                    self.alarm.disarm();
                    log::info!("Timer '{}' cancelled via token", self.name);
                    break;
                },

                _ = self.alarm.fired() => {
                    let Some(shared) = self.shared.upgrade() else {
                        log::info!("Timer '{}' shutting down - all handles dropped", self.name);
                        break;
                    };
                    shared.expire();
                },
            }
        }

        log::info!("Timer '{}' stopped", self.name);
    }
}

fn deadline_after(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl).unwrap_or_else(|| now + FAR_FUTURE)
}
