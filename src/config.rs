/// Number of event records carved out each time the pool runs dry.
pub const DEFAULT_ALLOC_CAP: usize = 1024;

/// Timer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerConfig {
    /// Instance name for logging
    pub name: String,

    /// Pool batch size, also the initial capacity
    pub alloc_cap: usize,
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig {
            name: "timer".to_string(),
            alloc_cap: DEFAULT_ALLOC_CAP,
        }
    }
}

impl TimerConfig {
    /// Set the instance name used in log lines.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the pool batch size.
    pub fn with_alloc_cap(mut self, alloc_cap: usize) -> Self {
        self.alloc_cap = alloc_cap;
        self
    }

    /// Batch size actually used by the pool; a zero batch could never satisfy an acquire.
    pub(crate) fn effective_alloc_cap(&self) -> usize {
        if self.alloc_cap == 0 {
            log::warn!(
                "Timer '{}' configured with alloc_cap 0, using 1 instead",
                self.name
            );
            1
        } else {
            self.alloc_cap
        }
    }
}
