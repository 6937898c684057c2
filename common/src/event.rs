//! Status events produced by a running scan.
//!
//! The engine never blocks on its consumer: events are pushed into an
//! unbounded channel and the front end drains them at its own pace.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Targets whose every prefix has been scanned, out of all targets.
    Progress { completed: usize, total: usize },
    /// Prefixes scanned so far, out of all prefixes discovered so far.
    PrefixCounter { processed: usize, total: usize },
    /// A human-readable log line.
    Log { text: String },
}

impl Event {
    pub fn log(text: impl Into<String>) -> Self {
        Self::Log { text: text.into() }
    }
}
