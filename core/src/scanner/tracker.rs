//! Per-target completion accounting.
//!
//! A target is complete either when its expansion yields no prefixes or when
//! the last of its prefixes has been scanned. Both paths end in the same
//! guarded step, so each target completes at most once per run.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use asnscope_common::utils::progress::{estimate_eta, fraction_done};
use parking_lot::Mutex;
use tracing::debug;

use crate::report::Reporter;

/// The four run-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub total_targets: usize,
    pub completed_targets: usize,
    pub total_prefixes: usize,
    pub processed_prefixes: usize,
}

/// A consistent read of the counters at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub counters: Counters,
    pub elapsed: Duration,
}

impl Snapshot {
    pub fn fraction_done(&self) -> f64 {
        fraction_done(self.counters.completed_targets, self.counters.total_targets)
    }

    pub fn eta(&self) -> Duration {
        estimate_eta(
            self.elapsed,
            self.counters.completed_targets,
            self.counters.total_targets,
        )
    }

    pub fn is_finished(&self) -> bool {
        let c = &self.counters;
        c.total_targets > 0 && c.completed_targets >= c.total_targets
    }
}

#[derive(Debug)]
struct Ledger {
    pending: HashMap<String, usize>,
    completed: HashSet<String>,
    counters: Counters,
    started_at: Instant,
    ended_at: Option<Instant>,
}

impl Ledger {
    fn new(total_targets: usize) -> Self {
        Self {
            pending: HashMap::new(),
            completed: HashSet::new(),
            counters: Counters {
                total_targets,
                ..Counters::default()
            },
            started_at: Instant::now(),
            ended_at: None,
        }
    }
}

/// Pending-prefix registry and counters behind one lock.
///
/// Every mutation emits its event while still holding the lock, so the
/// event order matches the order the mutations happened in.
#[derive(Debug)]
pub struct Tracker {
    ledger: Mutex<Ledger>,
    reporter: Reporter,
}

impl Tracker {
    pub fn new(reporter: Reporter) -> Self {
        Self {
            ledger: Mutex::new(Ledger::new(0)),
            reporter,
        }
    }

    /// Starts a fresh run over `total_targets` targets.
    pub fn reset(&self, total_targets: usize) {
        let mut ledger = self.ledger.lock();
        *ledger = Ledger::new(total_targets);
        self.reporter.prefix_counter(0, 0);
        self.reporter.progress(0, total_targets);
    }

    /// Records that `key` has `count` prefixes left to scan.
    ///
    /// Must be called before the matching scan tasks are queued. A count of
    /// zero completes the target on the spot.
    pub fn register(&self, key: &str, count: usize) {
        if count == 0 {
            self.complete_unexpanded(key);
            return;
        }

        let mut ledger = self.ledger.lock();
        *ledger.pending.entry(key.to_string()).or_default() += count;
        ledger.counters.total_prefixes += count;
        self.reporter.prefix_counter(
            ledger.counters.processed_prefixes,
            ledger.counters.total_prefixes,
        );
    }

    /// Completes a target whose expansion produced nothing.
    pub fn complete_unexpanded(&self, key: &str) {
        let mut ledger = self.ledger.lock();
        self.complete_target(
            &mut ledger,
            key,
            format!("[!] No prefixes for {key} (or fetch failed). Marked complete."),
        );
    }

    /// Completes a target whose expansion was cut short by a stop.
    pub fn complete_cancelled(&self, key: &str) {
        let mut ledger = self.ledger.lock();
        self.complete_target(
            &mut ledger,
            key,
            format!("[■] Expansion of {key} cancelled by stop."),
        );
    }

    /// Accounts for one finished scan of a prefix owned by `key`.
    ///
    /// Returns `true` when this was the target's last pending prefix.
    pub fn finish_prefix(&self, key: &str) -> bool {
        let mut ledger = self.ledger.lock();

        let counters = &mut ledger.counters;
        counters.processed_prefixes = (counters.processed_prefixes + 1).min(counters.total_prefixes);
        self.reporter
            .prefix_counter(counters.processed_prefixes, counters.total_prefixes);

        let Some(left) = ledger.pending.get_mut(key) else {
            debug!(key, "prefix finished for a target with nothing pending");
            return false;
        };

        *left = left.saturating_sub(1);
        if *left > 0 {
            return false;
        }

        ledger.pending.remove(key);
        self.complete_target(&mut ledger, key, format!("[✓] {key} finished."))
    }

    fn complete_target(&self, ledger: &mut Ledger, key: &str, message: String) -> bool {
        if !ledger.completed.insert(key.to_string()) {
            debug!(key, "target already complete");
            return false;
        }

        let counters = &mut ledger.counters;
        counters.completed_targets = (counters.completed_targets + 1).min(counters.total_targets);

        self.reporter.log(message);
        self.reporter
            .progress(counters.completed_targets, counters.total_targets);
        true
    }

    pub fn pending(&self, key: &str) -> Option<usize> {
        self.ledger.lock().pending.get(key).copied()
    }

    pub fn counters(&self) -> Counters {
        self.ledger.lock().counters
    }

    /// Fixes the run's elapsed time at the current instant. Later calls are no-ops.
    pub fn freeze(&self) {
        let mut ledger = self.ledger.lock();
        ledger.ended_at.get_or_insert_with(Instant::now);
    }

    pub fn snapshot(&self) -> Snapshot {
        let ledger = self.ledger.lock();
        let until = ledger.ended_at.unwrap_or_else(Instant::now);
        Snapshot {
            counters: ledger.counters,
            elapsed: until.saturating_duration_since(ledger.started_at),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.snapshot().is_finished()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
