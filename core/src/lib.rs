//! # asnscope core
//!
//! The discovery engine. Seeds (ASNs and bare IPv4 hosts) are expanded into
//! announced prefixes, and every prefix into the IP and domain records the
//! lookup service knows about.
//!
//! * **[`scanner`]**: the run controller, task queue, worker pool and
//!   completion accounting.
//! * **[`network`]**: the retrying page fetcher and its HTTP transport.
//! * **[`extract`]**: turning lookup pages into prefixes and records.
//! * **[`report`]**: the event channel a run reports through.
//! * **[`signal`]**: the pause and stop flags workers poll.

pub mod extract;
pub mod network;
pub mod report;
pub mod scanner;
pub mod signal;

pub use scanner::{EngineError, FinishReason, RunState, Scanner, ScannerOptions, Timing};
