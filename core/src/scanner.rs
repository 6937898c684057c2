//! The scan **engine**: configuration, run lifecycle and the worker pool.
//!
//! A run is driven entirely through [`Scanner`]. Callers configure it, start
//! it, and from then on only issue control commands (`pause`, `resume`,
//! `stop`) while reading status from the event stream returned by
//! [`Scanner::new`].
//!
//! **Lifecycle:**
//! `Idle → Running ⇄ Paused → Stopping → Finished`, where a run that drains
//! its work goes straight from `Running` (or `Paused`) to `Finished`. A new
//! run may be started from `Idle` or `Finished` and begins with all counters
//! reset.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use asnscope_common::config::{MAX_THREADS, RunConfig};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::extract::{HeNetExtractor, PageExtractor};
use crate::network::{Fetcher, HttpFetcher, PageFetcher, RetryPolicy};
use crate::report::{EventReceiver, Reporter};
use crate::signal::Signal;

pub mod queue;
pub mod sink;
pub mod task;
pub mod tracker;
mod worker;

use queue::TaskQueue;
use sink::OutputSink;
use task::Task;
use tracker::{Snapshot, Tracker};
use worker::WorkerContext;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("worker count must be between 1 and {max}, got {0}", max = MAX_THREADS)]
    InvalidThreads(usize),
    #[error("cannot reconfigure while a scan is running")]
    Busy,
    #[error("a scan is already running")]
    AlreadyRunning,
    #[error("scanner was started before being configured")]
    NotConfigured,
    #[error("no targets to scan")]
    NoTargets,
    #[error("the scanner must be started from within a tokio runtime")]
    NoRuntime,
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Every target completed.
    Completed,
    /// The run was stopped before every target completed.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Paused,
    Stopping,
    Finished(FinishReason),
}

impl RunState {
    /// Whether a run currently owns the workers.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused | Self::Stopping)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Stopping => write!(f, "stopping"),
            Self::Finished(FinishReason::Completed) => write!(f, "completed"),
            Self::Finished(FinishReason::Stopped) => write!(f, "stopped"),
        }
    }
}

/// Polling intervals and the fetch retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// How long an idle worker waits on the queue before re-checking stop.
    pub dequeue_wait: Duration,
    /// How often a paused worker checks whether it may continue.
    pub pause_poll: Duration,
    /// How often the run checks whether every target has completed.
    pub finish_poll: Duration,
    pub retry: RetryPolicy,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            dequeue_wait: Duration::from_millis(300),
            pause_poll: Duration::from_millis(200),
            finish_poll: Duration::from_millis(500),
            retry: RetryPolicy::default(),
        }
    }
}

/// Seams for replacing the network and page layout.
#[derive(Clone)]
pub struct ScannerOptions {
    /// Transport used instead of the built-in HTTP client pool.
    pub fetcher: Option<Arc<dyn PageFetcher>>,
    pub extractor: Arc<dyn PageExtractor>,
    pub timing: Timing,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self {
            fetcher: None,
            extractor: Arc::new(HeNetExtractor),
            timing: Timing::default(),
        }
    }
}

/// State shared by the engine and every worker.
pub(crate) struct Shared {
    pub queue: TaskQueue,
    pub tracker: Tracker,
    pub reporter: Reporter,
    pub stop: Signal,
    pub pause: Signal,
    /// Raised once the run has ended, releasing idle workers.
    pub done: Signal,
}

struct Inner {
    shared: Arc<Shared>,
    state: watch::Sender<RunState>,
    config: Mutex<Option<RunConfig>>,
    options: ScannerOptions,
}

impl Inner {
    /// Applies `next` to the current state; returns whether it changed.
    fn transition(&self, next: impl FnOnce(RunState) -> Option<RunState>) -> bool {
        self.state.send_if_modified(|state| match next(*state) {
            Some(new) => {
                *state = new;
                true
            }
            None => false,
        })
    }
}

/// Handle to the scan engine. Clones control the same engine.
#[derive(Clone)]
pub struct Scanner {
    inner: Arc<Inner>,
}

impl Scanner {
    pub fn new() -> (Self, EventReceiver) {
        Self::with_options(ScannerOptions::default())
    }

    pub fn with_options(options: ScannerOptions) -> (Self, EventReceiver) {
        let (reporter, events) = Reporter::channel();

        let shared = Arc::new(Shared {
            queue: TaskQueue::new(),
            tracker: Tracker::new(reporter.clone()),
            reporter,
            stop: Signal::new(),
            pause: Signal::new(),
            done: Signal::new(),
        });

        let inner = Arc::new(Inner {
            shared,
            state: watch::Sender::new(RunState::Idle),
            config: Mutex::new(None),
            options,
        });

        (Self { inner }, events)
    }

    /// Stores the settings for the next run.
    pub fn configure(&self, config: RunConfig) -> Result<(), EngineError> {
        if !(1..=MAX_THREADS).contains(&config.threads) {
            return Err(EngineError::InvalidThreads(config.threads));
        }
        if self.state().is_active() {
            return Err(EngineError::Busy);
        }

        *self.inner.config.lock() = Some(config);
        Ok(())
    }

    /// Seeds the queue from the configured targets and launches the workers.
    ///
    /// Must be called from within a tokio runtime; the run itself proceeds
    /// in the background.
    pub fn start(&self) -> Result<(), EngineError> {
        if self.state().is_active() {
            return Err(EngineError::AlreadyRunning);
        }

        let config = self
            .inner
            .config
            .lock()
            .clone()
            .ok_or(EngineError::NotConfigured)?;

        let shared = &self.inner.shared;
        if config.targets.is_empty() {
            shared
                .reporter
                .log("[!] No input detected. Add ASNs/IPs (one per line).");
            return Err(EngineError::NoTargets);
        }

        let runtime = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        let timing = self.inner.options.timing;

        let transport: Arc<dyn PageFetcher> = match &self.inner.options.fetcher {
            Some(fetcher) => fetcher.clone(),
            None => {
                let http = HttpFetcher::new(&config.proxies, timing.retry.timeout)?;
                debug!(proxies = http.proxy_count(), "built HTTP client pool");
                Arc::new(http)
            }
        };

        let claimed = self.inner.transition(|state| match state {
            RunState::Idle | RunState::Finished(_) => Some(RunState::Running),
            _ => None,
        });
        if !claimed {
            return Err(EngineError::AlreadyRunning);
        }

        shared.stop.clear();
        shared.pause.clear();
        shared.done.clear();
        let stale = shared.queue.clear();
        if stale > 0 {
            debug!(stale, "dropped tasks left over from the previous run");
        }
        shared.tracker.reset(config.targets.len());

        let sink = OutputSink::open(config.output.clone(), shared.reporter.clone(), &runtime);

        for target in config.targets.iter() {
            let target = Arc::new(target.clone());
            match target.host_prefix() {
                Some(prefix) => {
                    shared.tracker.register(target.key(), 1);
                    shared
                        .reporter
                        .log(format!("[>] Queued /32 scan for {}", target.key()));
                    shared.queue.push(Task::scan(target, prefix));
                }
                None => shared.queue.push(Task::expand(target)),
            }
        }

        shared.reporter.log(format!(
            "[▶] Scan started with {} thread(s) | {} target(s)",
            config.threads,
            config.targets.len()
        ));

        let ctx = Arc::new(WorkerContext {
            shared: shared.clone(),
            fetcher: Fetcher::new(transport, timing.retry, config.base_url.clone()),
            extractor: self.inner.options.extractor.clone(),
            sink: sink.handle(),
            timing,
        });

        runtime.spawn(supervise(
            self.inner.clone(),
            ctx,
            sink,
            config.threads,
            runtime.clone(),
        ));

        Ok(())
    }

    /// Holds workers at their next task boundary. In-flight fetches finish.
    ///
    /// The pause flag flips inside the state transition.
    pub fn pause(&self) -> bool {
        let shared = &self.inner.shared;
        let paused = self.inner.transition(|state| match state {
            RunState::Running => {
                shared.pause.raise();
                Some(RunState::Paused)
            }
            _ => None,
        });
        if paused {
            shared.reporter.log("[⏸] Paused.");
        }
        paused
    }

    pub fn resume(&self) -> bool {
        let shared = &self.inner.shared;
        let resumed = self.inner.transition(|state| match state {
            RunState::Paused => {
                shared.pause.clear();
                Some(RunState::Running)
            }
            _ => None,
        });
        if resumed {
            shared.reporter.log("[▶] Resumed.");
        }
        resumed
    }

    pub fn toggle_pause(&self) -> bool {
        match self.state() {
            RunState::Paused => self.resume(),
            _ => self.pause(),
        }
    }

    /// Abandons queued work. Fetches already in flight are allowed to finish.
    pub fn stop(&self) -> bool {
        let stopping = self.inner.transition(|state| match state {
            RunState::Running | RunState::Paused => Some(RunState::Stopping),
            _ => None,
        });
        if stopping {
            self.inner.shared.stop.raise();
            self.inner.shared.reporter.log("[!] Stop requested.");
        }
        stopping
    }

    pub fn state(&self) -> RunState {
        *self.inner.state.borrow()
    }

    /// Resolves once no run is active and returns the state it ended in.
    pub async fn wait(&self) -> RunState {
        let mut rx = self.inner.state.subscribe();
        match rx.wait_for(|state| !state.is_active()).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.shared.tracker.snapshot()
    }

    /// Prefixes of `key` still waiting to be scanned, `None` once complete.
    pub fn pending_for(&self, key: &str) -> Option<usize> {
        self.inner.shared.tracker.pending(key)
    }

    /// Tasks currently queued.
    pub fn queued(&self) -> usize {
        self.inner.shared.queue.len()
    }
}

/// Runs the worker pool and settles the run once it completes or stops.
async fn supervise(
    inner: Arc<Inner>,
    ctx: Arc<WorkerContext>,
    sink: OutputSink,
    threads: usize,
    runtime: Handle,
) {
    let shared = inner.shared.clone();
    let poll = ctx.timing.finish_poll;

    let workers: Vec<JoinHandle<()>> = (0..threads)
        .map(|id| runtime.spawn(worker::run(id, ctx.clone())))
        .collect();

    loop {
        tokio::select! {
            _ = shared.stop.raised() => break,
            _ = tokio::time::sleep(poll) => {
                if shared.tracker.is_finished() {
                    break;
                }
            }
        }
    }
    shared.tracker.freeze();

    // A stop that races the last completion still counts as a stop.
    let reason = if shared.stop.is_raised() {
        FinishReason::Stopped
    } else {
        FinishReason::Completed
    };

    shared.done.raise();
    for worker in workers {
        if let Err(e) = worker.await {
            debug!("worker ended abnormally: {e}");
        }
    }

    // The writer drains once the last sink handle, held by the context, is gone.
    drop(ctx);
    sink.close().await;

    let abandoned = shared.queue.clear();
    match reason {
        FinishReason::Completed => shared.reporter.log("[✓] Scan finished."),
        FinishReason::Stopped => shared
            .reporter
            .log(format!("[■] Scan stopped. {abandoned} queued task(s) abandoned.")),
    }

    shared.pause.clear();
    inner.state.send_replace(RunState::Finished(reason));
}
