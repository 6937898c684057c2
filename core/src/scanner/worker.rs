use std::collections::BTreeSet;
use std::sync::Arc;

use asnscope_common::network::target::Target;
use tracing::{debug, trace};

use super::Shared;
use super::Timing;
use super::sink::SinkHandle;
use super::task::Task;
use crate::extract::{PageExtractor, Records};
use crate::network::{FetchError, Fetcher, Lookup};

/// Everything a worker needs for one run.
pub(crate) struct WorkerContext {
    pub shared: Arc<Shared>,
    pub fetcher: Fetcher,
    pub extractor: Arc<dyn PageExtractor>,
    pub sink: SinkHandle,
    pub timing: Timing,
}

/// Pulls tasks until the run is stopped or done.
pub(crate) async fn run(id: usize, ctx: Arc<WorkerContext>) {
    let shared = &ctx.shared;
    trace!(id, "worker started");

    while !shared.stop.is_raised() && !shared.done.is_raised() {
        let Some(task) = shared.queue.pop(ctx.timing.dequeue_wait).await else {
            continue;
        };

        if shared.stop.is_raised() {
            trace!(id, owner = task.owner_key(), "dropping task after stop");
            continue;
        }

        if !wait_while_paused(&ctx).await {
            continue;
        }

        execute(&ctx, task).await;
    }

    trace!(id, "worker exiting");
}

/// Returns `false` if the run was stopped while paused.
async fn wait_while_paused(ctx: &WorkerContext) -> bool {
    let shared = &ctx.shared;
    while shared.pause.is_raised() && !shared.stop.is_raised() {
        tokio::time::sleep(ctx.timing.pause_poll).await;
    }
    !shared.stop.is_raised()
}

async fn execute(ctx: &WorkerContext, task: Task) {
    match task {
        Task::ExpandTarget { target } => expand(ctx, target).await,
        Task::ScanPrefix { owner, prefix } => scan(ctx, &owner, &prefix).await,
    }
}

async fn expand(ctx: &WorkerContext, target: Arc<Target>) {
    let shared = &ctx.shared;
    shared
        .reporter
        .log(format!("[>] Fetching prefixes for {}", target.key()));

    let lookup = Lookup::Prefixes {
        target: target.key(),
    };
    let prefixes = match ctx.fetcher.fetch(&lookup, &shared.stop, &shared.reporter).await {
        Ok(page) => ctx.extractor.extract_prefixes(&page),
        Err(e @ FetchError::Cancelled { .. }) => {
            debug!("{e}");
            shared.tracker.complete_cancelled(target.key());
            return;
        }
        Err(e) => {
            debug!("{e}");
            BTreeSet::new()
        }
    };

    if prefixes.is_empty() {
        shared.tracker.complete_unexpanded(target.key());
        return;
    }

    // Registration has to land before any scan task can be picked up.
    shared.tracker.register(target.key(), prefixes.len());
    shared
        .queue
        .extend(prefixes.into_iter().map(|prefix| Task::scan(target.clone(), prefix)));
}

async fn scan(ctx: &WorkerContext, owner: &Target, prefix: &str) {
    let shared = &ctx.shared;

    let lookup = Lookup::Records { prefix };
    let records = match ctx.fetcher.fetch(&lookup, &shared.stop, &shared.reporter).await {
        Ok(page) => ctx.extractor.extract_records(&page),
        Err(e) => {
            debug!("{e}");
            Records::default()
        }
    };

    for domain in &records.domains {
        shared
            .reporter
            .log(format!("[+] Found domain on {prefix}: {domain}"));
    }

    ctx.sink.write(prefix, records);
    shared.tracker.finish_prefix(owner.key());
}
