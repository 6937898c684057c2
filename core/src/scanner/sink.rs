//! Append-only output files.
//!
//! Workers never touch the files themselves. They hand batches to a single
//! writer task, which appends each batch with one write, so lines from
//! different prefixes never interleave.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use asnscope_common::config::OutputDestination;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::extract::Records;
use crate::report::Reporter;

#[derive(Debug)]
struct Batch {
    path: PathBuf,
    lines: Vec<String>,
}

/// Owns the writer task for one run.
#[derive(Debug)]
pub struct OutputSink {
    handle: SinkHandle,
    writer: JoinHandle<()>,
}

/// Cheap, cloneable sending side handed to workers.
#[derive(Debug, Clone)]
pub struct SinkHandle {
    tx: mpsc::UnboundedSender<Batch>,
    destination: Arc<OutputDestination>,
}

impl OutputSink {
    /// Prepares the destination and spawns the writer on `runtime`.
    ///
    /// In single-file mode both files are removed first so a run never
    /// appends to the previous one. Failures here are logged, not fatal.
    pub fn open(destination: OutputDestination, reporter: Reporter, runtime: &Handle) -> Self {
        prepare(&destination, &reporter);

        let (tx, rx) = mpsc::unbounded_channel();
        let writer = runtime.spawn(write_batches(rx, reporter));

        Self {
            handle: SinkHandle {
                tx,
                destination: Arc::new(destination),
            },
            writer,
        }
    }

    pub fn handle(&self) -> SinkHandle {
        self.handle.clone()
    }

    /// Waits until every batch sent so far has been written.
    ///
    /// Only returns once all [`SinkHandle`]s have been dropped.
    pub async fn close(self) {
        drop(self.handle);
        if let Err(e) = self.writer.await {
            debug!("output writer ended abnormally: {e}");
        }
    }
}

impl SinkHandle {
    /// Queues the records of `prefix` for writing. Empty lists are skipped.
    pub fn write(&self, prefix: &str, records: Records) {
        let paths = self.destination.paths_for(prefix);

        for (path, lines) in [
            (paths.ips_path, records.ips),
            (paths.domains_path, records.domains),
        ] {
            if lines.is_empty() {
                continue;
            }
            // The writer only goes away after every handle is dropped.
            let _ = self.tx.send(Batch { path, lines });
        }
    }
}

fn prepare(destination: &OutputDestination, reporter: &Reporter) {
    match destination {
        OutputDestination::Single(paths) => {
            for path in [&paths.domains_path, &paths.ips_path] {
                if let Err(e) = remove_if_present(path) {
                    reporter.log(format!("[!] Could not reset {}: {e}", path.display()));
                }
            }
        }
        OutputDestination::PerPrefix { dir } => {
            if let Err(e) = std::fs::create_dir_all(dir) {
                reporter.log(format!("[!] Could not create {}: {e}", dir.display()));
            }
        }
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

async fn write_batches(mut rx: mpsc::UnboundedReceiver<Batch>, reporter: Reporter) {
    while let Some(batch) = rx.recv().await {
        if let Err(e) = append(&batch).await {
            reporter.log(format!("[!] Write error {}: {e}", batch.path.display()));
        }
    }
}

async fn append(batch: &Batch) -> io::Result<()> {
    let mut buffer = String::with_capacity(batch.lines.iter().map(|l| l.len() + 1).sum());
    for line in &batch.lines {
        buffer.push_str(line);
        buffer.push('\n');
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&batch.path)
        .await?;
    file.write_all(buffer.as_bytes()).await?;
    file.flush().await
}
