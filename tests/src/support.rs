//! A fake routing registry and helpers for driving whole runs.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use asnscope_common::config::{OutputDestination, OutputPaths, RunConfig};
use asnscope_common::event::Event;
use asnscope_common::network::target::TargetList;
use asnscope_core::network::{PageFetcher, RetryPolicy, TransportError};
use asnscope_core::report::EventReceiver;
use asnscope_core::{Scanner, ScannerOptions, Timing};
use async_trait::async_trait;
use parking_lot::Mutex;

pub const BASE_URL: &str = "http://registry.test";

/// Serves canned lookup pages keyed by URL.
///
/// Unknown URLs answer 404, so a missing fixture shows up as a failed fetch.
#[derive(Default)]
pub struct FakeRegistry {
    pages: HashMap<String, Result<String, TransportError>>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asn(mut self, asn: &str, prefixes: &[&str]) -> Self {
        self.pages
            .insert(prefixes_url(asn), Ok(asn_page(prefixes)));
        self
    }

    pub fn prefix(mut self, prefix: &str, ips: &[&str], domains: &[&str]) -> Self {
        self.pages
            .insert(records_url(prefix), Ok(records_page(ips, domains)));
        self
    }

    pub fn failing(mut self, url: String) -> Self {
        self.pages.insert(url, Err(TransportError::Status(503)));
        self
    }

    /// Makes every request take `delay`.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == url).count()
    }
}

#[async_trait]
impl PageFetcher for FakeRegistry {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        self.calls.lock().push(url.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.pages
            .get(url)
            .cloned()
            .unwrap_or(Err(TransportError::Status(404)))
    }
}

pub fn prefixes_url(asn: &str) -> String {
    format!("{BASE_URL}/{asn}#_prefixes")
}

pub fn records_url(prefix: &str) -> String {
    format!("{BASE_URL}/net/{prefix}#_dnsrecords")
}

pub fn asn_page(prefixes: &[&str]) -> String {
    let rows: String = prefixes
        .iter()
        .map(|p| format!("<tr><td><a href=\"/net/{p}\">{p}</a></td><td>Example</td></tr>"))
        .collect();
    format!("<html><body><table id=\"table_prefixes4\">{rows}</table></body></html>")
}

/// One row per IP; every domain is listed on the first row.
pub fn records_page(ips: &[&str], domains: &[&str]) -> String {
    let links: String = domains
        .iter()
        .map(|d| format!("<a href=\"/dns/{d}\">{d}</a> "))
        .collect();

    let rows: String = if ips.is_empty() {
        format!("<tr><td></td><td></td><td>{links}</td></tr>")
    } else {
        ips.iter()
            .enumerate()
            .map(|(i, ip)| {
                let cell = if i == 0 { links.as_str() } else { "" };
                format!("<tr><td><a href=\"/ip/{ip}\">{ip}</a></td><td></td><td>{cell}</td></tr>")
            })
            .collect()
    };
    format!("<html><body><table id=\"dnsrecords\">{rows}</table></body></html>")
}

pub fn fast_timing() -> Timing {
    Timing {
        dequeue_wait: Duration::from_millis(20),
        pause_poll: Duration::from_millis(10),
        finish_poll: Duration::from_millis(20),
        retry: RetryPolicy {
            attempts: 3,
            backoff: Duration::from_millis(5),
            timeout: Duration::from_secs(2),
        },
    }
}

pub fn scanner_for(registry: Arc<FakeRegistry>) -> (Scanner, EventReceiver) {
    scanner_with_timing(registry, fast_timing())
}

pub fn scanner_with_timing(registry: Arc<FakeRegistry>, timing: Timing) -> (Scanner, EventReceiver) {
    Scanner::with_options(ScannerOptions {
        fetcher: Some(registry),
        timing,
        ..ScannerOptions::default()
    })
}

/// A config writing the shared files into `dir`.
pub fn run_config(targets: &[&str], threads: usize, dir: &Path) -> RunConfig {
    let (targets, _) = TargetList::from_lines(&targets.join("\n"));
    RunConfig {
        threads,
        output: OutputDestination::Single(shared_paths(dir)),
        base_url: BASE_URL.to_string(),
        ..RunConfig::new(targets)
    }
}

pub fn shared_paths(dir: &Path) -> OutputPaths {
    OutputPaths {
        domains_path: dir.join("domains_all.txt"),
        ips_path: dir.join("ips_all.txt"),
    }
}

pub fn drain(rx: &mut EventReceiver) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn logs(events: &[Event]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Log { text } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(String::from)
        .collect()
}

/// Fails the test instead of hanging when a run never settles.
pub async fn wait_for_end(scanner: &Scanner) -> asnscope_core::RunState {
    tokio::time::timeout(Duration::from_secs(10), scanner.wait())
        .await
        .expect("run did not finish in time")
}
