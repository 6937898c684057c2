use std::{sync::Arc, time::Duration};

use tracing::trace;

use crate::report::Reporter;
use crate::signal::Signal;

use super::{FetchError, Lookup, PageFetcher, TransportError};

/// Bounded retry with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Fixed wait between a failed attempt and the next one.
    pub backoff: Duration,
    /// Upper bound for a single attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(2),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Runs lookups against a [`PageFetcher`] under a [`RetryPolicy`].
///
/// Every failed attempt is reported as a log event; successes are silent.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn PageFetcher>,
    policy: RetryPolicy,
    base_url: String,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn PageFetcher>, policy: RetryPolicy, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            policy,
            base_url: base_url.into(),
        }
    }

    /// Fetches the page for `lookup`.
    ///
    /// An in-flight attempt is never interrupted, but the backoff between
    /// attempts ends early when `stop` is raised.
    pub async fn fetch(
        &self,
        lookup: &Lookup<'_>,
        stop: &Signal,
        reporter: &Reporter,
    ) -> Result<String, FetchError> {
        let url = lookup.url(&self.base_url);
        let attempts = self.policy.attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            trace!(%url, attempt, "requesting page");

            let error = match tokio::time::timeout(self.policy.timeout, self.transport.get(&url)).await {
                Ok(Ok(page)) => return Ok(page),
                Ok(Err(e)) => e,
                Err(_) => TransportError::Timeout,
            };

            if attempt >= attempts {
                reporter.log(format!("[!] {lookup} error after {attempts} tries: {error}"));
                return Err(FetchError::Exhausted {
                    subject: lookup.to_string(),
                    attempts,
                    source: error,
                });
            }

            reporter.log(format!("[!] Attempt {attempt} failed for {lookup}, retrying…"));

            tokio::select! {
                _ = tokio::time::sleep(self.policy.backoff) => {}
                _ = stop.raised() => {
                    return Err(FetchError::Cancelled {
                        subject: lookup.to_string(),
                        attempts: attempt,
                    });
                }
            }
        }
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
