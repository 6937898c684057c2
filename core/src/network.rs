//! Fetching lookup pages from the routing registry.
//!
//! [`PageFetcher`] is the single-attempt seam: the [`http`] module provides
//! the real implementation and tests substitute scripted ones. Retry, backoff
//! and per-attempt timeouts live on top of it in [`retry`], so every
//! transport gets the same policy.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub mod http;
pub mod retry;

pub use http::HttpFetcher;
pub use retry::{Fetcher, RetryPolicy};

/// Why a single request attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("{0}")]
    Other(String),
}

/// Why a lookup produced no page at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("{subject} failed after {attempts} attempts: {source}")]
    Exhausted {
        subject: String,
        attempts: u32,
        source: TransportError,
    },
    #[error("{subject} abandoned after {attempts} attempts: stop requested")]
    Cancelled { subject: String, attempts: u32 },
}

/// Performs one GET and returns the body of a 2xx response.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<String, TransportError>;
}

/// The two kinds of page the engine asks the registry for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// Prefixes announced by an ASN.
    Prefixes { target: &'a str },
    /// DNS records hosted inside a prefix.
    Records { prefix: &'a str },
}

impl Lookup<'_> {
    pub fn url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        match self {
            Self::Prefixes { target } => format!("{base}/{target}#_prefixes"),
            Self::Records { prefix } => format!("{base}/net/{prefix}#_dnsrecords"),
        }
    }
}

impl fmt::Display for Lookup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefixes { target } => write!(f, "ASN {target}"),
            Self::Records { prefix } => write!(f, "DNS {prefix}"),
        }
    }
}
