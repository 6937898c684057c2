use std::time::Duration;

use asnscope_common::warn;
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use reqwest::{
    Client, Proxy,
    header::{self, HeaderMap, HeaderValue},
};

use super::{PageFetcher, TransportError};

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36";

/// HTTP transport with a pool of proxied clients.
///
/// `reqwest` binds a proxy to a client, so one client is built per proxy and
/// each request picks one of them at random. Without proxies every request
/// goes out directly.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    direct: Client,
    proxied: Vec<Client>,
}

impl HttpFetcher {
    /// Builds the client pool. Proxies that cannot be parsed are skipped.
    pub fn new(proxies: &[String], timeout: Duration) -> Result<Self, reqwest::Error> {
        let direct = build_client(None, timeout)?;
        let mut proxied = Vec::with_capacity(proxies.len());

        for proxy in proxies {
            match build_client(Some(proxy), timeout) {
                Ok(client) => proxied.push(client),
                Err(e) => warn!("Skipping unusable proxy {proxy}: {e}"),
            }
        }

        Ok(Self { direct, proxied })
    }

    pub fn proxy_count(&self) -> usize {
        self.proxied.len()
    }

    fn pick_client(&self) -> &Client {
        self.proxied
            .choose(&mut rand::rng())
            .unwrap_or(&self.direct)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        let response = self.pick_client().get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Other(e.to_string())
        }
    }
}

fn build_client(proxy: Option<&str>, timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));

    let mut builder = Client::builder().default_headers(headers).timeout(timeout);

    if let Some(proxy) = proxy {
        builder = builder.proxy(Proxy::all(normalize_proxy(proxy))?);
    }

    builder.build()
}

/// Proxy lists usually carry bare `host:port` entries; those are plain HTTP proxies.
fn normalize_proxy(proxy: &str) -> String {
    let proxy = proxy.trim();
    if proxy.contains("://") {
        proxy.to_string()
    } else {
        format!("http://{proxy}")
    }
}
