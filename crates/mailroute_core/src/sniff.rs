//! Homepage content sniffing
//!
//! Last specific check before the default: fetch `http://{domain}` and look
//! for a literal marker in the body.

use crate::{address::SanitizedDomain, ProviderId};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Bytes of a homepage read before the rest is discarded
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// A fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches page bodies; `None` on transport failure or unreadable body
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<Page>;
}

/// GET-based fetcher using reqwest, following redirects
///
/// Bodies are truncated at `max_body_bytes`.
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build homepage HTTP client")?;

        Ok(Self {
            client,
            max_body_bytes: MAX_BODY_BYTES,
        })
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Option<Page> {
        let mut response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Homepage fetch {} failed: {}", url, e);
                return None;
            }
        };

        let status = response.status().as_u16();
        let mut body = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let room = self.max_body_bytes - body.len();
                    body.extend_from_slice(&chunk[..chunk.len().min(room)]);
                    if body.len() >= self.max_body_bytes {
                        debug!("Homepage body {} truncated at {} bytes", url, body.len());
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    debug!("Homepage body {} unreadable: {}", url, e);
                    return None;
                }
            }
        }

        Some(Page {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

/// Looks for a marker on a domain's homepage
pub struct Sniffer {
    fetcher: Arc<dyn PageFetcher>,
    marker: String,
    timeout: Duration,
}

impl Sniffer {
    pub fn new(fetcher: Arc<dyn PageFetcher>, marker: impl Into<String>, timeout: Duration) -> Self {
        Self {
            fetcher,
            marker: marker.into(),
            timeout,
        }
    }

    /// Return the `whois` provider when a successful homepage contains the marker
    ///
    /// Non-2xx responses are not scanned. Fetch failures and timeouts are misses.
    pub async fn sniff(&self, domain: &SanitizedDomain) -> Option<ProviderId> {
        let url = format!("http://{}", domain);

        let page = match tokio::time::timeout(self.timeout, self.fetcher.fetch(&url)).await {
            Ok(page) => page?,
            Err(_) => {
                debug!("Homepage fetch {} timed out after {:?}", url, self.timeout);
                return None;
            }
        };

        if !page.is_success() {
            debug!("Homepage {} answered {}, not scanned", url, page.status);
            return None;
        }

        if page.body.contains(self.marker.as_str()) {
            debug!("Homepage {} contains marker {:?}", url, self.marker);
            return Some(ProviderId::whois());
        }

        None
    }
}
