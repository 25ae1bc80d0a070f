//! # mailroute_core
//!
//! Resolves an email address to the identifier of the webmail provider that
//! actually hosts the mailbox, so a login can be redirected to the right
//! sign-in page.
//!
//! ## Resolution cascade
//!
//! - **Direct match** of the domain against an ordered rule table
//! - **MX match** of each exchange host against a second ordered table
//! - **Liveness probing** of well-known webmail login URLs
//! - **Content sniffing** of the domain's homepage for a marker
//! - **Default** provider `other` when nothing matches
//!
//! Each stage runs only when every earlier stage missed. Network failures
//! inside a stage are misses, never errors; only an unusable address is.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mailroute_core::{ResolutionPipeline, RouterConfig, rules::RuleSet};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = ResolutionPipeline::new(RouterConfig::default(), RuleSet::builtin())?;
//!
//!     let resolution = pipeline.resolve("someone@naver.com").await?;
//!     println!("{} via {}", resolution.provider, resolution.stage);
//!
//!     Ok(())
//! }
//! ```

pub mod address;
pub mod dns;
pub mod matcher;
pub mod pipeline;
pub mod probe;
pub mod rules;
pub mod sniff;

#[cfg(test)]
mod test_support;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Provider used when no stage matches.
pub const DEFAULT_PROVIDER: &str = "other";

/// Provider produced by the content sniffer.
pub const SNIFFED_PROVIDER: &str = "whois";

/// Marker searched for in the homepage body.
pub const DEFAULT_SNIFF_MARKER: &str = "Whois";

/// Configuration for the resolution pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Per-URL liveness probe timeout in milliseconds
    pub probe_timeout_ms: u64,
    /// Homepage fetch timeout in milliseconds
    pub sniff_timeout_ms: u64,
    /// MX query timeout in milliseconds
    pub dns_timeout_ms: u64,
    /// Maximum number of liveness probes in flight (1 = sequential)
    pub probe_concurrency: usize,
    /// Literal marker searched for in the homepage body
    pub sniff_marker: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 5_000,
            sniff_timeout_ms: 5_000,
            dns_timeout_ms: 5_000,
            probe_concurrency: 1,
            sniff_marker: DEFAULT_SNIFF_MARKER.to_string(),
        }
    }
}

impl RouterConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn sniff_timeout(&self) -> Duration {
        Duration::from_millis(self.sniff_timeout_ms)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_millis(self.dns_timeout_ms)
    }
}

/// Identifier of the webmail provider hosting a mailbox.
///
/// Always a safe URL path segment: non-empty ASCII alphanumerics, `-` or `_`.
/// Case is preserved since it names a route on the redirect target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderId(String);

impl ProviderId {
    /// Create a provider id, rejecting anything that is not a safe path segment
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let is_safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !is_safe {
            return Err(RouteError::Configuration(format!(
                "provider id {:?} is not a safe path segment",
                id
            )));
        }

        Ok(Self(id))
    }

    /// The fallback provider
    pub fn other() -> Self {
        Self(DEFAULT_PROVIDER.to_string())
    }

    /// The provider produced by a homepage marker hit
    pub fn whois() -> Self {
        Self(SNIFFED_PROVIDER.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProviderId {
    type Error = RouteError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ProviderId> for String {
    fn from(id: ProviderId) -> Self {
        id.0
    }
}

/// Reasons a login cannot be resolved at all
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidAddress {
    #[error("missing parameter")]
    MissingParameter,
    #[error("invalid email address")]
    InvalidEmail,
}

/// Errors that can occur while building or running the pipeline
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] InvalidAddress),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RouteError>;

// Re-export main types
pub use pipeline::{Resolution, ResolutionPipeline, Stage};
