//! MX resolution using hickory-resolver
//!
//! Lookups never fail from the caller's point of view: NXDOMAIN, timeouts,
//! empty answers and resolver errors all come back as an empty record list.

use crate::address::Domain;
use async_trait::async_trait;
use hickory_resolver::{
    config::{ResolverConfig, ResolverOpts},
    system_conf, TokioAsyncResolver,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A single mail exchange answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecord {
    pub preference: u16,
    /// Lower-cased exchange host without the trailing root dot
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: normalize_exchange(&exchange.into()),
        }
    }
}

pub(crate) fn normalize_exchange(exchange: &str) -> String {
    exchange.trim_end_matches('.').to_ascii_lowercase()
}

/// Absolute query name, so the resolver never appends search suffixes
pub(crate) fn query_name(domain: &Domain) -> String {
    format!("{}.", domain.as_str().trim_end_matches('.'))
}

/// Source of MX records for a domain
#[async_trait]
pub trait LookupMx: Send + Sync {
    /// Records in the order the resolver returned them; empty on any failure
    async fn lookup_mx(&self, domain: &Domain) -> Vec<MxRecord>;
}

/// DNS resolver wrapper configured for single-attempt MX queries
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl DnsResolver {
    /// Create a resolver from the system configuration
    ///
    /// Falls back to the default upstream servers when the system
    /// configuration cannot be read.
    ///
    /// # Arguments
    /// * `timeout` - Upper bound for one MX query
    pub fn new(timeout: Duration) -> Self {
        let (config, mut opts) = match system_conf::read_system_conf() {
            Ok(conf) => conf,
            Err(e) => {
                warn!("System DNS configuration unavailable, using defaults: {}", e);
                (ResolverConfig::default(), ResolverOpts::default())
            }
        };

        opts.timeout = timeout;
        opts.attempts = 1;

        info!(
            "DNS resolver initialized - timeout: {}ms, nameservers: {}",
            timeout.as_millis(),
            config.name_servers().len()
        );

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            timeout,
        }
    }
}

#[async_trait]
impl LookupMx for DnsResolver {
    async fn lookup_mx(&self, domain: &Domain) -> Vec<MxRecord> {
        debug!("Querying MX records for domain: {}", domain);

        // The resolver timeout is per name server; bound the whole query too.
        let lookup = tokio::time::timeout(
            self.timeout,
            self.resolver.mx_lookup(query_name(domain)),
        );

        match lookup.await {
            Ok(Ok(response)) => {
                let records: Vec<MxRecord> = response
                    .iter()
                    .map(|mx| MxRecord::new(mx.preference(), mx.exchange().to_utf8()))
                    .collect();
                debug!("Domain {} has {} MX record(s)", domain, records.len());
                records
            }
            Ok(Err(e)) => {
                debug!("MX record lookup failed for {}: {}", domain, e);
                Vec::new()
            }
            Err(_) => {
                debug!("MX record lookup timed out for {}", domain);
                Vec::new()
            }
        }
    }
}
