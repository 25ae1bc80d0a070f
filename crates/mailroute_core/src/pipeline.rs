//! Resolution pipeline orchestrating all provider checks
//!
//! Stages run strictly in sequence, cheapest first, and the first stage that
//! produces a provider ends the resolution. Every stage absorbs its own
//! network failures as a miss; the only error is an unusable login.

use crate::{
    address::{self, Domain, SanitizedDomain},
    dns::{DnsResolver, LookupMx},
    matcher::{match_mx, match_static},
    probe::{default_candidates, HttpLiveness, LivenessCheck, Prober},
    rules::RuleSet,
    sniff::{HttpFetcher, PageFetcher, Sniffer},
    ProviderId, Result, RouterConfig,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, Span};

/// The stage that produced a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Direct,
    Mx,
    Probe,
    Sniff,
    Default,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Direct => "direct",
            Stage::Mx => "mx",
            Stage::Probe => "probe",
            Stage::Sniff => "sniff",
            Stage::Default => "default",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stages that can produce a provider, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    Direct,
    Mx,
    Probe,
    Sniff,
}

impl Check {
    const CASCADE: [Check; 4] = [Check::Direct, Check::Mx, Check::Probe, Check::Sniff];

    fn stage(self) -> Stage {
        match self {
            Check::Direct => Stage::Direct,
            Check::Mx => Stage::Mx,
            Check::Probe => Stage::Probe,
            Check::Sniff => Stage::Sniff,
        }
    }
}

/// Outcome of resolving one login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub provider: ProviderId,
    pub stage: Stage,
    pub domain: Domain,
}

/// Main pipeline coordinating all provider checks
pub struct ResolutionPipeline {
    rules: Arc<RuleSet>,
    dns: Arc<dyn LookupMx>,
    prober: Prober,
    sniffer: Sniffer,
}

impl ResolutionPipeline {
    /// Create a pipeline backed by the system resolver and real HTTP clients
    ///
    /// # Arguments
    /// * `config` - Timeouts, probe concurrency and sniff marker
    /// * `rules` - Shared rule tables, usually [`RuleSet::builtin`]
    pub fn new(config: RouterConfig, rules: Arc<RuleSet>) -> Result<Self> {
        info!("Initializing resolution pipeline");

        let dns = Arc::new(DnsResolver::new(config.dns_timeout()));
        let liveness = Arc::new(HttpLiveness::new(config.probe_timeout())?);
        let fetcher = Arc::new(HttpFetcher::new(config.sniff_timeout())?);

        let pipeline = Self::with_adapters(&config, rules, dns, liveness, fetcher);

        info!(
            "Resolution pipeline initialized - {} direct rules, {} MX rules, probe concurrency {}",
            pipeline.rules.direct.len(),
            pipeline.rules.mx.len(),
            config.probe_concurrency.max(1)
        );

        Ok(pipeline)
    }

    /// Create a pipeline from explicit DNS and HTTP adapters
    pub fn with_adapters(
        config: &RouterConfig,
        rules: Arc<RuleSet>,
        dns: Arc<dyn LookupMx>,
        liveness: Arc<dyn LivenessCheck>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        Self {
            rules,
            dns,
            prober: Prober::new(liveness, config.probe_timeout(), config.probe_concurrency),
            sniffer: Sniffer::new(fetcher, config.sniff_marker.clone(), config.sniff_timeout()),
        }
    }

    /// Resolve a login to the provider hosting its mailbox
    ///
    /// # Returns
    /// * `Ok(Resolution)` with the provider and the stage that produced it
    /// * `Err(RouteError::InvalidAddress)` when the login has no usable domain
    #[instrument(skip_all, fields(domain = tracing::field::Empty))]
    pub async fn resolve(&self, login: &str) -> Result<Resolution> {
        let domain = address::normalize(login)?;
        Span::current().record("domain", domain.as_str());

        for check in Check::CASCADE {
            let stage = check.stage();
            if let Some(provider) = self.run_check(check, &domain).await {
                info!("Resolved {} -> {} ({})", domain, provider, stage);
                return Ok(Resolution {
                    provider,
                    stage,
                    domain,
                });
            }
            debug!("Stage {} missed for {}", stage, domain);
        }

        info!("Resolved {} -> {} ({})", domain, crate::DEFAULT_PROVIDER, Stage::Default);
        Ok(Resolution {
            provider: ProviderId::other(),
            stage: Stage::Default,
            domain,
        })
    }

    async fn run_check(&self, check: Check, domain: &Domain) -> Option<ProviderId> {
        match check {
            Check::Direct => match_static(domain, &self.rules.direct),
            Check::Mx => {
                let records = self.dns.lookup_mx(domain).await;
                match_mx(&records, &self.rules.mx)
            }
            Check::Probe => {
                let candidates = default_candidates(&domain.sanitized());
                self.prober.probe(&candidates).await
            }
            Check::Sniff => self.sniffer.sniff(&domain.sanitized()).await,
        }
    }

    /// Get pipeline statistics for monitoring
    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            direct_rules_count: self.rules.direct.len(),
            mx_rules_count: self.rules.mx.len(),
            probe_groups_count: default_candidates(&SanitizedDomain::new("example.com")).len(),
        }
    }
}

/// Statistics about the resolution pipeline
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub direct_rules_count: usize,
    pub mx_rules_count: usize,
    pub probe_groups_count: usize,
}
