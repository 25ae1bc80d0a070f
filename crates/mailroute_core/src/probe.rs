//! Liveness probing of well-known webmail login URLs
//!
//! When neither the domain nor its MX hosts identify the provider, a fixed
//! list of login URLs built from the domain is checked. A URL is alive when
//! a HEAD request answers 200, 301 or 302 without following redirects.
//!
//! Checks may overlap in time, but results are always accepted in declared
//! order: a later URL answering first never beats an earlier one still in
//! flight. As soon as a URL is accepted the remaining checks are dropped.

use crate::{address::SanitizedDomain, ProviderId};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{redirect, Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Statuses that count as a reachable login surface
pub const ALIVE_STATUSES: [StatusCode; 3] = [StatusCode::OK, StatusCode::MOVED_PERMANENTLY, StatusCode::FOUND];

/// A provider and the URLs that identify it, in the order they are tried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeCandidate {
    pub provider: ProviderId,
    pub urls: Vec<String>,
}

impl ProbeCandidate {
    // Built-in candidate providers are known-good path segments.
    fn builtin(provider: &str, urls: Vec<String>) -> Self {
        Self {
            provider: ProviderId(provider.to_string()),
            urls,
        }
    }
}

/// Candidate list for a domain, ordered by how common each setup is
pub fn default_candidates(domain: &SanitizedDomain) -> Vec<ProbeCandidate> {
    let d = domain.as_str();
    vec![
        ProbeCandidate::builtin("groupware", vec![format!("http://gw.{d}/groupware/login.php")]),
        ProbeCandidate::builtin(
            "roundcube",
            vec![
                format!("http://{d}/webmail/"),
                format!("http://webmail.{d}/"),
                format!("http://{d}:2095"),
            ],
        ),
        ProbeCandidate::builtin("ngw", vec![format!("http://mail.{d}/ngw/app/#/sign")]),
        ProbeCandidate::builtin("aruba", vec!["https://webmail.aruba.it/".to_string()]),
        ProbeCandidate::builtin("gw", vec![format!("https://gw.{d}/login")]),
        ProbeCandidate::builtin(
            "owa",
            vec![
                format!("https://{d}/owa/auth/logon.aspx?replaceCurrent=1&url=https://{d}/owa"),
                format!("https://mail.{d}/owa/auth/logon.aspx?replaceCurrent=1&url=https://{d}/owa"),
            ],
        ),
    ]
}

/// Reachability check for a single URL
#[async_trait]
pub trait LivenessCheck: Send + Sync {
    async fn is_alive(&self, url: &str) -> bool;
}

/// HEAD-based liveness check using reqwest
pub struct HttpLiveness {
    client: Client,
}

impl HttpLiveness {
    /// Build a client that never follows redirects
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(timeout)
            .build()
            .context("Failed to build liveness HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl LivenessCheck for HttpLiveness {
    async fn is_alive(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status();
                debug!("Probe {} answered {}", url, status);
                ALIVE_STATUSES.contains(&status)
            }
            Err(e) => {
                debug!("Probe {} failed: {}", url, e);
                false
            }
        }
    }
}

/// Runs candidate lists against a liveness check
pub struct Prober {
    check: Arc<dyn LivenessCheck>,
    timeout: Duration,
    concurrency: usize,
}

impl Prober {
    /// # Arguments
    /// * `check` - Liveness check applied to each URL
    /// * `timeout` - Hard bound for each check
    /// * `concurrency` - Maximum checks in flight; 0 is treated as 1
    pub fn new(check: Arc<dyn LivenessCheck>, timeout: Duration, concurrency: usize) -> Self {
        Self {
            check,
            timeout,
            concurrency: concurrency.max(1),
        }
    }

    /// Return the provider of the first alive URL in declared order
    pub async fn probe(&self, candidates: &[ProbeCandidate]) -> Option<ProviderId> {
        // Owned items keep the returned future `Send`.
        let checks: Vec<(ProviderId, String)> = candidates
            .iter()
            .flat_map(|candidate| {
                candidate
                    .urls
                    .iter()
                    .map(move |url| (candidate.provider.clone(), url.clone()))
            })
            .collect();

        // `buffered` yields in submission order, which is the arbitration.
        let mut results = stream::iter(checks)
            .map(|(provider, url)| async move {
                let alive = self.check_bounded(&url).await;
                (provider, url, alive)
            })
            .buffered(self.concurrency);

        while let Some((provider, url, alive)) = results.next().await {
            if alive {
                debug!("Probe hit: {} -> {}", url, provider);
                return Some(provider);
            }
        }

        None
    }

    /// Enforce the timeout even if the check itself ignores it
    async fn check_bounded(&self, url: &str) -> bool {
        match tokio::time::timeout(self.timeout, self.check.is_alive(url)).await {
            Ok(alive) => alive,
            Err(_) => {
                debug!("Probe {} timed out after {:?}", url, self.timeout);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::normalize;
    use crate::test_support::CannedServer;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers from a fixed table after a per-URL delay; unknown URLs are dead
    #[derive(Default)]
    struct ScriptedCheck {
        answers: HashMap<String, (Duration, bool)>,
        started: Mutex<Vec<String>>,
    }

    impl ScriptedCheck {
        fn answer(mut self, url: &str, delay_ms: u64, alive: bool) -> Self {
            self.answers
                .insert(url.to_string(), (Duration::from_millis(delay_ms), alive));
            self
        }

        fn started(&self) -> Vec<String> {
            self.started.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LivenessCheck for ScriptedCheck {
        async fn is_alive(&self, url: &str) -> bool {
            self.started.lock().unwrap().push(url.to_string());
            match self.answers.get(url) {
                Some((delay, alive)) => {
                    tokio::time::sleep(*delay).await;
                    *alive
                }
                None => false,
            }
        }
    }

    fn candidate(provider: &str, urls: &[&str]) -> ProbeCandidate {
        ProbeCandidate {
            provider: ProviderId::new(provider).unwrap(),
            urls: urls.iter().map(|u| u.to_string()).collect(),
        }
    }

    #[test]
    fn test_default_candidates_order() {
        let domain = normalize("user@corp.example").unwrap().sanitized();
        let candidates = default_candidates(&domain);

        let providers: Vec<&str> = candidates.iter().map(|c| c.provider.as_str()).collect();
        assert_eq!(providers, vec!["groupware", "roundcube", "ngw", "aruba", "gw", "owa"]);

        assert_eq!(candidates[0].urls, vec!["http://gw.corp.example/groupware/login.php"]);
        assert_eq!(
            candidates[1].urls,
            vec![
                "http://corp.example/webmail/",
                "http://webmail.corp.example/",
                "http://corp.example:2095",
            ]
        );
        assert_eq!(
            candidates[5].urls[1],
            "https://mail.corp.example/owa/auth/logon.aspx?replaceCurrent=1&url=https://corp.example/owa"
        );
    }

    #[tokio::test]
    async fn test_first_alive_url_wins_and_stops_probing() {
        let check = Arc::new(
            ScriptedCheck::default()
                .answer("http://b1", 0, true)
                .answer("http://c1", 0, true),
        );
        let prober = Prober::new(check.clone(), Duration::from_secs(1), 1);
        let candidates = [
            candidate("a", &["http://a1", "http://a2"]),
            candidate("b", &["http://b1", "http://b2"]),
            candidate("c", &["http://c1"]),
        ];

        assert_eq!(prober.probe(&candidates).await.unwrap().as_str(), "b");
        assert_eq!(check.started(), vec!["http://a1", "http://a2", "http://b1"]);
    }

    #[tokio::test]
    async fn test_declared_order_beats_faster_answer() {
        let check = Arc::new(
            ScriptedCheck::default()
                .answer("http://first", 200, true)
                .answer("http://second", 50, true),
        );
        let prober = Prober::new(check, Duration::from_secs(1), 4);
        let candidates = [
            candidate("first", &["http://first"]),
            candidate("second", &["http://second"]),
        ];

        assert_eq!(prober.probe(&candidates).await.unwrap().as_str(), "first");
    }

    #[tokio::test]
    async fn test_concurrent_probing_overlaps_checks() {
        let check = Arc::new(
            ScriptedCheck::default()
                .answer("http://slow", 300, false)
                .answer("http://fast", 300, true),
        );
        let prober = Prober::new(check, Duration::from_secs(1), 2);
        let candidates = [candidate("slow", &["http://slow"]), candidate("fast", &["http://fast"])];

        let started = tokio::time::Instant::now();
        assert_eq!(prober.probe(&candidates).await.unwrap().as_str(), "fast");
        assert!(started.elapsed() < Duration::from_millis(550));
    }

    #[tokio::test]
    async fn test_hung_check_is_cut_off_by_timeout() {
        let check = Arc::new(
            ScriptedCheck::default()
                .answer("http://hangs", 60_000, true)
                .answer("http://next", 0, true),
        );
        let prober = Prober::new(check, Duration::from_millis(100), 1);
        let candidates = [candidate("hangs", &["http://hangs"]), candidate("next", &["http://next"])];

        let started = tokio::time::Instant::now();
        assert_eq!(prober.probe(&candidates).await.unwrap().as_str(), "next");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_no_alive_url_is_a_miss() {
        let prober = Prober::new(Arc::new(ScriptedCheck::default()), Duration::from_secs(1), 3);
        let domain = normalize("user@nothing.example").unwrap().sanitized();

        assert_eq!(prober.probe(&default_candidates(&domain)).await, None);
        assert_eq!(prober.probe(&[]).await, None);
    }

    #[test]
    fn test_zero_concurrency_means_sequential() {
        let prober = Prober::new(Arc::new(ScriptedCheck::default()), Duration::from_secs(1), 0);
        assert_eq!(prober.concurrency, 1);
    }

    #[tokio::test]
    async fn test_http_liveness_unreachable_url() {
        let check = HttpLiveness::new(Duration::from_millis(500)).unwrap();
        assert!(!check.is_alive("http://127.0.0.1:9/").await);
        assert!(!check.is_alive("not a url").await);
    }

    #[tokio::test]
    async fn test_http_liveness_alive_statuses() {
        let check = HttpLiveness::new(Duration::from_secs(2)).unwrap();

        for (status, expected) in [
            (200, true),
            (301, true),
            (302, true),
            (303, false),
            (307, false),
            (404, false),
            (500, false),
        ] {
            let server = CannedServer::start(status, "").await;
            let url = format!("{}/webmail/", server.base_url);
            assert_eq!(check.is_alive(&url).await, expected, "status {}", status);
        }
    }

    #[tokio::test]
    async fn test_http_liveness_does_not_follow_redirects() {
        let check = HttpLiveness::new(Duration::from_secs(2)).unwrap();
        let server = CannedServer::start(302, "").await;

        assert!(check.is_alive(&format!("{}/login", server.base_url)).await);
        assert_eq!(server.requests(), vec!["HEAD /login HTTP/1.1"]);
    }
}
