//! Ordered substring rule tables
//!
//! Tables are plain ordered lists: the first rule whose needle occurs in the
//! subject wins, regardless of how specific later rules are. The built-in
//! tables are initialised once per process and shared read-only.

use crate::{ProviderId, Result, RouteError};
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

/// Direct domain rules, in priority order.
const DIRECT_RULES: &[(&str, &str)] = &[
    ("naver.com", "naver"),
    ("daum.net", "kakao"),
    ("kakao.com", "kakao"),
    ("hanmail.net", "kakao"),
    ("nate.com", "nate"),
    ("empas.com", "nate"),
    ("empal.com", "nate"),
    ("hanafos.com", "nate"),
    ("lycos.com", "nate"),
    ("netsgo.com", "nate"),
    ("126.com", "vip"),
    ("163.com", "vip"),
    ("qq.com", "qq"),
    ("foxmail.com", "qq"),
    ("mail.ru", "mailru"),
    ("inbox.ru", "mailru"),
    ("list.ru", "mailru"),
    ("bk.ru", "mailru"),
    ("internet.ru", "mailru"),
    ("lotte.net", "lotte"),
    ("aol.com", "aol"),
    ("freenet.de", "freenet"),
    ("libero.it", "libero"),
];

/// MX exchange rules, in priority order.
const MX_RULES: &[(&str, &str)] = &[
    ("yandex", "yandex"),
    ("worksmobile", "worksmobile"),
    (".mail.aliyun.com", "mailaliyun"),
    (".qiye.aliyun.com", "qiyealiyun"),
    (".enterprise.china.alibaba.com", "qiyealiyun"),
    (".outlook.com", "office365"),
    (".t-online.de", "t-online"),
    (".mimecast.com", "mimecast"),
    (".orange.fr", "orange"),
    (".netease.com", "netease"),
    ("mailplug.", "mailplug"),
    ("chinaemail.cn", "chinaemail"),
    ("secureserver.net", "godaddy"),
    ("spam.cafe24.com", "cafe24"),
    (".fmcity.com", "cafe24"),
    ("cgwebmail.", "gw"),
    (".daouoffice.com", "daouoffice"),
    ("emx.mail.ru", "bizmailru"),
    ("yahoodns.net", "yahoobiz"),
    ("emailsrvr.com", "emailsrvr"),
    ("mailhostbox.com", "mailhostbox"),
    ("rzone.de", "strato"),
    (".gmx.net", "gmx"),
    ("register.it", "register"),
    ("chinanetsun.com", "chinanetsun"),
    ("hiworks.co.kr", "hiworks"),
    ("mxbiz1.qq.com", "qqcom"),
    ("mxbiz2.qq.com", "qqcom"),
    (".cn4e.com", "cn4e"),
    ("mailfilter.", "hibox"),
    ("sfilter.", "LG"),
    (".mailwood.com", "LG"),
    ("webmail.", "roundcube"),
    ("bizmeka.com", "bizmeka"),
    ("secuecloud.com", "secuecloud"),
    (".serverdata.net", "owa"),
    (".ecounterp.com", "ecount"),
    (".mailinblack.com", "mailinblack"),
    ("whoisworks.com", "whois"),
];

static BUILTIN_RULES: LazyLock<Arc<RuleSet>> = LazyLock::new(|| {
    let rule_set = RuleSet {
        direct: RuleTable::from_static(DIRECT_RULES),
        mx: RuleTable::from_static(MX_RULES),
    };
    debug!(
        "Built-in rules initialized: {} direct, {} MX",
        rule_set.direct.len(),
        rule_set.mx.len()
    );
    Arc::new(rule_set)
});

/// A single `(needle, provider)` rule
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MatchRule {
    pub needle: String,
    pub provider: ProviderId,
}

impl MatchRule {
    pub fn new(needle: impl Into<String>, provider: ProviderId) -> Self {
        Self {
            needle: needle.into(),
            provider,
        }
    }

    /// Case-sensitive substring containment
    pub fn matches(&self, subject: &str) -> bool {
        subject.contains(self.needle.as_str())
    }
}

/// Priority-ordered list of rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RuleTable(Vec<MatchRule>);

impl RuleTable {
    /// Build a table from validated `(needle, provider)` pairs
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        pairs
            .into_iter()
            .map(|(needle, provider)| Ok(MatchRule::new(needle, ProviderId::new(provider)?)))
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    // Built-in pairs are known-good path segments.
    fn from_static(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(needle, provider)| {
                    MatchRule::new(*needle, ProviderId(provider.to_string()))
                })
                .collect(),
        )
    }

    /// Return the first rule, in table order, whose needle occurs in `subject`
    pub fn first_match(&self, subject: &str) -> Option<&MatchRule> {
        self.0.iter().find(|rule| rule.matches(subject))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchRule> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The two tables consulted by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    /// Matched against the login's domain
    pub direct: RuleTable,
    /// Matched against each MX exchange host
    pub mx: RuleTable,
}

/// On-disk rules file; a missing table keeps the built-in one.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesFile {
    direct: Option<RuleTable>,
    mx: Option<RuleTable>,
}

impl RuleSet {
    /// Shared built-in tables
    pub fn builtin() -> Arc<RuleSet> {
        Arc::clone(&BUILTIN_RULES)
    }

    /// Parse a TOML rules file
    ///
    /// ```toml
    /// [[direct]]
    /// needle = "example.com"
    /// provider = "example"
    ///
    /// [[mx]]
    /// needle = ".mx.example.net"
    /// provider = "example"
    /// ```
    pub fn from_toml_str(content: &str) -> Result<RuleSet> {
        let file: RulesFile = toml::from_str(content)
            .map_err(|e| RouteError::Configuration(format!("invalid rules file: {}", e)))?;

        let builtin = Self::builtin();
        let rule_set = RuleSet {
            direct: file.direct.unwrap_or_else(|| builtin.direct.clone()),
            mx: file.mx.unwrap_or_else(|| builtin.mx.clone()),
        };

        info!(
            "Rules file loaded: {} direct, {} MX",
            rule_set.direct.len(),
            rule_set.mx.len()
        );

        Ok(rule_set)
    }
}
