//! Table matching for the direct and MX stages

use crate::{address::Domain, dns::MxRecord, rules::RuleTable, ProviderId};
use tracing::debug;

/// Match a domain against the direct table; first rule in table order wins
pub fn match_static(domain: &Domain, table: &RuleTable) -> Option<ProviderId> {
    let rule = table.first_match(domain.as_str())?;
    debug!("Domain {} matched direct rule {:?}", domain, rule.needle);
    Some(rule.provider.clone())
}

/// Match MX records against the MX table
///
/// Records are visited in the order given (DNS order, never re-sorted by
/// preference) and each record is checked against every rule before the
/// next record is looked at. The first record matching any rule decides,
/// using that record's first matching rule.
pub fn match_mx(records: &[MxRecord], table: &RuleTable) -> Option<ProviderId> {
    records.iter().find_map(|record| {
        let rule = table.first_match(&record.exchange)?;
        debug!(
            "MX exchange {} matched rule {:?}",
            record.exchange, rule.needle
        );
        Some(rule.provider.clone())
    })
}
