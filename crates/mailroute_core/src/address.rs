//! Domain extraction from login identifiers

use crate::InvalidAddress;
use std::fmt;

/// Lower-cased, trimmed domain part of a login.
///
/// Used as-is for rule matching; no further syntax checks are applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain(String);

impl Domain {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Strip everything outside `[a-z0-9.-]` for use inside probe URLs
    pub fn sanitized(&self) -> SanitizedDomain {
        SanitizedDomain::new(&self.0)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Domain reduced to URL-safe host characters. Never used for rule matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SanitizedDomain(String);

impl SanitizedDomain {
    /// Keep only ASCII letters, digits, `.` and `-`
    pub fn new(host: &str) -> Self {
        Self(
            host.chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SanitizedDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the domain of a login
///
/// The domain is the text between the first and second `@`, trimmed and
/// lower-cased.
///
/// # Returns
/// * `Ok(Domain)` when a non-empty domain part exists
/// * `Err(InvalidAddress::MissingParameter)` for an empty login
/// * `Err(InvalidAddress::InvalidEmail)` when there is no `@` or the domain is blank
pub fn normalize(address: &str) -> Result<Domain, InvalidAddress> {
    if address.is_empty() {
        return Err(InvalidAddress::MissingParameter);
    }

    let domain = address
        .split('@')
        .nth(1)
        .map(|part| part.trim().to_lowercase())
        .unwrap_or_default();

    if domain.is_empty() {
        return Err(InvalidAddress::InvalidEmail);
    }

    Ok(Domain(domain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_valid_addresses() {
        assert_eq!(normalize("user@Naver.COM").unwrap().as_str(), "naver.com");
        assert_eq!(normalize("user@  example.org ").unwrap().as_str(), "example.org");
        assert_eq!(normalize("@example.org").unwrap().as_str(), "example.org");
    }

    #[test]
    fn test_normalize_takes_second_part() {
        assert_eq!(normalize("a@b.com@c.com").unwrap().as_str(), "b.com");
    }

    #[test]
    fn test_normalize_rejects_unusable_input() {
        assert_eq!(normalize(""), Err(InvalidAddress::MissingParameter));
        assert_eq!(normalize("no-at-sign"), Err(InvalidAddress::InvalidEmail));
        assert_eq!(normalize("user@"), Err(InvalidAddress::InvalidEmail));
        assert_eq!(normalize("user@   "), Err(InvalidAddress::InvalidEmail));
        assert_eq!(normalize("   "), Err(InvalidAddress::InvalidEmail));
    }

    #[test]
    fn test_garbage_domains_pass_through() {
        let domain = normalize("user@exa mple!.com").unwrap();
        assert_eq!(domain.as_str(), "exa mple!.com");
        assert_eq!(domain.sanitized().as_str(), "example.com");
    }

    #[test]
    fn test_sanitized_keeps_host_characters() {
        let domain = normalize("user@mail-01.corp.example.co.kr").unwrap();
        assert_eq!(domain.sanitized().as_str(), "mail-01.corp.example.co.kr");

        let domain = normalize("user@x/../y?z#w_").unwrap();
        assert_eq!(domain.sanitized().as_str(), "x..yzw");

        let domain = normalize("user@bücher.de").unwrap();
        assert_eq!(domain.sanitized().as_str(), "bcher.de");
    }
}
