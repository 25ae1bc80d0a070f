//! Login pseudonymization for logs
//!
//! Logins are personal data. Request logs only ever carry the domain plus a
//! salted SHA-256 digest of the local part.

use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

/// Number of hex characters of the digest kept in masked logins
const MASK_PREFIX_LEN: usize = 12;

/// Privacy-preserving login processor with salted hashing
pub struct PrivacyProcessor {
    salt: Vec<u8>,
}

impl PrivacyProcessor {
    /// Create a processor with a fixed salt
    ///
    /// A fixed salt keeps masked logins comparable across restarts.
    pub fn new(salt: Vec<u8>) -> Self {
        debug!("Privacy processor initialized with {}-byte salt", salt.len());
        Self { salt }
    }

    /// Create a processor with a per-process random salt
    pub fn with_random_salt() -> Self {
        Self::new(Uuid::new_v4().as_bytes().to_vec())
    }

    /// Hex-encoded SHA-256 of the salted local part
    pub fn hash_local_part(&self, local_part: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.salt);
        hasher.update(local_part.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Replace the local part of a login with a short digest
    ///
    /// `john.doe@example.com` becomes `3f1c9a0b7d2e@example.com`. Input without
    /// `@` is hashed as a whole so nothing readable leaks.
    pub fn mask_login(&self, login: &str) -> String {
        match login.split_once('@') {
            Some((local_part, domain)) => {
                let hash = self.hash_local_part(local_part);
                format!("{}@{}", &hash[..MASK_PREFIX_LEN], domain)
            }
            None => {
                let hash = self.hash_local_part(login);
                hash[..MASK_PREFIX_LEN].to_string()
            }
        }
    }
}
