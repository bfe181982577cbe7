//! Shared-secret credential check for the ingestion path
//!
//! A single fixed secret guards record ingestion. The secret is held only as
//! a SHA-256 digest, and candidates are compared digest-to-digest so that the
//! comparison time does not depend on how much of the candidate matches.

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Request header carrying the ingestion credential
pub const SECRET_HEADER: &str = "x-patchlog-secret";

/// Length of secrets produced by [`generate_secret`]
pub const GENERATED_SECRET_LEN: usize = 32;

/// The configured ingestion secret
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret {
    digest: [u8; 32],
}

impl SharedSecret {
    /// Wrap a configured secret. An empty secret is a configuration error.
    pub fn new(secret: &str) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::Config("ingest secret must not be empty".to_string()));
        }
        Ok(Self {
            digest: digest(secret),
        })
    }

    /// Exact, case-sensitive match; no trimming or normalisation
    pub fn verify(&self, candidate: &str) -> bool {
        let other = digest(candidate);
        self.digest
            .iter()
            .zip(other.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// Generate a random alphanumeric secret
pub fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect()
}

fn digest(value: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}
