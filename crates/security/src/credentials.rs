//! Salted password hashes and the static credential store.
//!
//! Hash format: `hmac-sha256$<salt-hex>$<digest-hex>`, where the digest is
//! HMAC-SHA256 over the password keyed by a random 16-byte salt.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use shanghan_config::UserConfig;
use shanghan_core::CredentialStore;

type HmacSha256 = Hmac<Sha256>;

const SCHEME: &str = "hmac-sha256";
const SALT_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Malformed password hash for {email}: {reason}")]
    MalformedHash { email: String, reason: String },

    #[error("Hashing failed: {0}")]
    Hashing(String),
}

/// A parsed salted password hash.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash {
    salt: Vec<u8>,
    digest: Vec<u8>,
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHash").finish_non_exhaustive()
    }
}

impl PasswordHash {
    /// Parse the `scheme$salt$digest` form.
    pub fn parse(encoded: &str) -> Result<Self, String> {
        let mut parts = encoded.trim().split('$');
        let (Some(scheme), Some(salt), Some(digest), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err("expected hmac-sha256$<salt>$<digest>".into());
        };
        if scheme != SCHEME {
            return Err(format!("unsupported scheme '{scheme}'"));
        }
        let salt = hex::decode(salt).map_err(|e| format!("salt: {e}"))?;
        let digest = hex::decode(digest).map_err(|e| format!("digest: {e}"))?;
        if salt.is_empty() || digest.len() != 32 {
            return Err("salt must be non-empty and digest 32 bytes".into());
        }
        Ok(Self { salt, digest })
    }

    /// Constant-time comparison of `password` against the stored digest.
    pub fn verify(&self, password: &str) -> bool {
        match HmacSha256::new_from_slice(&self.salt) {
            Ok(mut mac) => {
                mac.update(password.as_bytes());
                mac.verify_slice(&self.digest).is_ok()
            }
            Err(_) => false,
        }
    }

    pub fn encode(&self) -> String {
        format!("{SCHEME}${}${}", hex::encode(&self.salt), hex::encode(&self.digest))
    }
}

/// Hash `password` with a fresh random salt.
///
/// One HMAC-SHA256 pass: cheap to compute, so it is not a substitute for a
/// password KDF if the config file leaks.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt: [u8; SALT_LEN] = rand::random();
    let mut mac =
        HmacSha256::new_from_slice(&salt).map_err(|e| CredentialError::Hashing(e.to_string()))?;
    mac.update(password.as_bytes());
    let hash = PasswordHash {
        salt: salt.to_vec(),
        digest: mac.finalize().into_bytes().to_vec(),
    };
    Ok(hash.encode())
}

/// Short, stable, non-reversible tag for an email (first 8 hex chars of SHA-256).
pub fn user_hash(email: &str) -> String {
    let digest = Sha256::digest(email.as_bytes());
    hex::encode(&digest[..4])
}

struct Account {
    hash: PasswordHash,
    admin: bool,
}

/// Credential store built from the configured `[[users]]`.
pub struct StaticCredentialStore {
    accounts: HashMap<String, Account>,
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

impl StaticCredentialStore {
    pub fn from_config(users: &[UserConfig]) -> Result<Self, CredentialError> {
        let mut accounts = HashMap::with_capacity(users.len());
        for user in users {
            let hash = PasswordHash::parse(&user.password_hash).map_err(|reason| {
                CredentialError::MalformedHash {
                    email: user.email.clone(),
                    reason,
                }
            })?;
            accounts.insert(
                normalize(&user.email),
                Account {
                    hash,
                    admin: user.admin,
                },
            );
        }
        if accounts.is_empty() {
            tracing::warn!("No users configured; every login will be rejected");
        }
        Ok(Self { accounts })
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl CredentialStore for StaticCredentialStore {
    fn verify(&self, email: &str, password: &str) -> bool {
        self.accounts
            .get(&normalize(email))
            .is_some_and(|account| account.hash.verify(password))
    }

    fn is_admin(&self, email: &str) -> bool {
        self.accounts
            .get(&normalize(email))
            .is_some_and(|account| account.admin)
    }
}
