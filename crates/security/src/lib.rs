//! Security module for the chat service: credentials, user hashing, and
//! audit logging.
//!
//! Provides:
//! - **Credentials**: salted HMAC-SHA256 password hashes and the static
//!   credential store built from `[[users]]`
//! - **User hash**: short SHA-256 tag used in place of emails in file names
//! - **Audit logging**: structured user-action events

pub mod audit;
pub mod credentials;

pub use audit::{AuditEntry, AuditEvent, AuditLogger, AuditOutcome, AuditSink, TracingSink};
pub use credentials::{
    CredentialError, PasswordHash, StaticCredentialStore, hash_password, user_hash,
};
