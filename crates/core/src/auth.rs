//! Credential lookup: the authentication collaborator.
//!
//! A successful `verify` is the precondition for opening a chat session.

/// Verifies login credentials and answers role questions.
pub trait CredentialStore: Send + Sync {
    /// Whether `password` is correct for `email`.
    fn verify(&self, email: &str, password: &str) -> bool;

    /// Whether `email` may use the admin endpoints.
    fn is_admin(&self, email: &str) -> bool;
}
