use async_trait::async_trait;
use thiserror::Error;

use super::session::User;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("Identity lookup failed: {0}")]
    Lookup(String),
}

/// Resolves a credential token to the identity it belongs to.
///
/// `Ok(None)` means the token is not recognized. Errors mean the provider
/// could not answer; callers treat both as signed out.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Option<User>, IdentityError>;
}

/// Deterministic stand-in for a real identity provider.
///
/// Every non-empty token resolves to the same configured user. Useful for
/// demos and tests; it performs no validation at all.
#[derive(Debug, Clone)]
pub struct PlaceholderIdentity {
    user: User,
}

impl PlaceholderIdentity {
    pub fn new(user: User) -> Self {
        Self { user }
    }
}

impl Default for PlaceholderIdentity {
    fn default() -> Self {
        Self::new(User::new("1", "John Doe", "john@example.com"))
    }
}

#[async_trait]
impl IdentityProvider for PlaceholderIdentity {
    async fn resolve(&self, token: &str) -> Result<Option<User>, IdentityError> {
        if token.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(self.user.clone()))
    }
}
