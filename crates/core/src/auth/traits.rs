use async_trait::async_trait;
use thiserror::Error;

use super::types::{AuthRequest, Caller};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Guards the run trigger endpoints.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Caller, AuthError>;

    /// Name of this authentication method
    fn method_name(&self) -> &'static str;
}
