mod bearer_secret;
mod none;
mod traits;
mod types;

pub use bearer_secret::BearerSecretAuthenticator;
pub use none::NoneAuthenticator;
pub use traits::*;
pub use types::*;

use std::sync::Arc;

use crate::config::{AuthConfig, AuthMethod};

/// Factory function to create authenticator from config
pub fn create_authenticator(config: &AuthConfig) -> Result<Arc<dyn Authenticator>, AuthError> {
    match config.method {
        AuthMethod::None => Ok(Arc::new(NoneAuthenticator)),
        AuthMethod::BearerSecret => {
            let secret = config
                .secret
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    AuthError::ConfigurationError(
                        "secret must be set when using bearer_secret auth method".to_string(),
                    )
                })?;
            Ok(Arc::new(BearerSecretAuthenticator::new(secret)))
        }
    }
}
