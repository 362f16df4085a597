//! Shared-secret authentication for cron callers and operators.

use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Caller};

/// Accepts the configured secret in either:
/// - `Authorization: Bearer <secret>` header
/// - `X-Cron-Secret: <secret>` header
pub struct BearerSecretAuthenticator {
    secret: String,
}

impl BearerSecretAuthenticator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn presented<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        let bearer = request.header("authorization").and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        });
        bearer
            .or_else(|| request.header("x-cron-secret"))
            .map(str::trim)
    }
}

#[async_trait]
impl Authenticator for BearerSecretAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Caller, AuthError> {
        let presented = self.presented(request).ok_or(AuthError::NotAuthenticated)?;

        if constant_time_eq(presented.as_bytes(), self.secret.as_bytes()) {
            Ok(Caller {
                id: "secret_holder".to_string(),
                method: "bearer_secret",
            })
        } else {
            Err(AuthError::InvalidCredentials("secret mismatch".to_string()))
        }
    }

    fn method_name(&self) -> &'static str {
        "bearer_secret"
    }
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
