use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Caller};

/// Lets every trigger through as anonymous.
/// Must be explicitly configured with `auth.method = "none"`.
#[derive(Debug, Default)]
pub struct NoneAuthenticator;

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, _request: &AuthRequest) -> Result<Caller, AuthError> {
        Ok(Caller::anonymous())
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_none_authenticator_returns_anonymous() {
        let request = AuthRequest {
            headers: HashMap::new(),
            source_ip: "127.0.0.1".parse().unwrap(),
        };
        let caller = NoneAuthenticator.authenticate(&request).await.unwrap();
        assert_eq!(caller, Caller::anonymous());
        assert_eq!(NoneAuthenticator.method_name(), "none");
    }
}
