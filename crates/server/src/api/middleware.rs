//! Authentication and metrics middleware for API routes.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use liftwatch_core::{AuthError, AuthRequest, Caller};

use super::error::ApiError;
use crate::metrics::{
    normalize_path, AUTH_FAILURES_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

/// Records request duration, count and in-flight gauge.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();
    let response = next.run(request).await;
    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Validates trigger requests with the configured authenticator and stores
/// the resulting `Caller` in request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let headers: HashMap<String, String> = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect();

    let source_ip = request
        .extensions()
        .get::<SocketAddr>()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    let auth_request = AuthRequest { headers, source_ip };

    match state.authenticator().authenticate(&auth_request).await {
        Ok(caller) => {
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(err) => {
            let (reason, status) = match &err {
                AuthError::NotAuthenticated => ("not_authenticated", StatusCode::UNAUTHORIZED),
                AuthError::InvalidCredentials(_) => {
                    ("invalid_credentials", StatusCode::UNAUTHORIZED)
                }
                AuthError::ConfigurationError(_) => {
                    ("internal_error", StatusCode::INTERNAL_SERVER_ERROR)
                }
            };
            AUTH_FAILURES_TOTAL.with_label_values(&[reason]).inc();
            tracing::warn!(source_ip = %source_ip, reason, "Trigger request rejected");
            ApiError {
                status,
                message: err.to_string(),
            }
            .into_response()
        }
    }
}

/// Extractor for the caller that passed `auth_middleware`.
///
/// Falls back to the anonymous caller on routes without the middleware.
#[derive(Debug, Clone)]
pub struct TriggeredBy(pub Caller);

impl<S> FromRequestParts<S> for TriggeredBy
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let caller = parts
            .extensions
            .get::<Caller>()
            .cloned()
            .unwrap_or_else(Caller::anonymous);
        std::future::ready(Ok(TriggeredBy(caller)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header, Request},
        middleware,
        routing::get,
        Router,
    };
    use http_body_util::BodyExt;
    use liftwatch_core::{
        auth::{BearerSecretAuthenticator, NoneAuthenticator},
        load_config_from_str,
        store::MemoryStatusStore,
        testing::fixtures,
        AdapterRegistry, AlertHandle, Authenticator, CollectionPipeline, OrchestratorConfig,
    };
    use tower::ServiceExt;

    async fn caller_handler(TriggeredBy(caller): TriggeredBy) -> String {
        format!("{}:{}", caller.method, caller.id)
    }

    fn test_state(authenticator: Arc<dyn Authenticator>) -> Arc<AppState> {
        let config = load_config_from_str("[auth]\nmethod = \"none\"\n").unwrap();
        let pipeline = CollectionPipeline::new(
            Arc::new(fixtures::roster()),
            AdapterRegistry::new(),
            Arc::new(MemoryStatusStore::new()),
            AlertHandle::disabled(),
            OrchestratorConfig::default(),
        );
        Arc::new(AppState::new(
            config,
            Arc::new(pipeline),
            authenticator,
            None,
        ))
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/test", get(caller_handler))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    fn bearer_state() -> Arc<AppState> {
        test_state(Arc::new(BearerSecretAuthenticator::new("cron-secret")))
    }

    async fn body_text(response: Response) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_none_auth_allows_all() {
        let app = app(test_state(Arc::new(NoneAuthenticator)));

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "none:anonymous");
    }

    #[tokio::test]
    async fn test_bearer_secret_valid() {
        let app = app(bearer_state());

        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer cron-secret")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.starts_with("bearer_secret:"));
    }

    #[tokio::test]
    async fn test_cron_secret_header() {
        let app = app(bearer_state());

        let request = Request::builder()
            .uri("/test")
            .header("X-Cron-Secret", "cron-secret")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bearer_secret_invalid() {
        let app = app(bearer_state());

        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer wrong")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bearer_secret_missing() {
        let app = app(bearer_state());

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(response).await.contains("Authentication required"));
    }
}
