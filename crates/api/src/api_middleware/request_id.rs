//! Request ID middleware (§4.8 steps 1-2): generates or extracts a unique
//! request identifier, threads it through a [`RequestContext`] in the
//! request extensions for downstream handlers and the tracing layer, and
//! echoes it back on the response for client-side correlation.

use axum::{
    extract::Request,
    http::{header::HeaderValue, HeaderName, StatusCode},
    middleware::Next,
    response::Response,
};
use std::str::FromStr;
use taylordash_core::error::RequestContext;
use tracing::{debug, Span};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID middleware configuration and utilities.
pub struct RequestIdMiddleware {
    pub header_name: String,
    pub strict_validation: bool,
    pub auto_generate: bool,
}

impl RequestIdMiddleware {
    pub fn new() -> Self {
        Self {
            header_name: REQUEST_ID_HEADER.to_string(),
            strict_validation: true,
            auto_generate: true,
        }
    }

    pub fn with_header_name(mut self, header_name: impl Into<String>) -> Self {
        self.header_name = header_name.into();
        self
    }

    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }

    pub fn with_auto_generate(mut self, auto_generate: bool) -> Self {
        self.auto_generate = auto_generate;
        self
    }

    pub fn extract_request_id(&self, request: &Request) -> Option<String> {
        if let Some(value) = request.headers().get(&self.header_name) {
            if let Ok(id_str) = value.to_str() {
                if !self.strict_validation || is_valid_request_id(id_str) {
                    return Some(id_str.to_string());
                }
            }
        }

        if self.auto_generate {
            Some(Uuid::new_v4().to_string())
        } else {
            None
        }
    }
}

impl Default for RequestIdMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn request_id_middleware(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let request_id = extract_or_generate_request_id(&request);

    let context = enrich_request_context(RequestContext::new().with_request_id(request_id.clone()), &request);
    request.extensions_mut().insert(context);

    let span = Span::current();
    span.record("request_id", &request_id);

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_str(REQUEST_ID_HEADER).unwrap(), header_value);
    }

    debug!(request_id = %request_id, status = %response.status(), "request completed");

    Ok(response)
}

fn extract_or_generate_request_id(request: &Request) -> String {
    let possible_headers = [REQUEST_ID_HEADER, "x-correlation-id", "x-trace-id", "request-id"];

    for header_name in &possible_headers {
        if let Some(value) = request.headers().get(*header_name) {
            if let Ok(id_str) = value.to_str() {
                if is_valid_request_id(id_str) {
                    return id_str.to_string();
                }
            }
        }
    }

    Uuid::new_v4().to_string()
}

fn enrich_request_context(mut context: RequestContext, request: &Request) -> RequestContext {
    if let Some(ip) = extract_client_ip(request) {
        context = context.with_source_ip(ip);
    }

    if let Some(user_agent) = request.headers().get("user-agent") {
        if let Ok(ua_str) = user_agent.to_str() {
            context = context.with_user_agent(ua_str);
        }
    }

    context
}

fn extract_client_ip(request: &Request) -> Option<String> {
    let ip_headers = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip", "x-client-ip"];

    for header_name in &ip_headers {
        if let Some(value) = request.headers().get(*header_name) {
            if let Ok(ip_str) = value.to_str() {
                let ip = if header_name == &"x-forwarded-for" {
                    ip_str.split(',').next().unwrap_or(ip_str).trim()
                } else {
                    ip_str.trim()
                };

                if is_valid_ip(ip) {
                    return Some(ip.to_string());
                }
            }
        }
    }

    None
}

fn is_valid_request_id(id: &str) -> bool {
    if Uuid::from_str(id).is_ok() {
        return true;
    }

    id.len() <= 128 && id.len() >= 8 && id.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<std::net::IpAddr>().is_ok()
}

/// Extension trait for reading the per-request context from a handler.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
    fn request_context(&self) -> Option<&RequestContext>;
    fn source_ip(&self) -> Option<&str>;
    fn user_agent(&self) -> Option<&str>;
}

impl RequestIdExt for Request {
    fn request_id(&self) -> Option<&str> {
        self.extensions().get::<RequestContext>().map(|ctx| ctx.request_id.as_str())
    }

    fn request_context(&self) -> Option<&RequestContext> {
        self.extensions().get::<RequestContext>()
    }

    fn source_ip(&self) -> Option<&str> {
        self.extensions().get::<RequestContext>().and_then(|ctx| ctx.source_ip.as_deref())
    }

    fn user_agent(&self) -> Option<&str> {
        self.extensions().get::<RequestContext>().and_then(|ctx| ctx.user_agent.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn generates_request_id_when_absent() {
        let app = Router::new()
            .route("/", get(|| async { "OK" }))
            .layer(axum::middleware::from_fn(request_id_middleware));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let request_id = response.headers().get(REQUEST_ID_HEADER);
        assert!(request_id.is_some());
    }

    #[tokio::test]
    async fn preserves_existing_request_id() {
        let existing_id = "test-request-id-12345";

        let app = Router::new()
            .route("/", get(|| async { "OK" }))
            .layer(axum::middleware::from_fn(request_id_middleware));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(REQUEST_ID_HEADER, existing_id)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let returned_id = response.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
        assert_eq!(returned_id, existing_id);
    }

    #[test]
    fn validates_request_id_shape() {
        assert!(is_valid_request_id("550e8400-e29b-41d4-a716-446655440000"));
        assert!(is_valid_request_id("test-request-123"));
        assert!(!is_valid_request_id("abc"));
        assert!(!is_valid_request_id("test@request.id"));
    }

    #[test]
    fn extracts_first_forwarded_ip() {
        let request = Request::builder()
            .uri("/")
            .header("x-forwarded-for", "203.0.113.1, 70.41.3.18, 150.172.238.178")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&request), Some("203.0.113.1".to_string()));
    }
}
