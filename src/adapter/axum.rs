//! # Axum Adapter
//!
//! Binds the framework-agnostic context abstraction to axum: an inbound
//! request becomes an [`HttpContext`], the middleware chain runs against
//! it, and the captured response parts are converted back into an axum
//! response. All resolution logic stays behind the [`RequestContext`]
//! trait; this file is the only place axum request/response plumbing
//! appears.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, MethodRouter};
use tracing::error;

use crate::middleware::context::ResponseParts;
use crate::middleware::{Handler, HttpContext, MiddlewareChain, RequestContext};

/// One middleware chain plus its terminal handler, servable by axum
pub struct GatewayService {
    chain: MiddlewareChain,
    terminal: Arc<dyn Handler>,
}

impl GatewayService {
    pub fn new(chain: MiddlewareChain, terminal: Arc<dyn Handler>) -> Self {
        Self { chain, terminal }
    }

    /// Run the chain for one axum request
    pub async fn handle(&self, request: Request) -> Response {
        let (parts, _body) = request.into_parts();
        let mut ctx = HttpContext::new(parts.method, &parts.uri, parts.headers);
        let request_id = ctx.request_id().to_string();

        if let Err(err) = self.chain.handle(&mut ctx, self.terminal.as_ref()).await {
            error!(request_id = %request_id, error = %err, "request processing failed");
            return err.into_response();
        }

        into_axum_response(ctx.take_response())
    }
}

/// Build an axum method router delegating every method to the service
pub fn route_service(service: Arc<GatewayService>) -> MethodRouter {
    any(move |request: Request| {
        let service = Arc::clone(&service);
        async move { service.handle(request).await }
    })
}

fn into_axum_response(parts: ResponseParts) -> Response {
    // A chain that completes without committing produced no answer for
    // this route.
    let status = parts.status.unwrap_or(StatusCode::NOT_FOUND);

    let mut response = Response::builder().status(status);

    if let Some(headers) = response.headers_mut() {
        *headers = parts.headers;
        for cookie in &parts.cookies {
            if let Ok(value) = cookie.header_value().parse() {
                headers.append("set-cookie", value);
            }
        }
    }

    response
        .body(Body::from(parts.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::http::Method;
    use serde_json::json;

    use super::*;
    use crate::core::error::GatewayResult;

    struct JsonHandler;

    #[async_trait]
    impl Handler for JsonHandler {
        async fn call(&self, ctx: &mut dyn RequestContext) -> GatewayResult<()> {
            let mut cookie = crate::middleware::SetCookie::new("sc_site", "acme");
            cookie.same_site = crate::middleware::SameSite::None;
            ctx.set_cookie(cookie);
            ctx.json(StatusCode::OK, json!({"ok": true}))
        }
    }

    #[tokio::test]
    async fn test_request_round_trip() {
        let service = GatewayService::new(MiddlewareChain::new(), Arc::new(JsonHandler));

        let request = axum::http::Request::builder()
            .method(Method::GET)
            .uri("/anything")
            .body(Body::empty())
            .unwrap();

        let response = service.handle(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
        let cookie = response.headers().get("set-cookie").unwrap();
        assert!(cookie.to_str().unwrap().starts_with("sc_site=acme"));
    }
}
