//! Liveness endpoint served from inside the middleware chain.

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::core::error::GatewayResult;
use crate::middleware::{Middleware, Next, RequestContext};

/// Configuration for the healthcheck middleware
#[derive(Debug, Clone)]
pub struct HealthcheckConfig {
    /// Endpoint path
    pub path: String,

    /// Response payload
    pub response: Value,
}

impl Default for HealthcheckConfig {
    fn default() -> Self {
        Self {
            path: "/healthz".to_string(),
            response: json!({ "status": "ok" }),
        }
    }
}

/// Short-circuits requests to the healthcheck path with a static response
pub struct HealthcheckMiddleware {
    config: HealthcheckConfig,
}

impl HealthcheckMiddleware {
    pub fn new(config: HealthcheckConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Middleware for HealthcheckMiddleware {
    fn name(&self) -> &str {
        "healthcheck"
    }

    async fn handle(&self, ctx: &mut dyn RequestContext, next: Next<'_>) -> GatewayResult<()> {
        if ctx.path() == self.config.path {
            return ctx.json(StatusCode::OK, self.config.response.clone());
        }
        next.run(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{HeaderMap, Method};

    use super::*;
    use crate::middleware::{Handler, HttpContext, MiddlewareChain};

    struct NeverHandler;

    #[async_trait]
    impl Handler for NeverHandler {
        async fn call(&self, _ctx: &mut dyn RequestContext) -> GatewayResult<()> {
            panic!("terminal handler must not run for healthcheck requests");
        }
    }

    struct OkHandler;

    #[async_trait]
    impl Handler for OkHandler {
        async fn call(&self, ctx: &mut dyn RequestContext) -> GatewayResult<()> {
            ctx.string(StatusCode::OK, "handled")
        }
    }

    #[tokio::test]
    async fn test_healthcheck_short_circuits() {
        let chain = MiddlewareChain::new().with(Arc::new(HealthcheckMiddleware::new(
            HealthcheckConfig::default(),
        )));
        let mut ctx =
            HttpContext::new(Method::GET, &"/healthz".parse().unwrap(), HeaderMap::new());

        chain.handle(&mut ctx, &NeverHandler).await.unwrap();

        let parts = ctx.take_response();
        assert_eq!(parts.status, Some(StatusCode::OK));
        assert_eq!(parts.body, serde_json::to_vec(&json!({"status": "ok"})).unwrap());
    }

    #[tokio::test]
    async fn test_other_paths_pass_through() {
        let chain = MiddlewareChain::new().with(Arc::new(HealthcheckMiddleware::new(
            HealthcheckConfig::default(),
        )));
        let mut ctx =
            HttpContext::new(Method::GET, &"/products".parse().unwrap(), HeaderMap::new());

        chain.handle(&mut ctx, &OkHandler).await.unwrap();

        let parts = ctx.take_response();
        assert_eq!(parts.body, b"handled");
    }
}
