//! # Editing Security Gate
//!
//! Protects editor-facing endpoints with a shared secret and an
//! origin allow-list. Three concerns, enforced independently:
//!
//! - **Preflight**: `OPTIONS` requests from an allowed origin get the full
//!   CORS header set and 204; anything else gets a bare 403.
//! - **Secret**: non-`OPTIONS` requests must carry the configured secret as
//!   a `secret` query parameter; missing and mismatched secrets produce
//!   distinguishable 401 bodies.
//! - **Iframe policy**: `Content-Security-Policy: frame-ancestors` is set
//!   from the allow-list regardless of the CORS and secret outcomes.
//!
//! An empty allow-list is development mode and allows every origin; a
//! literal `"*"` entry allows every origin too, but responses still echo
//! the specific request origin so credentialed requests keep working.

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tracing::debug;

use crate::core::error::GatewayResult;
use crate::middleware::{Middleware, Next, RequestContext};

const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-Requested-With";
const EXPOSE_HEADERS: &str = "Content-Length, Content-Type";
const MAX_AGE_SECS: &str = "3600";

/// Configuration for the editing security gate
#[derive(Debug, Clone, Default)]
pub struct EditingSecurityConfig {
    /// Shared editing secret
    pub secret: String,

    /// Origins allowed to call editing endpoints; empty = dev mode
    pub allowed_origins: Vec<String>,

    /// Skip secret validation (testing only)
    pub skip_secret_validation: bool,
}

/// Validates the editing secret and enforces origin-scoped CORS/CSP
pub struct EditingSecurityMiddleware {
    config: EditingSecurityConfig,
}

impl EditingSecurityMiddleware {
    pub fn new(config: EditingSecurityConfig) -> Self {
        Self { config }
    }

    fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.config.allowed_origins.is_empty() {
            debug!("no allowed origins configured, allowing all origins (development mode)");
            return true;
        }
        self.config
            .allowed_origins
            .iter()
            .any(|allowed| allowed == origin || allowed == "*")
    }

    fn handle_preflight(&self, ctx: &mut dyn RequestContext, origin: &str) -> GatewayResult<()> {
        if !origin.is_empty() && self.is_origin_allowed(origin) {
            ctx.set_header("Access-Control-Allow-Origin", origin);
            ctx.set_header("Access-Control-Allow-Credentials", "true");
            ctx.set_header("Access-Control-Allow-Methods", ALLOW_METHODS);
            ctx.set_header("Access-Control-Allow-Headers", ALLOW_HEADERS);
            ctx.set_header("Access-Control-Max-Age", MAX_AGE_SECS);
            debug!(origin, "CORS preflight accepted");
            return ctx.no_content(StatusCode::NO_CONTENT);
        }

        debug!(origin, "CORS preflight rejected");
        ctx.no_content(StatusCode::FORBIDDEN)
    }

    fn set_cors_headers(&self, ctx: &mut dyn RequestContext, origin: &str) {
        if !origin.is_empty() && self.is_origin_allowed(origin) {
            ctx.set_header("Access-Control-Allow-Origin", origin);
            ctx.set_header("Access-Control-Allow-Credentials", "true");
            ctx.set_header("Access-Control-Expose-Headers", EXPOSE_HEADERS);
        }
    }

    fn set_frame_ancestors(&self, ctx: &mut dyn RequestContext) {
        let allow_all = self.config.allowed_origins.is_empty()
            || self.config.allowed_origins.iter().any(|o| o == "*");

        let policy = if allow_all {
            "frame-ancestors *".to_string()
        } else {
            format!("frame-ancestors {}", self.config.allowed_origins.join(" "))
        };
        ctx.set_header("Content-Security-Policy", &policy);
    }
}

#[async_trait]
impl Middleware for EditingSecurityMiddleware {
    fn name(&self) -> &str {
        "editing-security"
    }

    async fn handle(&self, ctx: &mut dyn RequestContext, next: Next<'_>) -> GatewayResult<()> {
        let origin = ctx.header("origin").unwrap_or_default().to_string();

        if ctx.method() == &Method::OPTIONS {
            return self.handle_preflight(ctx, &origin);
        }

        // Iframe policy applies whatever the secret validation decides
        self.set_frame_ancestors(ctx);

        if !self.config.skip_secret_validation {
            let secret = ctx.query("secret").unwrap_or_default();
            if secret.is_empty() {
                debug!("editing secret missing in request");
                return ctx.json(
                    StatusCode::UNAUTHORIZED,
                    json!({ "error": "Unauthorized: editing secret is required" }),
                );
            }
            if secret != self.config.secret {
                debug!("invalid editing secret provided");
                return ctx.json(
                    StatusCode::UNAUTHORIZED,
                    json!({ "error": "Unauthorized: invalid editing secret" }),
                );
            }
        }

        self.set_cors_headers(ctx, &origin);

        next.run(ctx).await
    }
}
