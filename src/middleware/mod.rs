//! # Middleware Pipeline System
//!
//! Request processing is composed from an ordered list of middleware, each
//! of which may inspect the request context, annotate shared state, rewrite
//! the path, or write a terminal response. A middleware continues the chain
//! by running its [`Next`] continuation; not running it short-circuits the
//! remainder (used by the healthcheck gate and by redirect responses).
//!
//! The chain is an explicit slice walked by `Next`, so execution order is
//! exactly construction order and there is no closure nesting to grow with
//! chain length. The terminal [`Handler`] is reached only when every
//! middleware has called through.

pub mod context;
pub mod editing_security;
pub mod healthcheck;
pub mod locale;
pub mod multisite;
pub mod redirects;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::core::error::GatewayResult;

pub use self::context::{
    HttpContext, RequestContext, RequestState, ResponseParts, SameSite, SetCookie,
};
pub use self::editing_security::{EditingSecurityConfig, EditingSecurityMiddleware};
pub use self::healthcheck::{HealthcheckConfig, HealthcheckMiddleware};
pub use self::locale::{LocaleConfig, LocaleMiddleware};
pub use self::multisite::{MultisiteConfig, MultisiteMiddleware};
pub use self::redirects::{RedirectsConfig, RedirectsMiddleware};

/// A single middleware in the processing chain
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Middleware name for identification and logging
    fn name(&self) -> &str;

    /// Process the request, calling `next.run(ctx)` to continue the chain
    async fn handle(&self, ctx: &mut dyn RequestContext, next: Next<'_>) -> GatewayResult<()>;
}

/// Terminal handler invoked when the whole chain has called through
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, ctx: &mut dyn RequestContext) -> GatewayResult<()>;
}

/// Continuation over the remaining middleware plus the terminal handler
///
/// Consuming `run` exactly once continues the chain; dropping it without
/// running short-circuits everything downstream.
pub struct Next<'a> {
    remaining: &'a [Arc<dyn Middleware>],
    terminal: &'a dyn Handler,
}

impl<'a> Next<'a> {
    /// Run the rest of the chain
    pub async fn run(self, ctx: &mut dyn RequestContext) -> GatewayResult<()> {
        match self.remaining.split_first() {
            Some((middleware, rest)) => {
                debug!(middleware = middleware.name(), "entering middleware");
                middleware
                    .handle(
                        ctx,
                        Next {
                            remaining: rest,
                            terminal: self.terminal,
                        },
                    )
                    .await
            }
            None => self.terminal.call(ctx).await,
        }
    }
}

/// Ordered middleware chain
///
/// Built once at startup and shared across requests; per-request execution
/// walks the list in construction order.
#[derive(Default)]
pub struct MiddlewareChain {
    middleware: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middleware: Vec::new(),
        }
    }

    /// Append a middleware to the end of the chain
    pub fn with(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Number of middleware in the chain
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Execute the chain for one request
    pub async fn handle(
        &self,
        ctx: &mut dyn RequestContext,
        terminal: &dyn Handler,
    ) -> GatewayResult<()> {
        Next {
            remaining: self.middleware.as_slice(),
            terminal,
        }
        .run(ctx)
        .await
    }
}
