//! # Redirects Middleware
//!
//! Applies a site's configured redirect rules to incoming paths. Rules are
//! fetched once per middleware instance, lazily, on the first request to
//! need them; the `OnceCell` guard makes the one-time load explicit. A
//! failed load caches an empty rule list, so redirects stay disabled for
//! the rest of the process lifetime and routing continues normally.

use async_trait::async_trait;
use axum::http::StatusCode;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::core::error::GatewayResult;
use crate::middleware::{Middleware, Next, RequestContext};
use crate::site::redirects::{find_redirect, Redirect, RedirectType, RedirectsService};

/// Configuration for the redirects middleware
pub struct RedirectsConfig {
    /// Source of redirect rules
    pub service: std::sync::Arc<dyn RedirectsService>,

    /// Site to fetch rules for when the request state carries none
    pub site: String,
}

/// Matches and applies redirect rules
pub struct RedirectsMiddleware {
    config: RedirectsConfig,
    rules: OnceCell<Vec<Redirect>>,
}

impl RedirectsMiddleware {
    pub fn new(config: RedirectsConfig) -> Self {
        Self {
            config,
            rules: OnceCell::new(),
        }
    }

    async fn rules_for(&self, site: &str) -> &[Redirect] {
        self.rules
            .get_or_init(|| async {
                match self.config.service.fetch_redirects(site).await {
                    Ok(rules) => {
                        debug!(site, count = rules.len(), "loaded redirect rules");
                        rules
                    }
                    Err(err) => {
                        warn!(site, error = %err, "failed to load redirect rules, continuing without redirects");
                        Vec::new()
                    }
                }
            })
            .await
    }
}

#[async_trait]
impl Middleware for RedirectsMiddleware {
    fn name(&self) -> &str {
        "redirects"
    }

    async fn handle(&self, ctx: &mut dyn RequestContext, next: Next<'_>) -> GatewayResult<()> {
        let path = ctx.path().to_string();
        let site = ctx
            .state()
            .site
            .clone()
            .unwrap_or_else(|| self.config.site.clone());

        let rules = self.rules_for(&site).await;

        let Some(rule) = find_redirect(&path, rules) else {
            return next.run(ctx).await;
        };

        debug!(
            from = %path,
            to = %rule.target,
            kind = ?rule.redirect_type,
            "redirect matched"
        );

        match rule.redirect_type {
            RedirectType::Permanent => ctx.redirect(StatusCode::MOVED_PERMANENTLY, &rule.target),
            RedirectType::Temporary | RedirectType::Unknown => {
                ctx.redirect(StatusCode::FOUND, &rule.target)
            }
            RedirectType::ServerTransfer => {
                let target = rule.target.clone();
                ctx.set_path(&target);
                ctx.state_mut().original_path = Some(path);
                ctx.state_mut().rewrite_path = Some(target);
                next.run(ctx).await
            }
        }
    }
}
