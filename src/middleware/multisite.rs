//! # Multisite Resolution Middleware
//!
//! Determines the active site for a request using a four-tier precedence
//! chain — `site` query parameter, site cookie, hostname, configured
//! default — stopping at the first tier that yields a non-empty name.
//!
//! Resolution always ends with the site cookie refreshed (even when the
//! cookie itself supplied the answer) and the path rewritten through the
//! site codec, with both the original and rewritten path recorded in the
//! request state for downstream consumers.

use async_trait::async_trait;
use tracing::debug;

use crate::client::rewrite;
use crate::core::error::GatewayResult;
use crate::middleware::{Middleware, Next, RequestContext, SameSite, SetCookie};
use crate::site::{Site, SiteResolver};

/// Configuration for the multisite middleware
#[derive(Debug, Clone)]
pub struct MultisiteConfig {
    /// Pass requests through untouched when disabled
    pub enabled: bool,

    /// Configured site records
    pub sites: Vec<Site>,

    /// Fallback site when no tier matches
    pub default_site: Site,

    /// Whether the site cookie participates in resolution
    pub use_cookie_resolution: bool,

    /// Site cookie name
    pub cookie_name: String,

    pub cookie_secure: bool,
    pub cookie_http_only: bool,
    /// SameSite=None so the cookie stays readable inside an editor iframe
    pub cookie_same_site: SameSite,
}

impl Default for MultisiteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sites: Vec::new(),
            default_site: Site::default(),
            use_cookie_resolution: true,
            cookie_name: "sc_site".to_string(),
            cookie_secure: true,
            cookie_http_only: true,
            cookie_same_site: SameSite::None,
        }
    }
}

/// Resolves the active site and annotates the request state
pub struct MultisiteMiddleware {
    config: MultisiteConfig,
    resolver: SiteResolver,
}

impl MultisiteMiddleware {
    pub fn new(config: MultisiteConfig) -> Self {
        let resolver = SiteResolver::new(config.sites.clone(), config.default_site.clone());
        Self { config, resolver }
    }

    /// Hostname from `X-Forwarded-Host` (proxies) or `Host`, normalized
    fn hostname(&self, ctx: &dyn RequestContext) -> String {
        let raw = ctx
            .header("x-forwarded-host")
            .filter(|host| !host.is_empty())
            .or_else(|| ctx.header("host"))
            .unwrap_or_default();
        crate::site::resolver::normalize_hostname(raw)
    }

    fn resolve_site_name(&self, ctx: &dyn RequestContext, hostname: &str) -> String {
        // 1. Explicit query parameter (preview mode); wins even when the
        // name matches no configured record.
        if let Some(param) = ctx.query("site") {
            if !param.is_empty() {
                debug!(site = param, "site from query parameter");
                return param.to_string();
            }
        }

        // 2. Site cookie
        if self.config.use_cookie_resolution {
            if let Some(value) = ctx.cookie(&self.config.cookie_name) {
                if !value.is_empty() {
                    debug!(site = value, "site from cookie");
                    return value.to_string();
                }
            }
        }

        // 3. Hostname (falls back to the default record internally)
        let site = self.resolver.get_by_host(hostname);
        if !site.name.is_empty() {
            debug!(site = %site.name, hostname, "site from hostname");
            return site.name.clone();
        }

        // 4. Configured default
        debug!(site = %self.config.default_site.name, "site from default");
        self.config.default_site.name.clone()
    }
}

#[async_trait]
impl Middleware for MultisiteMiddleware {
    fn name(&self) -> &str {
        "multisite"
    }

    async fn handle(&self, ctx: &mut dyn RequestContext, next: Next<'_>) -> GatewayResult<()> {
        if !self.config.enabled {
            debug!("multisite disabled, skipping");
            return next.run(ctx).await;
        }

        let hostname = self.hostname(ctx);
        let path = ctx.path().to_string();
        let site_name = self.resolve_site_name(ctx, &hostname);

        ctx.state_mut().site = Some(site_name.clone());

        // Refresh the cookie regardless of which tier resolved the site
        let mut cookie = SetCookie::new(&self.config.cookie_name, &site_name);
        cookie.secure = self.config.cookie_secure;
        cookie.http_only = self.config.cookie_http_only;
        cookie.same_site = self.config.cookie_same_site;
        ctx.set_cookie(cookie);

        let rewrite_path = rewrite::encode_site(&path, &site_name);
        debug!(site = %site_name, rewrite = %rewrite_path, "site resolved");
        ctx.state_mut().rewrite_path = Some(rewrite_path);
        ctx.state_mut().original_path = Some(path);

        next.run(ctx).await
    }
}
