//! # Locale Resolution Middleware
//!
//! Determines the active locale using a five-tier precedence chain:
//!
//! 1. First path segment, when it is shaped like a locale token and is in
//!    the supported list
//! 2. `sc_lang` then `locale` query parameter
//! 3. Existing locale cookie
//! 4. `Accept-Language` header — first listed supported tag wins, exact
//!    match then primary subtag; quality weights are stripped and ignored
//! 5. Configured default (always succeeds)
//!
//! Every tier except the cookie one (already current) persists the
//! decision in the locale cookie. Resolution never fails: downstream
//! handlers always observe a non-empty locale.

use async_trait::async_trait;
use tracing::debug;

use crate::core::error::GatewayResult;
use crate::middleware::{Middleware, Next, RequestContext, SameSite, SetCookie};

const ONE_YEAR_SECS: i64 = 365 * 24 * 60 * 60;

/// Configuration for the locale middleware
#[derive(Debug, Clone)]
pub struct LocaleConfig {
    /// Fallback language
    pub default_language: String,

    /// Accepted languages; empty accepts anything
    pub supported_languages: Vec<String>,

    /// Locale cookie name
    pub cookie_name: String,

    /// Whether tier 4 (`Accept-Language`) participates
    pub use_accept_language: bool,

    pub cookie_secure: bool,
    /// Readable by client-side script, so HttpOnly stays off
    pub cookie_http_only: bool,
    pub cookie_same_site: SameSite,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            supported_languages: Vec::new(),
            cookie_name: "sc_locale".to_string(),
            use_accept_language: true,
            cookie_secure: true,
            cookie_http_only: false,
            cookie_same_site: SameSite::Lax,
        }
    }
}

/// Resolves the active locale and annotates the request state
pub struct LocaleMiddleware {
    config: LocaleConfig,
}

impl LocaleMiddleware {
    pub fn new(config: LocaleConfig) -> Self {
        Self { config }
    }

    fn is_supported(&self, locale: &str) -> bool {
        if self.config.supported_languages.is_empty() {
            return true;
        }
        self.config
            .supported_languages
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(locale))
    }

    /// First path segment when it is shaped like `fr` or `fr-CA`
    fn extract_locale_from_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        let first = path.trim_matches('/').split('/').next()?;
        let looks_like_locale =
            first.len() == 2 || (first.len() == 5 && first.as_bytes()[2] == b'-');
        looks_like_locale.then_some(first)
    }

    /// First supported tag from an `Accept-Language` header, trying each
    /// tag exactly and then by its primary subtag
    fn parse_accept_language(&self, header: &str) -> Option<String> {
        for entry in header.split(',') {
            let language = entry.split(';').next().unwrap_or("").trim();
            if language.is_empty() {
                continue;
            }

            if self.is_supported(language) {
                return Some(language.to_string());
            }

            if let Some((primary, _)) = language.split_once('-') {
                if !primary.is_empty() && self.is_supported(primary) {
                    return Some(primary.to_string());
                }
            }
        }
        None
    }

    fn persist(&self, ctx: &mut dyn RequestContext, locale: &str) {
        ctx.state_mut().locale = Some(locale.to_string());

        let mut cookie = SetCookie::new(&self.config.cookie_name, locale);
        cookie.secure = self.config.cookie_secure;
        cookie.http_only = self.config.cookie_http_only;
        cookie.same_site = self.config.cookie_same_site;
        cookie.max_age = Some(ONE_YEAR_SECS);
        ctx.set_cookie(cookie);
    }
}

#[async_trait]
impl Middleware for LocaleMiddleware {
    fn name(&self) -> &str {
        "locale"
    }

    async fn handle(&self, ctx: &mut dyn RequestContext, next: Next<'_>) -> GatewayResult<()> {
        let path = ctx.path().to_string();

        // 1. Path segment
        if let Some(locale) = self.extract_locale_from_path(&path) {
            if self.is_supported(locale) {
                debug!(locale, "locale from path segment");
                let locale = locale.to_string();
                self.persist(ctx, &locale);
                return next.run(ctx).await;
            }
        }

        // 2. Query parameter
        let query_locale = ctx
            .query("sc_lang")
            .filter(|value| !value.is_empty())
            .or_else(|| ctx.query("locale").filter(|value| !value.is_empty()))
            .map(str::to_string);
        if let Some(locale) = query_locale {
            if self.is_supported(&locale) {
                debug!(locale = %locale, "locale from query parameter");
                self.persist(ctx, &locale);
                return next.run(ctx).await;
            }
        }

        // 3. Cookie (already current, no rewrite)
        if let Some(value) = ctx.cookie(&self.config.cookie_name) {
            if !value.is_empty() && self.is_supported(value) {
                debug!(locale = value, "locale from cookie");
                let value = value.to_string();
                ctx.state_mut().locale = Some(value);
                return next.run(ctx).await;
            }
        }

        // 4. Accept-Language header
        if self.config.use_accept_language {
            if let Some(header) = ctx.header("accept-language") {
                if let Some(locale) = self.parse_accept_language(header) {
                    debug!(locale = %locale, "locale from Accept-Language");
                    self.persist(ctx, &locale);
                    return next.run(ctx).await;
                }
            }
        }

        // 5. Default
        let locale = self.config.default_language.clone();
        debug!(locale = %locale, "locale from default");
        self.persist(ctx, &locale);
        next.run(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{HeaderMap, Method, StatusCode};

    use super::*;
    use crate::middleware::{Handler, HttpContext, MiddlewareChain};

    struct OkHandler;

    #[async_trait]
    impl Handler for OkHandler {
        async fn call(&self, ctx: &mut dyn RequestContext) -> GatewayResult<()> {
            ctx.no_content(StatusCode::NO_CONTENT)
        }
    }

    fn config() -> LocaleConfig {
        LocaleConfig {
            supported_languages: vec!["en".to_string(), "fr".to_string(), "fr-CA".to_string()],
            ..LocaleConfig::default()
        }
    }

    async fn run(uri: &str, headers: HeaderMap, config: LocaleConfig) -> HttpContext {
        let chain = MiddlewareChain::new().with(Arc::new(LocaleMiddleware::new(config)));
        let mut ctx = HttpContext::new(Method::GET, &uri.parse().unwrap(), headers);
        chain.handle(&mut ctx, &OkHandler).await.unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_path_segment_wins_over_query() {
        let ctx = run("/fr/products?sc_lang=en", HeaderMap::new(), config()).await;
        assert_eq!(ctx.state().locale.as_deref(), Some("fr"));
    }

    #[tokio::test]
    async fn test_region_qualified_path_segment() {
        let ctx = run("/fr-CA/products", HeaderMap::new(), config()).await;
        assert_eq!(ctx.state().locale.as_deref(), Some("fr-CA"));
    }

    #[tokio::test]
    async fn test_unsupported_path_segment_falls_through() {
        let ctx = run("/de/products?sc_lang=fr", HeaderMap::new(), config()).await;
        assert_eq!(ctx.state().locale.as_deref(), Some("fr"));
    }

    #[tokio::test]
    async fn test_non_locale_segment_falls_through_to_query() {
        let ctx = run("/products?sc_lang=fr", HeaderMap::new(), config()).await;
        assert_eq!(ctx.state().locale.as_deref(), Some("fr"));
    }

    #[tokio::test]
    async fn test_query_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", "sc_locale=en".parse().unwrap());
        let ctx = run("/products?locale=fr", headers, config()).await;
        assert_eq!(ctx.state().locale.as_deref(), Some("fr"));
    }

    #[tokio::test]
    async fn test_cookie_wins_over_accept_language() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", "sc_locale=fr".parse().unwrap());
        headers.insert("accept-language", "en-US,en;q=0.9".parse().unwrap());
        let ctx = run("/products", headers, config()).await;
        assert_eq!(ctx.state().locale.as_deref(), Some("fr"));
        // tier 3 does not re-write the cookie
        assert!(ctx.take_response().cookies.is_empty());
    }

    #[tokio::test]
    async fn test_accept_language_first_listed_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "accept-language",
            "da, fr;q=0.7, en;q=0.9".parse().unwrap(),
        );
        let ctx = run("/products", headers, config()).await;
        // quality values are ignored; `da` is unsupported so `fr` wins
        assert_eq!(ctx.state().locale.as_deref(), Some("fr"));
    }

    #[tokio::test]
    async fn test_accept_language_primary_subtag() {
        let mut headers = HeaderMap::new();
        headers.insert("accept-language", "en-US,da;q=0.8".parse().unwrap());
        let ctx = run("/products", headers, config()).await;
        assert_eq!(ctx.state().locale.as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn test_default_always_resolves() {
        let ctx = run("/products", HeaderMap::new(), config()).await;
        assert_eq!(ctx.state().locale.as_deref(), Some("en"));

        let parts = ctx.take_response();
        assert_eq!(parts.cookies.len(), 1);
        let cookie = &parts.cookies[0];
        assert_eq!(cookie.name, "sc_locale");
        assert_eq!(cookie.value, "en");
        assert!(!cookie.http_only);
        assert_eq!(cookie.max_age, Some(ONE_YEAR_SECS));
        assert_eq!(cookie.same_site, SameSite::Lax);
    }

    #[tokio::test]
    async fn test_empty_supported_list_accepts_anything() {
        let ctx = run(
            "/xx/products",
            HeaderMap::new(),
            LocaleConfig {
                supported_languages: Vec::new(),
                ..LocaleConfig::default()
            },
        )
        .await;
        assert_eq!(ctx.state().locale.as_deref(), Some("xx"));
    }
}
