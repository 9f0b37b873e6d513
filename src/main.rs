//! # Content Gateway - Entry Point
//!
//! Wires the middleware chain from environment configuration and serves it
//! over axum: healthcheck, multisite, locale, and redirects resolution in
//! front of the catch-all content handler, plus the secret-gated editing
//! endpoints when editing is enabled.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use content_gateway::adapter::{route_service, GatewayService};
use content_gateway::client::{ContentClient, ContentClientConfig};
use content_gateway::core::config::Config;
use content_gateway::graphql::{GraphqlClient, GraphqlClientConfig, HttpGraphqlClient};
use content_gateway::handlers::{
    CatchAllHandler, EditingConfigHandler, EditingRenderHandler, StaticComponentRegistry,
};
use content_gateway::middleware::{
    EditingSecurityConfig, EditingSecurityMiddleware, HealthcheckConfig, HealthcheckMiddleware,
    LocaleConfig, LocaleMiddleware, MiddlewareChain, MultisiteConfig, MultisiteMiddleware,
    RedirectsConfig, RedirectsMiddleware,
};
use content_gateway::site::{Site, SiteInfoService, SiteRedirectsService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut config = Config::from_env();
    config
        .validate()
        .context("invalid gateway configuration")?;

    info!(
        endpoint = %config.graphql_endpoint(),
        default_site = %config.default_site,
        default_language = %config.default_language,
        "starting content gateway"
    );

    let graphql: Arc<dyn GraphqlClient> = Arc::new(HttpGraphqlClient::new(
        config.graphql_endpoint(),
        config.api_key().to_string(),
        GraphqlClientConfig {
            timeout: Some(config.api_timeout),
            ..GraphqlClientConfig::default()
        },
    ));

    // Multisite records come from configuration; when none are configured,
    // ask the content API for them.
    if config.multisite.enabled && config.multisite.sites.is_empty() {
        let site_info = SiteInfoService::new(Arc::clone(&graphql));
        match site_info.fetch_sites().await {
            Ok(sites) => {
                info!(count = sites.len(), "loaded site records from content API");
                config.multisite.sites = sites;
            }
            Err(err) => {
                warn!(error = %err, "failed to load site records, continuing with defaults");
            }
        }
    }

    let default_site = config
        .multisite
        .sites
        .iter()
        .find(|site| site.name.eq_ignore_ascii_case(&config.default_site))
        .cloned()
        .unwrap_or_else(|| Site::new(config.default_site.clone(), String::new()));

    let content_client = Arc::new(
        ContentClient::new(ContentClientConfig {
            endpoint: config.graphql_endpoint(),
            api_key: config.api_key().to_string(),
            default_site: config.default_site.clone(),
            default_language: config.default_language.clone(),
            graphql: GraphqlClientConfig {
                timeout: Some(config.api_timeout),
                ..GraphqlClientConfig::default()
            },
        })
        .with_dictionary(),
    );

    let chain = MiddlewareChain::new()
        .with(Arc::new(HealthcheckMiddleware::new(
            HealthcheckConfig::default(),
        )))
        .with(Arc::new(MultisiteMiddleware::new(MultisiteConfig {
            enabled: config.multisite.enabled,
            sites: config.multisite.sites.clone(),
            default_site,
            use_cookie_resolution: config.multisite.use_cookie_resolution,
            ..MultisiteConfig::default()
        })))
        .with(Arc::new(LocaleMiddleware::new(LocaleConfig {
            default_language: config.default_language.clone(),
            supported_languages: config.supported_languages.clone(),
            ..LocaleConfig::default()
        })))
        .with(Arc::new(RedirectsMiddleware::new(RedirectsConfig {
            service: Arc::new(SiteRedirectsService::new(Arc::clone(&graphql))),
            site: config.default_site.clone(),
        })));

    let content_service = Arc::new(GatewayService::new(
        chain,
        Arc::new(CatchAllHandler::new(Arc::clone(&content_client))),
    ));

    let mut router = Router::new().fallback_service(route_service(content_service));

    if config.editing.enabled {
        info!("editing endpoints enabled");
        let security = EditingSecurityConfig {
            secret: config.editing.secret.clone(),
            allowed_origins: config.editing.allowed_origins.clone(),
            skip_secret_validation: false,
        };

        let config_service = Arc::new(GatewayService::new(
            MiddlewareChain::new()
                .with(Arc::new(EditingSecurityMiddleware::new(security.clone()))),
            Arc::new(EditingConfigHandler::new(Arc::new(
                StaticComponentRegistry::default(),
            ))),
        ));
        let render_service = Arc::new(GatewayService::new(
            MiddlewareChain::new()
                .with(Arc::new(EditingSecurityMiddleware::new(security))),
            Arc::new(EditingRenderHandler::new(Arc::clone(&content_client), None)),
        ));

        router = router
            .route("/api/editing/config", route_service(config_service))
            .route("/api/editing/render", route_service(render_service));
    }

    let addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("content gateway shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "failed to install shutdown signal handler");
    }
    info!("shutdown signal received");
}
