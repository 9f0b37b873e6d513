//! # Catch-all Content Handler
//!
//! Terminal handler for all dynamic content routes. Reads the resolution
//! the middleware chain produced (site, locale, rewritten path), asks the
//! client facade for the page, and maps the outcome: page JSON on success,
//! a plain 404 for the typed not-found, and a generic 500 for transport
//! failures (internal error text is logged, never sent).

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use tracing::{debug, error};

use crate::client::{ContentClient, PageOptions};
use crate::core::error::{GatewayError, GatewayResult};
use crate::middleware::{Handler, RequestContext};

/// Terminal handler fetching content for resolved requests
pub struct CatchAllHandler {
    client: Arc<ContentClient>,
}

impl CatchAllHandler {
    pub fn new(client: Arc<ContentClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Handler for CatchAllHandler {
    async fn call(&self, ctx: &mut dyn RequestContext) -> GatewayResult<()> {
        // Prefer the rewritten path recorded by upstream middleware; it
        // carries the site marker the facade decodes back out.
        let path = ctx
            .state()
            .rewrite_path
            .clone()
            .unwrap_or_else(|| ctx.path().to_string());
        let options = PageOptions {
            site: ctx.state().site.clone(),
            locale: ctx.state().locale.clone(),
        };

        debug!(
            path = %path,
            site = options.site.as_deref().unwrap_or(""),
            locale = options.locale.as_deref().unwrap_or(""),
            "handling content request"
        );

        match self.client.get_page(&path, options).await {
            Ok(page) => {
                ctx.state_mut().variant_id = page.variant_id.clone();
                ctx.json(StatusCode::OK, serde_json::to_value(&page)?)
            }
            Err(GatewayError::NotFound { path, site }) => {
                debug!(path = %path, site = %site, "page not found");
                ctx.string(StatusCode::NOT_FOUND, "Page not found")
            }
            Err(err) => {
                error!(error = %err, "failed to fetch page");
                ctx.string(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, Method};
    use serde_json::{json, Value};

    use super::*;
    use crate::client::ContentClientConfig;
    use crate::graphql::{GraphqlClient, GraphqlClientConfig};
    use crate::middleware::HttpContext;

    struct StaticGraphql {
        response: GatewayResult<Value>,
    }

    #[async_trait]
    impl GraphqlClient for StaticGraphql {
        async fn request(&self, _query: &str, _variables: Value) -> GatewayResult<Value> {
            self.response.clone()
        }
    }

    fn handler_with(response: GatewayResult<Value>) -> CatchAllHandler {
        let client = ContentClient::new(ContentClientConfig {
            endpoint: "https://cm.example.com/sitecore/api/graph/edge".to_string(),
            api_key: "key".to_string(),
            default_site: "default".to_string(),
            default_language: "en".to_string(),
            graphql: GraphqlClientConfig::default(),
        })
        .with_graphql_client(Arc::new(StaticGraphql { response }));
        CatchAllHandler::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_page_served_as_json() {
        let handler = handler_with(Ok(json!({
            "layout": {"item": {"rendered": {"sitecore": {
                "context": {},
                "route": {"name": "home"}
            }}}}
        })));

        let mut ctx = HttpContext::new(Method::GET, &"/home".parse().unwrap(), HeaderMap::new());
        ctx.state_mut().site = Some("acme".to_string());
        ctx.state_mut().locale = Some("en".to_string());

        handler.call(&mut ctx).await.unwrap();

        let parts = ctx.take_response();
        assert_eq!(parts.status, Some(StatusCode::OK));
        let body: Value = serde_json::from_slice(&parts.body).unwrap();
        assert_eq!(body["site"], "acme");
        assert_eq!(body["layout"]["sitecore"]["route"]["name"], "home");
    }

    #[tokio::test]
    async fn test_missing_route_maps_to_404() {
        let handler = handler_with(Ok(json!({ "layout": { "item": null } })));

        let mut ctx =
            HttpContext::new(Method::GET, &"/missing".parse().unwrap(), HeaderMap::new());
        handler.call(&mut ctx).await.unwrap();

        let parts = ctx.take_response();
        assert_eq!(parts.status, Some(StatusCode::NOT_FOUND));
        assert_eq!(parts.body, b"Page not found");
    }

    #[tokio::test]
    async fn test_transport_failure_maps_to_generic_500() {
        let handler = handler_with(Err(GatewayError::transport("connection reset")));

        let mut ctx = HttpContext::new(Method::GET, &"/home".parse().unwrap(), HeaderMap::new());
        handler.call(&mut ctx).await.unwrap();

        let parts = ctx.take_response();
        assert_eq!(parts.status, Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(parts.body, b"Internal server error");
    }
}
