//! # Content Client Facade
//!
//! Orchestrates the path codec, site/locale defaulting, and the layout
//! service to turn a raw request path into fetched page content. This is
//! the terminal consumer of everything the middleware chain resolved: the
//! facade decodes the site and variant markers out of the path, fills in
//! defaults, fetches layout data, and distinguishes a typed not-found from
//! transport failures.

pub mod rewrite;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::core::error::{GatewayError, GatewayResult};
use crate::graphql::{GraphqlClient, GraphqlClientConfig, HttpGraphqlClient};
use crate::i18n::{DictionaryPhrases, DictionaryService};
use crate::layout::{LayoutData, LayoutService, RouteOptions};

/// Which layout variant the editor wants rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    Final,
    Shared,
}

impl LayoutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutKind::Final => "final",
            LayoutKind::Shared => "shared",
        }
    }
}

/// Editing/preview mode requested by the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    Preview,
    Edit,
    Metadata,
}

impl PreviewMode {
    /// Edit and metadata modes render editable markup
    pub fn is_editing(&self) -> bool {
        matches!(self, PreviewMode::Edit | PreviewMode::Metadata)
    }
}

/// Parameters of an editor preview request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewData {
    pub item_id: String,
    pub language: String,
    pub site: String,
    #[serde(default)]
    pub version: String,
    pub mode: PreviewMode,
    pub layout_kind: LayoutKind,
    #[serde(default)]
    pub route: String,
}

/// Editing annotations attached to a page fetched for the editor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditingContext {
    pub is_editing: bool,
    pub is_preview: bool,
    pub mode: PreviewMode,
    pub query_params: HashMap<String, String>,
}

/// Options for a page fetch
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    /// Explicit site; wins over a site marker in the path
    pub site: Option<String>,

    /// Explicit locale; wins over the configured default
    pub locale: Option<String>,
}

/// A fetched page: layout data plus the resolution that produced it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub layout: LayoutData,
    pub site: String,
    pub locale: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub dictionary: DictionaryPhrases,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editing: Option<EditingContext>,
}

/// Configuration for [`ContentClient`]
#[derive(Debug, Clone)]
pub struct ContentClientConfig {
    pub endpoint: String,
    pub api_key: String,
    pub default_site: String,
    pub default_language: String,
    pub graphql: GraphqlClientConfig,
}

const EDITING_QUERY: &str = r#"query EditingQuery($itemId: String!, $language: String!, $version: String) {
  item(path: $itemId, language: $language, version: $version) {
    rendered
  }
}"#;

/// Client facade over the content API
pub struct ContentClient {
    graphql: Arc<dyn GraphqlClient>,
    layout: LayoutService,
    dictionary: Option<DictionaryService>,
    endpoint: String,
    api_key: String,
    default_site: String,
    default_language: String,
}

impl ContentClient {
    pub fn new(config: ContentClientConfig) -> Self {
        let graphql: Arc<dyn GraphqlClient> = Arc::new(HttpGraphqlClient::new(
            config.endpoint.clone(),
            config.api_key.clone(),
            config.graphql,
        ));

        Self {
            layout: LayoutService::new(Arc::clone(&graphql)),
            dictionary: None,
            graphql,
            endpoint: config.endpoint,
            api_key: config.api_key,
            default_site: config.default_site,
            default_language: config.default_language,
        }
    }

    /// Replace the transport (used by tests to inject a mock)
    pub fn with_graphql_client(mut self, graphql: Arc<dyn GraphqlClient>) -> Self {
        self.layout = LayoutService::new(Arc::clone(&graphql));
        if self.dictionary.is_some() {
            self.dictionary = Some(DictionaryService::new(
                Arc::clone(&graphql),
                self.default_site.clone(),
            ));
        }
        self.graphql = graphql;
        self
    }

    /// Enable dictionary fetching on page loads
    pub fn with_dictionary(mut self) -> Self {
        self.dictionary = Some(DictionaryService::new(
            Arc::clone(&self.graphql),
            self.default_site.clone(),
        ));
        self
    }

    /// Normalize a path, removing any site and variant markers
    pub fn parse_path(&self, path: &str) -> String {
        let parsed = rewrite::parse_path(path);
        rewrite::strip_variant(&rewrite::strip_site(&parsed))
    }

    /// Site name embedded in a path, or the default site
    pub fn site_name_from_path(&self, path: &str) -> String {
        rewrite::decode_site(&rewrite::parse_path(path), &self.default_site).site_name
    }

    /// Fetch the page for a request path
    ///
    /// The path may carry site/variant markers from upstream middleware;
    /// both are decoded out before the layout fetch. A layout document
    /// without a route is surfaced as a typed not-found.
    pub async fn get_page(&self, path: &str, options: PageOptions) -> GatewayResult<Page> {
        let parsed = rewrite::parse_path(path);
        let site_rewrite = rewrite::decode_site(&parsed, &self.default_site);
        let variant = rewrite::decode_variant(&site_rewrite.normalized_path);

        let site = options
            .site
            .filter(|site| !site.is_empty())
            .unwrap_or(site_rewrite.site_name);
        let locale = options
            .locale
            .filter(|locale| !locale.is_empty())
            .unwrap_or_else(|| self.default_language.clone());

        let content_path = strip_locale_prefix(&variant.normalized_path, &locale);

        debug!(
            path = %content_path,
            site = %site,
            locale = %locale,
            variant = variant.variant_id.as_deref().unwrap_or(""),
            "fetching page"
        );

        let layout = self
            .layout
            .fetch_layout_data(
                &content_path,
                &RouteOptions {
                    site: site.clone(),
                    locale: Some(locale.clone()),
                },
            )
            .await?;

        let Some(route) = &layout.sitecore.route else {
            return Err(GatewayError::NotFound {
                path: path.to_string(),
                site,
            });
        };
        let item_id = route.item_id.clone();

        let dictionary = match &self.dictionary {
            Some(service) => match service.fetch_dictionary_data(&locale, &site).await {
                Ok(phrases) => phrases,
                Err(err) => {
                    warn!(error = %err, "dictionary fetch failed, serving page without phrases");
                    DictionaryPhrases::default()
                }
            },
            None => DictionaryPhrases::default(),
        };

        Ok(Page {
            layout,
            site,
            locale,
            path: content_path,
            item_id,
            variant_id: variant.variant_id,
            dictionary,
            editing: None,
        })
    }

    /// Fetch preview/editing data for the editor
    ///
    /// Editing requests carry mode headers, so a dedicated transport client
    /// is built per call with the extra headers attached.
    pub async fn get_preview(&self, preview: PreviewData) -> GatewayResult<Page> {
        debug!(
            item_id = %preview.item_id,
            language = %preview.language,
            site = %preview.site,
            mode = ?preview.mode,
            "fetching preview data"
        );

        let mut headers = HashMap::new();
        headers.insert(
            "sc_layoutKind".to_string(),
            preview.layout_kind.as_str().to_string(),
        );
        headers.insert(
            "sc_editMode".to_string(),
            preview.mode.is_editing().to_string(),
        );

        let client = HttpGraphqlClient::new(
            self.endpoint.clone(),
            self.api_key.clone(),
            GraphqlClientConfig {
                headers,
                ..GraphqlClientConfig::default()
            },
        );

        let variables = json!({
            "itemId": &preview.item_id,
            "language": &preview.language,
            "version": (!preview.version.is_empty()).then_some(&preview.version),
        });

        let data = client.request(EDITING_QUERY, variables).await?;

        let rendered = data
            .get("item")
            .and_then(|item| item.get("rendered"))
            .filter(|rendered| !rendered.is_null())
            .cloned()
            .ok_or_else(|| GatewayError::NotFound {
                path: preview.item_id.clone(),
                site: preview.site.clone(),
            })?;

        let layout: LayoutData =
            serde_json::from_value(rendered).map_err(|err| GatewayError::Json {
                message: format!("failed to decode rendered editing data: {err}"),
            })?;

        let query_params = HashMap::from([
            ("sc_itemid".to_string(), preview.item_id.clone()),
            ("sc_lang".to_string(), preview.language.clone()),
            ("sc_site".to_string(), preview.site.clone()),
            (
                "sc_layoutKind".to_string(),
                preview.layout_kind.as_str().to_string(),
            ),
        ]);

        Ok(Page {
            layout,
            site: preview.site,
            locale: preview.language,
            path: preview.route,
            item_id: Some(preview.item_id),
            variant_id: None,
            dictionary: DictionaryPhrases::default(),
            editing: Some(EditingContext {
                is_editing: preview.mode.is_editing(),
                is_preview: preview.mode == PreviewMode::Preview,
                mode: preview.mode,
                query_params,
            }),
        })
    }
}

/// Remove a leading path segment equal to the resolved locale, so a
/// locale-prefixed URL maps to the canonical content path
fn strip_locale_prefix(path: &str, locale: &str) -> String {
    let Some(rest) = path.strip_prefix('/') else {
        return path.to_string();
    };

    let (first, remainder) = match rest.split_once('/') {
        Some((first, remainder)) => (first, Some(remainder)),
        None => (rest, None),
    };

    if !first.eq_ignore_ascii_case(locale) {
        return path.to_string();
    }

    match remainder {
        Some(remainder) if !remainder.is_empty() => format!("/{remainder}"),
        _ => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;

    struct StaticLayout {
        response: Value,
    }

    #[async_trait]
    impl GraphqlClient for StaticLayout {
        async fn request(&self, _query: &str, _variables: Value) -> GatewayResult<Value> {
            Ok(self.response.clone())
        }
    }

    fn client_with(response: Value) -> ContentClient {
        ContentClient::new(ContentClientConfig {
            endpoint: "https://cm.example.com/sitecore/api/graph/edge".to_string(),
            api_key: "key".to_string(),
            default_site: "default".to_string(),
            default_language: "en".to_string(),
            graphql: GraphqlClientConfig::default(),
        })
        .with_graphql_client(Arc::new(StaticLayout { response }))
    }

    fn layout_response(route: Value) -> Value {
        json!({
            "layout": {
                "item": {
                    "rendered": {
                        "sitecore": {
                            "context": {"pageEditing": false},
                            "route": route
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn test_strip_locale_prefix() {
        assert_eq!(strip_locale_prefix("/fr/products", "fr"), "/products");
        assert_eq!(strip_locale_prefix("/fr", "fr"), "/");
        assert_eq!(strip_locale_prefix("/fr-CA/products", "fr-CA"), "/products");
        assert_eq!(strip_locale_prefix("/france/products", "fr"), "/france/products");
        assert_eq!(strip_locale_prefix("/products", "fr"), "/products");
    }

    #[test]
    fn test_parse_path_strips_markers() {
        let client = client_with(Value::Null);
        assert_eq!(
            client.parse_path("/_site_acme/_variantId_v1/products"),
            "/products"
        );
        assert_eq!(client.site_name_from_path("/_site_acme/products"), "acme");
        assert_eq!(client.site_name_from_path("/products"), "default");
    }

    #[tokio::test]
    async fn test_get_page_resolves_markers_and_locale() {
        let client = client_with(layout_response(json!({"name": "products", "itemId": "42"})));

        let page = client
            .get_page(
                "/_site_acme/fr/products",
                PageOptions {
                    site: None,
                    locale: Some("fr".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(page.site, "acme");
        assert_eq!(page.locale, "fr");
        assert_eq!(page.path, "/products");
        assert_eq!(page.item_id.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_explicit_site_wins_over_marker() {
        let client = client_with(layout_response(json!({"name": "home"})));

        let page = client
            .get_page(
                "/_site_acme/home",
                PageOptions {
                    site: Some("override".to_string()),
                    locale: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(page.site, "override");
        assert_eq!(page.locale, "en");
    }

    #[tokio::test]
    async fn test_variant_marker_decoded() {
        let client = client_with(layout_response(json!({"name": "home"})));

        let page = client
            .get_page("/_variantId_v7/home", PageOptions::default())
            .await
            .unwrap();

        assert_eq!(page.variant_id.as_deref(), Some("v7"));
        assert_eq!(page.path, "/home");
    }

    #[tokio::test]
    async fn test_missing_route_is_typed_not_found() {
        let client = client_with(json!({ "layout": { "item": null } }));

        let err = client
            .get_page("/missing", PageOptions::default())
            .await
            .expect_err("expected not found");

        assert!(matches!(err, GatewayError::NotFound { .. }));
    }
}
