//! # Layout Service
//!
//! Fetches layout data for a route through the GraphQL transport and
//! decodes the `rendered` payload into [`LayoutData`]. A response missing
//! the layout/item/rendered levels decodes to a default document whose
//! `route` is `None` — the typed signal the client facade turns into a
//! not-found condition.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::core::error::{GatewayError, GatewayResult};
use crate::graphql::GraphqlClient;

/// Options scoping a layout fetch
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    pub site: String,
    pub locale: Option<String>,
}

/// Layout document returned by the content API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutData {
    pub sitecore: SitecoreData,
}

/// Context plus route payload of a layout document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SitecoreData {
    #[serde(default)]
    pub context: LayoutContext,

    /// `None` when the requested route does not exist
    pub route: Option<RouteData>,
}

/// Context block of a layout document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_editing: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<SiteContext>,

    /// Remaining context properties, passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Site block inside the layout context
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Route payload of a layout document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteData {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,

    /// Route-level field values; shapes vary by template
    #[serde(default)]
    pub fields: serde_json::Map<String, Value>,

    /// Placeholder contents keyed by placeholder name
    #[serde(default)]
    pub placeholders: serde_json::Map<String, Value>,
}

const LAYOUT_QUERY: &str = r#"query ContentGatewayLayoutQuery($site: String!, $routePath: String!, $language: String) {
  layout(site: $site, routePath: $routePath, language: $language) {
    item {
      rendered
    }
  }
}"#;

/// Fetches layout documents from the content API
pub struct LayoutService {
    graphql: Arc<dyn GraphqlClient>,
}

impl LayoutService {
    pub fn new(graphql: Arc<dyn GraphqlClient>) -> Self {
        Self { graphql }
    }

    /// Fetch the layout document for a route
    pub async fn fetch_layout_data(
        &self,
        item_path: &str,
        options: &RouteOptions,
    ) -> GatewayResult<LayoutData> {
        debug!(
            path = item_path,
            site = %options.site,
            locale = options.locale.as_deref().unwrap_or(""),
            "fetching layout data"
        );

        let variables = json!({
            "site": &options.site,
            "routePath": item_path,
            "language": options.locale.as_deref(),
        });

        let data = self.graphql.request(LAYOUT_QUERY, variables).await?;
        decode_layout_response(data, options.locale.as_deref())
    }
}

/// Decode the `layout.item.rendered` levels of a response, falling back to
/// a routeless default when any level is missing
fn decode_layout_response(data: Value, locale: Option<&str>) -> GatewayResult<LayoutData> {
    let rendered = data
        .get("layout")
        .and_then(|layout| layout.get("item"))
        .and_then(|item| item.get("rendered"))
        .filter(|rendered| !rendered.is_null())
        .cloned();

    match rendered {
        Some(rendered) => {
            serde_json::from_value(rendered).map_err(|err| GatewayError::Json {
                message: format!("failed to decode layout data: {err}"),
            })
        }
        None => Ok(default_layout_data(locale)),
    }
}

fn default_layout_data(locale: Option<&str>) -> LayoutData {
    LayoutData {
        sitecore: SitecoreData {
            context: LayoutContext {
                page_editing: Some(false),
                language: locale.map(str::to_string),
                ..LayoutContext::default()
            },
            route: None,
        },
    }
}
