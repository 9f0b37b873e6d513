//! Editing configuration endpoint for the visual page editor.
//!
//! The editor calls this endpoint to learn which components the host
//! application can render and which client package versions it carries.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::Serialize;
use tracing::debug;

use crate::core::error::GatewayResult;
use crate::middleware::{Handler, RequestContext};

/// Access to the components registered by the host application
pub trait ComponentRegistry: Send + Sync {
    fn list(&self) -> Vec<String>;
}

/// Fixed component list registry
#[derive(Debug, Default)]
pub struct StaticComponentRegistry {
    components: Vec<String>,
}

impl StaticComponentRegistry {
    pub fn new(components: Vec<String>) -> Self {
        Self { components }
    }
}

impl ComponentRegistry for StaticComponentRegistry {
    fn list(&self) -> Vec<String> {
        self.components.clone()
    }
}

/// Payload returned to the editor
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EditingConfigResponse {
    components: Vec<String>,
    packages: BTreeMap<String, String>,
    edit_mode: String,
}

/// Serves editor configuration requests
pub struct EditingConfigHandler {
    registry: Arc<dyn ComponentRegistry>,
}

impl EditingConfigHandler {
    pub fn new(registry: Arc<dyn ComponentRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Handler for EditingConfigHandler {
    async fn call(&self, ctx: &mut dyn RequestContext) -> GatewayResult<()> {
        debug!("handling editing config request");

        let mut components: Vec<String> = self
            .registry
            .list()
            .into_iter()
            .filter(|name| name != "Unknown")
            .collect();
        components.sort();

        let packages = BTreeMap::from([
            ("@sitecore-cloudsdk/core".to_string(), "0.5.4".to_string()),
            ("@sitecore-cloudsdk/events".to_string(), "0.5.4".to_string()),
            (
                "@sitecore-cloudsdk/personalize".to_string(),
                "0.5.4".to_string(),
            ),
            ("@sitecore-cloudsdk/utils".to_string(), "0.5.4".to_string()),
            (
                "@sitecore-content-sdk/core".to_string(),
                "1.1.0".to_string(),
            ),
            (
                "@sitecore-content-sdk/react".to_string(),
                "1.1.0".to_string(),
            ),
        ]);

        let response = EditingConfigResponse {
            components,
            packages,
            edit_mode: "metadata".to_string(),
        };

        ctx.json(StatusCode::OK, serde_json::to_value(&response)?)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, Method};
    use serde_json::Value;

    use super::*;
    use crate::middleware::HttpContext;

    #[tokio::test]
    async fn test_config_lists_sorted_components_without_unknown() {
        let registry = StaticComponentRegistry::new(vec![
            "Hero".to_string(),
            "Unknown".to_string(),
            "Banner".to_string(),
        ]);
        let handler = EditingConfigHandler::new(Arc::new(registry));

        let mut ctx = HttpContext::new(
            Method::GET,
            &"/api/editing/config?secret=s".parse().unwrap(),
            HeaderMap::new(),
        );
        handler.call(&mut ctx).await.unwrap();

        let parts = ctx.take_response();
        assert_eq!(parts.status, Some(StatusCode::OK));
        let body: Value = serde_json::from_slice(&parts.body).unwrap();
        assert_eq!(body["components"], serde_json::json!(["Banner", "Hero"]));
        assert_eq!(body["editMode"], "metadata");
        assert!(body["packages"].as_object().unwrap().len() >= 4);
    }
}
