//! Editing render endpoint for the visual page editor.
//!
//! The editor requests a page render with identity carried entirely in
//! query parameters (`sc_itemid`, `sc_lang`, `sc_site`, `sc_layoutKind`,
//! `mode`, `route`, `sc_version`). Missing required parameters are a
//! client error; the fetched page is returned as JSON, or as HTML when a
//! render collaborator is configured.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;
use tracing::{debug, error};

use crate::client::{ContentClient, LayoutKind, Page, PreviewData, PreviewMode};
use crate::core::error::GatewayResult;
use crate::middleware::{Handler, RequestContext};

/// Renders a fetched page to HTML; implemented by the host application
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render_page(&self, page: &Page) -> GatewayResult<String>;
}

/// Serves editor render requests
pub struct EditingRenderHandler {
    client: Arc<ContentClient>,
    renderer: Option<Arc<dyn PageRenderer>>,
}

impl EditingRenderHandler {
    pub fn new(client: Arc<ContentClient>, renderer: Option<Arc<dyn PageRenderer>>) -> Self {
        Self { client, renderer }
    }

    fn require_param(
        ctx: &mut dyn RequestContext,
        name: &str,
    ) -> GatewayResult<Option<String>> {
        match ctx.query(name).filter(|value| !value.is_empty()) {
            Some(value) => Ok(Some(value.to_string())),
            None => {
                debug!(parameter = name, "missing required editing parameter");
                ctx.json(
                    StatusCode::BAD_REQUEST,
                    json!({ "error": format!("Missing required parameter: {name}") }),
                )?;
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl Handler for EditingRenderHandler {
    async fn call(&self, ctx: &mut dyn RequestContext) -> GatewayResult<()> {
        debug!("handling editing render request");

        let Some(item_id) = Self::require_param(ctx, "sc_itemid")? else {
            return Ok(());
        };
        let Some(language) = Self::require_param(ctx, "sc_lang")? else {
            return Ok(());
        };
        let Some(site) = Self::require_param(ctx, "sc_site")? else {
            return Ok(());
        };

        let layout_kind = match ctx.query("sc_layoutKind") {
            Some(kind) if kind.eq_ignore_ascii_case("shared") => LayoutKind::Shared,
            _ => LayoutKind::Final,
        };

        let mode = match ctx.query("mode").unwrap_or_default().to_lowercase().as_str() {
            "preview" => PreviewMode::Preview,
            "metadata" => PreviewMode::Metadata,
            _ => PreviewMode::Edit,
        };

        let preview = PreviewData {
            item_id,
            language,
            site,
            version: ctx.query("sc_version").unwrap_or_default().to_string(),
            mode,
            layout_kind,
            route: ctx.query("route").unwrap_or_default().to_string(),
        };

        let page = match self.client.get_preview(preview).await {
            Ok(page) => page,
            Err(err) => {
                error!(error = %err, "failed to fetch preview");
                return ctx.json(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": format!("Error fetching preview: {err}") }),
                );
            }
        };

        let Some(renderer) = &self.renderer else {
            return ctx.json(StatusCode::OK, serde_json::to_value(&page)?);
        };

        match renderer.render_page(&page).await {
            Ok(html) => {
                ctx.set_header("content-type", "text/html; charset=utf-8");
                if let Some(editing) = &page.editing {
                    let mode = serde_json::to_value(editing.mode)?;
                    if let Some(mode) = mode.as_str() {
                        ctx.set_header("x-editing-mode", mode);
                    }
                }
                ctx.string(StatusCode::OK, &html)
            }
            Err(err) => {
                error!(error = %err, "failed to render page");
                ctx.string(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &format!("Error rendering page: {err}"),
                )
            }
        }
    }
}
