//! Site configuration fetch from the content API.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::core::error::{GatewayError, GatewayResult};
use crate::graphql::GraphqlClient;
use crate::site::Site;

/// Fetches site records from the content API at startup
pub struct SiteInfoService {
    graphql: Arc<dyn GraphqlClient>,
}

const SITE_INFO_QUERY: &str = r#"query SiteInfoQuery($site: String!) {
  site {
    siteInfo(site: $site) {
      name
      hostName
      language
      rootPath
      database
    }
  }
}"#;

const ALL_SITES_QUERY: &str = r#"query AllSitesQuery {
  site {
    siteInfoCollection {
      name
      hostName
      language
      rootPath
      database
    }
  }
}"#;

impl SiteInfoService {
    pub fn new(graphql: Arc<dyn GraphqlClient>) -> Self {
        Self { graphql }
    }

    /// Fetch the record for a single site
    pub async fn fetch_site(&self, site_name: &str) -> GatewayResult<Site> {
        debug!(site = site_name, "fetching site info");

        let data = self
            .graphql
            .request(SITE_INFO_QUERY, json!({ "site": site_name }))
            .await?;

        let decoded: SingleSiteData =
            serde_json::from_value(data).map_err(|err| GatewayError::Json {
                message: format!("failed to decode site info response: {err}"),
            })?;

        decoded
            .site
            .and_then(|site| site.site_info)
            .ok_or_else(|| GatewayError::Json {
                message: format!("no site info returned for {site_name}"),
            })
    }

    /// Fetch all configured site records
    pub async fn fetch_sites(&self) -> GatewayResult<Vec<Site>> {
        debug!("fetching all sites");

        let data = self.graphql.request(ALL_SITES_QUERY, json!({})).await?;

        let decoded: AllSitesData =
            serde_json::from_value(data).map_err(|err| GatewayError::Json {
                message: format!("failed to decode sites response: {err}"),
            })?;

        let sites = decoded
            .site
            .map(|site| site.site_info_collection)
            .unwrap_or_default();

        debug!(count = sites.len(), "fetched sites");
        Ok(sites)
    }
}

#[derive(Debug, Deserialize)]
struct SingleSiteData {
    site: Option<SingleSiteNode>,
}

#[derive(Debug, Deserialize)]
struct SingleSiteNode {
    #[serde(rename = "siteInfo")]
    site_info: Option<Site>,
}

#[derive(Debug, Deserialize)]
struct AllSitesData {
    site: Option<AllSitesNode>,
}

#[derive(Debug, Deserialize)]
struct AllSitesNode {
    #[serde(rename = "siteInfoCollection", default)]
    site_info_collection: Vec<Site>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sites_response_decoding() {
        let raw = r#"{
            "site": {
                "siteInfoCollection": [
                    {"name": "acme", "hostName": "acme.example.com", "language": "en"},
                    {"name": "other", "hostName": "other.example.com", "language": "da"}
                ]
            }
        }"#;
        let decoded: AllSitesData = serde_json::from_str(raw).unwrap();
        let sites = decoded.site.unwrap().site_info_collection;
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].name, "acme");
        assert_eq!(sites[1].host_name, "other.example.com");
    }

    #[test]
    fn test_missing_collection_decodes_empty() {
        let decoded: AllSitesData = serde_json::from_str(r#"{"site": {}}"#).unwrap();
        assert!(decoded.site.unwrap().site_info_collection.is_empty());
    }
}
