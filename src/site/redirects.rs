//! Redirect rules: fetched per site from the content API and matched
//! against request paths.
//!
//! Matching runs in two passes: the first pass considers only exact-string
//! rules, the second only regex rules. First match in a pass wins, and the
//! exact pass always takes precedence over the regex pass regardless of
//! rule order.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::core::error::{GatewayError, GatewayResult};
use crate::graphql::GraphqlClient;

/// HTTP semantics of a matched redirect rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedirectType {
    #[serde(rename = "301")]
    Permanent,
    #[serde(rename = "302")]
    Temporary,
    /// Rewrite the in-flight path and continue, without an HTTP redirect
    #[serde(rename = "SERVER_TRANSFER")]
    ServerTransfer,
    /// Unrecognized wire value; treated as a temporary redirect
    #[serde(other)]
    Unknown,
}

/// One redirect rule for a site
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    /// Exact path or regex pattern, per `is_regex`
    pub pattern: String,

    /// Redirect destination
    pub target: String,

    pub redirect_type: RedirectType,

    /// Language the rule applies to (informational)
    #[serde(default)]
    pub locale: String,

    #[serde(default)]
    pub is_regex: bool,
}

/// Fetches the redirect rules configured for a site
#[async_trait]
pub trait RedirectsService: Send + Sync {
    async fn fetch_redirects(&self, site_name: &str) -> GatewayResult<Vec<Redirect>>;
}

/// [`RedirectsService`] backed by the content API
pub struct SiteRedirectsService {
    graphql: Arc<dyn GraphqlClient>,
}

impl SiteRedirectsService {
    pub fn new(graphql: Arc<dyn GraphqlClient>) -> Self {
        Self { graphql }
    }
}

const REDIRECTS_QUERY: &str = r#"query SiteRedirectsQuery($site: String!) {
  site {
    siteInfo(site: $site) {
      redirects {
        pattern
        target
        redirectType
        locale
        isRegex
      }
    }
  }
}"#;

#[async_trait]
impl RedirectsService for SiteRedirectsService {
    async fn fetch_redirects(&self, site_name: &str) -> GatewayResult<Vec<Redirect>> {
        debug!(site = site_name, "fetching redirect rules");

        let data = self
            .graphql
            .request(REDIRECTS_QUERY, json!({ "site": site_name }))
            .await?;

        let decoded: RedirectsData =
            serde_json::from_value(data).map_err(|err| GatewayError::Json {
                message: format!("failed to decode redirects response: {err}"),
            })?;

        let redirects = decoded
            .site
            .and_then(|site| site.site_info)
            .map(|info| info.redirects)
            .unwrap_or_default();

        debug!(site = site_name, count = redirects.len(), "fetched redirect rules");
        Ok(redirects)
    }
}

#[derive(Debug, Deserialize)]
struct RedirectsData {
    site: Option<RedirectsSite>,
}

#[derive(Debug, Deserialize)]
struct RedirectsSite {
    #[serde(rename = "siteInfo")]
    site_info: Option<RedirectsSiteInfo>,
}

#[derive(Debug, Deserialize)]
struct RedirectsSiteInfo {
    #[serde(default)]
    redirects: Vec<Redirect>,
}

/// Find the first rule matching `path`, exact rules before regex rules
pub fn find_redirect<'a>(path: &str, redirects: &'a [Redirect]) -> Option<&'a Redirect> {
    let normalized = normalize_path(path);

    if let Some(rule) = redirects
        .iter()
        .find(|rule| !rule.is_regex && rule.pattern == normalized)
    {
        return Some(rule);
    }

    redirects.iter().find(|rule| {
        if !rule.is_regex {
            return false;
        }
        match Regex::new(&rule.pattern) {
            Ok(regex) => regex.is_match(&normalized),
            Err(_) => {
                debug!(pattern = %rule.pattern, "skipping invalid redirect regex");
                false
            }
        }
    })
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, target: &str, is_regex: bool) -> Redirect {
        Redirect {
            pattern: pattern.to_string(),
            target: target.to_string(),
            redirect_type: RedirectType::Temporary,
            locale: String::new(),
            is_regex,
        }
    }

    #[test]
    fn test_exact_match_wins_over_regex_regardless_of_order() {
        let redirects = vec![
            rule("^/old.*", "/regex-target", true),
            rule("/old-page", "/exact-target", false),
        ];

        let matched = find_redirect("/old-page", &redirects).unwrap();
        assert_eq!(matched.target, "/exact-target");
    }

    #[test]
    fn test_regex_match_when_no_exact() {
        let redirects = vec![
            rule("/other", "/elsewhere", false),
            rule("^/blog/\\d+$", "/archive", true),
        ];

        let matched = find_redirect("/blog/42", &redirects).unwrap();
        assert_eq!(matched.target, "/archive");
        assert!(find_redirect("/blog/latest", &redirects).is_none());
    }

    #[test]
    fn test_first_match_wins_within_a_pass() {
        let redirects = vec![
            rule("/page", "/first", false),
            rule("/page", "/second", false),
        ];
        assert_eq!(find_redirect("/page", &redirects).unwrap().target, "/first");
    }

    #[test]
    fn test_invalid_regex_is_skipped() {
        let redirects = vec![rule("([", "/broken", true), rule("^/ok$", "/fine", true)];
        let matched = find_redirect("/ok", &redirects).unwrap();
        assert_eq!(matched.target, "/fine");
    }

    #[test]
    fn test_path_normalization() {
        let redirects = vec![rule("/page", "/target", false)];
        assert!(find_redirect("page", &redirects).is_some());
        assert!(find_redirect("  /page  ", &redirects).is_some());
    }

    #[test]
    fn test_redirect_type_wire_format() {
        let raw = r#"[
            {"pattern": "/a", "target": "/b", "redirectType": "301"},
            {"pattern": "/c", "target": "/d", "redirectType": "SERVER_TRANSFER", "isRegex": false},
            {"pattern": "/e", "target": "/f", "redirectType": "SOMETHING_NEW"}
        ]"#;
        let rules: Vec<Redirect> = serde_json::from_str(raw).unwrap();
        assert_eq!(rules[0].redirect_type, RedirectType::Permanent);
        assert_eq!(rules[1].redirect_type, RedirectType::ServerTransfer);
        assert_eq!(rules[2].redirect_type, RedirectType::Unknown);
    }
}
