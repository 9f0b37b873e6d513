//! Dictionary (i18n phrase) fetch for a site and locale.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::core::error::{GatewayError, GatewayResult};
use crate::graphql::GraphqlClient;

/// Phrase key to translated value
pub type DictionaryPhrases = HashMap<String, String>;

/// Fetches dictionary phrases from the content API
pub struct DictionaryService {
    graphql: Arc<dyn GraphqlClient>,
    site_name: String,
}

const DICTIONARY_QUERY: &str = r#"query DictionaryQuery($site: String!, $language: String!) {
  site {
    siteInfo(site: $site) {
      dictionary(language: $language) {
        key
        value
      }
    }
  }
}"#;

impl DictionaryService {
    /// `site_name` is the fallback when a fetch call passes an empty site
    pub fn new(graphql: Arc<dyn GraphqlClient>, site_name: impl Into<String>) -> Self {
        Self {
            graphql,
            site_name: site_name.into(),
        }
    }

    /// Fetch all phrases for a locale
    pub async fn fetch_dictionary_data(
        &self,
        locale: &str,
        site_name: &str,
    ) -> GatewayResult<DictionaryPhrases> {
        let site = if site_name.is_empty() {
            self.site_name.as_str()
        } else {
            site_name
        };

        debug!(locale, site, "fetching dictionary");

        let data = self
            .graphql
            .request(DICTIONARY_QUERY, json!({ "site": site, "language": locale }))
            .await?;

        let decoded: DictionaryData =
            serde_json::from_value(data).map_err(|err| GatewayError::Json {
                message: format!("failed to decode dictionary response: {err}"),
            })?;

        let phrases: DictionaryPhrases = decoded
            .site
            .and_then(|site| site.site_info)
            .map(|info| info.dictionary)
            .unwrap_or_default()
            .into_iter()
            .map(|entry| (entry.key, entry.value))
            .collect();

        debug!(count = phrases.len(), "fetched dictionary phrases");
        Ok(phrases)
    }
}

#[derive(Debug, Deserialize)]
struct DictionaryData {
    site: Option<DictionarySite>,
}

#[derive(Debug, Deserialize)]
struct DictionarySite {
    #[serde(rename = "siteInfo")]
    site_info: Option<DictionarySiteInfo>,
}

#[derive(Debug, Deserialize)]
struct DictionarySiteInfo {
    #[serde(default)]
    dictionary: Vec<DictionaryEntry>,
}

#[derive(Debug, Deserialize)]
struct DictionaryEntry {
    key: String,
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_response_decoding() {
        let raw = r#"{
            "site": {
                "siteInfo": {
                    "dictionary": [
                        {"key": "greeting", "value": "Bonjour"},
                        {"key": "farewell", "value": "Au revoir"}
                    ]
                }
            }
        }"#;
        let decoded: DictionaryData = serde_json::from_str(raw).unwrap();
        let entries = decoded.site.unwrap().site_info.unwrap().dictionary;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "greeting");
    }

    #[test]
    fn test_missing_levels_decode_empty() {
        let decoded: DictionaryData = serde_json::from_str(r#"{"site": null}"#).unwrap();
        assert!(decoded.site.is_none());
    }
}
