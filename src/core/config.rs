//! # Configuration Management
//!
//! Environment-driven configuration for the content gateway. All settings
//! are read once at startup through [`Config::from_env`], validated, and
//! then treated as immutable reference data — the resolvers and middleware
//! receive owned copies or shared references and never reload.
//!
//! Two API styles are supported for the content endpoint:
//! - **Edge API**: identity travels as a `sitecoreContextId` query
//!   parameter baked into the endpoint URL.
//! - **Local API**: identity travels as an `sc_apikey` request header.
//!
//! The transport client distinguishes the two by inspecting the endpoint
//! URL, so [`Config::graphql_endpoint`] is the single source of truth for
//! which style is in effect.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{GatewayError, GatewayResult};
use crate::site::Site;

/// Top-level gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Content API configuration
    pub api: ApiConfig,

    /// Default site name used when no other resolution tier matches
    pub default_site: String,

    /// Default language used when no other resolution tier matches
    pub default_language: String,

    /// Languages accepted by the locale resolver (empty = accept any)
    pub supported_languages: Vec<String>,

    /// Multisite resolution settings
    pub multisite: MultisiteSettings,

    /// Personalization settings
    pub personalize: PersonalizeSettings,

    /// Editing/preview settings
    pub editing: EditingSettings,

    /// Deadline for content API calls
    #[serde(with = "duration_millis")]
    pub api_timeout: Duration,
}

/// Content API configuration, either Edge or Local style
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Edge API settings (recommended for production)
    pub edge: EdgeApiConfig,

    /// Local API settings (for development against a local instance)
    pub local: LocalApiConfig,

    /// Whether to use the Edge API
    pub use_edge: bool,
}

/// Edge API settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeApiConfig {
    /// Server-side context ID
    pub context_id: String,

    /// Client-side context ID (exposed to browser code)
    pub client_context_id: String,

    /// Edge API base URL
    pub edge_url: String,
}

/// Local API settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalApiConfig {
    /// API key sent as the `sc_apikey` header
    pub api_key: String,

    /// API host base URL
    pub api_host: String,
}

/// Multisite resolution settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultisiteSettings {
    /// Whether multisite resolution is enabled
    pub enabled: bool,

    /// Configured site records
    pub sites: Vec<Site>,

    /// Whether the site cookie participates in resolution
    pub use_cookie_resolution: bool,
}

/// Personalization settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonalizeSettings {
    /// Whether personalization is enabled
    pub enabled: bool,

    /// CDP scope identifier
    pub scope: String,

    /// CDP API endpoint
    pub cdp_endpoint: String,
}

/// Editing/preview settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditingSettings {
    /// Whether editing endpoints are enabled
    pub enabled: bool,

    /// Shared secret validated by the editing security gate
    pub secret: String,

    /// Origins allowed to call the editing endpoints (empty = dev mode)
    pub allowed_origins: Vec<String>,

    /// Internal host URL used by the editor for server-side requests
    pub internal_host_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                edge: EdgeApiConfig {
                    edge_url: "https://edge.sitecorecloud.io".to_string(),
                    ..EdgeApiConfig::default()
                },
                ..ApiConfig::default()
            },
            default_site: "default".to_string(),
            default_language: "en".to_string(),
            supported_languages: Vec::new(),
            multisite: MultisiteSettings::default(),
            personalize: PersonalizeSettings::default(),
            editing: EditingSettings::default(),
            api_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults; validation is a separate step
    /// so callers can inspect a partially-configured instance in tests.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig {
                edge: EdgeApiConfig {
                    context_id: env_var("SITECORE_EDGE_CONTEXT_ID"),
                    client_context_id: env_var("SITECORE_EDGE_CLIENT_CONTEXT_ID"),
                    edge_url: env_var_or("SITECORE_EDGE_URL", "https://edge.sitecorecloud.io"),
                },
                local: LocalApiConfig {
                    api_key: env_var("SITECORE_API_KEY"),
                    api_host: env_var("SITECORE_API_HOST"),
                },
                use_edge: env_var_or("USE_EDGE_API", "false") == "true",
            },
            default_site: env_var_or("DEFAULT_SITE_NAME", "default"),
            default_language: env_var_or("DEFAULT_LANGUAGE", "en"),
            supported_languages: env_var_list("SUPPORTED_LANGUAGES"),
            multisite: MultisiteSettings {
                enabled: env_var_or("MULTISITE_ENABLED", "true") == "true",
                sites: Vec::new(),
                use_cookie_resolution: env_var_or("MULTISITE_USE_COOKIE", "true") == "true",
            },
            personalize: PersonalizeSettings {
                enabled: env_var_or("PERSONALIZE_ENABLED", "false") == "true",
                scope: env_var("PERSONALIZE_SCOPE"),
                cdp_endpoint: env_var_or("CDP_ENDPOINT", "https://api.boxever.com"),
            },
            editing: EditingSettings {
                enabled: env_var_or("EDITING_ENABLED", "false") == "true",
                secret: env_var("EDITING_SECRET"),
                allowed_origins: env_var_list("ALLOWED_ORIGINS"),
                internal_host_url: env_var("INTERNAL_EDITING_HOST_URL"),
            },
            api_timeout: parse_duration_or(&env_var_or("API_TIMEOUT", "10s"), 10),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> GatewayResult<()> {
        if self.api.use_edge {
            if self.api.edge.context_id.is_empty() {
                return Err(GatewayError::config(
                    "SITECORE_EDGE_CONTEXT_ID is required when using the Edge API",
                ));
            }
            if self.api.edge.edge_url.is_empty() {
                return Err(GatewayError::config(
                    "SITECORE_EDGE_URL is required when using the Edge API",
                ));
            }
        } else {
            if self.api.local.api_key.is_empty() {
                return Err(GatewayError::config(
                    "SITECORE_API_KEY is required when using the Local API",
                ));
            }
            if self.api.local.api_host.is_empty() {
                return Err(GatewayError::config(
                    "SITECORE_API_HOST is required when using the Local API",
                ));
            }
        }

        if self.default_site.is_empty() {
            return Err(GatewayError::config("DEFAULT_SITE_NAME is required"));
        }

        if self.personalize.enabled && self.personalize.scope.is_empty() {
            return Err(GatewayError::config(
                "PERSONALIZE_SCOPE is required when personalization is enabled",
            ));
        }

        Ok(())
    }

    /// The GraphQL endpoint for the active API style
    ///
    /// Edge endpoints carry the context ID as a query parameter; the
    /// transport client detects that marker and suppresses the
    /// `sc_apikey` header for them.
    pub fn graphql_endpoint(&self) -> String {
        if self.api.use_edge {
            format!(
                "{}/api/graphql/v1?sitecoreContextId={}",
                self.api.edge.edge_url, self.api.edge.context_id
            )
        } else {
            format!("{}/sitecore/api/graph/edge", self.api.local.api_host)
        }
    }

    /// The API key for the active API style
    pub fn api_key(&self) -> &str {
        if self.api.use_edge {
            &self.api.edge.context_id
        } else {
            &self.api.local.api_key
        }
    }
}

/// Fluent builder for [`Config`]
///
/// Mirrors the environment-variable surface for programmatic setup, mainly
/// used by tests and embedding applications.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Configure the Edge API and switch to it
    pub fn edge_api(
        mut self,
        context_id: impl Into<String>,
        client_context_id: impl Into<String>,
        edge_url: impl Into<String>,
    ) -> Self {
        self.config.api.edge.context_id = context_id.into();
        self.config.api.edge.client_context_id = client_context_id.into();
        let url = edge_url.into();
        if !url.is_empty() {
            self.config.api.edge.edge_url = url;
        }
        self.config.api.use_edge = true;
        self
    }

    /// Configure the Local API and switch to it
    pub fn local_api(mut self, api_key: impl Into<String>, api_host: impl Into<String>) -> Self {
        self.config.api.local.api_key = api_key.into();
        self.config.api.local.api_host = api_host.into();
        self.config.api.use_edge = false;
        self
    }

    pub fn default_site(mut self, name: impl Into<String>) -> Self {
        self.config.default_site = name.into();
        self
    }

    pub fn default_language(mut self, language: impl Into<String>) -> Self {
        self.config.default_language = language.into();
        self
    }

    pub fn supported_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.supported_languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn multisite(mut self, enabled: bool, sites: Vec<Site>, use_cookie: bool) -> Self {
        self.config.multisite.enabled = enabled;
        self.config.multisite.sites = sites;
        self.config.multisite.use_cookie_resolution = use_cookie;
        self
    }

    pub fn editing(
        mut self,
        enabled: bool,
        secret: impl Into<String>,
        allowed_origins: Vec<String>,
    ) -> Self {
        self.config.editing.enabled = enabled;
        self.config.editing.secret = secret.into();
        self.config.editing.allowed_origins = allowed_origins;
        self
    }

    pub fn personalization(
        mut self,
        enabled: bool,
        scope: impl Into<String>,
        cdp_endpoint: impl Into<String>,
    ) -> Self {
        self.config.personalize.enabled = enabled;
        self.config.personalize.scope = scope.into();
        let endpoint = cdp_endpoint.into();
        if !endpoint.is_empty() {
            self.config.personalize.cdp_endpoint = endpoint;
        }
        self
    }

    pub fn api_timeout(mut self, timeout: Duration) -> Self {
        self.config.api_timeout = timeout;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> GatewayResult<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn env_var(key: &str) -> String {
    env::var(key).unwrap_or_default()
}

fn env_var_or(key: &str, default: &str) -> String {
    let value = env_var(key);
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// Comma-separated list variable, whitespace-trimmed, empties dropped
fn env_var_list(key: &str) -> Vec<String> {
    env_var(key)
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_duration_or(value: &str, default_secs: u64) -> Duration {
    humantime::parse_duration(value).unwrap_or(Duration::from_secs(default_secs))
}

/// Serde helpers so durations round-trip as integer milliseconds
mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_local_api() {
        let config = ConfigBuilder::new()
            .local_api("key", "https://cm.example.com")
            .default_site("acme")
            .build()
            .unwrap();

        assert!(!config.api.use_edge);
        assert_eq!(
            config.graphql_endpoint(),
            "https://cm.example.com/sitecore/api/graph/edge"
        );
        assert_eq!(config.api_key(), "key");
    }

    #[test]
    fn test_edge_endpoint_carries_context_id() {
        let config = ConfigBuilder::new()
            .edge_api("ctx-123", "client-ctx", "")
            .build()
            .unwrap();

        let endpoint = config.graphql_endpoint();
        assert!(endpoint.starts_with("https://edge.sitecorecloud.io/api/graphql/v1"));
        assert!(endpoint.contains("sitecoreContextId=ctx-123"));
        assert_eq!(config.api_key(), "ctx-123");
    }

    #[test]
    fn test_validate_rejects_missing_local_credentials() {
        let err = ConfigBuilder::new()
            .local_api("", "")
            .build()
            .expect_err("expected validation failure");
        assert!(err.to_string().contains("SITECORE_API_KEY"));
    }

    #[test]
    fn test_validate_requires_personalize_scope() {
        let err = ConfigBuilder::new()
            .local_api("key", "host")
            .personalization(true, "", "")
            .build()
            .expect_err("expected validation failure");
        assert!(err.to_string().contains("PERSONALIZE_SCOPE"));
    }
}
