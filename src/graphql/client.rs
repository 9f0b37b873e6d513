//! HTTP implementation of the GraphQL transport.
//!
//! One logical request becomes up to `1 + retries` wire attempts. Before
//! each retry (never before the first attempt) the client sleeps
//! `retry_delay * 2^(attempt-1)`. A configured timeout bounds the whole
//! call including backoff sleeps; dropping the returned future cancels the
//! in-flight attempt.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::core::error::{GatewayError, GatewayResult};
use crate::graphql::{GraphqlClient, GraphqlResponse};

/// Header carrying the API key for non-edge endpoints
const API_KEY_HEADER: &str = "sc_apikey";

/// Query-parameter marker identifying an edge-style endpoint
const EDGE_CONTEXT_PARAM: &str = "sitecoreContextId=";

/// Configuration for [`HttpGraphqlClient`]
#[derive(Debug, Clone)]
pub struct GraphqlClientConfig {
    /// Retry attempts beyond the first try
    pub retries: u32,

    /// Whole-call deadline; `None` leaves the call unbounded
    pub timeout: Option<Duration>,

    /// Base delay for exponential backoff between retries
    pub retry_delay: Duration,

    /// Extra headers attached to every request
    pub headers: HashMap<String, String>,
}

impl Default for GraphqlClientConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            timeout: Some(Duration::from_secs(30)),
            retry_delay: Duration::from_secs(1),
            headers: HashMap::new(),
        }
    }
}

/// GraphQL client over HTTP POST
pub struct HttpGraphqlClient {
    endpoint: String,
    api_key: String,
    http: reqwest::Client,
    config: GraphqlClientConfig,
}

impl HttpGraphqlClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        config: GraphqlClientConfig,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Replace the underlying HTTP client (e.g. to share a connection pool)
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    async fn request_with_retries(&self, query: &str, variables: &Value) -> GatewayResult<Value> {
        let mut last_err = None;

        for attempt in 0..=self.config.retries {
            if attempt > 0 {
                let delay = self.config.retry_delay * 2u32.pow(attempt - 1);
                debug!(
                    attempt,
                    retries = self.config.retries,
                    delay_ms = delay.as_millis() as u64,
                    "retrying GraphQL request"
                );
                sleep(delay).await;
            }

            match self.execute(query, variables).await {
                Ok(data) => return Ok(data),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    warn!(attempt, error = %err, "GraphQL request attempt failed");
                    last_err = Some(err);
                }
            }
        }

        match last_err {
            Some(source) => Err(GatewayError::RetriesExhausted {
                attempts: self.config.retries + 1,
                source: Box::new(source),
            }),
            None => Err(GatewayError::transport("request loop executed no attempts")),
        }
    }

    /// One wire attempt: POST the operation, check the status, decode the
    /// envelope, surface GraphQL errors over partial data
    async fn execute(&self, query: &str, variables: &Value) -> GatewayResult<Value> {
        let body = json!({
            "query": query,
            "variables": variables,
        });

        let mut request = self.http.post(&self.endpoint).json(&body);

        // Edge endpoints carry identity in the URL; only local-style
        // endpoints take the API key header.
        if !self.api_key.is_empty() && !is_edge_endpoint(&self.endpoint) {
            request = request.header(API_KEY_HEADER, self.api_key.as_str());
        }

        for (name, value) in &self.config.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        debug!(endpoint = %self.endpoint, "GraphQL request");
        let response = request.send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: GraphqlResponse = serde_json::from_str(&text)?;

        if let Some(first) = envelope.errors.first() {
            return Err(first.to_error());
        }

        Ok(envelope.data.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl GraphqlClient for HttpGraphqlClient {
    async fn request(&self, query: &str, variables: Value) -> GatewayResult<Value> {
        match self.config.timeout {
            Some(deadline) => {
                match timeout(deadline, self.request_with_retries(query, &variables)).await {
                    Ok(result) => result,
                    Err(_) => Err(GatewayError::Timeout {
                        timeout_ms: deadline.as_millis() as u64,
                    }),
                }
            }
            None => self.request_with_retries(query, &variables).await,
        }
    }
}

fn is_edge_endpoint(endpoint: &str) -> bool {
    endpoint.contains(EDGE_CONTEXT_PARAM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_endpoint_detection() {
        assert!(is_edge_endpoint(
            "https://edge.example.com/api/graphql/v1?sitecoreContextId=abc"
        ));
        assert!(!is_edge_endpoint(
            "https://cm.example.com/sitecore/api/graph/edge"
        ));
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let config = GraphqlClientConfig::default();
        let delays: Vec<Duration> = (1..=3)
            .map(|attempt: u32| config.retry_delay * 2u32.pow(attempt - 1))
            .collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ]
        );
    }
}
