//! # GraphQL Transport
//!
//! Executes logical GraphQL operations against the content API with
//! bounded retries, exponential backoff, and an optional whole-call
//! deadline. Error classes are distinguished so that only transient
//! failures burn retry budget; see [`crate::core::error::GatewayError`].

mod client;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::core::error::{GatewayError, GatewayResult};

pub use self::client::{GraphqlClientConfig, HttpGraphqlClient};

/// Interface for executing GraphQL operations
///
/// Implementations return the decoded `data` payload of the response
/// envelope; a GraphQL error array takes precedence over any partial data.
#[async_trait]
pub trait GraphqlClient: Send + Sync {
    async fn request(&self, query: &str, variables: Value) -> GatewayResult<Value>;
}

/// GraphQL response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlResponse {
    /// Query result payload
    pub data: Option<Value>,

    /// GraphQL-level errors; non-empty means the operation failed
    #[serde(default)]
    pub errors: Vec<GraphqlErrorEntry>,
}

/// One entry of the GraphQL error array
#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlErrorEntry {
    pub message: String,

    /// Path to the response field the error applies to
    #[serde(default)]
    pub path: Option<Vec<Value>>,

    #[serde(default)]
    pub extensions: Option<Value>,
}

impl GraphqlErrorEntry {
    /// Convert to the gateway error taxonomy, folding the field path into
    /// the message when present
    pub fn to_error(&self) -> GatewayError {
        let message = match &self.path {
            Some(path) if !path.is_empty() => {
                let rendered: Vec<String> = path
                    .iter()
                    .map(|part| match part {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                format!("{} (at {})", self.message, rendered.join("."))
            }
            _ => self.message.clone(),
        };
        GatewayError::GraphQl { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_decodes_data_and_errors() {
        let raw = r#"{
            "data": {"layout": null},
            "errors": [{"message": "field error", "path": ["layout", "item"]}]
        }"#;
        let envelope: GraphqlResponse = serde_json::from_str(raw).unwrap();
        assert!(envelope.data.is_some());
        assert_eq!(envelope.errors.len(), 1);

        let err = envelope.errors[0].to_error();
        assert!(err.to_string().contains("field error"));
        assert!(err.to_string().contains("layout.item"));
    }

    #[test]
    fn test_envelope_without_errors() {
        let raw = r#"{"data": {"site": {"name": "acme"}}}"#;
        let envelope: GraphqlResponse = serde_json::from_str(raw).unwrap();
        assert!(envelope.errors.is_empty());
    }
}
