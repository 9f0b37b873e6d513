//! # Request Context Abstraction
//!
//! A framework-agnostic capability surface over one inbound HTTP request.
//! Everything above the adapter layer — resolvers, middleware, handlers —
//! works exclusively against the [`RequestContext`] trait, so none of the
//! resolution logic depends on a particular web framework.
//!
//! The concrete [`HttpContext`] implementation is built by an adapter from
//! raw request parts and captures the terminal response for the adapter to
//! convert back. It is created per inbound request and never shared across
//! requests.
//!
//! Resolution results travel in the typed [`RequestState`] bag rather than
//! a stringly-keyed map: site, locale, original/rewritten path, and the
//! personalization variant are first-class fields.

use std::collections::HashMap;
use std::fmt;

use axum::http::{HeaderMap, Method, StatusCode, Uri};
use serde_json::Value;
use uuid::Uuid;

use crate::core::error::GatewayResult;

/// Typed per-request resolution state shared across the middleware chain
#[derive(Debug, Clone, Default)]
pub struct RequestState {
    /// Active site name, set by the multisite middleware
    pub site: Option<String>,

    /// Active locale, set by the locale middleware
    pub locale: Option<String>,

    /// Path as received, recorded before any rewrite
    pub original_path: Option<String>,

    /// Path after site-prefix or server-transfer rewriting
    pub rewrite_path: Option<String>,

    /// Personalization variant decoded from the path
    pub variant_id: Option<String>,
}

/// SameSite attribute for cookies set by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    /// Required for cookies that must be readable inside an editor iframe
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// A cookie to be set on the response
#[derive(Debug, Clone)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    /// Lifetime in seconds; session cookie when absent
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl SetCookie {
    /// Create a cookie with `Path=/` and conservative attribute defaults
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: "/".to_string(),
            max_age: None,
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
        }
    }

    /// Render the `Set-Cookie` header value
    pub fn header_value(&self) -> String {
        let mut out = format!("{}={}; Path={}", self.name, self.value, self.path);
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={max_age}"));
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out.push_str(&format!("; SameSite={}", self.same_site));
        out
    }
}

/// Capability interface over one inbound request
///
/// Methods fall into three groups: request inspection (path, query,
/// headers, cookies), the typed state bag, and terminal response writers.
/// Writing a terminal response commits the context; middleware that commit
/// must not call `next`.
pub trait RequestContext: Send {
    /// Unique request ID for tracing
    fn request_id(&self) -> &str;

    /// HTTP method
    fn method(&self) -> &Method;

    /// Current request path (may have been rewritten upstream)
    fn path(&self) -> &str;

    /// Rewrite the request path for downstream consumers
    fn set_path(&mut self, path: &str);

    /// Query parameter by name
    fn query(&self, name: &str) -> Option<&str>;

    /// Request header by name (case-insensitive)
    fn header(&self, name: &str) -> Option<&str>;

    /// Set a response header
    fn set_header(&mut self, name: &str, value: &str);

    /// Request cookie value by name
    fn cookie(&self, name: &str) -> Option<&str>;

    /// Queue a cookie on the response
    fn set_cookie(&mut self, cookie: SetCookie);

    /// Shared resolution state
    fn state(&self) -> &RequestState;

    /// Shared resolution state, mutable
    fn state_mut(&mut self) -> &mut RequestState;

    /// Whether a terminal response has been written
    fn is_committed(&self) -> bool;

    /// Write a plain-text (or pre-typed) body response
    fn string(&mut self, status: StatusCode, body: &str) -> GatewayResult<()>;

    /// Write a JSON response
    fn json(&mut self, status: StatusCode, body: Value) -> GatewayResult<()>;

    /// Write an HTTP redirect
    fn redirect(&mut self, status: StatusCode, location: &str) -> GatewayResult<()>;

    /// Write an empty response with the given status
    fn no_content(&mut self, status: StatusCode) -> GatewayResult<()>;
}

/// Captured response parts, consumed by the adapter after the chain runs
#[derive(Debug, Default)]
pub struct ResponseParts {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub cookies: Vec<SetCookie>,
    pub body: Vec<u8>,
}

/// Concrete, framework-agnostic [`RequestContext`] implementation
///
/// Adapters construct one from raw request parts; tests construct one
/// directly. The captured response is retrieved with
/// [`HttpContext::take_response`].
#[derive(Debug)]
pub struct HttpContext {
    id: String,
    method: Method,
    path: String,
    query: HashMap<String, String>,
    headers: HeaderMap,
    cookies: HashMap<String, String>,
    state: RequestState,
    response: ResponseParts,
}

impl HttpContext {
    /// Build a context from request parts
    pub fn new(method: Method, uri: &Uri, headers: HeaderMap) -> Self {
        let query = uri
            .query()
            .map(|raw| {
                url::form_urlencoded::parse(raw.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();

        let cookies = parse_cookie_header(&headers);

        Self {
            id: Uuid::new_v4().to_string(),
            method,
            path: uri.path().to_string(),
            query,
            headers,
            cookies,
            state: RequestState::default(),
            response: ResponseParts::default(),
        }
    }

    /// Consume the captured response parts
    pub fn take_response(self) -> ResponseParts {
        self.response
    }

    fn commit(&mut self, status: StatusCode) {
        self.response.status = Some(status);
    }

    fn set_response_content_type(&mut self, value: &str) {
        if !self.response.headers.contains_key("content-type") {
            if let Ok(parsed) = value.parse() {
                self.response.headers.insert("content-type", parsed);
            }
        }
    }
}

impl RequestContext for HttpContext {
    fn request_id(&self) -> &str {
        &self.id
    }

    fn method(&self) -> &Method {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn set_path(&mut self, path: &str) {
        self.path = path.to_string();
    }

    fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    fn set_header(&mut self, name: &str, value: &str) {
        if let (Ok(name), Ok(value)) = (
            name.parse::<axum::http::HeaderName>(),
            value.parse::<axum::http::HeaderValue>(),
        ) {
            self.response.headers.insert(name, value);
        }
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    fn set_cookie(&mut self, cookie: SetCookie) {
        self.response.cookies.push(cookie);
    }

    fn state(&self) -> &RequestState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RequestState {
        &mut self.state
    }

    fn is_committed(&self) -> bool {
        self.response.status.is_some()
    }

    fn string(&mut self, status: StatusCode, body: &str) -> GatewayResult<()> {
        self.set_response_content_type("text/plain; charset=utf-8");
        self.response.body = body.as_bytes().to_vec();
        self.commit(status);
        Ok(())
    }

    fn json(&mut self, status: StatusCode, body: Value) -> GatewayResult<()> {
        self.set_response_content_type("application/json");
        self.response.body = serde_json::to_vec(&body)?;
        self.commit(status);
        Ok(())
    }

    fn redirect(&mut self, status: StatusCode, location: &str) -> GatewayResult<()> {
        self.set_header("location", location);
        self.commit(status);
        Ok(())
    }

    fn no_content(&mut self, status: StatusCode) -> GatewayResult<()> {
        self.commit(status);
        Ok(())
    }
}

fn parse_cookie_header(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for value in headers.get_all("cookie") {
        let Ok(raw) = value.to_str() else { continue };
        for pair in raw.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                cookies.insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }
    cookies
}
