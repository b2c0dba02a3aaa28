//! Outbound request descriptor.
//!
//! An [`OutboundRequest`] is built per call and never persisted. Headers are
//! kept as an ordered list so duplicates survive and are sent in the order
//! they were added.

use bytes::Bytes;
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::Method;
use serde::Serialize;

use crate::error::{HttpError, Result};

/// A query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Sent as-is.
    Text(String),
    /// Sent as its decimal representation.
    Int(i64),
    /// Sent as the lowercase literal `true` or `false`.
    Bool(bool),
}

impl ParamValue {
    fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Int(n) => n.to_string(),
            Self::Bool(true) => "true".to_string(),
            Self::Bool(false) => "false".to_string(),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Render query parameters to strings, lowercasing booleans.
#[must_use]
pub fn normalize_params(params: &[(String, ParamValue)]) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| (key.clone(), value.render()))
        .collect()
}

/// Everything needed to issue one outbound call.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute target URL without query string.
    pub url: String,
    /// Ordered header list; duplicates are preserved.
    pub headers: Vec<(HeaderName, HeaderValue)>,
    /// Already-encoded query string, forwarded verbatim.
    pub raw_query: Option<String>,
    /// Structured query parameters, appended after `raw_query`.
    pub params: Vec<(String, ParamValue)>,
    /// Request body.
    pub body: Option<Bytes>,
}

impl OutboundRequest {
    /// Start a request for `method` and `url`.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            raw_query: None,
            params: Vec::new(),
            body: None,
        }
    }

    /// Append a header. Existing headers with the same name are kept.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Replace the whole header list.
    #[must_use]
    pub fn headers(mut self, headers: Vec<(HeaderName, HeaderValue)>) -> Self {
        self.headers = headers;
        self
    }

    /// Forward an encoded query string unchanged. Empty strings are ignored.
    #[must_use]
    pub fn raw_query(mut self, query: Option<&str>) -> Self {
        self.raw_query = query.filter(|q| !q.is_empty()).map(str::to_string);
        self
    }

    /// Add a structured query parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Set the body. Empty bodies are sent as no body at all.
    #[must_use]
    pub fn body(mut self, body: Bytes) -> Self {
        self.body = if body.is_empty() { None } else { Some(body) };
        self
    }

    /// Serialize `value` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Build` if serialization fails.
    pub fn json<T: Serialize>(self, value: &T) -> Result<Self> {
        let encoded = serde_json::to_vec(value).map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(self
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(Bytes::from(encoded)))
    }

    /// Forward a `Cookie` header verbatim.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Build` if the value contains invalid header bytes.
    pub fn cookies(self, cookie_header: &str) -> Result<Self> {
        if cookie_header.is_empty() {
            return Ok(self);
        }
        let value = HeaderValue::from_str(cookie_header)
            .map_err(|e| HttpError::Build(format!("invalid cookie header: {e}")))?;
        Ok(self.header(COOKIE, value))
    }

    /// The URL including the raw query string, if any.
    #[must_use]
    pub fn target(&self) -> String {
        match &self.raw_query {
            Some(query) => format!("{}?{query}", self.url),
            None => self.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_are_lowercased() {
        let params = vec![
            ("active".to_string(), ParamValue::from(true)),
            ("archived".to_string(), ParamValue::from(false)),
            ("page".to_string(), ParamValue::from(2_i64)),
            ("q".to_string(), ParamValue::from("True")),
        ];
        let normalized = normalize_params(&params);
        assert_eq!(
            normalized,
            vec![
                ("active".to_string(), "true".to_string()),
                ("archived".to_string(), "false".to_string()),
                ("page".to_string(), "2".to_string()),
                ("q".to_string(), "True".to_string()),
            ]
        );
    }

    #[test]
    fn duplicate_headers_kept_in_order() {
        let request = OutboundRequest::new(Method::GET, "http://upstream/x")
            .header(
                HeaderName::from_static("x-tag"),
                HeaderValue::from_static("a"),
            )
            .header(
                HeaderName::from_static("x-tag"),
                HeaderValue::from_static("b"),
            );
        let values: Vec<_> = request
            .headers
            .iter()
            .map(|(_, v)| v.to_str().unwrap())
            .collect();
        assert_eq!(values, ["a", "b"]);
    }

    #[test]
    fn target_appends_raw_query() {
        let request = OutboundRequest::new(Method::GET, "http://upstream/items")
            .raw_query(Some("page=2&size=10"));
        assert_eq!(request.target(), "http://upstream/items?page=2&size=10");

        let request = OutboundRequest::new(Method::GET, "http://upstream/items").raw_query(Some(""));
        assert_eq!(request.target(), "http://upstream/items");
    }

    #[test]
    fn empty_body_becomes_none() {
        let request = OutboundRequest::new(Method::POST, "http://upstream").body(Bytes::new());
        assert!(request.body.is_none());
    }

    #[test]
    fn json_sets_content_type() {
        let request = OutboundRequest::new(Method::POST, "http://upstream")
            .json(&serde_json::json!({"a": 1}))
            .unwrap();
        assert_eq!(request.headers[0].0, CONTENT_TYPE);
        assert_eq!(request.body.as_deref(), Some(&b"{\"a\":1}"[..]));
    }
}
