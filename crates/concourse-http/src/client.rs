//! The pooled outbound client.
//!
//! A semaphore bounds the number of calls in flight to
//! `OutboundConfig::max_connections`. A call that cannot get a slot waits,
//! and that wait counts against the per-call timeout.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;

use crate::backoff::backoff_delay;
use crate::config::OutboundConfig;
use crate::error::{HttpError, Result};
use crate::request::{normalize_params, OutboundRequest};

/// A fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct OutboundResponse {
    /// Status returned by the upstream.
    pub status: StatusCode,
    /// Response headers, duplicates included.
    pub headers: HeaderMap,
    /// Response body bytes.
    pub body: Bytes,
}

impl OutboundResponse {
    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Decode` if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| HttpError::Decode(e.to_string()))
    }

    /// The body as lossy UTF-8 text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Pooled HTTP client shared by every outbound call.
#[derive(Debug, Clone)]
pub struct OutboundClient {
    client: reqwest::Client,
    permits: Arc<Semaphore>,
    config: OutboundConfig,
}

impl OutboundClient {
    /// Build the client and its connection pool.
    ///
    /// Compressed response bodies are decoded before they are buffered, so
    /// `body` is always the plain payload.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Build` if the TLS backend cannot be initialized.
    pub fn new(config: OutboundConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(config.max_connections)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| HttpError::Build(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(config.max_connections)),
            config,
        })
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &OutboundConfig {
        &self.config
    }

    /// Stop accepting new calls. Calls already in flight run to completion.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Validating call: retries timeouts, classifies non-2xx responses.
    ///
    /// # Errors
    ///
    /// - `HttpError::Timeout` once every attempt has timed out
    /// - `HttpError::Client` for 4xx and `HttpError::Server` for 5xx responses,
    ///   without retry
    /// - `HttpError::Transport` for other connection failures
    pub async fn make_request(&self, request: OutboundRequest) -> Result<OutboundResponse> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.send_once(&request, true).await {
                Ok(response) => return Self::classify(response),
                Err(HttpError::Timeout { url, .. }) => {
                    tracing::warn!(
                        url = %url,
                        attempt,
                        max_attempts,
                        "Outbound request timed out"
                    );
                    if attempt >= max_attempts {
                        return Err(HttpError::Timeout {
                            url,
                            attempts: attempt,
                        });
                    }
                    let delay = backoff_delay(
                        attempt,
                        self.config.backoff_base_ms,
                        self.config.backoff_max_ms,
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// Validating call that decodes a JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Everything [`Self::make_request`] returns, plus `HttpError::Decode`.
    pub async fn make_json_request<T: DeserializeOwned>(
        &self,
        request: OutboundRequest,
    ) -> Result<T> {
        self.make_request(request).await?.json()
    }

    /// Raw call: one attempt, any status is returned untouched.
    ///
    /// # Errors
    ///
    /// Only transport failures and timeouts are errors.
    pub async fn raw_request(&self, request: OutboundRequest) -> Result<OutboundResponse> {
        self.send_once(&request, false).await
    }

    /// Issue one attempt while holding a pool slot, buffering the whole body.
    async fn send_once(
        &self,
        request: &OutboundRequest,
        with_params: bool,
    ) -> Result<OutboundResponse> {
        let url = request.target();
        let timeout = self.config.timeout();

        let _permit = match tokio::time::timeout(timeout, self.permits.acquire()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(HttpError::Transport("outbound client is closed".into())),
            Err(_) => return Err(timed_out(url)),
        };

        let mut builder = self.client.request(request.method.clone(), &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.clone(), value.clone());
        }
        if with_params && !request.params.is_empty() {
            builder = builder.query(&normalize_params(&request.params));
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| map_send_error(&url, &e))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_send_error(&url, &e))?;

        tracing::debug!(
            method = %request.method,
            url = %url,
            status = status.as_u16(),
            bytes = body.len(),
            "Outbound request completed"
        );

        Ok(OutboundResponse {
            status,
            headers,
            body,
        })
    }

    /// Turn a completed response into an error when it is outside 2xx/3xx.
    fn classify(response: OutboundResponse) -> Result<OutboundResponse> {
        let status = response.status;
        if status.is_client_error() {
            return Err(HttpError::Client {
                status,
                body: response.text(),
            });
        }
        if status.is_server_error() {
            return Err(HttpError::Server {
                status,
                body: response.text(),
            });
        }
        Ok(response)
    }
}

fn timed_out(url: String) -> HttpError {
    HttpError::Timeout { url, attempts: 1 }
}

fn map_send_error(url: &str, err: &reqwest::Error) -> HttpError {
    if err.is_timeout() {
        timed_out(url.to_string())
    } else if err.is_builder() {
        HttpError::Build(err.to_string())
    } else {
        HttpError::Transport(err.to_string())
    }
}
