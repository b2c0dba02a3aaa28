//! Pooled outbound HTTP client for concourse.
//!
//! Every call the gateway makes to an upstream service goes through one
//! [`OutboundClient`], constructed once at startup and shared behind an `Arc`.
//! The client offers two call paths:
//!
//! - **Validating** ([`OutboundClient::make_request`],
//!   [`OutboundClient::make_json_request`]): boolean query parameters are
//!   normalized, transport timeouts are retried with exponential backoff, and
//!   completed responses outside the 2xx range are classified into
//!   [`HttpError::Client`] or [`HttpError::Server`].
//! - **Raw** ([`OutboundClient::raw_request`]): one attempt, no status
//!   classification. Used by the reverse proxy, which must relay upstream
//!   error bodies byte-for-byte.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Auth Gate   │   │ Reverse Proxy│   │ Health/Chat  │
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        │ validating       │ raw              │ validating
//!        └──────────────────┼──────────────────┘
//!                  ┌────────▼─────────┐
//!                  │  OutboundClient  │
//!                  │  permits + retry │
//!                  └────────┬─────────┘
//!                           │ keep-alive pool
//!                  ┌────────▼─────────┐
//!                  │    upstreams     │
//!                  └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use concourse_http::{OutboundClient, OutboundConfig, OutboundRequest};
//! use reqwest::Method;
//!
//! # async fn example() -> Result<(), concourse_http::HttpError> {
//! let client = OutboundClient::new(OutboundConfig::default())?;
//!
//! let request = OutboundRequest::new(Method::GET, "http://auth:8000/api/health/ping")
//!     .param("verbose", true);
//! let response = client.make_request(request).await?;
//! assert!(response.status.is_success());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod backoff;
pub mod client;
pub mod config;
pub mod error;
pub mod request;

pub use backoff::backoff_delay;
pub use client::{OutboundClient, OutboundResponse};
pub use config::OutboundConfig;
pub use error::{HttpError, Result};
pub use request::{normalize_params, OutboundRequest, ParamValue};

pub use reqwest::{header, Method, StatusCode};
