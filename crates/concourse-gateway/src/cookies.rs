//! Parsing of upstream `Set-Cookie` headers.
//!
//! Cookies issued by an upstream are parsed into [`UpstreamCookie`] entries so
//! local handlers can re-emit them on their own responses.

use axum::http::HeaderValue;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// Expires format used by the authorization service.
const EXPIRES_FORMAT: &str = "%a, %d-%b-%Y %H:%M:%S GMT";

/// One cookie set by an upstream response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamCookie {
    /// Cookie name.
    pub key: String,
    /// Cookie value, unquoted.
    pub value: String,
    /// Path attribute, `/` when absent.
    pub path: String,
    /// Domain attribute.
    pub domain: Option<String>,
    /// `Secure` flag.
    pub secure: bool,
    /// `HttpOnly` flag.
    pub http_only: bool,
    /// `SameSite` attribute, lowercase, `lax` when absent.
    pub same_site: String,
    /// Lifetime in seconds.
    pub max_age: Option<i64>,
}

impl UpstreamCookie {
    /// Parse one `Set-Cookie` header value.
    ///
    /// An explicit `Max-Age` wins over `Expires`. An `Expires` timestamp is
    /// converted to seconds from `now` and clamped at zero. Returns `None`
    /// when the header carries no `name=value` pair.
    #[must_use]
    pub fn parse(raw: &str, now: DateTime<Utc>) -> Option<Self> {
        let mut parts = raw.split(';');
        let (key, value) = parts.next()?.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }

        let mut cookie = Self {
            key: key.to_string(),
            value: unquote(value.trim()).to_string(),
            path: "/".to_string(),
            domain: None,
            secure: false,
            http_only: false,
            same_site: "lax".to_string(),
            max_age: None,
        };
        let mut expires = None;

        for attribute in parts {
            let (name, value) = match attribute.split_once('=') {
                Some((name, value)) => (name.trim(), value.trim()),
                None => (attribute.trim(), ""),
            };
            match name.to_ascii_lowercase().as_str() {
                "path" if !value.is_empty() => cookie.path = value.to_string(),
                "domain" if !value.is_empty() => cookie.domain = Some(value.to_string()),
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                "samesite" if !value.is_empty() => cookie.same_site = value.to_ascii_lowercase(),
                "max-age" => cookie.max_age = value.parse().ok(),
                "expires" => expires = parse_expires(value),
                _ => {}
            }
        }

        if cookie.max_age.is_none() {
            cookie.max_age = expires.map(|at: DateTime<Utc>| (at - now).num_seconds().max(0));
        }
        Some(cookie)
    }

    /// Render the cookie as a `Set-Cookie` header value.
    ///
    /// Returns `None` if the cookie contains bytes not allowed in a header.
    #[must_use]
    pub fn to_header_value(&self) -> Option<HeaderValue> {
        let mut rendered = format!("{}={}; Path={}", self.key, self.value, self.path);
        if let Some(domain) = &self.domain {
            rendered.push_str("; Domain=");
            rendered.push_str(domain);
        }
        if let Some(max_age) = self.max_age {
            rendered.push_str(&format!("; Max-Age={max_age}"));
        }
        if self.secure {
            rendered.push_str("; Secure");
        }
        if self.http_only {
            rendered.push_str("; HttpOnly");
        }
        rendered.push_str("; SameSite=");
        rendered.push_str(same_site_label(&self.same_site));

        HeaderValue::from_str(&rendered).ok()
    }
}

/// Parse every `Set-Cookie` value, skipping malformed ones.
pub fn parse_all<'a>(
    values: impl IntoIterator<Item = &'a HeaderValue>,
    now: DateTime<Utc>,
) -> Vec<UpstreamCookie> {
    values
        .into_iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| {
            let cookie = UpstreamCookie::parse(raw, now);
            if cookie.is_none() {
                tracing::debug!(header = %raw, "Skipping malformed Set-Cookie header");
            }
            cookie
        })
        .collect()
}

fn parse_expires(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, EXPIRES_FORMAT)
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc2822(value)
                .ok()
                .map(|at| at.with_timezone(&Utc))
        })
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn same_site_label(same_site: &str) -> &str {
    match same_site {
        "strict" => "Strict",
        "none" => "None",
        _ => "Lax",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn defaults_for_bare_cookie() {
        let cookie = UpstreamCookie::parse("access_token=abc", now()).unwrap();
        assert_eq!(cookie.key, "access_token");
        assert_eq!(cookie.value, "abc");
        assert_eq!(cookie.path, "/");
        assert_eq!(cookie.domain, None);
        assert!(!cookie.secure);
        assert!(!cookie.http_only);
        assert_eq!(cookie.same_site, "lax");
        assert_eq!(cookie.max_age, None);
    }

    #[test]
    fn attributes_are_parsed() {
        let cookie = UpstreamCookie::parse(
            "refresh_token=\"xyz\"; Path=/api; Domain=example.com; Secure; HttpOnly; SameSite=Strict; Max-Age=600",
            now(),
        )
        .unwrap();
        assert_eq!(cookie.value, "xyz");
        assert_eq!(cookie.path, "/api");
        assert_eq!(cookie.domain.as_deref(), Some("example.com"));
        assert!(cookie.secure);
        assert!(cookie.http_only);
        assert_eq!(cookie.same_site, "strict");
        assert_eq!(cookie.max_age, Some(600));
    }

    #[test]
    fn max_age_wins_over_expires() {
        let cookie = UpstreamCookie::parse(
            "a=1; Expires=Wed, 01-Jan-2025 13:00:00 GMT; Max-Age=5",
            now(),
        )
        .unwrap();
        assert_eq!(cookie.max_age, Some(5));
    }

    #[test]
    fn expires_converted_to_seconds_from_now() {
        let cookie =
            UpstreamCookie::parse("a=1; Expires=Wed, 01-Jan-2025 13:00:00 GMT", now()).unwrap();
        assert_eq!(cookie.max_age, Some(3600));

        let rfc = UpstreamCookie::parse("a=1; Expires=Wed, 01 Jan 2025 12:01:00 GMT", now()).unwrap();
        assert_eq!(rfc.max_age, Some(60));
    }

    #[test]
    fn past_expiry_clamps_to_zero() {
        let cookie =
            UpstreamCookie::parse("a=1; Expires=Tue, 31-Dec-2024 12:00:00 GMT", now()).unwrap();
        assert_eq!(cookie.max_age, Some(0));
    }

    #[test]
    fn malformed_headers_are_skipped() {
        assert!(UpstreamCookie::parse("no-pair", now()).is_none());
        assert!(UpstreamCookie::parse("=value", now()).is_none());

        let values = [
            HeaderValue::from_static("a=1"),
            HeaderValue::from_static("garbage"),
            HeaderValue::from_static("b=2; HttpOnly"),
        ];
        let cookies = parse_all(&values, now());
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[1].key, "b");
    }

    #[test]
    fn renders_header_value() {
        let cookie = UpstreamCookie::parse(
            "access_token=abc; Domain=example.com; HttpOnly; Max-Age=60",
            now(),
        )
        .unwrap();
        assert_eq!(
            cookie.to_header_value().unwrap(),
            "access_token=abc; Path=/; Domain=example.com; Max-Age=60; HttpOnly; SameSite=Lax"
        );
    }
}
