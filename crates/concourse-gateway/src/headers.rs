//! Header sets for proxied calls.

use std::net::IpAddr;

use axum::http::header::{
    ACCEPT_ENCODING, CONTENT_LENGTH, DATE, SERVER, SET_COOKIE, USER_AGENT,
};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Headers that only describe one connection and are never forwarded.
pub const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "te",
    "trailer",
    "upgrade",
    "proxy-authenticate",
    "proxy-authorization",
    "transfer-encoding",
    "host",
];

/// Client address as seen by the gateway.
pub const FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Caller device identifier expected by the authorization service.
pub const DEVICE_FINGERPRINT: HeaderName = HeaderName::from_static("x-device-fingerprint");

/// Whether `name` is a hop-by-hop header.
#[must_use]
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Build the header list for an outbound proxied call.
///
/// Every inbound header except the hop-by-hop set is copied, duplicates
/// included. `Accept-Encoding` is left to the outbound client, which only
/// offers encodings it can decode. The forwarded-for, user-agent and device-fingerprint
/// headers appear exactly once: the first inbound value is kept and the
/// header is synthesized only when the caller did not send it.
#[must_use]
pub fn outbound_headers(
    inbound: &HeaderMap,
    client_ip: Option<IpAddr>,
) -> Vec<(HeaderName, HeaderValue)> {
    let singletons = [FORWARDED_FOR, USER_AGENT, DEVICE_FINGERPRINT];
    let mut seen = [false; 3];
    let mut headers = Vec::with_capacity(inbound.len() + singletons.len());

    for (name, value) in inbound {
        if is_hop_by_hop(name) || name == ACCEPT_ENCODING {
            continue;
        }
        if let Some(index) = singletons.iter().position(|single| single == name) {
            if seen[index] {
                continue;
            }
            seen[index] = true;
        }
        headers.push((name.clone(), value.clone()));
    }

    for (index, name) in singletons.into_iter().enumerate() {
        if seen[index] {
            continue;
        }
        let value = if name == FORWARDED_FOR {
            client_ip
                .and_then(|ip| HeaderValue::from_str(&ip.to_string()).ok())
                .unwrap_or_else(|| HeaderValue::from_static(""))
        } else {
            HeaderValue::from_static("")
        };
        headers.push((name, value));
    }

    headers
}

/// Headers of a successful upstream response, as handed to local handlers.
///
/// Drops cookies, framing and identity headers along with the hop-by-hop
/// set. On duplicates the first value wins.
#[must_use]
pub fn sanitize_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut sanitized = HeaderMap::new();
    for (name, value) in upstream {
        if is_hop_by_hop(name)
            || [&SET_COOKIE, &CONTENT_LENGTH, &DATE, &SERVER].contains(&name)
            || sanitized.contains_key(name)
        {
            continue;
        }
        sanitized.insert(name.clone(), value.clone());
    }
    sanitized
}

/// Headers of a failed upstream response relayed to the caller.
///
/// Everything except the hop-by-hop set and `Content-Length`, which is
/// recomputed from the relayed body. Duplicates are kept.
#[must_use]
pub fn relay_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut relayed = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if is_hop_by_hop(name) || name == CONTENT_LENGTH {
            continue;
        }
        relayed.append(name.clone(), value.clone());
    }
    relayed
}
