//! Client Identity Resolver
//!
//! Picks the caller's public address out of proxy headers, falling back to
//! the socket peer. Pure and synchronous: no I/O, no retries.

use crate::domain::services::address::{classify, normalize};
use crate::domain::value_objects::NetworkAddress;
use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Headers consulted in priority order: CDN edge first, then reverse proxies,
/// then generic forwarding headers. Tests pin this order.
pub const CLIENT_ADDRESS_HEADERS: &[&str] = &[
    "cf-connecting-ip",
    "true-client-ip",
    "x-real-ip",
    "x-forwarded-for",
    "x-client-ip",
    "x-cluster-client-ip",
    "forwarded",
];

/// Resolve the client's public address.
///
/// Within a multi-valued header the first public candidate wins. Returns
/// `None` when neither the headers nor the connection yield a public address.
pub fn resolve(headers: &HeaderMap, connection: Option<SocketAddr>) -> Option<NetworkAddress> {
    for name in CLIENT_ADDRESS_HEADERS {
        for value in headers.get_all(*name) {
            let Ok(value) = value.to_str() else {
                tracing::debug!("ignoring non-ascii {} header", name);
                continue;
            };

            for candidate in candidates(name, value) {
                let addr = normalize(candidate);
                if classify(&addr).is_public() {
                    tracing::debug!("client address {} from {}", addr, name);
                    return Some(addr);
                }
            }
        }
    }

    let peer = normalize(&connection?.ip().to_string());
    if classify(&peer).is_public() {
        tracing::debug!("client address {} from connection", peer);
        Some(peer)
    } else {
        None
    }
}

/// Split one header value into address candidates.
fn candidates<'a>(name: &str, value: &'a str) -> Vec<&'a str> {
    if name == "forwarded" {
        forwarded_for(value)
    } else {
        value.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
    }
}

/// Extract `for=` parameters from an RFC 7239 `Forwarded` header.
fn forwarded_for(value: &str) -> Vec<&str> {
    value
        .split(',')
        .flat_map(|element| element.split(';'))
        .filter_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("for")
                .then(|| val.trim().trim_matches('"'))
        })
        .filter(|s| !s.is_empty())
        .collect()
}
