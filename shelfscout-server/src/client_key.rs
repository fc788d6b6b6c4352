use axum::http::HeaderMap;
use std::net::SocketAddr;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Rate-limit key for a request: the peer IP, or the first
/// `x-forwarded-for` hop when the deployment sits behind a trusted proxy.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let first_hop = headers
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|hop| !hop.is_empty());
        if let Some(hop) = first_hop {
            return hop.to_string();
        }
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
