//! Client address and user agent recorded with each session

use async_trait::async_trait;
use auth_identity::ClientMetadata;
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header::USER_AGENT, request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::SocketAddr;

use crate::server::AppState;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";
pub const UNKNOWN_ADDRESS: &str = "unknown";

#[derive(Debug, Clone)]
pub struct ClientInfo(pub ClientMetadata);

#[async_trait]
impl FromRequestParts<AppState> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        let ip_address = client_address(&parts.headers, peer, state.trust_forwarded_headers);
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Ok(Self(ClientMetadata::new(ip_address, user_agent)))
    }
}

/// Proxy headers win only when trusted; the socket peer comes next.
pub fn client_address(headers: &HeaderMap, peer: Option<String>, trust_forwarded: bool) -> String {
    if trust_forwarded {
        let forwarded = header_str(headers, X_FORWARDED_FOR)
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| header_str(headers, X_REAL_IP).map(str::trim).filter(|v| !v.is_empty()));
        if let Some(address) = forwarded {
            return address.to_string();
        }
    }
    peer.unwrap_or_else(|| UNKNOWN_ADDRESS.to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
