use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use std::convert::Infallible;
use std::net::SocketAddr;

pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Client identity: the peer's network address.
///
/// Falls back to `"unknown"` when the server was not started with connect
/// info, so every such client shares one session. Clients behind one NAT
/// share a session too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_IDENTITY.to_string());

        tracing::Span::current().record("client_ip", ip.as_str());

        Ok(ClientIdentity(ip))
    }
}
