use axum::{
    body::Body,
    extract::{rejection::JsonRejection, ConnectInfo, FromRequest, FromRequestParts, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use std::net::SocketAddr;

use crate::core::error::AppError;

/// Custom JSON extractor that provides consistent error responses
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppJsonRejection;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => Err(AppJsonRejection(rejection)),
        }
    }
}

pub struct AppJsonRejection(JsonRejection);

impl IntoResponse for AppJsonRejection {
    fn into_response(self) -> Response {
        let message = match self.0 {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err),
            JsonRejection::MissingJsonContentType(err) => {
                format!("Missing JSON content type: {}", err)
            }
            _ => "Failed to parse JSON body".to_string(),
        };

        AppError::BadRequest(message).into_response()
    }
}

/// How `ClientIp` resolves the caller address.
///
/// `X-Forwarded-For` is client-controlled on direct connections, so the
/// header is only honored when the deployment declares a reverse proxy in
/// front of the service (`TRUST_PROXY_HEADER=true`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientIpPolicy {
    pub trust_forwarded_header: bool,
}

/// Client IP used for abuse tracking and rate limiting.
///
/// Behind a trusted reverse proxy this is the first hop of
/// `X-Forwarded-For`; otherwise the peer address of the TCP connection.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let trust_header = parts
            .extensions
            .get::<ClientIpPolicy>()
            .map(|policy| policy.trust_forwarded_header)
            .unwrap_or(false);

        if trust_header {
            if let Some(forwarded) = parts
                .headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
            {
                if let Some(first) = forwarded.split(',').next() {
                    let first = first.trim();
                    if !first.is_empty() {
                        return Ok(ClientIp(first.to_string()));
                    }
                }
            }
        }

        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| ClientIp(addr.ip().to_string()))
            .ok_or_else(|| AppError::Internal("Client address unavailable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn request_parts(
        forwarded_for: Option<&str>,
        policy: Option<ClientIpPolicy>,
        peer: Option<&str>,
    ) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = forwarded_for {
            builder = builder.header("x-forwarded-for", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        if let Some(policy) = policy {
            parts.extensions.insert(policy);
        }
        if let Some(addr) = peer {
            let addr: SocketAddr = addr.parse().unwrap();
            parts.extensions.insert(ConnectInfo(addr));
        }
        parts
    }

    #[tokio::test]
    async fn test_trusted_proxy_uses_first_forwarded_hop() {
        let mut parts = request_parts(
            Some("203.0.113.7, 10.0.0.1"),
            Some(ClientIpPolicy {
                trust_forwarded_header: true,
            }),
            Some("10.0.0.1:4242"),
        );

        let ip = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip.0, "203.0.113.7");
    }

    #[tokio::test]
    async fn test_untrusted_forwarded_header_is_ignored() {
        let mut parts = request_parts(
            Some("203.0.113.7"),
            Some(ClientIpPolicy {
                trust_forwarded_header: false,
            }),
            Some("198.51.100.9:4242"),
        );

        let ip = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip.0, "198.51.100.9");
    }

    #[tokio::test]
    async fn test_missing_policy_defaults_to_peer_address() {
        let mut parts = request_parts(Some("203.0.113.7"), None, Some("198.51.100.9:4242"));

        let ip = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip.0, "198.51.100.9");
    }

    #[tokio::test]
    async fn test_no_peer_address_is_an_error() {
        let mut parts = request_parts(None, None, None);

        let result = ClientIp::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
