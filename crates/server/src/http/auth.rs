use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use deployment::Deployment;
use services::services::config::{AccessControlConfig, AccessControlMode};
use url::form_urlencoded;
use utils::response::ApiResponse;

use crate::DeploymentImpl;

const API_TOKEN_HEADER: &str = "x-api-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Denial {
    MissingToken,
    TokenMismatch,
}

impl Denial {
    fn reason(self) -> &'static str {
        match self {
            Denial::MissingToken => "missing_token",
            Denial::TokenMismatch => "token_mismatch",
        }
    }
}

fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let (scheme, rest) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(rest.trim()).filter(|token| !token.is_empty())
}

fn query_token(req: &Request) -> Option<String> {
    let query = req.uri().query()?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Paths are relative to `/api`, where this middleware is installed.
fn is_event_stream(req: &Request) -> bool {
    req.uri().path().starts_with("/events")
}

fn peer_addr(req: &Request) -> Option<SocketAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// Bearer header, then `x-api-token`, then `?token=` for event streams
/// (EventSource cannot send headers).
fn presented_token(req: &Request) -> Option<String> {
    let headers = req.headers();
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
    {
        return Some(token.to_string());
    }
    if let Some(token) = headers
        .get(API_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        return Some(token.to_string());
    }
    if is_event_stream(req) {
        return query_token(req);
    }
    None
}

fn authorize(access_control: &AccessControlConfig, req: &Request) -> Result<(), Denial> {
    if access_control.mode == AccessControlMode::Disabled {
        return Ok(());
    }

    let Some(expected) = access_control.token.as_deref().filter(|t| !t.is_empty()) else {
        tracing::warn!("access_control.mode=TOKEN without a token; treating as disabled");
        return Ok(());
    };

    let loopback = peer_addr(req).is_some_and(|addr| addr.ip().is_loopback());
    if access_control.allow_localhost_bypass && loopback {
        return Ok(());
    }

    match presented_token(req) {
        None => Err(Denial::MissingToken),
        Some(token) if token != expected => Err(Denial::TokenMismatch),
        Some(_) => Ok(()),
    }
}

pub async fn require_api_auth(
    State(deployment): State<DeploymentImpl>,
    req: Request,
    next: Next,
) -> Response {
    let access_control = deployment.config().read().await.access_control.clone();

    if let Err(denial) = authorize(&access_control, &req) {
        let peer = peer_addr(&req)
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        tracing::warn!(
            path = %req.uri().path(),
            method = %req.method(),
            peer = %peer,
            reason = denial.reason(),
            "Unauthorized API request"
        );
        let response = ApiResponse::<()>::error("Unauthorized");
        return (StatusCode::UNAUTHORIZED, Json(response)).into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use axum::body::Body;

    use super::*;

    fn token_mode(allow_localhost_bypass: bool) -> AccessControlConfig {
        AccessControlConfig {
            mode: AccessControlMode::Token,
            token: Some("sekrit".to_string()),
            allow_localhost_bypass,
        }
    }

    fn request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn bearer_header_is_parsed_case_insensitively() {
        assert_eq!(parse_authorization_bearer("Bearer sekrit"), Some("sekrit"));
        assert_eq!(parse_authorization_bearer("  bearer   sekrit "), Some("sekrit"));
        assert_eq!(parse_authorization_bearer("Basic abc"), None);
        assert_eq!(parse_authorization_bearer("Bearer "), None);
    }

    #[test]
    fn query_token_only_counts_on_event_streams() {
        let config = token_mode(false);
        assert_eq!(
            authorize(&config, &request("/events/notifications?token=sekrit")),
            Ok(())
        );
        assert_eq!(
            authorize(&config, &request("/tasks?token=sekrit")),
            Err(Denial::MissingToken)
        );
    }

    #[test]
    fn wrong_token_and_loopback_bypass() {
        let mut req = request("/tasks");
        req.headers_mut()
            .insert(API_TOKEN_HEADER, "nope".parse().unwrap());
        assert_eq!(
            authorize(&token_mode(false), &req),
            Err(Denial::TokenMismatch)
        );

        let mut req = request("/tasks");
        req.extensions_mut().insert(ConnectInfo(SocketAddr::new(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            4000,
        )));
        assert_eq!(authorize(&token_mode(true), &req), Ok(()));
        assert_eq!(
            authorize(&token_mode(false), &req),
            Err(Denial::MissingToken)
        );
    }

    #[test]
    fn disabled_mode_lets_everything_through() {
        let config = AccessControlConfig::default();
        assert_eq!(authorize(&config, &request("/tasks")), Ok(()));
    }
}
