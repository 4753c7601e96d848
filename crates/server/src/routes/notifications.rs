use std::net::{IpAddr, SocketAddr};

use axum::{
    Extension, Json, Router,
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, header},
    response::Json as ResponseJson,
    routing::{delete, get, post},
};
use chrono::Utc;
use db::models::notification::{Notification, NotificationType};
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use services::services::{
    client_info::ClientHints,
    notification::{Actor, NotificationMetadata, RequestContext},
    notification_center::CenterSnapshot,
    time_label::relative_label,
};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

/// A notification as listed on the notifications page.
#[derive(Debug, Serialize, TS)]
pub struct NotificationView {
    #[serde(flatten)]
    #[ts(flatten)]
    pub notification: Notification,
    pub time_label: String,
}

#[derive(Debug, Deserialize, TS)]
pub struct AuthEventRequest {
    pub event_type: NotificationType,
}

pub async fn get_notifications(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
) -> Result<ResponseJson<ApiResponse<Vec<NotificationView>>>, ApiError> {
    let limit = deployment.config().read().await.notifications.recent_limit;
    let now = Utc::now();
    let notifications = Notification::find_recent(&deployment.db().pool, actor.user_id, limit)
        .await?
        .into_iter()
        .map(|notification| NotificationView {
            time_label: relative_label(notification.created_at, now),
            notification,
        })
        .collect();
    Ok(ResponseJson(ApiResponse::success(notifications)))
}

pub async fn mark_notification_read(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    Path(notification_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<bool>>, ApiError> {
    let changed = deployment
        .notification_centers()
        .mark_read(actor.user_id, notification_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(changed)))
}

pub async fn clear_notifications(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
) -> Result<ResponseJson<ApiResponse<u64>>, ApiError> {
    let removed = deployment
        .notification_centers()
        .clear_all(actor.user_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(removed)))
}

pub async fn get_center(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
) -> Result<ResponseJson<ApiResponse<CenterSnapshot>>, ApiError> {
    let snapshot = deployment
        .notification_centers()
        .snapshot(actor.user_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(snapshot)))
}

/// Opening the bell marks every notification read and resets the badge.
pub async fn open_bell(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
) -> Result<ResponseJson<ApiResponse<u64>>, ApiError> {
    let marked = deployment
        .notification_centers()
        .open_bell(actor.user_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(marked)))
}

pub async fn dismiss_toast(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    Path(toast_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<bool>>, ApiError> {
    let dismissed = deployment
        .notification_centers()
        .dismiss(actor.user_id, toast_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(dismissed)))
}

fn header_value(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Accepts a bare address or `address:port`.
fn parse_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}

/// First hop of `x-forwarded-for`, then `x-real-ip`, then the peer address.
/// Values that are not an IP address are skipped. Loopback peers are left
/// out so the lookup resolves the public address.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = header_value(headers, "x-forwarded-for")
        .and_then(|value| value.split(',').next().and_then(parse_ip));
    let real_ip = header_value(headers, "x-real-ip").and_then(|value| parse_ip(&value));
    let peer = peer.map(|addr| addr.ip()).filter(|ip| !ip.is_loopback());

    forwarded.or(real_ip).or(peer).map(|ip| ip.to_string())
}

pub fn request_context(headers: &HeaderMap, peer: Option<SocketAddr>) -> RequestContext {
    RequestContext {
        ip: client_ip(headers, peer),
        user_agent: header_value(headers, header::USER_AGENT),
        hints: ClientHints {
            brands: header_value(headers, "sec-ch-ua"),
            full_version_list: header_value(headers, "sec-ch-ua-full-version-list"),
            platform: header_value(headers, "sec-ch-ua-platform"),
        },
    }
}

/// Called by the authenticating gateway after a sign-up, sign-in or password
/// reset; the notification is enriched from the forwarded request headers.
pub async fn record_auth_event(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    connect_info: Option<Extension<ConnectInfo<SocketAddr>>>,
    headers: HeaderMap,
    Json(payload): Json<AuthEventRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if !payload.event_type.is_auth_event() {
        return Err(ApiError::BadRequest(format!(
            "{} n'est pas un événement d'authentification.",
            payload.event_type
        )));
    }

    let peer = connect_info.map(|Extension(ConnectInfo(addr))| addr);
    let metadata = NotificationMetadata {
        request: Some(request_context(&headers, peer)),
        ..Default::default()
    };
    deployment
        .notifications()
        .create_notification(&actor, payload.event_type, metadata)
        .await;

    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route(
            "/notifications",
            get(get_notifications).delete(clear_notifications),
        )
        .route(
            "/notifications/{notification_id}/read",
            post(mark_notification_read),
        )
        .route("/notifications/auth-events", post(record_auth_event))
        .route("/notifications/center", get(get_center))
        .route("/notifications/center/open", post(open_bell))
        .route(
            "/notifications/center/toasts/{toast_id}",
            delete(dismiss_toast),
        )
}
