use axum::{
    Json,
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use services::services::notification::Actor;
use utils::response::ApiResponse;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Header values may carry raw UTF-8 (accented names), so `to_str` is not
/// enough here.
fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?;
    let text = String::from_utf8(value.as_bytes().to_vec()).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// The caller identity forwarded by the authenticating gateway.
pub fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let user_id = header_text(headers, USER_ID_HEADER)?;
    let user_id = Uuid::parse_str(&user_id).ok()?;
    Some(Actor {
        user_id,
        full_name: header_text(headers, USER_NAME_HEADER),
        email: header_text(headers, USER_EMAIL_HEADER),
    })
}

/// Rejects requests without a valid identity and exposes the [`Actor`] to
/// handlers as an extension.
pub async fn require_user(mut req: Request, next: Next) -> Response {
    let Some(actor) = actor_from_headers(req.headers()) else {
        tracing::warn!(
            path = %req.uri().path(),
            method = %req.method(),
            "Request without a valid user identity"
        );
        let response = ApiResponse::<()>::error("Unauthorized");
        return (StatusCode::UNAUTHORIZED, Json(response)).into_response();
    };

    req.extensions_mut().insert(actor);
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn actor_requires_a_uuid_and_keeps_utf8_names() {
        let user_id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, user_id.to_string().parse().unwrap());
        headers.insert(
            USER_NAME_HEADER,
            HeaderValue::from_bytes("Élodie Martin".as_bytes()).unwrap(),
        );
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("  "));

        let actor = actor_from_headers(&headers).unwrap();
        assert_eq!(actor.user_id, user_id);
        assert_eq!(actor.full_name.as_deref(), Some("Élodie Martin"));
        assert_eq!(actor.email, None);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(actor_from_headers(&headers).is_none());
    }
}
