use axum::{
    BoxError, Extension, Router,
    extract::State,
    response::{
        Sse,
        sse::{Event, KeepAlive},
    },
    routing::get,
};
use deployment::Deployment;
use futures_util::{Stream, TryStreamExt};
use services::services::notification::Actor;

use crate::DeploymentImpl;

/// Live notification patches for the caller, as server-sent events.
pub async fn notification_events(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
) -> Sse<impl Stream<Item = Result<Event, BoxError>>> {
    tracing::debug!(user_id = %actor.user_id, "notification stream opened");
    let stream = deployment
        .events()
        .notification_stream(actor.user_id)
        .map_ok(|msg| msg.to_sse_event())
        .map_err(BoxError::from);
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/events/notifications", get(notification_events))
}
