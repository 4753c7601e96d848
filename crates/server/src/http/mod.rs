use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use utils::assets::storage_dir;

use crate::{DeploymentImpl, middleware::require_user, routes};

mod auth;

pub fn router(deployment: DeploymentImpl) -> Router {
    // Layers run bottom-up: token boundary first, then caller identity.
    let api_routes = Router::new()
        .merge(routes::tasks::router(&deployment))
        .merge(routes::notes::router(&deployment))
        .merge(routes::projects::router(&deployment))
        .merge(routes::tags::router())
        .merge(routes::notifications::router())
        .merge(routes::events::router())
        .merge(routes::dashboard::router())
        .merge(routes::tools::router())
        .layer(from_fn(require_user))
        .layer(from_fn_with_state(
            deployment.clone(),
            auth::require_api_auth,
        ));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .nest_service("/storage", ServeDir::new(storage_dir()))
        .layer(TraceLayer::new_for_http())
        .with_state(deployment)
}
