use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get},
};
use db::models::tag::{CreateTag, Tag};
use deployment::Deployment;
use services::services::notification::Actor;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

pub async fn get_tags(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
) -> Result<ResponseJson<ApiResponse<Vec<Tag>>>, ApiError> {
    let tags = Tag::find_all(&deployment.db().pool, actor.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(tags)))
}

pub async fn create_tag(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateTag>,
) -> Result<ResponseJson<ApiResponse<Tag>>, ApiError> {
    let tag = Tag::create(&deployment.db().pool, actor.user_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(tag)))
}

/// Tasks and notes carrying the tag are detached, not deleted.
pub async fn delete_tag(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    Path(tag_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Tag::delete(&deployment.db().pool, actor.user_id, tag_id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Tag introuvable.".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/tags", get(get_tags).post(create_tag))
        .route("/tags/{tag_id}", delete(delete_tag))
}
