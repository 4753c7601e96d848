use axum::{Extension, Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::stats::DashboardStats;
use deployment::Deployment;
use services::services::notification::Actor;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

pub async fn get_stats(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
) -> Result<ResponseJson<ApiResponse<DashboardStats>>, ApiError> {
    let stats = DashboardStats::for_user(&deployment.db().pool, actor.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(stats)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/dashboard/stats", get(get_stats))
}
