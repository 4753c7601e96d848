use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    notification::NotificationType,
    task::{Task, TaskData, TaskFilter},
};
use deployment::Deployment;
use services::services::{
    editor::{EditorSession, SaveOutcome, TaskSubmission},
    listing::{BatchDeleteRequest, BatchDeleteResult},
    notification::{Actor, NotificationMetadata},
};
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    middleware::load_task_middleware,
    routes::{ensure_batch_selection, editor_form::EditorForm},
};

pub async fn get_tasks(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<TaskFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = Task::find_filtered(&deployment.db().pool, actor.user_id, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(task)))
}

async fn save_task(
    deployment: &DeploymentImpl,
    actor: &Actor,
    id: Option<uuid::Uuid>,
    form: EditorForm<TaskData>,
) -> Result<SaveOutcome<Task>, ApiError> {
    let mut session = EditorSession::new();
    session.loaded()?;
    let outcome = deployment
        .editor()
        .save_task(
            actor,
            &mut session,
            TaskSubmission {
                id,
                data: form.data,
                files: form.files,
            },
        )
        .await?;
    Ok(outcome)
}

pub async fn create_task(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    form: EditorForm<TaskData>,
) -> Result<ResponseJson<ApiResponse<SaveOutcome<Task>>>, ApiError> {
    tracing::debug!(user_id = %actor.user_id, title = %form.data.title, "Creating task");
    let outcome = save_task(&deployment, &actor, None, form).await?;
    Ok(ResponseJson(ApiResponse::success(outcome)))
}

pub async fn update_task(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    Extension(task): Extension<Task>,
    form: EditorForm<TaskData>,
) -> Result<ResponseJson<ApiResponse<SaveOutcome<Task>>>, ApiError> {
    let outcome = save_task(&deployment, &actor, Some(task.id), form).await?;
    Ok(ResponseJson(ApiResponse::success(outcome)))
}

pub async fn delete_task(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    Extension(task): Extension<Task>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Task::delete(&deployment.db().pool, actor.user_id, task.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Tâche introuvable.".to_string()));
    }

    deployment
        .notifications()
        .create_notification(
            &actor,
            NotificationType::TaskDeleted,
            NotificationMetadata::titled(&task.title),
        )
        .await;

    Ok(ResponseJson(ApiResponse::success(())))
}

/// Deletes the selection without notifying.
pub async fn batch_delete_tasks(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<BatchDeleteRequest>,
) -> Result<ResponseJson<ApiResponse<BatchDeleteResult>>, ApiError> {
    let ids = ensure_batch_selection(&payload)?;
    let deleted = Task::delete_many(&deployment.db().pool, actor.user_id, &ids).await?;
    tracing::info!(user_id = %actor.user_id, deleted, "Batch deleted tasks");
    Ok(ResponseJson(ApiResponse::success(BatchDeleteResult { deleted })))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let task_id_router = Router::new()
        .route("/", get(get_task).put(update_task).delete(delete_task))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_task_middleware::<DeploymentImpl>,
        ));

    let inner = Router::new()
        .route("/", get(get_tasks).post(create_task))
        .route("/batch-delete", post(batch_delete_tasks))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/tasks", inner)
}
