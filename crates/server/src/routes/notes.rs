use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    note::{Note, NoteData, NoteFilter},
    notification::NotificationType,
};
use deployment::Deployment;
use services::services::{
    editor::{EditorSession, NoteSubmission, SaveOutcome},
    listing::{BatchDeleteRequest, BatchDeleteResult},
    notification::{Actor, NotificationMetadata},
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    middleware::load_note_middleware,
    routes::{editor_form::EditorForm, ensure_batch_selection},
};

pub async fn get_notes(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<NoteFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Note>>>, ApiError> {
    let notes = Note::find_filtered(&deployment.db().pool, actor.user_id, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(notes)))
}

pub async fn get_note(
    Extension(note): Extension<Note>,
) -> Result<ResponseJson<ApiResponse<Note>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(note)))
}

async fn save_note(
    deployment: &DeploymentImpl,
    actor: &Actor,
    id: Option<Uuid>,
    form: EditorForm<NoteData>,
) -> Result<SaveOutcome<Note>, ApiError> {
    let mut session = EditorSession::new();
    session.loaded()?;
    let outcome = deployment
        .editor()
        .save_note(
            actor,
            &mut session,
            NoteSubmission {
                id,
                data: form.data,
                cover: form.cover,
                files: form.files,
            },
        )
        .await?;
    Ok(outcome)
}

pub async fn create_note(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    form: EditorForm<NoteData>,
) -> Result<ResponseJson<ApiResponse<SaveOutcome<Note>>>, ApiError> {
    let outcome = save_note(&deployment, &actor, None, form).await?;
    Ok(ResponseJson(ApiResponse::success(outcome)))
}

/// A missing cover part keeps the current cover unless the payload
/// overrides `cover_url`.
pub async fn update_note(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    Extension(note): Extension<Note>,
    form: EditorForm<NoteData>,
) -> Result<ResponseJson<ApiResponse<SaveOutcome<Note>>>, ApiError> {
    let mut form = form;
    if form.data.cover_url.is_none() && form.cover.is_none() {
        form.data.cover_url = note.cover_url.clone();
    }
    let outcome = save_note(&deployment, &actor, Some(note.id), form).await?;
    Ok(ResponseJson(ApiResponse::success(outcome)))
}

pub async fn delete_note(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    Extension(note): Extension<Note>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Note::delete(&deployment.db().pool, actor.user_id, note.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Note introuvable.".to_string()));
    }

    deployment
        .notifications()
        .create_notification(
            &actor,
            NotificationType::NoteDeleted,
            NotificationMetadata::titled(&note.title),
        )
        .await;

    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn batch_delete_notes(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<BatchDeleteRequest>,
) -> Result<ResponseJson<ApiResponse<BatchDeleteResult>>, ApiError> {
    let ids = ensure_batch_selection(&payload)?;
    let deleted = Note::delete_many(&deployment.db().pool, actor.user_id, &ids).await?;
    tracing::info!(user_id = %actor.user_id, deleted, "Batch deleted notes");
    Ok(ResponseJson(ApiResponse::success(BatchDeleteResult { deleted })))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let note_id_router = Router::new()
        .route("/", get(get_note).put(update_note).delete(delete_note))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_note_middleware::<DeploymentImpl>,
        ));

    let inner = Router::new()
        .route("/", get(get_notes).post(create_note))
        .route("/batch-delete", post(batch_delete_notes))
        .nest("/{note_id}", note_id_router);

    Router::new().nest("/notes", inner)
}
