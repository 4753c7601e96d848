use axum::{
    Extension, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::project::{Project, ProjectFilter};
use deployment::Deployment;
use serde::Deserialize;
use services::services::{
    editor::{EditorSession, ProjectSubmission, SaveOutcome},
    notification::Actor,
};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl, error::ApiError, middleware::load_project_middleware,
    routes::editor_form::EditorForm,
};

/// Submission form. `other_subject` is read only when `subject` is "Autre".
#[derive(Debug, Deserialize, TS)]
pub struct ProjectForm {
    pub title: String,
    pub description: String,
    pub subject: String,
    #[serde(default)]
    pub other_subject: Option<String>,
}

pub async fn get_projects(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<ProjectFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Project>>>, ApiError> {
    let projects = Project::find_filtered(&deployment.db().pool, actor.user_id, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(projects)))
}

pub async fn get_project(
    Extension(project): Extension<Project>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn submit_project(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    form: EditorForm<ProjectForm>,
) -> Result<ResponseJson<ApiResponse<SaveOutcome<Project>>>, ApiError> {
    let EditorForm { data, files, .. } = form;
    let mut session = EditorSession::new();
    session.loaded()?;

    let outcome = deployment
        .editor()
        .submit_project(
            &actor,
            &mut session,
            ProjectSubmission {
                title: data.title,
                description: data.description,
                subject: data.subject,
                other_subject: data.other_subject,
                files,
            },
        )
        .await?;

    Ok(ResponseJson(ApiResponse::success(outcome)))
}

pub async fn delete_project(
    State(deployment): State<DeploymentImpl>,
    Extension(actor): Extension<Actor>,
    Extension(project): Extension<Project>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Project::delete(&deployment.db().pool, actor.user_id, project.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Projet introuvable.".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let project_id_router = Router::new()
        .route("/", get(get_project).delete(delete_project))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_project_middleware::<DeploymentImpl>,
        ));

    let inner = Router::new()
        .route("/", get(get_projects).post(submit_project))
        .nest("/{project_id}", project_id_router);

    Router::new().nest("/projects", inner)
}
