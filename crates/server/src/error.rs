use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{DbErr, models::tag::TagError};
use services::services::{editor::EditorError, storage::StorageError};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error, ts_rs::TS)]
#[ts(type = "string")]
pub enum ApiError {
    #[error(transparent)]
    Tag(#[from] TagError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

fn editor_status(err: &EditorError) -> (StatusCode, &'static str) {
    match err {
        EditorError::Validation(_)
        | EditorError::TooManyAttachments
        | EditorError::UnsupportedFileType(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
        EditorError::InvalidTransition { .. } => (StatusCode::CONFLICT, "EditorError"),
        EditorError::Storage(StorageError::InvalidPath(_)) => {
            (StatusCode::BAD_REQUEST, "StorageError")
        }
        EditorError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "StorageError"),
        EditorError::Database(DbErr::RecordNotFound(_)) => (StatusCode::NOT_FOUND, "DatabaseError"),
        EditorError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::Tag(err) => match err {
                TagError::EmptyName | TagError::Duplicate(_) => {
                    (StatusCode::BAD_REQUEST, "TagError")
                }
                TagError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TagError"),
            },
            ApiError::Editor(err) => editor_status(err),
            ApiError::Database(db_err) => match db_err {
                DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Multipart(_) => (StatusCode::BAD_REQUEST, "MultipartError"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
        };

        // Domain errors already carry the French text shown to the user.
        let error_message = match &self {
            ApiError::Tag(TagError::Database(_)) => format!("{}: {}", error_type, self),
            ApiError::Tag(err) => err.to_string(),
            ApiError::Editor(err) => err.user_message(),
            ApiError::Multipart(_) => {
                "Échec de l'envoi du fichier. Vérifiez le fichier et réessayez.".to_string()
            }
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Database(_) => format!("{}: {}", error_type, self),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }
        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use services::services::{editor::EditorState, storage::Bucket};

    use super::*;

    async fn message_of(err: ApiError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        (status, json["message"].as_str().unwrap_or_default().to_string())
    }

    #[test]
    fn api_error_maps_to_expected_http_statuses() {
        assert_eq!(
            ApiError::BadRequest("bad".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("missing".to_string())
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Database(DbErr::RecordNotFound("Task not found".to_string()))
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Database(DbErr::Custom("boom".to_string()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(EditorError::InvalidTransition {
                from: EditorState::Saving,
                to: EditorState::Saving,
            })
            .into_response()
            .status(),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn duplicate_tag_is_a_validation_error_with_its_message() {
        let (status, message) =
            message_of(ApiError::from(TagError::Duplicate("Urgent".to_string()))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Le tag \"Urgent\" existe déjà.");
    }

    #[tokio::test]
    async fn editor_errors_surface_the_user_message() {
        let (status, message) = message_of(ApiError::from(EditorError::Validation(
            "Le titre est obligatoire.".to_string(),
        )))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Le titre est obligatoire.");

        let (status, message) = message_of(ApiError::from(EditorError::Storage(
            StorageError::BucketNotFound(Bucket::TasksFiles),
        )))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(message.contains("'tasks_files'"));
    }
}
