use axum::{
    Json,
    extract::{FromRequest, Multipart, Request},
    http::header,
};
use serde::de::DeserializeOwned;
use services::services::storage::StagedFile;

use crate::error::ApiError;

const DATA_FIELD: &str = "data";
const FILES_FIELD: &str = "files";
const COVER_FIELD: &str = "cover";

/// Editor payload, either a JSON body or a multipart form carrying the JSON
/// in a `data` part next to `files` parts (and an optional `cover`).
#[derive(Debug)]
pub struct EditorForm<T> {
    pub data: T,
    pub files: Vec<StagedFile>,
    pub cover: Option<StagedFile>,
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

impl<S, T> FromRequest<S> for EditorForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let Json(data) = Json::<T>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            return Ok(Self {
                data,
                files: Vec::new(),
                cover: None,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        let mut data = None;
        let mut files = Vec::new();
        let mut cover = None;
        while let Some(field) = multipart.next_field().await? {
            let field_name = field.name().unwrap_or_default().to_string();
            match field_name.as_str() {
                DATA_FIELD => {
                    let raw = field.text().await?;
                    let parsed = serde_json::from_str::<T>(&raw).map_err(|err| {
                        ApiError::BadRequest(format!("Invalid `{DATA_FIELD}` part: {err}"))
                    })?;
                    data = Some(parsed);
                }
                FILES_FIELD | COVER_FIELD => {
                    let name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;
                    // Browsers send an empty part for an untouched file input.
                    if name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    let staged = StagedFile {
                        name,
                        content_type,
                        bytes: bytes.to_vec(),
                    };
                    if field_name == COVER_FIELD {
                        cover = Some(staged);
                    } else {
                        files.push(staged);
                    }
                }
                other => {
                    tracing::debug!(field = other, "ignoring unknown multipart field");
                }
            }
        }

        let data = data.ok_or_else(|| {
            ApiError::BadRequest(format!("Missing `{DATA_FIELD}` part in multipart form"))
        })?;
        Ok(Self { data, files, cover })
    }
}
