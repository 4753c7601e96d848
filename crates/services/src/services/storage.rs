use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Display, EnumString,
    AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Bucket {
    Avatars,
    NotesFiles,
    TasksFiles,
    ProjectsFiles,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Bucket not found: {0}")]
    BucketNotFound(Bucket),
    #[error("Invalid object path: {0}")]
    InvalidPath(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Message shown to the user. A missing bucket is a deployment problem,
    /// so it is reported as such.
    pub fn user_message(&self) -> String {
        match self {
            StorageError::BucketNotFound(bucket) => format!(
                "Erreur de configuration : Le 'bucket' de stockage '{bucket}' est manquant. Veuillez le créer sur le serveur de stockage."
            ),
            other => other.to_string(),
        }
    }
}

/// Where an uploaded file ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    TaskAttachment,
    NoteCover,
    NoteAttachment,
    ProjectAttachment { user_id: Uuid },
}

impl UploadTarget {
    pub fn bucket(&self) -> Bucket {
        match self {
            UploadTarget::TaskAttachment => Bucket::TasksFiles,
            UploadTarget::NoteCover | UploadTarget::NoteAttachment => Bucket::NotesFiles,
            UploadTarget::ProjectAttachment { .. } => Bucket::ProjectsFiles,
        }
    }

    fn folder(&self) -> String {
        match self {
            UploadTarget::TaskAttachment | UploadTarget::NoteAttachment => {
                "attachments".to_string()
            }
            UploadTarget::NoteCover => "covers".to_string(),
            UploadTarget::ProjectAttachment { user_id } => user_id.to_string(),
        }
    }

    /// `<folder>/<millis>_<sanitized name>`
    pub fn object_path(&self, file_name: &str, timestamp_millis: i64) -> String {
        format!(
            "{}/{}_{}",
            self.folder(),
            timestamp_millis,
            sanitize_file_name(file_name)
        )
    }
}

/// Whitespace runs become `_`, then anything outside `[a-zA-Z0-9._-]` is dropped.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
        }
    }
    out
}

/// A file received from the client, not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, bucket: Bucket, path: &str, bytes: &[u8]) -> Result<(), StorageError>;

    fn public_url(&self, bucket: Bucket, path: &str) -> String;
}

/// Buckets as directories under a root, served back under `public_base_url`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn create_bucket(&self, bucket: Bucket) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(self.root.join(bucket.as_ref())).await?;
        Ok(())
    }

    pub async fn ensure_buckets(&self) -> Result<(), StorageError> {
        use strum::IntoEnumIterator;
        for bucket in Bucket::iter() {
            self.create_bucket(bucket).await?;
        }
        Ok(())
    }

    fn object_file(&self, bucket: Bucket, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(bucket.as_ref()).join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(&self, bucket: Bucket, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let bucket_dir = self.root.join(bucket.as_ref());
        if !tokio::fs::try_exists(&bucket_dir).await.unwrap_or(false) {
            return Err(StorageError::BucketNotFound(bucket));
        }

        let file = self.object_file(bucket, path)?;
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&file, bytes).await?;
        tracing::debug!(bucket = %bucket, path, size = bytes.len(), "stored object");
        Ok(())
    }

    fn public_url(&self, bucket: Bucket, path: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, bucket, path)
    }
}

/// Uploads one staged file and returns its public URL.
pub async fn upload_staged(
    store: &dyn ObjectStore,
    target: UploadTarget,
    file: &StagedFile,
) -> Result<String, StorageError> {
    let bucket = target.bucket();
    let path = target.object_path(&file.name, Utc::now().timestamp_millis());
    store.upload(bucket, &path, &file.bytes).await?;
    Ok(store.public_url(bucket, &path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_names_like_the_upload_form() {
        assert_eq!(sanitize_file_name("Mon devis  final (v2).pdf"), "Mon_devis_final_v2.pdf");
        assert_eq!(sanitize_file_name("été 2024.png"), "t_2024.png");
    }

    #[test]
    fn object_paths_follow_target_layout() {
        let user_id = Uuid::nil();
        assert_eq!(
            UploadTarget::TaskAttachment.object_path("a b.pdf", 42),
            "attachments/42_a_b.pdf"
        );
        assert_eq!(UploadTarget::NoteCover.object_path("c.png", 1), "covers/1_c.png");
        assert_eq!(
            UploadTarget::ProjectAttachment { user_id }.object_path("brief.docx", 7),
            format!("{user_id}/7_brief.docx")
        );
        assert_eq!(UploadTarget::NoteAttachment.bucket(), Bucket::NotesFiles);
    }

    #[tokio::test]
    async fn upload_requires_existing_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "/storage/");

        let err = store
            .upload(Bucket::TasksFiles, "attachments/x.pdf", b"pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::BucketNotFound(Bucket::TasksFiles)));
        assert!(err.user_message().contains("'tasks_files' est manquant"));

        store.ensure_buckets().await.unwrap();
        store
            .upload(Bucket::TasksFiles, "attachments/x.pdf", b"pdf")
            .await
            .unwrap();
        let written = std::fs::read(dir.path().join("tasks_files/attachments/x.pdf")).unwrap();
        assert_eq!(written, b"pdf");
        assert_eq!(
            store.public_url(Bucket::TasksFiles, "attachments/x.pdf"),
            "/storage/tasks_files/attachments/x.pdf"
        );
    }

    #[tokio::test]
    async fn rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "/storage");
        store.ensure_buckets().await.unwrap();

        let err = store
            .upload(Bucket::Avatars, "../outside.txt", b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
    }
}
