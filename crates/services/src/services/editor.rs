use std::sync::Arc;

use db::{
    DBService, DbErr,
    models::{
        note::{Note, NoteData},
        notification::NotificationType,
        project::{CreateProject, Project},
        task::{Task, TaskData},
    },
    types::{Attachment, MAX_ATTACHMENTS},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    config::EditorConfig,
    notification::{Actor, NotificationMetadata, NotificationService},
    storage::{ObjectStore, StagedFile, StorageError, UploadTarget, upload_staged},
};

pub const ALLOWED_ATTACHMENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

pub const ALLOWED_COVER_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Subject value that requires a free-text precision.
pub const OTHER_SUBJECT: &str = "Autre";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum EditorState {
    Loading,
    Ready,
    Saving,
    Success,
    Error,
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("{0}")]
    Validation(String),
    #[error("Vous ne pouvez pas attacher plus de {} fichiers.", MAX_ATTACHMENTS)]
    TooManyAttachments,
    #[error("Type de fichier non supporté: {}", .0.join(", "))]
    UnsupportedFileType(Vec<String>),
    #[error("Cannot go from {from:?} to {to:?}")]
    InvalidTransition { from: EditorState, to: EditorState },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EditorError {
    /// Raw message, except for storage configuration problems.
    pub fn user_message(&self) -> String {
        match self {
            EditorError::Storage(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

/// Lifecycle of one editor form.
#[derive(Debug, Clone)]
pub struct EditorSession {
    state: EditorState,
    last_error: Option<String>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    pub fn new() -> Self {
        Self {
            state: EditorState::Loading,
            last_error: None,
        }
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn transition(&mut self, to: EditorState) -> Result<(), EditorError> {
        use EditorState::*;
        let allowed = matches!(
            (self.state, to),
            (Loading, Ready) | (Ready, Saving) | (Saving, Success) | (Saving, Error) | (Error, Ready)
        );
        if !allowed {
            return Err(EditorError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    pub fn loaded(&mut self) -> Result<(), EditorError> {
        self.transition(EditorState::Ready)
    }

    /// Back to `Ready` after a failed save.
    pub fn retry(&mut self) -> Result<(), EditorError> {
        self.transition(EditorState::Ready)?;
        self.last_error = None;
        Ok(())
    }

    fn begin_save(&mut self) -> Result<(), EditorError> {
        self.transition(EditorState::Saving)
    }

    fn finish<T>(&mut self, result: Result<T, EditorError>) -> Result<T, EditorError> {
        match result {
            Ok(value) => {
                self.transition(EditorState::Success)?;
                Ok(value)
            }
            Err(err) => {
                self.last_error = Some(err.user_message());
                self.transition(EditorState::Error)?;
                Err(err)
            }
        }
    }
}

/// What the client shows after a successful save.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct SaveOutcome<T> {
    pub record: T,
    pub toast: String,
    pub redirect_after_ms: u64,
}

#[derive(Debug, Clone)]
pub struct TaskSubmission {
    /// `None` creates a new task.
    pub id: Option<Uuid>,
    pub data: TaskData,
    pub files: Vec<StagedFile>,
}

#[derive(Debug, Clone)]
pub struct NoteSubmission {
    pub id: Option<Uuid>,
    pub data: NoteData,
    pub cover: Option<StagedFile>,
    pub files: Vec<StagedFile>,
}

#[derive(Debug, Clone)]
pub struct ProjectSubmission {
    pub title: String,
    pub description: String,
    pub subject: String,
    pub other_subject: Option<String>,
    pub files: Vec<StagedFile>,
}

impl ProjectSubmission {
    fn final_subject(&self) -> Result<String, EditorError> {
        if self.title.trim().is_empty()
            || self.description.trim().is_empty()
            || self.subject.trim().is_empty()
        {
            return Err(EditorError::Validation(
                "Le titre, la description et l'objet sont obligatoires.".to_string(),
            ));
        }
        if self.subject == OTHER_SUBJECT {
            return match self.other_subject.as_deref().map(str::trim) {
                Some(other) if !other.is_empty() => Ok(other.to_string()),
                _ => Err(EditorError::Validation(
                    "Veuillez préciser l'objet.".to_string(),
                )),
            };
        }
        Ok(self.subject.clone())
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Cap and MIME checks, run before anything is uploaded.
pub fn check_attachments(
    existing: &[Attachment],
    files: &[StagedFile],
) -> Result<(), EditorError> {
    if existing.len() + files.len() > MAX_ATTACHMENTS {
        return Err(EditorError::TooManyAttachments);
    }
    let rejected: Vec<String> = files
        .iter()
        .filter(|file| !ALLOWED_ATTACHMENT_TYPES.contains(&file.content_type.as_str()))
        .map(|file| file.name.clone())
        .collect();
    if !rejected.is_empty() {
        return Err(EditorError::UnsupportedFileType(rejected));
    }
    Ok(())
}

#[derive(Clone)]
pub struct EditorService {
    db: DBService,
    store: Arc<dyn ObjectStore>,
    notifications: NotificationService,
    delays: EditorConfig,
}

impl EditorService {
    pub fn new(
        db: DBService,
        store: Arc<dyn ObjectStore>,
        notifications: NotificationService,
        delays: EditorConfig,
    ) -> Self {
        Self {
            db,
            store,
            notifications,
            delays,
        }
    }

    /// Uploads one file at a time, in order.
    async fn upload_all(
        &self,
        target: UploadTarget,
        files: &[StagedFile],
    ) -> Result<Vec<Attachment>, EditorError> {
        let mut uploaded = Vec::with_capacity(files.len());
        for file in files {
            let url = upload_staged(self.store.as_ref(), target, file).await?;
            uploaded.push(Attachment {
                name: file.name.clone(),
                url,
                content_type: file.content_type.clone(),
            });
        }
        Ok(uploaded)
    }

    pub async fn save_task(
        &self,
        actor: &Actor,
        session: &mut EditorSession,
        submission: TaskSubmission,
    ) -> Result<SaveOutcome<Task>, EditorError> {
        session.begin_save()?;
        let result = self.save_task_inner(actor, submission).await;
        session.finish(result)
    }

    async fn save_task_inner(
        &self,
        actor: &Actor,
        submission: TaskSubmission,
    ) -> Result<SaveOutcome<Task>, EditorError> {
        let TaskSubmission { id, mut data, files } = submission;
        if blank(&data.title) {
            return Err(EditorError::Validation("Le titre est obligatoire.".to_string()));
        }
        check_attachments(&data.attachments, &files)?;

        let uploaded = self.upload_all(UploadTarget::TaskAttachment, &files).await?;
        data.attachments.extend(uploaded);

        let pool = &self.db.pool;
        let (task, event, toast) = match id {
            Some(id) => (
                Task::update(pool, actor.user_id, id, &data).await?,
                NotificationType::TaskModified,
                "Tâche mise à jour avec succès.",
            ),
            None => (
                Task::create(pool, actor.user_id, Some(actor.display_name()), &data).await?,
                NotificationType::TaskCreated,
                "Tâche créée avec succès.",
            ),
        };

        self.notifications
            .create_notification(actor, event, NotificationMetadata::titled(&task.title))
            .await;

        Ok(SaveOutcome {
            record: task,
            toast: toast.to_string(),
            redirect_after_ms: self.delays.task_redirect_delay_ms,
        })
    }

    pub async fn save_note(
        &self,
        actor: &Actor,
        session: &mut EditorSession,
        submission: NoteSubmission,
    ) -> Result<SaveOutcome<Note>, EditorError> {
        session.begin_save()?;
        let result = self.save_note_inner(actor, submission).await;
        session.finish(result)
    }

    async fn save_note_inner(
        &self,
        actor: &Actor,
        submission: NoteSubmission,
    ) -> Result<SaveOutcome<Note>, EditorError> {
        let NoteSubmission {
            id,
            mut data,
            cover,
            files,
        } = submission;
        if blank(&data.title) || blank(&data.description) || blank(&data.content) {
            return Err(EditorError::Validation(
                "Titre, Description et Contenu complet sont obligatoires.".to_string(),
            ));
        }
        check_attachments(&data.attachments, &files)?;
        if let Some(cover) = &cover
            && !ALLOWED_COVER_TYPES.contains(&cover.content_type.as_str())
        {
            return Err(EditorError::UnsupportedFileType(vec![cover.name.clone()]));
        }

        if let Some(cover) = &cover {
            let url = upload_staged(self.store.as_ref(), UploadTarget::NoteCover, cover).await?;
            data.cover_url = Some(url);
        }
        let uploaded = self.upload_all(UploadTarget::NoteAttachment, &files).await?;
        data.attachments.extend(uploaded);

        let pool = &self.db.pool;
        let (note, event) = match id {
            Some(id) => (
                Note::update(pool, actor.user_id, id, &data).await?,
                NotificationType::NoteModified,
            ),
            None => (
                Note::create(pool, actor.user_id, Some(actor.display_name()), &data).await?,
                NotificationType::NoteCreated,
            ),
        };

        self.notifications
            .create_notification(actor, event, NotificationMetadata::titled(&note.title))
            .await;

        Ok(SaveOutcome {
            record: note,
            toast: "Les modifications ont été enregistrées avec succès.".to_string(),
            redirect_after_ms: self.delays.note_redirect_delay_ms,
        })
    }

    pub async fn submit_project(
        &self,
        actor: &Actor,
        session: &mut EditorSession,
        submission: ProjectSubmission,
    ) -> Result<SaveOutcome<Project>, EditorError> {
        session.begin_save()?;
        let result = self.submit_project_inner(actor, submission).await;
        session.finish(result)
    }

    async fn submit_project_inner(
        &self,
        actor: &Actor,
        submission: ProjectSubmission,
    ) -> Result<SaveOutcome<Project>, EditorError> {
        let subject = submission.final_subject()?;
        check_attachments(&[], &submission.files)?;

        let attachments = self
            .upload_all(
                UploadTarget::ProjectAttachment {
                    user_id: actor.user_id,
                },
                &submission.files,
            )
            .await?;

        let data = CreateProject {
            title: submission.title.clone(),
            description: format!("Objet: {subject}\n\n{}", submission.description),
            attachments,
        };
        let project =
            Project::create(&self.db.pool, actor.user_id, Some(actor.display_name()), &data).await?;

        self.notifications
            .create_notification(
                actor,
                NotificationType::ProjectSubmitted,
                NotificationMetadata::titled(&project.title),
            )
            .await;

        Ok(SaveOutcome {
            record: project,
            toast: "Projet soumis avec succès !".to_string(),
            redirect_after_ms: self.delays.project_redirect_delay_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use db::models::notification::Notification;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::services::{
        geolocation::{GeolocationError, IpInfo, IpLookup},
        storage::{Bucket, LocalObjectStore},
    };

    struct NoLookup;

    #[async_trait]
    impl IpLookup for NoLookup {
        async fn lookup(&self, _ip: Option<&str>) -> Result<IpInfo, GeolocationError> {
            Ok(IpInfo::unavailable())
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        db: DBService,
        store: Arc<LocalObjectStore>,
        service: EditorService,
    }

    async fn fixture() -> Fixture {
        let pool = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&pool, None).await.unwrap();
        let db = DBService { pool };
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalObjectStore::new(dir.path(), "/storage"));
        let notifications = NotificationService::new(db.clone(), Arc::new(NoLookup), false);
        let service = EditorService::new(
            db.clone(),
            store.clone(),
            notifications,
            EditorConfig::default(),
        );
        Fixture {
            _dir: dir,
            db,
            store,
            service,
        }
    }

    fn actor() -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            full_name: Some("Marie Curie".to_string()),
            email: None,
        }
    }

    fn ready() -> EditorSession {
        let mut session = EditorSession::new();
        session.loaded().unwrap();
        session
    }

    fn pdf(name: &str) -> StagedFile {
        StagedFile {
            name: name.to_string(),
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF".to_vec(),
        }
    }

    #[tokio::test]
    async fn minimal_task_creates_reference_and_one_notification() {
        let fx = fixture().await;
        let actor = actor();
        let mut session = ready();

        let outcome = fx
            .service
            .save_task(
                &actor,
                &mut session,
                TaskSubmission {
                    id: None,
                    data: TaskData::titled("Test"),
                    files: vec![],
                },
            )
            .await
            .unwrap();

        assert_eq!(session.state(), EditorState::Success);
        assert_eq!(outcome.toast, "Tâche créée avec succès.");
        assert_eq!(outcome.redirect_after_ms, 2000);
        let reference = &outcome.record.reference;
        assert!(reference.starts_with("TASK-") && reference.len() == "TASK-20250101-001".len());

        let notifications = Notification::find_recent(&fx.db.pool, actor.user_id, 30)
            .await
            .unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].notification_type, NotificationType::TaskCreated);
        assert!(notifications[0].message.contains("Test"));
    }

    #[tokio::test]
    async fn validation_failure_moves_session_to_error() {
        let fx = fixture().await;
        let mut session = ready();

        let err = fx
            .service
            .save_task(
                &actor(),
                &mut session,
                TaskSubmission {
                    id: None,
                    data: TaskData::titled("   "),
                    files: vec![],
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Le titre est obligatoire.");
        assert_eq!(session.state(), EditorState::Error);
        assert_eq!(session.last_error(), Some("Le titre est obligatoire."));
        session.retry().unwrap();
        assert_eq!(session.state(), EditorState::Ready);
    }

    #[tokio::test]
    async fn attachment_cap_is_checked_before_upload() {
        let fx = fixture().await;
        fx.store.ensure_buckets().await.unwrap();
        let files: Vec<_> = (0..6).map(|i| pdf(&format!("f{i}.pdf"))).collect();

        let err = fx
            .service
            .save_task(
                &actor(),
                &mut ready(),
                TaskSubmission {
                    id: None,
                    data: TaskData::titled("Trop"),
                    files,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EditorError::TooManyAttachments));
        let uploaded = std::fs::read_dir(fx.store.root().join("tasks_files"))
            .unwrap()
            .count();
        assert_eq!(uploaded, 0);
    }

    #[test]
    fn unsupported_types_are_reported_by_name() {
        let mut exe = pdf("setup.exe");
        exe.content_type = "application/x-msdownload".to_string();
        let err = check_attachments(&[], &[pdf("ok.pdf"), exe]).unwrap_err();
        assert_eq!(err.to_string(), "Type de fichier non supporté: setup.exe");
    }

    #[tokio::test]
    async fn missing_bucket_is_rewritten() {
        let fx = fixture().await;
        let err = fx
            .service
            .save_task(
                &actor(),
                &mut ready(),
                TaskSubmission {
                    id: None,
                    data: TaskData::titled("Avec pièce jointe"),
                    files: vec![pdf("devis.pdf")],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EditorError::Storage(StorageError::BucketNotFound(Bucket::TasksFiles))
        ));
        assert!(err.user_message().starts_with("Erreur de configuration"));
    }

    #[tokio::test]
    async fn project_submission_prefixes_subject_and_uploads_per_user() {
        let fx = fixture().await;
        fx.store.ensure_buckets().await.unwrap();
        let actor = actor();

        let outcome = fx
            .service
            .submit_project(
                &actor,
                &mut ready(),
                ProjectSubmission {
                    title: "Site vitrine".to_string(),
                    description: "Refonte complète".to_string(),
                    subject: OTHER_SUBJECT.to_string(),
                    other_subject: Some("Audit SEO".to_string()),
                    files: vec![pdf("brief.pdf")],
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.toast, "Projet soumis avec succès !");
        assert_eq!(outcome.record.description, "Objet: Audit SEO\n\nRefonte complète");
        assert_eq!(outcome.record.attachments.len(), 1);
        assert!(outcome.record.attachments[0]
            .url
            .starts_with(&format!("/storage/projects_files/{}/", actor.user_id)));
    }

    #[tokio::test]
    async fn project_other_subject_requires_precision() {
        let fx = fixture().await;
        let err = fx
            .service
            .submit_project(
                &actor(),
                &mut ready(),
                ProjectSubmission {
                    title: "T".to_string(),
                    description: "D".to_string(),
                    subject: OTHER_SUBJECT.to_string(),
                    other_subject: None,
                    files: vec![],
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Veuillez préciser l'objet.");
    }

    #[tokio::test]
    async fn note_update_keeps_reference_and_uses_note_delay() {
        let fx = fixture().await;
        let actor = actor();

        let created = fx
            .service
            .save_note(
                &actor,
                &mut ready(),
                NoteSubmission {
                    id: None,
                    data: NoteData::new("Idée", "Résumé", "<p>Contenu</p>"),
                    cover: None,
                    files: vec![],
                },
            )
            .await
            .unwrap();
        assert_eq!(created.redirect_after_ms, 3000);

        let updated = fx
            .service
            .save_note(
                &actor,
                &mut ready(),
                NoteSubmission {
                    id: Some(created.record.id),
                    data: NoteData::new("Idée v2", "Résumé", "<p>Contenu</p>"),
                    cover: None,
                    files: vec![],
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.record.reference, created.record.reference);
        assert_eq!(updated.record.title, "Idée v2");

        let types: Vec<_> = Notification::find_recent(&fx.db.pool, actor.user_id, 30)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.notification_type)
            .collect();
        assert_eq!(
            types,
            vec![NotificationType::NoteModified, NotificationType::NoteCreated]
        );
    }
}
