use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum TaskStatus {
    #[default]
    #[sea_orm(string_value = "En cours")]
    #[serde(rename = "En cours")]
    #[strum(serialize = "En cours")]
    InProgress,
    #[sea_orm(string_value = "Terminé")]
    #[serde(rename = "Terminé")]
    #[strum(serialize = "Terminé")]
    Done,
    #[sea_orm(string_value = "En attente")]
    #[serde(rename = "En attente")]
    #[strum(serialize = "En attente")]
    Pending,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum TaskPriority {
    #[sea_orm(string_value = "Haute")]
    #[serde(rename = "Haute")]
    #[strum(serialize = "Haute")]
    High,
    #[default]
    #[sea_orm(string_value = "Moyenne")]
    #[serde(rename = "Moyenne")]
    #[strum(serialize = "Moyenne")]
    Medium,
    #[sea_orm(string_value = "Basse")]
    #[serde(rename = "Basse")]
    #[strum(serialize = "Basse")]
    Low,
}

/// Review state of a submitted project. Only set on submission here; later
/// transitions belong to whoever reviews the project.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ProjectStatus {
    #[default]
    #[sea_orm(string_value = "En attente")]
    #[serde(rename = "En attente")]
    #[strum(serialize = "En attente")]
    Pending,
    #[sea_orm(string_value = "En cours")]
    #[serde(rename = "En cours")]
    #[strum(serialize = "En cours")]
    InProgress,
    #[sea_orm(string_value = "Répondu")]
    #[serde(rename = "Répondu")]
    #[strum(serialize = "Répondu")]
    Answered,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    #[sea_orm(string_value = "NOTE_CREATED")]
    NoteCreated,
    #[sea_orm(string_value = "NOTE_MODIFIED")]
    NoteModified,
    #[sea_orm(string_value = "NOTE_DELETED")]
    NoteDeleted,
    #[sea_orm(string_value = "TASK_CREATED")]
    TaskCreated,
    #[sea_orm(string_value = "TASK_MODIFIED")]
    TaskModified,
    #[sea_orm(string_value = "TASK_DELETED")]
    TaskDeleted,
    #[sea_orm(string_value = "PROJECT_SUBMITTED")]
    ProjectSubmitted,
    #[sea_orm(string_value = "PROJECT_STATUS_UPDATED")]
    ProjectStatusUpdated,
    #[sea_orm(string_value = "USER_SIGNUP")]
    UserSignup,
    #[sea_orm(string_value = "USER_LOGIN")]
    UserLogin,
    #[sea_orm(string_value = "PASSWORD_RESET")]
    PasswordReset,
}

impl NotificationType {
    /// Events reported by the auth gateway rather than by a resource write.
    pub fn is_auth_event(self) -> bool {
        matches!(
            self,
            NotificationType::UserSignup
                | NotificationType::UserLogin
                | NotificationType::PasswordReset
        )
    }
}

/// Uploaded file attached to a task, note or project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Attachment {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub content_type: String,
}

pub const MAX_ATTACHMENTS: usize = 5;
