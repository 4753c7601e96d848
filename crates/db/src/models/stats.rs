use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::entities::{note, project, task};

/// Counters shown on the dashboard home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct DashboardStats {
    pub tasks: u64,
    pub notes: u64,
    pub projects: u64,
}

impl DashboardStats {
    pub async fn for_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<Self, DbErr> {
        let tasks = task::Entity::find()
            .filter(task::Column::UserId.eq(user_id))
            .count(db)
            .await?;
        let notes = note::Entity::find()
            .filter(note::Column::UserId.eq(user_id))
            .count(db)
            .await?;
        let projects = project::Entity::find()
            .filter(project::Column::UserId.eq(user_id))
            .count(db)
            .await?;
        Ok(Self {
            tasks,
            notes,
            projects,
        })
    }
}
