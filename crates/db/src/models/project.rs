use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

pub use crate::types::ProjectStatus;
use crate::{
    entities::project,
    models::common::{attachments_from_json, attachments_to_json, search_term},
    types::Attachment,
};

/// A project request submitted for review. The owner submits, views and
/// deletes; the status is only written at submission.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: ProjectStatus,
    pub attachments: Vec<Attachment>,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateProject {
    pub title: String,
    /// Already prefixed with the subject line.
    pub description: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct ProjectFilter {
    pub search: Option<String>,
    pub status: Option<ProjectStatus>,
}

impl Project {
    fn from_model(model: project::Model) -> Self {
        Self {
            id: model.uuid,
            title: model.title,
            description: model.description,
            status: model.status,
            attachments: attachments_from_json(model.attachments),
            author: model.author,
            created_at: model.created_at.into(),
        }
    }

    pub async fn find_filtered<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        filter: &ProjectFilter,
    ) -> Result<Vec<Self>, DbErr> {
        let mut query = project::Entity::find().filter(project::Column::UserId.eq(user_id));
        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(project::Column::Title.contains(&term));
        }
        if let Some(status) = filter.status {
            query = query.filter(project::Column::Status.eq(status));
        }

        let records = query
            .order_by_desc(project::Column::CreatedAt)
            .order_by_desc(project::Column::Id)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = project::Entity::find()
            .filter(project::Column::Uuid.eq(id))
            .filter(project::Column::UserId.eq(user_id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        author: Option<String>,
        data: &CreateProject,
    ) -> Result<Self, DbErr> {
        let active = project::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            status: Set(ProjectStatus::Pending),
            attachments: Set(attachments_to_json(&data.attachments)?),
            author: Set(author),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, user_id: Uuid, id: Uuid) -> Result<u64, DbErr> {
        let result = project::Entity::delete_many()
            .filter(project::Column::Uuid.eq(id))
            .filter(project::Column::UserId.eq(user_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db::setup_db;

    fn submission(title: &str) -> CreateProject {
        CreateProject {
            title: title.to_string(),
            description: "Objet: Site vitrine\n\nRefonte".to_string(),
            attachments: Vec::new(),
        }
    }

    #[tokio::test]
    async fn submissions_start_pending() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        let project = Project::create(&db, user, None, &submission("Refonte")).await.unwrap();
        assert_eq!(project.status, ProjectStatus::Pending);
        assert!(project.description.starts_with("Objet: Site vitrine\n\n"));
    }

    #[tokio::test]
    async fn filters_by_title_and_status() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        Project::create(&db, user, None, &submission("Refonte site")).await.unwrap();
        Project::create(&db, user, None, &submission("Application")).await.unwrap();

        let by_title = ProjectFilter {
            search: Some("site".to_string()),
            status: None,
        };
        assert_eq!(Project::find_filtered(&db, user, &by_title).await.unwrap().len(), 1);

        let answered = ProjectFilter {
            search: None,
            status: Some(ProjectStatus::Answered),
        };
        assert!(Project::find_filtered(&db, user, &answered).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn owner_can_delete() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        let project = Project::create(&db, user, None, &submission("x")).await.unwrap();
        assert_eq!(Project::delete(&db, Uuid::new_v4(), project.id).await.unwrap(), 0);
        assert_eq!(Project::delete(&db, user, project.id).await.unwrap(), 1);
        assert!(Project::find_by_id(&db, user, project.id).await.unwrap().is_none());
    }
}
