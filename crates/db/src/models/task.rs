use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

pub use crate::types::{TaskPriority, TaskStatus};
use crate::{
    entities::{tag, task},
    models::{
        common::{TagRef, attachments_from_json, attachments_to_json, search_term, tag_row_id},
        reference::{ReferenceKind, next_reference},
    },
    types::Attachment,
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub reference: String,
    pub title: String,
    pub description: Option<String>,
    pub tag: Option<TagRef>,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub attachments: Vec<Attachment>,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable fields, sent whole by the editor on create and on update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct TaskData {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tag_id: Option<Uuid>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl TaskData {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct TaskFilter {
    /// Matches title or reference, case-insensitively.
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
}

impl Task {
    fn from_model(model: task::Model, tag: Option<tag::Model>) -> Self {
        Self {
            id: model.uuid,
            reference: model.reference,
            title: model.title,
            description: model.description,
            tag: tag.map(TagRef::from),
            due_date: model.due_date,
            status: model.status,
            priority: model.priority,
            attachments: attachments_from_json(model.attachments),
            author: model.author,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn find_filtered<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, DbErr> {
        let mut query = task::Entity::find()
            .find_also_related(tag::Entity)
            .filter(task::Column::UserId.eq(user_id));

        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(
                Condition::any()
                    .add(task::Column::Title.contains(&term))
                    .add(task::Column::Reference.contains(&term)),
            );
        }
        if let Some(status) = filter.status {
            query = query.filter(task::Column::Status.eq(status));
        }

        let rows = query
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .all(db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(model, tag)| Self::from_model(model, tag))
            .collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let row = task::Entity::find()
            .find_also_related(tag::Entity)
            .filter(task::Column::Uuid.eq(id))
            .filter(task::Column::UserId.eq(user_id))
            .one(db)
            .await?;
        Ok(row.map(|(model, tag)| Self::from_model(model, tag)))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        author: Option<String>,
        data: &TaskData,
    ) -> Result<Self, DbErr> {
        Self::create_on(db, user_id, author, data, Utc::now().date_naive()).await
    }

    /// Like [`Task::create`] with an explicit reference date.
    pub async fn create_on<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        author: Option<String>,
        data: &TaskData,
        date: NaiveDate,
    ) -> Result<Self, DbErr> {
        let tag_id = tag_row_id(db, user_id, data.tag_id).await?;
        let reference = next_reference(db, ReferenceKind::Task, user_id, date).await?;

        let now = Utc::now();
        let active = task::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            reference: Set(reference),
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            tag_id: Set(tag_id),
            due_date: Set(data.due_date),
            status: Set(data.status),
            priority: Set(data.priority),
            attachments: Set(attachments_to_json(&data.attachments)?),
            author: Set(author),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        Self::find_by_id(db, user_id, model.uuid)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))
    }

    /// Reference, author and creation time never change.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
        data: &TaskData,
    ) -> Result<Self, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .filter(task::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;
        let tag_id = tag_row_id(db, user_id, data.tag_id).await?;

        let mut active: task::ActiveModel = record.into();
        active.title = Set(data.title.clone());
        active.description = Set(data.description.clone());
        active.tag_id = Set(tag_id);
        active.due_date = Set(data.due_date);
        active.status = Set(data.status);
        active.priority = Set(data.priority);
        active.attachments = Set(attachments_to_json(&data.attachments)?);
        active.updated_at = Set(Utc::now().into());
        active.update(db).await?;

        Self::find_by_id(db, user_id, id)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, user_id: Uuid, id: Uuid) -> Result<u64, DbErr> {
        let result = task::Entity::delete_many()
            .filter(task::Column::Uuid.eq(id))
            .filter(task::Column::UserId.eq(user_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete_many<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        ids: &[Uuid],
    ) -> Result<u64, DbErr> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = task::Entity::delete_many()
            .filter(task::Column::Uuid.is_in(ids.iter().copied()))
            .filter(task::Column::UserId.eq(user_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db::setup_db;

    #[tokio::test]
    async fn title_only_task_gets_defaults_and_reference() {
        let db = setup_db().await;
        let user = Uuid::new_v4();

        let task = Task::create(&db, user, Some("Ada".to_string()), &TaskData::titled("Test"))
            .await
            .unwrap();

        let (prefix, rest) = task.reference.split_at(5);
        assert_eq!(prefix, "TASK-");
        let (date, seq) = rest.split_once('-').unwrap();
        assert!(date.len() == 8 && date.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(seq, "001");
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(task.attachments.is_empty());
        assert_eq!(task.author.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn filters_by_search_and_status_newest_first() {
        let db = setup_db().await;
        let user = Uuid::new_v4();

        let first = Task::create(&db, user, None, &TaskData::titled("Facture client"))
            .await
            .unwrap();
        let mut done = TaskData::titled("Devis");
        done.status = TaskStatus::Done;
        let second = Task::create(&db, user, None, &done).await.unwrap();
        Task::create(&db, Uuid::new_v4(), None, &TaskData::titled("facture"))
            .await
            .unwrap();

        let all = Task::find_filtered(&db, user, &TaskFilter::default()).await.unwrap();
        assert_eq!(
            all.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );

        let by_title = TaskFilter {
            search: Some("FACTURE".to_string()),
            status: None,
        };
        let found = Task::find_filtered(&db, user, &by_title).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, first.id);

        let by_reference = TaskFilter {
            search: Some(second.reference.clone()),
            status: None,
        };
        assert_eq!(Task::find_filtered(&db, user, &by_reference).await.unwrap().len(), 1);

        let by_status = TaskFilter {
            search: None,
            status: Some(TaskStatus::Done),
        };
        let found = Task::find_filtered(&db, user, &by_status).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, second.id);
    }

    #[tokio::test]
    async fn update_keeps_reference_and_replaces_fields() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        let task = Task::create(&db, user, None, &TaskData::titled("Avant")).await.unwrap();

        let mut data = TaskData::titled("Après");
        data.priority = TaskPriority::High;
        data.due_date = NaiveDate::from_ymd_opt(2025, 12, 31);
        data.attachments = vec![Attachment {
            name: "a.pdf".to_string(),
            url: "/storage/tasks_files/attachments/1_a.pdf".to_string(),
            content_type: "application/pdf".to_string(),
        }];
        let updated = Task::update(&db, user, task.id, &data).await.unwrap();

        assert_eq!(updated.reference, task.reference);
        assert_eq!(updated.title, "Après");
        assert_eq!(updated.priority, TaskPriority::High);
        assert_eq!(updated.due_date, data.due_date);
        assert_eq!(updated.attachments, data.attachments);

        let foreign = Task::update(&db, Uuid::new_v4(), task.id, &data).await;
        assert!(matches!(foreign, Err(DbErr::RecordNotFound(_))));
    }

    #[tokio::test]
    async fn deletes_are_scoped_to_owner() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        let a = Task::create(&db, user, None, &TaskData::titled("a")).await.unwrap();
        let b = Task::create(&db, user, None, &TaskData::titled("b")).await.unwrap();
        let c = Task::create(&db, user, None, &TaskData::titled("c")).await.unwrap();

        assert_eq!(Task::delete(&db, Uuid::new_v4(), a.id).await.unwrap(), 0);
        assert_eq!(Task::delete(&db, user, a.id).await.unwrap(), 1);
        assert_eq!(Task::delete_many(&db, user, &[b.id, c.id]).await.unwrap(), 2);
        assert!(
            Task::find_filtered(&db, user, &TaskFilter::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn rejects_tags_of_other_users() {
        let db = setup_db().await;
        let owner = Uuid::new_v4();
        let tag = crate::models::tag::Tag::create(
            &db,
            owner,
            &crate::models::tag::CreateTag {
                name: "Client".to_string(),
            },
        )
        .await
        .unwrap();

        let mut data = TaskData::titled("x");
        data.tag_id = Some(tag.id);
        let err = Task::create(&db, Uuid::new_v4(), None, &data).await.unwrap_err();
        assert!(matches!(err, DbErr::RecordNotFound(_)));
    }
}
