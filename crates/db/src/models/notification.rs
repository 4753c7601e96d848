use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

pub use crate::types::NotificationType;
use crate::{
    entities::notification,
    events::{
        ENTITY_NOTIFICATION, EVENT_NOTIFICATION_CREATED, EVENT_NOTIFICATIONS_CLEARED,
        NotificationEventPayload, NotificationsClearedPayload,
    },
    models::event_outbox::EventOutbox,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub icon: String,
    pub color: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A rendered notification, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateNotification {
    pub notification_type: NotificationType,
    pub message: String,
    pub icon: String,
    pub color: String,
}

impl Notification {
    fn from_model(model: notification::Model) -> Self {
        Self {
            id: model.uuid,
            user_id: model.user_id,
            notification_type: model.notification_type,
            message: model.message,
            icon: model.icon,
            color: model.color,
            is_read: model.is_read,
            created_at: model.created_at.into(),
        }
    }

    /// Inserts the notification and queues its realtime event.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        data: &CreateNotification,
    ) -> Result<Self, DbErr> {
        let notification_id = Uuid::new_v4();
        let active = notification::ActiveModel {
            uuid: Set(notification_id),
            user_id: Set(user_id),
            notification_type: Set(data.notification_type),
            message: Set(data.message.clone()),
            icon: Set(data.icon.clone()),
            color: Set(data.color.clone()),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;

        EventOutbox::enqueue(
            db,
            EVENT_NOTIFICATION_CREATED,
            ENTITY_NOTIFICATION,
            notification_id,
            &NotificationEventPayload {
                notification_id,
                user_id,
            },
        )
        .await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_recent<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        limit: u64,
    ) -> Result<Vec<Self>, DbErr> {
        let records = notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .limit(limit)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = notification::Entity::find()
            .filter(notification::Column::Uuid.eq(id))
            .filter(notification::Column::UserId.eq(user_id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn count_unread<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, DbErr> {
        notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(db)
            .await
    }

    pub async fn mark_read<C: ConnectionTrait>(db: &C, user_id: Uuid, id: Uuid) -> Result<u64, DbErr> {
        let result = notification::Entity::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::Uuid.eq(id))
            .filter(notification::Column::UserId.eq(user_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn mark_all_read<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, DbErr> {
        let result = notification::Entity::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete_all<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, DbErr> {
        let result = notification::Entity::delete_many()
            .filter(notification::Column::UserId.eq(user_id))
            .exec(db)
            .await?;
        if result.rows_affected > 0 {
            EventOutbox::enqueue(
                db,
                EVENT_NOTIFICATIONS_CLEARED,
                ENTITY_NOTIFICATION,
                user_id,
                &NotificationsClearedPayload { user_id },
            )
            .await?;
        }
        Ok(result.rows_affected)
    }
}
