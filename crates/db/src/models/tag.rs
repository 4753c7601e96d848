use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use crate::entities::{note, tag, task};

#[derive(Debug, Error)]
pub enum TagError {
    #[error("Le nom du tag ne peut pas être vide.")]
    EmptyName,
    #[error("Le tag \"{0}\" existe déjà.")]
    Duplicate(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, TS)]
pub struct CreateTag {
    pub name: String,
}

impl Tag {
    fn from_model(model: tag::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            created_at: model.created_at.into(),
        }
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<Vec<Self>, DbErr> {
        let records = tag::Entity::find()
            .filter(tag::Column::UserId.eq(user_id))
            .order_by_asc(tag::Column::Name)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = tag::Entity::find()
            .filter(tag::Column::Uuid.eq(id))
            .filter(tag::Column::UserId.eq(user_id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    /// Rejects blank names and case-insensitive duplicates before inserting.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        data: &CreateTag,
    ) -> Result<Self, TagError> {
        let name = data.name.trim();
        if name.is_empty() {
            return Err(TagError::EmptyName);
        }

        let wanted = name.to_lowercase();
        let existing = Self::find_all(db, user_id).await?;
        if let Some(clash) = existing.iter().find(|t| t.name.to_lowercase() == wanted) {
            return Err(TagError::Duplicate(clash.name.clone()));
        }

        let active = tag::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    /// Deletes the tag and detaches it from the user's tasks and notes in one
    /// transaction.
    pub async fn delete(db: &DatabaseConnection, user_id: Uuid, id: Uuid) -> Result<u64, DbErr> {
        let txn = db.begin().await?;

        let Some(record) = tag::Entity::find()
            .filter(tag::Column::Uuid.eq(id))
            .filter(tag::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            return Ok(0);
        };

        task::Entity::update_many()
            .col_expr(task::Column::TagId, Expr::value(Option::<i64>::None))
            .filter(task::Column::UserId.eq(user_id))
            .filter(task::Column::TagId.eq(record.id))
            .exec(&txn)
            .await?;
        note::Entity::update_many()
            .col_expr(note::Column::TagId, Expr::value(Option::<i64>::None))
            .filter(note::Column::UserId.eq(user_id))
            .filter(note::Column::TagId.eq(record.id))
            .exec(&txn)
            .await?;

        let result = tag::Entity::delete_by_id(record.id).exec(&txn).await?;
        txn.commit().await?;
        Ok(result.rows_affected)
    }
}
