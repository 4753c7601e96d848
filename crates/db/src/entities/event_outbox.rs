use sea_orm::entity::prelude::*;
use sea_orm::JsonValue;

/// Pending realtime announcement, written on the same connection right after
/// the notification change it describes.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "event_outbox")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
    /// `notification.created` or `notifications.cleared`.
    pub event_type: String,
    pub entity_type: String,
    pub entity_uuid: Uuid,
    pub payload: JsonValue,
    pub created_at: DateTimeUtc,
    /// Set once dispatched, or once parked after a failed dispatch.
    pub published_at: Option<DateTimeUtc>,
    pub attempts: i32,
    pub last_error: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
