use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JsonValue, QueryFilter, QuerySelect};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{entities::tag, types::Attachment};

/// Tag as exposed on tasks and notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct TagRef {
    pub id: Uuid,
    pub name: String,
}

impl From<tag::Model> for TagRef {
    fn from(model: tag::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
        }
    }
}

pub(crate) fn attachments_from_json(value: JsonValue) -> Vec<Attachment> {
    match serde_json::from_value(value) {
        Ok(list) => list,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring malformed attachments column");
            Vec::new()
        }
    }
}

pub(crate) fn attachments_to_json(list: &[Attachment]) -> Result<JsonValue, DbErr> {
    serde_json::to_value(list).map_err(|err| DbErr::Custom(err.to_string()))
}

/// Resolves a tag uuid to its row id, only among the given user's tags.
pub(crate) async fn tag_row_id<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    tag_uuid: Option<Uuid>,
) -> Result<Option<i64>, DbErr> {
    let Some(tag_uuid) = tag_uuid else {
        return Ok(None);
    };
    let id: Option<i64> = tag::Entity::find()
        .select_only()
        .column(tag::Column::Id)
        .filter(tag::Column::Uuid.eq(tag_uuid))
        .filter(tag::Column::UserId.eq(user_id))
        .into_tuple()
        .one(db)
        .await?;
    id.map(Some)
        .ok_or(DbErr::RecordNotFound("Tag not found".to_string()))
}

/// Trimmed search term, `None` when blank.
pub(crate) fn search_term(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
}
