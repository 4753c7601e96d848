use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{note, tag},
    models::{
        common::{TagRef, attachments_from_json, attachments_to_json, search_term, tag_row_id},
        reference::{ReferenceKind, next_reference},
    },
    types::Attachment,
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Note {
    pub id: Uuid,
    pub reference: String,
    pub title: String,
    pub description: String,
    pub tag: Option<TagRef>,
    pub cover_url: Option<String>,
    /// Rich text, stored and returned verbatim.
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct NoteData {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tag_id: Option<Uuid>,
    #[serde(default)]
    pub cover_url: Option<String>,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl NoteData {
    pub fn new(title: &str, description: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct NoteFilter {
    /// Matches title, reference or tag name, case-insensitively.
    pub search: Option<String>,
}

impl Note {
    fn from_model(model: note::Model, tag: Option<tag::Model>) -> Self {
        Self {
            id: model.uuid,
            reference: model.reference,
            title: model.title,
            description: model.description,
            tag: tag.map(TagRef::from),
            cover_url: model.cover_url,
            content: model.content,
            attachments: attachments_from_json(model.attachments),
            author: model.author,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn find_filtered<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        filter: &NoteFilter,
    ) -> Result<Vec<Self>, DbErr> {
        let mut query = note::Entity::find()
            .find_also_related(tag::Entity)
            .filter(note::Column::UserId.eq(user_id));

        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(
                Condition::any()
                    .add(note::Column::Title.contains(&term))
                    .add(note::Column::Reference.contains(&term))
                    .add(tag::Column::Name.contains(&term)),
            );
        }

        let rows = query
            .order_by_desc(note::Column::CreatedAt)
            .order_by_desc(note::Column::Id)
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
        let row = note::Entity::find()
            .find_also_related(tag::Entity)
            .filter(note::Column::Uuid.eq(id))
            .filter(note::Column::UserId.eq(user_id))
            .one(db)
            .await?;
        Ok(row.map(|(model, tag)| Self::from_model(model, tag)))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        author: Option<String>,
        data: &NoteData,
    ) -> Result<Self, DbErr> {
        Self::create_on(db, user_id, author, data, Utc::now().date_naive()).await
    }

    pub async fn create_on<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        author: Option<String>,
        data: &NoteData,
        date: NaiveDate,
    ) -> Result<Self, DbErr> {
        let tag_id = tag_row_id(db, user_id, data.tag_id).await?;
        let reference = next_reference(db, ReferenceKind::Note, user_id, date).await?;

        let now = Utc::now();
        let active = note::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            reference: Set(reference),
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            tag_id: Set(tag_id),
            cover_url: Set(data.cover_url.clone()),
            content: Set(data.content.clone()),
            attachments: Set(attachments_to_json(&data.attachments)?),
            author: Set(author),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        Self::find_by_id(db, user_id, model.uuid)
            .await?
            .ok_or(DbErr::RecordNotFound("Note not found".to_string()))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
        data: &NoteData,
    ) -> Result<Self, DbErr> {
        let record = note::Entity::find()
            .filter(note::Column::Uuid.eq(id))
            .filter(note::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Note not found".to_string()))?;
        let tag_id = tag_row_id(db, user_id, data.tag_id).await?;

        let mut active: note::ActiveModel = record.into();
        active.title = Set(data.title.clone());
        active.description = Set(data.description.clone());
        active.tag_id = Set(tag_id);
        active.cover_url = Set(data.cover_url.clone());
        active.content = Set(data.content.clone());
        active.attachments = Set(attachments_to_json(&data.attachments)?);
        active.updated_at = Set(Utc::now().into());
        active.update(db).await?;

        Self::find_by_id(db, user_id, id)
            .await?
            .ok_or(DbErr::RecordNotFound("Note not found".to_string()))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, user_id: Uuid, id: Uuid) -> Result<u64, DbErr> {
        let result = note::Entity::delete_many()
            .filter(note::Column::Uuid.eq(id))
            .filter(note::Column::UserId.eq(user_id))
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
        let result = note::Entity::delete_many()
            .filter(note::Column::Uuid.is_in(ids.iter().copied()))
            .filter(note::Column::UserId.eq(user_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::tag::{CreateTag, Tag},
        test_db::setup_db,
    };

    #[tokio::test]
    async fn search_matches_tag_name() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        let tag = Tag::create(
            &db,
            user,
            &CreateTag {
                name: "Comptabilité".to_string(),
            },
        )
        .await
        .unwrap();

        let mut tagged = NoteData::new("Bilan", "annuel", "<p>x</p>");
        tagged.tag_id = Some(tag.id);
        let tagged = Note::create(&db, user, None, &tagged).await.unwrap();
        Note::create(&db, user, None, &NoteData::new("Idées", "vrac", "y"))
            .await
            .unwrap();

        let filter = NoteFilter {
            search: Some("compta".to_string()),
        };
        let found = Note::find_filtered(&db, user, &filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, tagged.id);
        assert!(found[0].reference.starts_with("NOTE-"));

        let all = Note::find_filtered(&db, user, &NoteFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn content_and_cover_are_kept_verbatim() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        let content = "<h1>Titre</h1><script>alert(1)</script>";
        let mut data = NoteData::new("t", "d", content);
        data.cover_url = Some("/storage/notes_files/covers/1_c.png".to_string());

        let note = Note::create(&db, user, Some("Ada".to_string()), &data).await.unwrap();
        let loaded = Note::find_by_id(&db, user, note.id).await.unwrap().unwrap();
        assert_eq!(loaded.content, content);
        assert_eq!(loaded.cover_url, data.cover_url);

        data.content = "<p>v2</p>".to_string();
        let updated = Note::update(&db, user, note.id, &data).await.unwrap();
        assert_eq!(updated.content, "<p>v2</p>");
        assert_eq!(updated.reference, note.reference);
        assert_eq!(updated.author.as_deref(), Some("Ada"));
    }
}
