//! Human-readable references of the form `TASK-20250314-007`.
//!
//! The sequence is "records already carrying today's prefix, plus one". Two
//! concurrent creations for the same user can therefore get the same
//! reference; there is no unique index and no retry.

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::{note, task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Task,
    Note,
}

impl ReferenceKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ReferenceKind::Task => "TASK",
            ReferenceKind::Note => "NOTE",
        }
    }
}

pub fn day_prefix(kind: ReferenceKind, date: NaiveDate) -> String {
    format!("{}-{}-", kind.prefix(), date.format("%Y%m%d"))
}

pub fn format_reference(kind: ReferenceKind, date: NaiveDate, sequence: u64) -> String {
    format!("{}{:03}", day_prefix(kind, date), sequence)
}

pub async fn next_reference<C: ConnectionTrait>(
    db: &C,
    kind: ReferenceKind,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<String, DbErr> {
    let prefix = day_prefix(kind, date);
    let existing = match kind {
        ReferenceKind::Task => {
            task::Entity::find()
                .filter(task::Column::UserId.eq(user_id))
                .filter(task::Column::Reference.starts_with(&prefix))
                .count(db)
                .await?
        }
        ReferenceKind::Note => {
            note::Entity::find()
                .filter(note::Column::UserId.eq(user_id))
                .filter(note::Column::Reference.starts_with(&prefix))
                .count(db)
                .await?
        }
    };
    Ok(format_reference(kind, date, existing + 1))
}
