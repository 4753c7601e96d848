pub mod dashboard;
pub mod editor_form;
pub mod events;
pub mod health;
pub mod notes;
pub mod notifications;
pub mod projects;
pub mod tags;
pub mod tasks;
pub mod tools;

use services::services::listing::{BATCH_DELETE_MIN, BatchDeleteRequest};
use uuid::Uuid;

use crate::error::ApiError;

/// Batch deletes are only offered once at least two rows are selected.
pub(crate) fn ensure_batch_selection(request: &BatchDeleteRequest) -> Result<Vec<Uuid>, ApiError> {
    let selection = request.selection();
    if !selection.can_batch_delete() {
        return Err(ApiError::BadRequest(format!(
            "Sélectionnez au moins {BATCH_DELETE_MIN} éléments pour une suppression groupée."
        )));
    }
    Ok(selection.ids())
}
