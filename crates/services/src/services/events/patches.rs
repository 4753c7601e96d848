use db::models::notification::Notification;
use json_patch::Patch;
use serde_json::{Value, json};
use uuid::Uuid;

/// Patches over a per-user document: `/notifications/<user_id>/<notification_id>`.
pub mod notification_patch {
    use super::*;

    const ROOT: &str = "/notifications";

    fn user_path(user_id: Uuid) -> String {
        format!("{ROOT}/{user_id}")
    }

    pub fn add(notification: &Notification) -> Result<Patch, serde_json::Error> {
        serde_json::from_value(json!([{
            "op": "add",
            "path": format!("{}/{}", user_path(notification.user_id), notification.id),
            "value": notification,
        }]))
    }

    /// Empties the user's notification map.
    pub fn clear(user_id: Uuid) -> Result<Patch, serde_json::Error> {
        serde_json::from_value(json!([{
            "op": "replace",
            "path": user_path(user_id),
            "value": {},
        }]))
    }

    fn first_op(patch: &Patch) -> Option<Value> {
        match serde_json::to_value(patch).ok()? {
            Value::Array(mut ops) if !ops.is_empty() => Some(ops.swap_remove(0)),
            _ => None,
        }
    }

    /// Owner encoded in the patch path, if it is a notification patch.
    pub fn owner(patch: &Patch) -> Option<Uuid> {
        let op = first_op(patch)?;
        let path = op.get("path")?.as_str()?;
        let rest = path.strip_prefix(ROOT)?.strip_prefix('/')?;
        let user = rest.split('/').next()?;
        Uuid::parse_str(user).ok()
    }

    /// The inserted notification when the patch is an `add`.
    pub fn inserted(patch: &Patch) -> Option<Notification> {
        let op = first_op(patch)?;
        if op.get("op")?.as_str()? != "add" {
            return None;
        }
        serde_json::from_value(op.get("value")?.clone()).ok()
    }

    pub fn is_clear(patch: &Patch) -> bool {
        first_op(patch)
            .and_then(|op| op.get("op").and_then(Value::as_str).map(|op| op == "replace"))
            .unwrap_or(false)
    }
}
