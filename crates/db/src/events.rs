use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const EVENT_NOTIFICATION_CREATED: &str = "notification.created";
pub const EVENT_NOTIFICATIONS_CLEARED: &str = "notifications.cleared";

pub const ENTITY_NOTIFICATION: &str = "notification";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEventPayload {
    pub notification_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsClearedPayload {
    pub user_id: Uuid,
}
