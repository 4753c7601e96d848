use std::{sync::Arc, time::Duration};

use db::{
    DBService,
    events::{
        EVENT_NOTIFICATION_CREATED, EVENT_NOTIFICATIONS_CLEARED, NotificationEventPayload,
        NotificationsClearedPayload,
    },
    models::{event_outbox::EventOutbox, notification::Notification},
};
use futures::{StreamExt, future, stream::BoxStream};
use utils::{msg_store::MsgStore, stream_msg::StreamMsg};
use uuid::Uuid;

#[path = "events/patches.rs"]
pub mod patches;
#[path = "events/types.rs"]
pub mod types;

pub use patches::notification_patch;
pub use types::EventError;

const OUTBOX_POLL_INTERVAL: Duration = Duration::from_millis(250);
const OUTBOX_BATCH_LIMIT: u64 = 100;

/// Drains the event outbox into the realtime message store.
#[derive(Clone)]
pub struct EventService {
    msg_store: Arc<MsgStore>,
    db: DBService,
}

impl EventService {
    pub fn new(db: DBService, msg_store: Arc<MsgStore>) -> Self {
        let service = Self { msg_store, db };
        service.spawn_outbox_worker();
        service
    }

    fn spawn_outbox_worker(&self) {
        let service = self.clone();
        tokio::spawn(async move {
            service.run_outbox_loop().await;
        });
    }

    async fn run_outbox_loop(&self) {
        loop {
            if let Err(err) = self.flush_pending().await {
                tracing::error!(error = %err, "event outbox flush failed");
            }
            tokio::time::sleep(OUTBOX_POLL_INTERVAL).await;
        }
    }

    async fn flush_pending(&self) -> Result<(), EventError> {
        let entries = EventOutbox::fetch_unpublished(&self.db.pool, OUTBOX_BATCH_LIMIT).await?;
        if entries.is_empty() {
            return Ok(());
        }

        for entry in entries {
            match self.dispatch_entry(&entry).await {
                Ok(()) => {
                    EventOutbox::mark_published(&self.db.pool, entry.id).await?;
                }
                Err(err) => {
                    let err_msg = err.to_string();
                    tracing::warn!(event_id = entry.uuid.to_string(), error = %err_msg, "event dispatch failed");
                    EventOutbox::mark_failed(&self.db.pool, entry.id, &err_msg).await?;
                }
            }
        }

        Ok(())
    }

    async fn dispatch_entry(
        &self,
        entry: &db::entities::event_outbox::Model,
    ) -> Result<(), EventError> {
        match entry.event_type.as_str() {
            EVENT_NOTIFICATION_CREATED => {
                let payload: NotificationEventPayload =
                    serde_json::from_value(entry.payload.clone())?;
                // Cleared before the worker caught up: nothing to announce.
                if let Some(notification) =
                    Notification::find_by_id(&self.db.pool, payload.user_id, payload.notification_id)
                        .await?
                {
                    self.msg_store
                        .push_patch(notification_patch::add(&notification)?);
                }
            }
            EVENT_NOTIFICATIONS_CLEARED => {
                let payload: NotificationsClearedPayload =
                    serde_json::from_value(entry.payload.clone())?;
                self.msg_store
                    .push_patch(notification_patch::clear(payload.user_id)?);
            }
            _ => {
                tracing::debug!(event_type = entry.event_type.as_str(), "unknown event type");
            }
        }

        Ok(())
    }

    pub fn msg_store(&self) -> &Arc<MsgStore> {
        &self.msg_store
    }

    /// Live notification patches addressed to one user.
    pub fn notification_stream(
        &self,
        user_id: Uuid,
    ) -> BoxStream<'static, Result<StreamMsg, std::io::Error>> {
        self.msg_store
            .live_stream()
            .filter(move |msg| {
                let keep = match msg {
                    Ok(StreamMsg::JsonPatch(patch)) => {
                        notification_patch::owner(patch) == Some(user_id)
                    }
                    Err(_) => true,
                };
                future::ready(keep)
            })
            .boxed()
    }
}
