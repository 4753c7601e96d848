use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use db::{DBService, DbErr, models::notification::Notification};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::{sync::RwLock, task::JoinHandle, time::Instant};
use ts_rs::TS;
use utils::stream_msg::StreamMsg;
use uuid::Uuid;

use super::{config::NotificationConfig, events::EventService, events::notification_patch};

#[derive(Debug, Clone)]
struct Toast {
    notification: Notification,
    shown_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ToastView {
    pub id: Uuid,
    pub message: String,
    pub icon: String,
    pub color: String,
    /// Remaining lifetime in percent, 100 when shown.
    pub progress: f64,
    pub remaining_ms: u64,
}

/// Auto-dismissing toasts, oldest first.
#[derive(Debug)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    lifetime: Duration,
}

impl ToastQueue {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            lifetime,
        }
    }

    pub fn push(&mut self, notification: Notification, now: Instant) {
        self.toasts.push(Toast {
            notification,
            shown_at: now,
        });
    }

    /// Drops expired toasts. Returns how many were removed.
    pub fn tick(&mut self, now: Instant) -> usize {
        let before = self.toasts.len();
        let lifetime = self.lifetime;
        self.toasts
            .retain(|toast| now.saturating_duration_since(toast.shown_at) < lifetime);
        before - self.toasts.len()
    }

    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.notification.id != id);
        before != self.toasts.len()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn views(&self, now: Instant) -> Vec<ToastView> {
        let lifetime_ms = self.lifetime.as_millis().max(1) as f64;
        self.toasts
            .iter()
            .map(|toast| {
                let remaining = self
                    .lifetime
                    .saturating_sub(now.saturating_duration_since(toast.shown_at));
                let remaining_ms = remaining.as_millis() as u64;
                ToastView {
                    id: toast.notification.id,
                    message: toast.notification.message.clone(),
                    icon: toast.notification.icon.clone(),
                    color: toast.notification.color.clone(),
                    progress: (remaining_ms as f64 / lifetime_ms * 100.0).clamp(0.0, 100.0),
                    remaining_ms,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct CenterSnapshot {
    pub unread_count: u64,
    pub toasts: Vec<ToastView>,
}

struct CenterState {
    unread: u64,
    toasts: ToastQueue,
    last_used: Instant,
}

/// Toasts and unread badge of one user, fed by a single subscription.
pub struct NotificationCenter {
    user_id: Uuid,
    state: Mutex<CenterState>,
}

impl NotificationCenter {
    pub fn new(user_id: Uuid, unread: u64, toast_lifetime: Duration) -> Self {
        Self {
            user_id,
            state: Mutex::new(CenterState {
                unread,
                toasts: ToastQueue::new(toast_lifetime),
                last_used: Instant::now(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CenterState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn unread_count(&self) -> u64 {
        self.lock().unread
    }

    pub fn on_insert(&self, notification: Notification, now: Instant) {
        let mut state = self.lock();
        if !notification.is_read {
            state.unread += 1;
        }
        state.toasts.push(notification, now);
    }

    pub fn on_cleared(&self) {
        let mut state = self.lock();
        state.unread = 0;
    }

    pub fn reset_unread(&self) {
        self.lock().unread = 0;
    }

    fn decrement_unread(&self) {
        let mut state = self.lock();
        state.unread = state.unread.saturating_sub(1);
    }

    pub fn tick(&self, now: Instant) {
        self.lock().toasts.tick(now);
    }

    fn touch(&self, now: Instant) {
        self.lock().last_used = now;
    }

    /// No pending toasts and untouched for at least `idle_after`.
    pub fn is_idle(&self, now: Instant, idle_after: Duration) -> bool {
        let state = self.lock();
        state.toasts.is_empty() && now.saturating_duration_since(state.last_used) >= idle_after
    }

    pub fn dismiss(&self, toast_id: Uuid) -> bool {
        self.lock().toasts.dismiss(toast_id)
    }

    pub fn snapshot(&self, now: Instant) -> CenterSnapshot {
        let state = self.lock();
        CenterSnapshot {
            unread_count: state.unread,
            toasts: state.toasts.views(now),
        }
    }

    fn apply(&self, msg: &StreamMsg, now: Instant) {
        let StreamMsg::JsonPatch(patch) = msg;
        if let Some(notification) = notification_patch::inserted(patch) {
            self.on_insert(notification, now);
        } else if notification_patch::is_clear(patch) {
            self.on_cleared();
        }
    }
}

struct CenterEntry {
    center: Arc<NotificationCenter>,
    consumer: JoinHandle<()>,
}

/// One [`NotificationCenter`] per user, created on first use and dropped
/// again once idle.
#[derive(Clone)]
pub struct NotificationCenters {
    db: DBService,
    events: EventService,
    config: NotificationConfig,
    centers: Arc<RwLock<HashMap<Uuid, CenterEntry>>>,
}

impl NotificationCenters {
    pub fn new(db: DBService, events: EventService, config: NotificationConfig) -> Self {
        Self {
            db,
            events,
            config,
            centers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn idle_after(&self) -> Duration {
        Duration::from_secs(self.config.center_idle_secs)
    }

    pub async fn center(&self, user_id: Uuid) -> Result<Arc<NotificationCenter>, DbErr> {
        if let Some(entry) = self.centers.read().await.get(&user_id) {
            entry.center.touch(Instant::now());
            return Ok(entry.center.clone());
        }

        // Subscribe before counting so no insert falls between the two.
        let stream = self.events.notification_stream(user_id);
        let unread = Notification::count_unread(&self.db.pool, user_id).await?;

        let mut centers = self.centers.write().await;
        if let Some(entry) = centers.get(&user_id) {
            entry.center.touch(Instant::now());
            return Ok(entry.center.clone());
        }
        let evicted = evict_idle_from(&mut centers, Instant::now(), self.idle_after());
        if evicted > 0 {
            tracing::debug!(evicted, "idle notification centers dropped");
        }

        let center = Arc::new(NotificationCenter::new(
            user_id,
            unread,
            Duration::from_millis(self.config.toast_duration_ms),
        ));
        let consumer = self.spawn_consumer(center.clone(), stream);
        centers.insert(
            user_id,
            CenterEntry {
                center: center.clone(),
                consumer,
            },
        );
        drop(centers);

        tracing::debug!(%user_id, unread, "notification center started");
        Ok(center)
    }

    /// Drops the centers of users that went idle and stops their consumers.
    /// The unread badge is seeded again from the database on next access.
    pub async fn evict_idle(&self, now: Instant) -> usize {
        let mut centers = self.centers.write().await;
        evict_idle_from(&mut centers, now, self.idle_after())
    }

    pub async fn active_count(&self) -> usize {
        self.centers.read().await.len()
    }

    fn spawn_consumer(
        &self,
        center: Arc<NotificationCenter>,
        mut stream: futures::stream::BoxStream<'static, Result<StreamMsg, std::io::Error>>,
    ) -> JoinHandle<()> {
        let tick_every = Duration::from_millis(self.config.tick_interval_ms);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick_every);
            loop {
                tokio::select! {
                    msg = stream.next() => match msg {
                        Some(Ok(msg)) => center.apply(&msg, Instant::now()),
                        Some(Err(err)) => {
                            tracing::warn!(user_id = %center.user_id(), error = %err, "notification stream error");
                        }
                        None => break,
                    },
                    _ = ticker.tick() => center.tick(Instant::now()),
                }
            }
        })
    }

    pub async fn snapshot(&self, user_id: Uuid) -> Result<CenterSnapshot, DbErr> {
        Ok(self.center(user_id).await?.snapshot(Instant::now()))
    }

    /// Opening the bell marks everything read.
    pub async fn open_bell(&self, user_id: Uuid) -> Result<u64, DbErr> {
        let center = self.center(user_id).await?;
        let marked = Notification::mark_all_read(&self.db.pool, user_id).await?;
        center.reset_unread();
        Ok(marked)
    }

    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, DbErr> {
        let center = self.center(user_id).await?;
        let changed = Notification::mark_read(&self.db.pool, user_id, id).await? > 0;
        if changed {
            center.decrement_unread();
        }
        Ok(changed)
    }

    pub async fn clear_all(&self, user_id: Uuid) -> Result<u64, DbErr> {
        let center = self.center(user_id).await?;
        let removed = Notification::delete_all(&self.db.pool, user_id).await?;
        center.on_cleared();
        Ok(removed)
    }

    pub async fn dismiss(&self, user_id: Uuid, toast_id: Uuid) -> Result<bool, DbErr> {
        Ok(self.center(user_id).await?.dismiss(toast_id))
    }
}

fn evict_idle_from(
    centers: &mut HashMap<Uuid, CenterEntry>,
    now: Instant,
    idle_after: Duration,
) -> usize {
    let before = centers.len();
    centers.retain(|_, entry| {
        let idle = entry.center.is_idle(now, idle_after) || entry.consumer.is_finished();
        if idle {
            entry.consumer.abort();
        }
        !idle
    });
    before - centers.len()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use db::models::notification::{CreateNotification, NotificationType};

    use super::*;

    fn notification(message: &str) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            notification_type: NotificationType::TaskCreated,
            message: message.to_string(),
            icon: "✅".to_string(),
            color: "#198754".to_string(),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn toast_expires_after_lifetime_within_one_tick() {
        let start = Instant::now();
        let tick = Duration::from_millis(100);
        let mut queue = ToastQueue::new(Duration::from_millis(4000));
        queue.push(notification("a"), start);

        queue.tick(start + Duration::from_millis(3900));
        assert_eq!(queue.len(), 1);
        let view = &queue.views(start + Duration::from_millis(3000))[0];
        assert_eq!(view.remaining_ms, 1000);
        assert!((view.progress - 25.0).abs() < f64::EPSILON);

        queue.tick(start + Duration::from_millis(4000));
        assert!(queue.is_empty());

        queue.push(notification("b"), start);
        queue.tick(start + Duration::from_millis(4000) + tick);
        assert!(queue.is_empty());
    }

    #[test]
    fn manual_dismiss_is_immediate() {
        let now = Instant::now();
        let mut queue = ToastQueue::new(Duration::from_millis(4000));
        let first = notification("a");
        let id = first.id;
        queue.push(first, now);
        queue.push(notification("b"), now);

        assert!(queue.dismiss(id));
        assert!(!queue.dismiss(id));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn center_counts_inserts_and_resets() {
        let center = NotificationCenter::new(Uuid::new_v4(), 2, Duration::from_millis(4000));
        let now = Instant::now();
        center.on_insert(notification("x"), now);
        assert_eq!(center.unread_count(), 3);
        assert_eq!(center.snapshot(now).toasts.len(), 1);

        center.reset_unread();
        assert_eq!(center.unread_count(), 0);
    }

    #[test]
    fn center_is_idle_only_without_toasts_and_recent_use() {
        let center = NotificationCenter::new(Uuid::new_v4(), 0, Duration::from_millis(4000));
        let now = Instant::now();
        let idle_after = Duration::from_secs(60);
        center.touch(now);

        assert!(!center.is_idle(now + Duration::from_secs(30), idle_after));
        assert!(center.is_idle(now + idle_after, idle_after));

        center.on_insert(notification("x"), now);
        assert!(!center.is_idle(now + idle_after, idle_after));
        center.tick(now + Duration::from_millis(4000));
        assert!(center.is_idle(now + idle_after, idle_after));
    }

    #[tokio::test]
    async fn idle_centers_are_dropped_and_reseeded_on_next_use() {
        use db::models::event_outbox::EventOutbox;
        use sea_orm::Database;
        use sea_orm_migration::MigratorTrait;
        use utils::msg_store::MsgStore;

        let pool = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&pool, None).await.unwrap();
        let db = DBService { pool };
        let events = EventService::new(db.clone(), Arc::new(MsgStore::new()));
        let config = NotificationConfig {
            center_idle_secs: 60,
            ..NotificationConfig::default()
        };
        let centers = NotificationCenters::new(db.clone(), events, config);

        let busy = Uuid::new_v4();
        let quiet = Uuid::new_v4();
        let now = Instant::now();
        centers.center(busy).await.unwrap().on_insert(notification("x"), now);
        centers.center(quiet).await.unwrap();
        assert_eq!(centers.active_count().await, 2);

        assert_eq!(centers.evict_idle(now).await, 0);
        assert_eq!(centers.evict_idle(now + Duration::from_secs(61)).await, 1);
        assert_eq!(centers.active_count().await, 1);

        let rendered = CreateNotification {
            notification_type: NotificationType::TaskCreated,
            message: "Votre tâche".to_string(),
            icon: "✅".to_string(),
            color: "#198754".to_string(),
        };
        Notification::create(&db.pool, quiet, &rendered).await.unwrap();
        for _ in 0..40 {
            if EventOutbox::fetch_unpublished(&db.pool, 10).await.unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(centers.snapshot(quiet).await.unwrap().unread_count, 1);
        assert_eq!(centers.active_count().await, 2);
    }

    #[tokio::test]
    async fn centers_seed_from_count_and_follow_the_stream() {
        use db::models::event_outbox::EventOutbox;
        use sea_orm::Database;
        use sea_orm_migration::MigratorTrait;
        use utils::msg_store::MsgStore;

        let pool = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&pool, None).await.unwrap();
        let db = DBService { pool };
        let user = Uuid::new_v4();
        let rendered = CreateNotification {
            notification_type: NotificationType::NoteCreated,
            message: "Votre note".to_string(),
            icon: "✅".to_string(),
            color: "#FF570A".to_string(),
        };
        Notification::create(&db.pool, user, &rendered).await.unwrap();

        let events = EventService::new(db.clone(), Arc::new(MsgStore::new()));
        // Let the worker publish the first insert before anyone subscribes.
        for _ in 0..40 {
            if EventOutbox::fetch_unpublished(&db.pool, 10).await.unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        let centers = NotificationCenters::new(db.clone(), events, NotificationConfig::default());

        let seeded = centers.snapshot(user).await.unwrap();
        assert_eq!(seeded.unread_count, 1);

        Notification::create(&db.pool, user, &rendered).await.unwrap();
        let mut snapshot = seeded;
        for _ in 0..40 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            snapshot = centers.snapshot(user).await.unwrap();
            if snapshot.unread_count == 2 {
                break;
            }
        }
        assert_eq!(snapshot.unread_count, 2);
        assert_eq!(snapshot.toasts.len(), 1);

        assert_eq!(centers.open_bell(user).await.unwrap(), 2);
        assert_eq!(centers.snapshot(user).await.unwrap().unread_count, 0);
        assert_eq!(Notification::count_unread(&db.pool, user).await.unwrap(), 0);
    }
}
