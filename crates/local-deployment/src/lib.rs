use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use services::services::{
    config::{Config, StorageConfig, load_config_from_file, save_config_to_file},
    editor::EditorService,
    events::EventService,
    geolocation::HttpIpLookup,
    notification::NotificationService,
    notification_center::NotificationCenters,
    storage::{LocalObjectStore, ObjectStore},
};
use tokio::sync::RwLock;
use utils::{
    assets::{config_path, storage_dir},
    msg_store::MsgStore,
};

#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<RwLock<Config>>,
    db: DBService,
    events: EventService,
    storage: Arc<dyn ObjectStore>,
    notifications: NotificationService,
    notification_centers: NotificationCenters,
    editor: EditorService,
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        let config = Self::load_runtime_config(&config_path()).await?;
        let db = DBService::new().await?;
        let snapshot = config.read().await.clone();
        let storage = Self::build_object_store(&storage_dir(), &snapshot.storage).await?;
        Self::assemble(config, snapshot, db, storage)
    }

    fn config(&self) -> &Arc<RwLock<Config>> {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn events(&self) -> &EventService {
        &self.events
    }

    fn storage(&self) -> &Arc<dyn ObjectStore> {
        &self.storage
    }

    fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    fn notification_centers(&self) -> &NotificationCenters {
        &self.notification_centers
    }

    fn editor(&self) -> &EditorService {
        &self.editor
    }
}

impl LocalDeployment {
    /// Loads the config (defaults when absent) and writes it back normalized.
    async fn load_runtime_config(path: &Path) -> Result<Arc<RwLock<Config>>, DeploymentError> {
        let config = load_config_from_file(path).await.normalized();
        save_config_to_file(&config, path).await?;
        Ok(Arc::new(RwLock::new(config)))
    }

    async fn build_object_store(
        root: &Path,
        storage: &StorageConfig,
    ) -> Result<Arc<dyn ObjectStore>, DeploymentError> {
        let store = LocalObjectStore::new(root, storage.public_base_url.clone());
        if storage.create_missing_buckets {
            store.ensure_buckets().await?;
        } else {
            tracing::info!(
                root = %root.display(),
                "Bucket creation disabled; uploads to missing buckets will fail"
            );
        }
        Ok(Arc::new(store))
    }

    fn assemble(
        config: Arc<RwLock<Config>>,
        snapshot: Config,
        db: DBService,
        storage: Arc<dyn ObjectStore>,
    ) -> Result<Self, DeploymentError> {
        let ip_lookup = HttpIpLookup::new(snapshot.notifications.ip_lookup_url.clone())?;
        let events = EventService::new(db.clone(), Arc::new(MsgStore::new()));
        let notifications = NotificationService::new(
            db.clone(),
            Arc::new(ip_lookup),
            snapshot.notifications.enrichment_enabled,
        );
        let notification_centers =
            NotificationCenters::new(db.clone(), events.clone(), snapshot.notifications.clone());
        let editor = EditorService::new(
            db.clone(),
            storage.clone(),
            notifications.clone(),
            snapshot.editor.clone(),
        );

        Ok(Self {
            config,
            db,
            events,
            storage,
            notifications,
            notification_centers,
            editor,
        })
    }
}

#[cfg(test)]
mod tests {
    use services::services::config::{AccessControlMode, CURRENT_CONFIG_VERSION};

    use super::*;

    #[tokio::test]
    async fn runtime_config_is_created_and_normalized_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(
            &path,
            r#"{"accessControl":{"mode":"TOKEN","token":"  "},"storage":{"publicBaseUrl":"/files/"}}"#,
        )
        .await
        .unwrap();

        let config = LocalDeployment::load_runtime_config(&path).await.unwrap();
        let config = config.read().await;
        assert_eq!(config.access_control.mode, AccessControlMode::Token);
        assert_eq!(config.access_control.token, None);
        assert_eq!(config.storage.public_base_url, "/files");

        let saved: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(saved["storage"]["public_base_url"], "/files");
        assert_eq!(saved["access_control"]["token"], serde_json::Value::Null);
        assert_eq!(saved["config_version"], CURRENT_CONFIG_VERSION);
    }

    #[tokio::test]
    async fn missing_runtime_config_is_written_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = LocalDeployment::load_runtime_config(&path).await.unwrap();
        assert_eq!(config.read().await.config_version, CURRENT_CONFIG_VERSION);

        let saved: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(saved["notifications"]["toast_duration_ms"], 4000);
        assert_eq!(saved["notifications"]["center_idle_secs"], 600);
    }

    #[tokio::test]
    async fn object_store_creates_every_bucket_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("storage");

        LocalDeployment::build_object_store(&root, &StorageConfig::default())
            .await
            .unwrap();

        for bucket in ["avatars", "notes_files", "tasks_files", "projects_files"] {
            assert!(root.join(bucket).is_dir(), "missing bucket {bucket}");
        }
    }

    #[tokio::test]
    async fn object_store_leaves_buckets_alone_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("storage");
        let storage = StorageConfig {
            create_missing_buckets: false,
            ..StorageConfig::default()
        };

        LocalDeployment::build_object_store(&root, &storage)
            .await
            .unwrap();

        assert!(!root.exists());
    }
}
