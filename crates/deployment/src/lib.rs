use std::sync::Arc;

use async_trait::async_trait;
use db::{DBService, DbErr};
use services::services::{
    config::{Config, ConfigError},
    editor::EditorService,
    events::EventService,
    geolocation::GeolocationError,
    notification::NotificationService,
    notification_center::NotificationCenters,
    storage::{ObjectStore, StorageError},
};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Geolocation(#[from] GeolocationError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Everything a request handler may reach. Built once at startup and handed
/// to the router as state.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new() -> Result<Self, DeploymentError>;

    fn config(&self) -> &Arc<RwLock<Config>>;

    fn db(&self) -> &DBService;

    fn events(&self) -> &EventService;

    fn storage(&self) -> &Arc<dyn ObjectStore>;

    fn notifications(&self) -> &NotificationService;

    fn notification_centers(&self) -> &NotificationCenters;

    fn editor(&self) -> &EditorService;
}
