use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use utils::assets::database_path;

pub mod entities;
pub mod events;
pub mod models;
pub mod types;

pub use sea_orm::DbErr;

pub type DbPool = DatabaseConnection;

#[derive(Clone)]
pub struct DBService {
    pub pool: DbPool,
}

fn database_url() -> String {
    match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => format!("sqlite://{}?mode=rwc", database_path().to_string_lossy()),
    }
}

impl DBService {
    /// Connects to `DATABASE_URL` (or the SQLite file in the asset dir) and
    /// applies pending migrations.
    pub async fn new() -> Result<DBService, DbErr> {
        let url = database_url();
        let mut options = ConnectOptions::new(url);
        options
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(30))
            .sqlx_logging(false);

        let pool = Database::connect(options).await?;
        db_migration::Migrator::up(&pool, None).await?;
        tracing::debug!("database ready");
        Ok(DBService { pool })
    }
}

#[cfg(test)]
pub(crate) mod test_db {
    use sea_orm::{Database, DatabaseConnection};
    use sea_orm_migration::MigratorTrait;

    pub async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }
}
