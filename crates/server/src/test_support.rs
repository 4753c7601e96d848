use std::sync::{Mutex, MutexGuard, OnceLock};

use tempfile::TempDir;

const ASSET_DIR_ENV: &str = "ATELIER_ASSET_DIR";
const DATABASE_URL_ENV: &str = "DATABASE_URL";

pub fn test_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Points the asset directory and database at a fresh temp dir for the
/// lifetime of the guard, restoring the previous values on drop.
pub struct TestEnvGuard {
    _lock: MutexGuard<'static, ()>,
    root: TempDir,
    previous: Vec<(&'static str, Option<String>)>,
}

impl TestEnvGuard {
    pub fn new() -> Self {
        let lock = test_lock().lock().unwrap_or_else(|err| err.into_inner());
        let root = tempfile::tempdir().unwrap();
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            root.path().join("db.sqlite").to_string_lossy()
        );

        let overrides = [
            (ASSET_DIR_ENV, root.path().to_string_lossy().to_string()),
            (DATABASE_URL_ENV, db_url),
        ];
        let previous = overrides
            .iter()
            .map(|(name, _)| (*name, std::env::var(name).ok()))
            .collect();

        // SAFETY: tests using TestEnvGuard are serialized by test_lock.
        unsafe {
            for (name, value) in &overrides {
                std::env::set_var(name, value);
            }
        }

        Self {
            _lock: lock,
            root,
            previous,
        }
    }

    pub fn root(&self) -> &std::path::Path {
        self.root.path()
    }
}

impl Drop for TestEnvGuard {
    fn drop(&mut self) {
        // SAFETY: tests using TestEnvGuard are serialized by test_lock.
        unsafe {
            for (name, value) in &self.previous {
                match value {
                    Some(value) => std::env::set_var(name, value),
                    None => std::env::remove_var(name),
                }
            }
        }
    }
}
