use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const CURRENT_CONFIG_VERSION: &str = "v1";

const DEFAULT_TOAST_DURATION_MS: u64 = 4000;
const DEFAULT_TICK_INTERVAL_MS: u64 = 100;
const DEFAULT_RECENT_LIMIT: u64 = 30;
const DEFAULT_CENTER_IDLE_SECS: u64 = 600;
const DEFAULT_IP_LOOKUP_URL: &str = "https://ipinfo.io/{ip}/json";
const DEFAULT_PUBLIC_BASE_URL: &str = "/storage";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessControlMode {
    #[default]
    Disabled,
    Token,
}

#[derive(Clone, Debug, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct AccessControlConfig {
    pub mode: AccessControlMode,
    pub token: Option<String>,
    #[serde(alias = "allowLocalhostBypass")]
    pub allow_localhost_bypass: bool,
}

impl Default for AccessControlConfig {
    fn default() -> Self {
        Self {
            mode: AccessControlMode::Disabled,
            token: None,
            allow_localhost_bypass: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct NotificationConfig {
    /// Lifetime of a toast before it auto-dismisses.
    #[serde(alias = "toastDurationMs")]
    pub toast_duration_ms: u64,
    /// Period of the toast progress tick.
    #[serde(alias = "tickIntervalMs")]
    pub tick_interval_ms: u64,
    /// Geolocation and user-agent enrichment of auth notifications.
    #[serde(alias = "enrichmentEnabled")]
    pub enrichment_enabled: bool,
    /// `{ip}` is replaced by the caller address; without one the path
    /// segment is dropped and the service answers for the server itself.
    #[serde(alias = "ipLookupUrl")]
    pub ip_lookup_url: String,
    #[serde(alias = "recentLimit")]
    pub recent_limit: u64,
    /// A user's toast center is dropped after this long without access
    /// once its toasts are gone.
    #[serde(alias = "centerIdleSecs")]
    pub center_idle_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            toast_duration_ms: DEFAULT_TOAST_DURATION_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            enrichment_enabled: true,
            ip_lookup_url: DEFAULT_IP_LOOKUP_URL.to_string(),
            recent_limit: DEFAULT_RECENT_LIMIT,
            center_idle_secs: DEFAULT_CENTER_IDLE_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct StorageConfig {
    /// Prefix of the public URLs handed back for uploaded files.
    #[serde(alias = "publicBaseUrl")]
    pub public_base_url: String,
    /// Create known buckets at startup instead of failing uploads.
    #[serde(alias = "createMissingBuckets")]
    pub create_missing_buckets: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            create_missing_buckets: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct EditorConfig {
    #[serde(alias = "taskRedirectDelayMs")]
    pub task_redirect_delay_ms: u64,
    #[serde(alias = "noteRedirectDelayMs")]
    pub note_redirect_delay_ms: u64,
    #[serde(alias = "projectRedirectDelayMs")]
    pub project_redirect_delay_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            task_redirect_delay_ms: 2000,
            note_redirect_delay_ms: 3000,
            project_redirect_delay_ms: 2000,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct Config {
    #[serde(alias = "configVersion")]
    pub config_version: String,
    #[serde(alias = "accessControl")]
    pub access_control: AccessControlConfig,
    pub notifications: NotificationConfig,
    pub storage: StorageConfig,
    pub editor: EditorConfig,
}

impl Config {
    pub fn from_raw(raw_config: &str) -> Self {
        match serde_json::from_str::<Config>(raw_config) {
            Ok(config) => config.normalized(),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse config (line {}, column {}): {}, using default",
                    e.line(),
                    e.column(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn normalized(mut self) -> Self {
        self.config_version = CURRENT_CONFIG_VERSION.to_string();

        if matches!(
            self.access_control.token.as_deref(),
            Some(token) if token.trim().is_empty()
        ) {
            self.access_control.token = None;
        }

        if self.notifications.toast_duration_ms == 0 {
            tracing::warn!("toast_duration_ms set to 0, resetting to default");
            self.notifications.toast_duration_ms = DEFAULT_TOAST_DURATION_MS;
        }
        if self.notifications.tick_interval_ms == 0 {
            tracing::warn!("tick_interval_ms set to 0, resetting to default");
            self.notifications.tick_interval_ms = DEFAULT_TICK_INTERVAL_MS;
        }
        if self.notifications.recent_limit == 0 {
            self.notifications.recent_limit = DEFAULT_RECENT_LIMIT;
        }
        if self.notifications.center_idle_secs == 0 {
            self.notifications.center_idle_secs = DEFAULT_CENTER_IDLE_SECS;
        }
        if self.notifications.ip_lookup_url.trim().is_empty() {
            self.notifications.ip_lookup_url = DEFAULT_IP_LOOKUP_URL.to_string();
        }

        let base = self.storage.public_base_url.trim().trim_end_matches('/');
        self.storage.public_base_url = if base.is_empty() {
            DEFAULT_PUBLIC_BASE_URL.to_string()
        } else {
            base.to_string()
        };

        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: CURRENT_CONFIG_VERSION.to_string(),
            access_control: AccessControlConfig::default(),
            notifications: NotificationConfig::default(),
            storage: StorageConfig::default(),
            editor: EditorConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_for_empty_config() {
        let config = Config::from_raw("{}");

        assert_eq!(config.config_version, CURRENT_CONFIG_VERSION);
        assert_eq!(config.access_control.mode, AccessControlMode::Disabled);
        assert_eq!(config.notifications.toast_duration_ms, 4000);
        assert_eq!(config.notifications.tick_interval_ms, 100);
        assert_eq!(config.notifications.center_idle_secs, 600);
        assert_eq!(config.editor.note_redirect_delay_ms, 3000);
        assert_eq!(config.storage.public_base_url, "/storage");
    }

    #[test]
    fn invalid_json_falls_back_to_default() {
        let config = Config::from_raw("{invalid json");
        assert_eq!(config.config_version, CURRENT_CONFIG_VERSION);
        assert!(config.notifications.enrichment_enabled);
    }

    #[test]
    fn aliases_and_normalization_are_applied() {
        let raw = r#"{
            "configVersion": "v0",
            "accessControl": { "mode": "TOKEN", "token": "  " },
            "notifications": { "toastDurationMs": 0, "tickIntervalMs": 50, "centerIdleSecs": 0 },
            "storage": { "publicBaseUrl": "https://cdn.example.com/files/" }
        }"#;

        let config = Config::from_raw(raw);

        assert_eq!(config.config_version, CURRENT_CONFIG_VERSION);
        assert_eq!(config.access_control.mode, AccessControlMode::Token);
        assert_eq!(config.access_control.token, None);
        assert_eq!(config.notifications.toast_duration_ms, 4000);
        assert_eq!(config.notifications.tick_interval_ms, 50);
        assert_eq!(config.notifications.center_idle_secs, 600);
        assert_eq!(config.storage.public_base_url, "https://cdn.example.com/files");
    }
}
