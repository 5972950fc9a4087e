use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_DATABASE_URL: &str = "sqlite://calibration.db?mode=rwc";
const CONFIG_DIR: &str = "config";
const DEFAULT_DUE_SOON_WINDOW_DAYS: u32 = 30;

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_pool_bounds"))]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Application environment (development, test, production)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Log level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Run schema migrations on startup
    #[serde(default = "default_true_bool")]
    pub auto_migrate: bool,

    // Database pool tuning
    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1))]
    pub db_max_connections: u32,
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Capacity of the event channel feeding the notification processor
    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Days ahead of a due date from which an instrument counts as due soon
    #[serde(default = "default_due_soon_window_days")]
    #[validate(range(max = 366))]
    pub due_soon_window_days: u32,
}

impl AppConfig {
    /// Creates a configuration with every optional setting at its default.
    pub fn new(database_url: String, environment: String) -> Self {
        Self {
            database_url,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: default_true_bool(),
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            due_soon_window_days: default_due_soon_window_days(),
        }
    }

    /// Single-connection in-memory SQLite, for tests and local experiments.
    pub fn in_memory() -> Self {
        let mut cfg = Self::new("sqlite::memory:".to_string(), "test".to_string());
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_true_bool() -> bool {
    true
}

fn default_db_max_connections() -> u32 {
    16
}
fn default_db_min_connections() -> u32 {
    2
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn default_due_soon_window_days() -> u32 {
    DEFAULT_DUE_SOON_WINDOW_DAYS
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level.to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => {
            let mut err = ValidationError::new("log_level");
            err.message = Some("Must be one of: trace, debug, info, warn, error".into());
            Err(err)
        }
    }
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 {
        let mut err = ValidationError::new("event_channel_capacity");
        err.message = Some("event_channel_capacity must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

fn validate_pool_bounds(cfg: &AppConfig) -> Result<(), ValidationError> {
    if cfg.db_min_connections > cfg.db_max_connections {
        let mut err = ValidationError::new("db_min_connections");
        err.message = Some("db_min_connections cannot exceed db_max_connections".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter.
/// `RUST_LOG` takes precedence when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("calibration_engine={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    load_config_from(Path::new(CONFIG_DIR), &run_env)
}

/// Same as [`load_config`] with an explicit config directory and profile.
pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<AppConfig, AppConfigError> {
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("database_url", DEFAULT_DATABASE_URL)?
        .set_default("environment", run_env)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::{Mutex, MutexGuard};
    use tempfile::TempDir;

    // Process environment is shared by every test thread; loaders and
    // mutators of `APP__*` variables take this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load(dir: &Path, run_env: &str) -> Result<AppConfig, AppConfigError> {
        let _guard = env_lock();
        load_config_from(dir, run_env)
    }

    fn config_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    #[test]
    fn defaults_apply_without_any_files() {
        let dir = config_dir(&[]);
        let cfg = load(&dir.path().join("missing"), "development").unwrap();
        assert_eq!(cfg.database_url(), DEFAULT_DATABASE_URL);
        assert_eq!(cfg.log_level(), "info");
        assert!(cfg.is_development());
        assert!(cfg.auto_migrate);
    }

    #[test]
    fn profile_file_overrides_default_file() {
        let dir = config_dir(&[
            (
                "default.toml",
                "database_url = \"postgres://localhost/calibration\"\nlog_level = \"debug\"\ndue_soon_window_days = 45\n",
            ),
            ("production.toml", "log_level = \"warn\"\nlog_json = true\n"),
        ]);
        let cfg = load(dir.path(), "production").unwrap();
        assert_eq!(cfg.database_url(), "postgres://localhost/calibration");
        assert_eq!(cfg.log_level(), "warn");
        assert!(cfg.log_json);
        assert!(cfg.is_production());
        assert_eq!(cfg.due_soon_window_days, 45);
    }

    #[test]
    fn environment_variables_win_over_files() {
        let dir = config_dir(&[("default.toml", "event_channel_capacity = 16\n")]);
        let cfg = {
            let _guard = env_lock();
            env::set_var("APP__EVENT_CHANNEL_CAPACITY", "2048");
            let cfg = load_config_from(dir.path(), "test");
            env::remove_var("APP__EVENT_CHANNEL_CAPACITY");
            cfg
        };
        assert_eq!(cfg.unwrap().event_channel_capacity, 2048);
    }

    #[test]
    fn file_values_hold_when_no_override_is_set() {
        let dir = config_dir(&[("default.toml", "event_channel_capacity = 16
")]);
        let cfg = load(dir.path(), "test").unwrap();
        assert_eq!(cfg.event_channel_capacity, 16);
    }

    #[test]
    fn rejects_unknown_log_level() {
        let dir = config_dir(&[("default.toml", "log_level = \"loud\"\n")]);
        let err = load(dir.path(), "test").unwrap_err();
        assert!(matches!(err, AppConfigError::Validation(_)));
    }

    #[test]
    fn rejects_unknown_keys() {
        let dir = config_dir(&[("default.toml", "jwt_secret = \"nope\"\n")]);
        assert!(matches!(
            load(dir.path(), "test"),
            Err(AppConfigError::Load(_))
        ));
    }

    #[test]
    fn pool_bounds_are_checked() {
        let mut cfg = AppConfig::in_memory();
        assert!(cfg.validate().is_ok());
        cfg.db_min_connections = 5;
        assert!(cfg.validate().is_err());
        cfg.db_max_connections = 5;
        cfg.event_channel_capacity = 0;
        assert!(cfg.validate().is_err());
    }
}
