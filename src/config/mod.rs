use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub api: ApiConfig,
    pub store: StoreConfig,
    pub log: LogConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("environment", "development")?
            .set_default("api.base_url", "http://localhost:8000")?
            .set_default("api.timeout_secs", 30)?
            .set_default("store.path", ".todo/session.json")?
            .set_default("log.level", "info")?
            // Optional config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // E.g., `APP_API__BASE_URL=https://todo.example.com` sets `Settings.api.base_url`
            .add_source(
                Environment::with_prefix("app")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Settings for tests: no config files, only defaults plus `APP_` overrides.
    pub fn new_for_test() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("environment", "test")?
            .set_default("api.base_url", "http://127.0.0.1:8000")?
            .set_default("api.timeout_secs", 5)?
            .set_default("store.path", "target/test-session.json")?
            .set_default("log.level", "debug")?
            .add_source(
                Environment::with_prefix("app")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Same as [`Settings::new_for_test`] but pointed at another API, e.g. a mock server.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let mut settings = Self::new_for_test()?;
        settings.api.base_url = base_url.to_string();
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn cleanup_env() {
        env::remove_var("APP_API__BASE_URL");
        env::remove_var("APP_API__TIMEOUT_SECS");
        env::remove_var("APP_STORE__PATH");
        env::remove_var("APP_LOG__LEVEL");
    }

    fn builder_with_test_defaults() -> config::ConfigBuilder<config::builder::DefaultState> {
        Config::builder()
            .set_default("environment", "test")
            .unwrap()
            .set_default("api.base_url", "http://127.0.0.1:8000")
            .unwrap()
            .set_default("api.timeout_secs", 5)
            .unwrap()
            .set_default("store.path", "target/test-session.json")
            .unwrap()
            .set_default("log.level", "debug")
            .unwrap()
    }

    #[test]
    fn test_settings_defaults() {
        cleanup_env();
        let settings = Settings::new_for_test().expect("Failed to load settings");
        assert_eq!(settings.environment, "test");
        assert_eq!(settings.api.base_url, "http://127.0.0.1:8000");
        assert_eq!(settings.api.timeout(), Duration::from_secs(5));
        assert_eq!(settings.store.path, PathBuf::from("target/test-session.json"));
        assert_eq!(settings.log.level, "debug");
    }

    #[test]
    fn test_for_base_url() {
        let settings = Settings::for_base_url("http://10.0.0.1:9999").unwrap();
        assert_eq!(settings.api.base_url, "http://10.0.0.1:9999");
    }

    #[test]
    fn test_source_override() {
        let settings: Settings = builder_with_test_defaults()
            .set_override("api.base_url", "https://todo.example.com")
            .unwrap()
            .set_override("api.timeout_secs", 60)
            .unwrap()
            .build()
            .expect("Failed to build config")
            .try_deserialize()
            .expect("Failed to deserialize settings");

        assert_eq!(settings.api.base_url, "https://todo.example.com");
        assert_eq!(settings.api.timeout_secs, 60);
        assert_eq!(settings.log.level, "debug");
    }

    #[test]
    fn test_invalid_timeout() {
        let result = builder_with_test_defaults()
            .set_override("api.timeout_secs", "soon")
            .unwrap()
            .build()
            .and_then(|config| config.try_deserialize::<Settings>());

        assert!(result.is_err(), "Expected error for invalid timeout");
    }
}
