use std::{
    fs,
    path::{Path, PathBuf},
    sync::{LazyLock, RwLock},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{ConfigError, Result},
    utils::{parse_duration, xdg_config_home, xdg_data_home},
};

pub const DEFAULT_TABLE: &str = "feedback";
pub const DEFAULT_AI_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";
pub const DEFAULT_MIN_FEEDBACK_COUNT: usize = 3;
pub const DEFAULT_USER_AGENT: &str = "pagenote";

/// Application's configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Remote feedback store.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Generative-language summarizer.
    #[serde(default)]
    pub ai: AiConfig,

    /// Outgoing HTTP settings shared by the backend and AI clients.
    #[serde(default)]
    pub http: HttpConfig,

    /// Where the anonymous user id is kept.
    /// Default: $XDG_DATA_HOME/pagenote/state.json
    pub state_path: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Project URL, e.g. https://project.supabase.co
    pub url: Option<String>,

    /// Anon API key, sent as both `apikey` and bearer token.
    pub api_key: Option<String>,

    /// Table holding feedback rows.
    /// Default: feedback
    pub table: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AiConfig {
    /// Default: true
    pub enabled: Option<bool>,

    pub api_key: Option<String>,

    /// generateContent endpoint of the model.
    pub base_url: Option<String>,

    /// Minimum number of feedback items before a summary is offered.
    /// Default: 3
    pub min_feedback_count: Option<usize>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Default: pagenote
    pub user_agent: Option<String>,

    /// Request timeout such as "30s". No timeout when unset.
    pub timeout: Option<String>,

    pub proxy: Option<String>,
}

/// Backend connection parameters after env overrides and validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Backend {
    pub url: String,
    pub api_key: String,
    pub table: String,
}

pub static CONFIG: LazyLock<RwLock<Option<Config>>> = LazyLock::new(|| RwLock::new(None));

pub static CONFIG_PATH: LazyLock<RwLock<PathBuf>> = LazyLock::new(|| {
    RwLock::new(match std::env::var("PAGENOTE_CONFIG") {
        Ok(path_str) => PathBuf::from(path_str),
        Err(_) => xdg_config_home().join("pagenote").join("config.toml"),
    })
});

pub fn init() -> Result<()> {
    let config = Config::new()?;
    let mut global_config = CONFIG.write().unwrap();
    *global_config = Some(config);
    Ok(())
}

pub fn get_config() -> Config {
    let mut config_guard = CONFIG.write().unwrap();
    config_guard
        .get_or_insert_with(Config::default_config)
        .clone()
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            backend: BackendConfig {
                url: Some(String::new()),
                api_key: Some(String::new()),
                table: Some(DEFAULT_TABLE.to_string()),
            },
            ai: AiConfig {
                enabled: Some(true),
                api_key: Some(String::new()),
                base_url: Some(DEFAULT_AI_BASE_URL.to_string()),
                min_feedback_count: Some(DEFAULT_MIN_FEEDBACK_COUNT),
            },
            http: HttpConfig {
                user_agent: Some(DEFAULT_USER_AGENT.to_string()),
                timeout: None,
                proxy: None,
            },
            state_path: None,
        }
    }

    /// Loads the configuration from [`CONFIG_PATH`], or the default one if the
    /// file does not exist.
    pub fn new() -> Result<Self> {
        let config_path = CONFIG_PATH.read().unwrap().to_path_buf();
        Self::from_path(&config_path)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                Self::default_config()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve()?;

        Ok(config)
    }

    /// Fills unset options with defaults and validates the rest.
    pub fn resolve(&mut self) -> Result<()> {
        let table = self
            .backend
            .table
            .get_or_insert_with(|| DEFAULT_TABLE.to_string());
        if table.trim().is_empty() || table.contains(['/', '?', '&']) {
            return Err(ConfigError::InvalidTable(table.clone()));
        }

        if let Some(url) = self.backend.url.as_deref().filter(|u| !u.is_empty()) {
            validate_url(url)?;
        }

        if let Some(timeout) = &self.http.timeout {
            if parse_duration(timeout).is_none() {
                return Err(ConfigError::InvalidDuration(timeout.clone()));
            }
        }

        self.ai.enabled.get_or_insert(true);
        self.ai
            .base_url
            .get_or_insert_with(|| DEFAULT_AI_BASE_URL.to_string());
        self.ai
            .min_feedback_count
            .get_or_insert(DEFAULT_MIN_FEEDBACK_COUNT);
        self.http
            .user_agent
            .get_or_insert_with(|| DEFAULT_USER_AGENT.to_string());

        Ok(())
    }

    /// Backend parameters, with `PAGENOTE_BACKEND_URL` and
    /// `PAGENOTE_BACKEND_KEY` taking precedence over the file.
    pub fn backend(&self) -> Result<Backend> {
        let url = std::env::var("PAGENOTE_BACKEND_URL")
            .ok()
            .or_else(|| self.backend.url.clone())
            .unwrap_or_default();
        let api_key = std::env::var("PAGENOTE_BACKEND_KEY")
            .ok()
            .or_else(|| self.backend.api_key.clone())
            .unwrap_or_default();

        if url.trim().is_empty() || api_key.trim().is_empty() {
            return Err(ConfigError::MissingBackend);
        }
        validate_url(&url)?;

        Ok(Backend {
            url,
            api_key,
            table: self.table().to_string(),
        })
    }

    pub fn table(&self) -> &str {
        self.backend.table.as_deref().unwrap_or(DEFAULT_TABLE)
    }

    /// Summarizer key, with `PAGENOTE_AI_KEY` taking precedence.
    pub fn ai_api_key(&self) -> Option<String> {
        std::env::var("PAGENOTE_AI_KEY")
            .ok()
            .or_else(|| self.ai.api_key.clone())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn ai_enabled(&self) -> bool {
        self.ai.enabled.unwrap_or(true)
    }

    pub fn ai_base_url(&self) -> &str {
        self.ai.base_url.as_deref().unwrap_or(DEFAULT_AI_BASE_URL)
    }

    pub fn min_feedback_count(&self) -> usize {
        self.ai
            .min_feedback_count
            .unwrap_or(DEFAULT_MIN_FEEDBACK_COUNT)
    }

    pub fn http_timeout(&self) -> Result<Option<Duration>> {
        self.http
            .timeout
            .as_deref()
            .map(|t| parse_duration(t).ok_or_else(|| ConfigError::InvalidDuration(t.to_string())))
            .transpose()
    }

    pub fn user_agent(&self) -> &str {
        self.http.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn get_state_path(&self) -> PathBuf {
        if let Ok(env_path) = std::env::var("PAGENOTE_STATE") {
            return PathBuf::from(env_path);
        }
        if let Some(state_path) = &self.state_path {
            return PathBuf::from(state_path);
        }
        xdg_data_home().join("pagenote").join("state.json")
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn validate_url(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url).map_err(|err| {
        ConfigError::InvalidBackendUrl {
            url: url.to_string(),
            source: Some(err),
        }
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBackendUrl {
            url: url.to_string(),
            source: None,
        });
    }
    Ok(())
}

pub fn generate_default_config() -> Result<()> {
    let config_path = CONFIG_PATH.read().unwrap().to_path_buf();
    write_default_config(&config_path)
}

pub fn write_default_config(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        return Err(ConfigError::ConfigAlreadyExists);
    }

    let content = Config::default_config().to_toml()?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(config_path, content)?;
    info!(
        "Default configuration file generated at: {}",
        config_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use tempfile::tempdir;

    use super::*;
    use crate::test_utils::{with_env, without_env};

    const BACKEND_VARS: [&str; 2] = ["PAGENOTE_BACKEND_URL", "PAGENOTE_BACKEND_KEY"];

    fn configured() -> Config {
        let mut config = Config::default_config();
        config.backend.url = Some("https://x.test".to_string());
        config.backend.api_key = Some("k".to_string());
        config
    }

    #[test]
    fn test_default_config_creation() {
        let config = Config::default_config();

        assert_eq!(config.table(), "feedback");
        assert!(config.ai_enabled());
        assert_eq!(config.min_feedback_count(), 3);
        assert_eq!(config.ai_base_url(), DEFAULT_AI_BASE_URL);
        assert_eq!(config.user_agent(), "pagenote");
        assert_eq!(config.http_timeout().unwrap(), None);
    }

    #[test]
    fn test_resolve_fills_defaults() {
        let mut config: Config = toml::from_str("[backend]\nurl = \"https://x.test\"\n").unwrap();
        config.resolve().unwrap();

        assert_eq!(config.backend.table.as_deref(), Some("feedback"));
        assert_eq!(config.ai.enabled, Some(true));
        assert_eq!(config.ai.min_feedback_count, Some(3));
        assert_eq!(config.http.user_agent.as_deref(), Some("pagenote"));
    }

    #[test]
    fn test_resolve_rejects_bad_url() {
        let mut config = Config::default_config();
        config.backend.url = Some("not a url".to_string());
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidBackendUrl { .. })
        ));

        config.backend.url = Some("ftp://x.test".to_string());
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidBackendUrl { .. })
        ));
    }

    #[test]
    fn test_resolve_rejects_bad_table_and_timeout() {
        let mut config = Config::default_config();
        config.backend.table = Some("a/b".to_string());
        assert!(matches!(config.resolve(), Err(ConfigError::InvalidTable(_))));

        let mut config = Config::default_config();
        config.http.timeout = Some("soon".to_string());
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_http_timeout() {
        let mut config = Config::default_config();
        config.http.timeout = Some("45s".to_string());
        assert_eq!(
            config.http_timeout().unwrap(),
            Some(Duration::from_secs(45))
        );
    }

    #[test]
    #[serial]
    fn test_backend_requires_url_and_key() {
        without_env(&BACKEND_VARS, || {
            let config = Config::default_config();
            assert!(matches!(config.backend(), Err(ConfigError::MissingBackend)));

            let backend = configured().backend().unwrap();
            assert_eq!(
                backend,
                Backend {
                    url: "https://x.test".to_string(),
                    api_key: "k".to_string(),
                    table: "feedback".to_string(),
                }
            );
        });
    }

    #[test]
    #[serial]
    fn test_backend_env_override() {
        with_env(
            vec![
                ("PAGENOTE_BACKEND_URL", "https://env.test/"),
                ("PAGENOTE_BACKEND_KEY", "env-key"),
            ],
            || {
                let backend = configured().backend().unwrap();
                assert_eq!(backend.url, "https://env.test/");
                assert_eq!(backend.api_key, "env-key");
            },
        );
    }

    #[test]
    #[serial]
    fn test_ai_key_blank_is_none() {
        without_env(&["PAGENOTE_AI_KEY"], || {
            let mut config = Config::default_config();
            assert_eq!(config.ai_api_key(), None);

            config.ai.api_key = Some("  ".to_string());
            assert_eq!(config.ai_api_key(), None);

            config.ai.api_key = Some("g-key".to_string());
            assert_eq!(config.ai_api_key().as_deref(), Some("g-key"));
        });
    }

    #[test]
    #[serial]
    fn test_state_path_precedence() {
        without_env(&["PAGENOTE_STATE"], || {
            let mut config = Config::default_config();
            config.state_path = Some("/tmp/state.json".to_string());
            assert_eq!(config.get_state_path(), PathBuf::from("/tmp/state.json"));
        });

        with_env(vec![("PAGENOTE_STATE", "/custom/state.json")], || {
            let config = Config::default_config();
            assert_eq!(
                config.get_state_path(),
                PathBuf::from("/custom/state.json")
            );
        });
    }

    #[test]
    fn test_from_path_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::from_path(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.table(), "feedback");
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[backend]\nurl = \"https://x.test\"\napi_key = \"k\"\ntable = \"notes\"\n\n[ai]\nmin_feedback_count = 5\n",
        )
        .unwrap();

        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.table(), "notes");
        assert_eq!(config.min_feedback_count(), 5);
    }

    #[test]
    fn test_write_default_config_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        write_default_config(&path).unwrap();
        assert!(path.exists());

        let written = Config::from_path(&path).unwrap();
        assert_eq!(written.table(), "feedback");

        assert!(matches!(
            write_default_config(&path),
            Err(ConfigError::ConfigAlreadyExists)
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = configured();
        let serialized = config.to_toml().unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.backend.url.as_deref(), Some("https://x.test"));
    }
}
