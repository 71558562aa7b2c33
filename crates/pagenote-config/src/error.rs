use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(pagenote_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(pagenote_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Configuration file already exists")]
    #[diagnostic(
        code(pagenote_config::already_exists),
        help("Remove the existing config file or use a different location")
    )]
    ConfigAlreadyExists,

    #[error("Backend URL or API key is not configured")]
    #[diagnostic(
        code(pagenote_config::missing_backend),
        help("Set [backend] url and api_key in config.toml, or PAGENOTE_BACKEND_URL and PAGENOTE_BACKEND_KEY")
    )]
    MissingBackend,

    #[error("Invalid backend URL: {url}")]
    #[diagnostic(
        code(pagenote_config::invalid_backend_url),
        help("Use an absolute http(s) URL such as https://project.supabase.co")
    )]
    InvalidBackendUrl {
        url: String,
        #[source]
        source: Option<url::ParseError>,
    },

    #[error("Invalid table name: {0:?}")]
    #[diagnostic(code(pagenote_config::invalid_table))]
    InvalidTable(String),

    #[error("Invalid duration: {0}")]
    #[diagnostic(
        code(pagenote_config::invalid_duration),
        help("Use a duration such as 30s, 2m or 1h30m")
    )]
    InvalidDuration(String),

    #[error("IO error: {0}")]
    #[diagnostic(code(pagenote_config::io))]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
