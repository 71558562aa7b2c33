//! Error types for pagenote-core.

use miette::Diagnostic;
use pagenote_config::error::ConfigError;
use pagenote_rest::RestError;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum PagenoteError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Rest(#[from] RestError),

    #[error("Error while {action}")]
    #[diagnostic(code(pagenote::io), help("Check file permissions and disk space"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(pagenote::json))]
    Json(#[from] serde_json::Error),

    #[error("Gemini API key not configured")]
    #[diagnostic(
        code(pagenote::ai_not_configured),
        help("Set [ai] api_key in config.toml or PAGENOTE_AI_KEY")
    )]
    AiNotConfigured,

    #[error("Gemini API error: {0}")]
    #[diagnostic(code(pagenote::ai_request))]
    AiRequest(String),

    #[error("{0}")]
    #[diagnostic(code(pagenote::error))]
    Custom(String),
}

/// Trait for adding context to IO errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, PagenoteError>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, PagenoteError>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            PagenoteError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
