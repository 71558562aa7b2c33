//! Error types for pagenote-rest.

use miette::Diagnostic;
use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Postgres `undefined_table` and PostgREST's schema-cache miss.
const MISSING_TABLE_CODES: [&str; 2] = ["42P01", "PGRST205"];

/// The part of a PostgREST error body we classify on.
#[derive(Deserialize)]
struct ErrorBody {
    code: Option<String>,
}

/// Whether `body` reports a missing relation.
///
/// JSON bodies are judged by their `code` only. Plain-text bodies (from a
/// proxy or an older server) must name a relation, so "column ... does not
/// exist" stays an ordinary HTTP error.
fn is_missing_table(body: &str) -> bool {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed
            .code
            .as_deref()
            .is_some_and(|code| MISSING_TABLE_CODES.contains(&code)),
        Err(_) => body.contains("relation \"") && body.contains("does not exist"),
    }
}

/// Failure of a terminal query action.
///
/// Every failure mode of the wire layer is folded into one of these variants,
/// so callers can branch on [`RestError::kind`] instead of matching on message
/// text.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum RestError {
    #[error("{0}")]
    #[diagnostic(
        code(pagenote_rest::network),
        help("Check your internet connection and the backend URL")
    )]
    Network(String),

    #[error("{status} {body}")]
    #[diagnostic(code(pagenote_rest::http))]
    Http { status: u16, body: String },

    #[error("{status} {body}")]
    #[diagnostic(
        code(pagenote_rest::table_not_found),
        help("Create the `{}` table on the backend before using it", .table)
    )]
    TableNotFound {
        table: String,
        status: u16,
        body: String,
    },

    #[error("Invalid JSON response: {0}")]
    #[diagnostic(code(pagenote_rest::parse))]
    Parse(String),

    #[error("Failed to encode request body: {0}")]
    #[diagnostic(code(pagenote_rest::serialize))]
    Serialize(String),
}

/// Coarse classification of a [`RestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Http,
    TableNotFound,
    Parse,
    Serialize,
}

impl RestError {
    /// Classifies a non-2xx response for `table`.
    pub fn from_status(status: u16, body: impl Into<String>, table: &str) -> Self {
        let body = body.into();
        if is_missing_table(&body) {
            Self::TableNotFound {
                table: table.to_string(),
                status,
                body,
            }
        } else {
            Self::Http {
                status,
                body,
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Http { .. } => ErrorKind::Http,
            Self::TableNotFound { .. } => ErrorKind::TableNotFound,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Serialize(_) => ErrorKind::Serialize,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::TableNotFound { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl Serialize for RestError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RestError", 3)?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("message", &self.message())?;
        state.serialize_field("status", &self.status())?;
        state.end()
    }
}

impl From<ureq::Error> for RestError {
    fn from(err: ureq::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for RestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_has_status_and_body() {
        let err = RestError::from_status(400, r#"{"message":"bad"}"#, "feedback");
        assert_eq!(err.kind(), ErrorKind::Http);
        assert_eq!(err.message(), r#"400 {"message":"bad"}"#);
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_missing_relation_is_table_not_found() {
        let body = r#"{"code":"42P01","message":"relation \"public.feedback\" does not exist"}"#;
        let err = RestError::from_status(404, body, "feedback");
        assert_eq!(err.kind(), ErrorKind::TableNotFound);
        assert!(err.message().starts_with("404 "));

        let err = RestError::from_status(404, r#"{"code":"PGRST205"}"#, "notes");
        match err {
            RestError::TableNotFound {
                table, ..
            } => assert_eq!(table, "notes"),
            other => panic!("expected TableNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_column_stays_http() {
        let body = r#"{"code":"42703","details":null,"hint":null,"message":"column feedback.foo does not exist"}"#;
        let err = RestError::from_status(400, body, "feedback");
        assert_eq!(err.kind(), ErrorKind::Http);

        let err = RestError::from_status(400, "column \"foo\" does not exist", "feedback");
        assert_eq!(err.kind(), ErrorKind::Http);
    }

    #[test]
    fn test_plain_text_missing_relation() {
        let err = RestError::from_status(
            404,
            "ERROR: relation \"public.feedback\" does not exist",
            "feedback",
        );
        assert_eq!(err.kind(), ErrorKind::TableNotFound);
    }

    #[test]
    fn test_serialize_through_json_value() {
        let value = serde_json::to_value(RestError::from_status(404, r#"{"code":"42P01"}"#, "t"))
            .unwrap();
        assert_eq!(value["kind"], "table_not_found");
        assert_eq!(value["status"], 404);
    }

    #[test]
    fn test_plain_404_stays_http() {
        let err = RestError::from_status(404, "Not Found", "feedback");
        assert_eq!(err.kind(), ErrorKind::Http);
    }

    #[test]
    fn test_network_error_has_no_status() {
        let err = RestError::Network("connection refused".into());
        assert_eq!(err.status(), None);
        assert_eq!(err.message(), "connection refused");
    }

    #[test]
    fn test_serialize_shape() {
        let err = RestError::Http {
            status: 500,
            body: "boom".into(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "http");
        assert_eq!(json["message"], "500 boom");
        assert_eq!(json["status"], 500);

        let json = serde_json::to_value(RestError::Parse("eof".into())).unwrap();
        assert_eq!(json["kind"], "parse");
        assert!(json["status"].is_null());
    }

    #[test]
    fn test_from_ureq_error() {
        let err: RestError = ureq::Error::ConnectionFailed.into();
        assert_eq!(err.kind(), ErrorKind::Network);
    }
}
