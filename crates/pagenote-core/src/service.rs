//! Feedback persistence on top of the REST client.

use chrono::{SecondsFormat, Utc};
use pagenote_rest::{Client, ErrorKind, OrderOptions, RestError};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    feedback::{FeedbackDraft, FeedbackEntry, NewFeedback},
    identity::AnonymousId,
};

/// Outcome of a successful connection check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    /// The backend answered but the feedback table is missing.
    TableMissing,
}

pub struct FeedbackService {
    client: Client,
    table: String,
    user_id: AnonymousId,
}

impl FeedbackService {
    pub fn new(client: Client, table: impl Into<String>, user_id: AnonymousId) -> Self {
        Self {
            client,
            table: table.into(),
            user_id,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn user_id(&self) -> &AnonymousId {
        &self.user_id
    }

    /// Stores `draft` stamped with the user id and the current time, and
    /// returns the id the backend assigned, if it sent one back.
    pub async fn save(&self, draft: &FeedbackDraft) -> Result<Option<Value>, RestError> {
        let row = NewFeedback {
            url: &draft.url,
            feedback: &draft.feedback,
            user_id: self.user_id.as_str(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        debug!("Saving feedback for {}", draft.url);

        let rows = self
            .client
            .from(&self.table)
            .insert(&row)
            .await
            .into_result()?;

        let id = rows.first().and_then(|row| row.get("id")).cloned();
        info!("Feedback saved for {}", draft.url);
        Ok(id)
    }

    /// All feedback for `url`, newest first.
    pub async fn list(&self, url: &str) -> Result<Vec<FeedbackEntry>, RestError> {
        let entries: Vec<FeedbackEntry> = self
            .client
            .from(&self.table)
            .select("*")
            .eq("url", url)
            .order("created_at", OrderOptions::descending())
            .execute()
            .await
            .decode()?;

        debug!("Found {} feedback items for {}", entries.len(), url);
        Ok(entries)
    }

    /// Probes the backend with a one-row read.
    pub async fn check_connection(&self) -> Result<ConnectionStatus, RestError> {
        let result = self
            .client
            .from(&self.table)
            .select("id")
            .limit(1)
            .execute()
            .await;

        match result.error {
            None => Ok(ConnectionStatus::Connected),
            Some(err) if err.kind() == ErrorKind::TableNotFound => {
                warn!("Backend reachable but table {} is missing", self.table);
                Ok(ConnectionStatus::TableMissing)
            }
            Some(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pagenote_rest::{testing::MockTransport, Method};

    use super::*;

    fn service(mock: &Arc<MockTransport>) -> FeedbackService {
        let client = Client::with_transport("https://x.test", "k", mock.clone());
        FeedbackService::new(client, "feedback", AnonymousId::from("anon_test"))
    }

    #[tokio::test]
    async fn test_save_posts_stamped_row() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(201, r#"[{"id":12}]"#);

        let draft = FeedbackDraft {
            url: "https://a.com".into(),
            feedback: "Nice".into(),
        };
        let id = service(&mock).save(&draft).await.unwrap();
        assert_eq!(id, Some(serde_json::json!(12)));

        let request = mock.last_request().unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "https://x.test/rest/v1/feedback");

        let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        let row = &body[0];
        assert_eq!(row["url"], "https://a.com");
        assert_eq!(row["feedback"], "Nice");
        assert_eq!(row["user_id"], "anon_test");
        assert!(row["created_at"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_save_without_returned_rows() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(201, "[]");

        let draft = FeedbackDraft {
            url: "u".into(),
            feedback: "f".into(),
        };
        assert_eq!(service(&mock).save(&draft).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_error_propagates() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(400, "null value in column \"feedback\"");

        let draft = FeedbackDraft {
            url: "u".into(),
            feedback: String::new(),
        };
        let err = service(&mock).save(&draft).await.unwrap_err();
        assert!(err.message().contains("400"));
    }

    #[tokio::test]
    async fn test_list_queries_newest_first() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            200,
            r#"[{"id":2,"feedback":"b","created_at":"2024-01-02"},{"id":1,"feedback":"a","created_at":"2024-01-01"}]"#,
        );

        let entries = service(&mock).list("https://a.com").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].feedback.as_deref(), Some("b"));

        assert_eq!(
            mock.last_request().unwrap().url,
            "https://x.test/rest/v1/feedback?select=*&url=eq.https%3A%2F%2Fa.com&order=created_at.desc"
        );
    }

    #[tokio::test]
    async fn test_check_connection_wrong_column_is_an_error() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            400,
            r#"{"code":"42703","message":"column feedback.id does not exist"}"#,
        );

        let err = service(&mock).check_connection().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Http);
    }

    #[tokio::test]
    async fn test_check_connection() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(200, "[]");
        mock.respond(404, r#"{"code":"42P01","message":"relation does not exist"}"#);
        mock.respond(401, "Invalid API key");

        let service = service(&mock);
        assert_eq!(
            service.check_connection().await.unwrap(),
            ConnectionStatus::Connected
        );
        assert_eq!(
            service.check_connection().await.unwrap(),
            ConnectionStatus::TableMissing
        );
        assert!(service.check_connection().await.is_err());

        assert_eq!(
            mock.requests()[0].url,
            "https://x.test/rest/v1/feedback?select=id&limit=1"
        );
    }
}
