//! Action-tagged request dispatch.
//!
//! Requests arrive as JSON objects carrying an `action` field and are
//! answered with a [`Reply`] whose `status` is `success` or `error`. This is
//! the message surface front ends talk to.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::{
    feedback::{FeedbackDraft, FeedbackEntry},
    service::{ConnectionStatus, FeedbackService},
    summary::{Summarizer, Summary},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    Ping,
    SaveFeedback { feedback: FeedbackDraft },
    GetFeedback { url: String },
    TestConnection,
    GenerateSummary { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub status: Status,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Id of a saved row. `Some(Value::Null)` when the backend returned none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedbacks: Option<Vec<FeedbackEntry>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    pub fn success() -> Self {
        Self {
            status: Status::Success,
            message: None,
            timestamp: None,
            id: None,
            feedbacks: None,
            summary: None,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            error: Some(message.into()),
            ..Self::success()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_feedbacks(mut self, feedbacks: Vec<FeedbackEntry>) -> Self {
        self.feedbacks = Some(feedbacks);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Liveness reply. Needs no backend.
pub fn ping_reply() -> Reply {
    Reply {
        timestamp: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        ..Reply::success().with_message("Extension is active")
    }
}

pub struct Router {
    service: FeedbackService,
    summarizer: Summarizer,
}

impl Router {
    pub fn new(service: FeedbackService, summarizer: Summarizer) -> Self {
        Self {
            service,
            summarizer,
        }
    }

    pub fn service(&self) -> &FeedbackService {
        &self.service
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    /// Parses one JSON request and handles it. Anything that is not a known
    /// action gets an "Unknown action" error reply.
    pub async fn handle_json(&self, input: &str) -> Reply {
        match serde_json::from_str::<Request>(input) {
            Ok(request) => self.handle(request).await,
            Err(err) => {
                warn!("Unknown action received: {}", err);
                Reply::error("Unknown action")
            }
        }
    }

    pub async fn handle(&self, request: Request) -> Reply {
        debug!("Handling request: {:?}", request);
        match request {
            Request::Ping => self.ping(),
            Request::SaveFeedback { feedback } => self.save_feedback(&feedback).await,
            Request::GetFeedback { url } => self.get_feedback(&url).await,
            Request::TestConnection => self.test_connection().await,
            Request::GenerateSummary { url } => self.generate_summary(&url).await,
        }
    }

    pub fn ping(&self) -> Reply {
        ping_reply()
    }

    pub async fn save_feedback(&self, draft: &FeedbackDraft) -> Reply {
        match self.service.save(draft).await {
            Ok(id) => Reply {
                id: Some(id.unwrap_or(Value::Null)),
                ..Reply::success()
            },
            Err(err) => {
                error!("Error saving feedback: {}", err);
                Reply::error(format!("Database error: {}", err.message()))
            }
        }
    }

    pub async fn get_feedback(&self, url: &str) -> Reply {
        match self.service.list(url).await {
            Ok(entries) => Reply::success().with_feedbacks(entries),
            Err(err) => {
                error!("Error getting feedback: {}", err);
                Reply::error(err.message()).with_feedbacks(Vec::new())
            }
        }
    }

    pub async fn test_connection(&self) -> Reply {
        match self.service.check_connection().await {
            Ok(ConnectionStatus::Connected) => {
                Reply::success().with_message("Backend connected successfully")
            }
            Ok(ConnectionStatus::TableMissing) => Reply::success()
                .with_message("Backend connected, but table might not exist yet."),
            Err(err) => {
                error!("Error testing connection: {}", err);
                Reply::error(err.message())
            }
        }
    }

    pub async fn generate_summary(&self, url: &str) -> Reply {
        let entries = match self.service.list(url).await {
            Ok(entries) => entries,
            Err(err) => {
                error!("Error loading feedback for summary: {}", err);
                return Reply::error(err.message());
            }
        };

        if entries.is_empty() {
            return Reply::error("No feedback available");
        }

        let min = self.summarizer.config().min_feedback_count;
        if entries.len() < min {
            return Reply::error(format!(
                "Need at least {} feedback items to generate AI summary (currently {})",
                min,
                entries.len()
            ));
        }

        match self.summarizer.generate(&entries).await {
            Ok(summary) => Reply {
                summary: Some(summary),
                ..Reply::success()
            },
            Err(err) => {
                error!("Failed to generate summary: {}", err);
                Reply::error(err.to_string())
            }
        }
    }
}
