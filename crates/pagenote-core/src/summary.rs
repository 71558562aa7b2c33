//! AI summaries of a page's feedback.
//!
//! The [`Summarizer`] asks Gemini for a short summary and a positive/negative
//! split. When the API call fails or its answer is not the JSON we asked for,
//! it falls back to a keyword count so callers always get a [`Summary`].

use std::sync::Arc;

use pagenote_config::config::Config;
use pagenote_rest::{query::clause::encode_component, HttpRequest, RestError, Transport};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::{error::PagenoteError, feedback::FeedbackEntry, PagenoteResult};

const POSITIVE_KEYWORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "love",
    "like",
    "awesome",
    "perfect",
    "amazing",
    "nice",
    "fantastic",
    "learn new things",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "bad", "terrible", "hate", "dislike", "awful", "horrible", "worst", "annoying",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentiment {
    pub positive: u64,
    pub negative: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryDetails {
    pub positive_points: Vec<String>,
    pub negative_points: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
    pub sentiment: Sentiment,
    pub details: SummaryDetails,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizerConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub base_url: String,
    pub min_feedback_count: usize,
}

impl SummarizerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            enabled: config.ai_enabled(),
            api_key: config.ai_api_key(),
            base_url: config.ai_base_url().to_string(),
            min_feedback_count: config.min_feedback_count(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }
}

// Shape the prompt asks the model to answer in. Everything is optional so a
// partial answer still produces a summary.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Analysis {
    summary: Option<String>,
    positive_feedback: Vec<String>,
    negative_feedback: Vec<String>,
    sentiment_counts: Option<SentimentCounts>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SentimentCounts {
    positive: u64,
    negative: u64,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: String,
}

pub struct Summarizer {
    transport: Arc<dyn Transport>,
    config: SummarizerConfig,
}

impl Summarizer {
    pub fn new(transport: Arc<dyn Transport>, config: SummarizerConfig) -> Self {
        Self {
            transport,
            config,
        }
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    /// Whether `count` feedback items are enough to offer a summary.
    pub fn summary_available(&self, count: usize) -> bool {
        self.config.is_configured() && count >= self.config.min_feedback_count
    }

    pub async fn generate(&self, feedbacks: &[FeedbackEntry]) -> PagenoteResult<Summary> {
        if !self.config.is_configured() {
            return Err(PagenoteError::AiNotConfigured);
        }

        if feedbacks.is_empty() {
            return Ok(Summary {
                summary: "No feedback available to analyze.".to_string(),
                ..Default::default()
            });
        }

        let prompt = analysis_prompt(feedbacks);
        let text = match self.call_api(prompt).await {
            Ok(text) => text,
            Err(err) => {
                warn!("AI summary generation failed: {}", err);
                return Ok(fallback_summary(feedbacks));
            }
        };

        match parse_analysis(&text, feedbacks.len() as u64) {
            Some(summary) => Ok(summary),
            None => {
                warn!("Failed to parse AI response, using keyword analysis");
                Ok(fallback_summary(feedbacks))
            }
        }
    }

    async fn call_api(&self, prompt: String) -> PagenoteResult<String> {
        let key = self.config.api_key.as_deref().unwrap_or_default();
        let url = format!("{}?key={}", self.config.base_url, encode_component(key));
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] }).to_string();
        let request = HttpRequest::post(
            url,
            vec![("Content-Type".to_string(), "application/json".to_string())],
            body,
        );

        debug!("Requesting AI summary from {}", self.config.base_url);
        let transport = Arc::clone(&self.transport);
        let response = tokio::task::spawn_blocking(move || transport.send(&request))
            .await
            .map_err(|err| RestError::Network(err.to_string()))??;

        if !response.is_success() {
            return Err(PagenoteError::AiRequest(format!(
                "{} {}",
                response.status, response.body
            )));
        }

        let parsed: GenerateResponse = serde_json::from_str(&response.body)?;
        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| {
                PagenoteError::AiRequest("Invalid response format from Gemini API".to_string())
            })
    }
}

pub fn analysis_prompt(feedbacks: &[FeedbackEntry]) -> String {
    let items = feedbacks
        .iter()
        .enumerate()
        .map(|(idx, entry)| format!("{}. {}", idx + 1, entry.content().unwrap_or("No content")))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze the following user feedback and provide:
1. A concise summary (2-3 sentences)
2. Sentiment analysis categorizing each feedback as positive or negative

Feedback to analyze:
{items}

Respond in this exact JSON format:
{{
  "summary": "Brief summary of the feedback",
  "positive_feedback": ["List positive feedback points"],
  "negative_feedback": ["List negative feedback points"],
  "sentiment_counts": {{
    "positive": number,
    "negative": number
  }}
}}"#
    )
}

fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

fn parse_analysis(text: &str, total: u64) -> Option<Summary> {
    let analysis: Analysis = serde_json::from_str(strip_fences(text)).ok()?;
    let counts = analysis.sentiment_counts.unwrap_or_default();

    Some(Summary {
        summary: analysis
            .summary
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Analysis completed".to_string()),
        sentiment: Sentiment {
            positive: counts.positive,
            negative: counts.negative,
            total,
        },
        details: SummaryDetails {
            positive_points: analysis.positive_feedback,
            negative_points: analysis.negative_feedback,
        },
    })
}

/// Keyword-based sentiment split. An item counts only when it hits one side.
pub fn fallback_summary(feedbacks: &[FeedbackEntry]) -> Summary {
    let mut sentiment = Sentiment {
        total: feedbacks.len() as u64,
        ..Default::default()
    };

    for entry in feedbacks {
        let text = entry.content().unwrap_or_default().to_lowercase();
        let positive = POSITIVE_KEYWORDS.iter().any(|kw| text.contains(kw));
        let negative = NEGATIVE_KEYWORDS.iter().any(|kw| text.contains(kw));

        match (positive, negative) {
            (true, false) => sentiment.positive += 1,
            (false, true) => sentiment.negative += 1,
            _ => {}
        }
    }

    Summary {
        summary: format!(
            "Analyzed {} feedback items. Basic sentiment analysis completed.",
            sentiment.total
        ),
        sentiment,
        details: SummaryDetails::default(),
    }
}
