use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::models::Ranking;

/// RankerError
///
/// Failures while classifying an admin review.
#[derive(Debug, thiserror::Error)]
pub enum RankerError {
    #[error("ranking request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("ranking service responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("ranking service returned no answer")]
    EmptyAnswer,
    #[error("answer {0:?} does not name a known ranking")]
    UnknownRanking(String),
    #[error("ranking service unavailable: {0}")]
    Unavailable(String),
}

/// ReviewRanker Contract
///
/// Classifies free-text admin reviews into one of the catalog's ranking names.
/// Production talks to an OpenAI-compatible chat completions endpoint; tests use
/// `MockReviewRanker`.
#[async_trait]
pub trait ReviewRanker: Send + Sync {
    /// Returns the raw ranking name chosen for `review`. Callers map it back to a
    /// `Ranking` with `resolve_ranking`.
    async fn rank(&self, review: &str, rankings: &[Ranking]) -> Result<String, RankerError>;
}

/// RankerState
///
/// The concrete type used to share the ranker across the application state.
pub type RankerState = Arc<dyn ReviewRanker>;

/// build_prompt
///
/// Substitutes the comma-separated ranking names (without `Not_Ranked`) into the
/// `{rankings}` placeholder and appends the review.
pub fn build_prompt(template: &str, rankings: &[Ranking], review: &str) -> String {
    let names = rankings
        .iter()
        .filter(|r| !r.is_not_ranked())
        .map(|r| r.ranking_name.as_str())
        .collect::<Vec<_>>()
        .join(",");

    format!("{} {}", template.replace("{rankings}", &names), review.trim())
}

/// resolve_ranking
///
/// Maps the ranker's answer onto a known ranking. Matching ignores case, surrounding
/// whitespace and trailing punctuation. `Not_Ranked` is never a valid answer.
pub fn resolve_ranking(answer: &str, rankings: &[Ranking]) -> Result<Ranking, RankerError> {
    let cleaned = answer
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .trim();

    rankings
        .iter()
        .filter(|r| !r.is_not_ranked())
        .find(|r| r.ranking_name.eq_ignore_ascii_case(cleaned))
        .cloned()
        .ok_or_else(|| RankerError::UnknownRanking(answer.to_string()))
}

// --- OpenAI-compatible implementation ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// OpenAiReviewRanker
///
/// Sends the classification prompt to `{base_url}/chat/completions` and returns the
/// first choice's content.
#[derive(Clone)]
pub struct OpenAiReviewRanker {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    prompt_template: String,
}

impl OpenAiReviewRanker {
    /// Fails when the HTTP client (TLS backend, 30s timeout) cannot be built.
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        prompt_template: &str,
    ) -> Result<Self, RankerError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            prompt_template: prompt_template.to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ReviewRanker for OpenAiReviewRanker {
    async fn rank(&self, review: &str, rankings: &[Ranking]) -> Result<String, RankerError> {
        if self.api_key.is_empty() {
            return Err(RankerError::Unavailable("OPENAI_API_KEY is not set".to_string()));
        }

        let prompt = build_prompt(&self.prompt_template, rankings, review);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: &prompt }],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RankerError::Status(response.status()));
        }

        let parsed = response.json::<ChatResponse>().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(RankerError::EmptyAnswer)
    }
}

// --- Mock implementation (tests) ---

/// MockReviewRanker
///
/// Answers every review with a fixed ranking name, or fails when `should_fail` is set.
/// Lets the review-update handler be tested without a network dependency.
#[derive(Clone)]
pub struct MockReviewRanker {
    pub answer: String,
    pub should_fail: bool,
}

impl MockReviewRanker {
    pub fn new(answer: &str) -> Self {
        Self { answer: answer.to_string(), should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { answer: String::new(), should_fail: true }
    }
}

#[async_trait]
impl ReviewRanker for MockReviewRanker {
    async fn rank(&self, _review: &str, _rankings: &[Ranking]) -> Result<String, RankerError> {
        if self.should_fail {
            return Err(RankerError::Unavailable("Mock ranker failure".to_string()));
        }
        Ok(self.answer.clone())
    }
}
