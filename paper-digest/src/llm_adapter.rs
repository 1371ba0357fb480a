use crate::types::{AggregatorError, PaperRecord, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_API_BASE: &str = "https://api.deepseek.com";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

const SYSTEM_PROMPT: &str = "You are a research assistant for the earth sciences.\n\
Write a Markdown daily digest from the list of papers below.\n\
Requirements:\n\
1. Summarize the overall trends in 6-8 points.\n\
2. Group the papers by topic in a table: Topic | Representative papers | Notes.\n\
3. Give each paper a one-sentence core contribution.\n\
4. Output clean Markdown and keep all three parts.\n\
5. Do not repeat the raw list of entries.";

/// What the summarizer is asked to describe: the report date and the
/// (title, source) pair of every new paper, in digest order.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    pub date: NaiveDate,
    pub items: Vec<(String, String)>,
}

impl SummaryRequest {
    pub fn from_records(date: NaiveDate, records: &[PaperRecord]) -> Self {
        Self {
            date,
            items: records
                .iter()
                .map(|r| (r.title.clone(), r.source.clone()))
                .collect(),
        }
    }

    pub fn user_prompt(&self) -> String {
        let papers = self
            .items
            .iter()
            .map(|(title, source)| format!("{} ({})", title, source))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Date: {}\nNew papers:\n{}", self.date.format("%Y-%m-%d"), papers)
    }
}

/// Failures of a summarization call. None of these abort a run.
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("unreadable response: {0}")]
    Decode(String),

    #[error("service returned no text")]
    EmptyResponse,

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// Trait for text-generation backends that write the digest narrative
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Get the name of this adapter
    fn adapter_name(&self) -> String;

    /// Produce a narrative for the given papers
    async fn summarize(&self, request: &SummaryRequest) -> std::result::Result<String, SummaryError>;
}

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_seconds: 120,
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat-completions endpoint
pub struct ChatCompletionClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl ChatCompletionClient {
    /// Build a client. A missing API key is a configuration error.
    pub fn new(config: &SummarizerConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AggregatorError::Config(format!(
                    "{} must be set to generate a digest narrative",
                    API_KEY_ENV
                ))
            })?;

        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            timeout,
        })
    }

    async fn call(&self, request: &SummaryRequest) -> std::result::Result<String, SummaryError> {
        let user_prompt = request.user_prompt();
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            stream: false,
        };

        debug!("Posting {} papers to {}", request.items.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummaryError::Status {
                code: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummaryError::Decode(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(SummaryError::EmptyResponse)
    }
}

#[async_trait]
impl Summarizer for ChatCompletionClient {
    fn adapter_name(&self) -> String {
        format!("Chat completions ({})", self.model)
    }

    async fn summarize(&self, request: &SummaryRequest) -> std::result::Result<String, SummaryError> {
        info!("Requesting narrative for {} papers from {}", request.items.len(), self.model);

        match tokio::time::timeout(self.timeout, self.call(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Summarization timed out after {:?}", self.timeout);
                Err(SummaryError::Timeout(self.timeout))
            }
        }
    }
}

/// Mock summarizer for development and testing
pub struct MockSummarizer {
    name: String,
    response: std::result::Result<String, String>,
    requests: Mutex<Vec<SummaryRequest>>,
}

impl MockSummarizer {
    /// A mock that answers every request with `text`
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            name: "mock".to_string(),
            response: Ok(text.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A mock whose every call fails with a decode error carrying `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            name: "failing mock".to_string(),
            response: Err(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<SummaryRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    fn adapter_name(&self) -> String {
        format!("Mock Summarizer ({})", self.name)
    }

    async fn summarize(&self, request: &SummaryRequest) -> std::result::Result<String, SummaryError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(SummaryError::Decode(message.clone())),
        }
    }
}
