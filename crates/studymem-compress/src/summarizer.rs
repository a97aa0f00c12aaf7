//! Natural-language summaries of compressed payloads.
//!
//! The summarizer is the only network-dependent step of a compression run.
//! Callers go through [`summarize_with_fallback`], which bounds every attempt
//! with a timeout and substitutes [`fallback_summary`] when nothing usable
//! comes back.

use crate::fallback::fallback_summary;
use async_trait::async_trait;
use std::time::Duration;
use studymem_core::{Config, Module};
use studymem_learn::CompressedPayload;
use thiserror::Error;
use tracing::{debug, warn};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 300;

/// Entries of each chronic list shown to the summarizer
const PROMPT_TOP_ENTRIES: usize = 5;

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Summarizer timed out after {0:?}")]
    Timeout(Duration),

    #[error("Summarizer returned an empty summary")]
    EmptyResponse,

    #[error("Malformed summarizer response: {0}")]
    Malformed(String),
}

/// Turns a deterministic payload into a short prose summary
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, payload: &CompressedPayload) -> Result<String, SummarizerError>;
}

fn describe(module: Module) -> &'static str {
    match module {
        Module::Reading => "reading comprehension",
        Module::Listening => "listening comprehension",
        Module::Speaking => "speaking and pronunciation",
        Module::Writing => "writing",
        Module::Conversation => "conversation practice",
    }
}

/// Payload trimmed to the top entries of each chronic list
fn prompt_data(payload: &CompressedPayload) -> serde_json::Value {
    let mut data = serde_json::to_value(&payload.patterns).unwrap_or_default();
    if let Some(fields) = data.as_object_mut() {
        fields.remove("module");
        for (name, _) in payload.patterns.chronic_lists() {
            if let Some(list) = fields.get_mut(name).and_then(|v| v.as_array_mut()) {
                list.truncate(PROMPT_TOP_ENTRIES);
            }
        }
    }
    data
}

pub fn build_summary_prompt(payload: &CompressedPayload) -> String {
    let data = serde_json::to_string_pretty(&prompt_data(payload)).unwrap_or_default();
    format!(
        "You are analyzing a student's {} performance across {} sessions.\n\n\
         Recurring patterns:\n{}\n\n\
         Write a brief (2-3 sentence) summary of the student's main weaknesses \
         and what they should practice next. Return only the summary text.",
        describe(payload.module()),
        payload.total_sessions_analyzed,
        data
    )
}

/// Summarizer backed by the Anthropic messages API
pub struct AnthropicSummarizer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl AnthropicSummarizer {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            endpoint: API_URL.to_string(),
        }
    }

    pub fn from_config(api_key: impl Into<String>, config: &Config) -> Self {
        Self::new(api_key, config.summarizer_model.clone())
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Summarizer for AnthropicSummarizer {
    async fn summarize(&self, payload: &CompressedPayload) -> Result<String, SummarizerError> {
        let prompt = build_summary_prompt(payload);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": self.model,
                "max_tokens": MAX_TOKENS,
                "messages": [{"role": "user", "content": prompt}]
            }))
            .send()
            .await?
            .error_for_status()?;

        let body: serde_json::Value = response.json().await?;
        let text = body["content"][0]["text"]
            .as_str()
            .ok_or_else(|| SummarizerError::Malformed(format!("no text content in {}", body)))?
            .trim();

        if text.is_empty() {
            return Err(SummarizerError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

/// Summarize with a per-attempt timeout and bounded retries. Never fails:
/// without a summarizer, or when every attempt fails, the deterministic
/// fallback is returned.
pub async fn summarize_with_fallback(
    summarizer: Option<&dyn Summarizer>,
    payload: &CompressedPayload,
    timeout: Duration,
    max_attempts: u32,
) -> String {
    let Some(summarizer) = summarizer else {
        debug!(module = %payload.module(), "no summarizer configured, using fallback");
        return fallback_summary(payload);
    };

    for attempt in 1..=max_attempts.max(1) {
        let result = match tokio::time::timeout(timeout, summarizer.summarize(payload)).await {
            Ok(result) => result,
            Err(_) => Err(SummarizerError::Timeout(timeout)),
        };
        match result {
            Ok(summary) => return summary,
            Err(e) => warn!(attempt, module = %payload.module(), error = %e, "summarizer failed"),
        }
    }

    fallback_summary(payload)
}
