//! Translation orchestration: prompt, request, reply decoding, validation.

pub mod payload;
pub mod profile;
pub mod prompt;
pub mod validator;

use crate::archive::resource::LangMap;
use crate::config::Config;
use crate::error::TranslationError;
use crate::rate_limit::RateLimiter;
use crate::retry::{with_retry_if, RetryConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

pub use payload::{decode_reply, extract_payload, parse_payload, validate_keys};
pub use profile::{StyleExample, StyleProfile};
pub use validator::{TranslationValidator, ValidationReport};

/// Outcome of one translation: a mapping with exactly the source keys, or why not.
pub type TranslationResult = std::result::Result<LangMap, TranslationError>;

/// OpenAI Chat Completion request for translation
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
}

/// Check if a model is a reasoning model that doesn't support temperature
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Transport failure, tagged with whether another attempt could help.
#[derive(Debug)]
struct CallError {
    message: String,
    retryable: bool,
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Sends language mappings to the translation service, one request at a time.
pub struct Translator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    retry: RetryConfig,
    limiter: RateLimiter,
}

impl Translator {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.api_key()?.to_string();
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let retry = if config.max_attempts > 1 {
            RetryConfig::translation(config.max_attempts)
        } else {
            RetryConfig::single_attempt()
        };

        Ok(Self {
            client,
            api_url: config.openai_api_url.clone(),
            api_key,
            model: config.openai_model.clone(),
            temperature: config.openai_temperature,
            max_tokens: config.max_tokens,
            retry,
            limiter: RateLimiter::new(config.rate_limit),
        })
    }

    /// Override the transport retry policy (tests use short delays)
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Translate one mapping.
    ///
    /// Waits for the rate limiter first, whatever happened on the previous
    /// call. Every failure comes back as a [`TranslationError`].
    pub async fn translate(&self, source: &LangMap, profile: &StyleProfile) -> TranslationResult {
        self.limiter.wait().await;

        let request = self.build_request(source, profile)?;
        let reply = self.send(&request).await?;

        let translated = decode_reply(&reply)?;
        validate_keys(source, &translated)?;

        let report = TranslationValidator::validate(source, &translated);
        if report.unchanged > 0 || report.emptied > 0 {
            debug!(
                "{} values unchanged, {} emptied by translation",
                report.unchanged, report.emptied
            );
        }
        if !report.is_clean() {
            warn!("Translation validation warnings: {:?}", report.warnings);
        }

        Ok(translated)
    }

    fn build_request(
        &self,
        source: &LangMap,
        profile: &StyleProfile,
    ) -> std::result::Result<ChatRequest, TranslationError> {
        let user_prompt = prompt::build_translation_user_prompt(source, profile)
            .map_err(|e| TranslationError::Request(e.to_string()))?;

        // Reasoning models don't support temperature - use reasoning_effort instead
        let is_reasoning = is_reasoning_model(&self.model);

        Ok(ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: prompt::build_translation_system_prompt(profile),
                },
                Message {
                    role: "user".to_string(),
                    content: user_prompt,
                },
            ],
            max_completion_tokens: self.max_tokens,
            temperature: if is_reasoning {
                None
            } else {
                Some(self.temperature)
            },
            reasoning_effort: if is_reasoning {
                Some("low".to_string())
            } else {
                None
            },
        })
    }

    async fn send(&self, request: &ChatRequest) -> std::result::Result<String, TranslationError> {
        let content = with_retry_if(
            &self.retry,
            "Translation request",
            || async move {
                let response = self
                    .client
                    .post(&self.api_url)
                    .bearer_auth(&self.api_key)
                    .json(request)
                    .send()
                    .await
                    .map_err(|e| CallError {
                        message: format!("failed to reach translation service: {}", e),
                        retryable: true,
                    })?;

                let status = response.status();
                if !status.is_success() {
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
                    return Err(CallError {
                        message: format!("translation service error ({}): {}", status, body.trim()),
                        retryable: status.as_u16() == 429 || status.is_server_error(),
                    });
                }

                let chat_response: ChatResponse = response.json().await.map_err(|e| CallError {
                    message: format!("failed to parse translation service response: {}", e),
                    retryable: false,
                })?;

                Ok(chat_response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content))
            },
            |e: &CallError| e.retryable,
        )
        .await
        .map_err(|e| TranslationError::Transport(e.message))?;

        match content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(TranslationError::EmptyResponse),
        }
    }
}
