//! Single-attempt access to a hosted chat-completion endpoint
//!
//! A [`CompletionProvider`] performs exactly one request and classifies the
//! outcome into [`CompletionError`]; deadlines, retries and fallback are the
//! job of [`super::CompletionClient`].

use super::CompletionError;
use crate::config::CompletionConfig;
use crate::storage::ChatContext;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// System instruction sent ahead of every user message
pub const SYSTEM_PROMPT: &str = "You are a supportive mental health companion. \
Reply briefly and with empathy, encouraging open dialogue. Focus on active listening \
and validation. Never give medical advice or diagnoses. If someone expresses thoughts \
of self-harm or suicide, direct them to professional help and emergency services.";

/// What the caller wants a completion for
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub message: String,
    pub context: Option<ChatContext>,
}

impl CompletionRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: Option<ChatContext>) -> Self {
        self.context = context;
        self
    }

    /// The user turn as sent upstream: context sentences, then the message
    ///
    /// # Examples
    ///
    /// ```
    /// use mindwell::completion::CompletionRequest;
    /// use mindwell::storage::ChatContext;
    ///
    /// let request = CompletionRequest::new("I can't sleep").with_context(Some(ChatContext {
    ///     time_of_day: Some("night".to_string()),
    ///     ..Default::default()
    /// }));
    /// assert_eq!(request.user_prompt(), "Time of day: night.\nI can't sleep");
    /// ```
    pub fn user_prompt(&self) -> String {
        let mut parts = Vec::new();
        if let Some(context) = &self.context {
            if let Some(mood) = context.previous_mood {
                parts.push(format!("User's previous mood rating: {}/10.", mood));
            }
            if let Some(entry) = &context.recent_journal_entry {
                parts.push(format!("Recent journal entry: {}.", entry));
            }
            if let Some(time) = &context.time_of_day {
                parts.push(format!("Time of day: {}.", time));
            }
        }
        if parts.is_empty() {
            self.message.clone()
        } else {
            format!("{}\n{}", parts.join(" "), self.message)
        }
    }
}

/// One request against a completion backend
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Perform a single attempt and return the generated text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// Request body for `/chat/completions`
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<WireMessage>,
}

/// Provider for any OpenAI-compatible chat-completion API
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: CompletionConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider instance
    ///
    /// A missing API key is not an error here; each request reports it as
    /// [`CompletionError::Configuration`] so callers can answer with 503.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use mindwell::config::CompletionConfig;
    /// use mindwell::completion::OpenAiCompatibleProvider;
    ///
    /// let provider = OpenAiCompatibleProvider::new(CompletionConfig::default());
    /// assert!(provider.is_ok());
    /// ```
    pub fn new(config: CompletionConfig) -> crate::error::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("mindwell/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                crate::error::MindwellError::Config(format!("Failed to create HTTP client: {}", e))
            })?;

        tracing::info!(
            "Initialized completion provider: api_base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self { client, config })
    }

    fn transport_error(&self, error: reqwest::Error) -> CompletionError {
        if error.is_timeout() {
            CompletionError::Timeout(Duration::from_secs(self.config.timeout_seconds))
        } else {
            CompletionError::Transport(error.to_string())
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatibleProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            CompletionError::Configuration(
                "no completion API key configured (set MINDWELL_COMPLETION_API_KEY)".to_string(),
            )
        })?;

        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                WireMessage {
                    role: "system".to_string(),
                    content: Some(SYSTEM_PROMPT.to_string()),
                },
                WireMessage {
                    role: "user".to_string(),
                    content: Some(request.user_prompt()),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            tracing::debug!("Completion endpoint returned error {}: {}", status, text);
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                body: truncate(&text, 200),
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| CompletionError::MalformedResponse(format!("invalid JSON: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                CompletionError::MalformedResponse("response has no message content".to_string())
            })
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
