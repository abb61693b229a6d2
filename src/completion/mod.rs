//! Live completion with bounded retries and canned fallback
//!
//! [`CompletionClient::get_completion`] always produces an answer unless the
//! endpoint is misconfigured: transient failures are retried, and anything
//! the endpoint cannot recover from degrades to a reply from
//! [`crate::responder`].

pub mod provider;
pub mod retry;

pub use provider::{CompletionProvider, CompletionRequest, OpenAiCompatibleProvider};
pub use retry::{AttemptState, RetryPolicy};

use crate::config::CompletionConfig;
use crate::responder::{Category, ResponseSelector};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Where a reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// Generated by the completion endpoint
    Live,
    /// Picked from the canned response pools
    Fallback,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Live => "live",
            ResponseSource::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reply ready to show the user
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub source: ResponseSource,
    /// Set when the reply came from the canned pools
    pub category: Option<Category>,
}

/// Failure of a single completion attempt
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    /// Missing credential or unusable endpoint settings; never retried
    #[error("Completion endpoint misconfigured: {0}")]
    Configuration(String),

    /// The attempt exceeded its deadline
    #[error("Completion attempt timed out after {0:?}")]
    Timeout(Duration),

    /// Connection level failure
    #[error("Completion transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status from the endpoint
    #[error("Completion endpoint returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Success status but no usable text
    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            CompletionError::Timeout(_) | CompletionError::Transport(_) => true,
            CompletionError::Upstream { status, .. } => *status >= 500 || *status == 429,
            CompletionError::Configuration(_) | CompletionError::MalformedResponse(_) => false,
        }
    }
}

/// Live completion client
///
/// Wraps a [`CompletionProvider`] with a per-attempt deadline and a
/// [`RetryPolicy`]. Cheap to clone.
#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn CompletionProvider>,
    selector: ResponseSelector,
    policy: RetryPolicy,
    attempt_timeout: Duration,
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("provider", &self.provider.name())
            .field("policy", &self.policy)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}

impl CompletionClient {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        policy: RetryPolicy,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            selector: ResponseSelector,
            policy,
            attempt_timeout,
        }
    }

    /// Build a client for the configured OpenAI-compatible endpoint
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created
    pub fn from_config(config: &CompletionConfig) -> crate::error::Result<Self> {
        let provider = OpenAiCompatibleProvider::new(config.clone())?;
        Ok(Self::new(
            Arc::new(provider),
            RetryPolicy::from(config),
            Duration::from_secs(config.timeout_seconds),
        ))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Get a reply for `request`, falling back to a canned one when the
    /// endpoint keeps failing
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Configuration`] when the endpoint cannot be
    /// used at all; every other failure degrades to a fallback reply.
    pub async fn get_completion<R>(
        &self,
        request: &CompletionRequest,
        rng: &mut R,
    ) -> Result<Completion, CompletionError>
    where
        R: Rng + Send + ?Sized,
    {
        let mut state = AttemptState::Attempting(1);
        loop {
            state = match state {
                AttemptState::Attempting(attempt) => {
                    if attempt > 1 {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                    tracing::debug!(
                        attempt,
                        provider = self.provider.name(),
                        "Requesting completion"
                    );
                    let outcome =
                        match tokio::time::timeout(self.attempt_timeout, self.provider.complete(request))
                            .await
                        {
                            Ok(result) => result,
                            Err(_) => Err(CompletionError::Timeout(self.attempt_timeout)),
                        };
                    retry::transition(attempt, outcome, &self.policy)
                }
                AttemptState::Succeeded(text) => {
                    return Ok(Completion {
                        text,
                        source: ResponseSource::Live,
                        category: None,
                    });
                }
                AttemptState::Degraded(err) => {
                    tracing::warn!(error = %err, "Completion unavailable, using fallback reply");
                    let (category, text) = self.selector.classify_and_respond(&request.message, rng);
                    return Ok(Completion {
                        text: text.to_string(),
                        source: ResponseSource::Fallback,
                        category: Some(category),
                    });
                }
                AttemptState::Fatal(err) => {
                    tracing::error!(error = %err, "Completion endpoint cannot be used");
                    return Err(err);
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays scripted outcomes, repeating the last one
    struct ScriptedProvider {
        outcomes: Mutex<VecDeque<Result<String, CompletionError>>>,
        calls: AtomicU32,
    }

    impl ScriptedProvider {
        fn new(outcomes: Vec<Result<String, CompletionError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.len() > 1 {
                outcomes.pop_front().unwrap()
            } else {
                outcomes.front().cloned().unwrap()
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// Never answers
    struct StalledProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl CompletionProvider for StalledProvider {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }

        fn name(&self) -> &str {
            "stalled"
        }
    }

    fn client(provider: Arc<dyn CompletionProvider>, attempts: u32) -> CompletionClient {
        CompletionClient::new(
            provider,
            RetryPolicy::new(attempts, Duration::from_millis(5)),
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn test_live_reply_on_first_success() {
        let provider = ScriptedProvider::new(vec![Ok("I'm here for you.".to_string())]);
        let client = client(provider.clone(), 3);
        let mut rng = StdRng::seed_from_u64(1);

        let completion = client
            .get_completion(&CompletionRequest::new("hello"), &mut rng)
            .await
            .unwrap();

        assert_eq!(completion.text, "I'm here for you.");
        assert_eq!(completion.source, ResponseSource::Live);
        assert_eq!(completion.category, None);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let provider = ScriptedProvider::new(vec![
            Err(CompletionError::Transport("reset".to_string())),
            Err(CompletionError::Upstream {
                status: 503,
                body: String::new(),
            }),
            Ok("better now".to_string()),
        ]);
        let client = client(provider.clone(), 3);
        let mut rng = StdRng::seed_from_u64(1);

        let completion = client
            .get_completion(&CompletionRequest::new("hello"), &mut rng)
            .await
            .unwrap();

        assert_eq!(completion.source, ResponseSource::Live);
        assert_eq!(completion.text, "better now");
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_fall_back_to_category_reply() {
        let provider = ScriptedProvider::new(vec![Err(CompletionError::Upstream {
            status: 500,
            body: "boom".to_string(),
        })]);
        let client = client(provider.clone(), 3);
        let mut rng = StdRng::seed_from_u64(7);

        let completion = client
            .get_completion(&CompletionRequest::new("work is so stressful"), &mut rng)
            .await
            .unwrap();

        assert_eq!(completion.source, ResponseSource::Fallback);
        assert_eq!(completion.category, Some(Category::Stress));
        assert!(Category::Stress
            .responses()
            .contains(&completion.text.as_str()));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_failure_falls_back_after_one_attempt() {
        let provider = ScriptedProvider::new(vec![Err(CompletionError::Upstream {
            status: 400,
            body: "bad".to_string(),
        })]);
        let client = client(provider.clone(), 3);
        let mut rng = StdRng::seed_from_u64(7);

        let completion = client
            .get_completion(&CompletionRequest::new("hello"), &mut rng)
            .await
            .unwrap();

        assert_eq!(completion.source, ResponseSource::Fallback);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_configuration_error_is_returned() {
        let provider = ScriptedProvider::new(vec![Err(CompletionError::Configuration(
            "no key".to_string(),
        ))]);
        let client = client(provider.clone(), 3);
        let mut rng = StdRng::seed_from_u64(7);

        let err = client
            .get_completion(&CompletionRequest::new("hello"), &mut rng)
            .await
            .unwrap_err();

        assert!(matches!(err, CompletionError::Configuration(_)));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_stalled_endpoint_times_out_each_attempt() {
        let provider = Arc::new(StalledProvider {
            calls: AtomicU32::new(0),
        });
        let client = client(provider.clone(), 3);
        let mut rng = StdRng::seed_from_u64(7);

        let started = std::time::Instant::now();
        let completion = client
            .get_completion(&CompletionRequest::new("hello"), &mut rng)
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert_eq!(completion.source, ResponseSource::Fallback);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        // three 50ms deadlines plus two 5ms pauses
        assert!(elapsed >= Duration::from_millis(150));
        assert!(elapsed < Duration::from_secs(2));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(CompletionError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(CompletionError::Transport("x".to_string()).is_retryable());
        assert!(CompletionError::Upstream {
            status: 429,
            body: String::new()
        }
        .is_retryable());
        assert!(!CompletionError::Upstream {
            status: 404,
            body: String::new()
        }
        .is_retryable());
        assert!(!CompletionError::MalformedResponse("x".to_string()).is_retryable());
        assert!(!CompletionError::Configuration("x".to_string()).is_retryable());
    }

    #[test]
    fn test_response_source_wire_names() {
        assert_eq!(
            serde_json::to_value(ResponseSource::Live).unwrap(),
            serde_json::json!("live")
        );
        assert_eq!(ResponseSource::Fallback.to_string(), "fallback");
    }
}
