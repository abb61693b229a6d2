//! Attempt bookkeeping for live completions
//!
//! The client drives [`AttemptState`] through [`transition`] after every
//! attempt. Only `Attempting` is non-terminal; the other three states tell
//! the caller what to return.

use super::CompletionError;
use crate::config::CompletionConfig;
use std::time::Duration;

/// Where a completion request stands
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptState {
    /// About to run the given attempt (1-based)
    Attempting(u32),
    /// The endpoint produced text
    Succeeded(String),
    /// Give up on the endpoint and answer with a canned reply
    Degraded(CompletionError),
    /// Surface the error to the caller
    Fatal(CompletionError),
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptState::Attempting(_))
    }
}

/// How many attempts to make and how long to wait between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

impl From<&CompletionConfig> for RetryPolicy {
    fn from(config: &CompletionConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.retry_delay_ms))
    }
}

/// Compute the next state from the outcome of `attempt`
///
/// # Examples
///
/// ```
/// use mindwell::completion::retry::{transition, AttemptState, RetryPolicy};
/// use mindwell::completion::CompletionError;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(2, Duration::ZERO);
/// let err = CompletionError::Transport("connection reset".to_string());
/// assert_eq!(transition(1, Err(err.clone()), &policy), AttemptState::Attempting(2));
/// assert_eq!(transition(2, Err(err.clone()), &policy), AttemptState::Degraded(err));
/// ```
pub fn transition(
    attempt: u32,
    outcome: Result<String, CompletionError>,
    policy: &RetryPolicy,
) -> AttemptState {
    match outcome {
        Ok(text) => AttemptState::Succeeded(text),
        Err(err @ CompletionError::Configuration(_)) => AttemptState::Fatal(err),
        Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
            tracing::debug!(attempt, error = %err, "Completion attempt failed, retrying");
            AttemptState::Attempting(attempt + 1)
        }
        Err(err) => AttemptState::Degraded(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[test]
    fn test_success_is_terminal() {
        let state = transition(1, Ok("hi".to_string()), &policy(3));
        assert_eq!(state, AttemptState::Succeeded("hi".to_string()));
        assert!(state.is_terminal());
    }

    #[test]
    fn test_timeout_retries_until_budget_exhausted() {
        let err = CompletionError::Timeout(Duration::from_secs(1));
        assert_eq!(
            transition(1, Err(err.clone()), &policy(3)),
            AttemptState::Attempting(2)
        );
        assert_eq!(
            transition(2, Err(err.clone()), &policy(3)),
            AttemptState::Attempting(3)
        );
        assert_eq!(
            transition(3, Err(err.clone()), &policy(3)),
            AttemptState::Degraded(err)
        );
    }

    #[test]
    fn test_server_errors_and_rate_limits_retry() {
        for status in [500, 502, 503, 429] {
            let err = CompletionError::Upstream {
                status,
                body: String::new(),
            };
            assert_eq!(
                transition(1, Err(err), &policy(2)),
                AttemptState::Attempting(2),
                "status {} should retry",
                status
            );
        }
    }

    #[test]
    fn test_client_errors_degrade_immediately() {
        let err = CompletionError::Upstream {
            status: 400,
            body: "bad request".to_string(),
        };
        assert_eq!(
            transition(1, Err(err.clone()), &policy(3)),
            AttemptState::Degraded(err)
        );
    }

    #[test]
    fn test_malformed_response_degrades_immediately() {
        let err = CompletionError::MalformedResponse("empty".to_string());
        assert_eq!(
            transition(1, Err(err.clone()), &policy(3)),
            AttemptState::Degraded(err)
        );
    }

    #[test]
    fn test_configuration_error_is_fatal() {
        let err = CompletionError::Configuration("no key".to_string());
        assert_eq!(
            transition(1, Err(err.clone()), &policy(3)),
            AttemptState::Fatal(err)
        );
    }

    #[test]
    fn test_single_attempt_policy_never_retries() {
        let err = CompletionError::Transport("refused".to_string());
        assert_eq!(
            transition(1, Err(err.clone()), &policy(1)),
            AttemptState::Degraded(err)
        );
    }

    #[test]
    fn test_policy_clamps_zero_attempts() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn test_policy_from_config() {
        let config = CompletionConfig {
            max_attempts: 4,
            retry_delay_ms: 250,
            ..Default::default()
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.delay, Duration::from_millis(250));
    }
}
