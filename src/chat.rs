//! Chat pipeline: classify, optionally complete live, persist
//!
//! [`ChatService`] is the one place the three parts meet. A message is
//! validated, answered (live when a [`CompletionClient`] is configured,
//! otherwise from the canned pools) and the exchange is appended to the
//! store before the reply is handed back.

use crate::completion::{
    Completion, CompletionClient, CompletionError, CompletionRequest, ResponseSource,
};
use crate::error::{MindwellError, Result};
use crate::responder::{Category, ResponseSelector};
use crate::storage::{
    ChatContext, ChatExchange, ConversationStore, ExchangeFilter, NewChatExchange,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Inbound chat message
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub context: Option<ChatContext>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.message.trim().is_empty() {
            return Err(MindwellError::invalid("message", "must not be empty").into());
        }
        Ok(())
    }
}

/// Reply for one chat message
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    /// Id of the persisted exchange; `None` when the exchange was not stored
    pub message_id: Option<String>,
    pub response: String,
    pub source: ResponseSource,
    pub category: Category,
}

/// Aggregates over a user's chat history
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatInsights {
    /// Most frequent non-default categories, most frequent first
    pub common_concerns: Vec<Category>,
    /// Stored sentiment values, oldest first
    pub sentiment_trend: Vec<f64>,
    pub total_exchanges: usize,
}

/// Number of categories reported in [`ChatInsights::common_concerns`]
const TOP_CONCERNS: usize = 5;

/// Answers and records chat messages
#[derive(Clone)]
pub struct ChatService {
    store: ConversationStore,
    completion: Option<CompletionClient>,
    selector: ResponseSelector,
    rng: Arc<Mutex<StdRng>>,
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("store", &self.store)
            .field("completion", &self.completion)
            .finish()
    }
}

impl ChatService {
    /// Create a service; pass `None` to answer from the canned pools only
    pub fn new(store: ConversationStore, completion: Option<CompletionClient>) -> Self {
        Self {
            store,
            completion,
            selector: ResponseSelector::new(),
            rng: Arc::new(Mutex::new(StdRng::from_rng(&mut rand::rng()))),
        }
    }

    /// Make canned reply selection reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    pub fn live_completion_enabled(&self) -> bool {
        self.completion.is_some()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Per-request generator derived from the shared one
    fn request_rng(&self) -> StdRng {
        let mut shared = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        StdRng::from_rng(&mut *shared)
    }

    /// Produce a reply without persisting anything
    ///
    /// # Errors
    ///
    /// Returns `MindwellError::Validation` for an empty message and
    /// `MindwellError::Completion` when the completion endpoint is
    /// misconfigured
    pub async fn reply(&self, request: &ChatRequest) -> Result<ChatReply> {
        request.validate()?;
        let mut rng = self.request_rng();
        let category = self.selector.classify(&request.message);

        let completion = match &self.completion {
            Some(client) => {
                let completion_request = CompletionRequest::new(request.message.clone())
                    .with_context(request.context.clone());
                client
                    .get_completion(&completion_request, &mut rng)
                    .await
                    .map_err(completion_failure)?
            }
            None => Completion {
                text: self.selector.pick(category, &mut rng).to_string(),
                source: ResponseSource::Fallback,
                category: Some(category),
            },
        };

        Ok(ChatReply {
            message_id: None,
            response: completion.text,
            source: completion.source,
            category,
        })
    }

    /// Reply to a message and persist the exchange before returning
    ///
    /// # Errors
    ///
    /// Everything [`ChatService::reply`] returns, plus
    /// `MindwellError::Storage` when the exchange cannot be written
    pub async fn respond(&self, request: ChatRequest) -> Result<ChatReply> {
        let reply = self.reply(&request).await?;
        let stored = self
            .store
            .append_exchange(NewChatExchange {
                user_id: request.user_id,
                message: request.message,
                response: reply.response.clone(),
                context: request.context,
                category: reply.category,
                source: reply.source,
            })
            .await?;

        tracing::info!(
            id = %stored.id,
            category = %reply.category,
            source = %reply.source,
            "Chat exchange recorded"
        );

        Ok(ChatReply {
            message_id: Some(stored.id),
            ..reply
        })
    }

    /// Most recent exchanges, newest first
    pub fn history(&self, user_id: Option<String>, limit: usize) -> Result<Vec<ChatExchange>> {
        self.store
            .list_exchanges(limit, &ExchangeFilter::for_user(user_id))
    }

    /// Summarize every stored exchange for `user_id` (all users when `None`)
    pub fn insights(&self, user_id: Option<String>) -> Result<ChatInsights> {
        let mut exchanges = self
            .store
            .list_exchanges(usize::MAX, &ExchangeFilter::for_user(user_id))?;
        exchanges.reverse();
        Ok(summarize_exchanges(&exchanges))
    }
}

fn completion_failure(err: CompletionError) -> anyhow::Error {
    MindwellError::Completion(err.to_string()).into()
}

/// Build insights from exchanges in chronological order
pub fn summarize_exchanges(exchanges: &[ChatExchange]) -> ChatInsights {
    let mut counts: HashMap<Category, usize> = HashMap::new();
    for exchange in exchanges {
        if exchange.category != Category::Default {
            *counts.entry(exchange.category).or_default() += 1;
        }
    }
    let mut ranked: Vec<(Category, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));

    ChatInsights {
        common_concerns: ranked
            .into_iter()
            .take(TOP_CONCERNS)
            .map(|(category, _)| category)
            .collect(),
        sentiment_trend: exchanges.iter().map(|e| e.sentiment).collect(),
        total_exchanges: exchanges.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionProvider, RetryPolicy};
    use async_trait::async_trait;
    use std::time::Duration;

    struct FixedProvider(std::result::Result<String, CompletionError>);

    #[async_trait]
    impl CompletionProvider for FixedProvider {
        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> std::result::Result<String, CompletionError> {
            self.0.clone()
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn client(outcome: std::result::Result<String, CompletionError>) -> CompletionClient {
        CompletionClient::new(
            Arc::new(FixedProvider(outcome)),
            RetryPolicy::new(2, Duration::from_millis(1)),
            Duration::from_millis(100),
        )
    }

    fn service(completion: Option<CompletionClient>) -> ChatService {
        ChatService::new(ConversationStore::temporary().unwrap(), completion).with_seed(42)
    }

    #[tokio::test]
    async fn test_canned_reply_is_persisted() {
        let service = service(None);
        let reply = service
            .respond(ChatRequest {
                message: "I feel so lonely lately".to_string(),
                user_id: Some("u1".to_string()),
                context: None,
            })
            .await
            .unwrap();

        assert_eq!(reply.category, Category::Loneliness);
        assert_eq!(reply.source, ResponseSource::Fallback);
        assert!(Category::Loneliness.responses().contains(&reply.response.as_str()));

        let history = service.history(Some("u1".to_string()), 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(Some(history[0].id.clone()), reply.message_id);
        assert_eq!(history[0].response, reply.response);
    }

    #[tokio::test]
    async fn test_live_reply_keeps_detected_category() {
        let service = service(Some(client(Ok("Tell me more.".to_string()))));
        let reply = service
            .respond(ChatRequest::new("so much pressure at work"))
            .await
            .unwrap();

        assert_eq!(reply.response, "Tell me more.");
        assert_eq!(reply.source, ResponseSource::Live);
        assert_eq!(reply.category, Category::Stress);

        let stored = service.history(None, 1).unwrap();
        assert_eq!(stored[0].source, ResponseSource::Live);
        assert_eq!(stored[0].category, Category::Stress);
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected_without_write() {
        let service = service(None);
        let err = service.respond(ChatRequest::new("   ")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MindwellError>(),
            Some(MindwellError::Validation(_))
        ));
        assert_eq!(service.store().exchange_count(), 0);
    }

    #[tokio::test]
    async fn test_misconfigured_endpoint_fails_without_write() {
        let service = service(Some(client(Err(CompletionError::Configuration(
            "no key".to_string(),
        )))));
        let err = service.respond(ChatRequest::new("hello")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MindwellError>(),
            Some(MindwellError::Completion(_))
        ));
        assert_eq!(service.store().exchange_count(), 0);
    }

    #[tokio::test]
    async fn test_reply_does_not_persist() {
        let service = service(None);
        let reply = service.reply(&ChatRequest::new("hello")).await.unwrap();
        assert_eq!(reply.message_id, None);
        assert_eq!(reply.category, Category::Default);
        assert_eq!(service.store().exchange_count(), 0);
    }

    #[tokio::test]
    async fn test_insights_rank_non_default_categories() {
        let service = service(None);
        for message in [
            "I am anxious",
            "so much stress",
            "nervous again",
            "hello there",
            "worry worry",
        ] {
            service.respond(ChatRequest::new(message)).await.unwrap();
        }

        let insights = service.insights(None).unwrap();
        assert_eq!(insights.total_exchanges, 5);
        assert_eq!(
            insights.common_concerns,
            vec![Category::Anxiety, Category::Stress]
        );
        assert_eq!(insights.sentiment_trend, vec![0.0; 5]);
    }

    #[test]
    fn test_insights_of_nothing() {
        let insights = summarize_exchanges(&[]);
        assert!(insights.common_concerns.is_empty());
        assert_eq!(insights.total_exchanges, 0);
    }

    #[test]
    fn test_chat_request_accepts_camel_case() {
        let request: ChatRequest = serde_json::from_value(serde_json::json!({
            "message": "hi",
            "userId": "u9",
            "context": {"previousMood": 4, "timeOfDay": "morning"}
        }))
        .unwrap();
        assert_eq!(request.user_id.as_deref(), Some("u9"));
        let context = request.context.unwrap();
        assert_eq!(context.previous_mood, Some(4.0));
        assert_eq!(context.time_of_day.as_deref(), Some("morning"));
    }
}
