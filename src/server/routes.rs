//! Route handlers

use super::error::ApiError;
use super::AppState;
use crate::chat::{ChatInsights, ChatRequest};
use crate::completion::ResponseSource;
use crate::journal::{JournalInsights, JournalQuery, JournalSubmission};
use crate::sentiment::{self, SentimentReport};
use crate::storage::{ChatExchange, JournalEntry};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

type SharedState = Arc<AppState>;

pub fn chat_routes() -> Router<SharedState> {
    Router::new()
        .route("/chat", post(post_chat).get(list_chat))
        .route("/chat/insights", get(chat_insights))
}

pub fn journal_routes() -> Router<SharedState> {
    Router::new()
        .route("/journal", post(post_journal).get(list_journal))
        .route("/journal/insights", get(journal_insights))
}

pub fn utility_routes() -> Router<SharedState> {
    Router::new()
        .route("/sentiment", post(post_sentiment))
        .route("/health", get(health))
}

// ============================================================================
// Chat
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ResponseSource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatListQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

async fn post_chat(
    State(state): State<SharedState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = body?;
    let reply = state.chat.respond(request).await?;
    Ok(Json(ChatResponse {
        success: true,
        message_id: reply.message_id,
        response: Some(reply.response),
        source: Some(reply.source),
    }))
}

async fn list_chat(
    State(state): State<SharedState>,
    query: Result<Query<ChatListQuery>, QueryRejection>,
) -> Result<Json<Vec<ChatExchange>>, ApiError> {
    let Query(query) = query?;
    let limit = state.limits.resolve(query.limit)?;
    let exchanges = state.chat.history(non_empty(query.user_id), limit)?;
    Ok(Json(exchanges))
}

async fn chat_insights(
    State(state): State<SharedState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<ChatInsights>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.chat.insights(non_empty(query.user_id))?))
}

// ============================================================================
// Journal
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalResponse {
    pub success: bool,
    pub entry_id: String,
}

async fn post_journal(
    State(state): State<SharedState>,
    body: Result<Json<JournalSubmission>, JsonRejection>,
) -> Result<Json<JournalResponse>, ApiError> {
    let Json(submission) = body?;
    let entry = state.journal.submit(submission).await?;
    Ok(Json(JournalResponse {
        success: true,
        entry_id: entry.id,
    }))
}

async fn list_journal(
    State(state): State<SharedState>,
    query: Result<Query<JournalQuery>, QueryRejection>,
) -> Result<Json<Vec<JournalEntry>>, ApiError> {
    let Query(query) = query?;
    let limit = state.limits.resolve(query.limit)?;
    let filter = query.to_filter()?;
    Ok(Json(state.journal.list(&filter, limit)?))
}

async fn journal_insights(
    State(state): State<SharedState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<JournalInsights>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.journal.insights(non_empty(query.user_id))?))
}

// ============================================================================
// Sentiment and health
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SentimentRequest {
    #[serde(default)]
    pub text: String,
}

async fn post_sentiment(
    body: Result<Json<SentimentRequest>, JsonRejection>,
) -> Result<Json<SentimentReport>, ApiError> {
    let Json(request) = body?;
    Ok(Json(sentiment::analyze(&request.text)?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub live_completion: bool,
}

async fn health(State(state): State<SharedState>) -> Result<Json<HealthResponse>, ApiError> {
    state.chat.store().ping()?;
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        live_completion: state.chat.live_completion_enabled(),
    }))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
