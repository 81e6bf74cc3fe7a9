//! Per-session conversation history
//!
//! The graph itself is stateless across turns. What a session said and what
//! each turn did is kept here, keyed by the caller's opaque session token.

use crate::error::{AdvisorError, Result};
use crate::state::{Step, TurnState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One line of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

/// Summary of a finished (or failed) turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn_id: Uuid,
    pub query: String,
    /// Classifier label, if classification ran
    pub intent: Option<String>,
    pub stock_name: Option<String>,
    pub ticker: Option<String>,
    pub visited: Vec<Step>,
    pub final_result: Option<String>,
    /// Error text when the turn failed
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TurnRecord {
    /// Snapshot a turn's state once it stopped running
    pub fn from_state(state: &TurnState, started_at: DateTime<Utc>, error: Option<String>) -> Self {
        Self {
            turn_id: state.turn_id(),
            query: state.query().to_string(),
            intent: state.intent().map(|route| route.label().to_string()),
            stock_name: state.stock_name().map(str::to_string),
            ticker: state.ticker().map(str::to_string),
            visited: state.visited().to_vec(),
            final_result: state.final_result().map(str::to_string),
            error,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Whether the turn produced a result
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Storage for session history
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Append a message to a session
    async fn append(&self, token: &str, message: ChatMessage) -> Result<()>;

    /// Messages of a session in append order; empty for unknown tokens
    async fn list(&self, token: &str) -> Result<Vec<ChatMessage>>;

    /// Keep the record of a turn
    async fn archive(&self, token: &str, record: TurnRecord) -> Result<()>;

    /// Turn records of a session in archive order
    async fn turns(&self, token: &str) -> Result<Vec<TurnRecord>>;
}

#[derive(Debug, Default)]
struct SessionLog {
    messages: Vec<ChatMessage>,
    turns: Vec<TurnRecord>,
}

/// Process-local session store
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionLog>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions seen so far
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn check_token(token: &str) -> Result<()> {
    if token.trim().is_empty() {
        return Err(AdvisorError::Session("session token must not be empty".to_string()));
    }
    Ok(())
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn append(&self, token: &str, message: ChatMessage) -> Result<()> {
        check_token(token)?;
        let mut sessions = self.sessions.write().await;
        sessions.entry(token.to_string()).or_default().messages.push(message);
        Ok(())
    }

    async fn list(&self, token: &str) -> Result<Vec<ChatMessage>> {
        check_token(token)?;
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(token)
            .map(|log| log.messages.clone())
            .unwrap_or_default())
    }

    async fn archive(&self, token: &str, record: TurnRecord) -> Result<()> {
        check_token(token)?;
        let mut sessions = self.sessions.write().await;
        sessions.entry(token.to_string()).or_default().turns.push(record);
        Ok(())
    }

    async fn turns(&self, token: &str) -> Result<Vec<TurnRecord>> {
        check_token(token)?;
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(token)
            .map(|log| log.turns.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_messages_listed_in_append_order() {
        let store = InMemorySessionStore::new();
        store.append("a", ChatMessage::user("first")).await.unwrap();
        store.append("a", ChatMessage::assistant("second")).await.unwrap();
        store.append("a", ChatMessage::user("third")).await.unwrap();

        let contents: Vec<String> = store
            .list("a")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_tokens_are_isolated() {
        let store = InMemorySessionStore::new();
        store.append("a", ChatMessage::user("for a")).await.unwrap();
        store.append("b", ChatMessage::user("for b")).await.unwrap();

        let a = store.list("a").await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].content, "for a");
        assert!(store.list("unknown").await.unwrap().is_empty());
        assert_eq!(store.session_count().await, 2);
    }

    #[tokio::test]
    async fn test_empty_token_rejected() {
        let store = InMemorySessionStore::new();
        let err = store.append("  ", ChatMessage::user("x")).await.unwrap_err();
        assert!(matches!(err, AdvisorError::Session(_)));
    }

    #[tokio::test]
    async fn test_archive_turn() {
        let store = InMemorySessionStore::new();
        let mut state = TurnState::new("a", "hello");
        state.visit(Step::ClassifyIntent);
        state.set_final_result("hi".to_string()).unwrap();

        let record = TurnRecord::from_state(&state, Utc::now(), None);
        store.archive("a", record).await.unwrap();

        let turns = store.turns("a").await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].turn_id, state.turn_id());
        assert_eq!(turns[0].final_result.as_deref(), Some("hi"));
        assert!(turns[0].succeeded());
    }
}
