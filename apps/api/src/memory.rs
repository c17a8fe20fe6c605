//! Per-session conversation memory and booking drafts, kept in Redis.
//!
//! Keys:
//! - `conv:{session_id}`: list of JSON-encoded [`ChatTurn`]s, oldest first
//! - `booking_draft:{session_id}`: JSON-encoded [`BookingDraft`]
//!
//! Every write refreshes the key's TTL.

use std::fmt;
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::booking::draft::BookingDraft;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Renders the last `max_turns` turns as `role: text` lines.
pub fn format_history(history: &[ChatTurn], max_turns: usize) -> String {
    let start = history.len().saturating_sub(max_turns);
    history[start..]
        .iter()
        .map(|t| format!("{}: {}", t.role, t.text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn conversation_key(session_id: &str) -> String {
    format!("conv:{session_id}")
}

fn draft_key(session_id: &str) -> String {
    format!("booking_draft:{session_id}")
}

#[derive(Clone)]
pub struct ConversationMemory {
    client: redis::Client,
    ttl: Duration,
}

impl ConversationMemory {
    pub fn new(client: redis::Client, ttl: Duration) -> Self {
        Self { client, ttl }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, AppError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    fn ttl_secs(&self) -> i64 {
        self.ttl.as_secs() as i64
    }

    /// Appends one turn to the session's conversation.
    pub async fn add_message(&self, session_id: &str, turn: &ChatTurn) -> Result<(), AppError> {
        let key = conversation_key(session_id);
        let payload = serde_json::to_string(turn)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode turn: {e}")))?;
        let mut conn = self.connection().await?;
        redis::pipe()
            .rpush(&key, payload)
            .ignore()
            .expire(&key, self.ttl_secs())
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    /// Appends a user question and the assistant's reply, in that order.
    pub async fn record_exchange(
        &self,
        session_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<(), AppError> {
        self.add_message(session_id, &ChatTurn::user(question))
            .await?;
        self.add_message(session_id, &ChatTurn::assistant(answer))
            .await
    }

    /// Returns the whole conversation, oldest first. Undecodable entries are skipped.
    pub async fn get_messages(&self, session_id: &str) -> Result<Vec<ChatTurn>, AppError> {
        let mut conn = self.connection().await?;
        let items: Vec<String> = conn.lrange(conversation_key(session_id), 0, -1).await?;
        Ok(items
            .iter()
            .filter_map(|raw| match serde_json::from_str::<ChatTurn>(raw) {
                Ok(turn) => Some(turn),
                Err(e) => {
                    warn!("Skipping malformed turn in session {session_id}: {e}");
                    None
                }
            })
            .collect())
    }

    /// Removes the conversation and any unfinished booking draft.
    pub async fn clear_session(&self, session_id: &str) -> Result<(), AppError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(vec![conversation_key(session_id), draft_key(session_id)])
            .await?;
        debug!("Cleared session {session_id}");
        Ok(())
    }

    pub async fn load_draft(&self, session_id: &str) -> Result<Option<BookingDraft>, AppError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(draft_key(session_id)).await?;
        Ok(raw.and_then(|r| match serde_json::from_str(&r) {
            Ok(draft) => Some(draft),
            Err(e) => {
                warn!("Discarding malformed booking draft for session {session_id}: {e}");
                None
            }
        }))
    }

    pub async fn save_draft(&self, session_id: &str, draft: &BookingDraft) -> Result<(), AppError> {
        let payload = serde_json::to_string(draft)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode draft: {e}")))?;
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(draft_key(session_id), payload, self.ttl.as_secs())
            .await?;
        Ok(())
    }

    pub async fn clear_draft(&self, session_id: &str) -> Result<(), AppError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(draft_key(session_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced_by_session() {
        assert_eq!(conversation_key("abc"), "conv:abc");
        assert_eq!(draft_key("abc"), "booking_draft:abc");
    }

    #[test]
    fn test_turn_wire_format() {
        let json = serde_json::to_string(&ChatTurn::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","text":"hi"}"#);
        let turn: ChatTurn = serde_json::from_str(r#"{"role":"assistant","text":"hello"}"#).unwrap();
        assert_eq!(turn, ChatTurn::assistant("hello"));
    }

    #[test]
    fn test_format_history_keeps_last_turns() {
        let history = vec![
            ChatTurn::user("one"),
            ChatTurn::assistant("two"),
            ChatTurn::user("three"),
        ];
        assert_eq!(format_history(&history, 2), "assistant: two\nuser: three");
        assert_eq!(
            format_history(&history, 10),
            "user: one\nassistant: two\nuser: three"
        );
        assert_eq!(format_history(&[], 6), "");
    }
}
