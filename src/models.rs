//! Core data types used throughout the DocChat client.
//!
//! These mirror the backend's wire shapes (assistants, chat exchange,
//! creation progress records) plus the client-side message log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An assistant as returned by `GET /assistants/`.
///
/// One assistant wraps one uploaded document plus its retrieval and
/// generation settings. Owned server-side; the client holds a cached copy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Assistant {
    pub id: i64,
    pub name: String,
    pub file_name: String,
    pub temperature: f64,
    pub top_k: i64,
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry in the client-side message log.
///
/// Created locally: user turns on send, assistant turns when the backend
/// reply (or a synthetic failure placeholder) arrives. Never persisted.
#[derive(Debug, Clone)]
pub struct Message {
    /// Client-generated opaque id.
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Source page numbers cited by the backend, when present.
    pub sources: Option<Vec<i64>>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), None)
    }

    pub fn assistant(content: impl Into<String>, sources: Option<Vec<i64>>) -> Self {
        Self::new(Role::Assistant, content.into(), sources)
    }

    fn new(role: Role, content: String, sources: Option<Vec<i64>>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content,
            sources,
            timestamp: Utc::now(),
        }
    }
}

/// A role/content pair as sent in `chat_history`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for ChatTurn {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

/// Request body for `POST /chat/`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub assistant_id: i64,
    pub query: String,
    pub chat_history: Vec<ChatTurn>,
}

/// Response body for `POST /chat/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub sources: Vec<i64>,
}

/// Discriminant of a creation progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Uploading,
    Processing,
    Complete,
    Error,
}

/// One newline-delimited JSON record from the assistant-creation stream.
///
/// Transient; exists only for the duration of one creation request. The
/// terminal `complete` record carries the new assistant's id.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateProgress {
    pub status: ProgressStatus,
    pub message: String,
    /// Completion percentage in [0, 100], when the backend reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
}

/// Response body for `POST /login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

/// A user record from `GET /admin/users`, with their assistants inlined.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub role: String,
    #[serde(default)]
    pub assistants: Vec<AdminAssistant>,
}

/// The richer assistant shape the admin endpoint returns: creation-time
/// chunking parameters and the optional base64 thumbnail are included.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminAssistant {
    pub id: i64,
    pub name: String,
    pub file_name: String,
    pub temperature: f64,
    pub top_k: i64,
    pub chunk_size: i64,
    pub chunk_overlap: i64,
    #[serde(default)]
    pub image_base64: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn progress_record_decodes() {
        let line = r#"{"status":"processing","message":"Chunking document...","progress":40}"#;
        let rec: CreateProgress = serde_json::from_str(line).unwrap();
        assert_eq!(rec.status, ProgressStatus::Processing);
        assert_eq!(rec.progress, Some(40.0));
        assert!(rec.assistant_id.is_none());
    }

    #[test]
    fn complete_record_carries_assistant_id() {
        let line = r#"{"status":"complete","message":"Assistant Ready!","assistant_id":"17"}"#;
        let rec: CreateProgress = serde_json::from_str(line).unwrap();
        assert_eq!(rec.status, ProgressStatus::Complete);
        assert_eq!(rec.assistant_id.as_deref(), Some("17"));
    }

    #[test]
    fn chat_response_sources_default_empty() {
        let body = r#"{"response":"see page 3"}"#;
        let resp: ChatResponse = serde_json::from_str(body).unwrap();
        assert!(resp.sources.is_empty());
    }

    #[test]
    fn message_constructors_assign_distinct_ids() {
        let a = Message::user("hi");
        let b = Message::user("hi");
        assert_ne!(a.id, b.id);
        assert_eq!(a.role, Role::User);
    }
}
