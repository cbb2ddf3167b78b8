//! Per-assistant chat session store.
//!
//! An in-memory, append-ordered message log keyed by assistant id. Each
//! `send` appends the user's message immediately, performs exactly one
//! backend round trip, and appends exactly one resulting message — the
//! reply on success, or a fixed placeholder on any failure (the underlying
//! error is logged, never surfaced in the log).
//!
//! Logs live only for the life of the process and are never evicted; a
//! long session grows without bound. The log for an assistant is dropped
//! when that assistant is deleted or on an explicit `clear`.

use std::collections::BTreeMap;

use crate::client::{ApiClient, ApiError};
use crate::models::{ChatRequest, ChatTurn, Message};

/// Fixed assistant-role text appended when a chat request fails.
pub const FAILURE_MESSAGE: &str =
    "Sorry, I encountered an error processing your request. Please try again.";

pub struct ChatStore {
    /// Message logs in deterministic (ascending assistant id) iteration order.
    logs: BTreeMap<i64, Vec<Message>>,
    /// Trailing messages forwarded as `chat_history` on each request.
    history_depth: usize,
}

impl ChatStore {
    pub fn new(history_depth: usize) -> Self {
        Self {
            logs: BTreeMap::new(),
            history_depth,
        }
    }

    /// Send one query to one assistant. Always appends exactly two
    /// messages: the user turn, then the reply or the failure placeholder.
    ///
    /// Returns the appended assistant-role message.
    pub async fn send(
        &mut self,
        client: &ApiClient,
        assistant_id: i64,
        query: &str,
    ) -> Message {
        // History is snapshotted before the new user turn is appended, so
        // the query itself is not duplicated into its own context.
        let chat_history = self.context_window(assistant_id);

        self.append(assistant_id, Message::user(query));

        let request = ChatRequest {
            assistant_id,
            query: query.to_string(),
            chat_history,
        };

        let reply = match client.chat(&request).await {
            Ok(resp) => {
                let sources = if resp.sources.is_empty() {
                    None
                } else {
                    Some(resp.sources)
                };
                Message::assistant(resp.response, sources)
            }
            Err(e) => {
                log_chat_error(assistant_id, &e);
                Message::assistant(FAILURE_MESSAGE, None)
            }
        };

        self.append(assistant_id, reply.clone());
        reply
    }

    /// The last `history_depth` messages of an assistant's log, as wire turns.
    pub fn context_window(&self, assistant_id: i64) -> Vec<ChatTurn> {
        let log = match self.logs.get(&assistant_id) {
            Some(log) => log,
            None => return Vec::new(),
        };
        let start = log.len().saturating_sub(self.history_depth);
        log[start..].iter().map(ChatTurn::from).collect()
    }

    pub fn append(&mut self, assistant_id: i64, message: Message) {
        self.logs.entry(assistant_id).or_default().push(message);
    }

    /// The full ordered log for one assistant (empty slice if none).
    pub fn messages(&self, assistant_id: i64) -> &[Message] {
        self.logs
            .get(&assistant_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Drop the whole log for one assistant (used on delete and `/clear`).
    pub fn clear(&mut self, assistant_id: i64) {
        self.logs.remove(&assistant_id);
    }
}

fn log_chat_error(assistant_id: i64, error: &ApiError) {
    tracing::error!(assistant_id, error = %error, "chat request failed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn store_with_turns(assistant_id: i64, n_pairs: usize) -> ChatStore {
        let mut store = ChatStore::new(6);
        for i in 0..n_pairs {
            store.append(assistant_id, Message::user(format!("q{}", i)));
            store.append(
                assistant_id,
                Message::assistant(format!("a{}", i), Some(vec![i as i64])),
            );
        }
        store
    }

    #[test]
    fn log_alternates_and_preserves_order() {
        let store = store_with_turns(7, 4);
        let log = store.messages(7);
        assert_eq!(log.len(), 8);
        for (i, msg) in log.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(msg.role, expected);
        }
        assert_eq!(log[0].content, "q0");
        assert_eq!(log[7].content, "a3");
    }

    #[test]
    fn logs_are_isolated_per_assistant() {
        let mut store = ChatStore::new(6);
        store.append(1, Message::user("one"));
        store.append(2, Message::user("two"));
        assert_eq!(store.messages(1).len(), 1);
        assert_eq!(store.messages(2).len(), 1);
        assert!(store.messages(3).is_empty());
    }

    #[test]
    fn context_window_truncates_to_depth() {
        let store = store_with_turns(1, 5); // 10 messages
        let window = store.context_window(1);
        assert_eq!(window.len(), 6);
        // Oldest retained turn is q2 (pairs 0 and 1 fell off).
        assert_eq!(window[0].content, "q2");
        assert_eq!(window[5].content, "a4");
    }

    #[test]
    fn context_window_shorter_than_depth_is_whole_log() {
        let store = store_with_turns(1, 2);
        assert_eq!(store.context_window(1).len(), 4);
        assert!(store.context_window(99).is_empty());
    }

    #[test]
    fn clear_drops_only_that_log() {
        let mut store = store_with_turns(1, 2);
        store.append(2, Message::user("keep"));
        store.clear(1);
        assert!(store.messages(1).is_empty());
        assert_eq!(store.messages(2).len(), 1);
    }
}
