//! Per-event chat: live timestamp-ordered message feed plus append-only
//! send.
//!
//! Sends are never locally echoed. A message becomes visible only once the
//! subscription delivers it, so the feed is the single source of truth and
//! ordering is exactly the store's server-assigned timestamp order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use quad_shared::{ChatMessage, CurrentUser, EventId};
use quad_store::{paths, server_timestamp, Document, DocumentStore, StoreError};

#[derive(Debug, Clone, Default)]
pub struct ChatState {
    pub messages: Vec<ChatMessage>,
    pub loading: bool,
}

/// One event's chat feed and send pipe.
pub struct ChatChannel {
    store: Arc<dyn DocumentStore>,
    user: Option<CurrentUser>,
    event_id: Option<EventId>,
    state: watch::Receiver<ChatState>,
    sending: AtomicBool,
    task: Option<JoinHandle<()>>,
}

impl ChatChannel {
    /// Open the channel: with a valid user and event id this subscribes to
    /// the event's message subcollection (full replay, then live appends);
    /// otherwise the feed settles empty.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        user: Option<CurrentUser>,
        event_id: Option<EventId>,
    ) -> Self {
        let (tx, rx) = watch::channel(ChatState {
            messages: Vec::new(),
            loading: true,
        });

        let task = match (&user, &event_id) {
            (Some(_), Some(event_id)) => {
                match store
                    .subscribe(&paths::event_messages(event_id), Some("timestamp"))
                    .await
                {
                    Ok(mut stream) => {
                        let event_id = event_id.clone();
                        Some(tokio::spawn(async move {
                            while let Some(snapshot) = stream.next().await {
                                let messages =
                                    snapshot.iter().filter_map(decode_message).collect();
                                tx.send_replace(ChatState {
                                    messages,
                                    loading: false,
                                });
                            }
                            debug!(event = %event_id, "chat subscription ended");
                        }))
                    }
                    Err(e) => {
                        error!(event = %event_id, error = %e, "failed to subscribe to chat");
                        tx.send_replace(ChatState {
                            messages: Vec::new(),
                            loading: false,
                        });
                        None
                    }
                }
            }
            _ => {
                tx.send_replace(ChatState {
                    messages: Vec::new(),
                    loading: false,
                });
                None
            }
        };

        Self {
            store,
            user,
            event_id,
            state: rx,
            sending: AtomicBool::new(false),
            task,
        }
    }

    /// Append a message with a server-assigned timestamp.
    ///
    /// Silently a no-op when the trimmed text is empty or there is no user
    /// or event id. The local feed is *not* touched: the message shows up
    /// once the subscription observes it.
    ///
    /// # Errors
    ///
    /// Store write failures are returned to the caller.
    pub async fn send(&self, text: &str) -> Result<(), StoreError> {
        let trimmed = text.trim();
        let (user, event_id) = match (&self.user, &self.event_id) {
            (Some(user), Some(event_id)) if !trimmed.is_empty() => (user, event_id),
            _ => return Ok(()),
        };

        self.sending.store(true, Ordering::SeqCst);
        let result = self
            .store
            .add_document(
                &paths::event_messages(event_id),
                serde_json::json!({
                    "text": trimmed,
                    "userId": user.uid,
                    "userName": user.sender_name(),
                    "timestamp": server_timestamp(),
                }),
            )
            .await;
        self.sending.store(false, Ordering::SeqCst);

        match result {
            Ok(id) => {
                debug!(event = %event_id, message = %id, "message sent");
                Ok(())
            }
            Err(e) => {
                error!(event = %event_id, error = %e, "failed to send message");
                Err(e)
            }
        }
    }

    /// Whether a send is in flight; callers disable duplicate submission
    /// while this is set.
    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::SeqCst)
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state.borrow().messages.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn watch(&self) -> watch::Receiver<ChatState> {
        self.state.clone()
    }

    /// Tear down the subscription now instead of waiting for drop.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ChatChannel {
    fn drop(&mut self) {
        self.close();
    }
}

fn decode_message(doc: &Document) -> Option<ChatMessage> {
    match doc.decode() {
        Ok(message) => Some(message),
        Err(e) => {
            warn!(id = %doc.id, error = %e, "skipping undecodable chat message");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quad_shared::UserId;
    use quad_store::testing::FlakyStore;
    use quad_store::MemoryStore;
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::timeout;

    fn user(uid: &str, name: Option<&str>) -> CurrentUser {
        CurrentUser {
            uid: UserId::new(uid),
            email: Some(format!("{uid}@student.ubc.ca")),
            display_name: name.map(str::to_string),
        }
    }

    async fn wait_for_messages(channel: &ChatChannel, expected: usize) -> Vec<ChatMessage> {
        let mut rx = channel.watch();
        let messages = timeout(
            Duration::from_millis(500),
            rx.wait_for(|s| !s.loading && s.messages.len() == expected),
        )
        .await
        .unwrap_or_else(|_| panic!("feed never reached {expected} messages"))
        .unwrap()
        .messages
        .clone();
        messages
    }

    #[tokio::test]
    async fn test_feed_orders_by_server_timestamp() {
        let store = Arc::new(MemoryStore::new());
        let collection = paths::event_messages(&EventId::new("e1"));

        // Seeded out of insertion order on purpose
        for (text, ts) in [("second", 2_000), ("third", 3_000), ("first", 1_000)] {
            store
                .add_document(
                    &collection,
                    json!({ "text": text, "userId": "u", "userName": "u", "timestamp": ts }),
                )
                .await
                .unwrap();
        }

        let channel = ChatChannel::open(
            store,
            Some(user("alice", None)),
            Some(EventId::new("e1")),
        )
        .await;

        let messages = wait_for_messages(&channel, 3).await;
        let order: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_send_appears_only_via_subscription() {
        let store = Arc::new(MemoryStore::new());
        let channel = ChatChannel::open(
            store,
            Some(user("alice", Some("Alice"))),
            Some(EventId::new("e1")),
        )
        .await;
        wait_for_messages(&channel, 0).await;

        channel.send("  hello everyone  ").await.unwrap();

        let messages = wait_for_messages(&channel, 1).await;
        assert_eq!(messages[0].text, "hello everyone");
        assert_eq!(messages[0].user_name, "Alice");
        assert_eq!(messages[0].user_id, UserId::new("alice"));
        assert!(!channel.is_sending());
    }

    #[tokio::test]
    async fn test_blank_text_or_missing_context_is_a_silent_noop() {
        let store = Arc::new(MemoryStore::new());
        let collection = paths::event_messages(&EventId::new("e1"));

        let channel = ChatChannel::open(
            store.clone(),
            Some(user("alice", None)),
            Some(EventId::new("e1")),
        )
        .await;
        channel.send("   ").await.unwrap();
        channel.send("").await.unwrap();

        let no_user = ChatChannel::open(store.clone(), None, Some(EventId::new("e1"))).await;
        no_user.send("hello").await.unwrap();
        assert!(!no_user.is_loading());

        let no_event = ChatChannel::open(store.clone(), Some(user("alice", None)), None).await;
        no_event.send("hello").await.unwrap();

        assert!(store.query_collection(&collection, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_propagates_and_feed_stays_clean() {
        let inner = Arc::new(MemoryStore::new());
        let flaky = Arc::new(FlakyStore::new(inner));

        let channel = ChatChannel::open(
            flaky.clone(),
            Some(user("alice", None)),
            Some(EventId::new("e1")),
        )
        .await;
        wait_for_messages(&channel, 0).await;

        flaky.fail_writes(true);
        let err = channel.send("hello").await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(!channel.is_sending());
        assert!(channel.messages().is_empty());
    }

    #[tokio::test]
    async fn test_two_senders_interleave_by_commit_order() {
        let store = Arc::new(MemoryStore::new());
        let event_id = EventId::new("e1");

        let alice = ChatChannel::open(
            store.clone(),
            Some(user("alice", None)),
            Some(event_id.clone()),
        )
        .await;
        let bob = ChatChannel::open(
            store.clone(),
            Some(user("bob", None)),
            Some(event_id.clone()),
        )
        .await;

        alice.send("hi").await.unwrap();
        bob.send("hey").await.unwrap();
        alice.send("how's it going").await.unwrap();

        // Both feeds converge on the same order
        let seen_by_alice = wait_for_messages(&alice, 3).await;
        let seen_by_bob = wait_for_messages(&bob, 3).await;
        assert_eq!(seen_by_alice, seen_by_bob);
    }
}
