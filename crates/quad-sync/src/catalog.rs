//! Event catalog: fetch-on-demand list of all events.
//!
//! Not live: the list only changes on an explicit [`EventCatalog::refetch`],
//! which callers trigger on view focus or after a local mutation.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, warn};

use quad_shared::Event;
use quad_store::{paths, Document, DocumentStore, StoreError};

/// Current catalog contents plus the initial-load flag.
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    pub events: Vec<Event>,
    pub loading: bool,
}

/// The full event collection as last fetched.
pub struct EventCatalog {
    store: Arc<dyn DocumentStore>,
    state: watch::Sender<CatalogState>,
}

impl EventCatalog {
    /// Create a catalog in the loading state; call
    /// [`refetch`](Self::refetch) to populate it.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let (state, _) = watch::channel(CatalogState {
            events: Vec::new(),
            loading: true,
        });
        Self { store, state }
    }

    /// Re-read the whole event collection.
    ///
    /// On failure the visible state falls back to an empty list with
    /// `loading` resolved, and the error is also returned so callers that
    /// care can tell "no events" from "fetch failed".
    pub async fn refetch(&self) -> Result<(), StoreError> {
        match self.store.query_collection(paths::EVENTS, None).await {
            Ok(docs) => {
                let events: Vec<Event> = docs.iter().filter_map(decode_event).collect();
                debug!(count = events.len(), "event catalog refreshed");
                self.state.send_replace(CatalogState {
                    events,
                    loading: false,
                });
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "failed to fetch events");
                self.state.send_replace(CatalogState {
                    events: Vec::new(),
                    loading: false,
                });
                Err(e)
            }
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CatalogState {
        self.state.borrow().clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Watch for state changes (each `refetch` publishes one).
    pub fn watch(&self) -> watch::Receiver<CatalogState> {
        self.state.subscribe()
    }
}

/// Stored event payloads do not carry their own id; it lives in the
/// document key and gets folded back in before decoding. Documents that
/// fail to decode are skipped, not fatal.
fn decode_event(doc: &Document) -> Option<Event> {
    let mut data = doc.data.clone();
    if let Some(obj) = data.as_object_mut() {
        obj.insert("id".to_string(), serde_json::Value::String(doc.id.clone()));
    }
    match serde_json::from_value(data) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(id = %doc.id, error = %e, "skipping undecodable event document");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quad_shared::{EventCategory, EventId, UserId};
    use quad_store::testing::FlakyStore;
    use quad_store::MemoryStore;
    use serde_json::json;

    async fn seed_event(store: &MemoryStore, id: &str, title: &str) {
        store
            .set_document(
                paths::EVENTS,
                id,
                json!({
                    "title": title,
                    "description": "",
                    "location": "Buchanan A",
                    "latitude": null,
                    "longitude": null,
                    "category": "academic",
                    "timestamp": Utc::now().timestamp_millis(),
                    "createdBy": "u1",
                }),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_refetch_populates_catalog() {
        let store = Arc::new(MemoryStore::new());
        seed_event(&store, "e1", "Study jam").await;
        seed_event(&store, "e2", "Club fair").await;

        let catalog = EventCatalog::new(store.clone());
        assert!(catalog.is_loading());

        catalog.refetch().await.unwrap();
        let state = catalog.state();
        assert!(!state.loading);
        assert_eq!(state.events.len(), 2);

        // Not live: a new event only shows up after another refetch
        seed_event(&store, "e3", "Pub night").await;
        assert_eq!(catalog.events().len(), 2);
        catalog.refetch().await.unwrap();
        assert_eq!(catalog.events().len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_failure_surfaces_empty_list_and_error() {
        let inner = Arc::new(MemoryStore::new());
        seed_event(&inner, "e1", "Study jam").await;

        let flaky = Arc::new(FlakyStore::new(inner));
        let catalog = EventCatalog::new(flaky.clone());

        catalog.refetch().await.unwrap();
        assert_eq!(catalog.events().len(), 1);

        flaky.fail_reads(true);
        let err = catalog.refetch().await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        // Observable fallback: empty list, loading resolved
        let state = catalog.state();
        assert!(state.events.is_empty());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_undecodable_documents_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        seed_event(&store, "e1", "Study jam").await;
        store
            .set_document(paths::EVENTS, "bad", json!({ "title": 7 }))
            .await
            .unwrap();

        let catalog = EventCatalog::new(store);
        catalog.refetch().await.unwrap();

        let events = catalog.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, EventId::new("e1"));
        assert_eq!(events[0].category, EventCategory::Academic);
        assert_eq!(events[0].created_by, UserId::new("u1"));
    }
}
