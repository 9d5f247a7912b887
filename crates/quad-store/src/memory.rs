//! In-process document store with live snapshot subscriptions.
//!
//! Backing state is a plain map of collection path → (id → payload),
//! guarded by a mutex that is never held across an await. Each collection
//! has a tokio broadcast channel that carries change ticks; a subscription
//! re-reads the collection on every tick, so a lagged receiver still
//! observes the latest state (snapshots are state-based, not deltas).

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::document::{compare_fields, is_server_timestamp, Document};
use crate::error::StoreError;
use crate::store::{DocumentStore, SnapshotStream};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
struct Shared {
    collections: HashMap<String, BTreeMap<String, Value>>,
}

/// In-memory [`DocumentStore`] implementation.
///
/// Cloning is cheap and every clone observes the same state, so one
/// instance can be shared between the sync layer and tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Mutex<Shared>>,
    watchers: Arc<Mutex<HashMap<String, broadcast::Sender<()>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn notify(&self, collection: &str) {
        let watchers = self.watchers.lock().expect("watchers lock poisoned");
        if let Some(tx) = watchers.get(collection) {
            // No receivers is fine
            let _ = tx.send(());
        }
    }

    fn change_channel(&self, collection: &str) -> broadcast::Receiver<()> {
        let mut watchers = self.watchers.lock().expect("watchers lock poisoned");
        watchers
            .entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(CHANGE_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    fn read_collection(
        shared: &Mutex<Shared>,
        collection: &str,
        order_by: Option<&str>,
    ) -> Vec<Document> {
        let guard = shared.lock().expect("store lock poisoned");
        let mut docs: Vec<Document> = guard
            .collections
            .get(collection)
            .map(|col| {
                col.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        drop(guard);

        if let Some(field) = order_by {
            docs.sort_by(|a, b| compare_fields(a.field(field), b.field(field)));
        }
        docs
    }
}

/// Replace top-level server-timestamp sentinels with the commit time.
fn resolve_sentinels(data: &mut Value) {
    let now = Utc::now().timestamp_millis();
    if let Some(obj) = data.as_object_mut() {
        for value in obj.values_mut() {
            if is_server_timestamp(value) {
                *value = Value::from(now);
            }
        }
    }
}

fn require_object(data: &Value) -> Result<(), StoreError> {
    if data.is_object() {
        Ok(())
    } else {
        Err(StoreError::InvalidDocument(format!(
            "expected a JSON object, got {data}"
        )))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let guard = self.shared.lock().expect("store lock poisoned");
        Ok(guard
            .collections
            .get(collection)
            .and_then(|col| col.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn set_document(&self, collection: &str, id: &str, mut data: Value) -> Result<(), StoreError> {
        require_object(&data)?;
        resolve_sentinels(&mut data);
        {
            let mut guard = self.shared.lock().expect("store lock poisoned");
            guard
                .collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), data);
        }
        debug!(collection, id, "document set");
        self.notify(collection);
        Ok(())
    }

    async fn update_document(&self, collection: &str, id: &str, mut patch: Value) -> Result<(), StoreError> {
        require_object(&patch)?;
        resolve_sentinels(&mut patch);
        {
            let mut guard = self.shared.lock().expect("store lock poisoned");
            let existing = guard
                .collections
                .get_mut(collection)
                .and_then(|col| col.get_mut(id))
                .ok_or(StoreError::NotFound)?;

            let target = existing
                .as_object_mut()
                .expect("stored payloads are always objects");
            if let Value::Object(fields) = patch {
                for (key, value) in fields {
                    target.insert(key, value);
                }
            }
        }
        debug!(collection, id, "document updated");
        self.notify(collection);
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let removed = {
            let mut guard = self.shared.lock().expect("store lock poisoned");
            guard
                .collections
                .get_mut(collection)
                .and_then(|col| col.remove(id))
                .is_some()
        };
        if removed {
            debug!(collection, id, "document deleted");
            self.notify(collection);
        }
        Ok(())
    }

    async fn add_document(&self, collection: &str, mut data: Value) -> Result<String, StoreError> {
        require_object(&data)?;
        resolve_sentinels(&mut data);
        let id = Uuid::new_v4().simple().to_string();
        {
            let mut guard = self.shared.lock().expect("store lock poisoned");
            guard
                .collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), data);
        }
        debug!(collection, id = %id, "document added");
        self.notify(collection);
        Ok(id)
    }

    async fn query_collection(
        &self,
        collection: &str,
        order_by: Option<&str>,
    ) -> Result<Vec<Document>, StoreError> {
        Ok(Self::read_collection(&self.shared, collection, order_by))
    }

    async fn subscribe(
        &self,
        collection: &str,
        order_by: Option<&str>,
    ) -> Result<Box<dyn SnapshotStream>, StoreError> {
        let rx = self.change_channel(collection);
        debug!(collection, "subscription established");
        Ok(Box::new(MemorySnapshotStream {
            shared: Arc::clone(&self.shared),
            collection: collection.to_string(),
            order_by: order_by.map(str::to_string),
            rx,
            primed: false,
        }))
    }
}

struct MemorySnapshotStream {
    shared: Arc<Mutex<Shared>>,
    collection: String,
    order_by: Option<String>,
    rx: broadcast::Receiver<()>,
    primed: bool,
}

impl MemorySnapshotStream {
    fn snapshot(&self) -> Vec<Document> {
        MemoryStore::read_collection(&self.shared, &self.collection, self.order_by.as_deref())
    }
}

#[async_trait]
impl SnapshotStream for MemorySnapshotStream {
    async fn next(&mut self) -> Option<Vec<Document>> {
        if !self.primed {
            self.primed = true;
            return Some(self.snapshot());
        }
        match self.rx.recv().await {
            Ok(()) => Some(self.snapshot()),
            // Fell behind: the snapshot read is already current, so the
            // missed ticks lose nothing.
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                debug!(collection = %self.collection, missed, "subscription lagged, resyncing");
                Some(self.snapshot())
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}
