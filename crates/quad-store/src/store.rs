//! The `DocumentStore` trait that backends implement.

use async_trait::async_trait;
use serde_json::Value;

use crate::document::Document;
use crate::error::StoreError;

/// A live query-snapshot subscription.
///
/// A fresh subscription replays the full current state of the collection
/// first, then yields a new full snapshot on every subsequent change.
/// Dropping the stream unsubscribes.
#[async_trait]
pub trait SnapshotStream: Send {
    /// The next snapshot, or `None` once the store has shut down.
    async fn next(&mut self) -> Option<Vec<Document>>;
}

/// Generic keyed-document persistence with snapshot subscriptions.
///
/// All consistency is last-write-wins at document granularity; no
/// client-side locking exists anywhere above this trait.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read. `Ok(None)` when the document does not exist.
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Upsert, full replace. `data` must be a JSON object and may contain
    /// [`server_timestamp`](crate::document::server_timestamp) sentinels
    /// at the top level.
    async fn set_document(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError>;

    /// Merge `patch` into an existing document, top-level field by field.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the document does not exist.
    async fn update_document(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError>;

    /// Delete a document. Deleting an absent document is not an error.
    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Append a document under a store-generated id; returns that id.
    async fn add_document(&self, collection: &str, data: Value) -> Result<String, StoreError>;

    /// One-shot read of a whole collection, optionally ordered ascending
    /// by a top-level field.
    async fn query_collection(
        &self,
        collection: &str,
        order_by: Option<&str>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Continuous snapshot subscription over a collection, with the same
    /// optional ordering as [`query_collection`](Self::query_collection).
    async fn subscribe(
        &self,
        collection: &str,
        order_by: Option<&str>,
    ) -> Result<Box<dyn SnapshotStream>, StoreError>;
}
