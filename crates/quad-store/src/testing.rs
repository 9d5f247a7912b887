//! Fault injection for exercising error paths in dependent crates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::document::Document;
use crate::error::StoreError;
use crate::store::{DocumentStore, SnapshotStream};

/// Wraps any store and fails reads and/or writes on demand.
pub struct FlakyStore {
    inner: Arc<dyn DocumentStore>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    fn write_gate(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Backend("injected write failure".into()))
        } else {
            Ok(())
        }
    }

    fn read_gate(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(StoreError::Backend("injected read failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.read_gate()?;
        self.inner.get_document(collection, id).await
    }

    async fn set_document(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        self.write_gate()?;
        self.inner.set_document(collection, id, data).await
    }

    async fn update_document(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        self.write_gate()?;
        self.inner.update_document(collection, id, patch).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.write_gate()?;
        self.inner.delete_document(collection, id).await
    }

    async fn add_document(&self, collection: &str, data: Value) -> Result<String, StoreError> {
        self.write_gate()?;
        self.inner.add_document(collection, data).await
    }

    async fn query_collection(
        &self,
        collection: &str,
        order_by: Option<&str>,
    ) -> Result<Vec<Document>, StoreError> {
        self.read_gate()?;
        self.inner.query_collection(collection, order_by).await
    }

    async fn subscribe(
        &self,
        collection: &str,
        order_by: Option<&str>,
    ) -> Result<Box<dyn SnapshotStream>, StoreError> {
        self.read_gate()?;
        self.inner.subscribe(collection, order_by).await
    }
}
