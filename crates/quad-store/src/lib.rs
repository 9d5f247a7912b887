//! # quad-store
//!
//! The document-store boundary of the Quad app: a generic keyed-document
//! persistence trait with point reads, writes, deletes and live
//! query-snapshot subscriptions, plus [`MemoryStore`], a complete
//! in-process implementation used by the app shell and by every test.
//!
//! Consistency is last-write-wins at document granularity; subscriptions
//! deliver the full current state of a collection on every change
//! (at-least-once, state-based, so a dropped intermediate snapshot is
//! harmless).

pub mod document;
pub mod memory;
pub mod paths;
pub mod store;

mod error;

#[cfg(feature = "test-support")]
pub mod testing;

pub use document::{server_timestamp, Document};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{DocumentStore, SnapshotStream};
