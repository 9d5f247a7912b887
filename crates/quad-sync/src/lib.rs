//! # quad-sync
//!
//! Client-side real-time synchronization core of the Quad campus-events
//! app: the data trackers behind every screen (event catalog, RSVP
//! membership and count, event chat) plus the email verification workflow.
//!
//! Each tracker owns its store subscription and publishes derived state
//! through a `tokio::sync::watch` channel; dropping or closing a tracker
//! tears the subscription down. Services come in as `Arc<dyn …>` handles
//! ([`DocumentStore`](quad_store::DocumentStore),
//! [`NotificationScheduler`](quad_notify::NotificationScheduler)) so tests
//! can substitute in-memory implementations.
//!
//! Consistency model: the store is last-write-wins at document
//! granularity. Mutations are optimistic (local state flips with the
//! single write call, no further acknowledgement awaited) and concurrent
//! sessions race without conflict detection. Chat is the exception: sends
//! are never locally echoed, messages appear only once the subscription
//! delivers them.

pub mod catalog;
pub mod chat;
pub mod maintenance;
pub mod rsvp;
pub mod rsvp_count;
pub mod verification;

pub use catalog::{CatalogState, EventCatalog};
pub use chat::{ChatChannel, ChatState};
pub use rsvp::{Attendance, RsvpState, RsvpTracker};
pub use rsvp_count::{RsvpCountState, RsvpCounter};
pub use verification::{EmailVerification, SendError, VerifyError};
