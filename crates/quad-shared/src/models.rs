//! Domain model structs persisted in the document store.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be written
//! to and decoded from store documents. Timestamps are stored as epoch
//! milliseconds so the store's `order_by` compares them numerically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EventId, UserId};

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// Category ids a campus event can be filed under.
///
/// Unknown ids decode as [`EventCategory::Other`] so old clients keep
/// working when a new category ships.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Academic,
    Social,
    Sports,
    Cultural,
    Career,
    Outdoor,
    Technology,
    Music,
    Food,
    Volunteer,
    Health,
    #[serde(other)]
    Other,
}

/// A campus event. Created by any authenticated user; mutable and
/// deletable only by its creator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    /// Free-text location shown to attendees.
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category: EventCategory,
    /// When the event starts.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub created_by: UserId,
}

// ---------------------------------------------------------------------------
// RSVP
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    Confirmed,
}

/// One user's attendance record for one event, stored under the user's
/// namespace at `users/{uid}/rsvps/{eventId}`.
///
/// Existence of the record is the sole source of truth for "is attending";
/// at most one record exists per (user, event) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RsvpRecord {
    pub event_id: EventId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    pub status: RsvpStatus,
    /// Opaque handle of the scheduled reminder, when one was created.
    /// A back-reference, not ownership: the scheduler owns the reminder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A single event-chat message. Immutable once written; append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub text: String,
    pub user_id: UserId,
    /// Sender display name denormalised at send time.
    pub user_name: String,
    /// Server-assigned on write.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Email verification
// ---------------------------------------------------------------------------

/// A live OTP issuance, keyed by email at `emailVerification/{email}`.
/// At most one per email; superseded by delete-then-recreate on resend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OtpRecord {
    /// 6-digit code, kept as a string so leading zeros survive.
    pub otp: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expiry_time: DateTime<Utc>,
    pub attempts: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Permanent marker written at `verifiedEmails/{email}` once an OTP was
/// entered correctly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedEmail {
    pub email: String,
    pub verified: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub verified_at: DateTime<Utc>,
}
