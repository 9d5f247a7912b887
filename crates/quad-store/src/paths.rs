//! Logical collection paths of the persisted state layout.
//!
//! - `events/{eventId}`: event entities
//! - `events/{eventId}/messages/{messageId}`: chat messages
//! - `users/{userId}/rsvps/{eventId}`: RSVP records
//! - `emailVerification/{email}`: live OTP records
//! - `verifiedEmails/{email}`: permanent verified markers

use quad_shared::{EventId, UserId};

pub const EVENTS: &str = "events";
pub const USERS: &str = "users";
pub const EMAIL_VERIFICATION: &str = "emailVerification";
pub const VERIFIED_EMAILS: &str = "verifiedEmails";

/// Chat message subcollection of one event.
pub fn event_messages(event_id: &EventId) -> String {
    format!("{EVENTS}/{event_id}/messages")
}

/// RSVP subcollection of one user.
pub fn user_rsvps(user_id: &UserId) -> String {
    format!("{USERS}/{user_id}/rsvps")
}
