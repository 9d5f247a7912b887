//! # quad-shared
//!
//! Domain model shared by every crate of the Quad campus-events app:
//! typed ids, the authenticated-session view, event / RSVP / chat / OTP
//! records, and the campus email validator.

pub mod constants;
pub mod models;
pub mod types;
pub mod validators;

pub use models::*;
pub use types::{CurrentUser, EventId, UserId};
