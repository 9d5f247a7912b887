/// Application name
pub const APP_NAME: &str = "Quad";

/// Minutes before an OTP code expires
pub const OTP_EXPIRY_MINUTES: i64 = 10;

/// Number of digits in an OTP code
pub const OTP_LENGTH: usize = 6;

/// Failed verification attempts before the OTP record is discarded
pub const OTP_MAX_ATTEMPTS: u32 = 3;

/// How long before an event its reminder notification fires
pub const REMINDER_LEAD_MINUTES: i64 = 60;

/// Email domain accepted for account verification
pub const STUDENT_EMAIL_DOMAIN: &str = "student.ubc.ca";

/// Sender name used when a user has neither a profile name nor an email
pub const FALLBACK_SENDER_NAME: &str = "Anonymous";
