//! Email ownership verification via short-lived, attempt-limited OTP
//! codes.
//!
//! One live OTP record per email, superseded by delete-then-recreate on
//! resend. A correct code converts into a permanent verified-email marker;
//! expiry or three failed attempts delete the record and force a fresh
//! issuance. The attempt counter is a plain read-then-write: two racing
//! verifications can both observe the same count and undercount by one;
//! accepted for this single-device flow, the increment is not atomic.
//!
//! There is no mailer integration; issued codes surface on the diagnostic
//! log where a production deployment would plug in delivery.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use quad_shared::constants::{OTP_EXPIRY_MINUTES, OTP_MAX_ATTEMPTS};
use quad_shared::validators::{is_otp_shaped, is_student_email};
use quad_shared::{OtpRecord, VerifiedEmail};
use quad_store::{paths, DocumentStore, StoreError};

/// Failures of [`EmailVerification::send_otp`] /
/// [`EmailVerification::resend_otp`]. Display strings are the user-facing
/// messages.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("Please use your UBC student email address.")]
    InvalidEmail,

    #[error("Failed to send OTP. Please try again.")]
    Store(#[source] StoreError),
}

/// Failures of [`EmailVerification::verify_otp`]. Display strings are the
/// user-facing messages.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Please enter the 6-digit code.")]
    InvalidCode,

    #[error("OTP not found. Please request a new one.")]
    NotFound,

    #[error("OTP has expired. Please request a new one.")]
    Expired,

    #[error("Too many failed attempts. Please request a new OTP.")]
    TooManyAttempts,

    #[error("Invalid OTP. {remaining} attempts remaining.")]
    Mismatch { remaining: u32 },

    #[error("Error verifying OTP. Please try again.")]
    Store(#[source] StoreError),
}

/// The OTP record lifecycle against the store. Constructed per app, not a
/// process-wide singleton, so tests can hand it a fake store.
pub struct EmailVerification {
    store: Arc<dyn DocumentStore>,
}

impl EmailVerification {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Uniformly random 6-digit code; leading zeros allowed, hence the
    /// string representation.
    fn generate_otp() -> String {
        format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
    }

    /// Issue a fresh OTP for `email`: 10-minute expiry, zero attempts,
    /// replacing any live record. Returns the user-facing confirmation.
    pub async fn send_otp(&self, email: &str) -> Result<String, SendError> {
        let email = email.trim();
        if !is_student_email(email) {
            return Err(SendError::InvalidEmail);
        }

        let now = Utc::now();
        let record = OtpRecord {
            otp: Self::generate_otp(),
            expiry_time: now + Duration::minutes(OTP_EXPIRY_MINUTES),
            attempts: 0,
            created_at: now,
        };

        let value = serde_json::to_value(&record).map_err(|e| SendError::Store(e.into()))?;
        self.store
            .set_document(paths::EMAIL_VERIFICATION, email, value)
            .await
            .map_err(SendError::Store)?;

        // Delivery side channel until a real mailer is wired in
        info!(email, otp = %record.otp, expires = %record.expiry_time, "OTP issued");
        Ok(format!("OTP sent to {email}. Check your email."))
    }

    /// Delete any live record, then issue a fresh one. Always resets the
    /// attempt counter and expiry, whatever state the old record was in.
    pub async fn resend_otp(&self, email: &str) -> Result<String, SendError> {
        let email = email.trim();
        self.store
            .delete_document(paths::EMAIL_VERIFICATION, email)
            .await
            .map_err(SendError::Store)?;
        self.send_otp(email).await
    }

    /// Check `code` against the live record for `email`.
    ///
    /// On success the permanent verified-email marker is written and the
    /// OTP record removed. Expired or attempt-exhausted records are
    /// deleted on sight; a mismatch only bumps the attempt counter.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<String, VerifyError> {
        let email = email.trim();
        if !is_otp_shaped(code) {
            return Err(VerifyError::InvalidCode);
        }

        let doc = self
            .store
            .get_document(paths::EMAIL_VERIFICATION, email)
            .await
            .map_err(VerifyError::Store)?
            .ok_or(VerifyError::NotFound)?;
        let record: OtpRecord = doc
            .decode()
            .map_err(|e| VerifyError::Store(e.into()))?;

        if Utc::now() > record.expiry_time {
            self.store
                .delete_document(paths::EMAIL_VERIFICATION, email)
                .await
                .map_err(VerifyError::Store)?;
            return Err(VerifyError::Expired);
        }

        if record.attempts >= OTP_MAX_ATTEMPTS {
            self.store
                .delete_document(paths::EMAIL_VERIFICATION, email)
                .await
                .map_err(VerifyError::Store)?;
            return Err(VerifyError::TooManyAttempts);
        }

        if record.otp == code {
            let marker = VerifiedEmail {
                email: email.to_string(),
                verified: true,
                verified_at: Utc::now(),
            };
            let value =
                serde_json::to_value(&marker).map_err(|e| VerifyError::Store(e.into()))?;
            self.store
                .set_document(paths::VERIFIED_EMAILS, email, value)
                .await
                .map_err(VerifyError::Store)?;
            self.store
                .delete_document(paths::EMAIL_VERIFICATION, email)
                .await
                .map_err(VerifyError::Store)?;

            info!(email, "email verified");
            Ok("Email verified successfully!".to_string())
        } else {
            // Read-then-write, not atomic: racing calls may undercount
            self.store
                .update_document(
                    paths::EMAIL_VERIFICATION,
                    email,
                    serde_json::json!({ "attempts": record.attempts + 1 }),
                )
                .await
                .map_err(VerifyError::Store)?;

            Err(VerifyError::Mismatch {
                remaining: 2 - record.attempts,
            })
        }
    }

    /// Whether the permanent marker exists. Pure read; store failures are
    /// logged and reported as "not verified".
    pub async fn is_email_verified(&self, email: &str) -> bool {
        match self
            .store
            .get_document(paths::VERIFIED_EMAILS, email.trim())
            .await
        {
            Ok(doc) => doc.is_some(),
            Err(e) => {
                warn!(email, error = %e, "failed to check email verification");
                false
            }
        }
    }

    /// Delete every expired OTP record. Meant to be called periodically
    /// by whoever owns the service.
    pub async fn sweep_expired(&self) -> Result<usize, StoreError> {
        let docs = self
            .store
            .query_collection(paths::EMAIL_VERIFICATION, None)
            .await?;

        let now = Utc::now();
        let mut removed = 0;
        for doc in docs {
            let expired = match doc.decode::<OtpRecord>() {
                Ok(record) => now > record.expiry_time,
                // Undecodable records are junk, sweep them too
                Err(_) => true,
            };
            if expired {
                self.store
                    .delete_document(paths::EMAIL_VERIFICATION, &doc.id)
                    .await?;
                removed += 1;
            }
        }

        if removed > 0 {
            info!(removed, "swept expired OTP records");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quad_store::MemoryStore;
    use serde_json::json;

    const EMAIL: &str = "x@student.ubc.ca";

    fn service(store: &Arc<MemoryStore>) -> EmailVerification {
        EmailVerification::new(store.clone())
    }

    async fn issued_code(store: &MemoryStore, email: &str) -> String {
        let doc = store
            .get_document(paths::EMAIL_VERIFICATION, email)
            .await
            .unwrap()
            .expect("OTP record exists");
        doc.decode::<OtpRecord>().unwrap().otp
    }

    fn wrong_code(right: &str) -> String {
        if right == "000000" {
            "000001".to_string()
        } else {
            "000000".to_string()
        }
    }

    #[tokio::test]
    async fn test_send_then_verify_happy_path() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);

        service.send_otp(EMAIL).await.unwrap();
        assert!(!service.is_email_verified(EMAIL).await);

        let code = issued_code(&store, EMAIL).await;
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        let message = service.verify_otp(EMAIL, &code).await.unwrap();
        assert_eq!(message, "Email verified successfully!");

        // Marker exists, OTP record gone
        assert!(service.is_email_verified(EMAIL).await);
        assert!(store
            .get_document(paths::EMAIL_VERIFICATION, EMAIL)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_rejects_non_student_email_before_io() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);

        let err = service.send_otp("x@gmail.com").await.unwrap_err();
        assert!(matches!(err, SendError::InvalidEmail));
        assert!(store
            .query_collection(paths::EMAIL_VERIFICATION, None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_malformed_code_rejected_before_io() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        service.send_otp(EMAIL).await.unwrap();

        for bad in ["12345", "1234567", "12345a", ""] {
            let err = service.verify_otp(EMAIL, bad).await.unwrap_err();
            assert!(matches!(err, VerifyError::InvalidCode));
        }

        // Record untouched: attempts still zero
        let doc = store
            .get_document(paths::EMAIL_VERIFICATION, EMAIL)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.decode::<OtpRecord>().unwrap().attempts, 0);
    }

    #[tokio::test]
    async fn test_verify_without_record_reports_not_found() {
        let store = Arc::new(MemoryStore::new());
        let err = service(&store)
            .verify_otp(EMAIL, "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::NotFound));
    }

    #[tokio::test]
    async fn test_attempt_exhaustion_deletes_record() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        service.send_otp(EMAIL).await.unwrap();
        let wrong = wrong_code(&issued_code(&store, EMAIL).await);

        // The remaining-attempts message counts down 2, 1, 0
        for expected_remaining in [2u32, 1, 0] {
            let err = service.verify_otp(EMAIL, &wrong).await.unwrap_err();
            match err {
                VerifyError::Mismatch { remaining } => assert_eq!(remaining, expected_remaining),
                other => panic!("expected mismatch, got {other}"),
            }
        }

        // Three failures leave the record in place with the counter maxed;
        // the next call trips the lockout and deletes it
        let record: OtpRecord = store
            .get_document(paths::EMAIL_VERIFICATION, EMAIL)
            .await
            .unwrap()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(record.attempts, 3);

        let err = service.verify_otp(EMAIL, &wrong).await.unwrap_err();
        assert!(matches!(err, VerifyError::TooManyAttempts));
        assert!(store
            .get_document(paths::EMAIL_VERIFICATION, EMAIL)
            .await
            .unwrap()
            .is_none());

        // Locked out even with the correct code, until a fresh send
        let err = service.verify_otp(EMAIL, "123456").await.unwrap_err();
        assert!(matches!(err, VerifyError::NotFound));

        service.send_otp(EMAIL).await.unwrap();
        let code = issued_code(&store, EMAIL).await;
        service.verify_otp(EMAIL, &code).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_record_is_deleted_on_verify() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);

        // Plant an already-expired record
        let past = Utc::now() - Duration::minutes(1);
        store
            .set_document(
                paths::EMAIL_VERIFICATION,
                EMAIL,
                json!({
                    "otp": "123456",
                    "expiryTime": past.timestamp_millis(),
                    "attempts": 0,
                    "createdAt": (past - Duration::minutes(10)).timestamp_millis(),
                }),
            )
            .await
            .unwrap();

        let err = service.verify_otp(EMAIL, "123456").await.unwrap_err();
        assert!(matches!(err, VerifyError::Expired));
        assert!(store
            .get_document(paths::EMAIL_VERIFICATION, EMAIL)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_resend_resets_attempts_and_code() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);

        service.send_otp(EMAIL).await.unwrap();
        let wrong = wrong_code(&issued_code(&store, EMAIL).await);
        let _ = service.verify_otp(EMAIL, &wrong).await.unwrap_err();
        let _ = service.verify_otp(EMAIL, &wrong).await.unwrap_err();

        service.resend_otp(EMAIL).await.unwrap();
        let record: OtpRecord = store
            .get_document(paths::EMAIL_VERIFICATION, EMAIL)
            .await
            .unwrap()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(record.attempts, 0);

        let code = issued_code(&store, EMAIL).await;
        service.verify_otp(EMAIL, &code).await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_records() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);

        service.send_otp(EMAIL).await.unwrap();
        let past = Utc::now() - Duration::minutes(1);
        store
            .set_document(
                paths::EMAIL_VERIFICATION,
                "old@student.ubc.ca",
                json!({
                    "otp": "111111",
                    "expiryTime": past.timestamp_millis(),
                    "attempts": 1,
                    "createdAt": past.timestamp_millis(),
                }),
            )
            .await
            .unwrap();

        assert_eq!(service.sweep_expired().await.unwrap(), 1);

        assert!(store
            .get_document(paths::EMAIL_VERIFICATION, EMAIL)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .get_document(paths::EMAIL_VERIFICATION, "old@student.ubc.ca")
            .await
            .unwrap()
            .is_none());
    }
}
