//! Input validation applied before any store I/O.

use crate::constants::{OTP_LENGTH, STUDENT_EMAIL_DOMAIN};

/// Whether `email` is a campus student address (`…@student.ubc.ca`).
///
/// Local parts are matched permissively: letters, digits and `.`, `_`, `-`,
/// which covers every CWL id we have seen.
pub fn is_student_email(email: &str) -> bool {
    let trimmed = email.trim();
    let Some((local, domain)) = trimmed.split_once('@') else {
        return false;
    };

    if !domain.eq_ignore_ascii_case(STUDENT_EMAIL_DOMAIN) {
        return false;
    }

    !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Whether `code` has the shape of an OTP: exactly six ASCII digits.
pub fn is_otp_shaped(code: &str) -> bool {
    code.len() == OTP_LENGTH && code.chars().all(|c| c.is_ascii_digit())
}
