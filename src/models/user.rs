//! Customer identity checks. Accounts live in the storefront; attribution only
//! needs to validate billing emails and test whether an account exists.

use crate::error::{AppError, Result};

/// Basic email format validation.
///
/// Checks for exactly one `@`, a non-empty local part without spaces, and a
/// dotted domain that does not start or end with a dot. Intentionally
/// permissive; not an RFC 5322 parser.
pub fn validate_email_format(email: &str) -> Result<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(AppError::BadRequest("Email cannot be empty".into()));
    }

    let Some((local_part, domain_part)) = email.split_once('@') else {
        return Err(AppError::BadRequest("Invalid email format".into()));
    };

    if local_part.is_empty() || local_part.contains(' ') || domain_part.contains('@') {
        return Err(AppError::BadRequest("Invalid email format".into()));
    }

    if domain_part.is_empty()
        || !domain_part.contains('.')
        || domain_part.starts_with('.')
        || domain_part.ends_with('.')
    {
        return Err(AppError::BadRequest("Invalid email format".into()));
    }

    Ok(())
}
