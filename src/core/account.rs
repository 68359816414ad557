use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("enter a valid e-mail address")]
    InvalidEmail,
    #[error("password must be at least 6 characters")]
    PasswordTooShort,
}

/// Local checks run before credentials are sent to the auth service.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), CredentialError> {
    if !EMAIL_RE.is_match(email.trim()) {
        return Err(CredentialError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CredentialError::PasswordTooShort);
    }
    Ok(())
}
