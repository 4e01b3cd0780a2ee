//! Local validation run before any submit reaches the network

use crate::error::ValidationError;

/// Minimum whitespace-separated tokens in a submitted text
pub const MIN_WORDS: usize = 2;

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// `local@domain.tld` shape check; an empty address is always valid
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() {
        return true;
    }
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty() && !host.ends_with('.'),
        None => false,
    }
}

/// Gate for the submit control
pub fn validate_submission(text: &str, email: &str) -> Result<(), ValidationError> {
    let found = word_count(text);
    if found < MIN_WORDS {
        return Err(ValidationError::TooFewWords { found });
    }
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}
