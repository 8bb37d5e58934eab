//! Input validation shared by the handlers.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, Result};

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,30}$").expect("username regex is valid"));

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
});

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_CONTENT_LEN: usize = 500;
pub const MAX_REASON_LEN: usize = 500;

pub fn username(name: &str) -> Result<()> {
    if USERNAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(AppError::validation(
            "username must be 3-30 letters, digits or underscores",
        ))
    }
}

pub fn email(address: &str) -> Result<()> {
    if address.len() <= 254 && EMAIL_REGEX.is_match(address) {
        Ok(())
    } else {
        Err(AppError::validation("invalid email address"))
    }
}

pub fn password(password: &str) -> Result<()> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )))
    }
}

/// Thread and comment bodies: non-blank and at most `MAX_CONTENT_LEN` characters.
pub fn content(text: &str) -> Result<()> {
    bounded_text("content", text, MAX_CONTENT_LEN)
}

pub fn reason(text: &str) -> Result<()> {
    bounded_text("reason", text, MAX_REASON_LEN)
}

fn bounded_text(field: &str, text: &str, max: usize) -> Result<()> {
    if text.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if text.chars().count() > max {
        return Err(AppError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}
