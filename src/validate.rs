use std::time::Duration;

pub const MESSAGE_MAX_LEN: usize = 140_000;
pub const NOTE_ID_LEN: usize = 22;
pub const DELETE_TOKEN_LEN: usize = 32;
pub const IV_MIN_LEN: usize = 16;
pub const IV_MAX_LEN: usize = 24;
pub const SALT_MIN_LEN: usize = 16;
pub const SALT_MAX_LEN: usize = 64;

/// Accepted note lifetimes in milliseconds: 1 min, 3 min, 5 min, 10 min,
/// 1 hour, 24 hours, 1 week. Anything else is rejected outright.
pub const ALLOWED_EXPIRIES_MS: [u64; 7] = [
    60_000,
    180_000,
    300_000,
    600_000,
    3_600_000,
    86_400_000,
    604_800_000,
];

pub const DEFAULT_EXPIRY_MS: u64 = 86_400_000;

fn is_url_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_base64(c: char) -> bool {
    is_url_safe(c) || c == '+' || c == '/' || c == '='
}

pub fn check_message(message: &str) -> Result<(), &'static str> {
    if message.is_empty() {
        return Err("message cannot be empty");
    }
    if message.len() > MESSAGE_MAX_LEN {
        return Err("message too large");
    }
    if !message.chars().all(is_base64) {
        return Err("message must contain base64 content only");
    }
    Ok(())
}

pub fn check_iv(iv: &str) -> Result<(), &'static str> {
    if iv.len() < IV_MIN_LEN || iv.len() > IV_MAX_LEN || !iv.chars().all(is_url_safe) {
        return Err("iv must be 16-24 url-safe characters");
    }
    Ok(())
}

pub fn check_salt(salt: &str) -> Result<(), &'static str> {
    if salt.len() < SALT_MIN_LEN || salt.len() > SALT_MAX_LEN || !salt.chars().all(is_url_safe) {
        return Err("salt must be 16-64 url-safe characters");
    }
    Ok(())
}

/// Malformed ids never reach storage; the format is checked first.
pub fn check_note_id(note_id: &str) -> Result<(), &'static str> {
    if note_id.len() != NOTE_ID_LEN || !note_id.chars().all(is_url_safe) {
        return Err("note id must be exactly 22 url-safe characters");
    }
    Ok(())
}

pub fn check_delete_token(token: &str) -> Result<(), &'static str> {
    if token.len() != DELETE_TOKEN_LEN || !token.chars().all(is_url_safe) {
        return Err("delete token must be exactly 32 url-safe characters");
    }
    Ok(())
}

/// Resolves the requested expiry against the allow-list. An absent field
/// falls back to the 24 hour default; a present but unlisted value is an
/// error, never clamped.
pub fn expiry_duration(expiry: Option<u64>) -> Result<Duration, &'static str> {
    match expiry {
        None => Ok(Duration::from_millis(DEFAULT_EXPIRY_MS)),
        Some(ms) if ALLOWED_EXPIRIES_MS.contains(&ms) => Ok(Duration::from_millis(ms)),
        Some(_) => Err("expiry must be one of the allowed durations"),
    }
}
