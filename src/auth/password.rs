use bcrypt::DEFAULT_COST;

use crate::error::{AppError, AppResult};

/// Hash a password with bcrypt. Each call salts independently, so
/// hashing the same password twice yields different strings.
pub fn hash_password(password: &str) -> AppResult<String> {
    if password.trim().is_empty() {
        return Err(AppError::Validation(
            "password must not be empty".to_string(),
        ));
    }
    Ok(bcrypt::hash(password, DEFAULT_COST)?)
}

/// Check a password against a stored hash. A mismatch is Ok(false),
/// not an error; only a malformed hash fails.
pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    Ok(bcrypt::verify(password, password_hash)?)
}
