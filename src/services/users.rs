use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::TokenIssuer;
use crate::db::models::{User, UserInfo};
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

use super::{parse_id, timestamp};

pub fn create_user(pool: &DbPool, username: &str, password: &str) -> AppResult<User> {
    if username.trim().is_empty() {
        return Err(AppError::Validation(
            "username must not be empty".to_string(),
        ));
    }
    // hash_password rejects an empty password
    let password_hash = hash_password(password)?;
    let id = Uuid::now_v7().to_string();
    let created_at = timestamp();

    let conn = pool.get()?;
    let inserted = conn.execute(
        "INSERT INTO users (id, username, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![id, username, password_hash, created_at],
    );
    match inserted {
        Ok(_) => Ok(User {
            id,
            username: username.to_string(),
            password_hash,
            created_at,
        }),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(AppError::DuplicateUsername)
        }
        Err(e) => Err(e.into()),
    }
}

/// Check credentials and return a signed bearer token. Unknown username
/// and wrong password fail identically so callers cannot probe for
/// which usernames exist.
pub fn login(
    pool: &DbPool,
    tokens: &TokenIssuer,
    username: &str,
    password: &str,
) -> AppResult<String> {
    let conn = pool.get()?;
    let found: Option<(String, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM users WHERE username = ?1",
            params![username],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let (user_id, password_hash) = found.ok_or(AppError::InvalidCredentials)?;
    if !verify_password(password, &password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    Ok(tokens.issue(&user_id)?)
}

pub fn get_user_info_by_id(pool: &DbPool, id: &str) -> AppResult<Option<UserInfo>> {
    parse_id(id)?;
    let conn = pool.get()?;
    let info = conn
        .query_row(
            "SELECT username FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok(UserInfo {
                    username: row.get(0)?,
                })
            },
        )
        .optional()?;
    Ok(info)
}
