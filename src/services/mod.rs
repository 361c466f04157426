pub mod images;
pub mod posts;
pub mod users;

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Reject ids that are not structurally valid UUIDs before they reach a
/// query. A malformed id is a caller bug and fails loudly instead of
/// reading as "not found".
pub(crate) fn parse_id(id: &str) -> AppResult<()> {
    match Uuid::parse_str(id) {
        Ok(_) => Ok(()),
        Err(_) => Err(AppError::InvalidId(id.to_string())),
    }
}

/// Current time as RFC 3339 with microseconds. Fixed-width, so string
/// comparison in ORDER BY matches chronological order.
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
