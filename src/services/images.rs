use rusqlite::{params, OptionalExtension, Row};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::{DeleteResult, Image};
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

use super::{parse_id, timestamp};

const IMAGE_COLUMNS: &str = "id, name, type, data, alt, uploader_id, created_at, updated_at";

/// Alt text is capped at this many characters; longer values are
/// truncated, not rejected.
const MAX_ALT_CHARS: usize = 255;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateImage {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub content_type: String,
    pub data: String,
    pub alt: Option<String>,
}

/// Only name and alt are mutable; the stored payload and content type
/// never change after upload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateImage {
    pub name: Option<String>,
    pub alt: Option<String>,
}

fn read_image_row(row: &Row) -> rusqlite::Result<Image> {
    Ok(Image {
        id: row.get(0)?,
        name: row.get(1)?,
        content_type: row.get(2)?,
        data: row.get(3)?,
        alt: row.get(4)?,
        uploader: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn truncate_alt(alt: String) -> String {
    if alt.chars().count() <= MAX_ALT_CHARS {
        alt
    } else {
        alt.chars().take(MAX_ALT_CHARS).collect()
    }
}

pub fn create_image(pool: &DbPool, uploader_id: &str, image: CreateImage) -> AppResult<Image> {
    if image.content_type.is_empty() || image.data.is_empty() {
        return Err(AppError::Validation(
            "Image data and type are required".to_string(),
        ));
    }
    if uploader_id.is_empty() {
        return Err(AppError::Validation("uploader is required".to_string()));
    }

    // An empty name falls back the same way a missing one does
    let name = image
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());
    let alt = truncate_alt(image.alt.unwrap_or_default());

    let id = Uuid::now_v7().to_string();
    let now = timestamp();

    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO images (id, name, type, data, alt, uploader_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            name,
            image.content_type,
            image.data,
            alt,
            uploader_id,
            now,
            now
        ],
    )?;

    Ok(Image {
        id,
        name,
        content_type: image.content_type,
        data: image.data,
        alt,
        uploader: uploader_id.to_string(),
        created_at: now.clone(),
        updated_at: now,
    })
}

pub fn get_image_by_id(pool: &DbPool, id: &str) -> AppResult<Option<Image>> {
    parse_id(id)?;
    let conn = pool.get()?;
    let image = conn
        .query_row(
            &format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = ?1"),
            params![id],
            read_image_row,
        )
        .optional()?;
    Ok(image)
}

/// Newest first. An unknown uploader id yields an empty list.
pub fn list_images_by_uploader(pool: &DbPool, uploader_id: &str) -> AppResult<Vec<Image>> {
    parse_id(uploader_id)?;
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {IMAGE_COLUMNS} FROM images WHERE uploader_id = ?1 \
         ORDER BY created_at DESC, id DESC"
    ))?;
    let mapped = stmt.query_map(params![uploader_id], read_image_row)?;
    Ok(mapped.collect::<rusqlite::Result<_>>()?)
}

/// Rename or re-caption an image the caller owns. Returns None when the
/// image does not exist or belongs to someone else.
pub fn update_image(
    pool: &DbPool,
    caller_id: &str,
    image_id: &str,
    updates: UpdateImage,
) -> AppResult<Option<Image>> {
    parse_id(image_id)?;
    let alt = updates.alt.map(truncate_alt);
    let now = timestamp();

    // RETURNING keeps the ownership check and the read-back in one
    // atomic statement.
    let conn = pool.get()?;
    let image = conn
        .query_row(
            &format!(
                "UPDATE images SET
                    name = COALESCE(?1, name),
                    alt = COALESCE(?2, alt),
                    updated_at = ?3
                 WHERE id = ?4 AND uploader_id = ?5
                 RETURNING {IMAGE_COLUMNS}"
            ),
            params![updates.name, alt, now, image_id, caller_id],
            read_image_row,
        )
        .optional()?;
    Ok(image)
}

/// Delete an image the caller owns. A non-existent or non-owned id is a
/// quiet no-op reported as zero deletions.
pub fn delete_image(pool: &DbPool, caller_id: &str, image_id: &str) -> AppResult<DeleteResult> {
    parse_id(image_id)?;
    let conn = pool.get()?;
    let deleted = conn.execute(
        "DELETE FROM images WHERE id = ?1 AND uploader_id = ?2",
        params![image_id, caller_id],
    )?;
    Ok(DeleteResult {
        deleted_count: deleted as u64,
    })
}
