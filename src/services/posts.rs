use rusqlite::{params, OptionalExtension, Row};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::{DeleteResult, Post};
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

use super::{parse_id, timestamp};

const POST_COLUMNS: &str =
    "id, title, author_id, contents, tags, featured_image_id, created_at, updated_at";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreatePost {
    pub title: String,
    pub contents: Option<String>,
    pub tags: Vec<String>,
    pub featured_image_id: Option<String>,
}

/// Only the fields a caller provides are applied; everything else keeps
/// its stored value. Authorship is not transferable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub contents: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum SortBy {
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortBy {
    /// Maps a query-string value; anything else is rejected by the caller.
    pub fn from_param(s: &str) -> Option<Self> {
        match s {
            "createdAt" => Some(SortBy::CreatedAt),
            "updatedAt" => Some(SortBy::UpdatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            SortBy::CreatedAt => "created_at",
            SortBy::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn from_param(s: &str) -> Option<Self> {
        match s {
            "ascending" => Some(SortOrder::Ascending),
            "descending" => Some(SortOrder::Descending),
            _ => None,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

enum PostFilter<'a> {
    All,
    Author(&'a str),
    Tag(&'a str),
}

// Tags live in a JSON array column, so row values need a decode step
// that rusqlite's row mapper cannot express directly.
struct PostRow {
    id: String,
    title: String,
    author_id: String,
    contents: Option<String>,
    tags_json: String,
    featured_image_id: Option<String>,
    created_at: String,
    updated_at: String,
}

fn read_post_row(row: &Row) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        title: row.get(1)?,
        author_id: row.get(2)?,
        contents: row.get(3)?,
        tags_json: row.get(4)?,
        featured_image_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl PostRow {
    fn into_post(self) -> AppResult<Post> {
        Ok(Post {
            id: self.id,
            title: self.title,
            author: self.author_id,
            contents: self.contents,
            tags: serde_json::from_str(&self.tags_json)?,
            featured_image_id: self.featured_image_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub fn create_post(pool: &DbPool, author_id: &str, post: CreatePost) -> AppResult<Post> {
    if post.title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if author_id.is_empty() {
        return Err(AppError::Validation("author is required".to_string()));
    }

    let id = Uuid::now_v7().to_string();
    let now = timestamp();
    let tags_json = serde_json::to_string(&post.tags)?;

    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO posts (id, title, author_id, contents, tags, featured_image_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            post.title,
            author_id,
            post.contents,
            tags_json,
            post.featured_image_id,
            now,
            now
        ],
    )?;

    Ok(Post {
        id,
        title: post.title,
        author: author_id.to_string(),
        contents: post.contents,
        tags: post.tags,
        featured_image_id: post.featured_image_id,
        created_at: now.clone(),
        updated_at: now,
    })
}

pub fn list_all_posts(pool: &DbPool, options: ListOptions) -> AppResult<Vec<Post>> {
    list_posts(pool, PostFilter::All, options)
}

/// Filter by author username. An unknown username yields an empty list,
/// the same as an author with no posts.
pub fn list_posts_by_author(
    pool: &DbPool,
    username: &str,
    options: ListOptions,
) -> AppResult<Vec<Post>> {
    let conn = pool.get()?;
    let author_id: Option<String> = conn
        .query_row(
            "SELECT id FROM users WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )
        .optional()?;
    drop(conn);

    match author_id {
        Some(id) => list_posts(pool, PostFilter::Author(&id), options),
        None => Ok(Vec::new()),
    }
}

pub fn list_posts_by_tag(pool: &DbPool, tag: &str, options: ListOptions) -> AppResult<Vec<Post>> {
    list_posts(pool, PostFilter::Tag(tag), options)
}

fn list_posts(pool: &DbPool, filter: PostFilter, options: ListOptions) -> AppResult<Vec<Post>> {
    // Ties on the sort column fall back to the id, which is time-ordered,
    // so the listing order is deterministic.
    let order = format!(
        "ORDER BY {col} {ord}, id {ord}",
        col = options.sort_by.column(),
        ord = options.sort_order.keyword()
    );

    let conn = pool.get()?;
    let rows: Vec<PostRow> = match filter {
        PostFilter::All => {
            let mut stmt = conn.prepare(&format!("SELECT {POST_COLUMNS} FROM posts {order}"))?;
            let mapped = stmt.query_map([], read_post_row)?;
            mapped.collect::<rusqlite::Result<_>>()?
        }
        PostFilter::Author(author_id) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS} FROM posts WHERE author_id = ?1 {order}"
            ))?;
            let mapped = stmt.query_map(params![author_id], read_post_row)?;
            mapped.collect::<rusqlite::Result<_>>()?
        }
        PostFilter::Tag(tag) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS} FROM posts \
                 WHERE ?1 IN (SELECT value FROM json_each(posts.tags)) {order}"
            ))?;
            let mapped = stmt.query_map(params![tag], read_post_row)?;
            mapped.collect::<rusqlite::Result<_>>()?
        }
    };

    rows.into_iter().map(PostRow::into_post).collect()
}

pub fn get_post_by_id(pool: &DbPool, id: &str) -> AppResult<Option<Post>> {
    parse_id(id)?;
    let conn = pool.get()?;
    let row = conn
        .query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
            params![id],
            read_post_row,
        )
        .optional()?;
    row.map(PostRow::into_post).transpose()
}

/// Apply the provided fields to a post the caller owns. Returns None
/// when the post does not exist or belongs to someone else; the two
/// cases are indistinguishable so existence is not leaked.
pub fn update_post(
    pool: &DbPool,
    caller_id: &str,
    post_id: &str,
    updates: UpdatePost,
) -> AppResult<Option<Post>> {
    parse_id(post_id)?;
    let tags_json = updates
        .tags
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let now = timestamp();

    // RETURNING keeps the ownership check and the read-back in one
    // atomic statement.
    let conn = pool.get()?;
    let row = conn
        .query_row(
            &format!(
                "UPDATE posts SET
                    title = COALESCE(?1, title),
                    contents = COALESCE(?2, contents),
                    tags = COALESCE(?3, tags),
                    updated_at = ?4
                 WHERE id = ?5 AND author_id = ?6
                 RETURNING {POST_COLUMNS}"
            ),
            params![updates.title, updates.contents, tags_json, now, post_id, caller_id],
            read_post_row,
        )
        .optional()?;
    row.map(PostRow::into_post).transpose()
}

/// Delete a post the caller owns. A non-existent or non-owned id is a
/// quiet no-op reported as zero deletions.
pub fn delete_post(pool: &DbPool, caller_id: &str, post_id: &str) -> AppResult<DeleteResult> {
    parse_id(post_id)?;
    let conn = pool.get()?;
    let deleted = conn.execute(
        "DELETE FROM posts WHERE id = ?1 AND author_id = ?2",
        params![post_id, caller_id],
    )?;
    Ok(DeleteResult {
        deleted_count: deleted as u64,
    })
}
