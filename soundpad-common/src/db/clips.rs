//! Clip table access
//!
//! Raw persistence only. Field validation and not-found semantics live in
//! the service layer of the server crate.

use crate::db::models::{Clip, NewClip};
use crate::Result;
use sqlx::{Pool, Sqlite};

const CLIP_COLUMNS: &str = "id, name, path, is_valid, created_at";

/// Insert a clip and return the stored record (with id and creation time)
pub async fn create(db: &Pool<Sqlite>, clip: &NewClip) -> Result<Clip> {
    let query = format!(
        "INSERT INTO clip (name, path) VALUES (?, ?) RETURNING {}",
        CLIP_COLUMNS
    );

    let created = sqlx::query_as::<_, Clip>(&query)
        .bind(&clip.name)
        .bind(&clip.path)
        .fetch_one(db)
        .await?;

    Ok(created)
}

/// Load every clip, oldest first
pub async fn get_all(db: &Pool<Sqlite>) -> Result<Vec<Clip>> {
    let query = format!("SELECT {} FROM clip ORDER BY id", CLIP_COLUMNS);

    let clips = sqlx::query_as::<_, Clip>(&query).fetch_all(db).await?;

    Ok(clips)
}

/// Load one clip by id
pub async fn get(db: &Pool<Sqlite>, id: i64) -> Result<Option<Clip>> {
    let query = format!("SELECT {} FROM clip WHERE id = ?", CLIP_COLUMNS);

    let clip = sqlx::query_as::<_, Clip>(&query)
        .bind(id)
        .fetch_optional(db)
        .await?;

    Ok(clip)
}

/// Overwrite name and path of a clip
///
/// Returns false if no clip has this id.
pub async fn update(db: &Pool<Sqlite>, id: i64, name: &str, path: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE clip SET name = ?, path = ? WHERE id = ?")
        .bind(name)
        .bind(path)
        .bind(id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a clip
///
/// Returns false if no clip has this id.
pub async fn delete(db: &Pool<Sqlite>, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM clip WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Record whether the clip's backing file was present at last access
pub async fn set_valid(db: &Pool<Sqlite>, id: i64, is_valid: bool) -> Result<()> {
    sqlx::query("UPDATE clip SET is_valid = ? WHERE id = ?")
        .bind(is_valid)
        .bind(id)
        .execute(db)
        .await?;

    Ok(())
}

/// Number of stored clips
pub async fn count(db: &Pool<Sqlite>) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clip")
        .fetch_one(db)
        .await?;

    Ok(count)
}
