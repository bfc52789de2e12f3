//! Config record access
//!
//! The `config` table holds exactly one row (id = 1), seeded at startup.

use crate::db::models::ConfigRecord;
use crate::{Error, Result};
use sqlx::{Pool, Sqlite};

/// Load the config record, if the row exists
pub async fn get_config(db: &Pool<Sqlite>) -> Result<Option<ConfigRecord>> {
    let record = sqlx::query_as::<_, ConfigRecord>(
        "SELECT monitor_volume, routed_volume, routed_muted FROM config WHERE id = 1",
    )
    .fetch_optional(db)
    .await?;

    Ok(record)
}

/// Overwrite the config record
pub async fn update_config(db: &Pool<Sqlite>, config: &ConfigRecord) -> Result<()> {
    let result = sqlx::query(
        "UPDATE config SET monitor_volume = ?, routed_volume = ?, routed_muted = ? WHERE id = 1",
    )
    .bind(config.monitor_volume)
    .bind(config.routed_volume)
    .bind(config.routed_muted)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("config record 1".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_in_memory;

    #[tokio::test]
    async fn test_seeded_config_has_defaults() {
        let pool = init_in_memory().await.unwrap();

        let config = get_config(&pool).await.unwrap().unwrap();
        assert_eq!(config, ConfigRecord::default());
    }

    #[tokio::test]
    async fn test_update_config_persists() {
        let pool = init_in_memory().await.unwrap();

        let updated = ConfigRecord {
            monitor_volume: 0.25,
            routed_volume: 1.0,
            routed_muted: true,
        };
        update_config(&pool, &updated).await.unwrap();

        assert_eq!(get_config(&pool).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_update_without_row_is_not_found() {
        let pool = init_in_memory().await.unwrap();
        sqlx::query("DELETE FROM config").execute(&pool).await.unwrap();

        let result = update_config(&pool, &ConfigRecord::default()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(get_config(&pool).await.unwrap().is_none());
    }
}
