//! Clip service
//!
//! Adds validation, not-found semantics and validity tracking on top of the
//! raw clip table.

use crate::error::{EventError, Result};
use crate::services::validation::validate_clip;
use soundpad_common::db::{clips, Clip, ClipPatch, NewClip};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ClipService {
    pool: SqlitePool,
}

impl ClipService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Validate and store a new clip
    pub async fn create(&self, clip: NewClip) -> Result<Clip> {
        validate_clip(&clip)?;
        let created = clips::create(&self.pool, &clip).await?;
        info!("Added sound {} ({})", created.id, created.name);
        Ok(created)
    }

    /// Overlay `patch` on the stored clip, validate, persist
    pub async fn update(&self, id: i64, patch: ClipPatch) -> Result<Clip> {
        let stored = self.get(id).await?;
        let merged = patch.apply_to(&stored);
        validate_clip(&merged)?;

        if !clips::update(&self.pool, id, &merged.name, &merged.path).await? {
            return Err(EventError::SoundNotFound(id).into());
        }

        debug!("Updated sound {}", id);
        self.get(id).await
    }

    pub async fn remove(&self, id: i64) -> Result<()> {
        if !clips::delete(&self.pool, id).await? {
            return Err(EventError::SoundNotFound(id).into());
        }
        info!("Removed sound {}", id);
        Ok(())
    }

    /// All clips, ordered by id
    pub async fn list(&self) -> Result<Vec<Clip>> {
        Ok(clips::get_all(&self.pool).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Clip> {
        clips::get(&self.pool, id)
            .await?
            .ok_or_else(|| EventError::SoundNotFound(id).into())
    }

    /// Re-check the clip's backing file before playback.
    ///
    /// A missing file marks the clip invalid and fails with
    /// `InvalidSoundFile`; a file that reappeared marks it valid again.
    pub async fn refresh_validity(&self, clip: &Clip) -> Result<Clip> {
        let present = tokio::fs::metadata(&clip.path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);

        if !present {
            if clip.is_valid {
                clips::set_valid(&self.pool, clip.id, false).await?;
            }
            warn!("Sound {} file missing: {}", clip.id, clip.path);
            return Err(EventError::InvalidSoundFile(clip.path.clone()).into());
        }

        if !clip.is_valid {
            clips::set_valid(&self.pool, clip.id, true).await?;
            info!("Sound {} file is back: {}", clip.id, clip.path);
            return Ok(Clip {
                is_valid: true,
                ..clip.clone()
            });
        }

        Ok(clip.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use soundpad_common::db::init_in_memory;

    fn new_clip(name: &str, path: &str) -> NewClip {
        NewClip {
            name: name.to_string(),
            path: path.to_string(),
        }
    }

    fn event_error(result: Result<impl std::fmt::Debug>) -> EventError {
        match result {
            Err(Error::Event(e)) => e,
            other => panic!("expected event error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_clip_not_persisted() {
        let pool = init_in_memory().await.unwrap();
        let service = ClipService::new(pool.clone());

        let err = event_error(service.create(new_clip("x", "clip.ogg")).await);
        assert!(matches!(err, EventError::Validation(_)));
        assert_eq!(clips::count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_merges_and_validates() {
        let pool = init_in_memory().await.unwrap();
        let service = ClipService::new(pool);
        let clip = service.create(new_clip("old", "/s/old.mp3")).await.unwrap();

        let patch = ClipPatch {
            name: Some("new".to_string()),
            path: None,
        };
        let updated = service.update(clip.id, patch).await.unwrap();
        assert_eq!(updated.name, "new");
        assert_eq!(updated.path, "/s/old.mp3");

        let bad = ClipPatch {
            name: None,
            path: Some("/s/new.flac".to_string()),
        };
        assert!(matches!(
            event_error(service.update(clip.id, bad).await),
            EventError::Validation(_)
        ));
        assert_eq!(service.get(clip.id).await.unwrap().path, "/s/old.mp3");
    }

    #[tokio::test]
    async fn test_missing_ids_are_sound_not_found() {
        let pool = init_in_memory().await.unwrap();
        let service = ClipService::new(pool);

        assert_eq!(event_error(service.get(42).await), EventError::SoundNotFound(42));
        assert_eq!(event_error(service.remove(42).await), EventError::SoundNotFound(42));
        assert_eq!(
            event_error(service.update(42, ClipPatch::default()).await),
            EventError::SoundNotFound(42)
        );
    }

    #[tokio::test]
    async fn test_refresh_validity_tracks_file_presence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("horn.wav");
        let pool = init_in_memory().await.unwrap();
        let service = ClipService::new(pool);
        let clip = service
            .create(new_clip("horn", path.to_str().unwrap()))
            .await
            .unwrap();

        // File absent: marked invalid, play must fail
        let err = event_error(service.refresh_validity(&clip).await);
        assert_eq!(err, EventError::InvalidSoundFile(clip.path.clone()));
        let stored = service.get(clip.id).await.unwrap();
        assert!(!stored.is_valid);

        // File reappears: marked valid again
        std::fs::write(&path, b"RIFF").unwrap();
        let refreshed = service.refresh_validity(&stored).await.unwrap();
        assert!(refreshed.is_valid);
        assert!(service.get(clip.id).await.unwrap().is_valid);
    }
}
