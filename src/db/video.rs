use sqlx::FromRow;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::core::Database;
use crate::metadata::ExerciseRecord;
use crate::TARGET_DB;

/// One row of the `videos_new` table, as far as the maintenance tooling cares.
///
/// The production schema mixes quoted camelCase columns with snake_case ones;
/// the renames below follow the table, not Rust conventions. The id column
/// is TEXT, not UUID, so ids travel as strings end to end.
#[derive(Debug, Clone, FromRow)]
pub struct VideoRow {
    pub id: String,
    pub title: String,
    #[sqlx(rename = "videoUrl")]
    pub video_url: Option<String>,
    pub thumbnail: Option<String>,
    pub region: Option<String>,
    pub intensity: Option<String>,
    pub targeted_muscles: Option<Vec<String>>,
    #[sqlx(rename = "startingPosition")]
    pub starting_position: Option<String>,
    pub movement: Option<String>,
    pub series: Option<String>,
    pub constraints: Option<String>,
    pub theme: Option<String>,
    #[sqlx(rename = "videoType")]
    pub video_type: String,
    #[sqlx(rename = "isPublished")]
    pub is_published: bool,
}

impl VideoRow {
    /// A row is missing its critical metadata when muscles, starting position
    /// and movement are not all filled in.
    pub fn missing_critical_metadata(&self) -> bool {
        let muscles_empty = self
            .targeted_muscles
            .as_ref()
            .map_or(true, |m| m.is_empty());
        let empty = |f: &Option<String>| f.as_ref().map_or(true, |v| v.trim().is_empty());
        muscles_empty || empty(&self.starting_position) || empty(&self.movement)
    }
}

/// A distinct stored intensity value and how many rows carry it.
#[derive(Debug, Clone, FromRow)]
pub struct IntensityCount {
    pub intensity: String,
    pub count: i64,
}

const VIDEO_COLUMNS: &str = r#"id, title, "videoUrl", thumbnail, region, intensity,
       targeted_muscles, "startingPosition", movement, series, constraints, theme,
       "videoType", "isPublished""#;

impl Database {
    /// All published videos of one type, ordered by title.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn fetch_published_videos(
        &self,
        video_type: &str,
    ) -> Result<Vec<VideoRow>, sqlx::Error> {
        let query = format!(
            r#"SELECT {VIDEO_COLUMNS}
               FROM videos_new
               WHERE "videoType" = $1 AND "isPublished" = true
               ORDER BY title"#
        );
        sqlx::query_as::<_, VideoRow>(&query)
            .bind(video_type)
            .fetch_all(self.pool())
            .await
    }

    /// Published videos whose critical metadata (starting position, movement)
    /// has never been filled in.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn fetch_videos_missing_metadata(
        &self,
        video_type: &str,
    ) -> Result<Vec<VideoRow>, sqlx::Error> {
        let query = format!(
            r#"SELECT {VIDEO_COLUMNS}
               FROM videos_new
               WHERE "videoType" = $1
               AND ("startingPosition" IS NULL OR "startingPosition" = '')
               AND (movement IS NULL OR movement = '')
               ORDER BY title"#
        );
        sqlx::query_as::<_, VideoRow>(&query)
            .bind(video_type)
            .fetch_all(self.pool())
            .await
    }

    /// Published videos without a thumbnail URL.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn fetch_videos_missing_thumbnail(&self) -> Result<Vec<VideoRow>, sqlx::Error> {
        let query = format!(
            r#"SELECT {VIDEO_COLUMNS}
               FROM videos_new
               WHERE "isPublished" = true
               AND (thumbnail IS NULL OR thumbnail = '')
               ORDER BY title"#
        );
        sqlx::query_as::<_, VideoRow>(&query)
            .fetch_all(self.pool())
            .await
    }

    /// Distinct non-empty intensity values currently stored, with row counts.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn distinct_intensities(
        &self,
        video_type: &str,
    ) -> Result<Vec<IntensityCount>, sqlx::Error> {
        sqlx::query_as::<_, IntensityCount>(
            r#"SELECT intensity, COUNT(*) as count
               FROM videos_new
               WHERE "videoType" = $1
               AND "isPublished" = true
               AND intensity IS NOT NULL
               AND intensity != ''
               GROUP BY intensity
               ORDER BY intensity"#,
        )
        .bind(video_type)
        .fetch_all(self.pool())
        .await
    }

    /// Rewrite one stored intensity value to its canonical form, everywhere it
    /// occurs. Keyed on the old value so re-running is a no-op.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn update_intensity_value(
        &self,
        video_type: &str,
        old_value: &str,
        new_value: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE videos_new
               SET intensity = $1, "updatedAt" = NOW()
               WHERE "videoType" = $2 AND "isPublished" = true AND intensity = $3"#,
        )
        .bind(new_value)
        .bind(video_type)
        .bind(old_value)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected())
    }

    /// Update a single video title, keyed by id.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn update_title(&self, id: &str, new_title: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE videos_new SET title = $1, "updatedAt" = NOW() WHERE id = $2"#,
        )
        .bind(new_title)
        .bind(id)
        .execute(self.pool())
        .await?;
        debug!(target: TARGET_DB, "Updated title for {}: {} row(s)", id, result.rows_affected());
        Ok(result.rows_affected())
    }

    /// Write the full extracted metadata set onto one video row.
    #[instrument(target = "db_query", level = "info", skip(self, record))]
    pub async fn update_exercise_metadata(
        &self,
        id: &str,
        record: &ExerciseRecord,
        intensity_label: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE videos_new
               SET "startingPosition" = $1,
                   movement = $2,
                   intensity = $3,
                   series = $4,
                   constraints = $5,
                   theme = $6,
                   targeted_muscles = $7,
                   "updatedAt" = NOW()
               WHERE id = $8"#,
        )
        .bind(&record.starting_position)
        .bind(&record.movement)
        .bind(intensity_label)
        .bind(&record.series)
        .bind(&record.constraints)
        .bind(&record.theme)
        .bind(&record.targeted_muscles)
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected())
    }

    /// Update a video thumbnail URL, keyed by id.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn update_thumbnail(&self, id: &str, url: &str) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query(r#"UPDATE videos_new SET thumbnail = $1, "updatedAt" = NOW() WHERE id = $2"#)
                .bind(url)
                .bind(id)
                .execute(self.pool())
                .await?;
        Ok(result.rows_affected())
    }

    /// Check whether a video with this URL is already registered.
    #[instrument(target = "db_query", level = "debug", skip(self))]
    pub async fn video_url_exists(&self, video_url: &str) -> Result<bool, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM videos_new WHERE "videoUrl" = $1"#)
                .bind(video_url)
                .fetch_one(self.pool())
                .await?;
        Ok(count > 0)
    }

    /// Register a newly discovered bucket video.
    ///
    /// The duration, difficulty and category columns are NOT NULL without
    /// defaults; new rows get duration 0 and "intermediaire" until an
    /// operator curates them. Muscle arrays start empty on purpose.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn insert_video_from_listing(
        &self,
        title: &str,
        video_url: &str,
        region: Option<&str>,
        category: &str,
        video_type: &str,
    ) -> Result<String, sqlx::Error> {
        let description = format!("Exercice: {}", title);
        let empty: Vec<String> = Vec::new();
        sqlx::query_scalar(
            r#"INSERT INTO videos_new (
                   id, title, description, "videoUrl", duration, difficulty,
                   category, region, "muscleGroups", targeted_muscles,
                   "videoType", "isPublished", "createdAt", "updatedAt"
               ) VALUES ($1, $2, $3, $4, 0, 'intermediaire',
                         $5, $6, $7, $8, $9, true, NOW(), NOW())
               RETURNING id"#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(title)
        .bind(description)
        .bind(video_url)
        .bind(category)
        .bind(region)
        .bind(&empty)
        .bind(&empty)
        .bind(video_type)
        .fetch_one(self.pool())
        .await
    }
}
