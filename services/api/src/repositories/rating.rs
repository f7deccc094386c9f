//! Rating repository for database operations

use anyhow::Result;
use chrono::Utc;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{CreateRating, Rating, UpdateRating};

const RATING_SELECT: &str = r#"
    SELECT r.id, r.villa_id, r.user_id, u.name AS user_name, r.score, r.feedback,
           r.created_at, r.updated_at
    FROM ratings r
    JOIN users u ON u.id = r.user_id
"#;

fn rating_from_row(row: &SqliteRow) -> Result<Rating> {
    Ok(Rating {
        id: row.try_get("id")?,
        villa_id: row.try_get("villa_id")?,
        user_id: row.try_get("user_id")?,
        user_name: row.try_get("user_name")?,
        score: row.try_get("score")?,
        feedback: row.try_get("feedback")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Rating repository for database operations
#[derive(Clone)]
pub struct RatingRepository {
    pool: SqlitePool,
}

impl RatingRepository {
    /// Create a new rating repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, payload: &CreateRating) -> Result<Rating> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO ratings (id, villa_id, user_id, score, feedback, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(payload.villa_id)
        .bind(user_id)
        .bind(payload.score)
        .bind(payload.feedback.trim())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!("User {} rated villa {} with {}", user_id, payload.villa_id, payload.score);

        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Rating {} vanished after insert", id))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Rating>> {
        let row = sqlx::query(&format!("{RATING_SELECT} WHERE r.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(rating_from_row).transpose()
    }

    /// Whether the user already rated the villa
    pub async fn exists_for(&self, user_id: Uuid, villa_id: Uuid) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM ratings WHERE user_id = ? AND villa_id = ? LIMIT 1")
            .bind(user_id)
            .bind(villa_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// Ratings of a villa, newest first
    pub async fn list_for_villa(&self, villa_id: Uuid) -> Result<Vec<Rating>> {
        let rows = sqlx::query(&format!(
            "{RATING_SELECT} WHERE r.villa_id = ? ORDER BY r.created_at DESC"
        ))
        .bind(villa_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(rating_from_row).collect()
    }

    pub async fn update(&self, id: Uuid, update: &UpdateRating) -> Result<Option<Rating>> {
        let result = sqlx::query(
            r#"
            UPDATE ratings
            SET score = COALESCE(?, score),
                feedback = COALESCE(?, feedback),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.score)
        .bind(update.feedback.as_deref().map(str::trim))
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM ratings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
