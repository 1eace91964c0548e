use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Record, ResumeRow};
use crate::storage::{to_document, ResumeStore};

/// `resumes` table: one JSONB document per user, upserted on save.
#[derive(Clone)]
pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        PgResumeStore { pool }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn load(&self, user_id: Uuid) -> Result<Option<ResumeRow>, AppError> {
        let row = sqlx::query_as::<_, ResumeRow>(
            "SELECT user_id, data, updated_at FROM resumes WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn save(&self, user_id: Uuid, record: &Record) -> Result<DateTime<Utc>, AppError> {
        let data = to_document(record)?;
        let (updated_at,): (DateTime<Utc>,) = sqlx::query_as(
            r#"
            INSERT INTO resumes (user_id, data, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = now()
            RETURNING updated_at
            "#,
        )
        .bind(user_id)
        .bind(data)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated_at)
    }

    async fn delete(&self, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM resumes WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
