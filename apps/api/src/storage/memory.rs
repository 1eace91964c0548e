use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Record, ResumeRow};
use crate::storage::{to_document, ResumeStore};

/// Process-local store used when no database is configured, and in tests.
#[derive(Default)]
pub struct MemoryResumeStore {
    rows: RwLock<HashMap<Uuid, ResumeRow>>,
}

impl MemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw document, bypassing normalization.
    #[cfg(test)]
    pub async fn insert_raw(&self, user_id: Uuid, data: serde_json::Value) {
        self.rows.write().await.insert(
            user_id,
            ResumeRow {
                user_id,
                data,
                updated_at: Utc::now(),
            },
        );
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn load(&self, user_id: Uuid) -> Result<Option<ResumeRow>, AppError> {
        Ok(self.rows.read().await.get(&user_id).cloned())
    }

    async fn save(&self, user_id: Uuid, record: &Record) -> Result<DateTime<Utc>, AppError> {
        let updated_at = Utc::now();
        let row = ResumeRow {
            user_id,
            data: to_document(record)?,
            updated_at,
        };
        self.rows.write().await.insert(user_id, row);
        Ok(updated_at)
    }

    async fn delete(&self, user_id: Uuid) -> Result<bool, AppError> {
        Ok(self.rows.write().await.remove(&user_id).is_some())
    }
}
