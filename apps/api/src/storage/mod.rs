//! Resume storage, one JSON document per user.
//!
//! `AppState` holds an `Arc<dyn ResumeStore>`: `PgResumeStore` when `DATABASE_URL` is
//! set, `MemoryResumeStore` otherwise. Loaded documents are raw; callers pass
//! `row.data` through `normalize::initialize` before use.

pub mod handlers;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Record, ResumeRow};

pub use memory::MemoryResumeStore;
pub use postgres::PgResumeStore;

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// The stored document exactly as persisted, if any.
    async fn load(&self, user_id: Uuid) -> Result<Option<ResumeRow>, AppError>;

    /// Inserts or replaces the user's document. Returns the new `updated_at`.
    async fn save(&self, user_id: Uuid, record: &Record) -> Result<DateTime<Utc>, AppError>;

    /// Returns whether a document existed.
    async fn delete(&self, user_id: Uuid) -> Result<bool, AppError>;
}

pub(crate) fn to_document(record: &Record) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(record)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Record serialization failed: {e}")))
}
