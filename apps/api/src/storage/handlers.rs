use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Record;
use crate::normalize::initialize;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResume {
    pub user_id: Uuid,
    pub record: Record,
    pub updated_at: DateTime<Utc>,
}

/// GET /api/v1/resumes/:user_id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<StoredResume>, AppError> {
    let row = state
        .store
        .load(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No resume stored for user {user_id}")))?;

    Ok(Json(StoredResume {
        user_id,
        record: initialize(&Record::template(), Some(&row.data)),
        updated_at: row.updated_at,
    }))
}

/// PUT /api/v1/resumes/:user_id
/// The body is normalized before it is stored, so partial documents are accepted.
pub async fn handle_put_resume(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(raw): Json<Value>,
) -> Result<Json<StoredResume>, AppError> {
    if !raw.is_object() {
        return Err(AppError::Validation(
            "Resume body must be a JSON object".to_string(),
        ));
    }
    let record = initialize(&Record::template(), Some(&raw));
    let updated_at = state.store.save(user_id, &record).await?;

    Ok(Json(StoredResume {
        user_id,
        record,
        updated_at,
    }))
}

/// DELETE /api/v1/resumes/:user_id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.store.delete(user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "No resume stored for user {user_id}"
        )))
    }
}
