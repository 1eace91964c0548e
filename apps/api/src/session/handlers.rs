use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::{export_pdf, ExportArtifact};
use crate::layout::{ComposedDocument, FitOutcome, PageLayout};
use crate::models::Record;
use crate::normalize::{initialize, FieldPath, ListSection};
use crate::session::{Edit, EditSession, FitSnapshot, SessionView};
use crate::state::AppState;

/// Upper bound on `?wait=true` requests.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    pub user_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct FieldUpdate {
    pub path: String,
    pub value: String,
}

#[derive(Deserialize)]
pub struct AddEntryRequest {
    pub section: ListSection,
}

#[derive(Deserialize, Default)]
pub struct WaitQuery {
    #[serde(default)]
    pub wait: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutView {
    pub revision: u64,
    pub document: ComposedDocument,
    pub fit: FitOutcome,
    pub layout: PageLayout,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub user_id: Uuid,
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
}

/// POST /api/v1/sessions
/// An empty body opens an anonymous session; a non-empty body must be valid JSON.
pub async fn handle_open_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let req = parse_open_request(&headers, &body)?;

    let record = match req.user_id {
        Some(user_id) => {
            let stored = state.store.load(user_id).await?;
            initialize(&Record::template(), stored.as_ref().map(|row| &row.data))
        }
        None => Record::template(),
    };

    let session = state.sessions.open(req.user_id, record).await;
    Ok((StatusCode::CREATED, Json(session.view())))
}

fn parse_open_request(headers: &HeaderMap, body: &[u8]) -> Result<OpenSessionRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(OpenSessionRequest::default());
    }

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().starts_with("application/json"));
    if !is_json {
        return Err(AppError::Validation(
            "Expected request with `Content-Type: application/json`".to_string(),
        ));
    }

    Json::<OpenSessionRequest>::from_bytes(body)
        .map(|Json(req)| req)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.get(id)?.view()))
}

/// PATCH /api/v1/sessions/:id/fields
pub async fn handle_update_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<FieldUpdate>,
) -> Result<Json<SessionView>, AppError> {
    let path: FieldPath = req.path.parse()?;
    let session = state.sessions.get(id)?;
    Ok(Json(session.apply(&Edit::UpdateField {
        path,
        value: req.value,
    })?))
}

/// POST /api/v1/sessions/:id/entries
pub async fn handle_add_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddEntryRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    Ok(Json(session.apply(&Edit::AddEntry(req.section))?))
}

/// DELETE /api/v1/sessions/:id/entries/:section/:index
pub async fn handle_remove_entry(
    State(state): State<AppState>,
    Path((id, section, index)): Path<(Uuid, String, usize)>,
) -> Result<Json<SessionView>, AppError> {
    let section: ListSection = section.parse()?;
    let session = state.sessions.get(id)?;
    Ok(Json(session.apply(&Edit::RemoveEntry { section, index })?))
}

/// POST /api/v1/sessions/:id/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    Ok(Json(session.apply(&Edit::Reset)?))
}

/// POST /api/v1/sessions/:id/import
pub async fn handle_import(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(raw): Json<Value>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    Ok(Json(session.apply(&Edit::Import(raw))?))
}

/// GET /api/v1/sessions/:id/layout
pub async fn handle_get_layout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<WaitQuery>,
) -> Result<Json<LayoutView>, AppError> {
    let session = state.sessions.get(id)?;
    let snapshot = settled(&session, query.wait).await?;
    let rendered = &snapshot.rendered;
    Ok(Json(LayoutView {
        revision: snapshot.revision,
        document: rendered.document.clone(),
        fit: rendered.outcome,
        layout: rendered.layout.clone(),
    }))
}

/// GET /api/v1/sessions/:id/export
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<WaitQuery>,
) -> Result<Response, AppError> {
    let session = state.sessions.get(id)?;
    let snapshot = settled(&session, query.wait).await?;

    let options = state.export;
    let artifact = tokio::task::spawn_blocking(move || {
        export_pdf(&snapshot.rendered.layout, &snapshot.record, &options)
    })
    .await
    .map_err(|e| AppError::Export(format!("export task failed: {e}")))?;

    pdf_response(artifact)
}

/// PUT /api/v1/sessions/:id/save
pub async fn handle_save(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SaveResponse>, AppError> {
    let session = state.sessions.get(id)?;
    let user_id = session
        .user_id
        .ok_or_else(|| AppError::Validation("Session was opened without a userId".to_string()))?;

    // Revision and Record come from one snapshot so the response matches what was stored.
    let SessionView {
        revision, record, ..
    } = session.view();
    let updated_at = state.store.save(user_id, &record).await?;
    tracing::info!(session = %id, user = %user_id, revision, "Record saved");

    Ok(Json(SaveResponse {
        user_id,
        revision,
        updated_at,
    }))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.close(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn settled(session: &Arc<EditSession>, wait: bool) -> Result<FitSnapshot, AppError> {
    if let Some(snapshot) = session.settled_snapshot() {
        return Ok(snapshot);
    }
    if wait {
        if let Ok(Some(snapshot)) = tokio::time::timeout(SETTLE_TIMEOUT, session.wait_settled()).await {
            return Ok(snapshot);
        }
    }
    Err(AppError::FitPending(session.revision()))
}

fn pdf_response(artifact: ExportArtifact) -> Result<Response, AppError> {
    let disposition = HeaderValue::from_str(&content_disposition(&artifact.filename))
        .map_err(|e| AppError::Export(format!("invalid filename header: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(artifact.bytes),
    )
        .into_response())
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 filename.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
        .collect();
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect();
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
