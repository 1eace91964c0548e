//! Editing sessions, one live Record per session with a debounced background re-fit.
//!
//! # Concurrency rules
//! - Edits on a session are serialized by its state lock; each successful edit replaces
//!   the `Arc<Record>` snapshot and bumps the revision.
//! - Every edit aborts the pending re-fit and schedules a new one after the debounce
//!   interval, so a burst of edits yields one fit of the final Record.
//! - The fit runs on the blocking pool. Its result commits only if the revision it was
//!   computed for is still current.
//! - A session is settled when the committed fit revision equals the current revision.
//!   Export and layout reads require a settled session.
//! - Every lookup or edit stamps the session as seen; sessions idle for longer than the
//!   configured timeout are closed by the registry's sweeper.

pub mod handlers;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::layout::{FitOutcome, RenderedPage, Renderer};
use crate::models::Record;
use crate::normalize::{
    add_list_entry, initialize, remove_list_entry, update_field, FieldPath, ListSection,
};

/// A single change applied to a session's Record.
#[derive(Debug, Clone)]
pub enum Edit {
    UpdateField { path: FieldPath, value: String },
    AddEntry(ListSection),
    RemoveEntry { section: ListSection, index: usize },
    /// Back to the empty template.
    Reset,
    /// Raw external data merged onto the template.
    Import(Value),
}

impl Edit {
    fn apply(&self, record: &Record) -> Result<Record, AppError> {
        let next = match self {
            Edit::UpdateField { path, value } => update_field(record, path, value.as_str())?,
            Edit::AddEntry(section) => add_list_entry(record, *section),
            Edit::RemoveEntry { section, index } => remove_list_entry(record, *section, *index)?,
            Edit::Reset => Record::template(),
            Edit::Import(raw) => initialize(&Record::template(), Some(raw)),
        };
        Ok(next)
    }
}

/// A committed fit and the Record it was computed from.
#[derive(Debug, Clone)]
pub struct FitSnapshot {
    pub revision: u64,
    pub record: Arc<Record>,
    pub rendered: Arc<RenderedPage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitView {
    pub revision: u64,
    pub settled: bool,
    #[serde(flatten)]
    pub outcome: FitOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: Uuid,
    pub user_id: Option<Uuid>,
    pub revision: u64,
    pub record: Arc<Record>,
    /// Most recent committed fit, possibly for an older revision.
    pub fit: Option<FitView>,
}

struct SessionState {
    record: Arc<Record>,
    revision: u64,
    fitted: Option<FitSnapshot>,
}

pub struct EditSession {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    renderer: Arc<Renderer>,
    debounce: Duration,
    state: Mutex<SessionState>,
    pending: Mutex<Option<JoinHandle<()>>>,
    /// Revision of the latest committed fit.
    committed: watch::Sender<u64>,
    fit_runs: AtomicU64,
    last_seen: Mutex<Instant>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EditSession {
    fn new(user_id: Option<Uuid>, record: Record, renderer: Arc<Renderer>, debounce: Duration) -> Self {
        let (committed, _) = watch::channel(0);
        EditSession {
            id: Uuid::new_v4(),
            user_id,
            renderer,
            debounce,
            state: Mutex::new(SessionState {
                record: Arc::new(record),
                revision: 1,
                fitted: None,
            }),
            pending: Mutex::new(None),
            committed,
            fit_runs: AtomicU64::new(0),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    #[cfg(test)]
    pub fn record(&self) -> Arc<Record> {
        lock(&self.state).record.clone()
    }

    pub fn revision(&self) -> u64 {
        lock(&self.state).revision
    }

    /// Number of fits started so far.
    #[cfg(test)]
    pub fn fit_runs(&self) -> u64 {
        self.fit_runs.load(Ordering::Relaxed)
    }

    fn touch(&self) {
        *lock(&self.last_seen) = Instant::now();
    }

    /// Time since the session was last looked up or edited.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*lock(&self.last_seen))
    }

    pub fn view(&self) -> SessionView {
        let state = lock(&self.state);
        SessionView {
            session_id: self.id,
            user_id: self.user_id,
            revision: state.revision,
            record: state.record.clone(),
            fit: state.fitted.as_ref().map(|f| FitView {
                revision: f.revision,
                settled: f.revision == state.revision,
                outcome: f.rendered.outcome,
            }),
        }
    }

    /// Applies `edit` and schedules a re-fit. A failed edit leaves the session untouched.
    pub fn apply(self: &Arc<Self>, edit: &Edit) -> Result<SessionView, AppError> {
        self.touch();
        let revision = {
            let mut state = lock(&self.state);
            let next = edit.apply(&state.record)?;
            state.record = Arc::new(next);
            state.revision += 1;
            state.revision
        };
        debug!(session = %self.id, revision, edit = edit_kind(edit), "Edit applied");
        self.schedule_refit();
        Ok(self.view())
    }

    /// The committed fit, only when it is for the current revision.
    pub fn settled_snapshot(&self) -> Option<FitSnapshot> {
        let state = lock(&self.state);
        state
            .fitted
            .as_ref()
            .filter(|f| f.revision == state.revision)
            .cloned()
    }

    /// Waits until the current revision has a committed fit.
    pub async fn wait_settled(&self) -> Option<FitSnapshot> {
        let mut rx = self.committed.subscribe();
        loop {
            if let Some(snapshot) = self.settled_snapshot() {
                return Some(snapshot);
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    }

    fn schedule_refit(self: &Arc<Self>) {
        let session = Arc::clone(self);
        let mut pending = lock(&self.pending);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(session.debounce).await;
            session.refit().await;
        }));
    }

    /// Fits the current Record and commits the result if no edit landed meanwhile.
    async fn refit(&self) {
        let (revision, record) = {
            let state = lock(&self.state);
            if state.fitted.as_ref().is_some_and(|f| f.revision == state.revision) {
                return;
            }
            (state.revision, state.record.clone())
        };

        let run = self.fit_runs.fetch_add(1, Ordering::Relaxed) + 1;
        let renderer = Arc::clone(&self.renderer);
        let input = Arc::clone(&record);
        let rendered = match tokio::task::spawn_blocking(move || renderer.render(&input)).await {
            Ok(rendered) => rendered,
            Err(e) => {
                error!(session = %self.id, revision, "Page fit task failed: {e}");
                return;
            }
        };

        {
            let mut state = lock(&self.state);
            if state.revision != revision {
                debug!(
                    session = %self.id,
                    revision,
                    current = state.revision,
                    "Discarding stale fit"
                );
                return;
            }
            state.fitted = Some(FitSnapshot {
                revision,
                record,
                rendered: Arc::new(rendered),
            });
        }
        debug!(session = %self.id, revision, run, "Fit committed");
        self.committed.send_replace(revision);
    }

    fn cancel_pending(&self) {
        if let Some(handle) = lock(&self.pending).take() {
            handle.abort();
        }
    }
}

fn edit_kind(edit: &Edit) -> &'static str {
    match edit {
        Edit::UpdateField { .. } => "update_field",
        Edit::AddEntry(_) => "add_entry",
        Edit::RemoveEntry { .. } => "remove_entry",
        Edit::Reset => "reset",
        Edit::Import(_) => "import",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Registry
// ────────────────────────────────────────────────────────────────────────────

/// Upper bound on the interval between idle sweeps.
const SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// All open sessions, keyed by session id.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<EditSession>>>,
    renderer: Arc<Renderer>,
    debounce: Duration,
}

impl SessionRegistry {
    pub fn new(renderer: Renderer, debounce: Duration) -> Self {
        SessionRegistry {
            sessions: RwLock::new(HashMap::new()),
            renderer: Arc::new(renderer),
            debounce,
        }
    }

    /// Opens a session on `record` and runs its first fit before returning.
    pub async fn open(&self, user_id: Option<Uuid>, record: Record) -> Arc<EditSession> {
        let session = Arc::new(EditSession::new(
            user_id,
            record,
            Arc::clone(&self.renderer),
            self.debounce,
        ));
        session.refit().await;

        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.id, Arc::clone(&session));
        info!(session = %session.id, user = ?user_id, "Session opened");
        session
    }

    pub fn get(&self, id: Uuid) -> Result<Arc<EditSession>, AppError> {
        let session = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        session.touch();
        Ok(session)
    }

    /// Removes the session and cancels its pending re-fit.
    pub fn close(&self, id: Uuid) -> Result<(), AppError> {
        let session = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        session.cancel_pending();
        info!(session = %id, "Session closed");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Closes every session idle for at least `idle`. Returns how many were closed.
    pub fn evict_idle(&self, idle: Duration) -> usize {
        let now = Instant::now();
        let expired: Vec<Uuid> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|s| s.idle_for(now) >= idle)
            .map(|s| s.id)
            .collect();

        let closed = expired.into_iter().filter(|id| self.close(*id).is_ok()).count();
        if closed > 0 {
            info!(closed, idle_secs = idle.as_secs(), "Evicted idle sessions");
        }
        closed
    }

    /// Runs `evict_idle` periodically for the life of the process.
    pub fn spawn_sweeper(self: &Arc<Self>, idle: Duration) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        let period = idle.min(SWEEP_PERIOD);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                registry.evict_idle(idle);
            }
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::time::timeout;

    const DEBOUNCE: Duration = Duration::from_millis(30);
    const WAIT: Duration = Duration::from_secs(5);

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Renderer::default(), DEBOUNCE)
    }

    fn set(path: &str, value: &str) -> Edit {
        Edit::UpdateField {
            path: path.parse().unwrap(),
            value: value.to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_runs_initial_fit() {
        let registry = registry();
        let session = registry.open(None, Record::template()).await;
        let snapshot = session.settled_snapshot().expect("settled after open");
        assert_eq!(snapshot.revision, 1);
        assert!(snapshot.rendered.document.is_placeholder());
        assert_eq!(session.fit_runs(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_edit_is_pending_until_debounced_fit_commits() {
        let registry = registry();
        let session = registry.open(None, Record::template()).await;

        let view = session.apply(&set("personalInfo.fullName", "Jane Doe")).unwrap();
        assert_eq!(view.revision, 2);
        assert!(!view.fit.unwrap().settled);
        assert!(session.settled_snapshot().is_none());

        let snapshot = timeout(WAIT, session.wait_settled()).await.unwrap().unwrap();
        assert_eq!(snapshot.revision, 2);
        assert_eq!(snapshot.record.personal_info.full_name, "Jane Doe");
        assert!(!snapshot.rendered.document.is_placeholder());
    }

    #[tokio::test]
    async fn test_burst_of_edits_fits_once() {
        let registry = registry();
        let session = registry.open(None, Record::template()).await;

        for name in ["J", "Ja", "Jan", "Jane", "Jane D", "Jane Doe"] {
            session.apply(&set("personalInfo.fullName", name)).unwrap();
        }
        let snapshot = timeout(WAIT, session.wait_settled()).await.unwrap().unwrap();

        assert_eq!(snapshot.revision, 7);
        assert_eq!(snapshot.record.personal_info.full_name, "Jane Doe");
        assert_eq!(session.fit_runs(), 2, "initial fit plus one debounced fit");
    }

    #[tokio::test]
    async fn test_failed_edit_leaves_session_untouched() {
        let registry = registry();
        let session = registry.open(None, Record::template()).await;

        let err = session
            .apply(&Edit::RemoveEntry {
                section: ListSection::Projects,
                index: 3,
            })
            .unwrap_err();
        assert!(matches!(err, AppError::IndexOutOfRange(_)));
        assert_eq!(session.revision(), 1);
        assert!(session.settled_snapshot().is_some());
    }

    #[tokio::test]
    async fn test_old_snapshot_survives_later_edits() {
        let registry = registry();
        let session = registry.open(None, Record::template()).await;
        let before = session.record();

        session.apply(&set("professionalSummary", "Engineer")).unwrap();
        assert_eq!(before.professional_summary, "");
        assert_eq!(session.record().professional_summary, "Engineer");
    }

    #[tokio::test]
    async fn test_reset_and_import() {
        let registry = registry();
        let session = registry.open(None, Record::template()).await;

        session
            .apply(&Edit::Import(json!({
                "personalInfo": { "fullName": "Jane Doe" },
                "skills": ["Rust", "Go"]
            })))
            .unwrap();
        let record = session.record();
        assert_eq!(record.personal_info.full_name, "Jane Doe");
        assert_eq!(record.skills.programming_languages, "Rust, Go");

        session.apply(&Edit::Reset).unwrap();
        assert_eq!(*session.record(), Record::template());
    }

    #[tokio::test]
    async fn test_close_removes_session() {
        let registry = registry();
        let session = registry.open(None, Record::template()).await;
        session.apply(&Edit::AddEntry(ListSection::Achievements)).unwrap();

        registry.close(session.id).unwrap();
        assert!(matches!(registry.get(session.id), Err(AppError::NotFound(_))));
        assert!(matches!(registry.close(session.id), Err(AppError::NotFound(_))));
    }

    // ── idle eviction ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let registry = registry();
        let idle = registry.open(None, Record::template()).await;
        let active = registry.open(None, Record::template()).await;

        tokio::time::pause();
        tokio::time::advance(Duration::from_secs(20 * 60)).await;
        registry.get(active.id).unwrap();
        tokio::time::advance(Duration::from_secs(15 * 60)).await;

        assert_eq!(registry.evict_idle(Duration::from_secs(30 * 60)), 1);
        assert!(matches!(registry.get(idle.id), Err(AppError::NotFound(_))));
        assert!(registry.get(active.id).is_ok(), "recently seen session survives");
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_edits_keep_session_alive() {
        let registry = registry();
        let session = registry.open(None, Record::template()).await;

        tokio::time::pause();
        tokio::time::advance(Duration::from_secs(50)).await;
        session.apply(&set("professionalSummary", "Engineer")).unwrap();
        tokio::time::advance(Duration::from_secs(50)).await;

        assert_eq!(registry.evict_idle(Duration::from_secs(60)), 0);
        assert_eq!(registry.len(), 1);
        session.cancel_pending();
    }

    #[tokio::test]
    async fn test_sweeper_closes_expired_sessions() {
        let registry = Arc::new(registry());
        let session = registry.open(None, Record::template()).await;

        tokio::time::pause();
        let sweeper = registry.spawn_sweeper(Duration::from_secs(60));
        tokio::time::advance(Duration::from_secs(61)).await;
        for _ in 0..100 {
            if registry.len() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        sweeper.abort();

        assert_eq!(registry.len(), 0);
        assert!(matches!(registry.get(session.id), Err(AppError::NotFound(_))));
    }
}
