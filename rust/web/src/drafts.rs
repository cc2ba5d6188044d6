use crate::events::{DraftEvent, EventBus};
use bgo_engine::economics::RoomEconomicsResult;
use bgo_engine::errors::DraftError;
use bgo_engine::room::{RoomDraft, Submission, SubmissionPolicy};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

pub type DraftId = String;

pub const DEFAULT_DRAFT_TTL: Duration = Duration::from_secs(30 * 60);

/// Open room-creation forms. Each update recomputes the preview; a draft
/// goes away on submit, on discard, or once idle for longer than the TTL.
#[derive(Debug)]
pub struct DraftManager {
    drafts: RwLock<HashMap<DraftId, Arc<DraftEntry>>>,
    event_bus: Arc<EventBus>,
    draft_ttl: Duration,
    policy: SubmissionPolicy,
}

impl DraftManager {
    pub fn new(event_bus: Arc<EventBus>, policy: SubmissionPolicy) -> Self {
        Self::with_ttl(event_bus, policy, DEFAULT_DRAFT_TTL)
    }

    pub fn with_ttl(event_bus: Arc<EventBus>, policy: SubmissionPolicy, ttl: Duration) -> Self {
        Self {
            drafts: RwLock::new(HashMap::new()),
            event_bus,
            draft_ttl: ttl,
            policy,
        }
    }

    pub fn policy(&self) -> SubmissionPolicy {
        self.policy
    }

    pub fn create_draft(&self, draft: RoomDraft) -> Result<DraftSnapshot, DraftStoreError> {
        let id = Uuid::new_v4().to_string();
        let entry = Arc::new(DraftEntry::new(draft));
        {
            let mut guard = self
                .drafts
                .write()
                .map_err(|_| DraftStoreError::StoragePoisoned)?;
            guard.insert(id.clone(), Arc::clone(&entry));
        }

        self.event_bus.broadcast(
            &id,
            DraftEvent::DraftOpened {
                draft_id: id.clone(),
            },
        );
        self.snapshot_entry(&id, &entry)
    }

    pub fn snapshot(&self, id: &DraftId) -> Result<DraftSnapshot, DraftStoreError> {
        let entry = self.lookup(id)?;
        entry.touch();
        self.snapshot_entry(id, &entry)
    }

    pub fn update_draft(
        &self,
        id: &DraftId,
        draft: RoomDraft,
    ) -> Result<DraftSnapshot, DraftStoreError> {
        let entry = self.lookup(id)?;
        {
            let mut state = entry
                .state
                .lock()
                .map_err(|_| DraftStoreError::StoragePoisoned)?;
            *state = draft;
        }
        entry.touch();

        let snapshot = self.snapshot_entry(id, &entry)?;
        let warnings = snapshot
            .preview
            .as_ref()
            .map(|p| p.warnings.clone())
            .unwrap_or_default();
        self.event_bus.broadcast(
            id,
            DraftEvent::DraftRecomputed {
                draft_id: id.clone(),
                preview: snapshot.preview.clone(),
                error: snapshot.error.clone(),
                warnings,
            },
        );
        Ok(snapshot)
    }

    /// Validates under the manager's policy. A rejected draft stays open.
    /// Only the caller that takes the draft out of storage gets the payload;
    /// a concurrent submit of the same id sees `NotFound`.
    pub fn submit(&self, id: &DraftId) -> Result<Submission, DraftStoreError> {
        let entry = self.lookup(id)?;
        let submission = {
            let state = entry
                .state
                .lock()
                .map_err(|_| DraftStoreError::StoragePoisoned)?;
            let submission = state.prepare_submission(self.policy)?;
            // Removed while the state lock is held so the draft cannot be
            // edited between validation and removal.
            self.remove(id)?;
            submission
        };
        self.event_bus.broadcast(
            id,
            DraftEvent::DraftSubmitted {
                draft_id: id.clone(),
                payload: submission.payload.clone(),
            },
        );
        Ok(submission)
    }

    pub fn discard(&self, id: &DraftId) -> Result<(), DraftStoreError> {
        self.lookup(id)?;
        self.remove(id)?;
        self.announce_discarded(id);
        Ok(())
    }

    /// Drops idle drafts and tells their subscribers. Returns the removed ids.
    pub fn cleanup_expired_drafts(&self) -> Vec<DraftId> {
        let expired: Vec<DraftId> = {
            let mut guard = match self.drafts.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let ids: Vec<DraftId> = guard
                .iter()
                .filter(|(_, entry)| entry.is_expired(self.draft_ttl))
                .map(|(id, _)| id.clone())
                .collect();
            for id in &ids {
                guard.remove(id);
            }
            ids
        };
        for id in &expired {
            self.announce_discarded(id);
        }
        expired
    }

    /// Whether `id` names a live draft. Does not refresh its idle timer.
    pub fn contains(&self, id: &DraftId) -> Result<bool, DraftStoreError> {
        match self.lookup(id) {
            Ok(_) => Ok(true),
            Err(DraftStoreError::NotFound(_)) | Err(DraftStoreError::Expired(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn active_drafts(&self) -> Vec<DraftId> {
        match self.drafts.read() {
            Ok(guard) => guard.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    fn lookup(&self, id: &DraftId) -> Result<Arc<DraftEntry>, DraftStoreError> {
        let entry = {
            let guard = self
                .drafts
                .read()
                .map_err(|_| DraftStoreError::StoragePoisoned)?;
            guard.get(id).cloned()
        }
        .ok_or_else(|| DraftStoreError::NotFound(id.clone()))?;

        if entry.is_expired(self.draft_ttl) {
            // Another caller may have expired it first; only the remover announces.
            if self.remove(id).is_ok() {
                self.announce_discarded(id);
            }
            return Err(DraftStoreError::Expired(id.clone()));
        }
        Ok(entry)
    }

    fn remove(&self, id: &DraftId) -> Result<Arc<DraftEntry>, DraftStoreError> {
        let mut guard = self
            .drafts
            .write()
            .map_err(|_| DraftStoreError::StoragePoisoned)?;
        guard
            .remove(id)
            .ok_or_else(|| DraftStoreError::NotFound(id.clone()))
    }

    fn announce_discarded(&self, id: &DraftId) {
        self.event_bus.broadcast(
            id,
            DraftEvent::DraftDiscarded {
                draft_id: id.clone(),
            },
        );
    }

    fn snapshot_entry(
        &self,
        id: &DraftId,
        entry: &DraftEntry,
    ) -> Result<DraftSnapshot, DraftStoreError> {
        let draft = entry
            .state
            .lock()
            .map_err(|_| DraftStoreError::StoragePoisoned)?
            .clone();
        let (preview, error) = match draft.preview(self.policy.basis) {
            Ok(result) => (Some(result.for_display()), None),
            Err(err) => (None, Some(err.to_string())),
        };
        Ok(DraftSnapshot {
            draft_id: id.clone(),
            draft,
            preview,
            error,
        })
    }
}

#[derive(Debug)]
pub struct DraftEntry {
    state: Mutex<RoomDraft>,
    last_active: Mutex<Instant>,
}

impl DraftEntry {
    fn new(draft: RoomDraft) -> Self {
        Self {
            state: Mutex::new(draft),
            last_active: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        if let Ok(mut guard) = self.last_active.lock() {
            *guard = Instant::now();
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        match self.last_active.lock() {
            Ok(last) => last.elapsed() >= ttl,
            Err(_) => false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftSnapshot {
    pub draft_id: DraftId,
    pub draft: RoomDraft,
    pub preview: Option<RoomEconomicsResult>,
    pub error: Option<String>,
}

#[derive(Debug, Error)]
pub enum DraftStoreError {
    #[error("Draft not found: {0}")]
    NotFound(DraftId),
    #[error("Draft expired: {0}")]
    Expired(DraftId),
    #[error("Invalid draft: {0}")]
    Invalid(#[from] DraftError),
    #[error("Draft storage poisoned")]
    StoragePoisoned,
}
