use crate::drafts::DraftId;
use bgo_engine::economics::{EconomicsWarning, RoomEconomicsResult};
use bgo_engine::payload::CreateRoomPayload;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

pub type EventSender = mpsc::UnboundedSender<DraftEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<DraftEvent>;

/// Fans draft events out to every subscriber of a draft.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

#[derive(Debug, Default)]
struct EventBusInner {
    subscribers: RwLock<HashMap<DraftId, Vec<(usize, EventSender)>>>,
    next_id: AtomicUsize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, draft_id: DraftId) -> (usize, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::AcqRel);
        let mut guard = match self.inner.subscribers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.entry(draft_id).or_default().push((id, tx));
        (id, rx)
    }

    pub fn broadcast(&self, draft_id: &DraftId, event: DraftEvent) {
        let subscribers = match self.inner.subscribers.read() {
            Ok(guard) => guard.get(draft_id).cloned(),
            Err(poisoned) => poisoned.into_inner().get(draft_id).cloned(),
        };

        if let Some(list) = subscribers {
            let mut failed = Vec::new();
            for (id, sender) in list {
                if sender.send(event.clone()).is_err() {
                    failed.push(id);
                }
            }
            if !failed.is_empty() {
                self.remove_subscribers(draft_id, &failed);
            }
        }
    }

    pub fn unsubscribe(&self, draft_id: &DraftId, subscriber_id: usize) {
        self.remove_subscribers(draft_id, &[subscriber_id]);
    }

    pub fn subscriber_count(&self) -> usize {
        match self.inner.subscribers.read() {
            Ok(guard) => guard.values().map(|list| list.len()).sum(),
            Err(_) => 0,
        }
    }

    fn remove_subscribers(&self, draft_id: &DraftId, ids: &[usize]) {
        let mut guard = match self.inner.subscribers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(list) = guard.get_mut(draft_id) {
            list.retain(|(id, _)| !ids.contains(id));
            if list.is_empty() {
                guard.remove(draft_id);
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DraftEvent {
    DraftOpened {
        draft_id: DraftId,
    },
    DraftRecomputed {
        draft_id: DraftId,
        preview: Option<RoomEconomicsResult>,
        error: Option<String>,
        warnings: Vec<EconomicsWarning>,
    },
    DraftSubmitted {
        draft_id: DraftId,
        payload: CreateRoomPayload,
    },
    DraftDiscarded {
        draft_id: DraftId,
    },
}

impl DraftEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DraftEvent::DraftOpened { .. } => "draft_opened",
            DraftEvent::DraftRecomputed { .. } => "draft_recomputed",
            DraftEvent::DraftSubmitted { .. } => "draft_submitted",
            DraftEvent::DraftDiscarded { .. } => "draft_discarded",
        }
    }

    /// No further events follow for this draft.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DraftEvent::DraftSubmitted { .. } | DraftEvent::DraftDiscarded { .. }
        )
    }
}
