//! In-memory calendar store.
//!
//! Behaves like the remote calendar where it matters for reconciliation:
//! deleting only marks an event cancelled (it stays listed), inserting an id
//! that exists is a conflict, and listings are served in pages.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::calendar_event::{CalendarEvent, LifecycleState};
use crate::date_range::DateRange;
use crate::error::{StoreError, StoreResult};
use crate::namespace::Namespace;
use crate::store::{CalendarStore, Page, drain_pages};

const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Default)]
struct MemoryState {
    events: BTreeMap<String, CalendarEvent>,
    failing_ids: HashSet<String>,
    writes: usize,
}

#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    page_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            state: Mutex::new(MemoryState::default()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_events(self, events: impl IntoIterator<Item = CalendarEvent>) -> Self {
        {
            let mut state = self.lock();
            for event in events {
                state.events.insert(event.external_id.clone(), event);
            }
        }
        self
    }

    /// Every write touching `external_id` fails with an HTTP 503.
    pub fn fail_on(&self, external_id: &str) {
        self.lock().failing_ids.insert(external_id.to_string());
    }

    pub fn event(&self, external_id: &str) -> Option<CalendarEvent> {
        self.lock().events.get(external_id).cloned()
    }

    /// All stored events, in and out of any namespace.
    pub fn events(&self) -> Vec<CalendarEvent> {
        self.lock().events.values().cloned().collect()
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test panicked mid-write; the map is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_failure(state: &MemoryState, external_id: &str) -> StoreResult<()> {
        if state.failing_ids.contains(external_id) {
            return Err(StoreError::Http {
                status: 503,
                message: format!("injected failure for {external_id}"),
            });
        }
        Ok(())
    }

    fn page(
        &self,
        namespace: &Namespace,
        range: &DateRange,
        page_token: Option<String>,
    ) -> StoreResult<Page<CalendarEvent>> {
        let offset = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| StoreError::Malformed(format!("bad page token '{token}'")))?,
            None => 0,
        };

        let state = self.lock();
        let matching: Vec<&CalendarEvent> = state
            .events
            .values()
            .filter(|event| namespace.owns(&event.external_id))
            .filter(|event| match (event.start, event.end) {
                (Some(start), Some(end)) => range.overlaps(&start, &end),
                _ => true,
            })
            .collect();

        let items: Vec<CalendarEvent> = matching
            .iter()
            .skip(offset)
            .take(self.page_size)
            .map(|event| (*event).clone())
            .collect();

        let next = offset + items.len();
        let next_page_token = (next < matching.len()).then(|| next.to_string());

        Ok(Page {
            items,
            next_page_token,
        })
    }
}

#[async_trait]
impl CalendarStore for MemoryStore {
    async fn list_events(
        &self,
        namespace: &Namespace,
        range: &DateRange,
        cancel: &CancellationToken,
    ) -> StoreResult<HashMap<String, CalendarEvent>> {
        let items = drain_pages(cancel, |token| {
            let page = self.page(namespace, range, token);
            async move { page }
        })
        .await?;

        Ok(items
            .into_iter()
            .map(|event| (event.external_id.clone(), event))
            .collect())
    }

    async fn insert_event(&self, event: &CalendarEvent) -> StoreResult<()> {
        let mut state = self.lock();
        Self::check_failure(&state, &event.external_id)?;

        if state.events.contains_key(&event.external_id) {
            return Err(StoreError::Conflict(event.external_id.clone()));
        }

        state.events.insert(event.external_id.clone(), event.clone());
        state.writes += 1;
        Ok(())
    }

    async fn update_event(&self, external_id: &str, event: &CalendarEvent) -> StoreResult<()> {
        let mut state = self.lock();
        Self::check_failure(&state, external_id)?;

        let Some(stored) = state.events.get_mut(external_id) else {
            return Err(StoreError::NotFound(external_id.to_string()));
        };

        *stored = CalendarEvent {
            external_id: external_id.to_string(),
            ..event.clone()
        };
        state.writes += 1;
        Ok(())
    }

    async fn delete_event(&self, external_id: &str) -> StoreResult<()> {
        let mut state = self.lock();
        Self::check_failure(&state, external_id)?;

        let Some(stored) = state.events.get_mut(external_id) else {
            return Err(StoreError::NotFound(external_id.to_string()));
        };

        stored.lifecycle = LifecycleState::Cancelled;
        state.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::tests::make_test_module;

    fn event(external_id: &str) -> CalendarEvent {
        let mut event = CalendarEvent::from_module(&make_test_module("0"), &Namespace::default());
        event.external_id = external_id.to_string();
        event
    }

    #[tokio::test]
    async fn test_list_drains_all_pages_within_namespace() {
        let store = MemoryStore::new()
            .with_page_size(2)
            .with_events((0..5).map(|i| event(&format!("lec{i}"))))
            .with_events([event("birthday")]);

        let listed = store
            .list_events(
                &Namespace::default(),
                &DateRange::unbounded(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(listed.len(), 5);
        assert!(!listed.contains_key("birthday"));
    }

    #[tokio::test]
    async fn test_delete_is_soft() {
        let store = MemoryStore::new().with_events([event("lec1")]);
        store.delete_event("lec1").await.unwrap();

        let stored = store.event("lec1").unwrap();
        assert!(stored.is_cancelled());
    }

    #[tokio::test]
    async fn test_insert_existing_id_conflicts() {
        let store = MemoryStore::new().with_events([event("lec1")]);
        let err = store.insert_event(&event("lec1")).await.unwrap_err();
        assert_eq!(err, StoreError::Conflict("lec1".to_string()));
    }

    #[tokio::test]
    async fn test_update_missing_id_is_not_found() {
        let store = MemoryStore::new();
        let err = store.update_event("lec1", &event("lec1")).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("lec1".to_string()));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new();
        store.fail_on("lec1");
        let err = store.insert_event(&event("lec1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Http { status: 503, .. }));
        assert_eq!(store.writes(), 0);
    }
}
