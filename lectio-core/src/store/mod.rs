//! Calendar store abstraction.
//!
//! A store holds calendar events keyed by external id. Only the ids inside a
//! [`Namespace`] are ever listed, written or deleted through it.

mod memory;

pub use memory::MemoryStore;

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::calendar_event::CalendarEvent;
use crate::date_range::DateRange;
use crate::error::{StoreError, StoreResult};
use crate::namespace::Namespace;

#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// Every event in `namespace` overlapping `range`, cancelled ones included.
    /// All pages are drained before returning.
    async fn list_events(
        &self,
        namespace: &Namespace,
        range: &DateRange,
        cancel: &CancellationToken,
    ) -> StoreResult<HashMap<String, CalendarEvent>>;

    async fn insert_event(&self, event: &CalendarEvent) -> StoreResult<()>;

    async fn update_event(&self, external_id: &str, event: &CalendarEvent) -> StoreResult<()>;

    async fn delete_event(&self, external_id: &str) -> StoreResult<()>;
}

/// One page of a paginated listing.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

/// Fetches pages until the store stops handing out continuation tokens.
///
/// Fails as a whole if any page fails or `cancel` fires between pages; a
/// partial listing would make the planner delete events it never saw.
pub async fn drain_pages<T, F, Fut>(
    cancel: &CancellationToken,
    mut fetch_page: F,
) -> StoreResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = StoreResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StoreError::Cancelled),
            page = fetch_page(page_token.take()) => page?,
        };

        pages += 1;
        items.extend(page.items);

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    debug!(pages, count = items.len(), "Drained paginated listing");
    Ok(items)
}
