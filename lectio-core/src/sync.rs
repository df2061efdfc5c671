//! One reconciliation run: fetch both sides, plan, write, report.
//!
//! Nothing is kept between runs. Each run recomputes the plan from a fresh
//! schedule and a fresh listing of the calendar.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::SyncConfig;
use crate::date_range::DateRange;
use crate::diff::{self, SyncPlan};
use crate::error::{StoreError, SyncError, SyncResult};
use crate::executor::Executor;
use crate::namespace::Namespace;
use crate::report::{ExecutionResult, SyncReport};
use crate::source::ScheduleSource;
use crate::store::CalendarStore;

pub struct Synchronizer {
    source: Arc<dyn ScheduleSource>,
    store: Arc<dyn CalendarStore>,
    config: SyncConfig,
    namespace: Namespace,
}

impl Synchronizer {
    pub fn new(
        source: Arc<dyn ScheduleSource>,
        store: Arc<dyn CalendarStore>,
        config: SyncConfig,
    ) -> Self {
        let namespace = config.namespace();
        Synchronizer {
            source,
            store,
            config,
            namespace,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The window both fetches are limited to for a run starting at `now`.
    pub fn window(&self, now: DateTime<Utc>) -> SyncResult<DateRange> {
        DateRange::weeks_from_monday(self.config.tz()?, self.config.weeks, now)
    }

    /// Fetches the schedule and the calendar side by side and plans against them.
    ///
    /// If either fetch fails nothing is planned.
    pub async fn plan(
        &self,
        range: &DateRange,
        cancel: &CancellationToken,
    ) -> SyncResult<SyncPlan> {
        let fetch_modules = async {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(SyncError::Cancelled),
                modules = self.source.fetch_modules(range) => modules.map_err(SyncError::from),
            }
        };

        let fetch_events = async {
            self.store
                .list_events(&self.namespace, range, cancel)
                .await
                .map_err(listing_error)
        };

        let (modules, events) = tokio::try_join!(fetch_modules, fetch_events)?;

        info!(
            modules = modules.len(),
            events = events.len(),
            "Fetched schedule and calendar"
        );

        Ok(diff::plan(&modules, &events, &self.namespace))
    }

    pub async fn execute(&self, plan: SyncPlan, cancel: &CancellationToken) -> ExecutionResult {
        let operations = plan.into_operations(&self.namespace);
        Executor::new(Arc::clone(&self.store), self.config.executor_options())
            .execute(operations, cancel)
            .await
    }

    /// A full sync of the configured window.
    pub async fn run(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> SyncResult<SyncReport> {
        let started = Instant::now();
        let range = self.window(now)?;

        let plan = self.plan(&range, cancel).await?;
        info!(
            insert = plan.to_insert.len(),
            update = plan.to_update.len(),
            delete = plan.to_delete.len(),
            "Planned sync"
        );

        let result = self.execute(plan, cancel).await;

        Ok(SyncReport {
            result,
            elapsed: started.elapsed(),
        })
    }

    /// Deletes every live event in the namespace, at any date.
    ///
    /// Same path as a sync against an empty schedule, so only deletes are issued.
    pub async fn clear(&self, cancel: &CancellationToken) -> SyncResult<SyncReport> {
        let started = Instant::now();

        let events = self
            .store
            .list_events(&self.namespace, &DateRange::unbounded(), cancel)
            .await
            .map_err(listing_error)?;

        let plan = diff::plan(&HashMap::new(), &events, &self.namespace);
        info!(delete = plan.to_delete.len(), "Clearing namespace {}", self.namespace);

        let result = self.execute(plan, cancel).await;

        Ok(SyncReport {
            result,
            elapsed: started.elapsed(),
        })
    }
}

fn listing_error(error: StoreError) -> SyncError {
    match error {
        StoreError::Cancelled => SyncError::Cancelled,
        other => SyncError::Store(other),
    }
}
