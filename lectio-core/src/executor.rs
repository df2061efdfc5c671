//! Runs planned writes against a calendar store.
//!
//! Every operation is its own task. A semaphore caps how many talk to the
//! store at once, and each failure is recorded without affecting the rest.
//! `execute` only returns once every task has finished.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::diff::{DiffKind, Operation};
use crate::error::{StoreError, StoreResult};
use crate::report::{ExecutionResult, OperationFailure};
use crate::store::CalendarStore;

pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Operations allowed in flight at once.
    pub concurrency: usize,
    /// Upper bound for a single write, including time spent retrying.
    pub operation_timeout: Duration,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        ExecutorOptions {
            concurrency: DEFAULT_CONCURRENCY,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

pub struct Executor<S: CalendarStore + ?Sized> {
    store: Arc<S>,
    options: ExecutorOptions,
}

impl<S: CalendarStore + ?Sized + 'static> Executor<S> {
    pub fn new(store: Arc<S>, options: ExecutorOptions) -> Self {
        Executor { store, options }
    }

    pub async fn execute(
        &self,
        operations: Vec<Operation>,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        let mut result = ExecutionResult::default();
        if operations.is_empty() {
            return result;
        }

        info!(
            count = operations.len(),
            concurrency = self.options.concurrency,
            "Executing calendar writes"
        );

        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut pending: HashSet<(DiffKind, String)> = HashSet::with_capacity(operations.len());
        let mut join_set = JoinSet::new();

        for operation in operations {
            let kind = operation.kind();
            let external_id = operation.external_id().to_string();
            pending.insert((kind, external_id.clone()));

            let store = Arc::clone(&self.store);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            let limit = self.options.operation_timeout;

            join_set.spawn(async move {
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(StoreError::Cancelled),
                    outcome = run_operation(store.as_ref(), &semaphore, &operation, limit) => {
                        outcome
                    }
                };
                (kind, external_id, outcome)
            });
        }

        // Outcomes are folded in here, by the only owner of `result`.
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((kind, external_id, outcome)) => {
                    pending.remove(&(kind, external_id.clone()));
                    match outcome {
                        Ok(()) => {
                            debug!(%kind, external_id = %external_id, "Write succeeded");
                            result.record_success(kind);
                        }
                        Err(error) => {
                            warn!(
                                %kind,
                                external_id = %external_id,
                                error = %error,
                                "Write failed"
                            );
                            result.record_failure(OperationFailure {
                                kind,
                                external_id,
                                error,
                            });
                        }
                    }
                }
                Err(e) => error!(error = %e, "Calendar write task panicked"),
            }
        }

        // Tasks that died without reporting back.
        let mut aborted: Vec<_> = pending.into_iter().collect();
        aborted.sort_by(|a, b| a.1.cmp(&b.1));
        for (kind, external_id) in aborted {
            result.record_failure(OperationFailure {
                kind,
                external_id,
                error: StoreError::Aborted,
            });
        }

        result
    }
}

async fn run_operation<S: CalendarStore + ?Sized>(
    store: &S,
    semaphore: &Semaphore,
    operation: &Operation,
    limit: Duration,
) -> StoreResult<()> {
    let _permit = semaphore.acquire().await.map_err(|_| StoreError::Cancelled)?;

    let write = async {
        match operation {
            Operation::Insert(event) => match store.insert_event(event).await {
                // The id exists outside the listed window, so rewrite it in place.
                Err(StoreError::Conflict(_)) => {
                    debug!(external_id = %event.external_id, "Insert conflicted, updating instead");
                    store.update_event(&event.external_id, event).await
                }
                outcome => outcome,
            },
            Operation::Update(event) => store.update_event(&event.external_id, event).await,
            Operation::Delete(external_id) => store.delete_event(external_id).await,
        }
    };

    tokio::time::timeout(limit, write)
        .await
        .map_err(|_| StoreError::Timeout(limit.as_secs()))?
}
