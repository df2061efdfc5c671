//! Reconciliation engine for lectio-sync.
//!
//! This crate turns a schedule of modules into calendar writes:
//! - `Module` and `CalendarEvent`, and the `Namespace` joining them
//! - `diff::plan` to compute inserts, updates and deletes
//! - `Executor` to run them concurrently against a `CalendarStore`
//! - `Synchronizer` to drive a whole run from a `ScheduleSource`

pub mod calendar_event;
pub mod config;
pub mod date_range;
pub mod diff;
pub mod equivalence;
pub mod error;
pub mod executor;
pub mod module;
pub mod namespace;
pub mod report;
pub mod source;
pub mod store;
pub mod sync;

pub use calendar_event::{CalendarEvent, ColorMarker, LifecycleState};
pub use config::SyncConfig;
pub use date_range::DateRange;
pub use diff::{DiffKind, Operation, SyncPlan};
pub use error::{SourceError, StoreError, StoreResult, SyncError, SyncResult};
pub use executor::{Executor, ExecutorOptions};
pub use module::{Module, ModuleStatus};
pub use namespace::Namespace;
pub use report::{ExecutionResult, OperationFailure, SyncReport};
pub use source::{JsonScheduleSource, ScheduleSource};
pub use store::{CalendarStore, MemoryStore};
pub use sync::Synchronizer;
