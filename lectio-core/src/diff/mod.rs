//! Reconciliation planning: what to insert, update and delete.

mod diff_kind;
mod operation;
mod plan;

pub use diff_kind::DiffKind;
pub use operation::Operation;
pub use plan::{PendingUpdate, SyncPlan, plan};
