//! Schedule sources: where modules come from.

mod json;

pub use json::JsonScheduleSource;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::date_range::DateRange;
use crate::error::SourceError;
use crate::module::Module;

#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// Every module overlapping `range`, keyed by module id.
    ///
    /// Fails as a whole: there is no partial result for a range.
    async fn fetch_modules(
        &self,
        range: &DateRange,
    ) -> Result<HashMap<String, Module>, SourceError>;
}
