//! Google Calendar backend for lectio-sync.
//!
//! Talks to the Calendar v3 REST API directly so listing can be paged and
//! cancelled, and every request shares one retry policy.

pub mod event;
pub mod retry;
pub mod session;
pub mod store;

pub use retry::RetryPolicy;
pub use session::{Credentials, Session, SessionData};
pub use store::GoogleCalendarStore;
