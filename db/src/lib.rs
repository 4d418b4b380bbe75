//! Persistence gateway for the shift marketplace tables.
//!
//! The Postgres layout this crate reads and writes:
//!
//! ```text
//! users(id, email)
//! facilities(id, name, user_id)
//! providers(id, user_id)
//! shifts(id, shift_date, shift_time, status, hired_provider_id, archived, facility_id)
//! applications(id, created_at, applicant_name, shift_id, applicant_id)
//! shift_applicants(shift_id, provider_id)
//! ```
//!
//! `shift_applicants` backs both `Shift.applicants` and
//! `Provider.shifts_applied`.

pub type Result<T = ()> = anyhow::Result<T>;
pub type Error = anyhow::Error;
pub use anyhow::Context;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod application;
pub mod facility;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod pg;
pub mod provider;
pub mod shift;
pub mod unit_of_work;
pub mod user;

pub use application::ExpiringApplication;
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryStore;
pub use pg::PgStore;
pub use shift::ShiftSummary;
pub use unit_of_work::{UnitOfWork, Write};

/// Data access used by the sweeps and the API.
///
/// The `expire_*` operations commit a single [`UnitOfWork`] atomically: either
/// every planned write lands or none does.
#[async_trait]
pub trait Store: Send + Sync {
    /// Unhired, unarchived, pending shifts.
    async fn open_shifts(&self) -> Result<Vec<ShiftSummary>>;

    /// Open shifts whose date lies before `now`.
    async fn shifts_to_expire(&self, now: DateTime<Utc>) -> Result<Vec<ShiftSummary>>;

    /// Applications created at or before `created_before` whose shift is still
    /// pending, unhired and dated after `now`.
    async fn applications_to_expire(
        &self,
        now: DateTime<Utc>,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<ExpiringApplication>>;

    /// Archives and cancels the given shifts.
    async fn expire_shifts(&self, ids: &[String]) -> Result<()>;

    /// Deletes the given applications and disconnects them from both sides of
    /// the shift/provider relation.
    async fn expire_applications(&self, ids: &[String]) -> Result<()>;
}
