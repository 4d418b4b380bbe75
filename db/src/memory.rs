//! In-memory store.
//!
//! Holds the same entities and relation as the Postgres tables and applies a
//! [`UnitOfWork`] to a staged copy that only replaces the live tables once
//! every write has succeeded. A failure can be injected at a given write to
//! exercise the rollback path.

use crate::{
    application::{ApplicantContact, Application, ApplicationShift, Link},
    facility::{Facility, FacilityContact},
    provider::{Provider, ProviderContact},
    shift::{Shift, Status},
    user::User,
    ExpiringApplication, Result, ShiftSummary, Store, UnitOfWork, Write,
};
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: Tables,
    fail_at: Option<usize>,
}

/// A copy of every table, comparable across points in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables {
    users: BTreeMap<String, User>,
    facilities: BTreeMap<String, Facility>,
    providers: BTreeMap<String, Provider>,
    shifts: BTreeMap<String, Shift>,
    applications: BTreeMap<String, Application>,
    applicants: BTreeSet<(String, String)>,
}

impl Tables {
    fn email(&self, user_id: &str) -> Option<String> {
        self.users.get(user_id).map(|user| user.email.clone())
    }

    fn facility_contact(&self, facility_id: &str) -> Option<FacilityContact> {
        let facility = self.facilities.get(facility_id)?;
        let email = self.email(&facility.user_id)?;
        Some(FacilityContact::new(facility.name.clone(), email))
    }

    fn provider_email(&self, provider_id: &str) -> Option<String> {
        let provider = self.providers.get(provider_id)?;
        self.email(&provider.user_id)
    }

    fn summarize(&self, shift: &Shift) -> Option<ShiftSummary> {
        let facility = self.facility_contact(&shift.facility_id)?;
        let applications = self
            .applications
            .values()
            .filter(|application| application.shift_id == shift.id)
            .filter_map(|application| self.provider_email(&application.applicant_id))
            .map(ApplicantContact::new)
            .collect();
        Some(ShiftSummary {
            id: shift.id.clone(),
            shift_date: shift.shift_date,
            shift_time: shift.shift_time.clone(),
            applications,
            facility,
        })
    }

    fn open_shifts<F>(&self, mut filter: F) -> Vec<ShiftSummary>
    where
        F: FnMut(&Shift) -> bool,
    {
        let mut shifts: Vec<&Shift> = self
            .shifts
            .values()
            .filter(|shift| shift.is_open() && filter(shift))
            .collect();
        shifts.sort_by(|a, b| (a.shift_date, &a.id).cmp(&(b.shift_date, &b.id)));
        shifts
            .into_iter()
            .filter_map(|shift| self.summarize(shift))
            .collect()
    }

    fn expiring(&self, application: &Application) -> Option<ExpiringApplication> {
        let shift = self.shifts.get(&application.shift_id)?;
        let facility = self.facility_contact(&shift.facility_id)?;
        let email = self.provider_email(&application.applicant_id)?;
        Some(ExpiringApplication {
            id: application.id.clone(),
            created_at: application.created_at,
            applicant_name: application.applicant_name.clone(),
            shift: ApplicationShift {
                id: shift.id.clone(),
                shift_date: shift.shift_date,
                shift_time: shift.shift_time.clone(),
                facility,
            },
            applicant: ProviderContact::new(email),
        })
    }

    fn links(&self, ids: &[String]) -> Vec<Link> {
        ids.iter()
            .filter_map(|id| self.applications.get(id))
            .map(Application::link)
            .collect()
    }

    fn apply(&mut self, write: &Write) {
        match write {
            Write::ArchiveShifts { ids } => {
                for id in ids {
                    if let Some(shift) = self.shifts.get_mut(id) {
                        shift.archived = true;
                        shift.status = Status::Canceled;
                    }
                }
            }
            Write::DisconnectApplicants {
                shift_id,
                provider_ids,
            } => self
                .applicants
                .retain(|(shift, provider)| !(shift == shift_id && provider_ids.contains(provider))),
            Write::DeleteApplications { ids } => {
                for id in ids {
                    self.applications.remove(id);
                }
            }
            Write::DisconnectShiftsApplied {
                provider_id,
                shift_ids,
            } => self
                .applicants
                .retain(|(shift, provider)| !(provider == provider_id && shift_ids.contains(shift))),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }

    pub fn insert_user(&self, user: User) -> Result<()> {
        self.write()?.tables.users.insert(user.id.clone(), user);
        Ok(())
    }

    pub fn insert_facility(&self, facility: Facility) -> Result<()> {
        self.write()?
            .tables
            .facilities
            .insert(facility.id.clone(), facility);
        Ok(())
    }

    pub fn insert_provider(&self, provider: Provider) -> Result<()> {
        self.write()?
            .tables
            .providers
            .insert(provider.id.clone(), provider);
        Ok(())
    }

    pub fn insert_shift(&self, shift: Shift) -> Result<()> {
        self.write()?.tables.shifts.insert(shift.id.clone(), shift);
        Ok(())
    }

    /// Inserts the application and connects its provider to its shift, the
    /// way applying for a shift does.
    pub fn insert_application(&self, application: Application) -> Result<()> {
        let mut inner = self.write()?;
        inner
            .tables
            .applicants
            .insert((application.shift_id.clone(), application.applicant_id.clone()));
        inner
            .tables
            .applications
            .insert(application.id.clone(), application);
        Ok(())
    }

    /// Makes the commit fail when it reaches the write at `index`.
    pub fn fail_at_write(&self, index: usize) -> Result<()> {
        self.write()?.fail_at = Some(index);
        Ok(())
    }

    pub fn snapshot(&self) -> Result<Tables> {
        Ok(self.read()?.tables.clone())
    }

    pub fn shift(&self, id: &str) -> Result<Option<Shift>> {
        Ok(self.read()?.tables.shifts.get(id).cloned())
    }

    pub fn application(&self, id: &str) -> Result<Option<Application>> {
        Ok(self.read()?.tables.applications.get(id).cloned())
    }

    /// Provider ids in `Shift.applicants`.
    pub fn applicants(&self, shift_id: &str) -> Result<Vec<String>> {
        Ok(self
            .read()?
            .tables
            .applicants
            .iter()
            .filter(|(shift, _)| shift == shift_id)
            .map(|(_, provider)| provider.clone())
            .collect())
    }

    /// Shift ids in `Provider.shifts_applied`.
    pub fn shifts_applied(&self, provider_id: &str) -> Result<Vec<String>> {
        Ok(self
            .read()?
            .tables
            .applicants
            .iter()
            .filter(|(_, provider)| provider == provider_id)
            .map(|(shift, _)| shift.clone())
            .collect())
    }

    /// Plans the writes from the live tables and applies them under the same
    /// write guard.
    fn commit<F>(&self, plan: F) -> Result<()>
    where
        F: FnOnce(&Tables) -> UnitOfWork,
    {
        let mut inner = self.write()?;
        let work = plan(&inner.tables);
        let fail_at = inner.fail_at.take();
        let mut staged = inner.tables.clone();
        for (index, write) in work.writes().iter().enumerate() {
            if fail_at == Some(index) {
                bail!("write {index} failed");
            }
            staged.apply(write);
        }
        inner.tables = staged;
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn open_shifts(&self) -> Result<Vec<ShiftSummary>> {
        Ok(self.read()?.tables.open_shifts(|_| true))
    }

    async fn shifts_to_expire(&self, now: DateTime<Utc>) -> Result<Vec<ShiftSummary>> {
        Ok(self
            .read()?
            .tables
            .open_shifts(|shift| shift.shift_date < now))
    }

    async fn applications_to_expire(
        &self,
        now: DateTime<Utc>,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<ExpiringApplication>> {
        let inner = self.read()?;
        let tables = &inner.tables;
        let mut applications: Vec<&Application> = tables
            .applications
            .values()
            .filter(|application| application.created_at <= created_before)
            .filter(|application| {
                tables.shifts.get(&application.shift_id).is_some_and(|shift| {
                    shift.status == Status::Pending
                        && shift.hired_provider_id.is_none()
                        && shift.shift_date > now
                })
            })
            .collect();
        applications.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(applications
            .into_iter()
            .filter_map(|application| tables.expiring(application))
            .collect())
    }

    async fn expire_shifts(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.commit(|_| UnitOfWork::shift_expiry(ids))
    }

    async fn expire_applications(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.commit(|tables| UnitOfWork::application_expiry(ids, &tables.links(ids)))
    }
}
