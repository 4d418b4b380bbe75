use crate::{
    application::{self, Link},
    provider, shift, Result,
};
use itertools::Itertools;
use sqlx::PgConnection;

/// A single planned write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    ArchiveShifts {
        ids: Vec<String>,
    },
    DisconnectApplicants {
        shift_id: String,
        provider_ids: Vec<String>,
    },
    DeleteApplications {
        ids: Vec<String>,
    },
    DisconnectShiftsApplied {
        provider_id: String,
        shift_ids: Vec<String>,
    },
}

impl Write {
    async fn execute(&self, conn: &mut PgConnection) -> Result<u64> {
        match self {
            Self::ArchiveShifts { ids } => shift::archive_many(conn, ids).await,
            Self::DisconnectApplicants {
                shift_id,
                provider_ids,
            } => shift::disconnect_applicants(conn, shift_id, provider_ids).await,
            Self::DeleteApplications { ids } => application::delete_many(conn, ids).await,
            Self::DisconnectShiftsApplied {
                provider_id,
                shift_ids,
            } => provider::disconnect_shifts(conn, provider_id, shift_ids).await,
        }
    }
}

/// The ordered writes of one sweep iteration, committed together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitOfWork {
    writes: Vec<Write>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: Write) -> &mut Self {
        self.writes.push(write);
        self
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn shift_expiry(ids: &[String]) -> Self {
        let mut work = Self::new();
        if !ids.is_empty() {
            work.push(Write::ArchiveShifts { ids: ids.to_vec() });
        }
        work
    }

    /// Plans the deletion of `ids` given their re-read `links`: disconnect
    /// applicants per shift, delete the applications, then disconnect applied
    /// shifts per provider.
    pub fn application_expiry(ids: &[String], links: &[Link]) -> Self {
        let mut work = Self::new();
        if ids.is_empty() {
            return work;
        }
        for shift_id in links.iter().map(|link| &link.shift_id).unique() {
            let provider_ids = links
                .iter()
                .filter(|link| &link.shift_id == shift_id)
                .map(|link| link.applicant_id.clone())
                .unique()
                .collect_vec();
            work.push(Write::DisconnectApplicants {
                shift_id: shift_id.clone(),
                provider_ids,
            });
        }
        work.push(Write::DeleteApplications { ids: ids.to_vec() });
        for provider_id in links.iter().map(|link| &link.applicant_id).unique() {
            let shift_ids = links
                .iter()
                .filter(|link| &link.applicant_id == provider_id)
                .map(|link| link.shift_id.clone())
                .unique()
                .collect_vec();
            work.push(Write::DisconnectShiftsApplied {
                provider_id: provider_id.clone(),
                shift_ids,
            });
        }
        work
    }

    /// Runs every write on `conn`, which is expected to be inside a
    /// transaction. Returns the total number of affected rows.
    pub async fn apply(&self, conn: &mut PgConnection) -> Result<u64> {
        let mut affected = 0;
        for write in &self.writes {
            affected += write.execute(&mut *conn).await?;
        }
        tracing::debug!(writes = self.writes.len(), affected, "applied unit of work");
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(shift_id: &str, applicant_id: &str) -> Link {
        Link {
            shift_id: shift_id.to_string(),
            applicant_id: applicant_id.to_string(),
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn shift_expiry_is_one_bulk_update() {
        let work = UnitOfWork::shift_expiry(&ids(&["s1", "s2"]));
        assert_eq!(
            work.writes(),
            &[Write::ArchiveShifts {
                ids: ids(&["s1", "s2"])
            }]
        );
        assert!(UnitOfWork::shift_expiry(&[]).is_empty());
    }

    #[test]
    fn application_expiry_groups_by_shift_and_provider() {
        let links = [link("s1", "p1"), link("s1", "p2"), link("s2", "p1")];
        let work = UnitOfWork::application_expiry(&ids(&["a1", "a2", "a3"]), &links);
        assert_eq!(
            work.writes(),
            &[
                Write::DisconnectApplicants {
                    shift_id: "s1".to_string(),
                    provider_ids: ids(&["p1", "p2"]),
                },
                Write::DisconnectApplicants {
                    shift_id: "s2".to_string(),
                    provider_ids: ids(&["p1"]),
                },
                Write::DeleteApplications {
                    ids: ids(&["a1", "a2", "a3"]),
                },
                Write::DisconnectShiftsApplied {
                    provider_id: "p1".to_string(),
                    shift_ids: ids(&["s1", "s2"]),
                },
                Write::DisconnectShiftsApplied {
                    provider_id: "p2".to_string(),
                    shift_ids: ids(&["s1"]),
                },
            ]
        );
    }

    #[test]
    fn application_expiry_without_links_still_deletes() {
        let work = UnitOfWork::application_expiry(&ids(&["a1"]), &[]);
        assert_eq!(
            work.writes(),
            &[Write::DeleteApplications { ids: ids(&["a1"]) }]
        );
        assert!(UnitOfWork::application_expiry(&[], &[]).is_empty());
    }
}
