use crate::{
    application::{self, ApplicantContact},
    facility::FacilityContact,
    Error, Result,
};
use chrono::{DateTime, Utc};
use futures::TryFutureExt;
use itertools::Itertools;
use sqlx::{PgExecutor, Postgres};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Status {
    Pending,
    Canceled,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Canceled => "Canceled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Shift {
    pub id: String,
    pub shift_date: DateTime<Utc>,
    pub shift_time: String,
    pub status: Status,
    pub hired_provider_id: Option<String>,
    pub archived: bool,
    pub facility_id: String,
}

impl Shift {
    /// Pending, unhired and not archived.
    pub fn is_open(&self) -> bool {
        self.hired_provider_id.is_none() && !self.archived && self.status == Status::Pending
    }
}

/// A shift with the contact data needed to list it or notify about it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSummary {
    pub id: String,
    pub shift_date: DateTime<Utc>,
    pub shift_time: String,
    pub applications: Vec<ApplicantContact>,
    pub facility: FacilityContact,
}

#[derive(Debug, sqlx::FromRow)]
struct ShiftRow {
    id: String,
    shift_date: DateTime<Utc>,
    shift_time: String,
    facility_name: String,
    facility_email: String,
}

impl ShiftRow {
    fn into_summary(self, applications: Vec<ApplicantContact>) -> ShiftSummary {
        ShiftSummary {
            id: self.id,
            shift_date: self.shift_date,
            shift_time: self.shift_time,
            applications,
            facility: FacilityContact::new(self.facility_name, self.facility_email),
        }
    }
}

const FETCH_OPEN_SHIFTS_QUERY: &str = r#"
    SELECT
        s.id,
        s.shift_date,
        s.shift_time,
        f.name AS facility_name,
        u.email AS facility_email
    FROM
        shifts s
        JOIN facilities f ON f.id = s.facility_id
        JOIN users u ON u.id = f.user_id
    WHERE
        s.hired_provider_id IS NULL
        AND s.archived = false
        AND s.status = "#;

fn fetch_open_shifts_query<'builder>() -> sqlx::QueryBuilder<'builder, Postgres> {
    let mut builder = sqlx::QueryBuilder::new(FETCH_OPEN_SHIFTS_QUERY);
    builder.push_bind(Status::Pending.as_str());
    builder
}

pub async fn open<'c, E>(exec: E) -> Result<Vec<ShiftSummary>>
where
    E: PgExecutor<'c> + Copy,
{
    let rows = fetch_open_shifts_query()
        .push(" ORDER BY s.shift_date, s.id")
        .build_query_as::<ShiftRow>()
        .fetch_all(exec)
        .await?;
    with_applicants(exec, rows).await
}

pub async fn expired<'c, E>(exec: E, now: DateTime<Utc>) -> Result<Vec<ShiftSummary>>
where
    E: PgExecutor<'c> + Copy,
{
    let rows = fetch_open_shifts_query()
        .push(" AND s.shift_date < ")
        .push_bind(now)
        .push(" ORDER BY s.shift_date, s.id")
        .build_query_as::<ShiftRow>()
        .fetch_all(exec)
        .await?;
    with_applicants(exec, rows).await
}

async fn with_applicants<'c, E>(exec: E, rows: Vec<ShiftRow>) -> Result<Vec<ShiftSummary>>
where
    E: PgExecutor<'c> + Copy,
{
    if rows.is_empty() {
        return Ok(vec![]);
    }
    let ids = rows.iter().map(|row| row.id.clone()).collect_vec();
    let mut applicants = application::contacts_for_shifts(exec, &ids)
        .await?
        .into_iter()
        .into_group_map();
    Ok(rows
        .into_iter()
        .map(|row| {
            let applications = applicants.remove(&row.id).unwrap_or_default();
            row.into_summary(applications)
        })
        .collect())
}

/// Marks the given shifts archived and canceled. No other column changes.
pub async fn archive_many<'c, E>(exec: E, ids: &[String]) -> Result<u64>
where
    E: PgExecutor<'c>,
{
    if ids.is_empty() {
        return Ok(0);
    }
    sqlx::query("UPDATE shifts SET archived = true, status = $1 WHERE id = ANY($2)")
        .bind(Status::Canceled.as_str())
        .bind(ids)
        .execute(exec)
        .map_ok(|result| result.rows_affected())
        .map_err(Error::from)
        .await
}

/// Removes `provider_ids` from the shift's applicants.
pub async fn disconnect_applicants<'c, E>(
    exec: E,
    shift_id: &str,
    provider_ids: &[String],
) -> Result<u64>
where
    E: PgExecutor<'c>,
{
    if provider_ids.is_empty() {
        return Ok(0);
    }
    sqlx::query("DELETE FROM shift_applicants WHERE shift_id = $1 AND provider_id = ANY($2)")
        .bind(shift_id)
        .bind(provider_ids)
        .execute(exec)
        .map_ok(|result| result.rows_affected())
        .map_err(Error::from)
        .await
}
