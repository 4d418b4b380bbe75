use crate::{
    facility::FacilityContact, provider::ProviderContact, shift::Status, Error, Result,
};
use chrono::{DateTime, Utc};
use futures::TryFutureExt;
use sqlx::PgExecutor;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Application {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub applicant_name: String,
    pub shift_id: String,
    pub applicant_id: String,
}

impl Application {
    pub fn link(&self) -> Link {
        Link {
            shift_id: self.shift_id.clone(),
            applicant_id: self.applicant_id.clone(),
        }
    }
}

/// The applicant slice of an application as nested under a shift.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ApplicantContact {
    pub applicant: ProviderContact,
}

impl ApplicantContact {
    pub fn new(email: String) -> Self {
        Self {
            applicant: ProviderContact::new(email),
        }
    }

    pub fn email(&self) -> &str {
        self.applicant.email()
    }
}

/// The (shift, provider) pair an application ties together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, sqlx::FromRow)]
pub struct Link {
    pub shift_id: String,
    pub applicant_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationShift {
    pub id: String,
    pub shift_date: DateTime<Utc>,
    pub shift_time: String,
    pub facility: FacilityContact,
}

/// An application selected for expiry with everything needed to notify both
/// the applicant and the facility.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringApplication {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub applicant_name: String,
    pub shift: ApplicationShift,
    pub applicant: ProviderContact,
}

#[derive(Debug, sqlx::FromRow)]
struct ExpiringRow {
    id: String,
    created_at: DateTime<Utc>,
    applicant_name: String,
    shift_id: String,
    shift_date: DateTime<Utc>,
    shift_time: String,
    facility_name: String,
    facility_email: String,
    applicant_email: String,
}

impl From<ExpiringRow> for ExpiringApplication {
    fn from(row: ExpiringRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            applicant_name: row.applicant_name,
            shift: ApplicationShift {
                id: row.shift_id,
                shift_date: row.shift_date,
                shift_time: row.shift_time,
                facility: FacilityContact::new(row.facility_name, row.facility_email),
            },
            applicant: ProviderContact::new(row.applicant_email),
        }
    }
}

const FETCH_EXPIRED_QUERY: &str = r#"
    SELECT
        a.id,
        a.created_at,
        a.applicant_name,
        s.id AS shift_id,
        s.shift_date,
        s.shift_time,
        f.name AS facility_name,
        fu.email AS facility_email,
        pu.email AS applicant_email
    FROM
        applications a
        JOIN shifts s ON s.id = a.shift_id
        JOIN facilities f ON f.id = s.facility_id
        JOIN users fu ON fu.id = f.user_id
        JOIN providers p ON p.id = a.applicant_id
        JOIN users pu ON pu.id = p.user_id
    WHERE
        a.created_at <= $1
        AND s.status = $2
        AND s.hired_provider_id IS NULL
        AND s.shift_date > $3
    ORDER BY
        a.created_at, a.id
"#;

pub async fn expired<'c, E>(
    exec: E,
    now: DateTime<Utc>,
    created_before: DateTime<Utc>,
) -> Result<Vec<ExpiringApplication>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, ExpiringRow>(FETCH_EXPIRED_QUERY)
        .bind(created_before)
        .bind(Status::Pending.as_str())
        .bind(now)
        .fetch_all(exec)
        .map_ok(|rows| rows.into_iter().map(ExpiringApplication::from).collect())
        .map_err(Error::from)
        .await
}

#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    shift_id: String,
    email: String,
}

/// Applicant emails for every application on the given shifts, keyed by shift
/// id.
pub async fn contacts_for_shifts<'c, E>(
    exec: E,
    shift_ids: &[String],
) -> Result<Vec<(String, ApplicantContact)>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, ContactRow>(
        r#"
        SELECT
            a.shift_id,
            u.email
        FROM
            applications a
            JOIN providers p ON p.id = a.applicant_id
            JOIN users u ON u.id = p.user_id
        WHERE
            a.shift_id = ANY($1)
        ORDER BY
            a.created_at, a.id
        "#,
    )
    .bind(shift_ids)
    .fetch_all(exec)
    .map_ok(|rows| {
        rows.into_iter()
            .map(|row| (row.shift_id, ApplicantContact::new(row.email)))
            .collect()
    })
    .map_err(Error::from)
    .await
}

/// Re-reads the shift/applicant pairs for the given applications.
pub async fn links<'c, E>(exec: E, ids: &[String]) -> Result<Vec<Link>>
where
    E: PgExecutor<'c>,
{
    if ids.is_empty() {
        return Ok(vec![]);
    }
    sqlx::query_as::<_, Link>(
        "SELECT shift_id, applicant_id FROM applications WHERE id = ANY($1) ORDER BY id",
    )
    .bind(ids)
    .fetch_all(exec)
    .map_err(Error::from)
    .await
}

pub async fn delete_many<'c, E>(exec: E, ids: &[String]) -> Result<u64>
where
    E: PgExecutor<'c>,
{
    if ids.is_empty() {
        return Ok(0);
    }
    sqlx::query("DELETE FROM applications WHERE id = ANY($1)")
        .bind(ids)
        .execute(exec)
        .map_ok(|result| result.rows_affected())
        .map_err(Error::from)
        .await
}
