use crate::{user::UserEmail, Error, Result};
use futures::TryFutureExt;
use sqlx::PgExecutor;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Provider {
    pub id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ProviderContact {
    pub user: UserEmail,
}

impl ProviderContact {
    pub fn new(email: String) -> Self {
        Self {
            user: UserEmail::from(email),
        }
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }
}

/// Removes `shift_ids` from the provider's applied shifts.
pub async fn disconnect_shifts<'c, E>(exec: E, provider_id: &str, shift_ids: &[String]) -> Result<u64>
where
    E: PgExecutor<'c>,
{
    if shift_ids.is_empty() {
        return Ok(0);
    }
    sqlx::query("DELETE FROM shift_applicants WHERE provider_id = $1 AND shift_id = ANY($2)")
        .bind(provider_id)
        .bind(shift_ids)
        .execute(exec)
        .map_ok(|result| result.rows_affected())
        .map_err(Error::from)
        .await
}
