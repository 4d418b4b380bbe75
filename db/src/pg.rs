use crate::{
    application, shift, Context, ExpiringApplication, Result, ShiftSummary, Store, UnitOfWork,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await.context("opening database")?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn open_shifts(&self) -> Result<Vec<ShiftSummary>> {
        shift::open(&self.pool).await
    }

    async fn shifts_to_expire(&self, now: DateTime<Utc>) -> Result<Vec<ShiftSummary>> {
        shift::expired(&self.pool, now).await
    }

    async fn applications_to_expire(
        &self,
        now: DateTime<Utc>,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<ExpiringApplication>> {
        application::expired(&self.pool, now, created_before).await
    }

    async fn expire_shifts(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        UnitOfWork::shift_expiry(ids).apply(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn expire_applications(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        let links = application::links(&mut *tx, ids).await?;
        UnitOfWork::application_expiry(ids, &links)
            .apply(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
