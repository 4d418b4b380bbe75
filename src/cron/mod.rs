use crate::{settings::Settings, Result};
use chrono::{DateTime, Utc};
use db::Store;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::JobScheduler;
use tokio_graceful_shutdown::SubsystemHandle;

pub mod applications;
pub mod shifts;

/// Everything a sweep needs to run.
#[derive(Clone)]
pub struct Context {
    pub store: Arc<dyn Store>,
    pub mailer: mailer::Client,
    pub frontend_url: String,
}

impl Context {
    pub fn new(store: Arc<dyn Store>, mailer: mailer::Client, frontend_url: &str) -> Self {
        Self {
            store,
            mailer,
            frontend_url: frontend_url.to_string(),
        }
    }

    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let store = settings.store().await?;
        Ok(Self::new(
            Arc::new(store),
            settings.mailer()?,
            &settings.frontend_url,
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct SweepStats {
    pub expired: usize,
    pub duration_ms: u128,
    /// The detached notification request, if one was sent.
    #[serde(skip)]
    pub notification: Option<JoinHandle<()>>,
}

impl SweepStats {
    fn new(expired: usize, duration_ms: u128, notification: Option<JoinHandle<()>>) -> Self {
        Self {
            expired,
            duration_ms,
            notification,
        }
    }
}

/// Calendar date of a shift as it appears in emails.
pub(crate) fn email_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Holds the process wide job registry: one scheduler with the shift and
/// application sweeps, stopped together on shutdown.
pub async fn subsystem(ctx: Context, handle: SubsystemHandle) -> Result<()> {
    let mut scheduler = JobScheduler::new().await?;
    tracing::info!("started scheduler");
    shifts::schedule(ctx.clone(), &mut scheduler).await?;
    applications::schedule(ctx, &mut scheduler).await?;
    scheduler.start().await?;
    handle.on_shutdown_requested().await;

    tracing::info!("stopped scheduler");
    scheduler.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_report_milliseconds_without_the_notification() {
        let stats = SweepStats::new(2, 1500, None);
        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            serde_json::json!({ "expired": 2, "duration_ms": 1500 })
        );
    }
}
