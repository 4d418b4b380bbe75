use crate::{
    cron::{email_date, Context, SweepStats},
    Result,
};
use chrono::{DateTime, Duration, Utc};
use db::ExpiringApplication;
use itertools::Itertools;
use mailer::expired::{ApplicationExpired, FacilityApplicationNotice, ProviderApplicationNotice};
use std::time::Instant;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Every three minutes, on the minute.
pub const SCHEDULE: &str = "0 */3 * * * *";

/// Applications older than this lapse while their shift is still open.
pub const MAX_AGE_HOURS: i64 = 48;

pub async fn schedule(ctx: Context, scheduler: &mut JobScheduler) -> Result {
    let job = Job::new_async(SCHEDULE, move |_uuid, _lock| {
        Box::pin({
            let ctx = ctx.clone();
            async move {
                if let Err(err) = run(&ctx).await {
                    tracing::error!(?err, "failed to expire applications");
                }
            }
        })
    })?;
    let id = scheduler.add(job).await?;
    tracing::info!(%id, job = "expire_applications", schedule = SCHEDULE, "scheduled");
    Ok(())
}

pub async fn run(ctx: &Context) -> Result<SweepStats> {
    run_at(ctx, Utc::now()).await
}

/// Deletes applications older than [`MAX_AGE_HOURS`] to shifts that are still
/// pending, unhired and upcoming, then notifies both applicant and facility.
#[tracing::instrument(skip_all, name = "expire_applications")]
pub async fn run_at(ctx: &Context, now: DateTime<Utc>) -> Result<SweepStats> {
    let start = Instant::now();
    let created_before = now - Duration::hours(MAX_AGE_HOURS);
    let applications = ctx
        .store
        .applications_to_expire(now, created_before)
        .await?;

    let mut notification = None;
    if !applications.is_empty() {
        let ids = applications
            .iter()
            .map(|application| application.id.clone())
            .collect_vec();
        let email = notice(&applications, &ctx.frontend_url);
        ctx.store.expire_applications(&ids).await?;
        notification = Some(ctx.mailer.dispatch(&email));
    }

    let duration_ms = start.elapsed().as_millis();
    tracing::info!(
        deleted = applications.len(),
        duration_ms,
        "deleted expired applications"
    );
    Ok(SweepStats::new(applications.len(), duration_ms, notification))
}

pub fn shift_url(frontend_url: &str, shift_id: &str) -> String {
    format!("{}/shift/{shift_id}", frontend_url.trim_end_matches('/'))
}

/// One provider and one facility entry per application.
pub fn notice(applications: &[ExpiringApplication], frontend_url: &str) -> ApplicationExpired {
    let providers = applications
        .iter()
        .map(|application| ProviderApplicationNotice {
            email: application.applicant.email().to_string(),
            facility_name: application.shift.facility.name.clone(),
            shift_date: email_date(&application.shift.shift_date),
            shift_time: application.shift.shift_time.clone(),
            shift_url: shift_url(frontend_url, &application.shift.id),
        })
        .collect();
    let facilities = applications
        .iter()
        .map(|application| FacilityApplicationNotice {
            email: application.shift.facility.email().to_string(),
            facility_name: application.shift.facility.name.clone(),
            provider_name: application.applicant_name.clone(),
            shift_date: email_date(&application.shift.shift_date),
            shift_time: application.shift.shift_time.clone(),
        })
        .collect();
    ApplicationExpired::new(providers, facilities)
}
