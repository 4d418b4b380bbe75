use crate::{
    cron::{email_date, Context, SweepStats},
    Result,
};
use chrono::{DateTime, Utc};
use db::ShiftSummary;
use itertools::Itertools;
use mailer::expired::{ShiftExpired, ShiftNotice};
use std::time::Instant;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Every five minutes, on the minute.
pub const SCHEDULE: &str = "0 */5 * * * *";

pub async fn schedule(ctx: Context, scheduler: &mut JobScheduler) -> Result {
    let job = Job::new_async(SCHEDULE, move |_uuid, _lock| {
        Box::pin({
            let ctx = ctx.clone();
            async move {
                if let Err(err) = run(&ctx).await {
                    tracing::error!(?err, "failed to expire shifts");
                }
            }
        })
    })?;
    let id = scheduler.add(job).await?;
    tracing::info!(%id, job = "expire_shifts", schedule = SCHEDULE, "scheduled");
    Ok(())
}

pub async fn run(ctx: &Context) -> Result<SweepStats> {
    run_at(ctx, Utc::now()).await
}

/// Archives and cancels every open shift dated before `now`, then notifies the
/// facility of each shift and every applicant to it.
#[tracing::instrument(skip_all, name = "expire_shifts")]
pub async fn run_at(ctx: &Context, now: DateTime<Utc>) -> Result<SweepStats> {
    let start = Instant::now();
    let shifts = ctx.store.shifts_to_expire(now).await?;

    let mut notification = None;
    if !shifts.is_empty() {
        let ids = shifts.iter().map(|shift| shift.id.clone()).collect_vec();
        let email = notice(&shifts);
        ctx.store.expire_shifts(&ids).await?;
        notification = Some(ctx.mailer.dispatch(&email));
    }

    let duration_ms = start.elapsed().as_millis();
    tracing::info!(expired = shifts.len(), duration_ms, "removed expired shifts");
    Ok(SweepStats::new(shifts.len(), duration_ms, notification))
}

/// One facility entry per shift and one provider entry per application.
pub fn notice(shifts: &[ShiftSummary]) -> ShiftExpired {
    let facilities = shifts
        .iter()
        .map(|shift| ShiftNotice {
            email: shift.facility.email().to_string(),
            facility_name: shift.facility.name.clone(),
            shift_date: email_date(&shift.shift_date),
            shift_time: shift.shift_time.clone(),
        })
        .collect();
    let providers = shifts
        .iter()
        .flat_map(|shift| {
            shift.applications.iter().map(move |application| ShiftNotice {
                email: application.email().to_string(),
                facility_name: shift.facility.name.clone(),
                shift_date: email_date(&shift.shift_date),
                shift_time: shift.shift_time.clone(),
            })
        })
        .collect();
    ShiftExpired::new(providers, facilities)
}
