use crate::{
    cmd::print_json,
    cron::{self, Context, SweepStats},
    settings::Settings,
    Result,
};

/// Run one of the expiry sweeps once, outside the schedule
#[derive(Debug, clap::Args)]
pub struct Cmd {
    #[clap(subcommand)]
    cmd: SweepCmd,
}

impl Cmd {
    pub async fn run(&self, settings: Settings) -> Result {
        let ctx = Context::from_settings(&settings).await?;
        let mut stats = self.cmd.run(&ctx).await?;
        // let the notification finish before the process exits
        if let Some(notification) = stats.notification.take() {
            notification.await?;
        }
        print_json(&stats)
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum SweepCmd {
    /// Archive and cancel unfilled shifts that are in the past
    Shifts,
    /// Delete stale applications to upcoming open shifts
    Applications,
}

impl SweepCmd {
    async fn run(&self, ctx: &Context) -> Result<SweepStats> {
        match self {
            Self::Shifts => cron::shifts::run(ctx).await,
            Self::Applications => cron::applications::run(ctx).await,
        }
    }
}
