use crate::{
    api::{self, ApiState},
    cron,
    settings::Settings,
    Error, Result,
};
use tokio_graceful_shutdown::{SubsystemBuilder, Toplevel};

pub async fn run(settings: Settings) -> Result {
    let ctx = cron::Context::from_settings(&settings).await?;
    let router = api::router(ApiState::new(ctx.store.clone()), &settings.frontend_url)?;
    let addr = settings.listen_addr();
    tracing::info!(env = %settings.node_env, "starting");

    Toplevel::new(move |top_level| async move {
        top_level.start(SubsystemBuilder::new("cron", {
            move |handle| cron::subsystem(ctx, handle)
        }));
        top_level.start(SubsystemBuilder::new("api", {
            move |handle| api::subsystem(addr, router, handle)
        }));
    })
    .catch_signals()
    .handle_shutdown_requests(tokio::time::Duration::from_secs(5))
    .await
    .map_err(Error::from)
}
