use crate::{cmd::print_json, settings::Settings, Result};
use db::Store;

/// List open shifts with their applicants
#[derive(Debug, clap::Args)]
pub struct Cmd {}

impl Cmd {
    pub async fn run(&self, settings: Settings) -> Result {
        let store = settings.store().await?;
        let shifts = store.open_shifts().await?;
        print_json(&shifts)
    }
}
