use crate::{settings::Settings, Result};

pub mod list;
pub mod sweep;

pub fn print_json<T: ?Sized + serde::Serialize>(value: &T) -> Result {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Debug, clap::Subcommand)]
pub enum Cmd {
    Sweep(sweep::Cmd),
    List(list::Cmd),
}

impl Cmd {
    pub async fn run(&self, settings: Settings) -> Result {
        match self {
            Self::Sweep(cmd) => cmd.run(settings).await,
            Self::List(cmd) => cmd.run(settings).await,
        }
    }
}
