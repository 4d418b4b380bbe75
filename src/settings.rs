use crate::{Context, Result};
use anyhow::ensure;
use config::{Config, Environment};
use serde::Deserialize;
use std::net::SocketAddr;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_log")]
    pub log: String,
    #[serde(default = "default_node_env")]
    pub node_env: String,
    pub port: u16,
    pub database_url: String,
    pub email_service_url: String,
    pub frontend_url: String,
}

impl Settings {
    /// Settings are loaded from environment variables (`PORT`, `DATABASE_URL`,
    /// ...) and validated.
    pub fn new() -> Result<Self> {
        Self::from_env(Environment::default())
    }

    pub fn from_env(env: Environment) -> Result<Self> {
        let settings: Self = Config::builder()
            .add_source(env.try_parsing(true))
            .build()
            .and_then(|config| config.try_deserialize())
            .context("invalid environment variables")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result {
        ensure!(!self.database_url.is_empty(), "DATABASE_URL is required");
        ensure!(
            !self.email_service_url.is_empty(),
            "EMAIL_SERVICE_URL is required"
        );
        ensure!(!self.frontend_url.is_empty(), "FRONTEND_URL is required");
        Url::parse(&self.email_service_url).context("EMAIL_SERVICE_URL is not a url")?;
        Url::parse(&self.frontend_url).context("FRONTEND_URL is not a url")?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.node_env == "production"
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    pub async fn store(&self) -> Result<db::PgStore> {
        db::PgStore::connect(&self.database_url).await
    }

    pub fn mailer(&self) -> Result<mailer::Client> {
        mailer::Client::new(&self.email_service_url).context("creating email service client")
    }
}

fn default_log() -> String {
    "shift_sweeper=info,db=info".to_string()
}

fn default_node_env() -> String {
    "development".to_string()
}
