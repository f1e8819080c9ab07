use clap::Parser;

use crate::config::AppConfig;

#[derive(Parser, Debug, Default)]
#[command(name = "greenlight")]
#[command(about = "Greenlight - JSON REST API for a movie catalog")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "Port to listen on (overrides SERVER_PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Postgres connection string (overrides DATABASE_URL)")]
    pub database_url: Option<String>,

    #[arg(long, help = "Keep all data in process memory instead of Postgres")]
    pub in_memory: bool,

    #[arg(long, help = "Skip embedded migrations on startup")]
    pub no_migrate: bool,
}

impl Cli {
    /// Flags take precedence over environment-derived values.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
        if self.no_migrate {
            config.database.run_migrations = false;
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env();
    cli.apply(&mut config);
    tracing::info!(environment = config.environment.as_str(), "configuration loaded");
    crate::server::run(config, cli.in_memory).await
}
