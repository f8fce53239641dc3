use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_auth::TokenService;
use shelf_kernel::settings::Settings;

/// Operator commands for the SHELF API.
#[derive(Debug, Parser)]
#[command(name = "shelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API until Ctrl-C or SIGTERM.
    Serve,
    /// Apply pending migrations and exit.
    Migrate,
    /// Mint a bearer token for an existing user id.
    Token {
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        username: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load SHELF settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => shelf_app::app::run(&settings).await,
        Command::Migrate => {
            let pool = shelf_db::connect(&settings.database).await?;
            let registry = shelf_app::app::prepare(&settings, pool.clone()).await?;
            tracing::info!(modules = registry.len(), "migrations complete");
            pool.close().await;
            Ok(())
        }
        Command::Token { user_id, username } => {
            let token = TokenService::from_settings(&settings.auth)
                .issue(user_id, &username)
                .context("failed to sign token")?;
            println!("{token}");
            Ok(())
        }
    }
}
