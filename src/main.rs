use clap::Parser;
use ephys_link::cli::{Cli, Commands};
use ephys_link::{server, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.load_config()?;
    match cli.command {
        Commands::Serve(_) => {
            info!("ephys-link starting on {}", config.bind_addr);
            server::run(config).await
        }
        Commands::ShowConfig(_) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
