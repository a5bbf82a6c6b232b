use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::LinkConfig;
use crate::Result;

#[derive(Parser, Debug)]
#[command(name = "ephys-link", version, about, long_about = None)]
pub struct Cli {
    /// Sets a custom config file (JSON)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Verbose mode (-v, -vv, -vvv)
    #[arg(short, action = ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serves the link over HTTP until interrupted
    Serve(Overrides),
    /// Prints the effective configuration as JSON
    ShowConfig(Overrides),
}

/// Settings that take precedence over the config file
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Address to listen on
    #[arg(long, env = "EPHYS_LINK_BIND_ADDR")]
    pub bind: Option<SocketAddr>,

    /// Lease reaper period in milliseconds, 0 disables it
    #[arg(long, env = "EPHYS_LINK_REAP_INTERVAL_MS")]
    pub reap_interval_ms: Option<u64>,

    /// Number of simulated manipulators
    #[arg(long)]
    pub manipulators: Option<u32>,

    /// Duration of each simulated move in milliseconds
    #[arg(long)]
    pub move_latency_ms: Option<u64>,
}

impl Cli {
    pub fn overrides(&self) -> &Overrides {
        match &self.command {
            Commands::Serve(overrides) | Commands::ShowConfig(overrides) => overrides,
        }
    }

    /// Config file (or defaults) with command-line overrides applied
    pub fn load_config(&self) -> Result<LinkConfig> {
        let mut config = match &self.config {
            Some(path) => LinkConfig::from_file(path)?,
            None => LinkConfig::default(),
        };
        self.overrides().apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Default tracing filter for the verbosity count
    pub fn log_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "info",
            1 => "ephys_link=debug,info",
            2 => "debug",
            _ => "trace",
        }
    }
}

impl Overrides {
    pub fn apply(&self, config: &mut LinkConfig) {
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(ms) = self.reap_interval_ms {
            config.reap_interval = (ms > 0).then_some(Duration::from_millis(ms));
        }
        if let Some(manipulators) = self.manipulators {
            config.simulated.manipulators = manipulators;
        }
        if let Some(ms) = self.move_latency_ms {
            config.simulated.move_latency = Duration::from_millis(ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::try_parse_from([
            "ephys-link",
            "-vv",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--reap-interval-ms",
            "0",
            "--manipulators",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.log_filter(), "debug");

        let config = cli.load_config().unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.reap_interval, None);
        assert_eq!(config.simulated.manipulators, 3);
    }
}
