use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Runtime configuration for the link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,

    /// How often lapsed leases are purged and announced; `None` disables the reaper
    pub reap_interval: Option<Duration>,

    pub simulated: SimulatedConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8081)),
            reap_interval: Some(Duration::from_secs(1)),
            simulated: SimulatedConfig::default(),
        }
    }
}

impl LinkConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.reap_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(Error::Config("reap_interval must be greater than zero".into()));
        }
        self.simulated.validate()
    }
}

/// Manipulators exposed by the simulated driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedConfig {
    /// Number of manipulators, named "1", "2", ...
    pub manipulators: u32,
    pub num_axes: u32,
    /// Size of the movement space in mm
    pub dimensions: [f64; 3],
    pub shank_count: u32,
    /// How long each move takes
    pub move_latency: Duration,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            manipulators: 2,
            num_axes: 4,
            dimensions: [20.0, 20.0, 20.0],
            shank_count: 1,
            move_latency: Duration::ZERO,
        }
    }
}

impl SimulatedConfig {
    pub fn validate(&self) -> Result<()> {
        if !(3..=4).contains(&self.num_axes) {
            return Err(Error::Config(format!(
                "simulated manipulators need 3 or 4 axes, got {}",
                self.num_axes
            )));
        }
        if self.dimensions.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(Error::Config("dimensions must be finite and positive".into()));
        }
        if self.shank_count == 0 {
            return Err(Error::Config("shank_count must be at least 1".into()));
        }
        Ok(())
    }
}
