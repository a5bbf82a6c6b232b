#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod gate;
pub mod leases;
pub mod message;
pub mod response;
pub mod server;
pub mod service;
pub mod time;

pub mod test_utils;

pub use error::{Error, Result};

use serde::{Deserialize, Serialize};

/// Opaque identifier of one physical manipulator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManipulatorId(pub String);

impl ManipulatorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ManipulatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ManipulatorId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ManipulatorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
