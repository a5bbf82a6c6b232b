use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("PermissionDenied: manipulator {manipulator_id} has no active write lease")]
    PermissionDenied { manipulator_id: crate::ManipulatorId },

    #[error("InvalidArgument: {0}")]
    InvalidArgument(String),

    /// Failure reported by the hardware driver, message kept verbatim.
    #[error("{0}")]
    Driver(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
