// Output records sent back to clients
//
// Every record carries an `error` string that is empty on success. A failed
// record still has all of its fields, filled with neutral defaults.

use crate::driver::ManipulatorInfo;
use crate::Error;
use serde::{Deserialize, Serialize};

/// Encode a response record as JSON
pub fn encode<T: Serialize>(response: &T) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        serde_json::json!({ "error": format!("Serialization error: {e}") }).to_string()
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManipulatorsOutput {
    pub manipulators: Vec<String>,
    pub num_axes: u32,
    /// Size of the movement space in mm, first 3 axes
    pub dimensions: Vec<f64>,
    pub error: String,
}

impl ManipulatorsOutput {
    /// List the enumerated manipulators
    ///
    /// Axis count and dimensions come from the first manipulator; a platform
    /// exposes one kind of device.
    pub fn ok(infos: &[ManipulatorInfo]) -> Self {
        let (num_axes, dimensions) = infos
            .first()
            .map_or((0, Vec::new()), |info| (info.num_axes, info.dimensions.to_vec()));
        Self {
            manipulators: infos.iter().map(|info| info.manipulator_id.to_string()).collect(),
            num_axes,
            dimensions,
            error: String::new(),
        }
    }

    pub fn failed(error: &Error) -> Self {
        Self {
            manipulators: Vec::new(),
            num_axes: 0,
            dimensions: Vec::new(),
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionOutput {
    /// X, Y, Z, W order, may be empty
    pub position: Vec<f64>,
    pub error: String,
}

impl PositionOutput {
    pub fn ok(position: Vec<f64>) -> Self {
        Self {
            position,
            error: String::new(),
        }
    }

    pub fn failed(error: &Error) -> Self {
        Self {
            position: Vec::new(),
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnglesOutput {
    /// Yaw, pitch, roll in degrees
    pub angles: Vec<f64>,
    pub error: String,
}

impl AnglesOutput {
    pub fn ok(angles: [f64; 3]) -> Self {
        Self {
            angles: angles.to_vec(),
            error: String::new(),
        }
    }

    pub fn failed(error: &Error) -> Self {
        Self {
            angles: Vec::new(),
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShankCountOutput {
    pub shank_count: u32,
    pub error: String,
}

impl ShankCountOutput {
    pub fn ok(shank_count: u32) -> Self {
        Self {
            shank_count,
            error: String::new(),
        }
    }

    pub fn failed(error: &Error) -> Self {
        Self {
            shank_count: 0,
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthOutput {
    pub depth: f64,
    pub error: String,
}

impl DepthOutput {
    pub fn ok(depth: f64) -> Self {
        Self {
            depth,
            error: String::new(),
        }
    }

    pub fn failed(error: &Error) -> Self {
        Self {
            depth: 0.0,
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateOutput {
    pub state: bool,
    pub error: String,
}

impl StateOutput {
    pub fn ok(state: bool) -> Self {
        Self {
            state,
            error: String::new(),
        }
    }

    pub fn failed(error: &Error) -> Self {
        Self {
            state: false,
            error: error.to_string(),
        }
    }
}
