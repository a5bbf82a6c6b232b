use crate::{Error, ManipulatorId, Result};
use serde::{Deserialize, Serialize};

/// Body of a goto-position request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GotoPositionInput {
    pub manipulator_id: ManipulatorId,
    pub pos: Vec<f64>,
    pub speed: i64,
}

/// Body of a drive-to-depth request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveToDepthInput {
    pub manipulator_id: ManipulatorId,
    pub depth: f64,
    pub speed: i64,
}

/// Body of an inside-brain request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsideBrainInput {
    pub manipulator_id: ManipulatorId,
    pub inside: bool,
}

/// Body of a write-permission change
///
/// `hours` is required to grant. It is ignored when `can_write` is false and
/// may then be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanWriteInput {
    pub manipulator_id: ManipulatorId,
    pub can_write: bool,
    #[serde(default)]
    pub hours: Option<f64>,
}

/// Where a movement command should take the manipulator tip
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// X, Y, Z and optionally W, in mm
    Position(Vec<f64>),
    /// Depth along the insertion axis, in mm
    Depth(f64),
}

/// What the driver reports after a movement
#[derive(Debug, Clone, PartialEq)]
pub enum Movement {
    Position(Vec<f64>),
    Depth(f64),
}

/// A validated movement command
///
/// Built only through `TryFrom` on the input bodies, so `speed` is always
/// positive and positions always have 3 or 4 finite coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum MovementRequest {
    GotoPosition {
        manipulator_id: ManipulatorId,
        pos: Vec<f64>,
        speed: u32,
    },
    DriveToDepth {
        manipulator_id: ManipulatorId,
        depth: f64,
        speed: u32,
    },
}

impl MovementRequest {
    pub fn manipulator_id(&self) -> &ManipulatorId {
        match self {
            Self::GotoPosition { manipulator_id, .. } | Self::DriveToDepth { manipulator_id, .. } => {
                manipulator_id
            }
        }
    }

    pub fn speed(&self) -> u32 {
        match self {
            Self::GotoPosition { speed, .. } | Self::DriveToDepth { speed, .. } => *speed,
        }
    }

    pub fn target(&self) -> Target {
        match self {
            Self::GotoPosition { pos, .. } => Target::Position(pos.clone()),
            Self::DriveToDepth { depth, .. } => Target::Depth(*depth),
        }
    }
}

impl TryFrom<GotoPositionInput> for MovementRequest {
    type Error = Error;

    fn try_from(input: GotoPositionInput) -> Result<Self> {
        if !(3..=4).contains(&input.pos.len()) {
            return Err(Error::invalid(format!(
                "position must have 3 or 4 coordinates, got {}",
                input.pos.len()
            )));
        }
        if input.pos.iter().any(|coordinate| !coordinate.is_finite()) {
            return Err(Error::invalid("position coordinates must be finite"));
        }
        Ok(Self::GotoPosition {
            speed: validate_speed(input.speed)?,
            manipulator_id: input.manipulator_id,
            pos: input.pos,
        })
    }
}

impl TryFrom<DriveToDepthInput> for MovementRequest {
    type Error = Error;

    fn try_from(input: DriveToDepthInput) -> Result<Self> {
        if !input.depth.is_finite() {
            return Err(Error::invalid("depth must be finite"));
        }
        Ok(Self::DriveToDepth {
            speed: validate_speed(input.speed)?,
            manipulator_id: input.manipulator_id,
            depth: input.depth,
        })
    }
}

fn validate_speed(speed: i64) -> Result<u32> {
    if speed <= 0 {
        return Err(Error::invalid(format!("speed must be positive, got {speed}")));
    }
    u32::try_from(speed).map_err(|_| Error::invalid(format!("speed {speed} is out of range")))
}

/// Grant or revoke request derived from [`CanWriteInput`]
#[derive(Debug, Clone, PartialEq)]
pub enum PermissionChange {
    Grant { manipulator_id: ManipulatorId, hours: f64 },
    Revoke { manipulator_id: ManipulatorId },
}

impl TryFrom<CanWriteInput> for PermissionChange {
    type Error = Error;

    fn try_from(input: CanWriteInput) -> Result<Self> {
        if !input.can_write {
            return Ok(Self::Revoke {
                manipulator_id: input.manipulator_id,
            });
        }
        let hours = input
            .hours
            .ok_or_else(|| Error::invalid("hours is required when can_write is true"))?;
        Ok(Self::Grant {
            manipulator_id: input.manipulator_id,
            hours,
        })
    }
}
